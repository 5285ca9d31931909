//! Property-based tests for history paging and member lists

use proptest::prelude::*;
use roomchat::backend::rooms::types::{
    AddMembersRequest, HistoryPage, HistoryQuery, MemberTargets, MAX_PAGE_SIZE,
};

fn query(num: String, last_id: Option<String>) -> HistoryQuery {
    HistoryQuery {
        num: Some(num),
        last_id,
    }
}

proptest! {
    #[test]
    fn test_page_sizes_in_range_are_accepted(num in 1..=MAX_PAGE_SIZE, last_id in any::<Option<i64>>()) {
        let page = query(num.to_string(), last_id.map(|id| id.to_string())).page().unwrap();
        prop_assert_eq!(page, HistoryPage { limit: num, before_id: last_id });
    }

    #[test]
    fn test_page_sizes_out_of_range_are_rejected(num in any::<i64>()) {
        prop_assume!(!(1..=MAX_PAGE_SIZE).contains(&num));
        prop_assert!(query(num.to_string(), None).page().is_err());
    }

    #[test]
    fn test_listed_ids_are_all_targeted(ids in proptest::collection::vec(any::<i64>(), 1..20)) {
        let list = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ");
        let request = AddMembersRequest {
            ids: Some(list),
            emails: Some("ignored@example.com".to_string()),
        };
        prop_assert_eq!(request.targets(), MemberTargets::Ids(ids));
    }
}
