use marketdesk_core::{
    total_pages, ConsoleError, PageRequest, PageResult, RemoteCollectionController, SortDirection,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Filter(String, String),
    Page(u32),
    PageSize(u32),
    Sort(bool),
    Refresh,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (
            prop::sample::select(vec!["status", "search", "role"]),
            prop::sample::select(vec!["", " ", "active", "inactive", "jane"]),
        )
            .prop_map(|(k, v)| Op::Filter(k.to_string(), v.to_string())),
        (0u32..20).prop_map(Op::Page),
        (0u32..60).prop_map(Op::PageSize),
        any::<bool>().prop_map(Op::Sort),
        Just(Op::Refresh),
    ]
}

fn settled(total: u64) -> RemoteCollectionController<u64> {
    let mut controller =
        RemoteCollectionController::new(PageRequest::new(10, "createdAt", SortDirection::Desc));
    let ticket = controller.refresh();
    let items: Vec<u64> = (0..total.min(10)).collect();
    controller.complete(ticket.seq, Ok(PageResult::normalize(items, Some(total), 10)));
    controller
}

proptest! {
    #[test]
    fn filter_and_page_size_changes_reset_page(total in 0u64..200, ops in prop::collection::vec(op_strategy(), 1..30)) {
        let mut controller = settled(total);
        for op in ops {
            match op {
                Op::Filter(key, value) => {
                    let ticket = controller.set_filter(key, value);
                    prop_assert_eq!(ticket.request.page_number, 1);
                    prop_assert_eq!(controller.request().page_number, 1);
                }
                Op::PageSize(size) => {
                    let ticket = controller.set_page_size(size);
                    prop_assert_eq!(ticket.request.page_number, 1);
                    prop_assert!(ticket.request.page_size >= 1);
                }
                Op::Page(n) => {
                    let ticket = controller.set_page(n);
                    prop_assert!(ticket.request.page_number >= 1);
                    prop_assert!(ticket.request.page_number <= controller.total_pages().max(1));
                }
                Op::Sort(asc) => {
                    let before = controller.request().page_number;
                    let direction = if asc { SortDirection::Asc } else { SortDirection::Desc };
                    let ticket = controller.set_sort("name", direction);
                    prop_assert_eq!(ticket.request.page_number, before);
                }
                Op::Refresh => {
                    let before = controller.request().clone();
                    let ticket = controller.refresh();
                    prop_assert_eq!(ticket.request, before);
                }
            }
        }
    }

    #[test]
    fn normalized_pages_hold_invariants(len in 0usize..80, reported in prop::option::of(0u64..500), page_size in 1u32..50) {
        let result = PageResult::normalize((0..len).collect::<Vec<_>>(), reported, page_size);
        prop_assert!(result.items.len() <= page_size as usize);
        prop_assert_eq!(result.total_pages, total_pages(result.total_items, page_size));
        let expected = (result.total_items + u64::from(page_size) - 1) / u64::from(page_size);
        prop_assert_eq!(u64::from(result.total_pages), expected);
    }

    #[test]
    fn sequence_numbers_strictly_increase(ops in prop::collection::vec(op_strategy(), 1..20)) {
        let mut controller = settled(50);
        let mut last = controller.latest_seq();
        for op in ops {
            let ticket = match op {
                Op::Filter(key, value) => controller.set_filter(key, value),
                Op::Page(n) => controller.set_page(n),
                Op::PageSize(n) => controller.set_page_size(n),
                Op::Sort(_) => controller.set_sort("name", SortDirection::Asc),
                Op::Refresh => controller.refresh(),
            };
            prop_assert!(ticket.seq > last);
            prop_assert!(controller.is_current(ticket.seq));
            last = ticket.seq;
        }
    }
}

#[test]
fn pending_page_change_is_overridden_by_filter_change() {
    let mut controller = settled(40);
    let page_ticket = controller.set_page(2);
    assert_eq!(page_ticket.request.page_number, 2);
    let filter_ticket = controller.set_filter("status", "inactive");
    assert_eq!(filter_ticket.request.page_number, 1);
    assert_eq!(filter_ticket.request.filter("status"), Some("inactive"));
    assert!(!controller.is_current(page_ticket.seq));
}

#[test]
fn first_load_failure_has_no_items() {
    let mut controller: RemoteCollectionController<u64> =
        RemoteCollectionController::new(PageRequest::new(10, "createdAt", SortDirection::Desc));
    let ticket = controller.refresh();
    controller.complete(ticket.seq, Err(ConsoleError::transport("connection refused")));
    assert!(controller.items().is_empty());
    assert!(matches!(controller.error(), Some(ConsoleError::Transport { .. })));
}

#[test]
fn empty_page_is_not_an_error() {
    let mut controller: RemoteCollectionController<u64> =
        RemoteCollectionController::new(PageRequest::new(10, "createdAt", SortDirection::Desc));
    let ticket = controller.refresh();
    controller.complete(ticket.seq, Ok(PageResult::normalize(Vec::new(), Some(0), 10)));
    assert!(controller.error().is_none());
    assert_eq!(controller.total_pages(), 0);
    assert_eq!(controller.set_page(3).request.page_number, 1);
}

#[test]
fn clearing_filters_keeps_sort_and_resets_page() {
    let mut controller = settled(95);
    let _ = controller.set_sort("name", SortDirection::Asc);
    let _ = controller.set_filter("status", "active");
    let _ = controller.set_filter("search", "jane");
    let _ = controller.set_page(4);

    let ticket = controller.clear_filters();
    assert!(ticket.request.filters.is_empty());
    assert_eq!(ticket.request.page_number, 1);
    assert_eq!(ticket.request.sort_field, "name");
    assert_eq!(ticket.request.sort_direction, SortDirection::Asc);
    assert_eq!(ticket.seq, controller.latest_seq());
}
