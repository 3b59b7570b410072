use async_trait::async_trait;
use marketdesk_core::{
    CollectionSource, ConsoleError, ConsoleResult, DetailDrawer, DetailSource, FieldValue,
    MutationOutcome, MutationStatus, PageRequest, PageResult, Patchable,
    RemoteCollectionController, SortDirection,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

/// Source whose responses resolve only when the test releases them, keyed
/// by the `status` filter of the request.
#[derive(Default)]
struct GatedSource {
    gates: Mutex<HashMap<String, oneshot::Receiver<PageResult<String>>>>,
}

impl GatedSource {
    fn gate(&self, status: &str) -> oneshot::Sender<PageResult<String>> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .lock()
            .expect("gate lock")
            .insert(status.to_string(), rx);
        tx
    }
}

#[async_trait]
impl CollectionSource for GatedSource {
    type Item = String;

    async fn fetch_page(&self, request: &PageRequest) -> ConsoleResult<PageResult<String>> {
        let key = request.filter("status").unwrap_or_default().to_string();
        let rx = self
            .gates
            .lock()
            .expect("gate lock")
            .remove(&key)
            .expect("gate registered for request");
        rx.await.map_err(|_| ConsoleError::transport("gate dropped"))
    }
}

fn page_of(label: &str, count: usize) -> PageResult<String> {
    PageResult::normalize(
        (0..count).map(|i| format!("{label}-{i}")).collect(),
        Some(count as u64),
        10,
    )
}

#[tokio::test]
async fn slow_stale_response_never_overwrites_newer_result() {
    let source = Arc::new(GatedSource::default());
    let release_a = source.gate("active");
    let release_b = source.gate("inactive");

    let mut controller =
        RemoteCollectionController::new(PageRequest::new(10, "createdAt", SortDirection::Desc));
    let ticket_a = controller.set_filter("status", "active");
    let ticket_b = controller.set_filter("status", "inactive");

    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    for ticket in [ticket_a, ticket_b] {
        let source = Arc::clone(&source);
        let done_tx = done_tx.clone();
        tokio::spawn(async move {
            let outcome = ticket.run(source.as_ref()).await;
            let _ = done_tx.send(outcome);
        });
    }

    release_b.send(page_of("b", 2)).expect("b pending");
    let first = done_rx.recv().await.expect("b settles");
    assert!(controller.apply(first));
    assert!(!controller.is_loading());

    release_a.send(page_of("a", 5)).expect("a pending");
    let second = done_rx.recv().await.expect("a settles");
    assert!(!controller.apply(second));

    assert_eq!(controller.items(), &["b-0".to_string(), "b-1".to_string()]);
    assert_eq!(controller.total_items(), 2);
    assert_eq!(controller.request().filter("status"), Some("inactive"));
}

#[derive(Debug, Clone, PartialEq)]
struct Booking {
    id: String,
    status: String,
    paid: bool,
}

impl Patchable for Booking {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn read_field(&self, field: &str) -> Option<FieldValue> {
        match field {
            "status" => Some(self.status.clone().into()),
            "paid" => Some(self.paid.into()),
            _ => None,
        }
    }

    fn write_field(&mut self, field: &str, value: FieldValue) -> Result<(), ConsoleError> {
        match field {
            "status" => self.status = value.expect_text(field)?.to_string(),
            "paid" => self.paid = value.expect_flag(field)?,
            _ => return Err(ConsoleError::validation(field, "unknown")),
        }
        Ok(())
    }
}

#[derive(Default)]
struct CountingDetails {
    fetches: AtomicUsize,
    rejections: Mutex<HashMap<String, ConsoleError>>,
}

#[async_trait]
impl DetailSource for CountingDetails {
    type Detail = Booking;

    async fn fetch_detail(&self, id: &str) -> ConsoleResult<Booking> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(Booking {
            id: id.to_string(),
            status: "confirmed".to_string(),
            paid: false,
        })
    }

    async fn commit(&self, _id: &str, field: &str, _value: &FieldValue) -> ConsoleResult<()> {
        match self.rejections.lock().expect("lock").get(field) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[tokio::test]
async fn opening_twice_fetches_once() {
    let source = CountingDetails::default();
    let mut drawer = DetailDrawer::new();

    let first = drawer.open("bk-1");
    let second = drawer.open("bk-1");
    assert!(second.is_none());

    let outcome = first.expect("first open issues a fetch").run(&source).await;
    assert!(drawer.apply(outcome));
    assert!(drawer.open("bk-1").is_none());
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(drawer.detail().map(|b| b.status.as_str()), Some("confirmed"));
}

#[tokio::test]
async fn rejected_mutation_rolls_back_without_touching_other_fields() {
    let source = CountingDetails::default();
    source.rejections.lock().expect("lock").insert(
        "status".to_string(),
        ConsoleError::application(Some(409), Some("conflict".to_string())),
    );

    let mut drawer = DetailDrawer::new();
    let ticket = drawer.open("bk-1").expect("fetch");
    let outcome = ticket.run(&source).await;
    drawer.apply(outcome);

    let status_change = drawer.mutate("status", "completed".into()).expect("status change");
    let paid_change = drawer.mutate("paid", true.into()).expect("paid change");
    assert_eq!(drawer.detail().map(|b| b.status.as_str()), Some("completed"));
    assert_eq!(drawer.pending_count(), 2);

    let status_result = status_change.run(&source).await;
    let outcome = drawer.settle(status_change.mutation_id, status_result);
    match &outcome {
        MutationOutcome::RolledBack(err) => assert_eq!(err.user_message(), "conflict"),
        other => panic!("expected rollback, got {other:?}"),
    }
    assert!(!outcome.refreshes_list());

    let booking = drawer.detail().expect("still loaded");
    assert_eq!(booking.status, "confirmed");
    assert!(booking.paid, "unrelated optimistic value must survive");

    let paid_result = paid_change.run(&source).await;
    assert_eq!(
        drawer.settle(paid_change.mutation_id, paid_result),
        MutationOutcome::Confirmed
    );
    let statuses: Vec<_> = drawer.mutations().iter().map(|m| m.status).collect();
    assert_eq!(
        statuses,
        vec![MutationStatus::RolledBack, MutationStatus::Confirmed]
    );
}

#[tokio::test]
async fn mutate_with_commits_inline() {
    let source = CountingDetails::default();
    let mut drawer = DetailDrawer::new();
    let ticket = drawer.open("bk-2").expect("fetch");
    drawer.apply(ticket.run(&source).await);

    let outcome = drawer
        .mutate_with(&source, "status", "completed".into())
        .await
        .expect("valid change");
    assert!(outcome.refreshes_list());
    assert_eq!(drawer.detail().map(|b| b.status.as_str()), Some("completed"));
}
