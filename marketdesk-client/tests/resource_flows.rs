use async_trait::async_trait;
use marketdesk_client::adapters::{
    BookingStatus, BookingsAdapter, NewPlan, PlansAdapter, UsersAdapter,
};
use marketdesk_client::{ApiRequest, ApiResponse, HttpMethod, RemoteResource, Transport};
use marketdesk_core::{
    ConsoleError, ConsoleResult, DetailDrawer, FieldValue, MutationOutcome, MutationStatus,
    RemoteCollectionController,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// In-memory backend. Records every request and answers from a handler.
struct ScriptedTransport {
    requests: Mutex<Vec<ApiRequest>>,
    handler: Box<dyn Fn(&ApiRequest) -> ConsoleResult<ApiResponse> + Send + Sync>,
}

impl ScriptedTransport {
    fn new(
        handler: impl Fn(&ApiRequest) -> ConsoleResult<ApiResponse> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            handler: Box::new(handler),
        })
    }

    fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().expect("request log").clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> ConsoleResult<ApiResponse> {
        self.requests
            .lock()
            .expect("request log")
            .push(request.clone());
        (self.handler)(request)
    }
}

fn users(count: usize, active: bool) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "_id": format!("{}-{}", if active { "a" } else { "i" }, i),
                "name": format!("User {i}"),
                "email": format!("user{i}@example.com"),
                "role": "customer",
                "isActive": active,
            })
        })
        .collect()
}

/// Paged users endpoint honoring `status`, `page` and `limit`.
fn users_backend(request: &ApiRequest) -> ConsoleResult<ApiResponse> {
    let mut all = users(25, true);
    all.extend(users(7, false));
    let filtered: Vec<Value> = match request.query_value("status") {
        Some("active") => all.into_iter().filter(|u| u["isActive"] == true).collect(),
        Some("inactive") => all.into_iter().filter(|u| u["isActive"] == false).collect(),
        _ => all,
    };
    let page: usize = request.query_value("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let limit: usize = request.query_value("limit").and_then(|l| l.parse().ok()).unwrap_or(10);
    let total = filtered.len();
    let items: Vec<Value> = filtered.into_iter().skip((page - 1) * limit).take(limit).collect();
    Ok(ApiResponse::ok(json!({
        "success": true,
        "data": {
            "users": items,
            "pagination": { "page": page, "pages": total.div_ceil(limit), "total": total }
        }
    })))
}

#[tokio::test]
async fn active_filter_over_twenty_five_users() {
    let transport = ScriptedTransport::new(users_backend);
    let resource = RemoteResource::new(UsersAdapter, transport.clone());
    let mut controller = RemoteCollectionController::new(resource.initial_request(10));

    let ticket = controller.set_filter("status", "active");
    assert!(controller.load(&resource, ticket).await);

    assert_eq!(controller.items().len(), 10);
    assert_eq!(controller.total_items(), 25);
    assert_eq!(controller.total_pages(), 3);
    assert!(controller.error().is_none());

    let sent = transport.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].query_value("status"), Some("active"));
    assert_eq!(sent[0].query_value("page"), Some("1"));
    assert!(sent[0].query_value("search").is_none());
}

#[tokio::test]
async fn last_page_is_partial_and_clamped() {
    let transport = ScriptedTransport::new(users_backend);
    let resource = RemoteResource::new(UsersAdapter, transport.clone());
    let mut controller = RemoteCollectionController::new(resource.initial_request(10));

    let ticket = controller.set_filter("status", "active");
    controller.load(&resource, ticket).await;
    let ticket = controller.set_page(9);
    assert_eq!(ticket.request.page_number, 3);
    controller.load(&resource, ticket).await;
    assert_eq!(controller.items().len(), 5);
}

#[tokio::test]
async fn list_failure_keeps_previous_page() {
    let fail = Arc::new(Mutex::new(false));
    let fail_flag = Arc::clone(&fail);
    let transport = ScriptedTransport::new(move |request| {
        if *fail_flag.lock().expect("flag") {
            Ok(ApiResponse::new(503, json!({ "success": false, "message": "Service unavailable" })))
        } else {
            users_backend(request)
        }
    });
    let resource = RemoteResource::new(UsersAdapter, transport);
    let mut controller = RemoteCollectionController::new(resource.initial_request(10));
    let ticket = controller.refresh();
    controller.load(&resource, ticket).await;
    assert_eq!(controller.items().len(), 10);

    *fail.lock().expect("flag") = true;
    let ticket = controller.next_page();
    controller.load(&resource, ticket).await;
    assert_eq!(controller.items().len(), 10);
    assert_eq!(
        controller.error().map(ConsoleError::user_message).as_deref(),
        Some("Service unavailable")
    );
}

#[tokio::test]
async fn empty_bookings_page_is_loaded_without_error() {
    let transport = ScriptedTransport::new(|_| {
        Ok(ApiResponse::ok(json!({
            "success": true,
            "data": { "bookings": [], "pagination": { "total": 0, "pages": 0 } }
        })))
    });
    let resource = RemoteResource::new(BookingsAdapter, transport);
    let mut controller = RemoteCollectionController::new(resource.initial_request(10));
    let ticket = controller.refresh();
    assert!(controller.load(&resource, ticket).await);
    assert!(controller.items().is_empty());
    assert_eq!(controller.total_pages(), 0);
    assert!(controller.error().is_none());
}

fn booking_backend(request: &ApiRequest) -> ConsoleResult<ApiResponse> {
    match (request.method, request.path.as_str()) {
        (HttpMethod::Get, "/admin/bookings/b1") => Ok(ApiResponse::ok(json!({
            "success": true,
            "data": {
                "booking": {
                    "_id": "b1",
                    "status": "in-progress",
                    "customer": { "firstName": "Ana", "lastName": "Diaz" },
                    "provider": { "businessName": "FixIt" },
                    "service": { "name": "Boiler repair" }
                },
                "payments": [{ "amount": 120, "status": "paid" }],
                "notifications": [{ "title": "Booking confirmed" }]
            }
        }))),
        (HttpMethod::Put, "/admin/bookings/b1/status") => Ok(ApiResponse::ok(json!({
            "success": false,
            "message": "conflict"
        }))),
        _ => Ok(ApiResponse::new(404, json!({ "success": false, "message": "Not found" }))),
    }
}

#[tokio::test]
async fn rejected_booking_status_rolls_back_with_server_message() {
    let transport = ScriptedTransport::new(booking_backend);
    let resource = RemoteResource::new(BookingsAdapter, transport.clone());
    let mut drawer = DetailDrawer::new();

    let ticket = drawer.open("b1").expect("first open fetches");
    assert!(drawer.apply(ticket.run(&resource).await));
    let detail = drawer.detail().expect("loaded");
    assert_eq!(detail.customer.name, "Ana Diaz");
    assert_eq!(detail.notifications.len(), 1);

    let commit = drawer
        .mutate("status", FieldValue::from("completed"))
        .expect("valid status");
    assert_eq!(drawer.detail().map(|d| d.status), Some(BookingStatus::Completed));

    let result = commit.run(&resource).await;
    let outcome = drawer.settle(commit.mutation_id, result);
    match &outcome {
        MutationOutcome::RolledBack(err) => assert_eq!(err.user_message(), "conflict"),
        other => panic!("expected rollback, got {other:?}"),
    }
    assert!(!outcome.refreshes_list());
    assert_eq!(drawer.detail().map(|d| d.status), Some(BookingStatus::InProgress));
    assert_eq!(drawer.mutations()[0].status, MutationStatus::RolledBack);

    let put = transport
        .requests()
        .into_iter()
        .find(|r| r.method == HttpMethod::Put)
        .expect("commit sent");
    assert_eq!(put.body, Some(json!({ "status": "completed" })));
}

#[tokio::test]
async fn structured_rejection_on_success_status_still_rolls_back() {
    let transport = ScriptedTransport::new(|request| match request.method {
        HttpMethod::Put => Ok(ApiResponse::ok(json!({
            "success": false,
            "error": { "code": "CONFLICT" }
        }))),
        _ => booking_backend(request),
    });
    let resource = RemoteResource::new(BookingsAdapter, transport.clone());
    let mut drawer = DetailDrawer::new();
    let ticket = drawer.open("b1").expect("fetch");
    drawer.apply(ticket.run(&resource).await);

    let outcome = drawer
        .mutate_with(&resource, "status", FieldValue::from("completed"))
        .await
        .expect("valid status");
    match &outcome {
        MutationOutcome::RolledBack(err) => {
            assert_eq!(err.user_message(), marketdesk_core::FALLBACK_MESSAGE)
        }
        other => panic!("expected rollback, got {other:?}"),
    }
    assert!(!outcome.refreshes_list());
    assert_eq!(drawer.detail().map(|d| d.status), Some(BookingStatus::InProgress));
}

#[tokio::test]
async fn invalid_status_never_reaches_the_network() {
    let transport = ScriptedTransport::new(booking_backend);
    let resource = RemoteResource::new(BookingsAdapter, transport.clone());
    let mut drawer = DetailDrawer::new();
    let ticket = drawer.open("b1").expect("fetch");
    drawer.apply(ticket.run(&resource).await);

    let err = drawer
        .mutate("status", FieldValue::from("archived"))
        .expect_err("unknown status");
    assert!(matches!(err, ConsoleError::Validation { .. }));
    assert_eq!(drawer.pending_count(), 0);
    assert!(transport.requests().iter().all(|r| r.method == HttpMethod::Get));
}

#[tokio::test]
async fn plan_create_and_delete_use_the_envelope() {
    let transport = ScriptedTransport::new(|request| match request.method {
        HttpMethod::Post => Ok(ApiResponse::new(201, json!({ "success": true, "data": { "_id": "p9" } }))),
        HttpMethod::Delete => Ok(ApiResponse::new(204, Value::Null)),
        _ => Ok(ApiResponse::new(405, Value::Null)),
    });
    let resource = RemoteResource::new(PlansAdapter, transport.clone());

    let draft = NewPlan {
        name: "Starter".to_string(),
        description: String::new(),
        price: 0.0,
        duration_days: 14,
        features: vec!["Basic listing".to_string()],
    };
    resource.create(&draft).await.expect("created");
    resource.delete("p9").await.expect("deleted");

    let invalid = NewPlan {
        duration_days: 0,
        ..draft
    };
    assert!(resource.create(&invalid).await.is_err());
    assert_eq!(transport.requests().len(), 2);
}
