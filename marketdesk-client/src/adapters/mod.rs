//! Resource adapters.
//!
//! An adapter is a pure mapping between controller-level page state and one
//! backend resource: it builds the [`ApiRequest`] for a list, detail,
//! mutation or delete call and normalizes the response into the typed
//! summary and detail models. Adapters never perform I/O and never retry;
//! [`crate::remote::RemoteResource`] pairs one with a transport.

mod common;

pub mod bookings;
pub mod notifications;
pub mod plans;
pub mod providers;
pub mod reviews;
pub mod subscriptions;
pub mod users;

pub use bookings::{BookingDetail, BookingStatus, BookingSummary, BookingsAdapter};
pub use common::{format_amount, format_timestamp, PartyInfo, PaymentLine, ReviewLine, NOT_PROVIDED};
pub use notifications::{
    Audience, NewNotification, NotificationDetail, NotificationLine, NotificationSummary,
    NotificationsAdapter,
};
pub use plans::{NewPlan, PlanDetail, PlanSummary, PlansAdapter};
pub use providers::{ProviderDetail, ProviderSummary, ProvidersAdapter};
pub use reviews::{ReviewDetail, ReviewSummary, ReviewsAdapter};
pub use subscriptions::{
    SubscriptionDetail, SubscriptionStatus, SubscriptionSummary, SubscriptionsAdapter,
};
pub use users::{UserDetail, UserRole, UserSummary, UsersAdapter};

use crate::envelope::{decode, into_data, ApiResponse};
use crate::request::ApiRequest;
use marketdesk_core::{
    ConsoleError, ConsoleResult, Describe, FieldValue, PageRequest, PageResult, Patchable,
    SortDirection, Tabular,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub const UNKNOWN_CUSTOMER: &str = "Unknown Customer";
pub const UNKNOWN_PROVIDER: &str = "Unknown Provider";
pub const UNKNOWN_SERVICE: &str = "Unknown Service";
pub const UNKNOWN_USER: &str = "Unknown User";
pub const UNKNOWN_PLAN: &str = "Unknown Plan";

/// Shape a mutable field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Flag,
    /// Text restricted to the listed values.
    Choice(&'static [&'static str]),
}

/// A field the console may change and the endpoint that changes it:
/// `PUT <base>/:id/<action>` with body `{ <field>: value }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAction {
    pub field: &'static str,
    pub action: &'static str,
    pub kind: FieldKind,
}

impl FieldAction {
    pub const fn flag(field: &'static str, action: &'static str) -> Self {
        Self {
            field,
            action,
            kind: FieldKind::Flag,
        }
    }

    pub const fn choice(
        field: &'static str,
        action: &'static str,
        allowed: &'static [&'static str],
    ) -> Self {
        Self {
            field,
            action,
            kind: FieldKind::Choice(allowed),
        }
    }

    /// Check `value` against the field kind and return its JSON form.
    pub fn validate(&self, value: &FieldValue) -> ConsoleResult<Value> {
        match self.kind {
            FieldKind::Flag => value.expect_flag(self.field).map(Value::Bool),
            FieldKind::Choice(allowed) => {
                let text = value.expect_text(self.field)?;
                if allowed.contains(&text) {
                    Ok(Value::String(text.to_string()))
                } else {
                    Err(ConsoleError::validation(
                        self.field,
                        format!("must be one of: {}", allowed.join(", ")),
                    ))
                }
            }
        }
    }
}

pub trait ResourceAdapter: Send + Sync + 'static {
    type Summary: Tabular + Clone + Send + Sync + 'static;
    type Detail: Patchable + Describe + Clone + Send + Sync + 'static;

    /// Human name, used in titles and logs.
    fn name(&self) -> &'static str;

    /// Collection path relative to the API base URL.
    fn base_path(&self) -> &'static str;

    /// Key of the item array inside `data` of a list response.
    fn items_key(&self) -> &'static str;

    /// Key under which a detail response may wrap the record.
    fn record_key(&self) -> &'static str;

    /// Fields the console may change.
    fn field_actions(&self) -> &'static [FieldAction];

    fn default_sort(&self) -> (&'static str, SortDirection) {
        ("createdAt", SortDirection::Desc)
    }

    /// Values the console cycles through for the `status` filter.
    fn status_filters(&self) -> &'static [&'static str] {
        &[]
    }

    /// The one-key action for an open record: the field to change and the
    /// value it should take next. `None` when the record is terminal.
    fn primary_action(&self, detail: &Self::Detail) -> Option<(&'static str, FieldValue)>;

    /// Translate one controller filter into a query pair. Blank values are
    /// dropped before this is called.
    fn filter_query(&self, key: &str, value: &str) -> Option<(String, String)> {
        Some((key.to_string(), value.to_string()))
    }

    fn to_list_request(&self, request: &PageRequest) -> ApiRequest {
        let mut api = ApiRequest::get(self.base_path())
            .query("page", request.page_number)
            .query("limit", request.page_size);
        for (key, value) in &request.filters {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if let Some((param, value)) = self.filter_query(key, value) {
                api = api.query_non_empty(param, Some(value.as_str()));
            }
        }
        api.query_non_empty("sortBy", Some(request.sort_field.as_str()))
            .query("sortOrder", request.sort_direction.as_query())
    }

    fn from_list_response(
        &self,
        response: ApiResponse,
        request: &PageRequest,
    ) -> ConsoleResult<PageResult<Self::Summary>>;

    fn to_detail_request(&self, id: &str) -> ApiRequest {
        ApiRequest::get(format!("{}/{}", self.base_path(), id))
    }

    fn from_detail_response(&self, response: ApiResponse) -> ConsoleResult<Self::Detail>;

    fn to_mutation_request(
        &self,
        id: &str,
        field: &str,
        value: &FieldValue,
    ) -> ConsoleResult<ApiRequest> {
        let action = self
            .field_actions()
            .iter()
            .find(|action| action.field == field)
            .ok_or_else(|| marketdesk_core::field::unknown_field(field))?;
        let body = action.validate(value)?;
        let mut payload = Map::new();
        payload.insert(action.field.to_string(), body);
        Ok(ApiRequest::put(
            format!("{}/{}/{}", self.base_path(), id, action.action),
            Value::Object(payload),
        ))
    }

    fn to_delete_request(&self, id: &str) -> ApiRequest {
        ApiRequest::delete(format!("{}/{}", self.base_path(), id))
    }
}

/// Adapters whose resource can be created from the console.
pub trait CreateAdapter: ResourceAdapter {
    type Draft: Send + Sync;

    /// Validate `draft` and build the create call. Invalid input never
    /// produces a request.
    fn to_create_request(&self, draft: &Self::Draft) -> ConsoleResult<ApiRequest>;
}

/// Decode a list envelope: items under `items_key`, pagination under
/// `pagination` in any of the naming variants the backend uses.
pub(crate) fn page_from_envelope<W, T>(
    response: ApiResponse,
    items_key: &str,
    request: &PageRequest,
) -> ConsoleResult<PageResult<T>>
where
    W: DeserializeOwned,
    T: From<W>,
{
    let data = into_data(response)?;
    let Value::Object(mut data) = data else {
        return Err(ConsoleError::decode("list payload is not an object"));
    };
    let raw_items = match data.remove(items_key) {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => Vec::new(),
        Some(_) => {
            return Err(ConsoleError::decode(format!("`{}` is not an array", items_key)));
        }
    };
    // A malformed row is dropped rather than failing the whole page.
    let items: Vec<T> = raw_items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match decode::<W>(item, items_key) {
            Ok(raw) => Some(T::from(raw)),
            Err(err) => {
                tracing::warn!(items_key, index, error = %err, "skipping undecodable list row");
                None
            }
        })
        .collect();

    let pagination = Pagination::from_value(data.get("pagination"));
    if let Some(page) = pagination.page {
        if page != u64::from(request.page_number) {
            tracing::debug!(
                requested = request.page_number,
                reported = page,
                items_key,
                "server reported a different page number"
            );
        }
    }
    Ok(PageResult::normalize(
        items,
        pagination.total,
        request.page_size,
    ))
}

/// Decode a detail envelope. The record may be `data` itself or wrapped
/// under `record_key`, with related collections as siblings.
pub(crate) fn detail_from_envelope<W, D>(response: ApiResponse, record_key: &str) -> ConsoleResult<D>
where
    W: DeserializeOwned,
    D: From<W>,
{
    let data = into_data(response)?;
    if !data.is_object() {
        return Err(ConsoleError::decode(format!("{} payload is not an object", record_key)));
    }
    let record = unwrap_record(data, record_key);
    decode::<W>(record, record_key).map(D::from)
}

fn unwrap_record(data: Value, record_key: &str) -> Value {
    let Value::Object(mut outer) = data else {
        return data;
    };
    match outer.remove(record_key) {
        Some(Value::Object(mut record)) => {
            for (key, value) in outer {
                record.entry(key).or_insert(value);
            }
            Value::Object(record)
        }
        Some(other) => {
            outer.insert(record_key.to_string(), other);
            Value::Object(outer)
        }
        None => Value::Object(outer),
    }
}

/// Pagination block after naming normalization.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pagination {
    pub page: Option<u64>,
    pub pages: Option<u64>,
    pub total: Option<u64>,
}

const TOTAL_KEYS: &[&str] = &["total", "totalItems", "totalNotifications", "totalCount", "count"];
const PAGES_KEYS: &[&str] = &["pages", "totalPages"];
const PAGE_KEYS: &[&str] = &["page", "currentPage"];

impl Pagination {
    pub(crate) fn from_value(value: Option<&Value>) -> Self {
        let Some(Value::Object(map)) = value else {
            return Self::default();
        };
        Self {
            page: first_number(map, PAGE_KEYS),
            pages: first_number(map, PAGES_KEYS),
            total: first_number(map, TOTAL_KEYS),
        }
    }
}

fn first_number(map: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
