use super::common::{
    format_amount, format_timestamp, non_blank, parse_timestamp, party_name, populated, PartyInfo,
    PaymentLine, RawParty, RawPayment, RawReviewLine, RecordKey, Related, ReviewLine,
    NOT_PROVIDED,
};
use super::notifications::{NotificationLine, RawNotification};
use super::providers::RawServiceRef;
use super::{
    detail_from_envelope, page_from_envelope, FieldAction, ResourceAdapter, UNKNOWN_CUSTOMER,
    UNKNOWN_PROVIDER, UNKNOWN_SERVICE,
};
use crate::envelope::ApiResponse;
use marketdesk_core::field::unknown_field;
use marketdesk_core::{
    ConsoleError, ConsoleResult, Describe, FieldValue, PageRequest, PageResult, Patchable,
    Tabular, Timestamp,
};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Unknown,
}

impl BookingStatus {
    pub const WIRE_VALUES: &'static [&'static str] =
        &["pending", "confirmed", "in-progress", "completed", "cancelled"];

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => BookingStatus::Pending,
            "confirmed" => BookingStatus::Confirmed,
            "in-progress" | "in_progress" | "inprogress" => BookingStatus::InProgress,
            "completed" => BookingStatus::Completed,
            "cancelled" | "canceled" => BookingStatus::Cancelled,
            _ => BookingStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in-progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Unknown => "unknown",
        }
    }

    /// Next step in the normal lifecycle; terminal states have none.
    pub fn next(&self) -> Option<Self> {
        match self {
            BookingStatus::Pending => Some(BookingStatus::Confirmed),
            BookingStatus::Confirmed => Some(BookingStatus::InProgress),
            BookingStatus::InProgress => Some(BookingStatus::Completed),
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Unknown => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawBooking {
    #[serde(flatten)]
    key: RecordKey,
    customer: Option<Related<RawParty>>,
    provider: Option<Related<RawParty>>,
    service: Option<Related<RawServiceRef>>,
    status: Option<String>,
    payment_status: Option<String>,
    scheduled_date: Option<String>,
    booking_date: Option<String>,
    date: Option<String>,
    total_amount: Option<f64>,
    amount: Option<f64>,
    address: Option<String>,
    notes: Option<String>,
    created_at: Option<String>,
    payments: Option<Vec<RawPayment>>,
    reviews: Option<Vec<RawReviewLine>>,
    notifications: Option<Vec<RawNotification>>,
}

impl RawBooking {
    fn status(&self) -> BookingStatus {
        self.status
            .as_deref()
            .map(BookingStatus::parse)
            .unwrap_or(BookingStatus::Unknown)
    }

    fn service_name(&self) -> String {
        populated(&self.service)
            .and_then(RawServiceRef::label)
            .unwrap_or_else(|| UNKNOWN_SERVICE.to_string())
    }

    fn scheduled_at(&self) -> Option<Timestamp> {
        parse_timestamp(
            self.scheduled_date
                .as_deref()
                .or(self.booking_date.as_deref())
                .or(self.date.as_deref()),
        )
    }

    fn amount(&self) -> f64 {
        self.total_amount
            .or(self.amount)
            .or_else(|| populated(&self.service).and_then(|s| s.price))
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingSummary {
    pub id: String,
    pub customer: String,
    pub provider: String,
    pub service: String,
    pub status: BookingStatus,
    pub scheduled_at: Option<Timestamp>,
    pub amount: f64,
}

impl From<RawBooking> for BookingSummary {
    fn from(raw: RawBooking) -> Self {
        Self {
            id: raw.key.resolve(),
            customer: party_name(&raw.customer, UNKNOWN_CUSTOMER),
            provider: party_name(&raw.provider, UNKNOWN_PROVIDER),
            service: raw.service_name(),
            status: raw.status(),
            scheduled_at: raw.scheduled_at(),
            amount: raw.amount(),
        }
    }
}

impl Tabular for BookingSummary {
    fn headers() -> &'static [&'static str] {
        &["Customer", "Provider", "Service", "Scheduled", "Amount", "Status"]
    }

    fn row_id(&self) -> &str {
        &self.id
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.customer.clone(),
            self.provider.clone(),
            self.service.clone(),
            format_timestamp(self.scheduled_at),
            format_amount(self.amount),
            self.status.as_str().to_string(),
        ]
    }

    fn status_label(&self) -> &str {
        self.status.as_str()
    }
}

/// A booking with its customer, provider, payments, reviews and the
/// notifications sent about it.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDetail {
    pub id: String,
    pub customer: PartyInfo,
    pub provider: PartyInfo,
    pub service: String,
    pub status: BookingStatus,
    pub payment_status: String,
    pub scheduled_at: Option<Timestamp>,
    pub amount: f64,
    pub address: String,
    pub notes: String,
    pub created_at: Option<Timestamp>,
    pub payments: Vec<PaymentLine>,
    pub reviews: Vec<ReviewLine>,
    pub notifications: Vec<NotificationLine>,
}

impl From<RawBooking> for BookingDetail {
    fn from(mut raw: RawBooking) -> Self {
        let payments = raw
            .payments
            .take()
            .unwrap_or_default()
            .into_iter()
            .map(PaymentLine::from)
            .collect();
        let reviews = raw
            .reviews
            .take()
            .unwrap_or_default()
            .into_iter()
            .map(ReviewLine::from)
            .collect();
        let notifications = raw
            .notifications
            .take()
            .unwrap_or_default()
            .into_iter()
            .map(NotificationLine::from)
            .collect();
        Self {
            id: raw.key.resolve(),
            customer: PartyInfo::from_related(&raw.customer, UNKNOWN_CUSTOMER),
            provider: PartyInfo::from_related(&raw.provider, UNKNOWN_PROVIDER),
            service: raw.service_name(),
            status: raw.status(),
            payment_status: non_blank(&raw.payment_status).unwrap_or_else(|| "unknown".to_string()),
            scheduled_at: raw.scheduled_at(),
            amount: raw.amount(),
            address: non_blank(&raw.address).unwrap_or_else(|| NOT_PROVIDED.to_string()),
            notes: non_blank(&raw.notes).unwrap_or_default(),
            created_at: parse_timestamp(raw.created_at.as_deref()),
            payments,
            reviews,
            notifications,
        }
    }
}

impl Describe for BookingDetail {
    fn title(&self) -> String {
        format!("{} for {}", self.service, self.customer.name)
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Status", self.status.as_str().to_string()),
            ("Customer", self.customer.name.clone()),
            ("Customer email", self.customer.email.clone()),
            ("Customer phone", self.customer.phone.clone()),
            ("Provider", self.provider.name.clone()),
            ("Provider email", self.provider.email.clone()),
            ("Scheduled", format_timestamp(self.scheduled_at)),
            ("Amount", format_amount(self.amount)),
            ("Payment", self.payment_status.clone()),
            ("Address", self.address.clone()),
            ("Notes", self.notes.clone()),
            ("Created", format_timestamp(self.created_at)),
        ]
    }

    fn sections(&self) -> Vec<(&'static str, Vec<String>)> {
        vec![
            ("Payments", self.payments.iter().map(PaymentLine::describe).collect()),
            ("Reviews", self.reviews.iter().map(ReviewLine::describe).collect()),
            (
                "Notifications",
                self.notifications
                    .iter()
                    .map(NotificationLine::describe)
                    .collect(),
            ),
        ]
    }
}

impl Patchable for BookingDetail {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn read_field(&self, field: &str) -> Option<FieldValue> {
        match field {
            STATUS => Some(FieldValue::Text(self.status.as_str().to_string())),
            _ => None,
        }
    }

    fn write_field(&mut self, field: &str, value: FieldValue) -> Result<(), ConsoleError> {
        match field {
            STATUS => {
                let text = value.expect_text(field)?;
                let status = BookingStatus::parse(text);
                // `unknown` itself is accepted so a rollback can restore it.
                if status == BookingStatus::Unknown && text != BookingStatus::Unknown.as_str() {
                    return Err(ConsoleError::validation(
                        field,
                        format!("must be one of: {}", BookingStatus::WIRE_VALUES.join(", ")),
                    ));
                }
                self.status = status;
                Ok(())
            }
            _ => Err(unknown_field(field)),
        }
    }
}

const STATUS: &str = "status";

/// `/admin/bookings`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingsAdapter;

impl ResourceAdapter for BookingsAdapter {
    type Summary = BookingSummary;
    type Detail = BookingDetail;

    fn name(&self) -> &'static str {
        "Bookings"
    }

    fn base_path(&self) -> &'static str {
        "/admin/bookings"
    }

    fn items_key(&self) -> &'static str {
        "bookings"
    }

    fn record_key(&self) -> &'static str {
        "booking"
    }

    fn field_actions(&self) -> &'static [FieldAction] {
        const ACTIONS: &[FieldAction] =
            &[FieldAction::choice(STATUS, "status", BookingStatus::WIRE_VALUES)];
        ACTIONS
    }

    fn status_filters(&self) -> &'static [&'static str] {
        BookingStatus::WIRE_VALUES
    }

    fn primary_action(&self, detail: &BookingDetail) -> Option<(&'static str, FieldValue)> {
        detail
            .status
            .next()
            .map(|next| (STATUS, FieldValue::Text(next.as_str().to_string())))
    }

    fn from_list_response(
        &self,
        response: ApiResponse,
        request: &PageRequest,
    ) -> ConsoleResult<PageResult<BookingSummary>> {
        page_from_envelope::<RawBooking, _>(response, self.items_key(), request)
    }

    fn from_detail_response(&self, response: ApiResponse) -> ConsoleResult<BookingDetail> {
        detail_from_envelope::<RawBooking, _>(response, self.record_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketdesk_core::SortDirection;
    use serde_json::json;

    #[test]
    fn missing_customer_reads_unknown_customer() {
        let response = ApiResponse::ok(json!({
            "success": true,
            "data": {
                "booking": {
                    "_id": "b1",
                    "status": "confirmed",
                    "provider": { "businessName": "Sparkle Co" },
                    "service": { "name": "Window cleaning", "price": 80 }
                },
                "payments": [{ "_id": "pay1", "amount": 80, "method": "card", "status": "paid" }],
                "reviews": []
            }
        }));
        let detail = BookingsAdapter.from_detail_response(response).expect("decodes");
        assert_eq!(detail.customer.name, UNKNOWN_CUSTOMER);
        assert_eq!(detail.provider.name, "Sparkle Co");
        assert_eq!(detail.service, "Window cleaning");
        assert_eq!(detail.amount, 80.0);
        assert_eq!(detail.payments.len(), 1);
        assert!(detail.notifications.is_empty());
    }

    #[test]
    fn unpopulated_references_use_fallbacks() {
        let response = ApiResponse::ok(json!({
            "success": true,
            "data": { "_id": "b2", "customer": "c1", "provider": null, "service": "s1" }
        }));
        let detail = BookingsAdapter.from_detail_response(response).expect("decodes");
        assert_eq!(detail.customer.name, UNKNOWN_CUSTOMER);
        assert_eq!(detail.customer.id.as_deref(), Some("c1"));
        assert_eq!(detail.provider.name, UNKNOWN_PROVIDER);
        assert_eq!(detail.service, UNKNOWN_SERVICE);
        assert_eq!(detail.status, BookingStatus::Unknown);
    }

    #[test]
    fn malformed_row_is_skipped_not_fatal() {
        let response = ApiResponse::ok(json!({
            "success": true,
            "data": {
                "bookings": [
                    { "_id": "b1", "status": "pending", "totalAmount": "80.00" },
                    { "_id": "b2", "status": "confirmed", "totalAmount": 45 }
                ],
                "pagination": { "total": 2, "pages": 1 }
            }
        }));
        let request = PageRequest::new(10, "createdAt", SortDirection::Desc);
        let page = BookingsAdapter
            .from_list_response(response, &request)
            .expect("page decodes");
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "b2");
        assert_eq!(page.total_items, 2);
    }

    #[test]
    fn empty_list_is_not_an_error() {
        let response = ApiResponse::ok(json!({
            "success": true,
            "data": { "bookings": [], "pagination": { "total": 0, "pages": 0 } }
        }));
        let request = PageRequest::new(10, "createdAt", SortDirection::Desc);
        let page = BookingsAdapter
            .from_list_response(response, &request)
            .expect("empty page");
        assert!(page.is_empty());
        assert_eq!(page.total_items, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn status_mutation_is_validated_before_any_request() {
        let err = BookingsAdapter
            .to_mutation_request("b1", STATUS, &FieldValue::from("archived"))
            .expect_err("not a booking status");
        assert!(matches!(err, ConsoleError::Validation { .. }));

        let api = BookingsAdapter
            .to_mutation_request("b1", STATUS, &FieldValue::from("completed"))
            .expect("valid");
        assert_eq!(api.path, "/admin/bookings/b1/status");
        assert_eq!(api.body, Some(json!({ "status": "completed" })));
    }

    #[test]
    fn lifecycle_advances_until_terminal() {
        assert_eq!(BookingStatus::Pending.next(), Some(BookingStatus::Confirmed));
        assert_eq!(BookingStatus::InProgress.next(), Some(BookingStatus::Completed));
        assert_eq!(BookingStatus::Completed.next(), None);
        assert_eq!(BookingStatus::parse("In_Progress"), BookingStatus::InProgress);
    }
}
