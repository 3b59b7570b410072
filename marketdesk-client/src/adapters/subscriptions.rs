use super::common::{
    format_amount, format_timestamp, non_blank, parse_timestamp, party_name, populated, yes_no,
    PartyInfo, PaymentLine, RawParty, RawPayment, RecordKey, Related,
};
use super::{
    detail_from_envelope, page_from_envelope, FieldAction, ResourceAdapter, UNKNOWN_PLAN,
    UNKNOWN_USER,
};
use crate::envelope::ApiResponse;
use marketdesk_core::field::unknown_field;
use marketdesk_core::{
    ConsoleError, ConsoleResult, Describe, FieldValue, PageRequest, PageResult, Patchable,
    Tabular, Timestamp,
};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Active,
    Pending,
    Cancelled,
    Expired,
    Unknown,
}

impl SubscriptionStatus {
    pub const WIRE_VALUES: &'static [&'static str] = &["active", "pending", "cancelled", "expired"];

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => SubscriptionStatus::Active,
            "pending" => SubscriptionStatus::Pending,
            "cancelled" | "canceled" => SubscriptionStatus::Cancelled,
            "expired" => SubscriptionStatus::Expired,
            _ => SubscriptionStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawPlanRef {
    #[serde(flatten)]
    key: RecordKey,
    name: Option<String>,
    price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawSubscription {
    #[serde(flatten)]
    key: RecordKey,
    user: Option<Related<RawParty>>,
    provider: Option<Related<RawParty>>,
    plan: Option<Related<RawPlanRef>>,
    status: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    amount: Option<f64>,
    auto_renew: Option<bool>,
    payments: Option<Vec<RawPayment>>,
    created_at: Option<String>,
}

impl RawSubscription {
    /// The subscriber is the provider when present, else the user.
    fn subscriber(&self) -> &Option<Related<RawParty>> {
        if populated(&self.provider).is_some() {
            &self.provider
        } else {
            &self.user
        }
    }

    fn plan_name(&self) -> String {
        populated(&self.plan)
            .and_then(|plan| non_blank(&plan.name))
            .unwrap_or_else(|| UNKNOWN_PLAN.to_string())
    }

    fn plan_id(&self) -> Option<String> {
        match &self.plan {
            Some(Related::Populated(plan)) => Some(plan.key.resolve()).filter(|id| !id.is_empty()),
            Some(Related::Reference(id)) => Some(id.clone()),
            None => None,
        }
    }

    fn status(&self) -> SubscriptionStatus {
        self.status
            .as_deref()
            .map(SubscriptionStatus::parse)
            .unwrap_or(SubscriptionStatus::Unknown)
    }

    fn amount(&self) -> f64 {
        self.amount
            .or_else(|| populated(&self.plan).and_then(|plan| plan.price))
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionSummary {
    pub id: String,
    pub subscriber: String,
    pub plan: String,
    pub status: SubscriptionStatus,
    pub amount: f64,
    pub ends_at: Option<Timestamp>,
}

impl From<RawSubscription> for SubscriptionSummary {
    fn from(raw: RawSubscription) -> Self {
        Self {
            id: raw.key.resolve(),
            subscriber: party_name(raw.subscriber(), UNKNOWN_USER),
            plan: raw.plan_name(),
            status: raw.status(),
            amount: raw.amount(),
            ends_at: parse_timestamp(raw.end_date.as_deref()),
        }
    }
}

impl Tabular for SubscriptionSummary {
    fn headers() -> &'static [&'static str] {
        &["Subscriber", "Plan", "Amount", "Ends", "Status"]
    }

    fn row_id(&self) -> &str {
        &self.id
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.subscriber.clone(),
            self.plan.clone(),
            format_amount(self.amount),
            format_timestamp(self.ends_at),
            self.status.as_str().to_string(),
        ]
    }

    fn status_label(&self) -> &str {
        self.status.as_str()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionDetail {
    pub id: String,
    pub subscriber: PartyInfo,
    pub plan: String,
    pub plan_id: Option<String>,
    pub status: SubscriptionStatus,
    pub amount: f64,
    pub auto_renew: bool,
    pub starts_at: Option<Timestamp>,
    pub ends_at: Option<Timestamp>,
    pub created_at: Option<Timestamp>,
    pub payments: Vec<PaymentLine>,
}

impl From<RawSubscription> for SubscriptionDetail {
    fn from(mut raw: RawSubscription) -> Self {
        let payments = raw
            .payments
            .take()
            .unwrap_or_default()
            .into_iter()
            .map(PaymentLine::from)
            .collect();
        Self {
            id: raw.key.resolve(),
            subscriber: PartyInfo::from_related(raw.subscriber(), UNKNOWN_USER),
            plan: raw.plan_name(),
            plan_id: raw.plan_id(),
            status: raw.status(),
            amount: raw.amount(),
            auto_renew: raw.auto_renew.unwrap_or(false),
            starts_at: parse_timestamp(raw.start_date.as_deref()),
            ends_at: parse_timestamp(raw.end_date.as_deref()),
            created_at: parse_timestamp(raw.created_at.as_deref()),
            payments,
        }
    }
}

impl Describe for SubscriptionDetail {
    fn title(&self) -> String {
        format!("{} ({})", self.subscriber.name, self.plan)
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Status", self.status.as_str().to_string()),
            ("Subscriber", self.subscriber.name.clone()),
            ("Email", self.subscriber.email.clone()),
            ("Plan", self.plan.clone()),
            ("Amount", format_amount(self.amount)),
            ("Auto renew", yes_no(self.auto_renew)),
            ("Starts", format_timestamp(self.starts_at)),
            ("Ends", format_timestamp(self.ends_at)),
        ]
    }

    fn sections(&self) -> Vec<(&'static str, Vec<String>)> {
        vec![(
            "Payments",
            self.payments.iter().map(PaymentLine::describe).collect(),
        )]
    }
}

impl Patchable for SubscriptionDetail {
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
                let status = SubscriptionStatus::parse(text);
                if status == SubscriptionStatus::Unknown
                    && text != SubscriptionStatus::Unknown.as_str()
                {
                    return Err(ConsoleError::validation(
                        field,
                        format!(
                            "must be one of: {}",
                            SubscriptionStatus::WIRE_VALUES.join(", ")
                        ),
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

/// `/admin/subscriptions`. The `plan` filter is sent as `planId`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscriptionsAdapter;

impl ResourceAdapter for SubscriptionsAdapter {
    type Summary = SubscriptionSummary;
    type Detail = SubscriptionDetail;

    fn name(&self) -> &'static str {
        "Subscriptions"
    }

    fn base_path(&self) -> &'static str {
        "/admin/subscriptions"
    }

    fn items_key(&self) -> &'static str {
        "subscriptions"
    }

    fn record_key(&self) -> &'static str {
        "subscription"
    }

    fn field_actions(&self) -> &'static [FieldAction] {
        const ACTIONS: &[FieldAction] = &[FieldAction::choice(
            STATUS,
            "status",
            SubscriptionStatus::WIRE_VALUES,
        )];
        ACTIONS
    }

    fn status_filters(&self) -> &'static [&'static str] {
        SubscriptionStatus::WIRE_VALUES
    }

    /// Cancel an active subscription; reactivate anything else.
    fn primary_action(&self, detail: &SubscriptionDetail) -> Option<(&'static str, FieldValue)> {
        let next = match detail.status {
            SubscriptionStatus::Active => SubscriptionStatus::Cancelled,
            SubscriptionStatus::Unknown => return None,
            _ => SubscriptionStatus::Active,
        };
        Some((STATUS, FieldValue::Text(next.as_str().to_string())))
    }

    fn filter_query(&self, key: &str, value: &str) -> Option<(String, String)> {
        let key = if key == "plan" { "planId" } else { key };
        Some((key.to_string(), value.to_string()))
    }

    fn from_list_response(
        &self,
        response: ApiResponse,
        request: &PageRequest,
    ) -> ConsoleResult<PageResult<SubscriptionSummary>> {
        page_from_envelope::<RawSubscription, _>(response, self.items_key(), request)
    }

    fn from_detail_response(&self, response: ApiResponse) -> ConsoleResult<SubscriptionDetail> {
        detail_from_envelope::<RawSubscription, _>(response, self.record_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketdesk_core::SortDirection;
    use serde_json::json;

    #[test]
    fn total_pages_naming_and_plan_fallback() {
        let response = ApiResponse::ok(json!({
            "success": true,
            "data": {
                "subscriptions": [
                    { "_id": "s1", "status": "active", "plan": "plan-1", "user": { "name": "Kim" } },
                    { "_id": "s2", "status": "expired", "plan": { "_id": "plan-2", "name": "Pro", "price": 49.0 } }
                ],
                "pagination": { "page": 1, "totalPages": 1, "total": 2 }
            }
        }));
        let request = PageRequest::new(10, "createdAt", SortDirection::Desc);
        let page = SubscriptionsAdapter
            .from_list_response(response, &request)
            .expect("decodes");
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.items[0].plan, UNKNOWN_PLAN);
        assert_eq!(page.items[0].subscriber, "Kim");
        assert_eq!(page.items[1].plan, "Pro");
        assert_eq!(page.items[1].amount, 49.0);
        assert_eq!(page.items[1].subscriber, UNKNOWN_USER);
    }

    #[test]
    fn plan_filter_is_sent_as_plan_id() {
        let request = PageRequest::new(10, "createdAt", SortDirection::Asc).with_filter("plan", "p9");
        let api = SubscriptionsAdapter.to_list_request(&request);
        assert_eq!(api.query_value("planId"), Some("p9"));
        assert_eq!(api.query_value("sortOrder"), Some("asc"));
    }

    #[test]
    fn primary_action_cancels_active() {
        let response = ApiResponse::ok(json!({
            "success": true,
            "data": { "subscription": { "_id": "s1", "status": "active" } }
        }));
        let detail = SubscriptionsAdapter
            .from_detail_response(response)
            .expect("decodes");
        assert_eq!(
            SubscriptionsAdapter.primary_action(&detail),
            Some((STATUS, FieldValue::from("cancelled")))
        );
    }
}
