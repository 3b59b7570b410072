use super::common::{format_amount, format_timestamp, non_blank, parse_timestamp, yes_no, RecordKey};
use super::{
    detail_from_envelope, page_from_envelope, CreateAdapter, FieldAction, ResourceAdapter,
    UNKNOWN_PLAN,
};
use crate::envelope::ApiResponse;
use crate::request::ApiRequest;
use marketdesk_core::field::unknown_field;
use marketdesk_core::{
    ConsoleError, ConsoleResult, Describe, FieldValue, PageRequest, PageResult, Patchable,
    Tabular, Timestamp,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawPlan {
    #[serde(flatten)]
    key: RecordKey,
    name: Option<String>,
    description: Option<String>,
    price: Option<f64>,
    duration_days: Option<u32>,
    duration: Option<u32>,
    features: Option<Vec<String>>,
    is_active: Option<bool>,
    subscriber_count: Option<u64>,
    subscribers: Option<u64>,
    created_at: Option<String>,
}

impl RawPlan {
    fn name(&self) -> String {
        non_blank(&self.name).unwrap_or_else(|| UNKNOWN_PLAN.to_string())
    }

    fn duration_days(&self) -> u32 {
        self.duration_days.or(self.duration).unwrap_or(0)
    }

    fn subscribers(&self) -> u64 {
        self.subscriber_count.or(self.subscribers).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanSummary {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub duration_days: u32,
    pub is_active: bool,
    pub subscribers: u64,
}

impl From<RawPlan> for PlanSummary {
    fn from(raw: RawPlan) -> Self {
        Self {
            id: raw.key.resolve(),
            name: raw.name(),
            price: raw.price.unwrap_or(0.0),
            duration_days: raw.duration_days(),
            is_active: raw.is_active.unwrap_or(false),
            subscribers: raw.subscribers(),
        }
    }
}

impl Tabular for PlanSummary {
    fn headers() -> &'static [&'static str] {
        &["Name", "Price", "Days", "Subscribers", "Status"]
    }

    fn row_id(&self) -> &str {
        &self.id
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            format_amount(self.price),
            self.duration_days.to_string(),
            self.subscribers.to_string(),
            self.status_label().to_string(),
        ]
    }

    fn status_label(&self) -> &str {
        active_label(self.is_active)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanDetail {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration_days: u32,
    pub features: Vec<String>,
    pub is_active: bool,
    pub subscribers: u64,
    pub created_at: Option<Timestamp>,
}

impl From<RawPlan> for PlanDetail {
    fn from(raw: RawPlan) -> Self {
        Self {
            id: raw.key.resolve(),
            name: raw.name(),
            description: non_blank(&raw.description).unwrap_or_default(),
            price: raw.price.unwrap_or(0.0),
            duration_days: raw.duration_days(),
            subscribers: raw.subscribers(),
            features: raw
                .features
                .unwrap_or_default()
                .into_iter()
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect(),
            is_active: raw.is_active.unwrap_or(false),
            created_at: parse_timestamp(raw.created_at.as_deref()),
        }
    }
}

impl Describe for PlanDetail {
    fn title(&self) -> String {
        self.name.clone()
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Price", format_amount(self.price)),
            ("Duration", format!("{} days", self.duration_days)),
            ("Active", yes_no(self.is_active)),
            ("Subscribers", self.subscribers.to_string()),
            ("Created", format_timestamp(self.created_at)),
            ("Description", self.description.clone()),
        ]
    }

    fn sections(&self) -> Vec<(&'static str, Vec<String>)> {
        vec![("Features", self.features.clone())]
    }
}

impl Patchable for PlanDetail {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn read_field(&self, field: &str) -> Option<FieldValue> {
        match field {
            IS_ACTIVE => Some(FieldValue::Flag(self.is_active)),
            _ => None,
        }
    }

    fn write_field(&mut self, field: &str, value: FieldValue) -> Result<(), ConsoleError> {
        match field {
            IS_ACTIVE => {
                self.is_active = value.expect_flag(field)?;
                Ok(())
            }
            _ => Err(unknown_field(field)),
        }
    }
}

const IS_ACTIVE: &str = "isActive";

fn active_label(active: bool) -> &'static str {
    if active {
        "active"
    } else {
        "inactive"
    }
}

/// Plan composed in the console.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPlan {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration_days: u32,
    pub features: Vec<String>,
}

impl NewPlan {
    pub fn validate(&self) -> ConsoleResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConsoleError::validation("name", "must not be empty"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ConsoleError::validation("price", "must be zero or more"));
        }
        if self.duration_days < 1 {
            return Err(ConsoleError::validation("durationDays", "must be at least one day"));
        }
        Ok(())
    }

    fn trimmed_features(&self) -> Vec<String> {
        self.features
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// `/admin/subscription-plans`. Plans can also be created and deleted.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlansAdapter;

impl ResourceAdapter for PlansAdapter {
    type Summary = PlanSummary;
    type Detail = PlanDetail;

    fn name(&self) -> &'static str {
        "Plans"
    }

    fn base_path(&self) -> &'static str {
        "/admin/subscription-plans"
    }

    fn items_key(&self) -> &'static str {
        "plans"
    }

    fn record_key(&self) -> &'static str {
        "plan"
    }

    fn field_actions(&self) -> &'static [FieldAction] {
        const ACTIONS: &[FieldAction] = &[FieldAction::flag(IS_ACTIVE, "status")];
        ACTIONS
    }

    fn default_sort(&self) -> (&'static str, marketdesk_core::SortDirection) {
        ("price", marketdesk_core::SortDirection::Asc)
    }

    fn status_filters(&self) -> &'static [&'static str] {
        &["active", "inactive"]
    }

    fn primary_action(&self, detail: &PlanDetail) -> Option<(&'static str, FieldValue)> {
        Some((IS_ACTIVE, FieldValue::Flag(!detail.is_active)))
    }

    fn from_list_response(
        &self,
        response: ApiResponse,
        request: &PageRequest,
    ) -> ConsoleResult<PageResult<PlanSummary>> {
        page_from_envelope::<RawPlan, _>(response, self.items_key(), request)
    }

    fn from_detail_response(&self, response: ApiResponse) -> ConsoleResult<PlanDetail> {
        detail_from_envelope::<RawPlan, _>(response, self.record_key())
    }
}

impl CreateAdapter for PlansAdapter {
    type Draft = NewPlan;

    fn to_create_request(&self, draft: &NewPlan) -> ConsoleResult<ApiRequest> {
        draft.validate()?;
        Ok(ApiRequest::post(
            self.base_path(),
            json!({
                "name": draft.name.trim(),
                "description": draft.description.trim(),
                "price": draft.price,
                "durationDays": draft.duration_days,
                "features": draft.trimmed_features(),
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::HttpMethod;

    fn draft() -> NewPlan {
        NewPlan {
            name: "Pro".to_string(),
            description: "For busy providers".to_string(),
            price: 29.5,
            duration_days: 30,
            features: vec![" Priority listing ".to_string(), "  ".to_string()],
        }
    }

    #[test]
    fn invalid_plans_are_rejected_before_any_request() {
        let cases = [
            NewPlan { name: " ".to_string(), ..draft() },
            NewPlan { price: -1.0, ..draft() },
            NewPlan { price: f64::NAN, ..draft() },
            NewPlan { duration_days: 0, ..draft() },
        ];
        for plan in cases {
            let err = PlansAdapter.to_create_request(&plan).expect_err("invalid");
            assert!(matches!(err, ConsoleError::Validation { .. }));
        }
    }

    #[test]
    fn create_trims_features() {
        let api = PlansAdapter.to_create_request(&draft()).expect("valid");
        assert_eq!(api.method, HttpMethod::Post);
        assert_eq!(api.path, "/admin/subscription-plans");
        let body = api.body.expect("body");
        assert_eq!(body["features"], json!(["Priority listing"]));
        assert_eq!(body["durationDays"], 30);
    }

    #[test]
    fn delete_targets_the_record() {
        let api = PlansAdapter.to_delete_request("plan-1");
        assert_eq!(api.method, HttpMethod::Delete);
        assert_eq!(api.path, "/admin/subscription-plans/plan-1");
    }

    #[test]
    fn plans_items_key_is_plans() {
        let response = ApiResponse::ok(json!({
            "success": true,
            "data": { "plans": [{ "_id": "p1", "price": 10 }], "pagination": { "page": 1, "pages": 1, "total": 1 } }
        }));
        let request = PageRequest::new(10, "price", marketdesk_core::SortDirection::Asc);
        let page = PlansAdapter.from_list_response(response, &request).expect("decodes");
        assert_eq!(page.items[0].name, UNKNOWN_PLAN);
        assert_eq!(page.items[0].price, 10.0);
    }
}
