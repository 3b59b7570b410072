use super::common::{
    clamp_rating, format_timestamp, non_blank, parse_timestamp, party_name, populated, yes_no,
    PartyInfo, RawParty, RecordKey, Related,
};
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

const EXCERPT_CHARS: usize = 48;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawReview {
    #[serde(flatten)]
    key: RecordKey,
    rating: Option<f64>,
    comment: Option<String>,
    customer: Option<Related<RawParty>>,
    provider: Option<Related<RawParty>>,
    service: Option<Related<RawServiceRef>>,
    booking: Option<Related<RecordKey>>,
    is_visible: Option<bool>,
    provider_response: Option<String>,
    created_at: Option<String>,
}

impl RawReview {
    fn comment(&self) -> String {
        non_blank(&self.comment).unwrap_or_default()
    }

    fn booking_id(&self) -> Option<String> {
        match &self.booking {
            Some(Related::Populated(key)) => Some(key.resolve()).filter(|id| !id.is_empty()),
            Some(Related::Reference(id)) => Some(id.clone()),
            None => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSummary {
    pub id: String,
    pub author: String,
    pub provider: String,
    pub rating: u8,
    pub excerpt: String,
    pub is_visible: bool,
    pub created_at: Option<Timestamp>,
}

impl From<RawReview> for ReviewSummary {
    fn from(raw: RawReview) -> Self {
        Self {
            id: raw.key.resolve(),
            author: party_name(&raw.customer, UNKNOWN_CUSTOMER),
            provider: party_name(&raw.provider, UNKNOWN_PROVIDER),
            rating: clamp_rating(raw.rating),
            excerpt: excerpt(&raw.comment()),
            is_visible: raw.is_visible.unwrap_or(true),
            created_at: parse_timestamp(raw.created_at.as_deref()),
        }
    }
}

fn excerpt(comment: &str) -> String {
    if comment.chars().count() <= EXCERPT_CHARS {
        return comment.to_string();
    }
    let cut: String = comment.chars().take(EXCERPT_CHARS - 1).collect();
    format!("{}…", cut.trim_end())
}

impl Tabular for ReviewSummary {
    fn headers() -> &'static [&'static str] {
        &["Author", "Provider", "Rating", "Comment", "Status", "Posted"]
    }

    fn row_id(&self) -> &str {
        &self.id
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.author.clone(),
            self.provider.clone(),
            stars(self.rating),
            self.excerpt.clone(),
            self.status_label().to_string(),
            format_timestamp(self.created_at),
        ]
    }

    fn status_label(&self) -> &str {
        visibility_label(self.is_visible)
    }
}

fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDetail {
    pub id: String,
    pub author: PartyInfo,
    pub provider: String,
    pub service: String,
    pub booking_id: Option<String>,
    pub rating: u8,
    pub comment: String,
    pub provider_response: String,
    pub is_visible: bool,
    pub created_at: Option<Timestamp>,
}

impl From<RawReview> for ReviewDetail {
    fn from(raw: RawReview) -> Self {
        Self {
            id: raw.key.resolve(),
            author: PartyInfo::from_related(&raw.customer, UNKNOWN_CUSTOMER),
            provider: party_name(&raw.provider, UNKNOWN_PROVIDER),
            service: populated(&raw.service)
                .and_then(RawServiceRef::label)
                .unwrap_or_else(|| UNKNOWN_SERVICE.to_string()),
            booking_id: raw.booking_id(),
            rating: clamp_rating(raw.rating),
            comment: raw.comment(),
            provider_response: non_blank(&raw.provider_response).unwrap_or_default(),
            is_visible: raw.is_visible.unwrap_or(true),
            created_at: parse_timestamp(raw.created_at.as_deref()),
        }
    }
}

impl Describe for ReviewDetail {
    fn title(&self) -> String {
        format!("{} on {}", self.author.name, self.provider)
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Rating", stars(self.rating)),
            ("Visible", yes_no(self.is_visible)),
            ("Author", self.author.name.clone()),
            ("Author email", self.author.email.clone()),
            ("Provider", self.provider.clone()),
            ("Service", self.service.clone()),
            (
                "Booking",
                self.booking_id.clone().unwrap_or_else(|| "-".to_string()),
            ),
            ("Posted", format_timestamp(self.created_at)),
        ]
    }

    fn sections(&self) -> Vec<(&'static str, Vec<String>)> {
        let mut sections = vec![("Comment", lines(&self.comment))];
        if !self.provider_response.is_empty() {
            sections.push(("Provider response", lines(&self.provider_response)));
        }
        sections
    }
}

fn lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

impl Patchable for ReviewDetail {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn read_field(&self, field: &str) -> Option<FieldValue> {
        match field {
            IS_VISIBLE => Some(FieldValue::Flag(self.is_visible)),
            _ => None,
        }
    }

    fn write_field(&mut self, field: &str, value: FieldValue) -> Result<(), ConsoleError> {
        match field {
            IS_VISIBLE => {
                self.is_visible = value.expect_flag(field)?;
                Ok(())
            }
            _ => Err(unknown_field(field)),
        }
    }
}

const IS_VISIBLE: &str = "isVisible";

fn visibility_label(visible: bool) -> &'static str {
    if visible {
        "visible"
    } else {
        "hidden"
    }
}

/// `/admin/reviews`. The `status` filter maps onto `isVisible`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewsAdapter;

impl ResourceAdapter for ReviewsAdapter {
    type Summary = ReviewSummary;
    type Detail = ReviewDetail;

    fn name(&self) -> &'static str {
        "Reviews"
    }

    fn base_path(&self) -> &'static str {
        "/admin/reviews"
    }

    fn items_key(&self) -> &'static str {
        "reviews"
    }

    fn record_key(&self) -> &'static str {
        "review"
    }

    fn field_actions(&self) -> &'static [FieldAction] {
        const ACTIONS: &[FieldAction] = &[FieldAction::flag(IS_VISIBLE, "visibility")];
        ACTIONS
    }

    fn status_filters(&self) -> &'static [&'static str] {
        &["visible", "hidden"]
    }

    fn primary_action(&self, detail: &ReviewDetail) -> Option<(&'static str, FieldValue)> {
        Some((IS_VISIBLE, FieldValue::Flag(!detail.is_visible)))
    }

    fn filter_query(&self, key: &str, value: &str) -> Option<(String, String)> {
        match (key, value) {
            ("status", "visible") => Some((IS_VISIBLE.to_string(), "true".to_string())),
            ("status", "hidden") => Some((IS_VISIBLE.to_string(), "false".to_string())),
            ("status", _) => None,
            _ => Some((key.to_string(), value.to_string())),
        }
    }

    fn from_list_response(
        &self,
        response: ApiResponse,
        request: &PageRequest,
    ) -> ConsoleResult<PageResult<ReviewSummary>> {
        page_from_envelope::<RawReview, _>(response, self.items_key(), request)
    }

    fn from_detail_response(&self, response: ApiResponse) -> ConsoleResult<ReviewDetail> {
        detail_from_envelope::<RawReview, _>(response, self.record_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn review_detail_tolerates_missing_relations() {
        let response = ApiResponse::ok(json!({
            "success": true,
            "data": { "_id": "r1", "rating": 4.6, "comment": "Great", "booking": "b7" }
        }));
        let detail = ReviewsAdapter.from_detail_response(response).expect("decodes");
        assert_eq!(detail.author.name, UNKNOWN_CUSTOMER);
        assert_eq!(detail.provider, UNKNOWN_PROVIDER);
        assert_eq!(detail.service, UNKNOWN_SERVICE);
        assert_eq!(detail.booking_id.as_deref(), Some("b7"));
        assert_eq!(detail.rating, 5);
        assert!(detail.is_visible);
    }

    #[test]
    fn visibility_mutation_body() {
        let api = ReviewsAdapter
            .to_mutation_request("r1", IS_VISIBLE, &FieldValue::Flag(false))
            .expect("valid");
        assert_eq!(api.path, "/admin/reviews/r1/visibility");
        assert_eq!(api.body, Some(json!({ "isVisible": false })));
    }

    #[test]
    fn long_comments_are_shortened() {
        let long = "word ".repeat(30);
        let short = excerpt(&long);
        assert!(short.chars().count() <= EXCERPT_CHARS);
        assert!(short.ends_with('…'));
        assert_eq!(stars(3), "★★★☆☆");
    }
}
