use super::common::{
    format_timestamp, non_blank, parse_timestamp, populated, yes_no, PartyInfo, RawParty,
    RawReviewLine, RecordKey, Related, ReviewLine,
};
use super::{
    detail_from_envelope, page_from_envelope, FieldAction, ResourceAdapter, UNKNOWN_PROVIDER,
    UNKNOWN_USER,
};
use crate::envelope::ApiResponse;
use marketdesk_core::field::unknown_field;
use marketdesk_core::{
    ConsoleError, ConsoleResult, Describe, FieldValue, PageRequest, PageResult, Patchable,
    Tabular, Timestamp,
};
use serde::Deserialize;

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawServiceRef {
    #[serde(flatten)]
    pub key: RecordKey,
    pub name: Option<String>,
    pub title: Option<String>,
    pub price: Option<f64>,
}

impl RawServiceRef {
    pub(crate) fn label(&self) -> Option<String> {
        non_blank(&self.name).or_else(|| non_blank(&self.title))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawProvider {
    #[serde(flatten)]
    key: RecordKey,
    business_name: Option<String>,
    name: Option<String>,
    user: Option<Related<RawParty>>,
    category: Option<String>,
    service_category: Option<String>,
    description: Option<String>,
    is_verified: Option<bool>,
    rating: Option<f64>,
    average_rating: Option<f64>,
    total_reviews: Option<u64>,
    review_count: Option<u64>,
    services: Option<Vec<Related<RawServiceRef>>>,
    reviews: Option<Vec<RawReviewLine>>,
    created_at: Option<String>,
}

impl RawProvider {
    fn business_name(&self) -> String {
        non_blank(&self.business_name)
            .or_else(|| non_blank(&self.name))
            .or_else(|| populated(&self.user).and_then(RawParty::display_name))
            .unwrap_or_else(|| UNKNOWN_PROVIDER.to_string())
    }

    fn category(&self) -> String {
        non_blank(&self.category)
            .or_else(|| non_blank(&self.service_category))
            .unwrap_or_else(|| "-".to_string())
    }

    fn rating(&self) -> f64 {
        self.rating.or(self.average_rating).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSummary {
    pub id: String,
    pub business_name: String,
    pub owner: String,
    pub category: String,
    pub is_verified: bool,
    pub rating: f64,
    pub created_at: Option<Timestamp>,
}

impl From<RawProvider> for ProviderSummary {
    fn from(raw: RawProvider) -> Self {
        Self {
            id: raw.key.resolve(),
            business_name: raw.business_name(),
            owner: super::common::party_name(&raw.user, UNKNOWN_USER),
            category: raw.category(),
            is_verified: raw.is_verified.unwrap_or(false),
            rating: raw.rating(),
            created_at: parse_timestamp(raw.created_at.as_deref()),
        }
    }
}

impl Tabular for ProviderSummary {
    fn headers() -> &'static [&'static str] {
        &["Business", "Owner", "Category", "Rating", "Status", "Joined"]
    }

    fn row_id(&self) -> &str {
        &self.id
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.business_name.clone(),
            self.owner.clone(),
            self.category.clone(),
            format!("{:.1}", self.rating),
            self.status_label().to_string(),
            format_timestamp(self.created_at),
        ]
    }

    fn status_label(&self) -> &str {
        verified_label(self.is_verified)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDetail {
    pub id: String,
    pub business_name: String,
    pub owner: PartyInfo,
    pub category: String,
    pub description: String,
    pub is_verified: bool,
    pub rating: f64,
    pub review_count: u64,
    pub services: Vec<String>,
    pub reviews: Vec<ReviewLine>,
    pub created_at: Option<Timestamp>,
}

impl From<RawProvider> for ProviderDetail {
    fn from(mut raw: RawProvider) -> Self {
        let reviews: Vec<ReviewLine> = raw
            .reviews
            .take()
            .unwrap_or_default()
            .into_iter()
            .map(ReviewLine::from)
            .collect();
        let services = raw
            .services
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(Related::populated)
            .map(|service| {
                service
                    .label()
                    .unwrap_or_else(|| super::UNKNOWN_SERVICE.to_string())
            })
            .collect();
        Self {
            id: raw.key.resolve(),
            business_name: raw.business_name(),
            owner: PartyInfo::from_related(&raw.user, UNKNOWN_USER),
            category: raw.category(),
            description: non_blank(&raw.description).unwrap_or_default(),
            is_verified: raw.is_verified.unwrap_or(false),
            rating: raw.rating(),
            review_count: raw
                .total_reviews
                .or(raw.review_count)
                .unwrap_or(reviews.len() as u64),
            services,
            reviews,
            created_at: parse_timestamp(raw.created_at.as_deref()),
        }
    }
}

impl Describe for ProviderDetail {
    fn title(&self) -> String {
        self.business_name.clone()
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Owner", self.owner.name.clone()),
            ("Email", self.owner.email.clone()),
            ("Phone", self.owner.phone.clone()),
            ("Category", self.category.clone()),
            ("Verified", yes_no(self.is_verified)),
            ("Rating", format!("{:.1} ({} reviews)", self.rating, self.review_count)),
            ("Joined", format_timestamp(self.created_at)),
            ("About", self.description.clone()),
        ]
    }

    fn sections(&self) -> Vec<(&'static str, Vec<String>)> {
        vec![
            ("Services", self.services.clone()),
            (
                "Reviews",
                self.reviews.iter().map(ReviewLine::describe).collect(),
            ),
        ]
    }
}

impl Patchable for ProviderDetail {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn read_field(&self, field: &str) -> Option<FieldValue> {
        match field {
            IS_VERIFIED => Some(FieldValue::Flag(self.is_verified)),
            _ => None,
        }
    }

    fn write_field(&mut self, field: &str, value: FieldValue) -> Result<(), ConsoleError> {
        match field {
            IS_VERIFIED => {
                self.is_verified = value.expect_flag(field)?;
                Ok(())
            }
            _ => Err(unknown_field(field)),
        }
    }
}

const IS_VERIFIED: &str = "isVerified";

fn verified_label(verified: bool) -> &'static str {
    if verified {
        "verified"
    } else {
        "unverified"
    }
}

/// `/admin/providers`. The console's `status` filter maps onto `isVerified`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvidersAdapter;

impl ResourceAdapter for ProvidersAdapter {
    type Summary = ProviderSummary;
    type Detail = ProviderDetail;

    fn name(&self) -> &'static str {
        "Providers"
    }

    fn base_path(&self) -> &'static str {
        "/admin/providers"
    }

    fn items_key(&self) -> &'static str {
        "providers"
    }

    fn record_key(&self) -> &'static str {
        "provider"
    }

    fn field_actions(&self) -> &'static [FieldAction] {
        const ACTIONS: &[FieldAction] = &[FieldAction::flag(IS_VERIFIED, "verify")];
        ACTIONS
    }

    fn status_filters(&self) -> &'static [&'static str] {
        &["verified", "unverified"]
    }

    fn primary_action(&self, detail: &ProviderDetail) -> Option<(&'static str, FieldValue)> {
        Some((IS_VERIFIED, FieldValue::Flag(!detail.is_verified)))
    }

    fn filter_query(&self, key: &str, value: &str) -> Option<(String, String)> {
        let verified = match (key, value) {
            ("status", "verified") => "true",
            ("status", "unverified") => "false",
            ("status", _) => return None,
            ("verified", v) => v,
            (key, value) => return Some((key.to_string(), value.to_string())),
        };
        Some((IS_VERIFIED.to_string(), verified.to_string()))
    }

    fn from_list_response(
        &self,
        response: ApiResponse,
        request: &PageRequest,
    ) -> ConsoleResult<PageResult<ProviderSummary>> {
        page_from_envelope::<RawProvider, _>(response, self.items_key(), request)
    }

    fn from_detail_response(&self, response: ApiResponse) -> ConsoleResult<ProviderDetail> {
        detail_from_envelope::<RawProvider, _>(response, self.record_key())
    }
}
