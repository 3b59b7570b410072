//! Wire shapes shared across resources and tolerant decoding helpers.

use chrono::{DateTime, Utc};
use marketdesk_core::Timestamp;
use serde::Deserialize;

/// Record identifier as sent by the backend: `_id`, `id`, or both.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RecordKey {
    #[serde(rename = "_id")]
    mongo_id: Option<String>,
    id: Option<String>,
}

impl RecordKey {
    pub(crate) fn resolve(&self) -> String {
        self.mongo_id
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or_default()
            .to_string()
    }
}

/// A reference that may arrive populated or as a bare id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Related<T> {
    Populated(T),
    Reference(String),
}

impl<T> Related<T> {
    pub(crate) fn populated(&self) -> Option<&T> {
        match self {
            Related::Populated(value) => Some(value),
            Related::Reference(_) => None,
        }
    }
}

pub(crate) fn populated<T>(field: &Option<Related<T>>) -> Option<&T> {
    field.as_ref().and_then(Related::populated)
}

/// A person or business embedded in another record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawParty {
    #[serde(flatten)]
    pub key: RecordKey,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub business_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub user: Option<Box<Related<RawParty>>>,
}

impl RawParty {
    /// Best available display name, if any.
    pub(crate) fn display_name(&self) -> Option<String> {
        if let Some(name) = non_blank(&self.name) {
            return Some(name);
        }
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return Some(full);
        }
        if let Some(name) = non_blank(&self.business_name) {
            return Some(name);
        }
        // Provider profiles nest the owning user.
        self.user
            .as_deref()
            .and_then(Related::populated)
            .and_then(RawParty::display_name)
    }

    pub(crate) fn email(&self) -> Option<String> {
        non_blank(&self.email).or_else(|| {
            self.user
                .as_deref()
                .and_then(Related::populated)
                .and_then(RawParty::email)
        })
    }
}

/// Display name of an optional related party, or `fallback`.
pub(crate) fn party_name(field: &Option<Related<RawParty>>, fallback: &str) -> String {
    populated(field)
        .and_then(RawParty::display_name)
        .unwrap_or_else(|| fallback.to_string())
}

/// Contact summary of a related party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyInfo {
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl PartyInfo {
    pub(crate) fn from_related(field: &Option<Related<RawParty>>, fallback: &str) -> Self {
        match field {
            Some(Related::Populated(party)) => Self {
                id: Some(party.key.resolve()).filter(|id| !id.is_empty()),
                name: party
                    .display_name()
                    .unwrap_or_else(|| fallback.to_string()),
                email: party.email().unwrap_or_else(|| NOT_PROVIDED.to_string()),
                phone: non_blank(&party.phone).unwrap_or_else(|| NOT_PROVIDED.to_string()),
            },
            Some(Related::Reference(id)) => Self::unknown(Some(id.clone()), fallback),
            None => Self::unknown(None, fallback),
        }
    }

    fn unknown(id: Option<String>, fallback: &str) -> Self {
        Self {
            id,
            name: fallback.to_string(),
            email: NOT_PROVIDED.to_string(),
            phone: NOT_PROVIDED.to_string(),
        }
    }
}

/// Placeholder for absent contact details.
pub const NOT_PROVIDED: &str = "Not provided";

/// Payment attached to a booking or subscription.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawPayment {
    #[serde(flatten)]
    pub key: RecordKey,
    pub amount: Option<f64>,
    pub method: Option<String>,
    pub payment_method: Option<String>,
    pub status: Option<String>,
    pub paid_at: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentLine {
    pub id: String,
    pub amount: f64,
    pub method: String,
    pub status: String,
    pub paid_at: Option<Timestamp>,
}

impl From<RawPayment> for PaymentLine {
    fn from(raw: RawPayment) -> Self {
        Self {
            id: raw.key.resolve(),
            amount: raw.amount.unwrap_or(0.0),
            method: non_blank(&raw.method)
                .or_else(|| non_blank(&raw.payment_method))
                .unwrap_or_else(|| "unknown".to_string()),
            status: non_blank(&raw.status).unwrap_or_else(|| "unknown".to_string()),
            paid_at: parse_timestamp(raw.paid_at.as_deref().or(raw.created_at.as_deref())),
        }
    }
}

impl PaymentLine {
    pub fn describe(&self) -> String {
        format!(
            "{} via {} ({}) {}",
            format_amount(self.amount),
            self.method,
            self.status,
            format_timestamp(self.paid_at)
        )
    }
}

/// Review embedded in a booking or provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawReviewLine {
    #[serde(flatten)]
    pub key: RecordKey,
    pub rating: Option<f64>,
    pub comment: Option<String>,
    pub customer: Option<Related<RawParty>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewLine {
    pub id: String,
    pub rating: u8,
    pub comment: String,
    pub author: String,
}

impl From<RawReviewLine> for ReviewLine {
    fn from(raw: RawReviewLine) -> Self {
        Self {
            id: raw.key.resolve(),
            rating: clamp_rating(raw.rating),
            comment: non_blank(&raw.comment).unwrap_or_else(|| "(no comment)".to_string()),
            author: party_name(&raw.customer, super::UNKNOWN_CUSTOMER),
        }
    }
}

impl ReviewLine {
    pub fn describe(&self) -> String {
        format!("{}/5 by {}: {}", self.rating, self.author, self.comment)
    }
}

pub(crate) fn clamp_rating(rating: Option<f64>) -> u8 {
    rating.unwrap_or(0.0).round().clamp(0.0, 5.0) as u8
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parse an RFC 3339 timestamp; malformed values become `None`.
pub(crate) fn parse_timestamp(value: Option<&str>) -> Option<Timestamp> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn format_timestamp(value: Option<Timestamp>) -> String {
    value
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

pub(crate) fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}
