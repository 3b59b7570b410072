use super::common::{format_timestamp, non_blank, parse_timestamp, populated, RawParty, RecordKey, Related};
use super::{
    detail_from_envelope, page_from_envelope, CreateAdapter, FieldAction, ResourceAdapter,
    UNKNOWN_USER,
};
use crate::envelope::ApiResponse;
use crate::request::ApiRequest;
use marketdesk_core::field::unknown_field;
use marketdesk_core::{
    ConsoleError, ConsoleResult, Describe, FieldValue, PageRequest, PageResult, Patchable,
    Tabular, Timestamp,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawNotification {
    #[serde(flatten)]
    key: RecordKey,
    title: Option<String>,
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    audience: Option<String>,
    recipient: Option<Related<RawParty>>,
    user: Option<Related<RawParty>>,
    is_read: Option<bool>,
    created_at: Option<String>,
}

impl RawNotification {
    fn title(&self) -> String {
        non_blank(&self.title).unwrap_or_else(|| "(untitled)".to_string())
    }

    fn kind(&self) -> String {
        non_blank(&self.kind).unwrap_or_else(|| "general".to_string())
    }

    /// Named recipient, else the broadcast audience, else the fallback.
    fn recipient(&self) -> String {
        populated(&self.recipient)
            .or_else(|| populated(&self.user))
            .and_then(RawParty::display_name)
            .or_else(|| non_blank(&self.audience).map(|a| Audience::parse(&a).label().to_string()))
            .unwrap_or_else(|| UNKNOWN_USER.to_string())
    }
}

/// Notification embedded in another record's detail.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationLine {
    pub id: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: Option<Timestamp>,
}

impl From<RawNotification> for NotificationLine {
    fn from(raw: RawNotification) -> Self {
        Self {
            id: raw.key.resolve(),
            title: raw.title(),
            message: non_blank(&raw.message).unwrap_or_default(),
            is_read: raw.is_read.unwrap_or(false),
            created_at: parse_timestamp(raw.created_at.as_deref()),
        }
    }
}

impl NotificationLine {
    pub fn describe(&self) -> String {
        let marker = if self.is_read { " " } else { "*" };
        format!(
            "{}{} {}: {}",
            marker,
            format_timestamp(self.created_at),
            self.title,
            self.message
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationSummary {
    pub id: String,
    pub title: String,
    pub recipient: String,
    pub kind: String,
    pub is_read: bool,
    pub created_at: Option<Timestamp>,
}

impl From<RawNotification> for NotificationSummary {
    fn from(raw: RawNotification) -> Self {
        Self {
            id: raw.key.resolve(),
            title: raw.title(),
            recipient: raw.recipient(),
            kind: raw.kind(),
            is_read: raw.is_read.unwrap_or(false),
            created_at: parse_timestamp(raw.created_at.as_deref()),
        }
    }
}

impl Tabular for NotificationSummary {
    fn headers() -> &'static [&'static str] {
        &["Title", "Recipient", "Type", "Status", "Sent"]
    }

    fn row_id(&self) -> &str {
        &self.id
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.recipient.clone(),
            self.kind.clone(),
            self.status_label().to_string(),
            format_timestamp(self.created_at),
        ]
    }

    fn status_label(&self) -> &str {
        read_label(self.is_read)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDetail {
    pub id: String,
    pub title: String,
    pub message: String,
    pub recipient: String,
    pub kind: String,
    pub is_read: bool,
    pub created_at: Option<Timestamp>,
}

impl From<RawNotification> for NotificationDetail {
    fn from(raw: RawNotification) -> Self {
        Self {
            id: raw.key.resolve(),
            title: raw.title(),
            message: non_blank(&raw.message).unwrap_or_default(),
            recipient: raw.recipient(),
            kind: raw.kind(),
            is_read: raw.is_read.unwrap_or(false),
            created_at: parse_timestamp(raw.created_at.as_deref()),
        }
    }
}

impl Describe for NotificationDetail {
    fn title(&self) -> String {
        self.title.clone()
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Recipient", self.recipient.clone()),
            ("Type", self.kind.clone()),
            ("Status", read_label(self.is_read).to_string()),
            ("Sent", format_timestamp(self.created_at)),
        ]
    }

    fn sections(&self) -> Vec<(&'static str, Vec<String>)> {
        vec![("Message", self.message.lines().map(str::to_string).collect())]
    }
}

impl Patchable for NotificationDetail {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn read_field(&self, field: &str) -> Option<FieldValue> {
        match field {
            IS_READ => Some(FieldValue::Flag(self.is_read)),
            _ => None,
        }
    }

    fn write_field(&mut self, field: &str, value: FieldValue) -> Result<(), ConsoleError> {
        match field {
            IS_READ => {
                self.is_read = value.expect_flag(field)?;
                Ok(())
            }
            _ => Err(unknown_field(field)),
        }
    }
}

const IS_READ: &str = "isRead";

fn read_label(read: bool) -> &'static str {
    if read {
        "read"
    } else {
        "unread"
    }
}

/// Who a broadcast notification goes to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    #[default]
    All,
    Customers,
    Providers,
}

impl Audience {
    pub const ALL: [Audience; 3] = [Audience::All, Audience::Customers, Audience::Providers];

    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "customers" | "customer" => Audience::Customers,
            "providers" | "provider" => Audience::Providers,
            _ => Audience::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::All => "all",
            Audience::Customers => "customers",
            Audience::Providers => "providers",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Audience::All => "All users",
            Audience::Customers => "All customers",
            Audience::Providers => "All providers",
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A broadcast composed in the console.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub audience: Audience,
}

impl NewNotification {
    pub fn validate(&self) -> ConsoleResult<()> {
        if self.title.trim().is_empty() {
            return Err(ConsoleError::validation("title", "must not be empty"));
        }
        if self.message.trim().is_empty() {
            return Err(ConsoleError::validation("message", "must not be empty"));
        }
        Ok(())
    }
}

/// `/admin/notifications`. The `status` filter maps onto `isRead`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationsAdapter;

impl ResourceAdapter for NotificationsAdapter {
    type Summary = NotificationSummary;
    type Detail = NotificationDetail;

    fn name(&self) -> &'static str {
        "Notifications"
    }

    fn base_path(&self) -> &'static str {
        "/admin/notifications"
    }

    fn items_key(&self) -> &'static str {
        "notifications"
    }

    fn record_key(&self) -> &'static str {
        "notification"
    }

    fn field_actions(&self) -> &'static [FieldAction] {
        const ACTIONS: &[FieldAction] = &[FieldAction::flag(IS_READ, "read")];
        ACTIONS
    }

    fn status_filters(&self) -> &'static [&'static str] {
        &["unread", "read"]
    }

    fn primary_action(&self, detail: &NotificationDetail) -> Option<(&'static str, FieldValue)> {
        Some((IS_READ, FieldValue::Flag(!detail.is_read)))
    }

    fn filter_query(&self, key: &str, value: &str) -> Option<(String, String)> {
        match (key, value) {
            ("status", "read") => Some((IS_READ.to_string(), "true".to_string())),
            ("status", "unread") => Some((IS_READ.to_string(), "false".to_string())),
            ("status", _) => None,
            _ => Some((key.to_string(), value.to_string())),
        }
    }

    fn from_list_response(
        &self,
        response: ApiResponse,
        request: &PageRequest,
    ) -> ConsoleResult<PageResult<NotificationSummary>> {
        page_from_envelope::<RawNotification, _>(response, self.items_key(), request)
    }

    fn from_detail_response(&self, response: ApiResponse) -> ConsoleResult<NotificationDetail> {
        detail_from_envelope::<RawNotification, _>(response, self.record_key())
    }
}

impl CreateAdapter for NotificationsAdapter {
    type Draft = NewNotification;

    fn to_create_request(&self, draft: &NewNotification) -> ConsoleResult<ApiRequest> {
        draft.validate()?;
        Ok(ApiRequest::post(
            self.base_path(),
            json!({
                "title": draft.title.trim(),
                "message": draft.message.trim(),
                "audience": draft.audience,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketdesk_core::SortDirection;

    #[test]
    fn total_notifications_key_is_the_total() {
        let response = ApiResponse::ok(json!({
            "success": true,
            "data": {
                "notifications": [
                    { "_id": "n1", "title": "Welcome", "audience": "providers" },
                    { "_id": "n2", "title": "Reminder", "user": { "name": "Sam Lee" }, "isRead": true }
                ],
                "pagination": { "page": 1, "pages": 1, "totalNotifications": 2 }
            }
        }));
        let request = PageRequest::new(10, "createdAt", SortDirection::Desc);
        let page = NotificationsAdapter
            .from_list_response(response, &request)
            .expect("decodes");
        assert_eq!(page.total_items, 2);
        assert_eq!(page.items[0].recipient, "All providers");
        assert_eq!(page.items[1].recipient, "Sam Lee");
        assert_eq!(page.items[1].status_label(), "read");
    }

    #[test]
    fn blank_draft_never_builds_a_request() {
        let draft = NewNotification {
            title: "  ".to_string(),
            message: "Maintenance tonight".to_string(),
            audience: Audience::All,
        };
        let err = NotificationsAdapter
            .to_create_request(&draft)
            .expect_err("invalid");
        assert!(matches!(err, ConsoleError::Validation { ref field, .. } if field == "title"));
    }

    #[test]
    fn create_posts_trimmed_draft() {
        let draft = NewNotification {
            title: " Maintenance ".to_string(),
            message: "Tonight at 22:00".to_string(),
            audience: Audience::Customers,
        };
        let api = NotificationsAdapter.to_create_request(&draft).expect("valid");
        assert_eq!(api.path, "/admin/notifications");
        assert_eq!(
            api.body,
            Some(json!({ "title": "Maintenance", "message": "Tonight at 22:00", "audience": "customers" }))
        );
    }
}
