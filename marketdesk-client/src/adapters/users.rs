use super::common::{format_timestamp, non_blank, parse_timestamp, yes_no, RecordKey, NOT_PROVIDED};
use super::{detail_from_envelope, page_from_envelope, FieldAction, ResourceAdapter, UNKNOWN_USER};
use crate::envelope::ApiResponse;
use marketdesk_core::field::unknown_field;
use marketdesk_core::{
    ConsoleError, ConsoleResult, Describe, FieldValue, PageRequest, PageResult, Patchable,
    Tabular, Timestamp,
};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Customer,
    Provider,
    Admin,
    Other,
}

impl UserRole {
    fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("customer") | Some("user") => UserRole::Customer,
            Some("provider") => UserRole::Provider,
            Some("admin") => UserRole::Admin,
            _ => UserRole::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Provider => "provider",
            UserRole::Admin => "admin",
            UserRole::Other => "other",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawUser {
    #[serde(flatten)]
    key: RecordKey,
    name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    role: Option<String>,
    is_active: Option<bool>,
    is_verified: Option<bool>,
    created_at: Option<String>,
    last_login: Option<String>,
    bookings_count: Option<u64>,
}

impl RawUser {
    fn display_name(&self) -> String {
        if let Some(name) = non_blank(&self.name) {
            return name;
        }
        let full = [&self.first_name, &self.last_name]
            .into_iter()
            .filter_map(non_blank)
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            UNKNOWN_USER.to_string()
        } else {
            full
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: Option<Timestamp>,
}

impl From<RawUser> for UserSummary {
    fn from(raw: RawUser) -> Self {
        Self {
            id: raw.key.resolve(),
            name: raw.display_name(),
            email: non_blank(&raw.email).unwrap_or_else(|| NOT_PROVIDED.to_string()),
            role: UserRole::parse(raw.role.as_deref()),
            // Accounts are active unless the backend says otherwise.
            is_active: raw.is_active.unwrap_or(true),
            created_at: parse_timestamp(raw.created_at.as_deref()),
        }
    }
}

impl Tabular for UserSummary {
    fn headers() -> &'static [&'static str] {
        &["Name", "Email", "Role", "Status", "Joined"]
    }

    fn row_id(&self) -> &str {
        &self.id
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.email.clone(),
            self.role.as_str().to_string(),
            self.status_label().to_string(),
            format_timestamp(self.created_at),
        ]
    }

    fn status_label(&self) -> &str {
        active_label(self.is_active)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserDetail {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: UserRole,
    pub is_active: bool,
    pub is_verified: bool,
    pub bookings_count: u64,
    pub created_at: Option<Timestamp>,
    pub last_login: Option<Timestamp>,
}

impl From<RawUser> for UserDetail {
    fn from(raw: RawUser) -> Self {
        Self {
            id: raw.key.resolve(),
            name: raw.display_name(),
            email: non_blank(&raw.email).unwrap_or_else(|| NOT_PROVIDED.to_string()),
            phone: non_blank(&raw.phone).unwrap_or_else(|| NOT_PROVIDED.to_string()),
            role: UserRole::parse(raw.role.as_deref()),
            is_active: raw.is_active.unwrap_or(true),
            is_verified: raw.is_verified.unwrap_or(false),
            bookings_count: raw.bookings_count.unwrap_or(0),
            created_at: parse_timestamp(raw.created_at.as_deref()),
            last_login: parse_timestamp(raw.last_login.as_deref()),
        }
    }
}

impl Describe for UserDetail {
    fn title(&self) -> String {
        self.name.clone()
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Email", self.email.clone()),
            ("Phone", self.phone.clone()),
            ("Role", self.role.as_str().to_string()),
            ("Status", active_label(self.is_active).to_string()),
            ("Email verified", yes_no(self.is_verified)),
            ("Bookings", self.bookings_count.to_string()),
            ("Joined", format_timestamp(self.created_at)),
            ("Last login", format_timestamp(self.last_login)),
        ]
    }
}

impl Patchable for UserDetail {
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

/// `/admin/users`. Filters: `search`, `role`, `status` (`active`/`inactive`).
#[derive(Debug, Clone, Copy, Default)]
pub struct UsersAdapter;

impl ResourceAdapter for UsersAdapter {
    type Summary = UserSummary;
    type Detail = UserDetail;

    fn name(&self) -> &'static str {
        "Users"
    }

    fn base_path(&self) -> &'static str {
        "/admin/users"
    }

    fn items_key(&self) -> &'static str {
        "users"
    }

    fn record_key(&self) -> &'static str {
        "user"
    }

    fn field_actions(&self) -> &'static [FieldAction] {
        const ACTIONS: &[FieldAction] = &[FieldAction::flag(IS_ACTIVE, "status")];
        ACTIONS
    }

    fn status_filters(&self) -> &'static [&'static str] {
        &["active", "inactive"]
    }

    fn primary_action(&self, detail: &UserDetail) -> Option<(&'static str, FieldValue)> {
        Some((IS_ACTIVE, FieldValue::Flag(!detail.is_active)))
    }

    fn from_list_response(
        &self,
        response: ApiResponse,
        request: &PageRequest,
    ) -> ConsoleResult<PageResult<UserSummary>> {
        page_from_envelope::<RawUser, _>(response, self.items_key(), request)
    }

    fn from_detail_response(&self, response: ApiResponse) -> ConsoleResult<UserDetail> {
        detail_from_envelope::<RawUser, _>(response, self.record_key())
    }
}
