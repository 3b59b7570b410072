//! Response envelope handling.
//!
//! Every endpoint answers `{ success, data?, message? }`. A non-2xx status
//! or `success: false` is a failure; the server `message` is surfaced when
//! present, otherwise the generic fallback.

use marketdesk_core::{ConsoleError, ConsoleResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Raw HTTP outcome: status code and parsed JSON body (`Null` when empty).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Envelope fields, read leniently so that an odd `message` or `error`
/// shape can never hide a `success: false`.
#[derive(Debug, Default)]
struct Envelope {
    success: Option<bool>,
    data: Option<Value>,
    message: Option<String>,
}

fn text_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn envelope_of(body: &Value) -> Envelope {
    Envelope {
        success: body.get("success").and_then(Value::as_bool),
        data: body.get("data").cloned(),
        message: text_field(body, "message").or_else(|| text_field(body, "error")),
    }
}

fn failure(status: u16, envelope: Envelope) -> ConsoleError {
    let status = (status != 200).then_some(status);
    ConsoleError::application(status, envelope.message)
}

/// Check the envelope and return its `data` payload (`Null` when absent).
pub fn into_data(response: ApiResponse) -> ConsoleResult<Value> {
    if !response.is_success() {
        let envelope = envelope_of(&response.body);
        return Err(failure(response.status, envelope));
    }
    if !response.body.is_object() {
        return Err(ConsoleError::decode("response body is not a JSON object"));
    }
    let envelope = envelope_of(&response.body);
    if envelope.success == Some(false) {
        return Err(failure(response.status, envelope));
    }
    Ok(envelope.data.unwrap_or(Value::Null))
}

/// Check the envelope of a call whose payload is not needed.
pub fn expect_success(response: ApiResponse) -> ConsoleResult<()> {
    if response.is_success() && response.body.is_null() {
        return Ok(());
    }
    into_data(response).map(|_| ())
}

/// Deserialize a payload, naming `what` in the error.
pub fn decode<T: DeserializeOwned>(value: Value, what: &str) -> ConsoleResult<T> {
    serde_json::from_value(value)
        .map_err(|err| ConsoleError::decode(format!("{}: {}", what, err)))
}
