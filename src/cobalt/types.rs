use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct CobaltRequest<'a> {
    pub url: &'a str,
    #[serde(rename = "isNoTT")]
    pub is_no_tt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CobaltStatus {
    Error,
    RateLimit,
    Redirect,
    Stream,
    Tunnel,
    Success,
    Picker,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CobaltResponse {
    pub status: CobaltStatus,
    /// Human readable message on older API versions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// `{ "code": "..." }` on newer API versions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb: Option<String>,
    /// Separate audio track offered next to a picker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picker: Option<Vec<PickerItem>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickerItem {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub url: Option<String>,
    pub thumb: Option<String>,
}
