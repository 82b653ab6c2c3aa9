use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const QR_SOURCE: &str = "24GO";
pub const QR_TYPE: &str = "P";
pub const QR_OS: &str = "Android";
/// Vendor app version the payload claims to come from
pub const QR_APP_VERSION: &str = "1.78.2";
/// Advertising id reported by devices without one
pub const QR_DEVICE_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Check-in payload in the vendor app's QR format.
///
/// Field order and key names are part of the format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrData {
    #[serde(rename = "SR")]
    pub source: String,
    /// Member number, prefixed with "MBR"
    #[serde(rename = "MB")]
    pub member_id: String,
    /// Unix time in milliseconds
    #[serde(rename = "DT")]
    pub timestamp_ms: i64,
    #[serde(rename = "TP")]
    pub kind: String,
    #[serde(rename = "OS")]
    pub os: String,
    #[serde(rename = "AP")]
    pub app_version: String,
    #[serde(rename = "DI")]
    pub device_id: String,
}

impl QrData {
    pub fn new(member_id: impl Into<String>, timestamp_ms: i64) -> Self {
        Self {
            source: QR_SOURCE.to_string(),
            member_id: member_id.into(),
            timestamp_ms,
            kind: QR_TYPE.to_string(),
            os: QR_OS.to_string(),
            app_version: QR_APP_VERSION.to_string(),
            device_id: QR_DEVICE_ID.to_string(),
        }
    }

    pub fn at(member_id: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self::new(member_id, time.timestamp_millis())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
