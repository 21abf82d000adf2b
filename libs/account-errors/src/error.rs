//! The canonical error envelope (pure data model, no HTTP framework dependencies)

use std::collections::BTreeMap;

use http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

/// Documentation URL placed in the `info` field unless overridden.
pub const DEFAULT_INFO_URL: &str =
    "https://github.com/keystone-hq/keystone-account-server/blob/main/docs/api.md#response-format";

pub(crate) const DEFAULT_TITLE: &str = "Internal Server Error";
pub(crate) const DEFAULT_MESSAGE: &str = "Unspecified error";

/// Custom serializer for `StatusCode` to u16
#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires &T signature
pub(crate) fn serialize_status_code<S>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(status.as_u16())
}

/// Custom deserializer for `StatusCode` from u16
pub(crate) fn deserialize_status_code<'de, D>(deserializer: D) -> Result<StatusCode, D::Error>
where
    D: Deserializer<'de>,
{
    let code = u16::deserialize(deserializer)?;
    StatusCode::from_u16(code).map_err(serde::de::Error::custom)
}

/// Canonical application error.
///
/// Serializes to the envelope every failure response uses:
/// `code` (HTTP status), `errno`, `error` (title), `message`, `info`, plus
/// any condition-specific `extra` entries merged flat into the object.
/// Response headers and the server-side backtrace ride along for the HTTP
/// layer but are never part of the client payload.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[cfg_attr(
    feature = "utoipa",
    schema(
        title = "ApiError",
        description = "Envelope describing a failed request"
    )
)]
#[error("{message}")]
#[must_use]
pub struct ApiError {
    /// The HTTP status code for this error.
    /// Serializes as u16 under the `code` key.
    #[serde(
        rename = "code",
        serialize_with = "serialize_status_code",
        deserialize_with = "deserialize_status_code"
    )]
    #[cfg_attr(feature = "utoipa", schema(value_type = u16))]
    pub status: StatusCode,
    /// Stable taxonomy number, independent of the HTTP status.
    /// Clients branch on this; it never changes meaning across releases.
    pub errno: u32,
    /// Short reason phrase, serialized under the `error` key.
    #[serde(rename = "error")]
    pub title: String,
    /// Human-readable description. Documentation-grade text, not a contract.
    pub message: String,
    /// Stable documentation URL for the response format.
    pub info: String,
    /// Condition-specific diagnostics merged flat into the envelope.
    /// Keys must not collide with the five fixed envelope keys.
    #[serde(flatten)]
    #[cfg_attr(feature = "utoipa", schema(value_type = Object))]
    pub extra: Map<String, Value>,
    /// Response headers to attach before serialization (e.g. `retry-after`).
    #[serde(skip)]
    pub headers: BTreeMap<String, String>,
    /// Server-side diagnostic trace. Logged, never sent to the client.
    #[serde(skip)]
    pub backtrace: Option<String>,
}

impl ApiError {
    /// Create a new error with the default `info` link and no extras.
    pub fn new(
        status: StatusCode,
        title: impl Into<String>,
        errno: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            errno,
            title: title.into(),
            message: message.into(),
            info: DEFAULT_INFO_URL.to_owned(),
            extra: Map::new(),
            headers: BTreeMap::new(),
            backtrace: None,
        }
    }

    /// The 500/999 catch-all used when no classification applies.
    pub fn unexpected() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            DEFAULT_TITLE,
            crate::catalog::errno::UNEXPECTED_ERROR,
            DEFAULT_MESSAGE,
        )
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Attach a response header. One of the two mutations allowed after
    /// construction; must happen before the HTTP layer serializes the error.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attach a server-side diagnostic trace for logging. The trace never
    /// appears in the client payload.
    pub fn with_backtrace(mut self, trace: impl Into<String>) -> Self {
        self.backtrace = Some(trace.into());
        self
    }
}

/// Axum integration: make `ApiError` directly usable as a response
#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::{HeaderName, HeaderValue};

        if self.status.is_server_error() {
            tracing::error!(
                errno = self.errno,
                status = %self.status,
                backtrace = self.backtrace.as_deref().unwrap_or_default(),
                "returning server error envelope"
            );
        }
        let status = self.status;
        let headers = self.headers.clone();
        let mut resp = axum::Json(self).into_response();
        *resp.status_mut() = status;
        for (name, value) in &headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                resp.headers_mut().insert(name, value);
            }
        }
        resp
    }
}


#[cfg(all(test, feature = "axum"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod axum_tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn into_response_sets_status_and_attached_headers() {
        let err = crate::catalog::too_many_requests(None, None, false);
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert_eq!(retry, "30");
        let ct = resp
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(ct.starts_with("application/json"));
    }
}
