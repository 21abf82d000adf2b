//! Classification of boundary failures into the canonical envelope
//!
//! The HTTP layer catches heterogeneous failures (authentication library,
//! request validation, payload limits, plain bugs) and hands them here;
//! the result is always exactly one [`ApiError`]. Classification is a
//! single-shot decision tree with no state: first match wins, and the order
//! of checks is part of the contract because the categories overlap in raw
//! status code.

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::error::{
    ApiError, DEFAULT_MESSAGE, DEFAULT_TITLE, deserialize_status_code, serialize_status_code,
};

// The authentication library reports credential and protocol failures
// through exact, documented message strings. Matched by equality, never by
// substring; this is a compatibility seam that must be revisited whenever
// the library changes its wording.
const AUTH_UNKNOWN_CREDENTIALS: &str = "Unknown credentials";
const AUTH_INVALID_CREDENTIALS: &str = "Invalid credentials";
const AUTH_STALE_TIMESTAMP: &str = "Stale timestamp";
const AUTH_INVALID_NONCE: &str = "Invalid nonce";

/// Payload-integrity failures from the signature check, passed through to
/// the caller verbatim.
const BAD_SIGNATURE_MESSAGES: [&str; 4] = [
    "Bad mac",
    "Unknown algorithm",
    "Missing required payload hash",
    "Payload is invalid",
];

/// Marker the request validator embeds in required-field messages.
const REQUIRED_FIELD_MARKER: &str = "is required";

// Both known phrasings of the oversized-payload failure. An unrecognized
// rewording falls through to the verbatim branch instead of failing.
const TOO_LARGE_PREFIXES: [&str; 2] = [
    "Payload content length greater than maximum allowed",
    "Payload size greater than maximum allowed",
];

/// Structured failure descriptor produced by the request validator:
/// which part of the request failed and the offending field names in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub source: String,
    pub keys: Vec<String>,
}

/// Error payload captured from the HTTP framework's error path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    #[serde(
        serialize_with = "serialize_status_code",
        deserialize_with = "deserialize_status_code"
    )]
    pub status_code: StatusCode,
    pub error: Option<String>,
    pub message: Option<String>,
    pub errno: Option<u32>,
    pub info: Option<String>,
    pub validation: Option<ValidationReport>,
}

/// A failure caught at the HTTP boundary: the framework's structured payload
/// when it produced one, plus any backtrace recovered at the catch site.
#[derive(Debug, Clone, Default)]
pub struct BoundaryError {
    pub payload: Option<ErrorPayload>,
    pub backtrace: Option<String>,
}

/// Input to [`translate`]: either an error that is already canonical or a
/// raw boundary failure.
#[derive(Debug, Clone)]
pub enum CapturedFailure {
    Canonical(ApiError),
    Boundary(BoundaryError),
}

impl From<ApiError> for CapturedFailure {
    fn from(err: ApiError) -> Self {
        Self::Canonical(err)
    }
}

impl From<BoundaryError> for CapturedFailure {
    fn from(err: BoundaryError) -> Self {
        Self::Boundary(err)
    }
}

/// Normalize a captured failure into the canonical envelope.
///
/// Never fails: a failure no branch recognizes is passed through with its
/// fields copied verbatim (preserving information for categories the
/// taxonomy does not know yet), and one with no payload at all degrades to
/// the 500/999 catch-all. Canonical input is returned unchanged.
pub fn translate(failure: impl Into<CapturedFailure>) -> ApiError {
    let boundary = match failure.into() {
        CapturedFailure::Canonical(err) => return err,
        CapturedFailure::Boundary(boundary) => boundary,
    };
    let Some(payload) = boundary.payload else {
        return ApiError::unexpected();
    };
    let ErrorPayload {
        status_code,
        error,
        message,
        errno,
        info,
        validation,
    } = payload;

    if status_code == StatusCode::UNAUTHORIZED {
        return classify_auth_failure(message.as_deref());
    }

    if let Some(report) = validation {
        let text = message.as_deref().unwrap_or_default();
        if text.contains(REQUIRED_FIELD_MARKER) {
            return catalog::missing_request_parameter(report.keys.first().map(String::as_str));
        }
        return catalog::invalid_request_parameter(&report);
    }

    if status_code == StatusCode::BAD_REQUEST && is_too_large_message(message.as_deref()) {
        return catalog::request_body_too_large();
    }

    tracing::debug!(status = %status_code, "passing boundary failure through unclassified");
    let mut err = ApiError::new(
        status_code,
        error.unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
        errno.unwrap_or(catalog::errno::UNEXPECTED_ERROR),
        message.unwrap_or_else(|| DEFAULT_MESSAGE.to_owned()),
    );
    if let Some(info) = info {
        err = err.with_info(info);
    }
    if let Some(trace) = boundary.backtrace {
        err = err.with_backtrace(trace);
    }
    err
}

/// Sub-classify a 401 by the authentication library's exact message.
fn classify_auth_failure(message: Option<&str>) -> ApiError {
    let Some(text) = message else {
        return catalog::invalid_token(None);
    };
    if text == AUTH_UNKNOWN_CREDENTIALS || text == AUTH_INVALID_CREDENTIALS {
        catalog::invalid_token(Some(format!("Invalid authentication token: {text}")))
    } else if text == AUTH_STALE_TIMESTAMP {
        catalog::invalid_timestamp()
    } else if text == AUTH_INVALID_NONCE {
        catalog::invalid_nonce()
    } else if BAD_SIGNATURE_MESSAGES.contains(&text) {
        catalog::invalid_signature(Some(text.to_owned()))
    } else {
        catalog::invalid_token(None)
    }
}

fn is_too_large_message(message: Option<&str>) -> bool {
    message.is_some_and(|text| {
        TOO_LARGE_PREFIXES
            .iter()
            .any(|prefix| text.starts_with(prefix))
    })
}
