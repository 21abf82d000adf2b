//! Error-number registry and canonical error constructors
//!
//! Every failure condition the API can report lives here: a stable errno
//! plus one constructor that produces the fully-populated envelope.
//! Constructors never fail; omitted numeric parameters fall back to fixed
//! defaults.

use std::time::{SystemTime, UNIX_EPOCH};

use http::StatusCode;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::translate::ValidationReport;

/// Seconds substituted for any omitted retry-after parameter.
pub const DEFAULT_RETRY_AFTER_SECS: u32 = 30;

const VERIFICATION_METHOD: &str = "email-captcha";
const VERIFICATION_REASON: &str = "login";

/// Stable error numbers.
///
/// Assignments are append-only: a number, once shipped, keeps its meaning
/// forever, and retired numbers stay reserved rather than being reassigned.
pub mod errno {
    pub const SERVER_CONFIG_ERROR: u32 = 100;
    pub const ACCOUNT_EXISTS: u32 = 101;
    pub const ACCOUNT_UNKNOWN: u32 = 102;
    pub const INCORRECT_PASSWORD: u32 = 103;
    pub const ACCOUNT_UNVERIFIED: u32 = 104;
    pub const INVALID_VERIFICATION_CODE: u32 = 105;
    pub const INVALID_JSON: u32 = 106;
    pub const INVALID_PARAMETER: u32 = 107;
    pub const MISSING_PARAMETER: u32 = 108;
    pub const INVALID_REQUEST_SIGNATURE: u32 = 109;
    pub const INVALID_TOKEN: u32 = 110;
    pub const INVALID_TIMESTAMP: u32 = 111;
    pub const MISSING_CONTENT_LENGTH_HEADER: u32 = 112;
    pub const REQUEST_TOO_LARGE: u32 = 113;
    pub const THROTTLED: u32 = 114;
    pub const INVALID_NONCE: u32 = 115;
    pub const ENDPOINT_NOT_SUPPORTED: u32 = 116;
    pub const INCORRECT_EMAIL_CASE: u32 = 120;
    // 121 and 122 belonged to the retired account-lockout flow; reserved.
    pub const DEVICE_UNKNOWN: u32 = 123;
    pub const DEVICE_CONFLICT: u32 = 124;
    pub const REQUEST_BLOCKED: u32 = 125;
    pub const ACCOUNT_RESET: u32 = 126;
    pub const INVALID_UNBLOCK_CODE: u32 = 127;
    // 128 was the retired missing-token category; reserved.
    pub const INVALID_PHONE_NUMBER: u32 = 129;
    pub const INVALID_REGION: u32 = 130;
    pub const INVALID_MESSAGE_ID: u32 = 131;
    pub const MESSAGE_REJECTED: u32 = 132;
    pub const SERVER_BUSY: u32 = 201;
    pub const FEATURE_NOT_ENABLED: u32 = 202;
    pub const UNEXPECTED_ERROR: u32 = 999;
}

pub fn db_incorrect_patch_level(level: u32, level_required: u32) -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "Server Startup",
        errno::SERVER_CONFIG_ERROR,
        "Incorrect Database Patch Level",
    )
    .with_extra("level", level)
    .with_extra("levelRequired", level_required)
}

pub fn account_exists(email: impl Into<String>) -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "Bad Request",
        errno::ACCOUNT_EXISTS,
        "Account already exists",
    )
    .with_extra("email", email.into())
}

pub fn unknown_account(email: impl Into<String>) -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "Bad Request",
        errno::ACCOUNT_UNKNOWN,
        "Unknown account",
    )
    .with_extra("email", email.into())
}

/// Password check failed for the account on record.
///
/// When the submitted address differs from the recorded one only in case,
/// callers get the more actionable incorrect-email-case signal instead.
/// Clients use it to retry with the canonical address, so this check must
/// run before reporting a plain incorrect password.
pub fn incorrect_password(db_email: &str, request_email: &str) -> ApiError {
    if db_email != request_email && db_email.eq_ignore_ascii_case(request_email) {
        return ApiError::new(
            StatusCode::BAD_REQUEST,
            "Bad Request",
            errno::INCORRECT_EMAIL_CASE,
            "Incorrect email case",
        )
        .with_extra("email", db_email);
    }
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "Bad Request",
        errno::INCORRECT_PASSWORD,
        "Incorrect password",
    )
    .with_extra("email", db_email)
}

pub fn unverified_account() -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "Bad Request",
        errno::ACCOUNT_UNVERIFIED,
        "Unverified account",
    )
}

/// `details` is merged flat into the envelope.
pub fn invalid_verification_code(details: Map<String, Value>) -> ApiError {
    let mut err = ApiError::new(
        StatusCode::BAD_REQUEST,
        "Bad Request",
        errno::INVALID_VERIFICATION_CODE,
        "Invalid verification code",
    );
    err.extra.extend(details);
    err
}

pub fn invalid_request_body() -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "Bad Request",
        errno::INVALID_JSON,
        "Invalid JSON in request body",
    )
}

/// The full validation report travels in `extra.validation` so clients can
/// see exactly what the request validator rejected.
pub fn invalid_request_parameter(validation: &ValidationReport) -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "Bad Request",
        errno::INVALID_PARAMETER,
        "Invalid parameter in request body",
    )
    .with_extra(
        "validation",
        serde_json::to_value(validation).unwrap_or(Value::Null),
    )
}

pub fn missing_request_parameter(param: Option<&str>) -> ApiError {
    let message = match param {
        Some(param) => format!("Missing parameter in request body: {param}"),
        None => "Missing parameter in request body".to_owned(),
    };
    let mut err = ApiError::new(
        StatusCode::BAD_REQUEST,
        "Bad Request",
        errno::MISSING_PARAMETER,
        message,
    );
    if let Some(param) = param {
        err = err.with_extra("param", param);
    }
    err
}

pub fn invalid_signature(message: Option<String>) -> ApiError {
    ApiError::new(
        StatusCode::UNAUTHORIZED,
        "Unauthorized",
        errno::INVALID_REQUEST_SIGNATURE,
        message.unwrap_or_else(|| "Invalid request signature".to_owned()),
    )
}

pub fn invalid_token(message: Option<String>) -> ApiError {
    ApiError::new(
        StatusCode::UNAUTHORIZED,
        "Unauthorized",
        errno::INVALID_TOKEN,
        message.unwrap_or_else(|| "Invalid authentication token in request signature".to_owned()),
    )
}

/// Reports the server clock in `extra.serverTime` (unix seconds) so clients
/// can resynchronize their request timestamps.
pub fn invalid_timestamp() -> ApiError {
    let server_time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    ApiError::new(
        StatusCode::UNAUTHORIZED,
        "Unauthorized",
        errno::INVALID_TIMESTAMP,
        "Invalid timestamp in request signature",
    )
    .with_extra("serverTime", server_time)
}

pub fn invalid_nonce() -> ApiError {
    ApiError::new(
        StatusCode::UNAUTHORIZED,
        "Unauthorized",
        errno::INVALID_NONCE,
        "Invalid nonce in request signature",
    )
}

pub fn missing_content_length() -> ApiError {
    ApiError::new(
        StatusCode::LENGTH_REQUIRED,
        "Length Required",
        errno::MISSING_CONTENT_LENGTH_HEADER,
        "Missing content-length header",
    )
}

pub fn request_body_too_large() -> ApiError {
    ApiError::new(
        StatusCode::PAYLOAD_TOO_LARGE,
        "Request Entity Too Large",
        errno::REQUEST_TOO_LARGE,
        "Request body too large",
    )
}

/// Throttling response with a retry hint.
///
/// `retry_after` defaults to [`DEFAULT_RETRY_AFTER_SECS`]. When
/// `can_unblock` is set, the `verificationMethod` and `verificationReason`
/// keys are added; clients branch on the presence of those keys, not on a
/// boolean, so they must be absent otherwise.
pub fn too_many_requests(
    retry_after: Option<u32>,
    retry_after_localized: Option<String>,
    can_unblock: bool,
) -> ApiError {
    let retry_after = retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    let mut err = ApiError::new(
        StatusCode::TOO_MANY_REQUESTS,
        "Too Many Requests",
        errno::THROTTLED,
        "Client has sent too many requests",
    )
    .with_extra("retryAfter", retry_after)
    .with_header("retry-after", retry_after.to_string());
    if let Some(localized) = retry_after_localized {
        err = err.with_extra("retryAfterLocalized", localized);
    }
    if can_unblock {
        err = err
            .with_extra("verificationMethod", VERIFICATION_METHOD)
            .with_extra("verificationReason", VERIFICATION_REASON);
    }
    err
}

/// Security block. Same conditional verification keys as
/// [`too_many_requests`]: present only when the caller can self-unblock.
pub fn request_blocked(can_unblock: bool) -> ApiError {
    let mut err = ApiError::new(
        StatusCode::BAD_REQUEST,
        "Request blocked",
        errno::REQUEST_BLOCKED,
        "The request was blocked for security reasons",
    );
    if can_unblock {
        err = err
            .with_extra("verificationMethod", VERIFICATION_METHOD)
            .with_extra("verificationReason", VERIFICATION_REASON);
    }
    err
}

pub fn service_unavailable(retry_after: Option<u32>) -> ApiError {
    let retry_after = retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    ApiError::new(
        StatusCode::SERVICE_UNAVAILABLE,
        "Service Unavailable",
        errno::SERVER_BUSY,
        "Service unavailable",
    )
    .with_extra("retryAfter", retry_after)
    .with_header("retry-after", retry_after.to_string())
}

pub fn feature_not_enabled(retry_after: Option<u32>) -> ApiError {
    let retry_after = retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    ApiError::new(
        StatusCode::SERVICE_UNAVAILABLE,
        "Feature not enabled",
        errno::FEATURE_NOT_ENABLED,
        "Service unavailable",
    )
    .with_extra("retryAfter", retry_after)
    .with_header("retry-after", retry_after.to_string())
}

pub fn gone() -> ApiError {
    ApiError::new(
        StatusCode::GONE,
        "Gone",
        errno::ENDPOINT_NOT_SUPPORTED,
        "This endpoint is no longer supported",
    )
}

pub fn must_reset_account(email: impl Into<String>) -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "Bad Request",
        errno::ACCOUNT_RESET,
        "Account must be reset",
    )
    .with_extra("email", email.into())
}

pub fn unknown_device() -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "Bad Request",
        errno::DEVICE_UNKNOWN,
        "Unknown device",
    )
}

pub fn device_session_conflict() -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "Bad Request",
        errno::DEVICE_CONFLICT,
        "Session already registered by another device",
    )
}

pub fn invalid_unblock_code() -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "Bad Request",
        errno::INVALID_UNBLOCK_CODE,
        "Invalid unblock code",
    )
}

pub fn invalid_phone_number() -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "Bad Request",
        errno::INVALID_PHONE_NUMBER,
        "Invalid phone number",
    )
}

pub fn invalid_region(region: impl Into<String>) -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "Bad Request",
        errno::INVALID_REGION,
        "Invalid region",
    )
    .with_extra("region", region.into())
}

pub fn invalid_message_id() -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "Bad Request",
        errno::INVALID_MESSAGE_ID,
        "Invalid message id",
    )
}

// Existing clients depend on this exact status/title pair.
pub fn message_rejected(reason: impl Into<String>, reason_code: impl Into<Value>) -> ApiError {
    ApiError::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Bad Request",
        errno::MESSAGE_REJECTED,
        "Message rejected",
    )
    .with_extra("reason", reason.into())
    .with_extra("reasonCode", reason_code)
}

pub fn unexpected_error() -> ApiError {
    ApiError::unexpected()
}
