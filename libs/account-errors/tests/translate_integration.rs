//! End-to-end classification tests over the public API: every upstream
//! failure shape the HTTP boundary captures must come out as one canonical
//! envelope.

use std::time::{SystemTime, UNIX_EPOCH};

use account_errors::catalog::{self, errno};
use account_errors::{translate, ApiError, BoundaryError, ErrorPayload, ValidationReport};
use http::StatusCode;
use serde_json::json;

fn boundary(payload: ErrorPayload) -> BoundaryError {
    BoundaryError {
        payload: Some(payload),
        backtrace: None,
    }
}

fn auth_failure(message: &str) -> BoundaryError {
    boundary(ErrorPayload {
        status_code: StatusCode::UNAUTHORIZED,
        error: Some("Unauthorized".to_owned()),
        message: Some(message.to_owned()),
        ..ErrorPayload::default()
    })
}

fn validation_failure(message: &str, keys: &[&str]) -> BoundaryError {
    boundary(ErrorPayload {
        status_code: StatusCode::BAD_REQUEST,
        error: Some("Bad Request".to_owned()),
        message: Some(message.to_owned()),
        validation: Some(ValidationReport {
            source: "payload".to_owned(),
            keys: keys.iter().map(ToString::to_string).collect(),
        }),
        ..ErrorPayload::default()
    })
}

#[test]
fn canonical_input_passes_through_unchanged() {
    let original = catalog::too_many_requests(Some(60), None, true).with_backtrace("trace");
    let translated = translate(original.clone());
    assert_eq!(translated, original);
}

#[test]
fn translate_is_idempotent_across_repeated_application() {
    let original = catalog::account_exists("a@example.com");
    let twice = translate(translate(original.clone()));
    assert_eq!(twice, original);
}

#[test]
fn failure_with_no_payload_becomes_the_catch_all() {
    let err = translate(BoundaryError::default());
    assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.errno, errno::UNEXPECTED_ERROR);
}

#[test]
fn stale_timestamp_reports_server_time() {
    let before = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    let err = translate(auth_failure("Stale timestamp"));
    assert_eq!(err.errno, errno::INVALID_TIMESTAMP);
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    let server_time = err.extra["serverTime"].as_u64().unwrap();
    assert!(server_time >= before && server_time <= before + 2);
}

#[test]
fn bad_mac_classifies_as_invalid_signature() {
    let err = translate(auth_failure("Bad mac"));
    assert_eq!(err.errno, errno::INVALID_REQUEST_SIGNATURE);
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    assert_eq!(err.message, "Bad mac");
}

#[test]
fn unknown_credentials_embeds_the_upstream_phrase() {
    let err = translate(auth_failure("Unknown credentials"));
    assert_eq!(err.errno, errno::INVALID_TOKEN);
    assert_eq!(err.message, "Invalid authentication token: Unknown credentials");
}

#[test]
fn invalid_nonce_maps_to_its_own_errno() {
    let err = translate(auth_failure("Invalid nonce"));
    assert_eq!(err.errno, errno::INVALID_NONCE);
}

#[test]
fn required_field_failure_names_the_first_offending_parameter() {
    let err = translate(validation_failure("\"email\" is required", &["email", "password"]));
    assert_eq!(err.errno, errno::MISSING_PARAMETER);
    assert_eq!(err.extra["param"], "email");
    assert_eq!(err.message, "Missing parameter in request body: email");
}

#[test]
fn other_validation_failures_carry_the_full_report() {
    let err = translate(validation_failure("\"email\" must be a valid email", &["email"]));
    assert_eq!(err.errno, errno::INVALID_PARAMETER);
    assert_eq!(
        err.extra["validation"],
        json!({"source": "payload", "keys": ["email"]})
    );
}

#[test]
fn oversized_payload_message_becomes_request_too_large() {
    let err = translate(boundary(ErrorPayload {
        status_code: StatusCode::BAD_REQUEST,
        error: Some("Bad Request".to_owned()),
        message: Some("Payload content length greater than maximum allowed: 100".to_owned()),
        ..ErrorPayload::default()
    }));
    assert_eq!(err.errno, errno::REQUEST_TOO_LARGE);
    assert_eq!(err.status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[test]
fn reworded_size_failure_falls_through_to_the_verbatim_branch() {
    let err = translate(boundary(ErrorPayload {
        status_code: StatusCode::BAD_REQUEST,
        error: Some("Bad Request".to_owned()),
        message: Some("Body larger than permitted".to_owned()),
        ..ErrorPayload::default()
    }));
    assert_eq!(err.errno, errno::UNEXPECTED_ERROR);
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.message, "Body larger than permitted");
}

#[test]
fn unrecognized_failure_keeps_its_fields_for_forward_compatibility() {
    let err = translate(BoundaryError {
        payload: Some(ErrorPayload {
            status_code: StatusCode::NOT_FOUND,
            error: Some("Not Found".to_owned()),
            message: Some("No such endpoint".to_owned()),
            errno: Some(404),
            info: Some("https://docs.example.com/errors".to_owned()),
            validation: None,
        }),
        backtrace: Some("captured stack".to_owned()),
    });
    assert_eq!(err.status, StatusCode::NOT_FOUND);
    assert_eq!(err.errno, 404);
    assert_eq!(err.info, "https://docs.example.com/errors");
    assert_eq!(err.backtrace.as_deref(), Some("captured stack"));
}

#[test]
fn translated_envelope_serializes_to_the_documented_shape() {
    let err = translate(auth_failure("Stale timestamp"));
    let value = serde_json::to_value(&err).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object["code"], 401);
    assert_eq!(object["errno"], u64::from(errno::INVALID_TIMESTAMP));
    assert_eq!(object["error"], "Unauthorized");
    assert_eq!(object["message"], "Invalid timestamp in request signature");
    assert!(object.contains_key("info"));
    assert!(object.contains_key("serverTime"));
    assert!(!object.contains_key("headers"));
    assert!(!object.contains_key("backtrace"));
}

#[test]
fn throttling_envelope_merges_retry_hint_into_payload() {
    let err = catalog::too_many_requests(None, None, false);
    let value = serde_json::to_value(&err).unwrap();
    assert_eq!(value["retryAfter"], 30);
    assert_eq!(err.headers["retry-after"], "30");
    assert!(value.get("verificationMethod").is_none());
}

#[test]
fn canonical_errors_deserialize_back_from_the_wire() {
    let original = catalog::unknown_account("a@example.com");
    let wire = serde_json::to_string(&original).unwrap();
    let parsed: ApiError = serde_json::from_str(&wire).unwrap();
    assert_eq!(parsed.errno, original.errno);
    assert_eq!(parsed.status, original.status);
    assert_eq!(parsed.extra["email"], "a@example.com");
}
