use super::*;
use reqwest::StatusCode;

#[test]
fn classifies_not_registered() {
    let err = ProducerError::classify(StatusCode::NOT_FOUND, "", "SERVICE", "g1");
    assert!(matches!(err, ProducerError::NotRegistered { global_id } if global_id == "g1"));
}

#[test]
fn classifies_bad_credentials() {
    let err = ProducerError::classify(StatusCode::UNAUTHORIZED, "", "SERVICE", "g1");
    assert!(matches!(err, ProducerError::BadCredentials));
}

#[test]
fn classifies_already_bound() {
    let err = ProducerError::classify(StatusCode::FORBIDDEN, "", "SERVICE", "g1");
    assert!(matches!(err, ProducerError::AlreadyBound));
}

#[test]
fn classifies_serial_required_by_vendor_code() {
    let body = r#"{"code":"00144000002"}"#;
    let err = ProducerError::classify(StatusCode::BAD_REQUEST, body, "SERVICE", "g1");
    assert!(matches!(err, ProducerError::SerialRequired));
}

#[test]
fn classifies_type_mismatch_by_vendor_code() {
    let body = r#"{"code":"00144000004"}"#;
    let err = ProducerError::classify(StatusCode::BAD_REQUEST, body, "SERVICE", "g1");
    match err {
        ProducerError::TypeMismatch { expected } => assert_eq!(expected, "SERVICE"),
        other => panic!("expected TypeMismatch, got {other:?}"),
    }
}

#[test]
fn classifies_other_4xx_as_bad_request() {
    let err = ProducerError::classify(StatusCode::BAD_REQUEST, "not json", "SERVICE", "g1");
    assert!(matches!(err, ProducerError::BadRequest));
}

#[test]
fn classifies_5xx_as_server_error() {
    let err = ProducerError::classify(StatusCode::INTERNAL_SERVER_ERROR, "", "SERVICE", "g1");
    assert!(matches!(err, ProducerError::ServerError));
}
