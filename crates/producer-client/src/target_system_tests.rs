use super::*;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn dispatches_to_the_configured_method_and_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/intake/callback"))
        .and(header(SECURITY_KEY_HEADER, "k1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = TargetSystemClient::new();
    let items = vec![producer_core::Intelligence {
        global_id: "i1".to_string(),
        soi: Default::default(),
        system: Default::default(),
        dataset: None,
    }];

    client
        .dispatch(&server.uri(), "POST", "/intake/callback", Some("k1"), &items)
        .await
        .unwrap();
}

#[tokio::test]
async fn maps_server_errors_to_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/intake/callback"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = TargetSystemClient::new();
    let err = client
        .dispatch(&server.uri(), "POST", "/intake/callback", None, &[])
        .await
        .unwrap_err();

    assert!(matches!(err, ProducerError::ServerError));
}
