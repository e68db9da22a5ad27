use super::*;
use producer_core::model::RemoteSystemState;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn fetches_and_decodes_the_producer_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apis/producers/g1"))
        .and(query_param("type", "SERVICE_AGENT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "globalId": "g1",
            "type": "SERVICE_AGENT",
            "system": { "version": "3", "state": "ACTIVE" },
            "pollingInterval": 45,
        })))
        .mount(&server)
        .await;

    let client = ControlPlaneClient::new();
    let cfg = client
        .get_producer_config(&server.uri(), "g1", "SERVICE_AGENT", None)
        .await
        .unwrap();

    assert_eq!(cfg.global_id, "g1");
    assert_eq!(cfg.polling_interval, Some(45));
    assert_eq!(cfg.system.state, RemoteSystemState::Active);
}

#[tokio::test]
async fn sends_the_security_key_header_when_present() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apis/producers/g1"))
        .and(wiremock::matchers::header(SECURITY_KEY_HEADER, "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "globalId": "g1",
            "type": "SERVICE_AGENT",
            "system": { "version": "1", "state": "ACTIVE" },
        })))
        .mount(&server)
        .await;

    let client = ControlPlaneClient::new();
    client
        .get_producer_config(&server.uri(), "g1", "SERVICE_AGENT", Some("s3cret"))
        .await
        .unwrap();
}

#[tokio::test]
async fn maps_not_found_to_not_registered() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apis/producers/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = ControlPlaneClient::new();
    let err = client
        .get_producer_config(&server.uri(), "missing", "SERVICE_AGENT", None)
        .await
        .unwrap_err();

    assert!(matches!(err, ProducerError::NotRegistered { global_id } if global_id == "missing"));
}

#[tokio::test]
async fn fetches_intelligences() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apis/producers/g1/intelligences"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "globalId": "i1", "soi": {} },
        ])))
        .mount(&server)
        .await;

    let client = ControlPlaneClient::new();
    let items = client
        .get_intelligences(&server.uri(), "g1", None)
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].global_id, "i1");
}

#[tokio::test]
async fn puts_reconciled_intelligences_back() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/apis/producers/g1/intelligences"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = ControlPlaneClient::new();
    let items = vec![producer_core::Intelligence {
        global_id: "i1".to_string(),
        soi: Default::default(),
        system: Default::default(),
        dataset: None,
    }];

    client
        .update_intelligences(&server.uri(), "g1", None, &items)
        .await
        .unwrap();
}
