use super::*;
use producer_core::model::SoiCallback;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn item_for(global_id: &str, soi_path: &str) -> Intelligence {
    Intelligence {
        global_id: global_id.to_string(),
        soi: SoiDescriptor {
            base_url: Some("http://soi.example".to_string()),
            callback: Some(SoiCallback {
                method: "POST".to_string(),
                path: soi_path.to_string(),
            }),
            api_key: None,
        },
        system: Default::default(),
        dataset: None,
    }
}

#[tokio::test]
async fn fans_out_to_two_destinations_and_reports_each_bucket() {
    let soi = MockServer::start().await;
    let control_plane = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&soi)
        .await;
    Mock::given(method("POST"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&soi)
        .await;
    Mock::given(method("PUT"))
        .and(path("/apis/producers/g1/intelligences"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&control_plane)
        .await;

    let mut items = vec![item_for("i1", "/a"), item_for("i2", "/b")];
    items[0].soi.base_url = Some(soi.uri());
    items[1].soi.base_url = Some(soi.uri());

    let target = TargetSystemClient::new();
    let cp = ControlPlaneClient::new();
    dispatch(&target, &cp, &control_plane.uri(), "g1", None, items).await;

    soi.verify().await;
    control_plane.verify().await;
}

#[tokio::test]
async fn target_system_failure_marks_the_bucket_failed_before_reporting() {
    let soi = MockServer::start().await;
    let control_plane = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&soi)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&control_plane)
        .await;

    let mut item = item_for("i1", "/cb");
    item.soi.base_url = Some(soi.uri());

    let target = TargetSystemClient::new();
    let cp = ControlPlaneClient::new();
    dispatch(&target, &cp, &control_plane.uri(), "g1", None, vec![item]).await;

    let requests = control_plane.received_requests().await.unwrap();
    let put = requests.iter().find(|r| r.method.as_str() == "PUT").unwrap();
    let body: Vec<Intelligence> = put.body_json().unwrap();
    assert_eq!(body[0].system.state, Some(IntelligenceState::Failed));
    assert!(body[0].system.failures_reason.is_some());
}

#[tokio::test]
async fn items_missing_soi_fields_are_skipped() {
    let control_plane = MockServer::start().await;
    let target = TargetSystemClient::new();
    let cp = ControlPlaneClient::new();

    let item = Intelligence {
        global_id: "i1".to_string(),
        soi: SoiDescriptor::default(),
        system: Default::default(),
        dataset: None,
    };

    dispatch(&target, &cp, &control_plane.uri(), "g1", None, vec![item]).await;
    assert!(control_plane.received_requests().await.unwrap().is_empty());
}
