use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    dev::ServiceResponse,
    http::{header, Method, StatusCode},
    test,
    web::Data,
    App,
};
use floodcast::{api, config::Config, service::Service, store::memory::MemoryStore};
use serde_json::{json, Value};

async fn app(
    store: &MemoryStore,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    let service = Service::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Config::default(),
    );

    test::init_service(
        App::new()
            .wrap(api::cors())
            .app_data(Data::new(service))
            .configure(api::configure),
    )
    .await
}

fn assert_cors<B>(resp: &ServiceResponse<B>) {
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[actix_web::test]
async fn preflight_succeeds_without_store() {
    let store = MemoryStore::new();
    store.fail_with("store is down");
    let app = app(&store).await;

    let req = test::TestRequest::default()
        .method(Method::OPTIONS)
        .uri("/device/sms")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_cors(&resp);
    assert!(test::read_body(resp).await.is_empty());
}

#[actix_web::test]
async fn poll_returns_messages_and_recipients() {
    let store = MemoryStore::new();
    store.add_recipient("Ana", Some("+639170000001"), Some("ana@example.org"));
    let app = app(&store).await;

    let req = test::TestRequest::post()
        .uri("/broadcast/email")
        .set_json(json!({"body": "TEST A", "triggered_by": "operator"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["status"], "pending");

    let req = test::TestRequest::get().uri("/device/email").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_cors(&resp);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(body["messages"][0]["id"], created["id"]);
    assert_eq!(body["messages"][0]["body"], "TEST A");
    assert!(body["messages"][0]["created_at"].is_string());
    assert_eq!(body["recipients"], json!(["ana@example.org"]));
}

#[actix_web::test]
async fn empty_queue_polls_as_empty_list() {
    let store = MemoryStore::new();
    let app = app(&store).await;

    let req = test::TestRequest::get().uri("/device/sms").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, json!({"messages": [], "recipients": []}));
}

#[actix_web::test]
async fn acknowledge_marks_message_sent() {
    let store = MemoryStore::new();
    let app = app(&store).await;

    let req = test::TestRequest::post()
        .uri("/broadcast/sms")
        .set_json(json!({"body": "TEST B", "triggered_by": "operator"}))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::patch()
        .uri("/device/sms")
        .set_json(json!({"id": created["id"]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["updated"][0]["status"], "sent");
    assert!(body["updated"][0]["sent_at"].is_string());

    let req = test::TestRequest::get().uri("/device/sms").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["messages"], json!([]));
}

#[actix_web::test]
async fn acknowledge_unknown_id_is_empty_success() {
    let store = MemoryStore::new();
    let app = app(&store).await;

    let req = test::TestRequest::patch()
        .uri("/device/sms")
        .set_json(json!({"id": 99999}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"success": true, "updated": []}));
}

#[actix_web::test]
async fn acknowledge_without_id_is_rejected() {
    let store = MemoryStore::new();
    store.fail_with("store is down");
    let app = app(&store).await;

    for payload in ["", "{}", r#"{"id": null}"#, r#"{"id": 0}"#] {
        let req = test::TestRequest::patch()
            .uri("/device/sms")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {payload:?}");
        assert_cors(&resp);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "Missing message id"}));
    }
}

#[actix_web::test]
async fn malformed_acknowledgment_is_rejected() {
    let store = MemoryStore::new();
    let app = app(&store).await;

    for payload in ["not json", r#"{"id": "abc"}"#, r#"{"id": true}"#] {
        let req = test::TestRequest::patch()
            .uri("/device/sms")
            .set_payload(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {payload:?}");
    }
}

#[actix_web::test]
async fn store_failure_is_a_server_error() {
    let store = MemoryStore::new();
    store.fail_with("database is locked");
    let app = app(&store).await;

    let req = test::TestRequest::get().uri("/device/sms").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&resp);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "database is locked"}));

    let req = test::TestRequest::patch()
        .uri("/device/sms")
        .set_json(json!({"id": 1}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn other_methods_are_not_allowed() {
    let store = MemoryStore::new();
    let app = app(&store).await;

    for method in [Method::PUT, Method::DELETE, Method::POST] {
        let req = test::TestRequest::default()
            .method(method.clone())
            .uri("/device/sms")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert_cors(&resp);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "Method not allowed"}));
    }
}

#[actix_web::test]
async fn unknown_channel_is_not_found() {
    let store = MemoryStore::new();
    let app = app(&store).await;

    let req = test::TestRequest::get().uri("/device/fax").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn blank_broadcast_is_rejected() {
    let store = MemoryStore::new();
    let app = app(&store).await;

    let req = test::TestRequest::post()
        .uri("/broadcast/sms")
        .set_json(json!({"body": "   ", "triggered_by": "operator"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/device/sms").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["messages"], json!([]));
}

#[actix_web::test]
async fn history_lists_newest_first() {
    let store = MemoryStore::new();
    let app = app(&store).await;

    for text in ["first", "second"] {
        let req = test::TestRequest::post()
            .uri("/broadcast/sms")
            .set_json(json!({"body": text, "triggered_by": "operator"}))
            .to_request();
        test::call_service(&app, req).await;
    }

    let req = test::TestRequest::patch()
        .uri("/device/sms")
        .set_json(json!({"id": 1}))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get().uri("/history/sms").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body[0]["body"], "second");
    assert_eq!(body[1]["body"], "first");

    let req = test::TestRequest::get()
        .uri("/history/sms?status=sent")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["triggered_by"], "operator");

    let req = test::TestRequest::get()
        .uri("/history/sms?status=bogus")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
