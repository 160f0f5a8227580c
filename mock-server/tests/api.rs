use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, Activation, EdgeWorkerId, Namespace, Problem, ScheduledDelete, Token, Version};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder().method(method).uri(uri).body(String::new()).unwrap()
}

fn gzip_request(uri: &str, bundle: &[u8]) -> Request<axum::body::Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/gzip")
        .body(axum::body::Body::from(bundle.to_vec()))
        .unwrap()
}

const BUNDLE: &[u8] = &[0x1f, 0x8b, 0x08, 0x00, 0x01, 0x02];

async fn create_edgeworker(app: &Router) -> EdgeWorkerId {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/edgeworkers/v1/ids",
            r#"{"name":"devexp","groupId":72297,"resourceTierId":100}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

async fn initialize_edgekv(app: &Router) {
    let resp = app
        .clone()
        .oneshot(empty_request("PUT", "/edgekv/v1/initialize"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
}

// --- EdgeWorker IDs ---

#[tokio::test]
async fn list_ids_empty() {
    let resp = app().oneshot(empty_request("GET", "/edgeworkers/v1/ids")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({"edgeWorkerIds": []}));
}

#[tokio::test]
async fn create_then_filter_ids() {
    let app = app();
    let created = create_edgeworker(&app).await;
    assert_eq!(created.name, "devexp");
    assert_eq!(created.source_edge_worker_id, None);

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/edgeworkers/v1/ids?groupId=1"))
        .await
        .unwrap();
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["edgeWorkerIds"].as_array().unwrap().len(), 0);

    let resp = app
        .oneshot(empty_request("GET", "/edgeworkers/v1/ids?groupId=72297&resourceTierId=100"))
        .await
        .unwrap();
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["edgeWorkerIds"][0]["edgeWorkerId"], created.edge_worker_id);
}

#[tokio::test]
async fn get_missing_id_is_problem_json() {
    let resp = app().oneshot(empty_request("GET", "/edgeworkers/v1/ids/99")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "application/problem+json");
    let problem: Problem = body_json(resp).await;
    assert_eq!(problem.title, "Not Found");
    assert_eq!(problem.detail, "EdgeWorker ID 99 does not exist");
}

#[tokio::test]
async fn clone_records_source() {
    let app = app();
    let created = create_edgeworker(&app).await;
    let resp = app
        .oneshot(json_request(
            "POST",
            &format!("/edgeworkers/v1/ids/{}/clone", created.edge_worker_id),
            r#"{"name":"devexp-clone","groupId":72297,"resourceTierId":200}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let clone: EdgeWorkerId = body_json(resp).await;
    assert_eq!(clone.source_edge_worker_id, Some(created.edge_worker_id));
    assert_eq!(clone.resource_tier_id, 200);
}

#[tokio::test]
async fn delete_id_returns_204_then_404() {
    let app = app();
    let created = create_edgeworker(&app).await;
    let uri = format!("/edgeworkers/v1/ids/{}", created.edge_worker_id);
    let resp = app.clone().oneshot(empty_request("DELETE", &uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = app.oneshot(empty_request("DELETE", &uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- versions ---

#[tokio::test]
async fn upload_and_download_bundle() {
    let app = app();
    let created = create_edgeworker(&app).await;
    let base = format!("/edgeworkers/v1/ids/{}/versions", created.edge_worker_id);

    let resp = app.clone().oneshot(gzip_request(&base, BUNDLE)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let version: Version = body_json(resp).await;
    assert_eq!(version.version, "1.0.0");
    assert_eq!(version.sequence_number, 1);
    assert_eq!(version.checksum.len(), 64);

    let resp = app
        .oneshot(empty_request("GET", &format!("{base}/1.0.0/content")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "application/gzip");
    assert_eq!(body_bytes(resp).await.as_ref(), BUNDLE);
}

#[tokio::test]
async fn upload_rejects_json_content_type() {
    let app = app();
    let created = create_edgeworker(&app).await;
    let resp = app
        .oneshot(json_request(
            "POST",
            &format!("/edgeworkers/v1/ids/{}/versions", created.edge_worker_id),
            "{}",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn validation_reports_non_gzip_bundle() {
    let resp = app()
        .oneshot(gzip_request("/edgeworkers/v1/validations", b"plain text"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["errors"][0]["type"], "INVALID_GZIP");
    assert_eq!(body["warnings"], serde_json::json!([]));
}

// --- activations ---

#[tokio::test]
async fn activate_and_cancel() {
    let app = app();
    let created = create_edgeworker(&app).await;
    let base = format!("/edgeworkers/v1/ids/{}", created.edge_worker_id);
    app.clone()
        .oneshot(gzip_request(&format!("{base}/versions"), BUNDLE))
        .await
        .unwrap();

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("{base}/activations"),
            r#"{"network":"STAGING","version":"1.0.0"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let activation: Activation = body_json(resp).await;
    assert_eq!(activation.status, "PRESUBMIT");

    let uri = format!("{base}/activations/{}", activation.activation_id);
    let resp = app.clone().oneshot(empty_request("DELETE", &uri)).await.unwrap();
    let cancelled: Activation = body_json(resp).await;
    assert_eq!(cancelled.status, "CANCELLED");

    let resp = app.oneshot(empty_request("DELETE", &uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn activate_rejects_lowercase_network() {
    let app = app();
    let created = create_edgeworker(&app).await;
    let resp = app
        .oneshot(json_request(
            "POST",
            &format!("/edgeworkers/v1/ids/{}/activations", created.edge_worker_id),
            r#"{"network":"staging","version":"1.0.0"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- EdgeKV ---

#[tokio::test]
async fn initialization_status_changes_after_put() {
    let app = app();
    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/edgekv/v1/initialize"))
        .await
        .unwrap();
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["accountStatus"], "UNINITIALIZED");

    initialize_edgekv(&app).await;
    let resp = app.oneshot(empty_request("GET", "/edgekv/v1/initialize")).await.unwrap();
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["accountStatus"], "INITIALIZED");
}

#[tokio::test]
async fn create_namespace_requires_initialization() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/edgekv/v1/networks/staging/namespaces",
            r#"{"namespace":"marketing"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn namespace_listing_hides_details_unless_asked() {
    let app = app();
    initialize_edgekv(&app).await;
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/edgekv/v1/networks/staging/namespaces",
            r#"{"namespace":"marketing","retentionInSeconds":86400,"groupId":0,"geoLocation":"EU"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/edgekv/v1/networks/staging/namespaces"))
        .await
        .unwrap();
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({"namespaces": [{"namespace": "marketing"}]}));

    let resp = app
        .oneshot(empty_request("GET", "/edgekv/v1/networks/staging/namespaces?details=on"))
        .await
        .unwrap();
    let body: serde_json::Value = body_json(resp).await;
    let namespace: Namespace = serde_json::from_value(body["namespaces"][0].clone()).unwrap();
    assert_eq!(namespace.geo_location.as_deref(), Some("EU"));
    assert_eq!(namespace.retention_in_seconds, Some(86400));
}

#[tokio::test]
async fn unknown_network_is_bad_request() {
    let resp = app()
        .oneshot(empty_request("GET", "/edgekv/v1/networks/qa/namespaces"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn async_delete_can_be_rescheduled_and_cancelled() {
    let app = app();
    initialize_edgekv(&app).await;
    app.clone()
        .oneshot(json_request(
            "POST",
            "/edgekv/v1/networks/staging/namespaces",
            r#"{"namespace":"marketing"}"#,
        ))
        .await
        .unwrap();

    let resp = app
        .clone()
        .oneshot(empty_request("DELETE", "/edgekv/v1/networks/staging/namespaces/marketing"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let scheduled: ScheduledDelete = body_json(resp).await;

    let status_uri = "/edgekv/v1/networks/staging/namespaces/marketing/status/scheduled-delete";
    let later = scheduled.scheduled_delete_time + chrono::Duration::days(1);
    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            status_uri,
            &serde_json::json!({"scheduledDeleteTime": later}).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key(http::header::RETRY_AFTER));
    let rescheduled: ScheduledDelete = body_json(resp).await;
    assert_eq!(rescheduled.scheduled_delete_time, later);

    let resp = app.clone().oneshot(empty_request("DELETE", status_uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = app.oneshot(empty_request("GET", status_uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sync_delete_removes_namespace() {
    let app = app();
    initialize_edgekv(&app).await;
    app.clone()
        .oneshot(json_request(
            "POST",
            "/edgekv/v1/networks/production/namespaces",
            r#"{"namespace":"marketing"}"#,
        ))
        .await
        .unwrap();
    let resp = app
        .clone()
        .oneshot(empty_request(
            "DELETE",
            "/edgekv/v1/networks/production/namespaces/marketing?sync=true",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());
    let resp = app
        .oneshot(empty_request("GET", "/edgekv/v1/networks/production/namespaces/marketing"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn items_keep_their_content_type() {
    let app = app();
    initialize_edgekv(&app).await;
    app.clone()
        .oneshot(json_request(
            "POST",
            "/edgekv/v1/networks/staging/namespaces",
            r#"{"namespace":"default"}"#,
        ))
        .await
        .unwrap();
    let item_uri = "/edgekv/v1/networks/staging/namespaces/default/groups/countries/items/US";
    let resp = app
        .clone()
        .oneshot(json_request("PUT", item_uri, r#"{"currency":"USD"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let message = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
    assert!(message.starts_with("Item was upserted in KV store"));

    let resp = app.clone().oneshot(empty_request("GET", item_uri)).await.unwrap();
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "application/json");
    assert_eq!(body_bytes(resp).await.as_ref(), br#"{"currency":"USD"}"#);

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/edgekv/v1/networks/staging/namespaces/default/groups"))
        .await
        .unwrap();
    let groups: Vec<String> = body_json(resp).await;
    assert_eq!(groups, vec!["countries".to_string()]);

    let resp = app.clone().oneshot(empty_request("DELETE", item_uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app.oneshot(empty_request("GET", item_uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn token_lifecycle() {
    let app = app();
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/edgekv/v1/tokens",
            r#"{"allowOnProduction":false,"allowOnStaging":true,"name":"devexp-token","namespacePermissions":{"default":["r","w"]}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let token: Token = body_json(resp).await;
    assert_eq!(token.token_activation_status, "IN_PROGRESS");

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/edgekv/v1/tokens?includeExpired=true"))
        .await
        .unwrap();
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["tokens"][0]["name"], "devexp-token");

    // A fresh token has not expired, so it is listed by default too.
    let resp = app.clone().oneshot(empty_request("GET", "/edgekv/v1/tokens")).await.unwrap();
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["tokens"][0]["expiry"], token.expiry);

    let resp = app
        .clone()
        .oneshot(empty_request("DELETE", "/edgekv/v1/tokens/devexp-token"))
        .await
        .unwrap();
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["uuid"], token.uuid.to_string());

    let resp = app
        .oneshot(empty_request("GET", "/edgekv/v1/tokens/devexp-token"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn token_needs_a_network() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/edgekv/v1/tokens",
            r#"{"allowOnProduction":false,"allowOnStaging":false,"name":"t","namespacePermissions":{"default":["r"]}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- routes outside the subset ---

#[tokio::test]
async fn unknown_route_serves_html() {
    let resp = app()
        .oneshot(empty_request("GET", "/edgeworkers/v1/reports"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let content_type = resp.headers()[http::header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));
    let body = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
    assert!(body.contains("&quot;/edgeworkers/v1/reports&quot;"));
}
