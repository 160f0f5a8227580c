//! In-memory stand-in for a subset of the EdgeWorkers and EdgeKV REST APIs.
//!
//! Serves EdgeWorker IDs, versions, activations, deactivations, bundle
//! validation, EdgeKV initialization, namespaces (including scheduled
//! deletes), items and access tokens. Errors are problem-detail JSON; routes
//! outside the subset answer with an HTML page, the way an edge gateway
//! does.
//!
//! Bundles are stored opaquely, so version strings are assigned in upload
//! order (`1.0.0`, `1.0.1`, ...) instead of being read from `bundle.json`.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const ACCOUNT_ID: &str = "B-M-28QUYZ";
pub const CPCODE: &str = "1234567";
pub const CREATED_BY: &str = "mock-server";
/// Delay before an asynchronous namespace delete takes effect.
pub const NAMESPACE_DELETE_DELAY_DAYS: i64 = 10;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeWorkerId {
    pub edge_worker_id: u64,
    pub name: String,
    pub account_id: String,
    pub group_id: i64,
    pub resource_tier_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_edge_worker_id: Option<u64>,
    pub created_by: String,
    pub created_time: String,
    pub last_modified_by: String,
    pub last_modified_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeWorkerIdInput {
    pub name: String,
    pub group_id: i64,
    pub resource_tier_id: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub edge_worker_id: u64,
    pub version: String,
    pub account_id: String,
    pub checksum: String,
    pub sequence_number: u64,
    pub created_by: String,
    pub created_time: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    pub account_id: String,
    pub activation_id: u64,
    pub created_by: String,
    pub created_time: String,
    pub edge_worker_id: u64,
    pub last_modified_time: String,
    pub network: String,
    pub status: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deactivation {
    pub edge_worker_id: u64,
    pub version: String,
    pub deactivation_id: u64,
    pub account_id: String,
    pub status: String,
    pub network: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
    pub created_by: String,
    pub created_time: String,
    pub last_modified_time: String,
}

/// Body of activate and deactivate requests.
#[derive(Debug, Deserialize)]
pub struct NetworkVersionInput {
    pub network: String,
    pub version: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_in_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledDelete {
    pub scheduled_delete_time: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializationStatus {
    pub account_status: String,
    pub cpcode: String,
    pub production_status: String,
    pub staging_status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInput {
    pub allow_on_production: bool,
    pub allow_on_staging: bool,
    pub name: String,
    pub namespace_permissions: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub restrict_to_edge_worker_ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub allow_on_production: bool,
    pub allow_on_staging: bool,
    pub cpcode: String,
    pub expiry: String,
    pub issue_date: String,
    pub latest_refresh_date: Option<String>,
    pub name: String,
    pub namespace_permissions: BTreeMap<String, Vec<String>>,
    pub next_scheduled_refresh_date: String,
    pub restrict_to_edge_worker_ids: Vec<String>,
    pub token_activation_status: String,
    pub uuid: Uuid,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSummary {
    pub expiry: String,
    pub name: String,
    pub uuid: Uuid,
    pub token_activation_status: String,
    pub issue_date: String,
    pub next_scheduled_refresh_date: String,
}

/// Problem-detail error body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub instance: String,
}

impl Problem {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        let title = status.canonical_reason().unwrap_or("Error").to_string();
        let slug = title.to_lowercase().replace(' ', "-");
        Self {
            problem_type: format!("/mock-server/error-types/{slug}"),
            title,
            status: status.as_u16(),
            detail: detail.into(),
            instance: format!("/mock-server/error-instances/{}", Uuid::new_v4()),
        }
    }

    fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    fn conflict(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, detail)
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::to_vec(&self).unwrap_or_default();
        (status, [(header::CONTENT_TYPE, "application/problem+json")], body).into_response()
    }
}

type ApiResult<T> = Result<T, Problem>;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ItemKey {
    network: String,
    namespace: String,
    group: String,
    item: String,
}

#[derive(Debug, Clone)]
struct StoredItem {
    content_type: String,
    value: Bytes,
}

#[derive(Debug, Clone)]
struct StoredNamespace {
    namespace: Namespace,
    scheduled_delete: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct Store {
    next_id: u64,
    ids: BTreeMap<u64, EdgeWorkerId>,
    versions: BTreeMap<u64, Vec<(Version, Bytes)>>,
    activations: Vec<Activation>,
    deactivations: Vec<Deactivation>,
    edgekv_initialized: bool,
    namespaces: BTreeMap<(String, String), StoredNamespace>,
    items: BTreeMap<ItemKey, StoredItem>,
    tokens: BTreeMap<String, Token>,
}

impl Store {
    /// `today` and token expiries are `%Y-%m-%d`, so they compare as strings.
    fn token_summaries(&self, include_expired: bool, today: &str) -> Vec<TokenSummary> {
        self.tokens
            .values()
            .filter(|token| include_expired || token.expiry.as_str() >= today)
            .map(|token| TokenSummary {
                expiry: token.expiry.clone(),
                name: token.name.clone(),
                uuid: token.uuid,
                token_activation_status: token.token_activation_status.clone(),
                issue_date: token.issue_date.clone(),
                next_scheduled_refresh_date: token.next_scheduled_refresh_date.clone(),
            })
            .collect()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn edgeworker(&self, id: u64) -> ApiResult<&EdgeWorkerId> {
        self.ids
            .get(&id)
            .ok_or_else(|| Problem::not_found(format!("EdgeWorker ID {id} does not exist")))
    }

    fn version(&self, id: u64, version: &str) -> ApiResult<&(Version, Bytes)> {
        self.edgeworker(id)?;
        self.versions
            .get(&id)
            .and_then(|versions| versions.iter().find(|(v, _)| v.version == version))
            .ok_or_else(|| Problem::not_found(format!("version {version} of EdgeWorker ID {id} does not exist")))
    }

    fn namespace(&self, network: &str, name: &str) -> ApiResult<&StoredNamespace> {
        self.namespaces
            .get(&(network.to_string(), name.to_string()))
            .ok_or_else(|| Problem::not_found(format!("namespace {name} does not exist on {network}")))
    }

    fn namespace_mut(&mut self, network: &str, name: &str) -> ApiResult<&mut StoredNamespace> {
        self.namespaces
            .get_mut(&(network.to_string(), name.to_string()))
            .ok_or_else(|| Problem::not_found(format!("namespace {name} does not exist on {network}")))
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    let namespace = "/edgekv/v1/networks/{network}/namespaces/{namespace}";
    Router::new()
        .route("/edgeworkers/v1/ids", get(list_ids).post(create_id))
        .route("/edgeworkers/v1/ids/{id}", get(get_id).put(update_id).delete(delete_id))
        .route("/edgeworkers/v1/ids/{id}/clone", post(clone_id))
        .route("/edgeworkers/v1/ids/{id}/versions", get(list_versions).post(create_version))
        .route("/edgeworkers/v1/ids/{id}/versions/{version}", get(get_version).delete(delete_version))
        .route("/edgeworkers/v1/ids/{id}/versions/{version}/content", get(get_version_content))
        .route("/edgeworkers/v1/ids/{id}/activations", get(list_activations).post(activate_version))
        .route(
            "/edgeworkers/v1/ids/{id}/activations/{activation_id}",
            get(get_activation).delete(cancel_activation),
        )
        .route("/edgeworkers/v1/ids/{id}/deactivations", get(list_deactivations).post(deactivate_version))
        .route("/edgeworkers/v1/ids/{id}/deactivations/{deactivation_id}", get(get_deactivation))
        .route("/edgeworkers/v1/validations", post(validate_bundle))
        .route("/edgekv/v1/initialize", get(initialization_status).put(initialize))
        .route("/edgekv/v1/networks/{network}/namespaces", get(list_namespaces).post(create_namespace))
        .route(namespace, get(get_namespace).put(update_namespace).delete(delete_namespace))
        .route(
            &format!("{namespace}/status/scheduled-delete"),
            get(get_scheduled_delete).put(reschedule_delete).delete(cancel_scheduled_delete),
        )
        .route(&format!("{namespace}/groups"), get(list_groups))
        .route(&format!("{namespace}/groups/{{group}}"), get(list_items))
        .route(
            &format!("{namespace}/groups/{{group}}/items/{{item}}"),
            get(get_item).put(upsert_item).delete(delete_item),
        )
        .route("/edgekv/v1/tokens", get(list_tokens).post(create_token))
        .route("/edgekv/v1/tokens/{name}", get(get_token).delete(delete_token))
        .fallback(not_served)
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

fn activation_network(network: &str) -> ApiResult<()> {
    match network {
        "STAGING" | "PRODUCTION" => Ok(()),
        other => Err(Problem::bad_request(format!("network '{other}' must be STAGING or PRODUCTION"))),
    }
}

fn edgekv_network(network: &str) -> ApiResult<()> {
    match network {
        "staging" | "production" => Ok(()),
        other => Err(Problem::bad_request(format!("network '{other}' must be staging or production"))),
    }
}

fn require_gzip(headers: &HeaderMap) -> ApiResult<()> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if content_type == "application/gzip" {
        Ok(())
    } else {
        Err(Problem::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            format!("content type '{content_type}' is not application/gzip"),
        ))
    }
}

/// Seconds until `at`, for the `Retry-After` header.
fn retry_after(at: DateTime<Utc>) -> String {
    (at - Utc::now()).num_seconds().max(0).to_string()
}

async fn not_served(uri: Uri) -> (StatusCode, Html<String>) {
    let path = uri.path().replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;");
    (
        StatusCode::NOT_FOUND,
        Html(format!(
            "<html><head><title>Not Found</title></head>\
             <body><h1>Not Found</h1><p>The gateway does not serve &quot;{path}&quot;.</p></body></html>"
        )),
    )
}

// --- EdgeWorker IDs ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdFilter {
    pub group_id: Option<i64>,
    pub resource_tier_id: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdList {
    edge_worker_ids: Vec<EdgeWorkerId>,
}

async fn list_ids(State(db): State<Db>, Query(filter): Query<IdFilter>) -> Json<IdList> {
    let store = db.read().await;
    let edge_worker_ids = store
        .ids
        .values()
        .filter(|id| filter.group_id.map_or(true, |group| id.group_id == group))
        .filter(|id| filter.resource_tier_id.map_or(true, |tier| id.resource_tier_id == tier))
        .cloned()
        .collect();
    Json(IdList { edge_worker_ids })
}

fn new_edgeworker(store: &mut Store, input: EdgeWorkerIdInput, source: Option<u64>) -> ApiResult<EdgeWorkerId> {
    if input.name.is_empty() {
        return Err(Problem::bad_request("name cannot be blank"));
    }
    let created = now();
    let id = EdgeWorkerId {
        edge_worker_id: store.next_id(),
        name: input.name,
        account_id: ACCOUNT_ID.to_string(),
        group_id: input.group_id,
        resource_tier_id: input.resource_tier_id,
        source_edge_worker_id: source,
        created_by: CREATED_BY.to_string(),
        created_time: created.clone(),
        last_modified_by: CREATED_BY.to_string(),
        last_modified_time: created,
    };
    store.ids.insert(id.edge_worker_id, id.clone());
    tracing::debug!(edge_worker_id = id.edge_worker_id, "created EdgeWorker ID");
    Ok(id)
}

async fn create_id(
    State(db): State<Db>,
    Json(input): Json<EdgeWorkerIdInput>,
) -> ApiResult<(StatusCode, Json<EdgeWorkerId>)> {
    let mut store = db.write().await;
    let id = new_edgeworker(&mut store, input, None)?;
    Ok((StatusCode::CREATED, Json(id)))
}

async fn get_id(State(db): State<Db>, Path(id): Path<u64>) -> ApiResult<Json<EdgeWorkerId>> {
    let store = db.read().await;
    store.edgeworker(id).cloned().map(Json)
}

async fn update_id(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<EdgeWorkerIdInput>,
) -> ApiResult<Json<EdgeWorkerId>> {
    let mut store = db.write().await;
    let record = store
        .ids
        .get_mut(&id)
        .ok_or_else(|| Problem::not_found(format!("EdgeWorker ID {id} does not exist")))?;
    record.name = input.name;
    record.group_id = input.group_id;
    record.resource_tier_id = input.resource_tier_id;
    record.last_modified_time = now();
    Ok(Json(record.clone()))
}

async fn clone_id(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<EdgeWorkerIdInput>,
) -> ApiResult<Json<EdgeWorkerId>> {
    let mut store = db.write().await;
    store.edgeworker(id)?;
    let clone = new_edgeworker(&mut store, input, Some(id))?;
    let versions = store
        .versions
        .get(&id)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|(mut version, bundle)| {
            version.edge_worker_id = clone.edge_worker_id;
            (version, bundle)
        })
        .collect();
    store.versions.insert(clone.edge_worker_id, versions);
    Ok(Json(clone))
}

async fn delete_id(State(db): State<Db>, Path(id): Path<u64>) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    store.edgeworker(id)?;
    store.ids.remove(&id);
    store.versions.remove(&id);
    store.activations.retain(|a| a.edge_worker_id != id);
    store.deactivations.retain(|d| d.edge_worker_id != id);
    Ok(StatusCode::NO_CONTENT)
}

// --- versions and bundles ---

#[derive(Serialize)]
struct VersionList {
    versions: Vec<Version>,
}

async fn list_versions(State(db): State<Db>, Path(id): Path<u64>) -> ApiResult<Json<VersionList>> {
    let store = db.read().await;
    store.edgeworker(id)?;
    let versions = store
        .versions
        .get(&id)
        .map(|versions| versions.iter().map(|(v, _)| v.clone()).collect())
        .unwrap_or_default();
    Ok(Json(VersionList { versions }))
}

async fn create_version(
    State(db): State<Db>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    bundle: Bytes,
) -> ApiResult<(StatusCode, Json<Version>)> {
    require_gzip(&headers)?;
    if !bundle.starts_with(&GZIP_MAGIC) {
        return Err(Problem::bad_request("bundle is not a gzip archive"));
    }
    let mut store = db.write().await;
    store.edgeworker(id)?;
    let versions = store.versions.entry(id).or_default();
    let sequence_number = versions.len() as u64 + 1;
    let version = Version {
        edge_worker_id: id,
        version: format!("1.0.{}", sequence_number - 1),
        account_id: ACCOUNT_ID.to_string(),
        checksum: format!("{:x}", Sha256::digest(&bundle)),
        sequence_number,
        created_by: CREATED_BY.to_string(),
        created_time: now(),
    };
    versions.push((version.clone(), bundle));
    tracing::debug!(edge_worker_id = id, version = %version.version, "stored bundle");
    Ok((StatusCode::CREATED, Json(version)))
}

async fn get_version(State(db): State<Db>, Path((id, version)): Path<(u64, String)>) -> ApiResult<Json<Version>> {
    let store = db.read().await;
    store.version(id, &version).map(|(v, _)| Json(v.clone()))
}

async fn get_version_content(
    State(db): State<Db>,
    Path((id, version)): Path<(u64, String)>,
) -> ApiResult<Response> {
    let store = db.read().await;
    let (_, bundle) = store.version(id, &version)?;
    Ok(([(header::CONTENT_TYPE, "application/gzip")], bundle.clone()).into_response())
}

async fn delete_version(State(db): State<Db>, Path((id, version)): Path<(u64, String)>) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    store.version(id, &version)?;
    if let Some(versions) = store.versions.get_mut(&id) {
        versions.retain(|(v, _)| v.version != version);
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleIssue {
    #[serde(rename = "type")]
    pub issue_type: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleReport {
    pub errors: Vec<BundleIssue>,
    pub warnings: Vec<BundleIssue>,
}

async fn validate_bundle(headers: HeaderMap, bundle: Bytes) -> ApiResult<Json<BundleReport>> {
    require_gzip(&headers)?;
    let mut errors = Vec::new();
    if bundle.is_empty() {
        errors.push(BundleIssue {
            issue_type: "EMPTY_BUNDLE".to_string(),
            message: "bundle is empty".to_string(),
        });
    } else if !bundle.starts_with(&GZIP_MAGIC) {
        errors.push(BundleIssue {
            issue_type: "INVALID_GZIP".to_string(),
            message: "bundle is not a gzip archive".to_string(),
        });
    }
    Ok(Json(BundleReport {
        errors,
        warnings: Vec::new(),
    }))
}

// --- activations and deactivations ---

#[derive(Debug, Deserialize)]
pub struct VersionFilter {
    pub version: Option<String>,
}

#[derive(Serialize)]
struct ActivationList {
    activations: Vec<Activation>,
}

#[derive(Serialize)]
struct DeactivationList {
    deactivations: Vec<Deactivation>,
}

async fn list_activations(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Query(filter): Query<VersionFilter>,
) -> ApiResult<Json<ActivationList>> {
    let store = db.read().await;
    store.edgeworker(id)?;
    let activations = store
        .activations
        .iter()
        .filter(|a| a.edge_worker_id == id)
        .filter(|a| filter.version.as_ref().map_or(true, |v| &a.version == v))
        .cloned()
        .collect();
    Ok(Json(ActivationList { activations }))
}

async fn activate_version(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<NetworkVersionInput>,
) -> ApiResult<(StatusCode, Json<Activation>)> {
    activation_network(&input.network)?;
    let mut store = db.write().await;
    store.version(id, &input.version)?;
    let created = now();
    let activation = Activation {
        account_id: ACCOUNT_ID.to_string(),
        activation_id: store.next_id(),
        created_by: CREATED_BY.to_string(),
        created_time: created.clone(),
        edge_worker_id: id,
        last_modified_time: created,
        network: input.network,
        status: "PRESUBMIT".to_string(),
        version: input.version,
        note: input.note,
    };
    store.activations.push(activation.clone());
    Ok((StatusCode::CREATED, Json(activation)))
}

async fn get_activation(
    State(db): State<Db>,
    Path((id, activation_id)): Path<(u64, u64)>,
) -> ApiResult<Json<Activation>> {
    let store = db.read().await;
    store
        .activations
        .iter()
        .find(|a| a.edge_worker_id == id && a.activation_id == activation_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| Problem::not_found(format!("activation {activation_id} does not exist")))
}

async fn cancel_activation(
    State(db): State<Db>,
    Path((id, activation_id)): Path<(u64, u64)>,
) -> ApiResult<Json<Activation>> {
    let mut store = db.write().await;
    let activation = store
        .activations
        .iter_mut()
        .find(|a| a.edge_worker_id == id && a.activation_id == activation_id)
        .ok_or_else(|| Problem::not_found(format!("activation {activation_id} does not exist")))?;
    if activation.status != "PRESUBMIT" && activation.status != "PENDING" {
        return Err(Problem::conflict(format!(
            "activation {activation_id} is {} and can no longer be cancelled",
            activation.status
        )));
    }
    activation.status = "CANCELLED".to_string();
    activation.last_modified_time = now();
    Ok(Json(activation.clone()))
}

async fn list_deactivations(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Query(filter): Query<VersionFilter>,
) -> ApiResult<Json<DeactivationList>> {
    let store = db.read().await;
    store.edgeworker(id)?;
    let deactivations = store
        .deactivations
        .iter()
        .filter(|d| d.edge_worker_id == id)
        .filter(|d| filter.version.as_ref().map_or(true, |v| &d.version == v))
        .cloned()
        .collect();
    Ok(Json(DeactivationList { deactivations }))
}

async fn deactivate_version(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<NetworkVersionInput>,
) -> ApiResult<(StatusCode, Json<Deactivation>)> {
    activation_network(&input.network)?;
    let mut store = db.write().await;
    store.version(id, &input.version)?;
    let created = now();
    let deactivation = Deactivation {
        edge_worker_id: id,
        version: input.version,
        deactivation_id: store.next_id(),
        account_id: ACCOUNT_ID.to_string(),
        status: "PRESUBMIT".to_string(),
        network: input.network,
        note: input.note,
        created_by: CREATED_BY.to_string(),
        created_time: created.clone(),
        last_modified_time: created,
    };
    store.deactivations.push(deactivation.clone());
    Ok((StatusCode::CREATED, Json(deactivation)))
}

async fn get_deactivation(
    State(db): State<Db>,
    Path((id, deactivation_id)): Path<(u64, u64)>,
) -> ApiResult<Json<Deactivation>> {
    let store = db.read().await;
    store
        .deactivations
        .iter()
        .find(|d| d.edge_worker_id == id && d.deactivation_id == deactivation_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| Problem::not_found(format!("deactivation {deactivation_id} does not exist")))
}

// --- EdgeKV initialization ---

fn initialization(initialized: bool) -> InitializationStatus {
    let status = if initialized { "INITIALIZED" } else { "UNINITIALIZED" };
    InitializationStatus {
        account_status: status.to_string(),
        cpcode: CPCODE.to_string(),
        production_status: status.to_string(),
        staging_status: status.to_string(),
    }
}

async fn initialize(State(db): State<Db>) -> (StatusCode, Json<InitializationStatus>) {
    let mut store = db.write().await;
    store.edgekv_initialized = true;
    (StatusCode::CREATED, Json(initialization(true)))
}

async fn initialization_status(State(db): State<Db>) -> Json<InitializationStatus> {
    Json(initialization(db.read().await.edgekv_initialized))
}

// --- EdgeKV namespaces ---

#[derive(Debug, Deserialize)]
pub struct NamespaceListParams {
    pub details: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub sync: Option<bool>,
}

#[derive(Serialize)]
struct NamespaceList {
    namespaces: Vec<Namespace>,
}

async fn list_namespaces(
    State(db): State<Db>,
    Path(network): Path<String>,
    Query(params): Query<NamespaceListParams>,
) -> ApiResult<Json<NamespaceList>> {
    edgekv_network(&network)?;
    let details = params.details.as_deref() == Some("on");
    let store = db.read().await;
    let namespaces = store
        .namespaces
        .iter()
        .filter(|((n, _), _)| *n == network)
        .map(|(_, stored)| {
            if details {
                stored.namespace.clone()
            } else {
                Namespace {
                    namespace: stored.namespace.namespace.clone(),
                    ..Namespace::default()
                }
            }
        })
        .collect();
    Ok(Json(NamespaceList { namespaces }))
}

async fn create_namespace(
    State(db): State<Db>,
    Path(network): Path<String>,
    Json(mut input): Json<Namespace>,
) -> ApiResult<Json<Namespace>> {
    edgekv_network(&network)?;
    if input.namespace.is_empty() {
        return Err(Problem::bad_request("namespace cannot be blank"));
    }
    let mut store = db.write().await;
    if !store.edgekv_initialized {
        return Err(Problem::conflict("EdgeKV is not initialized for this account"));
    }
    let key = (network.clone(), input.namespace.clone());
    if store.namespaces.contains_key(&key) {
        return Err(Problem::conflict(format!("namespace {} already exists on {network}", input.namespace)));
    }
    input.geo_location.get_or_insert_with(|| "US".to_string());
    input.group_id.get_or_insert(0);
    store.namespaces.insert(
        key,
        StoredNamespace {
            namespace: input.clone(),
            scheduled_delete: None,
        },
    );
    tracing::debug!(%network, namespace = %input.namespace, "created namespace");
    Ok(Json(input))
}

async fn get_namespace(
    State(db): State<Db>,
    Path((network, name)): Path<(String, String)>,
) -> ApiResult<Json<Namespace>> {
    edgekv_network(&network)?;
    let store = db.read().await;
    store.namespace(&network, &name).map(|stored| Json(stored.namespace.clone()))
}

async fn update_namespace(
    State(db): State<Db>,
    Path((network, name)): Path<(String, String)>,
    Json(input): Json<Namespace>,
) -> ApiResult<Json<Namespace>> {
    edgekv_network(&network)?;
    if input.namespace != name {
        return Err(Problem::bad_request(format!(
            "namespace '{}' in the body does not match '{name}' in the path",
            input.namespace
        )));
    }
    let mut store = db.write().await;
    let stored = store.namespace_mut(&network, &name)?;
    stored.namespace.retention_in_seconds = input.retention_in_seconds;
    stored.namespace.group_id = input.group_id;
    Ok(Json(stored.namespace.clone()))
}

async fn delete_namespace(
    State(db): State<Db>,
    Path((network, name)): Path<(String, String)>,
    Query(params): Query<DeleteParams>,
) -> ApiResult<Response> {
    edgekv_network(&network)?;
    let mut store = db.write().await;
    store.namespace(&network, &name)?;
    if params.sync.unwrap_or(false) {
        store.namespaces.remove(&(network.clone(), name.clone()));
        store.items.retain(|key, _| !(key.network == network && key.namespace == name));
        return Ok(StatusCode::OK.into_response());
    }
    let scheduled_delete_time = Utc::now() + Duration::days(NAMESPACE_DELETE_DELAY_DAYS);
    store.namespace_mut(&network, &name)?.scheduled_delete = Some(scheduled_delete_time);
    Ok((StatusCode::ACCEPTED, Json(ScheduledDelete { scheduled_delete_time })).into_response())
}

fn scheduled_delete_response(at: DateTime<Utc>) -> Response {
    (
        [(header::RETRY_AFTER, retry_after(at))],
        Json(ScheduledDelete {
            scheduled_delete_time: at,
        }),
    )
        .into_response()
}

async fn get_scheduled_delete(
    State(db): State<Db>,
    Path((network, name)): Path<(String, String)>,
) -> ApiResult<Response> {
    edgekv_network(&network)?;
    let store = db.read().await;
    let at = store
        .namespace(&network, &name)?
        .scheduled_delete
        .ok_or_else(|| Problem::not_found(format!("namespace {name} is not scheduled for deletion")))?;
    Ok(scheduled_delete_response(at))
}

async fn reschedule_delete(
    State(db): State<Db>,
    Path((network, name)): Path<(String, String)>,
    Json(input): Json<ScheduledDelete>,
) -> ApiResult<Response> {
    edgekv_network(&network)?;
    if input.scheduled_delete_time <= Utc::now() {
        return Err(Problem::bad_request("scheduledDeleteTime must be in the future"));
    }
    let mut store = db.write().await;
    let stored = store.namespace_mut(&network, &name)?;
    if stored.scheduled_delete.is_none() {
        return Err(Problem::not_found(format!("namespace {name} is not scheduled for deletion")));
    }
    stored.scheduled_delete = Some(input.scheduled_delete_time);
    Ok(scheduled_delete_response(input.scheduled_delete_time))
}

async fn cancel_scheduled_delete(
    State(db): State<Db>,
    Path((network, name)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    edgekv_network(&network)?;
    let mut store = db.write().await;
    let stored = store.namespace_mut(&network, &name)?;
    if stored.scheduled_delete.take().is_none() {
        return Err(Problem::not_found(format!("namespace {name} is not scheduled for deletion")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_groups(
    State(db): State<Db>,
    Path((network, name)): Path<(String, String)>,
) -> ApiResult<Json<Vec<String>>> {
    edgekv_network(&network)?;
    let store = db.read().await;
    store.namespace(&network, &name)?;
    let mut groups: Vec<String> = store
        .items
        .keys()
        .filter(|key| key.network == network && key.namespace == name)
        .map(|key| key.group.clone())
        .collect();
    groups.dedup();
    Ok(Json(groups))
}

// --- EdgeKV items ---

async fn list_items(
    State(db): State<Db>,
    Path((network, name, group)): Path<(String, String, String)>,
) -> ApiResult<Json<Vec<String>>> {
    edgekv_network(&network)?;
    let store = db.read().await;
    store.namespace(&network, &name)?;
    let items = store
        .items
        .keys()
        .filter(|key| key.network == network && key.namespace == name && key.group == group)
        .map(|key| key.item.clone())
        .collect();
    Ok(Json(items))
}

async fn get_item(
    State(db): State<Db>,
    Path((network, namespace, group, item)): Path<(String, String, String, String)>,
) -> ApiResult<Response> {
    edgekv_network(&network)?;
    let store = db.read().await;
    let key = ItemKey {
        network,
        namespace,
        group,
        item,
    };
    let stored = store
        .items
        .get(&key)
        .ok_or_else(|| Problem::not_found(format!("item {} does not exist in group {}", key.item, key.group)))?;
    Ok(([(header::CONTENT_TYPE, stored.content_type.clone())], stored.value.clone()).into_response())
}

async fn upsert_item(
    State(db): State<Db>,
    Path((network, namespace, group, item)): Path<(String, String, String, String)>,
    headers: HeaderMap,
    value: Bytes,
) -> ApiResult<String> {
    edgekv_network(&network)?;
    let mut store = db.write().await;
    store.namespace(&network, &namespace)?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("text/plain")
        .to_string();
    let message = format!(
        "Item was upserted in KV store with database {CPCODE}, namespace {namespace}, group {group}, and key {item}."
    );
    store.items.insert(
        ItemKey {
            network,
            namespace,
            group,
            item,
        },
        StoredItem { content_type, value },
    );
    Ok(message)
}

async fn delete_item(
    State(db): State<Db>,
    Path((network, namespace, group, item)): Path<(String, String, String, String)>,
) -> ApiResult<String> {
    edgekv_network(&network)?;
    let mut store = db.write().await;
    let key = ItemKey {
        network,
        namespace,
        group,
        item,
    };
    store
        .items
        .remove(&key)
        .ok_or_else(|| Problem::not_found(format!("item {} does not exist in group {}", key.item, key.group)))?;
    Ok("Item was marked for deletion from database, the deletion may take up to 10 seconds to propagate.".to_string())
}

// --- EdgeKV access tokens ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenListParams {
    pub include_expired: Option<bool>,
}

#[derive(Serialize)]
struct TokenList {
    tokens: Vec<TokenSummary>,
}

#[derive(Serialize)]
struct DeletedToken {
    name: String,
    uuid: Uuid,
}

async fn create_token(State(db): State<Db>, Json(input): Json<TokenInput>) -> ApiResult<Json<Token>> {
    if !input.allow_on_production && !input.allow_on_staging {
        return Err(Problem::bad_request("token must be allowed on at least one network"));
    }
    if input.namespace_permissions.is_empty() {
        return Err(Problem::bad_request("namespacePermissions cannot be empty"));
    }
    let mut store = db.write().await;
    if store.tokens.contains_key(&input.name) {
        return Err(Problem::conflict(format!("token {} already exists", input.name)));
    }
    let issued = Utc::now();
    let token = Token {
        allow_on_production: input.allow_on_production,
        allow_on_staging: input.allow_on_staging,
        cpcode: CPCODE.to_string(),
        expiry: date(issued + Duration::days(90)),
        issue_date: date(issued),
        latest_refresh_date: None,
        name: input.name,
        namespace_permissions: input.namespace_permissions,
        next_scheduled_refresh_date: date(issued + Duration::days(30)),
        restrict_to_edge_worker_ids: input.restrict_to_edge_worker_ids,
        token_activation_status: "IN_PROGRESS".to_string(),
        uuid: Uuid::new_v4(),
    };
    store.tokens.insert(token.name.clone(), token.clone());
    Ok(Json(token))
}

/// Expired tokens are listed only with `includeExpired=true`.
async fn list_tokens(State(db): State<Db>, Query(params): Query<TokenListParams>) -> Json<TokenList> {
    let store = db.read().await;
    let tokens = store.token_summaries(params.include_expired.unwrap_or(false), &date(Utc::now()));
    Json(TokenList { tokens })
}

async fn get_token(State(db): State<Db>, Path(name): Path<String>) -> ApiResult<Json<Token>> {
    let store = db.read().await;
    store
        .tokens
        .get(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| Problem::not_found(format!("token {name} does not exist")))
}

async fn delete_token(State(db): State<Db>, Path(name): Path<String>) -> ApiResult<Json<DeletedToken>> {
    let mut store = db.write().await;
    let token = store
        .tokens
        .remove(&name)
        .ok_or_else(|| Problem::not_found(format!("token {name} does not exist")))?;
    Ok(Json(DeletedToken {
        name: token.name,
        uuid: token.uuid,
    }))
}
