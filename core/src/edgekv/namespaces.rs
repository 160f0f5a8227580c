//! EdgeKV namespaces and their scheduled deletion.
//!
//! Deleting a namespace is asynchronous by default: the API answers `202`
//! with the time the namespace will actually be removed, and that time can
//! be read, moved or cancelled until it passes. A synchronous delete
//! (`sync=true`) answers `200` instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::{json_body, parse_json, validate, EdgeworkersClient};
use crate::edgekv::{name_rule, namespace_path, namespaces_path, NamespaceNetwork};
use crate::error::{Error, Operation};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Query, APPLICATION_JSON, RETRY_AFTER};
use crate::session::Session;
use crate::validation::{required, Validate, ValidationErrors, BLANK};

const MIN_RETENTION_SECONDS: u64 = 86_400;
const MAX_RETENTION_SECONDS: u64 = 315_360_000;

pub trait EdgeKvNamespaces {
    fn list_edgekv_namespaces(&self, params: ListEdgeKvNamespacesRequest) -> Result<ListEdgeKvNamespacesResponse, Error>;

    fn get_edgekv_namespace(&self, params: GetEdgeKvNamespaceRequest) -> Result<Namespace, Error>;

    fn create_edgekv_namespace(&self, params: CreateEdgeKvNamespaceRequest) -> Result<Namespace, Error>;

    fn update_edgekv_namespace(&self, params: UpdateEdgeKvNamespaceRequest) -> Result<Namespace, Error>;

    fn delete_edgekv_namespace(
        &self,
        params: DeleteEdgeKvNamespaceRequest,
    ) -> Result<DeleteEdgeKvNamespaceResponse, Error>;

    fn get_namespace_scheduled_delete_time(
        &self,
        params: GetScheduledDeleteTimeRequest,
    ) -> Result<ScheduledDeleteTimeResponse, Error>;

    fn reschedule_namespace_delete(
        &self,
        params: RescheduleNamespaceDeleteRequest,
    ) -> Result<ScheduledDeleteTimeResponse, Error>;

    fn cancel_scheduled_namespace_delete(&self, params: CancelScheduledNamespaceDeleteRequest) -> Result<(), Error>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEdgeKvNamespacesRequest {
    pub network: Option<NamespaceNetwork>,
    /// Include retention, geo location and group for each namespace.
    pub details: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetEdgeKvNamespaceRequest {
    pub network: Option<NamespaceNetwork>,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateEdgeKvNamespaceRequest {
    pub network: Option<NamespaceNetwork>,
    pub namespace: Namespace,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateEdgeKvNamespaceRequest {
    pub network: Option<NamespaceNetwork>,
    pub namespace: UpdateNamespace,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteEdgeKvNamespaceRequest {
    pub network: Option<NamespaceNetwork>,
    pub name: String,
    /// Delete immediately instead of scheduling the delete.
    pub sync: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetScheduledDeleteTimeRequest {
    pub network: Option<NamespaceNetwork>,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RescheduleNamespaceDeleteRequest {
    pub network: Option<NamespaceNetwork>,
    pub name: String,
    pub body: Option<ScheduledDeleteTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelScheduledNamespaceDeleteRequest {
    pub network: Option<NamespaceNetwork>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListEdgeKvNamespacesResponse {
    pub namespaces: Vec<Namespace>,
}

/// A namespace as created and returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    #[serde(rename = "namespace")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub geo_location: String,
    /// `0` keeps items forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_in_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
}

/// Update body; retention and group are always sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNamespace {
    #[serde(rename = "namespace")]
    pub name: String,
    pub retention_in_seconds: Option<u64>,
    pub group_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeleteEdgeKvNamespaceResponse {
    /// Set when the delete was scheduled rather than performed.
    pub scheduled_delete_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledDeleteTime {
    pub scheduled_delete_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledDeleteTimeResponse {
    pub scheduled_delete_time: DateTime<Utc>,
    /// Value of the `Retry-After` response header, empty when absent.
    #[serde(skip)]
    pub retry_after: String,
}

fn retention_rule(retention: Option<u64>) -> Result<(), String> {
    match retention {
        None => Err(BLANK.to_string()),
        Some(0) => Ok(()),
        Some(seconds) if (MIN_RETENTION_SECONDS..=MAX_RETENTION_SECONDS).contains(&seconds) => Ok(()),
        Some(_) => Err(format!(
            "a non zero value specified for retention period cannot be less than {MIN_RETENTION_SECONDS} or more than {MAX_RETENTION_SECONDS}"
        )),
    }
}

fn group_id_rule(group_id: Option<i64>) -> Result<(), String> {
    match group_id {
        None => Err(BLANK.to_string()),
        Some(id) if id < 0 => Err("cannot be less than 0".to_string()),
        Some(_) => Ok(()),
    }
}

/// Network and namespace name, the target of every single-namespace call.
fn target(network: &Option<NamespaceNetwork>, name: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.check("network", required(network)).check("name", name_rule(name));
    errors
}

impl Validate for ListEdgeKvNamespacesRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("network", required(&self.network));
        errors.into_result()
    }
}

impl Validate for GetEdgeKvNamespaceRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        target(&self.network, &self.name).into_result()
    }
}

impl Validate for Namespace {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("name", name_rule(&self.name))
            .check("retention_in_seconds", retention_rule(self.retention_in_seconds))
            .check("group_id", group_id_rule(self.group_id));
        errors.into_result()
    }
}

impl Validate for UpdateNamespace {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("name", name_rule(&self.name))
            .check("retention_in_seconds", retention_rule(self.retention_in_seconds))
            .check("group_id", group_id_rule(self.group_id));
        errors.into_result()
    }
}

impl Validate for CreateEdgeKvNamespaceRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("network", required(&self.network))
            .nest("namespace", self.namespace.validate());
        errors.into_result()
    }
}

impl Validate for UpdateEdgeKvNamespaceRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("network", required(&self.network))
            .nest("namespace", self.namespace.validate());
        errors.into_result()
    }
}

impl Validate for DeleteEdgeKvNamespaceRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        target(&self.network, &self.name).into_result()
    }
}

impl Validate for GetScheduledDeleteTimeRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        target(&self.network, &self.name).into_result()
    }
}

impl Validate for RescheduleNamespaceDeleteRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = target(&self.network, &self.name);
        errors.check("body", required(&self.body));
        errors.into_result()
    }
}

impl Validate for CancelScheduledNamespaceDeleteRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        target(&self.network, &self.name).into_result()
    }
}

fn scheduled_delete_path(network: Option<NamespaceNetwork>, name: &str) -> String {
    format!("{}/status/scheduled-delete", namespace_path(network, name))
}

fn with_retry_after(operation: Operation, response: &HttpResponse) -> Result<ScheduledDeleteTimeResponse, Error> {
    let mut result: ScheduledDeleteTimeResponse = parse_json(operation, response)?;
    result.retry_after = response.header(RETRY_AFTER).unwrap_or_default().to_string();
    Ok(result)
}

impl<S: Session> EdgeKvNamespaces for EdgeworkersClient<S> {
    fn list_edgekv_namespaces(&self, params: ListEdgeKvNamespacesRequest) -> Result<ListEdgeKvNamespacesResponse, Error> {
        let operation = Operation::ListEdgeKvNamespaces;
        validate(operation, &params)?;
        let mut query = Query::new();
        if params.details {
            query.add("details", "on");
        }
        let path = query.append_to(namespaces_path(params.network));
        self.execute_json(operation, HttpRequest::new(HttpMethod::Get, path), 200)
    }

    fn get_edgekv_namespace(&self, params: GetEdgeKvNamespaceRequest) -> Result<Namespace, Error> {
        let operation = Operation::GetEdgeKvNamespace;
        validate(operation, &params)?;
        let path = namespace_path(params.network, &params.name);
        self.execute_json(operation, HttpRequest::new(HttpMethod::Get, path), 200)
    }

    fn create_edgekv_namespace(&self, params: CreateEdgeKvNamespaceRequest) -> Result<Namespace, Error> {
        let operation = Operation::CreateEdgeKvNamespace;
        validate(operation, &params)?;
        let body = json_body(operation, &params.namespace)?;
        let request = HttpRequest::new(HttpMethod::Post, namespaces_path(params.network)).with_body(APPLICATION_JSON, body);
        self.execute_json(operation, request, 200)
    }

    fn update_edgekv_namespace(&self, params: UpdateEdgeKvNamespaceRequest) -> Result<Namespace, Error> {
        let operation = Operation::UpdateEdgeKvNamespace;
        validate(operation, &params)?;
        let body = json_body(operation, &params.namespace)?;
        let path = namespace_path(params.network, &params.namespace.name);
        let request = HttpRequest::new(HttpMethod::Put, path).with_body(APPLICATION_JSON, body);
        self.execute_json(operation, request, 200)
    }

    fn delete_edgekv_namespace(
        &self,
        params: DeleteEdgeKvNamespaceRequest,
    ) -> Result<DeleteEdgeKvNamespaceResponse, Error> {
        let operation = Operation::DeleteEdgeKvNamespace;
        validate(operation, &params)?;
        let mut query = Query::new();
        if params.sync {
            query.add("sync", "true");
        }
        let path = query.append_to(namespace_path(params.network, &params.name));
        let expected = if params.sync { 200 } else { 202 };
        let response = self.execute(operation, HttpRequest::new(HttpMethod::Delete, path), expected)?;
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(DeleteEdgeKvNamespaceResponse::default());
        }
        parse_json(operation, &response)
    }

    fn get_namespace_scheduled_delete_time(
        &self,
        params: GetScheduledDeleteTimeRequest,
    ) -> Result<ScheduledDeleteTimeResponse, Error> {
        let operation = Operation::GetNamespaceScheduledDeleteTime;
        validate(operation, &params)?;
        let path = scheduled_delete_path(params.network, &params.name);
        let response = self.execute(operation, HttpRequest::new(HttpMethod::Get, path), 200)?;
        with_retry_after(operation, &response)
    }

    fn reschedule_namespace_delete(
        &self,
        params: RescheduleNamespaceDeleteRequest,
    ) -> Result<ScheduledDeleteTimeResponse, Error> {
        let operation = Operation::RescheduleNamespaceDelete;
        validate(operation, &params)?;
        let body = json_body(operation, &params.body)?;
        let path = scheduled_delete_path(params.network, &params.name);
        let request = HttpRequest::new(HttpMethod::Put, path).with_body(APPLICATION_JSON, body);
        let response = self.execute(operation, request, 200)?;
        with_retry_after(operation, &response)
    }

    fn cancel_scheduled_namespace_delete(&self, params: CancelScheduledNamespaceDeleteRequest) -> Result<(), Error> {
        let operation = Operation::CancelScheduledNamespaceDelete;
        validate(operation, &params)?;
        let path = scheduled_delete_path(params.network, &params.name);
        self.execute(operation, HttpRequest::new(HttpMethod::Delete, path), 204)?;
        Ok(())
    }
}
