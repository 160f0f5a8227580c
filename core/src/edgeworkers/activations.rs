//! Activating EdgeWorker versions on a network.

use serde::{Deserialize, Serialize};

use crate::client::{json_body, validate, EdgeworkersClient};
use crate::edgeworkers::ActivationNetwork;
use crate::error::{Error, Operation};
use crate::http::{HttpMethod, HttpRequest, Query, APPLICATION_JSON};
use crate::session::Session;
use crate::validation::{required, required_id, required_str, Validate, ValidationErrors};

/// Activation operations of one EdgeWorker.
pub trait Activations {
    /// Activations of an EdgeWorker, optionally narrowed to one version.
    fn list_activations(&self, params: ListActivationsRequest) -> Result<ListActivationsResponse, Error>;

    fn get_activation(&self, params: GetActivationRequest) -> Result<Activation, Error>;

    /// Start activating a version on staging or production.
    fn activate_version(&self, params: ActivateVersionRequest) -> Result<Activation, Error>;

    /// Cancel an activation that has not completed yet.
    fn cancel_pending_activation(&self, params: CancelPendingActivationRequest) -> Result<Activation, Error>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListActivationsRequest {
    pub edge_worker_id: u64,
    /// Empty lists every version.
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetActivationRequest {
    pub edge_worker_id: u64,
    pub activation_id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivateVersionRequest {
    pub edge_worker_id: u64,
    pub activate_version: ActivateVersion,
}

/// Body of an activation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivateVersion {
    pub network: Option<ActivationNetwork>,
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub note: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelPendingActivationRequest {
    pub edge_worker_id: u64,
    pub activation_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListActivationsResponse {
    pub activations: Vec<Activation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    pub account_id: String,
    pub activation_id: u64,
    pub created_by: String,
    pub created_time: String,
    pub edge_worker_id: u64,
    pub last_modified_time: String,
    pub network: ActivationNetwork,
    pub status: String,
    pub version: String,
    #[serde(default)]
    pub note: String,
}

impl Validate for ListActivationsRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("edge_worker_id", required_id(self.edge_worker_id));
        errors.into_result()
    }
}

impl Validate for GetActivationRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("edge_worker_id", required_id(self.edge_worker_id))
            .check("activation_id", required_id(self.activation_id));
        errors.into_result()
    }
}

impl Validate for ActivateVersionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("edge_worker_id", required_id(self.edge_worker_id))
            .nest("activate_version", self.activate_version.validate());
        errors.into_result()
    }
}

impl Validate for ActivateVersion {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("network", required(&self.network))
            .check("version", required_str(&self.version));
        errors.into_result()
    }
}

impl Validate for CancelPendingActivationRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("edge_worker_id", required_id(self.edge_worker_id))
            .check("activation_id", required_id(self.activation_id));
        errors.into_result()
    }
}

fn activations_path(edge_worker_id: u64) -> String {
    format!("/edgeworkers/v1/ids/{edge_worker_id}/activations")
}

impl<S: Session> Activations for EdgeworkersClient<S> {
    fn list_activations(&self, params: ListActivationsRequest) -> Result<ListActivationsResponse, Error> {
        let operation = Operation::ListActivations;
        validate(operation, &params)?;
        let mut query = Query::new();
        query.add_non_empty("version", &params.version);
        let path = query.append_to(activations_path(params.edge_worker_id));
        self.execute_json(operation, HttpRequest::new(HttpMethod::Get, path), 200)
    }

    fn get_activation(&self, params: GetActivationRequest) -> Result<Activation, Error> {
        let operation = Operation::GetActivation;
        validate(operation, &params)?;
        let path = format!("{}/{}", activations_path(params.edge_worker_id), params.activation_id);
        self.execute_json(operation, HttpRequest::new(HttpMethod::Get, path), 200)
    }

    fn activate_version(&self, params: ActivateVersionRequest) -> Result<Activation, Error> {
        let operation = Operation::ActivateVersion;
        validate(operation, &params)?;
        let body = json_body(operation, &params.activate_version)?;
        let request = HttpRequest::new(HttpMethod::Post, activations_path(params.edge_worker_id))
            .with_body(APPLICATION_JSON, body);
        self.execute_json(operation, request, 201)
    }

    fn cancel_pending_activation(&self, params: CancelPendingActivationRequest) -> Result<Activation, Error> {
        let operation = Operation::CancelPendingActivation;
        validate(operation, &params)?;
        let path = format!("{}/{}", activations_path(params.edge_worker_id), params.activation_id);
        self.execute_json(operation, HttpRequest::new(HttpMethod::Delete, path), 200)
    }
}
