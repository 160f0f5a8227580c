//! Deactivating EdgeWorker versions.

use serde::{Deserialize, Serialize};

use crate::client::{json_body, validate, EdgeworkersClient};
use crate::edgeworkers::ActivationNetwork;
use crate::error::{Error, Operation};
use crate::http::{HttpMethod, HttpRequest, Query, APPLICATION_JSON};
use crate::session::Session;
use crate::validation::{required, required_id, required_str, Validate, ValidationErrors};

pub trait Deactivations {
    fn list_deactivations(&self, params: ListDeactivationsRequest) -> Result<ListDeactivationsResponse, Error>;

    fn get_deactivation(&self, params: GetDeactivationRequest) -> Result<Deactivation, Error>;

    /// Remove an active version from a network.
    fn deactivate_version(&self, params: DeactivateVersionRequest) -> Result<Deactivation, Error>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListDeactivationsRequest {
    pub edge_worker_id: u64,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetDeactivationRequest {
    pub edge_worker_id: u64,
    pub deactivation_id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeactivateVersionRequest {
    pub edge_worker_id: u64,
    pub deactivate_version: DeactivateVersion,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeactivateVersion {
    pub network: Option<ActivationNetwork>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub note: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListDeactivationsResponse {
    pub deactivations: Vec<Deactivation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deactivation {
    pub edge_worker_id: u64,
    pub version: String,
    pub deactivation_id: u64,
    pub account_id: String,
    pub status: String,
    pub network: ActivationNetwork,
    #[serde(default)]
    pub note: String,
    pub created_by: String,
    pub created_time: String,
    pub last_modified_time: String,
}

impl Validate for ListDeactivationsRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("edge_worker_id", required_id(self.edge_worker_id));
        errors.into_result()
    }
}

impl Validate for GetDeactivationRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("edge_worker_id", required_id(self.edge_worker_id))
            .check("deactivation_id", required_id(self.deactivation_id));
        errors.into_result()
    }
}

impl Validate for DeactivateVersionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("edge_worker_id", required_id(self.edge_worker_id))
            .nest("deactivate_version", self.deactivate_version.validate());
        errors.into_result()
    }
}

impl Validate for DeactivateVersion {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("network", required(&self.network))
            .check("version", required_str(&self.version));
        errors.into_result()
    }
}

fn deactivations_path(edge_worker_id: u64) -> String {
    format!("/edgeworkers/v1/ids/{edge_worker_id}/deactivations")
}

impl<S: Session> Deactivations for EdgeworkersClient<S> {
    fn list_deactivations(&self, params: ListDeactivationsRequest) -> Result<ListDeactivationsResponse, Error> {
        let operation = Operation::ListDeactivations;
        validate(operation, &params)?;
        let mut query = Query::new();
        query.add_non_empty("version", &params.version);
        let path = query.append_to(deactivations_path(params.edge_worker_id));
        self.execute_json(operation, HttpRequest::new(HttpMethod::Get, path), 200)
    }

    fn get_deactivation(&self, params: GetDeactivationRequest) -> Result<Deactivation, Error> {
        let operation = Operation::GetDeactivation;
        validate(operation, &params)?;
        let path = format!("{}/{}", deactivations_path(params.edge_worker_id), params.deactivation_id);
        self.execute_json(operation, HttpRequest::new(HttpMethod::Get, path), 200)
    }

    fn deactivate_version(&self, params: DeactivateVersionRequest) -> Result<Deactivation, Error> {
        let operation = Operation::DeactivateVersion;
        validate(operation, &params)?;
        let body = json_body(operation, &params.deactivate_version)?;
        let request = HttpRequest::new(HttpMethod::Post, deactivations_path(params.edge_worker_id))
            .with_body(APPLICATION_JSON, body);
        self.execute_json(operation, request, 201)
    }
}
