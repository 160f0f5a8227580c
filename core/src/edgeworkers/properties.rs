use serde::Deserialize;

use crate::client::{validate, EdgeworkersClient};
use crate::error::{Error, Operation};
use crate::http::{HttpMethod, HttpRequest, Query};
use crate::session::Session;
use crate::validation::{required_id, Validate, ValidationErrors};

pub trait Properties {
    /// Properties whose rules reference the EdgeWorker.
    fn list_properties(&self, params: ListPropertiesRequest) -> Result<ListPropertiesResponse, Error>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPropertiesRequest {
    pub edge_worker_id: u64,
    /// Only properties with an active version on some network.
    pub active_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPropertiesResponse {
    pub properties: Vec<Property>,
    pub limited_access_to_properties: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub property_id: u64,
    pub property_name: String,
    pub staging_version: Option<u64>,
    pub production_version: Option<u64>,
    pub latest_version: u64,
}

impl Validate for ListPropertiesRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("edge_worker_id", required_id(self.edge_worker_id));
        errors.into_result()
    }
}

impl<S: Session> Properties for EdgeworkersClient<S> {
    fn list_properties(&self, params: ListPropertiesRequest) -> Result<ListPropertiesResponse, Error> {
        let operation = Operation::ListProperties;
        validate(operation, &params)?;
        // activeOnly is always sent, false included.
        let mut query = Query::new();
        query.add("activeOnly", params.active_only.to_string());
        let path = query.append_to(format!("/edgeworkers/v1/ids/{}/properties", params.edge_worker_id));
        self.execute_json(operation, HttpRequest::new(HttpMethod::Get, path), 200)
    }
}
