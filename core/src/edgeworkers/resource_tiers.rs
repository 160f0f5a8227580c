//! Resource tiers: the limit bundles an EdgeWorker runs under.

use serde::Deserialize;

use crate::client::{validate, EdgeworkersClient};
use crate::error::{Error, Operation};
use crate::http::{HttpMethod, HttpRequest, Query};
use crate::session::Session;
use crate::validation::{required_id, required_str, Validate, ValidationErrors};

pub trait ResourceTiers {
    /// Tiers available under a contract.
    fn list_resource_tiers(&self, params: ListResourceTiersRequest) -> Result<ListResourceTiersResponse, Error>;

    /// The tier an EdgeWorker was created with.
    fn get_resource_tier(&self, params: GetResourceTierRequest) -> Result<ResourceTier, Error>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListResourceTiersRequest {
    pub contract_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetResourceTierRequest {
    pub edge_worker_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResourceTiersResponse {
    pub resource_tiers: Vec<ResourceTier>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTier {
    pub resource_tier_id: u64,
    pub resource_tier_name: String,
    pub edge_worker_limits: Vec<EdgeWorkerLimit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeWorkerLimit {
    pub limit_name: String,
    pub limit_value: i64,
    pub limit_unit: String,
}

impl Validate for ListResourceTiersRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("contract_id", required_str(&self.contract_id));
        errors.into_result()
    }
}

impl Validate for GetResourceTierRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("edge_worker_id", required_id(self.edge_worker_id));
        errors.into_result()
    }
}

impl<S: Session> ResourceTiers for EdgeworkersClient<S> {
    fn list_resource_tiers(&self, params: ListResourceTiersRequest) -> Result<ListResourceTiersResponse, Error> {
        let operation = Operation::ListResourceTiers;
        validate(operation, &params)?;
        let mut query = Query::new();
        query.add("contractId", params.contract_id);
        let path = query.append_to("/edgeworkers/v1/resource-tiers".to_string());
        self.execute_json(operation, HttpRequest::new(HttpMethod::Get, path), 200)
    }

    fn get_resource_tier(&self, params: GetResourceTierRequest) -> Result<ResourceTier, Error> {
        let operation = Operation::GetResourceTier;
        validate(operation, &params)?;
        let path = format!("/edgeworkers/v1/ids/{}/resource-tier", params.edge_worker_id);
        self.execute_json(operation, HttpRequest::new(HttpMethod::Get, path), 200)
    }
}
