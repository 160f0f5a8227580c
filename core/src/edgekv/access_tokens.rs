//! EdgeKV access tokens, which authorize EdgeWorkers code to reach
//! namespaces.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::client::{json_body, validate, EdgeworkersClient};
use crate::edgekv::name_rule;
use crate::enums::wire_enum;
use crate::error::{Error, Operation};
use crate::http::{encode_path_segment, HttpMethod, HttpRequest, Query, APPLICATION_JSON};
use crate::session::Session;
use crate::validation::{Validate, ValidationErrors, BLANK};

const TOKENS_PATH: &str = "/edgekv/v1/tokens";

wire_enum! {
    /// Access right on a namespace.
    pub enum Permission {
        Read => "r",
        Write => "w",
        Delete => "d",
    }
}

/// Namespace name to the permissions granted on it.
pub type NamespacePermissions = BTreeMap<String, Vec<Permission>>;

pub trait EdgeKvAccessTokens {
    fn create_edgekv_access_token(
        &self,
        params: CreateEdgeKvAccessTokenRequest,
    ) -> Result<CreateEdgeKvAccessTokenResponse, Error>;

    fn get_edgekv_access_token(
        &self,
        params: GetEdgeKvAccessTokenRequest,
    ) -> Result<GetEdgeKvAccessTokenResponse, Error>;

    fn list_edgekv_access_tokens(
        &self,
        params: ListEdgeKvAccessTokensRequest,
    ) -> Result<ListEdgeKvAccessTokensResponse, Error>;

    fn delete_edgekv_access_token(
        &self,
        params: DeleteEdgeKvAccessTokenRequest,
    ) -> Result<DeleteEdgeKvAccessTokenResponse, Error>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEdgeKvAccessTokenRequest {
    pub allow_on_production: bool,
    pub allow_on_staging: bool,
    pub name: String,
    pub namespace_permissions: NamespacePermissions,
    /// EdgeWorker ids allowed to use the token; empty allows all.
    #[serde(rename = "restrictToEdgeWorkerIds", skip_serializing_if = "Vec::is_empty")]
    pub restrict_to_edgeworker_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetEdgeKvAccessTokenRequest {
    pub token_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEdgeKvAccessTokensRequest {
    pub include_expired: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteEdgeKvAccessTokenRequest {
    pub token_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEdgeKvAccessTokenResponse {
    pub allow_on_production: bool,
    pub allow_on_staging: bool,
    pub cpcode: String,
    pub expiry: String,
    pub issue_date: String,
    #[serde(default)]
    pub latest_refresh_date: Option<String>,
    pub name: String,
    pub namespace_permissions: NamespacePermissions,
    pub next_scheduled_refresh_date: String,
    #[serde(rename = "restrictToEdgeWorkerIds", default)]
    pub restrict_to_edgeworker_ids: Vec<String>,
    pub token_activation_status: String,
    pub uuid: String,
}

pub type GetEdgeKvAccessTokenResponse = CreateEdgeKvAccessTokenResponse;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListEdgeKvAccessTokensResponse {
    pub tokens: Vec<EdgeKvAccessToken>,
}

/// Token as listed; dates are absent for tokens that never activated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeKvAccessToken {
    pub expiry: String,
    pub name: String,
    pub uuid: String,
    #[serde(default)]
    pub token_activation_status: Option<String>,
    #[serde(default)]
    pub issue_date: Option<String>,
    #[serde(default)]
    pub latest_refresh_date: Option<String>,
    #[serde(default)]
    pub next_scheduled_refresh_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeleteEdgeKvAccessTokenResponse {
    pub name: String,
    pub uuid: String,
}

impl Validate for CreateEdgeKvAccessTokenRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !self.allow_on_production && !self.allow_on_staging {
            let message = "at least one of allow_on_production or allow_on_staging has to be provided";
            errors.add("allow_on_production", message);
            errors.add("allow_on_staging", message);
        }
        errors.check("name", name_rule(&self.name));
        if self.namespace_permissions.is_empty() {
            errors.add("namespace_permissions", BLANK);
        }
        for (namespace, permissions) in &self.namespace_permissions {
            if namespace.is_empty() {
                errors.add("namespace_permissions.names", BLANK);
            }
            if permissions.is_empty() {
                errors.add(format!("namespace_permissions.{namespace}"), BLANK);
            }
        }
        errors.into_result()
    }
}

impl Validate for GetEdgeKvAccessTokenRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("token_name", name_rule(&self.token_name));
        errors.into_result()
    }
}

impl Validate for DeleteEdgeKvAccessTokenRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("token_name", name_rule(&self.token_name));
        errors.into_result()
    }
}

fn token_path(token_name: &str) -> String {
    format!("{TOKENS_PATH}/{}", encode_path_segment(token_name))
}

impl<S: Session> EdgeKvAccessTokens for EdgeworkersClient<S> {
    fn create_edgekv_access_token(
        &self,
        params: CreateEdgeKvAccessTokenRequest,
    ) -> Result<CreateEdgeKvAccessTokenResponse, Error> {
        let operation = Operation::CreateEdgeKvAccessToken;
        validate(operation, &params)?;
        let body = json_body(operation, &params)?;
        let request = HttpRequest::new(HttpMethod::Post, TOKENS_PATH).with_body(APPLICATION_JSON, body);
        self.execute_json(operation, request, 200)
    }

    fn get_edgekv_access_token(
        &self,
        params: GetEdgeKvAccessTokenRequest,
    ) -> Result<GetEdgeKvAccessTokenResponse, Error> {
        let operation = Operation::GetEdgeKvAccessToken;
        validate(operation, &params)?;
        let request = HttpRequest::new(HttpMethod::Get, token_path(&params.token_name));
        self.execute_json(operation, request, 200)
    }

    fn list_edgekv_access_tokens(
        &self,
        params: ListEdgeKvAccessTokensRequest,
    ) -> Result<ListEdgeKvAccessTokensResponse, Error> {
        let mut query = Query::new();
        if params.include_expired {
            query.add("includeExpired", "true");
        }
        let request = HttpRequest::new(HttpMethod::Get, query.append_to(TOKENS_PATH.to_string()));
        self.execute_json(Operation::ListEdgeKvAccessTokens, request, 200)
    }

    fn delete_edgekv_access_token(
        &self,
        params: DeleteEdgeKvAccessTokenRequest,
    ) -> Result<DeleteEdgeKvAccessTokenResponse, Error> {
        let operation = Operation::DeleteEdgeKvAccessToken;
        validate(operation, &params)?;
        let request = HttpRequest::new(HttpMethod::Delete, token_path(&params.token_name));
        self.execute_json(operation, request, 200)
    }
}
