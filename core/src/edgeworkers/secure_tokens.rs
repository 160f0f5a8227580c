//! Secure tokens enable enhanced debug headers for an EdgeWorker request.

use serde::{Deserialize, Serialize};

use crate::client::{json_body, validate, EdgeworkersClient};
use crate::edgeworkers::ActivationNetwork;
use crate::error::{Error, Operation};
use crate::http::{HttpMethod, HttpRequest, APPLICATION_JSON};
use crate::session::Session;
use crate::validation::{in_range, Validate, ValidationErrors};

pub trait SecureTokens {
    fn create_secure_token(&self, params: CreateSecureTokenRequest) -> Result<CreateSecureTokenResponse, Error>;
}

/// Either `hostname` or `property_id` identifies the target; `acl` and `url`
/// are mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSecureTokenRequest {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub acl: String,
    /// Token lifetime in minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<ActivationNetwork>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub property_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateSecureTokenResponse {
    #[serde(rename = "akamaiEwTrace")]
    pub akamai_ew_trace: String,
}

impl Validate for CreateSecureTokenRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.hostname.is_empty() && self.property_id.is_empty() {
            errors.add("hostname", "either hostname or property_id has to be provided");
            errors.add("property_id", "either hostname or property_id has to be provided");
        }
        if !self.acl.is_empty() && !self.url.is_empty() {
            errors.add("acl", "acl and url are mutually exclusive");
            errors.add("url", "acl and url are mutually exclusive");
        }
        if let Some(expiry) = self.expiry {
            errors.check("expiry", in_range(i64::from(expiry), 1, 720));
        }
        errors.into_result()
    }
}

impl<S: Session> SecureTokens for EdgeworkersClient<S> {
    fn create_secure_token(&self, params: CreateSecureTokenRequest) -> Result<CreateSecureTokenResponse, Error> {
        let operation = Operation::CreateSecureToken;
        validate(operation, &params)?;
        let body = json_body(operation, &params)?;
        let request =
            HttpRequest::new(HttpMethod::Post, "/edgeworkers/v1/secure-token").with_body(APPLICATION_JSON, body);
        self.execute_json(operation, request, 201)
    }
}
