//! EdgeWorker versions and their code bundles.
//!
//! A version is an immutable upload of a gzip tarball containing
//! `main.js` and `bundle.json`. Bundles travel as opaque bytes in both
//! directions with `application/gzip`; nothing here inspects the archive.

use std::io::Read;

use serde::Deserialize;

use crate::client::{validate, EdgeworkersClient};
use crate::error::{Error, Operation};
use crate::http::{encode_path_segment, HttpMethod, HttpRequest, ACCEPT, APPLICATION_GZIP};
use crate::session::Session;
use crate::validation::{required_id, required_str, Validate, ValidationErrors, BLANK};

pub trait EdgeWorkerVersions {
    fn get_edgeworker_version(&self, params: GetEdgeWorkerVersionRequest) -> Result<EdgeWorkerVersion, Error>;

    fn list_edgeworker_versions(
        &self,
        params: ListEdgeWorkerVersionsRequest,
    ) -> Result<ListEdgeWorkerVersionsResponse, Error>;

    /// Download the code bundle of a version.
    fn get_edgeworker_version_content(&self, params: GetEdgeWorkerVersionContentRequest) -> Result<Bundle, Error>;

    /// Upload a bundle as a new version; the version string comes from its
    /// `bundle.json`.
    fn create_edgeworker_version(&self, params: CreateEdgeWorkerVersionRequest) -> Result<EdgeWorkerVersion, Error>;

    fn delete_edgeworker_version(&self, params: DeleteEdgeWorkerVersionRequest) -> Result<(), Error>;
}

pub trait Validations {
    /// Check a bundle without uploading it.
    fn validate_bundle(&self, params: ValidateBundleRequest) -> Result<ValidateBundleResponse, Error>;
}

/// Raw bytes of a gzip code bundle.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Bundle(Vec<u8>);

impl Bundle {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Read a whole bundle, e.g. from a file.
    pub fn from_reader(mut reader: impl Read) -> std::io::Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Bundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bundle({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for Bundle {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Identifies one version of an EdgeWorker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeWorkerVersionRequest {
    pub edge_worker_id: u64,
    pub version: String,
}

pub type GetEdgeWorkerVersionRequest = EdgeWorkerVersionRequest;
pub type GetEdgeWorkerVersionContentRequest = EdgeWorkerVersionRequest;
pub type DeleteEdgeWorkerVersionRequest = EdgeWorkerVersionRequest;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEdgeWorkerVersionsRequest {
    pub edge_worker_id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateEdgeWorkerVersionRequest {
    pub edge_worker_id: u64,
    pub content_bundle: Bundle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidateBundleRequest {
    pub bundle: Bundle,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeWorkerVersion {
    pub edge_worker_id: u64,
    pub version: String,
    pub account_id: String,
    pub checksum: String,
    pub sequence_number: u64,
    pub created_by: String,
    pub created_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListEdgeWorkerVersionsResponse {
    pub versions: Vec<EdgeWorkerVersion>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidateBundleResponse {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// One finding reported by bundle validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub issue_type: String,
    pub message: String,
}

fn required_bundle(bundle: &Bundle) -> Result<(), String> {
    if bundle.is_empty() {
        Err(BLANK.to_string())
    } else {
        Ok(())
    }
}

impl Validate for EdgeWorkerVersionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("edge_worker_id", required_id(self.edge_worker_id))
            .check("version", required_str(&self.version));
        errors.into_result()
    }
}

impl Validate for ListEdgeWorkerVersionsRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("edge_worker_id", required_id(self.edge_worker_id));
        errors.into_result()
    }
}

impl Validate for CreateEdgeWorkerVersionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("edge_worker_id", required_id(self.edge_worker_id))
            .check("content_bundle", required_bundle(&self.content_bundle));
        errors.into_result()
    }
}

impl Validate for ValidateBundleRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("bundle", required_bundle(&self.bundle));
        errors.into_result()
    }
}

fn versions_path(edge_worker_id: u64) -> String {
    format!("/edgeworkers/v1/ids/{edge_worker_id}/versions")
}

fn version_path(params: &EdgeWorkerVersionRequest) -> String {
    format!(
        "{}/{}",
        versions_path(params.edge_worker_id),
        encode_path_segment(&params.version)
    )
}

impl<S: Session> EdgeWorkerVersions for EdgeworkersClient<S> {
    fn get_edgeworker_version(&self, params: GetEdgeWorkerVersionRequest) -> Result<EdgeWorkerVersion, Error> {
        let operation = Operation::GetEdgeWorkerVersion;
        validate(operation, &params)?;
        self.execute_json(operation, HttpRequest::new(HttpMethod::Get, version_path(&params)), 200)
    }

    fn list_edgeworker_versions(
        &self,
        params: ListEdgeWorkerVersionsRequest,
    ) -> Result<ListEdgeWorkerVersionsResponse, Error> {
        let operation = Operation::ListEdgeWorkerVersions;
        validate(operation, &params)?;
        let request = HttpRequest::new(HttpMethod::Get, versions_path(params.edge_worker_id));
        self.execute_json(operation, request, 200)
    }

    fn get_edgeworker_version_content(&self, params: GetEdgeWorkerVersionContentRequest) -> Result<Bundle, Error> {
        let operation = Operation::GetEdgeWorkerVersionContent;
        validate(operation, &params)?;
        let request = HttpRequest::new(HttpMethod::Get, format!("{}/content", version_path(&params)))
            .with_header(ACCEPT, APPLICATION_GZIP);
        let response = self.execute(operation, request, 200)?;
        Ok(Bundle(response.body))
    }

    fn create_edgeworker_version(&self, params: CreateEdgeWorkerVersionRequest) -> Result<EdgeWorkerVersion, Error> {
        let operation = Operation::CreateEdgeWorkerVersion;
        validate(operation, &params)?;
        let request = HttpRequest::new(HttpMethod::Post, versions_path(params.edge_worker_id))
            .with_body(APPLICATION_GZIP, params.content_bundle.into_bytes());
        self.execute_json(operation, request, 201)
    }

    fn delete_edgeworker_version(&self, params: DeleteEdgeWorkerVersionRequest) -> Result<(), Error> {
        let operation = Operation::DeleteEdgeWorkerVersion;
        validate(operation, &params)?;
        self.execute(operation, HttpRequest::new(HttpMethod::Delete, version_path(&params)), 204)?;
        Ok(())
    }
}

impl<S: Session> Validations for EdgeworkersClient<S> {
    fn validate_bundle(&self, params: ValidateBundleRequest) -> Result<ValidateBundleResponse, Error> {
        let operation = Operation::ValidateBundle;
        validate(operation, &params)?;
        let request = HttpRequest::new(HttpMethod::Post, "/edgeworkers/v1/validations")
            .with_body(APPLICATION_GZIP, params.bundle.into_bytes());
        self.execute_json(operation, request, 200)
    }
}
