//! Error types for the EdgeWorkers / EdgeKV client.
//!
//! # Design
//! Every failure names the operation that produced it, so a caller can log
//! `err` directly and still tell "list items" from "get item". The variant
//! says where things went wrong: locally (`Validation`, `Serialize`), in the
//! session (`Transport`), at the API (`Api`), or after a successful status
//! (`Decode`).
//!
//! Non-success responses are normalized into one [`ApiError`] regardless of
//! what the server sent back: a problem-detail JSON document, an HTML/XML
//! error page from an intermediary, or plain text.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::http::HttpResponse;
use crate::session::TransportError;
use crate::validation::ValidationErrors;

/// Title used when the error body is not a problem-detail document.
pub const UNDECODABLE_BODY_TITLE: &str =
    "Failed to unmarshal error body. EdgeWorkers API failed. Check details for more information.";

/// Identifies the operation a failure belongs to.
///
/// One variant per client method; `Display` gives the lowercase phrase used
/// as the prefix of every [`Error`] message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListActivations,
    GetActivation,
    ActivateVersion,
    CancelPendingActivation,
    ListDeactivations,
    GetDeactivation,
    DeactivateVersion,
    ListContracts,
    ListPermissionGroups,
    GetPermissionGroup,
    ListProperties,
    ListResourceTiers,
    GetResourceTier,
    GetEdgeWorkerId,
    ListEdgeWorkerIds,
    CreateEdgeWorkerId,
    UpdateEdgeWorkerId,
    CloneEdgeWorkerId,
    DeleteEdgeWorkerId,
    GetEdgeWorkerVersion,
    ListEdgeWorkerVersions,
    GetEdgeWorkerVersionContent,
    CreateEdgeWorkerVersion,
    DeleteEdgeWorkerVersion,
    ValidateBundle,
    ListReports,
    GetSummaryReport,
    GetReport,
    CreateSecureToken,
    InitializeEdgeKv,
    GetEdgeKvInitializationStatus,
    ListEdgeKvNamespaces,
    GetEdgeKvNamespace,
    CreateEdgeKvNamespace,
    UpdateEdgeKvNamespace,
    DeleteEdgeKvNamespace,
    GetNamespaceScheduledDeleteTime,
    RescheduleNamespaceDelete,
    CancelScheduledNamespaceDelete,
    ListGroupsWithinNamespace,
    ListItems,
    GetItem,
    UpsertItem,
    DeleteItem,
    CreateEdgeKvAccessToken,
    GetEdgeKvAccessToken,
    ListEdgeKvAccessTokens,
    DeleteEdgeKvAccessToken,
}

impl Operation {
    /// Human-readable name, e.g. `"list activations"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ListActivations => "list activations",
            Operation::GetActivation => "get activation",
            Operation::ActivateVersion => "activate version",
            Operation::CancelPendingActivation => "cancel pending activation",
            Operation::ListDeactivations => "list deactivations",
            Operation::GetDeactivation => "get deactivation",
            Operation::DeactivateVersion => "deactivate version",
            Operation::ListContracts => "list contracts",
            Operation::ListPermissionGroups => "list permission groups",
            Operation::GetPermissionGroup => "get permission group",
            Operation::ListProperties => "list properties",
            Operation::ListResourceTiers => "list resource tiers",
            Operation::GetResourceTier => "get resource tier",
            Operation::GetEdgeWorkerId => "get EdgeWorker ID",
            Operation::ListEdgeWorkerIds => "list EdgeWorker IDs",
            Operation::CreateEdgeWorkerId => "create EdgeWorker ID",
            Operation::UpdateEdgeWorkerId => "update EdgeWorker ID",
            Operation::CloneEdgeWorkerId => "clone EdgeWorker ID",
            Operation::DeleteEdgeWorkerId => "delete EdgeWorker ID",
            Operation::GetEdgeWorkerVersion => "get EdgeWorker version",
            Operation::ListEdgeWorkerVersions => "list EdgeWorker versions",
            Operation::GetEdgeWorkerVersionContent => "get EdgeWorker version content",
            Operation::CreateEdgeWorkerVersion => "create EdgeWorker version",
            Operation::DeleteEdgeWorkerVersion => "delete EdgeWorker version",
            Operation::ValidateBundle => "validate bundle",
            Operation::ListReports => "list reports",
            Operation::GetSummaryReport => "get summary report",
            Operation::GetReport => "get report",
            Operation::CreateSecureToken => "create secure token",
            Operation::InitializeEdgeKv => "initialize EdgeKV",
            Operation::GetEdgeKvInitializationStatus => "get EdgeKV initialization status",
            Operation::ListEdgeKvNamespaces => "list EdgeKV namespaces",
            Operation::GetEdgeKvNamespace => "get EdgeKV namespace",
            Operation::CreateEdgeKvNamespace => "create EdgeKV namespace",
            Operation::UpdateEdgeKvNamespace => "update EdgeKV namespace",
            Operation::DeleteEdgeKvNamespace => "delete EdgeKV namespace",
            Operation::GetNamespaceScheduledDeleteTime => "get namespace scheduled delete time",
            Operation::RescheduleNamespaceDelete => "reschedule namespace delete",
            Operation::CancelScheduledNamespaceDelete => "cancel scheduled namespace delete",
            Operation::ListGroupsWithinNamespace => "list groups within namespace",
            Operation::ListItems => "list items",
            Operation::GetItem => "get item",
            Operation::UpsertItem => "create or update item",
            Operation::DeleteItem => "delete item",
            Operation::CreateEdgeKvAccessToken => "create EdgeKV access token",
            Operation::GetEdgeKvAccessToken => "get EdgeKV access token",
            Operation::ListEdgeKvAccessTokens => "list EdgeKV access tokens",
            Operation::DeleteEdgeKvAccessToken => "delete EdgeKV access token",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by every client operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request was rejected locally; nothing was sent.
    #[error("{operation}: struct validation: {errors}")]
    Validation {
        operation: Operation,
        errors: ValidationErrors,
    },

    /// The request payload could not be serialized to JSON.
    #[error("{operation}: failed to encode request body: {source}")]
    Serialize {
        operation: Operation,
        source: serde_json::Error,
    },

    /// The session could not complete the round-trip.
    #[error("{operation}: request failed: {source}")]
    Transport {
        operation: Operation,
        source: TransportError,
    },

    /// The server answered with a status other than the expected one.
    #[error("{operation}: {source}")]
    Api {
        operation: Operation,
        source: Box<ApiError>,
    },

    /// The expected status came back but the body could not be decoded.
    #[error("{operation}: failed to decode response body: {source}")]
    Decode {
        operation: Operation,
        source: serde_json::Error,
    },
}

impl Error {
    /// The operation that failed, whatever the variant.
    pub fn operation(&self) -> Operation {
        match self {
            Error::Validation { operation, .. }
            | Error::Serialize { operation, .. }
            | Error::Transport { operation, .. }
            | Error::Api { operation, .. }
            | Error::Decode { operation, .. } => *operation,
        }
    }

    /// True when the request never left the client.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Field errors of a `Validation` failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Error::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }

    /// The normalized server error of an `Api` failure.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api { source, .. } => Some(&**source),
            _ => None,
        }
    }

    /// True when this is an API error of the same kind as `target`.
    pub fn is_api_kind(&self, target: &ApiError) -> bool {
        self.api_error().is_some_and(|e| e.is_kind(target))
    }
}

/// Extra identifiers some error responses nest under `additionalDetail`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdditionalDetail {
    /// Request id assigned by the edge.
    pub request_id: String,
}

/// A normalized API error (problem detail).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiError {
    /// Problem type URI.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Short summary. [`UNDECODABLE_BODY_TITLE`] when the body was not JSON.
    pub title: String,
    /// Explanation, or the whole body when it was not JSON.
    pub detail: String,
    /// URI of this occurrence.
    pub instance: String,
    /// HTTP status of the response, never the one in the body.
    #[serde(deserialize_with = "lenient_status")]
    pub status: u16,
    /// API error code such as `EW1002`.
    pub error_code: String,
    pub additional_detail: AdditionalDetail,
    pub method: String,
    pub server_ip: String,
    pub client_ip: String,
    pub request_id: String,
    pub request_time: String,
}

impl ApiError {
    /// Normalize a non-success response.
    ///
    /// The status is always taken from the response, whatever the body says.
    pub fn from_response(response: &HttpResponse) -> Self {
        let mut api_error = match serde_json::from_slice::<ApiError>(&response.body) {
            Ok(decoded) => decoded,
            Err(err) => {
                let text = response.text();
                tracing::error!(status = response.status, error = %err, "could not decode error body");
                let detail = if looks_like_markup(&text) {
                    unescape_entities(&text)
                } else {
                    text.into_owned()
                };
                ApiError {
                    title: UNDECODABLE_BODY_TITLE.to_string(),
                    detail,
                    ..ApiError::default()
                }
            }
        };
        api_error.status = response.status;
        api_error
    }

    /// Same status, and same title when both titles are set.
    pub fn is_kind(&self, target: &ApiError) -> bool {
        if self.status != target.status {
            return false;
        }
        self.title.is_empty() || target.title.is_empty() || self.title == target.title
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API error {}", self.status)?;
        if !self.title.is_empty() {
            write!(f, ": {}", self.title)?;
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

fn lenient_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Number(n)) => n.as_u64().and_then(|n| u16::try_from(n).ok()).unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn looks_like_markup(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.starts_with('<') && trimmed.ends_with('>')
}

/// Replace HTML character references with their characters. A body with a
/// malformed or unknown reference is returned as written.
fn unescape_entities(text: &str) -> String {
    match quick_xml::escape::unescape_with(text, quick_xml::escape::resolve_html5_entity) {
        Ok(unescaped) => unescaped.into_owned(),
        Err(err) => {
            tracing::debug!(error = %err, "error page kept escaped");
            text.to_string()
        }
    }
}
