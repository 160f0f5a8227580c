//! Synchronous client core for the EdgeWorkers and EdgeKV APIs.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values; the caller
//! supplies a [`Session`] that performs the signed HTTP round-trip
//! (host-does-IO pattern). Every operation validates its parameters, builds
//! the request, executes it once through the session and maps the status
//! code to either a typed value or an [`Error`].
//!
//! # Design
//! - `EdgeworkersClient<S>` holds only the session; no state survives a call.
//! - Operations are grouped into one trait per resource (`Activations`,
//!   `EdgeKvItems`, ...). [`Edgeworkers`] combines them all so callers can
//!   depend on `impl Edgeworkers` and swap in [`MockEdgeworkers`] in tests.
//! - Each operation expects exactly one status code; anything else becomes
//!   an [`ApiError`] normalized from the body.
//! - Wire enums are closed Rust enums; unknown strings fail to parse with the
//!   list of legal values.

pub mod client;
pub mod edgekv;
pub mod edgeworkers;
pub mod enums;
pub mod error;
pub mod http;
pub mod mock;
pub mod session;
pub mod validation;

#[cfg(test)]
mod testing;

pub use client::EdgeworkersClient;
pub use edgekv::*;
pub use edgeworkers::*;
pub use enums::ParseEnumError;
pub use error::{AdditionalDetail, ApiError, Error, Operation, UNDECODABLE_BODY_TITLE};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use mock::MockEdgeworkers;
pub use session::{Session, TransportError};
pub use validation::{Validate, ValidationErrors};

/// Every EdgeWorkers and EdgeKV operation.
pub trait Edgeworkers:
    Activations
    + Deactivations
    + Contracts
    + PermissionGroups
    + Properties
    + ResourceTiers
    + EdgeWorkerIds
    + EdgeWorkerVersions
    + Validations
    + Reports
    + SecureTokens
    + EdgeKvInitialize
    + EdgeKvNamespaces
    + EdgeKvGroups
    + EdgeKvItems
    + EdgeKvAccessTokens
{
}

impl<T> Edgeworkers for T where
    T: Activations
        + Deactivations
        + Contracts
        + PermissionGroups
        + Properties
        + ResourceTiers
        + EdgeWorkerIds
        + EdgeWorkerVersions
        + Validations
        + Reports
        + SecureTokens
        + EdgeKvInitialize
        + EdgeKvNamespaces
        + EdgeKvGroups
        + EdgeKvItems
        + EdgeKvAccessTokens
{
}
