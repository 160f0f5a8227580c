//! The shared request pipeline behind every operation.
//!
//! # Design
//! `EdgeworkersClient` holds only the injected `Session` and carries no
//! mutable state between calls. Each operation runs the same fixed
//! sequence: validate the parameters, build an `HttpRequest`, hand it to
//! the session, compare the status against the single expected code, then
//! decode the body. Resource modules add their operations as trait impls on
//! this type; the helpers below are the only code that touches the session.
//!
//! A client may carry a timeout, stamped on every request that does not set
//! its own. `with_timeout` borrows the session, so one call can get a tighter
//! deadline without touching the shared client.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, Error, Operation};
use crate::http::{HttpRequest, HttpResponse};
use crate::session::Session;
use crate::validation::Validate;

/// Client for the EdgeWorkers and EdgeKV APIs.
///
/// Cheap to share: `EdgeworkersClient<S>` is `Send + Sync` whenever `S` is,
/// and operations take `&self`.
#[derive(Debug, Clone)]
pub struct EdgeworkersClient<S> {
    session: S,
    timeout: Option<Duration>,
}

impl<S: Session> EdgeworkersClient<S> {
    pub fn new(session: S) -> Self {
        Self { session, timeout: None }
    }

    /// Bound every request made through this client by `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// A client over the same session whose calls are bounded by `timeout`.
    ///
    /// ```ignore
    /// let contracts = client.with_timeout(Duration::from_secs(5)).list_contracts()?;
    /// ```
    pub fn with_timeout(&self, timeout: Duration) -> EdgeworkersClient<&S> {
        EdgeworkersClient {
            session: &self.session,
            timeout: Some(timeout),
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Execute `request` and require `expected` as the response status.
    pub(crate) fn execute(
        &self,
        operation: Operation,
        mut request: HttpRequest,
        expected: u16,
    ) -> Result<HttpResponse, Error> {
        if request.timeout.is_none() {
            request.timeout = self.timeout;
        }
        tracing::debug!(%operation, method = %request.method, path = %request.path, "sending request");
        let response = self
            .session
            .exec(request)
            .map_err(|source| Error::Transport { operation, source })?;
        tracing::debug!(%operation, status = response.status, "received response");
        check_status(operation, &response, expected)?;
        Ok(response)
    }

    /// Execute `request` and decode a JSON body from the expected status.
    pub(crate) fn execute_json<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: HttpRequest,
        expected: u16,
    ) -> Result<T, Error> {
        let response = self.execute(operation, request, expected)?;
        parse_json(operation, &response)
    }
}

pub(crate) fn validate(operation: Operation, params: &impl Validate) -> Result<(), Error> {
    params.validate().map_err(|errors| {
        tracing::debug!(%operation, %errors, "request failed validation");
        Error::Validation { operation, errors }
    })
}

pub(crate) fn json_body<T: Serialize>(operation: Operation, value: &T) -> Result<Vec<u8>, Error> {
    serde_json::to_vec(value).map_err(|source| Error::Serialize { operation, source })
}

pub(crate) fn parse_json<T: DeserializeOwned>(operation: Operation, response: &HttpResponse) -> Result<T, Error> {
    serde_json::from_slice(&response.body).map_err(|source| Error::Decode { operation, source })
}

/// Any status other than `expected` is an error, even with a decodable body.
fn check_status(operation: Operation, response: &HttpResponse, expected: u16) -> Result<(), Error> {
    if response.status == expected {
        return Ok(());
    }
    Err(Error::Api {
        operation,
        source: Box::new(ApiError::from_response(response)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::testing::ScriptedSession;
    use crate::validation::ValidationErrors;

    #[derive(Debug, serde::Deserialize)]
    struct Named {
        name: String,
    }

    struct AlwaysBlank;

    impl Validate for AlwaysBlank {
        fn validate(&self) -> Result<(), ValidationErrors> {
            let mut errors = ValidationErrors::new();
            errors.add("name", "cannot be blank");
            errors.into_result()
        }
    }

    #[test]
    fn execute_json_decodes_on_expected_status() {
        let session = ScriptedSession::new(200, r#"{"name":"ew"}"#);
        let client = EdgeworkersClient::new(&session);
        let named: Named = client
            .execute_json(Operation::GetEdgeWorkerId, HttpRequest::new(HttpMethod::Get, "/x"), 200)
            .unwrap();
        assert_eq!(named.name, "ew");
        assert_eq!(session.last_request().path, "/x");
    }

    #[test]
    fn unexpected_status_is_an_error_even_with_a_valid_body() {
        let session = ScriptedSession::new(200, r#"{"name":"ew"}"#);
        let client = EdgeworkersClient::new(&session);
        let err = client
            .execute_json::<Named>(Operation::CreateEdgeWorkerId, HttpRequest::new(HttpMethod::Post, "/x"), 201)
            .unwrap_err();
        assert_eq!(err.api_error().unwrap().status, 200);
        assert_eq!(err.operation(), Operation::CreateEdgeWorkerId);
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let session = ScriptedSession::new(200, "not json");
        let client = EdgeworkersClient::new(&session);
        let err = client
            .execute_json::<Named>(Operation::GetItem, HttpRequest::new(HttpMethod::Get, "/x"), 200)
            .unwrap_err();
        assert!(matches!(err, Error::Decode { operation: Operation::GetItem, .. }));
    }

    #[test]
    fn transport_failure_is_wrapped() {
        let session = ScriptedSession::failing("connection refused");
        let client = EdgeworkersClient::new(&session);
        let err = client
            .execute(Operation::ListContracts, HttpRequest::new(HttpMethod::Get, "/x"), 200)
            .unwrap_err();
        assert_eq!(err.to_string(), "list contracts: request failed: connection refused");
    }

    #[test]
    fn client_timeout_is_stamped_on_requests() {
        let session = ScriptedSession::new(200, "");
        let client = EdgeworkersClient::new(&session).timeout(Duration::from_secs(30));
        client
            .execute(Operation::ListContracts, HttpRequest::new(HttpMethod::Get, "/x"), 200)
            .unwrap();
        assert_eq!(session.last_request().timeout, Some(Duration::from_secs(30)));

        client
            .execute(
                Operation::ListContracts,
                HttpRequest::new(HttpMethod::Get, "/x").with_timeout(Duration::from_secs(1)),
                200,
            )
            .unwrap();
        assert_eq!(session.last_request().timeout, Some(Duration::from_secs(1)));
    }

    #[test]
    fn per_call_timeout_leaves_the_client_alone() {
        let session = ScriptedSession::new(200, "");
        let client = EdgeworkersClient::new(&session);
        client
            .with_timeout(Duration::from_millis(250))
            .execute(Operation::ListContracts, HttpRequest::new(HttpMethod::Get, "/x"), 200)
            .unwrap();
        assert_eq!(session.last_request().timeout, Some(Duration::from_millis(250)));

        client
            .execute(Operation::ListContracts, HttpRequest::new(HttpMethod::Get, "/x"), 200)
            .unwrap();
        assert_eq!(session.last_request().timeout, None);
    }

    #[test]
    fn exceeded_deadline_is_a_transport_error() {
        let session = ScriptedSession::new(200, r#"{"name":"ew"}"#).latency(Duration::from_secs(2));
        let client = EdgeworkersClient::new(&session);
        let err = client
            .with_timeout(Duration::from_secs(1))
            .execute_json::<Named>(Operation::GetItem, HttpRequest::new(HttpMethod::Get, "/x"), 200)
            .unwrap_err();
        assert!(matches!(err, Error::Transport { operation: Operation::GetItem, .. }));
        assert_eq!(err.to_string(), "get item: request failed: request timed out after 1s");

        let named: Named = client
            .with_timeout(Duration::from_secs(3))
            .execute_json(Operation::GetItem, HttpRequest::new(HttpMethod::Get, "/x"), 200)
            .unwrap();
        assert_eq!(named.name, "ew");
    }

    #[test]
    fn validation_failure_carries_the_operation() {
        let err = validate(Operation::CreateEdgeKvNamespace, &AlwaysBlank).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.validation_errors().unwrap().get("name"), Some("cannot be blank"));
    }
}
