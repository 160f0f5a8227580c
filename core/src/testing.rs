//! In-memory session used by unit tests.

use std::sync::Mutex;
use std::time::Duration;

use crate::http::{HttpRequest, HttpResponse};
use crate::session::{Session, TransportError};

/// Records every request and answers with one canned response.
///
/// `latency` is simulated: a request whose timeout is shorter fails the way
/// a real session would, without sleeping.
pub(crate) struct ScriptedSession {
    response: Result<HttpResponse, String>,
    latency: Duration,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedSession {
    pub(crate) fn new(status: u16, body: &str) -> Self {
        Self::respond(HttpResponse::new(status, body))
    }

    pub(crate) fn json(status: u16, body: serde_json::Value) -> Self {
        Self::new(status, &body.to_string())
    }

    pub(crate) fn respond(response: HttpResponse) -> Self {
        Self {
            response: Ok(response),
            latency: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            latency: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> HttpRequest {
        self.requests().pop().expect("no request was sent")
    }

    pub(crate) fn body_json(&self) -> serde_json::Value {
        let body = self.last_request().body.expect("request had no body");
        serde_json::from_slice(&body).unwrap()
    }
}

impl Session for ScriptedSession {
    fn exec(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let timeout = request.timeout;
        self.requests.lock().unwrap().push(request);
        if let Some(timeout) = timeout.filter(|t| *t < self.latency) {
            return Err(TransportError::new(format!("request timed out after {timeout:?}")));
        }
        self.response.clone().map_err(TransportError::new)
    }
}
