//! The transport seam.
//!
//! The client never opens sockets. A `Session` receives a fully built
//! `HttpRequest`, signs and executes it, and hands back the `HttpResponse`
//! with its body already read. Retries, connection reuse and credential
//! handling live behind this trait. So does enforcing `HttpRequest::timeout`:
//! a session must give up once it elapses and return a `TransportError`.

use std::sync::Arc;

use crate::http::{HttpRequest, HttpResponse};

/// Executes one signed HTTP round-trip.
pub trait Session {
    fn exec(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<S: Session + ?Sized> Session for &S {
    fn exec(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).exec(request)
    }
}

impl<S: Session + ?Sized> Session for Box<S> {
    fn exec(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).exec(request)
    }
}

impl<S: Session + ?Sized> Session for Arc<S> {
    fn exec(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).exec(request)
    }
}

/// The session could not complete the round-trip (connect, TLS, signing,
/// body read, ...).
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
