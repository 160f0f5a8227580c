use serde::Deserialize;

use crate::client::EdgeworkersClient;
use crate::error::{Error, Operation};
use crate::http::{HttpMethod, HttpRequest};
use crate::session::Session;

const INITIALIZE_PATH: &str = "/edgekv/v1/initialize";

pub trait EdgeKvInitialize {
    /// Provision the EdgeKV database for the account.
    fn initialize_edgekv(&self) -> Result<EdgeKvInitializationStatus, Error>;

    fn get_edgekv_initialization_status(&self) -> Result<EdgeKvInitializationStatus, Error>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeKvInitializationStatus {
    pub account_status: String,
    pub cpcode: String,
    pub production_status: String,
    pub staging_status: String,
}

impl<S: Session> EdgeKvInitialize for EdgeworkersClient<S> {
    fn initialize_edgekv(&self) -> Result<EdgeKvInitializationStatus, Error> {
        let request = HttpRequest::new(HttpMethod::Put, INITIALIZE_PATH);
        self.execute_json(Operation::InitializeEdgeKv, request, 201)
    }

    fn get_edgekv_initialization_status(&self) -> Result<EdgeKvInitializationStatus, Error> {
        let request = HttpRequest::new(HttpMethod::Get, INITIALIZE_PATH);
        self.execute_json(Operation::GetEdgeKvInitializationStatus, request, 200)
    }
}
