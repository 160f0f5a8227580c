use serde::Deserialize;

use crate::client::EdgeworkersClient;
use crate::error::{Error, Operation};
use crate::http::{HttpMethod, HttpRequest};
use crate::session::Session;

pub trait Contracts {
    /// Contract IDs usable when listing resource tiers.
    fn list_contracts(&self) -> Result<ListContractsResponse, Error>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListContractsResponse {
    pub contract_ids: Vec<String>,
}

impl<S: Session> Contracts for EdgeworkersClient<S> {
    fn list_contracts(&self) -> Result<ListContractsResponse, Error> {
        let request = HttpRequest::new(HttpMethod::Get, "/edgeworkers/v1/contracts");
        self.execute_json(Operation::ListContracts, request, 200)
    }
}
