//! EdgeWorker IDs: the named containers versions are uploaded into.

use serde::{Deserialize, Serialize};

use crate::client::{json_body, validate, EdgeworkersClient};
use crate::error::{Error, Operation};
use crate::http::{HttpMethod, HttpRequest, Query, APPLICATION_JSON};
use crate::session::Session;
use crate::validation::{required_id, required_str, Validate, ValidationErrors};

pub trait EdgeWorkerIds {
    fn get_edgeworker_id(&self, params: GetEdgeWorkerIdRequest) -> Result<EdgeWorkerId, Error>;

    /// All EdgeWorker IDs, optionally filtered by group and resource tier.
    fn list_edgeworker_ids(&self, params: ListEdgeWorkerIdsRequest) -> Result<ListEdgeWorkerIdsResponse, Error>;

    fn create_edgeworker_id(&self, params: CreateEdgeWorkerIdRequest) -> Result<EdgeWorkerId, Error>;

    fn update_edgeworker_id(&self, params: UpdateEdgeWorkerIdRequest) -> Result<EdgeWorkerId, Error>;

    /// Copy an EdgeWorker ID, typically to move it to another resource tier.
    fn clone_edgeworker_id(&self, params: CloneEdgeWorkerIdRequest) -> Result<EdgeWorkerId, Error>;

    fn delete_edgeworker_id(&self, params: DeleteEdgeWorkerIdRequest) -> Result<(), Error>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetEdgeWorkerIdRequest {
    pub edge_worker_id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteEdgeWorkerIdRequest {
    pub edge_worker_id: u64,
}

/// Filters for listing; zero means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEdgeWorkerIdsRequest {
    pub group_id: u64,
    pub resource_tier_id: u64,
}

/// Body shared by create, update and clone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeWorkerIdBody {
    pub name: String,
    pub group_id: u64,
    pub resource_tier_id: u64,
}

pub type CreateEdgeWorkerIdRequest = EdgeWorkerIdBody;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateEdgeWorkerIdRequest {
    pub edge_worker_id: u64,
    pub body: EdgeWorkerIdBody,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneEdgeWorkerIdRequest {
    pub edge_worker_id: u64,
    pub body: EdgeWorkerIdBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEdgeWorkerIdsResponse {
    pub edge_worker_ids: Vec<EdgeWorkerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeWorkerId {
    pub edge_worker_id: u64,
    pub name: String,
    pub account_id: String,
    pub group_id: i64,
    pub resource_tier_id: u64,
    #[serde(default)]
    pub source_edge_worker_id: Option<u64>,
    pub created_by: String,
    pub created_time: String,
    pub last_modified_by: String,
    pub last_modified_time: String,
}

impl Validate for GetEdgeWorkerIdRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("edge_worker_id", required_id(self.edge_worker_id));
        errors.into_result()
    }
}

impl Validate for DeleteEdgeWorkerIdRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("edge_worker_id", required_id(self.edge_worker_id));
        errors.into_result()
    }
}

impl Validate for EdgeWorkerIdBody {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("name", required_str(&self.name))
            .check("group_id", required_id(self.group_id))
            .check("resource_tier_id", required_id(self.resource_tier_id));
        errors.into_result()
    }
}

impl Validate for UpdateEdgeWorkerIdRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("edge_worker_id", required_id(self.edge_worker_id))
            .nest("body", self.body.validate());
        errors.into_result()
    }
}

impl Validate for CloneEdgeWorkerIdRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("edge_worker_id", required_id(self.edge_worker_id))
            .nest("body", self.body.validate());
        errors.into_result()
    }
}

const IDS_PATH: &str = "/edgeworkers/v1/ids";

impl<S: Session> EdgeWorkerIds for EdgeworkersClient<S> {
    fn get_edgeworker_id(&self, params: GetEdgeWorkerIdRequest) -> Result<EdgeWorkerId, Error> {
        let operation = Operation::GetEdgeWorkerId;
        validate(operation, &params)?;
        let path = format!("{IDS_PATH}/{}", params.edge_worker_id);
        self.execute_json(operation, HttpRequest::new(HttpMethod::Get, path), 200)
    }

    fn list_edgeworker_ids(&self, params: ListEdgeWorkerIdsRequest) -> Result<ListEdgeWorkerIdsResponse, Error> {
        let mut query = Query::new();
        if params.group_id != 0 {
            query.add("groupId", params.group_id.to_string());
        }
        if params.resource_tier_id != 0 {
            query.add("resourceTierId", params.resource_tier_id.to_string());
        }
        let path = query.append_to(IDS_PATH.to_string());
        self.execute_json(Operation::ListEdgeWorkerIds, HttpRequest::new(HttpMethod::Get, path), 200)
    }

    fn create_edgeworker_id(&self, params: CreateEdgeWorkerIdRequest) -> Result<EdgeWorkerId, Error> {
        let operation = Operation::CreateEdgeWorkerId;
        validate(operation, &params)?;
        let body = json_body(operation, &params)?;
        let request = HttpRequest::new(HttpMethod::Post, IDS_PATH).with_body(APPLICATION_JSON, body);
        self.execute_json(operation, request, 201)
    }

    fn update_edgeworker_id(&self, params: UpdateEdgeWorkerIdRequest) -> Result<EdgeWorkerId, Error> {
        let operation = Operation::UpdateEdgeWorkerId;
        validate(operation, &params)?;
        let body = json_body(operation, &params.body)?;
        let path = format!("{IDS_PATH}/{}", params.edge_worker_id);
        let request = HttpRequest::new(HttpMethod::Put, path).with_body(APPLICATION_JSON, body);
        self.execute_json(operation, request, 200)
    }

    fn clone_edgeworker_id(&self, params: CloneEdgeWorkerIdRequest) -> Result<EdgeWorkerId, Error> {
        let operation = Operation::CloneEdgeWorkerId;
        validate(operation, &params)?;
        let body = json_body(operation, &params.body)?;
        let path = format!("{IDS_PATH}/{}/clone", params.edge_worker_id);
        let request = HttpRequest::new(HttpMethod::Post, path).with_body(APPLICATION_JSON, body);
        self.execute_json(operation, request, 200)
    }

    fn delete_edgeworker_id(&self, params: DeleteEdgeWorkerIdRequest) -> Result<(), Error> {
        let operation = Operation::DeleteEdgeWorkerId;
        validate(operation, &params)?;
        let path = format!("{IDS_PATH}/{}", params.edge_worker_id);
        self.execute(operation, HttpRequest::new(HttpMethod::Delete, path), 204)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::ScriptedSession;

    fn edgeworker_json(id: u64, name: &str) -> serde_json::Value {
        json!({
            "edgeWorkerId": id,
            "name": name,
            "accountId": "B-M-1KQK3WU",
            "groupId": 72297,
            "resourceTierId": 100,
            "createdBy": "jdoe",
            "createdTime": "2021-12-17T10:32:16Z",
            "lastModifiedBy": "jdoe",
            "lastModifiedTime": "2021-12-17T10:32:16Z"
        })
    }

    fn body() -> EdgeWorkerIdBody {
        EdgeWorkerIdBody {
            name: "Hello".to_string(),
            group_id: 72297,
            resource_tier_id: 100,
        }
    }

    #[test]
    fn list_omits_zero_filters() {
        let session = ScriptedSession::json(200, json!({"edgeWorkerIds": [edgeworker_json(1, "a")]}));
        let client = EdgeworkersClient::new(&session);
        client.list_edgeworker_ids(ListEdgeWorkerIdsRequest::default()).unwrap();
        assert_eq!(session.last_request().path, "/edgeworkers/v1/ids");
    }

    #[test]
    fn list_with_both_filters() {
        let session = ScriptedSession::json(200, json!({"edgeWorkerIds": []}));
        let client = EdgeworkersClient::new(&session);
        let result = client
            .list_edgeworker_ids(ListEdgeWorkerIdsRequest {
                group_id: 72297,
                resource_tier_id: 200,
            })
            .unwrap();
        assert!(result.edge_worker_ids.is_empty());
        assert_eq!(session.last_request().path, "/edgeworkers/v1/ids?groupId=72297&resourceTierId=200");
    }

    #[test]
    fn create_posts_and_expects_created() {
        let session = ScriptedSession::json(201, edgeworker_json(42, "Hello"));
        let client = EdgeworkersClient::new(&session);
        let created = client.create_edgeworker_id(body()).unwrap();
        assert_eq!(created.edge_worker_id, 42);
        assert_eq!(created.source_edge_worker_id, None);
        assert_eq!(
            session.body_json(),
            json!({"name": "Hello", "groupId": 72297, "resourceTierId": 100})
        );
    }

    #[test]
    fn create_reports_every_missing_field() {
        let session = ScriptedSession::new(201, "{}");
        let client = EdgeworkersClient::new(&session);
        let err = client.create_edgeworker_id(CreateEdgeWorkerIdRequest::default()).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains("name"));
        assert!(errors.contains("group_id"));
        assert!(errors.contains("resource_tier_id"));
    }

    #[test]
    fn update_puts_to_the_id() {
        let session = ScriptedSession::json(200, edgeworker_json(42, "Hello"));
        let client = EdgeworkersClient::new(&session);
        client
            .update_edgeworker_id(UpdateEdgeWorkerIdRequest {
                edge_worker_id: 42,
                body: body(),
            })
            .unwrap();
        let request = session.last_request();
        assert_eq!(request.method, HttpMethod::Put);
        assert_eq!(request.path, "/edgeworkers/v1/ids/42");
    }

    #[test]
    fn clone_reports_source_id() {
        let mut cloned = edgeworker_json(43, "Hello");
        cloned["sourceEdgeWorkerId"] = json!(42);
        let session = ScriptedSession::json(200, cloned);
        let client = EdgeworkersClient::new(&session);
        let result = client
            .clone_edgeworker_id(CloneEdgeWorkerIdRequest {
                edge_worker_id: 42,
                body: body(),
            })
            .unwrap();
        assert_eq!(result.source_edge_worker_id, Some(42));
        assert_eq!(session.last_request().path, "/edgeworkers/v1/ids/42/clone");
    }

    #[test]
    fn delete_expects_no_content() {
        let session = ScriptedSession::new(204, "");
        let client = EdgeworkersClient::new(&session);
        client
            .delete_edgeworker_id(DeleteEdgeWorkerIdRequest { edge_worker_id: 42 })
            .unwrap();
        assert_eq!(session.last_request().method, HttpMethod::Delete);

        let session = ScriptedSession::new(200, "");
        let client = EdgeworkersClient::new(&session);
        assert!(client
            .delete_edgeworker_id(DeleteEdgeWorkerIdRequest { edge_worker_id: 42 })
            .is_err());
    }
}
