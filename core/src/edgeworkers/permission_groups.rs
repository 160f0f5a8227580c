//! Groups the caller has EdgeWorkers permissions on.

use serde::Deserialize;

use crate::client::{validate, EdgeworkersClient};
use crate::error::{Error, Operation};
use crate::http::{encode_path_segment, HttpMethod, HttpRequest};
use crate::session::Session;
use crate::validation::{required_str, Validate, ValidationErrors};

pub trait PermissionGroups {
    fn list_permission_groups(&self) -> Result<ListPermissionGroupsResponse, Error>;

    fn get_permission_group(&self, params: GetPermissionGroupRequest) -> Result<PermissionGroup, Error>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetPermissionGroupRequest {
    /// Group identifier as written in the path, e.g. `grp_123`.
    pub group_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListPermissionGroupsResponse {
    pub groups: Vec<PermissionGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGroup {
    pub group_id: i64,
    pub group_name: String,
    pub capabilities: Vec<String>,
}

impl Validate for GetPermissionGroupRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("group_id", required_str(&self.group_id));
        errors.into_result()
    }
}

impl<S: Session> PermissionGroups for EdgeworkersClient<S> {
    fn list_permission_groups(&self) -> Result<ListPermissionGroupsResponse, Error> {
        let request = HttpRequest::new(HttpMethod::Get, "/edgeworkers/v1/groups");
        self.execute_json(Operation::ListPermissionGroups, request, 200)
    }

    fn get_permission_group(&self, params: GetPermissionGroupRequest) -> Result<PermissionGroup, Error> {
        let operation = Operation::GetPermissionGroup;
        validate(operation, &params)?;
        let path = format!("/edgeworkers/v1/groups/{}", encode_path_segment(&params.group_id));
        self.execute_json(operation, HttpRequest::new(HttpMethod::Get, path), 200)
    }
}
