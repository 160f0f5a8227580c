use crate::client::{validate, EdgeworkersClient};
use crate::edgekv::{name_rule, namespace_path, NamespaceNetwork};
use crate::error::{Error, Operation};
use crate::http::{HttpMethod, HttpRequest};
use crate::session::Session;
use crate::validation::{required, Validate, ValidationErrors};

pub trait EdgeKvGroups {
    /// Group identifiers created by writing items into a namespace.
    fn list_groups_within_namespace(&self, params: ListGroupsWithinNamespaceRequest) -> Result<Vec<String>, Error>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListGroupsWithinNamespaceRequest {
    pub network: Option<NamespaceNetwork>,
    pub namespace_id: String,
}

impl Validate for ListGroupsWithinNamespaceRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("network", required(&self.network))
            .check("namespace_id", name_rule(&self.namespace_id));
        errors.into_result()
    }
}

impl<S: Session> EdgeKvGroups for EdgeworkersClient<S> {
    fn list_groups_within_namespace(&self, params: ListGroupsWithinNamespaceRequest) -> Result<Vec<String>, Error> {
        let operation = Operation::ListGroupsWithinNamespace;
        validate(operation, &params)?;
        let path = format!("{}/groups", namespace_path(params.network, &params.namespace_id));
        self.execute_json(operation, HttpRequest::new(HttpMethod::Get, path), 200)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::ScriptedSession;

    #[test]
    fn list_groups() {
        let session = ScriptedSession::json(200, json!(["countries", "languages"]));
        let client = EdgeworkersClient::new(&session);
        let groups = client
            .list_groups_within_namespace(ListGroupsWithinNamespaceRequest {
                network: Some(NamespaceNetwork::Production),
                namespace_id: "marketing".to_string(),
            })
            .unwrap();
        assert_eq!(groups, vec!["countries", "languages"]);
        assert_eq!(
            session.last_request().path,
            "/edgekv/v1/networks/production/namespaces/marketing/groups"
        );
    }

    #[test]
    fn missing_network_and_namespace() {
        let errors = ListGroupsWithinNamespaceRequest::default().validate().unwrap_err();
        assert!(errors.contains("network"));
        assert!(errors.contains("namespace_id"));
    }
}
