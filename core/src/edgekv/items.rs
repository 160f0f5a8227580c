//! EdgeKV items.
//!
//! Item values are opaque text. A value that parses as JSON is stored as
//! JSON; anything else is sent as `text/plain`. Reads return the stored
//! text unchanged.

use crate::client::{validate, EdgeworkersClient};
use crate::edgekv::{namespace_path, NamespaceNetwork};
use crate::error::{Error, Operation};
use crate::http::{encode_path_segment, HttpMethod, HttpRequest, HttpResponse, APPLICATION_JSON, TEXT_PLAIN};
use crate::session::Session;
use crate::validation::{required, required_str, Validate, ValidationErrors};

pub trait EdgeKvItems {
    /// Item ids in a group.
    fn list_items(&self, params: ListItemsRequest) -> Result<Vec<String>, Error>;

    fn get_item(&self, params: GetItemRequest) -> Result<String, Error>;

    /// Create or overwrite an item; returns the server's confirmation text.
    fn upsert_item(&self, params: UpsertItemRequest) -> Result<String, Error>;

    fn delete_item(&self, params: DeleteItemRequest) -> Result<String, Error>;
}

/// Location of a group of items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemsRequestParams {
    pub network: Option<NamespaceNetwork>,
    pub namespace_id: String,
    pub group_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListItemsRequest {
    pub items: ItemsRequestParams,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetItemRequest {
    pub item_id: String,
    pub items: ItemsRequestParams,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertItemRequest {
    pub item_id: String,
    pub item_data: String,
    pub items: ItemsRequestParams,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteItemRequest {
    pub item_id: String,
    pub items: ItemsRequestParams,
}

impl ItemsRequestParams {
    fn check(&self, errors: &mut ValidationErrors) {
        errors
            .check("network", required(&self.network))
            .check("namespace_id", required_str(&self.namespace_id))
            .check("group_id", required_str(&self.group_id));
    }

    fn group_path(&self) -> String {
        format!(
            "{}/groups/{}",
            namespace_path(self.network, &self.namespace_id),
            encode_path_segment(&self.group_id)
        )
    }

    fn item_path(&self, item_id: &str) -> String {
        format!("{}/items/{}", self.group_path(), encode_path_segment(item_id))
    }
}

impl Validate for ListItemsRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.items.check(&mut errors);
        errors.into_result()
    }
}

impl Validate for GetItemRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("item_id", required_str(&self.item_id));
        self.items.check(&mut errors);
        errors.into_result()
    }
}

impl Validate for UpsertItemRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("item_id", required_str(&self.item_id))
            .check("item_data", required_str(&self.item_data));
        self.items.check(&mut errors);
        errors.into_result()
    }
}

impl Validate for DeleteItemRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("item_id", required_str(&self.item_id));
        self.items.check(&mut errors);
        errors.into_result()
    }
}

fn is_json(value: &str) -> bool {
    serde_json::from_str::<serde::de::IgnoredAny>(value).is_ok()
}

fn into_text(response: HttpResponse) -> String {
    match String::from_utf8(response.body) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}

impl<S: Session> EdgeKvItems for EdgeworkersClient<S> {
    fn list_items(&self, params: ListItemsRequest) -> Result<Vec<String>, Error> {
        let operation = Operation::ListItems;
        validate(operation, &params)?;
        let request = HttpRequest::new(HttpMethod::Get, params.items.group_path());
        self.execute_json(operation, request, 200)
    }

    fn get_item(&self, params: GetItemRequest) -> Result<String, Error> {
        let operation = Operation::GetItem;
        validate(operation, &params)?;
        let request = HttpRequest::new(HttpMethod::Get, params.items.item_path(&params.item_id));
        self.execute(operation, request, 200).map(into_text)
    }

    fn upsert_item(&self, params: UpsertItemRequest) -> Result<String, Error> {
        let operation = Operation::UpsertItem;
        validate(operation, &params)?;
        let content_type = if is_json(&params.item_data) { APPLICATION_JSON } else { TEXT_PLAIN };
        let request = HttpRequest::new(HttpMethod::Put, params.items.item_path(&params.item_id))
            .with_body(content_type, params.item_data.into_bytes());
        self.execute(operation, request, 200).map(into_text)
    }

    fn delete_item(&self, params: DeleteItemRequest) -> Result<String, Error> {
        let operation = Operation::DeleteItem;
        validate(operation, &params)?;
        let request = HttpRequest::new(HttpMethod::Delete, params.items.item_path(&params.item_id));
        self.execute(operation, request, 200).map(into_text)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http::CONTENT_TYPE;
    use crate::testing::ScriptedSession;

    fn location() -> ItemsRequestParams {
        ItemsRequestParams {
            network: Some(NamespaceNetwork::Staging),
            namespace_id: "marketing".to_string(),
            group_id: "countries".to_string(),
        }
    }

    #[test]
    fn list_items_in_a_group() {
        let session = ScriptedSession::json(200, json!(["US", "CA", "MX"]));
        let client = EdgeworkersClient::new(&session);
        let items = client.list_items(ListItemsRequest { items: location() }).unwrap();
        assert_eq!(items, vec!["US", "CA", "MX"]);
        assert_eq!(
            session.last_request().path,
            "/edgekv/v1/networks/staging/namespaces/marketing/groups/countries"
        );
    }

    #[test]
    fn get_item_returns_raw_text() {
        let session = ScriptedSession::new(200, r#"{"currency": "USD"}"#);
        let client = EdgeworkersClient::new(&session);
        let item = client
            .get_item(GetItemRequest {
                item_id: "US".to_string(),
                items: location(),
            })
            .unwrap();
        assert_eq!(item, r#"{"currency": "USD"}"#);
        assert_eq!(
            session.last_request().path,
            "/edgekv/v1/networks/staging/namespaces/marketing/groups/countries/items/US"
        );
    }

    #[test]
    fn upsert_json_value_keeps_json_content_type() {
        let session = ScriptedSession::new(200, "Item was upserted in KV store with database 123456, namespace marketing, group countries, and key US.");
        let client = EdgeworkersClient::new(&session);
        let reply = client
            .upsert_item(UpsertItemRequest {
                item_id: "US".to_string(),
                item_data: r#"{"currency":"USD"}"#.to_string(),
                items: location(),
            })
            .unwrap();
        assert!(reply.starts_with("Item was upserted"));
        let request = session.last_request();
        assert_eq!(request.method, HttpMethod::Put);
        assert_eq!(request.header(CONTENT_TYPE), Some(APPLICATION_JSON));
        assert_eq!(request.body.as_deref(), Some(br#"{"currency":"USD"}"#.as_slice()));
    }

    #[test]
    fn upsert_plain_value_is_text() {
        let session = ScriptedSession::new(200, "ok");
        let client = EdgeworkersClient::new(&session);
        client
            .upsert_item(UpsertItemRequest {
                item_id: "greeting".to_string(),
                item_data: "hello world".to_string(),
                items: location(),
            })
            .unwrap();
        assert_eq!(session.last_request().header(CONTENT_TYPE), Some(TEXT_PLAIN));
    }

    #[test]
    fn delete_item_returns_text() {
        let session = ScriptedSession::new(200, "Item was marked for deletion from database");
        let client = EdgeworkersClient::new(&session);
        let reply = client
            .delete_item(DeleteItemRequest {
                item_id: "US".to_string(),
                items: location(),
            })
            .unwrap();
        assert_eq!(reply, "Item was marked for deletion from database");
        assert_eq!(session.last_request().method, HttpMethod::Delete);
    }

    #[test]
    fn empty_upsert_reports_every_field() {
        let errors = UpsertItemRequest::default().validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|(field, _)| field).collect();
        assert_eq!(fields, vec!["group_id", "item_data", "item_id", "namespace_id", "network"]);
    }

    #[test]
    fn json_detection() {
        assert!(is_json(r#"{"a":1}"#));
        assert!(is_json("42"));
        assert!(!is_json("hello"));
    }
}
