//! EdgeKV API (`/edgekv/v1`).

mod access_tokens;
mod groups;
mod initialize;
mod items;
mod namespaces;

pub use access_tokens::*;
pub use groups::*;
pub use initialize::*;
pub use items::*;
pub use namespaces::*;

use crate::enums::wire_enum;
use crate::http::encode_path_segment;
use crate::validation::required_length;

wire_enum! {
    /// Network a namespace lives on. Lowercase on the wire, unlike
    /// [`ActivationNetwork`](crate::edgeworkers::ActivationNetwork).
    pub enum NamespaceNetwork {
        Staging => "staging",
        Production => "production",
    }
}

/// Namespace and token names: required, 1 to 32 characters.
pub(crate) fn name_rule(name: &str) -> Result<(), String> {
    required_length(name, 1, 32)
}

/// Requests are validated before paths are built, so `network` is set here.
pub(crate) fn namespaces_path(network: Option<NamespaceNetwork>) -> String {
    let network = network.map_or("", |n| n.as_str());
    format!("/edgekv/v1/networks/{network}/namespaces")
}

pub(crate) fn namespace_path(network: Option<NamespaceNetwork>, namespace: &str) -> String {
    format!("{}/{}", namespaces_path(network), encode_path_segment(namespace))
}
