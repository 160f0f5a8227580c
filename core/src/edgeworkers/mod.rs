//! EdgeWorkers API (`/edgeworkers/v1`).

mod activations;
mod contracts;
mod deactivations;
mod ids;
mod permission_groups;
mod properties;
mod reports;
mod resource_tiers;
mod secure_tokens;
mod versions;

pub use activations::*;
pub use contracts::*;
pub use deactivations::*;
pub use ids::*;
pub use permission_groups::*;
pub use properties::*;
pub use reports::*;
pub use resource_tiers::*;
pub use secure_tokens::*;
pub use versions::*;

use crate::enums::wire_enum;

wire_enum! {
    /// Network an EdgeWorker version is activated on.
    pub enum ActivationNetwork {
        Staging => "STAGING",
        Production => "PRODUCTION",
    }
}
