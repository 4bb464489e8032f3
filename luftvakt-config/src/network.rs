//! Protected network definition.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone)]
pub struct NetworkConfig {
    /// Hardware addresses of our own access points and infrastructure.
    #[validate(custom(function = validation::validate_mac_list))]
    #[serde(default)]
    pub own_macs: Vec<String>,
}
