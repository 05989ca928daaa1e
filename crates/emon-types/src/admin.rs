//! Shapes only the admin endpoints produce or accept.

use serde::{Deserialize, Serialize};

use crate::account::UserSummary;
use crate::energy::DEFAULT_PRICE_PER_KWH;
use crate::serde_helpers;

/// House as listed in the admin area, with its owner expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminHouse {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub user: Option<UserSummary>,
    #[serde(default)]
    pub sensor_count: u32,
    #[serde(
        default = "default_price",
        deserialize_with = "serde_helpers::number_or_string"
    )]
    pub price_per_kwh: f64,
}

fn default_price() -> f64 {
    DEFAULT_PRICE_PER_KWH
}

/// Payload for creating a house and assigning it to a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewHouse {
    /// Owner's user id.
    pub user: i64,
    pub name: String,
    pub address: String,
    pub price_per_kwh: f64,
}

impl NewHouse {
    /// New house at the default price.
    pub fn new(user: i64, name: impl Into<String>) -> Self {
        Self {
            user,
            name: name.into(),
            address: String::new(),
            price_per_kwh: DEFAULT_PRICE_PER_KWH,
        }
    }
}
