//! Shared domain enums

use serde::{Deserialize, Serialize};

/// 3G health status declared by a visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum Status3G {
    Vaccinated = 1,
    Recovered = 2,
    Tested = 3,
}

impl std::fmt::Display for Status3G {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Status3G::Vaccinated => "geimpft",
            Status3G::Recovered => "genesen",
            Status3G::Tested => "getestet",
        };
        write!(f, "{}", label)
    }
}
