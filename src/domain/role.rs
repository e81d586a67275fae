use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the exchange a party plays.
///
/// The initiator (Bob) drives the exchange with requests; the responder
/// (Alice) answers and is the party obligated to report failures in-band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Initiator,
    Responder,
}

impl Role {
    /// Conventional party name used in logs.
    #[must_use]
    pub fn party(self) -> &'static str {
        match self {
            Role::Initiator => "bob",
            Role::Responder => "alice",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Initiator => f.write_str("initiator"),
            Role::Responder => f.write_str("responder"),
        }
    }
}
