//! The five network domains an incident can belong to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    Transport,
    FileAccess,
    RadioAccess,
    Core,
    BackboneInternet,
}

impl NetworkType {
    /// Every network type, in dashboard order.
    pub const ALL: [NetworkType; 5] = [
        NetworkType::Transport,
        NetworkType::FileAccess,
        NetworkType::RadioAccess,
        NetworkType::Core,
        NetworkType::BackboneInternet,
    ];

    /// Stable wire/database name.
    pub fn as_str(self) -> &'static str {
        match self {
            NetworkType::Transport => "transport",
            NetworkType::FileAccess => "file_access",
            NetworkType::RadioAccess => "radio_access",
            NetworkType::Core => "core",
            NetworkType::BackboneInternet => "backbone_internet",
        }
    }

    /// Human-readable label, e.g. `"Radio Access Network"`.
    pub fn label(self) -> &'static str {
        match self {
            NetworkType::Transport => "Transport Network",
            NetworkType::FileAccess => "File Access Network",
            NetworkType::RadioAccess => "Radio Access Network",
            NetworkType::Core => "Core Network",
            NetworkType::BackboneInternet => "Backbone Internet Network",
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NetworkType::ALL
            .into_iter()
            .find(|n| n.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown network type '{s}'. Must be one of: {}",
                    NetworkType::ALL.map(NetworkType::as_str).join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_wire_name() {
        for network in NetworkType::ALL {
            assert_eq!(network.as_str().parse::<NetworkType>().unwrap(), network);
        }
    }

    #[test]
    fn rejects_hyphenated_names() {
        let err = "file-access".parse::<NetworkType>().unwrap_err();
        assert!(err.to_string().contains("Unknown network type"));
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&NetworkType::BackboneInternet).unwrap();
        assert_eq!(json, "\"backbone_internet\"");
    }
}
