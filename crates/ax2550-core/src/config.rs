//! Driver configuration

use serde::{Deserialize, Serialize};

use crate::protocol::Ax2550Error;

/// Driver configuration
///
/// Line settings and wait budgets are fixed by the controller's protocol,
/// so the only tunable is which port to open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Serial port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub port_name: String,
}

impl DriverConfig {
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
        }
    }

    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, Ax2550Error> {
        serde_json::from_str(json)
            .map_err(|e| Ax2550Error::Connection(format!("invalid driver config: {}", e)))
    }

    pub fn to_json(&self) -> Result<String, Ax2550Error> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Ax2550Error::Connection(format!("invalid driver config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_has_no_port() {
        assert!(DriverConfig::default().port_name.is_empty());
    }

    #[test]
    fn test_from_json() {
        let config = DriverConfig::from_json(r#"{ "port_name": "/dev/ttyUSB0" }"#).unwrap();
        assert_eq!(config, DriverConfig::new("/dev/ttyUSB0"));

        let empty = DriverConfig::from_json("{}").unwrap();
        assert_eq!(empty, DriverConfig::default());
    }

    #[test]
    fn test_json_roundtrip_and_errors() {
        let config = DriverConfig::new("COM3");
        let json = config.to_json().unwrap();
        assert_eq!(DriverConfig::from_json(&json).unwrap(), config);
        assert!(DriverConfig::from_json("not json").is_err());
    }
}
