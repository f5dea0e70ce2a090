//! Subscriber configuration for akasim.
//!
//! A `SubscriberConfig` carries the long-term credentials and per-round
//! inputs for one subscriber, loaded from YAML. Command-line flags
//! override individual values in the driver.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::{Imsi, Plmn};

/// Operator key type for authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OpType {
    /// Operator key (OP) - needs to be converted to `OPc`
    Op,
    /// Operator key derived (`OPc`) - used directly
    #[default]
    Opc,
}

/// Subscriber credential set for one authentication round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberConfig {
    /// Subscription Permanent Identifier (IMSI digits, optional)
    pub supi: Option<Imsi>,
    /// Home PLMN
    pub hplmn: Plmn,
    /// Subscriber key K (128-bit)
    pub key: [u8; 16],
    /// Operator key OP or `OPc` (128-bit)
    pub op: [u8; 16],
    /// Type of operator key (OP or `OPc`)
    pub op_type: OpType,
    /// Authentication Management Field (16-bit)
    pub amf: [u8; 2],
    /// Sequence number (48-bit, stored per subscriber)
    #[serde(default)]
    pub sqn: u64,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            supi: None,
            hplmn: Plmn::default(),
            key: [0u8; 16],
            op: [0u8; 16],
            op_type: OpType::default(),
            amf: [0x80, 0x00], // default AMF value per 3GPP
            sqn: 0,
        }
    }
}

impl SubscriberConfig {
    /// Parses a subscriber configuration from a YAML string.
    ///
    /// # Example
    /// ```
    /// use akasim_common::SubscriberConfig;
    ///
    /// let yaml = r#"
    /// supi: "001010123456789"
    /// hplmn:
    ///   mcc: 1
    ///   mnc: 1
    ///   long_mnc: false
    /// key: [0, 17, 34, 51, 68, 85, 102, 119, 136, 153, 170, 187, 204, 221, 238, 255]
    /// op: [0, 17, 34, 51, 68, 85, 102, 119, 136, 153, 170, 187, 204, 221, 238, 255]
    /// op_type: Op
    /// amf: [128, 0]
    /// sqn: 1
    /// "#;
    ///
    /// let config = SubscriberConfig::from_yaml(yaml).unwrap();
    /// assert_eq!(config.sqn, 1);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads a subscriber configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Serializes the subscriber configuration to a YAML string.
    pub fn to_yaml(&self) -> Result<String, Error> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), Error> {
        if self.hplmn.mcc == 0 || self.hplmn.mcc > 999 {
            return Err(Error::Config(format!(
                "invalid HPLMN MCC {}: must be between 001 and 999",
                self.hplmn.mcc
            )));
        }
        if self.hplmn.mnc > 999 {
            return Err(Error::Config(format!(
                "invalid HPLMN MNC {}: must be between 00 and 999",
                self.hplmn.mnc
            )));
        }
        if self.key.iter().all(|&b| b == 0) {
            return Err(Error::Config(
                "subscriber key K cannot be all zeros".to_string(),
            ));
        }
        if self.sqn >= 1 << 48 {
            return Err(Error::Config(format!(
                "SQN {:#x} does not fit in 48 bits",
                self.sqn
            )));
        }
        Ok(())
    }
}
