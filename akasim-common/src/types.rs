//! Subscriber identity types: PLMN and IMSI.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Public Land Mobile Network identifier.
///
/// A PLMN uniquely identifies a mobile network and consists of:
/// - MCC (Mobile Country Code): 3 decimal digits (001-999)
/// - MNC (Mobile Network Code): 2 or 3 decimal digits
///
/// The `long_mnc` field indicates whether the MNC uses 3 digits (true)
/// or 2 digits (false).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Plmn {
    /// Mobile Country Code (3 digits, range 0-999)
    pub mcc: u16,
    /// Mobile Network Code (2-3 digits, range 0-999)
    pub mnc: u16,
    /// True if MNC is 3 digits, false if 2 digits
    pub long_mnc: bool,
}

impl Plmn {
    /// Creates a new PLMN with the given MCC and MNC.
    pub const fn new(mcc: u16, mnc: u16, long_mnc: bool) -> Self {
        Self { mcc, mnc, long_mnc }
    }

    /// Returns true if this PLMN has valid values set.
    pub fn has_value(&self) -> bool {
        self.mcc > 0 || self.mnc > 0
    }

    /// MCC as a zero-padded 3-digit decimal string.
    pub fn mcc_string(&self) -> String {
        format!("{:03}", self.mcc)
    }

    /// MNC as a decimal string, 3 digits when `long_mnc`, otherwise 2.
    pub fn mnc_string(&self) -> String {
        if self.long_mnc {
            format!("{:03}", self.mnc)
        } else {
            format!("{:02}", self.mnc)
        }
    }
}

impl fmt::Debug for Plmn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.long_mnc {
            write!(f, "Plmn({:03}-{:03})", self.mcc, self.mnc)
        } else {
            write!(f, "Plmn({:03}-{:02})", self.mcc, self.mnc)
        }
    }
}

impl fmt::Display for Plmn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.long_mnc {
            write!(f, "{:03}{:03}", self.mcc, self.mnc)
        } else {
            write!(f, "{:03}{:02}", self.mcc, self.mnc)
        }
    }
}

impl Default for Plmn {
    fn default() -> Self {
        Self {
            mcc: 0,
            mnc: 0,
            long_mnc: false,
        }
    }
}

/// International Mobile Subscriber Identity.
///
/// Exactly 15 decimal digits. The driver convention splits it as
/// 3 MCC digits, 2 MNC digits, and a 10-digit MSIN. The raw digit
/// string doubles as the SUPI for key derivation.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Imsi(String);

impl Imsi {
    /// Parses an IMSI, accepting an optional `imsi-` prefix.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let digits = s.strip_prefix("imsi-").unwrap_or(s);
        if digits.len() != 15 {
            return Err(Error::Config(format!(
                "invalid IMSI '{digits}': must be exactly 15 digits (got {} digits)",
                digits.len()
            )));
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::Config(format!(
                "invalid IMSI '{digits}': must contain only digits"
            )));
        }
        Ok(Self(digits.to_string()))
    }

    /// The raw 15-digit string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Mobile Country Code: the first three digits.
    pub fn mcc(&self) -> &str {
        &self.0[0..3]
    }

    /// Mobile Network Code: digits four and five.
    pub fn mnc(&self) -> &str {
        &self.0[3..5]
    }

    /// Mobile Subscriber Identification Number: the remaining digits.
    pub fn msin(&self) -> &str {
        &self.0[5..]
    }

    /// The home PLMN encoded in this IMSI.
    pub fn plmn(&self) -> Plmn {
        Plmn::new(
            self.mcc().parse().unwrap_or(0),
            self.mnc().parse().unwrap_or(0),
            false,
        )
    }
}

impl FromStr for Imsi {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Imsi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Imsi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Imsi({})", self.0)
    }
}
