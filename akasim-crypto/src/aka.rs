//! 5G AKA key schedule (3GPP TS 33.501)
//!
//! Consumes a completed authentication vector and derives the key
//! hierarchy anchored at the serving network: KAUSF at the home
//! network, KSEAF at the security anchor, KAMF at the serving AMF,
//! and the HXRES* verifier held by the SEAF in place of XRES*.

use std::fmt;

use akasim_common::Error;

use crate::kdf::{self, KEY_128_SIZE, KEY_256_SIZE, SNN_SIZE};
use crate::milenage::{
    AK_SIZE, CK_SIZE, IK_SIZE, RAND_SIZE, RES_SIZE, RES_STAR_SIZE, SQN_SIZE,
};

/// Maximum SUPI length in bytes (an IMSI is 15 decimal digits)
pub const SUPI_MAX_SIZE: usize = 15;

/// ABBA parameter for the initial set of security features.
pub const ABBA: [u8; 2] = [0x00, 0x00];

/// By-value snapshot of a completed authentication vector.
///
/// Produced by [`crate::milenage::Milenage::snapshot`]; holding a copy
/// keeps the key schedule independent of the mutable engine.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AkaVector {
    /// Random challenge the vector was derived from
    pub rand: [u8; RAND_SIZE],
    /// Sequence number, big-endian
    pub sqn: [u8; SQN_SIZE],
    /// Expected response (f2 output)
    pub res: [u8; RES_SIZE],
    /// Confidentiality key (f3 output)
    pub ck: [u8; CK_SIZE],
    /// Integrity key (f4 output)
    pub ik: [u8; IK_SIZE],
    /// Anonymity key (f5 output)
    pub ak: [u8; AK_SIZE],
    /// 5G-augmented response
    pub res_star: [u8; RES_STAR_SIZE],
}

/// Key schedule for one authentication round.
///
/// Progression is linear: KAUSF first, then KSEAF, KAMF and HXRES*
/// independently. The dependent derivations fill in KAUSF on demand,
/// and every output is cached on the instance once derived. Distinct
/// instances are fully independent.
pub struct Aka {
    vector: AkaVector,
    snn: Vec<u8>,
    supi: Vec<u8>,

    kausf: Option<[u8; KEY_256_SIZE]>,
    kseaf: Option<[u8; KEY_256_SIZE]>,
    kamf: Option<[u8; KEY_256_SIZE]>,
    hxres_star: Option<[u8; KEY_128_SIZE]>,
}

impl Aka {
    /// Creates a key schedule from a vector snapshot, the serving
    /// network name (exactly 32 ASCII bytes) and the SUPI (at most 15
    /// ASCII bytes, the raw IMSI digits).
    pub fn new(vector: AkaVector, snn: &str, supi: &str) -> Result<Self, Error> {
        if snn.len() != SNN_SIZE {
            return Err(Error::LengthMismatch {
                field: "SNN",
                expected: SNN_SIZE,
                actual: snn.len(),
            });
        }
        if supi.is_empty() || supi.len() > SUPI_MAX_SIZE {
            return Err(Error::LengthMismatch {
                field: "SUPI",
                expected: SUPI_MAX_SIZE,
                actual: supi.len(),
            });
        }

        Ok(Self {
            vector,
            snn: kdf::encode_kdf_string(snn),
            supi: kdf::encode_kdf_string(supi),
            kausf: None,
            kseaf: None,
            kamf: None,
            hxres_star: None,
        })
    }

    /// KAUSF = KDF(CK || IK, FC=0x6A, SNN, SQN XOR AK)
    pub fn compute_kausf(&mut self) -> [u8; KEY_256_SIZE] {
        if let Some(kausf) = self.kausf {
            return kausf;
        }

        let mut sqn_xor_ak = [0u8; SQN_SIZE];
        for i in 0..SQN_SIZE {
            sqn_xor_ak[i] = self.vector.sqn[i] ^ self.vector.ak[i];
        }

        let kausf = kdf::derive_kausf(&self.vector.ck, &self.vector.ik, &self.snn, &sqn_xor_ak);
        self.kausf = Some(kausf);
        kausf
    }

    /// KSEAF = KDF(KAUSF, FC=0x6C, SNN); derives KAUSF first if needed.
    pub fn compute_kseaf(&mut self) -> [u8; KEY_256_SIZE] {
        if let Some(kseaf) = self.kseaf {
            return kseaf;
        }

        let kausf = self.compute_kausf();
        let kseaf = kdf::derive_kseaf(&kausf, &self.snn);
        self.kseaf = Some(kseaf);
        kseaf
    }

    /// KAMF = KDF(KAUSF, FC=0x6D, SUPI, ABBA); derives KAUSF first if
    /// needed.
    pub fn compute_kamf(&mut self) -> [u8; KEY_256_SIZE] {
        if let Some(kamf) = self.kamf {
            return kamf;
        }

        let kausf = self.compute_kausf();
        let kamf = kdf::derive_kamf(&kausf, &self.supi, &ABBA);
        self.kamf = Some(kamf);
        kamf
    }

    /// HXRES* = SHA-256(RAND || XRES*), low-order 128 bits.
    pub fn compute_hxres_star(&mut self) -> [u8; KEY_128_SIZE] {
        if let Some(hxres_star) = self.hxres_star {
            return hxres_star;
        }

        let hxres_star = kdf::derive_hxres_star(&self.vector.rand, &self.vector.res_star);
        self.hxres_star = Some(hxres_star);
        hxres_star
    }

    /// The snapshot this schedule was built from.
    pub fn vector(&self) -> &AkaVector {
        &self.vector
    }

    /// KAUSF, if derived.
    pub fn kausf(&self) -> Option<[u8; KEY_256_SIZE]> {
        self.kausf
    }

    /// KSEAF, if derived.
    pub fn kseaf(&self) -> Option<[u8; KEY_256_SIZE]> {
        self.kseaf
    }

    /// KAMF, if derived.
    pub fn kamf(&self) -> Option<[u8; KEY_256_SIZE]> {
        self.kamf
    }

    /// HXRES*, if derived.
    pub fn hxres_star(&self) -> Option<[u8; KEY_128_SIZE]> {
        self.hxres_star
    }
}

struct HexField<'a>(&'a [u8]);

impl fmt::Debug for HexField<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for AkaVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AkaVector")
            .field("rand", &HexField(&self.rand))
            .field("sqn", &HexField(&self.sqn))
            .field("res", &HexField(&self.res))
            .field("ck", &HexField(&self.ck))
            .field("ik", &HexField(&self.ik))
            .field("ak", &HexField(&self.ak))
            .field("res_star", &HexField(&self.res_star))
            .finish()
    }
}
