//! Milenage algorithm set (3GPP TS 35.205/35.206)
//!
//! Milenage is the 3GPP authentication and key generation function set
//! used in UMTS, LTE, and 5G networks:
//! - f1: Network authentication (MAC-A)
//! - f1*: Re-synchronization authentication (MAC-S)
//! - f2: User authentication (RES/XRES)
//! - f3: Cipher key derivation (CK)
//! - f4: Integrity key derivation (IK)
//! - f5: Anonymity key derivation (AK)
//! - f5*: Re-synchronization anonymity key (AK-S)
//!
//! On top of the function set this module builds the AUTN and AUTS
//! tokens and the 5G RES* response.
//!
//! Reference: 3GPP TS 35.206 V17.0.0

use std::fmt;

use akasim_common::Error;

use crate::aes::{xor, Aes128Block, BLOCK_SIZE};
use crate::aka::AkaVector;
use crate::kdf;

/// Key size in bytes (128 bits)
pub const KEY_SIZE: usize = 16;

/// OP/OPc size in bytes (128 bits)
pub const OP_SIZE: usize = 16;

/// RAND size in bytes (128 bits)
pub const RAND_SIZE: usize = 16;

/// SQN size in bytes (48 bits)
pub const SQN_SIZE: usize = 6;

/// AMF size in bytes (16 bits)
pub const AMF_SIZE: usize = 2;

/// MAC size in bytes (64 bits)
pub const MAC_SIZE: usize = 8;

/// RES size in bytes (64 bits)
pub const RES_SIZE: usize = 8;

/// CK size in bytes (128 bits)
pub const CK_SIZE: usize = 16;

/// IK size in bytes (128 bits)
pub const IK_SIZE: usize = 16;

/// AK size in bytes (48 bits)
pub const AK_SIZE: usize = 6;

/// RES* size in bytes (128 bits)
pub const RES_STAR_SIZE: usize = 16;

/// AUTN size in bytes
pub const AUTN_SIZE: usize = 16;

/// AUTS size in bytes
pub const AUTS_SIZE: usize = 14;

/// Rotation amounts in bits for each output block (TS 35.206 4.1).
/// All are byte multiples.
const R1: usize = 64;
const R2: usize = 0;
const R3: usize = 32;
const R4: usize = 64;
const R5: usize = 96;

/// Low byte of the XOR constants c2..c5; every other byte is zero
/// (and c1 is all zeroes, so it never appears below).
const C2: u8 = 0x01;
const C3: u8 = 0x02;
const C4: u8 = 0x04;
const C5: u8 = 0x08;

/// Rotate a 128-bit block left by `bits` positions.
///
/// Every Milenage rotation amount is a byte multiple, so whole bytes
/// move: output index i takes input index (i + bits/8) mod 16.
fn rotate_left(block: &[u8; BLOCK_SIZE], bits: usize) -> [u8; BLOCK_SIZE] {
    let shift = (bits / 8) % BLOCK_SIZE;
    let mut out = [0u8; BLOCK_SIZE];
    for i in 0..BLOCK_SIZE {
        out[i] = block[(i + shift) % BLOCK_SIZE];
    }
    out
}

/// Converts a slice to a fixed-width array, failing with the field name
/// and both lengths on a width mismatch.
fn fixed<const N: usize>(field: &'static str, bytes: &[u8]) -> Result<[u8; N], Error> {
    bytes.try_into().map_err(|_| Error::LengthMismatch {
        field,
        expected: N,
        actual: bytes.len(),
    })
}

/// Compute OPc from K and OP
///
/// OPc = OP XOR E_K(OP)
pub fn compute_opc(k: &[u8], op: &[u8]) -> Result<[u8; OP_SIZE], Error> {
    let k: [u8; KEY_SIZE] = fixed("K", k)?;
    let op: [u8; OP_SIZE] = fixed("OP", op)?;
    let cipher = Aes128Block::new(&k);
    Ok(xor(&cipher.encrypt(&op), &op))
}

/// Operator variant field, either the raw OP or the K-specific OPc.
///
/// The raw form is normalized to OPc on first use; the normalized value
/// is reused for every subsequent derivation.
#[derive(Clone, Copy)]
enum OperatorKey {
    Op([u8; OP_SIZE]),
    Opc([u8; OP_SIZE]),
}

/// Milenage engine over one subscriber's inputs.
///
/// The engine owns the subscriber inputs (K via the expanded cipher,
/// OP or OPc, RAND, SQN, AMF) and accumulates derived outputs as the
/// functions run. Distinct instances are fully independent; a single
/// instance is not meant for concurrent use.
pub struct Milenage {
    cipher: Aes128Block,
    op: OperatorKey,
    rand: [u8; RAND_SIZE],
    sqn: [u8; SQN_SIZE],
    amf: [u8; AMF_SIZE],

    mac_a: Option<[u8; MAC_SIZE]>,
    mac_s: Option<[u8; MAC_SIZE]>,
    res: Option<[u8; RES_SIZE]>,
    ck: Option<[u8; CK_SIZE]>,
    ik: Option<[u8; IK_SIZE]>,
    ak: Option<[u8; AK_SIZE]>,
    ak_s: Option<[u8; AK_SIZE]>,
    res_star: Option<[u8; RES_STAR_SIZE]>,
}

impl Milenage {
    /// Creates an engine from K and the raw OP.
    ///
    /// OPc is derived from (K, OP) on the first derivation call. SQN is
    /// stored as the low-order 6 bytes of the 64-bit value, big-endian;
    /// AMF as 2 bytes, big-endian.
    pub fn new(k: &[u8], op: &[u8], rand: &[u8], sqn: u64, amf: u16) -> Result<Self, Error> {
        let op = OperatorKey::Op(fixed("OP", op)?);
        Self::with_operator_key(k, op, rand, sqn, amf)
    }

    /// Creates an engine from K and a pre-computed OPc.
    pub fn new_with_opc(
        k: &[u8],
        opc: &[u8],
        rand: &[u8],
        sqn: u64,
        amf: u16,
    ) -> Result<Self, Error> {
        let op = OperatorKey::Opc(fixed("OPc", opc)?);
        Self::with_operator_key(k, op, rand, sqn, amf)
    }

    fn with_operator_key(
        k: &[u8],
        op: OperatorKey,
        rand: &[u8],
        sqn: u64,
        amf: u16,
    ) -> Result<Self, Error> {
        let k: [u8; KEY_SIZE] = fixed("K", k)?;
        let rand: [u8; RAND_SIZE] = fixed("RAND", rand)?;

        let mut sqn_bytes = [0u8; SQN_SIZE];
        sqn_bytes.copy_from_slice(&sqn.to_be_bytes()[2..]);

        Ok(Self {
            cipher: Aes128Block::new(&k),
            op,
            rand,
            sqn: sqn_bytes,
            amf: amf.to_be_bytes(),
            mac_a: None,
            mac_s: None,
            res: None,
            ck: None,
            ik: None,
            ak: None,
            ak_s: None,
            res_star: None,
        })
    }

    /// OPc, deriving it from OP on first access.
    pub fn opc(&mut self) -> [u8; OP_SIZE] {
        match self.op {
            OperatorKey::Opc(opc) => opc,
            OperatorKey::Op(op) => {
                let opc = xor(&self.cipher.encrypt(&op), &op);
                self.op = OperatorKey::Opc(opc);
                opc
            }
        }
    }

    /// TEMP = E_K(RAND XOR OPc)
    fn temp(&mut self) -> [u8; BLOCK_SIZE] {
        let opc = self.opc();
        self.cipher.encrypt(&xor(&self.rand, &opc))
    }

    /// Shared kernel of f1 and f1*:
    /// OUT1 = E_K(TEMP XOR rot(IN1 XOR OPc, r1) XOR c1) XOR OPc
    fn out1(&mut self, sqn: &[u8; SQN_SIZE], amf: &[u8; AMF_SIZE]) -> [u8; BLOCK_SIZE] {
        let opc = self.opc();
        let temp = self.temp();

        // IN1 = SQN || AMF || SQN || AMF
        let mut in1 = [0u8; BLOCK_SIZE];
        in1[0..6].copy_from_slice(sqn);
        in1[6..8].copy_from_slice(amf);
        in1[8..14].copy_from_slice(sqn);
        in1[14..16].copy_from_slice(amf);

        // c1 is all zeroes, so only TEMP folds in before the encryption
        let rotated = rotate_left(&xor(&in1, &opc), R1);
        let out = self.cipher.encrypt(&xor(&rotated, &temp));
        xor(&out, &opc)
    }

    /// f1 - Network authentication function
    ///
    /// Computes MAC-A from the stored K, RAND, SQN and AMF.
    pub fn f1(&mut self) -> [u8; MAC_SIZE] {
        let (sqn, amf) = (self.sqn, self.amf);
        let out1 = self.out1(&sqn, &amf);

        let mut mac_a = [0u8; MAC_SIZE];
        mac_a.copy_from_slice(&out1[..MAC_SIZE]);
        self.mac_a = Some(mac_a);
        mac_a
    }

    /// f1* - Re-synchronization message authentication function
    ///
    /// Computes MAC-S for the given SQN and AMF. The AMF value should
    /// be all zeroes to comply with TS 33.102 6.3.3; this method
    /// computes with whatever the caller passes.
    pub fn f1_star(&mut self, sqn: &[u8; SQN_SIZE], amf: &[u8; AMF_SIZE]) -> [u8; MAC_SIZE] {
        let out1 = self.out1(sqn, amf);

        let mut mac_s = [0u8; MAC_SIZE];
        mac_s.copy_from_slice(&out1[MAC_SIZE..]);
        self.mac_s = Some(mac_s);
        mac_s
    }

    /// f2, f3, f4 and f5 in one pass
    ///
    /// Returns (RES, CK, IK, AK) and stores all four on the engine.
    pub fn f2345(
        &mut self,
    ) -> (
        [u8; RES_SIZE],
        [u8; CK_SIZE],
        [u8; IK_SIZE],
        [u8; AK_SIZE],
    ) {
        let opc = self.opc();
        let temp = self.temp();
        let mixed = xor(&temp, &opc);

        // OUT2 = E_K(rot(TEMP XOR OPc, r2) XOR c2) XOR OPc
        // r2 = 0; RES is the high half, AK the first 6 bytes
        let mut input = rotate_left(&mixed, R2);
        input[15] ^= C2;
        let out2 = xor(&self.cipher.encrypt(&input), &opc);

        let mut res = [0u8; RES_SIZE];
        res.copy_from_slice(&out2[8..16]);
        let mut ak = [0u8; AK_SIZE];
        ak.copy_from_slice(&out2[..AK_SIZE]);

        // OUT3 = E_K(rot(TEMP XOR OPc, r3) XOR c3) XOR OPc
        let mut input = rotate_left(&mixed, R3);
        input[15] ^= C3;
        let ck = xor(&self.cipher.encrypt(&input), &opc);

        // OUT4 = E_K(rot(TEMP XOR OPc, r4) XOR c4) XOR OPc
        let mut input = rotate_left(&mixed, R4);
        input[15] ^= C4;
        let ik = xor(&self.cipher.encrypt(&input), &opc);

        self.res = Some(res);
        self.ck = Some(ck);
        self.ik = Some(ik);
        self.ak = Some(ak);
        (res, ck, ik, ak)
    }

    /// f5* - Anonymity key derivation for the re-synchronization message
    ///
    /// OUT5 = E_K(rot(TEMP XOR OPc, r5) XOR c5) XOR OPc; AK-S is the
    /// first 6 bytes.
    pub fn f5_star(&mut self) -> [u8; AK_SIZE] {
        let opc = self.opc();
        let temp = self.temp();

        let mut input = rotate_left(&xor(&temp, &opc), R5);
        input[15] ^= C5;
        let out5 = xor(&self.cipher.encrypt(&input), &opc);

        let mut ak_s = [0u8; AK_SIZE];
        ak_s.copy_from_slice(&out5[..AK_SIZE]);
        self.ak_s = Some(ak_s);
        ak_s
    }

    /// Runs every derivation that needs no serving-network input,
    /// filling MAC-A, MAC-S, RES, CK, IK, AK and AK-S in one pass.
    pub fn compute_all(&mut self) {
        self.f1();
        let (sqn, amf) = (self.sqn, self.amf);
        self.f1_star(&sqn, &amf);
        self.f2345();
        self.f5_star();
    }

    /// Computes RES* as described in TS 33.501 Annex A.4.
    ///
    /// The serving network name is built from MCC (3 digits) and MNC
    /// (2 or 3 digits); RES, CK and IK are derived first if needed.
    pub fn compute_res_star(
        &mut self,
        mcc: &str,
        mnc: &str,
    ) -> Result<[u8; RES_STAR_SIZE], Error> {
        let snn = kdf::serving_network_name(mcc, mnc)?;

        let (res, ck, ik, _ak) = match (self.res, self.ck, self.ik, self.ak) {
            (Some(res), Some(ck), Some(ik), Some(ak)) => (res, ck, ik, ak),
            _ => self.f2345(),
        };

        let res_star = kdf::derive_res_star(&ck, &ik, snn.as_bytes(), &self.rand, &res);
        self.res_star = Some(res_star);
        Ok(res_star)
    }

    /// Builds AUTN = (SQN XOR AK) || AMF || MAC-A
    /// (TS 33.105 5.1.1.1, TS 33.102 6.3.2).
    ///
    /// MAC-A and AK are derived first if needed.
    pub fn generate_autn(&mut self) -> [u8; AUTN_SIZE] {
        let mac_a = match self.mac_a {
            Some(mac_a) => mac_a,
            None => self.f1(),
        };
        let ak = match self.ak {
            Some(ak) => ak,
            None => self.f2345().3,
        };

        let mut autn = [0u8; AUTN_SIZE];
        for i in 0..SQN_SIZE {
            autn[i] = self.sqn[i] ^ ak[i];
        }
        autn[6..8].copy_from_slice(&self.amf);
        autn[8..16].copy_from_slice(&mac_a);
        autn
    }

    /// Builds AUTS = (SQN XOR AK-S) || MAC-S
    /// (TS 33.105 5.1.1.3, TS 33.102 6.3.3).
    ///
    /// MAC-S and AK-S are recomputed with AMF = 0x0000 (the dummy value
    /// is not transmitted in the re-synchronization message) and the
    /// stored MAC-S and AK-S are overwritten with the recomputed ones.
    pub fn generate_auts(&mut self) -> [u8; AUTS_SIZE] {
        let sqn = self.sqn;
        let mac_s = self.f1_star(&sqn, &[0x00, 0x00]);
        let ak_s = self.f5_star();

        let mut auts = [0u8; AUTS_SIZE];
        for i in 0..SQN_SIZE {
            auts[i] = sqn[i] ^ ak_s[i];
        }
        auts[6..14].copy_from_slice(&mac_s);
        auts
    }

    /// Copies the completed vector out of the engine for the AKA key
    /// schedule.
    ///
    /// RES* must have been derived already (it needs MCC/MNC, which the
    /// engine does not hold); the remaining fields are derived on
    /// demand. The snapshot is unaffected by later engine mutation.
    pub fn snapshot(&mut self) -> Result<AkaVector, Error> {
        let res_star = self
            .res_star
            .ok_or_else(|| Error::Crypto("RES* has not been derived".to_string()))?;

        let (res, ck, ik, ak) = match (self.res, self.ck, self.ik, self.ak) {
            (Some(res), Some(ck), Some(ik), Some(ak)) => (res, ck, ik, ak),
            _ => self.f2345(),
        };

        Ok(AkaVector {
            rand: self.rand,
            sqn: self.sqn,
            res,
            ck,
            ik,
            ak,
            res_star,
        })
    }

    /// The stored random challenge.
    pub fn rand(&self) -> [u8; RAND_SIZE] {
        self.rand
    }

    /// The stored sequence number, big-endian.
    pub fn sqn(&self) -> [u8; SQN_SIZE] {
        self.sqn
    }

    /// The stored authentication management field, big-endian.
    pub fn amf(&self) -> [u8; AMF_SIZE] {
        self.amf
    }

    /// MAC-A, if f1 has run.
    pub fn mac_a(&self) -> Option<[u8; MAC_SIZE]> {
        self.mac_a
    }

    /// MAC-S, if f1* has run.
    pub fn mac_s(&self) -> Option<[u8; MAC_SIZE]> {
        self.mac_s
    }

    /// RES, if f2345 has run.
    pub fn res(&self) -> Option<[u8; RES_SIZE]> {
        self.res
    }

    /// CK, if f2345 has run.
    pub fn ck(&self) -> Option<[u8; CK_SIZE]> {
        self.ck
    }

    /// IK, if f2345 has run.
    pub fn ik(&self) -> Option<[u8; IK_SIZE]> {
        self.ik
    }

    /// AK, if f2345 has run.
    pub fn ak(&self) -> Option<[u8; AK_SIZE]> {
        self.ak
    }

    /// AK-S, if f5* has run.
    pub fn ak_s(&self) -> Option<[u8; AK_SIZE]> {
        self.ak_s
    }

    /// RES*, if it has been derived.
    pub fn res_star(&self) -> Option<[u8; RES_STAR_SIZE]> {
        self.res_star
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

impl fmt::Debug for Milenage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ds = f.debug_struct("Milenage");
        match &self.op {
            OperatorKey::Op(op) => ds.field("op", &HexField(op)),
            OperatorKey::Opc(opc) => ds.field("opc", &HexField(opc)),
        };
        ds.field("rand", &HexField(&self.rand))
            .field("sqn", &HexField(&self.sqn))
            .field("amf", &HexField(&self.amf))
            .field("mac_a", &self.mac_a.as_ref().map(|v| HexField(v)))
            .field("mac_s", &self.mac_s.as_ref().map(|v| HexField(v)))
            .field("res", &self.res.as_ref().map(|v| HexField(v)))
            .field("ck", &self.ck.as_ref().map(|v| HexField(v)))
            .field("ik", &self.ik.as_ref().map(|v| HexField(v)))
            .field("ak", &self.ak.as_ref().map(|v| HexField(v)))
            .field("ak_s", &self.ak_s.as_ref().map(|v| HexField(v)))
            .field("res_star", &self.res_star.as_ref().map(|v| HexField(v)))
            .finish()
    }
}
