//! Key derivation functions for the 5G key hierarchy
//!
//! Implements the generic KDF of 3GPP TS 33.220 on HMAC-SHA-256 and the
//! TS 33.501 Annex A derivations consumed by the AKA key schedule:
//! - KAUSF from CK and IK
//! - KSEAF from KAUSF
//! - KAMF from KAUSF, SUPI and ABBA
//! - RES* from CK, IK, RAND and RES
//! - HXRES* from RAND and RES* (plain SHA-256, no HMAC)

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

use akasim_common::Error;

/// HMAC-SHA256 output size in bytes
pub const HMAC_SHA256_SIZE: usize = 32;

/// Key size for 256-bit keys
pub const KEY_256_SIZE: usize = 32;

/// Key size for 128-bit keys
pub const KEY_128_SIZE: usize = 16;

/// Serving network name length for the `5G:` format, in bytes
pub const SNN_SIZE: usize = 32;

/// FC values for key derivation as defined in 3GPP TS 33.501 Annex A
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FcValue {
    /// FC = 0x6A: Derivation of KAUSF from CK and IK
    Kausf = 0x6A,
    /// FC = 0x6B: Derivation of RES* and XRES*
    ResStar = 0x6B,
    /// FC = 0x6C: Derivation of KSEAF from KAUSF
    Kseaf = 0x6C,
    /// FC = 0x6D: Derivation of KAMF
    Kamf = 0x6D,
}

/// Compute HMAC-SHA256
pub fn hmac_sha256(key: &[u8], input: &[u8]) -> [u8; HMAC_SHA256_SIZE] {
    // HMAC-SHA256 accepts keys of any size, so this should never fail
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .unwrap_or_else(|_| unreachable!("HMAC-SHA256 accepts keys of any size"));
    mac.update(input);
    let result = mac.finalize();
    let mut output = [0u8; HMAC_SHA256_SIZE];
    output.copy_from_slice(&result.into_bytes());
    output
}

/// Calculate a KDF key using HMAC-SHA256 as specified in 3GPP TS 33.220
///
/// The input string S is constructed as:
/// S = FC || P0 || L0 || P1 || L1 || ... || Pn || Ln
///
/// Where:
/// - FC is a single octet function code
/// - Pi are the input parameters
/// - Li are the lengths of Pi encoded as 2 octets (big-endian)
pub fn calculate_kdf_key(
    key: &[u8; KEY_256_SIZE],
    fc: u8,
    parameters: &[&[u8]],
) -> [u8; KEY_256_SIZE] {
    let mut input = Vec::new();
    input.push(fc);

    for param in parameters {
        input.extend_from_slice(param);
        let len = param.len() as u16;
        input.extend_from_slice(&len.to_be_bytes());
    }

    hmac_sha256(key, &input)
}

/// Builds the Serving Network Name `5G:mnc<MNC>.mcc<MCC>.3gppnetwork.org`.
///
/// MCC must be 3 decimal digits; MNC must be 2 or 3 decimal digits and
/// is zero-padded to 3. The assembled name is always 32 bytes.
pub fn serving_network_name(mcc: &str, mnc: &str) -> Result<String, Error> {
    if mcc.len() != 3 || !mcc.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::ServingNetwork(format!("invalid MCC: {mcc}")));
    }
    let mnc = match mnc.len() {
        2 => format!("0{mnc}"),
        3 => mnc.to_string(),
        _ => return Err(Error::ServingNetwork(format!("invalid MNC: {mnc}"))),
    };
    if !mnc.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::ServingNetwork(format!("invalid MNC: {mnc}")));
    }

    let snn = format!("5G:mnc{mnc}.mcc{mcc}.3gppnetwork.org");
    if snn.len() != SNN_SIZE {
        return Err(Error::ServingNetwork(format!("failed to build SNN: {snn}")));
    }
    Ok(snn)
}

/// Derive KAUSF from CK and IK (3GPP TS 33.501 Annex A.2)
///
/// KAUSF = KDF(CK || IK, FC=0x6A, SN name, SQN ⊕ AK)
pub fn derive_kausf(
    ck: &[u8; KEY_128_SIZE],
    ik: &[u8; KEY_128_SIZE],
    sn_name: &[u8],
    sqn_xor_ak: &[u8; 6],
) -> [u8; KEY_256_SIZE] {
    let key = concat_ck_ik(ck, ik);
    calculate_kdf_key(&key, FcValue::Kausf as u8, &[sn_name, sqn_xor_ak])
}

/// Derive KSEAF from KAUSF (3GPP TS 33.501 Annex A.6)
///
/// KSEAF = KDF(KAUSF, FC=0x6C, SN name)
pub fn derive_kseaf(kausf: &[u8; KEY_256_SIZE], sn_name: &[u8]) -> [u8; KEY_256_SIZE] {
    calculate_kdf_key(kausf, FcValue::Kseaf as u8, &[sn_name])
}

/// Derive KAMF (3GPP TS 33.501 Annex A.7 input layout)
///
/// KAMF = KDF(KAUSF, FC=0x6D, SUPI, ABBA)
///
/// The input string is FC || SUPI || len(SUPI) || ABBA || len(ABBA),
/// with len(ABBA) = 0x0002 for the two-byte initial-configuration ABBA.
pub fn derive_kamf(
    kausf: &[u8; KEY_256_SIZE],
    supi: &[u8],
    abba: &[u8],
) -> [u8; KEY_256_SIZE] {
    calculate_kdf_key(kausf, FcValue::Kamf as u8, &[supi, abba])
}

/// Derive RES* from CK and IK (3GPP TS 33.501 Annex A.4)
///
/// RES* = KDF(CK || IK, FC=0x6B, SN name, RAND, RES), truncated to the
/// low-order 128 bits of the 256-bit KDF output.
pub fn derive_res_star(
    ck: &[u8; KEY_128_SIZE],
    ik: &[u8; KEY_128_SIZE],
    sn_name: &[u8],
    rand: &[u8; KEY_128_SIZE],
    res: &[u8],
) -> [u8; KEY_128_SIZE] {
    let key = concat_ck_ik(ck, ik);
    let kdf_output = calculate_kdf_key(&key, FcValue::ResStar as u8, &[sn_name, rand, res]);

    let mut result = [0u8; KEY_128_SIZE];
    result.copy_from_slice(&kdf_output[KEY_128_SIZE..]);
    result
}

/// Derive HXRES* from RAND and XRES* (3GPP TS 33.501 Annex A.5)
///
/// HXRES* is the low-order 128 bits of SHA-256(RAND || XRES*). No HMAC
/// is involved; this is the verifier the SEAF holds instead of XRES*.
pub fn derive_hxres_star(
    rand: &[u8; KEY_128_SIZE],
    res_star: &[u8; KEY_128_SIZE],
) -> [u8; KEY_128_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(rand);
    hasher.update(res_star);
    let digest = hasher.finalize();

    let mut result = [0u8; KEY_128_SIZE];
    result.copy_from_slice(&digest[KEY_128_SIZE..]);
    result
}

/// Encode a string for KDF input as specified in 3GPP TS 33.501 Annex B.2.1.2
///
/// Character strings are first normalized using NFKC (Normalization Form
/// Compatibility Composition) and then encoded to octet strings according
/// to UTF-8 encoding rules.
pub fn encode_kdf_string(s: &str) -> Vec<u8> {
    let normalized: String = s.nfkc().collect();
    normalized.into_bytes()
}

fn concat_ck_ik(ck: &[u8; KEY_128_SIZE], ik: &[u8; KEY_128_SIZE]) -> [u8; KEY_256_SIZE] {
    let mut key = [0u8; KEY_256_SIZE];
    key[..KEY_128_SIZE].copy_from_slice(ck);
    key[KEY_128_SIZE..].copy_from_slice(ik);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_sha256_rfc4231_case1() {
        let key = [0x0b; 20];
        let data = b"Hi There";
        let expected: [u8; 32] = [
            0xb0, 0x34, 0x4c, 0x61, 0xd8, 0xdb, 0x38, 0x53,
            0x5c, 0xa8, 0xaf, 0xce, 0xaf, 0x0b, 0xf1, 0x2b,
            0x88, 0x1d, 0xc2, 0x00, 0xc9, 0x83, 0x3d, 0xa7,
            0x26, 0xe9, 0x37, 0x6c, 0x2e, 0x32, 0xcf, 0xf7,
        ];

        assert_eq!(hmac_sha256(&key, data), expected);
    }

    #[test]
    fn test_hmac_sha256_rfc4231_case2() {
        let key = b"Jefe";
        let data = b"what do ya want for nothing?";
        let expected: [u8; 32] = [
            0x5b, 0xdc, 0xc1, 0x46, 0xbf, 0x60, 0x75, 0x4e,
            0x6a, 0x04, 0x24, 0x26, 0x08, 0x95, 0x75, 0xc7,
            0x5a, 0x00, 0x3f, 0x08, 0x9d, 0x27, 0x39, 0x83,
            0x9d, 0xec, 0x58, 0xb9, 0x64, 0xec, 0x38, 0x43,
        ];

        assert_eq!(hmac_sha256(key, data), expected);
    }

    #[test]
    fn test_calculate_kdf_key_structure() {
        // S = FC || P0 || L0, so the KDF must agree with a hand-built S
        let key = [0x42u8; 32];
        let param: &[u8] = b"network";

        let mut s = vec![0x6C];
        s.extend_from_slice(param);
        s.extend_from_slice(&(param.len() as u16).to_be_bytes());

        assert_eq!(calculate_kdf_key(&key, 0x6C, &[param]), hmac_sha256(&key, &s));
    }

    #[test]
    fn test_calculate_kdf_key_deterministic() {
        let key = [0u8; 32];
        let result = calculate_kdf_key(&key, 0x6C, &[b"test"]);
        assert_eq!(result, calculate_kdf_key(&key, 0x6C, &[b"test"]));
        assert_ne!(result, calculate_kdf_key(&key, 0x6D, &[b"test"]));
    }

    #[test]
    fn test_serving_network_name_two_digit_mnc() {
        let snn = serving_network_name("001", "01").unwrap();
        assert_eq!(snn, "5G:mnc001.mcc001.3gppnetwork.org");
        assert_eq!(snn.len(), SNN_SIZE);
    }

    #[test]
    fn test_serving_network_name_three_digit_mnc() {
        let snn = serving_network_name("310", "410").unwrap();
        assert_eq!(snn, "5G:mnc410.mcc310.3gppnetwork.org");
        assert_eq!(snn.len(), SNN_SIZE);
    }

    #[test]
    fn test_serving_network_name_rejects_bad_mnc() {
        assert!(serving_network_name("001", "1").is_err());
        assert!(serving_network_name("001", "0001").is_err());
        assert!(serving_network_name("001", "x1").is_err());
    }

    #[test]
    fn test_serving_network_name_rejects_bad_mcc() {
        assert!(serving_network_name("01", "01").is_err());
        assert!(serving_network_name("0001", "01").is_err());
        assert!(serving_network_name("0x1", "01").is_err());
    }

    #[test]
    fn test_derive_kausf_deterministic() {
        let ck = [0x11u8; 16];
        let ik = [0x22u8; 16];
        let sn_name = b"5G:mnc001.mcc001.3gppnetwork.org";
        let sqn_xor_ak = [0x00, 0x00, 0x00, 0x00, 0x00, 0x01];

        let kausf = derive_kausf(&ck, &ik, sn_name, &sqn_xor_ak);
        assert_eq!(kausf, derive_kausf(&ck, &ik, sn_name, &sqn_xor_ak));
        assert_ne!(
            kausf,
            derive_kausf(&ck, &ik, sn_name, &[0x00, 0x00, 0x00, 0x00, 0x00, 0x02])
        );
    }

    #[test]
    fn test_derive_kseaf_varies_with_sn_name() {
        let kausf = [0x33u8; 32];
        let kseaf = derive_kseaf(&kausf, b"5G:mnc001.mcc001.3gppnetwork.org");
        let kseaf2 = derive_kseaf(&kausf, b"5G:mnc002.mcc002.3gppnetwork.org");
        assert_ne!(kseaf, kseaf2);
    }

    #[test]
    fn test_derive_kamf_varies_with_supi() {
        let kausf = [0x44u8; 32];
        let abba = [0x00, 0x00];

        let kamf = derive_kamf(&kausf, b"001010000000001", &abba);
        let kamf2 = derive_kamf(&kausf, b"001010000000002", &abba);
        assert_ne!(kamf, kamf2);
    }

    #[test]
    fn test_derive_kamf_input_layout() {
        // FC || SUPI || len(SUPI) || ABBA || 0x0002
        let kausf = [0x55u8; 32];
        let supi = b"001010123456789";
        let abba = [0x00, 0x00];

        let mut s = vec![0x6D];
        s.extend_from_slice(supi);
        s.extend_from_slice(&[0x00, 0x0F]);
        s.extend_from_slice(&abba);
        s.extend_from_slice(&[0x00, 0x02]);

        assert_eq!(derive_kamf(&kausf, supi, &abba), hmac_sha256(&kausf, &s));
    }

    #[test]
    fn test_derive_res_star_varies_with_res() {
        let ck = [0xCCu8; 16];
        let ik = [0xDDu8; 16];
        let sn_name = b"5G:mnc001.mcc001.3gppnetwork.org";
        let rand = [0xEEu8; 16];

        let res_star = derive_res_star(&ck, &ik, sn_name, &rand, &[0xFFu8; 8]);
        let res_star2 = derive_res_star(&ck, &ik, sn_name, &rand, &[0x00u8; 8]);
        assert_ne!(res_star, res_star2);
    }

    #[test]
    fn test_derive_hxres_star_is_truncated_sha256() {
        let rand = [0x01u8; 16];
        let res_star = [0x02u8; 16];

        let mut input = Vec::new();
        input.extend_from_slice(&rand);
        input.extend_from_slice(&res_star);
        let digest = Sha256::digest(&input);

        assert_eq!(derive_hxres_star(&rand, &res_star), &digest[16..32]);
    }

    #[test]
    fn test_encode_kdf_string_ascii_unchanged() {
        let s = "5G:mnc001.mcc001.3gppnetwork.org";
        assert_eq!(encode_kdf_string(s), s.as_bytes());
    }

    #[test]
    fn test_encode_kdf_string_nfkc_normalization() {
        // U+2126 (OHM SIGN) -> U+03A9 (GREEK CAPITAL LETTER OMEGA)
        assert_eq!(encode_kdf_string("\u{2126}"), "\u{03A9}".as_bytes());
        // U+FB01 (LATIN SMALL LIGATURE FI) -> "fi"
        assert_eq!(encode_kdf_string("\u{FB01}"), b"fi");
    }
}
