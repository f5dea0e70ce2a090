//! Cryptographic core of 5G Authentication and Key Agreement
//!
//! Implements the derivation chain for one authentication round:
//! - Milenage function set f1, f1*, f2-f5, f5* (authentication vector)
//! - AUTN / AUTS token construction
//! - RES* and the TS 33.501 key hierarchy (KAUSF, KSEAF, KAMF, HXRES*)

pub mod aes;
pub mod aka;
pub mod kdf;
pub mod milenage;
