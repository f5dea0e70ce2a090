//! akasim driver
//!
//! Runs one full 5G-AKA round from subscriber credentials and prints
//! the derivation trace: the MILENAGE vector produced at the UDM, then
//! the KAUSF / HXRES* / KSEAF / KAMF hand-offs across AUSF and SEAF.
//!
//! # Usage
//!
//! ```bash
//! akasim
//! akasim --imsi 001010123456789 --k 00112233445566778899aabbccddeeff
//! akasim --config subscriber.yaml --sqn 000000000002
//! ```

mod report;

use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::debug;

use akasim_common::config::{OpType, SubscriberConfig};
use akasim_common::logging::{init_logging, LogLevel};
use akasim_common::types::Imsi;

use report::RoundInputs;

const DEFAULT_IMSI: &str = "001010123456789";
const DEFAULT_K: &str = "00112233445566778899aabbccddeeff";
const DEFAULT_OP: &str = "00112233445566778899aabbccddeeff";
const DEFAULT_SQN: &str = "000000000001";
const DEFAULT_AMF: &str = "8000";
const DEFAULT_RAND: &str = "00112233445566778899aabbccddeeff";

/// akasim - 5G-AKA derivation trace generator
#[derive(Parser, Debug)]
#[command(name = "akasim")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// IMSI: 15 decimal digits (3 MCC, 2 MNC, 10 MSIN)
    #[arg(long = "imsi", value_name = "IMSI")]
    imsi: Option<String>,

    /// Subscriber key K as hex
    #[arg(long = "k", value_name = "HEX")]
    k: Option<String>,

    /// Operator variant field OP as hex
    #[arg(long = "op", value_name = "HEX")]
    op: Option<String>,

    /// Sequence number SQN as hex
    #[arg(long = "sqn", value_name = "HEX")]
    sqn: Option<String>,

    /// Authentication management field AMF as hex
    #[arg(long = "amf", value_name = "HEX")]
    amf: Option<String>,

    /// Random challenge RAND as hex
    #[arg(long = "rand", value_name = "HEX")]
    rand: Option<String>,

    /// Subscriber configuration file (YAML); flags override its values
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config_file: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let level = args.log_level.parse::<LogLevel>().map_err(|e| anyhow!(e))?;
    init_logging(level);

    let inputs = resolve_inputs(&args)?;
    debug!(imsi = %inputs.imsi, sqn = inputs.sqn, "running one authentication round");

    let trace = report::render(&inputs)?;
    print!("{trace}");
    Ok(())
}

/// Merges flags over the optional config file, falling back to the
/// built-in demonstration defaults.
fn resolve_inputs(args: &Args) -> Result<RoundInputs> {
    let config = match &args.config_file {
        Some(path) => {
            let config = SubscriberConfig::from_yaml_file(path)
                .with_context(|| format!("failed to load configuration file: {path}"))?;
            config.validate().context("invalid configuration")?;
            Some(config)
        }
        None => None,
    };

    let imsi_digits = args
        .imsi
        .as_deref()
        .or_else(|| {
            config
                .as_ref()
                .and_then(|c| c.supi.as_ref().map(Imsi::as_str))
        })
        .unwrap_or(DEFAULT_IMSI);
    let imsi = Imsi::parse(imsi_digits)?;

    let k = match (&args.k, &config) {
        (Some(hex_str), _) => decode_hex("K", hex_str)?,
        (None, Some(config)) => config.key.to_vec(),
        (None, None) => decode_hex("K", DEFAULT_K)?,
    };

    let (op, op_type) = match (&args.op, &config) {
        (Some(hex_str), _) => (decode_hex("OP", hex_str)?, OpType::Op),
        (None, Some(config)) => (config.op.to_vec(), config.op_type),
        (None, None) => (decode_hex("OP", DEFAULT_OP)?, OpType::Op),
    };

    let sqn = match (&args.sqn, &config) {
        (Some(s), _) => parse_hex_u64("SQN", s)?,
        (None, Some(config)) => config.sqn,
        (None, None) => parse_hex_u64("SQN", DEFAULT_SQN)?,
    };

    let amf = match (&args.amf, &config) {
        (Some(s), _) => parse_hex_u16("AMF", s)?,
        (None, Some(config)) => u16::from_be_bytes(config.amf),
        (None, None) => parse_hex_u16("AMF", DEFAULT_AMF)?,
    };

    let rand = decode_hex("RAND", args.rand.as_deref().unwrap_or(DEFAULT_RAND))?;

    Ok(RoundInputs {
        imsi,
        k,
        op,
        op_type,
        sqn,
        amf,
        rand,
    })
}

fn decode_hex(field: &str, s: &str) -> Result<Vec<u8>> {
    hex::decode(s).with_context(|| format!("invalid {field} \"{s}\""))
}

fn parse_hex_u64(field: &str, s: &str) -> Result<u64> {
    u64::from_str_radix(s, 16).with_context(|| format!("invalid {field} \"{s}\""))
}

fn parse_hex_u16(field: &str, s: &str) -> Result<u16> {
    u16::from_str_radix(s, 16).with_context(|| format!("invalid {field} \"{s}\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_args() -> Args {
        Args {
            imsi: None,
            k: None,
            op: None,
            sqn: None,
            amf: None,
            rand: None,
            config_file: None,
            log_level: "info".to_string(),
        }
    }

    #[test]
    fn test_defaults_resolve() {
        let inputs = resolve_inputs(&empty_args()).unwrap();
        assert_eq!(inputs.imsi.as_str(), DEFAULT_IMSI);
        assert_eq!(hex::encode(&inputs.k), DEFAULT_K);
        assert_eq!(hex::encode(&inputs.op), DEFAULT_OP);
        assert_eq!(inputs.op_type, OpType::Op);
        assert_eq!(inputs.sqn, 1);
        assert_eq!(inputs.amf, 0x8000);
    }

    #[test]
    fn test_flags_override_defaults() {
        let mut args = empty_args();
        args.sqn = Some("2a".to_string());
        args.amf = Some("b9b9".to_string());
        args.imsi = Some("310410123456789".to_string());

        let inputs = resolve_inputs(&args).unwrap();
        assert_eq!(inputs.sqn, 0x2a);
        assert_eq!(inputs.amf, 0xb9b9);
        assert_eq!(inputs.imsi.mcc(), "310");
    }

    #[test]
    fn test_rejects_bad_hex() {
        let mut args = empty_args();
        args.k = Some("zz".to_string());
        assert!(resolve_inputs(&args).is_err());

        let mut args = empty_args();
        args.sqn = Some("not-hex".to_string());
        assert!(resolve_inputs(&args).is_err());
    }

    #[test]
    fn test_rejects_bad_imsi() {
        let mut args = empty_args();
        args.imsi = Some("123".to_string());
        assert!(resolve_inputs(&args).is_err());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let mut args = empty_args();
        args.config_file = Some("/nonexistent/subscriber.yaml".to_string());
        assert!(resolve_inputs(&args).is_err());
    }
}
