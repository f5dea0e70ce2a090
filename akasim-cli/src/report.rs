//! Renders the derivation trace for one authentication round.
//!
//! The output format is fixed: section banners, an 8-column label
//! gutter, values as lowercase hex without separators. The golden
//! regression test below pins the format byte-for-byte; any change
//! here must update it deliberately.

use std::fmt::Write;

use anyhow::Result;

use akasim_common::config::OpType;
use akasim_common::types::Imsi;
use akasim_crypto::aka::Aka;
use akasim_crypto::kdf::serving_network_name;
use akasim_crypto::milenage::Milenage;

/// Resolved inputs for one authentication round.
///
/// Byte fields stay as raw decoded hex; width validation happens in
/// the Milenage constructor so that length errors name the field.
pub struct RoundInputs {
    pub imsi: Imsi,
    pub k: Vec<u8>,
    pub op: Vec<u8>,
    pub op_type: OpType,
    pub sqn: u64,
    pub amf: u16,
    pub rand: Vec<u8>,
}

/// Runs the full derivation and renders the canonical trace.
pub fn render(inputs: &RoundInputs) -> Result<String> {
    let mut m = match inputs.op_type {
        OpType::Op => Milenage::new(&inputs.k, &inputs.op, &inputs.rand, inputs.sqn, inputs.amf)?,
        OpType::Opc => {
            Milenage::new_with_opc(&inputs.k, &inputs.op, &inputs.rand, inputs.sqn, inputs.amf)?
        }
    };
    let opc = m.opc();

    let mut out = String::new();
    writeln!(
        out,
        "IMSI     = {} {} {}",
        inputs.imsi.mcc(),
        inputs.imsi.mnc(),
        inputs.imsi.msin()
    )?;
    writeln!(out, "K        = {}", hex::encode(&inputs.k))?;
    writeln!(out, "OPc      = {}", hex::encode(opc))?;
    writeln!(out, "SQN      = {:x}", inputs.sqn)?;
    writeln!(out, "AMF      = {:x}", inputs.amf)?;
    writeln!(out, "RAND     = {}", hex::encode(&inputs.rand))?;
    writeln!(out)?;

    writeln!(out, "-------- MILENAGE ops @ UDM --------")?;
    let mac_a = m.f1();
    writeln!(out, "MAC-A    = {}", hex::encode(mac_a))?;
    let (res, ck, ik, ak) = m.f2345();
    writeln!(out, "CK       = {}", hex::encode(ck))?;
    writeln!(out, "IK       = {}", hex::encode(ik))?;
    writeln!(out, "AK       = {}", hex::encode(ak))?;
    writeln!(out, "xRES     = {}", hex::encode(res))?;
    let res_star = m.compute_res_star(inputs.imsi.mcc(), inputs.imsi.mnc())?;
    writeln!(out, "xRESStar = {}", hex::encode(res_star))?;
    let autn = m.generate_autn();
    writeln!(out, "AUTN     = {}", hex::encode(autn))?;

    let snn = serving_network_name(inputs.imsi.mcc(), inputs.imsi.mnc())?;
    let mut aka = Aka::new(m.snapshot()?, &snn, inputs.imsi.as_str())?;

    let kausf = aka.compute_kausf();
    writeln!(out, "KAUSF    = {}", hex::encode(kausf))?;
    writeln!(out)?;

    writeln!(out, "******** UDM -> AUSF: RAND, xRESStar, AUTN, KAUSF ********")?;
    writeln!(out)?;

    writeln!(out, "-------- 5G AKA ops @ AUSF --------")?;
    let hxres_star = aka.compute_hxres_star();
    writeln!(out, "HXRESStar= {}", hex::encode(hxres_star))?;
    writeln!(out)?;

    writeln!(out, "******** AUSF -> SEAF: RAND, HXRESStar, AUTN ********")?;
    writeln!(out)?;

    writeln!(out, "        The serving AMF sends the AKA challenge to the UE")?;
    writeln!(out, "        The UE sends the AKA response (RESStar) to the serving AMF")?;
    writeln!(out, "        The SEAF verifies HXRESStar matches")?;
    writeln!(out)?;

    writeln!(out, "-------- 5G AKA ops @ AUSF --------")?;
    let kseaf = aka.compute_kseaf();
    writeln!(out, "KSEAF    = {}", hex::encode(kseaf))?;
    writeln!(out)?;

    writeln!(out, "******** AUSF -> SEAF: SUPI, KSEAF ********")?;
    writeln!(out)?;

    writeln!(out, "-------- 5G AKA ops @ SEAF --------")?;
    let kamf = aka.compute_kamf();
    writeln!(out, "KAMF     = {}", hex::encode(kamf))?;

    Ok(out)
}
