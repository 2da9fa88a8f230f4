//! `display ont autofind all`
//!
//! One block per discovered unit, separated by dashed lines:
//!
//! ```text
//!   ----------------------------------------------------------------------------
//!   Number              : 1
//!   F/S/P               : 0/2/1
//!   Ont NNI type        : 2.5G/1.25G
//!   Ont SN              : 4750544600D35288 (GPTF-00D35288)
//!   Password            : 0x00000000000000000000
//!   Loid                :
//!   VendorID            : GPTF
//!   Ont Version         : V1.0
//!   Ont SoftwareVersion : V3.2.10
//!   Ont EquipmentID     : GP1702-1G
//!   Ont autofind time   : 2024-03-01 10:11:12+08:00
//!   ----------------------------------------------------------------------------
//! ```

use log::debug;
use secrecy::SecretString;

use super::{ParseOutcome, WarningKind};
use crate::model::{AutofindCandidate, PonType};

/// Shortest run of dashes treated as a block separator.
const MIN_SEPARATOR: usize = 10;

#[derive(Default)]
struct Fields {
    number: Option<String>,
    fsp: Option<String>,
    nni_type: Option<String>,
    serial: Option<String>,
    vendor_id: Option<String>,
    ont_version: Option<String>,
    software_version: Option<String>,
    equipment_id: Option<String>,
    autofind_time: Option<String>,
    password: Option<String>,
    loid: Option<String>,
}

impl Fields {
    /// Store a value under its normalized key; false if the key is unknown.
    fn set(&mut self, key: &str, value: String) -> bool {
        let slot = match key {
            "number" => &mut self.number,
            "f/s/p" => &mut self.fsp,
            "ont nni type" => &mut self.nni_type,
            "ont sn" => &mut self.serial,
            "vendorid" => &mut self.vendor_id,
            "ont version" => &mut self.ont_version,
            "ont softwareversion" => &mut self.software_version,
            "ont equipmentid" => &mut self.equipment_id,
            "ont autofind time" => &mut self.autofind_time,
            "password" => &mut self.password,
            "loid" => &mut self.loid,
            _ => return false,
        };
        if !value.is_empty() {
            *slot = Some(value);
        }
        true
    }
}

/// Parse the autofind table.
///
/// A block becomes a candidate only when it carries a number, an F/S/P and
/// a serial; other blocks with recognised keys are dropped with a
/// `MissingField` warning. Blocks with no recognised keys (headers,
/// trailers) are skipped quietly.
pub fn parse_autofind(output: &str) -> ParseOutcome<AutofindCandidate> {
    let mut outcome = ParseOutcome::new();
    let mut block: Vec<(usize, &str)> = Vec::new();

    for (idx, raw) in output.lines().enumerate() {
        let line = raw.trim();
        if is_separator(line) {
            flush(&mut block, &mut outcome);
        } else if !line.is_empty() {
            block.push((idx + 1, line));
        }
    }
    flush(&mut block, &mut outcome);

    outcome
}

fn is_separator(line: &str) -> bool {
    line.len() >= MIN_SEPARATOR && line.bytes().all(|b| b == b'-')
}

fn flush(block: &mut Vec<(usize, &str)>, outcome: &mut ParseOutcome<AutofindCandidate>) {
    let Some(&(first_line, first_text)) = block.first() else {
        return;
    };

    let mut fields = Fields::default();
    let mut recognised = false;

    for (_, line) in block.drain(..) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        recognised |= fields.set(&normalize_key(key), value.trim().to_string());
    }

    if !recognised {
        debug!("ignoring autofind block at line {first_line}");
        return;
    }

    match candidate(fields) {
        Ok(candidate) => outcome.records.push(candidate),
        Err(missing) => outcome.skip(
            first_line,
            first_text,
            WarningKind::MissingField,
            format!("autofind block without {missing}"),
        ),
    }
}

fn normalize_key(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn candidate(fields: Fields) -> Result<AutofindCandidate, &'static str> {
    let number = fields.number.ok_or("Number")?;
    let fsp = fields.fsp.ok_or("F/S/P")?;
    let (serial_hex, serial) = fields.serial.as_deref().map(split_serial).ok_or("Ont SN")?;

    let (frame, board, port) = match fsp.split('/').map(str::trim).collect::<Vec<_>>()[..] {
        [frame, board, port] => (frame.to_string(), board.to_string(), port.to_string()),
        _ => ("0".to_string(), "0".to_string(), "0".to_string()),
    };

    let pon_type = fields
        .nni_type
        .as_deref()
        .map(PonType::from_nni)
        .unwrap_or_default();

    let equipment_type = fields
        .equipment_id
        .clone()
        .unwrap_or_else(|| "Unknown".to_string());

    Ok(AutofindCandidate {
        number,
        fsp,
        frame,
        board,
        port,
        nni_type: fields.nni_type,
        pon_type,
        serial_hex,
        serial,
        vendor_id: fields.vendor_id.unwrap_or_else(|| "Unknown".to_string()),
        ont_version: fields.ont_version,
        software_version: fields.software_version,
        equipment_id: fields.equipment_id,
        equipment_type,
        autofind_time: fields.autofind_time,
        password: fields.password.map(SecretString::from),
        loid: fields.loid,
    })
}

/// `4750544600D35288 (GPTF-00D35288)` into hex and vendor forms.
fn split_serial(value: &str) -> (String, String) {
    let Some((hex, rest)) = value.split_once('(') else {
        return (value.to_string(), value.to_string());
    };

    let human = match rest.split_once(')') {
        Some((human, _)) => human.trim(),
        None => value,
    };
    (hex.trim().to_string(), human.to_string())
}
