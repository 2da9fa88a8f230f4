//! `display ont optical-info <port> all`

use std::str::FromStr;

use super::{ParseOutcome, WarningKind, is_numeric};

/// Optical readings of one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct OpticalReading {
    /// Unit id within the port.
    pub id: String,
    /// Receive power at the unit, dBm.
    pub ont_rx: f64,
    /// Receive power at the OLT, dBm.
    pub olt_rx: f64,
    /// Unit temperature, °C.
    pub temperature: i32,
    /// Fibre distance, metres.
    pub distance: u32,
}

const ONT_RX: usize = 1;
const OLT_RX: usize = 3;
const TEMPERATURE: usize = 4;
const DISTANCE: usize = 6;

/// Parse optical readings by fixed column position.
///
/// Only rows starting with a unit id are considered. A row with a missing
/// column or a value that does not convert is skipped with a warning.
pub fn parse_unit_optical(output: &str) -> ParseOutcome<OpticalReading> {
    let mut outcome = ParseOutcome::new();

    for (idx, raw) in output.lines().enumerate() {
        let line = raw.trim();
        let tokens: Vec<&str> = line.split_whitespace().collect();

        match tokens.first() {
            Some(first) if is_numeric(first) => {}
            _ => continue,
        }

        match reading(&tokens) {
            Ok(reading) => outcome.records.push(reading),
            Err((kind, detail)) => outcome.skip(idx + 1, line, kind, detail),
        }
    }

    outcome
}

fn reading(tokens: &[&str]) -> Result<OpticalReading, (WarningKind, String)> {
    Ok(OpticalReading {
        id: tokens[0].to_string(),
        ont_rx: column(tokens, ONT_RX, "ONT rx power")?,
        olt_rx: column(tokens, OLT_RX, "OLT rx power")?,
        temperature: column(tokens, TEMPERATURE, "temperature")?,
        distance: column(tokens, DISTANCE, "distance")?,
    })
}

fn column<T: FromStr>(tokens: &[&str], pos: usize, name: &str) -> Result<T, (WarningKind, String)> {
    let raw = tokens
        .get(pos)
        .ok_or_else(|| (WarningKind::MissingField, format!("no {name} column")))?;
    raw.parse()
        .map_err(|_| (WarningKind::Malformed, format!("{name} {raw:?} is not a number")))
}
