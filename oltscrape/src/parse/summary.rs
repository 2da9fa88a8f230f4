//! `display ont info summary <port>`
//!
//! The output holds two tables keyed by unit id:
//!
//! ```text
//!   ONT  Run     Last                Last                Last
//!   ID   State   UpTime              DownTime            DownCause
//!   -----------------------------------------------------------------
//!   0    online  2024-02-20 10:11:12 2024-02-20 10:09:00 dying-gasp
//!   1    offline -                   2024-02-21 08:00:00 LOSi/LOBi
//!   -----------------------------------------------------------------
//!   ONT        SN        Type          Distance Rx/Tx power  Description
//!   ID                                    (m)      (dBm)
//!   -----------------------------------------------------------------
//!   0   48575443ABCDEF01 HG8245H       1800     -21.36/2.10  CASA 12 NORTE
//!   1   48575443ABCDEF02 HG8245H       -        -/-          LOCAL 3
//! ```

use indexmap::IndexMap;
use log::debug;

use super::{ParseOutcome, WarningKind, is_numeric};

/// Status and description of one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    /// Unit id within the port.
    pub id: String,
    /// Run state (`online`, `offline`).
    pub state: String,
    /// Empty when the last column is `-` or the row is short.
    pub last_down_cause: String,
    /// Description words joined with `_`; empty when none.
    pub description: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Status,
    Description,
}

/// Parse both summary tables into rows, in status-table order.
///
/// The last down cause is taken from the final column only when a row has
/// more than four columns and that column is not `-`. Description rows for
/// ids missing from the status table are ignored.
pub fn parse_unit_summary(output: &str) -> ParseOutcome<SummaryRow> {
    let mut outcome = ParseOutcome::new();
    let mut rows: IndexMap<String, SummaryRow> = IndexMap::new();
    let mut section = Section::Preamble;

    for (idx, raw) in output.lines().enumerate() {
        let line = raw.trim();

        if line.is_empty() || line.starts_with('-') {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        // data rows start with the unit id; descriptions are free text
        if !is_numeric(tokens[0]) {
            if line.contains("Run") && line.contains("Last") {
                section = Section::Status;
            } else if line.contains("SN") && line.contains("Type") {
                section = Section::Description;
            }
            continue;
        }

        match section {
            Section::Preamble => {}
            Section::Status => {
                if tokens.len() < 2 {
                    outcome.skip(idx + 1, line, WarningKind::MissingField, "no run state");
                    continue;
                }

                let last = tokens[tokens.len() - 1];
                let last_down_cause = if tokens.len() > 4 && last != "-" {
                    last.to_string()
                } else {
                    String::new()
                };

                rows.insert(
                    tokens[0].to_string(),
                    SummaryRow {
                        id: tokens[0].to_string(),
                        state: tokens[1].to_string(),
                        last_down_cause,
                        description: String::new(),
                    },
                );
            }
            Section::Description => {
                let Some(row) = rows.get_mut(tokens[0]) else {
                    debug!("description for unknown unit {} ignored", tokens[0]);
                    continue;
                };

                // the Rx/Tx power column ("-21.36/2.10" or "-/-") precedes it
                if let Some(boundary) = tokens.iter().position(|t| t.contains('/') && t.contains('-')) {
                    let words = &tokens[boundary + 1..];
                    if !words.is_empty() {
                        row.description = words.join("_");
                    }
                }
            }
        }
    }

    outcome.records = rows.into_values().collect();
    outcome
}
