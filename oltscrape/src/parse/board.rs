//! `display board <frame>/<board> | include port`

use std::sync::LazyLock;

use regex::Regex;

use super::{ParseOutcome, WarningKind};
use crate::model::OpticalLinePort;

// In port 0/ 2/0 , the total of ONTs are:  33, online:  31
static PORT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"In port (\d+\s*/\s*\d+\s*/\s*\d+)\s*,\s*the total of ONTs are:\s*(\d+)\s*,\s*online:\s*(\d+)",
    )
    .unwrap()
});

/// Parse the per-port unit counts of a board.
///
/// Ports come back sorted by port number. Lines that do not mention a port
/// are ignored; a port line that does not fit the expected shape is
/// reported as a warning.
pub fn parse_board_ports(output: &str) -> ParseOutcome<OpticalLinePort> {
    let mut outcome = ParseOutcome::new();

    for (idx, raw) in output.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let Some(caps) = PORT_LINE.captures(line) else {
            if line.contains("In port") {
                outcome.skip(idx + 1, line, WarningKind::Malformed, "unrecognised port line");
            }
            continue;
        };

        let path: String = caps[1].split_whitespace().collect();
        let port_id = path.rsplit('/').next().unwrap_or_default().to_string();

        let (Ok(total), Ok(online)) = (caps[2].parse::<u32>(), caps[3].parse::<u32>()) else {
            outcome.skip(idx + 1, line, WarningKind::Malformed, "unit count out of range");
            continue;
        };

        outcome
            .records
            .push(OpticalLinePort::new(port_id, &path, total, online));
    }

    outcome.records.sort_by_key(|p| p.sort_key());
    outcome
}
