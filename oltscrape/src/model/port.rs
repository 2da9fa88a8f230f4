//! PON port occupancy and board aggregates.

use std::fmt;

use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};

/// Health of a PON port by share of units online.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PortStatus {
    /// At least 70% of units online.
    Online,
    /// At least 30% of units online.
    Warning,
    /// Below 30%.
    Critical,
}

impl PortStatus {
    /// Classify an occupancy percentage.
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            70.. => PortStatus::Online,
            30.. => PortStatus::Warning,
            _ => PortStatus::Critical,
        }
    }

    /// Lowercase label, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            PortStatus::Online => "online",
            PortStatus::Warning => "warning",
            PortStatus::Critical => "critical",
        }
    }
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rounded share of `part` in `whole`, half to even, capped at 100.
///
/// Zero when `whole` is zero.
pub(crate) fn percentage(part: u32, whole: u32) -> u8 {
    if whole == 0 {
        return 0;
    }
    let share = (f64::from(part) / f64::from(whole) * 100.0).round_ties_even();
    share.clamp(0.0, 100.0) as u8
}

/// One PON port of a board with its unit counts.
///
/// Offline count, percentage and status are derived from the counts when
/// the port is built and cannot be set on their own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpticalLinePort {
    id: String,
    path: String,
    total_units: u32,
    online_units: u32,
    offline_units: u32,
    percentage: u8,
    status: PortStatus,
}

impl OpticalLinePort {
    /// Build a port from the counts the device reports.
    ///
    /// `path` is the `frame/board/port` text; whitespace is removed.
    pub fn new(id: impl Into<String>, path: &str, total_units: u32, online_units: u32) -> Self {
        let percentage = percentage(online_units, total_units);
        Self {
            id: id.into(),
            path: path.split_whitespace().collect(),
            total_units,
            online_units,
            offline_units: total_units.saturating_sub(online_units),
            percentage,
            status: PortStatus::from_percentage(percentage),
        }
    }

    /// Port number within the board.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Full `frame/board/port` path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Provisioned units on the port.
    pub fn total_units(&self) -> u32 {
        self.total_units
    }

    /// Units currently online.
    pub fn online_units(&self) -> u32 {
        self.online_units
    }

    /// Units not online.
    pub fn offline_units(&self) -> u32 {
        self.offline_units
    }

    /// Rounded share of units online, 0..=100.
    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    /// Status derived from [`percentage`](Self::percentage).
    pub fn status(&self) -> PortStatus {
        self.status
    }

    /// Whether the port is in the online band.
    pub fn is_healthy(&self) -> bool {
        self.status == PortStatus::Online
    }

    /// Whether the port is in the warning or critical band.
    pub fn needs_attention(&self) -> bool {
        !self.is_healthy()
    }

    pub(crate) fn sort_key(&self) -> u32 {
        self.id.parse().unwrap_or(u32::MAX)
    }
}

/// Aggregates over the ports of one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BoardStats {
    /// Ports on the board.
    pub total_ports: usize,
    /// Ports with [`PortStatus::Online`].
    pub online_ports: usize,
    /// Ports with [`PortStatus::Warning`].
    pub warning_ports: usize,
    /// Ports with [`PortStatus::Critical`].
    pub critical_ports: usize,
    /// Units across all ports.
    pub total_units: u32,
    /// Online units across all ports.
    pub online_units: u32,
    /// Offline units across all ports.
    pub offline_units: u32,
    /// Share of units online across the board.
    pub percentage: u8,
}

/// A GPON service board and its ports, ordered by port number.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    id: String,
    ports: Vec<OpticalLinePort>,
}

impl Board {
    /// Build a board; ports are sorted by numeric port id.
    pub fn new(id: impl Into<String>, mut ports: Vec<OpticalLinePort>) -> Self {
        ports.sort_by_key(OpticalLinePort::sort_key);
        Self {
            id: id.into(),
            ports,
        }
    }

    /// Board (slot) number.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ports sorted by numeric id.
    pub fn ports(&self) -> &[OpticalLinePort] {
        &self.ports
    }

    /// Look up a port by number.
    pub fn port(&self, id: &str) -> Option<&OpticalLinePort> {
        self.ports.iter().find(|p| p.id == id)
    }

    /// Compute the aggregates. Nothing is cached.
    pub fn stats(&self) -> BoardStats {
        let mut stats = BoardStats {
            total_ports: self.ports.len(),
            ..BoardStats::default()
        };

        for port in &self.ports {
            match port.status {
                PortStatus::Online => stats.online_ports += 1,
                PortStatus::Warning => stats.warning_ports += 1,
                PortStatus::Critical => stats.critical_ports += 1,
            }
            stats.total_units = stats.total_units.saturating_add(port.total_units);
            stats.online_units = stats.online_units.saturating_add(port.online_units);
        }

        stats.offline_units = stats.total_units.saturating_sub(stats.online_units);
        stats.percentage = percentage(stats.online_units, stats.total_units);
        stats
    }

    /// Ports below 30% online.
    pub fn critical_ports(&self) -> Vec<&OpticalLinePort> {
        self.with_status(PortStatus::Critical)
    }

    /// Ports between 30% and 70% online.
    pub fn warning_ports(&self) -> Vec<&OpticalLinePort> {
        self.with_status(PortStatus::Warning)
    }

    fn with_status(&self, status: PortStatus) -> Vec<&OpticalLinePort> {
        self.ports.iter().filter(|p| p.status == status).collect()
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Board", 3)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("ports", &self.ports)?;
        state.serialize_field("stats", &self.stats())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(id: &str, total: u32, online: u32) -> OpticalLinePort {
        OpticalLinePort::new(id, &format!("0/2/{id}"), total, online)
    }

    #[test]
    fn test_derived_fields() {
        let p = OpticalLinePort::new("0", "0/ 2/0", 33, 31);
        assert_eq!(p.path(), "0/2/0");
        assert_eq!(p.offline_units(), 2);
        assert_eq!(p.percentage(), 94);
        assert_eq!(p.status(), PortStatus::Online);
        assert!(p.is_healthy());
    }

    #[test]
    fn test_status_boundaries() {
        assert_eq!(port("0", 100, 29).status(), PortStatus::Critical);
        assert_eq!(port("0", 100, 30).status(), PortStatus::Warning);
        assert_eq!(port("0", 100, 69).status(), PortStatus::Warning);
        assert_eq!(port("0", 100, 70).status(), PortStatus::Online);
    }

    #[test]
    fn test_rounding_is_half_to_even() {
        // 1/8 = 12.5%, 3/8 = 37.5%
        assert_eq!(port("0", 8, 1).percentage(), 12);
        assert_eq!(port("0", 8, 3).percentage(), 38);
        // 2/3 = 66.67%
        assert_eq!(port("0", 3, 2).percentage(), 67);
    }

    #[test]
    fn test_empty_port() {
        let p = port("7", 0, 0);
        assert_eq!(p.percentage(), 0);
        assert_eq!(p.status(), PortStatus::Critical);
        assert!(p.needs_attention());
    }

    #[test]
    fn test_online_above_total_is_clamped() {
        let p = port("1", 10, 12);
        assert_eq!(p.offline_units(), 0);
        assert_eq!(p.percentage(), 100);
    }

    #[test]
    fn test_board_sorts_numerically_and_aggregates() {
        let board = Board::new(
            "2",
            vec![port("10", 10, 2), port("2", 10, 5), port("0", 10, 10)],
        );

        let ids: Vec<_> = board.ports().iter().map(|p| p.id()).collect();
        assert_eq!(ids, ["0", "2", "10"]);

        let stats = board.stats();
        assert_eq!(stats.total_ports, 3);
        assert_eq!(stats.online_ports, 1);
        assert_eq!(stats.warning_ports, 1);
        assert_eq!(stats.critical_ports, 1);
        assert_eq!(stats.total_units, 30);
        assert_eq!(stats.online_units, 17);
        assert_eq!(stats.offline_units, 13);
        assert_eq!(stats.percentage, 57);

        assert_eq!(board.critical_ports()[0].id(), "10");
        assert_eq!(board.warning_ports()[0].id(), "2");
    }

    #[test]
    fn test_board_serializes_stats() {
        let board = Board::new("2", vec![port("0", 4, 3)]);
        let json = serde_json::to_value(&board).unwrap();

        assert_eq!(json["id"], "2");
        assert_eq!(json["ports"][0]["status"], "online");
        assert_eq!(json["ports"][0]["percentage"], 75);
        assert_eq!(json["stats"]["total_units"], 4);
    }
}
