//! Subscriber units (ONTs) and their collections.

use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};

/// Receive differential below which a unit is flagged, in dB.
pub const CRITICAL_RX_DIFF: f64 = -5.0;

/// One provisioned subscriber unit on a PON port.
///
/// Built by [`UnitAssembler`](crate::assemble::UnitAssembler); the receive
/// differential is computed once from the two power readings.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriberUnit {
    id: String,
    board: String,
    port: String,
    ont_rx: Option<f64>,
    olt_rx: Option<f64>,
    rx_diff: Option<f64>,
    temperature: Option<i32>,
    distance: Option<u32>,
    state: String,
    last_down_cause: String,
    description: String,
}

impl SubscriberUnit {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: String,
        board: String,
        port: String,
        ont_rx: Option<f64>,
        olt_rx: Option<f64>,
        temperature: Option<i32>,
        distance: Option<u32>,
        state: String,
        last_down_cause: String,
        description: String,
    ) -> Self {
        let rx_diff = match (ont_rx, olt_rx) {
            (Some(ont), Some(olt)) => Some(((olt - ont) * 100.0).round_ties_even() / 100.0),
            _ => None,
        };

        Self {
            id,
            board,
            port,
            ont_rx,
            olt_rx,
            rx_diff,
            temperature,
            distance,
            state,
            last_down_cause,
            description,
        }
    }

    /// Unit id on the port.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Board the unit hangs off.
    pub fn board(&self) -> &str {
        &self.board
    }

    /// Port within the board.
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Receive power at the unit, dBm.
    pub fn ont_rx(&self) -> Option<f64> {
        self.ont_rx
    }

    /// Receive power at the OLT from this unit, dBm.
    pub fn olt_rx(&self) -> Option<f64> {
        self.olt_rx
    }

    /// `olt_rx - ont_rx` rounded to two decimals; set only when both exist.
    pub fn rx_diff(&self) -> Option<f64> {
        self.rx_diff
    }

    /// Temperature, degrees Celsius.
    pub fn temperature(&self) -> Option<i32> {
        self.temperature
    }

    /// Fibre distance, metres.
    pub fn distance(&self) -> Option<u32> {
        self.distance
    }

    /// Run state as printed by the device (e.g. "online").
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Last down cause; empty when the device shows none.
    pub fn last_down_cause(&self) -> &str {
        &self.last_down_cause
    }

    /// Free-text description, words joined with `_`.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the run state is `online`.
    pub fn is_online(&self) -> bool {
        self.state.eq_ignore_ascii_case("online")
    }

    /// Whether the receive differential is below -5.00 dB.
    pub fn has_critical_rx_diff(&self) -> bool {
        self.rx_diff.is_some_and(|diff| diff < CRITICAL_RX_DIFF)
    }
}

impl Serialize for SubscriberUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SubscriberUnit", 13)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("board", &self.board)?;
        state.serialize_field("port", &self.port)?;
        state.serialize_field("ont_rx", &self.ont_rx)?;
        state.serialize_field("olt_rx", &self.olt_rx)?;
        state.serialize_field("rx_diff", &self.rx_diff)?;
        state.serialize_field("temperature", &self.temperature)?;
        state.serialize_field("distance", &self.distance)?;
        state.serialize_field("state", &self.state)?;
        state.serialize_field("last_down_cause", &self.last_down_cause)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("is_online", &self.is_online())?;
        state.serialize_field("has_critical_rx_diff", &self.has_critical_rx_diff())?;
        state.end()
    }
}

/// Counts over a [`UnitCollection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UnitSummary {
    /// Units on the port.
    pub total: usize,
    /// Units in the `online` state.
    pub online: usize,
    /// Units whose rx differential is critical.
    pub critical: usize,
}

/// Ordered units of one port.
///
/// Counts are plain linear scans; there is no index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UnitCollection {
    units: Vec<SubscriberUnit>,
}

impl UnitCollection {
    /// An empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a unit.
    pub fn push(&mut self, unit: SubscriberUnit) {
        self.units.push(unit);
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the port has no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units in port order.
    pub fn iter(&self) -> std::slice::Iter<'_, SubscriberUnit> {
        self.units.iter()
    }

    /// The unit with id `id`.
    pub fn get(&self, id: &str) -> Option<&SubscriberUnit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Number of online units.
    pub fn online_count(&self) -> usize {
        self.units.iter().filter(|u| u.is_online()).count()
    }

    /// Number of units with a critical rx differential.
    pub fn critical_count(&self) -> usize {
        self.units.iter().filter(|u| u.has_critical_rx_diff()).count()
    }

    /// All counts at once.
    pub fn summary(&self) -> UnitSummary {
        UnitSummary {
            total: self.len(),
            online: self.online_count(),
            critical: self.critical_count(),
        }
    }

    /// The units as a plain vector.
    pub fn into_vec(self) -> Vec<SubscriberUnit> {
        self.units
    }
}

impl FromIterator<SubscriberUnit> for UnitCollection {
    fn from_iter<I: IntoIterator<Item = SubscriberUnit>>(iter: I) -> Self {
        Self {
            units: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for UnitCollection {
    type Item = SubscriberUnit;
    type IntoIter = std::vec::IntoIter<SubscriberUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.into_iter()
    }
}

impl<'a> IntoIterator for &'a UnitCollection {
    type Item = &'a SubscriberUnit;
    type IntoIter = std::slice::Iter<'a, SubscriberUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}
