//! Merge summary and optical rows into subscriber units.
//!
//! Assembly is two-phase. Drafts are collected and patched while the
//! parser outputs are applied, then [`UnitAssembler::finish`] freezes each
//! draft into a [`SubscriberUnit`] and computes the derived fields once.

use indexmap::IndexMap;
use log::{debug, warn};

use crate::model::{SubscriberUnit, UnitCollection};
use crate::parse::{OpticalReading, SummaryRow};

/// Mutable unit record used while assembling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitDraft {
    /// Unit id within the port.
    pub id: String,
    /// Run state from the status table.
    pub state: String,
    /// Empty when none was reported.
    pub last_down_cause: String,
    /// Description words joined with `_`.
    pub description: String,
    /// Receive power at the unit, dBm.
    pub ont_rx: Option<f64>,
    /// Receive power at the OLT, dBm.
    pub olt_rx: Option<f64>,
    /// Unit temperature, °C.
    pub temperature: Option<i32>,
    /// Fibre distance, metres.
    pub distance: Option<u32>,
}

impl UnitDraft {
    fn from_summary(row: SummaryRow) -> Self {
        Self {
            id: row.id,
            state: row.state,
            last_down_cause: row.last_down_cause,
            description: row.description,
            ..Self::default()
        }
    }

    fn apply_optical(&mut self, reading: &OpticalReading) {
        self.ont_rx = Some(reading.ont_rx);
        self.olt_rx = Some(reading.olt_rx);
        self.temperature = Some(reading.temperature);
        self.distance = Some(reading.distance);
    }
}

/// Builds the units of one board port.
///
/// Summary rows create drafts; optical readings only patch drafts that
/// already exist. Insertion order is kept.
#[derive(Debug)]
pub struct UnitAssembler {
    board: String,
    port: String,
    drafts: IndexMap<String, UnitDraft>,
}

impl UnitAssembler {
    /// Empty assembler for the units of `board`/`port`.
    pub fn new(board: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            board: board.into(),
            port: port.into(),
            drafts: IndexMap::new(),
        }
    }

    /// Create (or replace) drafts from summary rows.
    pub fn add_summary(&mut self, rows: impl IntoIterator<Item = SummaryRow>) -> &mut Self {
        for row in rows {
            self.drafts.insert(row.id.clone(), UnitDraft::from_summary(row));
        }
        self
    }

    /// Patch existing drafts with optical readings.
    pub fn apply_optical<'a>(
        &mut self,
        readings: impl IntoIterator<Item = &'a OpticalReading>,
    ) -> &mut Self {
        for reading in readings {
            match self.drafts.get_mut(&reading.id) {
                Some(draft) => draft.apply_optical(reading),
                None => debug!("optical reading for unknown unit {} ignored", reading.id),
            }
        }
        self
    }

    /// Drafts collected so far, in order.
    pub fn drafts(&self) -> impl Iterator<Item = &UnitDraft> {
        self.drafts.values()
    }

    /// Number of drafts.
    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    /// Whether no draft was added.
    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Freeze every draft into a unit.
    ///
    /// A draft without a run state is dropped with a warning.
    pub fn finish(self) -> UnitCollection {
        let board = self.board;
        let port = self.port;

        self.drafts
            .into_values()
            .filter(|draft| {
                if draft.state.is_empty() {
                    warn!("unit {} on {}/{} has no run state, dropped", draft.id, board, port);
                    return false;
                }
                true
            })
            .map(|draft| {
                SubscriberUnit::new(
                    draft.id,
                    board.clone(),
                    port.clone(),
                    draft.ont_rx,
                    draft.olt_rx,
                    draft.temperature,
                    draft.distance,
                    draft.state,
                    draft.last_down_cause,
                    draft.description,
                )
            })
            .collect()
    }
}
