//! Query orchestrators: one per report.
//!
//! Each query sequences the context transitions, commands and parsers for
//! one report over a [`SessionContext`]. [`OltClient`] offers the same
//! queries on a handle that can be shared between tasks.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::Mutex;

use crate::assemble::UnitAssembler;
use crate::channel::ExecOptions;
use crate::error::{QueryError, Result, SessionError};
use crate::model::{AutofindCandidate, Board, UnitCollection};
use crate::parse::{parse_autofind, parse_board_ports, parse_unit_optical, parse_unit_summary};
use crate::session::{CliContext, Response, SessionContext};
use crate::transport::Connector;

/// Options for the board table, which the device is slow to produce.
pub const BOARD_QUERY_OPTIONS: ExecOptions = ExecOptions {
    timeout: Duration::from_secs(30),
    delay_factor: 2.0,
};

/// Board and port ids are decimal numbers; anything else never reaches the CLI.
fn validate_id(kind: &'static str, value: &str) -> Result<()> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(QueryError::InvalidIdentifier {
            kind,
            value: value.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Whether a failed response only says there is nothing to show.
fn reports_absence(response: &Response) -> bool {
    response.failure_message.as_deref() == Some("Failure:") && response.contains("not exist")
}

/// Output text of a response, empty when the device reports nothing there.
fn output_or_empty(response: Response) -> Result<String> {
    if reports_absence(&response) {
        debug!("{:?}: nothing to report", response.command);
        return Ok(String::new());
    }
    Ok(response.into_result()?.result)
}

/// Port occupancy of one board.
pub async fn query_ports<C: Connector>(
    session: &mut SessionContext<C>,
    board: &str,
) -> Result<Board> {
    validate_id("board", board)?;

    let command = format!("display board {}/{} | include port", session.dialect().frame, board);
    let response = session
        .execute_global_command_with(&command, &BOARD_QUERY_OPTIONS)
        .await?
        .into_result()?;

    let outcome = parse_board_ports(&response.result);
    info!(
        "board {}: {} ports ({} lines skipped)",
        board,
        outcome.records.len(),
        outcome.warnings.len()
    );

    Ok(Board::new(board, outcome.records))
}

/// Subscriber units of one port.
///
/// Runs inside the board interface and leaves it afterwards, also when a
/// command failed. If the exit cannot be confirmed the connection is
/// dropped so the next query starts from a known prompt.
pub async fn query_units<C: Connector>(
    session: &mut SessionContext<C>,
    board: &str,
    port: &str,
) -> Result<UnitCollection> {
    validate_id("board", board)?;
    validate_id("port", port)?;

    session.enter_interface(board).await?;
    let result = units_in_interface(session, board, port).await;

    if let Err(e) = session.exit_interface().await {
        warn!("leaving interface {} failed, dropping connection: {}", board, e);
        session.invalidate();
    }

    let (units, skipped) = result?;
    info!(
        "port {}/{}: {} units ({} lines skipped), context now {}",
        board,
        port,
        units.len(),
        skipped,
        session.context()
    );
    Ok(units)
}

/// Assembled units and the number of rows the parsers skipped.
async fn units_in_interface<C: Connector>(
    session: &mut SessionContext<C>,
    board: &str,
    port: &str,
) -> Result<(UnitCollection, usize)> {
    let optical = session
        .execute_in_context(&format!("display ont optical-info {port} all"))
        .await?;
    let optical = output_or_empty(optical)?;

    let summary = session
        .execute_in_context(&format!("display ont info summary {port}"))
        .await?;
    let summary = output_or_empty(summary)?;

    let summary = parse_unit_summary(&summary);
    let optical = parse_unit_optical(&optical);
    let skipped = summary.warnings.len() + optical.warnings.len();

    let mut assembler = UnitAssembler::new(board, port);
    assembler
        .add_summary(summary.records)
        .apply_optical(&optical.records);
    Ok((assembler.finish(), skipped))
}

/// Units the OLT discovered but that are not provisioned.
pub async fn query_autofind<C: Connector>(
    session: &mut SessionContext<C>,
) -> Result<Vec<AutofindCandidate>> {
    let response = session
        .execute_global_command("display ont autofind all")
        .await?;
    let output = output_or_empty(response)?;

    let outcome = parse_autofind(&output);
    info!(
        "autofind: {} candidates ({} blocks dropped)",
        outcome.records.len(),
        outcome.warnings.len()
    );
    Ok(outcome.records)
}

/// Shared handle running whole queries one at a time on one session.
///
/// Each query holds the session lock from its first transition to its
/// last parse, so queries from different tasks never interleave on the
/// device.
///
/// # Example
///
/// ```rust,no_run
/// use oltscrape::{OltClient, SessionBuilder};
///
/// # async fn example() -> Result<(), oltscrape::Error> {
/// let session = SessionBuilder::from_env()?.build()?;
/// let client = OltClient::new(session);
///
/// let board = client.ports("2").await?;
/// for port in board.ports() {
///     println!("{} {}% {}", port.path(), port.percentage(), port.status());
/// }
/// # Ok(())
/// # }
/// ```
pub struct OltClient<C: Connector> {
    session: Arc<Mutex<SessionContext<C>>>,
    deadline: Option<Duration>,
}

impl<C: Connector> Clone for OltClient<C> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            deadline: self.deadline,
        }
    }
}

impl<C: Connector> OltClient<C> {
    /// Wrap `session`; queries have no deadline.
    pub fn new(session: SessionContext<C>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            deadline: None,
        }
    }

    /// Bound every query, lock wait excluded, by `deadline`.
    ///
    /// A query that runs out of time leaves the device mid-command, so the
    /// session is dropped and reconnects on the next query.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// See [`query_ports`].
    pub async fn ports(&self, board: &str) -> Result<Board> {
        let mut session = self.session.lock().await;
        let outcome = within(self.deadline, query_ports(&mut *session, board)).await;
        settle(&mut *session, outcome)
    }

    /// See [`query_units`].
    pub async fn units(&self, board: &str, port: &str) -> Result<UnitCollection> {
        let mut session = self.session.lock().await;
        let outcome = within(self.deadline, query_units(&mut *session, board, port)).await;
        settle(&mut *session, outcome)
    }

    /// See [`query_autofind`].
    pub async fn autofind(&self) -> Result<Vec<AutofindCandidate>> {
        let mut session = self.session.lock().await;
        let outcome = within(self.deadline, query_autofind(&mut *session)).await;
        settle(&mut *session, outcome)
    }

    /// Current tracked context of the shared session.
    pub async fn context(&self) -> CliContext {
        self.session.lock().await.context().clone()
    }

    /// Close the shared session.
    pub async fn disconnect(&self) -> Result<()> {
        self.session.lock().await.disconnect().await
    }
}

/// Run `query`, reporting the deadline if it expired first.
async fn within<T>(
    deadline: Option<Duration>,
    query: impl Future<Output = Result<T>>,
) -> std::result::Result<Result<T>, Duration> {
    match deadline {
        None => Ok(query.await),
        Some(limit) => tokio::time::timeout(limit, query).await.map_err(|_| limit),
    }
}

fn settle<C: Connector, T>(
    session: &mut SessionContext<C>,
    outcome: std::result::Result<Result<T>, Duration>,
) -> Result<T> {
    outcome.unwrap_or_else(|limit| {
        warn!("query exceeded {:?}, dropping connection", limit);
        session.invalidate();
        Err(SessionError::DeadlineExceeded(limit).into())
    })
}
