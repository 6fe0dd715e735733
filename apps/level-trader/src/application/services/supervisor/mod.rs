//! Reconnection Supervisor
//!
//! Drives the trading session until the session is over, the market is closed,
//! shutdown is requested or a fatal error occurs. Recoverable failures tear the
//! connection down and the next cycle establishes it again; session and
//! instrument state survive.

mod reconnect;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    InstructionSourcePort, MarketCalendarPort, VenueError, VenuePort,
};
use crate::application::services::trading_session::{IterationOutcome, TradingSession};
use crate::error::{ErrorKind, TraderError};

pub use reconnect::ReconnectPause;

/// Account selector meaning "the first managed account".
pub const FIRST_MANAGED_ACCOUNT: &str = "0";

/// Failure handling of the supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorPolicy {
    /// Escalate the first recoverable failure.
    pub fail_fast: bool,
    /// Recoverable failures tolerated before giving up.
    pub max_recoverable_failures: u32,
    /// Log the managed accounts on every connection.
    pub log_accounts: bool,
    /// Bound on a single connection attempt.
    pub connect_timeout: Duration,
}

impl Default for SupervisorPolicy {
    fn default() -> Self {
        Self {
            fail_fast: false,
            max_recoverable_failures: 100,
            log_accounts: false,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// How a supervised run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorExit {
    /// The session reached DONE.
    SessionDone,
    /// The venue does not trade today.
    MarketClosed,
}

/// Pick the account to trade from the venue's managed accounts.
///
/// # Errors
///
/// Returns `AccountNotManaged` if `configured` is not managed, or if nothing
/// is managed at all.
pub fn select_account(configured: &str, managed: &[String]) -> Result<String, TraderError> {
    let selected = if configured == FIRST_MANAGED_ACCOUNT {
        managed.first()
    } else {
        managed.iter().find(|account| *account == configured)
    };
    selected.cloned().ok_or_else(|| TraderError::AccountNotManaged {
        account: configured.to_string(),
        managed: managed.to_vec(),
    })
}

/// Supervises one trading session over a venue connection.
pub struct Supervisor<V: ?Sized, C: ?Sized, I: ?Sized> {
    venue: Arc<V>,
    session: TradingSession<V, C, I>,
    policy: SupervisorPolicy,
    pause: ReconnectPause,
    account: String,
    established: bool,
    failures: u32,
}

impl<V, C, I> Supervisor<V, C, I>
where
    V: VenuePort + ?Sized,
    C: MarketCalendarPort + ?Sized,
    I: InstructionSourcePort + ?Sized,
{
    /// Create a supervisor trading `account` (`"0"` for the first managed one).
    #[must_use]
    pub fn new(
        venue: Arc<V>,
        session: TradingSession<V, C, I>,
        policy: SupervisorPolicy,
        pause: ReconnectPause,
        account: impl Into<String>,
    ) -> Self {
        Self {
            venue,
            session,
            policy,
            pause,
            account: account.into(),
            established: false,
            failures: 0,
        }
    }

    /// The supervised session.
    #[must_use]
    pub const fn session(&self) -> &TradingSession<V, C, I> {
        &self.session
    }

    /// Recoverable failures seen so far.
    #[must_use]
    pub const fn failures(&self) -> u32 {
        self.failures
    }

    /// Run until the session ends.
    ///
    /// The venue is disconnected on every exit path.
    ///
    /// # Errors
    ///
    /// Returns `Interrupted` on shutdown, or the fatal error that ended the run.
    pub async fn run(
        &mut self,
        shutdown: CancellationToken,
    ) -> Result<SupervisorExit, TraderError> {
        let result = self.drive(&shutdown).await;
        self.venue.disconnect().await;
        self.established = false;

        match &result {
            Ok(exit) => tracing::info!(exit = ?exit, failures = self.failures, "Supervisor finished"),
            Err(e) if e.kind() == ErrorKind::Shutdown => {
                tracing::warn!("Shutdown requested, disconnected");
            }
            Err(e) => tracing::error!(kind = %e.kind(), error = %e, "Supervisor stopped"),
        }
        result
    }

    async fn drive(&mut self, shutdown: &CancellationToken) -> Result<SupervisorExit, TraderError> {
        loop {
            let error = match self.cycle(shutdown).await {
                Ok(IterationOutcome::Continue) => continue,
                Ok(IterationOutcome::SessionDone) => return Ok(SupervisorExit::SessionDone),
                Ok(IterationOutcome::MarketClosed) => return Ok(SupervisorExit::MarketClosed),
                Err(e) => e,
            };

            match error.kind() {
                ErrorKind::Shutdown | ErrorKind::Fatal => return Err(error),
                ErrorKind::Recoverable => {
                    self.failures = self.failures.saturating_add(1);
                    tracing::warn!(
                        failures = self.failures,
                        max = self.policy.max_recoverable_failures,
                        error = %error,
                        "Recoverable failure"
                    );
                    if self.policy.fail_fast
                        || self.failures > self.policy.max_recoverable_failures
                    {
                        return Err(TraderError::RetryBudgetExhausted {
                            failures: self.failures,
                            last: error.to_string(),
                        });
                    }
                    self.recover(shutdown).await?;
                }
            }
        }
    }

    async fn cycle(&mut self, shutdown: &CancellationToken) -> Result<IterationOutcome, TraderError> {
        if shutdown.is_cancelled() {
            return Err(TraderError::Interrupted);
        }
        if !self.established {
            self.establish().await?;
        }
        self.session.iterate(shutdown).await
    }

    async fn establish(&mut self) -> Result<(), TraderError> {
        tracing::info!(account = %self.account, "Connecting to venue");
        tokio::time::timeout(self.policy.connect_timeout, self.venue.connect())
            .await
            .map_err(|_| VenueError::Timeout {
                operation: "connect".to_string(),
            })??;

        let managed = self.venue.managed_accounts().await?;
        if self.policy.log_accounts {
            tracing::info!(accounts = ?managed, "Managed accounts");
        }
        let account = select_account(&self.account, &managed)?;
        tracing::info!(account = %account, "Connected");

        self.session.set_account(account);
        self.established = true;
        self.pause.reset();
        Ok(())
    }

    /// Tear down subscriptions and the connection, then pause.
    async fn recover(&mut self, shutdown: &CancellationToken) -> Result<(), TraderError> {
        let failed = self.session.release_subscriptions().await;
        if failed > 0 {
            tracing::warn!(failed, "Some subscriptions could not be canceled");
        }
        self.venue.disconnect().await;
        self.established = false;

        let wait = self.pause.next_pause();
        tracing::warn!(
            wait_ms = wait.as_millis() as u64,
            attempt = self.pause.attempt(),
            "Reconnecting after pause"
        );
        tokio::select! {
            () = shutdown.cancelled() => Err(TraderError::Interrupted),
            () = tokio::time::sleep(wait) => Ok(()),
        }
    }
}
