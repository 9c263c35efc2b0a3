//! Single-flight credential refresh.
//!
//! When a request comes back unauthorized the client asks the
//! [`RefreshCoordinator`] for a replacement access token. The first caller to
//! arrive while the coordinator is idle becomes the leader and runs the refresh
//! exchange; everyone arriving while that exchange is outstanding is parked on a
//! one-shot channel and receives the leader's outcome. The idle/refreshing
//! transition, the queue append and the queue drain all happen under one mutex,
//! so a cycle makes exactly one exchange call and no waiter is left behind.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::credentials::CredentialStore;
use super::error::AuthError;
use super::exchange::RefreshExchange;
use super::token::CredentialPair;
use crate::util::timeout::with_timeout;

/// Outcome delivered to every request that took part in a refresh cycle:
/// the access token to replay with, or the error that ended the cycle.
pub type Settlement = Result<String, AuthError>;

pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(30);

enum RefreshState {
    Idle,
    Refreshing {
        waiters: VecDeque<oneshot::Sender<Settlement>>,
    },
}

enum Role {
    /// The stored credential already differs from the rejected one.
    Rotated(String),
    Leader { refresh: Option<String> },
    Follower(oneshot::Receiver<Settlement>),
}

pub struct RefreshCoordinator {
    credentials: Arc<CredentialStore>,
    exchange: Arc<dyn RefreshExchange>,
    refresh_timeout: Duration,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new(credentials: Arc<CredentialStore>, exchange: Arc<dyn RefreshExchange>) -> Self {
        Self {
            credentials,
            exchange,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            state: Mutex::new(RefreshState::Idle),
        }
    }

    /// Upper bound on a single exchange; waiters are failed when it fires.
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    pub fn refresh_timeout(&self) -> Duration {
        self.refresh_timeout
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.lock_state(), RefreshState::Refreshing { .. })
    }

    /// Requests currently parked behind the in-flight exchange.
    pub fn pending_waiters(&self) -> usize {
        match &*self.lock_state() {
            RefreshState::Refreshing { waiters } => waiters.len(),
            RefreshState::Idle => 0,
        }
    }

    /// Obtain a replacement access token after `rejected_access` was refused.
    ///
    /// Either starts the exchange, joins the one already running, or (when the
    /// store has rotated since the request was sent) hands back the current
    /// token without any exchange at all.
    pub async fn recover(&self, rejected_access: Option<&str>) -> Settlement {
        match self.enter(rejected_access) {
            Role::Rotated(access) => Ok(access),
            Role::Follower(receiver) => receiver
                .await
                .unwrap_or(Err(AuthError::RefreshAbandoned)),
            Role::Leader { refresh } => self.lead(refresh).await,
        }
    }

    fn enter(&self, rejected_access: Option<&str>) -> Role {
        let mut state = self.lock_state();

        if let RefreshState::Refreshing { waiters } = &mut *state {
            let (sender, receiver) = oneshot::channel();
            waiters.push_back(sender);
            debug!(position = waiters.len(), "Queued behind in-flight refresh");
            return Role::Follower(receiver);
        }

        let current = self.credentials.get();
        if let Some(pair) = &current {
            if rejected_access != Some(pair.access.as_str()) {
                debug!("Credential rotated since the request was sent");
                return Role::Rotated(pair.access.clone());
            }
        }

        *state = RefreshState::Refreshing {
            waiters: VecDeque::new(),
        };
        Role::Leader {
            refresh: current.and_then(|pair| pair.refresh),
        }
    }

    async fn lead(&self, refresh: Option<String>) -> Settlement {
        let mut cycle = CycleGuard {
            coordinator: self,
            armed: true,
        };

        let outcome = match refresh {
            None => Err(AuthError::MissingRefreshCredential),
            Some(token) => {
                info!("Access credential rejected; refreshing");
                with_timeout(self.refresh_timeout, self.exchange.refresh(&token)).await
            }
        };

        let settlement = self.apply(outcome);
        cycle.armed = false;
        self.settle(&settlement);
        settlement
    }

    /// Write the exchange outcome to the credential store.
    fn apply(&self, outcome: Result<CredentialPair, AuthError>) -> Settlement {
        match outcome {
            Ok(pair) => {
                let access = pair.access.clone();
                if let Err(err) = self.credentials.set(pair) {
                    warn!(error = %err, "Refreshed credentials could not be persisted");
                }
                info!("Credentials refreshed");
                Ok(access)
            }
            Err(err) => {
                warn!(error = %err, "Refresh failed; clearing stored credentials");
                if let Err(clear_err) = self.credentials.clear() {
                    warn!(error = %clear_err, "Failed to clear stored credentials");
                }
                Err(err)
            }
        }
    }

    /// Return to idle and deliver `settlement` to every queued waiter in
    /// arrival order.
    fn settle(&self, settlement: &Settlement) {
        let drained = std::mem::replace(&mut *self.lock_state(), RefreshState::Idle);
        let waiters = match drained {
            RefreshState::Refreshing { waiters } => waiters,
            RefreshState::Idle => VecDeque::new(),
        };
        debug!(
            waiters = waiters.len(),
            succeeded = settlement.is_ok(),
            "Settling refresh waiters"
        );
        for waiter in waiters {
            // A dropped receiver means that caller gave up; nothing to deliver.
            let _ = waiter.send(settlement.clone());
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refresh_timeout", &self.refresh_timeout)
            .field("refreshing", &self.is_refreshing())
            .field("pending_waiters", &self.pending_waiters())
            .finish()
    }
}

/// Releases waiters if the leader's future is dropped mid-exchange.
struct CycleGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    armed: bool,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Refresh leader dropped before completion; failing waiters");
            self.coordinator.settle(&Err(AuthError::RefreshAbandoned));
        }
    }
}
