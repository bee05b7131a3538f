//! Shared connection management
//!
//! One [`ConnectionProvider`] is built by the composition root and handed to
//! every repository. The connect + ping sequence runs lazily on first
//! [`acquire`](ConnectionProvider::acquire); concurrent first callers wait on
//! the same attempt and see the same outcome.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::config::{redact_uri, ConnectionConfig};
use crate::error::{ConnectError, Result};

/// What happens after an initialization attempt fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitPolicy {
    /// The first outcome is final, failure included. A failed provider keeps
    /// returning that failure; build a new provider to try again.
    #[default]
    Once,
    /// Only success is recorded. Attempts never overlap. Callers that waited
    /// on a failed attempt get that attempt's error; a caller arriving after
    /// the failure starts a fresh one.
    RetryUntilConnected,
}

type Outcome<H> = std::result::Result<H, Arc<ConnectError>>;

/// Lazily connected, shared database handle.
pub struct ConnectionProvider<B: Backend> {
    backend: B,
    endpoint: String,
    policy: InitPolicy,
    outcome: OnceCell<Outcome<B::Handle>>,
    /// Held while a retry-policy attempt runs; keeps the last failure.
    round: Mutex<Option<Arc<ConnectError>>>,
    failed_rounds: AtomicU64,
}

impl<B: Backend> ConnectionProvider<B> {
    pub fn new(backend: B, endpoint: impl Into<String>) -> Self {
        Self::with_policy(backend, endpoint, InitPolicy::default())
    }

    pub fn with_policy(backend: B, endpoint: impl Into<String>, policy: InitPolicy) -> Self {
        Self {
            backend,
            endpoint: endpoint.into(),
            policy,
            outcome: OnceCell::new(),
            round: Mutex::new(None),
            failed_rounds: AtomicU64::new(0),
        }
    }

    /// Build from the `[connection]` config section.
    pub fn from_config(backend: B, config: &ConnectionConfig) -> Self {
        let policy = if config.retry_after_failure {
            InitPolicy::RetryUntilConnected
        } else {
            InitPolicy::Once
        };
        Self::with_policy(backend, config.uri.clone(), policy)
    }

    pub fn policy(&self) -> InitPolicy {
        self.policy
    }

    /// Endpoint with any password masked, safe for logs.
    pub fn endpoint(&self) -> String {
        redact_uri(&self.endpoint)
    }

    /// True once an attempt has been recorded (successful, or failed under
    /// [`InitPolicy::Once`]).
    pub fn is_initialized(&self) -> bool {
        self.outcome.initialized()
    }

    /// Return the shared handle, connecting on first use.
    ///
    /// # Errors
    ///
    /// `StoreError::Connection` when the connect step or the liveness check
    /// failed. Under [`InitPolicy::Once`] the same error is returned on every
    /// later call.
    pub async fn acquire(&self) -> Result<B::Handle> {
        if let Some(outcome) = self.outcome.get() {
            debug!(endpoint = %self.endpoint(), ok = outcome.is_ok(), "reusing recorded connection outcome");
            return Self::cloned(outcome);
        }

        let outcome = match self.policy {
            InitPolicy::Once => self.outcome.get_or_init(|| self.establish()).await,
            InitPolicy::RetryUntilConnected => return self.acquire_retrying().await,
        };
        Self::cloned(outcome)
    }

    /// One attempt per round. A caller that queued behind a round which then
    /// failed takes that round's error instead of starting another.
    async fn acquire_retrying(&self) -> Result<B::Handle> {
        let seen = self.failed_rounds.load(Ordering::Acquire);
        let mut last_failure = self.round.lock().await;

        if let Some(outcome) = self.outcome.get() {
            return Self::cloned(outcome);
        }
        if self.failed_rounds.load(Ordering::Acquire) != seen {
            if let Some(err) = last_failure.as_ref() {
                debug!(endpoint = %self.endpoint(), "sharing failure of the attempt we waited on");
                return Err(Arc::clone(err).into());
            }
        }

        match self.establish().await {
            Ok(handle) => {
                *last_failure = None;
                let outcome = self.outcome.get_or_init(|| async { Ok(handle) }).await;
                Self::cloned(outcome)
            }
            Err(err) => {
                *last_failure = Some(Arc::clone(&err));
                self.failed_rounds.fetch_add(1, Ordering::AcqRel);
                Err(err.into())
            }
        }
    }

    fn cloned(outcome: &Outcome<B::Handle>) -> Result<B::Handle> {
        match outcome {
            Ok(handle) => Ok(handle.clone()),
            Err(err) => Err(Arc::clone(err).into()),
        }
    }

    /// One connect + ping sequence.
    async fn establish(&self) -> Outcome<B::Handle> {
        let endpoint = self.endpoint();
        debug!(%endpoint, "connecting");

        let handle = match self.backend.connect(&self.endpoint).await {
            Ok(handle) => handle,
            Err(source) => {
                warn!(%endpoint, error = %source, "connect failed");
                return Err(Arc::new(ConnectError::Connect { endpoint, source }));
            }
        };

        if let Err(source) = self.backend.ping(&handle).await {
            warn!(%endpoint, error = %source, "liveness check failed");
            return Err(Arc::new(ConnectError::Ping { endpoint, source }));
        }

        info!(%endpoint, "connected");
        Ok(handle)
    }
}
