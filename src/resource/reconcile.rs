//! Reconciliation loop
//!
//! Drives create/configure/delete to completion against the eventually
//! consistent controller: issue the mutation, then poll describe until the
//! index reports ready (or, for delete, until it is gone).
//!
//! Each describe and each wait between polls races a [`CancellationToken`] and
//! an optional deadline, so a shutdown signal or timeout interrupts
//! an in-flight convergence even while the controller is not answering.
//! Errors from the mutation or from describe abort immediately; nothing is
//! retried or rolled back.

use crate::pinecone::{
    ConfigureIndexRequest, ControlPlane, CreateIndexRequest, Error, IndexDescription, Result,
};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Default interval between describe polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// What the poll loop is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Ready,
    Absent,
}

/// Poll-until-converged driver
#[derive(Debug, Clone)]
pub struct Reconciler {
    poll_interval: Duration,
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl Reconciler {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Bound every convergence wait
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Share a cancellation token with the caller
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Create an index and wait until it is ready
    pub async fn create(
        &self,
        client: &dyn ControlPlane,
        req: &CreateIndexRequest,
    ) -> Result<IndexDescription> {
        self.check_cancelled(&req.name)?;
        client.create_index(req).await?;
        self.wait_until_ready(client, &req.name).await
    }

    /// Reconfigure an index and wait until it is ready again
    pub async fn configure(
        &self,
        client: &dyn ControlPlane,
        name: &str,
        req: &ConfigureIndexRequest,
    ) -> Result<IndexDescription> {
        self.check_cancelled(name)?;
        client.configure_index(name, req).await?;
        self.wait_until_ready(client, name).await
    }

    /// Delete an index and wait until describe reports it absent
    pub async fn delete(&self, client: &dyn ControlPlane, name: &str) -> Result<()> {
        self.check_cancelled(name)?;
        client.delete_index(name).await?;
        self.wait_until_absent(client, name).await
    }

    /// Poll until the index is present and ready; returns the final snapshot
    pub async fn wait_until_ready(
        &self,
        client: &dyn ControlPlane,
        name: &str,
    ) -> Result<IndexDescription> {
        match self.poll(client, name, Target::Ready).await? {
            Some(description) => Ok(description),
            // poll only returns None for Target::Absent
            None => Err(Error::NotFound(name.to_string())),
        }
    }

    /// Poll until describe reports the index absent
    pub async fn wait_until_absent(&self, client: &dyn ControlPlane, name: &str) -> Result<()> {
        self.poll(client, name, Target::Absent).await.map(|_| ())
    }

    async fn poll(
        &self,
        client: &dyn ControlPlane,
        name: &str,
        target: Target,
    ) -> Result<Option<IndexDescription>> {
        let started = Instant::now();
        let deadline = self.timeout.map(|t| started + t);
        let mut attempt: u32 = 0;

        loop {
            self.check_cancelled(name)?;
            attempt += 1;

            // a hung describe is bounded by the same deadline and token as the sleep
            let observed = tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::warn!("Wait for index {} cancelled during describe", name);
                    return Err(Error::Cancelled(name.to_string()));
                }
                _ = until(deadline) => return Err(self.timed_out(name, started)),
                observed = client.describe_index(name) => observed?,
            };
            let converged = match target {
                Target::Ready => observed.as_ref().is_some_and(|desc| desc.status.ready),
                Target::Absent => observed.is_none(),
            };
            if converged {
                tracing::info!("Index {} converged ({:?}) after {} polls", name, target, attempt);
                return Ok(observed);
            }

            match &observed {
                Some(desc) => {
                    tracing::debug!(
                        "poll {} for {}: state={}, ready={}, waiting={:?}, crashed={:?}",
                        attempt,
                        name,
                        desc.status.state,
                        desc.status.ready,
                        desc.status.waiting,
                        desc.status.crashed
                    );
                }
                None => {
                    tracing::debug!("poll {} for {}: not visible yet", attempt, name);
                }
            }

            let mut sleep_for = self.poll_interval;
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    return Err(self.timed_out(name, started));
                }
                sleep_for = sleep_for.min(deadline - now);
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::warn!("Wait for index {} cancelled", name);
                    return Err(Error::Cancelled(name.to_string()));
                }
                _ = tokio::time::sleep(sleep_for) => {}
            }

            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(self.timed_out(name, started));
                }
            }
        }
    }

    fn check_cancelled(&self, name: &str) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled(name.to_string()));
        }
        Ok(())
    }

    fn timed_out(&self, name: &str, started: Instant) -> Error {
        let elapsed = started.elapsed();
        tracing::warn!("Index {} did not converge after {:?}", name, elapsed);
        Error::Timeout {
            name: name.to_string(),
            elapsed,
        }
    }
}

/// Resolves at the deadline; never resolves without one
async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
