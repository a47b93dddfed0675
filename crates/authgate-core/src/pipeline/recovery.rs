//! Unauthorized recovery: sign out and send the user to the login entry
//! point, at most once per cooldown window no matter how many requests fail.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::navigation::{login_redirect_url, Navigator};
use crate::session::SessionProvider;

/// Why `trigger` did not start a recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySkipped {
    /// An earlier attempt still holds the flag.
    InFlight,
    /// Not called from within a tokio runtime, so there is nowhere to run
    /// the detached task.
    NoRuntime,
}

pub struct RecoveryCoordinator {
    /// Set before the first suspension point of an attempt; cleared by a timer
    /// `cooldown` after the attempt started.
    in_flight: Arc<AtomicBool>,
    /// Task of the most recent attempt, until someone waits on it.
    latest: Mutex<Option<JoinHandle<()>>>,
    session: Arc<dyn SessionProvider>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
    cooldown: Duration,
}

impl RecoveryCoordinator {
    pub fn new(
        session: Arc<dyn SessionProvider>,
        navigator: Arc<dyn Navigator>,
        login_path: impl Into<String>,
        cooldown: Duration,
    ) -> Self {
        Self {
            in_flight: Arc::new(AtomicBool::new(false)),
            latest: Mutex::new(None),
            session,
            navigator,
            login_path: login_path.into(),
            cooldown,
        }
    }

    pub fn is_recovering(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Start a detached recovery unless one is already in flight. Never
    /// panics and never blocks; the outcome of the recovery is only visible
    /// through logs, the session and the navigator.
    pub fn trigger(&self) -> Result<(), RecoverySkipped> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "No tokio runtime, skipping unauthorized recovery");
                return Err(RecoverySkipped::NoRuntime);
            }
        };

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Recovery already in flight");
            return Err(RecoverySkipped::InFlight);
        }

        let flag = Arc::clone(&self.in_flight);
        let cooldown = self.cooldown;
        runtime.spawn(async move {
            tokio::time::sleep(cooldown).await;
            flag.store(false, Ordering::Release);
            debug!(cooldown_ms = cooldown.as_millis() as u64, "Recovery cooldown elapsed");
        });

        let session = Arc::clone(&self.session);
        let navigator = Arc::clone(&self.navigator);
        let login_path = self.login_path.clone();
        let task = runtime.spawn(async move {
            info!("Unauthorized response, signing out");
            if let Err(e) = session.sign_out().await {
                warn!(error = %e, "Sign-out failed during recovery, redirecting anyway");
            }
            let target = login_redirect_url(&login_path, &navigator.current_location());
            info!(target = %target, "Redirecting to login");
            navigator.redirect(&target);
        });

        // Replacing an older handle only detaches it
        *self.latest.lock().unwrap_or_else(|e| e.into_inner()) = Some(task);
        Ok(())
    }

    /// Wait for the most recent recovery to finish sign-out and redirect.
    /// Returns immediately if none was started since the last wait.
    pub async fn wait(&self) {
        let task = self.latest.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "Recovery task did not complete");
            }
        }
    }
}
