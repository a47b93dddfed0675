use std::sync::Arc;

use tracing::debug;

use crate::config::ExemptPathSet;
use crate::error::ApiError;
use crate::navigation::Navigator;

use super::{RecoveryCoordinator, RecoverySkipped};

/// What the classifier did with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Not an unauthorized failure.
    Ignored,
    /// Unauthorized, but the user is inside the authentication flow.
    Exempt,
    RecoveryStarted,
    RecoveryAlreadyInFlight,
    /// Recovery was due but could not be scheduled (no tokio runtime).
    RecoveryUnavailable,
}

/// Inspects failed requests and hands unauthorized ones to the recovery
/// coordinator.
pub struct FailureClassifier {
    unauthorized_status: u16,
    exempt_paths: ExemptPathSet,
    navigator: Arc<dyn Navigator>,
    coordinator: Arc<RecoveryCoordinator>,
}

impl FailureClassifier {
    pub fn new(
        unauthorized_status: u16,
        exempt_paths: ExemptPathSet,
        navigator: Arc<dyn Navigator>,
        coordinator: Arc<RecoveryCoordinator>,
    ) -> Self {
        Self {
            unauthorized_status,
            exempt_paths,
            navigator,
            coordinator,
        }
    }

    /// Never blocks on recovery: the coordinator's task is detached and the
    /// caller keeps ownership of `error`. Never panics, even outside a tokio
    /// runtime.
    pub fn classify(&self, error: &ApiError) -> Classification {
        if error.status() != Some(self.unauthorized_status) {
            return Classification::Ignored;
        }

        let location = self.navigator.current_location();
        if self.exempt_paths.matches(&location.path) {
            debug!(path = %location.path, "Unauthorized on exempt path, not recovering");
            return Classification::Exempt;
        }

        match self.coordinator.trigger() {
            Ok(()) => Classification::RecoveryStarted,
            Err(RecoverySkipped::InFlight) => Classification::RecoveryAlreadyInFlight,
            Err(RecoverySkipped::NoRuntime) => Classification::RecoveryUnavailable,
        }
    }
}
