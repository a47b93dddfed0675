//! The authenticated request pipeline.
//!
//! Every request passes through the same ordered stages:
//!
//! 1. `RequestAugmenter` - attaches `Authorization: Bearer <credential>`
//! 2. `Transport` - executes the request
//! 3. status check - turns non-success responses into `ApiError`
//! 4. `FailureClassifier` - on unauthorized failures outside the exempt
//!    paths, hands off to the `RecoveryCoordinator`
//!
//! The caller always receives the original failure. Recovery runs as a
//! detached task and its outcome never reaches the caller.

pub mod augment;
pub mod classify;
pub mod gateway;
pub mod recovery;

pub use augment::RequestAugmenter;
pub use classify::{Classification, FailureClassifier};
pub use gateway::Gateway;
pub use recovery::{RecoveryCoordinator, RecoverySkipped};
