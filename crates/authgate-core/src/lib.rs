//! Client-side request gateway.
//!
//! Attaches the session credential to every backend request and recovers
//! from unauthorized responses (sign-out plus redirect to login) exactly once
//! per burst, however many requests fail concurrently.
//!
//! - `config`: immutable gateway settings
//! - `session`: `SessionProvider` seam and a file-backed session
//! - `navigation`: `Navigator` seam and login redirect URLs
//! - `transport`: request/response types and the reqwest transport
//! - `pipeline`: augmenter, classifier, recovery coordinator, `Gateway`
//! - `resources`: typed CRUD wrappers over the gateway

pub mod config;
pub mod error;
pub mod navigation;
pub mod pipeline;
pub mod resources;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use config::{ExemptPathSet, GatewayConfig};
pub use error::{ApiError, SessionError};
pub use navigation::{login_redirect_url, Location, MemoryNavigator, Navigator};
pub use pipeline::{Classification, Gateway, RecoveryCoordinator, RecoverySkipped};
pub use resources::{Resource, Resources};
pub use session::{Credential, FileSession, SessionProvider};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
