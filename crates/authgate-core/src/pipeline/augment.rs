use std::sync::Arc;

use reqwest::header::{self, HeaderValue};
use tracing::debug;

use crate::error::ApiError;
use crate::session::SessionProvider;
use crate::transport::ApiRequest;

/// Attaches the current credential to outgoing requests.
pub struct RequestAugmenter {
    session: Arc<dyn SessionProvider>,
}

impl RequestAugmenter {
    pub fn new(session: Arc<dyn SessionProvider>) -> Self {
        Self { session }
    }

    /// Queries the session provider (every call, no caching) and sets the
    /// authorization header when a credential is available. A failed lookup
    /// aborts the request before it is sent.
    pub async fn augment(&self, mut request: ApiRequest) -> Result<ApiRequest, ApiError> {
        let credential = self
            .session
            .current_credential()
            .await
            .map_err(ApiError::CredentialLookup)?;

        match credential {
            Some(credential) => {
                let mut value = HeaderValue::from_str(&credential.bearer_header())?;
                value.set_sensitive(true);
                request.headers.insert(header::AUTHORIZATION, value);
            }
            None => {
                debug!(path = %request.path, "No credential available, sending without authorization");
            }
        }
        Ok(request)
    }
}
