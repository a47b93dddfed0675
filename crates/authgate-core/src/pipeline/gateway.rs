//! The gateway composes the pipeline stages and is the only way requests
//! reach the backend.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::config::GatewayConfig;
use crate::error::ApiError;
use crate::navigation::Navigator;
use crate::session::SessionProvider;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Transport};

use super::{FailureClassifier, RecoveryCoordinator, RequestAugmenter};

/// Path probed by `Gateway::health`
const HEALTH_PATH: &str = "/health";

pub struct Gateway {
    config: Arc<GatewayConfig>,
    augmenter: RequestAugmenter,
    transport: Arc<dyn Transport>,
    classifier: FailureClassifier,
    coordinator: Arc<RecoveryCoordinator>,
}

impl Gateway {
    pub fn new(
        config: GatewayConfig,
        session: Arc<dyn SessionProvider>,
        transport: Arc<dyn Transport>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let coordinator = Arc::new(RecoveryCoordinator::new(
            Arc::clone(&session),
            Arc::clone(&navigator),
            config.login_path.clone(),
            config.cooldown(),
        ));
        let classifier = FailureClassifier::new(
            config.unauthorized_status,
            config.exempt_paths.clone(),
            navigator,
            Arc::clone(&coordinator),
        );

        Self {
            config: Arc::new(config),
            augmenter: RequestAugmenter::new(session),
            transport,
            classifier,
            coordinator,
        }
    }

    /// Gateway talking HTTP to `config.base_url`.
    pub fn with_http(
        config: GatewayConfig,
        session: Arc<dyn SessionProvider>,
        navigator: Arc<dyn Navigator>,
    ) -> anyhow::Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self::new(config, session, transport, navigator))
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn is_recovering(&self) -> bool {
        self.coordinator.is_recovering()
    }

    /// Wait for the most recently started recovery (sign-out and redirect)
    /// to finish. Returns immediately if none is pending.
    pub async fn wait_for_recovery(&self) {
        self.coordinator.wait().await;
    }

    /// Run a request through augment -> send -> status check -> classify.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let method = request.method.clone();
        let path = request.path.clone();

        let request = self.augmenter.augment(request).await?;

        let outcome = match self.transport.send(request).await {
            Ok(response) => self.check_response(response),
            Err(e) => Err(e),
        };

        outcome.map_err(|err| {
            let classification = self.classifier.classify(&err);
            debug!(%method, path = %path, error = %err, ?classification, "Request failed");
            err
        })
    }

    /// Check if response is successful, returning an error with body if not.
    fn check_response(&self, response: ApiResponse) -> Result<ApiResponse, ApiError> {
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_status(
                response.status.as_u16(),
                &response.text(),
                self.config.unauthorized_status,
            ))
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(ApiRequest::get(path)).await?.json()
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(ApiRequest::post(path).with_json(body)?).await?.json()
    }

    pub async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(ApiRequest::put(path).with_json(body)?).await?.json()
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::delete(path)).await?;
        Ok(())
    }

    /// `true` when the backend answers the health probe with a success status.
    pub async fn health(&self) -> bool {
        match self.execute(ApiRequest::get(HEALTH_PATH)).await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Health probe failed");
                false
            }
        }
    }
}
