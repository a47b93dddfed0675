//! Test doubles for the session and transport seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::{ApiError, SessionError};
use crate::session::{Credential, SessionProvider};
use crate::transport::{ApiRequest, ApiResponse, Transport};

#[derive(Default)]
pub struct StubSession {
    token: Mutex<Option<String>>,
    fail_lookups: AtomicBool,
    fail_sign_outs: AtomicBool,
    sign_out_delay: Mutex<Option<Duration>>,
    lookups: AtomicUsize,
    sign_outs: AtomicUsize,
}

impl StubSession {
    pub fn with_token(token: &str) -> Self {
        let session = Self::default();
        session.set_token(Some(token));
        session
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn set_token(&self, token: Option<&str>) {
        *self.token.lock().unwrap() = token.map(str::to_string);
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sign_outs(&self, fail: bool) {
        self.fail_sign_outs.store(fail, Ordering::SeqCst);
    }

    pub fn delay_sign_outs(&self, delay: Duration) {
        *self.sign_out_delay.lock().unwrap() = Some(delay);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of sign-out calls started.
    pub fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for StubSession {
    async fn current_credential(&self) -> Result<Option<Credential>, SessionError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(SessionError::Unavailable("keychain locked".into()));
        }
        Ok(self.token.lock().unwrap().clone().and_then(|t| Credential::new(t)))
    }

    async fn sign_out(&self) -> Result<(), SessionError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        let delay = *self.sign_out_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_sign_outs.load(Ordering::SeqCst) {
            return Err(SessionError::Unavailable("sign-out endpoint down".into()));
        }
        self.set_token(None);
        Ok(())
    }
}

enum Scripted {
    Respond(u16, String),
    Fail,
}

/// Transport answering from a per-path script; unscripted paths get `200 {}`.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<HashMap<String, Scripted>>,
    delay: Mutex<Option<Duration>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: &str, status: u16, body: &str) -> &Self {
        self.script
            .lock()
            .unwrap()
            .insert(path.to_string(), Scripted::Respond(status, body.to_string()));
        self
    }

    pub fn fail(&self, path: &str) -> &Self {
        self.script.lock().unwrap().insert(path.to_string(), Scripted::Fail);
        self
    }

    pub fn delay(&self, delay: Duration) -> &Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let path = request.path.clone();
        self.requests.lock().unwrap().push(request);

        let script = self.script.lock().unwrap();
        match script.get(&path) {
            Some(Scripted::Respond(status, body)) => Ok(ApiResponse::new(
                StatusCode::from_u16(*status).unwrap(),
                body.clone(),
            )),
            Some(Scripted::Fail) => Err(ApiError::Transport {
                status: None,
                cause: "connection reset".into(),
            }),
            None => Ok(ApiResponse::new(StatusCode::OK, "{}")),
        }
    }
}
