use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use quiz_core::Clock;

use crate::error::GateError;
use crate::http::ApiClient;

/// Liveness verification consumed by the login gate before a quiz starts.
///
/// The production path is an external detector service; the stub variant
/// stands in where no detector is deployed, so real detection can be
/// substituted without touching the login flow.
#[async_trait]
pub trait LivenessCheck: Send + Sync {
    /// Returns whether a live participant was confirmed.
    ///
    /// # Errors
    ///
    /// Returns `GateError` when the check itself cannot be performed.
    async fn verify(&self) -> Result<bool, GateError>;
}

/// Stub liveness check that always confirms.
///
/// The original heuristic only verified that the camera feed was playing,
/// which is indistinguishable from "assume live" once the feed is up.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubAlwaysTrue;

#[async_trait]
impl LivenessCheck for StubAlwaysTrue {
    async fn verify(&self) -> Result<bool, GateError> {
        Ok(true)
    }
}

/// Liveness check delegating to an external detector endpoint.
#[derive(Clone)]
pub struct ExternalDetector {
    api: ApiClient,
    path: String,
}

#[derive(Debug, Deserialize)]
struct DetectorResponse {
    detected: bool,
}

impl ExternalDetector {
    #[must_use]
    pub fn new(api: ApiClient, path: impl Into<String>) -> Self {
        Self {
            api,
            path: path.into(),
        }
    }
}

#[async_trait]
impl LivenessCheck for ExternalDetector {
    async fn verify(&self) -> Result<bool, GateError> {
        let response = self.api.get(&self.path).send().await?;
        if !response.status().is_success() {
            return Err(GateError::HttpStatus(response.status()));
        }
        let body: DetectorResponse = response.json().await?;
        Ok(body.detected)
    }
}

/// Credential check against whatever identity backend is configured.
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Verify a username/password pair.
    ///
    /// # Errors
    ///
    /// Returns `GateError::InvalidCredentials` on rejection and transport
    /// errors otherwise.
    async fn login(&self, username: &str, password: &str) -> Result<(), GateError>;
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Identity gateway backed by the quiz backend's login endpoint.
#[derive(Clone)]
pub struct HttpIdentityGateway {
    api: ApiClient,
}

impl HttpIdentityGateway {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl IdentityGateway for HttpIdentityGateway {
    async fn login(&self, username: &str, password: &str) -> Result<(), GateError> {
        let response = self
            .api
            .post("/api/login/")
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        // The backend answers rejections with a JSON body too, so decode
        // before looking at the status.
        let status = response.status();
        let body: LoginResponse = match response.json().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => return Err(GateError::HttpStatus(status)),
            Err(e) => return Err(GateError::Http(e)),
        };

        if body.success {
            Ok(())
        } else {
            Err(GateError::InvalidCredentials {
                message: body
                    .message
                    .unwrap_or_else(|| "invalid username or password".to_string()),
            })
        }
    }
}

/// Fixed username/password table for offline runs and tests.
#[derive(Clone, Default)]
pub struct StaticIdentityGateway {
    users: HashMap<String, String>,
}

impl StaticIdentityGateway {
    #[must_use]
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }

    #[must_use]
    pub fn with_user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.users.insert(username.into(), password.into());
        self
    }
}

#[async_trait]
impl IdentityGateway for StaticIdentityGateway {
    async fn login(&self, username: &str, password: &str) -> Result<(), GateError> {
        match self.users.get(username) {
            Some(expected) if expected == password => Ok(()),
            _ => Err(GateError::InvalidCredentials {
                message: "invalid username or password".to_string(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct LivenessStatusReport<'a> {
    username: &'a str,
    status: &'a str,
    timestamp: chrono::DateTime<chrono::Utc>,
}

/// Combined login + liveness gate guarding session start.
///
/// Identity is checked first, then liveness; a confirmed liveness check is
/// reported to the backend fire-and-forget.
pub struct LoginGate {
    identity: Arc<dyn IdentityGateway>,
    liveness: Arc<dyn LivenessCheck>,
    reporter: Option<ApiClient>,
    clock: Clock,
}

impl LoginGate {
    #[must_use]
    pub fn new(
        clock: Clock,
        identity: Arc<dyn IdentityGateway>,
        liveness: Arc<dyn LivenessCheck>,
    ) -> Self {
        Self {
            identity,
            liveness,
            reporter: None,
            clock,
        }
    }

    /// Report confirmed liveness checks to this backend.
    #[must_use]
    pub fn with_reporter(mut self, api: ApiClient) -> Self {
        self.reporter = Some(api);
        self
    }

    /// Run the whole gate for one participant.
    ///
    /// # Errors
    ///
    /// Returns `GateError::InvalidCredentials` for a rejected login and
    /// `GateError::LivenessNotConfirmed` when the liveness check declines.
    pub async fn authorize(&self, username: &str, password: &str) -> Result<(), GateError> {
        self.identity.login(username, password).await?;

        if !self.liveness.verify().await? {
            return Err(GateError::LivenessNotConfirmed);
        }

        self.report_liveness(username).await;
        Ok(())
    }

    /// Status reporting is best effort; failures are logged and dropped.
    async fn report_liveness(&self, username: &str) {
        let Some(api) = &self.reporter else {
            return;
        };

        let report = LivenessStatusReport {
            username,
            status: "detected",
            timestamp: self.clock.now(),
        };
        let sent = api
            .post("/api/face-detection-status/")
            .json(&report)
            .send()
            .await;
        if let Err(e) = sent {
            tracing::warn!(error = %e, "failed to report liveness status");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_clock;

    #[tokio::test]
    async fn stub_liveness_always_confirms() {
        assert!(StubAlwaysTrue.verify().await.unwrap());
    }

    #[tokio::test]
    async fn static_gateway_accepts_known_user() {
        let gateway = StaticIdentityGateway::default().with_user("student", "student123");
        gateway.login("student", "student123").await.unwrap();
    }

    #[tokio::test]
    async fn static_gateway_rejects_bad_password() {
        let gateway = StaticIdentityGateway::default().with_user("student", "student123");
        let err = gateway.login("student", "wrong").await.unwrap_err();
        assert!(matches!(err, GateError::InvalidCredentials { .. }));
    }

    #[tokio::test]
    async fn gate_passes_with_valid_login_and_stub_liveness() {
        let gate = LoginGate::new(
            fixed_clock(),
            Arc::new(StaticIdentityGateway::default().with_user("student", "student123")),
            Arc::new(StubAlwaysTrue),
        );
        gate.authorize("student", "student123").await.unwrap();
    }

    #[tokio::test]
    async fn gate_rejects_before_liveness_on_bad_credentials() {
        struct NeverLive;

        #[async_trait]
        impl LivenessCheck for NeverLive {
            async fn verify(&self) -> Result<bool, GateError> {
                Ok(false)
            }
        }

        let gate = LoginGate::new(
            fixed_clock(),
            Arc::new(StaticIdentityGateway::default().with_user("student", "student123")),
            Arc::new(NeverLive),
        );

        let err = gate.authorize("student", "nope").await.unwrap_err();
        assert!(matches!(err, GateError::InvalidCredentials { .. }));

        let err = gate.authorize("student", "student123").await.unwrap_err();
        assert!(matches!(err, GateError::LivenessNotConfirmed));
    }
}
