//! Best-effort cross-verification against a remote record store.
//!
//! A remote failure never fails a draw. Timeouts, transport errors and
//! missing remote records all collapse to "no remote data", and the
//! combined result falls back to local verification alone.

use crate::audit::{AuditorConfig, FairnessAuditor};
use crate::engine::VerificationRecord;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while contacting the remote store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport failure or non-success status.
    #[error("remote request failed: {0}")]
    Request(String),

    /// No answer within the configured timeout.
    #[error("remote request timed out after {0:?}")]
    Timeout(Duration),

    /// The response body is not a verification record.
    #[error("failed to decode remote record: {0}")]
    Decode(String),
}

/// Source of remotely held verification records.
pub trait RemoteVerifier {
    /// Fetches the remote copy of a record.
    ///
    /// Returns `Ok(None)` when the remote holds no such record.
    fn fetch_record(
        &self,
        game_id: &str,
        draw_id: u64,
    ) -> impl Future<Output = Result<Option<VerificationRecord>, RemoteError>> + Send;
}

/// HTTP client for the `/verification/:game_id/:draw_id` endpoint.
#[derive(Debug, Clone)]
pub struct HttpRemoteVerifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRemoteVerifier {
    /// Creates a client for `endpoint` with a request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Request(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    /// Builds a client from the auditor settings, if an endpoint is set.
    pub fn from_config(config: &AuditorConfig) -> Result<Option<Self>, RemoteError> {
        config
            .remote_endpoint
            .as_deref()
            .map(|endpoint| Self::new(endpoint, Duration::from_millis(config.remote_timeout_ms)))
            .transpose()
    }

    fn record_url(&self, game_id: &str, draw_id: u64) -> String {
        format!("{}/verification/{}/{}", self.endpoint, game_id, draw_id)
    }
}

impl RemoteVerifier for HttpRemoteVerifier {
    async fn fetch_record(
        &self,
        game_id: &str,
        draw_id: u64,
    ) -> Result<Option<VerificationRecord>, RemoteError> {
        let response = self
            .client
            .get(self.record_url(game_id, draw_id))
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let record = response
            .error_for_status()
            .map_err(|e| RemoteError::Request(e.to_string()))?
            .json::<VerificationRecord>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;

        Ok(Some(record))
    }
}

/// Local and remote outcome for one draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossVerification {
    /// Checked draw.
    pub draw_id: u64,
    /// Local hash recomputation.
    pub local: bool,
    /// Remote record agreement; `None` when no remote data was available.
    pub remote: Option<bool>,
    /// `local`, further constrained by `remote` when present.
    pub verified: bool,
}

/// Combines local verification with a remote record store.
pub struct CrossVerifier<R> {
    remote: R,
    timeout: Duration,
}

impl<R: RemoteVerifier> CrossVerifier<R> {
    /// Creates a cross-verifier with an overall per-draw timeout.
    pub fn new(remote: R, timeout: Duration) -> Self {
        Self { remote, timeout }
    }

    /// Verifies one draw locally and, best-effort, remotely.
    pub async fn verify(&self, auditor: &FairnessAuditor<'_>, draw_id: u64) -> CrossVerification {
        let local = auditor.verify_draw(draw_id);
        let engine = auditor.engine();

        let remote = match engine.verification_record(draw_id) {
            Some(record) => self.compare_remote(engine.game_id(), record).await,
            None => None,
        };

        CrossVerification {
            draw_id,
            local,
            remote,
            verified: local && remote.unwrap_or(true),
        }
    }

    /// Cross-verifies draws `1..=N` in order.
    pub async fn verify_all(&self, auditor: &FairnessAuditor<'_>) -> Vec<CrossVerification> {
        let mut results = Vec::with_capacity(auditor.engine().draw_count());
        for draw_id in 1..=auditor.engine().draw_count() as u64 {
            results.push(self.verify(auditor, draw_id).await);
        }
        results
    }

    async fn compare_remote(&self, game_id: &str, local: &VerificationRecord) -> Option<bool> {
        let draw_id = local.draw_id();
        let fetched =
            match tokio::time::timeout(self.timeout, self.remote.fetch_record(game_id, draw_id))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(RemoteError::Timeout(self.timeout)),
            };

        match fetched {
            Ok(Some(remote)) => {
                let agrees = remote.number() == local.number()
                    && remote.proof() == local.proof()
                    && remote.verification_hash() == local.verification_hash();
                if !agrees {
                    tracing::error!(game_id, draw_id, "Remote record disagrees with local record");
                }
                Some(agrees)
            }
            Ok(None) => {
                tracing::warn!(game_id, draw_id, "No remote record, using local verification");
                None
            }
            Err(e) => {
                tracing::warn!(
                    game_id,
                    draw_id,
                    error = %e,
                    "Remote verification unavailable, using local verification"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{fixture_engine, EntropyEngine};
    use std::collections::BTreeMap;

    /// Serves a fixed set of records.
    struct StaticRemote {
        records: BTreeMap<u64, VerificationRecord>,
    }

    impl RemoteVerifier for StaticRemote {
        async fn fetch_record(
            &self,
            _game_id: &str,
            draw_id: u64,
        ) -> Result<Option<VerificationRecord>, RemoteError> {
            Ok(self.records.get(&draw_id).cloned())
        }
    }

    /// Never answers in time.
    struct SlowRemote;

    impl RemoteVerifier for SlowRemote {
        async fn fetch_record(
            &self,
            _game_id: &str,
            _draw_id: u64,
        ) -> Result<Option<VerificationRecord>, RemoteError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }
    }

    /// Always fails.
    struct DownRemote;

    impl RemoteVerifier for DownRemote {
        async fn fetch_record(
            &self,
            _game_id: &str,
            _draw_id: u64,
        ) -> Result<Option<VerificationRecord>, RemoteError> {
            Err(RemoteError::Request("connection refused".into()))
        }
    }

    fn engine_with_draws(n: usize) -> EntropyEngine {
        let mut engine = fixture_engine(1, 90);
        for _ in 0..n {
            engine.generate_number();
        }
        engine
    }

    #[tokio::test]
    async fn test_matching_remote_confirms() {
        let engine = engine_with_draws(3);
        let auditor = FairnessAuditor::with_defaults(&engine);
        let verifier = CrossVerifier::new(
            StaticRemote {
                records: engine.verification_records().clone(),
            },
            Duration::from_secs(1),
        );

        let results = verifier.verify_all(&auditor).await;
        assert_eq!(results.len(), 3);
        assert!(results
            .iter()
            .all(|r| r.local && r.remote == Some(true) && r.verified));
    }

    #[tokio::test]
    async fn test_disagreeing_remote_fails() {
        let engine = engine_with_draws(2);
        let auditor = FairnessAuditor::with_defaults(&engine);

        let mut records = engine.verification_records().clone();
        if let Some(record) = records.get_mut(&2) {
            record.verification_hash = "ffffffffffff".into();
        }
        let verifier = CrossVerifier::new(StaticRemote { records }, Duration::from_secs(1));

        let result = verifier.verify(&auditor, 2).await;
        assert!(result.local);
        assert_eq!(result.remote, Some(false));
        assert!(!result.verified);
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_local() {
        let engine = engine_with_draws(1);
        let auditor = FairnessAuditor::with_defaults(&engine);
        let verifier = CrossVerifier::new(SlowRemote, Duration::from_millis(20));

        let result = verifier.verify(&auditor, 1).await;
        assert_eq!(result.remote, None);
        assert!(result.verified);
    }

    #[tokio::test]
    async fn test_remote_error_falls_back_to_local() {
        let engine = engine_with_draws(1);
        let auditor = FairnessAuditor::with_defaults(&engine);
        let verifier = CrossVerifier::new(DownRemote, Duration::from_secs(1));

        let result = verifier.verify(&auditor, 1).await;
        assert_eq!(result.remote, None);
        assert!(result.verified);

        // Missing local record still fails closed
        let missing = verifier.verify(&auditor, 9).await;
        assert!(!missing.local);
        assert!(!missing.verified);
    }

    #[test]
    fn test_from_config() {
        let none = HttpRemoteVerifier::from_config(&AuditorConfig::default()).unwrap();
        assert!(none.is_none());

        let config = AuditorConfig {
            remote_endpoint: Some("http://localhost:9090/".into()),
            ..Default::default()
        };
        let client = HttpRemoteVerifier::from_config(&config).unwrap().unwrap();
        assert_eq!(
            client.record_url("game-a", 4),
            "http://localhost:9090/verification/game-a/4"
        );
    }
}
