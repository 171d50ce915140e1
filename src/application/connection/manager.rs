use crate::domain::tryon::{
    endpoint::{Endpoint, ServiceRegistry},
    session::{InferenceSession, SessionConnector},
};
use std::{sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// How hard to try each endpoint before moving on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts_per_endpoint: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts_per_endpoint: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// Owns the single active session and replaces it on (re)connect.
///
/// Readers clone the `Arc` under a read lock and then work without holding
/// it, so a reconnect never blocks an in-flight prediction. A request keeps
/// the session it started with even if another request moves the manager to
/// a different endpoint meanwhile.
pub struct ConnectionManager {
    registry: ServiceRegistry,
    connector: Arc<dyn SessionConnector>,
    policy: RetryPolicy,
    active: RwLock<Option<Arc<dyn InferenceSession>>>,
}

impl ConnectionManager {
    pub fn new(
        registry: ServiceRegistry,
        connector: Arc<dyn SessionConnector>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            registry,
            connector,
            policy: RetryPolicy {
                attempts_per_endpoint: policy.attempts_per_endpoint.max(1),
                ..policy
            },
            active: RwLock::new(None),
        }
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub async fn session(&self) -> Option<Arc<dyn InferenceSession>> {
        self.active.read().await.clone()
    }

    pub async fn active_endpoint(&self) -> Option<Endpoint> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|session| session.endpoint().clone())
    }

    /// Connect to the first reachable endpoint in registry order.
    pub async fn connect(&self) -> bool {
        self.connect_any(self.registry.endpoints()).await.is_some()
    }

    /// Connect to the first reachable endpoint after the active one.
    pub async fn advance(&self) -> bool {
        match self.active_endpoint().await {
            Some(current) => self.advance_from(&current).await.is_some(),
            None => self.connect().await,
        }
    }

    /// Active session, connecting from the top of the registry if needed.
    pub async fn ensure_session(&self) -> Option<Arc<dyn InferenceSession>> {
        match self.session().await {
            Some(session) => Some(session),
            None => {
                warn!("No client available, attempting to connect");
                self.connect_any(self.registry.endpoints()).await
            }
        }
    }

    /// Connect to the first reachable endpoint strictly after `endpoint`.
    pub async fn advance_from(&self, endpoint: &Endpoint) -> Option<Arc<dyn InferenceSession>> {
        self.connect_any(self.registry.after(endpoint)).await
    }

    /// Drop the active session if it is still on `endpoint`, so the next
    /// `ensure_session` reconnects from the top of the registry. A session
    /// another request has already moved to is left alone.
    pub async fn invalidate(&self, endpoint: &Endpoint) -> bool {
        let mut active = self.active.write().await;
        if active
            .as_ref()
            .is_some_and(|session| session.endpoint() == endpoint)
        {
            warn!(endpoint = %endpoint, "Dropping session to failed try-on service");
            *active = None;
            true
        } else {
            false
        }
    }

    async fn connect_any(&self, candidates: &[Endpoint]) -> Option<Arc<dyn InferenceSession>> {
        let attempts = self.policy.attempts_per_endpoint;

        for endpoint in candidates {
            for attempt in 1..=attempts {
                info!(endpoint = %endpoint, attempt, attempts, "Connecting to try-on service");
                match self.connector.open(endpoint).await {
                    Ok(session) => {
                        *self.active.write().await = Some(session.clone());
                        info!(endpoint = %endpoint, "Connected to try-on service");
                        return Some(session);
                    }
                    Err(err) => {
                        warn!(endpoint = %endpoint, attempt, error = %err, "Connection attempt failed");
                        if attempt < attempts && !self.policy.delay.is_zero() {
                            tokio::time::sleep(self.policy.delay).await;
                        }
                    }
                }
            }
        }

        error!(
            candidates = candidates.len(),
            "Could not connect to any virtual try-on service"
        );
        *self.active.write().await = None;
        None
    }
}
