//! Exchange lifecycle store.
//!
//! The full list of exchanges is loaded once from the persistence port, held
//! in memory most-recent-first, and rewritten as one snapshot after every
//! mutation.

use std::sync::Arc;

use chrono::Utc;

use crate::db::{KeyValueStore, EXCHANGES_KEY};
use crate::errors::AppError;
use crate::models::{Exchange, ExchangeStatus, ProposeExchangeRequest};

/// How status changes are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionMode {
    /// Any exchange may be moved to any status.
    #[default]
    Permissive,
    /// Only moves allowed by [`ExchangeStatus::can_transition_to`] succeed.
    Strict,
}

/// In-memory view of all exchanges with write-through persistence.
pub struct ExchangeStore {
    storage: Arc<dyn KeyValueStore>,
    exchanges: Vec<Exchange>,
    mode: TransitionMode,
}

impl ExchangeStore {
    /// Load the stored snapshot. A missing key yields an empty store; a value
    /// that does not parse is reported as a storage error.
    pub async fn load(
        storage: Arc<dyn KeyValueStore>,
        mode: TransitionMode,
    ) -> Result<Self, AppError> {
        let exchanges: Vec<Exchange> = match storage.read(EXCHANGES_KEY).await? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };

        tracing::info!(count = exchanges.len(), ?mode, "Loaded exchanges");

        Ok(Self {
            storage,
            exchanges,
            mode,
        })
    }

    /// All exchanges, most recent first.
    pub fn list(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn get(&self, id: &str) -> Option<&Exchange> {
        self.exchanges.iter().find(|e| e.id == id)
    }

    /// Create a pending exchange at the head of the list.
    ///
    /// Proposing the same pair twice creates two independent records.
    pub async fn propose(&mut self, request: ProposeExchangeRequest) -> Result<Exchange, AppError> {
        if let Some(field) = request.missing_field() {
            return Err(AppError::Validation(format!("{} is required", field)));
        }

        let now = Utc::now();
        let exchange = Exchange {
            id: self.next_id(now.timestamp_millis()),
            from_user_id: request.from_user_id,
            to_user_id: request.to_user_id,
            from_skill_id: request.from_skill_id,
            to_skill_id: request.to_skill_id,
            status: ExchangeStatus::Pending,
            offer_title: request.offer_title,
            created_at: now.to_rfc3339(),
            updated_at: None,
            from_user_name: request.from_user_name,
            to_user_name: request.to_user_name,
        };

        self.exchanges.insert(0, exchange.clone());
        if let Err(e) = self.persist().await {
            self.exchanges.remove(0);
            return Err(e);
        }

        tracing::info!(
            id = %exchange.id,
            from = %exchange.from_user_id,
            to = %exchange.to_user_id,
            "Exchange proposed"
        );
        Ok(exchange)
    }

    /// Move an exchange to `accepted`.
    pub async fn accept(&mut self, id: &str) -> Result<Option<Exchange>, AppError> {
        self.set_status(id, ExchangeStatus::Accepted).await
    }

    /// Move an exchange to `completed`.
    pub async fn finish(&mut self, id: &str) -> Result<Option<Exchange>, AppError> {
        self.set_status(id, ExchangeStatus::Completed).await
    }

    /// Move an exchange back to `pending`.
    pub async fn resume(&mut self, id: &str) -> Result<Option<Exchange>, AppError> {
        self.set_status(id, ExchangeStatus::Pending).await
    }

    /// Move an exchange to `cancelled`.
    pub async fn cancel(&mut self, id: &str) -> Result<Option<Exchange>, AppError> {
        self.set_status(id, ExchangeStatus::Cancelled).await
    }

    /// Pending exchanges addressed to `user_id`.
    pub fn incoming_requests(&self, user_id: &str) -> Vec<Exchange> {
        self.exchanges
            .iter()
            .filter(|e| e.status == ExchangeStatus::Pending && e.to_user_id == user_id)
            .cloned()
            .collect()
    }

    /// Non-pending exchanges where `user_id` is either participant.
    pub fn active_exchanges(&self, user_id: &str) -> Vec<Exchange> {
        self.exchanges
            .iter()
            .filter(|e| e.status != ExchangeStatus::Pending && e.involves(user_id))
            .cloned()
            .collect()
    }

    /// Set the status of exchange `id`.
    ///
    /// Returns `Ok(None)` without touching state or storage when the id is
    /// unknown.
    async fn set_status(
        &mut self,
        id: &str,
        status: ExchangeStatus,
    ) -> Result<Option<Exchange>, AppError> {
        let Some(index) = self.exchanges.iter().position(|e| e.id == id) else {
            tracing::debug!(id, %status, "Status change for unknown exchange ignored");
            return Ok(None);
        };

        let previous = self.exchanges[index].clone();
        if self.mode == TransitionMode::Strict && !previous.status.can_transition_to(status) {
            return Err(AppError::InvalidTransition {
                id: id.to_string(),
                from: previous.status,
                to: status,
            });
        }

        let exchange = &mut self.exchanges[index];
        exchange.status = status;
        exchange.updated_at = Some(Utc::now().to_rfc3339());
        let updated = exchange.clone();

        if let Err(e) = self.persist().await {
            self.exchanges[index] = previous;
            return Err(e);
        }

        tracing::info!(id, from = %previous.status, to = %status, "Exchange status changed");
        Ok(Some(updated))
    }

    /// Write the whole list under the exchanges key.
    async fn persist(&self) -> Result<(), AppError> {
        let snapshot = serde_json::to_string(&self.exchanges)
            .map_err(|e| AppError::Internal(format!("Failed to serialize exchanges: {}", e)))?;
        self.storage.write(EXCHANGES_KEY, &snapshot).await
    }

    /// Derive an id from the creation timestamp, bumping past ids already taken.
    fn next_id(&self, mut millis: i64) -> String {
        loop {
            let candidate = millis.to_string();
            if self.get(&candidate).is_none() {
                return candidate;
            }
            millis += 1;
        }
    }
}
