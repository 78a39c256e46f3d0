use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use tracing::debug;
use uuid::Uuid;

use crate::error::DashboardError;
use crate::model::table::Workbook;

/// One upload. A workbook that failed to load is kept together with its
/// error so later dashboard requests can fall back to demo data.
#[derive(Debug)]
pub struct Session {
    pub file_name: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub loaded: Result<Workbook, DashboardError>,
}

impl Session {
    pub fn new(file_name: Option<String>, loaded: Result<Workbook, DashboardError>) -> Self {
        Self {
            file_name,
            uploaded_at: Utc::now(),
            loaded,
        }
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.loaded
            .as_ref()
            .map(Workbook::sheet_names)
            .unwrap_or_default()
    }

    pub fn load_error(&self) -> Option<String> {
        self.loaded.as_ref().err().map(ToString::to_string)
    }
}

/// Uploaded workbooks keyed by session id, evicted by TTL and capacity.
#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<Uuid, Arc<Session>>,
}

impl SessionStore {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn insert(&self, session: Session) -> Uuid {
        let id = Uuid::new_v4();
        self.cache.insert(id, Arc::new(session)).await;
        debug!(session_id = %id, "Workbook session stored");
        id
    }

    pub async fn get(&self, id: Uuid) -> Result<Arc<Session>, DashboardError> {
        self.cache
            .get(&id)
            .await
            .ok_or(DashboardError::UnknownSession(id))
    }

    /// Returns whether a session was actually removed.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.cache.remove(&id).await.is_some()
    }
}
