//! Application context threaded through page controllers.
//!
//! Built once at startup; owns the store, the notification center and the
//! backend client, and hands them to controllers explicitly.

use std::sync::Arc;

use crate::api::{ApiClient, HttpApiClient};
use crate::config::DashboardConfig;
use crate::errors::ApiError;
use crate::notifications::{NotificationCenter, RenderSurface};
use crate::pages::{DashboardController, SessionController};
use crate::state::StateStore;
use crate::storage::{CredentialStorage, FileCredentialStorage};

pub struct AppContext {
    pub config: DashboardConfig,
    pub store: StateStore,
    pub notifications: Arc<NotificationCenter>,
    pub api: Arc<dyn ApiClient>,
    pub storage: Arc<dyn CredentialStorage>,
}

impl AppContext {
    /// Wire up file-backed storage and the HTTP client from `config`, then
    /// boot the store on `config.location_path`.
    pub fn bootstrap(
        config: DashboardConfig,
        surface: Arc<dyn RenderSurface>,
    ) -> Result<Self, ApiError> {
        let storage: Arc<dyn CredentialStorage> =
            Arc::new(FileCredentialStorage::new(config.credential_path()));
        let api: Arc<dyn ApiClient> = Arc::new(HttpApiClient::new(
            config.api_base_url.clone(),
            Arc::clone(&storage),
            config.request_timeout,
        )?);
        Ok(Self::with_collaborators(config, storage, api, surface))
    }

    /// Same as [`bootstrap`](Self::bootstrap) with caller-provided storage
    /// and backend client.
    pub fn with_collaborators(
        config: DashboardConfig,
        storage: Arc<dyn CredentialStorage>,
        api: Arc<dyn ApiClient>,
        surface: Arc<dyn RenderSurface>,
    ) -> Self {
        let store = StateStore::with_default_duration(
            Arc::clone(&storage),
            Arc::clone(&api),
            config.notification_duration,
        );
        // Attached before init so boot-time changes are rendered too.
        let notifications = Arc::new(NotificationCenter::new(store.clone(), surface));
        store.init(&config.location_path);

        tracing::debug!(
            page = %store.get_state().current_page,
            api = %config.api_base_url,
            "application context ready"
        );

        Self {
            config,
            store,
            notifications,
            api,
            storage,
        }
    }

    pub fn dashboard(&self) -> DashboardController {
        DashboardController::new(
            self.store.clone(),
            Arc::clone(&self.notifications),
            Arc::clone(&self.api),
        )
    }

    pub fn session(&self) -> SessionController {
        SessionController::new(
            self.store.clone(),
            Arc::clone(&self.notifications),
            Arc::clone(&self.api),
            Arc::clone(&self.storage),
        )
    }

    /// Page teardown: detach every listener and cancel pending timers.
    pub fn teardown(&self) {
        self.notifications.detach();
        self.store.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::MemorySurface;
    use crate::storage::MemoryCredentialStorage;
    use crate::test_support::{sample_profile, StubApi};
    use std::time::Duration;

    fn config(path: &str) -> DashboardConfig {
        DashboardConfig {
            location_path: path.to_string(),
            notification_duration: Duration::from_millis(2500),
            ..DashboardConfig::default()
        }
    }

    #[tokio::test]
    async fn test_context_boots_store_for_location() {
        let surface = Arc::new(MemorySurface::new());
        let ctx = AppContext::with_collaborators(
            config("/marketplace.html"),
            Arc::new(MemoryCredentialStorage::with_token("t")),
            Arc::new(StubApi::with_profile(sample_profile())),
            surface,
        );

        assert_eq!(ctx.store.get_state().current_page, "marketplace");
        assert_eq!(ctx.store.default_duration(), Duration::from_millis(2500));
        ctx.store.settled().await;
        assert_eq!(ctx.store.get_state().user, Some(sample_profile()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_detaches_everything() {
        let surface = Arc::new(MemorySurface::new());
        let ctx = AppContext::with_collaborators(
            config("/"),
            Arc::new(MemoryCredentialStorage::new()),
            Arc::new(StubApi::failing()),
            surface.clone(),
        );
        ctx.notifications.info("t", "m");
        assert_eq!(ctx.store.listener_count(), 1);

        ctx.teardown();
        assert_eq!(ctx.store.listener_count(), 0);
        assert_eq!(ctx.store.pending_evictions(), 0);
    }

    #[tokio::test]
    async fn test_bootstrap_uses_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = DashboardConfig {
            storage_dir: dir.path().to_path_buf(),
            ..config("/")
        };
        let ctx = AppContext::bootstrap(cfg, Arc::new(MemorySurface::new())).unwrap();

        ctx.storage.set_token("persisted").unwrap();
        assert!(dir.path().join("session.json").exists());
        assert!(!ctx.store.get_state().is_authenticated);
    }
}
