//! Sign-in, sign-out and the page guard that keeps signed-out users on the
//! public pages.

use std::sync::Arc;

use crate::api::{ApiClient, UserProfile};
use crate::errors::{ApiError, StorageError};
use crate::notifications::{NotificationCenter, NotificationId};
use crate::state::{ApplicationState, StateStore};
use crate::storage::CredentialStorage;

pub const LOGIN_PAGE: &str = "login";
pub const REGISTER_PAGE: &str = "cadastro";

pub const LOGOUT_TITLE: &str = "Logout";
pub const LOGOUT_MESSAGE: &str = "Você foi desconectado com sucesso.";

/// Where the page guard sends the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRedirect {
    Login,
    Dashboard,
}

impl AuthRedirect {
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login.html",
            Self::Dashboard => "/index.html",
        }
    }
}

/// Page guard: signed-out users may only see the login and registration
/// pages, signed-in users are sent away from them. `None` means stay.
pub fn check_authentication(state: &ApplicationState) -> Option<AuthRedirect> {
    let public = matches!(state.current_page.as_str(), LOGIN_PAGE | REGISTER_PAGE);
    match (state.is_authenticated, public) {
        (false, false) => Some(AuthRedirect::Login),
        (true, true) => Some(AuthRedirect::Dashboard),
        _ => None,
    }
}

pub struct SessionController {
    store: StateStore,
    notifications: Arc<NotificationCenter>,
    api: Arc<dyn ApiClient>,
    storage: Arc<dyn CredentialStorage>,
}

impl SessionController {
    pub fn new(
        store: StateStore,
        notifications: Arc<NotificationCenter>,
        api: Arc<dyn ApiClient>,
        storage: Arc<dyn CredentialStorage>,
    ) -> Self {
        Self {
            store,
            notifications,
            api,
            storage,
        }
    }

    /// Exchange credentials for a token, then load and publish the profile.
    ///
    /// The token is persisted before the profile request, which needs it.
    /// If that request fails the token is dropped again and the session
    /// stays signed out.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        self.store.set_loading(true);
        let outcome = self.authenticate(email, password).await;
        self.store.set_loading(false);

        match &outcome {
            Ok(user) => tracing::info!(user_id = user.id, "signed in"),
            Err(e) => tracing::warn!(error = %e, "sign-in failed"),
        }
        outcome
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        let token = self.api.login(email, password).await?;
        self.storage.set_token(&token.access_token)?;

        let user = match self.api.get_user_profile().await {
            Ok(user) => user,
            Err(e) => {
                self.storage.clear_token()?;
                return Err(e);
            }
        };

        self.store.set_user(user.clone(), Some(&token.access_token))?;
        Ok(user)
    }

    /// Sign out and confirm it with a success notification.
    ///
    /// The session state is cleared and the notification raised even when
    /// the stored token could not be removed; that error is returned.
    pub fn logout(&self) -> Result<NotificationId, StorageError> {
        let cleared = self.store.clear_user();
        tracing::info!("signed out");
        let id = self.notifications.success(LOGOUT_TITLE, LOGOUT_MESSAGE);
        cleared.map(|()| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::{MemorySurface, NotificationKind};
    use crate::state::StatePatch;
    use crate::storage::MemoryCredentialStorage;
    use crate::test_support::{sample_profile, StubApi};

    fn session(api: StubApi) -> (StateStore, Arc<MemoryCredentialStorage>, SessionController) {
        let api: Arc<dyn ApiClient> = Arc::new(api);
        let storage = Arc::new(MemoryCredentialStorage::new());
        let store = StateStore::new(storage.clone(), api.clone());
        let center = Arc::new(NotificationCenter::new(
            store.clone(),
            Arc::new(MemorySurface::new()),
        ));
        let controller = SessionController::new(store.clone(), center, api, storage.clone());
        (store, storage, controller)
    }

    fn on_page(page: &str, authenticated: bool) -> ApplicationState {
        ApplicationState::default().merged(
            StatePatch::new()
                .current_page(page)
                .authenticated(authenticated),
        )
    }

    #[test]
    fn test_guard_sends_signed_out_users_to_login() {
        assert_eq!(
            check_authentication(&on_page("dashboard", false)),
            Some(AuthRedirect::Login)
        );
        assert_eq!(
            check_authentication(&on_page("marketplace", false)).map(AuthRedirect::path),
            Some("/login.html")
        );
        assert_eq!(check_authentication(&on_page(LOGIN_PAGE, false)), None);
        assert_eq!(check_authentication(&on_page(REGISTER_PAGE, false)), None);
    }

    #[test]
    fn test_guard_sends_signed_in_users_to_dashboard() {
        assert_eq!(
            check_authentication(&on_page(LOGIN_PAGE, true)),
            Some(AuthRedirect::Dashboard)
        );
        assert_eq!(
            check_authentication(&on_page(REGISTER_PAGE, true)).map(AuthRedirect::path),
            Some("/index.html")
        );
        assert_eq!(check_authentication(&on_page("dashboard", true)), None);
    }

    #[tokio::test]
    async fn test_login_publishes_user_and_persists_token() {
        let (store, storage, controller) = session(StubApi {
            token: Some("jwt-123".into()),
            profile: Some(sample_profile()),
            ..StubApi::default()
        });

        let user = controller.login("ana@loja.com", "secret").await.unwrap();
        assert_eq!(user, sample_profile());

        let state = store.get_state();
        assert!(state.is_authenticated);
        assert_eq!(state.user, Some(sample_profile()));
        assert!(!state.loading);
        assert_eq!(storage.token().unwrap().as_deref(), Some("jwt-123"));
    }

    #[tokio::test]
    async fn test_rejected_credentials_leave_session_signed_out() {
        let (store, storage, controller) = session(StubApi::failing());

        let err = controller.login("ana@loja.com", "wrong").await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 401, .. }));
        assert!(!store.get_state().is_authenticated);
        assert_eq!(storage.token().unwrap(), None);
    }

    #[tokio::test]
    async fn test_profile_failure_drops_token() {
        let (store, storage, controller) = session(StubApi {
            token: Some("jwt-123".into()),
            ..StubApi::default()
        });

        let err = controller.login("ana@loja.com", "secret").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
        assert!(!store.get_state().is_authenticated);
        assert_eq!(storage.token().unwrap(), None);
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let (store, storage, controller) = session(StubApi {
            token: Some("jwt-123".into()),
            profile: Some(sample_profile()),
            ..StubApi::default()
        });
        controller.login("ana@loja.com", "secret").await.unwrap();

        let id = controller.logout().unwrap();
        let state = store.get_state();
        assert!(!state.is_authenticated);
        assert!(state.user.is_none());
        assert_eq!(storage.token().unwrap(), None);

        let notification = state.notification(id).unwrap();
        assert_eq!(notification.kind, NotificationKind::Success);
        assert_eq!(notification.title, "Logout");
        assert_eq!(notification.message, "Você foi desconectado com sucesso.");
    }
}
