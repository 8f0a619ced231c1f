//! Authoritative holder of [`ApplicationState`] and fan-out notifier.
//!
//! The store replaces its state wholesale on every write and hands each
//! listener the same `Arc` snapshot. Writes issued from inside a listener
//! are queued and applied one by one after the current pass drains, each
//! followed by its own full fan-out. Writes from other threads wait for the
//! running pass to finish and then dispatch on their own thread, so
//! `set_state` has always applied its write and notified every listener by
//! the time it returns. A listener never sees two versions of the state
//! during one pass and no merge ever interleaves with another.
//!
//! All convenience mutators go through the same queue as
//! [`set_state`](StateStore::set_state); they compute their patch from the
//! state current at the moment they are applied.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, ReentrantMutex};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::app_state::{ApplicationState, DashboardStats, StatePatch};
use super::page::page_name_from_path;
use crate::api::{ApiClient, UserProfile};
use crate::errors::StorageError;
use crate::notifications::{EvictionTimers, IdAllocator, Notification, NotificationId, NotificationKind};
use crate::storage::CredentialStorage;

/// Shared, read-only view of the state handed to listeners.
pub type Snapshot = Arc<ApplicationState>;

/// A state listener.
pub type Listener = Arc<dyn Fn(&Snapshot) + Send + Sync>;

/// Title of the notification raised by [`StateStore::set_error`].
pub const ERROR_NOTIFICATION_TITLE: &str = "Erro";

type Update = Box<dyn FnOnce(&ApplicationState) -> Option<StatePatch> + Send>;

struct Shared {
    state: Snapshot,
    listeners: Vec<(u64, Listener)>,
    queue: VecDeque<Update>,
    dispatching: bool,
}

struct StoreInner {
    shared: Mutex<Shared>,
    /// Held by the thread running a fan-out, including across listener calls.
    dispatch: ReentrantMutex<()>,
    ids: IdAllocator,
    timers: EvictionTimers,
    storage: Arc<dyn CredentialStorage>,
    api: Arc<dyn ApiClient>,
    profile_load: Mutex<Option<JoinHandle<()>>>,
    next_listener: AtomicU64,
    default_duration: Duration,
}

/// Cheaply cloneable handle to the application state store.
///
/// Build one per application session and pass clones to whoever needs to
/// read or mutate state.
#[derive(Clone)]
pub struct StateStore {
    inner: Arc<StoreInner>,
}

/// Registration returned by [`StateStore::subscribe`].
///
/// Dropping it keeps the listener registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    store: Weak<StoreInner>,
}

/// Non-owning handle to a [`StateStore`], for collaborators that must not
/// keep the store alive (such as render surfaces the store indirectly owns).
#[derive(Debug, Clone)]
pub struct WeakStateStore {
    inner: Weak<StoreInner>,
}

impl WeakStateStore {
    pub fn upgrade(&self) -> Option<StateStore> {
        self.inner.upgrade().map(|inner| StateStore { inner })
    }
}

impl Subscription {
    /// Remove the listener. Safe to call from inside any listener and more
    /// than once; returns whether the listener was still registered.
    pub fn unsubscribe(&self) -> bool {
        let Some(inner) = self.store.upgrade() else {
            return false;
        };
        let mut shared = inner.shared.lock();
        let before = shared.listeners.len();
        shared.listeners.retain(|(id, _)| *id != self.id);
        before != shared.listeners.len()
    }
}

impl StateStore {
    /// Create a store holding the default state.
    ///
    /// No I/O happens here; call [`init`](Self::init) to derive the current
    /// page and restore a persisted session.
    pub fn new(storage: Arc<dyn CredentialStorage>, api: Arc<dyn ApiClient>) -> Self {
        Self::with_default_duration(storage, api, NotificationKind::Info.default_duration())
    }

    /// Same as [`new`](Self::new) with a different lifetime for
    /// notifications raised without one (such as by [`set_error`](Self::set_error)).
    pub fn with_default_duration(
        storage: Arc<dyn CredentialStorage>,
        api: Arc<dyn ApiClient>,
        default_duration: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                shared: Mutex::new(Shared {
                    state: Arc::new(ApplicationState::default()),
                    listeners: Vec::new(),
                    queue: VecDeque::new(),
                    dispatching: false,
                }),
                dispatch: ReentrantMutex::new(()),
                ids: IdAllocator::new(),
                timers: EvictionTimers::new(),
                storage,
                api,
                profile_load: Mutex::new(None),
                next_listener: AtomicU64::new(1),
                default_duration,
            }),
        }
    }

    /// Lifetime used for notifications raised without an explicit one.
    pub fn default_duration(&self) -> Duration {
        self.inner.default_duration
    }

    /// Boot the store for the page at `location_path`.
    ///
    /// With a persisted token the session is assumed authenticated right
    /// away and the profile is fetched in the background; a failed fetch
    /// rolls the session back to unauthenticated. Await
    /// [`settled`](Self::settled) to wait for that fetch.
    pub fn init(&self, location_path: &str) {
        match self.inner.storage.token() {
            Ok(Some(_)) => {
                self.set_state(StatePatch::new().authenticated(true));
                self.spawn_profile_load();
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "could not read persisted session token"),
        }
        self.set_current_page(page_name_from_path(location_path));
    }

    /// Wait for the boot-time profile load, if one is running.
    pub async fn settled(&self) {
        let pending = self.inner.profile_load.lock().take();
        if let Some(handle) = pending {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::error!(error = %e, "profile load task failed");
                }
            }
        }
    }

    fn spawn_profile_load(&self) {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("no async runtime to load the user profile, signing out");
            self.set_state(StatePatch::new().user(None).authenticated(false));
            return;
        };
        let store = self.clone();
        let task = runtime.spawn(async move { store.load_user_profile().await });
        if let Some(previous) = self.inner.profile_load.lock().replace(task) {
            previous.abort();
        }
    }

    async fn load_user_profile(&self) {
        match self.inner.api.get_user_profile().await {
            Ok(user) => {
                // The session may have been cleared while the request ran.
                if matches!(self.inner.storage.token(), Ok(Some(_))) {
                    tracing::debug!(user_id = user.id, "user profile loaded");
                    self.set_state(StatePatch::new().user(Some(user)).authenticated(true));
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "error loading user profile");
                self.set_state(StatePatch::new().user(None).authenticated(false));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Core surface
    // -----------------------------------------------------------------------

    /// An owned copy of the current state.
    pub fn get_state(&self) -> ApplicationState {
        self.inner.shared.lock().state.as_ref().clone()
    }

    /// The current snapshot, shared rather than copied.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.inner.shared.lock().state)
    }

    /// Merge `patch` into the state and notify every listener.
    pub fn set_state(&self, patch: StatePatch) {
        self.enqueue(Box::new(move |_| Some(patch)));
    }

    /// Register `listener` for every subsequent state change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        self.inner
            .shared
            .lock()
            .listeners
            .push((id, Arc::new(listener)));
        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    pub fn downgrade(&self) -> WeakStateStore {
        WeakStateStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.shared.lock().listeners.len()
    }

    /// Number of notifications with a pending eviction timer.
    pub fn pending_evictions(&self) -> usize {
        self.inner.timers.pending()
    }

    /// Drop all listeners, cancel eviction timers and any running profile
    /// load. State is left as it is.
    pub fn teardown(&self) {
        {
            let mut shared = self.inner.shared.lock();
            shared.listeners.clear();
            shared.queue.clear();
        }
        self.inner.timers.cancel_all();
        if let Some(task) = self.inner.profile_load.lock().take() {
            task.abort();
        }
        tracing::debug!("state store torn down");
    }

    fn enqueue(&self, update: Update) {
        // Re-entrant for the dispatching thread only; others block here
        // until the running pass has drained.
        let _dispatch = self.inner.dispatch.lock();
        {
            let mut shared = self.inner.shared.lock();
            shared.queue.push_back(update);
            if shared.dispatching {
                return;
            }
            shared.dispatching = true;
        }
        self.drain();
    }

    fn drain(&self) {
        loop {
            let (snapshot, listeners) = {
                let mut shared = self.inner.shared.lock();
                let Some(update) = shared.queue.pop_front() else {
                    shared.dispatching = false;
                    return;
                };
                let Some(patch) = update(&shared.state) else {
                    continue;
                };
                shared.state = Arc::new(shared.state.merged(patch));
                (Arc::clone(&shared.state), shared.listeners.clone())
            };

            tracing::trace!(listeners = listeners.len(), "state fan-out");
            for (id, listener) in listeners {
                let outcome = catch_unwind(AssertUnwindSafe(|| listener(&snapshot)));
                if outcome.is_err() {
                    tracing::error!(listener = id, "state listener panicked");
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Session (`user`, `is_authenticated`)
    // -----------------------------------------------------------------------

    /// Mark the session authenticated as `user`, persisting `token` first
    /// when one is given.
    pub fn set_user(&self, user: UserProfile, token: Option<&str>) -> Result<(), StorageError> {
        if let Some(token) = token {
            self.inner.storage.set_token(token)?;
        }
        self.set_state(StatePatch::new().user(Some(user)).authenticated(true));
        Ok(())
    }

    /// Sign out: forget the persisted token and the user.
    ///
    /// The state is cleared even when the token could not be removed; the
    /// storage error is still reported.
    pub fn clear_user(&self) -> Result<(), StorageError> {
        let removed = self.inner.storage.clear_token();
        self.set_state(StatePatch::new().user(None).authenticated(false));
        removed
    }

    // -----------------------------------------------------------------------
    // Notifications (`notifications`)
    // -----------------------------------------------------------------------

    /// Append a notification and schedule its removal after `duration`.
    pub fn add_notification(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        duration: Duration,
    ) -> NotificationId {
        let id = self.inner.ids.next();
        let notification = Notification {
            id,
            kind,
            title: title.into(),
            message: message.into(),
        };

        self.enqueue(Box::new(move |state| {
            if state.notification(notification.id).is_some() {
                return None;
            }
            let mut list = state.notifications.clone();
            list.push(notification);
            Some(StatePatch::new().notifications(list))
        }));

        let store = self.downgrade();
        self.inner.timers.schedule(id, duration, move || {
            if let Some(store) = store.upgrade() {
                store.remove_notification(id);
            }
        });
        id
    }

    /// Remove a notification and cancel its timer. Unknown ids are ignored
    /// and trigger no fan-out.
    pub fn remove_notification(&self, id: NotificationId) {
        self.inner.timers.cancel(id);
        self.enqueue(Box::new(move |state| {
            state.notification(id)?;
            let list = state
                .notifications
                .iter()
                .filter(|n| n.id != id)
                .cloned()
                .collect();
            Some(StatePatch::new().notifications(list))
        }));
    }

    // -----------------------------------------------------------------------
    // Flags (`loading`, `error`, `current_page`)
    // -----------------------------------------------------------------------

    pub fn set_loading(&self, loading: bool) {
        self.set_state(StatePatch::new().loading(loading));
    }

    /// Record `error`; a message also raises an error notification.
    ///
    /// Touches `error`, and `notifications` when `error` is `Some`.
    pub fn set_error(&self, error: Option<String>) {
        let message = error.clone();
        self.set_state(StatePatch::new().error(error));
        if let Some(message) = message {
            self.add_notification(
                NotificationKind::Error,
                ERROR_NOTIFICATION_TITLE,
                message,
                self.inner.default_duration,
            );
        }
    }

    pub fn set_current_page(&self, page: impl Into<String>) {
        self.set_state(StatePatch::new().current_page(page));
    }

    // -----------------------------------------------------------------------
    // Page data (`dashboard_stats`, `rfm_analysis`, `messages`, `insights`)
    // -----------------------------------------------------------------------

    /// Overwrite the counters present in `stats`; other counters keep their
    /// value.
    pub fn update_dashboard_stats(&self, stats: DashboardStats) {
        self.enqueue(Box::new(move |state| {
            Some(StatePatch::new().dashboard_stats(state.dashboard_stats.merged(&stats)))
        }));
    }

    pub fn set_rfm_analysis(&self, analysis: Option<Value>) {
        self.set_state(StatePatch::new().rfm_analysis(analysis));
    }

    pub fn set_messages(&self, messages: Vec<Value>) {
        self.set_state(StatePatch::new().messages(messages));
    }

    /// Prepend a generated message.
    pub fn add_message(&self, message: Value) {
        self.enqueue(Box::new(move |state| {
            let mut list = Vec::with_capacity(state.messages.len() + 1);
            list.push(message);
            list.extend(state.messages.iter().cloned());
            Some(StatePatch::new().messages(list))
        }));
    }

    pub fn set_insights(&self, insights: Vec<Value>) {
        self.set_state(StatePatch::new().insights(insights));
    }

    /// Prepend a generated insight.
    pub fn add_insight(&self, insight: Value) {
        self.enqueue(Box::new(move |state| {
            let mut list = Vec::with_capacity(state.insights.len() + 1);
            list.push(insight);
            list.extend(state.insights.iter().cloned());
            Some(StatePatch::new().insights(list))
        }));
    }
}
