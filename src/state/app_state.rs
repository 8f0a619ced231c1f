//! The application state tree and the partial updates merged into it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::UserProfile;
use crate::notifications::{Notification, NotificationId};

pub const RFM_COUNT: &str = "rfmCount";
pub const MESSAGE_COUNT: &str = "messageCount";
pub const CUSTOMER_COUNT: &str = "customerCount";
pub const INSIGHT_COUNT: &str = "insightCount";

/// Named non-negative counters shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DashboardStats(BTreeMap<String, u64>);

impl Default for DashboardStats {
    fn default() -> Self {
        Self(
            [RFM_COUNT, MESSAGE_COUNT, CUSTOMER_COUNT, INSIGHT_COUNT]
                .into_iter()
                .map(|name| (name.to_string(), 0))
                .collect(),
        )
    }
}

impl DashboardStats {
    /// Counter value; unknown counters read as zero.
    pub fn get(&self, name: &str) -> u64 {
        self.0.get(name).copied().unwrap_or(0)
    }

    pub fn set(&mut self, name: impl Into<String>, value: u64) {
        self.0.insert(name.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Overwrite the counters present in `other`, keeping the rest.
    pub fn merged(&self, other: &DashboardStats) -> DashboardStats {
        let mut next = self.clone();
        for (name, value) in other.iter() {
            next.set(name, value);
        }
        next
    }

    /// Stats holding only the given counters.
    pub fn from_counters<'a>(counters: impl IntoIterator<Item = (&'a str, u64)>) -> Self {
        Self(
            counters
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }
}

/// Everything the dashboard knows about the current session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationState {
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
    /// Display order: oldest first, newest at the tail.
    pub notifications: Vec<Notification>,
    pub current_page: String,
    pub dashboard_stats: DashboardStats,
    /// Result of the last RFM analysis, as returned by the backend.
    pub rfm_analysis: Option<Value>,
    /// Generated marketing messages, newest first.
    pub messages: Vec<Value>,
    /// Generated insights, newest first.
    pub insights: Vec<Value>,
    /// A request is in flight somewhere.
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for ApplicationState {
    fn default() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            notifications: Vec::new(),
            current_page: super::page::DEFAULT_PAGE.to_string(),
            dashboard_stats: DashboardStats::default(),
            rfm_analysis: None,
            messages: Vec::new(),
            insights: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

impl ApplicationState {
    /// Shallow key-wise merge: every key set in `patch` replaces the current
    /// value wholesale.
    ///
    /// An unauthenticated result never keeps a user.
    pub fn merged(&self, patch: StatePatch) -> ApplicationState {
        let mut next = self.clone();
        let StatePatch {
            user,
            is_authenticated,
            notifications,
            current_page,
            dashboard_stats,
            rfm_analysis,
            messages,
            insights,
            loading,
            error,
        } = patch;

        if let Some(user) = user {
            next.user = user;
        }
        if let Some(flag) = is_authenticated {
            next.is_authenticated = flag;
        }
        if let Some(list) = notifications {
            next.notifications = list;
        }
        if let Some(page) = current_page {
            next.current_page = page;
        }
        if let Some(stats) = dashboard_stats {
            next.dashboard_stats = stats;
        }
        if let Some(analysis) = rfm_analysis {
            next.rfm_analysis = analysis;
        }
        if let Some(list) = messages {
            next.messages = list;
        }
        if let Some(list) = insights {
            next.insights = list;
        }
        if let Some(flag) = loading {
            next.loading = flag;
        }
        if let Some(error) = error {
            next.error = error;
        }

        if !next.is_authenticated {
            next.user = None;
        }
        next
    }

    pub fn notification(&self, id: NotificationId) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }
}

/// A partial [`ApplicationState`]: `None` leaves a key untouched.
///
/// Keys that are themselves optional use a nested `Option`, so
/// `user: Some(None)` clears the user while `user: None` keeps it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    pub user: Option<Option<UserProfile>>,
    pub is_authenticated: Option<bool>,
    pub notifications: Option<Vec<Notification>>,
    pub current_page: Option<String>,
    pub dashboard_stats: Option<DashboardStats>,
    pub rfm_analysis: Option<Option<Value>>,
    pub messages: Option<Vec<Value>>,
    pub insights: Option<Vec<Value>>,
    pub loading: Option<bool>,
    pub error: Option<Option<String>>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, user: Option<UserProfile>) -> Self {
        self.user = Some(user);
        self
    }

    pub fn authenticated(mut self, flag: bool) -> Self {
        self.is_authenticated = Some(flag);
        self
    }

    pub fn notifications(mut self, list: Vec<Notification>) -> Self {
        self.notifications = Some(list);
        self
    }

    pub fn current_page(mut self, page: impl Into<String>) -> Self {
        self.current_page = Some(page.into());
        self
    }

    pub fn dashboard_stats(mut self, stats: DashboardStats) -> Self {
        self.dashboard_stats = Some(stats);
        self
    }

    pub fn rfm_analysis(mut self, analysis: Option<Value>) -> Self {
        self.rfm_analysis = Some(analysis);
        self
    }

    pub fn messages(mut self, list: Vec<Value>) -> Self {
        self.messages = Some(list);
        self
    }

    pub fn insights(mut self, list: Vec<Value>) -> Self {
        self.insights = Some(list);
        self
    }

    pub fn loading(mut self, flag: bool) -> Self {
        self.loading = Some(flag);
        self
    }

    pub fn error(mut self, error: Option<String>) -> Self {
        self.error = Some(error);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::NotificationKind;

    fn profile() -> UserProfile {
        UserProfile {
            id: 1,
            email: "ana@loja.com".into(),
            name: "Ana".into(),
            company: None,
            is_admin: false,
        }
    }

    #[test]
    fn test_default_state() {
        let state = ApplicationState::default();
        assert_eq!(state.current_page, "dashboard");
        assert!(!state.is_authenticated);
        assert_eq!(state.dashboard_stats.get(RFM_COUNT), 0);
        assert_eq!(state.dashboard_stats.iter().count(), 4);
    }

    #[test]
    fn test_merge_is_shallow() {
        let mut base = ApplicationState::default();
        base.dashboard_stats.set(RFM_COUNT, 3);
        base.loading = true;

        let next = base.merged(
            StatePatch::new().dashboard_stats(DashboardStats::from_counters([(CUSTOMER_COUNT, 9)])),
        );
        // Whole value replaced, no deep merge.
        assert_eq!(next.dashboard_stats.get(RFM_COUNT), 0);
        assert_eq!(next.dashboard_stats.get(CUSTOMER_COUNT), 9);
        assert!(next.loading);
    }

    #[test]
    fn test_merge_clears_user_when_unauthenticated() {
        let signed_in = ApplicationState::default()
            .merged(StatePatch::new().user(Some(profile())).authenticated(true));
        assert_eq!(signed_in.user.as_ref().map(|u| u.id), Some(1));

        let signed_out = signed_in.merged(StatePatch::new().authenticated(false));
        assert!(signed_out.user.is_none());

        let ignored = ApplicationState::default().merged(StatePatch::new().user(Some(profile())));
        assert!(ignored.user.is_none());
    }

    #[test]
    fn test_nested_option_clears_value() {
        let with_error = ApplicationState::default().merged(StatePatch::new().error(Some("x".into())));
        assert_eq!(with_error.error.as_deref(), Some("x"));
        assert_eq!(with_error.merged(StatePatch::new()).error.as_deref(), Some("x"));
        assert_eq!(with_error.merged(StatePatch::new().error(None)).error, None);
    }

    #[test]
    fn test_stats_merge_keeps_other_counters() {
        let mut stats = DashboardStats::default();
        stats.set(MESSAGE_COUNT, 4);
        let merged = stats.merged(&DashboardStats::from_counters([(RFM_COUNT, 2)]));
        assert_eq!(merged.get(MESSAGE_COUNT), 4);
        assert_eq!(merged.get(RFM_COUNT), 2);
    }

    #[test]
    fn test_lookup_notification() {
        let state = ApplicationState::default().merged(StatePatch::new().notifications(vec![
            Notification {
                id: NotificationId(5),
                kind: NotificationKind::Warning,
                title: "a".into(),
                message: "b".into(),
            },
        ]));
        assert!(state.notification(NotificationId(5)).is_some());
        assert!(state.notification(NotificationId(6)).is_none());
        assert!(StatePatch::new().is_empty());
        assert!(!StatePatch::new().loading(false).is_empty());
    }
}
