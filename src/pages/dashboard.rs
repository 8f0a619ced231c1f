//! Dashboard page controller.
//!
//! Loads the recent analysis history and the message total from the
//! backend and folds them into the store's dashboard counters.

use std::sync::Arc;

use crate::api::{AnalysisSummary, ApiClient};
use crate::errors::ApiError;
use crate::notifications::NotificationCenter;
use crate::state::{DashboardStats, StateStore, CUSTOMER_COUNT, INSIGHT_COUNT, MESSAGE_COUNT, RFM_COUNT};

/// Number of analyses shown in the "recent analyses" list.
pub const RECENT_ANALYSES_LIMIT: u32 = 5;

pub const LOAD_ERROR_TITLE: &str = "Erro ao carregar dados";
pub const LOAD_ERROR_MESSAGE: &str = "Não foi possível carregar os dados do dashboard.";

pub struct DashboardController {
    store: StateStore,
    notifications: Arc<NotificationCenter>,
    api: Arc<dyn ApiClient>,
}

impl DashboardController {
    pub fn new(
        store: StateStore,
        notifications: Arc<NotificationCenter>,
        api: Arc<dyn ApiClient>,
    ) -> Self {
        Self {
            store,
            notifications,
            api,
        }
    }

    /// Refresh the dashboard counters and return the recent analyses.
    ///
    /// `loading` is raised for the duration of the call. A failed history
    /// fetch raises an error notification and is returned; a failed message
    /// count only counts as zero.
    pub async fn load(&self) -> Result<Vec<AnalysisSummary>, ApiError> {
        self.store.set_loading(true);
        let outcome = self.fetch().await;

        match &outcome {
            Ok((_, stats)) => self.store.update_dashboard_stats(stats.clone()),
            Err(e) => {
                tracing::error!(error = %e, "error loading dashboard data");
                self.notifications.error(LOAD_ERROR_TITLE, LOAD_ERROR_MESSAGE);
            }
        }
        self.store.set_loading(false);

        outcome.map(|(history, _)| history)
    }

    async fn fetch(&self) -> Result<(Vec<AnalysisSummary>, DashboardStats), ApiError> {
        let history = self.api.get_analysis_history(RECENT_ANALYSES_LIMIT).await?;
        let customers: u64 = history.iter().map(|a| a.record_count).sum();

        let messages = match self.api.get_user_messages(1, 0).await {
            Ok(page) => page.total,
            Err(e) => {
                tracing::warn!(error = %e, "error loading messages count");
                0
            }
        };

        let stats = DashboardStats::from_counters([
            (RFM_COUNT, history.len() as u64),
            (MESSAGE_COUNT, messages),
            (CUSTOMER_COUNT, customers),
            (INSIGHT_COUNT, 0),
        ]);
        Ok((history, stats))
    }
}
