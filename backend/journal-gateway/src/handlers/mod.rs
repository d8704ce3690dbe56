/// HTTP handlers for the gateway's orchestrator-facing endpoints
pub mod dashboard;
pub mod journals;

pub use dashboard::{cache_stats, get_dashboard, invalidate_dashboard};
pub use journals::{create_journal, get_journal, health};

use crate::clients::{HttpEntryOwnerClient, HttpLinkClient, HttpTaskClient, HttpUserClient};
use crate::dashboard::DashboardService;
use crate::saga::JournalCreationSaga;

/// Concrete saga type the HTTP layer is wired against
pub type AppSaga = JournalCreationSaga<HttpEntryOwnerClient, HttpLinkClient, HttpTaskClient>;

/// Concrete dashboard service type the HTTP layer is wired against
pub type AppDashboard = DashboardService<HttpEntryOwnerClient, HttpTaskClient, HttpUserClient>;
