#![forbid(unsafe_code)]

pub mod app_services;
pub mod board_service;
pub mod dashboard_service;
pub mod drills;
pub mod error;
pub mod module_service;
pub mod remediation_service;

pub use vault_core::Clock;

pub use app_services::AppServices;
pub use board_service::{Board, BoardService, Lane, TaskFeed};
pub use dashboard_service::{DashboardService, TrackDashboard};
pub use drills::{AnswerResult, DrillCompletion, DrillService, DrillSession};
pub use error::{AppServicesError, BoardError, DashboardError, DrillError, VaultError};
pub use module_service::ModuleService;
pub use remediation_service::{EmissionOutcome, RemediationEmitter};
