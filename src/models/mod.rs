pub mod dashboard;
pub mod detection;
pub mod reply;

pub use dashboard::{ActiveAlert, DashboardSnapshot, DashboardStatsResponse, RecentEntry, Severity};
pub use detection::{AnalyzeRequest, AnalyzeResponse, Detection};
pub use reply::{CommandReply, MonitoringStatus, ReplyStatus};
