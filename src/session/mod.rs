mod capture;
pub mod controller;
pub mod state;

pub use capture::{SkipReason, SubmissionHandle, TickOutcome};
pub use controller::{CaptureConfig, MonitorController, SessionControl};
pub use state::{SessionSnapshot, SessionStatus};
