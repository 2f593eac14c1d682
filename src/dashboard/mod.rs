pub mod commands;
pub mod poller;
pub mod render;

pub use commands::{CommandOutcome, Confirm, CLEAR_ALL_PROMPT, RESET_PROMPT};
pub use poller::{DashboardPoller, PollOutcome};
pub use render::{
    render_snapshot, severity_badge, severity_icon, AlertItem, AlertList, EntryRow, EntryTable,
    RenderedDashboard,
};
