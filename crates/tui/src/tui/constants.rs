use std::time::Duration;

pub(crate) const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub(crate) const TICK_RATE: Duration = Duration::from_millis(200);
pub(crate) const STATUS_TTL: Duration = Duration::from_secs(5);

pub(crate) const STATUS_REFRESHED: &str = "Refreshed tasks";
pub(crate) const STATUS_NEW_TASK: &str =
    "New task • Tab moves between fields • Ctrl+T advanced mode • Ctrl+S submit • Esc cancel";
pub(crate) const STATUS_ADVANCED_MODE: &str =
    "Advanced mode • Ctrl+F switches JSON/YAML • Ctrl+E loads the example";
pub(crate) const STATUS_SIMPLE_MODE: &str =
    "Simple mode • editor changes are kept but not copied back into the fields";
pub(crate) const STATUS_FORMAT_SIMPLE_ONLY: &str =
    "Switch to advanced mode (Ctrl+T) to change the configuration format";
pub(crate) const STATUS_EXAMPLE_LOADED: &str = "Loaded the example configuration";
pub(crate) const STATUS_SUBMIT_CANCELLED: &str = "Submission cancelled, draft discarded";
pub(crate) const STATUS_NOTHING_SELECTED: &str = "No task selected";
