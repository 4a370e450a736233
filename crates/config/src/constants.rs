//! Defaults that are not worth a config lookup at every use site

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5001";

/// Gap between the end of one status poll and the start of the next.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// Records shown per severity list before collapsing the rest into a count.
pub const DEFAULT_DISPLAY_LIMIT: usize = 10;

pub const ENV_BACKEND_URL: &str = "CSCAN_BACKEND_URL";
pub const ENV_POLL_INTERVAL_MS: &str = "CSCAN_POLL_INTERVAL_MS";
pub const ENV_OUTPUT: &str = "CSCAN_OUTPUT";
pub const ENV_COLOR: &str = "CSCAN_COLOR";
