use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::UserId;

/// Application-level constants
pub const APP_NAME: &str = "Case Inbox";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Rows per results page unless the host asks otherwise
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Platform data dir (e.g. ~/.local/share/CaseInbox), falling back to the
/// working directory when the platform has none.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("CaseInbox")
}

/// Get the default case database path
pub fn cases_db_path() -> PathBuf {
    app_data_dir().join("cases.db")
}

/// `RUST_LOG` fallback used by `init_tracing`
pub fn default_log_filter() -> &'static str {
    "case_inbox_lib=info"
}

/// Per-inbox settings supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxConfig {
    /// Signed-in user, needed for the "my cases" filter.
    pub current_user_id: Option<UserId>,
    pub page_size: u32,
    pub database_path: PathBuf,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            current_user_id: None,
            page_size: DEFAULT_PAGE_SIZE,
            database_path: cases_db_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_path_under_app_data() {
        let db = cases_db_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("cases.db"));
    }

    #[test]
    fn app_data_dir_is_named_for_app() {
        assert!(app_data_dir().ends_with("CaseInbox"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn default_config() {
        let config = InboxConfig::default();
        assert_eq!(config.current_user_id, None);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.database_path, cases_db_path());
    }

    #[test]
    fn log_filter_targets_crate() {
        assert!(default_log_filter().starts_with("case_inbox_lib"));
    }
}
