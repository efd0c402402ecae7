//! Application state management

use std::path::{Path, PathBuf};
use std::sync::Arc;

use directories::ProjectDirs;
use rollcall_api::Gateway;
use rollcall_core::{AttendanceService, Error, PolicyConfig, Result, SqliteStore, SystemClock};

const DATABASE_FILE: &str = "rollcall.db";
const CONFIG_FILE: &str = "rollcall.toml";

/// Main application state
pub struct AppState {
    pub gateway: Gateway<SqliteStore>,
    data_dir: PathBuf,
}

impl AppState {
    /// Open the database and load the policy
    ///
    /// Explicit paths win over the per-user defaults.
    pub fn new(config: Option<&Path>, database: Option<&Path>) -> Result<Self> {
        let config_path = match config {
            Some(path) => path.to_path_buf(),
            None => Self::project_dirs()?.config_dir().join(CONFIG_FILE),
        };
        let policy = PolicyConfig::load_or_default(&config_path)?;

        let db_path = match database {
            Some(path) => path.to_path_buf(),
            None => Self::project_dirs()?.data_dir().join(DATABASE_FILE),
        };
        let data_dir = db_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        // Ensure parent directory exists
        if !data_dir.as_os_str().is_empty() {
            std::fs::create_dir_all(&data_dir)?;
        }

        tracing::debug!(config = %config_path.display(), database = %db_path.display(), "Opening state");
        let store = Arc::new(SqliteStore::open(&db_path)?);
        let service = AttendanceService::new(store, Arc::new(SystemClock), policy)?;

        Ok(Self {
            gateway: Gateway::new(service),
            data_dir,
        })
    }

    pub fn service(&self) -> &AttendanceService<SqliteStore> {
        self.gateway.service()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "onyx", "rollcall").ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine data directory",
            ))
        })
    }
}
