use std::path::PathBuf;

use attain_core::{EngineConfig, Scope};

pub const DEFAULT_SNAPSHOT_PATH: &str = "./data/snapshot.json";
pub const DEFAULT_REPORT_MODE: &str = "cohort";

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub snapshot_path: PathBuf,
    pub scope: Scope,
    pub engine: EngineConfig,
    /// `cohort` or `student`, lowercased.
    pub report_mode: String,
    /// Subject for `student` reports.
    pub subject: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            scope: Scope::all(),
            engine: EngineConfig::default(),
            report_mode: DEFAULT_REPORT_MODE.to_string(),
            subject: None,
        }
    }
}

impl ReportConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable lookup; `from_env` passes the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let snapshot_path = var("ATTAIN_SNAPSHOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_PATH));
        let scope = Scope {
            department: var("ATTAIN_DEPARTMENT"),
            course: var("ATTAIN_COURSE"),
        };
        let parallel = match var("ATTAIN_PARALLEL") {
            Some(v) => !matches!(
                v.to_ascii_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            ),
            None => true,
        };
        let max_path_evaluations = var("ATTAIN_MAX_BATCH_PATHS")
            .and_then(|v| v.parse::<usize>().ok())
            .map(|v| v.max(1));
        let report_mode = var("ATTAIN_REPORT")
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_else(|| DEFAULT_REPORT_MODE.to_string());

        Self {
            snapshot_path,
            scope,
            engine: EngineConfig {
                parallel,
                max_path_evaluations,
            },
            report_mode,
            subject: var("ATTAIN_SUBJECT"),
        }
    }
}
