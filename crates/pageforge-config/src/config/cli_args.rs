use std::path::PathBuf;

/// CLI overrides applied on top of the configuration file.
///
/// Every field is optional; `None` leaves the file or default value in place.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub llm_provider: Option<String>,
    pub model: Option<String>,
    pub max_attempts: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub max_repairs: Option<u32>,
    pub revalidate: Option<bool>,
    pub output_path: Option<PathBuf>,
}
