use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::Serialize;

/// Environment variables checked, in order, for the service URL and anon key.
pub const URL_ENV_VARS: [&str; 3] = [
    "PI_LEAD_MONITOR_URL",
    "SUPABASE_URL",
    "NEXT_PUBLIC_SUPABASE_URL",
];
pub const ANON_KEY_ENV_VARS: [&str; 3] = [
    "PI_LEAD_MONITOR_ANON_KEY",
    "SUPABASE_ANON_KEY",
    "NEXT_PUBLIC_SUPABASE_ANON_KEY",
];

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigFile {
    pub url: Option<String>,
    #[serde(alias = "key")]
    pub anon_key: Option<String>,
    pub view: Option<String>,
    pub table: Option<String>,
    pub timeout: Option<u64>,
    pub refresh_interval: Option<u64>,
    pub auto_refresh: Option<bool>,
    pub min_score: Option<f64>,
    pub severity: Option<String>,
    pub case_type: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub sort_dir: Option<String>,
    pub no_color: Option<bool>,
    pub status_filter: Option<bool>,
    pub row_expansion: Option<bool>,
    pub search_debounce_ms: Option<u64>,
}

/// Service endpoint and public key. Both must be present to talk to the service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub anon_key: String,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".pi-lead-monitor").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(ConfigFile::default()),
        Ok(contents) => serde_yaml::from_str::<ConfigFile>(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

fn first_non_empty(values: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    values
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

fn env_value(names: &[&str], lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    first_non_empty(names.iter().map(|name| lookup(name)))
}

/// Picks the URL and key from CLI, then config file, then environment. Returns `None`
/// when either half is missing, which callers treat as degraded mode.
pub fn resolve_credentials(
    cli_url: Option<String>,
    cli_key: Option<String>,
    cfg: &ConfigFile,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<Credentials> {
    let url = first_non_empty([cli_url, cfg.url.clone(), env_value(&URL_ENV_VARS, &lookup)])?;
    let anon_key = first_non_empty([
        cli_key,
        cfg.anon_key.clone(),
        env_value(&ANON_KEY_ENV_VARS, &lookup),
    ])?;
    Some(Credentials { url, anon_key })
}

pub fn process_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn default_config_yaml() -> String {
    r#"# PI Lead Monitor config
#
# Location (default):
#   ~/.pi-lead-monitor/config.yml

# Service (may also come from PI_LEAD_MONITOR_URL / PI_LEAD_MONITOR_ANON_KEY
# or SUPABASE_URL / SUPABASE_ANON_KEY). Without both, the monitor shows no data.
# url: https://your-project.supabase.co
# anon_key: your-public-anon-key

# Resources
view: leads_triaged
table: leads

# HTTP
timeout: 10

# Refresh
refresh_interval: 15
auto_refresh: false

# Default filters
min_score: 0
severity: all
case_type: all
status: all

# Display
sort: triaged_at
sort_dir: desc
no_color: false
status_filter: true
row_expansion: true
# search_debounce_ms: 300
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &Path) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    std::fs::write(path, default_config_yaml())
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(())
}
