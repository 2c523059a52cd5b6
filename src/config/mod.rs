use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigFile {
    pub api_base: Option<String>,
    pub relay_url: Option<String>,
    pub username: Option<String>,
    pub command: Option<String>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub view: Option<String>,
    pub expand_all: Option<bool>,
    pub timeout: Option<u64>,
    pub no_color: Option<bool>,
    pub credentials: Option<String>,
    #[serde(alias = "listen")]
    pub bind: Option<String>,
    pub upstream: Option<String>,
    pub assets_dir: Option<String>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn config_dir() -> Option<PathBuf> {
    Some(home_dir()?.join(".omarlens"))
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(config_dir()?.join("config.yml"))
}

pub fn default_credentials_path() -> Option<PathBuf> {
    Some(config_dir()?.join("credentials.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).to_string_lossy().to_string()
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_yaml::from_str::<Option<ConfigFile>>(&contents)
            .map(Option::unwrap_or_default)
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

fn default_config_yaml() -> String {
    r#"# omarlens config
#
# Location (default):
#   ~/.omarlens/config.yml

# Upstream API used by `fetch` when no relay is configured
api_base: https://api.omar-thing.site/

# Send `fetch` requests through a relay started with `omarlens serve`
# relay_url: http://127.0.0.1:8787

# Query defaults (optional)
# username: someone
# command: profile

# Output (optional)
# output: ./followings.html
# output_format: html
view: json
expand_all: false

# HTTP (optional, seconds; unset means wait for the network)
# timeout: 30

# Where the API key is remembered
# credentials: ~/.omarlens/credentials.yml

# Relay (`omarlens serve`)
bind: 127.0.0.1:8787
upstream: https://api.omar-thing.site/
# assets_dir: ./public

# Output styling
no_color: false
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &PathBuf) -> Result<(), String> {
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
    let contents = default_config_yaml();
    std::fs::write(path, contents)
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(())
}
