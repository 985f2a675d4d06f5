//! Configuration resolution
//!
//! All settings come together in one explicit [`Config`] value built once
//! at startup and passed by reference into the pipeline; nothing reads
//! configuration state after that point.
//!
//! Resolution order, highest priority first: command-line overrides, then
//! the TOML configuration file, then defaults. The file lives at
//! `$XDG_CONFIG_HOME/lwn2email.toml` (`~/.config/lwn2email.toml` when the
//! variable is unset) and may be absent. Marking is opt-in: the default
//! marks directory (`$XDG_DATA_HOME/lwn2email/marks`) is only applied when
//! a configuration file exists, so a bare ad-hoc run never scatters state
//! files around.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Resolved runtime configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Where delivery marks are stored; `None` disables marking
    pub marks_dir: Option<PathBuf>,

    /// Write the edition to stdout instead of mailing it
    pub no_email: bool,

    /// Destination address for the edition mail
    pub address: String,

    /// LWN.net account name
    pub username: String,

    /// LWN.net account password
    pub password: String,

    /// Explicit sendmail binary path; `None` means search PATH
    pub sendmail_path: Option<PathBuf>,
}

/// Command-line values layered on top of the configuration file.
///
/// The binary fills this from its argument parser; tests construct it
/// directly.
#[derive(Debug, Default)]
pub struct Overrides {
    /// Explicit configuration file path
    pub config_file: Option<PathBuf>,
    /// Marks directory override
    pub marks_directory: Option<PathBuf>,
    /// Force stdout mode
    pub no_email: bool,
    /// Destination address override
    pub address: Option<String>,
    /// Account name override
    pub username: Option<String>,
    /// Account password override
    pub password: Option<String>,
    /// Sendmail binary override
    pub sendmail_path: Option<PathBuf>,
}

/// On-disk configuration file shape
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    marks_directory: Option<PathBuf>,
    no_email: Option<bool>,
    address: Option<String>,
    username: Option<String>,
    password: Option<String>,
    sendmail_path: Option<PathBuf>,
}

/// Resolve the effective configuration.
///
/// # Errors
///
/// Returns [`Error::Config`] when the file is unreadable or malformed,
/// when an explicitly-given file does not exist, when the home directory
/// cannot be determined while a default path is needed, or when any of
/// `address`, `username`, `password` is missing after all sources are
/// merged.
pub fn resolve(overrides: Overrides) -> Result<Config> {
    let explicit_file = overrides.config_file.is_some();
    let config_path = match &overrides.config_file {
        Some(path) => path.clone(),
        None => xdg_dir("XDG_CONFIG_HOME", &[".config"])?.join("lwn2email.toml"),
    };

    let file = match fs::read_to_string(&config_path) {
        Ok(text) => Some(toml::from_str::<FileConfig>(&text).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {e}", config_path.display()),
            key: None,
        })?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if explicit_file {
                return Err(Error::Config {
                    message: format!("configuration file {} not found", config_path.display()),
                    key: Some("config".to_string()),
                });
            }
            None
        }
        Err(e) => return Err(Error::Io(e)),
    };
    let file_present = file.is_some();
    let file = file.unwrap_or_default();

    // With no configuration file at all, marking stays disabled unless
    // explicitly requested.
    let marks_dir = match overrides.marks_directory.or(file.marks_directory) {
        Some(dir) => Some(dir),
        None if file_present => Some(
            xdg_dir("XDG_DATA_HOME", &[".local", "share"])?
                .join("lwn2email")
                .join("marks"),
        ),
        None => None,
    };

    let address = overrides.address.or(file.address);
    let username = overrides.username.or(file.username);
    let password = overrides.password.or(file.password);

    let missing: Vec<&str> = [
        ("address", address.is_none()),
        ("username", username.is_none()),
        ("password", password.is_none()),
    ]
    .iter()
    .filter_map(|&(name, absent)| absent.then_some(name))
    .collect();
    if !missing.is_empty() {
        return Err(Error::Config {
            message: format!(
                "missing required settings: {} (set them in {} or pass the matching flags)",
                missing.join(", "),
                config_path.display()
            ),
            key: Some(missing[0].to_string()),
        });
    }

    Ok(Config {
        marks_dir,
        no_email: overrides.no_email || file.no_email.unwrap_or(false),
        address: address.unwrap_or_default(),
        username: username.unwrap_or_default(),
        password: password.unwrap_or_default(),
        sendmail_path: overrides.sendmail_path.or(file.sendmail_path),
    })
}

/// Resolve an XDG base directory: the environment variable if set and
/// non-empty, otherwise `$HOME` joined with the standard fallback path.
fn xdg_dir(env_var: &str, home_suffix: &[&str]) -> Result<PathBuf> {
    if let Ok(dir) = env::var(env_var)
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    let home = env::var_os("HOME").ok_or_else(|| Error::Config {
        message: "cannot determine home directory".to_string(),
        key: Some("HOME".to_string()),
    })?;
    let mut path = PathBuf::from(home);
    for part in home_suffix {
        path.push(part);
    }
    Ok(path)
}
