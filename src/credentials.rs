// Credential resolution and persistence. Credentials come from the
// command line, the process environment or a dotfile, in that order.

use crate::error::CredentialsError;
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Dotfile written by `config` in the working directory.
pub const LOCAL_FILE: &str = ".env";
/// Dotfile written by `config --global` in the home directory.
pub const GLOBAL_FILE: &str = ".shopify-cli.env";

const DOMAIN: &str = "DOMAIN";
const KEY: &str = "KEY";
const PASSWORD: &str = "PASSWORD";

/// Private app credentials for one shop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auth {
    pub domain: String,
    pub api_key: String,
    pub password: String,
}

impl Auth {
    /// The shop handle, e.g. `niceshoes` for `https://niceshoes.myshopify.com`.
    pub fn shop_name(&self) -> String {
        self.domain
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
            .replace(".myshopify.com", "")
    }

    fn render(&self) -> String {
        format!(
            "{DOMAIN}={}\n{KEY}={}\n{PASSWORD}={}",
            self.domain, self.api_key, self.password
        )
    }
}

/// Credential values given on the command line. Any of them may be absent.
#[derive(Debug, Clone, Default)]
pub struct Partial {
    pub domain: Option<String>,
    pub api_key: Option<String>,
    pub password: Option<String>,
}

impl Partial {
    /// Fill unset fields from `other`.
    fn or(self, other: Partial) -> Partial {
        Partial {
            domain: self.domain.or(other.domain),
            api_key: self.api_key.or(other.api_key),
            password: self.password.or(other.password),
        }
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Partial {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Partial {
            domain: get(DOMAIN),
            api_key: get(KEY),
            password: get(PASSWORD),
        }
    }

    fn complete(self) -> Option<Auth> {
        Some(Auth {
            domain: self.domain?,
            api_key: self.api_key?,
            password: self.password?,
        })
    }
}

/// Resolve credentials from flags, then the environment, then the local
/// dotfile in `cwd`, then the global dotfile in the home directory.
pub fn resolve(flags: Partial, cwd: &Path) -> Result<Auth, CredentialsError> {
    let mut merged = flags.or(Partial::from_lookup(|k| std::env::var(k).ok()));

    let mut files = vec![cwd.join(LOCAL_FILE)];
    if let Some(home) = dirs::home_dir() {
        files.push(home.join(GLOBAL_FILE));
    }
    for path in files {
        if merged.domain.is_some() && merged.api_key.is_some() && merged.password.is_some() {
            break;
        }
        if !path.is_file() {
            continue;
        }
        debug!("reading credentials from {}", path.display());
        let values = load(&path)?;
        merged = merged.or(Partial::from_lookup(|k| values.get(k).cloned()));
    }

    merged.complete().ok_or(CredentialsError::Missing)
}

/// Parse a `NAME=value` dotfile. Blank lines and `#` comments are
/// skipped; surrounding quotes are stripped from values.
pub fn load(path: &Path) -> Result<HashMap<String, String>, CredentialsError> {
    let content = fs::read_to_string(path).map_err(|source| CredentialsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse(&content))
}

fn parse(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (name, value) = line.split_once('=')?;
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            Some((name.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// Where `config` writes credentials.
pub fn target_path(cwd: &Path, global: bool) -> Result<PathBuf, CredentialsError> {
    if global {
        let home = dirs::home_dir().ok_or(CredentialsError::NoHome)?;
        Ok(home.join(GLOBAL_FILE))
    } else {
        Ok(cwd.join(LOCAL_FILE))
    }
}

/// Replace the dotfile at `path` with `auth`.
pub fn save(path: &Path, auth: &Auth) -> Result<(), CredentialsError> {
    let io = |source: std::io::Error| CredentialsError::Io {
        path: path.display().to_string(),
        source,
    };
    if path.exists() {
        fs::remove_file(path).map_err(io)?;
    }
    fs::write(path, auth.render()).map_err(io)
}
