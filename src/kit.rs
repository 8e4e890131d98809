// Theme Kit integration: config.yml generation and a thin wrapper
// around the external `theme` binary.

use crate::error::SyncError;
use crate::model::Theme;
use log::debug;
use serde::Serialize;
use serde_yaml::Mapping;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const DEFAULT_CONFIG_NAME: &str = "config.yml";
pub const DEFAULT_BIN: &str = "theme";
pub const INSTALL_SCRIPT: &str =
    "curl -s https://raw.githubusercontent.com/Shopify/themekit/master/scripts/install | sudo python";

/// Turn a theme name into a Theme Kit environment name.
///
/// Whitespace becomes `-`, anything outside `[A-Za-z0-9_-]` is dropped and
/// the result is lowercased.
pub fn sanitize_theme_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect::<String>()
        .to_lowercase()
}

#[derive(Serialize)]
struct Environment<'a> {
    password: &'a str,
    theme_id: u64,
    store: &'a str,
}

/// Render one Theme Kit environment per theme. Values that YAML would
/// misread come out quoted.
pub fn render_config(
    themes: &[Theme],
    domain: &str,
    password: &str,
) -> Result<String, serde_yaml::Error> {
    let mut environments = Mapping::new();
    for theme in themes {
        let env = Environment {
            password,
            theme_id: theme.id,
            store: domain,
        };
        environments.insert(
            sanitize_theme_name(&theme.name).into(),
            serde_yaml::to_value(env)?,
        );
    }
    serde_yaml::to_string(&environments)
}

/// Write a Theme Kit config for `themes` into `dir/filename`.
pub fn write_config(
    themes: &[Theme],
    domain: &str,
    password: &str,
    dir: &Path,
    filename: &str,
) -> io::Result<PathBuf> {
    let path = dir.join(filename);
    let config = render_config(themes, domain, password)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(&path, config)?;
    debug!("wrote theme kit config {}", path.display());
    Ok(path)
}

/// Invokes the Theme Kit executable.
#[derive(Debug, Clone)]
pub struct ThemeKit {
    bin: String,
    store: String,
    password: String,
}

impl ThemeKit {
    /// Use the binary named by `THEMEKIT_BIN`, or `theme`.
    pub fn from_env(store: &str, password: &str) -> Self {
        let bin = std::env::var("THEMEKIT_BIN").unwrap_or_else(|_| DEFAULT_BIN.into());
        Self::new(bin, store, password)
    }

    pub fn new(bin: impl Into<String>, store: &str, password: &str) -> Self {
        ThemeKit {
            bin: bin.into(),
            store: store.to_string(),
            password: password.to_string(),
        }
    }

    /// Download `files` (or every file when empty) of `theme` into `dir`.
    pub fn download(
        &self,
        dir: &Path,
        config: &Path,
        theme: &Theme,
        files: &[String],
    ) -> Result<(), SyncError> {
        let mut args = self.common_args(dir, config, theme);
        args.extend(files.iter().cloned());
        self.run("download", &args)
    }

    /// Upload everything in `dir` to `theme` without deleting remote files.
    pub fn deploy(&self, dir: &Path, config: &Path, theme: &Theme) -> Result<(), SyncError> {
        let mut args = self.common_args(dir, config, theme);
        args.push("--nodelete".into());
        self.run("deploy", &args)
    }

    fn common_args(&self, dir: &Path, config: &Path, theme: &Theme) -> Vec<String> {
        vec![
            "--dir".into(),
            dir.display().to_string(),
            "--password".into(),
            self.password.clone(),
            "--store".into(),
            self.store.clone(),
            "--themeid".into(),
            theme.id.to_string(),
            "--config".into(),
            config.display().to_string(),
            "--env".into(),
            sanitize_theme_name(&theme.name),
        ]
    }

    fn run(&self, command: &str, args: &[String]) -> Result<(), SyncError> {
        debug!("running {} {}", self.bin, command);
        let output = Command::new(&self.bin)
            .arg(command)
            .args(args)
            .output()
            .map_err(|e| SyncError::Kit {
                command: command.to_string(),
                detail: format!("could not start {}: {e}", self.bin),
            })?;
        if !output.status.success() {
            return Err(SyncError::Kit {
                command: command.to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Run the Theme Kit install script through `sh`, returning its output.
pub fn install() -> anyhow::Result<String> {
    let output = Command::new("sh").arg("-c").arg(INSTALL_SCRIPT).output()?;
    if !output.status.success() {
        anyhow::bail!(
            "Theme Kit install failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
