// Theme Kit helpers: write a config.yml for the shop's themes, or
// install the Theme Kit binary.

use super::Session;
use crate::credentials::Auth;
use crate::kit;
use anyhow::{bail, Context, Result};
use serde_json::json;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ConfigRequest {
    /// Include every theme, ignoring `themes`.
    pub all: bool,
    pub dir: PathBuf,
    pub filename: String,
    /// Theme ids to include. Empty means every theme.
    pub themes: Vec<u64>,
}

pub fn config(s: &mut Session, auth: &Auth, req: &ConfigRequest) -> Result<()> {
    let mut themes = s.api.list_themes()?;
    if !req.all && !req.themes.is_empty() {
        themes.retain(|t| req.themes.contains(&t.id));
    }
    if themes.is_empty() {
        let wanted: Vec<String> = req.themes.iter().map(u64::to_string).collect();
        bail!(
            "No themes available. Either your store has no themes, or the following themes do not exist: {}",
            wanted.join(", ")
        );
    }

    let path = kit::write_config(&themes, &auth.domain, &auth.password, &req.dir, &req.filename)
        .with_context(|| format!("writing {}", req.dir.join(&req.filename).display()))?;

    if s.json {
        return s.emit(&json!({ "ok": 1 }));
    }
    s.say(format!("File {} created.\n", path.display()))?;
    s.say("The following theme configs have been created:")?;
    for theme in &themes {
        s.say(format!("\t{}", kit::sanitize_theme_name(&theme.name)))?;
    }
    Ok(())
}
