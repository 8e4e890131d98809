// Theme verbs: list, activate, rename, remove, duplicate, sync and
// bootstrap.

use super::Session;
use crate::model::{NewTheme, Theme, ThemeUpdate, ROLE_MAIN, ROLE_UNPUBLISHED};
use crate::sync::{self, SyncReport};
use crate::ui;
use anyhow::{bail, Context, Result};
use log::{info, warn};
use std::io::Write;
use std::path::Path;

/// Free themes that `bootstrap` can install.
pub const CATALOGUE: [&str; 10] = [
    "brooklyn",
    "boundless",
    "debut",
    "jumpstart",
    "minimal",
    "narrative",
    "pop",
    "simple",
    "supply",
    "venture",
];

const CATALOGUE_URL: &str = "https://s3.amazonaws.com/shopify-cli-store";

pub fn list(s: &mut Session) -> Result<()> {
    let themes = s.api.list_themes()?;
    if s.json {
        return s.emit(&themes);
    }
    write!(s.out, "{}", ui::render_themes(&themes))?;
    Ok(())
}

pub fn activate(s: &mut Session, id: u64) -> Result<()> {
    let update = ThemeUpdate {
        role: Some(ROLE_MAIN.into()),
        ..ThemeUpdate::default()
    };
    let theme = s.api.update_theme(id, &update)?;
    if s.json {
        return s.emit(&theme);
    }
    s.say(format!("Theme {} has been activated.", theme.name))
}

pub fn rename(s: &mut Session, id: u64, template: &str) -> Result<()> {
    let theme = s.api.get_theme(id)?;
    let name = expand_name(template, &theme);

    let update = ThemeUpdate {
        name: Some(name.clone()),
        ..ThemeUpdate::default()
    };
    let renamed = s.api.update_theme(id, &update)?;
    if s.json {
        return s.emit(&renamed);
    }
    s.say(format!("Theme {} has been renamed to {}.", theme.name, name))
}

/// Replace `%name%` and `%id%` (any case) with the values of `theme`.
pub fn expand_name(template: &str, theme: &Theme) -> String {
    let named = replace_ignore_case(template, "%name%", &theme.name);
    replace_ignore_case(&named, "%id%", &theme.id.to_string())
}

fn replace_ignore_case(haystack: &str, pattern: &str, with: &str) -> String {
    let lower = haystack.to_ascii_lowercase();
    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    for (start, _) in lower.match_indices(pattern) {
        out.push_str(&haystack[last..start]);
        out.push_str(with);
        last = start + pattern.len();
    }
    out.push_str(&haystack[last..]);
    out
}

/// Delete the given themes, or every non-live theme with `all`.
pub fn remove(s: &mut Session, ids: &[u64], all: bool) -> Result<()> {
    let ids: Vec<u64> = if all {
        if !s.prompt.confirm(
            "Do you really want to delete all non-active themes from this shop?",
            false,
        ) {
            return s.say("Aborted.");
        }
        let ids: Vec<u64> = s
            .api
            .list_themes()?
            .into_iter()
            .filter(|t| !t.is_live())
            .map(|t| t.id)
            .collect();
        if ids.is_empty() {
            if s.json {
                return s.emit(&Vec::<Theme>::new());
            }
            return s.say("No themes that can be deleted are available.");
        }
        ids
    } else {
        ids.to_vec()
    };

    let mut deleted = Vec::new();
    let mut first_error = None;
    for id in ids {
        match s.api.delete_theme(id) {
            Ok(theme) => {
                info!("deleted theme {id}");
                s.say(format!("Theme {} has been deleted.", theme.name))?;
                deleted.push(theme);
            }
            Err(e) => {
                warn!("could not delete theme {id}: {e}");
                first_error.get_or_insert(e);
            }
        }
    }

    if s.json {
        s.emit(&deleted)?;
    }
    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Create an unpublished copy of theme `id` and copy every asset into it.
pub fn duplicate(s: &mut Session, id: u64, name: Option<&str>) -> Result<()> {
    let original = s.api.get_theme(id)?;
    let name = name
        .map(str::to_string)
        .unwrap_or_else(|| format!("Copy of {}", original.name));

    let created = s.api.create_theme(&NewTheme {
        name: name.clone(),
        role: ROLE_UNPUBLISHED.into(),
        src: None,
    })?;
    s.say(format!("New theme {name} created."))?;

    let keys: Vec<String> = s.api.list_assets(id)?.into_iter().map(|a| a.key).collect();
    let report = copy(s, &original, &created, &keys)
        .with_context(|| format!("copying assets into theme {}", created.id))?;

    if s.json {
        return s.emit(&created);
    }
    s.say(format!("{} assets copied.", report.copied))?;
    s.say("Theme duplicated.")
}

/// Copy `files` (or every asset when empty) from `source_id` to `target_id`.
pub fn sync(s: &mut Session, source_id: u64, target_id: u64, files: &[String]) -> Result<()> {
    let source = s.api.get_theme(source_id)?;
    let target = s.api.get_theme(target_id)?;

    let count = if files.is_empty() {
        " ".to_string()
    } else {
        format!(" {} ", files.len())
    };
    s.say(format!(
        "Syncing{count}asset(s) from {} to {}",
        source.name, target.name
    ))?;

    let available = s.api.list_assets(source_id)?;
    sync::check_requested(&available, files, &source)?;
    let keys: Vec<String> = if files.is_empty() {
        available.into_iter().map(|a| a.key).collect()
    } else {
        files.to_vec()
    };

    let report = copy(s, &source, &target, &keys)?;
    if s.json {
        return s.emit(&target);
    }
    s.say(format!("{} assets copied.", report.copied))?;
    s.say("Theme synced.")
}

fn copy(s: &mut Session, source: &Theme, target: &Theme, keys: &[String]) -> Result<SyncReport> {
    s.say(format!("Copying assets from source theme {}...", source.name))?;
    let bar = ui::progress_bar(s.progress && !s.json);
    let prompt = &mut *s.prompt;
    let report = sync::sync_assets(
        s.api,
        source,
        target,
        keys,
        &s.sync,
        &mut |path: &Path| {
            prompt.confirm(
                &format!(
                    "A folder {} already exists. This could mean another sync is in progress, \
                     or a previous sync was interrupted. Delete it?",
                    path.display()
                ),
                true,
            )
        },
        &bar,
    )?;
    Ok(report)
}

/// Install free themes from the catalogue, one after the other.
pub fn bootstrap(s: &mut Session, names: &[String], all: bool) -> Result<()> {
    let names: Vec<String> = if all {
        CATALOGUE.iter().map(|n| n.to_string()).collect()
    } else {
        names.iter().map(|n| n.to_lowercase()).collect()
    };
    if names.is_empty() {
        bail!("no theme to install, name one or pass --all");
    }
    if let Some(unknown) = names.iter().find(|n| !CATALOGUE.contains(&n.as_str())) {
        bail!(
            "Unknown theme {unknown}. Available themes: {}",
            CATALOGUE.join(", ")
        );
    }

    let mut created = Vec::new();
    let mut failure = None;
    for name in &names {
        let display = capitalize(name);
        let installed = s.api.create_theme(&NewTheme {
            name: display.clone(),
            role: ROLE_UNPUBLISHED.into(),
            src: Some(format!("{CATALOGUE_URL}/{name}.zip")),
        });
        match installed {
            Ok(theme) => {
                s.say(format!("Theme {display} created with ID {}", theme.id))?;
                created.push(theme);
            }
            Err(e) => {
                let e = anyhow::Error::from(e).context(format!("installing theme {display}"));
                failure = Some(e);
                break;
            }
        }
    }
    // Themes installed before a failure are still reported.
    if s.json {
        s.emit(&created)?;
    }
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
