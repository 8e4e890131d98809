// Theme asset synchronization.
//
// Assets are copied one at a time from the source theme to the target
// theme with a pause between them, since parallel requests trip the
// API's rate limit. A `.sync` working directory marks a run in
// progress: it is created before the first copy and removed only after
// the last one, so a leftover directory means an interrupted or
// concurrent run.

use crate::api::ThemeApi;
use crate::credentials::Auth;
use crate::error::SyncError;
use crate::kit::{self, ThemeKit};
use crate::model::{Asset, Theme};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use indicatif::ProgressBar;
use log::{debug, info, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::thread;
use std::time::Duration;

pub const SENTINEL_DIR: &str = ".sync";
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// How assets travel from one theme to the other.
#[derive(Debug, Clone)]
pub enum Transfer {
    /// Retrieve and store each asset through the Admin API.
    Api,
    /// Download and deploy through the Theme Kit binary.
    Kit { kit: ThemeKit, auth: Auth },
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Directory that holds the sentinel working directory.
    pub root: PathBuf,
    /// Pause after each copied asset.
    pub delay: Duration,
    pub transfer: Transfer,
}

impl SyncOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SyncOptions {
            root: root.into(),
            delay: DEFAULT_DELAY,
            transfer: Transfer::Api,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub copied: usize,
}

/// The sentinel working directory of one sync run.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
}

impl Workspace {
    /// Claim the working directory under `root`.
    ///
    /// When it already exists `confirm_reset` decides whether to delete it
    /// and start over; declining aborts the run.
    pub fn acquire(
        root: &Path,
        confirm_reset: &mut dyn FnMut(&Path) -> bool,
    ) -> Result<Workspace, SyncError> {
        let path = root.join(SENTINEL_DIR);
        let io = |source: std::io::Error| SyncError::Workspace {
            path: path.display().to_string(),
            source,
        };

        // `create_dir` fails when the directory exists, so only one run
        // can claim it.
        match fs::create_dir(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                warn!(
                    "{} already exists, another sync may be running or was interrupted",
                    path.display()
                );
                if !confirm_reset(&path) {
                    return Err(SyncError::Aborted);
                }
                fs::remove_dir_all(&path).map_err(io)?;
                fs::create_dir(&path).map_err(io)?;
            }
            Err(e) => return Err(io(e)),
        }
        debug!("created {}", path.display());
        Ok(Workspace { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the content of `asset` below the working directory.
    pub fn stage(&self, asset: &Asset) -> Result<PathBuf, SyncError> {
        let relative = checked_key(&asset.key)?;
        let bytes = match (&asset.value, &asset.attachment) {
            (Some(value), _) => value.clone().into_bytes(),
            (None, Some(attachment)) => {
                STANDARD
                    .decode(attachment)
                    .map_err(|source| SyncError::Attachment {
                        key: asset.key.clone(),
                        source,
                    })?
            }
            (None, None) => return Err(SyncError::EmptyAsset(asset.key.clone())),
        };

        let dest = self.path.join(relative);
        let io = |source: std::io::Error| SyncError::Workspace {
            path: dest.display().to_string(),
            source,
        };
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(io)?;
        }
        fs::write(&dest, bytes).map_err(io)?;
        Ok(dest)
    }

    /// Remove the working directory after a successful run.
    pub fn release(self) -> Result<(), SyncError> {
        fs::remove_dir_all(&self.path).map_err(|source| SyncError::Workspace {
            path: self.path.display().to_string(),
            source,
        })?;
        debug!("removed {}", self.path.display());
        Ok(())
    }
}

/// Reject keys that would escape the working directory.
fn checked_key(key: &str) -> Result<&Path, SyncError> {
    let invalid = || SyncError::InvalidKey(key.to_string());
    if key.is_empty()
        || key.contains('\\')
        || key.split('/').any(|c| c.is_empty() || c == "." || c == "..")
    {
        return Err(invalid());
    }
    let path = Path::new(key);
    if path.components().all(|c| matches!(c, Component::Normal(_))) {
        Ok(path)
    } else {
        Err(invalid())
    }
}

/// Check that every requested key exists among the source theme's assets.
pub fn check_requested(
    available: &[Asset],
    requested: &[String],
    source: &Theme,
) -> Result<(), SyncError> {
    for key in requested {
        if !available.iter().any(|a| &a.key == key) {
            return Err(SyncError::MissingAsset {
                key: key.clone(),
                theme: source.name.clone(),
            });
        }
    }
    Ok(())
}

/// Copy the assets named by `keys` from `source` to `target`.
///
/// `progress` is advanced once per copied asset. The working directory is
/// left behind when an error interrupts the run.
pub fn sync_assets<A: ThemeApi + ?Sized>(
    api: &A,
    source: &Theme,
    target: &Theme,
    keys: &[String],
    options: &SyncOptions,
    confirm_reset: &mut dyn FnMut(&Path) -> bool,
    progress: &ProgressBar,
) -> Result<SyncReport, SyncError> {
    for key in keys {
        checked_key(key)?;
    }
    let workspace = Workspace::acquire(&options.root, confirm_reset)?;
    progress.set_length(keys.len() as u64);

    let copied = match &options.transfer {
        Transfer::Api => copy_via_api(api, source, target, keys, options.delay, &workspace, progress)?,
        Transfer::Kit { kit, auth } => {
            copy_via_kit(kit, auth, source, target, keys, &workspace, progress)?
        }
    };

    progress.finish();
    workspace.release()?;
    info!("copied {copied} assets from theme {} to {}", source.id, target.id);
    Ok(SyncReport { copied })
}

fn copy_via_api<A: ThemeApi + ?Sized>(
    api: &A,
    source: &Theme,
    target: &Theme,
    keys: &[String],
    delay: Duration,
    workspace: &Workspace,
    progress: &ProgressBar,
) -> Result<usize, SyncError> {
    let mut finished = 0;
    for (i, key) in keys.iter().enumerate() {
        progress.set_message(key.clone());

        let asset = api.get_asset(source.id, key)?;
        workspace.stage(&asset)?;
        api.put_asset(target.id, &asset.content_only())?;

        finished += 1;
        progress.inc(1);
        debug!("copied {key} ({finished}/{})", keys.len());

        if i + 1 < keys.len() && !delay.is_zero() {
            thread::sleep(delay);
        }
    }
    Ok(finished)
}

fn copy_via_kit(
    kit: &ThemeKit,
    auth: &Auth,
    source: &Theme,
    target: &Theme,
    keys: &[String],
    workspace: &Workspace,
    progress: &ProgressBar,
) -> Result<usize, SyncError> {
    let config = kit::write_config(
        &[source.clone(), target.clone()],
        &auth.domain,
        &auth.password,
        workspace.path(),
        kit::DEFAULT_CONFIG_NAME,
    )
    .map_err(|source| SyncError::Workspace {
        path: workspace.path().display().to_string(),
        source,
    })?;

    progress.set_message("downloading");
    kit.download(workspace.path(), &config, source, keys)?;
    progress.set_message("deploying");
    kit.deploy(workspace.path(), &config, target)?;
    progress.set_position(keys.len() as u64);
    Ok(keys.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeShop;

    fn options(root: &Path) -> SyncOptions {
        SyncOptions {
            delay: Duration::ZERO,
            ..SyncOptions::new(root)
        }
    }

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn copies_every_key_in_order_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let shop = FakeShop::new();
        let source = shop.add_theme("Debut", "main");
        let target = shop.add_theme("Copy", "unpublished");
        shop.add_asset(source.id, "layout/theme.liquid", "<html>");
        shop.add_asset(source.id, "assets/main.js", "main()");

        let wanted = keys(&["layout/theme.liquid", "assets/main.js"]);
        let report = sync_assets(
            &shop,
            &source,
            &target,
            &wanted,
            &options(root.path()),
            &mut |_| panic!("no sentinel expected"),
            &ProgressBar::hidden(),
        )
        .unwrap();

        assert_eq!(report.copied, 2);
        assert_eq!(shop.asset_value(target.id, "assets/main.js").as_deref(), Some("main()"));
        assert_eq!(
            shop.calls(),
            vec![
                format!("get {} layout/theme.liquid", source.id),
                format!("put {} layout/theme.liquid", target.id),
                format!("get {} assets/main.js", source.id),
                format!("put {} assets/main.js", target.id),
            ]
        );
        assert!(!root.path().join(SENTINEL_DIR).exists());
    }

    #[test]
    fn leftover_sentinel_aborts_when_declined() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join(SENTINEL_DIR)).unwrap();
        let shop = FakeShop::new();
        let source = shop.add_theme("A", "main");
        let target = shop.add_theme("B", "unpublished");
        shop.add_asset(source.id, "a.liquid", "a");

        let mut asked = 0;
        let err = sync_assets(
            &shop,
            &source,
            &target,
            &keys(&["a.liquid"]),
            &options(root.path()),
            &mut |_| {
                asked += 1;
                false
            },
            &ProgressBar::hidden(),
        )
        .unwrap_err();

        assert!(matches!(err, SyncError::Aborted));
        assert_eq!(asked, 1);
        assert!(shop.calls().is_empty());
        assert!(root.path().join(SENTINEL_DIR).exists());
    }

    #[test]
    fn held_workspace_is_detected_by_a_second_run() {
        let root = tempfile::tempdir().unwrap();
        let first = Workspace::acquire(root.path(), &mut |_| panic!("nothing to reset")).unwrap();
        let asset = Asset {
            key: "a.liquid".into(),
            value: Some("a".into()),
            ..Asset::default()
        };
        first.stage(&asset).unwrap();

        let mut asked = 0;
        let err = Workspace::acquire(root.path(), &mut |_| {
            asked += 1;
            false
        })
        .unwrap_err();
        assert!(matches!(err, SyncError::Aborted));
        assert_eq!(asked, 1);
        assert!(first.path().join("a.liquid").is_file());
        first.release().unwrap();
    }

    #[test]
    fn sentinel_in_a_missing_root_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let err = Workspace::acquire(&root.path().join("gone"), &mut |_| true).unwrap_err();
        assert!(matches!(err, SyncError::Workspace { .. }));
    }

    #[test]
    fn pauses_between_assets_but_not_after_the_last() {
        let root = tempfile::tempdir().unwrap();
        let shop = FakeShop::new();
        let source = shop.add_theme("A", "main");
        let target = shop.add_theme("B", "unpublished");
        shop.add_asset(source.id, "a.liquid", "a");
        shop.add_asset(source.id, "b.liquid", "b");
        let delay = Duration::from_millis(300);
        let paced = SyncOptions {
            delay,
            ..SyncOptions::new(root.path())
        };

        let started = std::time::Instant::now();
        sync_assets(
            &shop,
            &source,
            &target,
            &keys(&["a.liquid", "b.liquid"]),
            &paced,
            &mut |_| true,
            &ProgressBar::hidden(),
        )
        .unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= delay, "{elapsed:?}");
        assert!(elapsed < delay * 2, "{elapsed:?}");

        let started = std::time::Instant::now();
        sync_assets(
            &shop,
            &source,
            &target,
            &keys(&["a.liquid"]),
            &paced,
            &mut |_| true,
            &ProgressBar::hidden(),
        )
        .unwrap();
        assert!(started.elapsed() < delay);
    }

    #[test]
    fn default_delay_is_half_a_second() {
        assert_eq!(SyncOptions::new(".").delay, Duration::from_millis(500));
    }

    #[test]
    fn leftover_sentinel_is_replaced_when_accepted() {
        let root = tempfile::tempdir().unwrap();
        let stale = root.path().join(SENTINEL_DIR).join("stale.txt");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();

        let shop = FakeShop::new();
        let source = shop.add_theme("A", "main");
        let target = shop.add_theme("B", "unpublished");
        shop.add_asset(source.id, "a.liquid", "a");

        let report = sync_assets(
            &shop,
            &source,
            &target,
            &keys(&["a.liquid"]),
            &options(root.path()),
            &mut |_| true,
            &ProgressBar::hidden(),
        )
        .unwrap();
        assert_eq!(report.copied, 1);
        assert!(!root.path().join(SENTINEL_DIR).exists());
    }

    #[test]
    fn failure_leaves_sentinel_for_next_run() {
        let root = tempfile::tempdir().unwrap();
        let shop = FakeShop::new();
        let source = shop.add_theme("A", "main");
        let target = shop.add_theme("B", "unpublished");
        shop.add_asset(source.id, "a.liquid", "a");

        let err = sync_assets(
            &shop,
            &source,
            &target,
            &keys(&["a.liquid", "missing.liquid"]),
            &options(root.path()),
            &mut |_| true,
            &ProgressBar::hidden(),
        )
        .unwrap_err();

        assert!(matches!(err, SyncError::Api(_)));
        assert_eq!(shop.asset_value(target.id, "a.liquid").as_deref(), Some("a"));
        assert!(root.path().join(SENTINEL_DIR).join("a.liquid").is_file());
    }

    #[test]
    fn binary_assets_are_staged_decoded_and_sent_as_attachment() {
        let root = tempfile::tempdir().unwrap();
        let shop = FakeShop::new();
        let source = shop.add_theme("A", "main");
        let target = shop.add_theme("B", "unpublished");
        shop.add_attachment(source.id, "assets/logo.png", &STANDARD.encode([0u8, 159, 146]));

        let workspace = Workspace::acquire(root.path(), &mut |_| true).unwrap();
        let asset = shop.get_asset(source.id, "assets/logo.png").unwrap();
        let staged = workspace.stage(&asset).unwrap();
        assert_eq!(fs::read(staged).unwrap(), vec![0u8, 159, 146]);
        workspace.release().unwrap();

        sync_assets(
            &shop,
            &source,
            &target,
            &keys(&["assets/logo.png"]),
            &options(root.path()),
            &mut |_| true,
            &ProgressBar::hidden(),
        )
        .unwrap();
        assert!(shop.asset_attachment(target.id, "assets/logo.png").is_some());
    }

    #[test]
    fn escaping_keys_are_rejected_before_anything_runs() {
        let root = tempfile::tempdir().unwrap();
        let shop = FakeShop::new();
        let source = shop.add_theme("A", "main");
        let target = shop.add_theme("B", "unpublished");

        for bad in [
            "../etc/passwd",
            "/abs.liquid",
            "a//b",
            "",
            "a\\b",
            "./a",
            "assets/./x.js",
            "assets/..",
        ] {
            let err = sync_assets(
                &shop,
                &source,
                &target,
                &keys(&[bad]),
                &options(root.path()),
                &mut |_| true,
                &ProgressBar::hidden(),
            )
            .unwrap_err();
            assert!(matches!(err, SyncError::InvalidKey(_)), "{bad:?}");
        }
        assert!(!root.path().join(SENTINEL_DIR).exists());
    }

    #[test]
    fn requested_keys_must_exist_in_source() {
        let shop = FakeShop::new();
        let source = shop.add_theme("Debut", "main");
        shop.add_asset(source.id, "a.liquid", "a");
        let available = shop.list_assets(source.id).unwrap();

        assert!(check_requested(&available, &keys(&["a.liquid"]), &source).is_ok());
        let err = check_requested(&available, &keys(&["a.liquid", "b.liquid"]), &source).unwrap_err();
        assert_eq!(err.to_string(), "Asset b.liquid does not exist in theme Debut");
    }
}
