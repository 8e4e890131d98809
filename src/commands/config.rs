// `config`: persist credentials so later commands can omit -d/-k/-p.

use crate::credentials::{self, Auth, Partial};
use crate::ui;
use anyhow::{Context, Result};
use log::info;
use std::io::Write;
use std::path::Path;

/// Save the credentials in `given`, or print guidance when any is missing.
pub fn run(out: &mut dyn Write, given: Partial, cwd: &Path, global: bool) -> Result<()> {
    let (domain, api_key, password) = match (given.domain, given.api_key, given.password) {
        (Some(d), Some(k), Some(p)) => (d, k, p),
        _ => {
            write!(out, "{}", ui::CONFIG_GUIDE)?;
            return Ok(());
        }
    };
    let auth = Auth {
        domain,
        api_key,
        password,
    };

    let path = credentials::target_path(cwd, global)?;
    credentials::save(&path, &auth).context("saving credentials")?;
    info!("credentials saved to {}", path.display());

    writeln!(out, "Configured site:")?;
    writeln!(out, "  Domain:   {}", auth.domain)?;
    writeln!(out, "  Key:      {}", auth.api_key)?;
    writeln!(out, "  Password: {}", auth.password)?;
    Ok(())
}
