// Command handlers. Each handler works against a `Session`, which bundles
// the API, the output sink and the user-facing switches, so the same
// code runs against the HTTP client and against the in-memory shop in
// tests.

pub mod config;
pub mod kit;
pub mod theme;

use crate::api::ThemeApi;
use crate::sync::SyncOptions;
use crate::ui::Prompt;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;

pub struct Session<'a> {
    pub api: &'a dyn ThemeApi,
    pub out: &'a mut dyn Write,
    pub prompt: &'a mut dyn Prompt,
    /// Print JSON instead of text.
    pub json: bool,
    /// Show the sync progress bar.
    pub progress: bool,
    pub sync: SyncOptions,
}

impl Session<'_> {
    /// Print a line unless JSON output was requested.
    pub fn say(&mut self, line: impl AsRef<str>) -> Result<()> {
        if !self.json {
            writeln!(self.out, "{}", line.as_ref())?;
        }
        Ok(())
    }

    pub fn emit<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer_pretty(&mut *self.out, value)?;
        writeln!(self.out)?;
        Ok(())
    }
}
