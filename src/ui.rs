// UI layer: yes/no prompts through `dialoguer`, the sync progress bar
// through `indicatif`, and the plain-text rendering of themes.

use crate::model::Theme;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::fmt::Write as _;

/// Asks the user yes/no questions.
pub trait Prompt {
    fn confirm(&mut self, question: &str, default: bool) -> bool;
}

/// Prompts on the terminal. Falls back to the default answer when the
/// terminal cannot be read (e.g. stdin is not a tty).
pub struct Terminal;

impl Prompt for Terminal {
    fn confirm(&mut self, question: &str, default: bool) -> bool {
        match Confirm::new()
            .with_prompt(question)
            .default(default)
            .interact()
        {
            Ok(answer) => answer,
            Err(e) => {
                debug!("prompt unavailable ({e}), answering {default}");
                default
            }
        }
    }
}

/// Answers every question the same way, used for `--yes`.
pub struct Always(pub bool);

impl Prompt for Always {
    fn confirm(&mut self, _question: &str, _default: bool) -> bool {
        self.0
    }
}

/// Progress bar for asset copies. Hidden when `visible` is false.
pub fn progress_bar(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::with_template("  {spinner} {pos} of {len} copied... {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

/// One block per theme: name (with a live marker), dates and id.
pub fn render_themes(themes: &[Theme]) -> String {
    let mut out = String::new();
    for theme in themes {
        let live = if theme.is_live() { " (Live theme)" } else { "" };
        let _ = writeln!(out, "{}{}", theme.name, live);
        let _ = writeln!(out, "    Created: {}", theme.created_at.as_deref().unwrap_or("-"));
        let _ = writeln!(out, "    Updated: {}", theme.updated_at.as_deref().unwrap_or("-"));
        let _ = writeln!(out, "    ID: {}", theme.id);
        out.push('\n');
    }
    out
}

/// Guidance printed by `config` when credentials are incomplete.
pub const CONFIG_GUIDE: &str = "\
Usage: shopify-cli config (--domain | -d) <domain> (--key | -k) <api key> (--password | -p) <api password>

Example: shopify-cli config -d sample.myshopify.com -k 6570902bf65f43f36263as12asa63093 -p asdasd2345asd2345asd234a5sd234

How to get auth information:
To get a key and a password, log into your Shopify admin page, go to Apps, scroll down and
click on the link that says Manage private apps. Then, click on Create a new private app and
give it a name. Fill in your email too, and enable the following permissions:

    - Products, variants and collections: Read and write
    - Theme templates and theme assets: Read and write
    - Orders, transactions and fulfillments: Read and write

Save the app and copy the API key and Password. Then, here on the terminal, run:

    shopify-cli config -d <your-store>.myshopify.com -k <paste key here> -p <paste password here>

This saves your credentials locally, so you don't need to pass them every time.
Use --global to save them in your home directory instead.
";
