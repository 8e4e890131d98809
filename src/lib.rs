// Library root
// ------------
// The binary (`main.rs`) only parses arguments and hands them to `cli`.
//
// Module responsibilities:
// - `api`: the `ThemeApi` trait and its blocking HTTP implementation.
// - `credentials`: where the shop domain, key and password come from.
// - `sync`: sequential, rate-limited asset copy between two themes.
// - `kit`: Theme Kit config files and the external `theme` binary.
// - `commands`: one handler per CLI verb, written against `ThemeApi`.
// - `ui`: prompts, progress bar and text rendering.
pub mod api;
pub mod cli;
pub mod commands;
pub mod credentials;
pub mod error;
pub mod kit;
pub mod model;
pub mod sync;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;
