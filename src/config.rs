/*
 *  config.rs
 *
 *  Aura Live
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layered configuration: defaults, YAML file, command line
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

pub const DEFAULT_PLUGINS_PATH: &str = "./plugins";

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// e.g. "info" | "debug"; overridden by `--debug`
    pub log_level: Option<String>,
    /// Root directory scanned for plugins
    pub plugins_path: Option<PathBuf>,
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DisplayConfig {
    pub windowed: Option<bool>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Config {
    pub fn plugins_path(&self) -> &Path {
        self.plugins_path
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_PLUGINS_PATH))
    }

    /// env_logger filter for this configuration
    ///
    /// `debug` wins over `log_level`; without either, debug builds log at
    /// debug and release builds at warn.
    pub fn log_filter(&self, debug: bool) -> String {
        if debug {
            return "debug".into();
        }
        match &self.log_level {
            Some(level) => level.clone(),
            None if cfg!(debug_assertions) => "debug".into(),
            None => "warn".into(),
        }
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "aura-live", about = "Aura Live", version, disable_help_flag = false)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// shorthand for --log-level debug
    #[arg(long, action = ArgAction::SetTrue)]
    pub debug: bool,
    /// Root directory to scan for plugins
    #[arg(short = 'p', long, value_hint = ValueHint::DirPath)]
    pub plugins_path: Option<PathBuf>,
    /// Run in a window instead of full screen
    #[arg(short = 'w', long, action = ArgAction::SetTrue)]
    pub windowed: bool,
    /// Display resolution, WIDTHxHEIGHT
    #[arg(short = 'r', long)]
    pub resolution: Option<String>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: read YAML, merge, apply CLI, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli)?;

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Pretty YAML of the effective config
pub fn dump(cfg: &Config) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(cfg)?)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/aura/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/aura/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/aura.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["aura.yaml", "config/aura.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

pub fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()    { dst.log_level = src.log_level; }
    if src.plugins_path.is_some() { dst.plugins_path = src.plugins_path; }
    match (&mut dst.display, src.display) {
        (None, Some(c)) => dst.display = Some(c),
        (Some(d), Some(s)) => merge_display(d, s),
        _ => {}
    }
}

fn merge_display(dst: &mut DisplayConfig, src: DisplayConfig) {
    if src.windowed.is_some() { dst.windowed = src.windowed; }
    if src.width.is_some()    { dst.width = src.width; }
    if src.height.is_some()   { dst.height = src.height; }
}

/// Parse `WIDTHxHEIGHT`, e.g. `1280x720`
pub fn parse_resolution(s: &str) -> Result<(u32, u32), ConfigError> {
    let invalid = || ConfigError::Validation(format!("resolution '{s}' is not WIDTHxHEIGHT"));
    let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let w = w.trim().parse::<u32>().map_err(|_| invalid())?;
    let h = h.trim().parse::<u32>().map_err(|_| invalid())?;
    Ok((w, h))
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) -> Result<(), ConfigError> {
    if cli.log_level.is_some()    { cfg.log_level = cli.log_level.clone(); }
    if cli.plugins_path.is_some() { cfg.plugins_path = cli.plugins_path.clone(); }

    let resolution = cli.resolution.as_deref().map(parse_resolution).transpose()?;
    let any_display = cli.windowed || resolution.is_some();

    if any_display && cfg.display.is_none() {
        cfg.display = Some(DisplayConfig::default());
    }
    if let Some(display) = cfg.display.as_mut() {
        if cli.windowed { display.windowed = Some(true); }
        if let Some((w, h)) = resolution {
            display.width = Some(w);
            display.height = Some(h);
        }
    }
    Ok(())
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(display) = cfg.display.as_ref() {
        if display.width == Some(0) || display.height == Some(0) {
            return Err(ConfigError::Validation("display width/height must be > 0".into()));
        }
    }
    if cfg.plugins_path().as_os_str().is_empty() {
        return Err(ConfigError::Validation("plugins_path must not be empty".into()));
    }
    Ok(())
}
