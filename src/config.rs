/*
 *  config.rs
 *
 *  oppa-dmd - dot matrix driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layered configuration: defaults, YAML file, command line overrides
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

use clap::{ArgAction, Parser, ValueEnum, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::display::pins::Signal;
use crate::display::protocol::MIN_ROW_CLOCK_LOW_US;
use crate::display::traits::{DmdGeometry, DEFAULT_COLUMNS, DEFAULT_ROWS};

/// Default GPIO character device
pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";

/// Default pattern message
pub const DEFAULT_TEXT: &str = "OPPA";

/// Default pattern advance rate
pub const DEFAULT_PATTERN_FPS: u32 = 10;

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
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    /// panel geometry, timing and wiring
    pub display: Option<DisplayConfig>,
    /// what the update loop draws
    pub pattern: Option<PatternConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    pub rows: Option<u32>,
    pub columns: Option<u32>,
    pub row_clock_low_us: Option<u32>,
    pub invert: Option<bool>,
    pub backend: Option<BackendConfig>,
    pub pins: Option<PinAssignment>,
}

impl DisplayConfig {
    pub fn geometry(&self) -> Result<DmdGeometry, ConfigError> {
        DmdGeometry::new(
            self.rows.unwrap_or(DEFAULT_ROWS),
            self.columns.unwrap_or(DEFAULT_COLUMNS),
        )
        .map_err(|e| ConfigError::Validation(e.to_string()))
    }

    pub fn row_clock_low_us(&self) -> u32 {
        self.row_clock_low_us.unwrap_or(MIN_ROW_CLOCK_LOW_US)
    }

    pub fn pins(&self) -> PinAssignment {
        self.pins.clone().unwrap_or_default()
    }
}

/// Where the six lines come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Linux GPIO character device
    Cdev {
        chip: String,       // e.g. "/dev/gpiochip0"
    },
    /// Raspberry Pi GPIO via rppal (needs the rppal-backend feature)
    Rppal,
    /// Recording mock, no hardware
    Emulated,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Cdev { chip: DEFAULT_GPIO_CHIP.to_string() }
    }
}

/// Physical line for each logical signal (cdev line offset, BCM on a Pi)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinAssignment {
    pub display_enable: u32,
    pub row_data: u32,
    pub row_clock: u32,
    pub col_latch: u32,
    pub dot_clock: u32,
    pub dot_data: u32,
}

impl Default for PinAssignment {
    fn default() -> Self {
        Self {
            display_enable: 17,
            row_data: 27,
            row_clock: 22,
            col_latch: 23,
            dot_clock: 24,
            dot_data: 25,
        }
    }
}

impl PinAssignment {
    pub fn line(&self, signal: Signal) -> u32 {
        match signal {
            Signal::DisplayEnable => self.display_enable,
            Signal::RowData => self.row_data,
            Signal::RowClock => self.row_clock,
            Signal::ColLatch => self.col_latch,
            Signal::DotClock => self.dot_clock,
            Signal::DotData => self.dot_data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// every byte = step mod 9
    #[default]
    Uniform,
    Checkerboard,
    /// one lit row walking down the panel
    Rows,
    /// scrolling message
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PatternConfig {
    pub kind: Option<PatternKind>,
    pub text: Option<String>,
    pub fps: Option<u32>,     // pattern steps per second
    pub frames: Option<u64>,  // stop after N scans, forever when absent
}

impl PatternConfig {
    pub fn kind(&self) -> PatternKind { self.kind.unwrap_or_default() }

    pub fn text(&self) -> &str { self.text.as_deref().unwrap_or(DEFAULT_TEXT) }

    pub fn fps(&self) -> u32 { self.fps.unwrap_or(DEFAULT_PATTERN_FPS) }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "oppa-dmd", version, about = "OPPA dot matrix display driver")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Enable debug log level
    #[arg(short = 'v', long, alias = "verbose", action = ArgAction::SetTrue)]
    pub debug: bool,
    /// Drive a recording mock instead of GPIO hardware
    #[arg(long, action = ArgAction::SetTrue)]
    pub emulated: bool,
    /// GPIO character device for the cdev backend
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub gpio_chip: Option<String>,
    #[arg(long, value_enum)]
    pub pattern: Option<PatternKind>,
    #[arg(long)]
    pub text: Option<String>,
    #[arg(long)]
    pub fps: Option<u32>,
    #[arg(long)]
    pub frames: Option<u64>,
    #[arg(long, action = ArgAction::Set)]
    pub invert: Option<bool>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Read YAML, merge, apply CLI, validate.
pub fn load_with(cli: &Cli) -> Result<Config, ConfigError> {
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
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Parse the process command line, then layer as `load_with` does.
pub fn load() -> Result<(Config, Cli), ConfigError> {
    let cli = Cli::parse();
    let cfg = load_with(&cli)?;
    Ok((cfg, cli))
}

/// Pretty YAML of effective config
pub fn to_yaml(cfg: &Config) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(cfg)?)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/oppa-dmd/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/oppa-dmd/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/oppa-dmd.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["oppa-dmd.yaml", "config.yaml", "config/oppa-dmd.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
pub fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()      { dst.log_level = src.log_level; }
    match (&mut dst.display, src.display) {
        (None, Some(c)) => dst.display = Some(c),
        (Some(d), Some(s)) => merge_display(d, s),
        _ => {}
    }
    match (&mut dst.pattern, src.pattern) {
        (None, Some(c)) => dst.pattern = Some(c),
        (Some(d), Some(s)) => merge_pattern(d, s),
        _ => {}
    }
}

fn merge_display(dst: &mut DisplayConfig, src: DisplayConfig) {
    if src.rows.is_some()              { dst.rows = src.rows; }
    if src.columns.is_some()           { dst.columns = src.columns; }
    if src.row_clock_low_us.is_some()  { dst.row_clock_low_us = src.row_clock_low_us; }
    if src.invert.is_some()            { dst.invert = src.invert; }
    if src.backend.is_some()           { dst.backend = src.backend; }
    if src.pins.is_some()              { dst.pins = src.pins; }
}

fn merge_pattern(dst: &mut PatternConfig, src: PatternConfig) {
    if src.kind.is_some()    { dst.kind = src.kind; }
    if src.text.is_some()    { dst.text = src.text; }
    if src.fps.is_some()     { dst.fps = src.fps; }
    if src.frames.is_some()  { dst.frames = src.frames; }
}

pub fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()       { cfg.log_level = cli.log_level.clone(); }
    if cli.debug                     { cfg.log_level = Some("debug".to_string()); }

    let display = cfg.display.get_or_insert_with(DisplayConfig::default);
    if let Some(chip) = cli.gpio_chip.as_ref() {
        display.backend = Some(BackendConfig::Cdev { chip: chip.clone() });
    }
    // emulation wins over any hardware selection
    if cli.emulated                  { display.backend = Some(BackendConfig::Emulated); }
    if cli.invert.is_some()          { display.invert = cli.invert; }

    let pattern = cfg.pattern.get_or_insert_with(PatternConfig::default);
    if cli.pattern.is_some()         { pattern.kind = cli.pattern; }
    if cli.text.is_some()            { pattern.text = cli.text.clone(); }
    if cli.fps.is_some()             { pattern.fps = cli.fps; }
    if cli.frames.is_some()          { pattern.frames = cli.frames; }
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(display) = cfg.display.as_ref() {
        display.geometry()?;

        if let Some(us) = display.row_clock_low_us {
            if us < MIN_ROW_CLOCK_LOW_US {
                return Err(ConfigError::Validation(format!(
                    "display row_clock_low_us must be >= {}", MIN_ROW_CLOCK_LOW_US
                )));
            }
        }

        let pins = display.pins();
        let mut seen = HashSet::new();
        for signal in Signal::ALL {
            if !seen.insert(pins.line(signal)) {
                return Err(ConfigError::Validation(format!(
                    "display pin {} for {} is assigned twice", pins.line(signal), signal.name()
                )));
            }
        }

        if let Some(BackendConfig::Cdev { chip }) = display.backend.as_ref() {
            if chip.is_empty() {
                return Err(ConfigError::Validation("display backend chip must not be empty".into()));
            }
        }
    }
    if let Some(pattern) = cfg.pattern.as_ref() {
        if pattern.kind() == PatternKind::Text && pattern.text().is_empty() {
            return Err(ConfigError::Validation("pattern text must not be empty".into()));
        }
    }
    Ok(())
}
