use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use streakline_core::EditPolicy;

use crate::state::ensure_streakline_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub profile: ProfileSection,
    #[serde(default)]
    pub calendar: CalendarSection,
    #[serde(default)]
    pub editing: EditingSection,
    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSection {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarSection {
    /// IANA timezone that defines "today" for streaks.
    pub timezone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditingSection {
    pub streak_editing_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSection {
    /// EnvFilter directive, overridden by STREAKLINE_LOG.
    pub level: String,
}

impl Default for ProfileSection {
    fn default() -> Self {
        Self {
            user_id: "local".to_string(),
        }
    }
}

impl Default for CalendarSection {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
        }
    }
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn edit_policy(&self) -> EditPolicy {
        EditPolicy {
            streak_editing_enabled: self.editing.streak_editing_enabled,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_streakline_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let cfg = Config::default();
    save_config(&cfg)?;
    println!("Wrote {}", p.display());
    Ok(())
}
