use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use streakline_core::{SessionState, SubscriptionStatus, UserAccount};

/// `$STREAKLINE_HOME`, else `~/.streakline`.
pub fn streakline_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("STREAKLINE_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".streakline"))
}

pub fn ensure_streakline_home() -> Result<PathBuf> {
    let dir = streakline_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn store_path() -> Result<PathBuf> {
    Ok(ensure_streakline_home()?.join("store.json"))
}

pub fn account_path() -> Result<PathBuf> {
    Ok(ensure_streakline_home()?.join("account.json"))
}

/// Local stand-in for the signed-in session: present file = signed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountFile {
    pub subscription_status: SubscriptionStatus,
    pub payment_customer_id: Option<String>,
}

impl Default for AccountFile {
    fn default() -> Self {
        Self {
            subscription_status: SubscriptionStatus::Cancelled,
            payment_customer_id: None,
        }
    }
}

impl AccountFile {
    pub fn to_account(&self, user_id: &str) -> UserAccount {
        UserAccount {
            id: user_id.to_string(),
            subscription_status: self.subscription_status,
            payment_customer_id: self.payment_customer_id.clone(),
        }
    }
}

pub fn read_account() -> Result<Option<AccountFile>> {
    let p = account_path()?;
    if !p.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    Ok(Some(serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))?))
}

pub fn write_account(account: &AccountFile) -> Result<()> {
    let p = account_path()?;
    let json = serde_json::to_string_pretty(account)?;
    fs::write(&p, json).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn sign_out() -> Result<bool> {
    let p = account_path()?;
    if !p.exists() {
        return Ok(false);
    }
    fs::remove_file(&p).with_context(|| format!("remove {}", p.display()))?;
    Ok(true)
}

/// Session facts for routing, from the local account file.
pub fn current_session(user_id: &str) -> Result<SessionState> {
    let account = read_account()?.map(|a| a.to_account(user_id));
    Ok(SessionState::from_account(account.is_some(), account.as_ref()))
}
