//! Process configuration, read once from the environment at startup

use std::env;

use orgbot_core::{OrgbotError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token.
    pub token: String,
    /// Where the record sink lives.
    pub database_url: String,
    /// Invite link embedded into the closing messages.
    pub invite_link: String,
    /// Chat ids allowed to run admin commands.
    pub admin_ids: Vec<i64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            token: require("TOKEN")?,
            database_url: require("DATABASE_URL")?,
            invite_link: require("LINK")?,
            admin_ids: parse_admin_ids(env::var("ADMIN_IDS").ok().as_deref())?,
        })
    }

    pub fn is_admin(&self, chat_id: i64) -> bool {
        self.admin_ids.contains(&chat_id)
    }
}

fn require(key: &str) -> Result<String> {
    env::var(key).map_err(|_| OrgbotError::Config(format!("{key} is not set")))
}

fn parse_admin_ids(raw: Option<&str>) -> Result<Vec<i64>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| OrgbotError::Config(format!("ADMIN_IDS has a bad id: {part:?}")))
        })
        .collect()
}
