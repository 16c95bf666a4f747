//! Environment-backed configuration.
//!
//! Values are read after `dotenvy` has populated the process environment, so a
//! local `.env` file works the same as exported variables.

use poise::serenity_prelude as serenity;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

const PLACEHOLDER_TOKEN: &str = "YOUR_BOT_TOKEN_HERE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("DISCORD_TOKEN still holds the placeholder value")]
    PlaceholderToken,
    #[error("{name} must be a non-zero Discord id, got {value:?}")]
    InvalidId { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    /// Text channel that receives voice-join notifications
    pub status_channel_id: ChannelId,
    /// The one user whose joins are announced and who may shut the bot down
    pub owner_id: UserId,
    /// Role pinged by the notification
    pub notify_role_id: RoleId,
    /// Text channel that receives the startup announcement
    pub online_channel_id: ChannelId,
    /// Guild to sync commands into; commands are registered globally when unset
    pub guild_id: Option<GuildId>,
    pub api_base: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("DISCORD_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;
        if token == PLACEHOLDER_TOKEN {
            return Err(ConfigError::PlaceholderToken);
        }

        let required = |name: &'static str| -> Result<u64, ConfigError> {
            let value = lookup(name).ok_or(ConfigError::Missing(name))?;
            parse_id(name, &value)
        };

        let guild_id = match lookup("GUILD_ID").filter(|v| !v.trim().is_empty()) {
            Some(value) => Some(GuildId::new(parse_id("GUILD_ID", &value)?)),
            None => None,
        };

        let api_base = lookup("DISCORD_API_BASE")
            .map(|base| base.trim_end_matches('/').to_string())
            .filter(|base| !base.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Self {
            token,
            status_channel_id: ChannelId::new(required("STATUS_CHANNEL_ID")?),
            owner_id: UserId::new(required("OWNER_ID")?),
            notify_role_id: RoleId::new(required("NOTIFY_ROLE_ID")?),
            online_channel_id: ChannelId::new(required("ONLINE_CHANNEL_ID")?),
            guild_id,
            api_base,
        })
    }
}

fn parse_id(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(id) if id != 0 => Ok(id),
        _ => Err(ConfigError::InvalidId {
            name,
            value: value.to_string(),
        }),
    }
}
