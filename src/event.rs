use crate::notify::notify_voice_join;
use crate::{Data, Error};
use poise::serenity_prelude as serenity;
use serenity::model::id::{ChannelId, GuildId};
use tracing::{error, info, warn};

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!(
                "Logged in as {} ({})",
                data_about_bot.user.name, data_about_bot.user.id
            );
        }
        serenity::FullEvent::VoiceStateUpdate { old, new } => {
            notify_voice_join(ctx, &data.notifier, old.as_ref(), new).await;
        }
        _ => {}
    }
    Ok(())
}

/// Registers commands in `guild_id`, or globally when no guild is configured.
///
/// Failures are logged; the bot keeps running with whatever registration Discord already has.
pub async fn sync_commands(
    ctx: &serenity::Context,
    commands: &[poise::Command<Data, Error>],
    guild_id: Option<GuildId>,
) {
    match guild_id {
        Some(guild_id) => match poise::builtins::register_in_guild(ctx, commands, guild_id).await {
            Ok(()) => info!("Registered {} commands for guild {}", commands.len(), guild_id),
            Err(e) => error!("Failed to register commands for guild {}: {}", guild_id, e),
        },
        None => match poise::builtins::register_globally(ctx, commands).await {
            Ok(()) => info!(
                "Registered {} global commands (propagation may take a while)",
                commands.len()
            ),
            Err(e) => error!("Failed to register global commands: {}", e),
        },
    }
}

pub async fn announce_online(ctx: &serenity::Context, channel_id: ChannelId) {
    match channel_id
        .say(ctx, "✅ Bot is online (commands synced)")
        .await
    {
        Ok(_) => info!("Posted startup announcement in {}", channel_id),
        Err(e) if crate::is_permission_error(&e) => {
            warn!("Missing permission to post startup announcement in {}", channel_id)
        }
        Err(e) => error!("Failed to post startup announcement: {}", e),
    }
}
