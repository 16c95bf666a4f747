use crate::config::Config;
use crate::Context;
use crate::Error;
use poise::serenity_prelude as serenity;
use poise::CreateReply;
use tracing::{info, warn};

fn may_shutdown(config: &Config, user_id: serenity::model::id::UserId) -> bool {
    user_id == config.owner_id
}

/// Take the bot offline (owner only)
#[poise::command(slash_command)]
pub async fn shutdown(ctx: Context<'_>) -> Result<(), Error> {
    let user_id = ctx.author().id;

    if !may_shutdown(&ctx.data().config, user_id) {
        warn!("Refused shutdown requested by {}", user_id);
        ctx.send(
            CreateReply::default()
                .content("⚠️ You are not allowed to use this command.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    ctx.send(
        CreateReply::default()
            .content("🛑 Shutting the bot down...")
            .ephemeral(true),
    )
    .await?;

    info!("Shutdown requested by {}", user_id);
    ctx.framework().shard_manager().shutdown_all().await;
    Ok(())
}
