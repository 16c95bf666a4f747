use anyhow::Context as _;
use dotenvy::dotenv;
use poise::serenity_prelude as serenity;
use serenity::model::gateway::GatewayIntents;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod command;
mod config;
mod event;
mod notify;
mod voice;

use command::{set_voice_status, shutdown};
use config::Config;
use notify::{PrivilegedUser, VoiceJoinNotifier};
use voice::{HttpVoiceStatusWriter, VoiceStatusWriter};

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

pub struct Data {
    pub config: Config,
    pub notifier: VoiceJoinNotifier,
    pub status_writer: Arc<dyn VoiceStatusWriter>,
}

impl Data {
    pub fn new(config: Config) -> Self {
        let notifier = VoiceJoinNotifier::new(
            PrivilegedUser(config.owner_id),
            config.notify_role_id,
            config.status_channel_id,
        );
        let status_writer = Arc::new(HttpVoiceStatusWriter::new(
            config.api_base.clone(),
            config.token.clone(),
        ));

        Self {
            config,
            notifier,
            status_writer,
        }
    }
}

/// Discord refused the action for lack of permissions, either locally from the
/// cache check or as a 403 from the API.
pub fn is_permission_error(error: &::serenity::Error) -> bool {
    match error {
        ::serenity::Error::Model(::serenity::model::ModelError::InvalidPermissions { .. }) => true,
        ::serenity::Error::Http(::serenity::http::HttpError::UnsuccessfulRequest(response)) => {
            response.status_code.as_u16() == 403
        }
        _ => false,
    }
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e)
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("Invalid configuration, set it in the environment or .env")?;
    let token = config.token.clone();

    let options = poise::FrameworkOptions {
        commands: vec![shutdown(), set_voice_status()],
        on_error: |error| Box::pin(on_error(error)),
        pre_command: |ctx| {
            Box::pin(async move {
                info!(
                    "{} invoked /{}",
                    ctx.author().id,
                    ctx.command().qualified_name
                );
            })
        },
        event_handler: |ctx, event, framework, data| {
            Box::pin(event::event_handler(ctx, event, framework, data))
        },
        ..Default::default()
    };

    let framework = poise::Framework::builder()
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                event::sync_commands(ctx, &framework.options().commands, config.guild_id).await;
                event::announce_online(ctx, config.online_channel_id).await;
                Ok(Data::new(config))
            })
        })
        .options(options)
        .build();

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_VOICE_STATES;

    let mut client = serenity::Client::builder(token, intents)
        .framework(framework)
        .await
        .context("Failed to build the Discord client")?;

    if let Err(e) = client.start().await {
        if let ::serenity::Error::Gateway(::serenity::gateway::GatewayError::InvalidAuthentication) = e {
            error!("Discord rejected DISCORD_TOKEN, check the token in the developer portal");
            anyhow::bail!("invalid bot token");
        }
        return Err(e).context("Discord connection failed");
    }

    info!("Disconnected from Discord, exiting");
    Ok(())
}
