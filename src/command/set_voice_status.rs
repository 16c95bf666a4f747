use crate::voice::{apply_status, VoiceStatusWriter, MAX_STATUS_LEN};
use crate::Context;
use crate::Error;
use poise::serenity_prelude as serenity;
use poise::CreateReply;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// How long the button stays usable
const BUTTON_TIMEOUT: Duration = Duration::from_secs(60);
/// Discord drops interaction tokens after 15 minutes
const MODAL_TIMEOUT: Duration = Duration::from_secs(15 * 60);

const STATUS_INPUT_ID: &str = "status";

fn current_voice_channel(
    cache: &serenity::Cache,
    guild_id: GuildId,
    user_id: UserId,
) -> Option<ChannelId> {
    cache.guild(guild_id).and_then(|guild| {
        guild
            .voice_states
            .get(&user_id)
            .and_then(|vs| vs.channel_id)
    })
}

/// A press only counts while the presser still sits in the channel the button was made for.
fn still_bound(current: Option<ChannelId>, bound: ChannelId) -> bool {
    current == Some(bound)
}

/// Time left in the button window, `None` once it has closed.
fn window_remaining(deadline: Instant, now: Instant) -> Option<Duration> {
    let remaining = deadline.saturating_duration_since(now);
    (!remaining.is_zero()).then_some(remaining)
}

/// Each press gets its own modal id so concurrent submissions never cross.
fn status_modal_id(command_id: u64, press_id: u64) -> String {
    format!("{}-voice-status-modal-{}", command_id, press_id)
}

fn status_prompt(voice: Option<(ChannelId, &str)>, button_id: &str) -> CreateReply {
    let reply = CreateReply::default().ephemeral(true);
    match voice {
        None => reply.content("❌ Join a voice channel first."),
        Some((_, name)) => reply
            .content(format!(
                "✅ Setting the status of **{}**. Press the button below 👇",
                name
            ))
            .components(vec![serenity::CreateActionRow::Buttons(vec![
                serenity::CreateButton::new(button_id)
                    .label("Set voice status")
                    .style(serenity::ButtonStyle::Primary),
            ])]),
    }
}

fn status_modal(modal_id: &str) -> serenity::CreateModal {
    let input = serenity::CreateInputText::new(
        serenity::InputTextStyle::Short,
        "Status",
        STATUS_INPUT_ID,
    )
    .placeholder("e.g. chatting, working")
    .max_length(MAX_STATUS_LEN as u16)
    .required(true);

    serenity::CreateModal::new(modal_id, "Set voice channel status")
        .components(vec![serenity::CreateActionRow::InputText(input)])
}

fn modal_value(rows: &[serenity::ActionRow], custom_id: &str) -> Option<String> {
    rows.iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            serenity::ActionRowComponent::InputText(input) if input.custom_id == custom_id => {
                input.value.clone()
            }
            _ => None,
        })
}

/// Show a button that sets the status of your current voice channel
#[poise::command(slash_command, rename = "set-voice-status", guild_only)]
pub async fn set_voice_status(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command must be used in a guild")?;
    let cache = &ctx.serenity_context().cache;

    let Some(voice_channel_id) = current_voice_channel(cache, guild_id, ctx.author().id) else {
        ctx.send(status_prompt(None, "")).await?;
        return Ok(());
    };

    let channel_name = voice_channel_id
        .name(ctx.serenity_context())
        .await
        .unwrap_or_else(|_| voice_channel_id.to_string());

    let button_id = format!("{}-voice-status", ctx.id());
    let reply = ctx
        .send(status_prompt(
            Some((voice_channel_id, channel_name.as_str())),
            &button_id,
        ))
        .await?;

    let deadline = Instant::now() + BUTTON_TIMEOUT;
    while let Some(remaining) = window_remaining(deadline, Instant::now()) {
        let press_id = button_id.clone();
        let Some(press) = serenity::ComponentInteractionCollector::new(ctx.serenity_context())
            .filter(move |press| press.data.custom_id == press_id)
            .timeout(remaining)
            .next()
            .await
        else {
            break;
        };

        let current = current_voice_channel(cache, guild_id, press.user.id);
        if !still_bound(current, voice_channel_id) {
            let rejection = press.create_response(
                ctx.http(),
                serenity::CreateInteractionResponse::Message(
                    serenity::CreateInteractionResponseMessage::new()
                        .content("❌ This button only changes the voice channel you are currently in.")
                        .ephemeral(true),
                ),
            );
            retire_stale_button(rejection, reply.delete(ctx)).await;
            return Ok(());
        }

        let modal_id = status_modal_id(ctx.id(), press.id.get());
        if let Err(e) = press
            .create_response(
                ctx.http(),
                serenity::CreateInteractionResponse::Modal(status_modal(&modal_id)),
            )
            .await
        {
            warn!("Failed to open voice status modal: {}", e);
            continue;
        }

        // the modal is answered on its own task so the button keeps working meanwhile
        tokio::spawn(handle_submission(
            ctx.serenity_context().clone(),
            Arc::clone(&ctx.data().status_writer),
            voice_channel_id,
            modal_id,
        ));
    }

    if let Err(e) = reply
        .edit(ctx, CreateReply::default().components(vec![]))
        .await
    {
        warn!("Failed to disable expired voice status button: {}", e);
    }

    Ok(())
}

/// Rejects a stale press and deletes the button message; a failed rejection still deletes.
async fn retire_stale_button<E: std::fmt::Display>(
    rejection: impl Future<Output = Result<(), E>>,
    deletion: impl Future<Output = Result<(), E>>,
) {
    if let Err(e) = rejection.await {
        warn!("Failed to reject stale voice status press: {}", e);
    }
    if let Err(e) = deletion.await {
        warn!("Failed to delete stale voice status button: {}", e);
    }
}

async fn handle_submission(
    ctx: serenity::Context,
    writer: Arc<dyn VoiceStatusWriter>,
    channel_id: ChannelId,
    modal_id: String,
) {
    let submit_id = modal_id.clone();
    let Some(submit) = serenity::ModalInteractionCollector::new(&ctx)
        .filter(move |submit| submit.data.custom_id == submit_id)
        .timeout(MODAL_TIMEOUT)
        .next()
        .await
    else {
        info!("Voice status modal {} was never submitted", modal_id);
        return;
    };

    if let Err(e) = submit.defer_ephemeral(&ctx).await {
        warn!("Failed to defer voice status submission: {}", e);
        return;
    }

    let status = modal_value(&submit.data.components, STATUS_INPUT_ID).unwrap_or_default();
    let text = apply_status(writer.as_ref(), channel_id, &status).await;

    if let Err(e) = submit
        .create_followup(
            &ctx,
            serenity::CreateInteractionResponseFollowup::new()
                .content(text)
                .ephemeral(true),
        )
        .await
    {
        error!("Failed to report voice status result: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_from_other_channel_is_stale() {
        let bound = ChannelId::new(10);
        assert!(still_bound(Some(bound), bound));
        assert!(!still_bound(Some(ChannelId::new(11)), bound));
        assert!(!still_bound(None, bound));
    }

    #[tokio::test]
    async fn test_stale_button_is_deleted_even_if_rejection_fails() {
        let deleted = std::sync::atomic::AtomicBool::new(false);

        retire_stale_button(
            async { Err::<(), _>("interaction expired".to_string()) },
            async {
                deleted.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            },
        )
        .await;

        assert!(deleted.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn test_window_closes_at_deadline() {
        let now = Instant::now();
        let deadline = now + BUTTON_TIMEOUT;

        assert_eq!(window_remaining(deadline, now), Some(BUTTON_TIMEOUT));
        assert_eq!(
            window_remaining(deadline, now + Duration::from_secs(59)),
            Some(Duration::from_secs(1))
        );
        assert_eq!(window_remaining(deadline, deadline), None);
        assert_eq!(window_remaining(deadline, deadline + MODAL_TIMEOUT), None);
    }

    #[test]
    fn test_every_press_gets_its_own_modal() {
        let first = status_modal_id(7, 100);
        let second = status_modal_id(7, 101);

        assert_ne!(first, second);
        assert!(first.starts_with("7-voice-status-modal-"));
    }

    #[test]
    fn test_prompt_without_voice_has_no_button() {
        let reply = status_prompt(None, "id");
        assert!(reply.components.is_none());
        assert_eq!(reply.ephemeral, Some(true));
    }

    #[test]
    fn test_prompt_with_voice_has_one_button() {
        let reply = status_prompt(Some((ChannelId::new(10), "Lounge")), "id");
        assert_eq!(reply.components.as_ref().map(Vec::len), Some(1));
        assert_eq!(reply.ephemeral, Some(true));
        assert!(reply.content.unwrap().contains("**Lounge**"));
    }

    #[test]
    fn test_modal_caps_input_length() {
        let json = serde_json::to_value(status_modal("modal")).unwrap();
        let input = &json["components"][0]["components"][0];

        assert_eq!(json["custom_id"], "modal");
        assert_eq!(input["custom_id"], STATUS_INPUT_ID);
        assert_eq!(input["max_length"], 100);
    }
}
