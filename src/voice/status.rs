//! Voice channel status writes.
//!
//! Discord exposes no documented route for a voice channel's status line, so
//! the write goes straight to `PUT /channels/{id}/voice-status`. Everything that
//! knows about that path lives in this file.

use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use reqwest::StatusCode;
use serde::Serialize;
use serenity::model::id::ChannelId;
use thiserror::Error;
use tracing::{error, info, warn};

/// Longest status the modal accepts
pub const MAX_STATUS_LEN: usize = 100;

#[derive(Debug, Error)]
pub enum VoiceStatusError {
    #[error("missing permission to edit the voice channel status ({0})")]
    PermissionDenied(StatusCode),
    #[error("unexpected response {status}: {body}")]
    Unexpected { status: StatusCode, body: String },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct VoiceStatusBody<'a> {
    status: &'a str,
}

#[async_trait]
pub trait VoiceStatusWriter: Send + Sync {
    async fn set_channel_status(
        &self,
        channel_id: ChannelId,
        status: &str,
    ) -> Result<(), VoiceStatusError>;
}

pub fn voice_status_route(channel_id: ChannelId) -> String {
    format!("/channels/{}/voice-status", channel_id)
}

pub struct HttpVoiceStatusWriter {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl HttpVoiceStatusWriter {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            token: token.into(),
        }
    }

    fn url(&self, channel_id: ChannelId) -> String {
        format!("{}{}", self.api_base, voice_status_route(channel_id))
    }
}

#[async_trait]
impl VoiceStatusWriter for HttpVoiceStatusWriter {
    async fn set_channel_status(
        &self,
        channel_id: ChannelId,
        status: &str,
    ) -> Result<(), VoiceStatusError> {
        let response = self
            .client
            .put(self.url(channel_id))
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
            .json(&VoiceStatusBody { status })
            .send()
            .await?;

        let code = response.status();
        if code.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(code, body))
    }
}

fn classify_failure(status: StatusCode, body: String) -> VoiceStatusError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            VoiceStatusError::PermissionDenied(status)
        }
        _ => VoiceStatusError::Unexpected { status, body },
    }
}

/// Writes `status` once and returns the text to show the requester.
pub async fn apply_status(
    writer: &dyn VoiceStatusWriter,
    channel_id: ChannelId,
    status: &str,
) -> String {
    match writer.set_channel_status(channel_id, status).await {
        Ok(()) => {
            info!("Set voice status of {} to {:?}", channel_id, status);
            format!("✅ Set the voice channel status to \"{}\".", status)
        }
        Err(VoiceStatusError::PermissionDenied(code)) => {
            warn!("Not allowed to set voice status of {}: {}", channel_id, code);
            "❌ Could not change the voice channel status: the bot lacks permission. \
             Check that it can manage this channel."
                .to_string()
        }
        Err(e) => {
            error!("Voice status request for {} failed: {}", channel_id, e);
            format!(
                "❌ An error occurred while changing the voice channel status: {}\n\
                 (this endpoint is unofficial and may have changed)",
                e
            )
        }
    }
}
