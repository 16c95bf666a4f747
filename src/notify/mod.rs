//! Voice-join notifications.
//!
//! Every voice-state update is reduced to a [`VoiceTransition`]; joins that pass
//! the [`NotificationPolicy`] are announced in the configured text channel.

pub mod notice;
pub mod transition;

pub use notice::{default_avatar_url, JoinTarget, Notice};
pub use transition::{NotificationPolicy, PrivilegedUser, VoiceTransition};

use poise::serenity_prelude as serenity;
use serenity::model::id::{ChannelId, RoleId, UserId};
use serenity::model::voice::VoiceState;
use tracing::{error, info, warn};

pub struct VoiceJoinNotifier {
    policy: Box<dyn NotificationPolicy>,
    role_id: RoleId,
    channel_id: ChannelId,
}

impl VoiceJoinNotifier {
    pub fn new(
        policy: impl NotificationPolicy + 'static,
        role_id: RoleId,
        channel_id: ChannelId,
    ) -> Self {
        Self {
            policy: Box::new(policy),
            role_id,
            channel_id,
        }
    }

    /// Text channel the notices go to
    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// Returns the joined channel when the transition should be announced.
    pub fn evaluate(&self, bot_id: UserId, transition: &VoiceTransition) -> Option<ChannelId> {
        if transition.member == bot_id {
            return None;
        }

        let joined = transition.joined()?;
        self.policy.should_notify(transition).then_some(joined)
    }

    pub fn compose(&self, target: &JoinTarget) -> Notice {
        Notice::compose(target, self.role_id)
    }
}

pub async fn notify_voice_join(
    ctx: &serenity::Context,
    notifier: &VoiceJoinNotifier,
    old: Option<&VoiceState>,
    new: &VoiceState,
) {
    let transition = VoiceTransition::from_states(old, new);
    let bot_id = ctx.cache.current_user().id;

    let Some(channel_id) = notifier.evaluate(bot_id, &transition) else {
        return;
    };

    let Some(guild_id) = new.guild_id else {
        warn!("Voice join of {} arrived without a guild id", new.user_id);
        return;
    };

    let text_channel = match notifier.channel_id().to_channel(ctx).await {
        Ok(channel) => channel.id(),
        Err(e) => {
            error!(
                "Notification channel {} could not be resolved: {}",
                notifier.channel_id(),
                e
            );
            return;
        }
    };

    let channel_name = match channel_id.name(ctx).await {
        Ok(name) => name,
        Err(e) => {
            warn!("Could not look up name of voice channel {}: {}", channel_id, e);
            channel_id.to_string()
        }
    };

    let avatar_url = match &new.member {
        Some(member) => member.user.face(),
        None => match new.user_id.to_user(ctx).await {
            Ok(user) => user.face(),
            Err(e) => {
                warn!("Could not fetch user {} for avatar: {}", new.user_id, e);
                default_avatar_url(new.user_id)
            }
        },
    };

    let notice = notifier.compose(&JoinTarget {
        guild_id,
        channel_id,
        channel_name,
        member_id: new.user_id,
        avatar_url,
    });

    match text_channel.send_message(ctx, notice.into_message()).await {
        Ok(_) => info!("Announced {} joining {}", new.user_id, channel_id),
        Err(e) if crate::is_permission_error(&e) => {
            warn!(
                "Missing permission to send voice-join notice in {}",
                text_channel
            );
        }
        Err(e) => error!("Failed to send voice-join notice: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: UserId = UserId::new(1);
    const OTHER: UserId = UserId::new(2);
    const BOT: UserId = UserId::new(3);
    const A: ChannelId = ChannelId::new(10);
    const B: ChannelId = ChannelId::new(20);

    fn notifier(owner: UserId) -> VoiceJoinNotifier {
        VoiceJoinNotifier::new(PrivilegedUser(owner), RoleId::new(5), ChannelId::new(99))
    }

    #[test]
    fn test_bot_transitions_are_ignored() {
        // even when the bot is configured as the privileged user
        let notifier = notifier(BOT);
        let transition = VoiceTransition::new(BOT, None, Some(A));
        assert_eq!(notifier.evaluate(BOT, &transition), None);
    }

    #[test]
    fn test_disconnects_are_ignored() {
        let notifier = notifier(OWNER);
        for member in [OWNER, OTHER] {
            let transition = VoiceTransition::new(member, Some(A), None);
            assert_eq!(notifier.evaluate(BOT, &transition), None);
        }
    }

    #[test]
    fn test_same_channel_updates_are_ignored() {
        let notifier = notifier(OWNER);
        let transition = VoiceTransition::new(OWNER, Some(A), Some(A));
        assert_eq!(notifier.evaluate(BOT, &transition), None);
    }

    #[test]
    fn test_owner_move_is_announced_in_new_channel() {
        let notifier = notifier(OWNER);
        let transition = VoiceTransition::new(OWNER, Some(A), Some(B));
        assert_eq!(notifier.evaluate(BOT, &transition), Some(B));
    }

    #[test]
    fn test_other_member_join_is_silent() {
        let notifier = notifier(OWNER);
        let transition = VoiceTransition::new(OTHER, None, Some(A));
        assert_eq!(notifier.evaluate(BOT, &transition), None);
    }

    #[test]
    fn test_compose_uses_configured_role() {
        let notifier = notifier(OWNER);
        let notice = notifier.compose(&JoinTarget {
            guild_id: serenity::model::id::GuildId::new(7),
            channel_id: B,
            channel_name: "B".into(),
            member_id: OWNER,
            avatar_url: String::new(),
        });

        assert_eq!(notice.role_id, RoleId::new(5));
        assert_eq!(notice.link, "discord://discord.com/channels/7/20");
        assert!(notice.description.contains("<@1>"));
    }
}
