use poise::serenity_prelude as serenity;
use serenity::model::id::{ChannelId, UserId};
use serenity::model::voice::VoiceState;

/// A member's voice membership before and after one gateway update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceTransition {
    pub member: UserId,
    pub previous: Option<ChannelId>,
    pub current: Option<ChannelId>,
}

impl VoiceTransition {
    pub fn new(member: UserId, previous: Option<ChannelId>, current: Option<ChannelId>) -> Self {
        Self {
            member,
            previous,
            current,
        }
    }

    pub fn from_states(old: Option<&VoiceState>, new: &VoiceState) -> Self {
        Self::new(new.user_id, old.and_then(|vs| vs.channel_id), new.channel_id)
    }

    /// The channel entered by a fresh join or a move between channels.
    ///
    /// Disconnects and updates that stay in the same channel (mute, deafen,
    /// stream toggles) yield `None`.
    pub fn joined(&self) -> Option<ChannelId> {
        let current = self.current?;
        match self.previous {
            Some(previous) if previous == current => None,
            _ => Some(current),
        }
    }
}

/// Decides whether a join is worth announcing.
pub trait NotificationPolicy: Send + Sync {
    fn should_notify(&self, transition: &VoiceTransition) -> bool;
}

/// Announces a single user.
#[derive(Debug, Clone, Copy)]
pub struct PrivilegedUser(pub UserId);

impl NotificationPolicy for PrivilegedUser {
    fn should_notify(&self, transition: &VoiceTransition) -> bool {
        transition.member == self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: ChannelId = ChannelId::new(10);
    const B: ChannelId = ChannelId::new(20);
    const USER: UserId = UserId::new(1);

    #[test]
    fn test_join_from_nowhere() {
        assert_eq!(VoiceTransition::new(USER, None, Some(A)).joined(), Some(A));
    }

    #[test]
    fn test_move_between_channels() {
        assert_eq!(VoiceTransition::new(USER, Some(A), Some(B)).joined(), Some(B));
    }

    #[test]
    fn test_disconnect_is_not_a_join() {
        assert_eq!(VoiceTransition::new(USER, Some(A), None).joined(), None);
        assert_eq!(VoiceTransition::new(USER, None, None).joined(), None);
    }

    #[test]
    fn test_same_channel_update_is_not_a_join() {
        assert_eq!(VoiceTransition::new(USER, Some(A), Some(A)).joined(), None);
    }

    #[test]
    fn test_privileged_user_policy() {
        let policy = PrivilegedUser(USER);
        assert!(policy.should_notify(&VoiceTransition::new(USER, None, Some(A))));
        assert!(!policy.should_notify(&VoiceTransition::new(UserId::new(2), None, Some(A))));
    }
}
