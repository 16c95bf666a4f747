use poise::serenity_prelude as serenity;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use serenity::{Colour, CreateAllowedMentions, CreateEmbed, CreateEmbedFooter, CreateMessage};

const TITLE: &str = "👑 Owner joined voice";
const FOOTER: &str = "Thanks for all your hard work";

/// Everything needed to describe one join.
#[derive(Debug, Clone)]
pub struct JoinTarget {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub channel_name: String,
    pub member_id: UserId,
    pub avatar_url: String,
}

/// A composed notification, ready to be turned into one outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub content: String,
    pub link: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub role_id: RoleId,
}

pub fn voice_channel_link(guild_id: GuildId, channel_id: ChannelId) -> String {
    format!("discord://discord.com/channels/{}/{}", guild_id, channel_id)
}

/// Discord's stock avatar for accounts without one, picked the way the client does for new usernames.
pub fn default_avatar_url(user_id: UserId) -> String {
    format!(
        "https://cdn.discordapp.com/embed/avatars/{}.png",
        (user_id.get() >> 22) % 6
    )
}

impl Notice {
    pub fn compose(target: &JoinTarget, role_id: RoleId) -> Self {
        let link = voice_channel_link(target.guild_id, target.channel_id);
        let content = format!(
            "<@&{}> <#{}>\n[Click to join]({})",
            role_id, target.channel_id, link
        );

        Self {
            content,
            link,
            title: TITLE.to_string(),
            description: format!(
                "<@{}> joined **{}**!",
                target.member_id, target.channel_name
            ),
            thumbnail: if target.avatar_url.is_empty() {
                default_avatar_url(target.member_id)
            } else {
                target.avatar_url.clone()
            },
            role_id,
        }
    }

    /// Only the referenced role may be pinged; user and everyone mentions stay silent.
    pub fn into_message(self) -> CreateMessage {
        let embed = CreateEmbed::new()
            .title(self.title)
            .description(self.description)
            .colour(Colour::GOLD)
            .thumbnail(self.thumbnail)
            .footer(CreateEmbedFooter::new(FOOTER));

        CreateMessage::new()
            .content(self.content)
            .embed(embed)
            .allowed_mentions(CreateAllowedMentions::new().roles(vec![self.role_id]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> JoinTarget {
        JoinTarget {
            guild_id: GuildId::new(100),
            channel_id: ChannelId::new(200),
            channel_name: "General".into(),
            member_id: UserId::new(300),
            avatar_url: "https://cdn.discordapp.com/embed/avatars/0.png".into(),
        }
    }

    #[test]
    fn test_link_embeds_guild_and_channel() {
        let notice = Notice::compose(&target(), RoleId::new(55));
        assert_eq!(notice.link, "discord://discord.com/channels/100/200");
        assert!(notice.content.contains(&notice.link));
    }

    #[test]
    fn test_content_mentions_role_and_channel() {
        let notice = Notice::compose(&target(), RoleId::new(55));
        assert!(notice.content.starts_with("<@&55> <#200>\n"));
    }

    #[test]
    fn test_description_names_member_and_channel() {
        let notice = Notice::compose(&target(), RoleId::new(55));
        assert!(notice.description.contains("<@300>"));
        assert!(notice.description.contains("**General**"));
    }

    #[test]
    fn test_missing_avatar_falls_back_to_default() {
        let mut target = target();
        target.avatar_url = String::new();
        target.member_id = UserId::new(1220256562371756042);

        let notice = Notice::compose(&target, RoleId::new(55));
        let expected = format!(
            "https://cdn.discordapp.com/embed/avatars/{}.png",
            (1220256562371756042u64 >> 22) % 6
        );
        assert_eq!(notice.thumbnail, expected);

        let json = serde_json::to_value(notice.into_message()).unwrap();
        assert_eq!(json["embeds"][0]["thumbnail"]["url"], expected.as_str());
    }

    #[test]
    fn test_message_allows_only_the_role_mention() {
        let message = Notice::compose(&target(), RoleId::new(55)).into_message();
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["embeds"].as_array().map(Vec::len), Some(1));
        assert_eq!(json["allowed_mentions"]["roles"], serde_json::json!(["55"]));
        assert_eq!(json["allowed_mentions"]["parse"], serde_json::json!([]));
    }
}
