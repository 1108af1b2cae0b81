//! Command parsing and dispatch (!hello, !stats, !id, !ppc, etc).

use std::sync::Arc;

use serenity::builder::{CreateEmbed, CreateMessage};
use serenity::model::channel::Message;
use serenity::model::mention::Mentionable;
use serenity::model::Colour;
use serenity::prelude::*;
use tracing::{debug, error, info};

use crate::config::types::Settings;
use crate::discord::ppc;
use crate::stats::{StatsGateway, StatsReply};
use crate::store::identity::ClearTarget;
use crate::store::{IdentityField, IdentityStore};

/// Parses incoming chat messages and routes them to handlers.
pub struct CommandRouter {
    settings: Arc<Settings>,
    stats: StatsGateway,
    identities: Arc<IdentityStore>,
}

/// Split off the first whitespace-delimited word.
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

/// Extract `(verb, arguments)` from a prefixed command message.
///
/// Returns `None` for anything that isn't a command.
pub(crate) fn parse_command<'a>(content: &'a str, prefix: &str) -> Option<(String, &'a str)> {
    let rest = content.strip_prefix(prefix)?;
    let (verb, args) = split_word(rest);
    if verb.is_empty() {
        return None;
    }
    Some((verb.to_lowercase(), args))
}

impl CommandRouter {
    pub fn new(
        settings: Arc<Settings>,
        stats: StatsGateway,
        identities: Arc<IdentityStore>,
    ) -> Self {
        Self {
            settings,
            stats,
            identities,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.settings.command_prefix
    }

    /// Parse and execute a command.
    ///
    /// Returns `true` if the message matched a known verb, `false`
    /// otherwise. Unknown verbs are silently ignored by the caller.
    pub async fn dispatch(
        &self,
        ctx: &Context,
        msg: &Message,
        content: &str,
    ) -> anyhow::Result<bool> {
        let Some((verb, args)) = parse_command(content, &self.settings.command_prefix) else {
            return Ok(false);
        };

        debug!("Processing command: {} with args: {:?}", verb, args);

        match verb.as_str() {
            "hello" => {
                msg.channel_id
                    .say(&ctx.http, format!("Hello {}!", msg.author.mention()))
                    .await?;
                Ok(true)
            }
            "users" => {
                self.handle_users(ctx, msg).await?;
                Ok(true)
            }
            "damn" => {
                let reply = match msg.mentions.first() {
                    Some(user) => format!("Damn {}.", user.mention()),
                    None => "Damn.".to_string(),
                };
                msg.channel_id.say(&ctx.http, reply).await?;
                Ok(true)
            }
            "hi" => {
                self.handle_hi(ctx, msg, args).await?;
                Ok(true)
            }
            "help" => {
                self.handle_help(ctx, msg).await?;
                Ok(true)
            }
            "id" => {
                self.handle_id(ctx, msg, args).await?;
                Ok(true)
            }
            "stats" => {
                self.handle_stats(ctx, msg, args).await?;
                Ok(true)
            }
            "ppc" => {
                ppc::handle_ppc(ctx, msg, args).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Handle !users: member count of the current guild.
    async fn handle_users(&self, ctx: &Context, msg: &Message) -> anyhow::Result<()> {
        let count = {
            msg.guild_id
                .and_then(|guild_id| ctx.cache.guild(guild_id).map(|guild| guild.member_count))
        };

        let reply = match count {
            Some(count) => count.to_string(),
            None => "No guild context.".to_string(),
        };
        msg.channel_id.say(&ctx.http, reply).await?;
        Ok(())
    }

    /// Handle !hi: summon somebody, with a few community callouts.
    async fn handle_hi(&self, ctx: &Context, msg: &Message, args: &str) -> anyhow::Result<()> {
        let target = if args.trim().is_empty() {
            msg.author.name.as_str()
        } else {
            args.trim()
        };

        let reply = match callout(target) {
            Some(line) => line.to_string(),
            None => format!("Summoning {}.", target),
        };
        msg.channel_id.say(&ctx.http, reply).await?;
        Ok(())
    }

    /// Handle !help: list all commands.
    async fn handle_help(&self, ctx: &Context, msg: &Message) -> anyhow::Result<()> {
        let p = &self.settings.command_prefix;
        let embed = CreateEmbed::new()
            .title("Stormbot - commands")
            .description(format!("Available commands (prefix: `{}`)", p))
            .colour(Colour::BLURPLE)
            .field(format!("{}hello", p), "Says hello.", true)
            .field(format!("{}users", p), "Member count of this server.", true)
            .field(format!("{}damn [@member]", p), "Damn somebody (or just 'Damn.').", true)
            .field(
                format!("{}hi [name]", p),
                "Summon somebody, or yourself if no name is given.",
                true,
            )
            .field(
                format!("{}id", p),
                format!(
                    "Show or register your identifiers. \
                     `{p}id steam <name>` | `{p}id epic <name>` | `{p}id tag <tag>` | `{p}id clear all`",
                    p = p
                ),
                false,
            )
            .field(
                format!("{}stats <game> [identifier]", p),
                "Game stats: `minecraft`, `ark`, `satisfactory`, `lethal`, `smite1`, `smite2`, \
                 `rocketleague` (plus `rl tournaments` / `rl shop`), `coc`, `brawl`, `royale`.",
                false,
            )
            .field(
                format!("{}ppc @opponent [move]", p),
                "Rock/paper/scissors for voice-channel custody. The loser gets disconnected.",
                false,
            );

        msg.channel_id
            .send_message(&ctx.http, CreateMessage::new().embed(embed))
            .await?;
        Ok(())
    }

    /// Handle !id: show, set or clear per-user identifiers.
    async fn handle_id(&self, ctx: &Context, msg: &Message, args: &str) -> anyhow::Result<()> {
        let user_id = msg.author.id.get();
        let (action, rest) = split_word(args);
        let action = action.to_lowercase();

        let reply = match action.as_str() {
            "" | "show" | "get" => self.show_identities(user_id).await,
            // Shorthand: !id steam <value>
            "steam" => self.set_identity(user_id, IdentityField::Steam, rest).await?,
            "epic" => self.set_identity(user_id, IdentityField::Epic, rest).await?,
            "tag" => self.set_identity(user_id, IdentityField::Tag, rest).await?,
            "set" => {
                let (kind, value) = split_word(rest);
                match kind.parse::<IdentityField>() {
                    Ok(field) => self.set_identity(user_id, field, value).await?,
                    Err(()) => {
                        "Usage: `!id steam <value>`, `!id epic <value>` or `!id tag <value>`"
                            .to_string()
                    }
                }
            }
            "clear" => match rest.parse::<ClearTarget>() {
                Ok(target) => {
                    self.identities.clear(user_id, target).await?;
                    "OK, identifier(s) cleared.".to_string()
                }
                Err(()) => "Usage: `!id clear steam|epic|tag|all`".to_string(),
            },
            _ => "Usage: `!id` (show), `!id steam|epic|tag <value>`, `!id clear steam|epic|tag|all`"
                .to_string(),
        };

        msg.channel_id.say(&ctx.http, reply).await?;
        Ok(())
    }

    async fn show_identities(&self, user_id: u64) -> String {
        let record = self.identities.get(user_id).await.unwrap_or_default();
        let show = |value: Option<&str>| value.unwrap_or("(not set)").to_string();

        format!(
            "Steam: {}\nEpic: {}\nTag: {}\n\nSet with `!id steam <value>`, `!id epic <value>` or \
             `!id tag <value>`. Clear with `!id clear steam|epic|tag|all`.",
            show(record.steam.as_deref()),
            show(record.epic.as_deref()),
            show(record.tag.as_deref()),
        )
    }

    async fn set_identity(
        &self,
        user_id: u64,
        field: IdentityField,
        value: &str,
    ) -> anyhow::Result<String> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(format!("Usage: `!id {} <value>`", field.as_str()));
        }

        self.identities.set(user_id, field, value).await?;
        info!("Registered {} identifier for user {}", field.as_str(), user_id);
        Ok(format!("OK, {} registered.", field.as_str()))
    }

    /// Handle !stats <game> [identifier].
    async fn handle_stats(&self, ctx: &Context, msg: &Message, args: &str) -> anyhow::Result<()> {
        let (game, identifier) = split_word(args);
        if game.is_empty() {
            let p = &self.settings.command_prefix;
            msg.channel_id
                .say(
                    &ctx.http,
                    format!(
                        "Usage: `{p}stats <game> [identifier]`\nExamples: `{p}stats minecraft`, \
                         `{p}stats ark`, `{p}stats smite2 MyName`, `{p}stats rocketleague MyName`",
                        p = p
                    ),
                )
                .await?;
            return Ok(());
        }

        info!("!stats {} from {} with arg: {:?}", game, msg.author.name, identifier);

        match self.stats.lookup(game, identifier, msg.author.id.get()).await {
            Ok(reply) => self.send_stats_reply(ctx, msg, reply).await?,
            Err(e) => {
                error!("Stats lookup '{}' failed: {}", game, e);
                msg.channel_id.say(&ctx.http, e.user_reply()).await?;
            }
        }
        Ok(())
    }

    async fn send_stats_reply(
        &self,
        ctx: &Context,
        msg: &Message,
        reply: StatsReply,
    ) -> anyhow::Result<()> {
        match reply {
            StatsReply::Text(text) => {
                msg.channel_id.say(&ctx.http, text).await?;
            }
            StatsReply::Embed(reply) => {
                let mut embed = CreateEmbed::new().title(reply.title).colour(Colour::BLURPLE);
                if let Some(description) = reply.description {
                    embed = embed.description(description);
                }
                for field in reply.fields {
                    embed = embed.field(field.name, field.value, field.inline);
                }
                msg.channel_id
                    .send_message(&ctx.http, CreateMessage::new().embed(embed))
                    .await?;
            }
        }
        Ok(())
    }
}

/// Community in-joke replies for !hi.
fn callout(target: &str) -> Option<&'static str> {
    match target {
        "DJ" => Some("My vengeance is going to be huge"),
        "Nicoow" => Some("My vengeance is going to hurt you ☠"),
        "Lucas" => Some("Lucas."),
        "Grimdal" => Some("Grimdal has been summoned."),
        "Kenderium" => Some("Kenderium has been summoned."),
        _ => None,
    }
}
