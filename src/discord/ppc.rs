//! The !ppc mini-game: rock/paper/scissors for voice-channel custody.
//!
//! Two members sharing a voice channel play one round; on a decisive
//! outcome the loser is disconnected from voice. A tie disconnects nobody.

use serenity::builder::EditMember;
use serenity::model::channel::Message;
use serenity::model::id::{ChannelId, UserId};
use serenity::model::mention::Mentionable;
use serenity::prelude::*;
use tracing::{info, warn};

use crate::minigame::{resolve, Move, Outcome};

/// The channel both players share, if any.
fn shared_voice_channel(
    challenger: Option<ChannelId>,
    opponent: Option<ChannelId>,
) -> Option<ChannelId> {
    match (challenger, opponent) {
        (Some(a), Some(b)) if a == b => Some(a),
        _ => None,
    }
}

/// Pick the challenger's move from the arguments, ignoring the mention token.
fn parse_challenger_move(args: &str) -> Option<Move> {
    args.split_whitespace()
        .find(|token| !token.starts_with("<@"))
        .and_then(|token| token.parse().ok())
}

pub async fn handle_ppc(ctx: &Context, msg: &Message, args: &str) -> anyhow::Result<()> {
    let Some(guild_id) = msg.guild_id else {
        msg.channel_id
            .say(&ctx.http, "!ppc only works inside a server.")
            .await?;
        return Ok(());
    };

    let Some(opponent) = msg.mentions.first() else {
        msg.channel_id
            .say(&ctx.http, "Usage: `!ppc @opponent [rock|paper|scissors]`")
            .await?;
        return Ok(());
    };

    if opponent.id == msg.author.id {
        msg.channel_id
            .say(&ctx.http, "You cannot challenge yourself.")
            .await?;
        return Ok(());
    }
    if opponent.bot {
        msg.channel_id
            .say(&ctx.http, "Bots do not play. They always win.")
            .await?;
        return Ok(());
    }

    // Cache guards are not Send; resolve everything before the first await.
    let voice = {
        ctx.cache.guild(guild_id).map(|guild| {
            let channel_of = |user_id: UserId| {
                guild
                    .voice_states
                    .get(&user_id)
                    .and_then(|state| state.channel_id)
            };
            (channel_of(msg.author.id), channel_of(opponent.id))
        })
    };

    let Some((challenger_channel, opponent_channel)) = voice else {
        msg.channel_id
            .say(&ctx.http, "Server state is not available right now.")
            .await?;
        return Ok(());
    };

    if shared_voice_channel(challenger_channel, opponent_channel).is_none() {
        msg.channel_id
            .say(
                &ctx.http,
                "Both players must be in the same voice channel to play.",
            )
            .await?;
        return Ok(());
    }

    // Same scoping rule for the rng handle.
    let (challenger_move, opponent_move) = {
        let mut rng = rand::thread_rng();
        let challenger_move =
            parse_challenger_move(args).unwrap_or_else(|| Move::random(&mut rng));
        (challenger_move, Move::random(&mut rng))
    };

    let outcome = resolve(challenger_move, opponent_move);
    info!(
        "!ppc {} vs {}: {:?} vs {:?} -> {:?}",
        msg.author.name, opponent.name, challenger_move, opponent_move, outcome
    );

    let mut lines = vec![format!(
        "{} {} {} vs {} {} {}",
        msg.author.mention(),
        challenger_move.emoji(),
        challenger_move.name(),
        opponent_move.emoji(),
        opponent_move.name(),
        opponent.mention(),
    )];

    let loser = match outcome {
        Outcome::Tie => {
            lines.push("Tie. Nobody leaves.".to_string());
            None
        }
        Outcome::FirstWins => {
            lines.push(format!("{} wins! {} gets the boot.", msg.author.mention(), opponent.mention()));
            Some(opponent.id)
        }
        Outcome::SecondWins => {
            lines.push(format!("{} wins! {} gets the boot.", opponent.mention(), msg.author.mention()));
            Some(msg.author.id)
        }
    };

    msg.channel_id.say(&ctx.http, lines.join("\n")).await?;

    if let Some(loser_id) = loser {
        let edit = EditMember::new().disconnect_member();
        if let Err(e) = guild_id.edit_member(&ctx.http, loser_id, edit).await {
            // Missing MOVE_MEMBERS, or the loser already left voice.
            warn!("Could not disconnect {} after !ppc: {}", loser_id, e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_channel_match() {
        let channel = ChannelId::new(42);
        assert_eq!(
            shared_voice_channel(Some(channel), Some(channel)),
            Some(channel)
        );
    }

    #[test]
    fn test_shared_channel_mismatch() {
        assert_eq!(
            shared_voice_channel(Some(ChannelId::new(1)), Some(ChannelId::new(2))),
            None
        );
    }

    #[test]
    fn test_shared_channel_missing() {
        assert_eq!(shared_voice_channel(None, Some(ChannelId::new(1))), None);
        assert_eq!(shared_voice_channel(Some(ChannelId::new(1)), None), None);
        assert_eq!(shared_voice_channel(None, None), None);
    }

    #[test]
    fn test_parse_move_skips_mention() {
        assert_eq!(parse_challenger_move("<@123456> rock"), Some(Move::Rock));
        assert_eq!(parse_challenger_move("p <@123456>"), Some(Move::Paper));
    }

    #[test]
    fn test_parse_move_absent() {
        assert_eq!(parse_challenger_move("<@123456>"), None);
        assert_eq!(parse_challenger_move(""), None);
        assert_eq!(parse_challenger_move("<@123456> banana"), None);
    }
}
