//! Discord client construction.

use std::sync::Arc;

use serenity::prelude::*;

use crate::config::types::Settings;
use crate::discord::commands::CommandRouter;
use crate::discord::handler::Handler;

/// Build the gateway client with the intents the commands need.
///
/// GUILD_MEMBERS and GUILD_VOICE_STATES are privileged-adjacent but required
/// for !users and !ppc; MESSAGE_CONTENT must be enabled in the developer
/// portal or every message arrives empty.
pub async fn build_client(
    settings: &Settings,
    router: Arc<CommandRouter>,
) -> Result<Client, SerenityError> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_VOICE_STATES;

    Client::builder(&settings.discord_token, intents)
        .event_handler(Handler::new(router))
        .await
}
