//! Gateway event handler.

use std::sync::Arc;

use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use tracing::{error, info};

use crate::discord::commands::CommandRouter;

const GENERIC_FAILURE_REPLY: &str = "Oops, something went wrong on the bot side.";

pub struct Handler {
    router: Arc<CommandRouter>,
}

impl Handler {
    pub fn new(router: Arc<CommandRouter>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        // Commands are guild-only.
        if msg.guild_id.is_none() {
            return;
        }

        let content = msg.content.trim();
        if !content.starts_with(self.router.prefix()) {
            return;
        }

        match self.router.dispatch(&ctx, &msg, content).await {
            Ok(_handled) => {}
            Err(e) => {
                error!("Command '{}' failed: {:#}", content, e);
                if let Err(e) = msg.channel_id.say(&ctx.http, GENERIC_FAILURE_REPLY).await {
                    error!("Could not send failure reply: {}", e);
                }
            }
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Connected to Discord as {}", ready.user.name);
    }
}
