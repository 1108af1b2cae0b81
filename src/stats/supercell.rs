//! Supercell player lookups (Clash of Clans, Brawl Stars, Clash Royale).
//!
//! The three games share the same API shape: `GET /v1/players/%23TAG` with a
//! bearer token, answering a JSON player document.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::common::error::StatsError;
use crate::stats::{EmbedField, EmbedReply};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Which Supercell game a lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupercellGame {
    ClashOfClans,
    BrawlStars,
    ClashRoyale,
}

impl SupercellGame {
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::ClashOfClans => "https://api.clashofclans.com/v1",
            Self::BrawlStars => "https://api.brawlstars.com/v1",
            Self::ClashRoyale => "https://api.clashroyale.com/v1",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::ClashOfClans => "Clash of Clans",
            Self::BrawlStars => "Brawl Stars",
            Self::ClashRoyale => "Clash Royale",
        }
    }
}

/// Normalize a player tag: strip the leading `#`, uppercase, and replace the
/// letter O with zero (tags never contain O; users type it anyway).
pub fn normalize_tag(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('#')
        .to_uppercase()
        .replace('O', "0")
}

/// Client for the Supercell player APIs.
pub struct SupercellClient {
    http: reqwest::Client,
}

impl SupercellClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Fetch a player document by normalized tag.
    pub async fn player(
        &self,
        game: SupercellGame,
        token: &str,
        tag: &str,
    ) -> Result<Value, StatsError> {
        let url = format!("{}/players/%23{}", game.base_url(), tag);
        debug!("Supercell GET {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StatsError::Http {
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|e| StatsError::Malformed {
            message: e.to_string(),
        })
    }
}

/// Build the reply embed for a player document.
pub fn build_player_reply(game: SupercellGame, tag: &str, payload: &Value) -> EmbedReply {
    let name = payload["name"].as_str().unwrap_or("Unknown");
    let mut fields = Vec::new();

    let mut push = |name: &str, value: Option<String>| {
        if let Some(value) = value {
            fields.push(EmbedField {
                name: name.to_string(),
                value,
                inline: true,
            });
        }
    };

    match game {
        SupercellGame::ClashOfClans => {
            push("Town Hall", num(payload, "townHallLevel"));
            push("Trophies", num(payload, "trophies"));
            push("Best trophies", num(payload, "bestTrophies"));
            push("War stars", num(payload, "warStars"));
            push("Clan", text(&payload["clan"], "name"));
        }
        SupercellGame::BrawlStars => {
            push("Trophies", num(payload, "trophies"));
            push("Highest trophies", num(payload, "highestTrophies"));
            push("3v3 victories", num(payload, "3vs3Victories"));
            push("Solo victories", num(payload, "soloVictories"));
            push("Club", text(&payload["club"], "name"));
        }
        SupercellGame::ClashRoyale => {
            push("Trophies", num(payload, "trophies"));
            push("Best trophies", num(payload, "bestTrophies"));
            push("Wins", num(payload, "wins"));
            push("Losses", num(payload, "losses"));
            push("Clan", text(&payload["clan"], "name"));
        }
    }

    EmbedReply {
        title: game.title().to_string(),
        description: Some(format!("Player: **{}** (#{})", name, tag)),
        fields,
    }
}

fn num(payload: &Value, key: &str) -> Option<String> {
    payload[key].as_u64().map(|n| n.to_string())
}

fn text(payload: &Value, key: &str) -> Option<String> {
    payload[key].as_str().map(str::to_string)
}
