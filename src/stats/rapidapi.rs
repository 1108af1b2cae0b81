//! Rocket League stats via a RapidAPI provider.
//!
//! Providers behind RapidAPI are loose with both content types and error
//! signaling: errors can arrive as a 200 body carrying `{error, statusCode}`,
//! and "player not found" as an empty JSON object. Everything here
//! normalizes that into [`StatsError`].

use std::time::Duration;

use chrono::DateTime;
use serde_json::Value;
use tracing::debug;

use crate::common::error::StatsError;
use crate::stats::format::{leaf_name, pick_scalar_stats};
use crate::stats::{EmbedField, EmbedReply};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_RANK_FIELDS: usize = 6;
const MAX_TOURNAMENTS: usize = 12;
const MAX_SHOP_ITEMS: usize = 15;
const FALLBACK_FIELDS: usize = 10;

/// RapidAPI client bound to one provider host.
pub struct RapidApiClient {
    http: reqwest::Client,
    api_key: String,
    api_host: String,
}

impl RapidApiClient {
    pub fn new(http: reqwest::Client, api_key: String, api_host: String) -> Self {
        Self {
            http,
            api_key,
            api_host,
        }
    }

    /// GET a JSON document, tolerating wrong content types and surfacing
    /// in-payload errors.
    pub async fn get_json(&self, url: &str) -> Result<Value, StatsError> {
        debug!("RapidAPI GET {}", url);

        let response = self
            .http
            .get(url)
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.api_host)
            .header("Accept-Encoding", "identity")
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let payload: Value =
            serde_json::from_str(&text).unwrap_or_else(|_| serde_json::json!({ "raw": text }));

        if !status.is_success() {
            return Err(StatsError::Http {
                status: status.as_u16(),
            });
        }

        check_payload(payload)
    }
}

/// Reject error-shaped and empty 200 payloads.
pub(crate) fn check_payload(payload: Value) -> Result<Value, StatsError> {
    let map = match payload.as_object() {
        Some(map) => map,
        None => {
            return Err(StatsError::Malformed {
                message: format!("non-object JSON: {}", payload),
            })
        }
    };

    if map.contains_key("error") && map.contains_key("statusCode") {
        let status = map
            .get("statusCode")
            .and_then(Value::as_u64)
            .unwrap_or(500) as u16;
        return Err(StatsError::Http { status });
    }

    // An empty object is this provider's "not found"; caching it would pin
    // the miss for a day.
    if map.is_empty() {
        return Err(StatsError::Http { status: 404 });
    }

    Ok(payload)
}

/// Build the player-ranks embed.
pub fn build_ranks_reply(identifier: &str, payload: &Value) -> EmbedReply {
    let mut fields = Vec::new();

    if let Some(ranks) = payload["ranks"].as_array() {
        for item in ranks.iter().take(MAX_RANK_FIELDS) {
            let playlist = item["playlist"].as_str().unwrap_or("Unknown");
            let rank = item["rank"].as_str().unwrap_or("?");

            let mut value = rank.to_string();
            if let Some(division) = item["division"].as_str() {
                value.push_str(&format!(" | Div {}", division));
            } else if let Some(division) = item["division"].as_u64() {
                value.push_str(&format!(" | Div {}", division));
            }
            if let Some(mmr) = item["mmr"].as_u64() {
                value.push_str(&format!(" | MMR {}", mmr));
            }

            fields.push(EmbedField {
                name: playlist.to_string(),
                value,
                inline: true,
            });
        }
    }

    if let Some(reward) = payload["reward"].as_object() {
        let level = reward
            .get("level")
            .and_then(Value::as_str)
            .unwrap_or("?");
        let progress = reward
            .get("progress")
            .map(value_to_display)
            .unwrap_or_else(|| "?".to_string());
        fields.push(EmbedField {
            name: "Season reward".to_string(),
            value: format!("Level: {} | Progress: {}", level, progress),
            inline: false,
        });
    }

    if fields.is_empty() {
        fields = fallback_fields(payload);
    }

    EmbedReply {
        title: "Rocket League".to_string(),
        description: Some(format!("Player: `{}`", identifier)),
        fields,
    }
}

/// Build the EU-tournaments embed.
pub fn build_tournaments_reply(payload: &Value) -> EmbedReply {
    let mut fields = Vec::new();

    if let Some(tournaments) = payload["tournaments"].as_array() {
        for tournament in tournaments.iter().take(MAX_TOURNAMENTS) {
            let mode = tournament["mode"].as_str().unwrap_or("Standard");
            let players = tournament["players"]
                .as_u64()
                .map(|p| format!("{}v{}", p, p))
                .unwrap_or_else(|| "?".to_string());
            let starts = tournament["starts"]
                .as_str()
                .map(format_start_time)
                .unwrap_or_else(|| "unknown start".to_string());

            fields.push(EmbedField {
                name: mode.to_string(),
                value: format!("{} | starts {}", players, starts),
                inline: true,
            });
        }
    }

    let description = if fields.is_empty() {
        Some("No tournaments scheduled.".to_string())
    } else {
        None
    };

    EmbedReply {
        title: "Rocket League - EU tournaments".to_string(),
        description,
        fields,
    }
}

/// Build the featured-shop embed.
pub fn build_shop_reply(payload: &Value) -> EmbedReply {
    let mut fields = Vec::new();

    let items = payload["items"]
        .as_array()
        .or_else(|| payload["featured"].as_array())
        .or_else(|| payload["data"].as_array());

    if let Some(items) = items {
        for (i, item) in items.iter().take(MAX_SHOP_ITEMS).enumerate() {
            let name = item["name"]
                .as_str()
                .or_else(|| item["title"].as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Item {}", i + 1));
            let price = item
                .get("price")
                .or_else(|| item.get("cost"))
                .map(value_to_display)
                .unwrap_or_else(|| "?".to_string());

            let mut value = format!("Price: {}", price);
            if let Some(rarity) = item["rarity"].as_str() {
                value.push_str(&format!(" | {}", rarity));
            }

            fields.push(EmbedField {
                name,
                value,
                inline: true,
            });
        }
    }

    if fields.is_empty() {
        fields = fallback_fields(payload);
    }

    EmbedReply {
        title: "Rocket League - featured shop".to_string(),
        description: None,
        fields,
    }
}

fn fallback_fields(payload: &Value) -> Vec<EmbedField> {
    pick_scalar_stats(payload, FALLBACK_FIELDS)
        .into_iter()
        .map(|(path, value)| EmbedField {
            name: leaf_name(&path).to_string(),
            value,
            inline: true,
        })
        .collect()
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn format_start_time(iso: &str) -> String {
    match DateTime::parse_from_rfc3339(iso) {
        Ok(dt) => dt.format("%d/%m/%Y %H:%M UTC").to_string(),
        Err(_) => iso.to_string(),
    }
}
