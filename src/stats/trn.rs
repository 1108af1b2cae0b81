//! Tracker Network (TRN) profile lookups for Smite / Smite 2.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde_json::Value;
use tracing::debug;

use crate::common::error::StatsError;
use crate::stats::{EmbedField, EmbedReply};

const BASE_URL: &str = "https://public-api.tracker.gg/v2";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Stat keys shown first when present, in order.
const PREFERRED_STATS: &[&str] = &[
    "rank",
    "rating",
    "mmr",
    "tier",
    "wins",
    "losses",
    "matchesPlayed",
    "winPercentage",
    "kd",
    "kda",
];

const MAX_FIELDS: usize = 6;

/// TRN API client for one configured App ID.
pub struct TrnClient {
    http: reqwest::Client,
    api_key: String,
}

impl TrnClient {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self { http, api_key }
    }

    /// Fetch a standard profile payload.
    pub async fn profile(
        &self,
        game_slug: &str,
        platform: &str,
        identifier: &str,
    ) -> Result<Value, StatsError> {
        let url = format!(
            "{}/{}/standard/profile/{}/{}",
            BASE_URL,
            game_slug,
            platform,
            utf8_percent_encode(identifier, NON_ALPHANUMERIC)
        );
        debug!("TRN GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("TRN-Api-Key", &self.api_key)
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

/// Public profile URL for linking in the reply.
pub fn profile_url(site_slug: &str, platform: &str, identifier: &str) -> String {
    format!(
        "https://tracker.gg/{}/profile/{}/{}",
        site_slug,
        platform,
        utf8_percent_encode(identifier, NON_ALPHANUMERIC)
    )
}

/// TRN App IDs are UUID-shaped. Anything else usually means the wrong
/// credential was configured.
pub fn looks_like_app_id(value: &str) -> bool {
    let value = value.trim();
    if value.len() != 36 {
        return false;
    }
    let lens: Vec<usize> = value.split('-').map(str::len).collect();
    lens == [8, 4, 4, 4, 12]
}

/// Build an embed from a standard-profile payload.
///
/// Prefers the overview/lifetime segment and the well-known stat keys;
/// falls back to whatever stats the segment carries.
pub fn build_profile_reply(title: &str, payload: &Value, profile_url: &str) -> EmbedReply {
    let data = &payload["data"];
    let platform_info = &data["platformInfo"];

    let player_name = platform_info["platformUserHandle"]
        .as_str()
        .or_else(|| platform_info["platformUserIdentifier"].as_str())
        .unwrap_or("Unknown");
    let platform_name = platform_info["platformSlug"]
        .as_str()
        .or_else(|| platform_info["platformName"].as_str())
        .unwrap_or("");

    let description = if platform_name.is_empty() {
        format!("Profile: **{}**\n{}", player_name, profile_url)
    } else {
        format!(
            "Profile: **{}** ({})\n{}",
            player_name, platform_name, profile_url
        )
    };

    let stats = pick_segment_stats(data);
    let mut fields = Vec::new();

    if let Some(stats) = stats {
        for key in PREFERRED_STATS {
            if fields.len() >= MAX_FIELDS {
                break;
            }
            if let Some(field) = stat_field(stats, key) {
                fields.push(field);
            }
        }

        // Nothing preferred matched: take the first few of whatever is there.
        if fields.is_empty() {
            if let Some(map) = stats.as_object() {
                for key in map.keys().take(MAX_FIELDS) {
                    if let Some(field) = stat_field(stats, key) {
                        fields.push(field);
                    }
                }
            }
        }
    }

    EmbedReply {
        title: title.to_string(),
        description: Some(description),
        fields,
    }
}

/// The stats object of the overview/lifetime segment, else the first
/// segment's.
fn pick_segment_stats(data: &Value) -> Option<&Value> {
    let segments = data["segments"].as_array()?;

    let chosen = segments
        .iter()
        .find(|seg| {
            matches!(
                seg["type"].as_str().map(str::to_lowercase).as_deref(),
                Some("overview") | Some("lifetime")
            )
        })
        .or_else(|| segments.first())?;

    Some(&chosen["stats"])
}

fn stat_field(stats: &Value, key: &str) -> Option<EmbedField> {
    let stat = stats.get(key)?;
    if !stat.is_object() {
        return None;
    }

    let name = stat["displayName"].as_str().unwrap_or(key).to_string();
    let value = match &stat["displayValue"] {
        Value::String(s) => s.clone(),
        _ => match &stat["value"] {
            Value::Null => return None,
            other => scalar_to_string(other)?,
        },
    };

    Some(EmbedField {
        name,
        value,
        inline: true,
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> Value {
        json!({
            "data": {
                "platformInfo": {
                    "platformSlug": "steam",
                    "platformUserHandle": "StormPlayer"
                },
                "segments": [
                    {"type": "ranked", "stats": {"rank": {"displayName": "Ranked", "displayValue": "Silver"}}},
                    {
                        "type": "overview",
                        "stats": {
                            "wins": {"displayName": "Wins", "displayValue": "120"},
                            "losses": {"displayName": "Losses", "value": 80},
                            "obscure": {"displayName": "Obscure", "displayValue": "n/a"}
                        }
                    }
                ]
            }
        })
    }

    #[test]
    fn test_app_id_shape() {
        assert!(looks_like_app_id("12345678-1234-1234-1234-123456789012"));
        assert!(!looks_like_app_id("not-a-uuid"));
        assert!(!looks_like_app_id("12345678123412341234123456789012"));
    }

    #[test]
    fn test_profile_url_encodes_identifier() {
        let url = profile_url("smite2", "steam", "name with spaces");
        assert!(url.ends_with("/steam/name%20with%20spaces"));
    }

    #[test]
    fn test_build_reply_prefers_overview_segment() {
        let reply = build_profile_reply("TRN - Smite 2", &sample_payload(), "https://example");

        assert_eq!(reply.title, "TRN - Smite 2");
        let description = reply.description.unwrap();
        assert!(description.contains("**StormPlayer**"));
        assert!(description.contains("(steam)"));

        let names: Vec<&str> = reply.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Wins", "Losses"]);
        assert_eq!(reply.fields[1].value, "80");
    }

    #[test]
    fn test_build_reply_falls_back_to_first_segment() {
        let payload = json!({
            "data": {
                "platformInfo": {"platformUserIdentifier": "Someone"},
                "segments": [
                    {"type": "ranked", "stats": {"custom": {"displayName": "Custom", "displayValue": "X"}}}
                ]
            }
        });

        let reply = build_profile_reply("TRN", &payload, "https://example");
        assert_eq!(reply.fields.len(), 1);
        assert_eq!(reply.fields[0].name, "Custom");
    }

    #[test]
    fn test_build_reply_with_empty_payload() {
        let reply = build_profile_reply("TRN", &json!({}), "https://example");
        assert!(reply.fields.is_empty());
        assert!(reply.description.unwrap().contains("Unknown"));
    }
}
