//! Stats gateway: per-game adapters behind one lookup entry point.
//!
//! Adapters are constructed once with the settings struct and a shared HTTP
//! client; they never read the environment themselves. Identifier
//! resolution order is always: explicit argument, then the identity store,
//! then a guidance message.

pub mod format;
pub mod rapidapi;
pub mod supercell;
pub mod trn;

use std::sync::Arc;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde_json::Value;

use crate::common::error::StatsError;
use crate::config::types::{HostPort, Settings};
use crate::query::{a2s, minecraft};
use crate::stats::rapidapi::RapidApiClient;
use crate::stats::supercell::{SupercellClient, SupercellGame};
use crate::stats::trn::TrnClient;
use crate::store::{IdentityField, IdentityStore, ResponseCache};

const TTL_SERVER_PING: Duration = Duration::from_secs(30);
const TTL_TRN: Duration = Duration::from_secs(120);
const TTL_SUPERCELL: Duration = Duration::from_secs(120);
// RapidAPI quota is per-day; cache accordingly.
const TTL_RAPIDAPI: Duration = Duration::from_secs(24 * 60 * 60);

/// One field of a reply embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// A reply rendered as a Discord embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedReply {
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
}

/// A formatted stats reply, Discord-agnostic so adapters stay testable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsReply {
    Text(String),
    Embed(EmbedReply),
}

/// Supported games, with their chat aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameKey {
    Minecraft,
    Ark,
    Satisfactory,
    Lethal,
    Smite1,
    Smite2,
    RocketLeague,
    ClashOfClans,
    BrawlStars,
    ClashRoyale,
}

impl GameKey {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "minecraft" | "mc" => Some(Self::Minecraft),
            "ark" => Some(Self::Ark),
            "satisfactory" | "sf" => Some(Self::Satisfactory),
            "lethal" | "lethalcompany" | "lc" => Some(Self::Lethal),
            "smite" | "smite1" => Some(Self::Smite1),
            "smite2" => Some(Self::Smite2),
            "rocketleague" | "rocket" | "rl" => Some(Self::RocketLeague),
            "coc" | "clash" | "clashofclans" => Some(Self::ClashOfClans),
            "brawl" | "brawlstars" | "bs" => Some(Self::BrawlStars),
            "royale" | "clashroyale" | "cr" => Some(Self::ClashRoyale),
            _ => None,
        }
    }
}

/// Split a `platform:identifier` argument, falling back to the configured
/// default platform for bare identifiers.
pub fn split_platform_identifier(raw: &str, default_platform: &str) -> (String, String) {
    let raw = raw.trim();
    if let Some((platform, identifier)) = raw.split_once(':') {
        let platform = platform.trim().to_lowercase();
        let identifier = identifier.trim();
        if !platform.is_empty() && !identifier.is_empty() {
            return (platform, identifier.to_string());
        }
    }
    let default = default_platform.trim().to_lowercase();
    let default = if default.is_empty() {
        "steam".to_string()
    } else {
        default
    };
    (default, raw.to_string())
}

/// The stats lookup layer behind `!stats <game> [identifier]`.
pub struct StatsGateway {
    settings: Arc<Settings>,
    identities: Arc<IdentityStore>,
    cache: Arc<ResponseCache>,
    http: reqwest::Client,
}

impl StatsGateway {
    pub fn new(
        settings: Arc<Settings>,
        identities: Arc<IdentityStore>,
        cache: Arc<ResponseCache>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("stormbot/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            settings,
            identities,
            cache,
            http,
        })
    }

    /// Run one stats lookup for the invoking user.
    pub async fn lookup(
        &self,
        game_raw: &str,
        arg: &str,
        user_id: u64,
    ) -> Result<StatsReply, StatsError> {
        let game = GameKey::parse(game_raw).ok_or_else(|| StatsError::UnknownGame {
            name: game_raw.trim().to_string(),
        })?;

        match game {
            GameKey::Minecraft => self.minecraft_status().await,
            GameKey::Ark => self.a2s_status("ark", "ARK", self.settings.ark.clone()).await,
            GameKey::Satisfactory => {
                self.a2s_status(
                    "satisfactory",
                    "Satisfactory",
                    self.settings.satisfactory.clone(),
                )
                .await
            }
            GameKey::Lethal => {
                self.a2s_status("lethal", "Lethal Company", self.settings.lethal.clone())
                    .await
            }
            GameKey::Smite1 => {
                self.trn_profile("smite", "TRN - Smite", "!stats smite1 <steam>", arg, user_id)
                    .await
            }
            GameKey::Smite2 => {
                self.trn_profile("smite2", "TRN - Smite 2", "!stats smite2 <steam>", arg, user_id)
                    .await
            }
            GameKey::RocketLeague => self.rocket_league(arg, user_id).await,
            GameKey::ClashOfClans => {
                self.supercell(SupercellGame::ClashOfClans, arg, user_id)
                    .await
            }
            GameKey::BrawlStars => self.supercell(SupercellGame::BrawlStars, arg, user_id).await,
            GameKey::ClashRoyale => {
                self.supercell(SupercellGame::ClashRoyale, arg, user_id)
                    .await
            }
        }
    }

    /// Resolve an identifier: explicit argument, else the stored one.
    async fn resolve_identifier(
        &self,
        arg: &str,
        user_id: u64,
        field: IdentityField,
        command: &'static str,
    ) -> Result<String, StatsError> {
        let arg = arg.trim();
        if !arg.is_empty() {
            return Ok(arg.to_string());
        }

        self.identities
            .get(user_id)
            .await
            .and_then(|record| record.get(field).map(str::to_string))
            .filter(|stored| !stored.trim().is_empty())
            .ok_or(StatsError::MissingIdentifier {
                field: field.as_str(),
                command,
            })
    }

    async fn minecraft_status(&self) -> Result<StatsReply, StatsError> {
        let target = self
            .settings
            .minecraft
            .clone()
            .ok_or(StatsError::NotConfigured {
                what: "The Minecraft command",
                hint: "MINECRAFT_SERVER",
            })?;

        let key = format!("minecraft:{}", target);
        let timeout = self.settings.query_timeout;
        let value = self
            .cache
            .get_or_fetch(&key, TTL_SERVER_PING, || async move {
                let status = minecraft::ping(&target, timeout).await?;
                Ok(Value::String(format!(
                    "Minecraft server `{}`: {}/{} players (ping {}ms) - {}",
                    target,
                    status.online,
                    status.max,
                    status.latency.as_millis(),
                    status.version,
                )))
            })
            .await?;

        Ok(StatsReply::Text(value.as_str().unwrap_or_default().to_string()))
    }

    async fn a2s_status(
        &self,
        cache_key: &str,
        label: &'static str,
        target: Option<HostPort>,
    ) -> Result<StatsReply, StatsError> {
        let target = target.ok_or(StatsError::NotConfigured {
            what: "This server command",
            hint: "ARK_SERVER / SATISFACTORY_SERVER / LETHAL_SERVER",
        })?;

        let key = format!("a2s:{}:{}", cache_key, target);
        let timeout = self.settings.query_timeout;
        let value = self
            .cache
            .get_or_fetch(&key, TTL_SERVER_PING, || async move {
                let info = a2s::info(&target, timeout).await?;
                let vac = if info.vac_enabled { "VAC ON" } else { "VAC OFF" };
                let map = if info.map.is_empty() {
                    String::new()
                } else {
                    format!(" - map `{}`", info.map)
                };
                Ok(Value::String(format!(
                    "{} `{}`: {}/{} players{} - {}",
                    label, info.name, info.players, info.max_players, map, vac,
                )))
            })
            .await?;

        Ok(StatsReply::Text(value.as_str().unwrap_or_default().to_string()))
    }

    async fn trn_profile(
        &self,
        slug: &str,
        title: &str,
        command: &'static str,
        arg: &str,
        user_id: u64,
    ) -> Result<StatsReply, StatsError> {
        let trn = self.settings.trn.clone().ok_or(StatsError::NotConfigured {
            what: "TRN lookups",
            hint: "TRN_API_KEY",
        })?;

        let raw = self
            .resolve_identifier(arg, user_id, IdentityField::Steam, command)
            .await?;
        let (platform, identifier) = split_platform_identifier(&raw, &trn.default_platform);

        let key = format!("trn:{}:{}:{}", slug, platform, identifier).to_lowercase();
        let client = TrnClient::new(self.http.clone(), trn.api_key);
        let slug_owned = slug.to_string();
        let (platform_fetch, identifier_fetch) = (platform.clone(), identifier.clone());
        let payload = self
            .cache
            .get_or_fetch(&key, TTL_TRN, || async move {
                client
                    .profile(&slug_owned, &platform_fetch, &identifier_fetch)
                    .await
            })
            .await?;

        let url = trn::profile_url(slug, &platform, &identifier);
        Ok(StatsReply::Embed(trn::build_profile_reply(
            title, &payload, &url,
        )))
    }

    async fn rocket_league(&self, arg: &str, user_id: u64) -> Result<StatsReply, StatsError> {
        let rl = self
            .settings
            .rocket_league
            .clone()
            .ok_or(StatsError::NotConfigured {
                what: "Rocket League lookups",
                hint: "RAPIDAPI_KEY / RL_RAPIDAPI_HOST",
            })?;

        let client = RapidApiClient::new(self.http.clone(), rl.api_key.clone(), rl.api_host.clone());

        match arg.trim().to_lowercase().as_str() {
            "tournaments" => {
                let url = format!("https://{}/tournaments/europe", rl.api_host);
                let payload = self
                    .cache
                    .get_or_fetch("rapidapi:rl:tournaments:europe", TTL_RAPIDAPI, || async move {
                        client.get_json(&url).await
                    })
                    .await?;
                Ok(StatsReply::Embed(rapidapi::build_tournaments_reply(&payload)))
            }
            "shop" => {
                let url = format!("https://{}/shops/featured", rl.api_host);
                let payload = self
                    .cache
                    .get_or_fetch("rapidapi:rl:shop:featured", TTL_RAPIDAPI, || async move {
                        client.get_json(&url).await
                    })
                    .await?;
                Ok(StatsReply::Embed(rapidapi::build_shop_reply(&payload)))
            }
            _ => self.rocket_league_player(rl, client, arg, user_id).await,
        }
    }

    async fn rocket_league_player(
        &self,
        rl: crate::config::types::RocketLeagueSettings,
        client: RapidApiClient,
        arg: &str,
        user_id: u64,
    ) -> Result<StatsReply, StatsError> {
        let template = rl.url_template.ok_or(StatsError::NotConfigured {
            what: "Rocket League player stats",
            hint: "RL_RAPIDAPI_URL_TEMPLATE",
        })?;

        let raw = self
            .resolve_identifier(arg, user_id, IdentityField::Epic, "!stats rocketleague <epic>")
            .await?;
        let (platform, identifier) = split_platform_identifier(&raw, &rl.default_platform);

        // rocket-league1 keys players by lowercased Epic display name.
        let identifier = if rl.api_host == "rocket-league1.p.rapidapi.com" {
            identifier.to_lowercase()
        } else {
            identifier
        };

        let encoded_platform = utf8_percent_encode(&platform, NON_ALPHANUMERIC).to_string();
        let encoded_identifier = utf8_percent_encode(&identifier, NON_ALPHANUMERIC).to_string();
        let path_or_url = template
            .replace("{platform}", &encoded_platform)
            .replace("{identifier}", &encoded_identifier)
            .replace("{player}", &encoded_identifier);
        let url = if path_or_url.starts_with('/') {
            format!("https://{}{}", rl.api_host, path_or_url)
        } else {
            path_or_url
        };

        let key = format!("rapidapi:rl:{}:{}", rl.api_host, url).to_lowercase();
        let url_fetch = url.clone();
        let payload = self
            .cache
            .get_or_fetch(&key, TTL_RAPIDAPI, || async move {
                client.get_json(&url_fetch).await
            })
            .await?;

        Ok(StatsReply::Embed(rapidapi::build_ranks_reply(
            &identifier,
            &payload,
        )))
    }

    async fn supercell(
        &self,
        game: SupercellGame,
        arg: &str,
        user_id: u64,
    ) -> Result<StatsReply, StatsError> {
        let token = match game {
            SupercellGame::ClashOfClans => self.settings.supercell.coc_token.clone(),
            SupercellGame::BrawlStars => self.settings.supercell.brawl_token.clone(),
            SupercellGame::ClashRoyale => self.settings.supercell.royale_token.clone(),
        }
        .ok_or(StatsError::NotConfigured {
            what: "This Supercell command",
            hint: "COC_API_TOKEN / BRAWL_API_TOKEN / ROYALE_API_TOKEN",
        })?;

        let raw = self
            .resolve_identifier(arg, user_id, IdentityField::Tag, "!stats coc <tag>")
            .await?;
        let tag = supercell::normalize_tag(&raw);

        let key = format!("supercell:{:?}:{}", game, tag).to_lowercase();
        let client = SupercellClient::new(self.http.clone());
        let tag_fetch = tag.clone();
        let payload = self
            .cache
            .get_or_fetch(&key, TTL_SUPERCELL, || async move {
                client.player(game, &token, &tag_fetch).await
            })
            .await?;

        Ok(StatsReply::Embed(supercell::build_player_reply(
            game, &tag, &payload,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::SupercellSettings;
    use crate::store::IdentityField;
    use std::path::PathBuf;

    fn make_settings() -> Settings {
        Settings {
            discord_token: "token".to_string(),
            command_prefix: "!".to_string(),
            data_dir: PathBuf::from("data"),
            query_timeout: Duration::from_secs(5),
            minecraft: None,
            ark: None,
            satisfactory: None,
            lethal: None,
            trn: None,
            rocket_league: None,
            supercell: SupercellSettings::default(),
        }
    }

    fn make_gateway(dir: &std::path::Path) -> StatsGateway {
        StatsGateway::new(
            Arc::new(make_settings()),
            Arc::new(IdentityStore::new(dir)),
            Arc::new(ResponseCache::new(dir)),
        )
        .unwrap()
    }

    #[test]
    fn test_game_key_aliases() {
        assert_eq!(GameKey::parse("Minecraft"), Some(GameKey::Minecraft));
        assert_eq!(GameKey::parse("mc"), Some(GameKey::Minecraft));
        assert_eq!(GameKey::parse("rl"), Some(GameKey::RocketLeague));
        assert_eq!(GameKey::parse("smite"), Some(GameKey::Smite1));
        assert_eq!(GameKey::parse("clashroyale"), Some(GameKey::ClashRoyale));
        assert_eq!(GameKey::parse("fortnite"), None);
    }

    #[test]
    fn test_split_platform_identifier() {
        assert_eq!(
            split_platform_identifier("epic:Stormy", "steam"),
            ("epic".to_string(), "Stormy".to_string())
        );
        assert_eq!(
            split_platform_identifier("Stormy", "steam"),
            ("steam".to_string(), "Stormy".to_string())
        );
        // Empty platform or identifier falls back to the default.
        assert_eq!(
            split_platform_identifier(":Stormy", "steam"),
            ("steam".to_string(), ":Stormy".to_string())
        );
        assert_eq!(
            split_platform_identifier("name", ""),
            ("steam".to_string(), "name".to_string())
        );
    }

    #[tokio::test]
    async fn test_unknown_game_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = make_gateway(dir.path());

        let err = gateway.lookup("fortnite", "", 1).await.unwrap_err();
        assert!(matches!(err, StatsError::UnknownGame { .. }));
    }

    #[tokio::test]
    async fn test_unconfigured_game_reports_missing_var() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = make_gateway(dir.path());

        let err = gateway.lookup("minecraft", "", 1).await.unwrap_err();
        assert!(matches!(err, StatsError::NotConfigured { .. }));
        assert!(err.user_reply().contains("MINECRAFT_SERVER"));
    }

    #[tokio::test]
    async fn test_explicit_argument_wins_over_store() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = make_gateway(dir.path());
        gateway
            .identities
            .set(1, IdentityField::Steam, "Stored")
            .await
            .unwrap();

        let id = gateway
            .resolve_identifier("Explicit", 1, IdentityField::Steam, "!stats smite2 <steam>")
            .await
            .unwrap();
        assert_eq!(id, "Explicit");
    }

    #[tokio::test]
    async fn test_stored_identifier_used_when_argument_empty() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = make_gateway(dir.path());
        gateway
            .identities
            .set(1, IdentityField::Steam, "Stored")
            .await
            .unwrap();

        let id = gateway
            .resolve_identifier("", 1, IdentityField::Steam, "!stats smite2 <steam>")
            .await
            .unwrap();
        assert_eq!(id, "Stored");
    }

    #[tokio::test]
    async fn test_trn_guidance_names_the_invoked_game() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = make_settings();
        settings.trn = Some(crate::config::types::TrnSettings {
            api_key: "12345678-1234-1234-1234-123456789012".to_string(),
            default_platform: "steam".to_string(),
        });
        let gateway = StatsGateway::new(
            Arc::new(settings),
            Arc::new(IdentityStore::new(dir.path())),
            Arc::new(ResponseCache::new(dir.path())),
        )
        .unwrap();

        let err = gateway.lookup("smite1", "", 1).await.unwrap_err();
        assert!(err.user_reply().contains("!stats smite1"));

        let err = gateway.lookup("smite2", "", 1).await.unwrap_err();
        assert!(err.user_reply().contains("!stats smite2"));
    }

    #[tokio::test]
    async fn test_missing_identifier_guidance() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = make_gateway(dir.path());

        let err = gateway
            .resolve_identifier("", 1, IdentityField::Epic, "!stats rocketleague <epic>")
            .await
            .unwrap_err();
        assert!(matches!(err, StatsError::MissingIdentifier { .. }));
        assert!(err.user_reply().contains("!id epic"));
    }
}
