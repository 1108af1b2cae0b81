//! Environment-backed settings loading.
//!
//! All configuration comes from environment variables (a local `.env` file
//! is honored when present):
//! - `DISCORD_TOKEN` - Discord bot token (required)
//! - `COMMAND_PREFIX` - command prefix, default `!`
//! - `STORMBOT_DATA_DIR` - directory for persisted state, default `data`
//! - `MINECRAFT_SERVER` - Minecraft server `host[:port]`, default port 25565
//! - `ARK_SERVER` / `SATISFACTORY_SERVER` / `LETHAL_SERVER` - A2S query
//!   endpoints `host[:port]`, default port 27015
//! - `TRN_API_KEY` / `TRN_PLATFORM` - Tracker Network App ID and default platform
//! - `RAPIDAPI_KEY` / `RL_RAPIDAPI_HOST` / `RL_RAPIDAPI_URL_TEMPLATE` /
//!   `RL_PLATFORM` - Rocket League via RapidAPI
//! - `COC_API_TOKEN` / `BRAWL_API_TOKEN` / `ROYALE_API_TOKEN` - Supercell APIs
//! - `QUERY_TIMEOUT_SECS` - per-query timeout, default 5

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::common::error::ConfigError;
use crate::config::types::{
    HostPort, RocketLeagueSettings, Settings, SupercellSettings, TrnSettings,
};

const DEFAULT_MINECRAFT_PORT: u16 = 25565;
const DEFAULT_A2S_PORT: u16 = 27015;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 5;

/// Read an environment variable, treating empty/whitespace values as unset.
fn var(name: &'static str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn host_port_var(name: &'static str, default_port: u16) -> Result<Option<HostPort>, ConfigError> {
    var(name)
        .map(|raw| {
            HostPort::parse(&raw, default_port).map_err(|e| ConfigError::InvalidValue {
                name,
                message: e.to_string(),
            })
        })
        .transpose()
}

/// Build settings from the environment.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let discord_token = var("DISCORD_TOKEN").ok_or(ConfigError::MissingVar {
        name: "DISCORD_TOKEN",
    })?;

    let command_prefix = var("COMMAND_PREFIX").unwrap_or_else(|| "!".to_string());
    let data_dir = PathBuf::from(var("STORMBOT_DATA_DIR").unwrap_or_else(|| "data".to_string()));

    let query_timeout = match var("QUERY_TIMEOUT_SECS") {
        Some(raw) => Duration::from_secs(raw.parse().map_err(|_| ConfigError::InvalidValue {
            name: "QUERY_TIMEOUT_SECS",
            message: format!("'{}' is not a number of seconds", raw),
        })?),
        None => Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
    };

    let trn = var("TRN_API_KEY").map(|api_key| TrnSettings {
        api_key,
        default_platform: var("TRN_PLATFORM").unwrap_or_else(|| "steam".to_string()),
    });

    // Rocket League needs both the key and the provider host to be usable.
    let rocket_league = match (var("RAPIDAPI_KEY"), var("RL_RAPIDAPI_HOST")) {
        (Some(api_key), Some(api_host)) => Some(RocketLeagueSettings {
            api_key,
            api_host,
            url_template: var("RL_RAPIDAPI_URL_TEMPLATE"),
            default_platform: var("RL_PLATFORM").unwrap_or_else(|| "epic".to_string()),
        }),
        _ => None,
    };

    Ok(Settings {
        discord_token,
        command_prefix,
        data_dir,
        query_timeout,
        minecraft: host_port_var("MINECRAFT_SERVER", DEFAULT_MINECRAFT_PORT)?,
        ark: host_port_var("ARK_SERVER", DEFAULT_A2S_PORT)?,
        satisfactory: host_port_var("SATISFACTORY_SERVER", DEFAULT_A2S_PORT)?,
        lethal: host_port_var("LETHAL_SERVER", DEFAULT_A2S_PORT)?,
        trn,
        rocket_league,
        supercell: SupercellSettings {
            coc_token: var("COC_API_TOKEN"),
            brawl_token: var("BRAWL_API_TOKEN"),
            royale_token: var("ROYALE_API_TOKEN"),
        },
    })
}
