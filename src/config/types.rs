//! Configuration type definitions.

use std::path::PathBuf;
use std::time::Duration;

use crate::common::error::ConfigError;

/// Root settings structure, built once at startup and passed to each
/// component at construction. Components never read the environment
/// themselves.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Discord bot token.
    pub discord_token: String,
    /// Command prefix (default `!`).
    pub command_prefix: String,
    /// Directory for persisted state (identities, response cache).
    pub data_dir: PathBuf,
    /// Timeout applied to each server ping / query.
    pub query_timeout: Duration,
    /// Minecraft server to ping for `!stats minecraft`.
    pub minecraft: Option<HostPort>,
    /// ARK server (Steam/A2S query port) for `!stats ark`.
    pub ark: Option<HostPort>,
    /// Satisfactory server (A2S query port).
    pub satisfactory: Option<HostPort>,
    /// Lethal Company server (A2S query port).
    pub lethal: Option<HostPort>,
    /// Tracker Network access for Smite / Smite 2 profiles.
    pub trn: Option<TrnSettings>,
    /// RapidAPI access for Rocket League.
    pub rocket_league: Option<RocketLeagueSettings>,
    /// Supercell API tokens.
    pub supercell: SupercellSettings,
}

/// A game server endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPort {
    pub host: String,
    pub port: u16,
}

impl HostPort {
    /// Parse a `host[:port]` string, applying `default_port` when the port
    /// is omitted.
    pub fn parse(raw: &str, default_port: u16) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "host",
                message: "empty host".to_string(),
            });
        }

        match raw.rsplit_once(':') {
            Some((host, port)) => {
                let host = host.trim();
                let port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    name: "port",
                    message: format!("'{}' is not a valid port", port),
                })?;
                if host.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        name: "host",
                        message: "empty host".to_string(),
                    });
                }
                Ok(Self {
                    host: host.to_string(),
                    port,
                })
            }
            None => Ok(Self {
                host: raw.to_string(),
                port: default_port,
            }),
        }
    }
}

impl std::fmt::Display for HostPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Tracker Network API settings.
#[derive(Debug, Clone)]
pub struct TrnSettings {
    /// TRN App ID (UUID-shaped).
    pub api_key: String,
    /// Platform used when the user doesn't give `platform:identifier`.
    pub default_platform: String,
}

/// RapidAPI Rocket League settings.
#[derive(Debug, Clone)]
pub struct RocketLeagueSettings {
    pub api_key: String,
    /// RapidAPI host, e.g. `rocket-league1.p.rapidapi.com`.
    pub api_host: String,
    /// URL template for player stats with `{platform}` / `{identifier}`
    /// placeholders. Either a path (joined to the host) or a full URL.
    pub url_template: Option<String>,
    /// Platform used when the user doesn't give `platform:identifier`.
    pub default_platform: String,
}

/// Supercell API tokens. Each game's command is enabled only when its
/// token is present.
#[derive(Debug, Clone, Default)]
pub struct SupercellSettings {
    pub coc_token: Option<String>,
    pub brawl_token: Option<String>,
    pub royale_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_port_with_explicit_port() {
        let hp = HostPort::parse("play.example.com:25565", 1).unwrap();
        assert_eq!(hp.host, "play.example.com");
        assert_eq!(hp.port, 25565);
    }

    #[test]
    fn test_host_port_default_port() {
        let hp = HostPort::parse("etst.duckdns.org", 27015).unwrap();
        assert_eq!(hp.host, "etst.duckdns.org");
        assert_eq!(hp.port, 27015);
    }

    #[test]
    fn test_host_port_trims_whitespace() {
        let hp = HostPort::parse("  10.0.0.1 : 27016 ", 27015).unwrap();
        assert_eq!(hp.host, "10.0.0.1");
        assert_eq!(hp.port, 27016);
    }

    #[test]
    fn test_host_port_rejects_empty() {
        assert!(HostPort::parse("", 25565).is_err());
        assert!(HostPort::parse(":25565", 25565).is_err());
    }

    #[test]
    fn test_host_port_rejects_bad_port() {
        assert!(HostPort::parse("example.com:notaport", 25565).is_err());
        assert!(HostPort::parse("example.com:99999", 25565).is_err());
    }

    #[test]
    fn test_host_port_display() {
        let hp = HostPort::parse("example.com:1234", 1).unwrap();
        assert_eq!(hp.to_string(), "example.com:1234");
    }
}
