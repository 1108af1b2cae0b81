//! Configuration validation.
//!
//! Validates settings values and collects all problems into one error
//! message so misconfiguration is reported in a single pass at startup.

use tracing::warn;

use crate::common::error::ConfigError;
use crate::config::types::Settings;
use crate::stats::trn::looks_like_app_id;

/// Validate settings and return detailed errors.
pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if settings.discord_token.is_empty() {
        errors.push("DISCORD_TOKEN is required".to_string());
    }
    if settings.discord_token == "YOUR_DISCORD_TOKEN_HERE" {
        errors.push("DISCORD_TOKEN has not been configured (still using placeholder)".to_string());
    }

    if settings.command_prefix.is_empty() {
        errors.push("COMMAND_PREFIX must not be empty".to_string());
    }
    if settings.command_prefix.chars().any(|c| c.is_whitespace()) {
        errors.push("COMMAND_PREFIX must not contain whitespace".to_string());
    }

    if settings.query_timeout.is_zero() {
        errors.push("QUERY_TIMEOUT_SECS must be non-zero".to_string());
    }

    for (name, endpoint) in [
        ("MINECRAFT_SERVER", &settings.minecraft),
        ("ARK_SERVER", &settings.ark),
        ("SATISFACTORY_SERVER", &settings.satisfactory),
        ("LETHAL_SERVER", &settings.lethal),
    ] {
        if let Some(hp) = endpoint {
            if hp.port == 0 {
                errors.push(format!("{} port must be non-zero", name));
            }
        }
    }

    if let Some(ref rl) = settings.rocket_league {
        if let Some(ref template) = rl.url_template {
            if !template.contains("{identifier}") && !template.contains("{player}") {
                errors.push(
                    "RL_RAPIDAPI_URL_TEMPLATE must contain an {identifier} placeholder".to_string(),
                );
            }
        }
    }

    // TRN hands out App IDs formatted as UUIDs. A key of another shape still
    // gets sent, but it almost always means the wrong credential was pasted.
    if let Some(ref trn) = settings.trn {
        if !looks_like_app_id(&trn.api_key) {
            warn!("TRN_API_KEY does not look like a TRN App ID (expected a UUID)");
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn make_valid_settings() -> Settings {
        Settings {
            discord_token: "valid_token_here".to_string(),
            command_prefix: "!".to_string(),
            data_dir: PathBuf::from("data"),
            query_timeout: Duration::from_secs(5),
            minecraft: Some(HostPort::parse("play.example.com:25565", 25565).unwrap()),
            ark: None,
            satisfactory: None,
            lethal: None,
            trn: None,
            rocket_league: None,
            supercell: SupercellSettings::default(),
        }
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(validate_settings(&make_valid_settings()).is_ok());
    }

    #[test]
    fn test_placeholder_token_fails() {
        let mut settings = make_valid_settings();
        settings.discord_token = "YOUR_DISCORD_TOKEN_HERE".to_string();

        let result = validate_settings(&settings);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("placeholder"));
    }

    #[test]
    fn test_whitespace_prefix_fails() {
        let mut settings = make_valid_settings();
        settings.command_prefix = "! ".to_string();

        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_url_template_without_placeholder_fails() {
        let mut settings = make_valid_settings();
        settings.rocket_league = Some(RocketLeagueSettings {
            api_key: "key".to_string(),
            api_host: "rocket-league1.p.rapidapi.com".to_string(),
            url_template: Some("/ranks/fixed".to_string()),
            default_platform: "epic".to_string(),
        });

        let result = validate_settings(&settings);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("{identifier}"));
    }

    #[test]
    fn test_zero_timeout_fails() {
        let mut settings = make_valid_settings();
        settings.query_timeout = Duration::ZERO;

        assert!(validate_settings(&settings).is_err());
    }
}
