// API settings, loaded from environment variables (the deployment's secrets store)
use serde::Deserialize;

pub const DEFAULT_DISCORD_API_BASE: &str = "https://discord.com/api/v10";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DiscordCredentials {
    pub bot_token: String,
    pub user_id: String,
}

/// Where an accepted submission is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardTarget {
    /// Direct message to one Discord user through a bot.
    Discord { credentials: DiscordCredentials, api_base: String },
    /// Plain JSON POST to a webhook URL.
    Webhook { url: String },
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
    pub discord: Option<DiscordCredentials>,
    pub discord_api_base: String,
    pub webhook_url: Option<String>,
    /// When set, submissions must carry this value in `token`.
    pub shared_token: Option<String>,
    pub forward_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            host: "127.0.0.1".to_string(),
            port: 3000,
            discord: None,
            discord_api_base: DEFAULT_DISCORD_API_BASE.to_string(),
            webhook_url: None,
            shared_token: None,
            forward_timeout_secs: 10,
        }
    }
}

impl ApiSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = ApiSettings::default();

        let discord = match (get("DISCORD_BOT_TOKEN"), get("DISCORD_USER_ID")) {
            (Some(bot_token), Some(user_id)) => Some(DiscordCredentials { bot_token, user_id }),
            _ => None,
        };

        let port = match get("PORTFOLIO_API_PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(value = %raw, error = %e, "Ignoring invalid PORTFOLIO_API_PORT");
                defaults.port
            }),
            None => defaults.port,
        };

        let forward_timeout_secs = get("CONTACT_FORWARD_TIMEOUT_SECS")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(defaults.forward_timeout_secs);

        ApiSettings {
            host: get("PORTFOLIO_API_HOST").unwrap_or(defaults.host),
            port,
            discord,
            discord_api_base: get("DISCORD_API_BASE").unwrap_or(defaults.discord_api_base),
            webhook_url: get("CONTACT_WEBHOOK_URL"),
            shared_token: get("CONTACT_SHARED_TOKEN"),
            forward_timeout_secs,
        }
    }

    /// A configured webhook wins over Discord; `None` means no credentials at all.
    pub fn forward_target(&self) -> Option<ForwardTarget> {
        if let Some(url) = &self.webhook_url {
            return Some(ForwardTarget::Webhook { url: url.clone() });
        }
        self.discord.as_ref().map(|credentials| ForwardTarget::Discord {
            credentials: credentials.clone(),
            api_base: self.discord_api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> ApiSettings {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ApiSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let settings = settings_from(&[]);
        assert_eq!(settings.port, 3000);
        assert!(settings.discord.is_none());
        assert!(settings.forward_target().is_none());
    }

    #[test]
    fn test_discord_needs_both_values() {
        let settings = settings_from(&[("DISCORD_BOT_TOKEN", "abc")]);
        assert!(settings.discord.is_none());

        let settings = settings_from(&[("DISCORD_BOT_TOKEN", "abc"), ("DISCORD_USER_ID", "42")]);
        match settings.forward_target() {
            Some(ForwardTarget::Discord { credentials, api_base }) => {
                assert_eq!(credentials.user_id, "42");
                assert_eq!(api_base, DEFAULT_DISCORD_API_BASE);
            }
            other => panic!("unexpected target: {:?}", other),
        }
    }

    #[test]
    fn test_webhook_takes_precedence() {
        let settings = settings_from(&[
            ("DISCORD_BOT_TOKEN", "abc"),
            ("DISCORD_USER_ID", "42"),
            ("CONTACT_WEBHOOK_URL", "https://hooks.example/x"),
        ]);
        assert_eq!(
            settings.forward_target(),
            Some(ForwardTarget::Webhook { url: "https://hooks.example/x".to_string() })
        );
    }

    #[test]
    fn test_blank_values_are_unset_and_bad_port_falls_back() {
        let settings = settings_from(&[("CONTACT_SHARED_TOKEN", "  "), ("PORTFOLIO_API_PORT", "nope")]);
        assert!(settings.shared_token.is_none());
        assert_eq!(settings.port, 3000);
    }
}
