use chrono::FixedOffset;
use clap::Parser;

/// Football predictions dashboard with Telegram delivery
#[derive(Parser, Debug, Clone)]
#[command(name = "football-predictions-bot", version, about)]
pub struct Config {
    /// Dashboard listen address
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "0.0.0.0:3000")]
    pub dashboard_addr: String,

    /// API-Football base URL
    #[arg(
        long,
        env = "FOOTBALL_API_URL",
        default_value = "https://v3.football.api-sports.io"
    )]
    pub football_api_url: String,

    /// API-Football key (sent as `x-apisports-key`)
    #[arg(long, env = "FOOTBALL_API_KEY")]
    pub football_api_key: Option<String>,

    /// Telegram Bot API base URL
    #[arg(long, env = "TELEGRAM_API_URL", default_value = "https://api.telegram.org")]
    pub telegram_api_url: String,

    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN")]
    pub telegram_bot_token: Option<String>,

    /// Chats preloaded into the dashboard (comma-separated)
    #[arg(
        long,
        env = "TELEGRAM_CHAT_IDS",
        value_delimiter = ',',
        allow_hyphen_values = true
    )]
    pub telegram_chat_ids: Vec<String>,

    /// Timeout for every outbound HTTP request, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub request_timeout_secs: u64,

    /// Maximum number of upcoming fixtures to forecast
    #[arg(long, env = "MAX_FIXTURES", default_value = "5")]
    pub max_fixtures: usize,

    /// UTC offset (minutes) used for displayed match dates and times
    #[arg(
        long,
        env = "DISPLAY_UTC_OFFSET_MINUTES",
        default_value = "0",
        allow_hyphen_values = true
    )]
    pub utc_offset_minutes: i32,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be positive");
        }
        if self.max_fixtures == 0 {
            anyhow::bail!("max_fixtures must be at least 1");
        }
        if !(-14 * 60..=14 * 60).contains(&self.utc_offset_minutes) {
            anyhow::bail!("utc_offset_minutes must be between -840 and 840");
        }
        if self.telegram_chat_ids.iter().any(|c| c.trim().is_empty()) {
            anyhow::bail!("TELEGRAM_CHAT_IDS contains an empty chat id");
        }
        Ok(())
    }

    pub fn display_offset(&self) -> anyhow::Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .ok_or_else(|| anyhow::anyhow!("invalid UTC offset: {} minutes", self.utc_offset_minutes))
    }

    pub fn chat_ids(&self) -> Vec<String> {
        self.telegram_chat_ids
            .iter()
            .map(|c| c.trim().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENV_VARS: [&str; 9] = [
        "DASHBOARD_ADDR",
        "FOOTBALL_API_URL",
        "FOOTBALL_API_KEY",
        "TELEGRAM_API_URL",
        "TELEGRAM_BOT_TOKEN",
        "TELEGRAM_CHAT_IDS",
        "REQUEST_TIMEOUT_SECS",
        "MAX_FIXTURES",
        "DISPLAY_UTC_OFFSET_MINUTES",
    ];

    /// Parse from flags only, ignoring the shell environment.
    fn parse(args: &[&str]) -> Config {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
        Config::try_parse_from(std::iter::once("football-predictions-bot").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let c = parse(&[]);
        c.validate().unwrap();
        assert_eq!(c.request_timeout_secs, 10);
        assert_eq!(c.max_fixtures, 5);
        assert_eq!(c.display_offset().unwrap().local_minus_utc(), 0);
    }

    #[test]
    fn test_chat_ids_are_split_and_trimmed() {
        let c = parse(&["--telegram-chat-ids", "6097718185, -1001234567890"]);
        c.validate().unwrap();
        assert_eq!(c.chat_ids(), vec!["6097718185", "-1001234567890"]);
    }

    #[test]
    fn test_negative_offset() {
        let c = parse(&["--utc-offset-minutes", "-180"]);
        c.validate().unwrap();
        assert_eq!(c.display_offset().unwrap().local_minus_utc(), -180 * 60);
    }

    #[test]
    fn test_env_vars_cover_every_field() {
        let cmd = <Config as clap::CommandFactory>::command();
        let mut envs: Vec<String> = cmd
            .get_arguments()
            .filter_map(|a| a.get_env())
            .map(|e| e.to_string_lossy().into_owned())
            .collect();
        envs.sort();
        let mut expected: Vec<String> = ENV_VARS.iter().map(|v| v.to_string()).collect();
        expected.sort();
        assert_eq!(envs, expected);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(parse(&["--request-timeout-secs", "0"]).validate().is_err());
        assert!(parse(&["--max-fixtures", "0"]).validate().is_err());
        assert!(parse(&["--utc-offset-minutes", "900"]).validate().is_err());
        assert!(parse(&["--telegram-chat-ids", "1, ,2"]).validate().is_err());
    }
}
