use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

const ENV_FILE: &str = ".env";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub browser: LaunchConfig,
    #[serde(default)]
    pub pinnacle: PinnacleConfig,
    #[serde(default)]
    pub underdog: UnderdogConfig,
}

/// Browser launch and page-settle settings handed to the driver factory.
#[derive(Debug, Deserialize, Clone)]
pub struct LaunchConfig {
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default)]
    pub sandbox: bool,
    #[serde(default = "default_true")]
    pub disable_dev_shm: bool,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    #[serde(default = "default_settle_timeout")]
    pub settle_timeout_ms: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_true() -> bool { true }
fn default_window_width() -> u32 { 1920 }
fn default_window_height() -> u32 { 1080 }
fn default_settle_timeout() -> u64 { 3000 }
fn default_poll_interval() -> u64 { 250 }

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: false,
            disable_dev_shm: true,
            window_width: 1920,
            window_height: 1080,
            settle_timeout_ms: 3000,
            poll_interval_ms: 250,
        }
    }
}

impl LaunchConfig {
    /// Polling window used after every navigation or page-changing click.
    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            timeout: Duration::from_millis(self.settle_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
        }
    }
}

/// How long to poll for rendered content, and how often.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        LaunchConfig::default().wait_policy()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PinnacleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_pinnacle_base")]
    pub base_url: String,
    #[serde(default)]
    pub sports: Vec<String>,
}

fn default_pinnacle_base() -> String {
    "https://www.pinnacle.com/en".to_string()
}

impl Default for PinnacleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_pinnacle_base(),
            sports: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UnderdogConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_underdog_base")]
    pub base_url: String,
    #[serde(default = "default_underdog_live")]
    pub live_url: String,
    #[serde(default)]
    pub sports: Vec<String>,
    #[serde(default)]
    pub login: bool,
    #[serde(default)]
    pub fetch_current_bets: bool,
}

fn default_underdog_base() -> String {
    "https://underdogfantasy.com/pick-em/higher-lower/all".to_string()
}

fn default_underdog_live() -> String {
    "https://underdogfantasy.com/live/pick-em".to_string()
}

impl Default for UnderdogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_underdog_base(),
            live_url: default_underdog_live(),
            sports: Vec::new(),
            login: false,
            fetch_current_bets: false,
        }
    }
}

/// Sign-in credentials. The password never shows up in Debug output.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse config TOML")
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let path = Path::new(ENV_FILE);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        // Strip BOM if present (common on Windows-created files)
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        for (key, value) in parse_env_lines(content) {
            if std::env::var(key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }

    /// Underdog credentials come from UNDERDOG_USER / UNDERDOG_PASS, or are
    /// prompted at startup. Prompted values are saved to .env for future runs.
    pub fn underdog_credentials() -> Result<Credentials> {
        Ok(Credentials {
            username: env_or_prompt("UNDERDOG_USER", "Underdog username")?,
            password: env_or_prompt("UNDERDOG_PASS", "Underdog password")?,
        })
    }
}

fn env_or_prompt(var: &str, label: &str) -> Result<String> {
    if let Some(value) = std::env::var(var).ok().map(|v| clean_value(&v)).filter(|v| !v.is_empty()) {
        return Ok(value);
    }
    let stdin = io::stdin();
    let value = read_answer(&mut stdin.lock(), &mut io::stdout(), label)?;
    save_env_var(var, &value);
    Ok(value)
}

/// Parse KEY=VALUE lines, skipping blanks and comments and stripping quotes.
fn parse_env_lines(content: &str) -> Vec<(&str, &str)> {
    content
        .lines()
        .map(|line| line.trim().trim_matches('\r'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim().trim_matches('"').trim_matches('\'')))
        .collect()
}

/// Ask for `label` on `output` and read one non-empty answer from `input`.
fn read_answer<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> Result<String> {
    write!(output, "  {} > ", label)?;
    output.flush()?;
    let mut line = String::new();
    input
        .read_line(&mut line)
        .with_context(|| format!("could not read {}", label))?;
    let value = clean_value(&line);
    anyhow::ensure!(!value.is_empty(), "{} cannot be empty", label);
    Ok(value)
}

/// Drop control characters and zero-width marks pasted along with a secret.
fn clean_value(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control() && !matches!(c, '\u{feff}' | '\u{200b}'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// `contents` of a .env file with `key` set to `value`, replacing an
/// existing assignment instead of stacking a second one.
fn with_env_var(contents: &str, key: &str, value: &str) -> String {
    let assignment = format!("{}={}", key, value);
    let mut replaced = false;
    let mut lines: Vec<String> = contents
        .lines()
        .map(|line| match line.split_once('=') {
            Some((k, _)) if k.trim() == key => {
                replaced = true;
                assignment.clone()
            }
            _ => line.to_string(),
        })
        .collect();
    if !replaced {
        lines.push(assignment);
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Set `key` in the current process and persist it to .env.
fn save_env_var(key: &str, value: &str) {
    std::env::set_var(key, value);
    let path = Path::new(ENV_FILE);
    let contents = std::fs::read_to_string(path).unwrap_or_default();
    if let Err(e) = std::fs::write(path, with_env_var(&contents, key, value)) {
        tracing::warn!(error = %e, "could not persist {} to .env", key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parses() {
        let config = Config::load(Path::new("config.toml")).unwrap();
        assert!(config.browser.headless);
        assert_eq!(config.browser.settle_timeout_ms, 3000);
        assert_eq!(config.pinnacle.sports, vec!["basketball/nba".to_string()]);
        assert_eq!(config.underdog.sports, vec!["nba".to_string()]);
        assert!(config.underdog.fetch_current_bets);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = Config::parse("").unwrap();
        assert!(config.browser.headless);
        assert!(!config.browser.sandbox);
        assert_eq!(config.pinnacle.base_url, "https://www.pinnacle.com/en");
        assert!(config.underdog.sports.is_empty());
        assert!(!config.underdog.login);
    }

    #[test]
    fn test_wait_policy_from_config() {
        let config = Config::parse("[browser]\nsettle_timeout_ms = 500\npoll_interval_ms = 0\n").unwrap();
        let policy = config.browser.wait_policy();
        assert_eq!(policy.timeout, Duration::from_millis(500));
        // zero would spin
        assert_eq!(policy.poll_interval, Duration::from_millis(1));
    }

    #[test]
    fn test_parse_env_lines() {
        let parsed = parse_env_lines("# comment\n\nUNDERDOG_USER = \"me@x.com\"\r\nUNDERDOG_PASS='hunter2'\nnoequals\n");
        assert_eq!(
            parsed,
            vec![("UNDERDOG_USER", "me@x.com"), ("UNDERDOG_PASS", "hunter2")]
        );
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials {
            username: "me".to_string(),
            password: "hunter2".to_string(),
        };
        let shown = format!("{:?}", creds);
        assert!(shown.contains("me"));
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn test_clean_value() {
        assert_eq!(clean_value("\u{feff} secret\r\n"), "secret");
        assert_eq!(clean_value("pa\u{200b}ss word"), "pass word");
    }

    #[test]
    fn test_read_answer() {
        let mut input = io::Cursor::new("  me@example.com\r\n");
        let mut shown = Vec::new();
        let answer = read_answer(&mut input, &mut shown, "Underdog username").unwrap();
        assert_eq!(answer, "me@example.com");
        assert_eq!(String::from_utf8(shown).unwrap(), "  Underdog username > ");

        let mut blank = io::Cursor::new("\n");
        assert!(read_answer(&mut blank, &mut Vec::<u8>::new(), "Underdog password").is_err());
    }

    #[test]
    fn test_with_env_var_replaces_existing_key() {
        let updated = with_env_var("# saved\nUNDERDOG_USER=old\nOTHER=1", "UNDERDOG_USER", "new");
        assert_eq!(updated, "# saved\nUNDERDOG_USER=new\nOTHER=1\n");

        let appended = with_env_var("", "UNDERDOG_PASS", "hunter2");
        assert_eq!(appended, "UNDERDOG_PASS=hunter2\n");
    }
}
