use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::warn;
use url::Url;

pub struct Config {
    pub login_url: Url,
    pub username: String,
    pub password: String,
    pub calendar_url: Url,
    /// Base for resolving the relative event links on the calendar pages.
    pub base_url: Url,
    /// How many consecutive months to scrape, starting with the current one.
    pub months: u32,
    pub data_dir: PathBuf,
    pub email: Option<EmailConfig>,
}

#[derive(Clone)]
pub struct EmailConfig {
    pub api_key: String,
    pub from: String,
    pub to: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let login_url = required_url("STAFFBOOK_LOGIN_URL")?;
        let username = required("STAFFBOOK_USERNAME")?;
        let password = required("STAFFBOOK_PASSWORD")?;
        let calendar_url = required_url("STAFFBOOK_CALENDAR_URL")?;

        let base_url = match env::var("STAFFBOOK_BASE_URL") {
            Ok(value) => parse_url("STAFFBOOK_BASE_URL", &value)?,
            Err(_) => calendar_url
                .join("/")
                .context("`STAFFBOOK_CALENDAR_URL` cannot serve as a base URL")?,
        };

        let months = match env::var("STAFFBOOK_MONTHS") {
            Ok(value) => value
                .parse::<u32>()
                .context("`STAFFBOOK_MONTHS` is not a number")?
                .clamp(1, 12),
            Err(_) => 2,
        };

        let data_dir = env::var("STAFFBOOK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let email = email_from_env();
        if email.is_none() && env::var("SENDGRID_API_KEY").is_ok() {
            warn!(
                "SENDGRID_API_KEY is set but STAFFBOOK_EMAIL_FROM/STAFFBOOK_EMAIL_TO \
                 are incomplete; notifications stay off"
            );
        }

        Ok(Self {
            login_url,
            username,
            password,
            calendar_url,
            base_url,
            months,
            data_dir,
            email,
        })
    }
}

fn email_from_env() -> Option<EmailConfig> {
    let api_key = env::var("SENDGRID_API_KEY").ok()?;
    let from = env::var("STAFFBOOK_EMAIL_FROM").ok()?;
    let to = parse_address_list(&env::var("STAFFBOOK_EMAIL_TO").ok()?);

    if to.is_empty() {
        return None;
    }

    Some(EmailConfig { api_key, from, to })
}

fn parse_address_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .collect()
}

fn required(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("`{name}` environment variable is not set"))
}

fn required_url(name: &str) -> Result<Url> {
    let value = required(name)?;
    parse_url(name, &value)
}

fn parse_url(name: &str, value: &str) -> Result<Url> {
    Url::parse(value).with_context(|| format!("`{name}` is not a valid URL"))
}
