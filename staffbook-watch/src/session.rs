use anyhow::{Context, Result};
use reqwest::Client;
use url::Url;

use crate::config::Config;

/// Authenticated portal session. The client's cookie jar carries the login
/// state, so there is no session to pass around beyond this struct.
pub struct Session {
    client: Client,
    login_url: Url,
    username: String,
    password: String,
    calendar_url: Url,
}

impl Session {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .context("failed to build the HTTP client")?;

        Ok(Self {
            client,
            login_url: config.login_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            calendar_url: config.calendar_url.clone(),
        })
    }

    /// Posts the credentials as a login form. The portal answers 200 whether
    /// the login succeeded or not; a stale or rejected login shows up later
    /// as month pages without any calendar cells.
    pub async fn login(&self) -> Result<()> {
        let form = [
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];

        self.client
            .post(self.login_url.clone())
            .form(&form)
            .send()
            .await
            .context("login request failed")?
            .error_for_status()
            .context("login request was rejected")?;

        Ok(())
    }

    /// Fetches the month-view page for `year`/`month` and returns its body.
    pub async fn month_html(&self, year: i32, month: u32) -> Result<String> {
        let url = month_url(&self.calendar_url, year, month);

        let body = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to fetch the {year}-{month:02} month page"))?
            .error_for_status()
            .with_context(|| format!("month page request for {year}-{month:02} was rejected"))?
            .text()
            .await
            .with_context(|| format!("failed to read the {year}-{month:02} month page"))?;

        Ok(body)
    }
}

/// The month-view URL: the configured calendar URL with the portal's
/// `Day/Month/Year/View` parameters appended. The day is pinned to the first
/// and the month is not zero-padded, matching what the portal itself emits.
fn month_url(calendar_url: &Url, year: i32, month: u32) -> Url {
    let mut url = calendar_url.clone();
    url.query_pairs_mut()
        .append_pair("Day", "01")
        .append_pair("Month", &month.to_string())
        .append_pair("Year", &year.to_string())
        .append_pair("View", "Month");
    url
}
