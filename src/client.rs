use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, COOKIE};

use crate::error::{Error, Result};
use crate::transport::{RetryPolicy, Transport};

const USER_AGENT: &str = "\
    Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) \
    Chrome/110.0.0.0 Safari/537.36";

pub const CUSTOMIZE_EMOJI_PATH: &str = "customize/emoji";
pub const EMOJI_LIST_PATH: &str = "api/emoji.adminList";
pub const EMOJI_ADD_PATH: &str = "api/emoji.add";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Unauthenticated handle on one workspace: the cookie is sent, no api token yet.
#[derive(Debug, Clone)]
pub struct Client {
    pub transport: Transport,
    base_url: String,
}

impl Client {
    /// `https://<team>.<host>`
    pub fn new(team: &str, host: &str, cookie: &str, policy: RetryPolicy) -> Result<Client> {
        Self::with_base_url(format!("https://{team}.{host}"), cookie, policy)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        cookie: &str,
        policy: RetryPolicy,
    ) -> Result<Client> {
        let mut cookie = HeaderValue::from_str(cookie)?;
        cookie.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, cookie);

        let http = reqwest::ClientBuilder::new()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::HttpClient)?;

        Ok(Client {
            transport: Transport::new(http, policy),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
