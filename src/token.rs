use std::sync::LazyLock;

use lazy_regex::regex_captures;
use log::{debug, info};
use scraper::{Html, Selector};

use crate::client::{Client, CUSTOMIZE_EMOJI_PATH};
use crate::error::{Error, Result};

// Inline scripts directly under <body>; the page config holding the token is one of them.
static SCRIPT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"html > body > script[type="text/javascript"]"#).unwrap()
});

/// Finds the quoted value of an `api_token` key in the page's inline scripts.
pub fn extract_api_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document.select(&SCRIPT_SELECTOR).find_map(|script| {
        let text = script.text().collect::<String>();
        if !text.contains("api_token") {
            return None;
        }
        let (_, token) = regex_captures!(r#""?api_token"?\s*:\s*"([^"]+)""#, &text)?;
        Some(token.to_owned())
    })
}

impl Client {
    /// Scrapes the short-lived api token out of the emoji customization page.
    pub async fn acquire_token(&self) -> Result<String> {
        let url = self.url(CUSTOMIZE_EMOJI_PATH);
        let page = self
            .transport
            .execute("requesting the api token", |http| http.get(&url), |reply| {
                Ok(reply.text())
            })
            .await?;
        debug!("got emoji customization page ({} bytes)", page.len());

        let token = extract_api_token(&page).ok_or(Error::TokenNotFound)?;
        info!("acquired api token");
        Ok(token)
    }
}
