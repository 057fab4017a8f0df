use anyhow::Result;
use log::info;

use crate::client::Client;
use crate::model::EmojiIndex;

/// Everything an authenticated run needs, built once and then only read.
///
/// The index is the snapshot taken at startup; emoji created afterwards, by this run
/// or anybody else, aren't in it.
#[derive(Debug, Clone)]
pub struct Context {
    pub client: Client,
    pub token: String,
    pub index: EmojiIndex,
}

impl Context {
    pub fn new(client: Client, token: String, index: EmojiIndex) -> Context {
        Context {
            client,
            token,
            index,
        }
    }

    /// Scrapes the api token, then lists the existing emoji.
    pub async fn open(client: Client) -> Result<Context> {
        info!("connecting to `{}`", client.base_url());
        let token = client.acquire_token().await?;
        let index = client.list_emojis(&token).await?;
        Ok(Context::new(client, token, index))
    }
}
