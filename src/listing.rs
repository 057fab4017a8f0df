use log::{debug, info};

use crate::client::{Client, EMOJI_LIST_PATH};
use crate::error::{Error, Result};
use crate::model::{EmojiIndex, ListResponse, Paging};

pub const PAGE_SIZE: u32 = 1000;

/// Upper bound on the index pre-allocation taken from the reported total.
const MAX_CAPACITY_HINT: usize = PAGE_SIZE as usize * 16;

/// Where the listing stands. `page_count` starts at 1 so the first page is always fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
}

impl PageCursor {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            page_count: 1,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page <= self.page_count
    }

    /// Moves past the page the server says it returned.
    ///
    /// No page follows `u32::MAX`, so reaching it ends the listing.
    pub fn advance(self, paging: &Paging) -> Self {
        match paging.page.max(self.page).checked_add(1) {
            Some(page) => Self {
                page,
                page_count: paging.page_count,
                ..self
            },
            None => Self {
                page: u32::MAX,
                page_count: 0,
                ..self
            },
        }
    }
}

impl Client {
    /// Fetches the whole custom emoji directory, one page at a time.
    pub async fn list_emojis(&self, token: &str) -> Result<EmojiIndex> {
        let mut cursor = PageCursor::new(PAGE_SIZE);
        let mut index: Option<EmojiIndex> = None;

        while cursor.has_next() {
            let response = self.fetch_page(token, cursor).await?;
            debug!(
                "got emoji page {}/{} ({} emoji, {} disabled, {} of {} per page, {} custom total)",
                response.paging.page,
                response.paging.page_count,
                response.emoji.len(),
                response.disabled_emoji.len(),
                response.paging.page_size,
                cursor.page_size,
                response.custom_emoji_total_count
            );

            let total = response.paging.total_count.min(MAX_CAPACITY_HINT);
            index
                .get_or_insert_with(|| EmojiIndex::with_capacity(total))
                .merge(response.emoji);
            cursor = cursor.advance(&response.paging);
        }

        let index = index.unwrap_or_default();
        info!("listed {} custom emoji", index.len());
        Ok(index)
    }

    async fn fetch_page(&self, token: &str, cursor: PageCursor) -> Result<ListResponse> {
        let url = self.url(EMOJI_LIST_PATH);
        let count = cursor.page_size.to_string();
        let page = cursor.page.to_string();
        let form = [
            ("count", count.as_str()),
            ("page", page.as_str()),
            ("query", ""),
            ("token", token),
        ];

        self.transport
            .execute(
                &format!("listing emoji page {}", cursor.page),
                |http| http.post(&url).form(&form),
                |reply| {
                    let response = reply.json::<ListResponse>()?;
                    if response.ok {
                        Ok(response)
                    } else {
                        Err(Error::RemoteRejected {
                            url: reply.url,
                            reason: response.error.unwrap_or_else(|| "not ok".into()),
                        })
                    }
                },
            )
            .await
    }
}
