use std::time::{Duration, Instant};

use backon::{ExponentialBuilder, Retryable};
use bytes::Bytes;
use derive_builder::Builder;
use log::{debug, warn};
use reqwest::header::RETRY_AFTER;
use reqwest::{RequestBuilder, StatusCode};

use crate::error::{Error, Result};

/// Exponential backoff settings shared by every call of one operation.
#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct RetryPolicy {
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub factor: f32,
    /// Once this much time has passed since the first attempt no further retry is made.
    pub max_elapsed: Duration,
    pub max_retries: usize,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(60),
            factor: 1.5,
            max_elapsed: Duration::from_secs(15 * 60),
            max_retries: 64,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    fn backoff(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_factor(self.factor)
            .with_max_times(self.max_retries);
        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }
}

/// A fully read response.
#[derive(Debug, Clone)]
pub struct Reply {
    pub url: String,
    pub status: StatusCode,
    pub retry_after: Option<String>,
    pub body: Bytes,
}

impl Reply {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T>(&self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_slice(&self.body).map_err(|source| Error::Parse {
            url: self.url.clone(),
            source,
        })
    }

    fn check_status(self) -> Result<Reply> {
        let status = self.status.as_u16();
        if self.status.is_server_error() {
            Err(Error::Server {
                url: self.url,
                status,
            })
        } else if self.status.is_client_error() {
            Err(Error::Client {
                url: self.url,
                status,
            })
        } else {
            Ok(self)
        }
    }

    /// `Retry-After` in its delay-seconds form.
    fn rate_limit_wait(&self) -> Result<Duration> {
        self.retry_after
            .as_deref()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .ok_or_else(|| Error::InvalidRetryAfter {
                url: self.url.clone(),
                value: self.retry_after.clone(),
            })
    }
}

#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    policy: RetryPolicy,
}

impl Transport {
    pub fn new(http: reqwest::Client, policy: RetryPolicy) -> Self {
        Self { http, policy }
    }

    /// Runs one backoff-governed call.
    ///
    /// `build` is invoked for every attempt, since request bodies can't be replayed.
    /// `classify` turns a successful (non 4xx/5xx) reply into the result; returning a
    /// non-retryable error from it stops the backoff loop immediately.
    pub async fn execute<T, B, C>(&self, what: &str, build: B, classify: C) -> Result<T>
    where
        B: Fn(&reqwest::Client) -> RequestBuilder,
        C: Fn(Reply) -> Result<T>,
    {
        let started = Instant::now();
        let max_elapsed = self.policy.max_elapsed;

        let (build, classify) = (&build, &classify);
        let attempt = move || self.attempt(build, classify);
        let result = attempt
            .retry(self.policy.backoff())
            .sleep(tokio::time::sleep)
            .when(|err: &Error| err.is_retryable() && started.elapsed() < max_elapsed)
            .notify(|err: &Error, delay: Duration| {
                warn!("{what} temporarily failed, retrying in {delay:?}: {err}");
            })
            .await;

        if let Err(err) = &result {
            debug!("{what} gave up after {:?}: {err}", started.elapsed());
        }
        result
    }

    async fn attempt<T, B, C>(&self, build: &B, classify: &C) -> Result<T>
    where
        B: Fn(&reqwest::Client) -> RequestBuilder,
        C: Fn(Reply) -> Result<T>,
    {
        let reply = self.send(build).await?;
        if reply.status != StatusCode::TOO_MANY_REQUESTS {
            return classify(reply.check_status()?);
        }

        // One deterministic wait and one more request, outside the backoff budget.
        let wait = reply.rate_limit_wait()?;
        warn!("`{}` is rate limiting, waiting {wait:?}", reply.url);
        tokio::time::sleep(wait).await;

        let url = reply.url;
        match self
            .send(build)
            .await
            .and_then(Reply::check_status)
            .and_then(classify)
        {
            Err(err) if err.is_retryable() => Err(Error::RateLimited {
                url,
                wait,
                source: Box::new(err),
            }),
            other => other,
        }
    }

    async fn send<B>(&self, build: &B) -> Result<Reply>
    where
        B: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let request = build(&self.http).build().map_err(Error::HttpClient)?;
        let url = request.url().to_string();
        debug!("{} {url}", request.method());

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|source| Error::Transport {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await.map_err(|source| Error::Transport {
            url: url.clone(),
            source,
        })?;
        debug!("{url} answered {status} ({} bytes)", body.len());

        Ok(Reply {
            url,
            status,
            retry_after,
            body,
        })
    }
}

#[cfg(test)]
pub(crate) fn test_policy() -> RetryPolicy {
    RetryPolicy::builder()
        .min_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(5))
        .max_elapsed(Duration::from_millis(500))
        .max_retries(5)
        .jitter(false)
        .build()
        .unwrap()
}
