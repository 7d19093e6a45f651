use async_trait::async_trait;
use url::Url;

use std::time::Duration;

use crate::common::PixelError;
use crate::config::PixelConfig;

/// Funnel moments that confirm attribution to ad platforms.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum PixelEvent {
    Load,
    Partial,
    Complete,
}

impl PixelEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Partial => "partial",
            Self::Complete => "complete",
        }
    }
}

/// Best-effort beacon delivery. Implementations log their failures and
/// never report them to the caller.
#[async_trait]
pub trait PixelFirer: Send + Sync {
    async fn fire(&self, event: PixelEvent, click_id: Option<String>);
}

/// Appends `param=click_id` to a pixel URL, keeping its existing query.
pub fn pixel_url(base: &Url, param: &str, click_id: &str) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut().append_pair(param, click_id);
    url
}

pub struct HttpPixelFirer {
    client: reqwest::Client,
    config: PixelConfig,
}

impl HttpPixelFirer {
    pub fn new(config: PixelConfig) -> Result<Self, PixelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self { client, config })
    }

    fn urls(&self, event: PixelEvent) -> &[Url] {
        match event {
            PixelEvent::Load => &self.config.on_load,
            PixelEvent::Partial => &self.config.on_partial,
            PixelEvent::Complete => &self.config.on_complete,
        }
    }

    async fn fire_one(&self, url: Url) -> Result<(), PixelError> {
        // The response body is irrelevant; only delivery matters.
        self.client.get(url).send().await?;
        Ok(())
    }
}

#[async_trait]
impl PixelFirer for HttpPixelFirer {
    async fn fire(&self, event: PixelEvent, click_id: Option<String>) {
        let urls = self.urls(event);
        if urls.is_empty() {
            return;
        }

        let Some(click_id) = click_id else {
            log::debug!("No click id, skipping {} pixels", event.as_str());
            return;
        };

        for base in urls {
            let url = pixel_url(base, &self.config.click_id_param, &click_id);
            if let Err(e) = self.fire_one(url).await {
                log::warn!("{} pixel to {} failed: {}", event.as_str(), base, e);
            }
        }
    }
}

/// Used when no pixel URLs are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPixelFirer;

#[async_trait]
impl PixelFirer for NoopPixelFirer {
    async fn fire(&self, _event: PixelEvent, _click_id: Option<String>) {}
}
