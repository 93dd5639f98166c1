use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures_util::future::join_all;
use reqwest::Client;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{error, info, warn};

use common::models::{ChartImage, ChartSpec};
use common::traits::ChartSource;

/// Rendering a chart page is slow; the capture service gets minutes, not
/// seconds.
const CAPTURE_TIMEOUT: Duration = Duration::from_secs(600);
const MAX_CONCURRENT_CAPTURES: usize = 3;
const MAX_ATTEMPTS: usize = 4;
const RETRY_PAUSE: Duration = Duration::from_secs(3);

pub fn default_charts() -> Vec<ChartSpec> {
    [
        (
            "https://en.tradingview.com/chart/GR1CpUCR/",
            "1. Daily Trend and Momentum Analysis (MACD, RSI, Trendlines)",
        ),
        (
            "https://en.tradingview.com/chart/epZugjza/",
            "2. Daily Moving Averages and Volume Profile Analysis",
        ),
        (
            "https://en.tradingview.com/chart/vOnmoT3y/",
            "3. 4-Hour Trend and Momentum Analysis (MACD, RSI, Trendlines)",
        ),
    ]
    .into_iter()
    .map(|(url, name)| ChartSpec {
        url: url.to_string(),
        name: name.to_string(),
    })
    .collect()
}

/// `ChartSource` backed by an external headless-browser screenshot service:
/// one GET per chart, PNG bytes back.
pub struct ScreenshotServiceCapture {
    client: Client,
    endpoint: String,
}

impl ScreenshotServiceCapture {
    pub fn new(client: Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl ChartSource for ScreenshotServiceCapture {
    async fn capture(&self, chart: &ChartSpec) -> anyhow::Result<Option<String>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("url", chart.url.as_str()),
                ("selector", ".chart-container"),
                ("width", "1420"),
                ("height", "800"),
            ])
            .timeout(CAPTURE_TIMEOUT)
            .send()
            .await
            .context("screenshot request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("screenshot service returned HTTP {}", resp.status());
        }
        let bytes = resp.bytes().await.context("screenshot body read failed")?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(BASE64.encode(&bytes)))
    }
}

/// Drives chart capture for the cycle: a small concurrent page pool, bounded
/// retries per chart, and a null image once a chart exhausts its attempts.
pub struct ChartCaptureService {
    source: Arc<dyn ChartSource>,
    charts: Vec<ChartSpec>,
}

impl ChartCaptureService {
    pub fn new(source: Arc<dyn ChartSource>, charts: Vec<ChartSpec>) -> Self {
        Self { source, charts }
    }

    /// Fatal only when no chart at all could be captured; individual charts
    /// may come back null.
    pub async fn capture_all(&self) -> anyhow::Result<Vec<ChartImage>> {
        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_CAPTURES));

        let captures = self.charts.iter().map(|chart| {
            let semaphore = semaphore.clone();
            let source = self.source.clone();
            async move {
                // Semaphore is never closed while we hold it.
                let _permit = semaphore.acquire().await.expect("capture semaphore closed");
                let image_data = capture_with_retry(source.as_ref(), chart).await;
                ChartImage {
                    file_name: chart.name.clone(),
                    image_data,
                }
            }
        });

        let images = join_all(captures).await;
        if images.iter().all(|image| image.image_data.is_none()) {
            anyhow::bail!("no chart could be captured after {MAX_ATTEMPTS} attempts each");
        }
        Ok(images)
    }
}

async fn capture_with_retry(source: &dyn ChartSource, chart: &ChartSpec) -> Option<String> {
    for attempt in 1..=MAX_ATTEMPTS {
        match source.capture(chart).await {
            Ok(Some(image_data)) => {
                info!(chart = %chart.name, attempt, "chart captured");
                return Some(image_data);
            }
            Ok(None) => {
                warn!(chart = %chart.name, attempt, "capture returned no image");
            }
            Err(e) => {
                warn!(chart = %chart.name, attempt, error = %e, "capture attempt failed");
            }
        }
        if attempt < MAX_ATTEMPTS {
            sleep(RETRY_PAUSE).await;
        }
    }
    error!(chart = %chart.name, "all {MAX_ATTEMPTS} capture attempts failed");
    None
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct FlakySource {
        failures_before_success: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChartSource for FlakySource {
        async fn capture(&self, _chart: &ChartSpec) -> anyhow::Result<Option<String>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                anyhow::bail!("render timeout");
            }
            Ok(Some("cGluZw==".to_string()))
        }
    }

    struct DeadSource;

    #[async_trait]
    impl ChartSource for DeadSource {
        async fn capture(&self, _chart: &ChartSpec) -> anyhow::Result<Option<String>> {
            anyhow::bail!("browser gone")
        }
    }

    fn one_chart() -> Vec<ChartSpec> {
        vec![ChartSpec {
            url: "https://example.com/chart".into(),
            name: "test chart".into(),
        }]
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let source = Arc::new(FlakySource {
            failures_before_success: 2,
            calls: AtomicUsize::new(0),
        });
        let service = ChartCaptureService::new(source.clone(), one_chart());
        let images = service.capture_all().await.unwrap();
        assert_eq!(images.len(), 1);
        assert!(images[0].image_data.is_some());
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_chart_yields_null_image() {
        let charts = vec![
            ChartSpec {
                url: "https://example.com/a".into(),
                name: "a".into(),
            },
            ChartSpec {
                url: "https://example.com/b".into(),
                name: "b".into(),
            },
        ];
        struct PerChart;
        #[async_trait]
        impl ChartSource for PerChart {
            async fn capture(&self, chart: &ChartSpec) -> anyhow::Result<Option<String>> {
                if chart.name == "a" {
                    anyhow::bail!("never renders")
                }
                Ok(Some("cGluZw==".to_string()))
            }
        }
        let service = ChartCaptureService::new(Arc::new(PerChart), charts);
        let images = service.capture_all().await.unwrap();
        assert!(images.iter().any(|i| i.image_data.is_none()));
        assert!(images.iter().any(|i| i.image_data.is_some()));
    }

    #[tokio::test(start_paused = true)]
    async fn all_charts_failing_is_fatal() {
        let service = ChartCaptureService::new(Arc::new(DeadSource), one_chart());
        assert!(service.capture_all().await.is_err());
    }
}
