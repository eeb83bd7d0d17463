use crate::config::{AppConfig, RenderInstructions, SourceConfig};
use crate::dedupe::dedupe;
use crate::errors::ConfigError;
use crate::fetchers::{FetchError, FetchRequest, FetchedPage, PageFetcher};
use crate::filter::{BlockDetector, KeywordMatcher};
use crate::normalize::RecordNormalizer;
use crate::parsers::{ExtractionRules, PatternExtractor};
use crate::results::{DealRecord, ExtractionMethod, SourceOutcome};
use std::time::Duration;

/// Runs fetch, extract, normalize and dedupe for each configured retailer
pub struct ExtractionPipeline<F: PageFetcher> {
    fetcher: F,
    extractor: PatternExtractor,
    normalizer: RecordNormalizer,
    matcher: KeywordMatcher,
    block_detector: BlockDetector,
    render: RenderInstructions,
    fetch_timeout: Duration,
    politeness_delay: Duration,
}

impl<F: PageFetcher> ExtractionPipeline<F> {
    /// Build a pipeline from a configuration and a ready fetcher
    ///
    /// The configuration is validated here so a bad setup fails before any request.
    pub fn new(config: &AppConfig, fetcher: F) -> Result<Self, ConfigError> {
        config.validate()?;
        let rules = ExtractionRules::from_config(config)?;
        Ok(Self {
            fetcher,
            matcher: rules.matcher.clone(),
            extractor: PatternExtractor::new(rules),
            normalizer: RecordNormalizer::from_config(config),
            block_detector: BlockDetector::new(&config.fetch.block_markers),
            render: config.fetch.render,
            fetch_timeout: Duration::from_secs(config.fetch.timeout_secs),
            politeness_delay: Duration::from_secs(config.politeness_delay_secs),
        })
    }

    /// Replace the extraction cascade
    pub fn with_extractor(mut self, extractor: PatternExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Override the pause between retailers
    pub fn with_politeness_delay(mut self, delay: Duration) -> Self {
        self.politeness_delay = delay;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Hand back the fetcher, e.g. to close a browser session
    pub fn into_fetcher(self) -> F {
        self.fetcher
    }

    /// Sweep every source in order, pausing between them
    ///
    /// Results are concatenated without cross-source dedupe. A source that
    /// yields nothing contributes an empty outcome.
    pub async fn run_all(&self, sources: &[SourceConfig]) -> Vec<SourceOutcome> {
        let mut outcomes = Vec::with_capacity(sources.len());

        for (index, source) in sources.iter().enumerate() {
            if index > 0 && !self.politeness_delay.is_zero() {
                ::log::debug!("Waiting {:?} before next source", self.politeness_delay);
                tokio::time::sleep(self.politeness_delay).await;
            }

            let outcome = self.run(source).await;
            ::log::info!(
                "{}: {} deals via {}",
                outcome.source,
                outcome.deals.len(),
                outcome.method
            );
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Try a source's candidate URLs in order; the first that yields records wins
    pub async fn run(&self, source: &SourceConfig) -> SourceOutcome {
        ::log::info!("Checking {}", source.name);
        let render = source.render.unwrap_or(self.render);

        for url in &source.urls {
            ::log::info!("Trying {}", url);
            let request = FetchRequest {
                url: url.clone(),
                render,
                timeout: self.fetch_timeout,
            };

            let page = match self.fetcher.fetch(&request).await {
                Ok(page) => page,
                Err(e) => {
                    ::log::warn!("{}", e);
                    continue;
                }
            };

            if let Err(e) = self.screen(&page, source) {
                ::log::warn!("{}", e);
                continue;
            }

            let (method, deals) = self.extract_records(&page.content, &page.final_url, &source.name);
            if deals.is_empty() {
                ::log::info!("No deals found at {}", page.final_url);
                continue;
            }

            ::log::info!("Found {} {} deals at {}", deals.len(), source.name, page.final_url);
            return SourceOutcome {
                source: source.name.clone(),
                method,
                url: Some(page.final_url),
                deals,
            };
        }

        ::log::warn!("All candidate pages exhausted for {}", source.name);
        SourceOutcome::empty(&source.name)
    }

    /// Reject block pages and pages missing the source's expected marker
    fn screen(&self, page: &FetchedPage, source: &SourceConfig) -> Result<(), FetchError> {
        if let Some(marker) = self.block_detector.detect(&page.content) {
            return Err(FetchError::Blocked {
                url: page.final_url.clone(),
                marker: marker.to_string(),
            });
        }

        if let Some(marker) = &source.required_marker {
            if !page.content.to_lowercase().contains(&marker.to_lowercase()) {
                return Err(FetchError::MissingMarker {
                    url: page.final_url.clone(),
                    marker: marker.clone(),
                });
            }
        }

        Ok(())
    }

    /// Synchronous core: page content to deduplicated records
    pub fn extract_records(
        &self,
        content: &str,
        page_url: &str,
        source: &str,
    ) -> (ExtractionMethod, Vec<DealRecord>) {
        let extraction = self.extractor.extract(content, page_url);

        let records = extraction
            .fragments
            .iter()
            .map(|fragment| self.normalizer.normalize(fragment, source, page_url))
            .filter(|record| {
                let keep = record.generic || self.matcher.matches(&record.title);
                if !keep {
                    ::log::debug!("Dropping record whose title lost its keywords: {}", record.title);
                }
                keep
            })
            .collect();

        (extraction.method, dedupe(records))
    }
}
