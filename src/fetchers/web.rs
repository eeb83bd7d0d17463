use crate::config::FetchConfig;
use crate::fetchers::{FetchError, FetchRequest, FetchedPage, PageFetcher};
use fantoccini::{Client, ClientBuilder};
use tokio::time::{Duration, sleep, timeout};

const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Well-known local WebDriver endpoints tried when the configured one fails
const FALLBACK_WEBDRIVER_URLS: [&str; 3] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4444", // geckodriver / Selenium default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// Fetches pages through a WebDriver-controlled browser so dynamic content renders
pub struct WebFetcher {
    client: Client,
    webdriver_url: String,
}

impl WebFetcher {
    /// Connect to a WebDriver server, trying the configured URL first
    ///
    /// Failing here is a start-up error; no page has been requested yet.
    pub async fn connect(config: &FetchConfig) -> Result<Self, FetchError> {
        let mut tried = vec![config.webdriver_url.clone()];
        match ClientBuilder::native().connect(&config.webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", config.webdriver_url);
                return Ok(Self {
                    client,
                    webdriver_url: config.webdriver_url.clone(),
                });
            }
            Err(e) => {
                ::log::warn!(
                    "Failed to connect to WebDriver at {}: {}",
                    config.webdriver_url,
                    e
                );
            }
        }

        for url in FALLBACK_WEBDRIVER_URLS {
            if url == config.webdriver_url {
                continue;
            }
            ::log::info!("Trying fallback WebDriver URL: {}", url);
            tried.push(url.to_string());
            if let Ok(client) = ClientBuilder::native().connect(url).await {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Ok(Self {
                    client,
                    webdriver_url: url.to_string(),
                });
            }
        }

        Err(FetchError::Unavailable(tried.join(", ")))
    }

    pub fn webdriver_url(&self) -> &str {
        &self.webdriver_url
    }

    /// End the browser session
    pub async fn close(self) {
        if let Err(e) = self.client.close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }
    }

    async fn load(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
        let url = request.url.as_str();

        self.client
            .goto(url)
            .await
            .map_err(|e| navigation_error(e, url))?;

        if request.render.scroll_to_bottom {
            // Lazy-loaded product grids only render once scrolled into view
            if let Err(e) = self.client.execute(SCROLL_SCRIPT, Vec::new()).await {
                ::log::debug!("Scroll script failed on {}: {}", url, e);
            }
        }
        if request.render.wait_secs > 0 {
            sleep(Duration::from_secs(request.render.wait_secs)).await;
        }

        let content = self.client.source().await.map_err(|e| FetchError::Source {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let final_url = match self.client.current_url().await {
            Ok(current) => current.to_string(),
            Err(_) => url.to_string(),
        };

        ::log::debug!("Fetched {} characters from {}", content.len(), final_url);

        Ok(FetchedPage {
            requested_url: url.to_string(),
            final_url,
            content,
        })
    }
}

impl PageFetcher for WebFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
        match timeout(request.timeout, self.load(request)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: request.url.clone(),
                secs: request.timeout.as_secs(),
            }),
        }
    }
}

fn navigation_error(error: fantoccini::error::CmdError, url: &str) -> FetchError {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("Lost WebDriver session while loading {}", url);
    }
    FetchError::Navigation {
        url: url.to_string(),
        message: error.to_string(),
    }
}
