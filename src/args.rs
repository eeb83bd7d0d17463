use clap::Parser;
use deal_sweep::AppConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "deal-sweep")]
#[command(about = "Checks retailer pages for discount listings and saves a summary")]
#[command(version)]
pub struct Args {
    /// JSON configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where to write the results file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// WebDriver server URL
    #[arg(long, env = "WEBDRIVER_URL")]
    pub webdriver_url: Option<String>,

    /// Seconds to pause between retailers
    #[arg(long)]
    pub delay: Option<u64>,

    /// Skip the notification step
    #[arg(long)]
    pub no_notify: bool,
}

impl Args {
    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(url) = self.webdriver_url.as_ref().filter(|u| !u.is_empty()) {
            config.fetch.webdriver_url = url.clone();
        }
        if let Some(delay) = self.delay {
            config.politeness_delay_secs = delay;
        }
        if self.no_notify {
            config.notification.enabled = false;
        }
    }
}
