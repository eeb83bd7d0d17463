use crate::errors::SinkError;
use crate::results::{DealRecord, RunResult};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

/// Receives the finished run result
pub trait ResultSink {
    fn persist(&self, result: &RunResult) -> Result<(), SinkError>;
}

/// Writes the run result as pretty JSON, replacing the previous file wholesale
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for JsonFileSink {
    fn persist(&self, result: &RunResult) -> Result<(), SinkError> {
        let io_err = |path: &Path| {
            let path = path.display().to_string();
            move |source| SinkError::Io { path, source }
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }

        let json = serde_json::to_string_pretty(result)?;

        // Write beside the target then rename so readers never see a partial file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err(&tmp))?;
        fs::rename(&tmp, &self.path).map_err(io_err(&self.path))?;

        ::log::info!(
            "Saved {} deals to {}",
            result.total_deals,
            self.path.display()
        );
        Ok(())
    }
}

/// A formatted message ready for a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Delivers a notification
pub trait Notifier {
    fn notify(&self, message: &Notification) -> Result<(), SinkError>;
}

/// Writes notifications to the log instead of sending them anywhere
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &Notification) -> Result<(), SinkError> {
        ::log::info!("Notification: {}\n{}", message.subject, message.body);
        Ok(())
    }
}

/// Render a human-readable summary, one line group per deal
pub fn format_notification(deals: &[DealRecord], subject: &str, today: NaiveDate) -> Notification {
    let subject = format!(
        "{} {} Found - {}",
        deals.len(),
        subject,
        today.format("%d/%m/%Y")
    );

    let mut body = format!("Found {} deals:\n\n", deals.len());
    for (i, deal) in deals.iter().enumerate() {
        let price_line = if deal.discount_label.is_empty() {
            deal.price.clone()
        } else {
            format!("{} - {}", deal.price, deal.discount_label)
        };
        body.push_str(&format!(
            "{}. {}\n   {}\n   {}\n   {}\n\n",
            i + 1,
            deal.source,
            deal.title,
            price_line,
            deal.reference_url
        ));
    }

    Notification { subject, body }
}

/// What happened when publishing a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    pub persisted: bool,
    pub notified: bool,
}

/// Persist the result, then notify if there is anything to say
///
/// Failures are logged, never returned; a failed notification leaves the
/// persisted file in place.
pub fn publish(
    result: &RunResult,
    sink: &dyn ResultSink,
    notifier: Option<&dyn Notifier>,
    subject: &str,
) -> PublishReport {
    let persisted = match sink.persist(result) {
        Ok(()) => true,
        Err(e) => {
            ::log::error!("Failed to persist deals: {}", e);
            false
        }
    };

    let notified = match notifier {
        Some(_) if result.deals.is_empty() => {
            ::log::info!("No deals to notify about");
            false
        }
        Some(notifier) => {
            let message =
                format_notification(&result.deals, subject, chrono::Local::now().date_naive());
            match notifier.notify(&message) {
                Ok(()) => true,
                Err(e) => {
                    ::log::error!("Failed to send notification: {}", e);
                    false
                }
            }
        }
        None => false,
    };

    PublishReport {
        persisted,
        notified,
    }
}
