//! Delivery of result records.
//!
//! A [`ResultSink`] receives the record of every run, successful or not.
//! Delivery failures are reported back to the pipeline, which logs and
//! swallows them; the record itself is never altered by delivery.

use crate::config::DEFAULT_CALLBACK_TIMEOUT_SECS;
use crate::error::PipelineError;
use crate::report::ResultRecord;
use std::time::Duration;

/// Receiver of result records.
pub trait ResultSink: Send + Sync {
    /// Hand over one record.
    fn deliver(&self, record: &ResultRecord) -> Result<(), PipelineError>;
}

impl<F> ResultSink for F
where
    F: Fn(&ResultRecord) -> Result<(), PipelineError> + Send + Sync,
{
    fn deliver(&self, record: &ResultRecord) -> Result<(), PipelineError> {
        self(record)
    }
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ResultSink for NoopSink {
    fn deliver(&self, _record: &ResultRecord) -> Result<(), PipelineError> {
        Ok(())
    }
}

/// POSTs records as JSON to a callback URL.
#[derive(Debug, Clone)]
pub struct CallbackSink {
    url: String,
    timeout_secs: u64,
}

impl CallbackSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: DEFAULT_CALLBACK_TIMEOUT_SECS,
        }
    }

    /// Set the request timeout in seconds.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ResultSink for CallbackSink {
    fn deliver(&self, record: &ResultRecord) -> Result<(), PipelineError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| PipelineError::CallbackDelivery(e.to_string()))?;

        let response = client
            .post(&self.url)
            .json(record)
            .send()
            .map_err(|e| PipelineError::CallbackDelivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::CallbackDelivery(format!(
                "{} responded with HTTP {}",
                self.url, status
            )));
        }
        Ok(())
    }
}
