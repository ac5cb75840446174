//! Extraction through an external program.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use super::{ExtractedData, Extractor, ReceiptFile};
use crate::config::ExtractionConfig;
use crate::error::{Error, Result};

/// Environment variable carrying the receipt MIME type to the program.
pub const MIME_TYPE_ENV: &str = "FINANSCAN_RECEIPT_MIME";

/// Longest piece of stderr quoted in error messages.
const STDERR_EXCERPT_LEN: usize = 200;

/// Runs a configured program with the receipt path as its last argument
/// and parses its stdout as extractor JSON.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandExtractor {
    /// Create an extractor for `program`.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Build from the `extraction` configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExtractorNotConfigured`] when no command is set.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        let program = config
            .command
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or(Error::ExtractorNotConfigured)?;
        Ok(Self::new(
            program,
            config.args.clone(),
            Duration::from_secs(config.timeout_secs),
        ))
    }

    /// The program that will be run.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait::async_trait]
impl Extractor for CommandExtractor {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn extract(&self, receipt: &ReceiptFile) -> Result<ExtractedData> {
        debug!(
            program = %self.program,
            receipt = %receipt.path().display(),
            "Running extractor"
        );

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(receipt.path())
            .env(MIME_TYPE_ENV, receipt.mime_type())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::extraction(format!("could not run '{}': {e}", self.program)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                Error::extraction(format!(
                    "'{}' timed out after {}s",
                    self.program,
                    self.timeout.as_secs_f64()
                ))
            })?
            .map_err(|e| Error::extraction(format!("could not read extractor output: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT_LEN).collect();
            return Err(Error::extraction(format!(
                "'{}' exited with {}: {excerpt}",
                self.program, output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let data = ExtractedData::from_json(&stdout)?;
        info!(
            receipt = %receipt.path().display(),
            amount = data.amount.is_some(),
            date = data.date.is_some(),
            description = data.best_description().is_some(),
            "Extraction finished"
        );
        Ok(data)
    }
}
