//! OCR path backed by an external `ocrmypdf`-compatible tool
//!
//! The tool is probed once at construction; a missing tool surfaces as
//! [`DocumentError::OcrUnavailable`] so the caller can fall back to the fast
//! path. Conversion runs the tool with a sidecar text file inside a scratch
//! directory and kills it when the document timeout elapses.

use crate::backend::{Conversion, ConversionBackend};
use crate::config::{AcceleratorDevice, DocumentConfig};
use crate::error::DocumentError;
use crate::native::{file_type, NativeBackend};
use std::fs::{self, File};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const PAGE_BREAK: char = '\x0c';

/// Converts scanned PDFs through an external OCR tool
#[derive(Debug, Clone)]
pub struct OcrBackend {
    command: String,
    language: String,
    jobs: usize,
    timeout: Duration,
    native: NativeBackend,
}

impl OcrBackend {
    /// Probe the configured OCR tool and build the backend
    pub fn new(config: &DocumentConfig) -> Result<Self, DocumentError> {
        let probe = Command::new(&config.ocr_command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| DocumentError::OcrUnavailable(format!("{}: {}", config.ocr_command, e)))?;
        if !probe.success() {
            return Err(DocumentError::OcrUnavailable(format!(
                "{} --version exited with {}",
                config.ocr_command, probe
            )));
        }

        if config.accelerator_device != AcceleratorDevice::Cpu {
            warn!(
                "Accelerator '{}' not supported by {}, using cpu",
                config.accelerator_device, config.ocr_command
            );
        }

        info!(
            "OCR backend ready ({}, language {}, {} jobs)",
            config.ocr_command, config.ocr_language, config.accelerator_threads
        );

        Ok(Self {
            command: config.ocr_command.clone(),
            language: config.ocr_language.clone(),
            jobs: config.accelerator_threads.max(1),
            timeout: config.document_timeout(),
            native: NativeBackend::new(config),
        })
    }

    fn run_ocr(&self, path: &Path) -> Result<Conversion, DocumentError> {
        let scratch = tempfile::tempdir()?;
        let sidecar = scratch.path().join("sidecar.txt");
        let output = scratch.path().join("output.pdf");
        // A file never fills up, so a chatty tool cannot block on its own log
        let stderr_log = scratch.path().join("stderr.log");

        debug!("Running {} on {}", self.command, path.display());
        let mut child = Command::new(&self.command)
            .arg("--force-ocr")
            .arg("-l")
            .arg(&self.language)
            .arg("--jobs")
            .arg(self.jobs.to_string())
            .arg("--sidecar")
            .arg(&sidecar)
            .arg(path)
            .arg(&output)
            .stdout(Stdio::null())
            .stderr(Stdio::from(File::create(&stderr_log)?))
            .spawn()
            .map_err(|e| DocumentError::OcrUnavailable(format!("{}: {}", self.command, e)))?;

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() >= self.timeout {
                warn!(
                    "{} exceeded {:?} on {}, killing it",
                    self.command,
                    self.timeout,
                    path.display()
                );
                if let Err(e) = child.kill() {
                    warn!("Failed to kill {}: {}", self.command, e);
                }
                match child.wait() {
                    Ok(status) => debug!("{} stopped: {}", self.command, status),
                    Err(e) => warn!("Failed to reap {}: {}", self.command, e),
                }
                return Err(DocumentError::Timeout(self.timeout.as_secs()));
            }
            thread::sleep(POLL_INTERVAL);
        };

        if !status.success() {
            let log = fs::read_to_string(&stderr_log).unwrap_or_default();
            let last_line = log
                .lines()
                .rev()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .unwrap_or("");
            return Err(DocumentError::OcrFailed(format!("exit {}: {}", status, last_line)));
        }

        let text = fs::read_to_string(&sidecar)?;
        Ok(sidecar_conversion(&text))
    }
}

/// Split OCR sidecar output into pages
///
/// Every page ends with a form feed, so only the empty remainder after the
/// last one is dropped; blank pages inside the document still count.
fn sidecar_conversion(text: &str) -> Conversion {
    let mut pages: Vec<&str> = text.split(PAGE_BREAK).map(str::trim).collect();
    if pages.len() > 1 && pages.last() == Some(&"") {
        pages.pop();
    }
    let page_count = pages.len();
    let pages: Vec<&str> = pages.into_iter().filter(|p| !p.is_empty()).collect();

    Conversion {
        markdown: pages.join("\n\n---\n\n"),
        plain_text: pages.join("\n\n"),
        page_count: Some(page_count),
    }
}

impl ConversionBackend for OcrBackend {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn ocr_enabled(&self) -> bool {
        true
    }

    fn convert(&self, path: &Path) -> Result<Conversion, DocumentError> {
        if !path.exists() {
            return Err(DocumentError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )));
        }
        if file_type(path) == "pdf" {
            self.run_ocr(path)
        } else {
            self.native.convert(path)
        }
    }
}
