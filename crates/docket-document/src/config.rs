//! Configuration for document extraction

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How much effort goes into table structure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableMode {
    /// Cells flattened to tab-separated lines
    #[default]
    Fast,
    /// Tables rendered as markdown tables with a header separator
    Accurate,
}

impl FromStr for TableMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(TableMode::Fast),
            "accurate" => Ok(TableMode::Accurate),
            other => Err(format!("unknown table mode '{}'", other)),
        }
    }
}

/// Compute device requested for OCR
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceleratorDevice {
    /// CPU only
    #[default]
    Cpu,
    /// NVIDIA GPU
    Cuda,
    /// Apple Metal
    Mps,
}

impl FromStr for AcceleratorDevice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(AcceleratorDevice::Cpu),
            "cuda" => Ok(AcceleratorDevice::Cuda),
            "mps" => Ok(AcceleratorDevice::Mps),
            other => Err(format!("unknown accelerator device '{}'", other)),
        }
    }
}

impl fmt::Display for AcceleratorDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AcceleratorDevice::Cpu => "cpu",
            AcceleratorDevice::Cuda => "cuda",
            AcceleratorDevice::Mps => "mps",
        })
    }
}

/// Configuration for the document extraction adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Run every document through OCR
    pub do_ocr: bool,

    /// Sample PDFs for a text layer and OCR the ones without one
    pub auto_ocr_detection: bool,

    /// Pages sampled by scan detection
    pub detection_sample_pages: usize,

    /// Below this many sampled characters a PDF counts as scanned
    pub detection_min_chars: usize,

    /// Table rendering mode
    pub table_mode: TableMode,

    /// Compute device for OCR
    pub accelerator_device: AcceleratorDevice,

    /// Worker threads for OCR
    pub accelerator_threads: usize,

    /// Maximum time for converting one document (seconds)
    pub document_timeout_secs: u64,

    /// OCR executable
    pub ocr_command: String,

    /// OCR language code(s), e.g. `eng` or `eng+deu`
    pub ocr_language: String,
}

impl DocumentConfig {
    /// Get the document timeout as a Duration
    pub fn document_timeout(&self) -> Duration {
        Duration::from_secs(self.document_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.detection_sample_pages == 0 {
            return Err("detection_sample_pages must be greater than 0".to_string());
        }
        if self.accelerator_threads == 0 {
            return Err("accelerator_threads must be greater than 0".to_string());
        }
        if self.document_timeout_secs == 0 {
            return Err("document_timeout_secs must be greater than 0".to_string());
        }
        if self.ocr_command.trim().is_empty() {
            return Err("ocr_command must not be empty".to_string());
        }
        if self.ocr_language.trim().is_empty() {
            return Err("ocr_language must not be empty".to_string());
        }
        Ok(())
    }

    /// Snapshot recorded in every document's metadata
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for DocumentConfig {
    /// Fast path by default, with scan detection deciding when OCR is needed
    fn default() -> Self {
        Self {
            do_ocr: false,
            auto_ocr_detection: true,
            detection_sample_pages: 3,
            detection_min_chars: 50,
            table_mode: TableMode::Fast,
            accelerator_device: AcceleratorDevice::Cpu,
            accelerator_threads: 4,
            document_timeout_secs: 300,
            ocr_command: "ocrmypdf".to_string(),
            ocr_language: "eng".to_string(),
        }
    }
}

impl DocumentConfig {
    /// Fast preset: never OCR, never sample
    pub fn fast() -> Self {
        Self {
            auto_ocr_detection: false,
            ..Self::default()
        }
    }

    /// Thorough preset: OCR everything with accurate tables and a longer timeout
    pub fn thorough() -> Self {
        Self {
            do_ocr: true,
            table_mode: TableMode::Accurate,
            document_timeout_secs: 900,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(DocumentConfig::default().validate().is_ok());
        assert!(DocumentConfig::fast().validate().is_ok());
        assert!(DocumentConfig::thorough().validate().is_ok());
    }

    #[test]
    fn test_default_detection_thresholds() {
        let config = DocumentConfig::default();
        assert!(!config.do_ocr);
        assert!(config.auto_ocr_detection);
        assert_eq!(config.detection_sample_pages, 3);
        assert_eq!(config.detection_min_chars, 50);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = DocumentConfig::default();
        config.document_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = DocumentConfig::default();
        config.ocr_command = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("Accurate".parse::<TableMode>(), Ok(TableMode::Accurate));
        assert_eq!("cuda".parse::<AcceleratorDevice>(), Ok(AcceleratorDevice::Cuda));
        assert!("gpu".parse::<AcceleratorDevice>().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = DocumentConfig::thorough();
        let toml_str = config.to_toml().unwrap();
        let parsed = DocumentConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = DocumentConfig::from_toml("do_ocr = true\n").unwrap();
        assert!(parsed.do_ocr);
        assert_eq!(parsed.ocr_command, "ocrmypdf");
    }

    #[test]
    fn test_snapshot_is_object() {
        let snapshot = DocumentConfig::default().snapshot();
        assert_eq!(snapshot["do_ocr"], serde_json::json!(false));
        assert_eq!(snapshot["table_mode"], serde_json::json!("fast"));
    }
}
