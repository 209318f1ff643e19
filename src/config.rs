use crate::error::OcrError;
use crate::ocr::engine::{EngineMode, Languages, OcrOptions, SegmentationMode};
use crate::ocr::preprocessing::{KernelSize, PipelineConfig, ThresholdPolicy};
use clap::{ArgAction, Parser, ValueEnum};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "scanocr-server")]
#[command(about = "OCR server that normalizes uploaded images before recognition")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "OCR_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "OCR_PORT", default_value = "9292")]
    pub port: u16,

    /// Maximum size of a single uploaded file in bytes (default: 5MB)
    #[arg(long, env = "OCR_MAX_FILE_SIZE", default_value = "5242880")]
    pub max_file_size: usize,

    /// Maximum number of files in one batch request
    #[arg(long, env = "OCR_MAX_BATCH_FILES", default_value = "10")]
    pub max_batch_files: usize,

    /// Tesseract languages, '+' or ',' separated (e.g. "eng+spa+hin")
    #[arg(long, env = "OCR_LANGUAGES", default_value = "eng")]
    pub languages: String,

    /// Tesseract engine mode (--oem)
    #[arg(long, env = "OCR_ENGINE_MODE", value_enum, default_value_t = EngineMode::Default)]
    pub engine_mode: EngineMode,

    /// Tesseract page segmentation mode (--psm)
    #[arg(long, env = "OCR_SEGMENTATION_MODE", value_enum, default_value_t = SegmentationMode::AutoNoOsd)]
    pub segmentation_mode: SegmentationMode,

    /// Resolution hint passed to Tesseract
    #[arg(long, env = "OCR_DPI")]
    pub dpi: Option<u32>,

    /// How the binarization threshold is chosen
    #[arg(long, env = "OCR_THRESHOLD_POLICY", value_enum, default_value_t = ThresholdPolicy::Otsu)]
    pub threshold_policy: ThresholdPolicy,

    /// Cutoff for the fixed threshold policy
    #[arg(long, env = "OCR_FIXED_THRESHOLD", default_value = "128")]
    pub fixed_threshold: u8,

    /// Gaussian blur kernel size (odd)
    #[arg(long, env = "OCR_BLUR_KERNEL_SIZE", default_value = "5")]
    pub blur_kernel_size: u32,

    /// Stretch intensities to the full range before blurring
    #[arg(long, env = "OCR_NORMALIZE", default_value_t = true, action = ArgAction::Set)]
    pub normalize: bool,

    /// Base URL of an OpenAI-compatible API used for text revision
    #[arg(long, env = "OCR_REVISION_URL")]
    pub revision_url: Option<String>,

    /// Model name sent to the revision API
    #[arg(long, env = "OCR_REVISION_MODEL", default_value = "gpt-4o-mini")]
    pub revision_model: String,

    /// Bearer token for the revision API
    #[arg(long, env = "OCR_REVISION_API_KEY", hide_env_values = true)]
    pub revision_api_key: Option<String>,

    /// Revision request timeout in seconds
    #[arg(long, env = "OCR_REVISION_TIMEOUT_SECS", default_value = "30")]
    pub revision_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "OCR_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Text revision endpoint settings
#[derive(Debug, Clone)]
pub struct RevisionConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Server configuration, validated once at startup and immutable afterwards
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
    pub max_batch_files: usize,
    pub pipeline: PipelineConfig,
    pub ocr: OcrOptions,
    pub revision: Option<RevisionConfig>,
}

/// Highest resolution Tesseract treats as credible
const MAX_DPI: u32 = 2400;

/// Room for multipart boundaries and headers on top of file bytes
const MULTIPART_OVERHEAD: usize = 64 * 1024;

impl Config {
    /// Body limit for single-file routes
    pub fn single_upload_body_limit(&self) -> usize {
        self.max_file_size.saturating_add(MULTIPART_OVERHEAD)
    }

    /// Body limit for the batch route
    pub fn batch_body_limit(&self) -> usize {
        self.max_file_size
            .saturating_mul(self.max_batch_files)
            .saturating_add(MULTIPART_OVERHEAD)
    }
}

impl TryFrom<Args> for Config {
    type Error = OcrError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        if args.max_file_size == 0 {
            return Err(OcrError::InvalidConfiguration(
                "max file size must be greater than zero".to_string(),
            ));
        }
        if args.max_batch_files == 0 {
            return Err(OcrError::InvalidConfiguration(
                "max batch files must be greater than zero".to_string(),
            ));
        }
        if let Some(dpi) = args.dpi {
            if dpi == 0 || dpi > MAX_DPI {
                return Err(OcrError::InvalidConfiguration(format!(
                    "dpi must be between 1 and {}, got {}",
                    MAX_DPI, dpi
                )));
            }
        }
        if args.revision_timeout_secs == 0 {
            return Err(OcrError::InvalidConfiguration(
                "revision timeout must be greater than zero".to_string(),
            ));
        }

        let pipeline = PipelineConfig {
            normalize: args.normalize,
            blur_kernel_size: KernelSize::new(args.blur_kernel_size)?,
            threshold_policy: args.threshold_policy,
            fixed_threshold: args.fixed_threshold,
        };

        let ocr = OcrOptions {
            engine_mode: args.engine_mode,
            segmentation_mode: args.segmentation_mode,
            languages: Languages::parse(&args.languages)?,
            dpi: args.dpi,
        };

        let revision = match args.revision_url {
            Some(url) if !url.trim().is_empty() => {
                let url = url.trim().to_string();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(OcrError::InvalidConfiguration(format!(
                        "revision url must be http(s), got '{}'",
                        url
                    )));
                }
                Some(RevisionConfig {
                    base_url: url,
                    model: args.revision_model,
                    api_key: args.revision_api_key.filter(|k| !k.is_empty()),
                    timeout: Duration::from_secs(args.revision_timeout_secs),
                })
            }
            _ => None,
        };

        Ok(Self {
            host: args.host,
            port: args.port,
            max_file_size: args.max_file_size,
            max_batch_files: args.max_batch_files,
            pipeline,
            ocr,
            revision,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Config, OcrError> {
        let argv = std::iter::once("scanocr-server").chain(extra.iter().copied());
        Config::try_from(Args::parse_from(argv))
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).unwrap();

        assert_eq!(config.max_file_size, 5 * 1024 * 1024);
        assert_eq!(config.pipeline.threshold_policy, ThresholdPolicy::Otsu);
        assert_eq!(config.pipeline.blur_kernel_size.get(), 5);
        assert_eq!(config.pipeline.fixed_threshold, 128);
        assert!(config.pipeline.normalize);
        assert_eq!(config.ocr.segmentation_mode, SegmentationMode::AutoNoOsd);
        assert_eq!(config.ocr.engine_mode, EngineMode::Default);
        assert_eq!(config.ocr.languages.joined(), "eng");
        assert!(config.revision.is_none());
    }

    #[test]
    fn test_even_blur_kernel_fails_at_startup() {
        let result = parse(&["--blur-kernel-size", "4"]);
        assert!(matches!(result, Err(OcrError::InvalidConfiguration(msg)) if msg.contains("odd")));
    }

    #[test]
    fn test_variant_settings_are_configurable() {
        let config = parse(&[
            "--threshold-policy",
            "fixed",
            "--fixed-threshold",
            "100",
            "--blur-kernel-size",
            "1",
            "--normalize",
            "false",
            "--engine-mode",
            "legacy-plus-lstm",
            "--segmentation-mode",
            "single-block",
            "--languages",
            "eng+spa+fra+hin+ben+tam+tel+pan+mar+iku",
        ])
        .unwrap();

        assert_eq!(config.pipeline.threshold_policy, ThresholdPolicy::Fixed);
        assert_eq!(config.pipeline.fixed_threshold, 100);
        assert_eq!(config.pipeline.blur_kernel_size.get(), 1);
        assert!(!config.pipeline.normalize);
        assert_eq!(config.ocr.engine_mode.code(), 2);
        assert_eq!(config.ocr.segmentation_mode.code(), 6);
        assert_eq!(config.ocr.languages.codes().len(), 10);
    }

    #[test]
    fn test_revision_requires_http_url() {
        assert!(matches!(
            parse(&["--revision-url", "ftp://models.local"]),
            Err(OcrError::InvalidConfiguration(_))
        ));

        let config = parse(&["--revision-url", "http://localhost:11434/v1"]).unwrap();
        let revision = config.revision.unwrap();
        assert_eq!(revision.base_url, "http://localhost:11434/v1");
        assert_eq!(revision.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        assert!(parse(&["--max-file-size", "0"]).is_err());
        assert!(parse(&["--max-batch-files", "0"]).is_err());
        assert!(parse(&["--dpi", "0"]).is_err());
    }

    #[test]
    fn test_dpi_is_bounded() {
        assert!(parse(&["--dpi", "300"]).is_ok());
        assert!(parse(&["--dpi", "2400"]).is_ok());
        assert!(matches!(
            parse(&["--dpi", "2401"]),
            Err(OcrError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            parse(&["--dpi", "4294967295"]),
            Err(OcrError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_zero_revision_timeout_is_rejected() {
        let result = parse(&[
            "--revision-url",
            "http://localhost:11434/v1",
            "--revision-timeout-secs",
            "0",
        ]);
        assert!(matches!(result, Err(OcrError::InvalidConfiguration(msg)) if msg.contains("timeout")));
    }

    #[test]
    fn test_body_limits_cover_uploads() {
        let config = parse(&["--max-file-size", "1000", "--max-batch-files", "3"]).unwrap();
        assert!(config.single_upload_body_limit() > 1000);
        assert!(config.batch_body_limit() > 3000);
    }
}
