use crate::error::OcrError;
use image::GrayImage;
use serde::Serialize;

/// Tesseract `--oem`: which recognizer runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EngineMode {
    /// Legacy pattern-matching engine only
    Legacy,
    /// LSTM neural network only
    NeuralLstm,
    LegacyPlusLstm,
    /// Whatever the installed traineddata supports
    #[default]
    Default,
}

impl EngineMode {
    pub fn code(self) -> i32 {
        match self {
            EngineMode::Legacy => 0,
            EngineMode::NeuralLstm => 1,
            EngineMode::LegacyPlusLstm => 2,
            EngineMode::Default => 3,
        }
    }
}

/// Tesseract `--psm`: the layout assumption made about the page
///
/// Mode 2 (segmentation without OCR) is left out since Tesseract does not
/// implement it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentationMode {
    /// Orientation and script detection only
    OsdOnly,
    AutoWithOsd,
    /// Fully automatic page segmentation, no OSD
    #[default]
    AutoNoOsd,
    SingleColumn,
    SingleBlockVertical,
    SingleBlock,
    SingleLine,
    SingleWord,
    SingleWordCircle,
    SingleChar,
    /// As much text as possible, in no particular order
    SparseText,
    SparseTextOsd,
    /// Single text line, bypassing Tesseract-specific hacks
    RawLine,
}

impl SegmentationMode {
    pub fn code(self) -> i32 {
        match self {
            SegmentationMode::OsdOnly => 0,
            SegmentationMode::AutoWithOsd => 1,
            SegmentationMode::AutoNoOsd => 3,
            SegmentationMode::SingleColumn => 4,
            SegmentationMode::SingleBlockVertical => 5,
            SegmentationMode::SingleBlock => 6,
            SegmentationMode::SingleLine => 7,
            SegmentationMode::SingleWord => 8,
            SegmentationMode::SingleWordCircle => 9,
            SegmentationMode::SingleChar => 10,
            SegmentationMode::SparseText => 11,
            SegmentationMode::SparseTextOsd => 12,
            SegmentationMode::RawLine => 13,
        }
    }
}

/// Ordered, duplicate-free set of Tesseract language codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Languages(Vec<String>);

impl Languages {
    /// Parse a `+` or `,` separated list such as `eng+spa+hin`
    pub fn parse(raw: &str) -> Result<Self, OcrError> {
        let mut codes: Vec<String> = Vec::new();

        for code in raw.split(['+', ',']).map(str::trim).filter(|c| !c.is_empty()) {
            if !code.chars().all(|c| c.is_ascii_lowercase() || c == '_') {
                return Err(OcrError::InvalidConfiguration(format!(
                    "invalid language code '{}'",
                    code
                )));
            }
            if !codes.iter().any(|c| c == code) {
                codes.push(code.to_string());
            }
        }

        if codes.is_empty() {
            return Err(OcrError::InvalidConfiguration(
                "at least one OCR language is required".to_string(),
            ));
        }

        Ok(Self(codes))
    }

    pub fn codes(&self) -> &[String] {
        &self.0
    }

    /// Tesseract `-l` argument form
    pub fn joined(&self) -> String {
        self.0.join("+")
    }
}

/// Engine settings shared by every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OcrOptions {
    pub engine_mode: EngineMode,
    pub segmentation_mode: SegmentationMode,
    pub languages: Languages,
    /// Resolution hint for images without DPI metadata
    pub dpi: Option<u32>,
}

/// OCR processing result
#[derive(Debug, Clone)]
pub struct OcrResult {
    pub text: String,
}

/// Trait that all OCR engines must implement
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "tesseract")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Recognize text in an already normalized image
    fn recognize(&self, image: &GrayImage, options: &OcrOptions) -> Result<OcrResult, OcrError>;

    /// Get installed languages
    fn supported_languages(&self) -> Vec<String>;
}
