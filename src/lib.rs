//! OCR server that turns uploaded images into clean monochrome bitmaps
//! before handing them to Tesseract, with an optional revision pass over
//! the recognized text.

pub mod config;
pub mod error;
pub mod ocr;
pub mod revision;
pub mod server;
pub mod upload;
