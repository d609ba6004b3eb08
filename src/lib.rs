//! BookBridge - EPUB translation quoting and submission client.
//!
//! This library provides functionality for:
//! - Analyzing EPUB archives (metadata extraction and word counting)
//! - Quoting tiered translation prices from a configurable table
//! - Submitting books to a remote translation service

pub mod config;
pub mod console;
pub mod epub;
pub mod error;
pub mod pricing;
pub mod submission;
pub mod wordcount;

// Re-export commonly used types
pub use config::Config;
pub use console::Console;
pub use epub::{AnalysisResult, EpubAnalyzer};
pub use error::{AnalysisError, ConfigError, SubmissionError};
pub use pricing::{Price, PriceTable, PriceTier, SpeedMode, TranslationMode};
pub use submission::{SubmissionClient, SubmissionRequest};
