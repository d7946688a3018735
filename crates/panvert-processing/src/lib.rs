//! Panvert Processing Library
//!
//! Runs the external document converter: argument construction, process
//! execution with a time limit, diagnostic clean-up and input sniffing.

pub mod document;

pub use document::{
    build_args, is_scrapbox_export, metadata_hint, sanitize_diagnostic, ConversionOutcome,
    ConversionRequest, DocumentConverter, PandocConverter,
};
