//! Document conversion module

pub mod args;
pub mod converter;
pub mod diagnostics;
pub mod scrapbox;

pub use args::{build_args, ConversionRequest};
pub use converter::{ConversionOutcome, DocumentConverter, PandocConverter};
pub use diagnostics::{metadata_hint, sanitize_diagnostic};
pub use scrapbox::is_scrapbox_export;
