use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::error::AppError;

const MIN_TOC_DEPTH: u8 = 1;
const MAX_TOC_DEPTH: u8 = 6;

/// Table-of-contents depth, always within 1..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "u8", into = "u8")]
pub struct TocDepth(u8);

impl TocDepth {
    pub fn new(depth: u8) -> Result<Self, AppError> {
        if (MIN_TOC_DEPTH..=MAX_TOC_DEPTH).contains(&depth) {
            Ok(TocDepth(depth))
        } else {
            Err(AppError::Validation(format!(
                "tocDepth must be between {} and {}, got {}",
                MIN_TOC_DEPTH, MAX_TOC_DEPTH, depth
            )))
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        let depth = value.trim().parse::<u8>().map_err(|_| {
            AppError::Validation(format!("tocDepth must be an integer, got '{}'", value))
        })?;
        Self::new(depth)
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for TocDepth {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        TocDepth::new(value)
    }
}

impl From<TocDepth> for u8 {
    fn from(depth: TocDepth) -> u8 {
        depth.0
    }
}

/// Where footnote-style references are placed in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceLocation {
    Document,
    Section,
    Block,
}

impl ReferenceLocation {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "document" => Ok(ReferenceLocation::Document),
            "section" => Ok(ReferenceLocation::Section),
            "block" => Ok(ReferenceLocation::Block),
            other => Err(AppError::Validation(format!(
                "referenceLocation must be one of document, section, block; got '{}'",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceLocation::Document => "document",
            ReferenceLocation::Section => "section",
            ReferenceLocation::Block => "block",
        }
    }
}

impl fmt::Display for ReferenceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placement of figure and table captions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CaptionPosition {
    Above,
    Below,
}

impl CaptionPosition {
    pub fn parse(field: &str, value: &str) -> Result<Self, AppError> {
        match value {
            "above" => Ok(CaptionPosition::Above),
            "below" => Ok(CaptionPosition::Below),
            other => Err(AppError::Validation(format!(
                "{} must be one of above, below; got '{}'",
                field, other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaptionPosition::Above => "above",
            CaptionPosition::Below => "below",
        }
    }
}

impl fmt::Display for CaptionPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converter switches chosen by the client.
///
/// Both request shapes build this from their own source of named string
/// values (query parameters for the synchronous endpoint, form fields for the
/// upload endpoint) through [`ConversionOptions::from_fields`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOptions {
    pub toc: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<u8>)]
    pub toc_depth: Option<TocDepth>,
    pub number_sections: bool,
    pub embed_resources: bool,
    pub no_yaml: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_location: Option<ReferenceLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub figure_caption_position: Option<CaptionPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_caption_position: Option<CaptionPosition>,
}

/// Only the literal string `true` enables a switch.
fn flag(value: Option<&str>) -> bool {
    value == Some("true")
}

/// Empty strings are treated as absent.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl ConversionOptions {
    /// Build options from a named-value lookup, rejecting out-of-range values.
    pub fn from_fields<'a, F>(get: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let toc_depth = non_empty(get("tocDepth"))
            .map(TocDepth::parse)
            .transpose()?;
        let reference_location = non_empty(get("referenceLocation"))
            .map(ReferenceLocation::parse)
            .transpose()?;
        let figure_caption_position = non_empty(get("figureCaptionPosition"))
            .map(|v| CaptionPosition::parse("figureCaptionPosition", v))
            .transpose()?;
        let table_caption_position = non_empty(get("tableCaptionPosition"))
            .map(|v| CaptionPosition::parse("tableCaptionPosition", v))
            .transpose()?;

        Ok(Self {
            toc: flag(get("toc")),
            toc_depth,
            number_sections: flag(get("numberSections")),
            embed_resources: flag(get("embedResources")),
            no_yaml: flag(get("noYaml")),
            reference_location,
            figure_caption_position,
            table_caption_position,
        })
    }
}
