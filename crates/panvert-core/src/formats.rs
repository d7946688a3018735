//! Format registry
//!
//! Static tables of the source and destination formats the converter is
//! allowed to be invoked with. Format names supplied by clients are only ever
//! passed to the converter after being resolved against these tables.

use serde::Serialize;

use crate::error::{AppError, FormatSide};

/// Destination formats that accept a `--reference-doc` style template.
const TEMPLATE_FORMATS: &[&str] = &["docx", "odt", "pptx"];

/// Destinations rendered through a PDF engine rather than a plain writer.
const FIXED_LAYOUT_FORMATS: &[&str] = &["pdf"];

/// Readers that understand the `yaml_metadata_block` extension.
const MARKDOWN_FAMILY: &[&str] = &["markdown", "gfm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceFormatInfo {
    pub id: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DestFormatInfo {
    pub id: &'static str,
    pub label: &'static str,
    /// File extension of the produced artifact, without the dot
    pub extension: &'static str,
    pub mime_type: &'static str,
}

pub static SOURCE_FORMATS: &[SourceFormatInfo] = &[
    SourceFormatInfo {
        id: "markdown",
        label: "Markdown (.md)",
    },
    SourceFormatInfo {
        id: "gfm",
        label: "GitHub-Flavored Markdown (.md)",
    },
    SourceFormatInfo {
        id: "html",
        label: "HTML (.html)",
    },
    SourceFormatInfo {
        id: "epub",
        label: "EPUB (.epub)",
    },
    SourceFormatInfo {
        id: "docx",
        label: "Microsoft Word (.docx)",
    },
    SourceFormatInfo {
        id: "latex",
        label: "LaTeX (.tex)",
    },
    SourceFormatInfo {
        id: "rst",
        label: "reStructuredText (.rst)",
    },
];

pub static DEST_FORMATS: &[DestFormatInfo] = &[
    DestFormatInfo {
        id: "pdf",
        label: "Adobe PDF (.pdf)",
        extension: "pdf",
        mime_type: "application/pdf",
    },
    DestFormatInfo {
        id: "html",
        label: "HTML (.html)",
        extension: "html",
        mime_type: "text/html",
    },
    DestFormatInfo {
        id: "gfm",
        label: "GitHub-Flavored Markdown (.md)",
        extension: "md",
        mime_type: "text/plain",
    },
    DestFormatInfo {
        id: "markdown",
        label: "Pandoc's Markdown (.md)",
        extension: "md",
        mime_type: "text/plain",
    },
    DestFormatInfo {
        id: "rst",
        label: "reStructuredText (.rst)",
        extension: "rst",
        mime_type: "text/plain",
    },
    DestFormatInfo {
        id: "rtf",
        label: "Rich Text Format (.rtf)",
        extension: "rtf",
        mime_type: "application/rtf",
    },
    DestFormatInfo {
        id: "docx",
        label: "Microsoft Word (.docx)",
        extension: "docx",
        mime_type: "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    },
    DestFormatInfo {
        id: "pptx",
        label: "Microsoft PowerPoint (.pptx)",
        extension: "pptx",
        mime_type: "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    },
];

pub fn is_valid_source(id: &str) -> bool {
    SOURCE_FORMATS.iter().any(|f| f.id == id)
}

pub fn is_valid_dest(id: &str) -> bool {
    DEST_FORMATS.iter().any(|f| f.id == id)
}

pub fn lookup_dest(id: &str) -> Option<&'static DestFormatInfo> {
    DEST_FORMATS.iter().find(|f| f.id == id)
}

/// A source format that has been checked against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFormat(&'static SourceFormatInfo);

impl SourceFormat {
    pub fn parse(id: &str) -> Result<Self, AppError> {
        SOURCE_FORMATS
            .iter()
            .find(|f| f.id == id)
            .map(SourceFormat)
            .ok_or_else(|| AppError::InvalidFormat {
                format: id.to_string(),
                side: FormatSide::Source,
            })
    }

    pub fn id(&self) -> &'static str {
        self.0.id
    }

    pub fn is_markdown_family(&self) -> bool {
        MARKDOWN_FAMILY.contains(&self.0.id)
    }
}

/// A destination format that has been checked against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestFormat(&'static DestFormatInfo);

impl DestFormat {
    pub fn parse(id: &str) -> Result<Self, AppError> {
        lookup_dest(id)
            .map(DestFormat)
            .ok_or_else(|| AppError::InvalidFormat {
                format: id.to_string(),
                side: FormatSide::Destination,
            })
    }

    pub fn id(&self) -> &'static str {
        self.0.id
    }

    pub fn info(&self) -> &'static DestFormatInfo {
        self.0
    }

    pub fn extension(&self) -> &'static str {
        self.0.extension
    }

    pub fn mime_type(&self) -> &'static str {
        self.0.mime_type
    }

    pub fn supports_template(&self) -> bool {
        TEMPLATE_FORMATS.contains(&self.0.id)
    }

    pub fn is_fixed_layout(&self) -> bool {
        FIXED_LAYOUT_FORMATS.contains(&self.0.id)
    }

    /// Name the artifact is offered under when downloaded.
    pub fn download_name(&self) -> String {
        format!("converted.{}", self.0.extension)
    }
}
