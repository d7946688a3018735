//! Converter command-line construction

use panvert_core::{ConversionOptions, DestFormat, SourceFormat};
use std::ffi::OsString;
use std::path::PathBuf;

/// Everything needed to run one conversion.
///
/// Formats are registry-checked types and options are already validated, so
/// every value that reaches the command line comes from a fixed vocabulary
/// or is a path generated by the service.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    /// `None` lets the converter infer the reader from the input extension
    pub source: Option<SourceFormat>,
    pub dest: DestFormat,
    pub template: Option<PathBuf>,
    pub options: ConversionOptions,
}

/// Build the converter argument vector for `request`.
///
/// Order: input, reader, writer (or PDF settings), reference doc, toc,
/// numbering, resource embedding, reference/caption placement, output.
pub fn build_args(request: &ConversionRequest, pdf_engine: &str) -> Vec<OsString> {
    let options = &request.options;
    let mut args: Vec<OsString> = vec![request.input.clone().into_os_string()];

    if let Some(source) = request.source {
        let reader = if options.no_yaml && source.is_markdown_family() {
            format!("{}-yaml_metadata_block", source.id())
        } else {
            source.id().to_string()
        };
        args.push("-f".into());
        args.push(reader.into());
    }

    if request.dest.is_fixed_layout() {
        args.push("-V".into());
        args.push("geometry:margin=1in".into());
        args.push(format!("--pdf-engine={}", pdf_engine).into());
    } else {
        args.push("-t".into());
        args.push(request.dest.id().into());
    }

    if let Some(template) = &request.template {
        if request.dest.supports_template() {
            args.push("--reference-doc".into());
            args.push(template.clone().into_os_string());
        }
    }

    if options.toc {
        args.push("--toc".into());
        if let Some(depth) = options.toc_depth {
            args.push("--toc-depth".into());
            args.push(depth.get().to_string().into());
        }
    }

    if options.number_sections {
        args.push("--number-sections".into());
    }

    if options.embed_resources {
        args.push("--embed-resources".into());
        args.push("--standalone".into());
    }

    if let Some(location) = options.reference_location {
        args.push("--reference-location".into());
        args.push(location.as_str().into());
    }

    if let Some(position) = options.figure_caption_position {
        args.push("--figure-caption-position".into());
        args.push(position.as_str().into());
    }

    if let Some(position) = options.table_caption_position {
        args.push("--table-caption-position".into());
        args.push(position.as_str().into());
    }

    args.push("-o".into());
    args.push(request.output.clone().into_os_string());

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use panvert_core::{CaptionPosition, ReferenceLocation, TocDepth};

    fn request(from: Option<&str>, to: &str) -> ConversionRequest {
        ConversionRequest {
            input: PathBuf::from("/srv/uploads/in.md"),
            output: PathBuf::from("/srv/uploads/out"),
            source: from.map(|f| SourceFormat::parse(f).unwrap()),
            dest: DestFormat::parse(to).unwrap(),
            template: None,
            options: ConversionOptions::default(),
        }
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_minimal_html_conversion() {
        let args = strings(build_args(&request(Some("markdown"), "html"), "xelatex"));
        assert_eq!(
            args,
            vec![
                "/srv/uploads/in.md",
                "-f",
                "markdown",
                "-t",
                "html",
                "-o",
                "/srv/uploads/out"
            ]
        );
    }

    #[test]
    fn test_pdf_uses_engine_instead_of_writer() {
        let args = strings(build_args(&request(Some("gfm"), "pdf"), "lualatex"));
        assert!(!args.contains(&"-t".to_string()));
        let v = args.iter().position(|a| a == "-V").unwrap();
        assert_eq!(args[v + 1], "geometry:margin=1in");
        assert_eq!(args[v + 2], "--pdf-engine=lualatex");
    }

    #[test]
    fn test_reader_omitted_without_source_format() {
        let args = strings(build_args(&request(None, "rst"), "xelatex"));
        assert!(!args.contains(&"-f".to_string()));
        assert_eq!(args[1], "-t");
    }

    #[test]
    fn test_no_yaml_only_modifies_markdown_readers() {
        let mut req = request(Some("gfm"), "html");
        req.options.no_yaml = true;
        let args = strings(build_args(&req, "xelatex"));
        assert_eq!(args[2], "gfm-yaml_metadata_block");

        let mut req = request(Some("latex"), "html");
        req.options.no_yaml = true;
        let args = strings(build_args(&req, "xelatex"));
        assert_eq!(args[2], "latex");
    }

    #[test]
    fn test_reference_doc_only_for_template_formats() {
        for to in ["html", "pdf", "gfm", "rtf"] {
            let mut req = request(Some("markdown"), to);
            req.template = Some(PathBuf::from("/srv/uploads/tpl.docx"));
            let args = strings(build_args(&req, "xelatex"));
            assert!(
                !args.contains(&"--reference-doc".to_string()),
                "reference doc passed for {}",
                to
            );
        }

        let mut req = request(Some("markdown"), "docx");
        req.template = Some(PathBuf::from("/srv/uploads/tpl.docx"));
        let args = strings(build_args(&req, "xelatex"));
        let pos = args.iter().position(|a| a == "--reference-doc").unwrap();
        assert_eq!(args[pos + 1], "/srv/uploads/tpl.docx");
    }

    #[test]
    fn test_toc_depth_requires_toc() {
        let mut req = request(Some("markdown"), "html");
        req.options.toc_depth = Some(TocDepth::new(2).unwrap());
        let args = strings(build_args(&req, "xelatex"));
        assert!(!args.contains(&"--toc-depth".to_string()));

        req.options.toc = true;
        let args = strings(build_args(&req, "xelatex"));
        let pos = args.iter().position(|a| a == "--toc").unwrap();
        assert_eq!(args[pos + 1], "--toc-depth");
        assert_eq!(args[pos + 2], "2");
    }

    #[test]
    fn test_full_option_order() {
        let mut req = request(Some("markdown"), "docx");
        req.template = Some(PathBuf::from("tpl.docx"));
        req.options = ConversionOptions {
            toc: true,
            toc_depth: Some(TocDepth::new(3).unwrap()),
            number_sections: true,
            embed_resources: true,
            no_yaml: true,
            reference_location: Some(ReferenceLocation::Block),
            figure_caption_position: Some(CaptionPosition::Above),
            table_caption_position: Some(CaptionPosition::Below),
        };
        let args = strings(build_args(&req, "xelatex"));
        assert_eq!(
            args,
            vec![
                "/srv/uploads/in.md",
                "-f",
                "markdown-yaml_metadata_block",
                "-t",
                "docx",
                "--reference-doc",
                "tpl.docx",
                "--toc",
                "--toc-depth",
                "3",
                "--number-sections",
                "--embed-resources",
                "--standalone",
                "--reference-location",
                "block",
                "--figure-caption-position",
                "above",
                "--table-caption-position",
                "below",
                "-o",
                "/srv/uploads/out"
            ]
        );
    }
}
