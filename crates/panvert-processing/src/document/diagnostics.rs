//! Converter diagnostics shown to clients

use std::path::Path;

/// Upper bound on diagnostic text returned to clients.
pub const MAX_DIAGNOSTIC_BYTES: usize = 8 * 1024;

const YAML_HINT: &str = "\n\nTip: Try enabling 'Disable YAML Metadata' option (noYaml=true) \
if your file has problematic frontmatter.";

/// Strip host paths and bound the size of converter stderr.
///
/// Every occurrence of `staging_dir` (with its trailing separator) is removed,
/// so messages name staged files by their random file name only.
pub fn sanitize_diagnostic(raw: &str, staging_dir: &Path) -> String {
    let mut text = raw.to_string();

    let mut prefixes = vec![staging_dir.to_path_buf()];
    if let Ok(canonical) = staging_dir.canonicalize() {
        if canonical != staging_dir {
            prefixes.push(canonical);
        }
    }
    for prefix in prefixes {
        let prefix = prefix.to_string_lossy();
        if prefix.is_empty() {
            continue;
        }
        let with_sep = format!("{}{}", prefix.trim_end_matches('/'), '/');
        text = text.replace(&with_sep, "");
    }

    let text = text.trim();
    if text.len() <= MAX_DIAGNOSTIC_BYTES {
        return text.to_string();
    }

    let mut cut = MAX_DIAGNOSTIC_BYTES;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}\n... (truncated)", &text[..cut])
}

/// Append a hint about disabling YAML metadata when the converter choked on
/// front matter and the option was not already in use.
pub fn metadata_hint(diagnostic: &str, no_yaml: bool) -> String {
    if !no_yaml && diagnostic.contains("YAML") {
        format!("{}{}", diagnostic, YAML_HINT)
    } else {
        diagnostic.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_dir_is_stripped() {
        let raw = "Could not find file /srv/uploads/1b2c.png\nreferenced from /srv/uploads/abc.md";
        let clean = sanitize_diagnostic(raw, Path::new("/srv/uploads"));
        assert_eq!(clean, "Could not find file 1b2c.png\nreferenced from abc.md");

        let clean = sanitize_diagnostic(raw, Path::new("/srv/uploads/"));
        assert!(!clean.contains("/srv/uploads"));
    }

    #[test]
    fn test_long_output_is_truncated_on_char_boundary() {
        let raw = "é".repeat(MAX_DIAGNOSTIC_BYTES);
        let clean = sanitize_diagnostic(&raw, Path::new("/nowhere"));
        assert!(clean.ends_with("... (truncated)"));
        assert!(clean.len() <= MAX_DIAGNOSTIC_BYTES + "\n... (truncated)".len());
    }

    #[test]
    fn test_yaml_hint() {
        let hinted = metadata_hint("Error parsing YAML metadata at line 3", false);
        assert!(hinted.contains("noYaml=true"));

        let unchanged = metadata_hint("Error parsing YAML metadata at line 3", true);
        assert!(!unchanged.contains("noYaml=true"));

        assert_eq!(metadata_hint("Unknown reader", false), "Unknown reader");
    }
}
