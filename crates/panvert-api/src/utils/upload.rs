//! Common utilities for upload handlers

const MAX_DISPLAY_NAME_CHARS: usize = 255;
const MAX_EXTENSION_CHARS: usize = 16;
const FALLBACK_DISPLAY_NAME: &str = "upload";

/// Clean a client-supplied filename for display.
///
/// The result is only ever shown back to the client; staged files are named
/// by the service. Directory components, control characters and `..`
/// sequences are removed and the length is capped.
pub fn sanitize_display_name(raw: &str) -> String {
    let last_component = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    let mut name: String = last_component
        .chars()
        .filter(|c| !c.is_control())
        .collect();
    while name.contains("..") {
        name = name.replace("..", ".");
    }

    let name: String = name.trim().chars().take(MAX_DISPLAY_NAME_CHARS).collect();
    if name.is_empty() || name == "." {
        FALLBACK_DISPLAY_NAME.to_string()
    } else {
        name
    }
}

/// Extension for the staged copy of `name`: lower-case ASCII alphanumerics,
/// at most 16 characters. `None` when the name has no usable extension.
pub fn sanitize_extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }

    let ext: String = ext
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .take(MAX_EXTENSION_CHARS)
        .collect();

    (!ext.is_empty()).then_some(ext)
}
