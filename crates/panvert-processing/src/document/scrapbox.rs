//! Scrapbox export detection
//!
//! A Scrapbox project export is a JSON object with a `pages` array whose
//! entries carry `title` and `lines`. Such uploads are flagged instead of
//! being handed to the converter.

use std::path::Path;

pub async fn is_scrapbox_export(path: &Path, max_bytes: u64) -> bool {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if !is_json {
        return false;
    }

    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() <= max_bytes => {}
        _ => return false,
    }

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "Could not read input for Scrapbox detection");
            return false;
        }
    };

    looks_like_scrapbox(&bytes)
}

fn looks_like_scrapbox(bytes: &[u8]) -> bool {
    let value: serde_json::Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(_) => return false,
    };

    let pages = match value.get("pages").and_then(|p| p.as_array()) {
        Some(pages) if !pages.is_empty() => pages,
        _ => return false,
    };

    pages.iter().all(|page| {
        page.get("title").map(|t| t.is_string()).unwrap_or(false)
            && page.get("lines").map(|l| l.is_array()).unwrap_or(false)
    })
}
