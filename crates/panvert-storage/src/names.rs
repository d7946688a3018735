use std::path::{Path, PathBuf};

use crate::traits::{StoreError, StoreResult};

/// Join a single file name onto `dir`, refusing anything that is not a plain
/// path component.
pub(crate) fn join_name(dir: &Path, name: &str) -> StoreResult<PathBuf> {
    let valid = !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0');
    if !valid {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(dir.join(name))
}
