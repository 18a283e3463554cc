//! Error helper functions for creating actionable error messages

use std::io;
use std::path::Path;

/// Check if an IO error is a permission denied error
pub fn is_permission_denied(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
}

/// Check if an IO error is a "not found" error
pub fn is_not_found(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

/// Non-UTF-8 content surfaces as `InvalidData` from `read_to_string`
pub fn is_invalid_encoding(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::InvalidData
}

/// Create an enhanced error message for file permission issues
pub fn permission_error(path: &Path, operation: &str) -> String {
    let parent_dir = path
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ".".to_string());

    format!(
        "Permission denied when {} '{}'\n\n\
         Possible fixes:\n\
         1. Check file permissions: ls -l '{}'\n\
         2. Ensure write access with: chmod u+w '{}'\n\
         3. The directory '{}' must be writable for the replacement file",
        operation,
        path.display(),
        path.display(),
        path.display(),
        parent_dir
    )
}

/// Create an enhanced error message for file not found issues
pub fn not_found_error(path: &Path, context: &str) -> String {
    format!(
        "File not found: '{}'\n\n\
         Context: {}\n\n\
         Possible fixes:\n\
         1. Check the file path is correct\n\
         2. Use an absolute path if the relative path is ambiguous\n\
         3. Set [target] path in the config file or pass FILE explicitly",
        path.display(),
        context,
    )
}

pub fn encoding_error(path: &Path) -> String {
    format!(
        "File is not valid UTF-8: '{}'\n\n\
         Only UTF-8 text files can be patched. The file was left untouched.",
        path.display()
    )
}

/// Pick the most helpful message for a failed read or write of `path`
pub fn describe_io_error(path: &Path, operation: &str, err: &io::Error) -> String {
    if is_not_found(err) {
        not_found_error(path, operation)
    } else if is_permission_denied(err) {
        permission_error(path, operation)
    } else if is_invalid_encoding(err) {
        encoding_error(path)
    } else {
        format!("Failed {} '{}': {}", operation, path.display(), err)
    }
}
