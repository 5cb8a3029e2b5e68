//! Pre-upload file checks.
//!
//! Rejects files the scanning backend would refuse anyway, before any bytes
//! leave the client.

use mime::Mime;
use regex::RegexSet;
use std::sync::OnceLock;

use crate::errors::{ScanError, ScanOutcome};
use crate::upload::UploadFile;

/// Largest accepted file (50 MiB).
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Content types the backend screens.
pub const ALLOWED_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "image/jpeg",
    "image/png",
    "image/jpg",
];

/// Extensions accepted when the content type is missing or generic.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".jpg", ".jpeg", ".png",
];

fn suspicious_names() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| {
        RegexSet::new([
            r"(?i)\.exe$",
            r"(?i)\.bat$",
            r"(?i)\.cmd$",
            r"(?i)\.scr$",
            r"(?i)\.vbs$",
            r"(?i)\.js$",
        ])
        .unwrap_or_else(|_| RegexSet::empty())
    })
}

/// Checks size, type and name of a file before upload.
pub fn validate_file(file: &UploadFile) -> ScanOutcome<()> {
    let size = file.len();

    if size > MAX_FILE_SIZE {
        return Err(ScanError::validation(format!(
            "File size exceeds {}MB limit. Please upload a smaller file.",
            MAX_FILE_SIZE / (1024 * 1024)
        )));
    }

    if size == 0 {
        return Err(ScanError::validation(
            "File is empty. Please select a valid file.",
        ));
    }

    let name = file.filename.to_lowercase();
    let type_allowed = ALLOWED_TYPES.contains(&file.content_type.as_str())
        || ALLOWED_EXTENSIONS.iter().any(|ext| name.ends_with(ext));
    if !type_allowed {
        return Err(ScanError::validation(format!(
            "File type not supported. Allowed types: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    if suspicious_names().is_match(&file.filename) {
        return Err(ScanError::validation(
            "File type not allowed for security reasons.",
        ));
    }

    Ok(())
}

/// Guesses the content type from the file extension.
pub fn detect_content_type(filename: &str) -> Mime {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    let essence = match ext.as_str() {
        "pdf" => return mime::APPLICATION_PDF,
        "jpg" | "jpeg" => return mime::IMAGE_JPEG,
        "png" => return mime::IMAGE_PNG,
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => return mime::APPLICATION_OCTET_STREAM,
    };

    essence.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

/// Formats a byte count with binary units, e.g. `1.5 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
