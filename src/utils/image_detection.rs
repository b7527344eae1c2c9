use std::path::Path;

/// Extensions considered image files for copy detection, lowercase,
/// including the common camera raw formats.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff", "heic", "heif", // raw formats
    "arw", "cr2", "nef", "orf", "rw2", "dng",
];

/// Determines if a path carries a recognized image extension (case-insensitive).
///
/// Only such files are ever considered as copy candidates.
pub fn is_image_file(path: &Path) -> bool {
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        let ext_lower = extension.to_lowercase();
        IMAGE_EXTENSIONS.contains(&ext_lower.as_str())
    } else {
        false
    }
}

/// Formats a byte count into a human-readable string (e.g. "1.50 MB").
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let exponent = ((bytes as f64).log2() / 10.0).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    if exponent == 0 {
        format!("{} B", bytes)
    } else {
        let value = bytes as f64 / 1024f64.powi(exponent as i32);
        format!("{:.2} {}", value, UNITS[exponent])
    }
}
