/// Validates a flat upload filename (no directory components allowed).
///
/// Rejects control characters to prevent HTTP header injection (CRLF in
/// Content-Disposition) when the name is echoed back on download.
pub fn validate_flat_filename(filename: &str) -> Result<&str, &'static str> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err("Filename cannot be empty");
    }
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err("Invalid filename: control characters are not allowed");
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err("Invalid filename: path separators are not allowed");
    }
    if trimmed.starts_with('.') {
        return Err("Invalid filename: hidden files are not allowed");
    }
    if trimmed.chars().count() > 255 {
        return Err("Filename is too long");
    }

    Ok(trimmed)
}
