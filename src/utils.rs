// src/utils.rs
use anyhow::Result;

/// Turn an origin like `http://localhost:5000` into a file-system safe name.
/// The scheme is kept, so `http://h` and `https://h` stay distinct.
pub fn normalize_origin(origin: &str) -> String {
    let trimmed = origin.trim().trim_end_matches('/');
    let flattened = match trimmed.split_once("://") {
        Some((scheme, rest)) => format!("{}_{}", scheme, rest),
        None => trimmed.to_string(),
    };

    flattened
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Get file extension in lowercase
pub fn get_file_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// MIME type for a resume file name.
pub fn content_type_for(file_name: &str) -> Result<&'static str> {
    match get_file_extension(file_name).as_deref() {
        Some("pdf") => Ok("application/pdf"),
        Some("docx") => {
            Ok("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        _ => anyhow::bail!("Unsupported file format: {}", file_name),
    }
}

/// First `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_for_log(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Join a base URL and an endpoint path without doubling the slash.
pub fn join_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}
