// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Photo files as base64 data URLs, the form the API accepts

use base64::{engine::general_purpose, Engine as _};
use std::path::Path;

use crate::{Result, SecondLookError};

/// MIME type for an image path, by extension
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => return None,
    };
    Some(mime)
}

/// Read an image file and encode it as `data:<mime>;base64,...`
pub fn encode_file(path: &Path) -> Result<String> {
    let mime = mime_for_path(path).ok_or_else(|| {
        SecondLookError::InvalidRequest(format!("Unsupported photo format: {}", path.display()))
    })?;
    let data = std::fs::read(path)?;
    Ok(format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(&data)))
}

/// Whether a string looks like an inline base64 image
pub fn is_image_data_url(value: &str) -> bool {
    value
        .strip_prefix("data:image/")
        .and_then(|rest| rest.split_once(";base64,"))
        .is_some_and(|(_, payload)| !payload.is_empty())
}
