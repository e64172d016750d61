//! Descriptor validation and normalization.

use url::Url;
use uuid::Uuid;

use scriptwatch_shared::{FileDescriptor, Result, ScriptwatchError};

/// A descriptor that passed validation, with derived fields resolved.
#[derive(Debug, Clone)]
pub struct NormalizedFile {
    /// Parsed absolute URL.
    pub url: Url,
    /// Host component extracted from `url`.
    pub host: String,
    /// Priority narrowed into [1, 5].
    pub priority: u8,
    /// Parsed tenant identifier.
    pub company_id: Uuid,
}

/// Validate a raw descriptor and derive `host`.
///
/// The first violated constraint wins; no record may be created from a
/// descriptor that fails here.
pub fn validate(descriptor: &FileDescriptor) -> Result<NormalizedFile> {
    let url = Url::parse(&descriptor.url)
        .map_err(|e| ScriptwatchError::validation("url", format!("not an absolute URL: {e}")))?;

    // Suffix check is case-sensitive: `.JS` is not a JavaScript path.
    if !url.path().ends_with(".js") {
        return Err(ScriptwatchError::validation(
            "url",
            "must point to a JavaScript file (ending with .js)",
        ));
    }

    let host = url
        .host_str()
        .ok_or_else(|| ScriptwatchError::validation("url", "missing host component"))?
        .to_string();

    if !(1..=5).contains(&descriptor.priority) {
        return Err(ScriptwatchError::validation(
            "priority",
            format!("must be between 1 and 5, got {}", descriptor.priority),
        ));
    }

    let company_id = Uuid::parse_str(&descriptor.company_id)
        .map_err(|e| ScriptwatchError::validation("company_id", format!("not a valid UUID: {e}")))?;

    Ok(NormalizedFile {
        url,
        host,
        priority: descriptor.priority as u8,
        company_id,
    })
}
