//! Download URLs for stored files

use super::endpoints as ep;
use crate::config::normalize_base_url;
use crate::error::{AppError, Result};
use reqwest::Url;

/// Which download endpoint serves a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadKind {
    Material,
    Task,
    Submission,
}

impl DownloadKind {
    fn endpoint(self) -> &'static str {
        match self {
            DownloadKind::Material => ep::DOWNLOAD_MATERIAL_FILE,
            DownloadKind::Task => ep::DOWNLOAD_TASK_FILE,
            DownloadKind::Submission => ep::DOWNLOAD_SUBMISSION_FILE,
        }
    }
}

/// `<base>descargarArchivo<Kind>.php?id=<file id>`, with the id query-encoded
pub fn download_url(base_url: &str, kind: DownloadKind, file_id: &str) -> Result<String> {
    let mut url = Url::parse(&normalize_base_url(base_url))
        .and_then(|base| base.join(kind.endpoint()))
        .map_err(|e| AppError::Generic(format!("Invalid download URL: {}", e)))?;
    url.query_pairs_mut().append_pair("id", file_id.trim());
    Ok(url.into())
}

/// Resolve a stored path against the service.
///
/// Absolute URLs pass through. A leading `../` is dropped; paths that then
/// start with `api/` hang from the site root, everything else from the
/// API base.
pub fn absolute_url(base_url: &str, relative: &str) -> String {
    if relative.starts_with("http") {
        return relative.to_string();
    }

    let base = normalize_base_url(base_url);
    let root = match base.rfind("api/") {
        Some(pos) => &base[..pos],
        None => base.as_str(),
    };
    let clean = relative.strip_prefix("../").unwrap_or(relative);

    if clean.starts_with("api/") {
        format!("{}{}", root, clean)
    } else {
        format!("{}{}", base, clean)
    }
}
