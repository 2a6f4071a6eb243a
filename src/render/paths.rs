//! Web path resolution for scripts, stylesheets and the loader library.

use crate::config::Settings;
use crate::core::ResourceKind;

/// Prefix `folder` onto `path` unless it is already rooted or a URL.
///
/// `http://`, `https://`, protocol-relative `//host/...` and `/abs/...` paths
/// are returned unchanged.
#[must_use]
pub fn resolve_web_path(path: &str, folder: &str) -> String {
    if path.starts_with("http") || path.starts_with('/') {
        path.to_string()
    } else {
        format!("{folder}{path}")
    }
}

/// The web path of a file script under `settings`, or `None` for inline blocks.
#[must_use]
pub fn script_path(kind: &ResourceKind, settings: &Settings) -> Option<String> {
    match kind {
        ResourceKind::File {
            debug_path,
            min_path,
        } => {
            let path = if settings.debug {
                debug_path
            } else {
                min_path
            };
            Some(resolve_web_path(path, &settings.scripts_folder))
        }
        ResourceKind::Inline { .. } => None,
    }
}

/// The loader library path, with the scripts folder applied.
#[must_use]
pub fn loader_path(settings: &Settings) -> String {
    resolve_web_path(settings.loader_path(), &settings.scripts_folder)
}
