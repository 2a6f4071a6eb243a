//! Stylesheets.
//!
//! Stylesheets have no dependencies, so they bypass the resolver: a page lists
//! them in include order and they are rendered as `<link>` tags, or embedded
//! straight into the page as a `<style>` block when a file needs to be inlined.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Component, Path};
use std::sync::Arc;

use crate::config::Settings;
use crate::core::PlanError;
use crate::render::paths::resolve_web_path;

/// A stylesheet with debug and production paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stylesheet {
    /// Catalog name. Empty for page-local sheets included by path.
    pub name: String,
    /// Path used in debug mode.
    pub debug_path: String,
    /// Path used in production.
    pub min_path: String,
}

impl Stylesheet {
    /// Create a stylesheet.
    pub fn new(
        name: impl Into<String>,
        debug_path: impl Into<String>,
        min_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            debug_path: debug_path.into(),
            min_path: min_path.into(),
        }
    }

    /// Web path for the current settings, with the css folder applied.
    #[must_use]
    pub fn web_path(&self, settings: &Settings) -> String {
        let path = if settings.debug {
            &self.debug_path
        } else {
            &self.min_path
        };
        resolve_web_path(path, &settings.css_folder)
    }
}

/// Registry of named stylesheets.
#[derive(Debug, Clone, Default)]
pub struct StyleCatalog {
    styles: BTreeMap<String, Arc<Stylesheet>>,
}

impl StyleCatalog {
    /// Create an empty style catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stylesheet. Names must be unique.
    pub fn add(&mut self, style: Stylesheet) -> Result<Arc<Stylesheet>> {
        if self.styles.contains_key(&style.name) {
            return Err(PlanError::DuplicateDeclaration {
                name: style.name,
            }
            .into());
        }
        let style = Arc::new(style);
        self.styles.insert(style.name.clone(), Arc::clone(&style));
        Ok(style)
    }

    /// Look up a stylesheet by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Stylesheet>> {
        self.styles.get(name).cloned()
    }

    /// Number of registered stylesheets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Whether no stylesheets are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

/// Render one `<link>` tag per stylesheet, in the given order.
#[must_use]
pub fn render_links(styles: &[Arc<Stylesheet>], settings: &Settings) -> String {
    let mut out = String::new();
    for style in styles {
        let _ = writeln!(out, "<link href=\"{}\" rel=stylesheet />", style.web_path(settings));
    }
    out
}

/// Embed a stylesheet's file contents into the page.
///
/// The web path is mapped onto `web_root`, so `/content/main.css` is read from
/// `<web_root>/content/main.css`. URLs and paths that climb out of `web_root`
/// cannot be inlined.
pub fn render_inline(
    style: &Stylesheet,
    settings: &Settings,
    web_root: &Path,
    with_tags: bool,
) -> Result<String> {
    let web_path = style.web_path(settings);
    if web_path.starts_with("http") || web_path.starts_with("//") {
        return Err(PlanError::InvalidResource {
            name: style.name.clone(),
            reason: format!("remote stylesheet '{web_path}' cannot be inlined"),
        }
        .into());
    }

    let relative = Path::new(web_path.trim_start_matches('/'));
    if !relative.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir)) {
        return Err(PlanError::InvalidResource {
            name: style.name.clone(),
            reason: format!("stylesheet path '{web_path}' points outside the web root"),
        }
        .into());
    }

    let file_path = web_root.join(relative);
    let content = std::fs::read_to_string(&file_path)
        .with_context(|| format!("Failed to read stylesheet: {}", file_path.display()))?;

    let mut out = String::new();
    if with_tags {
        out.push_str("<style>\n");
    }
    for line in content.lines() {
        out.push_str(line);
        out.push('\n');
    }
    if with_tags {
        out.push_str("</style>\n");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sheet() -> Arc<Stylesheet> {
        Arc::new(Stylesheet::new("main", "main.css", "main.min.css"))
    }

    #[test]
    fn test_render_links_production() {
        let out = render_links(&[sheet()], &Settings::default());
        assert_eq!(out, "<link href=\"/content/main.min.css\" rel=stylesheet />\n");
    }

    #[test]
    fn test_render_links_keeps_absolute_and_remote_paths() {
        let settings = Settings {
            debug: true,
            ..Settings::default()
        };
        let styles = vec![
            Arc::new(Stylesheet::new("", "/abs/site.css", "/abs/site.css")),
            Arc::new(Stylesheet::new("cdn", "https://cdn.example/x.css", "x")),
        ];
        let out = render_links(&styles, &settings);
        assert!(out.contains("href=\"/abs/site.css\""));
        assert!(out.contains("href=\"https://cdn.example/x.css\""));
    }

    #[test]
    fn test_duplicate_style_rejected() {
        let mut catalog = StyleCatalog::new();
        catalog.add(Stylesheet::new("main", "a.css", "a.css")).unwrap();
        assert!(catalog.add(Stylesheet::new("main", "b.css", "b.css")).is_err());
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("main").is_some());
    }

    #[test]
    fn test_render_inline_reads_file() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("content")).unwrap();
        std::fs::write(temp.path().join("content/main.min.css"), "body { margin: 0 }\n").unwrap();

        let out = render_inline(&sheet(), &Settings::default(), temp.path(), true).unwrap();
        assert_eq!(out, "<style>\nbody { margin: 0 }\n</style>\n");

        let bare = render_inline(&sheet(), &Settings::default(), temp.path(), false).unwrap();
        assert_eq!(bare, "body { margin: 0 }\n");
    }

    #[test]
    fn test_render_inline_rejects_remote() {
        let temp = TempDir::new().unwrap();
        let remote = Stylesheet::new("cdn", "https://cdn.example/x.css", "https://cdn.example/x.css");
        assert!(render_inline(&remote, &Settings::default(), temp.path(), true).is_err());
    }

    #[test]
    fn test_render_inline_rejects_parent_dir() {
        let temp = TempDir::new().unwrap();
        let web_root = temp.path().join("site");
        std::fs::create_dir_all(&web_root).unwrap();
        std::fs::write(temp.path().join("secret.css"), "body {}\n").unwrap();

        let escaping = Stylesheet::new("escape", "/../secret.css", "/../secret.css");
        let err = render_inline(&escaping, &Settings::default(), &web_root, true).unwrap_err();
        assert!(err.to_string().contains("points outside the web root"));

        let nested = Stylesheet::new("nested", "css/../../secret.css", "css/../../secret.css");
        assert!(render_inline(&nested, &Settings::default(), &web_root, true).is_err());
    }
}
