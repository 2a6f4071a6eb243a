//! Loading the catalog from `scriptplan.toml`.
//!
//! ```toml
//! [settings]
//! scripts-folder = "/ui/"
//!
//! [scripts.jquery]
//! debug = "jquery.js"
//! min = "https://cdn.example/jquery.min.js"
//!
//! [scripts.site]
//! debug = "site.js"
//! min = "site.min.js"
//! deps = ["jquery"]
//!
//! [scripts.widgets]
//! debug = "widgets.js"
//! deps = "jquery, site"        # comma shorthand is accepted too
//!
//! [scripts.boot]
//! inline = "init();"
//! deps = ["site"]
//!
//! [styles.main]
//! debug = "main.css"
//! min = "main.min.css"
//! ```
//!
//! `min` defaults to `debug`. An entry must set exactly one of `debug` and
//! `inline`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{CATALOG_FILE_NAME, Catalog};
use crate::config::Settings;
use crate::core::{PlanError, Resource, split_dependency_list};
use crate::styles::{StyleCatalog, Stylesheet};

/// Everything declared in one catalog file.
#[derive(Debug, Clone, Default)]
pub struct CatalogManifest {
    /// `[settings]` table.
    pub settings: Settings,
    /// `[scripts.*]` entries.
    pub scripts: Catalog,
    /// `[styles.*]` entries.
    pub styles: StyleCatalog,
    /// Directory containing the file, when loaded from disk.
    pub manifest_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    settings: Settings,
    #[serde(default)]
    scripts: BTreeMap<String, RawScript>,
    #[serde(default)]
    styles: BTreeMap<String, RawStyle>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScript {
    debug: Option<String>,
    min: Option<String>,
    inline: Option<String>,
    #[serde(default)]
    deps: RawDeps,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStyle {
    debug: String,
    min: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDeps {
    List(Vec<String>),
    Shorthand(String),
}

impl Default for RawDeps {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl RawDeps {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::List(list) => list,
            Self::Shorthand(text) => split_dependency_list(&text),
        }
    }
}

impl RawScript {
    fn into_resource(self, name: String) -> Result<Resource, PlanError> {
        let deps = self.deps.into_vec();
        match (self.debug, self.inline) {
            (Some(debug), None) => {
                let min = self.min.unwrap_or_else(|| debug.clone());
                Ok(Resource::file(name, debug, min, deps))
            }
            (None, Some(body)) => {
                if self.min.is_some() {
                    return Err(PlanError::InvalidResource {
                        name,
                        reason: "inline scripts cannot have a `min` path".to_string(),
                    });
                }
                Ok(Resource::inline(name, body, deps))
            }
            (Some(_), Some(_)) => Err(PlanError::InvalidResource {
                name,
                reason: "set either `debug` or `inline`, not both".to_string(),
            }),
            (None, None) => Err(PlanError::InvalidResource {
                name,
                reason: "missing `debug` path or `inline` body".to_string(),
            }),
        }
    }
}

impl CatalogManifest {
    /// Load and parse a catalog file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;

        let mut manifest = Self::from_toml_str(&content, &path.display().to_string())?;
        manifest.manifest_dir = path.parent().map(Path::to_path_buf);
        tracing::debug!(
            "Loaded catalog {} ({} scripts, {} styles)",
            path.display(),
            manifest.scripts.len(),
            manifest.styles.len()
        );
        Ok(manifest)
    }

    /// Parse catalog TOML. `file` is only used in error messages.
    pub fn from_toml_str(content: &str, file: &str) -> Result<Self> {
        let raw: RawManifest = toml::from_str(content).map_err(|e| PlanError::CatalogParseError {
            file: file.to_string(),
            reason: e.to_string(),
        })?;

        let mut scripts = Catalog::new();
        for (name, entry) in raw.scripts {
            scripts.add(entry.into_resource(name)?)?;
        }

        let mut styles = StyleCatalog::new();
        for (name, entry) in raw.styles {
            let min = entry.min.unwrap_or_else(|| entry.debug.clone());
            styles.add(Stylesheet::new(name, entry.debug, min))?;
        }

        Ok(Self {
            settings: raw.settings,
            scripts,
            styles,
            manifest_dir: None,
        })
    }
}

/// Find `scriptplan.toml` in the current directory or any parent.
pub fn find_catalog() -> Result<PathBuf> {
    let current = std::env::current_dir().context("Cannot determine current working directory")?;
    find_catalog_from(current)
}

/// Use `explicit_path` if given, otherwise search upward from the current directory.
pub fn find_catalog_with_optional(explicit_path: Option<PathBuf>) -> Result<PathBuf> {
    match explicit_path {
        Some(path) => {
            if path.exists() {
                Ok(path)
            } else {
                Err(PlanError::CatalogNotFound).with_context(|| {
                    format!("Catalog file does not exist: {}", path.display())
                })
            }
        }
        None => find_catalog(),
    }
}

/// Search for the catalog starting at `current` and walking up to the root.
pub fn find_catalog_from(mut current: PathBuf) -> Result<PathBuf> {
    loop {
        let candidate = current.join(CATALOG_FILE_NAME);
        if candidate.exists() {
            return Ok(candidate);
        }

        if !current.pop() {
            return Err(PlanError::CatalogNotFound.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderMode;
    use crate::core::{ResourceKind, ResourceLookup};
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[settings]
scripts-folder = "/ui/"
render-mode = "simple"

[scripts.jquery]
debug = "jquery.js"
min = "https://cdn.example/jquery.min.js"

[scripts.site]
debug = "site.js"
deps = ["jquery"]

[scripts.widgets]
debug = "widgets.js"
deps = "jquery, site"

[scripts.boot]
inline = "init();"
deps = ["widgets"]

[styles.main]
debug = "main.css"
min = "main.min.css"
"#;

    #[test]
    fn test_parse_sample() {
        let manifest = CatalogManifest::from_toml_str(SAMPLE, "sample.toml").unwrap();
        assert_eq!(manifest.settings.scripts_folder, "/ui/");
        assert_eq!(manifest.settings.render_mode, RenderMode::Simple);
        assert_eq!(manifest.scripts.len(), 4);
        assert_eq!(manifest.styles.len(), 1);

        let site = manifest.scripts.lookup("site").unwrap();
        assert_eq!(
            site.kind,
            ResourceKind::File {
                debug_path: "site.js".into(),
                min_path: "site.js".into()
            }
        );

        let widgets = manifest.scripts.lookup("widgets").unwrap();
        assert_eq!(widgets.dependencies, vec!["jquery", "site"]);

        assert!(manifest.scripts.lookup("boot").unwrap().is_inline());
        assert!(manifest.scripts.validate().is_ok());
    }

    #[test]
    fn test_entry_without_path_or_body() {
        let err = CatalogManifest::from_toml_str("[scripts.broken]\ndeps = []\n", "x.toml")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlanError>(),
            Some(PlanError::InvalidResource { name, .. }) if name == "broken"
        ));
    }

    #[test]
    fn test_entry_with_both_path_and_body() {
        let err = CatalogManifest::from_toml_str(
            "[scripts.both]\ndebug = \"a.js\"\ninline = \"x();\"\n",
            "x.toml",
        )
        .unwrap_err();
        assert!(err.to_string().contains("not both"));
    }

    #[test]
    fn test_syntax_error() {
        let err = CatalogManifest::from_toml_str("[scripts.site\n", "bad.toml").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlanError>(),
            Some(PlanError::CatalogParseError { file, .. }) if file == "bad.toml"
        ));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = CatalogManifest::from_toml_str(
            "[scripts.site]\ndebug = \"site.js\"\ndepends = [\"jquery\"]\n",
            "x.toml",
        )
        .unwrap_err();
        assert!(matches!(err.downcast_ref::<PlanError>(), Some(PlanError::CatalogParseError { .. })));
    }

    #[test]
    fn test_find_catalog_from_walks_up() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CATALOG_FILE_NAME), SAMPLE).unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_catalog_from(nested).unwrap();
        assert_eq!(found, temp.path().join(CATALOG_FILE_NAME));

        let manifest = CatalogManifest::load(&found).unwrap();
        assert_eq!(manifest.manifest_dir.as_deref(), Some(temp.path()));
    }

    #[test]
    fn test_find_catalog_with_missing_explicit_path() {
        let temp = TempDir::new().unwrap();
        let err = find_catalog_with_optional(Some(temp.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err.downcast_ref::<PlanError>(), Some(PlanError::CatalogNotFound)));
    }
}
