//! Test utilities for scriptplan
//!
//! Shared fixtures for unit and integration tests: a one-time logging setup
//! and catalogs that reproduce common site layouts.
//!
//! # Example
//!
//! ```rust,no_run
//! use scriptplan::resolver::PlanResolver;
//! use scriptplan::test_utils::{init_test_logging, site_catalog};
//!
//! init_test_logging(None);
//! let catalog = site_catalog();
//! let plan = PlanResolver::new(&catalog).resolve(&["loggedin".to_string()]).unwrap();
//! assert_eq!(plan.len(), 1);
//! ```

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::catalog::{Catalog, CatalogManifest};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` if given, otherwise `RUST_LOG`. Does nothing when neither is
/// set. Safe to call from every test.
///
/// ```bash
/// RUST_LOG=scriptplan=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Catalog TOML for a small site.
///
/// ```text
/// jquery ◄── site ◄── loggedin ◄── shipmenttotals
///   ▲          ▲
///   └──────────┴───── rsswidget
/// analytics, fonts   (no dependencies)
/// ```
pub const SITE_CATALOG_TOML: &str = r#"
[scripts.jquery]
debug = "jquery.js"
min = "https://cdn.example/jquery.min.js"

[scripts.site]
debug = "site.js"
min = "site.min.js"
deps = ["jquery"]

[scripts.loggedin]
debug = "loggedin.js"
min = "loggedin.min.js"
deps = ["site"]

[scripts.shipmenttotals]
debug = "shipmenttotals.js"
min = "shipmenttotals.min.js"
deps = ["loggedin"]

[scripts.rsswidget]
debug = "rsswidget.js"
min = "rsswidget.min.js"
deps = ["jquery", "site"]

[scripts.analytics]
debug = "analytics.js"

[scripts.fonts]
debug = "fonts.js"

[styles.main]
debug = "main.css"
min = "main.min.css"
"#;

/// The manifest parsed from [`SITE_CATALOG_TOML`].
#[must_use]
pub fn site_manifest() -> CatalogManifest {
    CatalogManifest::from_toml_str(SITE_CATALOG_TOML, "site.toml")
        .expect("fixture catalog must parse")
}

/// The script catalog of [`site_manifest`].
#[must_use]
pub fn site_catalog() -> Catalog {
    site_manifest().scripts
}

/// Build a catalog from `(name, "dep, dep")` pairs. Paths are `<name>.js`.
#[must_use]
pub fn catalog_from(entries: &[(&str, &str)]) -> Catalog {
    let mut catalog = Catalog::new();
    for (name, deps) in entries {
        catalog
            .add_file(name, &format!("{name}.js"), &format!("{name}.min.js"), deps)
            .expect("fixture names must be unique");
    }
    catalog
}
