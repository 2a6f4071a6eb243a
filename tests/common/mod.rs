//! Common test utilities for scriptplan integration tests

// Not every helper is used by every test file
#![allow(dead_code)]

use anyhow::{Context, Result};
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub use scriptplan::test_utils::SITE_CATALOG_TOML;

/// A temporary project directory holding a `scriptplan.toml`.
pub struct TestProject {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl TestProject {
    /// Create an empty project directory.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new().context("Failed to create temp dir")?;
        let root = temp_dir.path().to_path_buf();
        Ok(Self {
            _temp_dir: temp_dir,
            root,
        })
    }

    /// Create a project whose catalog is the shared site fixture.
    pub fn with_site_catalog() -> Result<Self> {
        let project = Self::new()?;
        project.write_catalog(SITE_CATALOG_TOML)?;
        Ok(project)
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `scriptplan.toml`.
    pub fn write_catalog(&self, content: &str) -> Result<PathBuf> {
        self.write_file("scriptplan.toml", content)
    }

    /// Write any file relative to the project root.
    pub fn write_file(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// A `scriptplan` command running inside the project, with a clean environment.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("scriptplan").expect("binary is built for tests");
        cmd.current_dir(&self.root)
            .env_remove("RUST_LOG")
            .env_remove("SCRIPTPLAN_DEBUG")
            .env_remove("SCRIPTPLAN_RENDER_MODE")
            .env("NO_COLOR", "1");
        cmd
    }
}
