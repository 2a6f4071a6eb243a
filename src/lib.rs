//! scriptplan - dependency-aware load planning for page scripts
//!
//! A site declares its scripts once, each with the names of the scripts it
//! needs loaded first. A page then asks for the handful of scripts it uses, and
//! scriptplan works out the full set of prerequisites, the order they must load
//! in, and which of them can be fetched in parallel.
//!
//! # Architecture Overview
//!
//! ```text
//! scriptplan.toml ──► Catalog ──┐
//!                               ├──► PlanResolver ──► LoadPlan ──► Renderer ──► markup
//! page selection ───► Page ─────┘
//! ```
//!
//! Each requested script grows its own layered tree of prerequisites. Trees
//! that share a script are aligned and merged, so every script loads exactly
//! once. Each remaining tree becomes a [`resolver::LoadChain`]: a list of
//! groups in which every group waits for the previous one and everything inside
//! a group loads concurrently.
//!
//! # Core Modules
//!
//! - [`core`] - Resource definitions, the lookup seam and error types
//! - [`catalog`] - The resource registry and its TOML file format
//! - [`config`] - Settings shared by resolution and rendering
//! - [`page`] - Per-page selection of scripts and stylesheets
//! - [`resolver`] - Tree building, merging and load chain construction
//! - [`render`] - Simple `<script>` tags or a staged `$LAB` loader chain
//! - [`styles`] - Stylesheet links and inlining
//! - [`cli`] - The `scriptplan` command-line interface
//!
//! # Example
//!
//! ```rust
//! use scriptplan::catalog::Catalog;
//! use scriptplan::config::{RenderMode, Settings};
//! use scriptplan::page::Page;
//! use scriptplan::render::Renderer;
//! use scriptplan::styles::StyleCatalog;
//!
//! let mut catalog = Catalog::new();
//! catalog.add_file("jquery", "jquery.js", "jquery.min.js", "").unwrap();
//! catalog.add_file("site", "site.js", "site.min.js", "jquery").unwrap();
//! let styles = StyleCatalog::new();
//!
//! let mut page = Page::new(&catalog, &styles);
//! page.include("site").unwrap();
//! page.run_after("init();", "site");
//!
//! let settings = Settings { render_mode: RenderMode::Simple, ..Settings::default() };
//! let html = Renderer::new(&settings).render_page(&page).unwrap();
//! assert!(html.starts_with("<script src=\"/scripts/jquery.min.js\"></script>"));
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod core;
pub mod page;
pub mod render;
pub mod resolver;
pub mod styles;

// test_utils is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
