//! Turning a [`LoadPlan`] into page markup.
//!
//! Two strategies are available, selected by [`RenderMode`]:
//!
//! - [`simple`]: one `<script>` tag per resource in load order. The browser
//!   fetches them one at a time, which is slow but easy to debug.
//! - [`async_loader`]: a `$LAB` loader chain. Every group is fetched in
//!   parallel and `.wait()` separates one group from the next.
//!
//! File paths go through [`paths::script_path`], so the debug flag and the
//! scripts folder apply the same way in both modes.

pub mod async_loader;
pub mod paths;
pub mod simple;

use anyhow::Result;

use crate::config::{RenderMode, Settings};
use crate::page::Page;
use crate::resolver::LoadPlan;
use crate::styles::render_links;

/// Renders plans under one set of settings.
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'s> {
    settings: &'s Settings,
}

impl<'s> Renderer<'s> {
    /// Create a renderer.
    #[must_use]
    pub fn new(settings: &'s Settings) -> Self {
        Self {
            settings,
        }
    }

    /// Render the script markup for `plan`. An empty plan renders nothing.
    #[must_use]
    pub fn render(&self, plan: &LoadPlan) -> String {
        if plan.is_empty() {
            return String::new();
        }
        match self.settings.render_mode {
            RenderMode::Simple => simple::render(plan, self.settings),
            RenderMode::Async => async_loader::render(plan, self.settings),
        }
    }

    /// Resolve and render a whole page: stylesheet links, then scripts.
    pub fn render_page(&self, page: &Page<'_>) -> Result<String> {
        let plan = page.plan(self.settings.conflict_policy)?;
        tracing::debug!(
            "Rendering {} chain(s), {} stylesheet(s) in {} mode",
            plan.len(),
            page.styles().len(),
            self.settings.render_mode
        );
        let mut out = render_links(page.styles(), self.settings);
        out.push_str(&self.render(&plan));
        Ok(out)
    }
}
