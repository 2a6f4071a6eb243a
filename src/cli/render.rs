//! Print the markup that loads a set of scripts.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::common::{SelectionArgs, load_manifest};
use crate::config::RenderMode;
use crate::render::Renderer;
use crate::styles::render_inline;

/// Arguments of the `render` command.
#[derive(Args, Debug)]
pub struct RenderCommand {
    #[command(flatten)]
    selection: SelectionArgs,

    /// Override the catalog's render mode
    #[arg(long, value_enum)]
    mode: Option<RenderMode>,

    /// Use debug paths
    #[arg(long)]
    debug: bool,

    /// Embed stylesheets as <style> blocks instead of linking them
    #[arg(long)]
    inline_css: bool,

    /// Directory that web paths are relative to when embedding stylesheets.
    /// Defaults to the catalog's directory.
    #[arg(long, value_name = "DIR")]
    web_root: Option<PathBuf>,
}

impl RenderCommand {
    /// Resolve and print the markup.
    pub fn execute(self, catalog_path: Option<PathBuf>) -> Result<()> {
        let manifest = load_manifest(catalog_path)?;
        let mut settings = manifest.settings.clone();
        if let Some(mode) = self.mode {
            settings.render_mode = mode;
        }
        if self.debug {
            settings.debug = true;
        }
        if let Some(policy) = self.selection.conflict_policy {
            settings.conflict_policy = policy;
        }

        let page = self.selection.build_page(&manifest)?;
        let renderer = Renderer::new(&settings);

        let out = if self.inline_css {
            let web_root = self
                .web_root
                .or_else(|| manifest.manifest_dir.clone())
                .unwrap_or_else(|| PathBuf::from("."));
            let mut out = String::new();
            for style in page.styles() {
                out.push_str(&render_inline(style, &settings, &web_root, true)?);
            }
            out.push_str(&renderer.render(&page.plan(settings.conflict_policy)?));
            out
        } else {
            renderer.render_page(&page)?
        };

        print!("{out}");
        Ok(())
    }
}
