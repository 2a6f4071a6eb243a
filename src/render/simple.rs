//! One `<script>` tag per resource, in load order.

use std::fmt::Write as _;

use super::paths::script_path;
use crate::config::Settings;
use crate::core::ResourceKind;
use crate::resolver::LoadPlan;

/// Render every chain group by group, root group first.
#[must_use]
pub fn render(plan: &LoadPlan, settings: &Settings) -> String {
    let mut out = String::new();
    for chain in plan.chains() {
        for group in chain.groups() {
            for resource in group.resources() {
                match &resource.kind {
                    ResourceKind::Inline {
                        body,
                    } => {
                        let _ = writeln!(out, "<script>\n(function() {{\n{body}\n}})();\n</script>");
                    }
                    kind @ ResourceKind::File { .. } => {
                        let path = script_path(kind, settings).unwrap_or_default();
                        let _ = writeln!(out, "<script src=\"{path}\"></script>");
                    }
                }
            }
        }
    }
    out
}
