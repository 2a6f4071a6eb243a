//! `$LAB` loader chains.
//!
//! Each [`LoadChain`] becomes one `$LAB` statement. Inline blocks in the root
//! group run immediately, before the loader starts. Every later group is
//! separated from the previous one by a `.wait(...)` clause, and that group's
//! inline blocks ride along inside the clause so they run once the previous
//! group has loaded:
//!
//! ```text
//! <script src=/scripts/LAB.min.js></script>
//! <script>
//! $LAB.setGlobalDefaults({AppendTo:'body'});
//! $LAB
//! .script('/scripts/jquery.min.js')
//! .wait()
//! .script('/scripts/site.min.js')
//! .wait(init);
//! </script>
//! ```

use regex::Regex;
use std::fmt::Write as _;
use std::sync::{Arc, OnceLock};

use super::paths::{loader_path, script_path};
use crate::config::Settings;
use crate::core::{Resource, ResourceKind};
use crate::resolver::{LoadChain, LoadGroup, LoadPlan};

/// A body that is nothing but a no-argument call, like `init();`.
fn bare_call() -> &'static Regex {
    static BARE_CALL: OnceLock<Regex> = OnceLock::new();
    BARE_CALL.get_or_init(|| Regex::new(r"^[\w\d_-]+\(\);?$").expect("valid regex"))
}

/// Render the loader tag and one `$LAB` chain per [`LoadChain`].
#[must_use]
pub fn render(plan: &LoadPlan, settings: &Settings) -> String {
    let loader = loader_path(settings);
    let mut out = String::new();
    if loader.contains(' ') {
        let _ = writeln!(out, "<script src=\"{loader}\"></script>");
    } else {
        let _ = writeln!(out, "<script src={loader}></script>");
    }
    out.push_str("<script>\n");
    out.push_str("$LAB.setGlobalDefaults({AppendTo:'body'});");

    for chain in plan.chains() {
        render_chain(&mut out, chain, settings);
    }

    out.push_str("</script>\n");
    out
}

fn render_chain(out: &mut String, chain: &LoadChain, settings: &Settings) {
    let mut groups = chain.groups();
    let Some(root) = groups.next() else {
        return;
    };

    for resource in root.inline_resources() {
        if let ResourceKind::Inline {
            body,
        } = &resource.kind
        {
            let _ = write!(out, "\n(function(){{\n{body}\n}})();");
        }
    }

    out.push_str("\n$LAB");
    push_script_calls(out, root, settings);

    for group in groups {
        out.push('\n');
        let inline: Vec<&Arc<Resource>> = group.inline_resources().collect();
        out.push_str(&wait_clause(&inline));
        push_script_calls(out, group, settings);
    }

    out.push_str(";\n");
}

fn push_script_calls(out: &mut String, group: &LoadGroup, settings: &Settings) {
    for resource in group.file_resources() {
        if let Some(path) = script_path(&resource.kind, settings) {
            let _ = write!(out, "\n.script('{path}')");
        }
    }
}

fn inline_body(resource: &Resource) -> &str {
    match &resource.kind {
        ResourceKind::Inline {
            body,
        } => body,
        ResourceKind::File { .. } => "",
    }
}

fn wait_clause(inline: &[&Arc<Resource>]) -> String {
    match inline {
        [] => ".wait()".to_string(),
        [single] => {
            let body = inline_body(single);
            if bare_call().is_match(body) {
                let function = body.split('(').next().unwrap_or(body);
                format!(".wait({function})")
            } else {
                format!(".wait(function(){{\n{body}\n}})")
            }
        }
        many => {
            let mut clause = String::from(".wait(function(){\n");
            for resource in many {
                let _ = writeln!(clause, "(function(){{\n{}\n}})();", inline_body(resource));
            }
            clause.push_str("})");
            clause
        }
    }
}
