//! Resolution of typical site layouts through the public API.

use scriptplan::config::{ConflictPolicy, RenderMode, Settings};
use scriptplan::core::PlanError;
use scriptplan::page::Page;
use scriptplan::render::Renderer;
use scriptplan::resolver::{LoadPlan, PlanResolver};
use scriptplan::test_utils::{catalog_from, init_test_logging, site_catalog, site_manifest};
use std::collections::HashSet;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|n| (*n).to_string()).collect()
}

/// Every resource appears once, and every dependency loads at an earlier step
/// of the same chain.
fn assert_well_ordered(plan: &LoadPlan) {
    let mut seen = HashSet::new();
    for (chain_index, chain) in plan.chains().iter().enumerate() {
        for group in chain.groups() {
            for resource in group.resources() {
                assert!(seen.insert(resource.name.clone()), "'{}' appears twice", resource.name);
                for dep in &resource.dependencies {
                    let (dep_chain, dep_step) =
                        plan.locate(dep).unwrap_or_else(|| panic!("'{dep}' missing from plan"));
                    assert_eq!(dep_chain, chain_index, "'{dep}' is in another chain");
                    assert!(
                        dep_step < group.step(),
                        "'{dep}' (step {dep_step}) must load before '{}' (step {})",
                        resource.name,
                        group.step()
                    );
                }
            }
        }
    }
}

#[test]
fn test_single_dependency() {
    init_test_logging(None);
    let catalog = catalog_from(&[("A", ""), ("B", "A")]);
    let plan = PlanResolver::new(&catalog).resolve(&names(&["B"])).unwrap();

    assert_eq!(plan.len(), 1);
    let chain = &plan.chains()[0];
    assert_eq!(chain.len(), 2);
    assert_eq!(chain.root().unwrap().group().names(), vec!["A"]);
    assert_eq!(chain.group(1).unwrap().group().names(), vec!["B"]);
}

#[test]
fn test_three_step_chain() {
    let catalog = site_catalog();
    let plan = PlanResolver::new(&catalog).resolve(&names(&["loggedin"])).unwrap();

    assert_eq!(plan.len(), 1);
    let steps: Vec<Vec<&str>> = plan.chains()[0].groups().map(|g| g.names()).collect();
    assert_eq!(steps, vec![vec!["jquery"], vec!["site"], vec!["loggedin"]]);
}

#[test]
fn test_shared_base_merges_into_one_chain() {
    let catalog = site_catalog();
    let plan = PlanResolver::new(&catalog)
        .resolve(&names(&["shipmenttotals", "rsswidget"]))
        .unwrap();

    assert_eq!(plan.len(), 1);
    assert_eq!(plan.resource_count(), 5);
    assert_well_ordered(&plan);

    let (_, site) = plan.locate("site").unwrap();
    let (_, loggedin) = plan.locate("loggedin").unwrap();
    let (_, shipmenttotals) = plan.locate("shipmenttotals").unwrap();
    let (_, rsswidget) = plan.locate("rsswidget").unwrap();
    assert!(site < loggedin && loggedin < shipmenttotals);
    assert!(site < rsswidget);
}

#[test]
fn test_undeclared_dependency_fails_whole_pass() {
    let catalog = catalog_from(&[("site", "jquery")]);
    let err = PlanResolver::new(&catalog).resolve(&names(&["site"])).unwrap_err();

    match err.downcast_ref::<PlanError>() {
        Some(PlanError::UnregisteredDependency {
            name,
            required_by,
        }) => {
            assert_eq!(name, "jquery");
            assert_eq!(required_by.as_deref(), Some("site"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_independent_roots_load_together() {
    let catalog = site_catalog();
    let plan = PlanResolver::new(&catalog).resolve(&names(&["analytics", "fonts"])).unwrap();

    assert_eq!(plan.len(), 1);
    let chain = &plan.chains()[0];
    assert_eq!(chain.len(), 1);
    assert_eq!(chain.root().unwrap().group().names(), vec!["analytics", "fonts"]);
}

#[test]
fn test_whole_site_is_well_ordered() {
    let catalog = site_catalog();
    let requested =
        names(&["rsswidget", "analytics", "shipmenttotals", "fonts", "loggedin", "site"]);
    let plan = PlanResolver::new(&catalog).resolve(&requested).unwrap();

    assert_eq!(plan.resource_count(), 7);
    assert_well_ordered(&plan);
    assert_eq!(plan.locate("analytics"), plan.locate("fonts"));
}

#[test]
fn test_resolution_is_repeatable() {
    let catalog = site_catalog();
    let requested = names(&["shipmenttotals", "rsswidget", "fonts"]);
    let first = PlanResolver::new(&catalog).resolve(&requested).unwrap();
    let second = PlanResolver::new(&catalog).resolve(&requested).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_inverted_trees_follow_policy() {
    // X loads a before b (through c), Y loads b before a (through d)
    let catalog = catalog_from(&[
        ("a", ""),
        ("b", ""),
        ("c", "b"),
        ("d", "a"),
        ("X", "a, c"),
        ("Y", "b, d"),
    ]);
    let requested = names(&["X", "Y"]);

    let err = PlanResolver::new(&catalog).resolve(&requested).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PlanError>(),
        Some(PlanError::StructuralMergeConflict { .. })
    ));

    let plan = PlanResolver::new(&catalog)
        .with_conflict_policy(ConflictPolicy::Relayer)
        .resolve(&requested)
        .unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.resource_count(), 6);
    assert_well_ordered(&plan);
}

#[test]
fn test_level_in_one_tree_ordered_in_other_resolves() {
    // X puts b below a (through c), Y puts them level
    let catalog = catalog_from(&[("a", ""), ("b", ""), ("c", "b"), ("X", "a, c"), ("Y", "a, b")]);
    let plan = PlanResolver::new(&catalog).resolve(&names(&["X", "Y"])).unwrap();

    assert_eq!(plan.len(), 1);
    assert_eq!(plan.resource_count(), 5);
    assert_well_ordered(&plan);
}

#[test]
fn test_widget_beside_site_resolves() {
    // page needs jqueryui and something -> site -> jquery; widget needs jqueryui and site
    let catalog = catalog_from(&[
        ("jquery", ""),
        ("jqueryui", "jquery"),
        ("site", "jquery"),
        ("something", "site"),
        ("page", "jqueryui, something"),
        ("widget", "jqueryui, site"),
    ]);
    let plan = PlanResolver::new(&catalog).resolve(&names(&["page", "widget"])).unwrap();

    assert_eq!(plan.len(), 1);
    assert_eq!(plan.resource_count(), 6);
    assert_well_ordered(&plan);
    assert_eq!(plan.locate("jquery"), Some((0, 0)));
}

#[test]
fn test_page_renders_merged_chain() {
    let manifest = site_manifest();
    let mut page = Page::for_manifest(&manifest);
    page.include("rsswidget").unwrap();
    page.include_file("checkout", "checkout.js", "checkout.min.js", "site");
    page.run_after("initCheckout();", "checkout");

    let plan = page.plan(ConflictPolicy::Reject).unwrap();
    assert_eq!(plan.len(), 1);
    assert_well_ordered(&plan);

    let settings = Settings {
        render_mode: RenderMode::Async,
        ..Settings::default()
    };
    let html = Renderer::new(&settings).render_page(&page).unwrap();
    assert!(html.contains(".script('https://cdn.example/jquery.min.js')"));
    assert!(html.contains(".script('/scripts/checkout.min.js')"));
    assert!(html.ends_with(".wait(initCheckout);\n</script>\n"));
}
