//! End-to-end tests of the `scriptplan` binary.

use predicates::prelude::*;

use crate::common::TestProject;

#[test]
fn test_plan_text() {
    let project = TestProject::with_site_catalog().unwrap();
    project
        .command()
        .args(["plan", "loggedin"])
        .assert()
        .success()
        .stdout("Chain 1\n  step 0: jquery\n  step 1: site\n  step 2: loggedin\n");
}

#[test]
fn test_plan_json() {
    let project = TestProject::with_site_catalog().unwrap();
    let output = project.command().args(["plan", "--format", "json", "site", "fonts"]).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let chains = json["chains"].as_array().unwrap();
    assert_eq!(chains.len(), 2);
    assert_eq!(chains[0][0]["resources"][0], "jquery");
    assert_eq!(chains[0][1]["step"], 1);
    assert_eq!(chains[1][0]["resources"][0], "fonts");
}

#[test]
fn test_plan_nothing_requested() {
    let project = TestProject::with_site_catalog().unwrap();
    project.command().arg("plan").assert().success().stdout(predicate::str::contains("Nothing to load"));
    project.command().args(["--quiet", "plan"]).assert().success().stdout("");
}

#[test]
fn test_plan_unknown_name_fails() {
    let project = TestProject::with_site_catalog().unwrap();
    project
        .command()
        .args(["plan", "ghost"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Resource 'ghost' is not registered"));
}

#[test]
fn test_render_simple() {
    let project = TestProject::with_site_catalog().unwrap();
    project.command().args(["render", "--mode", "simple", "site"]).assert().success().stdout(
        "<script src=\"https://cdn.example/jquery.min.js\"></script>\n\
         <script src=\"/scripts/site.min.js\"></script>\n",
    );
}

#[test]
fn test_render_simple_debug_paths() {
    let project = TestProject::with_site_catalog().unwrap();
    project
        .command()
        .args(["render", "--mode", "simple", "--debug", "site"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<script src=\"/scripts/jquery.js\"></script>"))
        .stdout(predicate::str::contains("<script src=\"/scripts/site.js\"></script>"));
}

#[test]
fn test_render_async_default() {
    let project = TestProject::with_site_catalog().unwrap();
    project.command().args(["render", "site"]).assert().success().stdout(
        "<script src=/scripts/LAB.min.js></script>\n\
         <script>\n\
         $LAB.setGlobalDefaults({AppendTo:'body'});\n\
         $LAB\n\
         .script('https://cdn.example/jquery.min.js')\n\
         .wait()\n\
         .script('/scripts/site.min.js');\n\
         </script>\n",
    );
}

#[test]
fn test_render_mode_from_environment() {
    let project = TestProject::with_site_catalog().unwrap();
    project
        .command()
        .env("SCRIPTPLAN_RENDER_MODE", "simple")
        .args(["render", "jquery"])
        .assert()
        .success()
        .stdout("<script src=\"https://cdn.example/jquery.min.js\"></script>\n");
}

#[test]
fn test_render_page_file() {
    let project = TestProject::with_site_catalog().unwrap();
    project
        .write_file(
            "pages/checkout.toml",
            r#"
include = ["site"]
styles = ["main"]

[[script]]
name = "checkout"
debug = "checkout.js"
deps = ["site"]

[[inline]]
body = "initCheckout();"
deps = ["checkout"]
"#,
        )
        .unwrap();

    project
        .command()
        .args(["render", "--mode", "simple", "--page", "pages/checkout.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("main.min.css"))
        .stdout(predicate::str::contains("<script src=\"/scripts/checkout.js\"></script>"))
        .stdout(predicate::str::ends_with(
            "<script>\n(function() {\ninitCheckout();\n})();\n</script>\n",
        ));
}

#[test]
fn test_validate_valid_catalog() {
    let project = TestProject::with_site_catalog().unwrap();
    project
        .command()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Loaded"))
        .stdout(predicate::str::contains("(7 scripts, 1 styles)"))
        .stdout(predicate::str::contains("✓ All dependencies are registered and acyclic"));
}

#[test]
fn test_validate_unregistered_dependency() {
    let project = TestProject::new().unwrap();
    project
        .write_catalog(
            r#"
[scripts.site]
debug = "site.js"
deps = ["jquery"]
"#,
        )
        .unwrap();

    project
        .command()
        .arg("validate")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("✗"))
        .stdout(predicate::str::contains("'jquery' is not registered"));
}

#[test]
fn test_validate_cycle() {
    let project = TestProject::new().unwrap();
    project
        .write_catalog(
            r#"
[scripts.a]
debug = "a.js"
deps = ["b"]

[scripts.b]
debug = "b.js"
deps = ["a"]
"#,
        )
        .unwrap();

    project
        .command()
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Circular dependency detected"));
}

#[test]
fn test_validate_explicit_file() {
    let project = TestProject::new().unwrap();
    let path = project.write_file("config/site.toml", crate::common::SITE_CATALOG_TOML).unwrap();
    project.command().arg("validate").arg(&path).assert().success();
}

#[test]
fn test_missing_catalog() {
    let project = TestProject::new().unwrap();
    project
        .command()
        .args(["--catalog", "nowhere.toml", "plan", "site"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No scriptplan.toml found"));
}

#[test]
fn test_verbose_conflicts_with_quiet() {
    let project = TestProject::with_site_catalog().unwrap();
    project.command().args(["--verbose", "--quiet", "plan", "site"]).assert().failure();
}
