//! End-to-end patching of a small ASP.NET project on disk.

use code_modifier::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Copies the web application fixture into a fresh temporary directory.
fn webapp() -> TempDir {
    let dir = TempDir::new().unwrap();
    let source = fixtures().join("webapp");
    for entry in walkdir::WalkDir::new(&source) {
        let entry = entry.unwrap();
        let rel = entry.path().strip_prefix(&source).unwrap();
        let target = dir.path().join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).unwrap();
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
    dir
}

fn properties() -> BTreeMap<String, String> {
    [
        ("DbContextName", "BlogContext"),
        ("DbContextNamespace", "BlogApp.Data"),
        ("UseDbMethod", "UseSqlite"),
        ("ConnectionStringName", "BlogContext"),
        ("AppName", "Blog"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn load(name: &str) -> ModifierConfig {
    let config = ConfigLoader::from_path(fixtures().join("configs").join(name)).unwrap();
    ConfigLoader::apply_substitutions(config, &properties())
}

fn read(dir: &TempDir, rel: &str) -> String {
    fs::read_to_string(dir.path().join(rel)).unwrap()
}

#[test]
fn test_startup_patch() {
    let dir = webapp();
    let report = CodeModifier::new(load("startup_dbcontext.json"))
        .option("EfScenario")
        .apply(&mut FsWorkspace::new(dir.path()));

    assert!(!report.has_failures());
    assert_eq!(report.files_modified(), 1);
    assert!(report.skipped.is_empty(), "{:?}", report.skipped);

    let startup = read(&dir, "Startup.cs");
    assert!(startup.contains(
        "using Microsoft.Extensions.DependencyInjection;\nusing Microsoft.EntityFrameworkCore;\nusing System.Text;\n"
    ));
    assert_eq!(startup.matches("using System.Linq;").count(), 1);
    assert!(startup.contains(
        "            services.AddControllers();\n            services.AddDbContext<BlogContext>(options => options.UseSqlite(Configuration.GetConnectionString(\"BlogContext\")));\n            services.AddRouting();\n"
    ));
    assert!(startup.contains(
        "            services.AddRouting();\n            services.AddDatabaseDeveloperPageExceptionFilter();\n        }"
    ));
    assert!(startup.contains(
        "            app.UseRouting();\n            app.UseAuthentication();\n            app.UseEndpoints(endpoints =>\n"
    ));
    assert!(startup.contains(
        "                endpoints.MapControllers();\n                endpoints.MapRazorPages();\n            });"
    ));
}

#[test]
fn test_second_run_is_noop() {
    let dir = webapp();
    let modifier = CodeModifier::new(load("startup_dbcontext.json")).option("EfScenario");

    modifier.apply(&mut FsWorkspace::new(dir.path()));
    let first = read(&dir, "Startup.cs");

    let report = modifier.apply(&mut FsWorkspace::new(dir.path()));
    assert_eq!(report.files_modified(), 0);
    assert_eq!(report.summary, DiffSummary::default());
    assert_eq!(read(&dir, "Startup.cs"), first);
}

#[test]
fn test_option_gated_changes_skipped_without_option() {
    let dir = webapp();
    let report = CodeModifier::new(load("startup_dbcontext.json"))
        .apply(&mut FsWorkspace::new(dir.path()));
    assert_eq!(report.files_modified(), 1);

    let startup = read(&dir, "Startup.cs");
    assert!(startup.contains("AddDbContext<BlogContext>"));
    assert!(startup.contains("using System.Text;"));
    assert!(!startup.contains("Microsoft.EntityFrameworkCore"));
    assert!(!startup.contains("AddDatabaseDeveloperPageExceptionFilter"));
}

#[test]
fn test_top_level_program_matches_expected() {
    let dir = webapp();
    let report = CodeModifier::new(load("minimal_dbcontext.json"))
        .apply(&mut FsWorkspace::new(dir.path()));

    assert!(!report.has_failures());
    let expected = fs::read_to_string(fixtures().join("expected/Program.cs")).unwrap();
    assert_eq!(read(&dir, "Program.cs"), expected);
}

#[test]
fn test_markup_replacements() {
    let dir = webapp();
    let modifier = CodeModifier::new(load("minimal_dbcontext.json"));
    modifier.apply(&mut FsWorkspace::new(dir.path()));

    let layout = read(&dir, "Views/Shared/_Layout.cshtml");
    assert!(layout.contains("            </ul>\n            <partial name=\"_LoginPartial\" />\n        </nav>"));
    assert!(layout.contains("<title>@ViewData[\"Title\"] - Blog</title>"));

    modifier.apply(&mut FsWorkspace::new(dir.path()));
    assert_eq!(read(&dir, "Views/Shared/_Layout.cshtml"), layout);
}

#[test]
fn test_renamed_builder_variable() {
    let dir = webapp();
    let program = read(&dir, "Program.cs").replace("builder", "appBuilder");
    fs::write(dir.path().join("Program.cs"), program).unwrap();

    CodeModifier::new(load("minimal_dbcontext.json")).apply(&mut FsWorkspace::new(dir.path()));

    let patched = read(&dir, "Program.cs");
    assert!(patched.contains(
        "var appBuilder = WebApplication.CreateBuilder(args);\nvar connectionString = appBuilder.Configuration.GetConnectionString(\"BlogContext\")"
    ));
    assert!(patched.contains(
        "appBuilder.Services.AddRazorPages();\nappBuilder.Services.AddDbContext<BlogContext>(options => options.UseSqlite(connectionString));\n"
    ));
    assert!(!patched.contains("builder.Services"));
}

#[test]
fn test_malformed_snippet_does_not_block_others() {
    let dir = webapp();
    let report = CodeModifier::new(load("minimal_dbcontext.json"))
        .option("Broken")
        .apply(&mut FsWorkspace::new(dir.path()));

    assert!(!report.has_failures());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].file_name, "Program.cs");
    assert!(report.skipped[0].change.contains("UseDeveloperExceptionPage"));

    let expected = fs::read_to_string(fixtures().join("expected/Program.cs")).unwrap();
    assert_eq!(read(&dir, "Program.cs"), expected);
}

#[test]
fn test_dry_run_leaves_files_untouched() {
    let dir = webapp();
    let before = read(&dir, "Startup.cs");
    let report = CodeModifier::new(load("startup_dbcontext.json"))
        .dry_run()
        .apply(&mut FsWorkspace::new(dir.path()));

    assert_eq!(report.files_modified(), 1);
    assert_eq!(read(&dir, "Startup.cs"), before);
    assert!(report.diff().contains("+            app.UseAuthentication();"));
    assert!(report.summary.insertions >= 4);
}

#[test]
fn test_missing_target_reported_not_found() {
    let dir = TempDir::new().unwrap();
    let report = CodeModifier::new(load("startup_dbcontext.json"))
        .apply(&mut FsWorkspace::new(dir.path()));

    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].outcome, FileOutcome::NotFound);
    assert!(!report.has_failures());
}

#[test]
fn test_yaml_and_json_configs_agree() {
    let json = fs::read_to_string(fixtures().join("configs/startup_dbcontext.json")).unwrap();
    let from_json = ConfigLoader::from_str(&json).unwrap();
    let yaml = serde_yaml::to_string(&from_json).unwrap();
    let from_yaml = ConfigLoader::from_yaml_str(&yaml).unwrap();

    assert_eq!(from_yaml.identifier, "dbcontext-startup");
    let method = &from_yaml.files[0].methods["Configure"];
    assert_eq!(method.code_changes[1].kind, ChangeKind::Lambda);
    assert_eq!(method.code_changes[1].parameter.as_deref(), Some("endpoints"));
}

#[test]
fn test_substitution_fills_properties_but_keeps_parameter_placeholders() {
    let config = load("startup_dbcontext.json");
    let snippet = &config.files[0].methods["ConfigureServices"].code_changes[0];
    assert_eq!(
        snippet.block,
        "{IServiceCollection}.AddDbContext<BlogContext>(options => options.UseSqlite(Configuration.GetConnectionString(\"BlogContext\")))"
    );
}
