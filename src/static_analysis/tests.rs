//! Tests for the two-pass analysis over real file trees.

use super::static_analysis;
use crate::{
    locator::find_source_files,
    results::{
        reporter::tests::{ClosedPipe, SharedBuffer},
        Reporter, Results,
    },
    Config,
};
use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

const CHECKS: &str = ".class public Lcom/example/Checks;\n\
                      .super Ljava/lang/Object;\n\
                      \n\
                      .method public static isRooted()Z\n\
                      \x20   .locals 1\n\
                      \x20   const-string v0, \"/system/bin/su\"\n\
                      \x20   invoke-static {v0}, Lcom/example/Checks;->exists(Ljava/lang/String;)Z\n\
                      \x20   move-result v0\n\
                      \x20   return v0\n\
                      .end method\n\
                      \n\
                      .method private static exists(Ljava/lang/String;)Z\n\
                      \x20   const/4 v0, 0x0\n\
                      \x20   return v0\n\
                      .end method\n";

const BUILD: &str = ".class public Lcom/example/Build;\n\
                     .super Ljava/lang/Object;\n\
                     \n\
                     .method public static isTestBuild()Z\n\
                     \x20   const-string v0, \"test-keys\"\n\
                     \x20   const/4 v0, 0x1\n\
                     \x20   return v0\n\
                     .end method\n";

const MAIN: &str = ".class public Lcom/example/MainActivity;\n\
                    .super Landroid/app/Activity;\n\
                    \n\
                    .method protected onCreate(Landroid/os/Bundle;)V\n\
                    \x20   invoke-static {}, Lcom/example/Checks;->isRooted()Z\n\
                    \x20   return-void\n\
                    .end method\n\
                    \n\
                    .method public onResume()V\n\
                    \x20   invoke-static {}, Lcom/example/Build;->isTestBuild()Z\n\
                    \x20   invoke-static {}, Lcom/example/Checks;->isRooted()Z\n\
                    \x20   return-void\n\
                    .end method\n";

const CLEAN: &str = ".class public Lcom/example/Clean;\n\
                     .super Ljava/lang/Object;\n\
                     \n\
                     .method public run()V\n\
                     \x20   return-void\n\
                     .end method\n";

/// Writes a decoded application tree and returns its root.
fn write_app(dir: &Path) -> PathBuf {
    let root = dir.join("app");
    let package = root.join("smali").join("com").join("example");
    fs::create_dir_all(&package).unwrap();
    fs::write(package.join("Checks.smali"), CHECKS).unwrap();
    fs::write(package.join("MainActivity.smali"), MAIN).unwrap();
    fs::write(package.join("Clean.smali"), CLEAN).unwrap();

    let second_dex = root.join("smali_classes2").join("com").join("example");
    fs::create_dir_all(&second_dex).unwrap();
    fs::write(second_dex.join("Build.smali"), BUILD).unwrap();

    fs::write(root.join("AndroidManifest.xml"), "<manifest/>").unwrap();
    root
}

fn config(root: &Path, threads: usize) -> Config {
    let mut config = Config::default();
    config.set_root(root);
    config.set_threads(threads);
    config
}

fn run(config: &Config) -> (Results, String) {
    let files = find_source_files(config.root(), config.extension()).unwrap();
    let buffer = SharedBuffer::default();
    let reporter = Reporter::new(buffer.clone());
    let results = static_analysis(config, &files, &reporter).unwrap();
    (results, buffer.contents())
}

fn finding_set(results: &Results) -> BTreeSet<(PathBuf, Option<String>, String)> {
    results
        .findings()
        .iter()
        .map(|f| {
            (
                f.file().to_path_buf(),
                f.method().map(str::to_owned),
                f.matched().to_owned(),
            )
        })
        .collect()
}

fn edge_set(results: &Results) -> BTreeSet<(PathBuf, Option<String>, String)> {
    results
        .call_edges()
        .iter()
        .map(|e| {
            (
                e.file().to_path_buf(),
                e.method().map(str::to_owned),
                e.callee().to_string(),
            )
        })
        .collect()
}

#[test]
fn it_finds_detections_and_their_callers() {
    let temp = tempfile::tempdir().unwrap();
    let root = write_app(temp.path());
    let (results, output) = run(&config(&root, 4));

    let checks = root.join("smali/com/example/Checks.smali");
    let build = root.join("smali_classes2/com/example/Build.smali");
    let main = root.join("smali/com/example/MainActivity.smali");

    let expected: BTreeSet<_> = vec![
        (
            checks.clone(),
            Some(".method public static isRooted()Z".to_owned()),
            "/system/bin/su".to_owned(),
        ),
        (
            build,
            Some(".method public static isTestBuild()Z".to_owned()),
            "test-keys".to_owned(),
        ),
    ]
    .into_iter()
    .collect();
    assert_eq!(finding_set(&results), expected);

    let ids: Vec<_> = results.callable_ids().iter().map(|id| id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "Lcom/example/Build;->isTestBuild(",
            "Lcom/example/Checks;->isRooted(",
        ]
    );

    let on_create = Some(".method protected onCreate(Landroid/os/Bundle;)V".to_owned());
    let on_resume = Some(".method public onResume()V".to_owned());
    let expected: BTreeSet<_> = vec![
        (
            main.clone(),
            on_create,
            "Lcom/example/Checks;->isRooted(".to_owned(),
        ),
        (
            main.clone(),
            on_resume.clone(),
            "Lcom/example/Build;->isTestBuild(".to_owned(),
        ),
        (
            main.clone(),
            on_resume,
            "Lcom/example/Checks;->isRooted(".to_owned(),
        ),
    ]
    .into_iter()
    .collect();
    assert_eq!(edge_set(&results), expected);
    assert_eq!(results.call_edges().len(), 3);

    let lines: Vec<_> = output.lines().collect();
    assert!(lines.contains(&format!(
        "{}, .method public static isRooted()Z, /system/bin/su",
        checks.display()
    )
    .as_str()));
    assert!(lines.contains(&"Call to Lcom/example/Checks;->isRooted( found"));
    assert!(lines.contains(&format!("    file: {}", main.display()).as_str()));
    assert!(lines.contains(&"    method: .method public onResume()V"));
    // Two finding lines and three lines per call edge.
    assert_eq!(lines.len(), 2 + 3 * 3);
}

#[test]
fn it_traces_the_two_file_scenario() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("app");
    fs::create_dir_all(&root).unwrap();
    fs::write(
        root.join("foo.smali"),
        ".class public Lfoo;\n\
         .method public static bar()Z\n\
         \x20   const-string v0, \"/system/bin/su\"\n\
         .end method\n",
    )
    .unwrap();
    fs::write(
        root.join("qux.smali"),
        ".class public Lqux;\n\
         .method public baz()V\n\
         \x20   invoke-static {}, Lfoo;->bar()Z\n\
         .end method\n",
    )
    .unwrap();

    let (results, _) = run(&config(&root, 2));

    assert_eq!(results.findings().len(), 1);
    let finding = &results.findings()[0];
    assert_eq!(finding.file(), root.join("foo.smali"));
    assert_eq!(finding.method(), Some(".method public static bar()Z"));
    assert_eq!(finding.matched(), "/system/bin/su");

    assert_eq!(results.call_edges().len(), 1);
    let edge = &results.call_edges()[0];
    assert_eq!(edge.callee().as_str(), "Lfoo;->bar(");
    assert_eq!(edge.file(), root.join("qux.smali"));
    assert_eq!(edge.method(), Some(".method public baz()V"));
}

#[test]
fn it_finds_no_calls_without_detections() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("app");
    let package = root.join("smali").join("com").join("example");
    fs::create_dir_all(&package).unwrap();
    fs::write(package.join("MainActivity.smali"), MAIN).unwrap();
    fs::write(package.join("Clean.smali"), CLEAN).unwrap();

    let (results, output) = run(&config(&root, 4));
    assert!(results.findings().is_empty());
    assert!(results.callable_ids().is_empty());
    assert!(results.call_edges().is_empty());
    assert!(output.is_empty());
}

#[test]
fn it_gives_the_same_results_for_any_pool_size() {
    let temp = tempfile::tempdir().unwrap();
    let root = write_app(temp.path());

    let (single, _) = run(&config(&root, 1));
    let (many, _) = run(&config(&root, 20));

    assert_eq!(finding_set(&single), finding_set(&many));
    assert_eq!(single.findings().len(), many.findings().len());
    assert_eq!(single.callable_ids(), many.callable_ids());
    assert_eq!(edge_set(&single), edge_set(&many));
    assert_eq!(single.call_edges().len(), many.call_edges().len());
}

#[test]
fn it_is_idempotent() {
    let temp = tempfile::tempdir().unwrap();
    let root = write_app(temp.path());

    let (mut first, _) = run(&config(&root, 8));
    let (mut second, _) = run(&config(&root, 8));
    first.sort();
    second.sort();

    assert_eq!(first.findings(), second.findings());
    assert_eq!(first.call_edges(), second.call_edges());
    assert_eq!(first.callable_ids(), second.callable_ids());
}

#[test]
fn it_skips_unreadable_files() {
    let temp = tempfile::tempdir().unwrap();
    let root = write_app(temp.path());
    let mut files = find_source_files(&root, "smali").unwrap();
    files.insert(0, root.join("smali").join("Missing.smali"));
    files.push(root.join("smali").join("AlsoMissing.smali"));

    let reporter = Reporter::new(SharedBuffer::default());
    let results = static_analysis(&config(&root, 3), &files, &reporter).unwrap();

    assert_eq!(results.findings().len(), 2);
    assert_eq!(results.call_edges().len(), 3);
}

#[test]
fn it_keeps_the_results_when_the_output_fails() {
    let temp = tempfile::tempdir().unwrap();
    let root = write_app(temp.path());
    let files = find_source_files(&root, "smali").unwrap();

    for threads in &[1, 2] {
        let reporter = Reporter::new(ClosedPipe);
        let results = static_analysis(&config(&root, *threads), &files, &reporter).unwrap();
        let (expected, _) = run(&config(&root, *threads));

        assert_eq!(results.findings().len(), 2);
        assert_eq!(results.callable_ids().len(), 2);
        assert_eq!(results.call_edges().len(), 3);
        assert_eq!(finding_set(&results), finding_set(&expected));
        assert_eq!(edge_set(&results), edge_set(&expected));
    }
}

#[test]
fn it_reports_matches_outside_methods() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("app");
    fs::create_dir_all(&root).unwrap();
    fs::write(
        root.join("Keys.smali"),
        ".class public LKeys;\n\
         .field public static final TAGS:Ljava/lang/String; = \"test-keys\"\n",
    )
    .unwrap();

    let (results, output) = run(&config(&root, 2));
    assert_eq!(results.findings().len(), 1);
    assert_eq!(results.findings()[0].method(), None);
    assert!(results.callable_ids().is_empty());
    assert_eq!(
        output,
        format!("{}, , test-keys\n", root.join("Keys.smali").display())
    );
}
