use std::sync::Arc;

use parking_lot::Mutex;
use rstest::rstest;

use super::*;
use crate::base::ResourceLocator;
use crate::transform::{TransformError, TransformOptions};

fn space_with(options: SpaceOptions) -> (TransformSpace, Arc<MemoryInstaller>) {
    let mut space = TransformSpace::new(options);
    let memory = Arc::new(MemoryInstaller::new());
    space.add_install_hook(memory.clone());
    (space, memory)
}

fn space() -> (TransformSpace, Arc<MemoryInstaller>) {
    space_with(SpaceOptions::default())
}

fn at(package: &str, path: &str) -> ResourceLocator {
    ResourceLocator::new(package, path)
}

fn replace(from: &str, to: &str) -> String {
    format!("create transformer begin replace \"{from}\" with \"{to}\"; end\n")
}

fn replace_on(target: &str, from: &str, to: &str) -> String {
    format!("create transformer on \"{target}\" begin replace \"{from}\" with \"{to}\"; end\n")
}

// ============================================================================
// Registration
// ============================================================================

#[rstest]
#[case::transformer_with_language("src/theme.less.t", SourceKind::Transformer { language: Some("less".into()) })]
#[case::transformer("src/all.t", SourceKind::Transformer { language: None })]
#[case::item("src/app.ts", SourceKind::Item { language: "typescript".into() })]
#[case::unmanaged("README.md", SourceKind::Unmanaged)]
fn test_classify(#[case] path: &str, #[case] expected: SourceKind) {
    let (space, _) = space();
    assert_eq!(space.classify(path), expected);
}

#[test]
fn test_duplicate_path_names_both_origins() {
    let (mut space, _) = space();
    space.register(at("core", "src/a.ts"), "a;").unwrap();
    let err = space
        .register(at("theme", "./src\\a.ts"), "b;")
        .unwrap_err();
    assert_eq!(
        err,
        RegistrationError::DuplicatePath {
            path: "src/a.ts".to_string(),
            first: "core:src/a.ts".to_string(),
            second: "theme:src/a.ts".to_string(),
        }
    );
    assert_eq!(space.source("src/a.ts").map(|s| s.text()), Some("a;"));
}

#[test]
fn test_transformer_with_errors_is_not_registered() {
    let (mut space, _) = space();
    let err = space
        .register(at("app", "src/a.ts.t"), "create transformer begin replace end")
        .unwrap_err();
    assert!(matches!(err, RegistrationError::Syntax(TransformError::Syntax { .. })));
    assert!(space.source("src/a.ts.t").is_none());
}

#[test]
fn test_packages_are_declared_on_first_use() {
    let (mut space, _) = space();
    space.add_package("base");
    space.register(at("app", "a.ts"), "a;").unwrap();
    space.register(at("base", "b.ts"), "b;").unwrap();
    let names: Vec<_> = space.packages().map(|p| (p.name().to_string(), p.order())).collect();
    assert_eq!(names, vec![("base".to_string(), 0), ("app".to_string(), 1)]);
}

// ============================================================================
// Application
// ============================================================================

#[test]
fn test_apply_installs_changed_outputs() {
    let (mut space, memory) = space();
    space.register(at("app", "src/a.ts"), "x = 1;\n").unwrap();
    space.register(at("app", "src/a.ts.t"), replace("1", "2")).unwrap();
    space.register(at("app", "src/b.ts"), "y = 1;\n").unwrap();
    let report = space.apply().unwrap();
    assert!(report.is_success());
    assert_eq!(report.installed, vec!["src/a.ts".to_string()]);
    assert_eq!(memory.get("src/a.ts").as_deref(), Some("x = 2;\n"));
    assert_eq!(space.item("src/a.ts").and_then(|i| i.output()), Some("x = 2;\n"));
    // Inputs are untouched.
    assert_eq!(space.source("src/a.ts").map(|s| s.text()), Some("x = 1;\n"));
    assert!(space
        .functions()
        .all(|(_, f)| f.state() == FunctionState::Verified));
}

#[test]
fn test_unchanged_output_is_not_installed() {
    let (mut space, memory) = space();
    space.register(at("app", "a.ts"), "x = 2;\n").unwrap();
    space.register(at("app", "a.ts.t"), replace("1", "2")).unwrap();
    let report = space.apply().unwrap();
    assert_eq!(report.unchanged, vec!["a.ts".to_string()]);
    assert!(report.installed.is_empty());
    assert!(memory.is_empty());
}

#[test]
fn test_functions_apply_in_package_order() {
    let (mut space, memory) = space();
    space.add_package("base");
    space.add_package("app");
    // Registered first, but its package comes second.
    space.register(at("app", "src/a.ts.t"), replace("b", "c")).unwrap();
    space
        .register(at("base", "lib/fix.t"), replace_on("../src/a.ts", "a", "b"))
        .unwrap();
    space.register(at("app", "src/a.ts"), "a;").unwrap();
    let report = space.apply().unwrap();
    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(memory.get("src/a.ts").as_deref(), Some("c;"));

    let item = space.item("src/a.ts").unwrap();
    let sources: Vec<_> = item
        .functions()
        .filter_map(|id| space.function(id))
        .map(|f| f.key().source.to_string())
        .collect();
    assert_eq!(sources, vec!["lib/fix.t", "src/a.ts.t"]);
}

#[test]
fn test_insertion_index_follows_keys() {
    let (mut space, _) = space();
    space.register(at("app", "a.ts"), "a;").unwrap();
    space
        .register(at("app", "z.t"), replace_on("a.ts", "a", "b"))
        .unwrap();
    space.bind();
    let item = space.item("a.ts").unwrap();
    let before = FunctionKey {
        package_order: 0,
        source: "m.t".into(),
        index: 0,
    };
    let after = FunctionKey {
        package_order: 1,
        source: "a.t".into(),
        index: 0,
    };
    assert_eq!(item.insertion_index(&before), 0);
    assert_eq!(item.insertion_index(&after), 1);
}

#[test]
fn test_failed_target_keeps_its_text() {
    let (mut space, memory) = space();
    space.register(at("app", "a.ts"), "x = 1;").unwrap();
    space.register(at("app", "a.ts.t"), replace("1", "2")).unwrap();
    space.register(at("app", "b.ts"), "y; y;").unwrap();
    space.register(at("app", "b.ts.t"), replace("y", "w")).unwrap();
    let report = space.apply().unwrap();
    assert_eq!(report.applied, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].target, "b.ts");
    assert!(matches!(report.failures[0].error, TransformError::Resolution { .. }));
    assert!(memory.get("b.ts").is_none());
    assert_eq!(memory.get("a.ts").as_deref(), Some("x = 2;"));
    let states: Vec<_> = space.functions().map(|(_, f)| f.state()).collect();
    assert_eq!(states, vec![FunctionState::Verified, FunctionState::Error]);
}

#[test]
fn test_warnings_as_errors_fails_the_build() {
    let (mut space, _) = space_with(SpaceOptions::default().with_warnings_as_errors(true));
    space.register(at("app", "b.ts"), "y; y;").unwrap();
    space.register(at("app", "b.ts.t"), replace("y", "w")).unwrap();
    let err = space.apply().unwrap_err();
    let SpaceError::TransformFailed { failures } = err else {
        panic!("expected a transform failure, got {err:?}");
    };
    assert_eq!(failures.len(), 1);
}

#[test]
fn test_idempotence_can_be_disabled() {
    let options = SpaceOptions::default()
        .with_transform(TransformOptions::default().with_verify_idempotence(false));
    let (mut space, memory) = space_with(options);
    space.register(at("app", "a.ts"), "x; x;").unwrap();
    space
        .register(at("app", "a.ts.t"), "create transformer begin replace first \"x\" with \"y\"; end")
        .unwrap();
    space.apply().unwrap();
    assert_eq!(memory.get("a.ts").as_deref(), Some("y; x;"));
    assert!(space.functions().all(|(_, f)| f.state() == FunctionState::Applied));
}

// ============================================================================
// Binding
// ============================================================================

#[test]
fn test_missing_target_binds_once_registered() {
    let (mut space, memory) = space();
    space.register(at("app", "src/a.ts.t"), replace("1", "2")).unwrap();
    let failures = space.bind();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].target, "src/a.ts");
    assert!(matches!(
        &failures[0].error,
        TransformError::Resolution { reason, .. } if reason == "target not found"
    ));

    space.register(at("app", "src/a.ts"), "x = 1;").unwrap();
    let report = space.apply().unwrap();
    assert!(report.is_success());
    assert_eq!(memory.get("src/a.ts").as_deref(), Some("x = 2;"));
}

#[test]
fn test_unmanaged_target_is_rejected() {
    let (mut space, _) = space();
    space.register(at("app", "notes.md"), "1").unwrap();
    space
        .register(at("app", "x.t"), replace_on("notes.md", "1", "2"))
        .unwrap();
    let failures = space.bind();
    assert!(matches!(
        &failures[0].error,
        TransformError::Resolution { reason, .. } if reason == "target is not transformable"
    ));
}

struct Outside {
    text: String,
    installed: Mutex<Option<String>>,
}

impl ExternalTransformableItem for Outside {
    fn path(&self) -> &str {
        "../outside.ts"
    }

    fn initial_text(&self) -> &str {
        &self.text
    }

    fn install(&self, text: &str) -> Result<(), InstallError> {
        *self.installed.lock() = Some(text.to_string());
        Ok(())
    }
}

struct OutsideResolver(Arc<Outside>);

impl ExternalItemResolver for OutsideResolver {
    fn resolve(&self, path: &str) -> Option<Arc<dyn ExternalTransformableItem>> {
        let item: Arc<dyn ExternalTransformableItem> = self.0.clone();
        (path == item.path()).then_some(item)
    }
}

#[test]
fn test_external_target() {
    let (mut space, memory) = space();
    let outside = Arc::new(Outside {
        text: "x = 1;".to_string(),
        installed: Mutex::new(None),
    });
    space
        .register(at("app", "src/a.t"), replace_on("../../outside.ts", "1", "2"))
        .unwrap();
    assert_eq!(space.bind().len(), 1);

    space.set_resolver(Arc::new(OutsideResolver(outside.clone())));
    let report = space.apply().unwrap();
    assert!(report.is_success());
    assert_eq!(outside.installed.lock().as_deref(), Some("x = 2;"));
    assert!(space.item("../outside.ts").is_some_and(|i| i.is_external()));
    assert!(memory.is_empty());
}

// ============================================================================
// Changes
// ============================================================================

#[test]
fn test_dirty_list_tracks_changes() {
    let (mut space, memory) = space();
    space.register(at("app", "a.ts"), "x = 1;\n").unwrap();
    space.register(at("app", "a.ts.t"), replace("1", "2")).unwrap();
    space.register(at("app", "b.ts"), "y = 1;\n").unwrap();
    space
        .register(at("app", "b.ts.t"), replace("1", "3"))
        .unwrap();
    assert_eq!(space.dirty_sources("app"), vec!["b.ts.t", "b.ts", "a.ts.t", "a.ts"]);
    space.apply().unwrap();
    assert!(space.dirty_sources("app").is_empty());
    assert!(!space.package("app").unwrap().has_changes());
    memory.take();

    assert!(space.on_tracked_change("a.ts", "x = 1;\nz = 0;\n").unwrap());
    assert!(!space.on_tracked_change("a.ts", "x = 1;\nz = 0;\n").unwrap());
    assert_eq!(space.dirty_sources("app"), vec!["a.ts"]);
    assert!(space.source("a.ts").unwrap().is_dirty());

    let report = space.apply_changes().unwrap();
    assert_eq!(report.applied, 1);
    assert_eq!(report.installed, vec!["a.ts".to_string()]);
    assert_eq!(memory.get("a.ts").as_deref(), Some("x = 2;\nz = 0;\n"));
    assert!(memory.get("b.ts").is_none());
    assert!(space.dirty_sources("app").is_empty());
}

#[test]
fn test_changed_transformer_rebinds() {
    let (mut space, memory) = space();
    space.register(at("app", "a.ts"), "x = 1;").unwrap();
    space.register(at("app", "a.ts.t"), replace("1", "2")).unwrap();
    space.apply().unwrap();
    space.on_tracked_change("a.ts.t", replace("1", "3")).unwrap();
    let report = space.apply_changes().unwrap();
    assert_eq!(report.installed, vec!["a.ts".to_string()]);
    assert_eq!(memory.get("a.ts").as_deref(), Some("x = 3;"));
    assert_eq!(space.functions().count(), 1);
}

#[test]
fn test_change_of_unknown_source() {
    let (mut space, _) = space();
    assert_eq!(
        space.on_tracked_change("nope.ts", "x").unwrap_err(),
        RegistrationError::UnknownSource("nope.ts".to_string())
    );
}

#[test]
fn test_remove_sources() {
    let (mut space, _) = space();
    space.register(at("app", "a.ts"), "x = 1;").unwrap();
    space.register(at("app", "a.ts.t"), replace("1", "2")).unwrap();
    space.register(at("app", "b.ts"), "x = 1;").unwrap();
    space.apply().unwrap();

    space.on_tracked_change("b.ts", "x = 5;").unwrap();
    space.remove("b.ts").unwrap();
    assert!(space.dirty_sources("app").is_empty());
    assert!(space.source("b.ts").is_none());

    space.remove("a.ts.t").unwrap();
    assert_eq!(space.functions().count(), 0);
    assert!(space.item("a.ts").is_some_and(|i| i.is_empty()));
    let report = space.apply_changes().unwrap();
    assert_eq!(report.applied, 0);

    assert_eq!(
        space.remove("a.ts.t").unwrap_err(),
        RegistrationError::UnknownSource("a.ts.t".to_string())
    );
}

#[test]
fn test_removed_target_unbinds_functions() {
    let (mut space, _) = space();
    space.register(at("app", "a.ts"), "x = 1;").unwrap();
    space.register(at("app", "a.ts.t"), replace("1", "2")).unwrap();
    space.bind();
    space.remove("a.ts").unwrap();
    assert!(space.item("a.ts").is_none());
    assert!(space
        .functions()
        .all(|(_, f)| f.state() == FunctionState::Unbound && f.target().is_none()));
    assert_eq!(space.bind().len(), 1);
}

// ============================================================================
// Installers
// ============================================================================

#[test]
fn test_file_installer_writes_under_root() {
    let dir = tempfile::tempdir().unwrap();
    let mut space = TransformSpace::new(SpaceOptions::default().with_output_root(dir.path()));
    space.register(at("app", "src/a.ts"), "x = 1;").unwrap();
    space.register(at("app", "src/a.ts.t"), replace("1", "2")).unwrap();
    space.apply().unwrap();
    let written = std::fs::read_to_string(dir.path().join("src/a.ts")).unwrap();
    assert_eq!(written, "x = 2;");
}

#[test]
fn test_file_installer_rejects_escaping_paths() {
    let installer = FileInstaller::new("out");
    assert!(matches!(
        installer.install("../x.ts", "x"),
        Err(InstallError::Rejected { .. })
    ));
    assert_eq!(installer.output_path("a/b.ts").unwrap(), installer.root().join("a/b.ts"));
}

#[test]
fn test_directory_resolver() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("shared.ts"), "x = 1;").unwrap();
    let (mut space, _) = space();
    space.set_resolver(Arc::new(DirectoryResolver::new(dir.path())));
    space
        .register(at("app", "gen.t"), replace_on("../shared.ts", "1", "2"))
        .unwrap();
    let report = space.apply().unwrap();
    assert!(report.is_success(), "{:?}", report.failures);
    let written = std::fs::read_to_string(dir.path().join("shared.ts")).unwrap();
    assert_eq!(written, "x = 2;");
}

#[test]
fn test_hooks_are_tried_in_order() {
    struct Only(&'static str);
    impl InstallHook for Only {
        fn install(&self, path: &str, _text: &str) -> Result<bool, InstallError> {
            Ok(path.ends_with(self.0))
        }
    }
    let memory = Arc::new(MemoryInstaller::new());
    let mut chain = InstallerChain::new(FileInstaller::new("unused"));
    chain.push(Arc::new(Only(".less")));
    chain.push(memory.clone());
    chain.install("a.less", "a").unwrap();
    chain.install("b.ts", "b").unwrap();
    assert_eq!(memory.len(), 1);
    assert_eq!(memory.take().get("b.ts").map(String::as_str), Some("b"));
}
