//! Scenario tests for the [`Engine`], against an in-memory filesystem.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use fab_types::Mtime;

use crate::engine::{Engine, Outcome};
use crate::error::BuildError;
use crate::filesystem::Filesystem;
use crate::mods::Mod;
use crate::observer::Observer;
use crate::runner::Runner;
use crate::scope::{BuildTree, Group, Rule};

/// Files and their modification times, with a clock that only moves forward when touched.
#[derive(Debug, Default)]
struct MemoryFilesystem {
    files: RefCell<BTreeMap<String, Mtime>>,
    clock: Cell<i64>,
}

impl MemoryFilesystem {
    fn with_files(files: &[(&str, i64)]) -> Self {
        let fs = MemoryFilesystem::default();
        for (path, secs) in files {
            fs.set(path, *secs);
        }
        fs
    }

    fn set(&self, path: &str, secs: i64) {
        self.files
            .borrow_mut()
            .insert(path.to_string(), Mtime::from_secs(secs));
        self.clock.set(self.clock.get().max(secs));
    }

    /// Update `path` to be newer than everything else.
    fn touch(&self, path: &str) {
        let now = self.clock.get() + 1;
        self.set(path, now);
    }

    fn get(&self, path: &str) -> Option<Mtime> {
        self.files.borrow().get(path).copied()
    }
}

impl Filesystem for MemoryFilesystem {
    fn mtime(&self, path: &str) -> Result<Option<Mtime>, BuildError> {
        Ok(self.get(path))
    }
}

/// Records commands instead of running them. `touch <path>` updates the filesystem and `fail`
/// exits unsuccessfully, anything else succeeds without side effects.
struct FakeRunner<'a> {
    fs: &'a MemoryFilesystem,
    log: RefCell<Vec<String>>,
}

impl<'a> FakeRunner<'a> {
    fn new(fs: &'a MemoryFilesystem) -> Self {
        FakeRunner {
            fs,
            log: RefCell::default(),
        }
    }

    fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl Runner for FakeRunner<'_> {
    fn run(&self, command: &str) -> Result<(), BuildError> {
        self.log.borrow_mut().push(command.to_string());
        if let Some(path) = command.strip_prefix("touch ") {
            self.fs.touch(path);
        }
        if command == "fail" {
            return Err(BuildError::CommandFailed {
                command: command.to_string(),
                code: Some(1),
            });
        }
        Ok(())
    }
}

fn engine<'a>(
    tree: &'a BuildTree,
    fs: &'a MemoryFilesystem,
    runner: &'a FakeRunner<'a>,
) -> Engine<'a> {
    Engine::new(tree).with_filesystem(fs).with_runner(runner)
}

/// Rules for plain source files, which exist or don't but are never built.
fn sources() -> Rule {
    Rule::new("%?.c")
}

#[test]
fn missing_target_runs_commands_once() {
    let tree = Group::new()
        .with_rule(Rule::new("t").dep("d.c").cmd("touch %@"))
        .with_rule(sources())
        .setup()
        .unwrap();
    let fs = MemoryFilesystem::with_files(&[("d.c", 10)]);
    let runner = FakeRunner::new(&fs);

    let mtime = engine(&tree, &fs, &runner).build("t").unwrap();
    assert_eq!(runner.log(), ["touch t"]);
    assert_eq!(Some(mtime), fs.get("t"));
    assert!(mtime > Mtime::from_secs(10));
}

#[test]
fn up_to_date_target_is_left_alone() {
    let tree = Group::new()
        .with_rule(Rule::new("t").deps(["a.c", "b.c"]).cmd("touch %@"))
        .with_rule(sources())
        .setup()
        .unwrap();
    let fs = MemoryFilesystem::with_files(&[("a.c", 10), ("b.c", 20), ("t", 30)]);
    let runner = FakeRunner::new(&fs);

    let mtime = engine(&tree, &fs, &runner).build("t").unwrap();
    assert!(runner.log().is_empty());
    assert_eq!(mtime, Mtime::from_secs(30));
}

#[test]
fn equal_mtime_is_not_stale() {
    let tree = Group::new()
        .with_rule(Rule::new("t").dep("a.c").cmd("touch %@"))
        .with_rule(sources())
        .setup()
        .unwrap();
    let fs = MemoryFilesystem::with_files(&[("a.c", 10), ("t", 10)]);
    let runner = FakeRunner::new(&fs);

    engine(&tree, &fs, &runner).build("t").unwrap();
    assert!(runner.log().is_empty());
}

#[test]
fn newer_dependency_triggers_rebuild() {
    let tree = Group::new()
        .with_rule(Rule::new("t").deps(["a.c", "b.c"]).cmd("touch %@").cmd("echo done"))
        .with_rule(sources())
        .setup()
        .unwrap();
    let fs = MemoryFilesystem::with_files(&[("a.c", 10), ("b.c", 40), ("t", 30)]);
    let runner = FakeRunner::new(&fs);

    let mtime = engine(&tree, &fs, &runner).build("t").unwrap();
    assert_eq!(runner.log(), ["touch t", "echo done"]);
    assert_eq!(mtime, Mtime::from_secs(41));
}

#[test]
fn implicit_dependency_promotes_without_rebuild() {
    let tree = Group::new()
        .with_rule(Rule::new("t").dep("a.c").idep("a.h").idep("gone.h").cmd("touch %@"))
        .with_rule(sources())
        .setup()
        .unwrap();
    let fs = MemoryFilesystem::with_files(&[("a.c", 10), ("t", 20), ("a.h", 50)]);
    let runner = FakeRunner::new(&fs);

    let mtime = engine(&tree, &fs, &runner).build("t").unwrap();
    assert!(runner.log().is_empty());
    assert_eq!(mtime, Mtime::from_secs(50));
    // The file itself is untouched.
    assert_eq!(fs.get("t"), Some(Mtime::from_secs(20)));
}

#[test]
fn promoted_implicit_dependency_rebuilds_dependents() {
    // `%?.o` is never rebuilt because of its header, but `app` sees it as newer.
    let tree = Group::new()
        .with_rule(Rule::new("app").dep("main.o").cmd("touch %@"))
        .with_rule(Rule::new("%?.o").dep("%?.c").idep("%?.h").cmd("touch %@"))
        .with_rule(sources())
        .setup()
        .unwrap();
    let fs = MemoryFilesystem::with_files(&[
        ("main.c", 10),
        ("main.o", 20),
        ("app", 30),
        ("main.h", 40),
    ]);
    let runner = FakeRunner::new(&fs);

    engine(&tree, &fs, &runner).build("app").unwrap();
    assert_eq!(runner.log(), ["touch app"]);
}

#[test]
fn implicit_dependencies_ignored_when_stale() {
    let tree = Group::new()
        .with_rule(Rule::new("t").idep("t.h").cmd("touch %@"))
        .setup()
        .unwrap();
    let fs = MemoryFilesystem::with_files(&[("t.h", 100)]);
    let runner = FakeRunner::new(&fs);

    let mtime = engine(&tree, &fs, &runner).build("t").unwrap();
    assert_eq!(runner.log(), ["touch t"]);
    assert_eq!(mtime, Mtime::from_secs(101));
}

#[test]
fn unresolved_dependency_fails_without_commands() {
    let tree = Group::new()
        .with_rule(Rule::new("app").deps(["main.o", "util.o"]).cmd("touch %@"))
        .with_rule(Rule::new("main.o").cmd("touch %@"))
        .setup()
        .unwrap();
    let fs = MemoryFilesystem::default();
    let runner = FakeRunner::new(&fs);

    let err = engine(&tree, &fs, &runner).build("app").unwrap_err();
    assert!(matches!(
        err,
        BuildError::UnresolvedDependency { ref target, ref dependency }
            if target == "app" && dependency == "util.o"
    ));
    // `main.o` is built before `util.o` is looked up, but `app` itself never runs.
    assert_eq!(runner.log(), ["touch main.o"]);
}

#[test]
fn unresolved_nested_dependency_propagates() {
    let tree = Group::new()
        .with_rule(Rule::new("app").dep("main.o").cmd("touch %@"))
        .with_rule(Rule::new("%?.o").dep("%?.c").cmd("touch %@"))
        .setup()
        .unwrap();
    let fs = MemoryFilesystem::default();
    let runner = FakeRunner::new(&fs);

    let err = engine(&tree, &fs, &runner).build("app").unwrap_err();
    match err {
        BuildError::UnresolvedDependency { target, dependency } => {
            assert_eq!(target, "main.o");
            assert_eq!(dependency, "main.c");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(runner.log().is_empty());
}

#[test]
fn missing_source_is_not_built() {
    let tree = Group::new()
        .with_rule(Rule::new("app").dep("main.c").cmd("touch %@"))
        .with_rule(sources())
        .setup()
        .unwrap();
    let fs = MemoryFilesystem::default();
    let runner = FakeRunner::new(&fs);
    let engine = engine(&tree, &fs, &runner);

    // A rule exists for `main.c`, but nothing creates it.
    let err = engine.build("app").unwrap_err();
    assert!(matches!(err, BuildError::NotBuilt { ref target } if target == "app"));
    assert!(runner.log().is_empty());

    let err = engine.build("nothing-builds-this").unwrap_err();
    assert!(matches!(err, BuildError::NoRule { .. }));
}

#[test]
fn command_that_creates_nothing_is_stale() {
    let tree = Group::new()
        .with_rule(Rule::new("app").dep("phony").cmd("touch %@"))
        .with_rule(Rule::new("phony").cmd("echo nothing"))
        .setup()
        .unwrap();
    let fs = MemoryFilesystem::default();
    let runner = FakeRunner::new(&fs);
    let engine = engine(&tree, &fs, &runner);

    let root_rule = tree.search(tree.root(), "phony").unwrap();
    assert_eq!(engine.build_rule(root_rule, "phony").unwrap(), Outcome::Stale);
    assert!(engine.build("app").is_err());
    assert_eq!(runner.log(), ["echo nothing", "echo nothing"]);
}

#[test]
fn rule_that_does_not_apply() {
    let tree = Group::new()
        .with_rule(Rule::new("%?.o"))
        .setup()
        .unwrap();
    let fs = MemoryFilesystem::default();
    let runner = FakeRunner::new(&fs);
    let engine = engine(&tree, &fs, &runner);

    let rule = tree.search(tree.root(), "a.o").unwrap();
    assert_eq!(
        engine.build_rule(rule, "a.c").unwrap(),
        Outcome::Unresolvable
    );
}

#[test]
fn command_failure_aborts_everything() {
    let tree = Group::new()
        .with_rule(Rule::new("app").deps(["a.o", "b.o"]).cmd("touch %@"))
        .with_rule(Rule::new("a.o").cmd("fail").cmd("touch %@"))
        .with_rule(Rule::new("b.o").cmd("touch %@"))
        .setup()
        .unwrap();
    let fs = MemoryFilesystem::default();
    let runner = FakeRunner::new(&fs);

    let err = engine(&tree, &fs, &runner).build("app").unwrap_err();
    assert!(matches!(err, BuildError::CommandFailed { ref command, .. } if command == "fail"));
    // Neither the rest of `a.o`, the sibling `b.o`, nor `app` ran.
    assert_eq!(runner.log(), ["fail"]);
}

#[test]
fn nested_scope_scenario() {
    // x depends on a.o and b.o, objects are built from sources found in the object rule's
    // private scope, and those sources implicitly depend on their headers.
    let tree = Group::new()
        .with_rule(Rule::new("x").deps(["a.o", "b.o"]).cmd("touch x"))
        .with_rule(
            Rule::new("%?.o")
                .dep("%?.c")
                .cmd("touch %?.o")
                .with_rule(Rule::new("%?.c").idep("%?.h")),
        )
        .setup()
        .unwrap();
    let fs = MemoryFilesystem::with_files(&[
        ("a.h", 1),
        ("b.h", 1),
        ("b.c", 2),
        ("b.o", 3),
        ("a.o", 4),
        ("x", 5),
        ("a.c", 6),
    ]);
    let runner = FakeRunner::new(&fs);

    engine(&tree, &fs, &runner).build("x").unwrap();
    assert_eq!(runner.log(), ["touch a.o", "touch x"]);

    // Everything is up to date now, until a header changes.
    let runner = FakeRunner::new(&fs);
    engine(&tree, &fs, &runner).build("x").unwrap();
    assert!(runner.log().is_empty());

    fs.touch("b.h");
    let runner = FakeRunner::new(&fs);
    engine(&tree, &fs, &runner).build("x").unwrap();
    assert_eq!(runner.log(), ["touch b.o", "touch x"]);
}

#[test]
fn private_rules_are_not_visible_from_outside() {
    let tree = Group::new()
        .with_rule(Rule::new("x").dep("a.c").cmd("touch x"))
        .with_rule(Rule::new("%?.o").dep("%?.c").with_rule(sources()))
        .setup()
        .unwrap();
    let fs = MemoryFilesystem::with_files(&[("a.c", 1)]);
    let runner = FakeRunner::new(&fs);

    let err = engine(&tree, &fs, &runner).build("x").unwrap_err();
    assert!(matches!(err, BuildError::UnresolvedDependency { .. }));
}

#[test]
fn first_declared_rule_wins() {
    let tree = Group::new()
        .with_rule(Rule::new("%?.o").cmd("touch %@").cmd("echo generic"))
        .with_rule(Rule::new("special.o").cmd("touch %@").cmd("echo special"))
        .setup()
        .unwrap();
    let fs = MemoryFilesystem::default();
    let runner = FakeRunner::new(&fs);

    engine(&tree, &fs, &runner).build("special.o").unwrap();
    assert_eq!(runner.log(), ["touch special.o", "echo generic"]);
}

#[test]
fn mods_move_targets() {
    let tree = Group::new()
        .with_mod(Mod::rewrite("%?.o", ".obj/%?.o").unwrap())
        .with_rule(Rule::new("app").dep("main.o").cmd("touch %@"))
        .with_rule(Rule::new("%?.o").dep("%?.c").cmd("touch %@"))
        .with_rule(sources())
        .setup()
        .unwrap();
    let fs = MemoryFilesystem::with_files(&[("main.c", 1)]);
    let runner = FakeRunner::new(&fs);
    let engine = engine(&tree, &fs, &runner);

    engine.build("app").unwrap();
    assert_eq!(runner.log(), ["touch .obj/main.o", "touch app"]);

    // Requested names go through the same rewrites.
    fs.touch("main.c");
    engine.build("main.o").unwrap();
    assert_eq!(runner.log().last().unwrap(), "touch .obj/main.o");
}

#[test]
fn mtimes_are_read_fresh() {
    let tree = Group::new()
        .with_rule(Rule::new("t").dep("a.c").cmd("touch %@"))
        .with_rule(sources())
        .setup()
        .unwrap();
    let fs = MemoryFilesystem::with_files(&[("a.c", 1)]);
    let runner = FakeRunner::new(&fs);
    let engine = engine(&tree, &fs, &runner);

    engine.build("t").unwrap();
    engine.build("t").unwrap();
    fs.touch("a.c");
    engine.build("t").unwrap();
    assert_eq!(runner.log(), ["touch t", "touch t"]);
}

#[derive(Default)]
struct RecordingObserver {
    events: RefCell<Vec<String>>,
}

impl Observer for RecordingObserver {
    fn stale(&self, name: &str) {
        self.events.borrow_mut().push(format!("stale {name}"));
    }

    fn finished(&self, name: &str, outcome: &Outcome) {
        let kind = match outcome {
            Outcome::Resolved(_) => "resolved",
            Outcome::Stale => "stale",
            Outcome::Unresolvable => "unresolvable",
        };
        self.events.borrow_mut().push(format!("{kind} {name}"));
    }
}

#[test]
fn observer_sees_depth_first_order() {
    let tree = Group::new()
        .with_rule(Rule::new("app").dep("a.c").cmd("touch %@"))
        .with_rule(sources())
        .setup()
        .unwrap();
    let fs = MemoryFilesystem::with_files(&[("a.c", 1)]);
    let runner = FakeRunner::new(&fs);
    let observer = RecordingObserver::default();

    engine(&tree, &fs, &runner)
        .with_observer(&observer)
        .build("app")
        .unwrap();
    assert_eq!(
        *observer.events.borrow(),
        ["resolved a.c", "stale app", "resolved app"]
    );
}

#[cfg(unix)]
#[test]
fn host_build_with_shell() {
    use crate::filesystem::HostFilesystem;
    use crate::runner::ShellRunner;

    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("a"), "line one\n").unwrap();
    std::fs::write(dir.path().join("b"), "line two\n").unwrap();

    let tree = Group::new()
        .with_rule(Rule::new("x").deps(["a", "b"]).cmd("cat a b > %@"))
        .with_rule(Rule::new("a"))
        .with_rule(Rule::new("b"))
        .setup()
        .unwrap();
    let engine = Engine::new(&tree)
        .with_filesystem(HostFilesystem::rooted_at(dir.path()))
        .with_runner(ShellRunner::default().in_dir(dir.path()));

    let first = engine.build("x").unwrap();
    let contents = std::fs::read_to_string(dir.path().join("x")).unwrap();
    assert_eq!(contents, "line one\nline two\n");

    // Nothing changed, so nothing is rewritten.
    let second = engine.build("x").unwrap();
    assert_eq!(first, second);
}
