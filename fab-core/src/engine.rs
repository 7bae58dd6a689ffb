//! Deciding what is out of date, and bringing it up to date.

use derivative::Derivative;
use fab_types::Mtime;

use crate::error::BuildError;
use crate::filesystem::{Filesystem, HostFilesystem};
use crate::observer::{Observer, TracingObserver};
use crate::pattern::substitute;
use crate::runner::{Runner, ShellRunner, expand_command};
use crate::scope::{BuildTree, RuleId, ScopeId};

/// Result of asking a single rule to build a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The target is up to date, as of this time.
    Resolved(Mtime),
    /// The target could not be brought up to date, it (or a dependency) is still missing.
    Stale,
    /// The rule doesn't apply to the name.
    Unresolvable,
}

/// Builds targets described by a [`BuildTree`].
///
/// The filesystem, the command runner, and the observer are all pluggable. By default they are
/// the host filesystem, `/bin/sh`, and [`tracing`].
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Engine<'a> {
    tree: &'a BuildTree,
    #[derivative(Debug = "ignore")]
    filesystem: Box<dyn Filesystem + 'a>,
    #[derivative(Debug = "ignore")]
    runner: Box<dyn Runner + 'a>,
    #[derivative(Debug = "ignore")]
    observer: Box<dyn Observer + 'a>,
}

impl<'a> Engine<'a> {
    pub fn new(tree: &'a BuildTree) -> Self {
        Engine {
            tree,
            filesystem: Box::new(HostFilesystem::default()),
            runner: Box::new(ShellRunner::default()),
            observer: Box::new(TracingObserver),
        }
    }

    pub fn with_filesystem(mut self, filesystem: impl Filesystem + 'a) -> Self {
        self.filesystem = Box::new(filesystem);
        self
    }

    pub fn with_runner(mut self, runner: impl Runner + 'a) -> Self {
        self.runner = Box::new(runner);
        self
    }

    pub fn with_observer(mut self, observer: impl Observer + 'a) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Bring `name` up to date, as seen from the root scope.
    pub fn build(&self, name: &str) -> Result<Mtime, BuildError> {
        self.build_in(self.tree.root(), name)
    }

    /// Bring `name` up to date, as seen from `scope`.
    ///
    /// `name` is first rewritten by the [`Mod`]s visible in `scope`, then resolved to a rule in
    /// `scope` or one of its ancestors.
    ///
    /// Returns the time the target is considered to have been modified, which can be later than
    /// its real modification time when an implicit dependency is newer.
    ///
    /// [`Mod`]: crate::mods::Mod
    pub fn build_in(&self, scope: ScopeId, name: &str) -> Result<Mtime, BuildError> {
        let target = self.tree.rewrite(scope, name);
        if target != name {
            tracing::debug!(%name, %target, "rewrote requested target");
        }

        let Some(rule) = self.tree.search(scope, &target) else {
            return Err(BuildError::NoRule { target });
        };
        match self.build_rule(rule, &target)? {
            Outcome::Resolved(mtime) => Ok(mtime),
            Outcome::Stale => Err(BuildError::NotBuilt { target }),
            Outcome::Unresolvable => Err(BuildError::NoRule { target }),
        }
    }

    /// Build `name` with the rule `id`, if it applies.
    pub fn build_rule(&self, id: RuleId, name: &str) -> Result<Outcome, BuildError> {
        let rule = self.tree.rule(id);
        self.observer.considering(rule, name);

        let Some(matched) = rule.pattern.captures(name) else {
            return Ok(Outcome::Unresolvable);
        };
        let capture = matched.capture();

        let current = self.filesystem.mtime(name)?;
        let mut stale = current.is_none();

        for dep in &rule.deps {
            let dep = substitute(dep, capture);
            let Some(dep_rule) = self.tree.search_from_rule(id, &dep) else {
                return Err(BuildError::UnresolvedDependency {
                    target: name.to_string(),
                    dependency: dep,
                });
            };

            self.observer.dependency(name, &dep);
            let dep_mtime = match self.build_rule(dep_rule, &dep)? {
                Outcome::Resolved(mtime) => mtime,
                Outcome::Stale | Outcome::Unresolvable => {
                    return Ok(self.finish(name, Outcome::Stale));
                }
            };
            if current.is_none_or(|mtime| dep_mtime > mtime) {
                stale = true;
            }
        }

        let outcome = match current {
            Some(mut mtime) if !stale => {
                for idep in &rule.ideps {
                    let idep = substitute(idep, capture);
                    let idep_mtime = self.filesystem.mtime(&idep)?;
                    self.observer.implicit_dependency(name, &idep, idep_mtime);
                    if let Some(idep_mtime) = idep_mtime {
                        mtime = mtime.max(idep_mtime);
                    }
                }
                Outcome::Resolved(mtime)
            }
            _ => {
                self.observer.stale(name);
                for template in &rule.cmds {
                    let command = expand_command(template, name, capture);
                    self.observer.command(&command);
                    self.runner.run(&command)?;
                }
                match self.filesystem.mtime(name)? {
                    Some(mtime) => Outcome::Resolved(mtime),
                    None => Outcome::Stale,
                }
            }
        };

        Ok(self.finish(name, outcome))
    }

    fn finish(&self, name: &str, outcome: Outcome) -> Outcome {
        self.observer.finished(name, &outcome);
        outcome
    }
}
