//! Hooks for watching a build as it happens.

use fab_types::Mtime;

use crate::engine::Outcome;
use crate::scope::ResolvedRule;

/// Receives events from the [`Engine`] as it walks the dependency tree.
///
/// Every method has an empty default, implementors pick what they care about.
///
/// [`Engine`]: crate::engine::Engine
pub trait Observer {
    /// `rule` is being tried for `name`.
    fn considering(&self, _rule: &ResolvedRule, _name: &str) {}
    /// `name` is about to build its hard dependency `dependency`.
    fn dependency(&self, _name: &str, _dependency: &str) {}
    /// `name` checked its implicit dependency `idep`.
    fn implicit_dependency(&self, _name: &str, _idep: &str, _mtime: Option<Mtime>) {}
    /// `name` is out of date and its commands are about to run.
    fn stale(&self, _name: &str) {}
    /// `command` is about to run.
    fn command(&self, _command: &str) {}
    /// `name` has been decided.
    fn finished(&self, _name: &str, _outcome: &Outcome) {}
}

impl<T: Observer + ?Sized> Observer for &T {
    fn considering(&self, rule: &ResolvedRule, name: &str) {
        (**self).considering(rule, name)
    }
    fn dependency(&self, name: &str, dependency: &str) {
        (**self).dependency(name, dependency)
    }
    fn implicit_dependency(&self, name: &str, idep: &str, mtime: Option<Mtime>) {
        (**self).implicit_dependency(name, idep, mtime)
    }
    fn stale(&self, name: &str) {
        (**self).stale(name)
    }
    fn command(&self, command: &str) {
        (**self).command(command)
    }
    fn finished(&self, name: &str, outcome: &Outcome) {
        (**self).finished(name, outcome)
    }
}

/// Reports build events as [`tracing`] events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn considering(&self, rule: &ResolvedRule, name: &str) {
        tracing::debug!(%name, %rule, "considering");
    }

    fn dependency(&self, name: &str, dependency: &str) {
        tracing::debug!(%name, %dependency, "looking at dependency");
    }

    fn implicit_dependency(&self, name: &str, idep: &str, mtime: Option<Mtime>) {
        tracing::debug!(%name, %idep, ?mtime, "looking at implicit dependency");
    }

    fn stale(&self, name: &str) {
        tracing::debug!(%name, "out of date");
    }

    fn command(&self, command: &str) {
        tracing::info!(%command, "running");
    }

    fn finished(&self, name: &str, outcome: &Outcome) {
        tracing::trace!(%name, ?outcome, "finished");
    }
}
