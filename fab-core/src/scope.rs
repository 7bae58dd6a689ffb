//! The tree of rule scopes.
//!
//! A build is described with [`Group`]s and [`Rule`]s, which are plain data. Calling
//! [`Group::setup`] applies every [`Mod`] and compiles every rule name, producing an immutable
//! [`BuildTree`] that the [`Engine`] resolves names against.
//!
//! [`Engine`]: crate::engine::Engine

use std::borrow::Cow;
use std::fmt;
use std::io;

use fab_ore::id_gen::IdGen;

use crate::error::BuildError;
use crate::mods::{Mod, apply_all};
use crate::pattern::Pattern;

/// A scope: ordered [`Mod`]s and ordered [`Rule`]s.
#[derive(Debug, Clone, Default)]
pub struct Group {
    mods: Vec<Mod>,
    rules: Vec<Rule>,
}

impl Group {
    pub fn new() -> Self {
        Group::default()
    }

    pub fn with_mod(mut self, m: Mod) -> Self {
        self.mods.push(m);
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn push_mod(&mut self, m: Mod) {
        self.mods.push(m);
    }

    pub fn push_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Resolve this description into a [`BuildTree`], with `self` as the root scope.
    ///
    /// Every rule gets the [`Mod`]s of all its enclosing scopes applied, outermost first, to its
    /// name, dependencies and implicit dependencies. Its name is then compiled into a
    /// [`Pattern`].
    ///
    /// # Errors
    ///
    /// * If a rule name contains the wildcard more than once, after rewriting.
    pub fn setup(self) -> Result<BuildTree, BuildError> {
        let mut setup = Setup::default();
        setup.add_scope(self, None, &[])?;

        let Setup { scopes, rules, .. } = setup;
        tracing::debug!(scopes = scopes.len(), rules = rules.len(), "setup build tree");
        Ok(BuildTree { scopes, rules })
    }
}

/// A named build action: commands to run, and what it depends on.
///
/// A [`Rule`] can also carry its own private scope, whose rules are only visible while resolving
/// the dependencies of this rule (and of the rules nested inside it).
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    cmds: Vec<String>,
    deps: Vec<String>,
    ideps: Vec<String>,
    child: Option<Group>,
}

impl Rule {
    pub fn new(name: impl Into<String>) -> Self {
        Rule {
            name: name.into(),
            cmds: Vec::new(),
            deps: Vec::new(),
            ideps: Vec::new(),
            child: None,
        }
    }

    pub fn cmd(mut self, cmd: impl Into<String>) -> Self {
        self.cmds.push(cmd.into());
        self
    }

    pub fn cmds<I: IntoIterator<Item = S>, S: Into<String>>(mut self, cmds: I) -> Self {
        self.cmds.extend(cmds.into_iter().map(Into::into));
        self
    }

    pub fn dep(mut self, dep: impl Into<String>) -> Self {
        self.deps.push(dep.into());
        self
    }

    pub fn deps<I: IntoIterator<Item = S>, S: Into<String>>(mut self, deps: I) -> Self {
        self.deps.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn idep(mut self, idep: impl Into<String>) -> Self {
        self.ideps.push(idep.into());
        self
    }

    pub fn ideps<I: IntoIterator<Item = S>, S: Into<String>>(mut self, ideps: I) -> Self {
        self.ideps.extend(ideps.into_iter().map(Into::into));
        self
    }

    /// Add a [`Mod`] to this rule's private scope.
    pub fn with_mod(mut self, m: Mod) -> Self {
        self.child.get_or_insert_with(Group::default).push_mod(m);
        self
    }

    /// Add a rule to this rule's private scope.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.child.get_or_insert_with(Group::default).push_rule(rule);
        self
    }

    /// Replace this rule's private scope.
    pub fn scope(mut self, group: Group) -> Self {
        self.child = Some(group);
        self
    }
}

/// ID of a scope within a [`BuildTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(usize);

impl From<usize> for ScopeId {
    fn from(value: usize) -> Self {
        ScopeId(value)
    }
}

/// ID of a rule within a [`BuildTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(usize);

impl From<usize> for RuleId {
    fn from(value: usize) -> Self {
        RuleId(value)
    }
}

/// A scope after setup.
#[derive(Debug)]
struct ScopeNode {
    /// Where lookups continue when nothing in this scope matches. `None` only for the root.
    parent: Option<ScopeId>,
    /// The rule whose private scope this is, if any.
    owner: Option<RuleId>,
    /// Mods declared directly on this scope.
    mods: Vec<Mod>,
    /// Rules in declaration order.
    rules: Vec<RuleId>,
}

/// A rule after setup, with all [`Mod`]s applied.
#[derive(Debug)]
pub struct ResolvedRule {
    pub id: RuleId,
    pub pattern: Pattern,
    pub cmds: Vec<String>,
    pub deps: Vec<String>,
    pub ideps: Vec<String>,
    /// The scope this rule is declared in.
    pub scope: ScopeId,
    /// This rule's private scope.
    pub child: Option<ScopeId>,
}

impl ResolvedRule {
    /// The rewritten name template.
    pub fn name(&self) -> &str {
        self.pattern.template()
    }
}

impl fmt::Display for ResolvedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Rule: '{}'>", self.name())
    }
}

/// An immutable, fully resolved tree of scopes and rules.
#[derive(Debug)]
pub struct BuildTree {
    scopes: Vec<ScopeNode>,
    rules: Vec<ResolvedRule>,
}

impl BuildTree {
    /// The top level scope, the one [`Group::setup`] was called on.
    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn rule(&self, id: RuleId) -> &ResolvedRule {
        &self.rules[id.0]
    }

    pub fn rules(&self) -> impl Iterator<Item = &ResolvedRule> {
        self.rules.iter()
    }

    /// The rule whose private scope `scope` is, `None` for the root scope.
    pub fn owner(&self, scope: ScopeId) -> Option<RuleId> {
        self.scopes[scope.0].owner
    }

    /// Apply the [`Mod`]s visible in `scope`, outermost first, to `name`.
    pub fn rewrite(&self, scope: ScopeId, name: &str) -> String {
        let mut chain = Vec::new();
        let mut current = Some(scope);
        while let Some(id) = current {
            let node = &self.scopes[id.0];
            chain.push(&node.mods);
            current = node.parent;
        }
        apply_all(chain.into_iter().rev().flatten(), name)
    }

    /// Find the rule that builds `name`, starting in `scope` and ascending through its parents.
    pub fn search(&self, scope: ScopeId, name: &str) -> Option<RuleId> {
        self.search_scope(scope, name, true)
    }

    /// Find the rule that builds `name` on behalf of `rule`.
    ///
    /// The private scope of `rule` is consulted first, then the scope `rule` was declared in and
    /// its ancestors.
    pub fn search_from_rule(&self, rule: RuleId, name: &str) -> Option<RuleId> {
        let rule = self.rule(rule);
        if let Some(child) = rule.child {
            if let Some(found) = self.search_scope(child, name, false) {
                return Some(found);
            }
        }
        self.search_scope(rule.scope, name, true)
    }

    fn search_scope(&self, scope: ScopeId, name: &str, ascend: bool) -> Option<RuleId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let node = &self.scopes[id.0];
            let found = node
                .rules
                .iter()
                .copied()
                .find(|rule| self.rule(*rule).pattern.is_match(name));
            if found.is_some() {
                return found;
            }
            if !ascend {
                return None;
            }
            current = node.parent;
        }
        None
    }

    /// Return a pretty version of the tree that can be displayed.
    pub fn pretty(&self) -> PrettyNode<'_> {
        PrettyNode {
            tree: self,
            item: PrettyItem::Scope(self.root()),
        }
    }
}

/// Incremental state of [`Group::setup`].
#[derive(Default)]
struct Setup {
    scopes: Vec<ScopeNode>,
    rules: Vec<ResolvedRule>,
    scope_ids: IdGen<ScopeId>,
    rule_ids: IdGen<RuleId>,
}

impl Setup {
    fn add_scope(
        &mut self,
        group: Group,
        owner: Option<(RuleId, ScopeId)>,
        inherited: &[Mod],
    ) -> Result<ScopeId, BuildError> {
        let Group { mods, rules } = group;
        let chain: Vec<Mod> = inherited.iter().chain(&mods).cloned().collect();

        // IDs are dense, so every ID is also the index we push to.
        let id = self.scope_ids.next_id();
        self.scopes.push(ScopeNode {
            parent: owner.map(|(_, parent)| parent),
            owner: owner.map(|(rule, _)| rule),
            mods,
            rules: Vec::with_capacity(rules.len()),
        });

        for rule in rules {
            let rule_id = self.add_rule(rule, id, &chain)?;
            self.scopes[id.0].rules.push(rule_id);
        }
        Ok(id)
    }

    fn add_rule(&mut self, rule: Rule, scope: ScopeId, chain: &[Mod]) -> Result<RuleId, BuildError> {
        let Rule {
            name,
            cmds,
            deps,
            ideps,
            child,
        } = rule;

        let name = apply_all(chain, &name);
        let deps = deps.iter().map(|dep| apply_all(chain, dep)).collect();
        let ideps = ideps.iter().map(|idep| apply_all(chain, idep)).collect();
        let pattern = Pattern::compile(&name)?;

        let id = self.rule_ids.next_id();
        self.rules.push(ResolvedRule {
            id,
            pattern,
            cmds,
            deps,
            ideps,
            scope,
            child: None,
        });

        if let Some(group) = child {
            // A private scope hangs off the scope its rule is declared in, lookups that miss
            // in it continue there.
            let child = self.add_scope(group, Some((id, scope)), chain)?;
            self.rules[id.0].child = Some(child);
        }
        Ok(id)
    }
}

/// Helper for printing a [`BuildTree`] with [`ptree`].
#[derive(Debug, Clone)]
pub struct PrettyNode<'a> {
    tree: &'a BuildTree,
    item: PrettyItem<'a>,
}

#[derive(Debug, Clone)]
enum PrettyItem<'a> {
    Scope(ScopeId),
    Mod(&'a Mod),
    Rule(RuleId),
    Command(&'a str),
}

impl<'a> PrettyNode<'a> {
    fn child(&self, item: PrettyItem<'a>) -> PrettyNode<'a> {
        PrettyNode {
            tree: self.tree,
            item,
        }
    }

    fn scope_children(&self, scope: ScopeId, out: &mut Vec<PrettyNode<'a>>) {
        let tree: &'a BuildTree = self.tree;
        let node = &tree.scopes[scope.0];
        out.extend(node.mods.iter().map(|m| self.child(PrettyItem::Mod(m))));
        out.extend(node.rules.iter().map(|r| self.child(PrettyItem::Rule(*r))));
    }
}

impl<'a> ptree::TreeItem for PrettyNode<'a> {
    type Child = Self;

    fn write_self<W: io::Write>(&self, f: &mut W, style: &ptree::Style) -> io::Result<()> {
        match &self.item {
            PrettyItem::Scope(_) => write!(f, "{}", style.paint("<root>")),
            PrettyItem::Mod(m) => write!(f, "{}", style.paint(format!("mod {m}"))),
            PrettyItem::Rule(id) => {
                let rule = self.tree.rule(*id);
                write!(f, "{}", style.paint(format!("rule '{}'", rule.name())))?;
                if !rule.deps.is_empty() {
                    write!(f, " deps: {}", rule.deps.join(", "))?;
                }
                if !rule.ideps.is_empty() {
                    write!(f, " ideps: {}", rule.ideps.join(", "))?;
                }
                Ok(())
            }
            PrettyItem::Command(cmd) => write!(f, "$ {cmd}"),
        }
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        let mut children = Vec::new();
        match &self.item {
            PrettyItem::Scope(scope) => self.scope_children(*scope, &mut children),
            PrettyItem::Rule(id) => {
                let tree: &'a BuildTree = self.tree;
                let rule = tree.rule(*id);
                children.extend(
                    rule.cmds
                        .iter()
                        .map(|cmd| self.child(PrettyItem::Command(cmd))),
                );
                if let Some(scope) = rule.child {
                    self.scope_children(scope, &mut children);
                }
            }
            PrettyItem::Mod(_) | PrettyItem::Command(_) => (),
        }
        Cow::Owned(children)
    }
}

impl fmt::Display for PrettyNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        ptree::write_tree(self, &mut buf).map_err(|_| fmt::Error)?;
        write!(f, "{}", String::from_utf8_lossy(&buf[..]))
    }
}
