//! The on-disk description of a build, a TOML file.
//!
//! ```toml
//! [[mods]]
//! kind = "add-dir"
//! from = "%?.o"
//! dir = "obj"
//!
//! [[rules]]
//! name = "app"
//! cmds = ["cc -o %@ obj/main.o"]
//! deps = ["main.o"]
//!
//! [[rules]]
//! name = "%?.o"
//! cmds = ["cc -c %?.c -o %@"]
//! deps = ["%?.c"]
//!
//! [[rules.scope.rules]]
//! name = "%?.c"
//! ideps = ["%?.h"]
//! ```

use std::io;
use std::path::Path;

use anyhow::Context;
use fab_outline::{Outline, OutlineError};
use serde::Deserialize;

use crate::mods::Mod;
use crate::pattern::WILDCARD;
use crate::scope::{Group, Rule};

/// Definition of a [`Group`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupSpec {
    #[serde(default)]
    pub mods: Vec<ModSpec>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

/// Definition of a [`Rule`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    pub name: String,
    #[serde(default)]
    pub cmds: Vec<String>,
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default)]
    pub ideps: Vec<String>,
    /// An outline file, e.g. the output of `gcc -H`, listing more implicit dependencies.
    pub ideps_outline: Option<String>,
    /// The rule's private scope.
    pub scope: Option<GroupSpec>,
}

/// Definition of a [`Mod`].
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ModSpec {
    Rewrite { from: String, to: String },
    AddDir { from: String, dir: String },
}

impl GroupSpec {
    pub fn from_toml(raw: &str) -> Result<Self, anyhow::Error> {
        let spec = toml::from_str(raw)?;
        Ok(spec)
    }

    pub fn from_file(path: &Path) -> Result<Self, anyhow::Error> {
        tracing::info!(?path, "reading build description");
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading build description {}", path.display()))?;
        GroupSpec::from_toml(&raw)
            .with_context(|| format!("parsing build description {}", path.display()))
    }

    /// Convert into a [`Group`], reading outline files relative to `base_dir`.
    pub fn into_group(self, base_dir: &Path) -> Result<Group, anyhow::Error> {
        let mut group = Group::new();
        for m in self.mods {
            group.push_mod(m.into_mod()?);
        }
        for rule in self.rules {
            group.push_rule(rule.into_rule(base_dir)?);
        }
        Ok(group)
    }
}

impl RuleSpec {
    fn into_rule(self, base_dir: &Path) -> Result<Rule, anyhow::Error> {
        let RuleSpec {
            name,
            cmds,
            deps,
            ideps,
            ideps_outline,
            scope,
        } = self;

        let mut rule = Rule::new(name.clone()).cmds(cmds).deps(deps).ideps(ideps);
        if let Some(outline) = ideps_outline {
            let extra = read_outline(base_dir, &outline)
                .with_context(|| format!("implicit dependencies of rule '{name}'"))?;
            rule = rule.ideps(extra);
        }
        if let Some(scope) = scope {
            rule = rule.scope(scope.into_group(base_dir)?);
        }
        Ok(rule)
    }
}

impl ModSpec {
    fn into_mod(self) -> Result<Mod, anyhow::Error> {
        let m = match self {
            ModSpec::Rewrite { from, to } => Mod::rewrite(&from, &to)?,
            ModSpec::AddDir { from, dir } => Mod::add_dir(&from, &dir)?,
        };
        Ok(m)
    }
}

/// Header names listed in the outline at `path`.
///
/// Outlines are often produced by the build itself, so a missing one just means there is
/// nothing to add yet.
fn read_outline(base_dir: &Path, path: &str) -> Result<Vec<String>, anyhow::Error> {
    if path.contains(WILDCARD) {
        anyhow::bail!("outline path '{path}' can't contain a wildcard");
    }
    match Outline::from_file(base_dir.join(path)) {
        Ok(outline) => Ok(outline.names()),
        Err(OutlineError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(%path, "outline does not exist yet");
            Ok(Vec::new())
        }
        Err(err) => Err(err.into()),
    }
}
