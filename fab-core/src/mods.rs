//! Path rewriting applied to rule names and dependencies during setup.

use std::fmt;
use std::path::Path;

use crate::error::PatternError;
use crate::pattern::{Pattern, WILDCARD, substitute};

/// A pure name transformation.
///
/// A [`Mod`] only ever changes names that match its source pattern, everything else passes
/// through untouched.
#[derive(Debug, Clone)]
pub enum Mod {
    /// Replace a matching name with `to`, carrying over the capture of a wildcard source.
    Rewrite { from: Pattern, to: String },
    /// Prefix a matching name with `dir`.
    AddDir { from: Pattern, dir: String },
}

impl Mod {
    /// Create a [`Mod::Rewrite`].
    ///
    /// # Errors
    ///
    /// * If `from` contains the wildcard more than once.
    /// * If `to` contains the wildcard but `from` doesn't, there would be nothing to fill it with.
    pub fn rewrite(from: &str, to: &str) -> Result<Mod, PatternError> {
        let from = Pattern::compile(from)?;
        if !from.is_wildcard() && to.contains(WILDCARD) {
            return Err(PatternError::WildcardInLiteralRewrite {
                from: from.template().to_string(),
                to: to.to_string(),
            });
        }
        Ok(Mod::Rewrite {
            from,
            to: to.to_string(),
        })
    }

    /// Create a [`Mod::AddDir`].
    ///
    /// # Errors
    ///
    /// * If `from` contains the wildcard more than once.
    pub fn add_dir(from: &str, dir: &str) -> Result<Mod, PatternError> {
        Ok(Mod::AddDir {
            from: Pattern::compile(from)?,
            dir: dir.to_string(),
        })
    }

    /// Apply this [`Mod`] to `name`.
    pub fn modify(&self, name: &str) -> String {
        match self {
            Mod::Rewrite { from, to } => match from.captures(name) {
                Some(matched) => substitute(to, matched.capture()),
                None => name.to_string(),
            },
            Mod::AddDir { from, dir } => {
                if from.is_match(name) {
                    Path::new(dir).join(name).to_string_lossy().into_owned()
                } else {
                    name.to_string()
                }
            }
        }
    }
}

impl fmt::Display for Mod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mod::Rewrite { from, to } => write!(f, "rewrite '{}' -> '{to}'", from.template()),
            Mod::AddDir { from, dir } => write!(f, "add-dir '{}' -> '{dir}/'", from.template()),
        }
    }
}

/// Run `name` through every [`Mod`] in `chain`, in order.
pub fn apply_all<'a, I>(chain: I, name: &str) -> String
where
    I: IntoIterator<Item = &'a Mod>,
{
    chain
        .into_iter()
        .fold(name.to_string(), |name, m| m.modify(&name))
}
