//! Errors produced while setting up or running a build.

use std::io;

/// A name template or [`Mod`] that can never be used.
///
/// [`Mod`]: crate::mods::Mod
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("'{template}' contains the wildcard '%?' {count} times, at most one is allowed")]
    RepeatedWildcard { template: String, count: usize },
    #[error("rewrite of literal '{from}' can't produce the wildcard in '{to}'")]
    WildcardInLiteralRewrite { from: String, to: String },
    #[error("failed to compile pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// Any failure of a build. All of these are fatal to the `build` call that produced them.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Pattern(#[from] PatternError),
    /// A dependency matched no rule anywhere on its scope ascent path.
    #[error("no rule to build '{dependency}', needed by '{target}'")]
    UnresolvedDependency { target: String, dependency: String },
    /// The requested target matched no rule.
    #[error("no rule to build '{target}'")]
    NoRule { target: String },
    /// A rule was found, but the target (or one of its dependencies) still doesn't exist.
    #[error("'{target}' could not be built, it or one of its dependencies is missing")]
    NotBuilt { target: String },
    #[error("command '{command}' failed, {}", describe_exit(.code))]
    CommandFailed { command: String, code: Option<i32> },
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to stat '{path}': {source}")]
    Stat {
        path: String,
        #[source]
        source: io::Error,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by a signal".to_string(),
    }
}
