//! A small, Make-like incremental build engine.
//!
//! Builds are described as a tree of scopes ([`Group`]s) holding [`Rule`]s and path rewriting
//! [`Mod`]s. Rule names can contain a single wildcard `%?`, which matches any run of characters
//! other than `/` and is substituted into the rule's dependencies and commands.
//!
//! ```no_run
//! use fab_core::{Engine, Group, Mod, Rule};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tree = Group::new()
//!     .with_mod(Mod::add_dir("%?.o", "obj")?)
//!     .with_rule(Rule::new("app").dep("main.o").cmd("cc -o %@ obj/main.o"))
//!     .with_rule(
//!         Rule::new("%?.o")
//!             .dep("%?.c")
//!             .cmd("cc -c %?.c -o %@")
//!             .with_rule(Rule::new("%?.c").idep("%?.h")),
//!     )
//!     .setup()?;
//!
//! Engine::new(&tree).build("app")?;
//! # Ok(())
//! # }
//! ```
//!
//! Staleness is decided purely by modification times, nothing is remembered between runs.

pub mod cfgs;
pub mod defs;
pub mod engine;
pub mod error;
pub mod filesystem;
pub mod mods;
pub mod observer;
pub mod pattern;
pub mod runner;
pub mod scope;

#[cfg(test)]
mod tests;

pub use cfgs::all_cfgs;
pub use engine::{Engine, Outcome};
pub use error::{BuildError, PatternError};
pub use mods::Mod;
pub use scope::{BuildTree, Group, Rule};
