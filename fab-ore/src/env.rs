//! Reading settings from the process environment.

use std::ffi::OsStr;

/// Values of an environment variable that we treat as "off".
static FALSEY: &[&str] = &["", "0", "no", "off", "false"];

/// Returns `true` if `var` is set to anything other than a falsey value.
///
/// The comparison is case-insensitive, so `NO_COLOR=False` counts as unset.
pub fn is_truthy<K: AsRef<OsStr>>(var: K) -> bool {
    match std::env::var_os(var) {
        None => false,
        Some(mut value) => {
            value.make_ascii_lowercase();
            !FALSEY.iter().any(|falsey| value == *falsey)
        }
    }
}
