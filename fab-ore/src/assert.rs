//! `assert!`-style macros.

/// Asserts that an `Option` expression is `None`, printing the unexpected value otherwise.
///
/// Mostly used when inserting into maps where a previous entry indicates a programming error.
#[macro_export]
macro_rules! assert_none {
    ($val:expr, $($msg:tt)+) => {{
        if let Some(prev) = &$val {
            panic!("assertion failed: expected None, found Some({prev:?}): {}", format!($($msg)+));
        }
    }};
    ($val:expr) => {{
        if let Some(prev) = &$val {
            panic!("assertion failed: expected None, found Some({prev:?})");
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn none_passes() {
        let val: Option<u32> = None;
        assert_none!(val, "never fires for {}", "None");
    }

    #[test]
    #[should_panic(expected = "found Some(3): duplicate rule")]
    fn some_panics_with_message() {
        assert_none!(Some(3), "duplicate {}", "rule");
    }
}
