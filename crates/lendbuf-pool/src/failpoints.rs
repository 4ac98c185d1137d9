//! Chaos/failpoint hooks (feature: `failpoints`).
//!
//! Keep this extremely light: the macro expands to nothing unless the feature
//! is enabled. When enabled, a point fires its action iff its name appears in
//! the comma-separated `LENDBUF_FAILPOINTS` environment variable.

#[cfg(feature = "failpoints")]
pub fn is_active(name: &str) -> bool {
    match std::env::var("LENDBUF_FAILPOINTS") {
        Ok(list) => list.split(',').any(|n| n.trim() == name),
        Err(_) => false,
    }
}

#[cfg(feature = "failpoints")]
#[macro_export]
macro_rules! fail_point {
    ($name:expr, $action:expr) => {{
        if $crate::failpoints::is_active($name) {
            $action
        }
    }};
}

#[cfg(not(feature = "failpoints"))]
#[macro_export]
macro_rules! fail_point {
    ($name:expr, $action:expr) => {
        // no-op
        let _ = $name;
    };
}
