//! Tracy instrumentation for cache passes and buffer extraction.
//!
//! Enabled with the `profiling` feature:
//!
//! ```toml
//! [dependencies]
//! meshdraw-core = { version = "0.1", features = ["profiling"] }
//! ```
//!
//! Without the feature every macro expands to nothing.
//!
//! ```ignore
//! use meshdraw_core::profiling::{profile_function, profile_scope};
//!
//! fn create_requested() {
//!     profile_function!();
//!     {
//!         profile_scope!("ensure_buffers");
//!         // ...
//!     }
//! }
//! ```

#[cfg(feature = "profiling")]
pub use tracy_client::{self, plot as tracy_plot, span};

/// Open a named span that lasts until the end of the enclosing scope.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_scope {
    ($name:expr) => {
        let _profile_span = $crate::profiling::span!($name);
    };
}

/// Named span (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_scope {
    ($name:expr) => {};
}

/// Open a span named after the enclosing function.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_function {
    () => {
        let _profile_span = $crate::profiling::span!();
    };
}

/// Function span (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_function {
    () => {};
}

/// Plot a numeric value, e.g. the number of batches built in a pass.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_plot {
    ($name:expr, $value:expr) => {
        $crate::profiling::tracy_plot!($name, $value as f64)
    };
}

/// Plot a value (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_plot {
    ($name:expr, $value:expr) => {
        let _ = $value;
    };
}

pub use profile_function;
pub use profile_plot;
pub use profile_scope;

#[cfg(test)]
mod tests {
    #[test]
    fn test_macros_compile() {
        profile_scope!("test_scope");
        profile_function!();
        profile_plot!("batches_built", 3usize);
    }
}
