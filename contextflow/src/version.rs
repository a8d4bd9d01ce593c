//! Version information.

/// The crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns `contextflow <version> (<os>/<arch>)`.
#[must_use]
pub fn get_version() -> String {
    format!(
        "contextflow {VERSION} ({}/{})",
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
