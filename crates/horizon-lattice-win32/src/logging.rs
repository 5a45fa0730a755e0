//! Tracing targets used by the Win32 platform layer.
//!
//! All diagnostics go through the `tracing` crate. Install a subscriber in the
//! application and filter with these targets to narrow output to a subsystem:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_lattice_win32::window=debug")
//!     .init();
//! ```

/// Target names for log filtering.
pub mod targets {
    /// Window lifecycle, geometry and state changes.
    pub const WINDOWS: &str = "horizon_lattice_win32::window";
    /// Native messages routed to windows.
    pub const EVENTS: &str = "horizon_lattice_win32::events";
    /// Style derivation and native window creation.
    pub const CREATION: &str = "horizon_lattice_win32::creation";
    /// Native host calls.
    pub const HOST: &str = "horizon_lattice_win32::host";
    /// Drop site registration.
    pub const MIME: &str = "horizon_lattice_win32::mime";
}
