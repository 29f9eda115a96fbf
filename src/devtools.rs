/// Switches for the `tracing` events emitted by the reactive engine.
///
/// All switches are on by default. Events are emitted at `debug` or `trace` level,
/// so an installed subscriber still decides what is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Devtools {
    /// Signal writes and reactive property writes.
    pub log_updates: bool,
    /// Effect runs and watch callbacks.
    pub log_effects: bool,
    /// Async signal fetches.
    pub log_async: bool,
}

impl Devtools {
    /// All events disabled.
    pub const SILENT: Self = Self {
        log_updates: false,
        log_effects: false,
        log_async: false,
    };

    /// Returns the switches of the current thread's runtime.
    pub fn current() -> Self {
        crate::core::devtools()
    }
}

impl Default for Devtools {
    fn default() -> Self {
        Self {
            log_updates: true,
            log_effects: true,
            log_async: true,
        }
    }
}
