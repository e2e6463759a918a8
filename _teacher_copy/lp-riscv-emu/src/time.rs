//! Time mode for emulator time control

/// Time mode for controlling how time advances in the emulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeMode {
    /// Use real wall-clock time (default behavior)
    RealTime,
    /// Use simulated time that can be advanced manually
    Simulated(u32), // Current simulated time in milliseconds
}

impl Default for TimeMode {
    fn default() -> Self {
        TimeMode::RealTime
    }
}
