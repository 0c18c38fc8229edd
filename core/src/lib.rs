pub mod clock;
pub mod config;
pub mod error;
pub mod timers;

// Re-exports for convenience
pub use cadence_types::{ClockKind, TimerSnapshot, TimerState};
pub use clock::{ClockSource, FrameClock};
pub use config::{AppConfig, AppConfigExt, DriverConfig, RegistryConfig, Validate};
pub use error::ConfigError;
pub use timers::{
    Timer, TimerCallbacks, TimerEvent, TimerHandle, TimerId, TimerOptions, TimerOwner,
    TimerRegistry,
};
