use std::cell::Cell;
use std::rc::Rc;

use cadence_core::{
    AppConfig, AppConfigExt, FrameClock, TimerHandle, TimerId, TimerOwner, TimerRegistry,
};
use hashbrown::HashMap;

/// Named stand-in for an entity that owns timers.
///
/// Dropping the last `Rc` is what "destroys" the owner; the registry only
/// holds a weak reference.
#[derive(Debug)]
pub struct SandboxOwner {
    pub name: String,
    enabled: Cell<bool>,
}

impl SandboxOwner {
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            enabled: Cell::new(true),
        })
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }
}

impl TimerOwner for SandboxOwner {
    fn is_enabled(&self) -> bool {
        self.enabled.get()
    }
}

/// Holds all state for the CLI sandbox.
///
/// Everything is single-threaded, so the REPL and `play` run on a
/// current-thread runtime.
pub struct CliContext {
    pub config: AppConfig,
    pub clock: Rc<FrameClock>,
    pub registry: TimerRegistry,
    /// Every timer the user created, including ones already evicted, so they
    /// can still be restarted or inspected by id.
    pub timers: HashMap<TimerId, TimerHandle>,
    pub owners: HashMap<String, Rc<SandboxOwner>>,
}

impl CliContext {
    /// Context using the per-user config
    pub fn new() -> Self {
        Self::with_config(AppConfig::load())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let clock = Rc::new(FrameClock::with_time_scale(config.driver.time_scale));
        let registry = TimerRegistry::with_config(clock.clone(), config.registry.clone());
        Self {
            config,
            clock,
            registry,
            timers: HashMap::new(),
            owners: HashMap::new(),
        }
    }

    /// Swap in a new config. Registry settings need a fresh registry, which
    /// is only allowed while no timer is registered.
    pub fn apply_config(&mut self, config: AppConfig) -> Result<(), String> {
        if config.registry != self.config.registry {
            if !self.registry.is_empty() {
                return Err(
                    "registry settings changed; cancel or clear all timers first".to_string(),
                );
            }
            self.registry = TimerRegistry::with_config(self.clock.clone(), config.registry.clone());
            self.timers.clear();
        }
        self.clock.set_time_scale(config.driver.time_scale);
        self.config = config;
        Ok(())
    }

    pub fn timer(&self, id: TimerId) -> Result<&TimerHandle, String> {
        self.timers
            .get(&id)
            .ok_or_else(|| format!("no timer with id {id}"))
    }

    pub fn owner(&self, name: &str) -> Result<&Rc<SandboxOwner>, String> {
        self.owners
            .get(name)
            .ok_or_else(|| format!("no owner named '{name}'"))
    }

    /// Step the clock by `dt` and sweep once
    pub fn tick(&self, dt: f64) {
        self.clock.step(dt);
        self.registry.advance();
    }
}

impl Default for CliContext {
    fn default() -> Self {
        Self::new()
    }
}
