use std::time::Duration;

use cadence_core::{
    AppConfig, AppConfigExt, ClockSource, TimerCallbacks, TimerEvent, TimerHandle, TimerId,
    TimerOptions, Validate,
};
use cadence_types::TimerSnapshot;
use tracing::info;

use crate::context::{CliContext, SandboxOwner};

/// Flags shared by `record` and `bind`
#[derive(Debug, Clone, Default)]
pub struct RecordFlags {
    pub looping: bool,
    pub unscaled: bool,
    pub label: Option<String>,
    pub progress: bool,
}

impl RecordFlags {
    fn options(&self) -> TimerOptions {
        let mut options = TimerOptions::new();
        if self.looping {
            options = options.looping();
        }
        if self.unscaled {
            options = options.unscaled();
        }
        if let Some(label) = &self.label {
            options = options.labeled(label.clone());
        }
        options
    }
}

fn describe(timer: &TimerHandle) -> String {
    match timer.label() {
        Some(label) => format!("timer {} ({label})", timer.id()),
        None => format!("timer {}", timer.id()),
    }
}

/// Callbacks that print every lifecycle event as it fires
fn printing_callbacks(progress: bool) -> TimerCallbacks {
    let mut callbacks = TimerCallbacks::new();
    for event in TimerEvent::ALL {
        callbacks = callbacks.on(event, move |timer| {
            println!("[t={:.3}] {} {}", timer.now(), describe(timer), event.label());
        });
    }
    if progress {
        callbacks = callbacks.on_updated(|timer, pct| {
            println!("[t={:.3}] {} {:.0}%", timer.now(), describe(timer), pct * 100.0);
        });
    }
    callbacks
}

fn track(ctx: &mut CliContext, timer: TimerHandle) {
    println!(
        "{} ends at {:.3} ({} clock)",
        describe(&timer),
        timer.end_time(),
        if timer.uses_unscaled_clock() {
            "unscaled"
        } else {
            "scaled"
        }
    );
    ctx.timers.insert(timer.id(), timer);
}

// ─── Timers ─────────────────────────────────────────────────────────────────

pub fn record(ctx: &mut CliContext, duration: f64, flags: &RecordFlags) -> Result<(), String> {
    let timer = ctx.registry.record(
        duration,
        printing_callbacks(flags.progress),
        flags.options(),
    );
    track(ctx, timer);
    Ok(())
}

pub fn bind(
    ctx: &mut CliContext,
    owner: &str,
    duration: f64,
    flags: &RecordFlags,
) -> Result<(), String> {
    let owner = ctx.owner(owner)?.clone();
    let timer = ctx.registry.bind(
        &owner,
        duration,
        printing_callbacks(flags.progress),
        flags.options(),
    );
    track(ctx, timer);
    Ok(())
}

pub fn create(ctx: &mut CliContext, flags: &RecordFlags) -> Result<(), String> {
    let timer = ctx
        .registry
        .create(printing_callbacks(flags.progress), flags.options());
    println!("{} created (inactive)", describe(&timer));
    ctx.timers.insert(timer.id(), timer);
    Ok(())
}

pub fn cancel(ctx: &CliContext, id: TimerId) -> Result<(), String> {
    ctx.timer(id)?.cancel();
    Ok(())
}

pub fn suspend(ctx: &CliContext, id: TimerId) -> Result<(), String> {
    ctx.timer(id)?.suspend(true);
    Ok(())
}

pub fn resume(ctx: &CliContext, id: TimerId) -> Result<(), String> {
    ctx.timer(id)?.resume();
    Ok(())
}

pub fn restart(ctx: &CliContext, id: TimerId) -> Result<(), String> {
    ctx.timer(id)?.restart();
    Ok(())
}

pub fn start(ctx: &CliContext, id: TimerId, duration: f64) -> Result<(), String> {
    let timer = ctx.timer(id)?;
    timer.start(duration);
    println!("{} ends at {:.3}", describe(timer), timer.end_time());
    Ok(())
}

pub fn extend(ctx: &CliContext, id: TimerId, secs: f64) -> Result<(), String> {
    if secs.is_nan() || secs <= 0.0 {
        return Err(format!("extension must be positive, got {secs}"));
    }
    let timer = ctx.timer(id)?;
    timer.extend(secs);
    println!("{} ends at {:.3}", describe(timer), timer.end_time());
    Ok(())
}

pub fn force(ctx: &CliContext, id: TimerId) -> Result<(), String> {
    ctx.timer(id)?.force_completion();
    Ok(())
}

pub fn cancel_all(ctx: &CliContext) {
    ctx.registry.cancel_all();
}

pub fn suspend_all(ctx: &CliContext) {
    ctx.registry.suspend_all();
}

pub fn resume_all(ctx: &CliContext) {
    ctx.registry.resume_all();
}

pub fn clear(ctx: &mut CliContext) {
    let count = ctx.registry.len();
    ctx.registry.clear();
    println!("dropped {count} timers");
}

// ─── Owners ─────────────────────────────────────────────────────────────────

pub fn owner_add(ctx: &mut CliContext, name: &str) -> Result<(), String> {
    if ctx.owners.contains_key(name) {
        return Err(format!("owner '{name}' already exists"));
    }
    ctx.owners
        .insert(name.to_string(), SandboxOwner::new(name));
    println!("owner '{name}' added");
    Ok(())
}

pub fn owner_set_enabled(ctx: &CliContext, name: &str, enabled: bool) -> Result<(), String> {
    ctx.owner(name)?.set_enabled(enabled);
    println!(
        "owner '{name}' {}",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// Drop the owner. Its timers are evicted on the next tick.
pub fn owner_drop(ctx: &mut CliContext, name: &str) -> Result<(), String> {
    ctx.owners
        .remove(name)
        .ok_or_else(|| format!("no owner named '{name}'"))?;
    println!("owner '{name}' dropped");
    Ok(())
}

// ─── Clock ──────────────────────────────────────────────────────────────────

/// Step `frames` frames of `dt` seconds (default: one configured frame)
pub fn tick(ctx: &CliContext, frames: u32, dt: Option<f64>) -> Result<(), String> {
    let dt = dt.unwrap_or_else(|| ctx.config.driver.frame_secs());
    if dt.is_nan() || dt < 0.0 {
        return Err(format!("frame delta must be >= 0, got {dt}"));
    }
    for _ in 0..frames {
        ctx.tick(dt);
    }
    print_clock(ctx);
    Ok(())
}

pub fn scale(ctx: &CliContext, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("time scale must be a finite value >= 0, got {value}"));
    }
    ctx.clock.set_time_scale(value);
    println!("time scale {:.3}", ctx.clock.time_scale());
    Ok(())
}

/// Longest stretch `play` will drive in one call
pub const MAX_PLAY_SECS: f64 = 3600.0;

/// Whole frames covering `seconds`, rounded to the nearest frame (at least one)
pub fn frames_for(seconds: f64, frame_secs: f64) -> Result<u64, String> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(format!("duration must be positive, got {seconds}"));
    }
    if seconds > MAX_PLAY_SECS {
        return Err(format!(
            "duration must be at most {MAX_PLAY_SECS} seconds, got {seconds}"
        ));
    }
    Ok((seconds / frame_secs).round().max(1.0) as u64)
}

/// Drive the registry in real time for `seconds` at the configured rate
pub async fn play(ctx: &CliContext, seconds: f64) -> Result<(), String> {
    let frame_secs = ctx.config.driver.frame_secs();
    let frames = frames_for(seconds, frame_secs)?;

    info!(seconds, frames, fps = ctx.config.driver.frames_per_second, "playing");
    let mut interval = tokio::time::interval(Duration::from_secs_f64(frame_secs));
    // First tick completes immediately
    interval.tick().await;
    for _ in 0..frames {
        interval.tick().await;
        ctx.tick(frame_secs);
    }
    print_clock(ctx);
    Ok(())
}

fn print_clock(ctx: &CliContext) {
    println!(
        "t={:.3} (unscaled {:.3}, scale {:.3}, tick {}), {} timers registered",
        ctx.clock.scaled_time(),
        ctx.clock.unscaled_time(),
        ctx.clock.time_scale(),
        ctx.registry.tick_count(),
        ctx.registry.len()
    );
}

// ─── Inspection ─────────────────────────────────────────────────────────────

pub fn list(ctx: &CliContext) {
    if ctx.timers.is_empty() {
        println!("No timers");
        return;
    }

    let mut snapshots: Vec<TimerSnapshot> =
        ctx.timers.values().map(TimerHandle::snapshot).collect();
    snapshots.sort_by_key(|s| s.id);

    println!(
        "{:<5} {:<16} {:<10} {:<9} {:>9} {:>6}  Flags",
        "Id", "Label", "State", "Clock", "Remaining", "Done"
    );
    println!("{}", "-".repeat(72));

    for snap in &snapshots {
        let mut flags = Vec::new();
        if snap.looping {
            flags.push("loop");
        }
        if snap.suspended_manually {
            flags.push("manual");
        }
        if snap.has_owner {
            flags.push("owned");
        }
        if !snap.registered {
            flags.push("evicted");
        }
        println!(
            "{:<5} {:<16} {:<10} {:<9} {:>9.3} {:>5.0}%  {}",
            snap.id,
            snap.label.as_deref().unwrap_or("-"),
            snap.state,
            format!("{:?}", snap.clock).to_lowercase(),
            snap.time_remaining,
            snap.percent_done * 100.0,
            flags.join(",")
        );
    }

    println!("\nRegistered: {} of {}", ctx.registry.len(), snapshots.len());
    if !ctx.owners.is_empty() {
        let mut names: Vec<_> = ctx.owners.keys().cloned().collect();
        names.sort();
        println!("Owners: {}", names.join(", "));
    }
}

// ─── Config ─────────────────────────────────────────────────────────────────

pub fn show_config(ctx: &CliContext) {
    let registry = &ctx.config.registry;
    let driver = &ctx.config.driver;
    println!("tie_break_threshold_secs: {}", registry.tie_break_threshold_secs);
    println!("initial_capacity: {}", registry.initial_capacity);
    println!("frames_per_second: {}", driver.frames_per_second);
    println!("time_scale: {}", driver.time_scale);
}

pub fn load_config(ctx: &mut CliContext, path: &str) -> Result<(), String> {
    let config = AppConfig::load_file(path.as_ref()).map_err(|e| e.to_string())?;
    ctx.apply_config(config)?;
    println!("loaded {path}");
    Ok(())
}

pub fn save_config(ctx: &CliContext, path: Option<&str>) -> Result<(), String> {
    ctx.config.validate().map_err(|e| e.to_string())?;
    match path {
        Some(path) => {
            ctx.config
                .save_file(path.as_ref())
                .map_err(|e| e.to_string())?;
            println!("saved {path}");
        }
        None => {
            ctx.config.save().map_err(|e| e.to_string())?;
            println!("saved user config");
        }
    }
    Ok(())
}

pub fn exit() -> Result<(), String> {
    println!("quitting...");
    Ok(())
}
