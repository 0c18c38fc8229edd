use cadence_cli::CliContext;
use cadence_cli::commands::{self, RecordFlags};
use cadence_cli::logging;
use cadence_cli::readline;
use cadence_core::TimerId;
use clap::{Args, Parser, Subcommand};
use std::io::Write;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), String> {
    logging::init();
    let mut ctx = CliContext::new();

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &mut ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                writeln!(std::io::stdout(), "{}", err.trim_end()).map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(version, about = "timer registry sandbox")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct TimerFlags {
    /// Restart automatically each time the timer completes
    #[arg(short, long)]
    looping: bool,
    /// Measure against unscaled time
    #[arg(short, long)]
    unscaled: bool,
    #[arg(long)]
    label: Option<String>,
    /// Print on-updated progress every tick
    #[arg(short, long)]
    progress: bool,
}

impl From<&TimerFlags> for RecordFlags {
    fn from(flags: &TimerFlags) -> Self {
        Self {
            looping: flags.looping,
            unscaled: flags.unscaled,
            label: flags.label.clone(),
            progress: flags.progress,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start a timer of DURATION seconds
    Record {
        duration: f64,
        #[command(flatten)]
        flags: TimerFlags,
    },
    /// Start a timer bound to a named owner
    Bind {
        owner: String,
        duration: f64,
        #[command(flatten)]
        flags: TimerFlags,
    },
    /// Create an inactive timer; `start` registers it
    Create {
        #[command(flatten)]
        flags: TimerFlags,
    },
    Owner {
        #[command(subcommand)]
        action: OwnerAction,
    },
    /// Step the clock and sweep the registry
    Tick {
        #[arg(default_value_t = 1)]
        frames: u32,
        /// Seconds per frame (defaults to the configured frame rate)
        #[arg(short, long)]
        dt: Option<f64>,
    },
    /// Set the time scale (0 pauses scaled time)
    Scale { value: f64 },
    Cancel { id: TimerId },
    Suspend { id: TimerId },
    Resume { id: TimerId },
    Restart { id: TimerId },
    Start { id: TimerId, duration: f64 },
    Extend { id: TimerId, secs: f64 },
    /// Complete the timer on the next tick
    Force { id: TimerId },
    List,
    CancelAll,
    SuspendAll,
    ResumeAll,
    /// Drop every timer without callbacks
    Clear,
    /// Drive the registry in real time for SECONDS
    Play { seconds: f64 },
    Config {
        /// Load settings from a TOML file
        #[arg(long)]
        load: Option<String>,
        /// Save settings to a TOML file
        #[arg(long, conflicts_with = "store")]
        save: Option<String>,
        /// Save settings to the per-user config
        #[arg(long)]
        store: bool,
    },
    Exit,
}

#[derive(Subcommand)]
enum OwnerAction {
    Add { name: String },
    Enable { name: String },
    Disable { name: String },
    /// Destroy the owner; its timers are evicted on the next tick
    #[command(name = "drop")]
    Remove { name: String },
}

async fn respond(line: &str, ctx: &mut CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "cadence".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match &cli.command {
        Some(Commands::Record { duration, flags }) => {
            commands::record(ctx, *duration, &flags.into())?
        }
        Some(Commands::Bind {
            owner,
            duration,
            flags,
        }) => commands::bind(ctx, owner, *duration, &flags.into())?,
        Some(Commands::Create { flags }) => commands::create(ctx, &flags.into())?,
        Some(Commands::Owner { action }) => match action {
            OwnerAction::Add { name } => commands::owner_add(ctx, name)?,
            OwnerAction::Enable { name } => commands::owner_set_enabled(ctx, name, true)?,
            OwnerAction::Disable { name } => commands::owner_set_enabled(ctx, name, false)?,
            OwnerAction::Remove { name } => commands::owner_drop(ctx, name)?,
        },
        Some(Commands::Tick { frames, dt }) => commands::tick(ctx, *frames, *dt)?,
        Some(Commands::Scale { value }) => commands::scale(ctx, *value)?,
        Some(Commands::Cancel { id }) => commands::cancel(ctx, *id)?,
        Some(Commands::Suspend { id }) => commands::suspend(ctx, *id)?,
        Some(Commands::Resume { id }) => commands::resume(ctx, *id)?,
        Some(Commands::Restart { id }) => commands::restart(ctx, *id)?,
        Some(Commands::Start { id, duration }) => commands::start(ctx, *id, *duration)?,
        Some(Commands::Extend { id, secs }) => commands::extend(ctx, *id, *secs)?,
        Some(Commands::Force { id }) => commands::force(ctx, *id)?,
        Some(Commands::List) => commands::list(ctx),
        Some(Commands::CancelAll) => commands::cancel_all(ctx),
        Some(Commands::SuspendAll) => commands::suspend_all(ctx),
        Some(Commands::ResumeAll) => commands::resume_all(ctx),
        Some(Commands::Clear) => commands::clear(ctx),
        Some(Commands::Play { seconds }) => commands::play(ctx, *seconds).await?,
        Some(Commands::Config { load, save, store }) => {
            if let Some(path) = load {
                commands::load_config(ctx, path)?;
            }
            if let Some(path) = save {
                commands::save_config(ctx, Some(path))?;
            } else if *store {
                commands::save_config(ctx, None)?;
            }
            commands::show_config(ctx);
        }
        Some(Commands::Exit) => {
            commands::exit()?;
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
