//! vigem-keypad - drive a virtual gamepad from the keyboard
//!
//! Loads the ViGEm client module, plugs in a virtual X360/DS4 controller and
//! maps key events to controller operations.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use vigem_keypad::config::AppConfig;
use vigem_keypad::driver::{DriverLibrary, DriverOpen, MockDriver, TargetProfile};
use vigem_keypad::keymap::KeyMap;
use vigem_keypad::paths::AppPaths;
use vigem_keypad::{cli, VirtualPad};

/// Virtual gamepad driven by keyboard keys through the ViGEm bus driver
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults to the per-user location)
    #[arg(short, long, env = "VIGEM_KEYPAD_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Also write logs to a daily file in the logs directory
    #[arg(long)]
    log_file: bool,

    /// Driver module to load (overrides driver.library)
    #[arg(long, env = "VIGEM_LIBRARY")]
    library: Option<String>,

    /// Controller profile: x360 or ds4 (overrides driver.profile)
    #[arg(long)]
    profile: Option<String>,

    /// Key-map file (overrides keymap.path)
    #[arg(long)]
    keymap: Option<PathBuf>,

    /// Plug in the controller right after loading the driver
    #[arg(long)]
    autostart: bool,

    /// Run against an in-process mock driver
    #[arg(long)]
    mock: bool,

    /// Print the effective key map and exit
    #[arg(long)]
    print_keymap: bool,

    /// Write the default key map to the key-map path and exit
    #[arg(long)]
    write_default_keymap: bool,
}

fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let paths = AppPaths::detect();

    let _guard = init_logging(&args.log_level, args.log_file.then_some(&paths))?;

    info!("Starting vigem-keypad v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Data directory: {} ({})",
        paths.base_dir().display(),
        if paths.is_portable { "portable" } else { "installed" }
    );

    let config_path = args.config.clone().unwrap_or_else(|| paths.config.clone());
    let config = AppConfig::load_or_default(&config_path)?;

    let keymap_path = args
        .keymap
        .clone()
        .or_else(|| config.keymap.path.clone())
        .unwrap_or_else(|| paths.keymap.clone());

    if args.write_default_keymap {
        KeyMap::create_default()
            .write_to_file(&keymap_path)
            .with_context(|| format!("Failed to write {}", keymap_path.display()))?;
        println!("Default key map written to {}", keymap_path.display());
        return Ok(());
    }

    if args.print_keymap {
        let mut pad: VirtualPad<MockDriver> = VirtualPad::new();
        pad.set_key_map(KeyMap::create_from_file(&keymap_path));
        cli::print_keymap(&pad);
        return Ok(());
    }

    if args.mock {
        info!("Using mock driver");
        run::<MockDriver>(&args, &config, &keymap_path)
    } else {
        run::<DriverLibrary>(&args, &config, &keymap_path)
    }
}

fn run<D: DriverOpen>(args: &Args, config: &AppConfig, keymap_path: &Path) -> Result<()> {
    let profile = match &args.profile {
        Some(name) => TargetProfile::parse(name)?,
        None => config.profile()?,
    };
    let library = args.library.as_deref().unwrap_or(&config.driver.library);

    let mut pad: VirtualPad<D> = VirtualPad::new();
    pad.set_default_profile(profile);
    pad.set_key_map(KeyMap::create_from_file(keymap_path));
    pad.lifecycle_mut().set_library_path(library);

    pad.load(None)
        .with_context(|| format!("Failed to load driver module {}", library))?;
    info!("Driver loaded from {}", library);

    if args.autostart || config.driver.autostart {
        if let Err(e) = pad.startup(profile.as_str()) {
            warn!("Autostart failed: {}", e);
        }
    }

    cli::run_repl(&mut pad, keymap_path)?;

    if pad.is_active() {
        pad.shutdown()?;
    }

    if config.keymap.save_on_exit {
        if let Err(e) = pad.key_map().write_to_file(keymap_path) {
            warn!("Failed to save key map: {}", e);
        }
    }

    info!("vigem-keypad shutdown complete");
    Ok(())
}

fn init_logging(level: &str, file_paths: Option<&AppPaths>) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let (file_layer, guard) = match file_paths {
        Some(paths) => {
            paths.ensure_directories()?;
            let appender = tracing_appender::rolling::daily(&paths.logs_dir, "vigem-keypad.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}
