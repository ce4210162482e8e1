use std::io;
use std::path::{Path, PathBuf};

use casiolink::configuration::config::{Config, Overrides};
use casiolink::controller::controller_handler::Controller;
use casiolink::session_management::ListingFormat;
use clap::{Parser, Subcommand};
use log::{error, info};

#[derive(Parser, Debug)]
#[command(name = "casiolink")]
#[command(version)]
#[command(about = "Capture and replay CASIO organiser data over a serial cable")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Serial port, overrides the configuration file
    #[arg(long, env = "CASIOLINK_PORT")]
    port: Option<String>,

    #[arg(long)]
    baud_rate: Option<u32>,

    /// Inactivity timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Receive records from the organiser and store them in FILE
    Capture { file: PathBuf },
    /// Send the records stored in FILE to the organiser
    Replay { file: PathBuf },
    /// Print the records stored in FILE
    Print {
        file: PathBuf,
        /// One JSON object per record
        #[arg(long)]
        json: bool,
    },
}

impl Args {
    fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port.clone(),
            baud_rate: self.baud_rate,
            inactivity_timeout_ms: self.timeout_ms,
        }
    }
}

fn load_config(args: &Args) -> Result<Config, casiolink::error_handling::types::ConfigError> {
    let config = match args.config {
        Some(ref path) => Config::from_file(Path::new(path))?,
        None => Config::default(),
    };
    config.with_overrides(args.overrides())
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level())
        .format_target(false)
        .init();

    let config = load_config(&args).unwrap_or_else(|e| {
        error!("Unable to import configuration: {}", e);
        std::process::exit(1);
    });
    info!("Configuration imported successfully");

    let controller = Controller::new(config);
    let result = match args.command {
        Command::Capture { ref file } => controller.capture(file).map(|_| ()),
        Command::Replay { ref file } => controller.replay(file).map(|_| ()),
        Command::Print { ref file, json } => {
            let format = if json {
                ListingFormat::Json
            } else {
                ListingFormat::Text
            };
            controller
                .print(file, format, &mut io::stdout().lock())
                .map(|_| ())
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
