//! pagecheck - UI-readiness verification harness
//!
//! Main entry point for the CLI application.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pagecheck::cli::{self, commands, OutputFormat};
use pagecheck::Config;

/// pagecheck - browser smoke checks for a locally served site
#[derive(Parser, Debug)]
#[command(name = "pagecheck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page under test (overrides TARGET_URL)
    #[arg(long, short = 't', global = true)]
    target_url: Option<String>,

    /// Run in headed browser mode (visible window)
    #[arg(long, global = true)]
    headed: bool,

    /// Enable debug output
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run scenarios (all of them when no name is given)
    Run {
        /// Scenario names
        names: Vec<String>,

        /// Load scenarios from a TOML file instead of the built-in set
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,

        /// How many scenarios may run at once
        #[arg(long, short = 'j')]
        concurrency: Option<usize>,

        /// Directory receiving screenshots
        #[arg(long, short = 'o')]
        output_dir: Option<PathBuf>,

        /// Open screenshots once the run is over
        #[arg(long)]
        open: bool,
    },
    /// List scenarios and their steps
    List {
        /// Load scenarios from a TOML file instead of the built-in set
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },
    /// Show or write the configuration file
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    cli::init_logging(args.debug);

    // Build configuration; validated once the CLI overrides are in
    let mut config = Config::load()?;

    // Apply CLI overrides
    if let Some(ref url) = args.target_url {
        config.target.url = url.clone();
    }

    if args.headed {
        config.browser.headed = true;
    }

    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let command = args.command.unwrap_or(Command::Run {
        names: vec![],
        file: None,
        concurrency: None,
        output_dir: None,
        open: false,
    });

    match command {
        Command::Run {
            names,
            file,
            concurrency,
            output_dir,
            open,
        } => {
            if let Some(n) = concurrency {
                config.run.concurrency = n;
            }
            if let Some(dir) = output_dir {
                config.run.output_dir = dir;
            }
            config.validate()?;

            let scenarios = commands::select_scenarios(&config, file.as_deref(), &names)?;
            let code = commands::run(&config, &scenarios, format, open).await?;
            Ok(ExitCode::from(code))
        }
        Command::List { file } => {
            config.validate()?;
            let scenarios = commands::select_scenarios(&config, file.as_deref(), &[])?;
            print!("{}", commands::list(&scenarios));
            Ok(ExitCode::SUCCESS)
        }
        Command::Config { init } => {
            if init {
                config.validate()?;
                let path = config.save()?;
                println!("Configuration written to {}", path.display());
            } else {
                println!("# {}", Config::config_file().display());
                print!("{}", config.to_toml());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
