mod cli;
mod logging;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "logwright",
    version,
    about = "Logwright: structured logging pipeline toolkit"
)]
struct Cli {
    /// Print the runtime's own diagnostics (setup, sink faults) as JSON on stderr
    #[arg(long, global = true)]
    diagnostics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Emit a single event through the pipeline
    Emit {
        /// Logger name (dotted)
        #[arg(long, default_value = "logwright.cli")]
        logger: String,

        #[arg(long, default_value = "info")]
        level: String,

        /// Extra fields as key=value; repeatable
        #[arg(long = "field", short = 'f')]
        fields: Vec<String>,

        /// JSON config file; environment variables are used when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        message: String,
    },

    /// Validate a config and print the resolved settings
    Check {
        #[arg(long)]
        config: Option<PathBuf>,

        /// Plain output without colours
        #[arg(long)]
        plain: bool,
    },

    /// Emit events in a tight loop until Ctrl-C or the duration elapses
    Flood {
        #[arg(long, default_value = "logwright.flood")]
        logger: String,

        /// Seconds to run for
        #[arg(long, default_value_t = 5)]
        duration: u64,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Write events to rotating files in this directory instead of stderr
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.diagnostics {
        logging::init_diagnostics();
    }

    let result = match cli.command {
        Command::Emit {
            logger,
            level,
            fields,
            config,
            message,
        } => cli::emit::run(&logger, &level, &fields, config.as_deref(), &message),

        Command::Check { config, plain } => cli::check::run(config.as_deref(), plain),

        Command::Flood {
            logger,
            duration,
            config,
            log_dir,
        } => cli::flood::run(&logger, duration, config.as_deref(), log_dir.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("logwright error: {e:#}");
        std::process::exit(1);
    }
}
