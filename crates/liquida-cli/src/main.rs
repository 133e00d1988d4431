mod commands;
mod output;

use clap::{Parser, Subcommand};
use commands::SettingsArgs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "liquida",
    version,
    about = "Extract and cross-check provincial treasury liquidación PDFs"
)]
struct Cli {
    /// Log merge decisions and skipped rows (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract records, year summaries and totals from a liquidación PDF
    Extract {
        /// Path to the PDF
        input_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the extracted document to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Check year summaries and grand totals against the extracted records
    Validate {
        /// Path to a PDF or a previously extracted JSON document
        input_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Inspect table-detector presets
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// List predefined detector presets
    List,
    /// Print a preset's settings as JSON
    Show {
        /// Preset name (e.g., "lines-strict")
        preset: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Extract {
            input_file,
            output,
            out,
            settings,
        } => commands::extract::run(input_file, &output, out, &settings).map(|()| true),
        Commands::Validate {
            input_file,
            output,
            settings,
        } => commands::validate::run(input_file, &output, &settings),
        Commands::Settings { action } => match action {
            SettingsAction::List => commands::settings::list(),
            SettingsAction::Show { preset } => commands::settings::show(&preset),
        }
        .map(|()| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
