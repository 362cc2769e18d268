use clap::Parser;
use enron_prep::{
    state, Cli, EnronPrep, OutputFormatter, OutputMode, PipelineState, PrepError,
    UserFriendlyError,
};
use std::process;

const START_MESSAGE: &str = "Downloading Enron emails in the Downloads folder...";
const DONE_MESSAGE: &str = "Download, unzip, and save to pickle done!";

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    // Parse CLI arguments
    let cli = Cli::parse();
    setup_logging(cli.verbosity_level(), cli.quiet);

    // Handle special commands first
    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let prep = match EnronPrep::from_cli(&cli) {
        Ok(prep) => prep,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    if cli.dry_run {
        return handle_dry_run(&prep);
    }

    let formatter = prep.output_formatter();
    formatter.start_operation(START_MESSAGE);

    match prep.run() {
        Ok(report) => {
            formatter.print_run_report(&report);
            formatter.success(DONE_MESSAGE);
            0
        }
        Err(e) => {
            prep.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

/// Map error types to process exit codes
fn exit_code_for(error: &PrepError) -> i32 {
    match error {
        PrepError::Cancelled => 130, // Interrupted (SIGINT)
        PrepError::Config { .. } | PrepError::InvalidUrl { .. } | PrepError::HomeNotSet => 2,
        PrepError::Network { .. } | PrepError::HttpStatus { .. } | PrepError::Timeout { .. } => 5,
        PrepError::Archive { .. }
        | PrepError::AmbiguousLabel { .. }
        | PrepError::Serialization { .. } => 6,
        PrepError::Io(_) => 7,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "enron-prep.toml".to_string());

    match EnronPrep::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  enron-prep --config {}", config_path);
            println!("\nEdit the file to change the download location, mirror or labeling policy.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            exit_code_for(&e)
        }
    }
}

fn handle_dry_run(prep: &EnronPrep) -> i32 {
    let formatter = prep.output_formatter();
    let config = prep.config();
    let layout = prep.layout();

    formatter.print_header("DRY RUN - nothing will be downloaded or written");
    formatter.print_separator();

    println!("  Downloads directory: {}", layout.downloads_dir.display());
    println!("  Archive directory:   {}", layout.archive_dir.display());
    println!("  Dataset file:        {}", layout.dataset_path.display());
    println!("  Base URL:            {}", config.source.base_url);
    println!("  Ambiguous entries:   {}", config.labels.on_ambiguous.as_str());
    println!("  Verify archives:     {}", config.fetch.verify_archives);
    println!("  Download timeout:    {} seconds", config.fetch.timeout);

    formatter.print_separator();

    let current = prep.state();
    println!("  Current state: {}", current);

    for archive in state::missing_archives(layout) {
        println!("  Would download: {}", archive.name);
    }

    match current {
        PipelineState::DatasetBuilt => {
            println!("  Dataset already present, it would not be rebuilt");
        }
        _ => {
            println!(
                "  Would build the dataset from {} archives",
                layout.archives.len()
            );
        }
    }

    formatter.print_separator();
    formatter.success("Dry run completed successfully");
    formatter.info("Run without --dry-run to download and build the dataset");

    0
}

fn print_startup_error(error: &PrepError) {
    // Create a basic formatter for startup errors
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

fn setup_logging(verbosity: u8, quiet: bool) {
    let level = match (quiet, verbosity) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "enron_prep=info,warn",
        (false, _) => "enron_prep=debug,info",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
