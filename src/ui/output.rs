use crate::dataset::BuildOutcome;
use crate::error::{PrepError, UserFriendlyError};
use crate::fetcher::FetchSummary;
use crate::ui::progress::format_duration;
use crate::RunReport;
use console::{style, Emoji, Term};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static INBOX: Emoji = Emoji("📥 ", "> ");
static SPARKLES: Emoji = Emoji("✨ ", "* ");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    // Core messaging methods
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn debug(&self, message: &str) {
        if self.should_show_message(2) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}", style(format!("DEBUG: {}", message)).dim());
                    } else {
                        println!("DEBUG: {}", message);
                    }
                }
                OutputMode::Json => self.print_json_message("debug", message),
                OutputMode::Plain => println!("DEBUG: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", INBOX, style(operation).bold());
                    } else {
                        println!("{}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    // User-friendly error handling
    pub fn print_user_friendly_error(&self, error: &PrepError) {
        let user_message = error.user_message();
        self.error(&user_message);

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => {
                    eprintln!("SUGGESTION: {}", suggestion);
                }
            }
        }
    }

    // Summary and reporting
    pub fn print_run_report(&self, report: &RunReport) {
        match self.mode {
            OutputMode::Human => {
                if self.should_show_message(1) {
                    self.print_human_report(report);
                }
            }
            OutputMode::Json => {
                let json_output = serde_json::to_string_pretty(&serde_json::json!({
                    "type": "report",
                    "report": report,
                    "timestamp": chrono::Utc::now().to_rfc3339()
                }))
                .unwrap_or_else(|_| "{}".to_string());
                println!("{}", json_output);
            }
            OutputMode::Plain => {
                if !self.quiet {
                    self.print_plain_report(report);
                }
            }
        }
    }

    pub fn print_header(&self, title: &str) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                println!();
                if self.use_colors {
                    println!("{} {}", SPARKLES, style(title).bold().cyan());
                } else {
                    println!("=== {} ===", title);
                }
                println!();
            }
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "header",
                    "title": title
                }));
            }
            OutputMode::Plain => {
                println!("=== {} ===", title);
            }
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => {
                println!("{}", "-".repeat(60));
            }
            OutputMode::Json => {} // No separator in JSON mode
        }
    }

    // Private helper methods
    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        if self.use_colors {
            let (emoji, styled) = match msg_type {
                MessageType::Success => (&CHECKMARK, style(message).green().bold()),
                MessageType::Error => (&CROSS, style(message).red().bold()),
                MessageType::Warning => (&WARNING, style(message).yellow().bold()),
                MessageType::Info => (&INFO, style(message).cyan()),
            };

            match msg_type {
                MessageType::Error => eprintln!("{}{}", emoji, styled),
                _ => println!("{}{}", emoji, styled),
            }
        } else {
            match msg_type {
                MessageType::Success => println!("{}", message),
                MessageType::Error => eprintln!("✗ {}", message),
                MessageType::Warning => println!("! {}", message),
                MessageType::Info => println!("i {}", message),
            }
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_human_report(&self, report: &RunReport) {
        self.print_separator();
        println!("  State before:  {}", report.state_before);
        println!("  Archives:      {}", describe_fetch(&report.fetch));
        println!("  Dataset:       {}", describe_build(&report.build));

        if let BuildOutcome::Built(ref summary) = report.build {
            for archive in &summary.archives {
                println!(
                    "    {:<16} {:>6} ham {:>6} spam",
                    archive.name, archive.ham, archive.spam
                );
            }
        }

        println!("  State after:   {}", report.state_after);
        self.print_separator();
    }

    fn print_plain_report(&self, report: &RunReport) {
        println!("STATE_BEFORE: {}", report.state_before);
        println!("DOWNLOADED: {}", report.fetch.downloaded.len());
        println!("REPLACED: {}", report.fetch.replaced.len());
        println!("SKIPPED: {}", report.fetch.skipped.len());
        match report.build {
            BuildOutcome::Skipped { ref path } => {
                println!("DATASET: skipped ({})", path.display());
            }
            BuildOutcome::Built(ref summary) => {
                println!("DATASET: built ({})", summary.output_path.display());
                println!("RECORDS: {}", summary.total_records);
                println!("HAM: {}", summary.ham);
                println!("SPAM: {}", summary.spam);
                println!("Duration: {:?}", summary.duration);
            }
        }
        println!("STATE_AFTER: {}", report.state_after);
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

fn describe_fetch(fetch: &FetchSummary) -> String {
    let present = fetch.skipped.len();
    let retrieved = fetch.retrievals();

    if retrieved == 0 {
        return format!("all {} already present", present);
    }

    let mut description = format!(
        "{} downloaded ({}) in {}",
        fetch.downloaded.len(),
        format_bytes(fetch.bytes_downloaded),
        format_duration(fetch.duration)
    );
    if !fetch.replaced.is_empty() {
        description.push_str(&format!(", {} replaced", fetch.replaced.len()));
    }
    if present > 0 {
        description.push_str(&format!(", {} already present", present));
    }
    description
}

fn describe_build(build: &BuildOutcome) -> String {
    match build {
        BuildOutcome::Skipped { path } => {
            format!("already present at {}, not rebuilt", path.display())
        }
        BuildOutcome::Built(summary) => format!(
            "{} records ({} ham, {} spam, {}) written to {} in {}",
            summary.total_records,
            summary.ham,
            summary.spam,
            format_bytes(summary.bytes),
            summary.output_path.display(),
            format_duration(summary.duration)
        ),
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
