use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(version)]
#[command(
    about = "Layer-by-layer dissector for packet captures (Ethernet / IPv4 / UDP).",
    long_about = None,
    after_help = "Examples:\n  strata pcap dissect capture.pcap -o report.json\n  strata pcap dissect capture.pcapng --stdout --pretty\n  strata pcap dissect capture.pcap --stdout --dump"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on PCAP/PCAPNG inputs.
    Pcap {
        #[command(subcommand)]
        command: PcapCommands,
    },
}

#[derive(Subcommand, Debug)]
enum PcapCommands {
    /// Dissect a capture file and generate a versioned JSON report.
    #[command(
        after_help = "Examples:\n  strata pcap dissect capture.pcap -o report.json\n  strata pcap dissect capture.pcapng --stdout --pretty"
    )]
    Dissect {
        /// Path to a .pcap or .pcapng file
        input: PathBuf,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Print each packet's layer tree to stderr
        #[arg(long)]
        dump: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,

        /// Exit with a non-zero code if illegal data is present
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Pcap { command } => match command {
            PcapCommands::Dissect {
                input,
                report,
                stdout,
                pretty,
                compact,
                dump,
                quiet,
                strict,
            } => cmd_pcap_dissect(input, report, stdout, pretty, compact, dump, quiet, strict),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(err.to_string(), None)
    }
}

fn cmd_pcap_dissect(
    input: PathBuf,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    dump: bool,
    quiet: bool,
    strict: bool,
) -> Result<(), CliError> {
    validate_input_file(&input)?;
    let report = if stdout {
        None
    } else {
        Some(report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?)
    };

    let meta = fs::metadata(&input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    if !meta.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }

    let rep = strata_core::dissect_pcap_file(&input).context("PCAP/PCAPNG dissection failed")?;
    let json = serialize_report(&rep, pretty, compact)?;

    if dump {
        dump_packets(&input)?;
    }

    if stdout {
        print!("{}", json);
        return strict_outcome(&rep, strict);
    }

    let report = report.expect("report required when not using stdout");
    if let Some(parent) = report.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }

    fs::write(&report, json)
        .with_context(|| format!("Failed to write report: {}", report.display()))?;

    if !quiet {
        eprintln!("OK: report written -> {}", report.display());
    }
    strict_outcome(&rep, strict)
}

fn strict_outcome(rep: &strata_core::Report, strict: bool) -> Result<(), CliError> {
    if strict && rep.capture_summary.packets_with_illegal_data > 0 {
        return Err(CliError::new(
            format!(
                "illegal data detected in {} packet(s)",
                rep.capture_summary.packets_with_illegal_data
            ),
            Some("use --dump to inspect the failing layers".to_string()),
        ));
    }
    Ok(())
}

fn serialize_report(
    rep: &strata_core::Report,
    pretty: bool,
    compact: bool,
) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn dump_packets(input: &PathBuf) -> Result<(), CliError> {
    use strata_core::{FrameSource, PcapFileSource, default_registry, dissect_frame};

    let mut source =
        PcapFileSource::open(input).context("Failed to reopen input for --dump")?;
    let mut index = 0u64;
    while let Some(event) = source.next_frame().context("Failed to read frame")? {
        let packet = match dissect_frame(
            default_registry(),
            strata_core::linktype_code(event.linktype),
            &event.data,
            0,
            event.data.len(),
        ) {
            Ok(packet) => packet,
            Err(_) => continue,
        };
        eprintln!("packet {index} ({} bytes)", packet.len());
        eprintln!("{packet}");
        index += 1;
    }
    Ok(())
}

fn validate_input_file(input: &PathBuf) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pcap" && ext != "pcapng" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap or .pcapng file".to_string()),
        ));
    }
    Ok(())
}
