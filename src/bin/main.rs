//! CLI tool for Disk Model (diskmodel)

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "diskmodel")]
#[command(about = "Disk Model: print the model name of every attached disk drive", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the per-user config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Management namespace to connect to
    #[arg(short, long)]
    namespace: Option<String>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[cfg(feature = "cli")]
fn main() {
    use diskmodel::{report, Config, DiskEnumerator, PlatformSource, TerminalSink};

    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    let config = loaded.and_then(|mut config| {
        if let Some(namespace) = cli.namespace {
            config.session.namespace = namespace;
        }
        if cli.no_color {
            config.output.color = false;
        }
        config.validate()?;
        Ok(config)
    });

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            report::report_error(TerminalSink::stderr(!cli.no_color), &e);
            std::process::exit(1);
        }
    };

    let color = config.output.color;
    let mut enumerator = DiskEnumerator::new(PlatformSource::new(), config);
    let outcome = report::run(
        &mut enumerator,
        TerminalSink::stdout(color),
        TerminalSink::stderr(color),
    );

    std::process::exit(outcome.exit_code());
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features not enabled. Please compile with --features cli");
    std::process::exit(1);
}
