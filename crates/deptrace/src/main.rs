use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deptrace::agent::WatchSession;
use deptrace::report::render_text;
use deptrace::{analyze, load_config, AnalysisRequest};
use deptrace_analysis::ReachabilityReport;
use deptrace_core::model::MethodRef;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "deptrace", version, about = "Whole-program reachability and devirtualization analysis")]
struct Cli {
    /// Increase log verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct AnalysisArgs {
    /// JSON class model (`{"classes": [...]}`)
    model: PathBuf,

    /// Entry point, e.g. `app.Main.main([Ljava/lang/String;)V`
    #[arg(short, long)]
    entry: String,

    /// Analyzer configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resolve virtual calls per call site
    #[arg(long)]
    precise: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a class model once and print a report
    Analyze(AnalysisArgs),
    /// Re-run the analysis whenever the class model changes
    Watch(AnalysisArgs),
}

impl AnalysisArgs {
    fn request(&self) -> Result<AnalysisRequest> {
        let entry: MethodRef = self
            .entry
            .parse()
            .with_context(|| format!("invalid entry point {}", self.entry))?;
        Ok(AnalysisRequest {
            model: self.model.clone(),
            entry,
            config: load_config(self.config.as_deref(), self.precise)?,
        })
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn print_report(report: &ReachabilityReport, json: bool, verbose: bool) -> Result<()> {
    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", render_text(report, verbose));
    }
    Ok(())
}

fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("class model {} does not exist", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let verbose = cli.verbose > 0;

    match cli.command {
        Commands::Analyze(args) => {
            ensure_exists(&args.model)?;
            let (_, report) = analyze(&args.request()?)?;
            print_report(&report, args.json, verbose)?;
        }
        Commands::Watch(args) => {
            ensure_exists(&args.model)?;
            let (mut session, report) = WatchSession::start(args.request()?)?;
            print_report(&report, args.json, verbose)?;
            session.run(|report| {
                if let Err(e) = print_report(report, args.json, verbose) {
                    eprintln!("failed to print report: {e:#}");
                }
            })?;
        }
    }
    Ok(())
}
