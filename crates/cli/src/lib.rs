use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use lens_engine::EngineConfig;
use lens_page::PageDocument;
use lens_protocol::{filters_active, path_allowed, serialize_json};
use lens_scanner::{ScanMap, SourceScanner};
use lens_search::{DisplayedText, SearchNavigator};
use lens_tree::build_tree;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

mod replay;
mod report;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "lens")]
#[command(about = "Correlate annotated page elements with their source files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Engine configuration file (TOML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a page snapshot and print the source tree
    Scan(ScanArgs),

    /// Run find/next/previous over a source file
    Search(SearchArgs),

    /// Replay a scripted interaction against a page snapshot
    Replay(ReplayArgs),
}

#[derive(Args)]
struct ScanArgs {
    /// Page snapshot (JSON)
    snapshot: PathBuf,

    /// Only keep paths under these prefixes
    #[arg(long = "include")]
    include: Vec<String>,

    /// Drop paths under these prefixes
    #[arg(long = "exclude")]
    exclude: Vec<String>,

    /// Substring or glob the path must match
    #[arg(long)]
    pattern: Option<String>,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SearchArgs {
    /// Source file to search
    file: PathBuf,

    /// Search term (literal, case-insensitive)
    #[arg(long)]
    term: String,

    /// Line clicked before navigating
    #[arg(long)]
    click: Option<u32>,

    /// Number of "next" steps
    #[arg(long, default_value_t = 0)]
    next: usize,

    /// Number of "previous" steps, applied after the "next" steps
    #[arg(long, default_value_t = 0)]
    previous: usize,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ReplayArgs {
    /// Page snapshot (JSON)
    snapshot: PathBuf,

    /// Event script, one step per line
    script: PathBuf,

    /// Directory sources are fetched from (default: the snapshot's directory)
    #[arg(long)]
    sources: Option<PathBuf>,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    let json_output = match &cli.command {
        Commands::Scan(args) => args.json,
        Commands::Search(args) => args.json,
        Commands::Replay(args) => args.json,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan(args) => run_scan(args, &config)?,
        Commands::Search(args) => run_search(args)?,
        Commands::Replay(args) => run_replay(args, config).await?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn load_page(path: &Path) -> Result<PageDocument> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    PageDocument::from_json(&raw).with_context(|| format!("Invalid snapshot {}", path.display()))
}

fn run_scan(args: ScanArgs, config: &EngineConfig) -> Result<()> {
    let doc = load_page(&args.snapshot)?;
    let scanner = SourceScanner::new(&config.file_attribute, &config.line_attribute)?;
    let (map, scan_report) = scanner.scan_with_report(&doc);

    let pattern = args.pattern.as_deref();
    let map: ScanMap = if filters_active(&args.include, &args.exclude, pattern) {
        let scanned = map.len();
        let kept: ScanMap = map
            .into_iter()
            .filter(|(path, _)| path_allowed(path, &args.include, &args.exclude, pattern))
            .collect();
        log::info!("Path filters kept {} of {scanned} files", kept.len());
        kept
    } else {
        map
    };
    let built = build_tree(&map);

    let output = report::ScanOutput::new(&map, built, scan_report);
    if args.json {
        print_stdout(&serialize_json(&output)?)?;
    } else {
        print_stdout(&report::render_scan(&output))?;
    }
    Ok(())
}

fn run_search(args: SearchArgs) -> Result<()> {
    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let mut navigator = SearchNavigator::new(DisplayedText::new(&text));
    navigator.set_term(&args.term)?;

    if let Some(line) = args.click {
        navigator.click_line(line);
    }
    for _ in 0..args.next {
        navigator.next();
    }
    for _ in 0..args.previous {
        navigator.previous();
    }

    let output = report::SearchOutput::new(&navigator);
    if args.json {
        print_stdout(&serialize_json(&output)?)?;
    } else {
        print_stdout(&report::render_search(&output))?;
    }
    Ok(())
}

async fn run_replay(args: ReplayArgs, config: EngineConfig) -> Result<()> {
    let doc = load_page(&args.snapshot)?;
    let script = fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read script {}", args.script.display()))?;
    let steps = replay::parse_script(&script)?;

    let sources = match args.sources {
        Some(dir) => dir,
        None => args
            .snapshot
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };

    let summary = replay::run(doc, config, &sources, &steps).await?;
    if args.json {
        print_stdout(&serialize_json(&summary)?)?;
    } else {
        print_stdout(&report::render_summary(&summary))?;
    }
    Ok(())
}
