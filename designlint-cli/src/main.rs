//! DesignLint CLI - EAGLE-style schematic, board, and library checking from the command line.

use clap::{Args, Parser, Subcommand, ValueEnum};
use designlint::{
    Board, CheckEngine, CheckOptions, DesignSet, DiagnosticCollector, Library, RunReport,
    Schematic, Severity,
};
use regex::Regex;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::OnceLock;

#[derive(Parser)]
#[command(name = "designlint")]
#[command(about = "EAGLE-style schematic, board, and library style checker", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check schematic, board, and library files against the design rules
    Check(CheckArgs),

    /// List the stock check modules
    Rules {
        /// Show what each module covers
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Args)]
struct CheckArgs {
    /// Design files: .sch.json, .brd.json, and .lbr.json
    #[arg(value_name = "FILES", required = true)]
    files: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Apply automatic corrections where a rule has one
    #[arg(long)]
    fix: bool,

    /// Write corrected documents back to disk
    #[arg(long, requires = "fix")]
    write: bool,

    /// Insert SUFFIX before the document extension instead of overwriting
    #[arg(long, value_name = "SUFFIX", requires = "write")]
    suffix: Option<String>,

    /// Fail on warnings as well as errors
    #[arg(long)]
    strict: bool,

    /// Hide Info diagnostics in human output
    #[arg(short, long)]
    quiet: bool,

    /// Ignore sibling .err approved lists and report every finding
    #[arg(long)]
    no_filter: bool,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable diagnostic lines
    Human,
    /// JSON run report for CI/CD
    Json,
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Check(args) => handle_check(args),
        Commands::Rules { verbose } => {
            handle_rules(verbose);
            0
        }
    };

    process::exit(exit_code);
}

fn handle_check(args: CheckArgs) -> i32 {
    let mut loaded = match load_design(&args.files) {
        Ok(loaded) => loaded,
        Err(message) => {
            eprintln!("Error: {}", message);
            return 1;
        }
    };

    let options = CheckOptions::default();
    let engine = CheckEngine::with_default_modules();
    let mut collector = DiagnosticCollector::new();
    if let Err(e) = engine.check(&mut loaded.design, &mut collector, args.fix, &options) {
        eprintln!("Error: {}", e);
        return 1;
    }

    if !args.no_filter {
        let mut approved = approved_fingerprints(&args.files);
        // Findings flagged inexcusable must be shown even when their
        // fingerprint is on an approved list.
        for diagnostic in collector.diagnostics() {
            if diagnostic.inexcusable {
                approved.remove(&diagnostic.fingerprint());
            }
        }
        if !approved.is_empty() {
            collector.filter_by_fingerprint(&approved);
        }
    }

    if args.fix && args.write {
        if let Err(message) = write_fixed(&loaded, args.suffix.as_deref()) {
            eprintln!("Error: {}", message);
            return 1;
        }
    }

    let failed = collector.count_at(Severity::Error) > 0
        || (args.strict && collector.count_at(Severity::Warning) > 0);

    match args.format {
        OutputFormat::Human => output_human(&collector, args.quiet),
        OutputFormat::Json => {
            let report = RunReport::new(collector.into_diagnostics());
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return 1;
                }
            }
        }
    }

    if failed {
        1
    } else {
        0
    }
}

/// One design set plus the paths its documents were loaded from, so fixed
/// documents can be written back where they came from.
struct LoadedDesign {
    design: DesignSet,
    schematic_path: Option<PathBuf>,
    board_path: Option<PathBuf>,
    library_paths: Vec<PathBuf>,
}

enum DocKind {
    Schematic,
    Board,
    Library,
}

fn classify(path: &Path) -> Option<DocKind> {
    let name = path.file_name()?.to_str()?;
    if name.ends_with(".sch.json") {
        Some(DocKind::Schematic)
    } else if name.ends_with(".brd.json") {
        Some(DocKind::Board)
    } else if name.ends_with(".lbr.json") {
        Some(DocKind::Library)
    } else {
        None
    }
}

fn load_design(files: &[PathBuf]) -> Result<LoadedDesign, String> {
    let mut loaded = LoadedDesign {
        design: DesignSet::new(),
        schematic_path: None,
        board_path: None,
        library_paths: Vec::new(),
    };

    for file in files {
        let kind = match classify(file) {
            Some(kind) => kind,
            None => {
                return Err(format!(
                    "{}: expected a .sch.json, .brd.json, or .lbr.json file",
                    file.display()
                ));
            }
        };
        let text =
            fs::read_to_string(file).map_err(|e| format!("{}: {}", file.display(), e))?;
        match kind {
            DocKind::Schematic => {
                if let Some(previous) = &loaded.schematic_path {
                    return Err(format!(
                        "{}: a schematic was already loaded from {}",
                        file.display(),
                        previous.display()
                    ));
                }
                let schematic: Schematic =
                    serde_json::from_str(&text).map_err(|e| format!("{}: {}", file.display(), e))?;
                loaded.design.schematic = Some(schematic);
                loaded.schematic_path = Some(file.clone());
            }
            DocKind::Board => {
                if let Some(previous) = &loaded.board_path {
                    return Err(format!(
                        "{}: a board was already loaded from {}",
                        file.display(),
                        previous.display()
                    ));
                }
                let board: Board =
                    serde_json::from_str(&text).map_err(|e| format!("{}: {}", file.display(), e))?;
                loaded.design.board = Some(board);
                loaded.board_path = Some(file.clone());
            }
            DocKind::Library => {
                let library: Library =
                    serde_json::from_str(&text).map_err(|e| format!("{}: {}", file.display(), e))?;
                loaded.design.libraries.push(library);
                loaded.library_paths.push(file.clone());
            }
        }
    }

    Ok(loaded)
}

fn err_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Accepts bare fingerprints as well as full rendered diagnostic lines,
    // which end in "(context:XXXXXXXX)".
    RE.get_or_init(|| Regex::new(r"(^|\(|:)([0-9A-F]{8})\)?$").expect("hardcoded regex"))
}

/// Collect approved fingerprints from the sibling `.err` file of every
/// input. A missing `.err` file simply contributes nothing.
fn approved_fingerprints(files: &[PathBuf]) -> HashSet<String> {
    let mut approved = HashSet::new();
    for file in files {
        let mut name = file.file_name().map(OsString::from).unwrap_or_default();
        name.push(".err");
        let text = match fs::read_to_string(file.with_file_name(name)) {
            Ok(text) => text,
            Err(_) => continue,
        };
        for line in text.lines() {
            if let Some(caps) = err_line_regex().captures(line.trim()) {
                approved.insert(caps[2].to_string());
            }
        }
    }
    approved
}

fn write_fixed(loaded: &LoadedDesign, suffix: Option<&str>) -> Result<(), String> {
    if let (Some(schematic), Some(source)) = (&loaded.design.schematic, &loaded.schematic_path) {
        let json = serde_json::to_string_pretty(schematic)
            .map_err(|e| format!("{}: {}", source.display(), e))?;
        write_output(source, suffix, &json)?;
    }
    if let (Some(board), Some(source)) = (&loaded.design.board, &loaded.board_path) {
        let json = serde_json::to_string_pretty(board)
            .map_err(|e| format!("{}: {}", source.display(), e))?;
        write_output(source, suffix, &json)?;
    }
    for (library, source) in loaded.design.libraries.iter().zip(&loaded.library_paths) {
        let json = serde_json::to_string_pretty(library)
            .map_err(|e| format!("{}: {}", source.display(), e))?;
        write_output(source, suffix, &json)?;
    }
    Ok(())
}

fn write_output(source: &Path, suffix: Option<&str>, json: &str) -> Result<(), String> {
    let target = output_path(source, suffix);
    fs::write(&target, json).map_err(|e| format!("{}: {}", target.display(), e))
}

/// The suffix goes before the document extension: `amp.sch.json` with
/// suffix `_fixed` becomes `amp_fixed.sch.json`.
fn output_path(source: &Path, suffix: Option<&str>) -> PathBuf {
    let suffix = match suffix {
        Some(suffix) => suffix,
        None => return source.to_path_buf(),
    };
    let name = source
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    for extension in [".sch.json", ".brd.json", ".lbr.json"] {
        if let Some(stem) = name.strip_suffix(extension) {
            return source.with_file_name(format!("{}{}{}", stem, suffix, extension));
        }
    }
    source.with_file_name(format!("{}{}", name, suffix))
}

fn output_human(collector: &DiagnosticCollector, quiet: bool) {
    if !quiet {
        for diagnostic in collector.diagnostics() {
            if diagnostic.level == Severity::Info {
                println!("{}", diagnostic);
            }
        }
    }
    for diagnostic in collector.diagnostics() {
        if diagnostic.level != Severity::Info {
            println!("{}", diagnostic);
        }
    }
    println!(
        "{} errors, {} warnings, {} infos",
        collector.count_at(Severity::Error),
        collector.count_at(Severity::Warning),
        collector.count_at(Severity::Info)
    );
}

fn handle_rules(verbose: bool) {
    println!("Stock check modules, in run order:\n");

    for module in CheckEngine::with_default_modules().modules() {
        println!("  {}", module.id());
        println!("    {}", module.name());
        if verbose {
            println!("    {}", describe(module.id()));
        }
        println!();
    }
}

fn describe(id: &str) -> &'static str {
    match id {
        "library_style" => {
            "Pin naming and grid, silkscreen size and font, '>NAME'/'>VALUE' \
             placeholders, keepout and placement outlines, copper in packages, \
             deviceset prefixes and technology attributes."
        }
        "board_style" => {
            "Element naming and placement grids, attribute smashing, unrouted \
             and intersecting signals, board outline, and drift between embedded \
             libraries and the element that uses them."
        }
        "schematic_style" => {
            "Part and wire alignment, net naming, phantom connections, supply \
             symbol placement, frame and documentation, and drift between \
             embedded libraries and the authoritative ones."
        }
        _ => "",
    }
}
