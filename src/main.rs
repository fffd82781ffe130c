use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser as ClapParser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use owo_colors::OwoColorize;

use codeintel::config::Settings;
use codeintel::{Insight, InsightOptions, ProjectIndex};

#[derive(ClapParser)]
#[command(name = "codeintel")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Multi-language code intelligence: symbols, references, call graphs, import cycles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build (or rebuild) the index for a workspace
    Index {
        /// Workspace root to index
        path: PathBuf,
    },
    /// Index a workspace, then watch it for changes
    Watch { path: PathBuf },
    /// Search indexed symbols by name pattern
    Search {
        path: PathBuf,
        pattern: String,
        #[arg(short, long, default_value_t = 50)]
        max_results: usize,
    },
    /// Show the symbol tree for one file
    Symbol { path: PathBuf, file: PathBuf },
    /// Find every reference to a symbol name
    Refs { path: PathBuf, name: String },
    /// Find callers of a symbol name
    Callers { path: PathBuf, name: String },
    /// Find callees of a qualified symbol in one file
    Callees {
        path: PathBuf,
        file: PathBuf,
        qualified_name: String,
    },
    /// Analyze the import graph: cycles and degree ranking
    Deps { path: PathBuf },
    /// Compose an insight for a file, directory, or symbol
    Insight { path: PathBuf, target: String },
    /// Print the resolved configuration
    Config {
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    let settings = Settings::load(None).unwrap_or_default();
    codeintel::logging::init_with_config(&settings.logging);

    if let Err(err) = run(cli.command, &settings) {
        eprintln!("{} {}", "error:".red().bold(), err);
        if let Some(hint) = err.recovery_suggestion() {
            eprintln!("{} {hint}", "hint:".yellow().bold());
        }
        std::process::exit(1);
    }
}

fn run(command: Commands, settings: &Settings) -> codeintel::EngineResult<()> {
    match command {
        Commands::Index { path } => cmd_index(path, settings),
        Commands::Watch { path } => cmd_watch(path, settings),
        Commands::Search {
            path,
            pattern,
            max_results,
        } => cmd_search(path, &pattern, max_results, settings),
        Commands::Symbol { path, file } => cmd_symbol(path, file, settings),
        Commands::Refs { path, name } => cmd_refs(path, &name, settings),
        Commands::Callers { path, name } => cmd_callers(path, &name, settings),
        Commands::Callees {
            path,
            file,
            qualified_name,
        } => cmd_callees(path, file, &qualified_name, settings),
        Commands::Deps { path } => cmd_deps(path, settings),
        Commands::Insight { path, target } => cmd_insight(path, &target, settings),
        Commands::Config { path } => cmd_config(path),
    }
}

fn cmd_index(path: PathBuf, settings: &Settings) -> codeintel::EngineResult<()> {
    let index = ProjectIndex::with_settings(path, settings);
    let stats = index.index_project()?;
    println!(
        "{} {} files, {} symbols, {} parse errors",
        "indexed".green().bold(),
        stats.files_indexed,
        stats.symbols_indexed,
        stats.parse_errors
    );
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["language", "files"]);
    for (language, count) in &stats.language_histogram {
        table.add_row(vec![language.clone(), count.to_string()]);
    }
    println!("{table}");
    Ok(())
}

fn cmd_watch(path: PathBuf, settings: &Settings) -> codeintel::EngineResult<()> {
    let index = Arc::new(ProjectIndex::with_settings(path, settings));
    index.index_project()?;
    index.start_watching()?;
    println!("{} for changes, press Ctrl+C to stop", "watching".green().bold());
    loop {
        std::thread::sleep(std::time::Duration::from_secs(3600));
    }
}

fn cmd_search(path: PathBuf, pattern: &str, max_results: usize, settings: &Settings) -> codeintel::EngineResult<()> {
    let index = ProjectIndex::with_settings(path, settings);
    index.index_project()?;
    let results = index.search_symbols(pattern, None, max_results)?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["name", "kind", "file", "line"]);
    for symbol in &results.results {
        table.add_row(vec![
            symbol.qualified_name.clone(),
            format!("{:?}", symbol.kind),
            symbol.file_path.display().to_string(),
            symbol.start_line.to_string(),
        ]);
    }
    println!("{table}");
    if results.truncated {
        println!("{}", "results truncated, narrow the pattern or raise --max-results".yellow());
    }
    Ok(())
}

fn cmd_symbol(path: PathBuf, file: PathBuf, settings: &Settings) -> codeintel::EngineResult<()> {
    let index = ProjectIndex::with_settings(path, settings);
    index.index_project()?;
    let tree = index
        .get_file_symbols(&file)
        .ok_or(codeintel::EngineError::FileNotFound { path: file })?;
    print_symbols(&tree.symbols, 0);
    Ok(())
}

fn print_symbols(symbols: &[codeintel::Symbol], depth: usize) {
    for symbol in symbols {
        if symbol.kind == codeintel::SymbolKind::Import {
            continue;
        }
        println!("{}{} {:?}", "  ".repeat(depth), symbol.name.cyan(), symbol.kind);
        print_symbols(&symbol.children, depth + 1);
    }
}

fn cmd_refs(path: PathBuf, name: &str, settings: &Settings) -> codeintel::EngineResult<()> {
    let index = ProjectIndex::with_settings(path, settings);
    index.index_project()?;
    for reference in index.find_references(name) {
        let marker = if reference.is_definition {
            "(definition)".green().to_string()
        } else {
            reference.line_text.clone()
        };
        println!("{}:{}:{} {}", reference.file_path.display(), reference.line, reference.column, marker);
    }
    Ok(())
}

fn cmd_callers(path: PathBuf, name: &str, settings: &Settings) -> codeintel::EngineResult<()> {
    let index = ProjectIndex::with_settings(path, settings);
    index.index_project()?;
    for caller in index.get_callers(name) {
        println!(
            "{}:{} {}",
            caller.file_path.display(),
            caller.line,
            caller.caller_qualified_name.cyan()
        );
    }
    Ok(())
}

fn cmd_callees(path: PathBuf, file: PathBuf, qualified_name: &str, settings: &Settings) -> codeintel::EngineResult<()> {
    let index = ProjectIndex::with_settings(path, settings);
    index.index_project()?;
    for callee in index.get_callees(&file, qualified_name) {
        println!(
            "{}:{} {}",
            callee.file_path.display(),
            callee.line,
            callee.line_text.cyan()
        );
    }
    Ok(())
}

fn cmd_deps(path: PathBuf, settings: &Settings) -> codeintel::EngineResult<()> {
    let index = ProjectIndex::with_settings(path, settings);
    index.index_project()?;
    let analysis = index.analyze_dependencies();
    println!(
        "{} files, {} import edges, {} cycles",
        analysis.total_files, analysis.total_imports, analysis.cycles.len()
    );
    for cycle in &analysis.cycles {
        let joined = cycle
            .files
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        println!(
            "{} {joined} -> {}",
            "cycle:".red().bold(),
            cycle.files[0].display()
        );
    }
    Ok(())
}

fn cmd_insight(path: PathBuf, target: &str, settings: &Settings) -> codeintel::EngineResult<()> {
    let index = ProjectIndex::with_settings(path, settings);
    index.index_project()?;
    match codeintel::insight::synthesize(&index, target, &InsightOptions::default())? {
        Insight::File(file) => {
            println!("{} {}", "file".green().bold(), file.path.display());
            println!("language: {}", file.language);
            println!("symbols: {}", file.top_level_symbols.len());
            println!("recent changes: {}", file.recent_changes.len());
        }
        Insight::Directory(dir) => {
            println!("{} {}", "directory".green().bold(), dir.path.display());
            println!("files: {}", dir.file_count);
        }
        Insight::Symbol(symbol) => {
            println!("{} {}", "symbol".green().bold(), symbol.qualified_name);
            println!("callers: {}", symbol.callers.len());
            println!("callees: {}", symbol.callees.len());
        }
    }
    Ok(())
}

fn cmd_config(path: Option<PathBuf>) -> codeintel::EngineResult<()> {
    let settings = codeintel::config::Settings::load(path.as_ref()).unwrap_or_default();
    println!("{settings:#?}");
    Ok(())
}
