use clap::{Parser, Subcommand};
use contractor::{Pipeline, RunResult, SourceUnit};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::{DirEntry, WalkDir};

#[derive(Parser)]
#[command(name = "contractor")]
#[command(about = "Contractor - generated accessors for [AutoImplement] contract interfaces")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate partial-class fragments from C# sources
    Generate {
        /// Path to a .cs file or a source directory
        #[arg(required_unless_present = "stdin")]
        path: Option<PathBuf>,

        /// Read a single source from stdin and print fragments to stdout
        #[arg(long)]
        stdin: bool,

        /// Print the run result as JSON instead of writing fragments
        #[arg(long)]
        json: bool,

        /// Directory to write fragments into (default: <dir>/Generated)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { path, stdin, json, out_dir } => {
            if stdin {
                generate_stdin(json);
            } else if let Some(path) = path {
                generate_path(&path, json, out_dir);
            } else {
                eprintln!("Error: provide a file/directory or use --stdin");
                std::process::exit(1);
            }
        }
    }
}

fn generate_stdin(json_output: bool) {
    let mut source = String::new();
    io::stdin().read_to_string(&mut source).expect("Failed to read stdin");

    let units = vec![SourceUnit::new("<stdin>", source)];
    let result = Pipeline::standard().run(units.clone());

    if json_output {
        println!("{}", serde_json::to_string(&result).unwrap());
    } else {
        for fragment in &result.fragments {
            print!("{}", fragment.code);
        }
    }

    report_diagnostics(&result, &units);
    if result.has_errors() {
        std::process::exit(1);
    }
}

fn generate_path(path: &Path, json_output: bool, out_dir: Option<PathBuf>) {
    let start = Instant::now();
    let units = collect_sources(path);
    if units.is_empty() {
        eprintln!("No .cs files found in {}", path.display());
        std::process::exit(1);
    }

    let result = Pipeline::standard().run(units.clone());

    if json_output {
        println!("{}", serde_json::to_string(&result).unwrap());
    } else {
        let out = output_dir(path, out_dir);
        fs::create_dir_all(&out).expect("Failed to create output directory");
        for fragment in &result.fragments {
            let target = out.join(&fragment.name);
            fs::write(&target, &fragment.code).expect("Failed to write fragment");
            print_generated(&target.display().to_string());
        }
        print_summary(result.fragments.len(), start.elapsed());
    }

    report_diagnostics(&result, &units);
    if result.has_errors() {
        std::process::exit(1);
    }
}

fn collect_sources(path: &Path) -> Vec<SourceUnit> {
    if path.is_file() {
        if path.extension().map_or(true, |ext| ext != "cs") {
            eprintln!("Error: {} is not a .cs file", path.display());
            std::process::exit(1);
        }
        let text = fs::read_to_string(path).expect("Failed to read file");
        return vec![SourceUnit::new(path.display().to_string(), text)];
    }
    if !path.is_dir() {
        eprintln!("Error: {} does not exist", path.display());
        std::process::exit(1);
    }

    let mut units = Vec::new();
    for entry in WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !skipped_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "cs"))
    {
        let text = fs::read_to_string(entry.path()).expect("Failed to read file");
        units.push(SourceUnit::new(entry.path().display().to_string(), text));
    }
    units
}

/// Directories never scanned for sources: hidden dirs, build output, and
/// previous generation output
fn skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name == "bin" || name == "obj" || name == "Generated"
}

fn output_dir(input: &Path, out_dir: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = out_dir {
        return dir;
    }
    if input.is_dir() {
        input.join("Generated")
    } else {
        input.parent().unwrap_or_else(|| Path::new(".")).join("Generated")
    }
}

fn report_diagnostics(result: &RunResult, units: &[SourceUnit]) {
    if result.diagnostics.is_empty() {
        return;
    }
    let is_tty = io::stderr().is_terminal();
    for diagnostic in &result.diagnostics {
        let source = units
            .iter()
            .find(|unit| unit.name == diagnostic.file)
            .map(|unit| unit.text.as_str())
            .unwrap_or("");
        if is_tty {
            eprint!("{}", diagnostic.render_color(source));
        } else {
            eprint!("{}", diagnostic.render(source));
        }
    }
}

fn print_generated(path: &str) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("  \x1b[32m✓\x1b[0m {}", path);
    } else {
        eprintln!("  ✓ {}", path);
    }
}

fn print_summary(count: usize, elapsed: std::time::Duration) {
    let is_tty = io::stderr().is_terminal();
    let time_str = format_duration(elapsed);
    let fragments_word = if count == 1 { "fragment" } else { "fragments" };

    if is_tty {
        eprintln!("\n\x1b[1m✨ Generated {} {} in {}\x1b[0m", count, fragments_word, time_str);
    } else {
        eprintln!("\n✨ Generated {} {} in {}", count, fragments_word, time_str);
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let micros = d.as_micros();
    if micros < 1000 {
        format!("{}μs", micros)
    } else if micros < 1_000_000 {
        format!("{:.1}ms", micros as f64 / 1000.0)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
