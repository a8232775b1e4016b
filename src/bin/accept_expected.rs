//! Binary to regenerate the expected outputs under tests/cases/.
//!
//! Usage:
//!   cargo run --bin accept_expected            # Update all cases
//!   cargo run --bin accept_expected -- basic   # Update only cases matching "basic"

use contractor::{Pipeline, SourceUnit};
use std::fs;
use std::path::Path;

fn main() {
    let filter: Option<String> = std::env::args().nth(1);
    let cases_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/cases");

    let mut case_dirs: Vec<_> = fs::read_dir(&cases_dir)
        .expect("Failed to read tests/cases")
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    case_dirs.sort();

    let mut updated = 0;
    let mut skipped = 0;

    for case in case_dirs {
        let name = case.file_name().and_then(|s| s.to_str()).unwrap_or("");

        // Apply filter if provided
        if let Some(ref f) = filter {
            if !name.contains(f.as_str()) {
                skipped += 1;
                continue;
            }
        }

        process_case(&case);
        updated += 1;
    }

    println!("Updated {} cases, skipped {}", updated, skipped);
}

fn process_case(case: &Path) {
    let units = read_units(case);
    let result = Pipeline::standard().run(units);

    let expected_dir = case.join("expected");
    if expected_dir.exists() {
        fs::remove_dir_all(&expected_dir).expect("Failed to clear expected dir");
    }
    fs::create_dir_all(&expected_dir).expect("Failed to create expected dir");

    for fragment in &result.fragments {
        let target = expected_dir.join(&fragment.name);
        fs::write(&target, &fragment.code).expect("Failed to write fragment");
        println!("  wrote {}", target.display());
    }

    if !result.diagnostics.is_empty() {
        let lines: Vec<String> = result.diagnostics.iter().map(|d| d.summary()).collect();
        let target = expected_dir.join("diagnostics.txt");
        fs::write(&target, format!("{}\n", lines.join("\n"))).expect("Failed to write diagnostics");
        println!("  wrote {}", target.display());
    }
}

/// Source units of one case, named by bare file name so expected
/// diagnostics stay machine-independent
fn read_units(case: &Path) -> Vec<SourceUnit> {
    let mut paths: Vec<_> = fs::read_dir(case)
        .expect("Failed to read case dir")
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|s| s == "cs").unwrap_or(false))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("unknown").to_string();
            let text = fs::read_to_string(&path).expect("Failed to read source");
            SourceUnit::new(name, text)
        })
        .collect()
}
