// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Parses every `<dialect>/*.sql` file below a corpus directory in
//! parallel, checks that each statement survives a render/re-parse round
//! trip and writes a JSON summary to `target/corpus-report.json`.
//!
//! ```text
//! cargo run --features corpus --bin corpus_runner -- [corpus-dir]
//! ```

use rayon::prelude::*;
use serde_json::json;
use sqlparser_greenplum::dialect::{dialect_from_str, Dialect};
use sqlparser_greenplum::parser::Parser;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use walkdir::WalkDir;

const DEFAULT_CORPUS_ROOT: &str = "tests/corpus";
const REPORT_PATH: &str = "target/corpus-report.json";

fn dialect_from_path(path: &Path, corpus_root: &Path) -> Option<String> {
    let relative = path.strip_prefix(corpus_root).ok()?;
    relative
        .components()
        .next()
        .and_then(|c| c.as_os_str().to_str())
        .map(|s| s.to_string())
}

/// Extract expected statement count from `-- Statements: N` header comment.
fn expected_statement_count(sql: &str) -> Option<usize> {
    for line in sql.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("-- Statements:") {
            return rest.trim().parse().ok();
        }
        // Stop looking after non-comment, non-empty lines
        if !trimmed.is_empty() && !trimmed.starts_with("--") {
            break;
        }
    }
    None
}

/// Render every statement of `sql` and parse the result again; both
/// renderings must agree.
fn check_round_trip(dialect: &dyn Dialect, sql: &str) -> Result<usize, String> {
    let statements = Parser::parse_sql(dialect, sql).map_err(|e| format!("Failed to parse: {e}"))?;
    for statement in &statements {
        let rendered = statement.to_string();
        let reparsed = Parser::parse_sql(dialect, &rendered)
            .map_err(|e| format!("Failed to re-parse `{rendered}`: {e}"))?;
        match reparsed.as_slice() {
            [again] if again.to_string() == rendered => {}
            _ => return Err(format!("Round trip changed `{rendered}`")),
        }
    }
    Ok(statements.len())
}

fn run_test(path: &Path, corpus_root: &Path) -> Result<(), String> {
    let dialect_name = dialect_from_path(path, corpus_root)
        .ok_or_else(|| format!("Could not determine dialect from path: {}", path.display()))?;

    let dialect = dialect_from_str(&dialect_name)
        .ok_or_else(|| format!("Unknown dialect: {}", dialect_name))?;

    let sql = std::fs::read_to_string(path).map_err(|e| format!("Failed to read file: {e}"))?;

    let count = check_round_trip(&*dialect, &sql)?;
    if count == 0 {
        return Err(format!("Parsed 0 statements from {}", path.display()));
    }
    if let Some(expected) = expected_statement_count(&sql) {
        if expected != count {
            return Err(format!(
                "Statement count mismatch: expected {expected}, got {count}"
            ));
        }
    }
    Ok(())
}

fn collect_sql_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if !dir.is_dir() {
        return files;
    }
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let Ok(entry) = entry else { continue };
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "sql") {
            files.push(entry.into_path());
        }
    }
    files
}

/// Per-dialect pass/fail counts: [passed, failed]
type Stats = BTreeMap<String, [usize; 2]>;

/// Failure message by test path (e.g. "greenplum/external.sql" -> message)
type Failures = BTreeMap<String, String>;

fn report_json(stats: &Stats, failures: &Failures) -> serde_json::Value {
    let total_passed: usize = stats.values().map(|[p, _]| p).sum();
    let total_failed: usize = stats.values().map(|[_, f]| f).sum();
    let by_dialect: serde_json::Map<String, serde_json::Value> = stats
        .iter()
        .map(|(dialect, [passed, failed])| {
            (
                dialect.clone(),
                json!({ "passed": passed, "failed": failed }),
            )
        })
        .collect();

    json!({
        "total_passed": total_passed,
        "total_failed": total_failed,
        "by_dialect": by_dialect,
        "failures": failures,
    })
}

fn write_report(stats: &Stats, failures: &Failures) {
    // Ensure target/ directory exists
    let _ = std::fs::create_dir_all("target");

    let written = serde_json::to_string_pretty(&report_json(stats, failures))
        .map_err(|e| e.to_string())
        .and_then(|json| std::fs::write(REPORT_PATH, json).map_err(|e| e.to_string()));
    if let Err(e) = written {
        eprintln!("Error: failed to write report to {REPORT_PATH}: {e}");
        std::process::exit(1);
    } else {
        eprintln!("Corpus report written to {REPORT_PATH}");
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let corpus_root = if args.len() > 1 {
        &args[1]
    } else {
        DEFAULT_CORPUS_ROOT
    };

    let corpus_path = Path::new(corpus_root);
    if !corpus_path.exists() {
        eprintln!(
            "Error: Corpus directory not found at {}",
            corpus_path.display()
        );
        std::process::exit(1);
    }

    let sql_files = collect_sql_files(corpus_path);
    if sql_files.is_empty() {
        eprintln!("Error: No .sql files found in {}", corpus_path.display());
        std::process::exit(1);
    }
    eprintln!("Found {} SQL files", sql_files.len());

    let stats: Arc<Mutex<Stats>> = Arc::new(Mutex::new(BTreeMap::new()));
    let failures: Arc<Mutex<Failures>> = Arc::new(Mutex::new(BTreeMap::new()));

    let start_time = std::time::Instant::now();
    let processed = Arc::new(AtomicUsize::new(0));
    let total = sql_files.len();
    let report_every = 500;

    sql_files.par_iter().for_each(|path| {
        let relative_path = path
            .strip_prefix(corpus_path)
            .unwrap_or(path)
            .display()
            .to_string();

        let Some(dialect) = dialect_from_path(path, corpus_path) else {
            eprintln!(
                "Warning: Could not determine dialect for {}, skipping",
                path.display()
            );
            return;
        };

        let result =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| run_test(path, corpus_path)))
                .unwrap_or_else(|_| Err("parser panicked".to_string()));

        {
            let mut stats_guard = stats.lock().unwrap();
            let entry = stats_guard.entry(dialect).or_insert([0, 0]);
            match result {
                Ok(()) => entry[0] += 1,
                Err(message) => {
                    entry[1] += 1;
                    failures.lock().unwrap().insert(relative_path, message);
                }
            }
        }

        let current = processed.fetch_add(1, Ordering::Relaxed) + 1;
        if current % report_every == 0 || current == total {
            let rate = current as f64 / start_time.elapsed().as_secs_f64();
            eprintln!(
                "Progress: {}/{} ({:.1}%) - {:.0} files/sec",
                current,
                total,
                (current as f64 / total as f64) * 100.0,
                rate,
            );
        }
    });

    let stats_guard = stats.lock().unwrap();
    let failures_guard = failures.lock().unwrap();
    write_report(&stats_guard, &failures_guard);

    eprintln!("\n=== By Dialect ===");
    for (dialect, [passed, failed]) in stats_guard.iter() {
        eprintln!("{:12} {:6} passed, {:6} failed", dialect, passed, failed);
    }
    for (path, message) in failures_guard.iter() {
        eprintln!("FAIL {path}: {message}");
    }

    if !failures_guard.is_empty() {
        std::process::exit(1);
    }
}
