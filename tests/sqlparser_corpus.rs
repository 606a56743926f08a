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

//! One test per `tests/corpus/<dialect>/*.sql` file: the file must parse,
//! match its `-- Statements: N` header and survive a render/re-parse round
//! trip.

use std::path::{Path, PathBuf};

use libtest_mimic::Failed;
use sqlparser_greenplum::dialect::*;
use sqlparser_greenplum::parser::Parser;

const CORPUS_ROOT: &str = "tests/corpus";

fn dialect_for_name(name: &str) -> Box<dyn Dialect> {
    match name {
        "generic" => Box::new(GenericDialect {}),
        "postgres" | "postgresql" => Box::new(PostgreSqlDialect {}),
        "greenplum" => Box::new(GreenplumDialect {}),
        other => panic!("Unknown dialect: {other}"),
    }
}

fn dialect_from_path(path: &Path) -> &str {
    let relative = path.strip_prefix(CORPUS_ROOT).unwrap();
    relative
        .components()
        .next()
        .unwrap()
        .as_os_str()
        .to_str()
        .unwrap()
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

fn fail(msg: String) -> Failed {
    Failed::from(msg)
}

fn run_test(path: &Path) -> Result<(), Failed> {
    let dialect = dialect_for_name(dialect_from_path(path));

    let sql =
        std::fs::read_to_string(path).map_err(|e| fail(format!("Failed to read file: {e}")))?;

    let statements =
        Parser::parse_sql(&*dialect, &sql).map_err(|e| fail(format!("Failed to parse: {e}")))?;
    if statements.is_empty() {
        return Err(fail(format!("Parsed 0 statements from {}", path.display())));
    }

    if let Some(expected) = expected_statement_count(&sql) {
        if expected != statements.len() {
            return Err(fail(format!(
                "Statement count mismatch: expected {expected}, got {}",
                statements.len()
            )));
        }
    }

    for statement in statements {
        let rendered = statement.to_string();
        let reparsed = Parser::parse_sql(&*dialect, &rendered)
            .map_err(|e| fail(format!("Failed to re-parse `{rendered}`: {e}")))?;
        if reparsed.len() != 1 || reparsed[0].to_string() != rendered {
            return Err(fail(format!("Round trip changed `{rendered}`")));
        }
    }

    Ok(())
}

fn collect_sql_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if !dir.is_dir() {
        return files;
    }
    let walker = walkdir::WalkDir::new(dir).sort_by_file_name();
    for entry in walker {
        let Ok(entry) = entry else { continue };
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "sql") {
            files.push(entry.into_path());
        }
    }
    files
}

fn main() {
    let corpus_path = Path::new(CORPUS_ROOT);
    let sql_files = collect_sql_files(corpus_path);
    if sql_files.is_empty() {
        eprintln!("No .sql files found in {CORPUS_ROOT}, skipping corpus tests");
        return;
    }

    let tests: Vec<libtest_mimic::Trial> = sql_files
        .into_iter()
        .map(|path| {
            let name = path
                .strip_prefix(CORPUS_ROOT)
                .unwrap_or(&path)
                .display()
                .to_string();
            libtest_mimic::Trial::test(name, move || run_test(&path))
        })
        .collect();

    let args = libtest_mimic::Arguments::from_args();
    libtest_mimic::run(&args, tests).exit();
}
