//! Human-readable and JSON reports for a scan result

use anyhow::Result;
use chrono::{DateTime, Utc};
use mypos_core::{Category, ScanResult};
use serde::Serialize;

/// JSON envelope written by `--json`
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub generated_at: DateTime<Utc>,
    pub version: &'static str,
    pub result: &'a ScanResult,
}

pub fn to_json(result: &ScanResult) -> Result<String> {
    let report = Report {
        generated_at: Utc::now(),
        version: mypos_core::VERSION,
        result,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

pub fn print_summary(result: &ScanResult) {
    let stats = result.stats();

    for category in Category::ALL {
        let count = stats.accepted.get(&category).copied().unwrap_or(0);
        println!(
            "  {:<15} {:>3} files",
            format!("{}:", category.dir_name()),
            count
        );
    }
    println!("  {:<15} {}", "total size:", format_size(stats.total_bytes));

    let misplaced: Vec<_> = result.misplaced().collect();
    if !misplaced.is_empty() {
        println!();
        println!("Misplaced files ({}):", misplaced.len());
        println!();
        for file in &misplaced {
            if let Some(suggested) = file.suggested_category {
                println!(
                    "  {} ({}, {}) -> suggested: {}/",
                    file.path.display(),
                    file.reason,
                    file.size_bytes.map(format_size).unwrap_or_else(|| "?".to_string()),
                    suggested.dir_name()
                );
            }
        }
    }

    if !result.duplicates().is_empty() {
        println!();
        println!("Duplicates ({}):", result.duplicate_count());
        println!();
        for dup in result.duplicates() {
            println!("  {} (same as {})", dup.path.display(), dup.original.display());
        }
    }

    let ignored: Vec<_> = result
        .rejected()
        .iter()
        .filter(|r| r.suggested_category.is_none())
        .collect();
    if !ignored.is_empty() {
        println!();
        println!("Rejected ({}):", ignored.len());
        println!();
        for file in ignored {
            match &file.detail {
                Some(detail) => println!("  {} ({}: {})", file.path.display(), file.reason, detail),
                None => println!("  {} ({})", file.path.display(), file.reason),
            }
        }
    }

    if result.cancelled {
        println!();
        println!("Scan was cancelled; results are incomplete.");
    }

    println!();
}

pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MiB", bytes as f64 / 1024.0 / 1024.0)
    }
}
