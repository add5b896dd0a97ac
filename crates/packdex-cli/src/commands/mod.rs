//! CLI commands

pub mod repo;
pub mod search;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::{CliError, Result};

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

/// Print `value` as JSON or YAML; returns `false` for table output
pub(crate) fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<bool> {
    let rendered = match format {
        OutputFormat::Table => return Ok(false),
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).map_err(|e| CliError::other(e.to_string()))?
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| CliError::other(e.to_string()))?
        }
    };

    println!("{}", rendered.trim_end());
    Ok(true)
}

/// Left-align `rows` under `headers`, padding every column to its widest cell
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{:<w$}", h, w = *w))
        .collect::<Vec<_>>()
        .join("\t");
    println!("{}", console::style(header.trim_end()).bold());

    for row in rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<w$}", cell, w = *w))
            .collect::<Vec<_>>()
            .join("\t");
        println!("{}", line.trim_end());
    }
}
