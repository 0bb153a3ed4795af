//! Tabular transaction input
//!
//! The first non-blank line is a header. Its delimiter (`,`, `;` or tab)
//! decides how every following line is split, and its column names decide the
//! layout:
//!
//! 1. two columns, the second naming an item or product: long format, one
//!    `(transaction, item)` pair per line;
//! 2. a single column: each line is a comma-separated basket;
//! 3. a column whose name mentions `item`: that cell is a comma-separated basket;
//! 4. anything else is one-hot, each column an item and truthy cells marking
//!    membership. A row with no truthy cell is rejected by the store.
//!
//! Double-quoted fields may contain delimiters, line breaks and `""` escapes.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use basketry_core::errors::ApplicationError;
use basketry_core::samples::find_sample;
use basketry_core::store::{TransactionRecord, TransactionStore};
use clap::Args;
use tracing::debug;

#[derive(Clone, Debug, Args)]
#[group(required = true, multiple = false)]
pub struct DatasetArgs {
    #[arg(long, value_name = "PATH", help = "Read transactions from a CSV/TSV file")]
    pub input: Option<PathBuf>,
    #[arg(long, value_name = "ID", help = "Use a built-in sample dataset (see `basketry samples`)")]
    pub sample: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableLayout {
    LongFormat,
    SingleColumn,
    ItemsColumn,
    OneHot,
}

impl TableLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LongFormat => "long_format",
            Self::SingleColumn => "single_column",
            Self::ItemsColumn => "items_column",
            Self::OneHot => "one_hot",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ParsedTable {
    pub layout: TableLayout,
    pub records: Vec<TransactionRecord>,
}

/// Build the store named by `args`, either from a file or a built-in sample.
pub fn load(args: &DatasetArgs) -> Result<TransactionStore, ApplicationError> {
    if let Some(id) = &args.sample {
        let sample = find_sample(id).ok_or_else(|| ApplicationError::UnknownSample(id.clone()))?;
        return Ok(sample.store()?);
    }

    let Some(path) = &args.input else {
        return Err(ApplicationError::Dataset("either --input or --sample is required".into()));
    };
    let table = read_table(path).map_err(|error| ApplicationError::Dataset(format!("{error:#}")))?;
    debug!(
        event_name = "dataset.table.parsed",
        path = %path.display(),
        layout = table.layout.as_str(),
        records = table.records.len(),
        "parsed transaction table"
    );
    Ok(TransactionStore::from_records(table.records)?)
}

pub fn read_table(path: &Path) -> anyhow::Result<ParsedTable> {
    let raw = fs::read(path).with_context(|| format!("could not read `{}`", path.display()))?;
    let text = String::from_utf8_lossy(&raw);
    parse_table(&text).with_context(|| format!("could not parse `{}`", path.display()))
}

pub fn parse_table(text: &str) -> anyhow::Result<ParsedTable> {
    let mut lines = split_records(text.trim_start_matches('\u{feff}'))
        .into_iter()
        .filter(|line| !line.trim().is_empty());
    let Some(header_line) = lines.next() else {
        bail!("input is empty");
    };

    let delimiter = detect_delimiter(header_line);
    let columns: Vec<(usize, String)> = split_fields(header_line, delimiter)
        .into_iter()
        .enumerate()
        .map(|(index, name)| (index, name.trim().to_string()))
        .filter(|(_, name)| !name.is_empty())
        .collect();
    if columns.is_empty() {
        bail!("header row has no named columns");
    }

    let rows: Vec<&str> = lines.collect();
    let layout = detect_layout(&columns);
    let records = match layout {
        TableLayout::LongFormat => long_format(&rows, delimiter, columns[0].0, columns[1].0),
        TableLayout::SingleColumn => {
            baskets(rows.iter().map(|line| unquote(line.trim()).to_string()))
        }
        TableLayout::ItemsColumn => {
            let index = items_column(&columns).unwrap_or(columns[0].0);
            let records = baskets(rows.iter().map(|line| cell(line, delimiter, index)));
            if records.is_empty() {
                // Nothing in the items column; fall back to reading the cells as flags.
                return one_hot(&rows, delimiter, &columns)
                    .map(|records| ParsedTable { layout: TableLayout::OneHot, records });
            }
            records
        }
        TableLayout::OneHot => one_hot(&rows, delimiter, &columns)?,
    };

    Ok(ParsedTable { layout, records })
}

fn detect_layout(columns: &[(usize, String)]) -> TableLayout {
    if columns.len() == 2 {
        let second = columns[1].1.to_lowercase();
        if second.contains("item") || second.contains("product") {
            return TableLayout::LongFormat;
        }
    }
    if columns.len() == 1 {
        return TableLayout::SingleColumn;
    }
    if items_column(columns).is_some() {
        return TableLayout::ItemsColumn;
    }
    TableLayout::OneHot
}

fn items_column(columns: &[(usize, String)]) -> Option<usize> {
    columns.iter().find(|(_, name)| name.to_lowercase().contains("item")).map(|(index, _)| *index)
}

fn long_format(
    rows: &[&str],
    delimiter: char,
    key_index: usize,
    item_index: usize,
) -> Vec<TransactionRecord> {
    rows.iter()
        .filter_map(|line| {
            let key = cell(line, delimiter, key_index);
            let item = cell(line, delimiter, item_index);
            if key.trim().is_empty() || item.trim().is_empty() {
                return None;
            }
            Some(TransactionRecord::keyed(key.trim(), [item]))
        })
        .collect()
}

fn baskets<I>(cells: I) -> Vec<TransactionRecord>
where
    I: Iterator<Item = String>,
{
    cells
        .map(|cell| split_basket(&cell))
        .filter(|items| !items.is_empty())
        .map(TransactionRecord::new)
        .collect()
}

fn one_hot(
    rows: &[&str],
    delimiter: char,
    columns: &[(usize, String)],
) -> anyhow::Result<Vec<TransactionRecord>> {
    let records: Vec<TransactionRecord> = rows
        .iter()
        .map(|line| {
            let fields = split_fields(line, delimiter);
            let items: Vec<String> = columns
                .iter()
                .filter(|(index, _)| fields.get(*index).is_some_and(|value| is_truthy(value)))
                .map(|(_, name)| name.clone())
                .collect();
            TransactionRecord::new(items)
        })
        .collect();

    if records.iter().all(|record| record.items.is_empty()) {
        bail!("no items found in any transaction after encoding");
    }
    Ok(records)
}

fn split_basket(cell: &str) -> Vec<String> {
    cell.split(',').map(str::trim).filter(|item| !item.is_empty()).map(str::to_string).collect()
}

fn cell(line: &str, delimiter: char, index: usize) -> String {
    split_fields(line, delimiter).into_iter().nth(index).unwrap_or_default()
}

/// Membership markers accepted in one-hot cells.
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    if matches!(value.as_str(), "1" | "true" | "yes" | "y" | "t" | "x") {
        return true;
    }
    value.parse::<f64>().is_ok_and(|number| number != 0.0 && !number.is_nan())
}

fn detect_delimiter(header: &str) -> char {
    let mut best = ',';
    let mut best_count = 0usize;
    for candidate in [',', ';', '\t'] {
        let count = split_fields(header, candidate).len() - 1;
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

/// Split `text` into rows at line breaks outside double-quoted fields.
fn split_records(text: &str) -> Vec<&str> {
    let mut rows = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (index, ch) in text.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '\n' if !in_quotes => {
                rows.push(text[start..index].trim_end_matches('\r'));
                start = index + 1;
            }
            _ => {}
        }
    }
    if start < text.len() {
        rows.push(text[start..].trim_end_matches('\r'));
    }
    rows
}

/// Split one row on `delimiter`, honouring double-quoted fields with `""`
/// as an escaped quote.
fn split_fields(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ch if ch == delimiter && !in_quotes => fields.push(std::mem::take(&mut current)),
            ch => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}
