//! Heuristic location of the data table on a report page.
//!
//! Report pages wrap the real data table in layout and navigation tables
//! whose position moves between site revisions, so no fixed selector is
//! used. Every `<table>` is scored by how many of its rows look like data
//! (four or more cells, at least two of cells 1..=3 numeric) and the best
//! scoring table wins. Ties keep the table that appears first.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("valid selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid selector"));
static SIGNED_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+(\.\d+)?$").expect("valid regex"));

/// Minimum cell count for a row to be considered data.
const MIN_DATA_CELLS: usize = 4;

/// One `<td>` of an extracted row.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Concatenated text content, untrimmed.
    pub text: String,
    /// Inner HTML, kept because some labels only exist inside markup.
    pub html: String,
}

/// Cells of one `<tr>` in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTableRow {
    pub cells: Vec<Cell>,
}

impl RawTableRow {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Trimmed text of cell `idx`, or `""` when out of range.
    pub fn text(&self, idx: usize) -> &str {
        self.cells.get(idx).map(|c| c.text.trim()).unwrap_or("")
    }
}

/// Parses `html` and returns the rows of its most data-like table.
///
/// A document without any table yields no rows.
pub fn extract_table(html: &str) -> Vec<RawTableRow> {
    let document = Html::parse_document(html);
    extract_from_document(&document)
}

/// Same as [`extract_table`] for an already parsed document.
pub fn extract_from_document(document: &Html) -> Vec<RawTableRow> {
    let best = document
        .select(&TABLE)
        .enumerate()
        .map(|(idx, table)| (idx, table, score_table(table)))
        .fold(None::<(usize, ElementRef, usize)>, |best, candidate| match best {
            Some(current) if current.2 >= candidate.2 => Some(current),
            _ => Some(candidate),
        });

    match best {
        Some((idx, table, score)) => {
            tracing::debug!("selected table #{} with {} data rows", idx, score);
            own_rows(table).map(to_raw_row).collect()
        }
        None => {
            tracing::debug!("document contains no table");
            Vec::new()
        }
    }
}

/// Number of rows in `table` that look like data rows.
///
/// Rows belonging to nested tables are scored with their own table.
pub fn score_table(table: ElementRef<'_>) -> usize {
    own_rows(table).filter(|row| is_data_row(*row)).count()
}

/// Whether `raw` reads as a signed decimal once thousands separators are removed.
pub fn is_signed_decimal(raw: &str) -> bool {
    let cleaned = raw.replace(',', "");
    SIGNED_DECIMAL.is_match(cleaned.trim())
}

fn is_data_row(row: ElementRef<'_>) -> bool {
    let cells: Vec<ElementRef<'_>> = cells_of(row).collect();
    if cells.len() < MIN_DATA_CELLS {
        return false;
    }
    let numeric = cells[1..MIN_DATA_CELLS]
        .iter()
        .filter(|cell| is_signed_decimal(&cell.text().collect::<String>()))
        .count();
    numeric >= 2
}

fn own_rows<'a>(table: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    table
        .select(&ROW)
        .filter(move |row| nearest_table(*row).is_some_and(|t| t.id() == table.id()))
}

fn nearest_table(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
}

fn cells_of<'a>(row: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
}

fn to_raw_row(row: ElementRef<'_>) -> RawTableRow {
    RawTableRow {
        cells: cells_of(row)
            .map(|el| Cell {
                text: el.text().collect(),
                html: el.inner_html(),
            })
            .collect(),
    }
}
