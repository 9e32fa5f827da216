//! Tabular model shared by every renderer.
//!
//! Rows are keyed by column name and resolved against the header list of the
//! sheet (or table) that owns them. Renderers only ever borrow these values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single cell value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

static NULL_CELL: CellValue = CellValue::Null;

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Canonical textual form used by the text and document renderers.
    ///
    /// `Null` renders as the empty string, numbers in shortest decimal form
    /// (`1` rather than `1.0`).
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => format_number(*n),
            CellValue::String(s) => s.clone(),
        }
    }
}

/// Formats a number the way a report reader expects to see it.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".into() } else { "-Infinity".into() }
    } else if n == 0.0 {
        // Collapses -0.
        "0".into()
    } else {
        n.to_string()
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(f64::from(value))
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        CellValue::Number(f64::from(value))
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}

/// One row: column key to value, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(IndexMap<String, CellValue>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<CellValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns the cell for `key`, or `Null` when the row has no such key.
    pub fn cell(&self, key: &str) -> &CellValue {
        self.0.get(key).unwrap_or(&NULL_CELL)
    }

    /// Resolves the row against a header list, one cell per header.
    pub fn resolve<'a>(&'a self, headers: &[String]) -> Vec<&'a CellValue> {
        headers.iter().map(|h| self.cell(h)).collect()
    }

    /// Raw values in insertion order. Used when no headers are declared.
    pub fn values(&self) -> impl Iterator<Item = &CellValue> {
        self.0.values()
    }

    /// Cells in header order, or raw values when `headers` is empty.
    pub(crate) fn cells<'a>(&'a self, headers: &[String]) -> Vec<&'a CellValue> {
        if headers.is_empty() {
            self.values().collect()
        } else {
            self.resolve(headers)
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Row(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One tab's worth of tabular data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sheet {
    pub name: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            name: None,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn named(name: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(headers)
        }
    }

    /// Replace the column list, keeping name and rows.
    pub fn with_headers(mut self, headers: &[&str]) -> Self {
        self.headers = headers.iter().map(|h| h.to_string()).collect();
        self
    }

    pub fn with_rows(mut self, rows: impl IntoIterator<Item = Row>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }
}

/// Headers and rows rendered inside a document section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(headers: &[&str], rows: Vec<Row>) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }
}

impl From<Sheet> for Table {
    fn from(sheet: Sheet) -> Self {
        Self {
            headers: sheet.headers,
            rows: sheet.rows,
        }
    }
}

/// One titled block of a paginated document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Section {
    pub heading: Option<String>,
    pub table: Option<Table>,
}

impl Section {
    pub fn heading(heading: impl Into<String>) -> Self {
        Self {
            heading: Some(heading.into()),
            table: None,
        }
    }

    pub fn table(table: Table) -> Self {
        Self {
            heading: None,
            table: Some(table),
        }
    }

    pub fn heading_with_table(heading: impl Into<String>, table: Table) -> Self {
        Self {
            heading: Some(heading.into()),
            table: Some(table),
        }
    }

    /// A section with neither heading nor table. Rendered as spacing only.
    pub fn is_empty(&self) -> bool {
        self.heading.is_none() && self.table.is_none()
    }
}

/// A titled sequence of sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub title: String,
    pub sections: Vec<Section>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sections: Vec::new(),
        }
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn push_section(&mut self, section: Section) {
        self.sections.push(section);
    }
}
