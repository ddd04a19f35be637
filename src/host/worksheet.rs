//! Worksheet host.
//!
//! A sparse grid of typed cells. A scan visits the cells of one column; a
//! linked cell shows the cleaned-up display text ("10" for `10.0`) and carries
//! the hyperlink.

use super::{char_slice, RegionSource};
use crate::annotate::{chars_eq_ignore_case, Hyperlink, MutableTextRegion, RegionKind};
use crate::error::{MutationError, Result};
use crate::extract::{CellValue, Span};
use crate::session::{HostOptions, HostSettings};
use std::collections::BTreeMap;

/// Column number (1-based) as letters: 1 → "A", 27 → "AA".
pub fn column_letter(col: u32) -> String {
    let mut n = col;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// One cell of a [`Worksheet`].
#[derive(Debug, Clone, PartialEq)]
pub struct SheetCell {
    sheet: String,
    row: u32,
    col: u32,
    value: CellValue,
    link: Option<Hyperlink>,
}

impl SheetCell {
    /// Cell value.
    pub fn value(&self) -> &CellValue {
        &self.value
    }

    /// Hyperlink, once linked.
    pub fn link(&self) -> Option<&Hyperlink> {
        self.link.as_ref()
    }

    /// A1-style reference, e.g. "B3".
    pub fn reference(&self) -> String {
        format!("{}{}", column_letter(self.col), self.row)
    }
}

impl MutableTextRegion for SheetCell {
    fn label(&self) -> String {
        format!("{}!{}", self.sheet, self.reference())
    }

    fn kind(&self) -> RegionKind {
        RegionKind::Cell {
            row: self.row,
            col: self.col,
        }
    }

    fn read_text(&self) -> Result<String> {
        Ok(self.value.raw_text())
    }

    fn read_span(&self, span: Span) -> Option<String> {
        char_slice(&self.value.raw_text(), span.start, span.end)
    }

    fn mutate(&mut self, span: Span, link: &Hyperlink) -> std::result::Result<(), MutationError> {
        if self.link.is_some() {
            return Err(MutationError::Host(format!("{} already has a hyperlink", self.reference())));
        }
        let len = self.value.raw_text().chars().count();
        if span.end > len {
            return Err(MutationError::OutOfBounds {
                start: span.start,
                end: span.end,
                len,
            });
        }
        if span != Span::new(0, len) {
            // Cell hyperlinks always cover the whole cell.
            return Err(MutationError::OffsetUnreliable {
                start: span.start,
                end: span.end,
            });
        }
        self.value = CellValue::Text(link.display_text.clone());
        self.link = Some(link.clone());
        Ok(())
    }

    fn find(&self, needle: &str, from: usize) -> Option<Span> {
        let chars: Vec<char> = self.value.raw_text().chars().collect();
        let n = needle.chars().count();
        if n == 0 || n > chars.len() {
            return None;
        }
        (from..=chars.len() - n).find_map(|start| {
            let window: String = chars[start..start + n].iter().collect();
            chars_eq_ignore_case(&window, needle).then(|| Span::new(start, start + n))
        })
    }

    fn cell_value(&self) -> Option<CellValue> {
        Some(self.value.clone())
    }
}

/// A named sheet; scans visit the cells of its selected column.
#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    column: u32,
    cells: BTreeMap<(u32, u32), SheetCell>,
    options: HostOptions,
}

impl Worksheet {
    /// Create an empty sheet scanning column A.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: 1,
            cells: BTreeMap::new(),
            options: HostOptions::default(),
        }
    }

    /// Select the column a scan visits.
    pub fn with_column(mut self, col: u32) -> Self {
        self.column = col.max(1);
        self
    }

    /// Selected column.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Sheet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set a cell value (1-based row and column), dropping any link.
    pub fn set(&mut self, row: u32, col: u32, value: CellValue) {
        self.cells.insert(
            (row, col),
            SheetCell {
                sheet: self.name.clone(),
                row,
                col,
                value,
                link: None,
            },
        );
    }

    /// Fill `col` from row 1 down.
    pub fn set_column(&mut self, col: u32, values: impl IntoIterator<Item = CellValue>) {
        for (i, value) in values.into_iter().enumerate() {
            self.set(i as u32 + 1, col, value);
        }
    }

    /// A cell, if set.
    pub fn cell(&self, row: u32, col: u32) -> Option<&SheetCell> {
        self.cells.get(&(row, col))
    }

    /// Linked cells in row order.
    pub fn hyperlinks(&self) -> impl Iterator<Item = (&SheetCell, &Hyperlink)> {
        self.cells
            .values()
            .filter_map(|cell| cell.link.as_ref().map(|link| (cell, link)))
    }
}

impl RegionSource for Worksheet {
    fn regions_mut(&mut self) -> Vec<&mut dyn MutableTextRegion> {
        let column = self.column;
        self.cells
            .values_mut()
            .filter(|cell| cell.col == column)
            .map(|cell| cell as &mut dyn MutableTextRegion)
            .collect()
    }
}

impl HostSettings for Worksheet {
    fn options(&self) -> HostOptions {
        self.options.clone()
    }

    fn set_options(&mut self, options: &HostOptions) -> Result<()> {
        self.options = options.clone();
        Ok(())
    }
}
