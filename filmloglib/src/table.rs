//! Generic aligned-column plain-text table layout.
//!
//! A table is an optional header row plus data rows of [`Col`] values.
//! Column widths are the maximum displayed width at each index across
//! header and rows; flexible (non-fixed) columns can then be stretched to
//! fill a target total width. Content is never truncated: this is a
//! minimum-width layout, not a clipping one.
//!
//! Two content kinds are provided: [`Text`] measures width as the code
//! point count, [`TermText`] measures terminal display cells and ignores
//! ANSI escape sequences. The [`ColExt`] wrappers compose orthogonally,
//! each overriding exactly one property of the wrapped column.

use std::io::{self, Write};

use console::measure_text_width;

/// Horizontal cell alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Right,
}

/// A table cell: content plus its layout capabilities.
pub trait Col {
    /// The raw cell content, excluding prefix and suffix.
    fn content(&self) -> &str;

    /// Displayed width of the content. Prefix and suffix never count.
    fn width(&self) -> usize;

    fn align(&self) -> Align {
        Align::Left
    }

    /// Decoration written before the padded content (color escapes, tags).
    fn prefix(&self) -> &str {
        ""
    }

    /// Decoration written after the padded content.
    fn suffix(&self) -> &str {
        ""
    }

    /// Fixed columns are exempt from width stretching.
    fn is_fixed(&self) -> bool {
        false
    }
}

/// Plain Unicode text; width is the code point count.
#[derive(Debug, Clone)]
pub struct Text(String);

impl Text {
    pub fn new(s: impl Into<String>) -> Self {
        Text(s.into())
    }
}

impl Col for Text {
    fn content(&self) -> &str {
        &self.0
    }

    fn width(&self) -> usize {
        self.0.chars().count()
    }
}

/// Terminal text; width is the display cell count, ANSI escapes excluded.
#[derive(Debug, Clone)]
pub struct TermText(String);

impl TermText {
    pub fn new(s: impl Into<String>) -> Self {
        TermText(s.into())
    }
}

impl Col for TermText {
    fn content(&self) -> &str {
        &self.0
    }

    fn width(&self) -> usize {
        measure_text_width(&self.0)
    }
}

/// Wrapper marking a column as fixed-width.
#[derive(Debug, Clone)]
pub struct Fixed<C>(C);

impl<C: Col> Col for Fixed<C> {
    fn content(&self) -> &str {
        self.0.content()
    }

    fn width(&self) -> usize {
        self.0.width()
    }

    fn align(&self) -> Align {
        self.0.align()
    }

    fn prefix(&self) -> &str {
        self.0.prefix()
    }

    fn suffix(&self) -> &str {
        self.0.suffix()
    }

    fn is_fixed(&self) -> bool {
        true
    }
}

/// Wrapper overriding a column's alignment.
#[derive(Debug, Clone)]
pub struct Aligned<C> {
    inner: C,
    align: Align,
}

impl<C: Col> Col for Aligned<C> {
    fn content(&self) -> &str {
        self.inner.content()
    }

    fn width(&self) -> usize {
        self.inner.width()
    }

    fn align(&self) -> Align {
        self.align
    }

    fn prefix(&self) -> &str {
        self.inner.prefix()
    }

    fn suffix(&self) -> &str {
        self.inner.suffix()
    }

    fn is_fixed(&self) -> bool {
        self.inner.is_fixed()
    }
}

/// Wrapper overriding a column's prefix and suffix decoration.
#[derive(Debug, Clone)]
pub struct Decorated<C> {
    inner: C,
    prefix: String,
    suffix: String,
}

impl<C: Col> Col for Decorated<C> {
    fn content(&self) -> &str {
        self.inner.content()
    }

    fn width(&self) -> usize {
        self.inner.width()
    }

    fn align(&self) -> Align {
        self.inner.align()
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn suffix(&self) -> &str {
        &self.suffix
    }

    fn is_fixed(&self) -> bool {
        self.inner.is_fixed()
    }
}

/// Combinators for building decorated columns.
pub trait ColExt: Col + Sized {
    /// Exempt this column from width stretching.
    fn fixed(self) -> Fixed<Self> {
        Fixed(self)
    }

    fn align_right(self) -> Aligned<Self> {
        Aligned {
            inner: self,
            align: Align::Right,
        }
    }

    fn align_left(self) -> Aligned<Self> {
        Aligned {
            inner: self,
            align: Align::Left,
        }
    }

    /// Surround the padded content with decoration that does not count
    /// toward the cell width.
    fn decorated(self, prefix: impl Into<String>, suffix: impl Into<String>) -> Decorated<Self> {
        Decorated {
            inner: self,
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }
}

impl<C: Col> ColExt for C {}

/// An accumulating table of rows.
///
/// Rows may have differing lengths; short rows simply do not render the
/// trailing columns.
#[derive(Default)]
pub struct Table {
    target_width: usize,
    head: Vec<Box<dyn Col>>,
    rows: Vec<Vec<Box<dyn Col>>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stretch flexible columns so the summed widths reach `width`. Zero
    /// disables stretching. Widths already at or past the target are left
    /// untouched.
    pub fn set_target_width(&mut self, width: usize) {
        self.target_width = width;
    }

    /// Append a column to the header row.
    pub fn add_head(&mut self, col: impl Col + 'static) {
        self.head.push(Box::new(col));
    }

    /// Open a new, empty data row.
    pub fn new_row(&mut self) {
        self.rows.push(Vec::new());
    }

    /// Append a column to the current row, opening one if none exists.
    pub fn add(&mut self, col: impl Col + 'static) {
        if self.rows.is_empty() {
            self.rows.push(Vec::new());
        }
        if let Some(row) = self.rows.last_mut() {
            row.push(Box::new(col));
        }
    }

    /// Per-index widths and fixed flags across header and all rows.
    fn layout(&self) -> (Vec<usize>, Vec<bool>) {
        let mut count = self.head.len();
        for row in &self.rows {
            count = count.max(row.len());
        }

        let mut widths = vec![0usize; count];
        let mut fixed = vec![false; count];

        for (i, col) in self.head.iter().enumerate() {
            widths[i] = col.width();
            fixed[i] = col.is_fixed();
        }
        for row in &self.rows {
            for (i, col) in row.iter().enumerate() {
                widths[i] = widths[i].max(col.width());
                fixed[i] = fixed[i] || col.is_fixed();
            }
        }

        self.stretch(&mut widths, &fixed);
        (widths, fixed)
    }

    /// Distribute surplus space up to the target width over flexible
    /// columns. The first flexible column absorbs the division remainder.
    fn stretch(&self, widths: &mut [usize], fixed: &[bool]) {
        if self.target_width == 0 {
            return;
        }
        let sum: usize = widths.iter().sum();
        if sum >= self.target_width {
            return;
        }
        let flexible = fixed.iter().filter(|f| !**f).count();
        if flexible == 0 {
            return;
        }

        let surplus = self.target_width - sum;
        let per = surplus / flexible;
        let mut rem = surplus - per * flexible;
        for (w, is_fixed) in widths.iter_mut().zip(fixed) {
            if !is_fixed {
                *w += per + rem;
                rem = 0;
            }
        }
    }

    /// Serialize the table: header first (if any), then every row, cells
    /// padded to the computed widths and joined by `sep`.
    pub fn write_to<W: Write>(&self, w: &mut W, sep: &str) -> io::Result<()> {
        let (widths, _) = self.layout();

        if !self.head.is_empty() {
            write_row(w, &self.head, &widths, sep)?;
        }
        for row in &self.rows {
            write_row(w, row, &widths, sep)?;
        }
        Ok(())
    }

    /// Render to a string; useful for tests and small reports.
    pub fn to_string_with(&self, sep: &str) -> String {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail.
        let _ = self.write_to(&mut buf, sep);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

fn write_row<W: Write>(
    w: &mut W,
    row: &[Box<dyn Col>],
    widths: &[usize],
    sep: &str,
) -> io::Result<()> {
    for (i, col) in row.iter().enumerate() {
        if i > 0 {
            w.write_all(sep.as_bytes())?;
        }
        let pad = " ".repeat(widths[i].saturating_sub(col.width()));
        match col.align() {
            Align::Left => write!(
                w,
                "{}{}{}{}",
                col.prefix(),
                col.content(),
                pad,
                col.suffix()
            )?,
            Align::Right => write!(
                w,
                "{}{}{}{}",
                col.prefix(),
                pad,
                col.content(),
                col.suffix()
            )?,
        }
    }
    writeln!(w)
}
