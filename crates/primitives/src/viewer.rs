//! Plain-text rendering of a context for inspection

use annota_context::{Context, DumpRow};

const HEADERS: [&str; 3] = ["ref", "field", "value"];

/// Render dump rows as an aligned three-column table
///
/// ```
/// use annota_context::DumpRow;
/// use annota_primitives::render_dump;
///
/// let table = render_dump(&[DumpRow {
///     reference: "title".to_string(),
///     field: "Diff".to_string(),
///     value: "Added".to_string(),
/// }]);
/// assert_eq!(table, "ref    field  value\ntitle  Diff   Added\n");
/// ```
pub fn render_dump(rows: &[DumpRow]) -> String {
    let mut widths = HEADERS.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(cells(row)) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, HEADERS, &widths);
    for row in rows {
        push_line(&mut out, cells(row), &widths);
    }
    out
}

/// Render the current contents of `context`
pub fn render_context(context: &Context) -> String {
    render_dump(&context.dump())
}

fn cells(row: &DumpRow) -> [&str; 3] {
    [&row.reference, &row.field, &row.value]
}

fn push_line(out: &mut String, cells: [&str; 3], widths: &[usize; 3]) {
    let last = cells.len() - 1;
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        out.push_str(cell);
        if i < last {
            let pad = width - cell.chars().count() + 2;
            out.extend(std::iter::repeat(' ').take(pad));
        }
    }
    out.push('\n');
}
