//! Lay projected rows into a two-column single-sheet document.

use crate::conf::EnumFmtKey;
use crate::spec::{
    EnumColumnWidth, EnumDocumentCellValue, EnumProjectedValue, EnumRowKind, SpecDocument,
    SpecDocumentCell, SpecDocumentOptions, SpecProjectedRow,
};
use crate::util::{cut_str, estimate_unicode_string_width, sanitize_sheet_name};

/// Build the in-memory document for one export.
///
/// `title` is the raw record title and `author` the requesting user's display
/// name. Column A holds labels, column B values; media rows become hyperlinks.
pub fn build_document(
    title: &str,
    author: &str,
    rows: &[SpecProjectedRow],
    options: &SpecDocumentOptions,
) -> SpecDocument {
    let c_title = cut_str(title, options.title_limit, &options.ellipsis);
    let c_sheet_name = sanitize_sheet_name(&c_title, "_");

    let mut l_cells = Vec::with_capacity(rows.len() * 2 + 1);
    let n_row_data_start = if options.if_title_row {
        l_cells.push(SpecDocumentCell {
            row_idx: 0,
            col_idx: 0,
            value: EnumDocumentCellValue::Text(title.to_string()),
            fmt_key: EnumFmtKey::Title,
        });
        2
    } else {
        0
    };

    for (n_idx, row) in rows.iter().enumerate() {
        let n_row_idx = n_row_data_start + n_idx;
        l_cells.push(SpecDocumentCell {
            row_idx: n_row_idx,
            col_idx: 0,
            value: EnumDocumentCellValue::Text(row.label.clone()),
            fmt_key: EnumFmtKey::Label,
        });

        let (value, fmt_key) = match (&row.value, row.kind) {
            (EnumProjectedValue::Url(c_url), EnumRowKind::Media)
            | (EnumProjectedValue::Text(c_url), EnumRowKind::Media) => {
                (EnumDocumentCellValue::Url(c_url.clone()), EnumFmtKey::Link)
            }
            (val, _) => (
                EnumDocumentCellValue::Text(val.as_str().to_string()),
                EnumFmtKey::Value,
            ),
        };
        l_cells.push(SpecDocumentCell {
            row_idx: n_row_idx,
            col_idx: 1,
            value,
            fmt_key,
        });
    }

    SpecDocument {
        title: c_title,
        author: author.to_string(),
        sheet_name: c_sheet_name,
        paper_size: options.paper_size,
        orientation: options.orientation,
        column_widths: vec![
            EnumColumnWidth::Chars(derive_label_column_width(rows, options) as f64),
            EnumColumnWidth::Pixels(options.width_value_px),
        ],
        row_height: options.row_height,
        row_idx_data_start: n_row_data_start,
        n_rows_data: rows.len(),
        cells: l_cells,
        formats: options.formats.clone(),
    }
}

/// Width of the label column: widest label plus padding, clamped.
pub fn derive_label_column_width(
    rows: &[SpecProjectedRow],
    options: &SpecDocumentOptions,
) -> usize {
    let n_min = usize::max(1, options.width_label_min);
    let n_max = usize::min(255, usize::max(n_min, options.width_label_max));
    let n_width_recorded = rows
        .iter()
        .map(|row| estimate_unicode_string_width(&row.label))
        .max()
        .unwrap_or(0);

    usize::min(
        n_max,
        usize::max(n_min, n_width_recorded + options.width_label_padding),
    )
}
