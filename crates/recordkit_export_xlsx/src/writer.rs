//! Document serializer backed by `rust_xlsxwriter`.

use std::collections::BTreeMap;

use rust_xlsxwriter::{
    DocProperties, Format, FormatAlign, FormatUnderline, Workbook, Worksheet, XlsxError,
};
use tracing::debug;

use crate::conf::EnumFmtKey;
use crate::spec::{
    EnumColumnWidth, EnumDocumentCellValue, EnumDocumentFormat, EnumPageOrientation,
    EnumRowHeight, ExportError, SpecCellFormat, SpecDocument,
};

/// Serialize `document` into a complete in-memory file.
///
/// The document and the workbook built from it are consumed by this call and
/// released before it returns; nothing is written unless the whole workbook
/// was produced.
pub fn serialize_document(
    document: SpecDocument,
    format: EnumDocumentFormat,
) -> Result<Vec<u8>, ExportError> {
    match format {
        EnumDocumentFormat::Xlsx => serialize_xlsx(document).map_err(ExportError::Serialization),
    }
}

/// Serialize with a writer selected by format name (e.g. `"Xlsx"`).
pub fn serialize_document_as(document: SpecDocument, name: &str) -> Result<Vec<u8>, ExportError> {
    serialize_document(document, EnumDocumentFormat::from_name(name)?)
}

fn serialize_xlsx(document: SpecDocument) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();
    let properties = DocProperties::new()
        .set_title(&document.title)
        .set_author(&document.author);
    workbook.set_properties(&properties);

    {
        let worksheet = workbook.add_worksheet();
        write_sheet(worksheet, &document)?;
    }

    let v_bytes = workbook.save_to_buffer().map_err(derive_xlsx_error_text)?;
    drop(workbook);
    debug!(
        sheet = %document.sheet_name,
        n_rows = document.n_rows_data,
        n_bytes = v_bytes.len(),
        "document serialized"
    );
    Ok(v_bytes)
}

fn write_sheet(worksheet: &mut Worksheet, document: &SpecDocument) -> Result<(), String> {
    worksheet
        .set_name(&document.sheet_name)
        .map_err(derive_xlsx_error_text)?;
    worksheet.set_paper_size(document.paper_size);
    match document.orientation {
        EnumPageOrientation::Portrait => worksheet.set_portrait(),
        EnumPageOrientation::Landscape => worksheet.set_landscape(),
    };

    for (n_idx_col, width) in document.column_widths.iter().enumerate() {
        match width {
            EnumColumnWidth::Chars(n_width) => worksheet
                .set_column_width(cast_col_num(n_idx_col)?, *n_width)
                .map_err(derive_xlsx_error_text)?,
            EnumColumnWidth::Pixels(n_px) => worksheet
                .set_column_width_pixels(cast_col_num(n_idx_col)?, *n_px)
                .map_err(derive_xlsx_error_text)?,
        };
    }

    if let EnumRowHeight::Fixed(n_height) = document.row_height {
        for n_row_idx in
            document.row_idx_data_start..document.row_idx_data_start + document.n_rows_data
        {
            worksheet
                .set_row_height(cast_row_num(n_row_idx)?, n_height)
                .map_err(derive_xlsx_error_text)?;
        }
    }

    let dict_formats: BTreeMap<EnumFmtKey, Format> = document
        .formats
        .iter()
        .map(|(key, spec)| (*key, derive_rust_xlsx_format(spec)))
        .collect();
    let fmt_fallback = Format::new();

    for cell in &document.cells {
        let format = dict_formats.get(&cell.fmt_key).unwrap_or(&fmt_fallback);
        let n_row = cast_row_num(cell.row_idx)?;
        let n_col = cast_col_num(cell.col_idx)?;
        match &cell.value {
            EnumDocumentCellValue::Text(val) => {
                worksheet
                    .write_string_with_format(n_row, n_col, val, format)
                    .map_err(derive_xlsx_error_text)?;
            }
            EnumDocumentCellValue::Url(val) => {
                worksheet
                    .write_url_with_format(n_row, n_col, val.as_str(), format)
                    .map_err(derive_xlsx_error_text)?;
            }
        }
    }

    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }
    if spec.underline.unwrap_or(false) {
        format = format.set_underline(FormatUnderline::Single);
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }

    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "fill" => Some(FormatAlign::Fill),
        "justify" => Some(FormatAlign::Justify),
        "center_across" => Some(FormatAlign::CenterAcross),
        "distributed" => Some(FormatAlign::Distributed),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        "vjustify" | "vertical_justify" => Some(FormatAlign::VerticalJustify),
        "vdistributed" | "vertical_distributed" => Some(FormatAlign::VerticalDistributed),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

fn derive_xlsx_error_text(err: XlsxError) -> String {
    err.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::build_document;
    use crate::spec::{EnumProjectedValue, EnumRowKind, SpecDocumentOptions, SpecProjectedRow};

    fn create_document(rows: &[SpecProjectedRow]) -> SpecDocument {
        build_document("Harbour survey", "editor", rows, &SpecDocumentOptions::default())
    }

    #[test]
    fn test_serialize_document_produces_zip_container() {
        let rows = vec![SpecProjectedRow {
            label: "Title".to_string(),
            value: EnumProjectedValue::Text("Harbour survey".to_string()),
            kind: EnumRowKind::Plain,
        }];
        let v_bytes =
            serialize_document(create_document(&rows), EnumDocumentFormat::Xlsx).expect("xlsx");
        assert!(v_bytes.starts_with(b"PK\x03\x04"));
    }

    #[test]
    fn test_serialize_document_rejects_unknown_writer() {
        assert_eq!(
            serialize_document_as(create_document(&[]), "Csv"),
            Err(ExportError::UnsupportedFormat("Csv".to_string()))
        );
    }

    #[test]
    fn test_serialize_document_reports_writer_failure() {
        let rows = vec![SpecProjectedRow {
            label: "Attachment".to_string(),
            value: EnumProjectedValue::Url(format!("https://example.org/{}", "a".repeat(2100))),
            kind: EnumRowKind::Media,
        }];
        assert!(matches!(
            serialize_document(create_document(&rows), EnumDocumentFormat::Xlsx),
            Err(ExportError::Serialization(_))
        ));
    }

    #[test]
    fn test_derive_format_align() {
        assert_eq!(derive_format_align(" VCenter "), Some(FormatAlign::VerticalCenter));
        assert_eq!(derive_format_align("sideways"), None);
    }
}
