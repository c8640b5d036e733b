//! Export constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::SpecCellFormat;

/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Character limit applied to document title and sheet name.
pub const N_LEN_TITLE_MAX: usize = 30;
/// Marker appended to truncated text.
pub const C_ELLIPSIS_DEFAULT: &str = " …";
/// Break token used by word wrap before cutting; never expected in titles.
pub const C_WRAP_SENTINEL: &str = "\u{1}~wrap~\u{1}";

/// Value column width in pixels (about 4.46 inches at 96 dpi).
pub const N_PX_VALUE_COLUMN_WIDTH: u16 = 428;
/// Padding added to the estimated label width.
pub const N_WIDTH_LABEL_PADDING: usize = 2;
/// Lower bound for the label column width.
pub const N_WIDTH_LABEL_MIN: usize = 8;
/// Upper bound for the label column width.
pub const N_WIDTH_LABEL_MAX: usize = 60;

/// Excel paper size code for A4.
pub const N_PAPER_SIZE_A4: u8 = 9;

/// Response content type for spreadsheet downloads.
pub const C_CONTENT_TYPE_XLSX: &str = "application/vnd.ms-excel";
/// File extension of exported documents.
pub const C_FILE_EXTENSION_XLSX: &str = "xlsx";

/// URL prefixes the sheet writer accepts for hyperlinks (lowercase).
pub const TUP_URL_PREFIX_SUPPORTED: [&str; 6] =
    ["http://", "https://", "ftp://", "ftps://", "mailto:", "file://"];

/// Target type of taxonomy term references.
pub const C_TARGET_TYPE_TAXONOMY_TERM: &str = "taxonomy_term";

/// Canonical format preset keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnumFmtKey {
    /// Label column cells.
    Label,
    /// Value column cells.
    Value,
    /// Value cells carrying a hyperlink.
    Link,
    /// Title row cell.
    Title,
}

/// Build default named format presets used by the document builder.
pub fn derive_default_export_formats() -> BTreeMap<EnumFmtKey, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat {
        valign: Some("vcenter".to_string()),
        text_wrap: Some(true),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert(EnumFmtKey::Label, cfg_base_fmt_spec.clone());
    dict_fmt.insert(EnumFmtKey::Value, cfg_base_fmt_spec.clone());
    dict_fmt.insert(
        EnumFmtKey::Link,
        cfg_base_fmt_spec.with_(SpecCellFormat {
            font_color: Some("0563C1".to_string()),
            underline: Some(true),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Title,
        SpecCellFormat {
            font_name: Some("Verdana".to_string()),
            font_size: Some(12),
            bold: Some(true),
            font_color: Some("161617".to_string()),
            ..Default::default()
        },
    );

    dict_fmt
}
