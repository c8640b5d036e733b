//! Shared export specification models and top-level error type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conf::{
    C_ELLIPSIS_DEFAULT, EnumFmtKey, N_LEN_TITLE_MAX, N_PAPER_SIZE_A4, N_PX_VALUE_COLUMN_WIDTH,
    N_WIDTH_LABEL_MAX, N_WIDTH_LABEL_MIN, N_WIDTH_LABEL_PADDING, derive_default_export_formats,
};

////////////////////////////////////////////////////////////////////////////////
// #region RecordSpecification

/// Raw field value as handed over by the record adapter.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EnumRawValue {
    /// Field has no items.
    #[default]
    Null,
    /// Boolean item.
    Boolean(bool),
    /// Integer item (ids, timestamps, counters).
    Integer(i64),
    /// Floating point item.
    Float(f64),
    /// Text item.
    String(String),
    /// Multi-value field items, in delta order.
    List(Vec<EnumRawValue>),
}

impl EnumRawValue {
    /// Whether the value carries nothing displayable.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            Self::List(items) => items.iter().all(EnumRawValue::is_empty),
            Self::Boolean(_) | Self::Integer(_) | Self::Float(_) => false,
        }
    }

    /// Flatten to display text; list items are joined with `", "`.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Boolean(val) => Some(if *val { "1" } else { "0" }.to_string()),
            Self::Integer(val) => Some(val.to_string()),
            Self::Float(val) => Some(val.to_string()),
            Self::String(val) => Some(val.clone()),
            Self::List(items) => {
                let l_parts: Vec<String> = items
                    .iter()
                    .filter_map(EnumRawValue::to_text)
                    .filter(|s| !s.is_empty())
                    .collect();
                if l_parts.is_empty() {
                    None
                } else {
                    Some(l_parts.join(", "))
                }
            }
        }
    }
}

/// Per-field settings relevant to formatting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecFieldSettings {
    /// Entity type referenced by reference fields (e.g. `taxonomy_term`).
    pub target_type: Option<String>,
    /// Bundles the reference may point at.
    pub target_bundles: Vec<String>,
}

/// Schema entry describing one record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFieldDescriptor {
    /// Machine name.
    pub name: String,
    /// Human label; falls back to `name` when absent.
    pub label: Option<String>,
    /// Field type tag used for formatter dispatch.
    pub type_tag: String,
    /// Type-specific settings.
    pub settings: SpecFieldSettings,
}

impl SpecFieldDescriptor {
    /// Create a descriptor without label or settings.
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            type_tag: type_tag.into(),
            settings: SpecFieldSettings::default(),
        }
    }

    /// Set the human label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the reference target type.
    pub fn with_target_type(mut self, target_type: impl Into<String>) -> Self {
        self.settings.target_type = Some(target_type.into());
        self
    }

    /// Label shown in the first column.
    pub fn display_label(&self) -> &str {
        match &self.label {
            Some(label) if !label.trim().is_empty() => label,
            _ => &self.name,
        }
    }
}

/// One record field: descriptor plus its raw value.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecRecordField {
    /// Field schema entry.
    pub descriptor: SpecFieldDescriptor,
    /// Raw value.
    pub value: EnumRawValue,
}

/// Content item to export.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecRecord {
    /// Record identifier.
    pub id: String,
    /// Record title.
    pub title: String,
    /// Type/bundle used for the export allow-list.
    pub category: String,
    /// Fields in schema order.
    pub fields: Vec<SpecRecordField>,
}

impl SpecRecord {
    /// Create an empty record.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: category.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field, keeping declaration order.
    pub fn push_field(&mut self, descriptor: SpecFieldDescriptor, value: EnumRawValue) {
        self.fields.push(SpecRecordField { descriptor, value });
    }

    /// Builder variant of [`Self::push_field`].
    pub fn with_field(mut self, descriptor: SpecFieldDescriptor, value: EnumRawValue) -> Self {
        self.push_field(descriptor, value);
        self
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ProjectionSpecification

/// Display kind of a projected row; drives styling downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumRowKind {
    /// Plain text value.
    Plain,
    /// Formatted date/time.
    Timestamp,
    /// HTML flattened to one line.
    RichText,
    /// Joined referenced entity names.
    ReferenceList,
    /// Public URL of a media file.
    Media,
}

/// Projected cell value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumProjectedValue {
    /// Display text.
    Text(String),
    /// Absolute URL.
    Url(String),
}

impl EnumProjectedValue {
    /// Textual content of the value.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(val) | Self::Url(val) => val,
        }
    }
}

/// Formatter result for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumFormatOutcome {
    /// Field yields one row.
    Value {
        /// Formatted value.
        value: EnumProjectedValue,
        /// Row kind.
        kind: EnumRowKind,
    },
    /// Field yields no row.
    Suppressed,
}

impl EnumFormatOutcome {
    /// Text-valued outcome.
    pub fn text(value: impl Into<String>, kind: EnumRowKind) -> Self {
        Self::Value {
            value: EnumProjectedValue::Text(value.into()),
            kind,
        }
    }
}

/// One (label, value, kind) row of the projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecProjectedRow {
    /// Field label.
    pub label: String,
    /// Formatted value.
    pub value: EnumProjectedValue,
    /// Row kind.
    pub kind: EnumRowKind,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,
    /// Single underline.
    pub underline: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            underline: other.underline.or(self.underline),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            text_wrap: other.text_wrap.or(self.text_wrap),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DocumentSpecification

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumPageOrientation {
    /// Portrait (default).
    #[default]
    Portrait,
    /// Landscape.
    Landscape,
}

/// Row height policy for data rows.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EnumRowHeight {
    /// Let the spreadsheet application size rows from content.
    #[default]
    Auto,
    /// Fixed height in points.
    Fixed(f64),
}

/// Column width in the unit it was planned in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnumColumnWidth {
    /// Width in character units.
    Chars(f64),
    /// Width in pixels.
    Pixels(u16),
}

/// Output document format, selected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumDocumentFormat {
    /// Office Open XML workbook.
    #[default]
    Xlsx,
}

impl EnumDocumentFormat {
    /// Resolve a writer format by (case-insensitive) name.
    pub fn from_name(name: &str) -> Result<Self, ExportError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Ok(Self::Xlsx),
            _ => Err(ExportError::UnsupportedFormat(name.to_string())),
        }
    }
}

/// Value stored in one document cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumDocumentCellValue {
    /// Text cell.
    Text(String),
    /// Hyperlink cell; the URL is also the displayed text.
    Url(String),
}

/// One styled cell of the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDocumentCell {
    /// Zero-based row index.
    pub row_idx: usize,
    /// Zero-based column index.
    pub col_idx: usize,
    /// Cell value.
    pub value: EnumDocumentCellValue,
    /// Format preset applied to the cell.
    pub fmt_key: EnumFmtKey,
}

/// Options controlling document metadata, page setup and layout.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDocumentOptions {
    /// Page orientation.
    pub orientation: EnumPageOrientation,
    /// Excel paper size code.
    pub paper_size: u8,
    /// Write the record title in A1 above the data.
    pub if_title_row: bool,
    /// Character limit for document title and sheet name.
    pub title_limit: usize,
    /// Marker appended to truncated titles.
    pub ellipsis: String,
    /// Data row height policy.
    pub row_height: EnumRowHeight,
    /// Value column width in pixels.
    pub width_value_px: u16,
    /// Minimum label column width.
    pub width_label_min: usize,
    /// Maximum label column width.
    pub width_label_max: usize,
    /// Padding added to the estimated label width.
    pub width_label_padding: usize,
    /// Format presets by key.
    pub formats: BTreeMap<EnumFmtKey, SpecCellFormat>,
}

impl Default for SpecDocumentOptions {
    fn default() -> Self {
        Self {
            orientation: EnumPageOrientation::Portrait,
            paper_size: N_PAPER_SIZE_A4,
            if_title_row: false,
            title_limit: N_LEN_TITLE_MAX,
            ellipsis: C_ELLIPSIS_DEFAULT.to_string(),
            row_height: EnumRowHeight::Auto,
            width_value_px: N_PX_VALUE_COLUMN_WIDTH,
            width_label_min: N_WIDTH_LABEL_MIN,
            width_label_max: N_WIDTH_LABEL_MAX,
            width_label_padding: N_WIDTH_LABEL_PADDING,
            formats: derive_default_export_formats(),
        }
    }
}

/// In-memory single-sheet document, built per export.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDocument {
    /// Document title (truncated record title).
    pub title: String,
    /// Creator and last-modified-by.
    pub author: String,
    /// Excel-safe sheet name.
    pub sheet_name: String,
    /// Excel paper size code.
    pub paper_size: u8,
    /// Page orientation.
    pub orientation: EnumPageOrientation,
    /// Widths by column index.
    pub column_widths: Vec<EnumColumnWidth>,
    /// Row height policy for data rows.
    pub row_height: EnumRowHeight,
    /// Index of the first data row.
    pub row_idx_data_start: usize,
    /// Number of data rows.
    pub n_rows_data: usize,
    /// Cells in write order.
    pub cells: Vec<SpecDocumentCell>,
    /// Format presets referenced by cells.
    pub formats: BTreeMap<EnumFmtKey, SpecCellFormat>,
}

impl SpecDocument {
    /// Look up the cell at `(row_idx, col_idx)`.
    pub fn cell(&self, row_idx: usize, col_idx: usize) -> Option<&SpecDocumentCell> {
        self.cells
            .iter()
            .find(|cell| cell.row_idx == row_idx && cell.col_idx == col_idx)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Export failures.
///
/// Reference and value errors are row-local and recovered by the projector;
/// everything else aborts the export.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// A referenced file or term could not be resolved.
    #[error("Unresolvable reference in field {field:?}: id {id:?} ({message})")]
    UnresolvableReference {
        /// Field machine name.
        field: String,
        /// Offending reference id.
        id: String,
        /// Resolver error text.
        message: String,
    },
    /// Raw value cannot be interpreted by the field's formatter.
    #[error("Invalid value in field {field:?}: {message}")]
    InvalidFieldValue {
        /// Field machine name.
        field: String,
        /// Error text.
        message: String,
    },
    /// The writer library failed to produce output.
    #[error("xlsx write error: {0}")]
    Serialization(String),
    /// Requested writer format is not available.
    #[error("Unsupported document format: {0:?}")]
    UnsupportedFormat(String),
    /// Caller lacks the export permission.
    #[error("User {user:?} is not allowed to export content")]
    AuthorizationDenied {
        /// Requesting user display name.
        user: String,
    },
    /// Record category is not enabled for export.
    #[error("Export is not enabled for category {category:?}")]
    CategoryNotEnabled {
        /// Record category.
        category: String,
    },
    /// Configuration could not be read or is invalid.
    #[error("Invalid export configuration: {0}")]
    Config(String),
}

impl ExportError {
    /// Whether the error only affects a single row.
    pub fn is_row_local(&self) -> bool {
        matches!(
            self,
            Self::UnresolvableReference { .. } | Self::InvalidFieldValue { .. }
        )
    }

    /// HTTP status an embedding web layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::AuthorizationDenied { .. } | Self::CategoryNotEnabled { .. } => 403,
            _ => 500,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_value_to_text_joins_non_empty_list_items() {
        let value = EnumRawValue::List(vec![
            EnumRawValue::String("a".to_string()),
            EnumRawValue::String(String::new()),
            EnumRawValue::Integer(3),
        ]);
        assert_eq!(value.to_text().as_deref(), Some("a, 3"));
        assert!(EnumRawValue::List(vec![EnumRawValue::Null]).is_empty());
        assert!(!EnumRawValue::Boolean(false).is_empty());
    }

    #[test]
    fn test_descriptor_label_falls_back_to_name() {
        let descriptor = SpecFieldDescriptor::new("field_body", "text_long");
        assert_eq!(descriptor.display_label(), "field_body");
        assert_eq!(
            descriptor.clone().with_label("  ").display_label(),
            "field_body"
        );
        assert_eq!(descriptor.with_label("Body").display_label(), "Body");
    }

    #[test]
    fn test_document_format_from_name() {
        assert_eq!(
            EnumDocumentFormat::from_name("Xlsx"),
            Ok(EnumDocumentFormat::Xlsx)
        );
        assert_eq!(
            EnumDocumentFormat::from_name("Ods"),
            Err(ExportError::UnsupportedFormat("Ods".to_string()))
        );
    }

    #[test]
    fn test_export_error_http_status() {
        let err = ExportError::CategoryNotEnabled {
            category: "page".to_string(),
        };
        assert_eq!(err.http_status(), 403);
        assert!(!err.is_row_local());
        assert_eq!(ExportError::Serialization("x".to_string()).http_status(), 500);
    }
}
