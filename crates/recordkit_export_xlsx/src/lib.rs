//! `recordkit_export_xlsx` v1:
//! Single-record spreadsheet export kernel.
//!
//! Pipeline: record → `project` (via `format`) → rows → `document` →
//! `writer` → XLSX bytes. Modules:
//! - `conf`     : constants and default presets
//! - `spec`     : records/rows/document models, options, errors
//! - `util`     : pure helper functions
//! - `format`   : field formatters, registry and resolver traits
//! - `project`  : record projection
//! - `document` : two-column document layout
//! - `writer`   : XLSX serialization
//! - `report`   : per-export report model
//! - `settings` : export allow-list and file configuration
//! - `export`   : access gate and download response
pub mod conf;
pub mod document;
pub mod export;
pub mod format;
pub mod project;
pub mod report;
pub mod settings;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{C_ELLIPSIS_DEFAULT, EnumFmtKey, N_LEN_TITLE_MAX};
pub use document::build_document;
pub use export::{
    RecordExporter, SpecExportRequest, SpecExportResponse, derive_export_file_name,
    derive_export_headers,
};
pub use format::{
    EntityReferenceFormatter, FieldFormatter, FileResolver, FormatterRegistry, MapFileResolver,
    MapTermResolver, MediaFormatter, PlainTextFormatter, RichTextFormatter, SpecFormatContext,
    SuppressFormatter, TermResolver, TimestampFormatter,
};
pub use project::project_record;
pub use report::{ReportExport, ReportExportBuilder};
pub use settings::{SpecExportConfig, SpecExportSettings};
pub use spec::{
    EnumDocumentFormat, EnumFormatOutcome, EnumPageOrientation, EnumProjectedValue, EnumRawValue,
    EnumRowHeight, EnumRowKind, ExportError, SpecDocument, SpecDocumentOptions,
    SpecFieldDescriptor, SpecFieldSettings, SpecProjectedRow, SpecRecord, SpecRecordField,
};
pub use util::{cut_str, format_timestamp, sanitize_sheet_name};
pub use writer::{serialize_document, serialize_document_as};
