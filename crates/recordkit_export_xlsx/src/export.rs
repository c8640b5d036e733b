//! Export service: access gate, projection pipeline and download response.

use chrono::FixedOffset;
use tracing::{debug, info};

use crate::conf::{C_CONTENT_TYPE_XLSX, C_FILE_EXTENSION_XLSX};
use crate::document::build_document;
use crate::format::{FileResolver, FormatterRegistry, SpecFormatContext, TermResolver};
use crate::project::project_record;
use crate::report::{ReportExport, ReportExportBuilder};
use crate::settings::{SpecExportConfig, SpecExportSettings};
use crate::spec::{EnumDocumentFormat, ExportError, SpecDocumentOptions, SpecRecord};
use crate::writer::serialize_document;

/// One export call.
#[derive(Debug, Clone, Copy)]
pub struct SpecExportRequest<'a> {
    /// Record to export.
    pub record: &'a SpecRecord,
    /// Requesting user's display name, written as document author.
    pub user_display_name: &'a str,
    /// Whether the access-control layer granted the export permission.
    pub if_user_has_permission: bool,
}

/// Download response for a finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExportResponse {
    /// Attachment file name (`<category>-<id>.xlsx`).
    pub file_name: String,
    /// Response headers in emission order.
    pub headers: Vec<(String, String)>,
    /// Complete file content.
    pub body: Vec<u8>,
    /// Projection report.
    pub report: ReportExport,
}

impl SpecExportResponse {
    /// Value of header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(c_name, _)| c_name.eq_ignore_ascii_case(name))
            .map(|(_, c_value)| c_value.as_str())
    }
}

/// Record exporter holding the read-only state shared by all exports.
///
/// Every call builds and releases its own document, so one exporter can
/// serve concurrent requests.
pub struct RecordExporter {
    registry: FormatterRegistry,
    settings: SpecExportSettings,
    document_options: SpecDocumentOptions,
    utc_offset: FixedOffset,
    format: EnumDocumentFormat,
}

impl RecordExporter {
    /// Create an exporter with the built-in formatters.
    pub fn new(
        settings: SpecExportSettings,
        document_options: SpecDocumentOptions,
        utc_offset: FixedOffset,
    ) -> Self {
        Self {
            registry: FormatterRegistry::with_defaults(),
            settings,
            document_options,
            utc_offset,
            format: EnumDocumentFormat::Xlsx,
        }
    }

    /// Create an exporter from file configuration.
    pub fn from_config(config: &SpecExportConfig) -> Result<Self, ExportError> {
        config.validate()?;
        let mut exporter = Self::new(
            config.settings(),
            config.document_options(),
            config.utc_offset()?,
        );
        exporter.format = EnumDocumentFormat::from_name(&config.format)?;
        Ok(exporter)
    }

    /// Replace the formatter registry.
    pub fn with_registry(mut self, registry: FormatterRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Allow-list settings in use.
    pub fn settings(&self) -> &SpecExportSettings {
        &self.settings
    }

    /// Reject callers without permission and records of disabled categories.
    pub fn check_access(&self, request: &SpecExportRequest<'_>) -> Result<(), ExportError> {
        if !request.if_user_has_permission {
            return Err(ExportError::AuthorizationDenied {
                user: request.user_display_name.to_string(),
            });
        }
        if !self.settings.is_enabled(&request.record.category) {
            return Err(ExportError::CategoryNotEnabled {
                category: request.record.category.clone(),
            });
        }
        Ok(())
    }

    /// Export one record to a download response.
    ///
    /// Gate and serialization failures abort the export without a body;
    /// row-local formatting failures only drop the affected row.
    pub fn export(
        &self,
        request: &SpecExportRequest<'_>,
        files: &dyn FileResolver,
        terms: &dyn TermResolver,
    ) -> Result<SpecExportResponse, ExportError> {
        self.check_access(request)?;
        let record = request.record;

        let ctx = SpecFormatContext {
            files,
            terms,
            utc_offset: self.utc_offset,
        };
        let mut builder_report = ReportExportBuilder::default();
        let l_rows = project_record(record, &self.registry, &ctx, &mut builder_report);
        debug!(record_id = %record.id, n_rows = l_rows.len(), "record projected");

        let document = build_document(
            &record.title,
            request.user_display_name,
            &l_rows,
            &self.document_options,
        );
        let body = serialize_document(document, self.format)?;

        let report = builder_report.build();
        let file_name = derive_export_file_name(record);
        info!(
            record_id = %record.id,
            category = %record.category,
            file_name = %file_name,
            "{report}"
        );

        Ok(SpecExportResponse {
            headers: derive_export_headers(&file_name),
            file_name,
            body,
            report,
        })
    }
}

/// Attachment file name `<category>-<id>.xlsx`.
pub fn derive_export_file_name(record: &SpecRecord) -> String {
    format!(
        "{}-{}.{C_FILE_EXTENSION_XLSX}",
        derive_file_name_part(&record.category),
        derive_file_name_part(&record.id)
    )
}

/// Download headers for `file_name`.
pub fn derive_export_headers(file_name: &str) -> Vec<(String, String)> {
    vec![
        ("Pragma".to_string(), "no-cache".to_string()),
        ("Expires".to_string(), "0".to_string()),
        ("Content-Type".to_string(), C_CONTENT_TYPE_XLSX.to_string()),
        (
            "Content-Disposition".to_string(),
            format!("attachment; filename={file_name}"),
        ),
    ]
}

fn derive_file_name_part(text: &str) -> String {
    text.chars()
        .map(|chr| {
            if chr.is_alphanumeric() || chr == '_' || chr == '-' {
                chr
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{MapFileResolver, MapTermResolver};
    use crate::spec::{EnumRawValue, SpecFieldDescriptor};
    use crate::util::derive_utc_offset;

    fn create_exporter() -> RecordExporter {
        RecordExporter::new(
            SpecExportSettings::from_enabled(["article"]),
            SpecDocumentOptions::default(),
            derive_utc_offset(0).expect("offset"),
        )
    }

    fn create_record(category: &str) -> SpecRecord {
        SpecRecord::new("42", "Harbour survey", category).with_field(
            SpecFieldDescriptor::new("title", "string").with_label("Title"),
            EnumRawValue::String("Harbour survey".to_string()),
        )
    }

    #[test]
    fn test_export_builds_response_headers() {
        let exporter = create_exporter();
        let record = create_record("article");
        let request = SpecExportRequest {
            record: &record,
            user_display_name: "editor",
            if_user_has_permission: true,
        };

        let response = exporter
            .export(&request, &MapFileResolver::new(), &MapTermResolver::new())
            .expect("export");

        assert_eq!(response.file_name, "article-42.xlsx");
        assert_eq!(response.header("pragma"), Some("no-cache"));
        assert_eq!(response.header("Expires"), Some("0"));
        assert_eq!(
            response.header("Content-Type"),
            Some("application/vnd.ms-excel")
        );
        assert_eq!(
            response.header("Content-Disposition"),
            Some("attachment; filename=article-42.xlsx")
        );
        assert!(response.body.starts_with(b"PK"));
        assert_eq!(response.report.cnt_rows, 1);
    }

    #[test]
    fn test_export_rejects_disabled_category() {
        let exporter = create_exporter();
        let record = create_record("page");
        let request = SpecExportRequest {
            record: &record,
            user_display_name: "editor",
            if_user_has_permission: true,
        };
        assert_eq!(
            exporter.export(&request, &MapFileResolver::new(), &MapTermResolver::new()),
            Err(ExportError::CategoryNotEnabled {
                category: "page".to_string()
            })
        );
    }

    #[test]
    fn test_export_rejects_missing_permission() {
        let exporter = create_exporter();
        let record = create_record("article");
        let request = SpecExportRequest {
            record: &record,
            user_display_name: "guest",
            if_user_has_permission: false,
        };
        let err = exporter
            .export(&request, &MapFileResolver::new(), &MapTermResolver::new())
            .expect_err("denied");
        assert_eq!(
            err,
            ExportError::AuthorizationDenied {
                user: "guest".to_string()
            }
        );
        assert_eq!(err.http_status(), 403);
    }

    #[test]
    fn test_derive_export_file_name_replaces_separators() {
        let record = SpecRecord::new("7/8", "t", "news item");
        assert_eq!(derive_export_file_name(&record), "news_item-7_8.xlsx");
    }
}
