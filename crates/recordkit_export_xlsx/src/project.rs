//! Record → ordered display rows.

use tracing::{debug, warn};

use crate::format::{FormatterRegistry, SpecFormatContext};
use crate::report::ReportExportBuilder;
use crate::spec::{EnumFormatOutcome, SpecProjectedRow, SpecRecord};

/// Project `record` into one row per non-suppressed field, in schema order.
///
/// Fields whose formatting fails with a row-local error (unresolvable
/// reference, malformed value) are skipped, logged and recorded in `report`;
/// the remaining fields are still projected.
pub fn project_record(
    record: &SpecRecord,
    registry: &FormatterRegistry,
    ctx: &SpecFormatContext<'_>,
    report: &mut ReportExportBuilder,
) -> Vec<SpecProjectedRow> {
    let mut l_rows = Vec::with_capacity(record.fields.len());

    for field in &record.fields {
        report.add_field();
        let descriptor = &field.descriptor;

        match registry.format_field(field, ctx) {
            Ok(EnumFormatOutcome::Value { value, kind }) => {
                report.add_row();
                l_rows.push(SpecProjectedRow {
                    label: descriptor.display_label().to_string(),
                    value,
                    kind,
                });
            }
            Ok(EnumFormatOutcome::Suppressed) => {
                report.add_suppressed();
                debug!(
                    field = %descriptor.name,
                    type_tag = %descriptor.type_tag,
                    "field suppressed"
                );
            }
            Err(err) => {
                warn!(
                    record_id = %record.id,
                    field = %descriptor.name,
                    error = %err,
                    "skipping field that could not be formatted"
                );
                report.add_failed(format!("{}: {err}", descriptor.name));
            }
        }
    }

    l_rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{MapFileResolver, MapTermResolver};
    use crate::spec::{EnumProjectedValue, EnumRawValue, EnumRowKind, SpecFieldDescriptor};
    use crate::util::derive_utc_offset;

    fn create_record() -> SpecRecord {
        SpecRecord::new("42", "Field trip", "article")
            .with_field(
                SpecFieldDescriptor::new("title", "string").with_label("Title"),
                EnumRawValue::String("Field trip".to_string()),
            )
            .with_field(
                SpecFieldDescriptor::new("status", "boolean"),
                EnumRawValue::Boolean(true),
            )
            .with_field(
                SpecFieldDescriptor::new("field_tags", "entity_reference")
                    .with_label("Tags")
                    .with_target_type("taxonomy_term"),
                EnumRawValue::String("4, 5".to_string()),
            )
            .with_field(
                SpecFieldDescriptor::new("field_location", "geofield"),
                EnumRawValue::String("POINT (1 2)".to_string()),
            )
            .with_field(
                SpecFieldDescriptor::new("created", "created").with_label("Authored on"),
                EnumRawValue::Integer(1_609_837_500),
            )
            .with_field(
                SpecFieldDescriptor::new("field_summary", "text_long"),
                EnumRawValue::String("<p>Short</p>".to_string()),
            )
    }

    #[test]
    fn test_project_record_keeps_order_and_skips_failures() {
        let files = MapFileResolver::new();
        let mut terms = MapTermResolver::new();
        terms.insert("4", "Alpha");
        let ctx = SpecFormatContext {
            files: &files,
            terms: &terms,
            utc_offset: derive_utc_offset(0).expect("offset"),
        };
        let registry = FormatterRegistry::with_defaults();
        let mut builder = ReportExportBuilder::default();

        let record = create_record();
        let l_rows = project_record(&record, &registry, &ctx, &mut builder);
        let report = builder.build();

        assert_eq!(
            l_rows,
            vec![
                SpecProjectedRow {
                    label: "Title".to_string(),
                    value: EnumProjectedValue::Text("Field trip".to_string()),
                    kind: EnumRowKind::Plain,
                },
                SpecProjectedRow {
                    label: "Authored on".to_string(),
                    value: EnumProjectedValue::Text("January 5, 2021, 9:05 am".to_string()),
                    kind: EnumRowKind::Timestamp,
                },
                SpecProjectedRow {
                    label: "field_summary".to_string(),
                    value: EnumProjectedValue::Text("Short".to_string()),
                    kind: EnumRowKind::RichText,
                },
            ]
        );
        assert!(l_rows.len() <= record.fields.len());
        assert_eq!(report.cnt_fields, 6);
        assert_eq!(report.cnt_rows, 3);
        assert_eq!(report.cnt_suppressed, 2);
        assert_eq!(report.cnt_failed, 1);
        assert!(report.warnings[0].starts_with("field_tags: "));
    }

    #[test]
    fn test_project_record_skips_media_with_relative_url() {
        let mut files = MapFileResolver::new();
        files.insert("31", "/sites/default/files/cover.png");
        let terms = MapTermResolver::new();
        let ctx = SpecFormatContext {
            files: &files,
            terms: &terms,
            utc_offset: derive_utc_offset(0).expect("offset"),
        };
        let record = SpecRecord::new("42", "Field trip", "article")
            .with_field(
                SpecFieldDescriptor::new("title", "string").with_label("Title"),
                EnumRawValue::String("Field trip".to_string()),
            )
            .with_field(
                SpecFieldDescriptor::new("field_image", "image").with_label("Image"),
                EnumRawValue::Integer(31),
            );
        let registry = FormatterRegistry::with_defaults();
        let mut builder = ReportExportBuilder::default();

        let l_rows = project_record(&record, &registry, &ctx, &mut builder);

        assert_eq!(
            l_rows,
            vec![SpecProjectedRow {
                label: "Title".to_string(),
                value: EnumProjectedValue::Text("Field trip".to_string()),
                kind: EnumRowKind::Plain,
            }]
        );
        let report = builder.build();
        assert_eq!(report.cnt_failed, 1);
        assert!(report.warnings[0].starts_with("field_image: "));
    }

    #[test]
    fn test_project_record_unknown_types_yield_no_rows() {
        let files = MapFileResolver::new();
        let terms = MapTermResolver::new();
        let ctx = SpecFormatContext {
            files: &files,
            terms: &terms,
            utc_offset: derive_utc_offset(0).expect("offset"),
        };
        let registry = FormatterRegistry::with_defaults();

        for c_tag in ["geofield", "link", "daterange", "comment", ""] {
            let record = SpecRecord::new("1", "t", "page").with_field(
                SpecFieldDescriptor::new("field_x", c_tag),
                EnumRawValue::String("value".to_string()),
            );
            let mut builder = ReportExportBuilder::default();
            assert!(project_record(&record, &registry, &ctx, &mut builder).is_empty());
            assert_eq!(builder.build().cnt_suppressed, 1);
        }
    }
}
