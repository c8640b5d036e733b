//! Export report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

/// Aggregate counters and diagnostics for one export.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportExport {
    /// Number of fields visited.
    pub cnt_fields: u64,
    /// Number of rows written.
    pub cnt_rows: u64,
    /// Number of fields suppressed by their formatter or type.
    pub cnt_suppressed: u64,
    /// Number of rows skipped because formatting failed.
    pub cnt_failed: u64,
    /// Non-fatal warnings collected during projection.
    pub warnings: Vec<String>,
}

impl ReportExport {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_fields".to_string(), self.cnt_fields);
        dict_counts.insert("cnt_rows".to_string(), self.cnt_rows);
        dict_counts.insert("cnt_suppressed".to_string(), self.cnt_suppressed);
        dict_counts.insert("cnt_failed".to_string(), self.cnt_failed);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} fields={} rows={} suppressed={} failed={} warnings={}",
            self.cnt_fields,
            self.cnt_rows,
            self.cnt_suppressed,
            self.cnt_failed,
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[EXPORT]"))
    }
}

/// Mutable accumulator for export statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportExportBuilder {
    /// See [`ReportExport::cnt_fields`].
    pub cnt_fields: u64,
    /// See [`ReportExport::cnt_rows`].
    pub cnt_rows: u64,
    /// See [`ReportExport::cnt_suppressed`].
    pub cnt_suppressed: u64,
    /// See [`ReportExport::cnt_failed`].
    pub cnt_failed: u64,
    /// See [`ReportExport::warnings`].
    pub warnings: Vec<String>,
}

impl ReportExportBuilder {
    /// Increment visited field count by one.
    pub fn add_field(&mut self) {
        self.cnt_fields += 1;
    }

    /// Increment row count by one.
    pub fn add_row(&mut self) {
        self.cnt_rows += 1;
    }

    /// Increment suppressed count by one.
    pub fn add_suppressed(&mut self) {
        self.cnt_suppressed += 1;
    }

    /// Record one skipped row with its warning text.
    pub fn add_failed(&mut self, warning: String) {
        self.cnt_failed += 1;
        self.warnings.push(warning);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportExport {
        ReportExport {
            cnt_fields: self.cnt_fields,
            cnt_rows: self.cnt_rows,
            cnt_suppressed: self.cnt_suppressed,
            cnt_failed: self.cnt_failed,
            warnings: self.warnings,
        }
    }
}
