//! Export allow-list settings and file configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::conf::{C_ELLIPSIS_DEFAULT, N_LEN_TITLE_MAX};
use crate::spec::{
    EnumDocumentFormat, EnumPageOrientation, EnumRowHeight, ExportError, SpecDocumentOptions,
};
use crate::util::derive_utc_offset;

////////////////////////////////////////////////////////////////////////////////
// #region ExportSettings

/// Category → enabled mapping consulted before every export.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecExportSettings {
    dict_enabled: BTreeMap<String, bool>,
}

impl SpecExportSettings {
    /// Settings with every listed category enabled.
    pub fn from_enabled<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dict_enabled: categories
                .into_iter()
                .map(|c_name| (c_name.into(), true))
                .collect(),
        }
    }

    /// Settings from submitted checkbox values.
    ///
    /// A checkbox submits its own key when ticked and `"0"` (or nothing)
    /// otherwise.
    pub fn from_form_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        Self {
            dict_enabled: values
                .into_iter()
                .map(|(c_key, c_value)| {
                    let c_value = c_value.as_ref().trim();
                    (c_key.into(), !c_value.is_empty() && c_value != "0")
                })
                .collect(),
        }
    }

    /// Enable or disable one category.
    pub fn set_enabled(&mut self, category: impl Into<String>, if_enabled: bool) {
        self.dict_enabled.insert(category.into(), if_enabled);
    }

    /// Whether `category` may be exported.
    pub fn is_enabled(&self, category: &str) -> bool {
        self.dict_enabled.get(category).copied().unwrap_or(false)
    }

    /// Enabled categories in sorted order.
    pub fn enabled_categories(&self) -> Vec<&str> {
        self.dict_enabled
            .iter()
            .filter(|(_, if_enabled)| **if_enabled)
            .map(|(c_name, _)| c_name.as_str())
            .collect()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportConfig

/// File configuration (TOML) for the exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecExportConfig {
    /// Categories enabled for export.
    pub content_types: Vec<String>,
    /// Page orientation.
    pub orientation: EnumPageOrientation,
    /// Write the record title above the data.
    pub if_title_row: bool,
    /// Character limit of document title and sheet name.
    pub title_limit: usize,
    /// Marker appended to truncated titles.
    pub ellipsis: String,
    /// Fixed data row height in points; automatic when absent.
    pub row_height: Option<f64>,
    /// Timestamp offset in minutes east of UTC.
    pub utc_offset_minutes: i32,
    /// Output writer name.
    pub format: String,
}

impl Default for SpecExportConfig {
    fn default() -> Self {
        Self {
            content_types: Vec::new(),
            orientation: EnumPageOrientation::Portrait,
            if_title_row: false,
            title_limit: N_LEN_TITLE_MAX,
            ellipsis: C_ELLIPSIS_DEFAULT.to_string(),
            row_height: None,
            utc_offset_minutes: 0,
            format: "Xlsx".to_string(),
        }
    }
}

impl SpecExportConfig {
    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ExportError> {
        let cfg: Self = toml::from_str(text).map_err(|err| ExportError::Config(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ExportError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| {
            ExportError::Config(format!("Failed to read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.title_limit == 0 {
            return Err(ExportError::Config("title_limit must be >= 1.".to_string()));
        }
        if let Some(n_height) = self.row_height
            && !(n_height > 0.0 && n_height <= 409.0)
        {
            return Err(ExportError::Config("row_height must be in (0, 409].".to_string()));
        }
        self.utc_offset()?;
        EnumDocumentFormat::from_name(&self.format)?;
        Ok(())
    }

    /// Allow-list settings.
    pub fn settings(&self) -> SpecExportSettings {
        SpecExportSettings::from_enabled(self.content_types.iter().cloned())
    }

    /// Document options derived from this config.
    pub fn document_options(&self) -> SpecDocumentOptions {
        SpecDocumentOptions {
            orientation: self.orientation,
            if_title_row: self.if_title_row,
            title_limit: self.title_limit,
            ellipsis: self.ellipsis.clone(),
            row_height: match self.row_height {
                Some(n_height) => EnumRowHeight::Fixed(n_height),
                None => EnumRowHeight::Auto,
            },
            ..SpecDocumentOptions::default()
        }
    }

    /// Timestamp offset.
    pub fn utc_offset(&self) -> Result<FixedOffset, ExportError> {
        derive_utc_offset(self.utc_offset_minutes).ok_or_else(|| {
            ExportError::Config(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            ))
        })
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
