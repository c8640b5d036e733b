//! Field formatters keyed by field type tag.
//!
//! Each formatter maps one raw field value to a display value or suppresses
//! the field. Lookups of referenced files and terms go through the resolver
//! traits so the engine never talks to a CMS directly.

use std::collections::BTreeMap;

use chrono::FixedOffset;

use crate::conf::C_TARGET_TYPE_TAXONOMY_TERM;
use crate::spec::{
    EnumFormatOutcome, EnumProjectedValue, EnumRawValue, EnumRowKind, ExportError,
    SpecFieldDescriptor, SpecRecordField,
};
use crate::util::{flatten_rich_text, format_timestamp, is_hyperlink_url, parse_reference_ids};

////////////////////////////////////////////////////////////////////////////////
// #region Resolvers

/// Resolves a media/file reference id to its public URL.
pub trait FileResolver: Send + Sync {
    /// Return the public URL of the file behind `file_id`.
    fn resolve_file_url(&self, file_id: &str) -> Result<String, String>;
}

/// Resolves a taxonomy term id to its display name.
pub trait TermResolver: Send + Sync {
    /// Return the display name of term `term_id`.
    fn resolve_term_name(&self, term_id: &str) -> Result<String, String>;
}

/// File resolver backed by an id → URL map.
#[derive(Debug, Clone, Default)]
pub struct MapFileResolver {
    dict_urls: BTreeMap<String, String>,
}

impl MapFileResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `url` for `file_id`.
    pub fn insert(&mut self, file_id: impl Into<String>, url: impl Into<String>) {
        self.dict_urls.insert(file_id.into(), url.into());
    }
}

impl From<BTreeMap<String, String>> for MapFileResolver {
    fn from(dict_urls: BTreeMap<String, String>) -> Self {
        Self { dict_urls }
    }
}

impl FileResolver for MapFileResolver {
    fn resolve_file_url(&self, file_id: &str) -> Result<String, String> {
        self.dict_urls
            .get(file_id)
            .cloned()
            .ok_or_else(|| format!("File not found: {file_id}"))
    }
}

/// Term resolver backed by an id → name map.
#[derive(Debug, Clone, Default)]
pub struct MapTermResolver {
    dict_names: BTreeMap<String, String>,
}

impl MapTermResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` for `term_id`.
    pub fn insert(&mut self, term_id: impl Into<String>, name: impl Into<String>) {
        self.dict_names.insert(term_id.into(), name.into());
    }
}

impl From<BTreeMap<String, String>> for MapTermResolver {
    fn from(dict_names: BTreeMap<String, String>) -> Self {
        Self { dict_names }
    }
}

impl TermResolver for MapTermResolver {
    fn resolve_term_name(&self, term_id: &str) -> Result<String, String> {
        self.dict_names
            .get(term_id)
            .cloned()
            .ok_or_else(|| format!("Term not found: {term_id}"))
    }
}

/// Collaborators and settings available to formatters during one export.
#[derive(Clone, Copy)]
pub struct SpecFormatContext<'a> {
    /// File URL lookup.
    pub files: &'a dyn FileResolver,
    /// Term name lookup.
    pub terms: &'a dyn TermResolver,
    /// Offset used to render timestamps.
    pub utc_offset: FixedOffset,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Formatters

/// Formats one field value.
pub trait FieldFormatter: Send + Sync {
    /// Format `value` of the field described by `descriptor`.
    ///
    /// Row-local failures are returned as errors; the projector decides what
    /// to do with them.
    fn format(
        &self,
        value: &EnumRawValue,
        descriptor: &SpecFieldDescriptor,
        ctx: &SpecFormatContext<'_>,
    ) -> Result<EnumFormatOutcome, ExportError>;
}

/// Always suppresses the field (boolean flags).
#[derive(Debug, Clone, Copy, Default)]
pub struct SuppressFormatter;

impl FieldFormatter for SuppressFormatter {
    fn format(
        &self,
        _value: &EnumRawValue,
        _descriptor: &SpecFieldDescriptor,
        _ctx: &SpecFormatContext<'_>,
    ) -> Result<EnumFormatOutcome, ExportError> {
        Ok(EnumFormatOutcome::Suppressed)
    }
}

/// Raw string, unmodified.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextFormatter;

impl FieldFormatter for PlainTextFormatter {
    fn format(
        &self,
        value: &EnumRawValue,
        _descriptor: &SpecFieldDescriptor,
        _ctx: &SpecFormatContext<'_>,
    ) -> Result<EnumFormatOutcome, ExportError> {
        Ok(match value.to_text() {
            Some(c_text) if !c_text.is_empty() => {
                EnumFormatOutcome::text(c_text, EnumRowKind::Plain)
            }
            _ => EnumFormatOutcome::Suppressed,
        })
    }
}

/// Unix seconds rendered as `"Month D, YYYY, H:MM am/pm"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampFormatter;

impl FieldFormatter for TimestampFormatter {
    fn format(
        &self,
        value: &EnumRawValue,
        descriptor: &SpecFieldDescriptor,
        ctx: &SpecFormatContext<'_>,
    ) -> Result<EnumFormatOutcome, ExportError> {
        let n_secs = match value {
            EnumRawValue::Null => return Ok(EnumFormatOutcome::Suppressed),
            EnumRawValue::String(s) if s.trim().is_empty() => {
                return Ok(EnumFormatOutcome::Suppressed);
            }
            EnumRawValue::Integer(n) => *n,
            EnumRawValue::String(s) => {
                s.trim()
                    .parse::<i64>()
                    .map_err(|_| ExportError::InvalidFieldValue {
                        field: descriptor.name.clone(),
                        message: format!("not a Unix timestamp: {s:?}"),
                    })?
            }
            EnumRawValue::List(items) => match items.first() {
                Some(first) => return self.format(first, descriptor, ctx),
                None => return Ok(EnumFormatOutcome::Suppressed),
            },
            other => {
                return Err(ExportError::InvalidFieldValue {
                    field: descriptor.name.clone(),
                    message: format!("not a Unix timestamp: {other:?}"),
                });
            }
        };

        let c_text = format_timestamp(n_secs, &ctx.utc_offset).ok_or_else(|| {
            ExportError::InvalidFieldValue {
                field: descriptor.name.clone(),
                message: format!("timestamp out of range: {n_secs}"),
            }
        })?;
        Ok(EnumFormatOutcome::text(c_text, EnumRowKind::Timestamp))
    }
}

/// HTML stripped and flattened to one line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RichTextFormatter;

impl FieldFormatter for RichTextFormatter {
    fn format(
        &self,
        value: &EnumRawValue,
        _descriptor: &SpecFieldDescriptor,
        _ctx: &SpecFormatContext<'_>,
    ) -> Result<EnumFormatOutcome, ExportError> {
        Ok(match value.to_text() {
            Some(c_text) if !c_text.is_empty() => {
                EnumFormatOutcome::text(flatten_rich_text(&c_text), EnumRowKind::RichText)
            }
            _ => EnumFormatOutcome::Suppressed,
        })
    }
}

/// First referenced file resolved to its original public URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaFormatter;

impl FieldFormatter for MediaFormatter {
    fn format(
        &self,
        value: &EnumRawValue,
        descriptor: &SpecFieldDescriptor,
        ctx: &SpecFormatContext<'_>,
    ) -> Result<EnumFormatOutcome, ExportError> {
        let Some(c_file_id) = derive_reference_ids(value).into_iter().next() else {
            return Ok(EnumFormatOutcome::Suppressed);
        };

        let c_url = ctx.files.resolve_file_url(&c_file_id).map_err(|message| {
            ExportError::UnresolvableReference {
                field: descriptor.name.clone(),
                id: c_file_id.clone(),
                message,
            }
        })?;
        if c_url.trim().is_empty() {
            return Ok(EnumFormatOutcome::Suppressed);
        }
        if !is_hyperlink_url(&c_url) {
            return Err(ExportError::UnresolvableReference {
                field: descriptor.name.clone(),
                id: c_file_id,
                message: format!("not an absolute URL: {c_url:?}"),
            });
        }

        Ok(EnumFormatOutcome::Value {
            value: EnumProjectedValue::Url(c_url),
            kind: EnumRowKind::Media,
        })
    }
}

/// Taxonomy term references resolved to names joined with `", "`.
///
/// References to any other target type are suppressed.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityReferenceFormatter;

impl FieldFormatter for EntityReferenceFormatter {
    fn format(
        &self,
        value: &EnumRawValue,
        descriptor: &SpecFieldDescriptor,
        ctx: &SpecFormatContext<'_>,
    ) -> Result<EnumFormatOutcome, ExportError> {
        if descriptor.settings.target_type.as_deref() != Some(C_TARGET_TYPE_TAXONOMY_TERM) {
            return Ok(EnumFormatOutcome::Suppressed);
        }

        let l_term_ids = derive_reference_ids(value);
        if l_term_ids.is_empty() {
            return Ok(EnumFormatOutcome::Suppressed);
        }

        let mut l_names = Vec::with_capacity(l_term_ids.len());
        for c_term_id in l_term_ids {
            let c_name = ctx.terms.resolve_term_name(&c_term_id).map_err(|message| {
                ExportError::UnresolvableReference {
                    field: descriptor.name.clone(),
                    id: c_term_id.clone(),
                    message,
                }
            })?;
            l_names.push(c_name);
        }

        Ok(EnumFormatOutcome::text(
            l_names.join(", "),
            EnumRowKind::ReferenceList,
        ))
    }
}

fn derive_reference_ids(value: &EnumRawValue) -> Vec<String> {
    match value {
        EnumRawValue::Integer(n) => vec![n.to_string()],
        EnumRawValue::String(s) => parse_reference_ids(s),
        EnumRawValue::List(items) => items.iter().flat_map(derive_reference_ids).collect(),
        EnumRawValue::Null | EnumRawValue::Boolean(_) | EnumRawValue::Float(_) => vec![],
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Registry

/// Type tag → formatter dispatch table.
pub struct FormatterRegistry {
    dict_formatters: BTreeMap<String, Box<dyn FieldFormatter>>,
}

impl FormatterRegistry {
    /// Create an empty registry; every field is suppressed.
    pub fn new() -> Self {
        Self {
            dict_formatters: BTreeMap::new(),
        }
    }

    /// Create a registry with the built-in formatters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("boolean", SuppressFormatter);
        for c_tag in [
            "string",
            "string_long",
            "email",
            "telephone",
            "list_string",
            "integer",
            "decimal",
            "float",
        ] {
            registry.register(c_tag, PlainTextFormatter);
        }
        for c_tag in ["created", "changed", "timestamp"] {
            registry.register(c_tag, TimestampFormatter);
        }
        for c_tag in ["text", "text_long", "text_with_summary"] {
            registry.register(c_tag, RichTextFormatter);
        }
        for c_tag in ["image", "file"] {
            registry.register(c_tag, MediaFormatter);
        }
        registry.register("entity_reference", EntityReferenceFormatter);
        registry
    }

    /// Register `formatter` for `type_tag`, returning the one it replaces.
    pub fn register(
        &mut self,
        type_tag: impl Into<String>,
        formatter: impl FieldFormatter + 'static,
    ) -> Option<Box<dyn FieldFormatter>> {
        self.dict_formatters
            .insert(type_tag.into(), Box::new(formatter))
    }

    /// Whether a formatter is registered for `type_tag`.
    pub fn contains(&self, type_tag: &str) -> bool {
        self.dict_formatters.contains_key(type_tag)
    }

    /// Registered type tags in sorted order.
    pub fn type_tags(&self) -> Vec<&str> {
        self.dict_formatters.keys().map(String::as_str).collect()
    }

    /// Format one record field; empty values and unknown type tags are
    /// suppressed.
    pub fn format_field(
        &self,
        field: &SpecRecordField,
        ctx: &SpecFormatContext<'_>,
    ) -> Result<EnumFormatOutcome, ExportError> {
        if field.value.is_empty() {
            return Ok(EnumFormatOutcome::Suppressed);
        }
        match self.dict_formatters.get(&field.descriptor.type_tag) {
            Some(formatter) => formatter.format(&field.value, &field.descriptor, ctx),
            None => Ok(EnumFormatOutcome::Suppressed),
        }
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
