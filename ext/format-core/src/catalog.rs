//! Logical type catalogs: immutable per-format lookup tables.
//!
//! Each format adapter defines one `static` [`LogicalTypeCatalog`]. Entry ids
//! are dense and zero based so that an id doubles as the index into the
//! table; ids are persisted in marshalled format fields and must not change.

use crate::{CanonicalType, FieldDescriptor, FormatError, FormatFieldList, Result};

/// Classification of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// A bare physical type with no annotation
    Primitive,
    /// A physical type refined by a logical annotation
    Logical,
    /// A nested container; never a row field
    Complex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalTypeEntry {
    pub id: usize,
    pub name: &'static str,
    pub physical: &'static str,
    pub annotation: Option<&'static str>,
    pub kind: TypeKind,
    pub displayable: bool,
    pub canonical: CanonicalType,
    pub default_precision: Option<u32>,
    pub default_scale: Option<i32>,
    pub default_length: Option<u32>,
}

impl LogicalTypeEntry {
    pub const fn primitive(
        id: usize,
        name: &'static str,
        physical: &'static str,
        canonical: CanonicalType,
    ) -> Self {
        Self {
            id,
            name,
            physical,
            annotation: None,
            kind: TypeKind::Primitive,
            displayable: true,
            canonical,
            default_precision: None,
            default_scale: None,
            default_length: None,
        }
    }

    pub const fn logical(
        id: usize,
        name: &'static str,
        physical: &'static str,
        annotation: &'static str,
        canonical: CanonicalType,
    ) -> Self {
        let mut entry = Self::primitive(id, name, physical, canonical);
        entry.annotation = Some(annotation);
        entry.kind = TypeKind::Logical;
        entry
    }

    pub const fn complex(id: usize, name: &'static str, physical: &'static str) -> Self {
        let mut entry = Self::primitive(id, name, physical, CanonicalType::None);
        entry.kind = TypeKind::Complex;
        entry.displayable = false;
        entry
    }

    pub const fn hidden(mut self) -> Self {
        self.displayable = false;
        self
    }

    pub const fn with_decimal(mut self, precision: u32, scale: i32) -> Self {
        self.default_precision = Some(precision);
        self.default_scale = Some(scale);
        self
    }

    pub const fn with_length(mut self, length: u32) -> Self {
        self.default_length = Some(length);
        self
    }

    pub fn is_primitive(&self) -> bool {
        self.kind == TypeKind::Primitive
    }

    pub fn is_logical(&self) -> bool {
        self.kind == TypeKind::Logical
    }

    pub fn is_complex(&self) -> bool {
        self.kind == TypeKind::Complex
    }

    /// Entries whose values are decimals carried with precision and scale
    pub fn is_decimal(&self) -> bool {
        self.canonical == CanonicalType::BigNumber
    }
}

/// A closed table of logical types for one format
#[derive(Debug)]
pub struct LogicalTypeCatalog {
    format: &'static str,
    entries: &'static [LogicalTypeEntry],
    defaults: &'static [(CanonicalType, usize)],
}

impl LogicalTypeCatalog {
    pub const fn new(
        format: &'static str,
        entries: &'static [LogicalTypeEntry],
        defaults: &'static [(CanonicalType, usize)],
    ) -> Self {
        Self {
            format,
            entries,
            defaults,
        }
    }

    pub fn format(&self) -> &'static str {
        self.format
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &'static [LogicalTypeEntry] {
        self.entries
    }

    pub fn entry_of(&self, id: usize) -> Result<&'static LogicalTypeEntry> {
        self.entries.get(id).ok_or(FormatError::UnknownTypeId {
            catalog: self.format,
            id,
        })
    }

    pub fn id_of(&self, name: &str) -> Result<usize> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.id)
            .ok_or_else(|| FormatError::UnknownTypeName {
                catalog: self.format,
                name: name.to_string(),
            })
    }

    pub fn canonical_type_of(&self, id: usize) -> Result<CanonicalType> {
        Ok(self.entry_of(id)?.canonical)
    }

    /// The entry a schema converter emits for a canonical type when no
    /// explicit format type was requested.
    pub fn default_for(&self, canonical: CanonicalType) -> Result<&'static LogicalTypeEntry> {
        let id = self
            .defaults
            .iter()
            .find(|(ty, _)| *ty == canonical)
            .map(|(_, id)| *id)
            .ok_or_else(|| {
                FormatError::UnsupportedCanonicalType(format!(
                    "{} has no {} representation",
                    canonical, self.format
                ))
            })?;
        self.entry_of(id)
    }

    /// Names of displayable entries, sorted lexicographically
    pub fn displayable_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .entries
            .iter()
            .filter(|entry| entry.displayable)
            .map(|entry| entry.name)
            .collect();
        names.sort_unstable();
        names
    }

    /// Pick the entry for a schema field and its decimal precision/scale.
    ///
    /// A format field with the same native name wins over the default
    /// mapping; its precision and scale win over the entry defaults.
    pub fn resolve_field(
        &self,
        overrides: &FormatFieldList,
        field: &FieldDescriptor,
    ) -> Result<(&'static LogicalTypeEntry, u32, i32)> {
        if !field.canonical_type.is_convertible() {
            return Err(FormatError::UnsupportedCanonicalType(format!(
                "{} for field '{}'",
                field.canonical_type,
                field.native_name()
            )));
        }

        let pinned = overrides.find(field.native_name());
        let entry = match pinned {
            Some(format_field) => {
                let entry = self.entry_of(format_field.format_type_id)?;
                if entry.canonical != field.canonical_type {
                    return Err(FormatError::UnsupportedCanonicalType(format!(
                        "{} cannot be stored as {} {} for field '{}'",
                        field.canonical_type,
                        self.format,
                        entry.name,
                        field.native_name()
                    )));
                }
                entry
            }
            None => self.default_for(field.canonical_type)?,
        };

        let precision = pinned
            .and_then(|f| f.precision)
            .or(entry.default_precision)
            .unwrap_or(0);
        let scale = pinned
            .and_then(|f| f.scale)
            .or(entry.default_scale)
            .unwrap_or(0);
        Ok((entry, precision, scale))
    }

    /// Find the entry for a physical type and optional annotation pair
    pub fn find_native(
        &self,
        physical: &str,
        annotation: Option<&str>,
    ) -> Option<&'static LogicalTypeEntry> {
        self.entries
            .iter()
            .find(|entry| entry.physical == physical && entry.annotation == annotation)
    }
}

/// Assert the structural invariants every catalog must hold
#[cfg(test)]
pub(crate) fn assert_catalog_invariants(catalog: &LogicalTypeCatalog) {
    for (index, entry) in catalog.entries().iter().enumerate() {
        assert_eq!(entry.id, index, "{} ids must be dense", entry.name);
        assert_eq!(catalog.entry_of(index).unwrap(), entry);
        assert_eq!(catalog.id_of(entry.name).unwrap(), index);
        assert_eq!(catalog.canonical_type_of(index).unwrap(), entry.canonical);
        if entry.is_complex() {
            assert_eq!(entry.canonical, CanonicalType::None);
        }
    }
    assert!(matches!(
        catalog.entry_of(catalog.len()),
        Err(FormatError::UnknownTypeId { .. })
    ));
    for canonical in [
        CanonicalType::Number,
        CanonicalType::String,
        CanonicalType::Date,
        CanonicalType::Boolean,
        CanonicalType::Integer,
        CanonicalType::BigNumber,
        CanonicalType::Binary,
        CanonicalType::Timestamp,
    ] {
        assert_eq!(catalog.default_for(canonical).unwrap().canonical, canonical);
    }
    let names = catalog.displayable_names();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}
