//! The table of tracked metadata fields.
//!
//! Aggregation, editing, and diffing are all driven by [`FIELDS`]. Adding or
//! removing a tracked field only requires touching this table.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MetadataError, Result};

/// Name of the keyword list field.
pub const KEYWORDS: &str = "Keywords";

/// The value shape of a tracked field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// A single string; aggregated as unique or mixed.
    Text,
    /// A keyword set; aggregated as a union with common/partial provenance.
    Keywords,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Keywords => write!(f, "keywords"),
        }
    }
}

/// Form section a field is edited in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldGroup {
    General,
    Location,
    Date,
}

/// Describes one tracked metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Tag name used by the backend, in both fetch and save payloads.
    pub name: &'static str,
    /// Dotted path of the field in the editing form.
    pub form_path: &'static str,
    pub group: FieldGroup,
    pub kind: FieldKind,
}

const fn text(name: &'static str, form_path: &'static str, group: FieldGroup) -> FieldDescriptor {
    FieldDescriptor {
        name,
        form_path,
        group,
        kind: FieldKind::Text,
    }
}

/// Every tracked field, in form order.
pub const FIELDS: &[FieldDescriptor] = &[
    text("Title", "general.title", FieldGroup::General),
    text("Description", "general.description", FieldGroup::General),
    text("Creator", "general.creator", FieldGroup::General),
    text("Copyright", "general.copyright", FieldGroup::General),
    FieldDescriptor {
        name: KEYWORDS,
        form_path: "general.keywords",
        group: FieldGroup::General,
        kind: FieldKind::Keywords,
    },
    text("Location", "location.sublocation", FieldGroup::Location),
    text("City", "location.city", FieldGroup::Location),
    text("State", "location.state", FieldGroup::Location),
    text("Country", "location.country", FieldGroup::Location),
    text("CountryCode", "location.countryCode", FieldGroup::Location),
    text("GPSLatitude", "location.latitude", FieldGroup::Location),
    text("GPSLongitude", "location.longitude", FieldGroup::Location),
    text("DateTimeOriginal", "date.dateTime", FieldGroup::Date),
    text("OffsetTimeOriginal", "date.offset", FieldGroup::Date),
];

/// Look up a field by its backend tag name.
///
/// An unknown name is a wiring bug, not a data problem.
pub fn descriptor(name: &str) -> Result<&'static FieldDescriptor> {
    FIELDS
        .iter()
        .find(|d| d.name == name)
        .ok_or_else(|| MetadataError::UnknownField(name.to_string()))
}

/// Look up a field by its form path.
pub fn descriptor_by_form_path(form_path: &str) -> Result<&'static FieldDescriptor> {
    FIELDS
        .iter()
        .find(|d| d.form_path == form_path)
        .ok_or_else(|| MetadataError::UnknownField(form_path.to_string()))
}

/// All fields belonging to one form group, in table order.
pub fn fields_in_group(group: FieldGroup) -> impl Iterator<Item = &'static FieldDescriptor> {
    FIELDS.iter().filter(move |d| d.group == group)
}
