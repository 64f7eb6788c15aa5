use serde::Serialize;

pub const ID_FIELD: &str = "id";

/// How the `id` field participates in a record layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdMode {
    Absent,
    /// Present but may be left unset; must be an integer when given.
    Optional,
    /// Update mode: every record must carry an integer id.
    Required,
}

impl IdMode {
    pub fn new(update: bool, id_field: bool) -> Self {
        if update {
            IdMode::Required
        } else if id_field {
            IdMode::Optional
        } else {
            IdMode::Absent
        }
    }

    pub fn is_present(self) -> bool {
        self != IdMode::Absent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Id,
    Plain,
    SpatialPoint,
}

/// One flat field of an annotation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Flat name, e.g. `pt_position` for spatial point `pt`.
    pub name: String,
    /// Schema property the field maps back to.
    pub property: String,
    pub required: bool,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub(crate) fn id(required: bool) -> Self {
        Self {
            name: ID_FIELD.to_string(),
            property: ID_FIELD.to_string(),
            required,
            kind: FieldKind::Id,
        }
    }
}
