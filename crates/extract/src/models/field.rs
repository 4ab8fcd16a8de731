use super::Record;

/// Scalar [`Record`] fields that may be populated directly from an XMP
/// attribute or simple element, keyed by the property's local name.
///
/// List-valued and language-alternative properties (title, subject, creator,
/// description, rights) have dedicated lookups and are deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    DateCreated,
    Country,
    State,
    City,
    OriginalFormat,
    Institution,
    Collection,
    Accession,
    Remarks,
    UniqueName,
    Restriction,
}
impl Field {
    pub const ALL: [Field; 11] = [
        Field::DateCreated,
        Field::Country,
        Field::State,
        Field::City,
        Field::OriginalFormat,
        Field::Institution,
        Field::Collection,
        Field::Accession,
        Field::Remarks,
        Field::UniqueName,
        Field::Restriction,
    ];

    /// XMP local name (namespace stripped) of the property.
    pub fn local_name(&self) -> &'static str {
        match self {
            Field::DateCreated => "DateCreated",
            Field::Country => "Country",
            Field::State => "State",
            Field::City => "City",
            Field::OriginalFormat => "CustomField1",
            Field::Institution => "CustomField17",
            Field::Collection => "CustomField18",
            Field::Accession => "IF22a_aksesjonsnummer",
            Field::Remarks => "IF4b_kommentar",
            Field::UniqueName => "UserDefined223",
            Field::Restriction => "UserDefined233",
        }
    }

    pub fn from_local_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.local_name() == name)
    }

    fn slot<'r>(&self, record: &'r mut Record) -> &'r mut String {
        match self {
            Field::DateCreated => &mut record.date_created,
            Field::Country => &mut record.country,
            Field::State => &mut record.region,
            Field::City => &mut record.city,
            Field::OriginalFormat => &mut record.original_format,
            Field::Institution => &mut record.institution,
            Field::Collection => &mut record.collection,
            Field::Accession => &mut record.accession,
            Field::Remarks => &mut record.remarks,
            Field::UniqueName => &mut record.unique_name,
            Field::Restriction => &mut record.restriction,
        }
    }

    /// Assigns `value` unless it is an empty placeholder. Returns whether the
    /// record was changed.
    pub fn assign(&self, record: &mut Record, value: &str) -> bool {
        if value.trim().is_empty() {
            return false;
        }
        *self.slot(record) = value.to_string();
        true
    }

    pub fn get<'r>(&self, record: &'r Record) -> &'r str {
        match self {
            Field::DateCreated => &record.date_created,
            Field::Country => &record.country,
            Field::State => &record.region,
            Field::City => &record.city,
            Field::OriginalFormat => &record.original_format,
            Field::Institution => &record.institution,
            Field::Collection => &record.collection,
            Field::Accession => &record.accession,
            Field::Remarks => &record.remarks,
            Field::UniqueName => &record.unique_name,
            Field::Restriction => &record.restriction,
        }
    }
}
