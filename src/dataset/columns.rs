//! Column-rename tables for known payroll schema variants.
//!
//! Source files label the same data differently between exports. Each known
//! variant gets one [`ColumnMap`] from original label to canonical field, and
//! the loader picks the map that matches a file's header row. Adding a new
//! export variant means adding a map here; callers never change.

/// Canonical field a source column maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalField {
    /// National identifier (NIS).
    RecipientId,
    /// Benefit holder name.
    RecipientName,
    /// Tax id (CPF). Optional in every schema.
    NationalTaxId,
    /// Monthly installment amount.
    InstallmentValue,
}

/// One versioned mapping from source labels to canonical fields.
#[derive(Debug)]
pub struct ColumnMap {
    /// Stable schema name, recorded on loaded datasets.
    pub name: &'static str,
    pub entries: &'static [(&'static str, CanonicalField)],
}

impl ColumnMap {
    /// Canonical field for a source label, matched case-insensitively with
    /// surrounding whitespace ignored.
    pub fn field_for(&self, label: &str) -> Option<CanonicalField> {
        let label = label.trim();
        self.entries
            .iter()
            .find(|(source, _)| source.eq_ignore_ascii_case(label))
            .map(|(_, field)| *field)
    }

    /// Whether the headers carry the minimum required columns: a holder
    /// identity (name) and an installment value.
    pub fn covers_required(&self, headers: &[&str]) -> bool {
        let mut has_name = false;
        let mut has_value = false;
        for header in headers {
            match self.field_for(header) {
                Some(CanonicalField::RecipientName) => has_name = true,
                Some(CanonicalField::InstallmentValue) => has_value = true,
                _ => {}
            }
        }
        has_name && has_value
    }

    fn matched_count(&self, headers: &[&str]) -> usize {
        headers
            .iter()
            .filter(|header| self.field_for(header).is_some())
            .count()
    }
}

/// PBF payroll export: upper-case labels, NIS masked for minors.
pub const PBF_PAYROLL: ColumnMap = ColumnMap {
    name: "pbf-payroll",
    entries: &[
        ("NIS FAVORECIDO", CanonicalField::RecipientId),
        ("NOME FAVORECIDO", CanonicalField::RecipientName),
        ("CPF FAVORECIDO", CanonicalField::NationalTaxId),
        ("VALOR PARCELA", CanonicalField::InstallmentValue),
    ],
};

/// BPC payroll export: lower-case labels, carries a CPF column.
pub const BPC_PAYROLL: ColumnMap = ColumnMap {
    name: "bpc-payroll",
    entries: &[
        ("nis", CanonicalField::RecipientId),
        ("nome", CanonicalField::RecipientName),
        ("cpf", CanonicalField::NationalTaxId),
        ("valor", CanonicalField::InstallmentValue),
    ],
};

/// All schema variants the loader knows about.
pub const KNOWN_SCHEMAS: &[&ColumnMap] = &[&PBF_PAYROLL, &BPC_PAYROLL];

/// Pick the schema whose labels best match the header row.
///
/// A map is only eligible when the required columns are covered; among
/// eligible maps the one matching the most labels wins.
pub fn detect_schema(headers: &[&str]) -> Option<&'static ColumnMap> {
    KNOWN_SCHEMAS
        .iter()
        .filter(|map| map.covers_required(headers))
        .max_by_key(|map| map.matched_count(headers))
        .copied()
}
