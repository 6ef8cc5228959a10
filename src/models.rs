//! Data models for the benefit browser.
//!
//! This module contains the core data structures shared by the catalog
//! resolver, dataset loader, aggregator, and the transparency API client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name placeholder used in payroll files when the benefit holder is a minor
/// under 16 and the identity fields are suppressed.
///
/// This is the exact upstream literal; both known dataset variants are
/// normalized to this single representation.
pub const MINOR_HOLDER_SENTINEL: &str = "*** TITULAR MENOR DE 16 ANOS ***";

/// The benefit program a dataset or API query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenefitProgram {
    /// PBF - the family-allowance cash transfer (Bolsa Família).
    FamilyAllowance,
    /// BPC - the continuous cash benefit for elderly/disabled individuals.
    ContinuousPayment,
}

impl BenefitProgram {
    /// Portal da Transparência endpoint for the per-municipality summary.
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            BenefitProgram::FamilyAllowance => "/api-de-dados/novo-bolsa-familia-por-municipio",
            BenefitProgram::ContinuousPayment => "/api-de-dados/bpc-por-municipio",
        }
    }
}

impl fmt::Display for BenefitProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenefitProgram::FamilyAllowance => write!(f, "Bolsa Família"),
            BenefitProgram::ContinuousPayment => write!(f, "BPC"),
        }
    }
}

/// One municipality from the catalog. Immutable reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Municipality {
    /// Municipality name as listed in the catalog.
    pub name: String,
    /// Two-letter state code (UF).
    pub state_code: String,
    /// National IBGE identifier. The directory-tree catalog variant does not
    /// carry codes, so this is optional.
    pub ibge_code: Option<String>,
}

/// One normalized row of a payroll dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeneficiaryRecord {
    /// National identifier (NIS). Masked or absent for minor-holder rows.
    pub recipient_id: Option<String>,
    /// Holder name, or [`MINOR_HOLDER_SENTINEL`] when suppressed.
    pub recipient_name: String,
    /// Tax id (CPF). Only present in some dataset variants.
    pub national_tax_id: Option<String>,
    /// Monthly installment amount. Always a non-negative finite number after
    /// normalization; unparseable input is coerced to 0.0.
    pub installment_value: f64,
}

/// An ordered payroll dataset for exactly one municipality and one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    /// Municipality label (catalog name or IBGE code, per addressing scheme).
    pub municipality: String,
    /// Name of the column-map schema the source file matched.
    pub schema: &'static str,
    /// Normalized rows in source order.
    pub records: Vec<BeneficiaryRecord>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Derived statistics for one dataset. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateSummary {
    /// Total number of rows.
    pub total_count: usize,
    /// Rows with installment_value <= 599.
    pub below_threshold_count: usize,
    /// Rows with installment_value >= 600.
    pub at_or_above_threshold_count: usize,
    /// Rows whose name equals the minor-holder sentinel.
    pub minor_holder_count: usize,
    /// Sum of all installment values.
    pub total_value: f64,
}

impl AggregateSummary {
    /// Beneficiaries that are not suppressed minor-holder rows.
    pub fn other_holder_count(&self) -> usize {
        self.total_count - self.minor_holder_count
    }
}

/// A reference month token (YYYYMM on the wire, YYYY-MM for display).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceMonth {
    pub year: i32,
    /// 1-12.
    pub month: u32,
}

impl ReferenceMonth {
    /// Wire format used by the `mesAno` query parameter.
    pub fn compact(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }
}

impl fmt::Display for ReferenceMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Result of a remote per-municipality summary query. Ephemeral.
#[derive(Debug, Clone, Serialize)]
pub struct ExternalSummaryRecord {
    pub municipality_name: String,
    pub state_abbreviation: String,
    pub total_value: f64,
    pub beneficiary_count: u64,
    pub reference_month: ReferenceMonth,
}

impl ExternalSummaryRecord {
    /// Average installment per beneficiary; 0.0 when the count is zero.
    pub fn average_per_beneficiary(&self) -> f64 {
        if self.beneficiary_count == 0 {
            0.0
        } else {
            self.total_value / self.beneficiary_count as f64
        }
    }
}
