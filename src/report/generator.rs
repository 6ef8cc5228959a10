//! Plain-text report generation.
//!
//! The presentation layer receives every locale decision as an explicit
//! [`CurrencyFormat`] argument; nothing here mutates process-wide state.

use crate::models::{
    AggregateSummary, BenefitProgram, Dataset, ExternalSummaryRecord, Municipality,
};

/// How monetary values are rendered. Defaults to the Brazilian convention.
#[derive(Debug, Clone)]
pub struct CurrencyFormat {
    pub symbol: &'static str,
    pub decimal_separator: char,
    pub thousands_separator: char,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            symbol: "R$",
            decimal_separator: ',',
            thousands_separator: '.',
        }
    }
}

impl CurrencyFormat {
    /// Format a value with two decimal places and grouped thousands,
    /// e.g. `R$ 1.234,50`.
    pub fn format(&self, value: f64) -> String {
        let cents = (value * 100.0).round() as i64;
        let whole = (cents / 100).abs();
        let fraction = (cents % 100).abs();

        let digits = whole.to_string();
        let mut grouped = String::new();
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(self.thousands_separator);
            }
            grouped.push(ch);
        }

        let sign = if cents < 0 { "-" } else { "" };
        format!(
            "{} {}{}{}{:02}",
            self.symbol, sign, grouped, self.decimal_separator, fraction
        )
    }
}

/// Render the state listing.
pub fn render_states(states: &[String]) -> String {
    let mut lines = vec![format!("Available states: {}", states.len())];
    for state in states {
        lines.push(format!("  {}", state));
    }
    lines.join("\n")
}

/// Render the municipality listing for one state.
pub fn render_municipalities(state: &str, municipalities: &[Municipality]) -> String {
    let mut lines = vec![format!(
        "Municipalities in {}: {}",
        state,
        municipalities.len()
    )];
    for municipality in municipalities {
        match &municipality.ibge_code {
            Some(code) => lines.push(format!("  {} ({})", municipality.name, code)),
            None => lines.push(format!("  {}", municipality.name)),
        }
    }
    lines.join("\n")
}

/// Render the aggregate summary panel for one loaded dataset.
pub fn render_summary(
    dataset: &Dataset,
    summary: &AggregateSummary,
    currency: &CurrencyFormat,
) -> String {
    let mut lines = Vec::new();
    lines.push(format!("# Beneficiaries - {}", dataset.municipality));
    lines.push(String::new());
    lines.push(format!("Records found: {}", summary.total_count));
    lines.push(format!(
        "Total installments: {}",
        currency.format(summary.total_value)
    ));
    lines.push(String::new());
    lines.push("Installment distribution:".to_string());
    lines.push(format!(
        "  Below {}: {}",
        currency.format(600.0),
        summary.below_threshold_count
    ));
    lines.push(format!(
        "  At or above {}: {}",
        currency.format(600.0),
        summary.at_or_above_threshold_count
    ));
    lines.push(String::new());
    lines.push(format!(
        "Minor holders (under 16): {}",
        summary.minor_holder_count
    ));
    lines.push(format!(
        "Other beneficiaries: {}",
        summary.other_holder_count()
    ));
    lines.join("\n")
}

/// Render the external-API metric block for one program.
pub fn render_external(
    program: BenefitProgram,
    record: &ExternalSummaryRecord,
    currency: &CurrencyFormat,
) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "# {} - {} ({})",
        program, record.municipality_name, record.state_abbreviation
    ));
    lines.push(String::new());
    lines.push(format!("Beneficiaries: {}", record.beneficiary_count));
    lines.push(format!(
        "Total value: {}",
        currency.format(record.total_value)
    ));
    lines.push(format!(
        "Average per beneficiary: {}",
        currency.format(record.average_per_beneficiary())
    ));
    lines.push(format!("Reference: {}", record.reference_month));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReferenceMonth;

    #[test]
    fn test_currency_format_brazilian_default() {
        let currency = CurrencyFormat::default();
        assert_eq!(currency.format(0.0), "R$ 0,00");
        assert_eq!(currency.format(600.0), "R$ 600,00");
        assert_eq!(currency.format(1234.5), "R$ 1.234,50");
        assert_eq!(currency.format(1_234_567.89), "R$ 1.234.567,89");
    }

    #[test]
    fn test_currency_format_custom_separators() {
        let currency = CurrencyFormat {
            symbol: "$",
            decimal_separator: '.',
            thousands_separator: ',',
        };
        assert_eq!(currency.format(1234.5), "$ 1,234.50");
    }

    #[test]
    fn test_render_summary_contains_metrics() {
        let dataset = Dataset {
            municipality: "Fátima".to_string(),
            schema: "pbf-payroll",
            records: vec![],
        };
        let summary = AggregateSummary {
            total_count: 3,
            below_threshold_count: 2,
            at_or_above_threshold_count: 1,
            minor_holder_count: 1,
            total_value: 1799.0,
        };

        let text = render_summary(&dataset, &summary, &CurrencyFormat::default());
        assert!(text.contains("Records found: 3"));
        assert!(text.contains("R$ 1.799,00"));
        assert!(text.contains("Minor holders (under 16): 1"));
        assert!(text.contains("Other beneficiaries: 2"));
    }

    #[test]
    fn test_render_external_includes_reference_month() {
        let record = ExternalSummaryRecord {
            municipality_name: "Fátima".to_string(),
            state_abbreviation: "BA".to_string(),
            total_value: 150000.0,
            beneficiary_count: 250,
            reference_month: ReferenceMonth { year: 2025, month: 7 },
        };

        let text = render_external(
            BenefitProgram::FamilyAllowance,
            &record,
            &CurrencyFormat::default(),
        );
        assert!(text.contains("Bolsa Família - Fátima (BA)"));
        assert!(text.contains("Beneficiaries: 250"));
        assert!(text.contains("R$ 150.000,00"));
        assert!(text.contains("R$ 600,00")); // average
        assert!(text.contains("Reference: 2025-07"));
    }

    #[test]
    fn test_render_listings() {
        let states = vec!["BA".to_string(), "SP".to_string()];
        assert!(render_states(&states).contains("Available states: 2"));

        let municipalities = vec![Municipality {
            name: "Fátima".to_string(),
            state_code: "BA".to_string(),
            ibge_code: Some("2910750".to_string()),
        }];
        let text = render_municipalities("BA", &municipalities);
        assert!(text.contains("Fátima (2910750)"));
    }
}
