//! Aggregate statistics over a normalized dataset.
//!
//! Pure functions only: row order never changes the result, and the empty
//! dataset yields all-zero counts and sums.

use crate::models::{AggregateSummary, Dataset, MINOR_HOLDER_SENTINEL};

/// Upper bound of the "below" bucket in the installment chart.
pub const BELOW_THRESHOLD_MAX: f64 = 599.0;

/// Lower bound of the "at or above" bucket.
///
/// The two bounds are adjacent integers, not a single cut point: a value
/// strictly between 599 and 600 lands in neither bucket. This mirrors the
/// upstream dashboard exactly; changing it would change the chart output.
pub const AT_OR_ABOVE_THRESHOLD_MIN: f64 = 600.0;

/// Compute the display statistics for one dataset.
pub fn summarize(dataset: &Dataset) -> AggregateSummary {
    let mut summary = AggregateSummary {
        total_count: dataset.len(),
        ..AggregateSummary::default()
    };

    for record in &dataset.records {
        if record.installment_value <= BELOW_THRESHOLD_MAX {
            summary.below_threshold_count += 1;
        }
        if record.installment_value >= AT_OR_ABOVE_THRESHOLD_MIN {
            summary.at_or_above_threshold_count += 1;
        }
        if record.recipient_name == MINOR_HOLDER_SENTINEL {
            summary.minor_holder_count += 1;
        }
        summary.total_value += record.installment_value;
    }

    summary
}
