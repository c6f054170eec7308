//! TFSA contribution-room calculator.
//!
//! Pure arithmetic over the historical CRA annual limits. The limits are
//! regulatory constants, not configuration.

use std::collections::BTreeMap;

use chrono::Datelike;
use thiserror::Error;

/// CRA annual TFSA dollar limits by calendar year, from program inception.
pub const TFSA_LIMITS: &[(i32, i64)] = &[
    (2009, 5000),
    (2010, 5000),
    (2011, 5000),
    (2012, 5000),
    (2013, 5500),
    (2014, 5500),
    (2015, 10000),
    (2016, 5500),
    (2017, 5500),
    (2018, 5500),
    (2019, 6000),
    (2020, 6000),
    (2021, 6000),
    (2022, 6000),
    (2023, 6500),
    (2024, 7000),
    (2025, 7000),
    (2026, 7000),
];

/// The simplifying assumptions attached to every calculation, verbatim.
pub const ASSUMPTIONS: [&str; 4] = [
    "Canadian resident for all eligible years",
    "No prior TFSA contributions",
    "No withdrawals",
    "CRA annual limits used",
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CalculationError {
    #[error("year_turned_18 cannot be in the future")]
    FutureYear,

    #[error("no TFSA limit is defined for {0}")]
    UnknownYear(i32),
}

/// Result of a contribution-room calculation. Computed fresh per request,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CalculationResult {
    pub total_contribution_room: i64,
    /// Ascending year → annual limit for every eligible year.
    pub yearly_breakdown: BTreeMap<i32, i64>,
    pub assumptions: Vec<String>,
}

fn limit_for(year: i32) -> Result<i64, CalculationError> {
    TFSA_LIMITS
        .iter()
        .find(|&&(y, _)| y == year)
        .map(|&(_, amount)| amount)
        .ok_or(CalculationError::UnknownYear(year))
}

/// Cumulative contribution room for someone who turned 18 in
/// `year_turned_18`, summed through the current calendar year inclusive.
pub fn calculate_contribution_room(
    year_turned_18: i32,
) -> Result<CalculationResult, CalculationError> {
    let current_year = chrono::Utc::now().year();

    if year_turned_18 > current_year {
        return Err(CalculationError::FutureYear);
    }

    let mut total = 0;
    let mut yearly_breakdown = BTreeMap::new();

    for year in year_turned_18..=current_year {
        let amount = limit_for(year)?;
        total += amount;
        yearly_breakdown.insert(year, amount);
    }

    Ok(CalculationResult {
        total_contribution_room: total,
        yearly_breakdown,
        assumptions: ASSUMPTIONS.iter().map(|s| s.to_string()).collect(),
    })
}
