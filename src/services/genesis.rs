// src/services/genesis.rs
use chrono::NaiveDate;
use log::{info, warn};

use crate::models::{PriceMap, Provenance, UserBaseline};
use super::error::PipelineError;

/// Furthest a nearest-date match may sit from the requested date.
pub const MAX_GENESIS_DISTANCE_DAYS: i64 = 7;

/// Parse a `YYYY-MM-DD` input into a calendar date.
///
/// Only the field count makes input malformed. Three fields that do not
/// name a real date can never be resolved and report `BaselineNotFound`.
pub fn parse_genesis_input(input: &str) -> Result<NaiveDate, PipelineError> {
    let parts: Vec<&str> = input.trim().split('-').collect();
    if parts.len() != 3 {
        return Err(PipelineError::MalformedBaseline { input: input.to_string() });
    }

    let not_found = || PipelineError::BaselineNotFound { requested: input.trim().to_string() };
    let year = parts[0].trim().parse::<i32>().map_err(|_| not_found())?;
    let month = parts[1].trim().parse::<u32>().map_err(|_| not_found())?;
    let day = parts[2].trim().parse::<u32>().map_err(|_| not_found())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(not_found)
}

/// Exact price for `date`, else the closest record within the window.
/// Equidistant candidates resolve to the earlier date.
pub fn resolve_date(date: NaiveDate, prices: &PriceMap) -> Option<(NaiveDate, f64, Provenance)> {
    if let Some(&price) = prices.get(&date) {
        return Some((date, price, Provenance::ExactMatch));
    }

    let mut closest: Option<(i64, NaiveDate, f64)> = None;
    for (&candidate, &price) in prices {
        let distance = (candidate - date).num_days().abs();
        match closest {
            Some((best, _, _)) if distance >= best => {}
            _ => closest = Some((distance, candidate, price)),
        }
    }

    match closest {
        Some((distance, found, price)) if distance <= MAX_GENESIS_DISTANCE_DAYS => {
            Some((found, price, Provenance::NearestWithinWindow))
        }
        _ => None,
    }
}

/// Turn raw user input into a baseline, or explain why it can't be.
pub fn resolve_genesis(input: &str, prices: &PriceMap) -> Result<UserBaseline, PipelineError> {
    let date = parse_genesis_input(input)?;

    match resolve_date(date, prices) {
        Some((resolved_date, price, provenance)) => {
            info!(
                "Resolved genesis {} to {} @ {} ({:?})",
                date, resolved_date, price, provenance
            );
            Ok(UserBaseline {
                input: input.to_string(),
                date,
                resolved_date,
                price,
                provenance,
            })
        }
        None => {
            warn!("No price within {} days of {}", MAX_GENESIS_DISTANCE_DAYS, date);
            Err(PipelineError::BaselineNotFound { requested: date.to_string() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn prices() -> PriceMap {
        let mut prices = PriceMap::new();
        prices.insert(date(2015, 6, 1), 100.0);
        prices.insert(date(2015, 7, 1), 260.0);
        prices.insert(date(2015, 7, 7), 270.0);
        prices
    }

    #[test]
    fn exact_match_wins() {
        let baseline = resolve_genesis("2015-06-01", &prices()).unwrap();
        assert_eq!(baseline.price, 100.0);
        assert_eq!(baseline.provenance, Provenance::ExactMatch);
        assert_eq!(baseline.input, "2015-06-01");
    }

    #[test]
    fn nearest_within_window() {
        let baseline = resolve_genesis("2015-06-04", &prices()).unwrap();
        assert_eq!(baseline.price, 100.0);
        assert_eq!(baseline.date, date(2015, 6, 4));
        assert_eq!(baseline.resolved_date, date(2015, 6, 1));
        assert_eq!(baseline.provenance, Provenance::NearestWithinWindow);
    }

    #[test]
    fn seven_days_is_still_accepted() {
        let baseline = resolve_genesis("2015-05-25", &prices()).unwrap();
        assert_eq!(baseline.resolved_date, date(2015, 6, 1));
    }

    #[test]
    fn too_far_fails() {
        let err = resolve_genesis("2015-05-22", &prices()).unwrap_err();
        assert!(matches!(err, PipelineError::BaselineNotFound { .. }));
        let err = resolve_genesis("2015-06-11", &prices()).unwrap_err();
        assert!(matches!(err, PipelineError::BaselineNotFound { .. }));
    }

    #[test]
    fn equidistant_picks_earlier_date() {
        let baseline = resolve_genesis("2015-07-04", &prices()).unwrap();
        assert_eq!(baseline.resolved_date, date(2015, 7, 1));
        assert_eq!(baseline.price, 260.0);
    }

    #[test]
    fn empty_mapping_fails() {
        let err = resolve_genesis("2015-06-01", &PriceMap::new()).unwrap_err();
        assert!(matches!(err, PipelineError::BaselineNotFound { .. }));
    }

    #[test]
    fn malformed_inputs() {
        for input in ["2015/06/01", "2015-06", "2015-06-01-02", "not a date"] {
            let err = parse_genesis_input(input).unwrap_err();
            assert!(matches!(err, PipelineError::MalformedBaseline { .. }), "{}", input);
        }
        assert_eq!(parse_genesis_input("2015-6-1").unwrap(), date(2015, 6, 1));
    }

    #[test]
    fn three_fields_that_are_not_a_date_are_not_found() {
        for input in ["abcd-06-01", "2015-01-xx", "2015-02-30", "2015-13-01"] {
            let err = resolve_genesis(input, &prices()).unwrap_err();
            assert!(matches!(err, PipelineError::BaselineNotFound { .. }), "{}", input);
        }
    }
}
