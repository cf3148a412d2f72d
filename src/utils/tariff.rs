use serde::Serialize;

const BASE_BOARDING_FARE: i64 = 1_500; // Base pickup cost (COP)
const RATE_PER_KM: f64 = 450.0;        // Rate per kilometre (COP)
const RATE_PER_MINUTE: f64 = 120.0;    // Rate per minute (COP)
const MINIMUM_FARE: i64 = 3_000;       // Never suggest less than a minimum viable fare
const ROUNDING_GRANULARITY: i64 = 100; // Round fares to the nearest hundred pesos
const DEFAULT_DEMAND_FACTOR: f64 = 1.0;
const MIN_DEMAND_FACTOR: f64 = 0.5;
const MAX_DEMAND_FACTOR: f64 = 2.0;

#[derive(Debug, Serialize)]
pub struct TariffRange {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Serialize)]
pub struct TariffBreakdown {
    pub base_boarding: i64,
    pub distance_component: i64,
    pub duration_component: i64,
    pub demand_factor: f64,
    pub minimum_fare: i64,
}

#[derive(Debug, Serialize)]
pub struct TariffSuggestion {
    pub suggested_tariff: i64,
    pub range: TariffRange,
    pub breakdown: TariffBreakdown,
}

fn round_to_granularity(value: f64) -> i64 {
    (value / ROUNDING_GRANULARITY as f64).round() as i64 * ROUNDING_GRANULARITY
}

fn clamp_demand_factor(value: Option<f64>) -> f64 {
    value
        .filter(|f| f.is_finite())
        .unwrap_or(DEFAULT_DEMAND_FACTOR)
        .clamp(MIN_DEMAND_FACTOR, MAX_DEMAND_FACTOR)
}

/// Suggest a per-seat fare from trip distance and duration, with a ±20%
/// acceptable range around the suggestion.
pub fn suggest_tariff(
    distance_km: f64,
    duration_minutes: f64,
    demand_factor: Option<f64>,
) -> TariffSuggestion {
    let km = distance_km.max(0.0);
    let minutes = duration_minutes.max(0.0);
    let factor = clamp_demand_factor(demand_factor);

    let distance_component = km * RATE_PER_KM;
    let duration_component = minutes * RATE_PER_MINUTE;
    let base_fare = BASE_BOARDING_FARE as f64 + distance_component + duration_component;
    let adjusted = (base_fare * factor).max(MINIMUM_FARE as f64);
    let suggested = round_to_granularity(adjusted);

    let variance = suggested as f64 * 0.2;
    let range_min = round_to_granularity(suggested as f64 - variance).max(MINIMUM_FARE);
    let range_max = round_to_granularity(suggested as f64 + variance);

    TariffSuggestion {
        suggested_tariff: suggested,
        range: TariffRange {
            min: range_min,
            max: range_max,
        },
        breakdown: TariffBreakdown {
            base_boarding: BASE_BOARDING_FARE,
            distance_component: distance_component.round() as i64,
            duration_component: duration_component.round() as i64,
            demand_factor: factor,
            minimum_fare: MINIMUM_FARE,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_trips_hit_the_minimum_fare() {
        let suggestion = suggest_tariff(0.5, 2.0, None);
        assert_eq!(suggestion.suggested_tariff, MINIMUM_FARE);
        assert_eq!(suggestion.range.min, MINIMUM_FARE);
    }

    #[test]
    fn fares_are_rounded_to_the_nearest_hundred() {
        let suggestion = suggest_tariff(10.0, 25.0, None);
        // 1500 + 4500 + 3000 = 9000, already round
        assert_eq!(suggestion.suggested_tariff, 9_000);
        assert_eq!(suggestion.suggested_tariff % ROUNDING_GRANULARITY, 0);
        assert_eq!(suggestion.range.min % ROUNDING_GRANULARITY, 0);
        assert_eq!(suggestion.range.max % ROUNDING_GRANULARITY, 0);
    }

    #[test]
    fn demand_factor_is_clamped() {
        let surge = suggest_tariff(10.0, 25.0, Some(10.0));
        assert_eq!(surge.breakdown.demand_factor, MAX_DEMAND_FACTOR);
        assert_eq!(surge.suggested_tariff, 18_000);

        let collapse = suggest_tariff(10.0, 25.0, Some(0.1));
        assert_eq!(collapse.breakdown.demand_factor, MIN_DEMAND_FACTOR);
    }

    #[test]
    fn range_spans_twenty_percent_around_the_suggestion() {
        let suggestion = suggest_tariff(10.0, 25.0, None);
        assert_eq!(suggestion.range.min, 7_200);
        assert_eq!(suggestion.range.max, 10_800);
    }
}
