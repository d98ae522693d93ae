//! Unit conversions for store results, which arrive in meters.

pub const METERS_PER_MILE: f64 = 1609.34;

pub fn meters_to_miles(meters: f64) -> f64 {
    meters / METERS_PER_MILE
}

pub fn square_meters_to_square_miles(square_meters: f64) -> f64 {
    square_meters / (METERS_PER_MILE * METERS_PER_MILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_mile() {
        assert!((meters_to_miles(1609.34) - 1.0).abs() < 1e-12);
        assert_eq!(meters_to_miles(0.0), 0.0);
    }

    #[test]
    fn test_one_square_mile() {
        let square_mile = 1609.34 * 1609.34;
        assert!((square_meters_to_square_miles(square_mile) - 1.0).abs() < 1e-12);
    }
}
