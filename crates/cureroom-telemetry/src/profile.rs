use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::HistoryRow;

/// (base, amplitude, phase) for each default-layout column.
const TEMPERATURE_WAVES: [(f64, f64, f64); 4] =
    [(25.0, 5.0, 0.0), (27.0, 4.0, 1.0), (26.0, 4.5, 2.0), (28.0, 3.5, 3.0)];
const HUMIDITY_WAVES: [(f64, f64, f64); 2] = [(55.0, 10.0, 0.0), (50.0, 15.0, 2.0)];

/// Generates `hours` hourly rows ending at `now`, shaped for the default
/// six-sensor layout.
///
/// Temperatures follow a slow sine with up to 2 °C of noise, humidities a
/// slower cosine with up to 5 % of noise.
pub fn synthetic_profile(now: DateTime<Utc>, hours: u32, rng: &mut impl Rng) -> Vec<HistoryRow> {
    (0..hours)
        .map(|i| {
            let x = f64::from(i);
            let timestamp = now - Duration::hours(i64::from(hours - 1 - i));
            let mut values = Vec::with_capacity(TEMPERATURE_WAVES.len() + HUMIDITY_WAVES.len());
            for &(base, amp, phase) in &TEMPERATURE_WAVES {
                let v = base + (x / 3.0 + phase).sin() * amp + rng.random_range(0.0..2.0);
                values.push(Some(v));
            }
            for &(base, amp, phase) in &HUMIDITY_WAVES {
                let v = base + (x / 4.0 + phase).cos() * amp + rng.random_range(0.0..5.0);
                values.push(Some(v));
            }
            HistoryRow { timestamp, values }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_profile_shape() {
        let now = Utc::now();
        let rows = synthetic_profile(now, 24, &mut StdRng::seed_from_u64(3));

        assert_eq!(rows.len(), 24);
        assert_eq!(rows[23].timestamp, now);
        assert_eq!(rows[0].timestamp, now - Duration::hours(23));
        for row in &rows {
            assert_eq!(row.values.len(), 6);
            let t1 = row.values[0].unwrap();
            assert!((20.0..32.0).contains(&t1));
            let h2 = row.values[5].unwrap();
            assert!((35.0..70.0).contains(&h2));
        }
    }

    #[test]
    fn test_zero_hours_is_empty() {
        assert!(synthetic_profile(Utc::now(), 0, &mut rand::rng()).is_empty());
    }
}
