//! Field-level value generators used by the synthetic factory.
//!
//! Every generator draws from the caller's RNG so a seeded worker produces
//! the same field values on every run.

pub mod pools;

use rand::seq::IndexedRandom;
use rand::Rng;

/// Pick one entry from a non-empty pool.
pub fn pick<R: Rng>(rng: &mut R, pool: &[&'static str]) -> &'static str {
    pool.choose(rng).copied().unwrap_or_default()
}

/// Generate a random number with exactly N digits.
pub fn random_digits<R: Rng>(rng: &mut R, digits: usize) -> String {
    if digits == 0 {
        return String::new();
    }

    let mut result = String::with_capacity(digits);

    // First digit should be 1-9 to avoid leading zeros
    result.push(char::from(b'0' + rng.random_range(1..10u8)));

    for _ in 1..digits {
        result.push(char::from(b'0' + rng.random_range(0..10u8)));
    }

    result
}

/// Generate a street line such as `742 Maple Avenue`.
pub fn street_address<R: Rng>(rng: &mut R) -> String {
    let number = rng.random_range(1..10_000u32);
    format!(
        "{number} {} {}",
        pick(rng, pools::STREET_NAMES),
        pick(rng, pools::STREET_SUFFIXES)
    )
}

/// Build an email address that is unique for a given row ordinal.
///
/// Uniqueness comes from the ordinal, which no two workers share.
pub fn unique_email(first_name: &str, last_name: &str, ordinal: u64, domain: &str) -> String {
    format!(
        "{}.{}.{ordinal}@{domain}",
        first_name.to_lowercase(),
        last_name.to_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_digits() {
        let mut rng = StdRng::seed_from_u64(42);
        for len in [1, 5, 9] {
            let value = random_digits(&mut rng, len);
            assert_eq!(value.len(), len);
            assert!(value.chars().all(|c| c.is_ascii_digit()));
            assert!(!value.starts_with('0'));
        }
        assert_eq!(random_digits(&mut rng, 0), "");
    }

    #[test]
    fn test_street_address_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let street = street_address(&mut rng);
        let number = street.split(' ').next().unwrap();
        assert!(number.parse::<u32>().is_ok());
        assert!(street.split(' ').count() >= 3);
    }

    #[test]
    fn test_unique_email() {
        assert_eq!(
            unique_email("Ada", "Lovelace", 12, "example.com"),
            "ada.lovelace.12@example.com"
        );
    }

    #[test]
    fn test_pick_is_deterministic() {
        let mut rng1 = StdRng::seed_from_u64(1);
        let mut rng2 = StdRng::seed_from_u64(1);
        assert_eq!(
            pick(&mut rng1, pools::FIRST_NAMES),
            pick(&mut rng2, pools::FIRST_NAMES)
        );
    }
}
