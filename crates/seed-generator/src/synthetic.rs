//! Synthetic user/address factory.

use crate::error::RecordError;
use crate::generators::{self, pools};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use seed_core::{AddressRecord, Partition, SeedRecord, UserRecord, DEFAULT_PASSWORD_HASH};
use uuid::Uuid;

/// Factory that produces schema-valid random users and addresses.
///
/// Field values come from a seeded [`StdRng`] so a worker can be replayed.
/// Ids never come from that RNG: they are UUID v4 drawn from the operating
/// system, so two workers (or two runs reusing a seed) cannot collide.
pub struct SyntheticGenerator {
    /// Seeded random number generator for field values
    rng: StdRng,
    /// Timestamp written to `created_at` / `updated_at`
    clock: DateTime<Utc>,
    password_hash: String,
}

impl SyntheticGenerator {
    /// Create a generator, seeded when `seed` is given, from OS entropy
    /// otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng,
            clock: Utc::now(),
            password_hash: DEFAULT_PASSWORD_HASH.to_string(),
        }
    }

    /// Set the timestamp used for every generated row.
    pub fn with_clock(mut self, clock: DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the stored password hash.
    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = hash.into();
        self
    }

    /// Generate the pair for global ordinal `ordinal`.
    pub fn generate(&mut self, ordinal: u64) -> SeedRecord {
        let first_name = generators::pick(&mut self.rng, pools::FIRST_NAMES);
        let last_name = generators::pick(&mut self.rng, pools::LAST_NAMES);
        let domain = generators::pick(&mut self.rng, pools::EMAIL_DOMAINS);

        let user = UserRecord {
            id: Uuid::new_v4(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: generators::unique_email(first_name, last_name, ordinal, domain),
            password: self.password_hash.clone(),
            created_at: self.clock,
            updated_at: self.clock,
        };

        let address = AddressRecord {
            user_id: user.id,
            country: generators::pick(&mut self.rng, pools::COUNTRIES).to_string(),
            city: generators::pick(&mut self.rng, pools::CITIES).to_string(),
            post_code: generators::random_digits(&mut self.rng, 5),
            street: generators::street_address(&mut self.rng),
            created_at: self.clock,
            updated_at: self.clock,
        };

        SeedRecord::new(ordinal, user, address)
    }
}

/// Iterator over the synthetic ordinals of a `Range` partition.
pub struct SyntheticSource {
    generator: SyntheticGenerator,
    next: u64,
    end: u64,
}

impl SyntheticSource {
    /// Create a source for the given partition.
    pub fn new(generator: SyntheticGenerator, partition: Partition) -> Result<Self, RecordError> {
        match partition {
            Partition::Range { start, end } => Ok(Self {
                generator,
                next: start,
                end,
            }),
            other => Err(RecordError::UnsupportedPartition(other)),
        }
    }
}

impl Iterator for SyntheticSource {
    type Item = Result<SeedRecord, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let ordinal = self.next;
        self.next += 1;
        Some(Ok(self.generator.generate(ordinal)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SyntheticSource {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_links_address() {
        let mut generator = SyntheticGenerator::new(Some(42));
        let record = generator.generate(0);

        assert_eq!(record.row_index, 0);
        assert_eq!(record.address.user_id, record.user.id);
        assert_eq!(record.user.id.get_version_num(), 4);
        assert_eq!(record.address.post_code.len(), 5);
        assert_eq!(record.user.password, DEFAULT_PASSWORD_HASH);
        assert!(record.user.email.contains(".0@"));
    }

    #[test]
    fn test_deterministic_fields() {
        let mut gen1 = SyntheticGenerator::new(Some(42));
        let mut gen2 = SyntheticGenerator::new(Some(42));

        let row1 = gen1.generate(3);
        let row2 = gen2.generate(3);

        assert_eq!(row1.user.first_name, row2.user.first_name);
        assert_eq!(row1.user.email, row2.user.email);
        assert_eq!(row1.address.street, row2.address.street);
        // Ids are never derived from the seed
        assert_ne!(row1.user.id, row2.user.id);
    }

    #[test]
    fn test_source_covers_range() {
        let generator = SyntheticGenerator::new(Some(1));
        let source =
            SyntheticSource::new(generator, Partition::Range { start: 10, end: 15 }).unwrap();
        assert_eq!(source.len(), 5);

        let rows: Vec<u64> = source.map(|r| r.unwrap().row_index).collect();
        assert_eq!(rows, vec![10, 11, 12, 13, 14]);
    }

    #[test]
    fn test_ids_and_emails_unique() {
        let generator = SyntheticGenerator::new(Some(9));
        let source =
            SyntheticSource::new(generator, Partition::Range { start: 0, end: 500 }).unwrap();

        let mut ids = HashSet::new();
        let mut emails = HashSet::new();
        for record in source {
            let record = record.unwrap();
            assert!(ids.insert(record.user.id));
            assert!(emails.insert(record.user.email));
        }
    }

    #[test]
    fn test_rejects_modulo_partition() {
        let generator = SyntheticGenerator::new(None);
        let result = SyntheticSource::new(
            generator,
            Partition::Modulo {
                workers: 2,
                index: 0,
            },
        );
        assert!(matches!(result, Err(RecordError::UnsupportedPartition(_))));
    }

    #[test]
    fn test_with_clock_and_hash() {
        let clock = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut generator = SyntheticGenerator::new(Some(1))
            .with_clock(clock)
            .with_password_hash("hash");
        let record = generator.generate(0);
        assert_eq!(record.user.created_at, clock);
        assert_eq!(record.address.updated_at, clock);
        assert_eq!(record.user.password, "hash");
    }
}
