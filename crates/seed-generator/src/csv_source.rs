//! CSV dataset reader.
//!
//! The dataset is read with the `csv` crate. The header row is consumed by
//! the reader and every following record gets a zero-based data index `k`.
//! A worker only decodes the records its `Modulo` partition owns, so N
//! workers scanning the same file together map every row exactly once.

use crate::error::{ParseError, RecordError};
use chrono::{DateTime, Utc};
use csv::ByteRecord;
use seed_core::{AddressRecord, Partition, SeedRecord, UserRecord, DEFAULT_PASSWORD_HASH};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Column positions of the mapped fields in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvLayout {
    pub first_name: usize,
    pub last_name: usize,
    pub email: usize,
    pub street: usize,
    pub country: usize,
    pub city: usize,
    pub post_code: usize,
}

impl Default for CsvLayout {
    /// Layout of the one-million-user dataset the seeder was built for.
    fn default() -> Self {
        Self {
            first_name: 2,
            last_name: 4,
            email: 6,
            street: 29,
            country: 30,
            city: 31,
            post_code: 33,
        }
    }
}

impl CsvLayout {
    /// Minimum number of columns a row needs for this layout.
    pub fn required_columns(&self) -> usize {
        [
            self.first_name,
            self.last_name,
            self.email,
            self.street,
            self.country,
            self.city,
            self.post_code,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }
}

/// Maps one dataset record onto a user/address pair.
#[derive(Debug, Clone)]
pub struct CsvRecordMapper {
    layout: CsvLayout,
    clock: DateTime<Utc>,
    password_hash: String,
}

impl CsvRecordMapper {
    pub fn new(layout: CsvLayout) -> Self {
        Self {
            layout,
            clock: Utc::now(),
            password_hash: DEFAULT_PASSWORD_HASH.to_string(),
        }
    }

    /// Set the timestamp used for every mapped row.
    pub fn with_clock(mut self, clock: DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the stored password hash.
    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = hash.into();
        self
    }

    pub fn layout(&self) -> &CsvLayout {
        &self.layout
    }

    /// Map data row `row`. The dataset's own id column is ignored and a
    /// fresh UUID v4 is assigned.
    pub fn map(&self, row: u64, record: &ByteRecord) -> Result<SeedRecord, ParseError> {
        let layout = &self.layout;

        let user = UserRecord {
            id: Uuid::new_v4(),
            first_name: column(record, row, layout.first_name)?,
            last_name: column(record, row, layout.last_name)?,
            email: column(record, row, layout.email)?,
            password: self.password_hash.clone(),
            created_at: self.clock,
            updated_at: self.clock,
        };

        let address = AddressRecord {
            user_id: user.id,
            country: column(record, row, layout.country)?,
            city: column(record, row, layout.city)?,
            post_code: column(record, row, layout.post_code)?,
            street: column(record, row, layout.street)?,
            created_at: self.clock,
            updated_at: self.clock,
        };

        Ok(SeedRecord::new(row, user, address))
    }
}

fn column(record: &ByteRecord, row: u64, index: usize) -> Result<String, ParseError> {
    let bytes = record.get(index).ok_or(ParseError::ColumnCount {
        row,
        expected: index + 1,
        found: record.len(),
    })?;
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| ParseError::InvalidUtf8 { row, column: index })
}

/// Iterator over the records of a CSV file owned by a `Modulo` partition.
pub struct CsvSource {
    path: PathBuf,
    reader: csv::Reader<File>,
    mapper: CsvRecordMapper,
    partition: Partition,
    /// Column count of the header; every data row must match it
    expected_columns: usize,
    record: ByteRecord,
    next_row: u64,
    finished: bool,
}

impl CsvSource {
    /// Open the dataset and validate its header against the mapper's layout.
    pub fn open(
        path: impl AsRef<Path>,
        mapper: CsvRecordMapper,
        partition: Partition,
    ) -> Result<Self, RecordError> {
        let path = path.as_ref().to_path_buf();

        if !matches!(partition, Partition::Modulo { .. }) {
            return Err(RecordError::UnsupportedPartition(partition));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&path)
            .map_err(|source| RecordError::Source {
                path: path.clone(),
                source,
            })?;

        let expected_columns = reader
            .byte_headers()
            .map_err(|source| RecordError::Source {
                path: path.clone(),
                source,
            })?
            .len();

        let required = mapper.layout().required_columns();
        if expected_columns < required {
            return Err(RecordError::Schema {
                required,
                found: expected_columns,
            });
        }

        debug!(
            "Opened CSV source {:?} ({} columns) for {}",
            path, expected_columns, partition
        );

        Ok(Self {
            path,
            reader,
            mapper,
            partition,
            expected_columns,
            record: ByteRecord::new(),
            next_row: 0,
            finished: false,
        })
    }

    /// Number of data rows read so far, owned or not.
    pub fn rows_scanned(&self) -> u64 {
        self.next_row
    }
}

impl Iterator for CsvSource {
    type Item = Result<SeedRecord, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            match self.reader.read_byte_record(&mut self.record) {
                Ok(false) => self.finished = true,
                Ok(true) => {
                    let row = self.next_row;
                    self.next_row += 1;

                    if !self.partition.owns(row) {
                        continue;
                    }

                    if self.record.len() != self.expected_columns {
                        return Some(Err(ParseError::ColumnCount {
                            row,
                            expected: self.expected_columns,
                            found: self.record.len(),
                        }
                        .into()));
                    }

                    return Some(self.mapper.map(row, &self.record).map_err(Into::into));
                }
                Err(source) => {
                    self.finished = true;
                    return Some(Err(RecordError::Source {
                        path: self.path.clone(),
                        source,
                    }));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn small_layout() -> CsvLayout {
        CsvLayout {
            first_name: 1,
            last_name: 2,
            email: 3,
            street: 4,
            country: 5,
            city: 6,
            post_code: 7,
        }
    }

    fn write_csv(rows: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id,first,last,email,street,country,city,zip").unwrap();
        for i in 0..rows {
            writeln!(
                file,
                "{i},First{i},Last{i},user{i}@example.com,{i} Main St,Country{i},City{i},{i:05}"
            )
            .unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn modulo(workers: usize, index: usize) -> Partition {
        Partition::Modulo { workers, index }
    }

    #[test]
    fn test_default_layout_required_columns() {
        assert_eq!(CsvLayout::default().required_columns(), 34);
    }

    #[test]
    fn test_map_record() {
        let mapper = CsvRecordMapper::new(small_layout());
        let record = ByteRecord::from(vec![
            "99", "Ada", "Lovelace", "ada@example.com", "12 Crescent", "UK", "London", "NW1",
        ]);

        let seed = mapper.map(4, &record).unwrap();
        assert_eq!(seed.row_index, 4);
        assert_eq!(seed.user.first_name, "Ada");
        assert_eq!(seed.user.last_name, "Lovelace");
        assert_eq!(seed.user.email, "ada@example.com");
        assert_eq!(seed.address.street, "12 Crescent");
        assert_eq!(seed.address.country, "UK");
        assert_eq!(seed.address.city, "London");
        assert_eq!(seed.address.post_code, "NW1");
        assert_eq!(seed.address.user_id, seed.user.id);
        // Source id is not reused
        assert_ne!(seed.user.id.to_string(), "99");
    }

    #[test]
    fn test_map_record_invalid_utf8() {
        let mapper = CsvRecordMapper::new(small_layout());
        let mut record = ByteRecord::new();
        record.push_field(b"1");
        record.push_field(&[0xff, 0xfe]);
        for _ in 0..6 {
            record.push_field(b"x");
        }

        let err = mapper.map(0, &record).unwrap_err();
        assert_eq!(err, ParseError::InvalidUtf8 { row: 0, column: 1 });
    }

    #[test]
    fn test_partitions_cover_every_row_once() {
        let file = write_csv(23);

        for workers in 1..=5 {
            let mut seen = BTreeSet::new();
            for index in 0..workers {
                let source = CsvSource::open(
                    file.path(),
                    CsvRecordMapper::new(small_layout()),
                    modulo(workers, index),
                )
                .unwrap();
                for record in source {
                    let record = record.unwrap();
                    assert_eq!(record.row_index % workers as u64, index as u64);
                    assert_eq!(record.user.first_name, format!("First{}", record.row_index));
                    assert!(seen.insert(record.row_index), "row mapped twice");
                }
            }
            assert_eq!(seen, (0..23).collect::<BTreeSet<u64>>());
        }
    }

    #[test]
    fn test_wrong_column_count_is_parse_error() {
        let mut file = write_csv(2);
        writeln!(file, "2,Broken,Row").unwrap();
        writeln!(file, "3,First3,Last3,u3@example.com,3 Main St,C3,City3,00003").unwrap();
        file.flush().unwrap();

        let source =
            CsvSource::open(file.path(), CsvRecordMapper::new(small_layout()), modulo(1, 0))
                .unwrap();
        let results: Vec<_> = source.collect();

        assert_eq!(results.len(), 4);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        match &results[2] {
            Err(RecordError::Parse(ParseError::ColumnCount {
                row,
                expected,
                found,
            })) => {
                assert_eq!((*row, *expected, *found), (2, 8, 3));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(results[2].as_ref().unwrap_err().is_skippable());
        assert_eq!(results[3].as_ref().unwrap().row_index, 3);
    }

    #[test]
    fn test_malformed_row_not_owned_is_ignored() {
        let mut file = write_csv(1);
        writeln!(file, "1,Broken").unwrap();
        file.flush().unwrap();

        // Row 1 belongs to worker 1 of 2, so worker 0 never decodes it
        let source =
            CsvSource::open(file.path(), CsvRecordMapper::new(small_layout()), modulo(2, 0))
                .unwrap();
        let results: Vec<_> = source.collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
    }

    #[test]
    fn test_short_header_is_schema_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id,first,last").unwrap();
        writeln!(file, "1,A,B").unwrap();
        file.flush().unwrap();

        let result =
            CsvSource::open(file.path(), CsvRecordMapper::new(small_layout()), modulo(1, 0));
        assert!(matches!(
            result,
            Err(RecordError::Schema {
                required: 8,
                found: 3
            })
        ));
    }

    #[test]
    fn test_missing_file_is_source_error() {
        let result = CsvSource::open(
            "/nonexistent/users.csv",
            CsvRecordMapper::new(small_layout()),
            modulo(1, 0),
        );
        assert!(matches!(result, Err(RecordError::Source { .. })));
    }

    #[test]
    fn test_rejects_range_partition() {
        let file = write_csv(1);
        let result = CsvSource::open(
            file.path(),
            CsvRecordMapper::new(small_layout()),
            Partition::Range { start: 0, end: 1 },
        );
        assert!(matches!(result, Err(RecordError::UnsupportedPartition(_))));
    }

    #[test]
    fn test_rows_scanned_counts_unowned_rows() {
        let file = write_csv(6);
        let mut source =
            CsvSource::open(file.path(), CsvRecordMapper::new(small_layout()), modulo(3, 2))
                .unwrap();
        assert_eq!(source.by_ref().count(), 2);
        assert_eq!(source.rows_scanned(), 6);
    }
}
