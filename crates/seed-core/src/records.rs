//! Seeded row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// bcrypt hash of the string `password`, stored for every seeded user.
pub const DEFAULT_PASSWORD_HASH: &str =
    "$2y$10$92IXUNpkjO0rOQ5byMi.Ye4oKoEa3Ro9llC/.og/at2.uheWG/igi";

/// The tables written by the seeder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Users,
    Addresses,
}

impl Table {
    /// SQL table name.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Addresses => "addresses",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Client-generated UUID v4
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Precomputed password hash
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the `addresses` table.
///
/// The address primary key is assigned by the store; only the foreign key
/// to the owning user is carried here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Foreign key to `users.id`
    pub user_id: Uuid,
    pub country: String,
    pub city: String,
    pub post_code: String,
    pub street: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user and its address, produced for one dataset row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedRecord {
    /// Zero-based row this pair was produced for (CSV data row or
    /// synthetic ordinal)
    pub row_index: u64,
    pub user: UserRecord,
    pub address: AddressRecord,
}

impl SeedRecord {
    /// Pair a user with its address.
    ///
    /// The address foreign key is always overwritten with the user id, so a
    /// `SeedRecord` can never carry an orphan address.
    pub fn new(row_index: u64, user: UserRecord, mut address: AddressRecord) -> Self {
        address.user_id = user.id;
        Self {
            row_index,
            user,
            address,
        }
    }

    /// Split into the two rows.
    pub fn into_parts(self) -> (UserRecord, AddressRecord) {
        (self.user, self.address)
    }
}
