// src/repositories/postgres/mod.rs

use std::str::FromStr;
use sqlx::postgres::PgRow;
use sqlx::Row;
use crate::Error;

pub mod shop;
pub mod penalty;
pub mod wallet;
pub mod stream;
pub mod reel;
pub mod purchase;

pub use shop::PostgresShopRepository;
pub use penalty::PostgresPenaltyRepository;
pub use wallet::PostgresQuotaWalletRepository;
pub use stream::PostgresStreamRepository;
pub use reel::PostgresReelRepository;
pub use purchase::PostgresPurchaseRepository;

/// Reads a TEXT column into one of the closed enums. Unknown values are an
/// error rather than a silent default.
pub(crate) fn enum_col<T>(row: &PgRow, column: &str) -> Result<T, Error>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    T::from_str(&raw).map_err(|e| Error::Parse(format!("{}.{}: {}", column, raw, e)))
}

pub(crate) fn opt_enum_col<T>(row: &PgRow, column: &str) -> Result<Option<T>, Error>
where
    T: FromStr<Err = String>,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| T::from_str(&s).map_err(|e| Error::Parse(format!("{}.{}: {}", column, s, e))))
        .transpose()
}

pub(crate) fn status_codes<T: Copy, F: Fn(T) -> &'static str>(items: &[T], code: F) -> Vec<String> {
    items.iter().map(|s| code(*s).to_string()).collect()
}
