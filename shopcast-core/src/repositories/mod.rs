// src/repositories/mod.rs
//
// Postgres repositories for production and in-memory twins for tests and
// `--in-memory` runs. Both implement the traits in
// `shopcast_common::traits::repository_traits`.

pub mod memory;
pub mod postgres;

pub use memory::{
    InMemoryPenaltyRepository, InMemoryPurchaseRepository, InMemoryQuotaWalletRepository,
    InMemoryReelRepository, InMemoryShopRepository, InMemoryStreamRepository,
};
pub use postgres::{
    PostgresPenaltyRepository, PostgresPurchaseRepository, PostgresQuotaWalletRepository,
    PostgresReelRepository, PostgresShopRepository, PostgresStreamRepository,
};
