// src/repositories/memory/mod.rs

pub mod shop;
pub mod penalty;
pub mod wallet;
pub mod stream;
pub mod reel;
pub mod purchase;

pub use shop::InMemoryShopRepository;
pub use penalty::InMemoryPenaltyRepository;
pub use wallet::InMemoryQuotaWalletRepository;
pub use stream::InMemoryStreamRepository;
pub use reel::InMemoryReelRepository;
pub use purchase::InMemoryPurchaseRepository;
