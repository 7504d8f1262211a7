pub mod attendance;
pub mod catalog;
pub mod day_ledger;
pub mod documents;
pub mod pallets;
pub mod reports;
pub mod unloading;
