pub mod competition;
pub mod config;
pub mod ledger;
pub mod runner;
