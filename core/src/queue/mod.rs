pub mod store;
pub mod team_queue;

pub use store::{StoreError, TeamEntry, TeamStore};
pub use team_queue::{QueueRefresh, TeamQueue};
