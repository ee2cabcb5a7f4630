pub mod account;
pub mod diff;
pub mod errors;
pub mod reconciler;
pub mod state_db;

pub use account::*;
pub use diff::*;
pub use errors::*;
pub use state_db::*;
