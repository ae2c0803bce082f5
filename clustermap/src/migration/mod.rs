//! Chunk migration protocol: donor and recipient state machines for moving
//! one chunk between shards with exactly-once-commit semantics.

pub mod donor;
pub mod error;
pub mod recipient;
pub mod registry;
pub mod state;

pub use donor::DonorMigration;
pub use error::Error;
pub use recipient::RecipientMigration;
pub use registry::MigrationRegistry;
pub use state::{MigrationRecord, State};
