//! Repository layer for round records.
//!
//! Round documents are the only mutable data the runtime keeps. Every
//! mutation of an existing round is a conditional update evaluated under the
//! repository's lock, so concurrent whispers and shouts cannot lose writes.

mod error;
mod file;
mod memory;
mod table;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileRoundRepository;
pub use memory::InMemoryRoundRepository;
pub use traits::{RoundRepository, UpdateOutcome};
