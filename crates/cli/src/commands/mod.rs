//! Command implementations for `the-word`
//!
//! Local commands (`encode`, `hash`, `setup`, `prove`, `verify`) never touch
//! the network. The rest talk to the server at `THE_WORD_API_URL`.

mod phrase;
mod play;
mod proof;
mod rounds;

pub use phrase::{Encode, Hash};
pub use play::{Create, Shout, Whisper};
pub use proof::{Prove, Setup, Verify};
pub use rounds::{Get, Rounds};
