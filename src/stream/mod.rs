//! Streaming changeset protocol.
//!
//! `decoder` renders the response live while it streams; `extractor` runs
//! once over the complete text and is the source of truth for the files.

pub mod decoder;
pub mod extractor;
pub mod protocol;
pub mod turn;
pub mod view;

pub use extractor::estimated_characters;
pub use turn::run_turn;
pub use view::TerminalView;
