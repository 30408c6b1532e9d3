/// Data entities for songs and search responses
pub mod entities;
/// Error types and result aliases
pub mod errors;
/// iTunes search API client
pub mod itunes;

pub use entities::Song;
pub use itunes::{SearchClient, SongSearch};
