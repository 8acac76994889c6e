//! Request handlers.

pub mod health;
pub mod jobs;
pub mod playlists;
pub mod status;

pub use health::*;
pub use jobs::*;
pub use playlists::*;
pub use status::*;
