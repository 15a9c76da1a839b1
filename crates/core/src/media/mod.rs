//! Media artifact descriptions exchanged between the composer and its collaborators.

mod types;

pub use types::{guess_mime_type, AudioStream, MediaCategory, Track, VideoStream};
