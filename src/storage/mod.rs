//! Shared state between the polling task and the serving path

mod published;

pub use published::PublishedState;
