//! Typed wrappers over the console's REST endpoints.

pub mod envelope;
pub mod monitor;
pub mod projects;
pub mod videos;

pub use envelope::Envelope;
