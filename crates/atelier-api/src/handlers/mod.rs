//! Route handlers.

pub mod media;
pub mod system;
