//! Widget lifecycle, mounting, and response plumbing.

pub mod content;
pub mod error;
pub mod mount;
pub mod session;
pub mod stream;
pub mod theme;
