//! Record formats carried by an MPEG audio broadcast.
//!
//! Frame and tag decoders measure a single header at a buffer offset; the record module
//! combines them into the classification the synchronizer consumes.

pub mod frame;
pub mod record;
pub mod tag;
