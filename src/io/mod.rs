//! Persistence helpers.
//!
//! Only the minimal per-codimension index dump is provided; see
//! [`index_dump`].

pub mod index_dump;

pub use index_dump::{codim_path, read_index_dump, write_index_dump};
