//! Metadata operations for uploaded content
//!
//! After the bytes are stored, the metadata service links their hash and
//! size to a path in the user's cloud.

pub mod register;

pub use register::{register_file, CONFLICT_POLICY, FILE_ADD_PATH};
