//! Journal — append-only install events and content digests.

pub mod eventlog;
pub mod hasher;
