//! External collaborators — filesystem, archives, runners, config store, library.

pub mod archive;
pub mod config_store;
pub mod fs;
pub mod library;
pub mod runner;
