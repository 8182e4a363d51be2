//! Types shared between the content-generation client core and its hosts.

pub mod domain;
pub mod error;
pub mod protocol;
