//! The websocket transport around [`holdem_engine`]: wire protocol types,
//! the per-table actor that owns a `TableState`, and a registry that maps
//! table ids to actor mailboxes.

pub mod actor;
pub mod config;
pub mod error;
pub mod protocol;
pub mod registry;
