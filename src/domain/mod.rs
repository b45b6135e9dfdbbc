//! Core entities and the rules that hold regardless of storage.

pub mod content;
pub mod entities;
pub mod error;
pub mod follow;
pub mod slug;
