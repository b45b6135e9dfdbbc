//! Application services: feeds, follows, post mutations and their errors.

pub mod authors;
pub mod error;
pub mod feed;
pub mod follows;
pub mod groups;
pub mod pagination;
pub mod posts;
pub mod repos;
