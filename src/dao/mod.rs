//! Data access layer: store traits, backends, and shared entities.

pub mod identity;
pub mod local;
pub mod models;
pub mod rank_store;
pub mod storage;
