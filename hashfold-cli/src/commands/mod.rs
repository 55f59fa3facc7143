//! Command handlers

pub mod proof;
pub mod root;
pub mod verify;
