//! Route handlers organized by resource

pub mod health;
pub mod diary;
pub mod upload;
pub mod resources;
