pub mod capture;
pub mod compositor;
pub mod config;
pub mod detector;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod platform;
pub mod prefs;
pub mod processing;
pub mod slot;
pub mod storage;

pub use pipeline::{HostCollaborators, Pipeline};
