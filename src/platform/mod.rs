pub mod file_host;
pub mod host;
