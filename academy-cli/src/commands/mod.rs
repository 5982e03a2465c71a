//! CLI command implementations.

pub mod export;
pub mod init;
pub mod serve;

pub use export::export_site;
pub use init::init_project;
pub use serve::serve_course;
