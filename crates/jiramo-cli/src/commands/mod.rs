pub mod project;
pub mod serve;

pub use project::ProjectCommand;
pub use serve::ServeCommand;
