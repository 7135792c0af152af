//! CLI command implementations

pub mod host;
pub mod reviews;
pub mod serve;
pub mod tool;

pub use host::HostArgs;
pub use reviews::ReviewsArgs;
pub use serve::ServeArgs;
pub use tool::ToolArgs;
