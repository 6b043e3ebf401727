//! Repository modules for database operations

pub mod comments;
pub mod installations;
pub mod overrides;
pub mod repositories;
pub mod reviews;
pub mod runs;

pub use comments::ReviewCommentsRepo;
pub use installations::InstallationsRepo;
pub use overrides::PromptOverridesRepo;
pub use repositories::RepositoriesRepo;
pub use reviews::ReviewsRepo;
pub use runs::PipelineRunsRepo;
