//! In-memory adapters for organization, project and batch storage.

mod batch;
mod organization;
mod project;

pub use batch::InMemoryBatchRepository;
pub use organization::InMemoryOrganizationRepository;
pub use project::InMemoryProjectRepository;
