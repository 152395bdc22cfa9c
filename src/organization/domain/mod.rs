//! Domain model for organizations, projects and batches.

mod batch;
mod error;
mod ids;
mod name;
mod organization;
mod project;

pub use batch::{Batch, BatchPatch, BatchSettings, BatchStatus, PersistedBatchData};
pub use error::OrganizationDomainError;
pub use ids::{BatchId, OrganizationId, ProjectId};
pub use name::RecordName;
pub use organization::{
    Organization, OrganizationKind, OrganizationPatch, PersistedOrganizationData,
};
pub use project::{PersistedProjectData, Project, ProjectKind, ProjectPatch, ProjectStatus};
