//! Identifier types for the organization domain.

use crate::ids::uuid_identifier;

uuid_identifier! {
    /// Unique identifier for an organization.
    OrganizationId
}

uuid_identifier! {
    /// Unique identifier for a project.
    ProjectId
}

uuid_identifier! {
    /// Unique identifier for a batch of tasks.
    BatchId
}
