//! Identifier types for the identity domain.

use crate::ids::{serial_identifier, uuid_identifier};

uuid_identifier! {
    /// Unique identifier for a user.
    UserId
}

serial_identifier! {
    /// Store-assigned identifier for an authentication identity.
    AuthIdentityId
}

serial_identifier! {
    /// Store-assigned identifier for a user portfolio.
    PortfolioId
}
