//! In-memory portfolio repository.

use crate::identity::{
    domain::{NewPortfolio, Portfolio, PortfolioId, PortfolioPatch, UserId},
    ports::PortfolioRepository,
};
use crate::store::{
    ConflictReason, EntityKind, MemoryDatabase, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;

/// Portfolio repository backed by a [`MemoryDatabase`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryPortfolioRepository {
    db: MemoryDatabase,
}

impl InMemoryPortfolioRepository {
    /// Creates a repository over the shared database.
    #[must_use]
    pub const fn new(db: MemoryDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PortfolioRepository for InMemoryPortfolioRepository {
    async fn create(&self, portfolio: NewPortfolio) -> RepositoryResult<Portfolio> {
        self.db.write(move |tables| {
            if !tables.users.contains_key(&portfolio.user_id()) {
                return Err(RepositoryError::conflict(
                    EntityKind::Portfolio,
                    ConflictReason::MissingReference(EntityKind::User),
                ));
            }
            let id = tables.next_portfolio_id();
            let stored = portfolio.into_portfolio(id);
            tables.portfolios.insert(id, stored.clone());
            Ok(stored)
        })
    }

    async fn find_by_id(&self, id: PortfolioId) -> RepositoryResult<Option<Portfolio>> {
        self.db.read(|tables| tables.portfolios.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<Portfolio>> {
        self.db.read(|tables| {
            tables
                .portfolios
                .values()
                .filter(|portfolio| portfolio.user_id() == user_id)
                .cloned()
                .collect()
        })
    }

    async fn update_partial(
        &self,
        id: PortfolioId,
        patch: &PortfolioPatch,
    ) -> RepositoryResult<Portfolio> {
        if patch.is_empty() {
            return Err(RepositoryError::empty_patch(EntityKind::Portfolio));
        }
        let at = self.db.now();
        self.db.write(|tables| {
            let portfolio = tables
                .portfolios
                .get_mut(&id)
                .ok_or_else(|| RepositoryError::not_found(EntityKind::Portfolio, id))?;
            portfolio.apply_patch(patch, at);
            Ok(portfolio.clone())
        })
    }
}
