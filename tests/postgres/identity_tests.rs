//! `PostgreSQL` integration tests for users and sign-in identities.

use annotatex_workflow::error::{ClassifiedError, ErrorKind};
use annotatex_workflow::identity::{
    adapters::postgres::{
        PostgresAuthIdentityRepository, PostgresPortfolioRepository, PostgresUserRepository,
    },
    domain::{
        AuthProvider, AuthSubject, DisplayName, NewAuthIdentity, NewPortfolio, User, Username,
    },
    ports::{AuthIdentityRepository, PortfolioRepository, UserRepository},
};
use mockable::DefaultClock;
use rstest::rstest;

use crate::postgres::helpers::test_database;

fn google(subject: &str) -> (AuthProvider, AuthSubject) {
    (
        AuthProvider::new("google").expect("valid provider"),
        AuthSubject::new(subject).expect("valid subject"),
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn identity_pair_is_unique_and_resolves_its_user() {
    let db = test_database().expect("test database provisioned");
    let users = PostgresUserRepository::new(db.pool());
    let identities = PostgresAuthIdentityRepository::new(db.pool());
    let alice = User::new(Username::new("alice").expect("valid username"), &DefaultClock);
    let bob = User::new(Username::new("bob").expect("valid username"), &DefaultClock);
    users.create(&alice).await.expect("alice stored");
    users.create(&bob).await.expect("bob stored");
    let (provider, subject) = google("g-1");

    let stored = identities
        .add(
            NewAuthIdentity::new(alice.id(), provider.clone(), subject.clone(), &DefaultClock)
                .with_email("alice@example.com", true),
        )
        .await
        .expect("identity stored");
    let duplicate = identities
        .add(NewAuthIdentity::new(
            bob.id(),
            provider.clone(),
            subject.clone(),
            &DefaultClock,
        ))
        .await
        .expect_err("pair already claimed");
    let resolved = identities
        .find_user_by_identity(&provider, &subject)
        .await
        .expect("lookup succeeds");
    let signed_in = identities
        .touch_last_login(&provider, &subject)
        .await
        .expect("login recorded");

    assert_eq!(stored.email(), Some("alice@example.com"));
    assert_eq!(duplicate.kind(), ErrorKind::Conflict);
    assert_eq!(resolved.map(|user| user.id()), Some(alice.id()));
    assert!(signed_in.last_login_at().is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_user_cascades_to_identities_and_portfolios() {
    let db = test_database().expect("test database provisioned");
    let users = PostgresUserRepository::new(db.pool());
    let identities = PostgresAuthIdentityRepository::new(db.pool());
    let portfolios = PostgresPortfolioRepository::new(db.pool());
    let alice = User::new(Username::new("alice").expect("valid username"), &DefaultClock);
    users.create(&alice).await.expect("alice stored");
    let (provider, subject) = google("g-2");
    identities
        .add(NewAuthIdentity::new(
            alice.id(),
            provider,
            subject,
            &DefaultClock,
        ))
        .await
        .expect("identity stored");
    portfolios
        .create(NewPortfolio::new(
            alice.id(),
            DisplayName::new("Alice").expect("valid display name"),
            &DefaultClock,
        ))
        .await
        .expect("portfolio stored");

    assert!(users.delete(alice.id()).await.expect("user deleted"));
    assert!(!users.delete(alice.id()).await.expect("repeat is a no-op"));

    assert!(
        identities
            .list_for_user(alice.id())
            .await
            .expect("listing succeeds")
            .is_empty()
    );
    assert!(
        portfolios
            .list_for_user(alice.id())
            .await
            .expect("listing succeeds")
            .is_empty()
    );
}
