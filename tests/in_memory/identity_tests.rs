//! In-memory integration tests for users, identities and portfolios.

use annotatex_workflow::error::{ClassifiedError, ErrorKind};
use annotatex_workflow::identity::{
    adapters::memory::{
        InMemoryAuthIdentityRepository, InMemoryPortfolioRepository, InMemoryUserRepository,
    },
    domain::{
        AuthIdentityPatch, AuthProvider, AuthSubject, DisplayName, NewAuthIdentity, NewPortfolio,
        PasswordCredential, PortfolioPatch, User, Username,
    },
    ports::{AuthIdentityRepository, PortfolioRepository, UserRepository},
};
use annotatex_workflow::store::MemoryDatabase;
use mockable::DefaultClock;
use rstest::rstest;

use crate::in_memory::helpers::db;

fn provider(value: &str) -> AuthProvider {
    AuthProvider::new(value).expect("valid provider")
}

fn subject(value: &str) -> AuthSubject {
    AuthSubject::new(value).expect("valid subject")
}

async fn stored_user(db: &MemoryDatabase, username: &str) -> User {
    let user = User::new(Username::new(username).expect("valid username"), &DefaultClock);
    InMemoryUserRepository::new(db.clone())
        .create(&user)
        .await
        .expect("user stored");
    user
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn user_signs_in_through_several_providers(db: MemoryDatabase) {
    let user = stored_user(&db, "alice").await;
    let identities = InMemoryAuthIdentityRepository::new(db);
    identities
        .add(
            NewAuthIdentity::new(user.id(), provider("google"), subject("g-123"), &DefaultClock)
                .with_email("alice@example.com", true),
        )
        .await
        .expect("google identity stored");
    identities
        .add(
            NewAuthIdentity::new(user.id(), provider("local"), subject("alice"), &DefaultClock)
                .with_password(PasswordCredential::new("$argon2id$abc", "argon2id").expect("hash")),
        )
        .await
        .expect("local identity stored");

    let via_google = identities
        .find_user_by_identity(&provider("Google"), &subject("g-123"))
        .await
        .expect("lookup succeeds");
    let listed = identities
        .list_for_user(user.id())
        .await
        .expect("listing succeeds");

    assert_eq!(via_google.map(|found| found.id()), Some(user.id()));
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].provider().as_str(), "google");
    assert!(listed[1].password().is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn provider_subject_pair_maps_to_one_user(db: MemoryDatabase) {
    let alice = stored_user(&db, "alice").await;
    let bob = stored_user(&db, "bob").await;
    let identities = InMemoryAuthIdentityRepository::new(db);
    identities
        .add(NewAuthIdentity::new(
            alice.id(),
            provider("github"),
            subject("42"),
            &DefaultClock,
        ))
        .await
        .expect("first identity stored");

    let err = identities
        .add(NewAuthIdentity::new(
            bob.id(),
            provider("github"),
            subject("42"),
            &DefaultClock,
        ))
        .await
        .expect_err("pair is already claimed");

    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sign_in_and_password_change_stamp_the_identity(db: MemoryDatabase) {
    let user = stored_user(&db, "alice").await;
    let identities = InMemoryAuthIdentityRepository::new(db);
    identities
        .add(NewAuthIdentity::new(
            user.id(),
            provider("local"),
            subject("alice"),
            &DefaultClock,
        ))
        .await
        .expect("identity stored");

    let signed_in = identities
        .touch_last_login(&provider("local"), &subject("alice"))
        .await
        .expect("login recorded");
    let patch = AuthIdentityPatch {
        password: Some(PasswordCredential::new("$argon2id$new", "argon2id").expect("hash")),
        ..AuthIdentityPatch::default()
    };
    let rotated = identities
        .update_partial(user.id(), &provider("local"), &patch)
        .await
        .expect("password updated");

    assert!(signed_in.last_login_at().is_some());
    assert!(rotated.password_updated_at().is_some());
    assert_eq!(
        rotated.password().map(PasswordCredential::hash),
        Some("$argon2id$new")
    );

    let missing = identities
        .touch_last_login(&provider("local"), &subject("nobody"))
        .await
        .expect_err("unknown identity");
    assert_eq!(missing.kind(), ErrorKind::NotFound);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_portfolio_patch_is_a_validation_error(db: MemoryDatabase) {
    let user = stored_user(&db, "alice").await;
    let portfolios = InMemoryPortfolioRepository::new(db);
    let portfolio = portfolios
        .create(NewPortfolio::new(
            user.id(),
            DisplayName::new("Alice A.").expect("valid display name"),
            &DefaultClock,
        ))
        .await
        .expect("portfolio stored");

    let err = portfolios
        .update_partial(portfolio.id(), &PortfolioPatch::default())
        .await
        .expect_err("empty patch");
    let renamed = portfolios
        .update_partial(
            portfolio.id(),
            &PortfolioPatch {
                display_name: Some(DisplayName::new("Alice B.").expect("valid display name")),
            },
        )
        .await
        .expect("rename succeeds");

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(renamed.display_name().as_str(), "Alice B.");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_user_removes_identities_and_portfolios(db: MemoryDatabase) {
    let user = stored_user(&db, "alice").await;
    let users = InMemoryUserRepository::new(db.clone());
    let identities = InMemoryAuthIdentityRepository::new(db.clone());
    let portfolios = InMemoryPortfolioRepository::new(db);
    identities
        .add(NewAuthIdentity::new(
            user.id(),
            provider("google"),
            subject("g-1"),
            &DefaultClock,
        ))
        .await
        .expect("identity stored");
    portfolios
        .create(NewPortfolio::new(
            user.id(),
            DisplayName::new("Alice").expect("valid display name"),
            &DefaultClock,
        ))
        .await
        .expect("portfolio stored");

    assert!(users.delete(user.id()).await.expect("user deleted"));

    assert!(
        identities
            .list_for_user(user.id())
            .await
            .expect("listing succeeds")
            .is_empty()
    );
    assert!(
        portfolios
            .list_for_user(user.id())
            .await
            .expect("listing succeeds")
            .is_empty()
    );
    assert!(
        identities
            .find_user_by_identity(&provider("google"), &subject("g-1"))
            .await
            .expect("lookup succeeds")
            .is_none()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deactivated_users_are_kept_but_not_listed_as_active(db: MemoryDatabase) {
    let alice = stored_user(&db, "alice").await;
    let users = InMemoryUserRepository::new(db);

    let disabled = users.deactivate(alice.id()).await.expect("deactivated");
    let active = users.list_active().await.expect("listing succeeds");
    let enabled = users.activate(alice.id()).await.expect("activated");

    assert!(!disabled.is_active());
    assert!(active.is_empty());
    assert!(enabled.is_active());
    assert_eq!(users.list_all().await.expect("listing succeeds").len(), 1);
}
