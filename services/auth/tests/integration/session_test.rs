use std::sync::Arc;

use meridian_auth::domain::types::{InvalidationReason, MAGIC_LINK_TOKEN_LEN};
use meridian_auth::error::AuthServiceError;
use meridian_auth::usecase::magic_link::{IssueMagicLinkInput, IssueMagicLinkUseCase};
use meridian_auth::usecase::session::{
    CreateSessionInput, CreateSessionUseCase, issue_access_token,
};
use meridian_auth_types::token::{validate_access_token, validate_token};

use crate::helpers::{
    MockMagicLinkRepo, MockUserRepo, TEST_JWT_SECRET, expired_magic_link, test_device,
    test_magic_link, test_user,
};

// ── issue_access_token ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_issue_access_token_that_validates_successfully() {
    let user = test_user();
    let (token, exp) = issue_access_token(&user, TEST_JWT_SECRET).unwrap();

    assert!(!token.is_empty());
    assert!(exp > 0);

    let claims = validate_token(&token, TEST_JWT_SECRET).unwrap();
    assert_eq!(claims.sub, user.id.to_string());
    assert_eq!(claims.email, user.email);
    assert_eq!(claims.name, user.name);
    assert_eq!(claims.role, user.role.as_u8());
    assert_eq!(claims.status, user.status.as_u8());
    assert_eq!(claims.exp, exp);
}

#[tokio::test]
async fn should_reject_access_token_signed_with_wrong_secret() {
    let user = test_user();
    let (token, _) = issue_access_token(&user, TEST_JWT_SECRET).unwrap();

    assert!(validate_token(&token, "wrong-secret").is_err());
}

// ── CreateSessionUseCase ─────────────────────────────────────────────────────

fn session_usecase(
    users: Vec<meridian_auth::domain::types::AuthUser>,
    links: MockMagicLinkRepo,
) -> CreateSessionUseCase<MockUserRepo, MockMagicLinkRepo> {
    CreateSessionUseCase {
        users: MockUserRepo::new(users),
        magic_links: links,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    }
}

#[tokio::test]
async fn should_create_session_with_valid_link() {
    let user = test_user();
    let link = test_magic_link(user.id);
    let token_str = link.token.clone();

    let uc = session_usecase(vec![user.clone()], MockMagicLinkRepo::new(vec![link]));

    let out = uc
        .execute(CreateSessionInput { token: token_str })
        .await
        .unwrap();

    assert_eq!(out.user.id, user.id);
    assert!(!out.access_token.is_empty());
    assert!(out.access_token_exp > 0);

    // Session embeds the user's identity and role.
    let info = validate_access_token(&out.access_token, TEST_JWT_SECRET).unwrap();
    assert_eq!(info.user_id, user.id);
    assert_eq!(info.user_role, user.role.as_u8());
    assert_eq!(info.user_status, user.status.as_u8());
}

#[tokio::test]
async fn should_mark_link_used_after_session_creation() {
    let user = test_user();
    let link = test_magic_link(user.id);
    let token_str = link.token.clone();
    let link_id = link.id;

    let mock_repo = MockMagicLinkRepo::new(vec![link]);
    let tokens_handle = mock_repo.tokens_handle();

    let uc = session_usecase(vec![user], mock_repo);
    uc.execute(CreateSessionInput { token: token_str })
        .await
        .unwrap();

    let tokens = tokens_handle.lock().unwrap();
    let used = tokens.iter().find(|t| t.id == link_id).unwrap();
    assert!(
        used.used_at.is_some(),
        "link should be marked used after redemption"
    );
}

#[tokio::test]
async fn should_fail_second_redemption_with_already_used() {
    let user = test_user();
    let link = test_magic_link(user.id);
    let token_str = link.token.clone();

    let uc = session_usecase(vec![user], MockMagicLinkRepo::new(vec![link]));

    uc.execute(CreateSessionInput {
        token: token_str.clone(),
    })
    .await
    .unwrap();

    let result = uc.execute(CreateSessionInput { token: token_str }).await;
    assert!(
        matches!(result, Err(AuthServiceError::LinkAlreadyUsed)),
        "expected LinkAlreadyUsed, got {result:?}"
    );
}

#[tokio::test]
async fn should_fail_with_not_found_for_unknown_token() {
    let uc = session_usecase(vec![test_user()], MockMagicLinkRepo::empty());

    let result = uc
        .execute(CreateSessionInput {
            token: "Z".repeat(MAGIC_LINK_TOKEN_LEN),
        })
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::LinkNotFound)),
        "expected LinkNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_fail_with_expired_and_mark_invalidated() {
    let user = test_user();
    let link = expired_magic_link(user.id);
    let token_str = link.token.clone();
    let link_id = link.id;

    let mock_repo = MockMagicLinkRepo::new(vec![link]);
    let tokens_handle = mock_repo.tokens_handle();

    let uc = session_usecase(vec![user], mock_repo);
    let result = uc.execute(CreateSessionInput { token: token_str }).await;

    assert!(
        matches!(result, Err(AuthServiceError::LinkExpired)),
        "expected LinkExpired, got {result:?}"
    );

    let tokens = tokens_handle.lock().unwrap();
    let record = tokens.iter().find(|t| t.id == link_id).unwrap();
    assert_eq!(
        record.invalidated_by,
        Some(InvalidationReason::Expired),
        "expiry should be recorded lazily at redemption time"
    );
}

#[tokio::test]
async fn should_report_expired_even_when_link_was_used() {
    let user = test_user();
    let mut link = expired_magic_link(user.id);
    link.used_at = Some(chrono::Utc::now() - chrono::Duration::seconds(120));
    let token_str = link.token.clone();

    let uc = session_usecase(vec![user], MockMagicLinkRepo::new(vec![link]));
    let result = uc.execute(CreateSessionInput { token: token_str }).await;

    assert!(
        matches!(result, Err(AuthServiceError::LinkExpired)),
        "expiry takes precedence over the used flag, got {result:?}"
    );
}

#[tokio::test]
async fn should_fail_with_not_found_for_superseded_link() {
    let user = test_user();
    let mut link = test_magic_link(user.id);
    link.invalidated_by = Some(InvalidationReason::NewRequest);
    let token_str = link.token.clone();

    let uc = session_usecase(vec![user], MockMagicLinkRepo::new(vec![link]));
    let result = uc.execute(CreateSessionInput { token: token_str }).await;

    assert!(
        matches!(result, Err(AuthServiceError::LinkNotFound)),
        "expected LinkNotFound for superseded link, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_token_outside_length_bounds() {
    let uc = session_usecase(vec![test_user()], MockMagicLinkRepo::empty());

    let result = uc
        .execute(CreateSessionInput {
            token: "short".to_owned(),
        })
        .await;
    assert!(
        matches!(
            result,
            Err(AuthServiceError::Validation { field: "token", .. })
        ),
        "expected token Validation, got {result:?}"
    );

    let result = uc
        .execute(CreateSessionInput {
            token: "A".repeat(129),
        })
        .await;
    assert!(matches!(
        result,
        Err(AuthServiceError::Validation { field: "token", .. })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn should_allow_exactly_one_concurrent_redemption() {
    let user = test_user();
    let link = test_magic_link(user.id);
    let token_str = link.token.clone();

    let uc = Arc::new(session_usecase(
        vec![user],
        MockMagicLinkRepo::new(vec![link]),
    ));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let uc = Arc::clone(&uc);
        let token = token_str.clone();
        handles.push(tokio::spawn(async move {
            uc.execute(CreateSessionInput { token }).await
        }));
    }

    let mut successes = 0;
    let mut already_used = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(AuthServiceError::LinkAlreadyUsed) => already_used += 1,
            Err(other) => panic!("unexpected error during race: {other:?}"),
        }
    }

    assert_eq!(successes, 1, "exactly one concurrent redemption may win");
    assert_eq!(already_used, 7);
}

// ── End-to-end lifecycle ─────────────────────────────────────────────────────

#[tokio::test]
async fn should_run_full_issue_and_redeem_lifecycle() {
    let user = test_user();
    let link_repo = MockMagicLinkRepo::empty();
    let events_handle = link_repo.events_handle();

    let issue = IssueMagicLinkUseCase {
        users: MockUserRepo::new(vec![user.clone()]),
        magic_links: link_repo.clone(),
    };
    issue
        .execute(IssueMagicLinkInput {
            email: user.email.clone(),
            device: test_device(),
        })
        .await
        .unwrap();

    // The user receives the token out-of-band (outbox email).
    let delivered_token = events_handle.lock().unwrap()[0].payload["token"]
        .as_str()
        .unwrap()
        .to_owned();

    let session = session_usecase(vec![user.clone()], link_repo);
    let out = session
        .execute(CreateSessionInput {
            token: delivered_token.clone(),
        })
        .await
        .unwrap();
    assert_eq!(out.user.id, user.id);
    assert_eq!(out.user.role, user.role);

    // Re-presenting the same link must fail.
    let result = session
        .execute(CreateSessionInput {
            token: delivered_token,
        })
        .await;
    assert!(matches!(result, Err(AuthServiceError::LinkAlreadyUsed)));
}
