mod common;

use common::Fixture;
use docshare_core::model::user::{Level, RankingMetric, UserProfilePatch};
use docshare_core::{RegisterRequest, ServiceError};

#[test]
fn register_rejects_bad_email_blank_name_and_duplicates() {
    let fx = Fixture::new();
    let users = fx.users();

    let bad_email = users.register(&RegisterRequest {
        email: "not-an-email".to_string(),
        full_name: "Someone".to_string(),
        external_uid: "uid-1".to_string(),
    });
    assert!(matches!(bad_email, Err(ServiceError::Validation(_))));

    let blank_name = users.register(&RegisterRequest {
        email: "someone@example.com".to_string(),
        full_name: "   ".to_string(),
        external_uid: "uid-1".to_string(),
    });
    assert!(matches!(blank_name, Err(ServiceError::Validation(_))));

    fx.register("reader");
    let duplicate = users.register(&RegisterRequest {
        email: "READER@example.com".to_string(),
        full_name: "Other".to_string(),
        external_uid: "uid-2".to_string(),
    });
    assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));
}

#[test]
fn new_accounts_start_as_newbies_with_zero_points() {
    let fx = Fixture::new();
    let actor = fx.register("reader");

    let me = fx.users().me(&actor).unwrap();
    assert_eq!(me.points, 0);
    assert_eq!(me.level, Level::Newbie);
    assert!(!me.is_admin);
    assert!(!me.is_locked);
}

#[test]
fn login_rejects_unknown_and_locked_accounts() {
    let fx = Fixture::new();
    let admin = fx.admin();
    let reader = fx.register("reader");

    assert!(matches!(
        fx.users().login("ghost@example.com"),
        Err(ServiceError::Unauthorized(_))
    ));

    let session = fx.users().login("reader@example.com").unwrap();
    assert_eq!(session.user_id, reader.user_id);
    assert!(!session.is_admin);

    fx.users().set_locked(&admin, reader.user_id, true).unwrap();
    match fx.users().login("reader@example.com") {
        Err(ServiceError::Unauthorized(message)) => assert!(message.contains("locked")),
        other => panic!("expected locked account, got {other:?}"),
    }
    assert!(fx.users().resolve_actor("reader-uid").is_err());
}

#[test]
fn points_clamp_at_zero_and_levels_follow_thresholds() {
    let fx = Fixture::new();
    let admin = fx.admin();
    let reader = fx.register("reader");
    let users = fx.users();

    assert_eq!(
        users.add_points(&admin, reader.user_id, 499).unwrap(),
        (499, Level::Newbie)
    );
    assert_eq!(
        users.add_points(&admin, reader.user_id, 1).unwrap(),
        (500, Level::Scholar)
    );
    assert_eq!(
        users.add_points(&admin, reader.user_id, 500).unwrap(),
        (1000, Level::Master)
    );
    assert_eq!(
        users.add_points(&admin, reader.user_id, -5000).unwrap(),
        (0, Level::Newbie)
    );
    assert_eq!(users.me(&reader).unwrap().level, Level::Newbie);
}

#[test]
fn extreme_point_deltas_saturate_and_keep_the_account_readable() {
    let fx = Fixture::new();
    let admin = fx.admin();
    let reader = fx.register("reader");
    let users = fx.users();

    assert_eq!(
        users.add_points(&admin, reader.user_id, i64::MAX).unwrap(),
        (i64::MAX, Level::Master)
    );
    assert_eq!(
        users.add_points(&admin, reader.user_id, 10).unwrap(),
        (i64::MAX, Level::Master)
    );
    assert_eq!(users.me(&reader).unwrap().points, i64::MAX);
    assert_eq!(
        users.resolve_actor("reader-uid").unwrap().user_id,
        reader.user_id
    );

    assert_eq!(
        users.add_points(&admin, reader.user_id, i64::MIN).unwrap(),
        (0, Level::Newbie)
    );
    let stored = users.me(&reader).unwrap();
    assert_eq!((stored.points, stored.level), (0, Level::Newbie));

    assert!(matches!(
        users.add_points(&admin, 4242, 1),
        Err(ServiceError::NotFound { entity: "user", .. })
    ));
}

#[test]
fn admin_only_operations_reject_members() {
    let fx = Fixture::new();
    fx.admin();
    let reader = fx.register("reader");
    let other = fx.register("other");
    let users = fx.users();

    assert!(matches!(
        users.add_points(&reader, other.user_id, 10),
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        users.set_locked(&reader, other.user_id, true),
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(users.list_all(&reader), Err(ServiceError::Forbidden(_))));
    assert!(matches!(
        users.get(&reader, other.user_id),
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        users.delete(&reader, other.user_id),
        Err(ServiceError::Forbidden(_))
    ));
}

#[test]
fn admin_cannot_delete_self_but_can_delete_others() {
    let fx = Fixture::new();
    let admin = fx.admin();
    let reader = fx.register("reader");

    assert!(matches!(
        fx.users().delete(&admin, admin.user_id),
        Err(ServiceError::Validation(_))
    ));
    fx.users().delete(&admin, reader.user_id).unwrap();
    assert!(matches!(
        fx.users().get(&admin, reader.user_id),
        Err(ServiceError::NotFound { entity: "user", .. })
    ));
}

#[test]
fn deleting_a_user_who_owns_content_is_a_conflict() {
    let fx = Fixture::new();
    let admin = fx.admin();
    let math = fx.category(&admin, "Math");
    let reader = fx.register("reader");
    fx.upload(&reader, "Owned", math, 0);

    assert!(matches!(
        fx.users().delete(&admin, reader.user_id),
        Err(ServiceError::Conflict(_))
    ));
    assert_eq!(
        fx.users().get(&admin, reader.user_id).unwrap().email,
        "reader@example.com"
    );
    assert_eq!(fx.count("SELECT COUNT(*) FROM documents;"), 1);
}

#[test]
fn bootstrap_admin_only_works_once() {
    let fx = Fixture::new();
    fx.admin();
    let reader = fx.register("reader");
    assert!(matches!(
        fx.users().bootstrap_admin(reader.user_id),
        Err(ServiceError::Conflict(_))
    ));
}

#[test]
fn profile_patch_leaves_unset_fields_untouched() {
    let fx = Fixture::new();
    let reader = fx.register("reader");

    let updated = fx
        .users()
        .update_profile(
            &reader,
            reader.user_id,
            &UserProfilePatch {
                school: Some("Open University".to_string()),
                ..UserProfilePatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.school.as_deref(), Some("Open University"));
    assert_eq!(updated.full_name, "reader Tester");
    assert!(updated.avatar_url.is_none());
}

#[test]
fn ranking_orders_by_points_then_uploads() {
    let fx = Fixture::new();
    let admin = fx.admin();
    let math = fx.category(&admin, "Math");
    let alice = fx.register("alice");
    let bob = fx.register("bob");

    // Both end at 20 points; bob earns his through two uploads.
    fx.users().add_points(&admin, alice.user_id, 20).unwrap();
    fx.upload(&bob, "Bob One", math, 0);
    fx.upload(&bob, "Bob Two", math, 0);

    let ranking = fx.users().ranking(10).unwrap();
    assert_eq!(ranking[0].user_id, bob.user_id);
    assert_eq!(ranking[0].documents_uploaded, 2);
    assert_eq!(ranking[1].user_id, alice.user_id);
    assert_eq!(ranking[1].points, 20);

    let uploads = fx.users().ranking_by(RankingMetric::Uploads, 1).unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].user_id, bob.user_id);
    assert_eq!(uploads[0].value, 2);
    assert_eq!(uploads[0].value_description, "documents uploaded");

    // Metric rankings break ties by id only.
    let top = fx.users().top_points_user().unwrap().unwrap();
    assert_eq!(top.user_id, alice.user_id);
    assert_eq!(top.email, "alice@example.com");
}
