mod common;

use common::Fixture;
use docshare_core::model::category::CategoryPatch;
use docshare_core::model::follow::FollowTarget;
use docshare_core::repo::badge_repo::SqliteBadgeRepository;
use docshare_core::repo::notification_repo::SqliteNotificationRepository;
use docshare_core::repo::recommendation_repo::SqliteRecommendationRepository;
use docshare_core::{
    push_capped, BadgeService, CommentService, FollowService, LibraryService,
    NotificationService, PostService, RecommendationService, ServiceError,
};

#[test]
fn follow_rules() {
    let fx = Fixture::new();
    let admin = fx.admin();
    let math = fx.category(&admin, "Math");
    let alice = fx.register("alice");
    let bob = fx.register("bob");
    let follows = FollowService::new(&fx.conn);

    assert!(matches!(
        follows.follow(&alice, FollowTarget::from_parts(None, None)),
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        follows.follow(&alice, Some(FollowTarget::User(alice.user_id))),
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        follows.follow(&alice, Some(FollowTarget::User(999))),
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        follows.follow(&alice, Some(FollowTarget::Category(999))),
        Err(ServiceError::Validation(_))
    ));

    let edge = follows
        .follow(&alice, Some(FollowTarget::User(bob.user_id)))
        .unwrap();
    assert_eq!(edge.followed_user_id, Some(bob.user_id));
    assert_eq!(edge.category_id, None);
    assert!(matches!(
        follows.follow(&alice, Some(FollowTarget::User(bob.user_id))),
        Err(ServiceError::Conflict(_))
    ));

    let scoped = follows
        .follow(&alice, Some(FollowTarget::UserInCategory(bob.user_id, math)))
        .unwrap();
    assert_eq!(scoped.category_id, Some(math));

    assert_eq!(follows.list_following(&alice).unwrap().len(), 2);
    assert_eq!(follows.list_followers(&bob).unwrap().len(), 2);

    assert!(matches!(
        follows.unfollow(&bob, edge.id),
        Err(ServiceError::Forbidden(_))
    ));
    follows.unfollow(&alice, edge.id).unwrap();
    assert_eq!(follows.list_following(&alice).unwrap().len(), 1);
    assert!(matches!(
        follows.unfollow(&alice, edge.id),
        Err(ServiceError::NotFound { .. })
    ));
}

#[test]
fn only_the_recipient_marks_a_notification_read() {
    let fx = Fixture::new();
    let alice = fx.register("alice");
    let bob = fx.register("bob");
    let id = push_capped(&fx.conn, 100, alice.user_id, "hello", None).unwrap();
    let notifications = NotificationService::new(SqliteNotificationRepository::new(&fx.conn));

    assert!(matches!(
        notifications.mark_read(&bob, id),
        Err(ServiceError::Forbidden(_))
    ));
    assert!(!notifications.list(&alice).unwrap()[0].is_read);

    notifications.mark_read(&alice, id).unwrap();
    assert!(notifications.list(&alice).unwrap()[0].is_read);
    assert!(notifications.list(&bob).unwrap().is_empty());
}

#[test]
fn comments_validate_rating_and_award_commenter_badge() {
    let fx = Fixture::new();
    let admin = fx.admin();
    let math = fx.category(&admin, "Math");
    let author = fx.register("author");
    let reader = fx.register("reader");
    let document = fx.upload(&author, "Discussed", math, 0);
    let comments = CommentService::new(&fx.conn);
    let badges = BadgeService::new(SqliteBadgeRepository::new(&fx.conn));

    for rating in [-1, 6] {
        assert!(matches!(
            comments.create(&reader, document.id, "nice", rating),
            Err(ServiceError::Validation(_))
        ));
    }
    assert!(matches!(
        comments.create(&reader, document.id, "   ", 3),
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        comments.create(&reader, 4242, "nice", 3),
        Err(ServiceError::NotFound { entity: "document", .. })
    ));

    for round in 0..9 {
        comments
            .create(&reader, document.id, &format!("comment {round}"), round % 6)
            .unwrap();
    }
    assert!(badges.list_for_user(reader.user_id).unwrap().is_empty());

    let last = comments.create(&reader, document.id, "tenth", 5).unwrap();
    let earned = badges.list_for_user(reader.user_id).unwrap();
    assert_eq!(earned.len(), 1);
    assert_eq!(earned[0].badge.name, "Commenter");
    assert_eq!(fx.count("SELECT comment_count FROM users WHERE email = 'reader@example.com';"), 10);

    comments.create(&reader, document.id, "eleventh", 4).unwrap();
    assert_eq!(badges.list_for_user(reader.user_id).unwrap().len(), 1);

    let views = comments.list_by_document(document.id).unwrap();
    assert_eq!(views.len(), 11);
    assert_eq!(views[0].author_name, "reader Tester");

    assert!(matches!(
        comments.delete(&author, last.id),
        Err(ServiceError::Forbidden(_))
    ));
    comments.delete(&admin, last.id).unwrap();
    assert_eq!(comments.list_by_document(document.id).unwrap().len(), 10);
}

#[test]
fn categories_are_admin_managed_and_unique() {
    let fx = Fixture::new();
    let admin = fx.admin();
    let author = fx.register("author");
    let categories = fx.categories();

    assert!(matches!(
        categories.create(&author, "Math", None),
        Err(ServiceError::Forbidden(_))
    ));
    let math = categories.create(&admin, "Math", Some("Science")).unwrap();
    assert_eq!(math.kind.as_deref(), Some("Science"));
    assert!(matches!(
        categories.create(&admin, "Math", None),
        Err(ServiceError::Conflict(_))
    ));

    let physics = categories.create(&admin, "Physics", None).unwrap();
    assert!(matches!(
        categories.update(
            &admin,
            physics.id,
            &CategoryPatch {
                name: Some("Math".to_string()),
                kind: None,
            }
        ),
        Err(ServiceError::Conflict(_))
    ));
    let renamed = categories
        .update(
            &admin,
            physics.id,
            &CategoryPatch {
                name: Some("Applied Physics".to_string()),
                kind: None,
            },
        )
        .unwrap();
    assert_eq!(renamed.name, "Applied Physics");

    fx.upload(&author, "Algebra", math.id, 0);
    assert!(matches!(
        categories.delete(&admin, math.id),
        Err(ServiceError::Conflict(_))
    ));
    categories.delete(&admin, physics.id).unwrap();
    assert_eq!(categories.list().unwrap().len(), 1);
}

#[test]
fn library_entries_are_unique_per_document() {
    let fx = Fixture::new();
    let admin = fx.admin();
    let math = fx.category(&admin, "Math");
    let author = fx.register("author");
    let reader = fx.register("reader");
    let document = fx.upload(&author, "Keeper", math, 0);
    let library = LibraryService::new(&fx.conn);

    library.add_to_library(&reader, document.id).unwrap();
    assert!(matches!(
        library.add_to_library(&reader, document.id),
        Err(ServiceError::Conflict(_))
    ));
    assert!(matches!(
        library.add_to_library(&reader, 4242),
        Err(ServiceError::NotFound { .. })
    ));

    let entries = library.library(&reader).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].document.id, document.id);
    assert_eq!(library.uploads(&author).unwrap().len(), 1);
    assert!(library.downloads(&reader).unwrap().is_empty());

    library.remove_from_library(&reader, document.id).unwrap();
    assert!(library.library(&reader).unwrap().is_empty());
    assert!(matches!(
        library.remove_from_library(&reader, document.id),
        Err(ServiceError::NotFound { .. })
    ));
}

#[test]
fn posts_track_views_and_comments() {
    let fx = Fixture::new();
    let admin = fx.admin();
    let alice = fx.register("alice");
    let bob = fx.register("bob");
    let posts = PostService::new(&fx.conn);

    assert!(matches!(
        posts.create(&alice, "", "body"),
        Err(ServiceError::Validation(_))
    ));
    let post = posts.create(&alice, "Study group", "Who is in?").unwrap();
    assert_eq!(post.view_count, 0);

    posts.get(post.id).unwrap();
    let summary = posts.get(post.id).unwrap();
    assert_eq!(summary.post.view_count, 2);
    assert_eq!(summary.author_name, "alice Tester");

    let reply = posts.create_comment(&bob, post.id, "Me!").unwrap();
    posts.create_comment(&alice, post.id, "Great").unwrap();
    assert!(matches!(
        posts.create_comment(&bob, 4242, "lost"),
        Err(ServiceError::NotFound { .. })
    ));

    let listed = posts.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].comment_count, 2);
    let thread = posts.list_comments(post.id).unwrap();
    assert_eq!(thread[0].comment.content, "Me!");

    assert!(matches!(
        posts.delete_comment(&alice, reply.id),
        Err(ServiceError::Forbidden(_))
    ));
    posts.delete_comment(&bob, reply.id).unwrap();

    assert!(matches!(
        posts.delete(&bob, post.id),
        Err(ServiceError::Forbidden(_))
    ));
    posts.delete(&admin, post.id).unwrap();
    assert!(posts.list().unwrap().is_empty());
    assert_eq!(fx.count("SELECT COUNT(*) FROM post_comments;"), 0);
}

#[test]
fn recommendations_follow_interacted_categories() {
    let fx = Fixture::new();
    let admin = fx.admin();
    let math = fx.category(&admin, "Math");
    let physics = fx.category(&admin, "Physics");
    let author = fx.register("author");
    let reader = fx.register("reader");

    let seen = fx.approved_upload(&admin, &author, "Seen", math, 0);
    let fresh = fx.approved_upload(&admin, &author, "Fresh", math, 0);
    let locked = fx.approved_upload(&admin, &author, "Locked", math, 0);
    fx.documents().set_lock(&admin, locked.id, true).unwrap();
    fx.upload(&author, "Pending", math, 0);
    fx.approved_upload(&admin, &author, "Other Field", physics, 0);

    let recommendations =
        RecommendationService::new(SqliteRecommendationRepository::new(&fx.conn));
    assert!(recommendations.recommended(&reader).unwrap().is_empty());

    fx.documents().download(&reader, seen.id).unwrap();
    let suggested: Vec<i64> = recommendations
        .recommended(&reader)
        .unwrap()
        .iter()
        .map(|document| document.id)
        .collect();
    assert_eq!(suggested, vec![fresh.id]);
}
