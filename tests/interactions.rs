mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use atlsfw::client::{
    ApiClient, FeedCache, InteractionController, MembershipStore, MemoryCredentialStore,
    Notifier, SessionGuard, ToggleOutcome,
};
use atlsfw::interaction::InteractionKind;
use atlsfw::{get_random_free_port, DEACTIVATED_CODE};
use common::spawn_app;
use serde_json::Value;

#[tokio::test]
async fn like_increments_counter_and_records_membership() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let article = app.create_article(&admin, "Upcycled denim", &["denim"]).await;
    let (token, _) = app.register("ana").await;

    let response = app.toggle(&token, article, "like", 1, &[article]).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 1);

    let user = app.current_user(&token).await;
    assert_eq!(user["liked_articles"], serde_json::json!([article]));
    assert_eq!(user["saved_articles"], serde_json::json!([]));
    assert_eq!(app.article(article).await["like_count"], 1);
}

#[tokio::test]
async fn like_then_unlike_restores_counter() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let article = app.create_article(&admin, "Thrift haul", &[]).await;
    let (token, _) = app.register("ben").await;

    app.toggle(&token, article, "like", 1, &[article]).await;
    let response = app.toggle(&token, article, "like", -1, &[]).await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 0);
    assert_eq!(app.current_user(&token).await["liked_articles"], serde_json::json!([]));
}

#[tokio::test]
async fn resending_the_same_set_changes_nothing() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let article = app.create_article(&admin, "Mending 101", &[]).await;
    let (token, _) = app.register("cy").await;

    for _ in 0..3 {
        let response = app.toggle(&token, article, "save", 1, &[article]).await;
        assert_eq!(response.status(), 200);
    }
    let saved = app.article(article).await;
    assert_eq!(saved["save_count"], 1);
    assert_eq!(
        app.current_user(&token).await["saved_articles"],
        serde_json::json!([article])
    );
}

#[tokio::test]
async fn counter_never_drops_below_zero() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let article = app.create_article(&admin, "Capsule wardrobe", &[]).await;
    let (token, _) = app.register("dee").await;

    let response = app.toggle(&token, article, "like", -1, &[]).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 0);
    assert_eq!(app.article(article).await["like_count"], 0);
}

#[tokio::test]
async fn articles_dropped_from_the_set_lose_their_count() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let first = app.create_article(&admin, "Linen care", &[]).await;
    let second = app.create_article(&admin, "Wool care", &[]).await;
    let (token, _) = app.register("ezra").await;

    app.toggle(&token, first, "like", 1, &[first]).await;
    // A second device that never saw the first like.
    let response = app.toggle(&token, second, "like", 1, &[second]).await;
    assert_eq!(response.status(), 200);

    assert_eq!(
        app.current_user(&token).await["liked_articles"],
        serde_json::json!([second])
    );
    assert_eq!(app.article(first).await["like_count"], 0);
    assert_eq!(app.article(second).await["like_count"], 1);
}

#[tokio::test]
async fn counter_tracks_several_users() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let article = app.create_article(&admin, "Swap meet recap", &[]).await;
    let (first, _) = app.register("eve").await;
    let (second, _) = app.register("fay").await;

    app.toggle(&first, article, "like", 1, &[article]).await;
    app.toggle(&second, article, "like", 1, &[article]).await;
    app.toggle(&first, article, "like", -1, &[]).await;
    assert_eq!(app.article(article).await["like_count"], 1);
}

#[tokio::test]
async fn signal_that_contradicts_the_set_is_rejected() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let article = app.create_article(&admin, "Natural dyes", &[]).await;
    let (token, _) = app.register("gus").await;

    let response = app.toggle(&token, article, "like", 1, &[]).await;
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(app.article(article).await["like_count"], 0);
}

#[tokio::test]
async fn malformed_toggles_are_rejected() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let article = app.create_article(&admin, "Repair cafe", &[]).await;
    let (token, _) = app.register("hal").await;

    let bad_signal = app.toggle(&token, article, "like", 2, &[article]).await;
    assert_eq!(bad_signal.status(), 422);

    let both = app
        .http
        .post(app.url(&format!("/posts/{article}?like=1&save=1")))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "liked_articles": [article], "saved_articles": [article] }))
        .send()
        .await
        .unwrap();
    assert_eq!(both.status(), 422);

    let wrong_body = app
        .http
        .post(app.url(&format!("/posts/{article}?like=1")))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "saved_articles": [article] }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_body.status(), 422);

    let not_a_number = app
        .http
        .post(app.url(&format!("/posts/{article}?like=abc")))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "liked_articles": [article] }))
        .send()
        .await
        .unwrap();
    assert_eq!(not_a_number.status(), 422);
    let body: Value = not_a_number.json().await.unwrap();
    assert_eq!(body["success"], false);

    let missing = app.toggle(&token, 9999, "like", 1, &[9999]).await;
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn unknown_ids_in_the_set_are_dropped() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let article = app.create_article(&admin, "Zero waste", &[]).await;
    let (token, _) = app.register("ida").await;

    app.toggle(&token, article, "like", 1, &[article, 4242, article])
        .await;
    assert_eq!(
        app.current_user(&token).await["liked_articles"],
        serde_json::json!([article])
    );
}

#[tokio::test]
async fn toggling_requires_a_token() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let article = app.create_article(&admin, "Slow fashion", &[]).await;

    let response = app
        .http
        .post(app.url(&format!("/posts/{article}?like=1")))
        .json(&serde_json::json!({ "liked_articles": [article] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let garbage = app.toggle("not-a-jwt", article, "like", 1, &[article]).await;
    assert_eq!(garbage.status(), 401);
}

#[tokio::test]
async fn deleting_an_article_prunes_every_membership_set() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let kept = app.create_article(&admin, "Keep me", &[]).await;
    let doomed = app.create_article(&admin, "Delete me", &[]).await;
    let (first, _) = app.register("jo").await;
    let (second, _) = app.register("kai").await;

    app.toggle(&first, doomed, "like", 1, &[doomed]).await;
    app.toggle(&first, kept, "like", 1, &[doomed, kept]).await;
    app.toggle(&second, doomed, "save", 1, &[doomed]).await;

    let response = app
        .http
        .delete(app.url(&format!("/posts/{doomed}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    assert_eq!(
        app.current_user(&first).await["liked_articles"],
        serde_json::json!([kept])
    );
    assert_eq!(
        app.current_user(&second).await["saved_articles"],
        serde_json::json!([])
    );
    let gone = app
        .http
        .get(app.url(&format!("/posts/{doomed}")))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), 404);
}

#[tokio::test]
async fn recount_matches_membership_cardinality() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let article = app.create_article(&admin, "Recount", &[]).await;
    let (token, _) = app.register("lee").await;
    app.toggle(&token, article, "like", 1, &[article]).await;

    sqlx::query("UPDATE articles SET like_count = 40 WHERE id = $1")
        .bind(article)
        .execute(&app.state.pool)
        .await
        .unwrap();

    let body: Value = app
        .http
        .post(app.url(&format!("/posts/{article}/recount")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["like_count"], 1);
    assert_eq!(body["save_count"], 0);

    let forbidden = app
        .http
        .post(app.url(&format!("/posts/{article}/recount")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);
}

#[tokio::test]
async fn deactivated_accounts_get_a_distinct_code() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let article = app.create_article(&admin, "Closet audit", &[]).await;
    let (token, user_id) = app.register("max").await;
    app.set_status(&admin, user_id, false).await;

    let response = app.toggle(&token, article, "like", 1, &[article]).await;
    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], DEACTIVATED_CODE);

    let login = app
        .http
        .post(app.url("/users/login"))
        .json(&serde_json::json!({ "user": { "email": "max@atlsfw.test", "password": "password123" }}))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status(), 403);
}

// ----------------- Client against a live server -----------------

#[derive(Default)]
struct CountingNotifier {
    alerts: AtomicUsize,
}

impl Notifier for CountingNotifier {
    fn alert(&self, _: &str, _: &str) {
        self.alerts.fetch_add(1, Ordering::SeqCst);
    }

    fn redirect_to_login(&self) {}
}

fn client(base_url: &str, notifier: Arc<CountingNotifier>) -> Arc<ApiClient> {
    let session = Arc::new(SessionGuard::new(
        Arc::new(MemoryCredentialStore::default()),
        notifier,
    ));
    Arc::new(ApiClient::with_feed_cache(
        base_url,
        session,
        FeedCache::new(Duration::from_secs(60)),
    ))
}

#[tokio::test]
async fn controller_commits_against_the_server() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let article = app.create_article(&admin, "Client like", &[]).await;
    app.register("nia").await;

    let api = client(&app.base_url, Arc::default());
    let user = api.login("nia@atlsfw.test", "password123").await.unwrap();
    let store = Arc::new(MembershipStore::from_user(&user));

    let like = InteractionController::new(article, InteractionKind::Like, 0, api.clone(), store.clone());
    assert_eq!(
        like.toggle().await,
        ToggleOutcome::Committed { marked: true, count: 1 }
    );
    assert!(store.contains(InteractionKind::Like, article));

    let refreshed = api.current_user().await.unwrap();
    assert_eq!(refreshed.liked_articles, vec![article]);

    assert_eq!(
        like.toggle().await,
        ToggleOutcome::Committed { marked: false, count: 0 }
    );
    assert_eq!(app.article(article).await["like_count"], 0);
}

#[tokio::test]
async fn concurrent_controllers_keep_both_likes() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let first = app.create_article(&admin, "Left", &[]).await;
    let second = app.create_article(&admin, "Right", &[]).await;
    app.register("pax").await;

    let api = client(&app.base_url, Arc::default());
    let user = api.login("pax@atlsfw.test", "password123").await.unwrap();
    let store = Arc::new(MembershipStore::from_user(&user));

    let like_first = InteractionController::new(first, InteractionKind::Like, 0, api.clone(), store.clone());
    let like_second = InteractionController::new(second, InteractionKind::Like, 0, api.clone(), store.clone());
    let (a, b) = tokio::join!(like_first.toggle(), like_second.toggle());
    assert_eq!(a, ToggleOutcome::Committed { marked: true, count: 1 });
    assert_eq!(b, ToggleOutcome::Committed { marked: true, count: 1 });

    let mut expected = vec![first, second];
    expected.sort_unstable();
    assert_eq!(api.current_user().await.unwrap().liked_articles, expected);
    assert_eq!(store.get(InteractionKind::Like).into_iter().collect::<Vec<_>>(), expected);
    assert_eq!(app.article(first).await["like_count"], 1);
    assert_eq!(app.article(second).await["like_count"], 1);
}

#[tokio::test]
async fn controller_rolls_back_when_the_server_is_down() {
    let (_, unused) = get_random_free_port().unwrap();
    let api = client(&format!("http://{unused}"), Arc::default());
    api.session().on_login("stale-token".to_owned());
    let store = Arc::new(MembershipStore::new());

    let like = InteractionController::new(1, InteractionKind::Like, 0, api, store.clone());
    assert_eq!(
        like.toggle().await,
        ToggleOutcome::RolledBack { marked: false, count: 0 }
    );
    assert!(!like.is_marked());
    assert_eq!(like.count(), 0);
    assert!(store.get(InteractionKind::Like).is_empty());
}

#[tokio::test]
async fn deactivation_logs_the_client_out_with_one_alert() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let first = app.create_article(&admin, "First", &[]).await;
    let second = app.create_article(&admin, "Second", &[]).await;
    let (_, user_id) = app.register("oli").await;

    let notifier = Arc::new(CountingNotifier::default());
    let api = client(&app.base_url, notifier.clone());
    let user = api.login("oli@atlsfw.test", "password123").await.unwrap();
    let store = Arc::new(MembershipStore::from_user(&user));
    app.set_status(&admin, user_id, false).await;

    let like_first = InteractionController::new(first, InteractionKind::Like, 0, api.clone(), store.clone());
    let like_second = InteractionController::new(second, InteractionKind::Like, 0, api.clone(), store.clone());
    let (a, b) = tokio::join!(like_first.toggle(), like_second.toggle());
    assert!(matches!(a, ToggleOutcome::RolledBack { .. }));
    assert!(matches!(b, ToggleOutcome::RolledBack { .. }));

    assert_eq!(notifier.alerts.load(Ordering::SeqCst), 1);
    assert_eq!(api.session().token(), None);
    assert_eq!(app.article(first).await["like_count"], 0);
}
