use serde::Deserialize;

use crate::db::models::{NewPost, Post, PostPublic, PostUpdate, User};
use crate::error::{AppError, AppResult};
use crate::pagination::{paginate, Page, DEFAULT_LIMIT};
use crate::store::Store;

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePost {
    pub title: String,
    pub content: String,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPosts {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub search: Option<String>,
}

/// A rating value known to lie in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score(i64);

impl Score {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 5;

    pub fn new(value: i64) -> AppResult<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(AppError::BadRequest(format!(
                "Rating must be between {} and {}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

const POST_NOT_FOUND: &str = "Post not found";

async fn load_public(store: &Store, id: i64) -> AppResult<PostPublic> {
    store
        .posts
        .get_public(id)
        .await?
        .ok_or(AppError::NotFound(POST_NOT_FOUND))
}

/// Fetch a post and make sure `user` owns it.
async fn owned_post(store: &Store, id: i64, user: &User) -> AppResult<Post> {
    let post = store
        .posts
        .get(id)
        .await?
        .ok_or(AppError::NotFound(POST_NOT_FOUND))?;
    if post.owner_id != user.id {
        tracing::warn!(
            "User {} tried to modify post {} owned by {}",
            user.id,
            post.id,
            post.owner_id
        );
        return Err(AppError::Forbidden);
    }
    Ok(post)
}

pub async fn create(store: &Store, owner: &User, req: CreatePost) -> AppResult<PostPublic> {
    let post = store
        .posts
        .insert(NewPost {
            title: req.title,
            content: req.content,
            published: req.published.unwrap_or(true),
            owner_id: owner.id,
        })
        .await?;
    tracing::info!("User {} created post {}", owner.id, post.id);
    load_public(store, post.id).await
}

/// Fetches every matching post and pages in memory.
pub async fn list(store: &Store, query: &ListPosts) -> AppResult<Page<PostPublic>> {
    let posts = store.posts.list_public(query.search.as_deref()).await?;
    Ok(paginate(
        posts,
        query.limit.unwrap_or(DEFAULT_LIMIT),
        query.offset.unwrap_or(0),
    ))
}

pub async fn get(store: &Store, id: i64) -> AppResult<PostPublic> {
    load_public(store, id).await
}

pub async fn update(
    store: &Store,
    id: i64,
    changes: &PostUpdate,
    user: &User,
) -> AppResult<PostPublic> {
    owned_post(store, id, user).await?;
    store
        .posts
        .update(id, changes)
        .await?
        .ok_or(AppError::NotFound(POST_NOT_FOUND))?;
    load_public(store, id).await
}

pub async fn delete(store: &Store, id: i64, user: &User) -> AppResult<()> {
    owned_post(store, id, user).await?;
    if !store.posts.delete(id).await? {
        return Err(AppError::NotFound(POST_NOT_FOUND));
    }
    tracing::info!("User {} deleted post {}", user.id, id);
    Ok(())
}

/// Rate a post. The post must exist before the score is looked at; a second
/// rating by the same user is rejected by the store as a conflict.
pub async fn rate(store: &Store, id: i64, rating: i64, user: &User) -> AppResult<PostPublic> {
    store
        .posts
        .get(id)
        .await?
        .ok_or(AppError::NotFound(POST_NOT_FOUND))?;
    let score = Score::new(rating)?;

    store.ratings.insert(user.id, id, score.get()).await?;
    load_public(store, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewUser;
    use crate::store::test_support::migrated_pool;

    async fn setup() -> (Store, User, User) {
        let store = Store::sqlite(migrated_pool());
        let mut users = Vec::new();
        for name in ["alice", "bob"] {
            let user = store
                .users
                .insert(NewUser {
                    username: name.into(),
                    email: format!("{name}@x.com"),
                    password_hash: "hash".into(),
                })
                .await
                .unwrap();
            users.push(user);
        }
        let bob = users.pop().unwrap();
        let alice = users.pop().unwrap();
        (store, alice, bob)
    }

    fn post(title: &str) -> CreatePost {
        CreatePost {
            title: title.into(),
            content: "content".into(),
            published: None,
        }
    }

    #[tokio::test]
    async fn create_defaults_to_published_and_sets_owner() {
        let (store, alice, _) = setup().await;
        let created = create(&store, &alice, post("hello")).await.unwrap();
        assert!(created.published);
        assert_eq!(created.owner.id, alice.id);
        assert_eq!(created.average_rating, 0.0);
    }

    #[tokio::test]
    async fn create_respects_explicit_unpublished() {
        let (store, alice, _) = setup().await;
        let mut req = post("draft");
        req.published = Some(false);
        assert!(!create(&store, &alice, req).await.unwrap().published);
    }

    #[tokio::test]
    async fn get_missing_post_is_not_found() {
        let (store, _, _) = setup().await;
        assert!(matches!(get(&store, 77).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn non_owner_update_is_forbidden_and_changes_nothing() {
        let (store, alice, bob) = setup().await;
        let created = create(&store, &alice, post("mine")).await.unwrap();

        let changes = PostUpdate {
            title: Some("stolen".into()),
            ..Default::default()
        };
        let err = update(&store, created.id, &changes, &bob).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        assert_eq!(get(&store, created.id).await.unwrap().title, "mine");
    }

    #[tokio::test]
    async fn owner_update_is_partial() {
        let (store, alice, _) = setup().await;
        let created = create(&store, &alice, post("before")).await.unwrap();

        let changes = PostUpdate {
            title: Some("after".into()),
            ..Default::default()
        };
        let updated = update(&store, created.id, &changes, &alice).await.unwrap();
        assert_eq!(updated.title, "after");
        assert_eq!(updated.content, "content");
        assert!(updated.published);
    }

    #[tokio::test]
    async fn update_missing_post_is_not_found() {
        let (store, alice, _) = setup().await;
        let err = update(&store, 5, &PostUpdate::default(), &alice)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn non_owner_delete_is_forbidden() {
        let (store, alice, bob) = setup().await;
        let created = create(&store, &alice, post("keep")).await.unwrap();

        assert!(matches!(
            delete(&store, created.id, &bob).await,
            Err(AppError::Forbidden)
        ));
        assert!(get(&store, created.id).await.is_ok());
    }

    #[tokio::test]
    async fn delete_cascades_to_ratings() {
        let (store, alice, bob) = setup().await;
        let created = create(&store, &alice, post("rated")).await.unwrap();
        rate(&store, created.id, 4, &bob).await.unwrap();

        delete(&store, created.id, &alice).await.unwrap();
        assert!(store.ratings.list_for_post(created.id).await.unwrap().is_empty());
        assert!(matches!(
            delete(&store, created.id, &alice).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn rating_updates_average() {
        let (store, alice, bob) = setup().await;
        let created = create(&store, &alice, post("rate me")).await.unwrap();

        let after_bob = rate(&store, created.id, 2, &bob).await.unwrap();
        assert_eq!(after_bob.average_rating, 2.0);
        let after_alice = rate(&store, created.id, 1, &alice).await.unwrap();
        assert_eq!(after_alice.average_rating, 1.5);
    }

    #[tokio::test]
    async fn out_of_range_rating_is_rejected_without_insert() {
        let (store, alice, bob) = setup().await;
        let created = create(&store, &alice, post("strict")).await.unwrap();

        for bad in [0, 6, -1] {
            let err = rate(&store, created.id, bad, &bob).await.unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)));
        }
        assert!(store.ratings.list_for_post(created.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rating_missing_post_is_not_found_even_with_bad_score() {
        let (store, _, bob) = setup().await;
        let err = rate(&store, 404, 9, &bob).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn rating_twice_is_conflict() {
        let (store, alice, bob) = setup().await;
        let created = create(&store, &alice, post("once")).await.unwrap();
        rate(&store, created.id, 5, &bob).await.unwrap();

        let err = rate(&store, created.id, 1, &bob).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(get(&store, created.id).await.unwrap().average_rating, 5.0);
    }

    #[tokio::test]
    async fn list_pages_and_searches() {
        let (store, alice, _) = setup().await;
        for i in 0..12 {
            let title = if i % 3 == 0 { format!("foo {i}") } else { format!("bar {i}") };
            create(&store, &alice, post(&title)).await.unwrap();
        }

        let first = list(&store, &ListPosts::default()).await.unwrap();
        assert_eq!(first.total, 12);
        assert_eq!(first.items.len(), DEFAULT_LIMIT);

        let rest = list(
            &store,
            &ListPosts {
                offset: Some(10),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(rest.items.len(), 2);

        let foos = list(
            &store,
            &ListPosts {
                search: Some("foo".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(foos.total, 4);
        assert!(foos.items.iter().all(|p| p.title.contains("foo")));
    }

    #[test]
    fn score_bounds() {
        assert!(Score::new(1).is_ok());
        assert!(Score::new(5).is_ok());
        assert!(Score::new(0).is_err());
        assert!(Score::new(6).is_err());
    }
}
