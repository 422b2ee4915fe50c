use mongodb::bson::{doc, Document};

use crate::database::{self, DocumentStore, COMMENTS, POSTS};
use crate::models::{CreatePostRequest, Post, PostQuery, PostResponse, UpdatePostRequest};
use crate::services::category_service;
use crate::services::token_service::Claims;
use crate::utils::{non_blank, parse_object_id, ApiError, ApiResult};

pub async fn find_post(store: &dyn DocumentStore, post_id: &str) -> ApiResult<Post> {
    let id = parse_object_id(post_id, "Post")?;
    database::find_one_as::<Post>(store, POSTS, doc! { "_id": id })
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))
}

pub async fn create_post(
    store: &dyn DocumentStore,
    author_id: &str,
    request: &CreatePostRequest,
) -> ApiResult<PostResponse> {
    let (Some(title), Some(content)) = (
        non_blank(request.title.as_deref()),
        non_blank(request.content.as_deref()),
    ) else {
        return Err(ApiError::validation("Title and content are required"));
    };

    let category_id = non_blank(request.category_id.as_deref()).map(String::from);
    if let Some(category_id) = &category_id {
        category_service::ensure_exists(store, category_id).await?;
    }

    let now = chrono::Utc::now().timestamp();
    let mut post = Post {
        id: None,
        author_id: author_id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        category_id,
        created_at: now,
        updated_at: now,
    };
    let id = store.insert_one(POSTS, database::to_document(&post)?).await?;
    post.id = Some(id);

    log::info!("📝 Post {} created by {}", id.to_hex(), author_id);
    Ok(PostResponse::from(post))
}

/// Newest first
pub async fn list_posts(store: &dyn DocumentStore, query: &PostQuery) -> ApiResult<Vec<PostResponse>> {
    let mut filter = Document::new();
    if let Some(author_id) = non_blank(query.author_id.as_deref()) {
        filter.insert("author_id", author_id);
    }
    if let Some(category_id) = non_blank(query.category_id.as_deref()) {
        filter.insert("category_id", category_id);
    }

    let mut posts = database::find_many_as::<Post>(store, POSTS, filter).await?;
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(posts.into_iter().map(PostResponse::from).collect())
}

/// Only the author may edit a post.
pub async fn update_post(
    store: &dyn DocumentStore,
    caller: &Claims,
    post_id: &str,
    request: &UpdatePostRequest,
) -> ApiResult<PostResponse> {
    let post = find_post(store, post_id).await?;
    if post.author_id != caller.sub {
        return Err(ApiError::forbidden("Only the author can edit this post"));
    }

    let mut fields = Document::new();
    if let Some(title) = &request.title {
        let title = non_blank(Some(title.as_str())).ok_or_else(|| ApiError::validation("Title cannot be blank"))?;
        fields.insert("title", title);
    }
    if let Some(content) = &request.content {
        let content =
            non_blank(Some(content.as_str())).ok_or_else(|| ApiError::validation("Content cannot be blank"))?;
        fields.insert("content", content);
    }
    if let Some(category_id) = &request.category_id {
        category_service::ensure_exists(store, category_id).await?;
        fields.insert("category_id", category_id.as_str());
    }
    if fields.is_empty() {
        return Err(ApiError::validation("No post fields provided"));
    }
    fields.insert("updated_at", chrono::Utc::now().timestamp());

    let Some(id) = post.id else {
        return Err(ApiError::Internal("Stored post has no id".to_string()));
    };
    if !store.update_one(POSTS, doc! { "_id": id }, doc! { "$set": fields }).await? {
        return Err(ApiError::not_found("Post not found"));
    }

    find_post(store, post_id).await.map(PostResponse::from)
}

/// Author or admin. Comments on the post are removed with it.
pub async fn delete_post(store: &dyn DocumentStore, caller: &Claims, post_id: &str) -> ApiResult<()> {
    let post = find_post(store, post_id).await?;
    if post.author_id != caller.sub && !caller.is_admin() {
        return Err(ApiError::forbidden("Only the author or an admin can delete this post"));
    }

    let Some(id) = post.id else {
        return Err(ApiError::Internal("Stored post has no id".to_string()));
    };
    if !store.delete_one(POSTS, doc! { "_id": id }).await? {
        return Err(ApiError::not_found("Post not found"));
    }
    let removed = store
        .delete_many(COMMENTS, doc! { "post_id": id.to_hex() })
        .await?;

    log::info!("🗑️ Post {} deleted by {} ({} comments removed)", id.to_hex(), caller.sub, removed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::{CreateCategoryRequest, Role};

    fn claims(sub: &str, role: Role) -> Claims {
        Claims {
            sub: sub.to_string(),
            role,
            iat: 0,
            exp: i64::MAX,
            jti: "test".to_string(),
            iss: "blog-service".to_string(),
        }
    }

    fn new_post(title: &str) -> CreatePostRequest {
        CreatePostRequest {
            title: Some(title.to_string()),
            content: Some("body".to_string()),
            category_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_posts() {
        let store = MemoryStore::with_default_indexes();
        create_post(&store, "alice", &new_post("first")).await.unwrap();
        create_post(&store, "bob", &new_post("second")).await.unwrap();

        let all = list_posts(&store, &PostQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let by_alice = list_posts(
            &store,
            &PostQuery {
                author_id: Some("alice".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_alice.len(), 1);
        assert_eq!(by_alice[0].title, "first");
    }

    #[tokio::test]
    async fn test_post_requires_known_category() {
        let store = MemoryStore::with_default_indexes();
        let mut request = new_post("tagged");
        request.category_id = Some(mongodb::bson::oid::ObjectId::new().to_hex());
        assert!(matches!(create_post(&store, "alice", &request).await, Err(ApiError::Validation(_))));

        let category = category_service::create_category(
            &store,
            &CreateCategoryRequest {
                name: Some("rust".into()),
                description: None,
            },
        )
        .await
        .unwrap();
        request.category_id = Some(category.id.clone());
        let post = create_post(&store, "alice", &request).await.unwrap();
        assert_eq!(post.category_id, Some(category.id));
    }

    #[tokio::test]
    async fn test_only_author_can_edit() {
        let store = MemoryStore::with_default_indexes();
        let post = create_post(&store, "alice", &new_post("draft")).await.unwrap();
        let update = UpdatePostRequest {
            title: Some("final".into()),
            ..Default::default()
        };

        let by_bob = update_post(&store, &claims("bob", Role::Admin), &post.id, &update).await;
        assert!(matches!(by_bob, Err(ApiError::Forbidden(_))));

        let updated = update_post(&store, &claims("alice", Role::Viewer), &post.id, &update)
            .await
            .unwrap();
        assert_eq!(updated.title, "final");
        assert_eq!(updated.content, "body");
    }

    #[tokio::test]
    async fn test_delete_by_admin_removes_comments() {
        let store = MemoryStore::with_default_indexes();
        let post = create_post(&store, "alice", &new_post("doomed")).await.unwrap();
        store
            .insert_one(COMMENTS, doc! { "post_id": post.id.as_str(), "author_id": "bob", "content": "hi", "created_at": 0_i64 })
            .await
            .unwrap();

        let by_bob = delete_post(&store, &claims("bob", Role::Viewer), &post.id).await;
        assert!(matches!(by_bob, Err(ApiError::Forbidden(_))));

        delete_post(&store, &claims("carol", Role::Admin), &post.id).await.unwrap();
        assert!(matches!(find_post(&store, &post.id).await, Err(ApiError::NotFound(_))));
        assert!(store.find_many(COMMENTS, doc! {}).await.unwrap().is_empty());
    }
}
