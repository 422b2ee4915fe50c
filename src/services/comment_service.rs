use mongodb::bson::doc;

use crate::database::{self, DocumentStore, COMMENTS};
use crate::models::{Comment, CommentResponse, CreateCommentRequest};
use crate::services::post_service;
use crate::services::token_service::Claims;
use crate::utils::{non_blank, parse_object_id, ApiError, ApiResult};

pub async fn add_comment(
    store: &dyn DocumentStore,
    author_id: &str,
    post_id: &str,
    request: &CreateCommentRequest,
) -> ApiResult<CommentResponse> {
    let content = non_blank(request.content.as_deref())
        .ok_or_else(|| ApiError::validation("Comment content is required"))?;
    let post = post_service::find_post(store, post_id).await?;
    let post_hex = post.id.map(|id| id.to_hex()).unwrap_or_default();

    let mut comment = Comment {
        id: None,
        post_id: post_hex,
        author_id: author_id.to_string(),
        content: content.to_string(),
        created_at: chrono::Utc::now().timestamp(),
    };
    let id = store.insert_one(COMMENTS, database::to_document(&comment)?).await?;
    comment.id = Some(id);

    log::info!("💬 Comment {} added to post {} by {}", id.to_hex(), comment.post_id, author_id);
    Ok(CommentResponse::from(comment))
}

/// Oldest first
pub async fn list_comments(store: &dyn DocumentStore, post_id: &str) -> ApiResult<Vec<CommentResponse>> {
    let post = post_service::find_post(store, post_id).await?;
    let post_hex = post.id.map(|id| id.to_hex()).unwrap_or_default();

    let mut comments =
        database::find_many_as::<Comment>(store, COMMENTS, doc! { "post_id": post_hex }).await?;
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(comments.into_iter().map(CommentResponse::from).collect())
}

/// Author or admin
pub async fn delete_comment(store: &dyn DocumentStore, caller: &Claims, comment_id: &str) -> ApiResult<()> {
    let id = parse_object_id(comment_id, "Comment")?;
    let comment = database::find_one_as::<Comment>(store, COMMENTS, doc! { "_id": id })
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    if comment.author_id != caller.sub && !caller.is_admin() {
        return Err(ApiError::forbidden("Only the author or an admin can delete this comment"));
    }
    if !store.delete_one(COMMENTS, doc! { "_id": id }).await? {
        return Err(ApiError::not_found("Comment not found"));
    }

    log::info!("🗑️ Comment {} deleted by {}", id.to_hex(), caller.sub);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::{CreatePostRequest, Role};

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

    async fn seed_post(store: &dyn DocumentStore) -> String {
        let request = CreatePostRequest {
            title: Some("hello".into()),
            content: Some("world".into()),
            category_id: None,
        };
        post_service::create_post(store, "alice", &request).await.unwrap().id
    }

    fn text(content: &str) -> CreateCommentRequest {
        CreateCommentRequest {
            content: Some(content.to_string()),
        }
    }

    #[tokio::test]
    async fn test_comment_lifecycle() {
        let store = MemoryStore::with_default_indexes();
        let post_id = seed_post(&store).await;

        let comment = add_comment(&store, "bob", &post_id, &text("nice post")).await.unwrap();
        assert_eq!(comment.post_id, post_id);

        let listed = list_comments(&store, &post_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].content, "nice post");

        let by_carol = delete_comment(&store, &claims("carol", Role::Viewer), &comment.id).await;
        assert!(matches!(by_carol, Err(ApiError::Forbidden(_))));

        delete_comment(&store, &claims("bob", Role::Viewer), &comment.id).await.unwrap();
        assert!(list_comments(&store, &post_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comment_on_missing_post_or_blank() {
        let store = MemoryStore::with_default_indexes();
        let ghost = mongodb::bson::oid::ObjectId::new().to_hex();
        assert!(matches!(add_comment(&store, "bob", &ghost, &text("hi")).await, Err(ApiError::NotFound(_))));

        let post_id = seed_post(&store).await;
        assert!(matches!(add_comment(&store, "bob", &post_id, &text(" ")).await, Err(ApiError::Validation(_))));
    }
}
