use mongodb::bson::{doc, oid::ObjectId};

use crate::database::{self, DocumentStore, StoreError, USERS};
use crate::models::{
    LoginRequest, LoginResponse, ProfileUpdate, PublicProfile, RegisterRequest, RegisterResponse,
    Role, User, UserProfile,
};
use crate::services::credential_service::CredentialService;
use crate::services::token_service::TokenService;
use crate::utils::{non_blank, parse_object_id, ApiError, ApiResult};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfollowOutcome {
    Unfollowed,
    NotFollowing,
}

async fn hash_password(credentials: CredentialService, password: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || credentials.hash(&password))
        .await?
        .map_err(ApiError::Internal)
}

async fn load_user(store: &dyn DocumentStore, id: ObjectId) -> ApiResult<User> {
    database::find_one_as::<User>(store, USERS, doc! { "_id": id })
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// Looks up a user by hex id. Unparseable ids are reported as not found.
pub async fn find_user(store: &dyn DocumentStore, user_id: &str) -> ApiResult<User> {
    let id = parse_object_id(user_id, "User")?;
    load_user(store, id).await
}

/// Inserts a new user with a freshly hashed password.
pub async fn create_user(
    store: &dyn DocumentStore,
    credentials: &CredentialService,
    username: &str,
    password: &str,
    email: Option<String>,
    role: Role,
) -> ApiResult<ObjectId> {
    let exists = store
        .find_one(USERS, doc! { "username": username })
        .await?
        .is_some();
    if exists {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }

    let password_hash = hash_password(*credentials, password.to_string()).await?;

    let mut user = User::new(username.to_string(), email, password_hash);
    user.role = role;

    // The unique index still catches a concurrent registration of the same name
    match store.insert_one(USERS, database::to_document(&user)?).await {
        Ok(id) => Ok(id),
        Err(StoreError::DuplicateKey(_)) => Err(ApiError::Conflict("Username already exists".to_string())),
        Err(e) => Err(e.into()),
    }
}

pub async fn register(
    store: &dyn DocumentStore,
    credentials: &CredentialService,
    request: &RegisterRequest,
) -> ApiResult<RegisterResponse> {
    let username = non_blank(request.username.as_deref());
    let password = request
        .password
        .as_deref()
        .filter(|p| !p.trim().is_empty());

    let (Some(username), Some(password)) = (username, password) else {
        return Err(ApiError::validation("Username and password are required"));
    };

    let email = non_blank(request.email.as_deref()).map(String::from);
    let id = create_user(store, credentials, username, password, email, Role::Viewer).await?;

    log::info!("✅ User registered successfully: {} ({})", username, id.to_hex());

    Ok(RegisterResponse {
        success: true,
        message: "User registered successfully".to_string(),
        user_id: id.to_hex(),
    })
}

/// Unknown usernames and wrong passwords produce the same error.
pub async fn authenticate(
    store: &dyn DocumentStore,
    credentials: &CredentialService,
    tokens: &TokenService,
    request: &LoginRequest,
) -> ApiResult<LoginResponse> {
    let (Some(username), Some(password)) = (
        non_blank(request.username.as_deref()),
        request.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let user = database::find_one_as::<User>(store, USERS, doc! { "username": username }).await?;
    let credentials = *credentials;
    let password = password.to_string();

    let user = match user {
        Some(user) => {
            let stored_hash = user.password.clone();
            let valid =
                tokio::task::spawn_blocking(move || credentials.verify(&password, &stored_hash)).await?;
            if !valid {
                return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
            user
        }
        None => {
            tokio::task::spawn_blocking(move || credentials.burn(&password)).await?;
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
    };

    let token = tokens.issue(&user.id_hex(), user.role)?;

    Ok(LoginResponse {
        success: true,
        token,
        token_type: "Bearer".to_string(),
        expires_in: tokens.ttl_seconds(),
    })
}

pub async fn get_profile(store: &dyn DocumentStore, user_id: &str) -> ApiResult<UserProfile> {
    find_user(store, user_id).await.map(UserProfile::from)
}

pub async fn get_public_profile(store: &dyn DocumentStore, user_id: &str) -> ApiResult<PublicProfile> {
    find_user(store, user_id).await.map(PublicProfile::from)
}

pub async fn update_profile(
    store: &dyn DocumentStore,
    user_id: &str,
    update: &ProfileUpdate,
) -> ApiResult<UserProfile> {
    if update.is_empty() {
        return Err(ApiError::validation("No profile fields provided"));
    }
    if matches!(update.email.as_deref(), Some(email) if email.trim().is_empty()) {
        return Err(ApiError::validation("Email cannot be blank"));
    }

    let id = parse_object_id(user_id, "User")?;
    let matched = store
        .update_one(USERS, doc! { "_id": id }, update.to_set_document())
        .await?;
    if !matched {
        return Err(ApiError::not_found("User not found"));
    }

    load_user(store, id).await.map(UserProfile::from)
}

/// Adds `target_id` to the actor's following and the actor to the target's
/// followers. The two writes are not transactional.
pub async fn follow(store: &dyn DocumentStore, actor_id: &str, target_id: &str) -> ApiResult<FollowOutcome> {
    let actor_oid = parse_object_id(actor_id, "User")?;
    let target_oid = parse_object_id(target_id, "User")?;
    if actor_oid == target_oid {
        return Err(ApiError::validation("You cannot follow yourself"));
    }

    let actor = load_user(store, actor_oid).await?;
    load_user(store, target_oid).await?;

    let actor_hex = actor_oid.to_hex();
    let target_hex = target_oid.to_hex();

    if actor.is_following(&target_hex) {
        return Ok(FollowOutcome::AlreadyFollowing);
    }

    let updated = store
        .update_one(
            USERS,
            doc! { "_id": actor_oid },
            doc! { "$addToSet": { "following": target_hex.as_str() } },
        )
        .await?;
    if !updated {
        return Err(ApiError::not_found("User not found"));
    }

    let updated = store
        .update_one(
            USERS,
            doc! { "_id": target_oid },
            doc! { "$addToSet": { "followers": actor_hex.as_str() } },
        )
        .await?;
    if !updated {
        log::warn!("⚠️  {} followed {} but the target vanished before its followers were updated", actor_hex, target_hex);
        return Err(ApiError::not_found("User not found"));
    }

    log::info!("👥 {} now follows {}", actor_hex, target_hex);
    Ok(FollowOutcome::Followed)
}

pub async fn unfollow(store: &dyn DocumentStore, actor_id: &str, target_id: &str) -> ApiResult<UnfollowOutcome> {
    let actor_oid = parse_object_id(actor_id, "User")?;
    let target_oid = parse_object_id(target_id, "User")?;

    let actor = load_user(store, actor_oid).await?;
    load_user(store, target_oid).await?;

    let actor_hex = actor_oid.to_hex();
    let target_hex = target_oid.to_hex();

    if !actor.is_following(&target_hex) {
        return Ok(UnfollowOutcome::NotFollowing);
    }

    store
        .update_one(
            USERS,
            doc! { "_id": actor_oid },
            doc! { "$pull": { "following": target_hex.as_str() } },
        )
        .await?;
    store
        .update_one(
            USERS,
            doc! { "_id": target_oid },
            doc! { "$pull": { "followers": actor_hex.as_str() } },
        )
        .await?;

    log::info!("👥 {} unfollowed {}", actor_hex, target_hex);
    Ok(UnfollowOutcome::Unfollowed)
}

async fn resolve_profiles(store: &dyn DocumentStore, ids: &[String]) -> ApiResult<Vec<PublicProfile>> {
    let mut profiles = Vec::with_capacity(ids.len());
    for raw in ids {
        let Ok(id) = ObjectId::parse_str(raw) else {
            log::warn!("⚠️  Skipping malformed user id in relation: {}", raw);
            continue;
        };
        if let Some(user) = database::find_one_as::<User>(store, USERS, doc! { "_id": id }).await? {
            profiles.push(PublicProfile::from(user));
        }
    }
    profiles.sort_by(|a, b| a.username.cmp(&b.username));
    Ok(profiles)
}

pub async fn list_followers(store: &dyn DocumentStore, user_id: &str) -> ApiResult<Vec<PublicProfile>> {
    let user = find_user(store, user_id).await?;
    resolve_profiles(store, &user.followers).await
}

pub async fn list_following(store: &dyn DocumentStore, user_id: &str) -> ApiResult<Vec<PublicProfile>> {
    let user = find_user(store, user_id).await?;
    resolve_profiles(store, &user.following).await
}

pub async fn set_role(store: &dyn DocumentStore, user_id: &str, role: Role) -> ApiResult<UserProfile> {
    let id = parse_object_id(user_id, "User")?;
    let matched = store
        .update_one(USERS, doc! { "_id": id }, doc! { "$set": { "role": role.as_str() } })
        .await?;
    if !matched {
        return Err(ApiError::not_found("User not found"));
    }

    log::info!("🔑 Role of {} set to {}", id.to_hex(), role);
    load_user(store, id).await.map(UserProfile::from)
}
