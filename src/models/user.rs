use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Viewer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User document as stored in the `users` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub username: String,
    pub email: Option<String>,
    /// bcrypt hash, never returned by the API
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub profile_pic: String,
    /// Hex ids of users following this user
    #[serde(default)]
    pub followers: Vec<String>,
    /// Hex ids of users this user follows
    #[serde(default)]
    pub following: Vec<String>,
    /// Unix timestamp
    pub created_at: i64,
}

impl User {
    pub fn new(username: String, email: Option<String>, password_hash: String) -> Self {
        Self {
            id: None,
            username,
            email,
            password: password_hash,
            role: Role::Viewer,
            bio: String::new(),
            profile_pic: String::new(),
            followers: Vec::new(),
            following: Vec::new(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }

    pub fn is_following(&self, user_id: &str) -> bool {
        self.following.iter().any(|id| id == user_id)
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Fields a user may change on their own profile.
/// Anything else in the request body is rejected.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.bio.is_none() && self.profile_pic.is_none()
    }

    /// `$set` body containing only the provided fields
    pub fn to_set_document(&self) -> Document {
        let mut fields = Document::new();
        if let Some(email) = &self.email {
            fields.insert("email", email.trim());
        }
        if let Some(bio) = &self.bio {
            fields.insert("bio", bio.as_str());
        }
        if let Some(profile_pic) = &self.profile_pic {
            fields.insert("profile_pic", profile_pic.trim());
        }
        doc! { "$set": fields }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RoleUpdate {
    pub role: Role,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub user_id: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

/// The caller's own profile. Carries everything except the password hash.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub role: Role,
    pub bio: String,
    pub profile_pic: String,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub created_at: i64,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id_hex(),
            username: user.username,
            email: user.email,
            role: user.role,
            bio: user.bio,
            profile_pic: user.profile_pic,
            followers: user.followers,
            following: user.following,
            created_at: user.created_at,
        }
    }
}

/// What other users see
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PublicProfile {
    pub id: String,
    pub username: String,
    pub bio: String,
    pub profile_pic: String,
    pub followers_count: usize,
    pub following_count: usize,
    pub created_at: i64,
}

impl From<User> for PublicProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id_hex(),
            followers_count: user.followers.len(),
            following_count: user.following.len(),
            username: user.username,
            bio: user.bio,
            profile_pic: user.profile_pic,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_has_no_password_field() {
        let mut user = User::new("alice".into(), None, "$2b$04$hash".into());
        user.id = Some(ObjectId::new());

        let json = serde_json::to_value(UserProfile::from(user)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "viewer");
    }

    #[test]
    fn test_profile_update_rejects_unknown_fields() {
        let result = serde_json::from_str::<ProfileUpdate>(r#"{"bio": "hi", "role": "admin"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_profile_update_sets_only_provided_fields() {
        let update = ProfileUpdate {
            bio: Some("hello".into()),
            ..Default::default()
        };
        let set = update.to_set_document();
        let fields = set.get_document("$set").unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get_str("bio").unwrap(), "hello");
    }

    #[test]
    fn test_missing_role_defaults_to_viewer() {
        let stored = doc! {
            "_id": ObjectId::new(),
            "username": "legacy",
            "email": null,
            "password": "x",
            "created_at": 0_i64,
        };
        let user: User = mongodb::bson::from_document(stored).unwrap();
        assert_eq!(user.role, Role::Viewer);
        assert!(user.followers.is_empty());
    }
}
