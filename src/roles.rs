//! Account roles and the profile each role gets.
//!
//! Roles are stored as integer codes in the `users` table and parsed into
//! [`Role`] as soon as they leave the database. Everything downstream matches
//! on the enum or goes through [`RenderProfile`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Vendor,
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownRole(pub i64);

impl std::fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown role code {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl Role {
    pub fn code(self) -> i64 {
        match self {
            Role::Admin => 0,
            Role::User => 1,
            Role::Vendor => 2,
        }
    }

    pub fn from_code(code: i64) -> Result<Role, UnknownRole> {
        match code {
            0 => Ok(Role::Admin),
            1 => Ok(Role::User),
            2 => Ok(Role::Vendor),
            other => Err(UnknownRole(other)),
        }
    }

    pub fn can_post_events(self) -> bool {
        matches!(self, Role::Admin | Role::Vendor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    LikeAndSave,
    ManagePosts,
    ManageUsers,
    PostEvents,
    ListShop,
}

/// What a client shows for a profile screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileView {
    pub title: String,
    pub username: String,
    pub capabilities: Vec<Capability>,
}

pub trait RenderProfile {
    fn render_profile(&self) -> ProfileView;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorProfile {
    pub username: String,
    pub shop_description: Option<String>,
    pub shop_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub bio: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Profile {
    Admin(AdminProfile),
    Vendor(VendorProfile),
    User(UserProfile),
}

impl Profile {
    pub fn new(role: Role, username: String, bio: Option<String>, image: Option<String>) -> Self {
        match role {
            Role::Admin => Profile::Admin(AdminProfile { username }),
            Role::Vendor => Profile::Vendor(VendorProfile {
                username,
                shop_description: bio,
                shop_image: image,
            }),
            Role::User => Profile::User(UserProfile {
                username,
                bio,
                image,
            }),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Profile::Admin(_) => Role::Admin,
            Profile::Vendor(_) => Role::Vendor,
            Profile::User(_) => Role::User,
        }
    }
}

impl RenderProfile for AdminProfile {
    fn render_profile(&self) -> ProfileView {
        ProfileView {
            title: "Admin".to_owned(),
            username: self.username.clone(),
            capabilities: vec![
                Capability::ManagePosts,
                Capability::ManageUsers,
                Capability::PostEvents,
            ],
        }
    }
}

impl RenderProfile for VendorProfile {
    fn render_profile(&self) -> ProfileView {
        ProfileView {
            title: "Vendor".to_owned(),
            username: self.username.clone(),
            capabilities: vec![
                Capability::LikeAndSave,
                Capability::PostEvents,
                Capability::ListShop,
            ],
        }
    }
}

impl RenderProfile for UserProfile {
    fn render_profile(&self) -> ProfileView {
        ProfileView {
            title: "Member".to_owned(),
            username: self.username.clone(),
            capabilities: vec![Capability::LikeAndSave],
        }
    }
}

impl RenderProfile for Profile {
    fn render_profile(&self) -> ProfileView {
        match self {
            Profile::Admin(profile) => profile.render_profile(),
            Profile::Vendor(profile) => profile.render_profile(),
            Profile::User(profile) => profile.render_profile(),
        }
    }
}
