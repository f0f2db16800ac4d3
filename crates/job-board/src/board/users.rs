use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::assets::{AssetStore, AssetUpload};
use super::domain::{ListInput, Profile, Role, User, UserId};
use super::error::BoardError;
use super::next_id;
use super::store::BoardStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRegistration {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: Role,
}

/// Profile changes; absent fields keep their stored value. The role is not editable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Option<ListInput>,
    #[serde(default)]
    pub experience: Option<ListInput>,
    #[serde(default)]
    pub education: Option<ListInput>,
    #[serde(default)]
    pub certifications: Option<ListInput>,
}

/// Which profile asset an upload was meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileAsset {
    Resume,
    Photo,
}

impl ProfileAsset {
    pub const fn label(self) -> &'static str {
        match self {
            ProfileAsset::Resume => "resume",
            ProfileAsset::Photo => "profile photo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadFailure {
    pub asset: ProfileAsset,
    pub reason: String,
}

/// Result of a profile update. Failed uploads do not abort the update; they are listed
/// here and summarized in `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdateOutcome {
    pub user: User,
    pub failed_uploads: Vec<UploadFailure>,
    pub message: String,
}

fn next_user_id() -> UserId {
    UserId(next_id("usr"))
}

/// Order-preserving de-duplication.
fn distinct(items: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(items.len());
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

pub struct UserDirectory<S, A> {
    store: Arc<S>,
    assets: Arc<A>,
}

impl<S, A> UserDirectory<S, A>
where
    S: BoardStore + 'static,
    A: AssetStore + 'static,
{
    pub fn new(store: Arc<S>, assets: Arc<A>) -> Self {
        Self { store, assets }
    }

    pub fn register(&self, registration: UserRegistration) -> Result<User, BoardError> {
        let full_name = registration.full_name.trim();
        if full_name.is_empty() {
            return Err(BoardError::missing("full_name"));
        }
        let email = registration.email.trim();
        if email.is_empty() {
            return Err(BoardError::missing("email"));
        }

        let user = User {
            id: next_user_id(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            phone: registration.phone,
            role: registration.role,
            profile: Profile::default(),
            created_at: Utc::now(),
        };

        self.store.transaction(|tx| {
            tx.insert_user(user.clone())?;
            Ok::<_, BoardError>(())
        })?;

        info!(user = %user.id, role = user.role.label(), "user registered");
        Ok(user)
    }

    pub fn get(&self, user_id: &UserId) -> Result<User, BoardError> {
        self.store.transaction(|tx| {
            tx.user(user_id)?
                .ok_or_else(|| BoardError::NotFound(format!("user {user_id}")))
        })
    }

    pub fn update_profile(
        &self,
        user_id: &UserId,
        update: ProfileUpdate,
        resume: Option<AssetUpload>,
        photo: Option<AssetUpload>,
    ) -> Result<ProfileUpdateOutcome, BoardError> {
        // resolve first so a missing user is reported before any upload is attempted
        self.get(user_id)?;

        let mut failed_uploads = Vec::new();
        let mut upload = |asset: ProfileAsset, file: Option<AssetUpload>| {
            let file = file?;
            let file_name = file.file_name.clone();
            match self.assets.upload(file) {
                Ok(url) => Some((url, file_name)),
                Err(error) => {
                    warn!(user = %user_id, asset = asset.label(), %error, "profile upload failed");
                    failed_uploads.push(UploadFailure {
                        asset,
                        reason: error.to_string(),
                    });
                    None
                }
            }
        };
        let resume = upload(ProfileAsset::Resume, resume);
        let photo = upload(ProfileAsset::Photo, photo);

        let user = self.store.transaction(|tx| {
            let mut user = tx
                .user(user_id)?
                .ok_or_else(|| BoardError::NotFound(format!("user {user_id}")))?;

            if let Some(full_name) = update.full_name.filter(|name| !name.trim().is_empty()) {
                user.full_name = full_name.trim().to_string();
            }
            if let Some(email) = update.email.filter(|email| !email.trim().is_empty()) {
                user.email = email.trim().to_string();
            }
            if let Some(phone) = update.phone {
                user.phone = Some(phone);
            }
            if let Some(bio) = update.bio {
                user.profile.bio = Some(bio);
            }
            if let Some(skills) = update.skills {
                user.profile.skills = distinct(skills.into_items());
            }
            if let Some(experience) = update.experience {
                user.profile.experience = experience.into_items();
            }
            if let Some(education) = update.education {
                user.profile.education = education.into_items();
            }
            if let Some(certifications) = update.certifications {
                user.profile.certifications = certifications.into_items();
            }
            if let Some((url, original_name)) = resume {
                user.profile.resume_url = Some(url);
                user.profile.resume_original_name = Some(original_name);
            }
            if let Some((url, _)) = photo {
                user.profile.photo_url = Some(url);
            }

            tx.save_user(user.clone())?;
            Ok::<_, BoardError>(user)
        })?;

        let message = if failed_uploads.is_empty() {
            "Profile updated successfully".to_string()
        } else {
            let failed: Vec<&str> = failed_uploads
                .iter()
                .map(|failure| failure.asset.label())
                .collect();
            format!(
                "Profile updated, but the {} upload failed",
                failed.join(" and ")
            )
        };

        info!(user = %user.id, failed_uploads = failed_uploads.len(), "profile updated");
        Ok(ProfileUpdateOutcome {
            user,
            failed_uploads,
            message,
        })
    }
}
