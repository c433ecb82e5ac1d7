//! Receiver profile photos.
//!
//! Whisper results addressed to a numeric user id show that user's profile
//! photo. The lookup itself belongs to the Bot API client, so the
//! dispatcher only sees it through [`PhotoSource`].

use std::fmt;

use async_trait::async_trait;

use crate::cache::UserId;

/// Looks up the profile photo of a user.
#[async_trait]
pub trait PhotoSource: Send + Sync + fmt::Debug {
    /// File id of the user's first profile photo, `None` when they have none.
    async fn profile_photo(&self, user_id: UserId) -> anyhow::Result<Option<String>>;
}

/// Source used when no Bot API client is configured: nobody has a photo.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPhotos;

#[async_trait]
impl PhotoSource for NoPhotos {
    async fn profile_photo(&self, _user_id: UserId) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}
