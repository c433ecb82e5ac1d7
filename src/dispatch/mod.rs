//! Update Dispatch
//!
//! Application handler run by the worker pool for each webhook update.

mod photos;
mod whisper;

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{CacheRegistry, ProfilePhotoCache, UserId};
use crate::error::HandlerError;
use crate::models::{Update, UpdateKind};
use crate::pool::Handler;

pub use photos::{NoPhotos, PhotoSource};
pub use whisper::{Receiver, WhisperDraft};

/// Cached result of parsing one inline query; `None` when the query is not
/// a valid whisper.
pub type InlineResult = Option<WhisperDraft>;

/// What the dispatcher did with an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Inline query answered from the sender's cache
    CacheHit(InlineResult),
    /// Inline query parsed and cached
    Computed(InlineResult),
    /// Empty inline query, nothing to prepare
    EmptyQuery,
    /// Message or callback acknowledged
    Acknowledged(UpdateKind),
}

impl Outcome {
    fn draft(&self) -> Option<&WhisperDraft> {
        match self {
            Outcome::CacheHit(result) | Outcome::Computed(result) => result.as_ref(),
            Outcome::EmptyQuery | Outcome::Acknowledged(_) => None,
        }
    }
}

// == Update Dispatcher ==
/// Routes updates by kind, deduplicating inline queries per sender and
/// resolving the profile photo of receivers addressed by id.
#[derive(Debug, Clone)]
pub struct UpdateDispatcher {
    inline_cache: CacheRegistry<InlineResult>,
    photos: ProfilePhotoCache,
    photo_source: Arc<dyn PhotoSource>,
}

impl UpdateDispatcher {
    pub fn new(
        inline_cache: CacheRegistry<InlineResult>,
        photos: ProfilePhotoCache,
        photo_source: Arc<dyn PhotoSource>,
    ) -> Self {
        Self {
            inline_cache,
            photos,
            photo_source,
        }
    }

    pub fn inline_cache(&self) -> &CacheRegistry<InlineResult> {
        &self.inline_cache
    }

    pub fn photos(&self) -> &ProfilePhotoCache {
        &self.photos
    }

    // == Dispatch ==
    /// Processes one update.
    ///
    /// Updates without a recognised payload are reported as failures.
    pub async fn dispatch(&self, update: Update) -> Result<Outcome, HandlerError> {
        match update.kind() {
            UpdateKind::InlineQuery => {
                let outcome = self.on_inline_query(&update);
                if let Some(Receiver::UserId(user_id)) = outcome.draft().map(|d| &d.receiver) {
                    self.receiver_photo(*user_id).await;
                }
                Ok(outcome)
            }
            kind @ (UpdateKind::Message | UpdateKind::CallbackQuery) => {
                info!(
                    update_id = update.update_id,
                    sender = ?update.sender_id(),
                    ?kind,
                    "Update acknowledged"
                );
                Ok(Outcome::Acknowledged(kind))
            }
            UpdateKind::Unknown => Err(HandlerError::Unsupported(update.update_id)),
        }
    }

    fn on_inline_query(&self, update: &Update) -> Outcome {
        let Some(query) = &update.inline_query else {
            return Outcome::EmptyQuery;
        };

        let text = query.query.trim();
        if text.is_empty() {
            return Outcome::EmptyQuery;
        }

        let identity = query.from.id.to_string();
        if let Some(cached) = self.inline_cache.get_cached_value(&identity, text) {
            debug!(sender = query.from.id, "Inline query served from cache");
            return Outcome::CacheHit(cached);
        }

        let result = WhisperDraft::parse(text);
        self.inline_cache.set_cached_value(&identity, text, result.clone());
        info!(
            update_id = update.update_id,
            sender = query.from.id,
            valid = result.is_some(),
            "Inline query prepared"
        );
        Outcome::Computed(result)
    }

    /// Warms the photo cache for a receiver addressed by id.
    async fn receiver_photo(&self, user_id: UserId) {
        let photo = self
            .photos
            .get_or_fetch(user_id, |id| self.photo_source.profile_photo(id))
            .await;
        debug!(user_id, found = photo.is_some(), "Receiver photo resolved");
    }
}

impl Handler<Update> for UpdateDispatcher {
    fn handle(&self, update: Update) -> impl Future<Output = Result<(), HandlerError>> + Send {
        async move { self.dispatch(update).await.map(|_| ()) }
    }
}
