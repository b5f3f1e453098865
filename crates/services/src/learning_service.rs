use std::collections::HashSet;
use std::sync::Arc;

use names_core::model::{LearningMode, Name, NameNumber, UserId};
use rand::rng;
use rand::seq::SliceRandom;

use crate::catalog::NameCatalog;
use crate::error::LearningError;
use crate::progress_service::ProgressService;
use crate::settings_service::SettingsService;

/// Picks the names a user should study today.
#[derive(Clone)]
pub struct LearningService {
    catalog: Arc<dyn NameCatalog>,
    progress: ProgressService,
    settings: SettingsService,
}

impl LearningService {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn NameCatalog>,
        progress: ProgressService,
        settings: SettingsService,
    ) -> Self {
        Self {
            catalog,
            progress,
            settings,
        }
    }

    /// Up to `names_per_day` names the user has not learned yet.
    ///
    /// Sequential mode walks the catalog in order; random mode shuffles the
    /// unlearned names first. Empty once everything is learned.
    ///
    /// # Errors
    ///
    /// Returns `LearningError` on settings or progress storage failures.
    pub async fn todays_names(&self, user_id: UserId) -> Result<Vec<Name>, LearningError> {
        let settings = self.settings.get_or_create(user_id).await?;
        let learned: HashSet<NameNumber> = self
            .progress
            .list_progress(user_id)
            .await?
            .iter()
            .filter(|p| p.is_learned())
            .map(|p| p.number())
            .collect();

        let mut pending: Vec<Name> = self
            .catalog
            .all()
            .into_iter()
            .filter(|name| !learned.contains(&name.number))
            .collect();
        if settings.learning_mode() == LearningMode::Random {
            pending.shuffle(&mut rng());
        }

        let pace = usize::try_from(settings.names_per_day().value()).unwrap_or(usize::MAX);
        pending.truncate(pace);
        Ok(pending)
    }
}
