use std::sync::Arc;

use doppel_core::profile::PersonalityProfile;
use doppel_db::schema::StoredProfile;
use doppel_db::PersonaDB;

use super::pipeline::AnalysisOrchestrator;
use super::ProgressCallback;
use crate::error::{AiError, AiResult};

/// Connects the analysis pipeline to profile storage.
pub struct ProfileManager {
    db: Arc<dyn PersonaDB>,
    analyzer: AnalysisOrchestrator,
}

impl ProfileManager {
    pub fn new(db: Arc<dyn PersonaDB>, analyzer: AnalysisOrchestrator) -> Self {
        Self { db, analyzer }
    }

    /// Analyze every stored chunk and save the result as the new active version.
    ///
    /// Nothing is written unless the whole run succeeds, so on failure the
    /// previously active profile stays active.
    pub async fn create_from_documents(
        &self,
        progress: Option<&ProgressCallback>,
    ) -> AiResult<StoredProfile> {
        let texts = self.db.load_text_samples().await?;
        if texts.is_empty() {
            return Err(AiError::InsufficientData);
        }
        tracing::info!(chunks = texts.len(), "Creating profile from stored documents");

        let profile = self.analyzer.analyze(&texts, progress).await?;
        let stored = self.db.save_profile(profile).await?;
        tracing::info!(version = stored.version, "Profile created");
        Ok(stored)
    }

    pub async fn get_active_profile(&self) -> AiResult<PersonalityProfile> {
        Ok(self.db.get_active_profile().await?)
    }

    /// Save a manually edited profile as a new version without re-analysis.
    pub async fn update_profile(&self, mut profile: PersonalityProfile) -> AiResult<StoredProfile> {
        profile.recompute_confidence();
        let stored = self.db.save_profile(profile).await?;
        tracing::info!(version = stored.version, "Profile updated manually");
        Ok(stored)
    }

    /// Make an existing version the active one.
    pub async fn activate_version(&self, version: u32) -> AiResult<StoredProfile> {
        Ok(self.db.activate_profile(version).await?)
    }

    /// All versions, newest first, with the active one flagged.
    pub async fn list_versions(&self) -> AiResult<Vec<(StoredProfile, bool)>> {
        let active = self.db.active_version().await?;
        Ok(self
            .db
            .list_profiles()
            .await?
            .into_iter()
            .map(|p| {
                let is_active = Some(p.version) == active;
                (p, is_active)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doppel_core::testing::ScriptedBackend;
    use doppel_core::config::AnalysisConfig;
    use doppel_core::profile::Dimension;
    use doppel_db::mock::MockPersonaDB;
    use doppel_db::schema::TextChunk;

    fn script(essence: &str) -> Vec<String> {
        let mut replies: Vec<String> = Dimension::ALL
            .iter()
            .map(|_| "{\"confidence\": 0.7}".to_string())
            .collect();
        replies.push(format!("{{\"personality_essence\": \"{essence}\"}}"));
        replies
    }

    fn manager(db: Arc<MockPersonaDB>, replies: Vec<String>) -> ProfileManager {
        let backend = Arc::new(ScriptedBackend::new(replies));
        let analyzer = AnalysisOrchestrator::new(backend, &AnalysisConfig::default());
        ProfileManager::new(db, analyzer)
    }

    async fn seed(db: &MockPersonaDB) {
        db.add_chunk(TextChunk::new(
            "notes.md".into(),
            0,
            "I like shipping small things often.".into(),
            "notes".into(),
            "general".into(),
        ))
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn no_chunks_is_insufficient_data() {
        let db = Arc::new(MockPersonaDB::new());
        let err = manager(db.clone(), script("x"))
            .create_from_documents(None)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::InsufficientData));
        assert_eq!(db.profile_count(), 0);
    }

    #[tokio::test]
    async fn create_saves_active_version() {
        let db = Arc::new(MockPersonaDB::new());
        seed(&db).await;
        let stored = manager(db.clone(), script("First."))
            .create_from_documents(None)
            .await
            .unwrap();
        assert_eq!(stored.version, 1);

        let active = db.get_active_profile().await.unwrap();
        assert_eq!(active.personality_essence, "First.");
        assert_eq!(active.version, 1);
    }

    #[tokio::test]
    async fn failed_run_keeps_previous_active() {
        let db = Arc::new(MockPersonaDB::new());
        seed(&db).await;
        manager(db.clone(), script("First."))
            .create_from_documents(None)
            .await
            .unwrap();

        let mut broken = script("Second.");
        broken[1] = "oops".into();
        let err = manager(db.clone(), broken)
            .create_from_documents(None)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::MalformedExtraction { .. }));
        assert_eq!(db.profile_count(), 1);
        assert_eq!(db.get_active_profile().await.unwrap().personality_essence, "First.");
    }

    #[tokio::test]
    async fn manual_update_bumps_version_and_recomputes() {
        let db = Arc::new(MockPersonaDB::new());
        seed(&db).await;
        let mgr = manager(db.clone(), script("First."));
        mgr.create_from_documents(None).await.unwrap();

        let mut edited = mgr.get_active_profile().await.unwrap();
        edited.writing_style.confidence = 1.0;
        edited.overall_confidence = 0.0;
        let stored = mgr.update_profile(edited).await.unwrap();

        assert_eq!(stored.version, 2);
        let expected = (1.0 + 0.7 * 5.0) / 6.0;
        assert!((stored.profile.overall_confidence - expected).abs() < 1e-6);

        let versions = mgr.list_versions().await.unwrap();
        assert_eq!(versions.len(), 2);
        assert!(versions[0].1);
        assert!(!versions[1].1);
    }

    #[tokio::test]
    async fn missing_active_profile_maps_to_not_found() {
        let db = Arc::new(MockPersonaDB::new());
        let err = manager(db, vec![]).get_active_profile().await.unwrap_err();
        assert!(matches!(err, AiError::ProfileNotFound));
    }
}
