//! Translation platform language initialisation
//!
//! Creating a language is slow and the platform gives no job handle, so the
//! creation call runs on its own task. Its error, if any, is picked up by the
//! next poll; otherwise the language is ready once it reports translation units.

use super::{job_branch, metadata};
use crate::adapters::terminology::{AuthoringStore, RefsetStore};
use crate::adapters::translation::TranslationPlatform;
use crate::core::jobs::Job;
use crate::core::monitor::ExternalOperation;
use crate::domain::{CodeSystem, ExecutionContext, JobStatus, Result, SimplexError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

pub const DISPLAY: &str = "Initialise translation language";

/// Branch metadata key prefix recording a refset's translation language
pub const TRANSLATION_LANGUAGE_KEY_PREFIX: &str = "translationLanguage.";

#[derive(Debug, Clone)]
pub struct LanguageInitRequest {
    pub refset_id: String,
    /// e.g. `fr`
    pub language_code: String,
    pub language_name: String,
}

type CreationErrors = Arc<Mutex<HashMap<String, String>>>;

pub struct LanguageInitOperation {
    refsets: Arc<dyn RefsetStore>,
    store: Arc<dyn AuthoringStore>,
    translation: Arc<dyn TranslationPlatform>,
    creation_errors: CreationErrors,
}

impl LanguageInitOperation {
    pub fn new(
        refsets: Arc<dyn RefsetStore>,
        store: Arc<dyn AuthoringStore>,
        translation: Arc<dyn TranslationPlatform>,
    ) -> Self {
        Self {
            refsets,
            store,
            translation,
            creation_errors: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn take_creation_error(&self, language: &str) -> Option<String> {
        self.creation_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(language)
    }
}

/// `<lang>-<refsetId>` split back into its parts
fn split_language(language: &str) -> Option<(&str, &str)> {
    language.split_once('-')
}

#[async_trait]
impl ExternalOperation for LanguageInitOperation {
    type Request = LanguageInitRequest;

    fn display(&self) -> &'static str {
        DISPLAY
    }

    fn function_name(&self) -> &'static str {
        "Weblate language initialization"
    }

    fn api_issue_message(&self) -> &'static str {
        "Translation platform API issue."
    }

    async fn start(
        &self,
        job: &Job,
        _code_system: &CodeSystem,
        request: &LanguageInitRequest,
        ctx: &ExecutionContext,
    ) -> Result<Option<String>> {
        let branch = job_branch(job)?;
        let found = self
            .refsets
            .existing_concept_ids(ctx, branch, std::slice::from_ref(&request.refset_id))
            .await?;
        if !found.contains(&request.refset_id) {
            return Err(SimplexError::user_content(format!(
                "Refset {} does not exist.",
                request.refset_id
            )));
        }

        let language = format!("{}-{}", request.language_code, request.refset_id);
        let translation = Arc::clone(&self.translation);
        let errors = Arc::clone(&self.creation_errors);
        let task_ctx = ctx.clone();
        let task_language = language.clone();
        let name = request.language_name.clone();

        tokio::spawn(async move {
            if let Err(e) = translation
                .initialise_language(&task_ctx, &task_language, &name)
                .await
            {
                tracing::warn!(language = %task_language, error = %e, "Language initialisation failed");
                errors
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(task_language, e.to_string());
            }
        });

        tracing::info!(
            language = %language,
            refset_id = %request.refset_id,
            job_id = %job.id(),
            "Started translation language initialisation"
        );
        Ok(Some(language))
    }

    async fn poll(&self, job: &Job, language: &str, ctx: &ExecutionContext) -> Result<bool> {
        if let Some(error) = self.take_creation_error(language) {
            job.finish(
                JobStatus::SystemError,
                format!("Failed to create language: {error}"),
            );
            return Ok(true);
        }

        let stats = self.translation.language_stats(ctx, language).await?;
        tracing::debug!(language, total = stats.total, "Language statistics");
        if stats.total == 0 {
            return Ok(false);
        }

        if let Some((language_code, refset_id)) = split_language(language) {
            let code_system = self.store.get_code_system(ctx, job.code_system()).await?;
            let key = format!("{TRANSLATION_LANGUAGE_KEY_PREFIX}{refset_id}");
            self.store
                .upsert_branch_metadata(
                    ctx,
                    &code_system.branch_path,
                    &metadata([(key.as_str(), language_code)]),
                )
                .await?;
        }

        tracing::info!(language, total = stats.total, job_id = %job.id(), "Translation language ready");
        job.transition_to(JobStatus::Complete);
        Ok(true)
    }
}
