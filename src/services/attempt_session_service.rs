use std::{collections::HashMap, sync::Arc};

use crate::{
    auth::require_owner,
    config::ExamPolicy,
    errors::{AppError, AppResult},
    models::{
        domain::{
            attempt::{Attempt, AttemptCompletion, AttemptMode, AttemptSession, SectionProgress, TimeMode},
            attempt_item::{AttemptItem, ItemAnswerUpdate},
            answer::UserAnswer,
            blueprint::Blueprint,
            question::{ContentStatus, Question},
            results::AttemptResults,
        },
        dto::response::{
            AttemptDetailResponse, AttemptListResponse, SectionEndResponse, SectionStartResponse,
        },
    },
    repositories::{AttemptRepository, BlueprintRepository, QuestionRepository, QuestionSetRepository},
    services::{
        grading_service::GradingService,
        results_service::{ResultGrouping, ResultsAggregator},
        section_clock::{self, Clock, SectionTimer},
    },
};

/// Owns the attempt state machine: creation, section timing, answer
/// submission and one-time finalization.
pub struct AttemptSessionService {
    attempts: Arc<dyn AttemptRepository>,
    questions: Arc<dyn QuestionRepository>,
    blueprints: Arc<dyn BlueprintRepository>,
    question_sets: Arc<dyn QuestionSetRepository>,
    clock: Arc<dyn Clock>,
    policy: ExamPolicy,
}

impl AttemptSessionService {
    pub fn new(
        attempts: Arc<dyn AttemptRepository>,
        questions: Arc<dyn QuestionRepository>,
        blueprints: Arc<dyn BlueprintRepository>,
        question_sets: Arc<dyn QuestionSetRepository>,
        clock: Arc<dyn Clock>,
        policy: ExamPolicy,
    ) -> Self {
        Self {
            attempts,
            questions,
            blueprints,
            question_sets,
            clock,
            policy,
        }
    }

    /// Create a tryout attempt with every section's questions drawn up front.
    /// Nothing is persisted unless every section can be filled.
    pub async fn create_tryout_session(&self, blueprint_id: &str, user_id: &str) -> AppResult<String> {
        let blueprint = self.load_blueprint(blueprint_id).await?;
        if !blueprint.is_active {
            return Err(AppError::NotFound(format!(
                "Blueprint with id '{}' is not active",
                blueprint_id
            )));
        }
        if blueprint.sections.is_empty() {
            return Err(AppError::InsufficientContent(format!(
                "Blueprint '{}' has no sections",
                blueprint_id
            )));
        }

        let attempt = Attempt::new_tryout(user_id, blueprint_id, self.clock.now());
        let mut items = Vec::new();

        for (index, section) in blueprint.sections.iter().enumerate() {
            let questions = self
                .questions
                .find_random(&section.subtest_id, ContentStatus::Published, section.question_count)
                .await?;

            if (questions.len() as u32) < section.question_count {
                log::warn!(
                    "Blueprint '{}' section {} ('{}') needs {} published questions, found {}",
                    blueprint_id,
                    index,
                    section.name,
                    section.question_count,
                    questions.len()
                );
                return Err(AppError::InsufficientContent(format!(
                    "Section '{}' needs {} published questions but only {} are available",
                    section.name,
                    section.question_count,
                    questions.len()
                )));
            }

            for question in questions.iter().take(section.question_count as usize) {
                let sort_order = items.len() as u32;
                items.push(AttemptItem::new(&attempt.id, question, sort_order, Some(index as u32)));
            }
        }

        if items.is_empty() {
            return Err(AppError::InsufficientContent(format!(
                "Blueprint '{}' does not ask for any questions",
                blueprint_id
            )));
        }

        let item_count = items.len();
        let attempt_id = attempt.id.clone();
        self.attempts.create_with_items(attempt, items).await?;

        log::info!(
            "Created tryout attempt '{}' for user '{}' from blueprint '{}' ({} items)",
            attempt_id,
            user_id,
            blueprint_id,
            item_count
        );
        Ok(attempt_id)
    }

    /// Create a practice attempt over a published question set, keeping the
    /// set's order.
    pub async fn create_practice_session(
        &self,
        question_set_id: &str,
        user_id: &str,
        time_mode: TimeMode,
    ) -> AppResult<String> {
        let set = self
            .question_sets
            .find_by_id(question_set_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Question set with id '{}' not found", question_set_id))
            })?;

        if set.status != ContentStatus::Published {
            return Err(AppError::NotFound(format!(
                "Question set with id '{}' is not published",
                question_set_id
            )));
        }

        let ordered_ids = set.ordered_question_ids();
        let found = self.questions.find_by_ids(&ordered_ids).await?;
        let published: HashMap<&str, &Question> = found
            .iter()
            .filter(|question| question.is_published())
            .map(|question| (question.id.as_str(), question))
            .collect();

        let selected: Vec<&Question> = ordered_ids
            .iter()
            .filter_map(|id| published.get(id.as_str()).copied())
            .collect();

        if selected.is_empty() {
            return Err(AppError::InsufficientContent(format!(
                "Question set '{}' has no published questions",
                question_set_id
            )));
        }

        let time_limit_seconds = match time_mode {
            TimeMode::Timed => Some(self.policy.practice_time_limit_seconds(selected.len())),
            TimeMode::Relaxed => None,
        };

        let attempt = Attempt::new_practice(
            user_id,
            question_set_id,
            time_mode,
            time_limit_seconds,
            self.clock.now(),
        );
        let items: Vec<AttemptItem> = selected
            .iter()
            .enumerate()
            .map(|(position, question)| AttemptItem::new(&attempt.id, question, position as u32, None))
            .collect();

        let item_count = items.len();
        let attempt_id = attempt.id.clone();
        self.attempts.create_with_items(attempt, items).await?;

        log::info!(
            "Created {:?} practice attempt '{}' for user '{}' from set '{}' ({} items)",
            time_mode,
            attempt_id,
            user_id,
            question_set_id,
            item_count
        );
        Ok(attempt_id)
    }

    /// Start the clock on the current section. Re-entering an already running
    /// section returns its original start time.
    pub async fn start_section(
        &self,
        attempt_id: &str,
        section_index: u32,
        user_id: &str,
    ) -> AppResult<SectionStartResponse> {
        let attempt = self.load_owned_attempt(attempt_id, user_id).await?;
        Self::ensure_in_progress(&attempt)?;
        let (blueprint_id, progress) = Self::tryout_progress(&attempt)?;
        let blueprint = self.load_blueprint(blueprint_id).await?;
        let section = blueprint.section(section_index).ok_or_else(|| {
            AppError::NotFound(format!(
                "Section {} does not exist in blueprint '{}'",
                section_index, blueprint_id
            ))
        })?;

        if let SectionProgress::Active { index, started_at } = progress {
            if index == section_index {
                log::debug!(
                    "Section {} of attempt '{}' already running since {}",
                    section_index,
                    attempt_id,
                    started_at
                );
                let timer = SectionTimer::at(started_at, section.duration_seconds, self.clock.now());
                return Ok(SectionStartResponse::from_timer(section_index, timer));
            }
        }

        Self::ensure_current_section(&progress, section_index, attempt_id)?;
        if progress.is_active() {
            return Err(AppError::SectionMismatch(format!(
                "Section {} of attempt '{}' is still active",
                progress.current_index(),
                attempt_id
            )));
        }

        let now = self.clock.now();
        let next = SectionProgress::Active {
            index: section_index,
            started_at: now,
        };

        if !self.attempts.update_progress(attempt_id, &progress, &next).await? {
            // Another request moved the attempt first; accept it if it started this section.
            let latest = self.load_attempt(attempt_id).await?;
            Self::ensure_in_progress(&latest)?;
            let (_, latest_progress) = Self::tryout_progress(&latest)?;
            return match latest_progress {
                SectionProgress::Active { index, started_at } if index == section_index => {
                    log::info!(
                        "Concurrent start of section {} on attempt '{}'; keeping earlier start",
                        section_index,
                        attempt_id
                    );
                    let timer = SectionTimer::at(started_at, section.duration_seconds, now);
                    Ok(SectionStartResponse::from_timer(section_index, timer))
                }
                other => Err(AppError::SectionMismatch(format!(
                    "Attempt '{}' is now at section {}",
                    attempt_id,
                    other.current_index()
                ))),
            };
        }

        log::info!(
            "Started section {} ('{}') of attempt '{}' at {}",
            section_index,
            section.name,
            attempt_id,
            now
        );
        let timer = SectionTimer::at(now, section.duration_seconds, now);
        Ok(SectionStartResponse::from_timer(section_index, timer))
    }

    /// Grade and store one answer. `context` is the mode of the endpoint the
    /// answer arrived on.
    pub async fn submit_answer(
        &self,
        attempt_id: &str,
        item_id: &str,
        answer: UserAnswer,
        time_spent_seconds: Option<i64>,
        user_id: &str,
        context: AttemptMode,
    ) -> AppResult<AttemptItem> {
        let attempt = self.load_owned_attempt(attempt_id, user_id).await?;
        if attempt.mode() != context {
            return Err(AppError::ModeMismatch(format!(
                "Attempt '{}' is a {} attempt, not {}",
                attempt_id,
                attempt.mode(),
                context
            )));
        }
        Self::ensure_in_progress(&attempt)?;

        let item = self
            .attempts
            .find_item(item_id)
            .await?
            .filter(|item| item.attempt_id == attempt_id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Item '{}' not found in attempt '{}'",
                    item_id, attempt_id
                ))
            })?;

        let now = self.clock.now();
        if let Some((blueprint_id, progress)) = attempt.tryout_progress() {
            self.guard_section_timing(&attempt, &item, blueprint_id, progress, now)
                .await?;
        }

        let question = self
            .questions
            .find_by_id(&item.question_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Question with id '{}' not found", item.question_id))
            })?;

        let outcome = GradingService::grade(&question.answer_key, &answer);
        let update = ItemAnswerUpdate {
            user_answer: answer,
            is_correct: outcome.is_correct,
            partial_score: outcome.partial_score,
            answered_at: now,
            time_spent_seconds: time_spent_seconds.map(|seconds| seconds.max(0)),
        };

        let updated = self.attempts.update_item_answer(&item.id, update).await?;
        log::debug!(
            "Recorded answer for item '{}' of attempt '{}' (correct: {:?})",
            item.id,
            attempt_id,
            updated.is_correct
        );
        Ok(updated)
    }

    /// Close the current section and advance. Completion itself happens in
    /// [`Self::finalize`].
    pub async fn end_section(
        &self,
        attempt_id: &str,
        section_index: u32,
        user_id: &str,
    ) -> AppResult<SectionEndResponse> {
        let attempt = self.load_owned_attempt(attempt_id, user_id).await?;
        Self::ensure_in_progress(&attempt)?;
        let (blueprint_id, progress) = Self::tryout_progress(&attempt)?;
        let blueprint = self.load_blueprint(blueprint_id).await?;
        let section_count = blueprint.section_count();

        if section_index >= section_count {
            return Err(AppError::NotFound(format!(
                "Section {} does not exist in blueprint '{}'",
                section_index, blueprint_id
            )));
        }

        if Self::already_advanced_past(&progress, section_index) {
            log::info!(
                "Section {} of attempt '{}' was already ended; ignoring duplicate end",
                section_index,
                attempt_id
            );
            return Ok(SectionEndResponse::after(section_index, section_count));
        }

        Self::ensure_current_section(&progress, section_index, attempt_id)?;

        let next = SectionProgress::Advancing {
            index: section_index + 1,
        };
        if !self.attempts.update_progress(attempt_id, &progress, &next).await? {
            let latest = self.load_attempt(attempt_id).await?;
            let latest_progress = Self::tryout_progress(&latest).map(|(_, p)| p)?;
            if !latest.is_completed() && Self::already_advanced_past(&latest_progress, section_index) {
                log::info!(
                    "Concurrent end of section {} on attempt '{}'; other request won",
                    section_index,
                    attempt_id
                );
                return Ok(SectionEndResponse::after(section_index, section_count));
            }
            Self::ensure_in_progress(&latest)?;
            return Err(AppError::SectionMismatch(format!(
                "Attempt '{}' is now at section {}",
                attempt_id,
                latest_progress.current_index()
            )));
        }

        let response = SectionEndResponse::after(section_index, section_count);
        log::info!(
            "Ended section {} of attempt '{}' (next: {:?}, awaiting finalize: {})",
            section_index,
            attempt_id,
            response.next_section_index,
            response.is_completed
        );
        Ok(response)
    }

    /// Compute and persist results once. Later calls return the stored results.
    pub async fn finalize(&self, attempt_id: &str, user_id: &str) -> AppResult<AttemptResults> {
        let attempt = self.load_owned_attempt(attempt_id, user_id).await?;

        if attempt.is_completed() {
            log::debug!("Attempt '{}' already finalized; returning stored results", attempt_id);
            return Self::stored_results(attempt);
        }

        let items = self.attempts.list_items(attempt_id).await?;
        let aggregator = ResultsAggregator::new(self.policy.cap_time_at_section_duration);

        let results = match &attempt.session {
            AttemptSession::Tryout {
                blueprint_id,
                progress,
            } => {
                let blueprint = self.load_blueprint(blueprint_id).await?;
                if progress.current_index() < blueprint.section_count() {
                    log::info!(
                        "Finalizing attempt '{}' before all sections ended (at section {})",
                        attempt_id,
                        progress.current_index()
                    );
                }
                aggregator.aggregate(&items, ResultGrouping::Sections(&blueprint.sections))
            }
            AttemptSession::Practice {
                time_limit_seconds, ..
            } => aggregator.aggregate(
                &items,
                ResultGrouping::Whole {
                    time_cap_seconds: *time_limit_seconds,
                },
            ),
        };

        let completion = AttemptCompletion {
            completed_at: self.clock.now(),
            total_time_seconds: results.total_time_seconds,
            results: results.clone(),
        };

        if self.attempts.complete(attempt_id, completion).await? {
            log::info!(
                "Finalized attempt '{}': {}/{} correct ({}%)",
                attempt_id,
                results.correct_count,
                results.total_questions,
                results.accuracy
            );
            return Ok(results);
        }

        // Lost a race with another finalize; serve what it stored.
        log::info!("Attempt '{}' was finalized concurrently", attempt_id);
        let latest = self.load_attempt(attempt_id).await?;
        Self::stored_results(latest)
    }

    /// Attempt state for reloading clients, with the server's timer view.
    pub async fn get_attempt(&self, attempt_id: &str, user_id: &str) -> AppResult<AttemptDetailResponse> {
        let attempt = self.load_owned_attempt(attempt_id, user_id).await?;
        let items = self.attempts.list_items(attempt_id).await?;
        let now = self.clock.now();

        let timer = if attempt.is_completed() {
            None
        } else {
            match &attempt.session {
                AttemptSession::Tryout {
                    blueprint_id,
                    progress: SectionProgress::Active { index, started_at },
                } => {
                    let blueprint = self.load_blueprint(blueprint_id).await?;
                    blueprint
                        .section(*index)
                        .map(|section| SectionTimer::at(*started_at, section.duration_seconds, now))
                }
                AttemptSession::Practice {
                    time_limit_seconds: Some(limit),
                    ..
                } => Some(SectionTimer::at(attempt.started_at, *limit, now)),
                _ => None,
            }
        };

        Ok(AttemptDetailResponse {
            attempt,
            items,
            timer,
        })
    }

    pub async fn list_attempts(&self, user_id: &str, offset: i64, limit: i64) -> AppResult<AttemptListResponse> {
        let (attempts, total) = self.attempts.find_by_user(user_id, offset, limit).await?;
        Ok(AttemptListResponse {
            attempts,
            total,
            offset,
            limit,
        })
    }

    async fn guard_section_timing(
        &self,
        attempt: &Attempt,
        item: &AttemptItem,
        blueprint_id: &str,
        progress: SectionProgress,
        now: chrono::DateTime<chrono::Utc>,
    ) -> AppResult<()> {
        let section_index = item.section_index.ok_or_else(|| {
            AppError::InternalError(format!("Tryout item '{}' has no section index", item.id))
        })?;

        if section_index != progress.current_index() {
            return Err(AppError::SectionMismatch(format!(
                "Item '{}' belongs to section {} but attempt '{}' is at section {}",
                item.id,
                section_index,
                attempt.id,
                progress.current_index()
            )));
        }

        let started_at = progress.started_at().ok_or_else(|| {
            AppError::SectionNotStarted(format!(
                "Section {} of attempt '{}' has not been started",
                section_index, attempt.id
            ))
        })?;

        let blueprint = self.load_blueprint(blueprint_id).await?;
        let section = blueprint.section(section_index).ok_or_else(|| {
            AppError::NotFound(format!(
                "Section {} does not exist in blueprint '{}'",
                section_index, blueprint_id
            ))
        })?;

        if section_clock::is_expired(started_at, section.duration_seconds, now) {
            log::warn!(
                "Rejected late answer for item '{}' on attempt '{}': section {} expired",
                item.id,
                attempt.id,
                section_index
            );
            return Err(AppError::SectionExpired(format!(
                "Section {} of attempt '{}' has run out of time",
                section_index, attempt.id
            )));
        }

        Ok(())
    }

    async fn load_attempt(&self, attempt_id: &str) -> AppResult<Attempt> {
        self.attempts
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attempt with id '{}' not found", attempt_id)))
    }

    async fn load_owned_attempt(&self, attempt_id: &str, user_id: &str) -> AppResult<Attempt> {
        let attempt = self.load_attempt(attempt_id).await?;
        require_owner(user_id, &attempt.user_id)?;
        Ok(attempt)
    }

    async fn load_blueprint(&self, blueprint_id: &str) -> AppResult<Blueprint> {
        self.blueprints
            .find_with_sections(blueprint_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Blueprint with id '{}' not found", blueprint_id)))
    }

    fn ensure_in_progress(attempt: &Attempt) -> AppResult<()> {
        if attempt.is_completed() {
            return Err(AppError::AlreadyCompleted(format!(
                "Attempt '{}' is already completed",
                attempt.id
            )));
        }
        Ok(())
    }

    fn tryout_progress(attempt: &Attempt) -> AppResult<(&str, SectionProgress)> {
        attempt.tryout_progress().ok_or_else(|| {
            AppError::ModeMismatch(format!(
                "Attempt '{}' is a {} attempt; sections only exist in tryouts",
                attempt.id,
                attempt.mode()
            ))
        })
    }

    fn ensure_current_section(progress: &SectionProgress, section_index: u32, attempt_id: &str) -> AppResult<()> {
        if progress.current_index() != section_index {
            return Err(AppError::SectionMismatch(format!(
                "Attempt '{}' is at section {}, not {}",
                attempt_id,
                progress.current_index(),
                section_index
            )));
        }
        Ok(())
    }

    /// True when `section_index` was the most recently ended section, even if
    /// the next one has since been started.
    fn already_advanced_past(progress: &SectionProgress, section_index: u32) -> bool {
        progress.current_index() == section_index + 1
    }

    fn stored_results(attempt: Attempt) -> AppResult<AttemptResults> {
        attempt.results.ok_or_else(|| {
            AppError::InternalError(format!(
                "Attempt '{}' is completed but has no results",
                attempt.id
            ))
        })
    }
}
