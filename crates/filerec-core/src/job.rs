//! Batch recommendation job
//!
//! One run walks the whole corpus: extract, tokenize, score keywords,
//! build items and profiles, recompute the similarity matrix, predict and
//! rank per user, then commit everything to the store in one snapshot.
//! The deadline and the interrupt flag are checked between units of work;
//! when either trips, the run stops before the commit and the previous
//! snapshot stays in place.

use crate::config::RecommenderConfig;
use crate::error::{RecError, Result};
use crate::extract::ContentExtractor;
use crate::group::GroupWeightLookup;
use crate::item::{Item, ItemId, Rater};
use crate::keywords::KeywordList;
use crate::predict::{RankedItem, Ranker, RatingPredictor};
use crate::profile::build_profiles;
use crate::rating::RatingSource;
use crate::similarity::{ItemToItemMatrix, SimilarityEngine};
use crate::source::FileSource;
use crate::store::{RecommendationStore, Snapshot};
use crate::text::tokenize_with;
use crate::tfidf::{TermBag, TfIdfEngine};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Group memberships keyed by user id
pub type Memberships = BTreeMap<String, Vec<String>>;

/// Summary of one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub files: usize,
    pub files_with_text: usize,
    /// Files whose reader overran the extraction timeout
    pub extractions_timed_out: usize,
    pub ratings: usize,
    pub ratings_skipped: usize,
    pub matrix_pairs: usize,
    pub recommendations: usize,
    /// Users that received a ranking, sorted
    pub users: Vec<String>,
}

/// Tracks the deadline and the interrupt flag for one run
struct Budget<'a> {
    started: Instant,
    deadline: Duration,
    interrupt: &'a AtomicBool,
}

impl Budget<'_> {
    fn check(&self) -> Result<()> {
        if self.interrupt.load(Ordering::SeqCst) {
            return Err(RecError::Interrupted);
        }
        let elapsed = self.started.elapsed();
        if elapsed >= self.deadline {
            return Err(RecError::DeadlineExceeded {
                elapsed_secs: elapsed.as_secs(),
            });
        }
        Ok(())
    }
}

/// Runs the full pipeline under one configuration
pub struct RecommendationJob<'a> {
    config: &'a RecommenderConfig,
    extractor: ContentExtractor,
    deadline: Duration,
    interrupt: Arc<AtomicBool>,
}

impl<'a> RecommendationJob<'a> {
    pub fn new(config: &'a RecommenderConfig) -> Self {
        RecommendationJob {
            config,
            extractor: ContentExtractor::new(config.extraction.clone()),
            deadline: config.job_deadline(),
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share an interrupt flag, e.g. one set by a signal handler
    pub fn with_interrupt(mut self, interrupt: Arc<AtomicBool>) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Whether the recompute interval has passed since the store's last run
    pub fn is_due<S: RecommendationStore + ?Sized>(&self, store: &S, now: DateTime<Utc>) -> Result<bool> {
        let Some(last) = store.last_computed()? else {
            return Ok(true);
        };
        let interval = chrono::Duration::from_std(self.config.effective_interval())
            .map_err(|e| RecError::invalid_value("recompute interval", e))?;
        Ok(now - last >= interval)
    }

    /// Compute a snapshot and commit it to `store`
    pub fn run<F, S>(
        &self,
        files: &[F],
        ratings: &dyn RatingSource,
        memberships: &Memberships,
        store: &mut S,
    ) -> Result<JobReport>
    where
        F: FileSource,
        S: RecommendationStore + ?Sized,
    {
        let begun = Instant::now();
        let (snapshot, mut report) = self.compute(files, ratings, memberships, &*store)?;

        let start = Instant::now();
        store.commit_snapshot(&snapshot)?;
        crate::trace_time!(start, "commit_snapshot");

        report.elapsed_ms = u64::try_from(begun.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            run_id = %report.run_id,
            users = report.users.len(),
            recommendations = report.recommendations,
            elapsed_ms = report.elapsed_ms,
            "Committed recommendation snapshot"
        );
        Ok(report)
    }

    /// Compute a snapshot without persisting it
    ///
    /// `groups` supplies the stored group-to-group weights used in ranking.
    pub fn compute<F, L>(
        &self,
        files: &[F],
        ratings: &dyn RatingSource,
        memberships: &Memberships,
        groups: &L,
    ) -> Result<(Snapshot, JobReport)>
    where
        F: FileSource,
        L: GroupWeightLookup + ?Sized,
    {
        let started_at = Utc::now();
        let run_id = ulid::Ulid::new().to_string();
        let span = tracing::info_span!("recommendation_job", run_id = %run_id);
        let _guard = span.enter();

        let budget = Budget {
            started: Instant::now(),
            deadline: self.deadline,
            interrupt: &self.interrupt,
        };
        let mut report = JobReport {
            run_id,
            started_at,
            files: files.len(),
            ..JobReport::default()
        };

        let bags = self.extract_terms(files, &budget, &mut report)?;
        budget.check()?;

        let item_keywords = self.score_keywords(&bags);
        let mut items = build_items(files, &item_keywords);
        self.attach_ratings(&mut items, ratings, &mut report)?;
        budget.check()?;

        let profiles = build_profiles(&items, self.config.rating_scale);
        let matrix = self.build_matrix(&items, &budget)?;
        report.matrix_pairs = matrix.len();
        budget.check()?;

        let item_groups = owner_groups(files, memberships);
        let recommendations =
            self.rank_all(&items, &matrix, &profiles, memberships, &item_groups, groups, &budget)?;
        budget.check()?;

        report.recommendations = recommendations.values().map(Vec::len).sum();
        report.users = recommendations.keys().cloned().collect();
        report.elapsed_ms = u64::try_from(budget.started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let snapshot = Snapshot {
            computed_at: started_at,
            matrix,
            item_keywords: item_keywords.into_iter().collect(),
            profiles,
            recommendations,
        };
        Ok((snapshot, report))
    }

    #[tracing::instrument(skip_all, fields(files = files.len()))]
    fn extract_terms<F: FileSource>(
        &self,
        files: &[F],
        budget: &Budget<'_>,
        report: &mut JobReport,
    ) -> Result<Vec<TermBag>> {
        let start = Instant::now();
        let timed_out_before = self.extractor.timed_out();
        let mut seen = HashSet::new();
        let mut bags = Vec::with_capacity(files.len());

        for file in files {
            budget.check()?;
            if !seen.insert(file.id()) {
                tracing::warn!(file_id = file.id(), path = %file.path().display(), "Duplicate file id; skipping");
                continue;
            }
            let text = self.extractor.extract_file(file);
            if !text.trim().is_empty() {
                report.files_with_text += 1;
            }
            let tokens = tokenize_with(&text, &self.config.tokenizer);
            bags.push(TermBag::from_tokens(file.id(), tokens));
        }

        report.extractions_timed_out = self.extractor.timed_out() - timed_out_before;
        tracing::info!(
            files = bags.len(),
            with_text = report.files_with_text,
            timed_out = report.extractions_timed_out,
            "Extracted file contents"
        );
        crate::trace_time!(start, "extract_terms");
        Ok(bags)
    }

    fn score_keywords(&self, bags: &[TermBag]) -> Vec<(ItemId, KeywordList)> {
        let start = Instant::now();
        let scored = TfIdfEngine::new().compute_all(bags);
        crate::trace_time!(start, "score_keywords", documents = bags.len());
        scored
    }

    fn attach_ratings(
        &self,
        items: &mut [Item],
        ratings: &dyn RatingSource,
        report: &mut JobReport,
    ) -> Result<()> {
        let index: HashMap<ItemId, usize> =
            items.iter().enumerate().map(|(i, item)| (item.id, i)).collect();

        for tuple in ratings.ratings()? {
            let Some(&position) = index.get(&tuple.item_id) else {
                tracing::debug!(item_id = tuple.item_id, user_id = %tuple.user_id, "Rating for unknown item");
                report.ratings_skipped += 1;
                continue;
            };
            match Rater::new(tuple.user_id.as_str(), tuple.rating, self.config.rating_scale) {
                Ok(rater) => {
                    items[position].add_rater(rater);
                    report.ratings += 1;
                }
                Err(e) => {
                    tracing::warn!(item_id = tuple.item_id, user_id = %tuple.user_id, error = %e, "Skipping rating");
                    report.ratings_skipped += 1;
                }
            }
        }

        tracing::info!(
            ratings = report.ratings,
            skipped = report.ratings_skipped,
            "Attached ratings"
        );
        Ok(())
    }

    fn build_matrix(&self, items: &[Item], budget: &Budget<'_>) -> Result<ItemToItemMatrix> {
        let engine = SimilarityEngine::new(self.config.similarity_algorithm);
        let check = || budget.check();
        if self.config.similarity_workers == 0 {
            return engine.build_matrix(items, check);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.similarity_workers)
            .build()
            .map_err(|e| RecError::FailedOperation {
                operation: "start similarity workers".to_string(),
                reason: e.to_string(),
            })?;
        pool.install(|| engine.build_matrix(items, check))
    }

    #[allow(clippy::too_many_arguments)]
    #[tracing::instrument(skip_all, fields(items = items.len()))]
    fn rank_all<L: GroupWeightLookup + ?Sized>(
        &self,
        items: &[Item],
        matrix: &ItemToItemMatrix,
        profiles: &BTreeMap<String, KeywordList>,
        memberships: &Memberships,
        item_groups: &HashMap<ItemId, Vec<String>>,
        groups: &L,
        budget: &Budget<'_>,
    ) -> Result<BTreeMap<String, Vec<RankedItem>>> {
        let predictor = RatingPredictor::new(
            self.config.recommendation_threshold,
            self.config.threshold_direction,
        )
        .skip_rated_items(self.config.skip_rated_items);
        let ranker = Ranker::new(
            self.config.hybrid_weights,
            self.config.rating_scale,
            self.config.max_recommendations,
            groups,
        );
        let no_groups = Vec::new();

        let mut results = BTreeMap::new();
        for user_id in profiles.keys() {
            budget.check()?;
            let recommendation = predictor.predict(items, matrix, user_id);
            let user_groups = memberships.get(user_id).unwrap_or(&no_groups);
            let ranked = ranker.rank(
                &recommendation,
                items,
                profiles.get(user_id),
                user_groups,
                item_groups,
            );
            results.insert(user_id.clone(), ranked);
        }

        tracing::info!(users = results.len(), "Ranked recommendations");
        Ok(results)
    }
}

/// One item per unique file, carrying its TF-IDF keywords
fn build_items<F: FileSource>(files: &[F], keywords: &[(ItemId, KeywordList)]) -> Vec<Item> {
    let names: HashMap<ItemId, String> = files.iter().map(|f| (f.id(), f.name())).collect();
    keywords
        .iter()
        .map(|(id, list)| {
            let name = names.get(id).cloned().unwrap_or_default();
            Item::new(*id, name).with_keywords(list.clone())
        })
        .collect()
}

/// Each item's owner groups, for group weighting
fn owner_groups<F: FileSource>(files: &[F], memberships: &Memberships) -> HashMap<ItemId, Vec<String>> {
    files
        .iter()
        .filter_map(|f| {
            memberships
                .get(f.owner_id())
                .map(|groups| (f.id(), groups.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests;
