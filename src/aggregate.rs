//! Grouping and averaging of raw responses into the dashboard views.
//!
//! Every function takes the full row set plus a [`ResponseFilter`] and returns a
//! freshly built view; the rows are only borrowed. Averages are plain arithmetic
//! means with no rounding, and an empty group averages to 0.0.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::filter::{ResponseFilter, RoleSet};
use crate::models::{
    ComparisonRow, DistributionBucket, EvaluationType, LeaderAverage, Period, PeriodSummary,
    QuestionScore, ResponseRecord, TimeSeriesPoint,
};
use crate::stats::{embedded_score, score_label, Average};

const KNOWN_SCORES: [i32; 5] = [1, 2, 3, 4, 5];

/// Filtered rows whose role is in `roles` and that carry an answer.
fn answered<'a>(
    rows: &'a [ResponseRecord],
    filter: &'a ResponseFilter,
    roles: RoleSet,
) -> impl Iterator<Item = (&'a ResponseRecord, i32)> + 'a {
    filter
        .apply(rows)
        .filter(move |row| roles.contains(row.evaluation_type))
        .filter_map(|row| row.response_value.map(|value| (row, value)))
}

/// Average score per period, oldest period first.
pub fn time_series(
    rows: &[ResponseRecord],
    filter: &ResponseFilter,
    roles: RoleSet,
) -> Vec<TimeSeriesPoint> {
    let mut by_period: BTreeMap<Period, Average> = BTreeMap::new();
    for (row, value) in answered(rows, filter, roles) {
        by_period.entry(row.period()).or_default().push(value);
    }

    by_period
        .into_iter()
        .map(|(period, avg)| TimeSeriesPoint {
            period,
            average_score: avg.value(),
        })
        .collect()
}

/// Average score per question, ordered by question number.
pub fn question_scores(
    rows: &[ResponseRecord],
    filter: &ResponseFilter,
    roles: RoleSet,
) -> Vec<QuestionScore> {
    let mut by_question: BTreeMap<(i32, &str), Average> = BTreeMap::new();
    for (row, value) in answered(rows, filter, roles) {
        by_question
            .entry((row.question_no, row.question_text.as_str()))
            .or_default()
            .push(value);
    }

    by_question
        .into_iter()
        .map(|((question_no, question_text), avg)| QuestionScore {
            question_no,
            question_text: question_text.to_string(),
            average_score: avg.value(),
        })
        .collect()
}

/// Histogram of answered values.
///
/// The five Likert buckets are always present, zero-filled when unused. Any other
/// observed value gets its own bucket with a fallback label. Buckets are ordered
/// by the number embedded in their label.
pub fn distribution(
    rows: &[ResponseRecord],
    filter: &ResponseFilter,
    roles: RoleSet,
) -> Vec<DistributionBucket> {
    let mut counts: HashMap<i32, usize> = KNOWN_SCORES.iter().map(|score| (*score, 0)).collect();
    for (_, value) in answered(rows, filter, roles) {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut buckets: Vec<DistributionBucket> = counts
        .into_iter()
        .map(|(score, count)| DistributionBucket {
            score,
            label: score_label(score),
            count,
        })
        .collect();
    buckets.sort_by_key(|bucket| (embedded_score(&bucket.label), bucket.score));
    buckets
}

#[derive(Default)]
struct RoleAverages {
    self_review: Average,
    manager: Average,
    peer: Average,
}

/// Self, manager and peer averages side by side for each question.
///
/// A self answer only counts when the respondent is the rated leader. Questions
/// appear when any filtered row mentions them, even if every answer is missing.
pub fn comparison(rows: &[ResponseRecord], filter: &ResponseFilter) -> Vec<ComparisonRow> {
    let mut by_question: BTreeMap<(i32, &str), RoleAverages> = BTreeMap::new();
    for row in filter.apply(rows) {
        let entry = by_question
            .entry((row.question_no, row.question_text.as_str()))
            .or_default();

        let Some(value) = row.response_value else {
            continue;
        };

        match row.evaluation_type {
            EvaluationType::SelfReview if row.is_self_assessment() => {
                entry.self_review.push(value)
            }
            EvaluationType::SelfReview => {}
            EvaluationType::Manager => entry.manager.push(value),
            EvaluationType::Peer => entry.peer.push(value),
        }
    }

    by_question
        .into_iter()
        .map(|((question_no, question_text), averages)| ComparisonRow {
            question_no,
            question_text: question_text.to_string(),
            self_avg: averages.self_review.value(),
            manager_avg: averages.manager.value(),
            peer_avg: averages.peer.value(),
        })
        .collect()
}

/// One average per rated leader, highest first.
///
/// Only leaders with at least one answered row in `roles` are listed.
pub fn leader_averages(
    rows: &[ResponseRecord],
    filter: &ResponseFilter,
    roles: RoleSet,
) -> Vec<LeaderAverage> {
    let mut by_target: HashMap<&str, (&str, Average)> = HashMap::new();
    for (row, value) in answered(rows, filter, roles) {
        by_target
            .entry(row.target_id.as_str())
            .or_insert_with(|| (row.target_name.as_str(), Average::default()))
            .1
            .push(value);
    }

    let mut leaders: Vec<LeaderAverage> = by_target
        .into_iter()
        .map(|(target_id, (target_name, avg))| LeaderAverage {
            target_id: target_id.to_string(),
            target_name: target_name.to_string(),
            average_score: avg.value(),
        })
        .collect();

    leaders.sort_by(|a, b| {
        b.average_score
            .partial_cmp(&a.average_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.target_name.cmp(&b.target_name))
            .then_with(|| a.target_id.cmp(&b.target_id))
    });
    leaders
}

#[derive(Default)]
struct PeriodTally<'a> {
    average: Average,
    leaders: BTreeSet<&'a str>,
    respondents: BTreeSet<&'a str>,
}

/// Headline figures per period: average score, leaders rated, distinct raters
/// and answered responses.
pub fn period_summaries(
    rows: &[ResponseRecord],
    filter: &ResponseFilter,
    roles: RoleSet,
) -> Vec<PeriodSummary> {
    let mut by_period: BTreeMap<Period, PeriodTally> = BTreeMap::new();
    for (row, value) in answered(rows, filter, roles) {
        let tally = by_period.entry(row.period()).or_default();
        tally.average.push(value);
        tally.leaders.insert(row.target_id.as_str());
        tally.respondents.insert(row.respondent_id.as_str());
    }

    by_period
        .into_iter()
        .map(|(period, tally)| PeriodSummary {
            period,
            average_score: tally.average.value(),
            leader_count: tally.leaders.len(),
            respondent_count: tally.respondents.len(),
            response_count: tally.average.count(),
        })
        .collect()
}
