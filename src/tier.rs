//! Performance tiers over per-leader averages.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::aggregate::leader_averages;
use crate::catalog::distinct_periods;
use crate::filter::{ResponseFilter, RoleSet};
use crate::models::{LeaderAverage, Period, ResponseRecord};
use crate::stats::percent_label;

/// Qualitative band for a leader's average score.
///
/// | Range             | Tier |
/// |-------------------|------|
/// | >= 4.5            | top  |
/// | >= 4.0 and < 4.5  | high |
/// | >= 3.0 and < 4.0  | mid  |
/// | < 3.0             | low  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Top,
    High,
    Mid,
    Low,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Top, Tier::High, Tier::Mid, Tier::Low];

    pub fn name(&self) -> &'static str {
        match self {
            Tier::Top => "top",
            Tier::High => "high",
            Tier::Mid => "mid",
            Tier::Low => "low",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Top => "평균 4.5 이상",
            Tier::High => "평균 4 이상",
            Tier::Mid => "평균 3 이상",
            Tier::Low => "평균 3 미만",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|tier| tier.name().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown tier `{value}`"))
    }
}

/// Assigns a tier to an average. NaN falls through to [`Tier::Low`].
pub fn classify(avg: f64) -> Tier {
    match avg {
        a if a >= 4.5 => Tier::Top,
        a if a >= 4.0 => Tier::High,
        a if a >= 3.0 => Tier::Mid,
        _ => Tier::Low,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierSummary {
    pub tier: Tier,
    #[serde(rename = "tierLabel")]
    pub label: &'static str,
    pub count: usize,
    pub percent: String,
}

/// Leaders partitioned into tiers, retaining each tier's members for drill-down.
#[derive(Debug, Clone, Default)]
pub struct TierClassification {
    top: Vec<LeaderAverage>,
    high: Vec<LeaderAverage>,
    mid: Vec<LeaderAverage>,
    low: Vec<LeaderAverage>,
}

impl TierClassification {
    pub fn from_leaders(leaders: &[LeaderAverage]) -> Self {
        let mut classification = Self::default();
        for leader in leaders {
            classification
                .bucket_mut(classify(leader.average_score))
                .push(leader.clone());
        }
        classification
    }

    fn bucket_mut(&mut self, tier: Tier) -> &mut Vec<LeaderAverage> {
        match tier {
            Tier::Top => &mut self.top,
            Tier::High => &mut self.high,
            Tier::Mid => &mut self.mid,
            Tier::Low => &mut self.low,
        }
    }

    /// Members of `tier`, in the order they were supplied.
    pub fn members_of(&self, tier: Tier) -> &[LeaderAverage] {
        match tier {
            Tier::Top => &self.top,
            Tier::High => &self.high,
            Tier::Mid => &self.mid,
            Tier::Low => &self.low,
        }
    }

    pub fn total(&self) -> usize {
        Tier::ALL.iter().map(|tier| self.members_of(*tier).len()).sum()
    }

    /// Count and share of every tier, in top-to-low order.
    pub fn summary(&self) -> Vec<TierSummary> {
        let total = self.total();
        Tier::ALL
            .into_iter()
            .map(|tier| {
                let count = self.members_of(tier).len();
                TierSummary {
                    tier,
                    label: tier.label(),
                    count,
                    percent: percent_label(count, total),
                }
            })
            .collect()
    }
}

/// Classifies leaders separately for each period that passes `filter`, oldest first.
pub fn classify_by_period(
    rows: &[ResponseRecord],
    filter: &ResponseFilter,
    roles: RoleSet,
) -> Vec<(Period, TierClassification)> {
    distinct_periods(rows)
        .into_iter()
        .map(|period| {
            let scoped = ResponseFilter::new(Some(period.to_string()), filter.target_id.clone());
            (period, scoped)
        })
        .filter(|(_, scoped)| filter.period.is_none() || filter.period == scoped.period)
        .map(|(period, scoped)| {
            let leaders = leader_averages(rows, &scoped, roles);
            (period, TierClassification::from_leaders(&leaders))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leader(id: &str, avg: f64) -> LeaderAverage {
        LeaderAverage {
            target_id: id.to_string(),
            target_name: format!("Leader {id}"),
            average_score: avg,
        }
    }

    #[test]
    fn classify_boundaries() {
        assert_eq!(classify(5.0), Tier::Top);
        assert_eq!(classify(4.5), Tier::Top);
        assert_eq!(classify(4.49), Tier::High);
        assert_eq!(classify(4.0), Tier::High);
        assert_eq!(classify(3.99), Tier::Mid);
        assert_eq!(classify(3.0), Tier::Mid);
        assert_eq!(classify(2.99), Tier::Low);
        assert_eq!(classify(0.0), Tier::Low);
        assert_eq!(classify(f64::NAN), Tier::Low);
    }

    #[test]
    fn one_leader_per_tier() {
        let leaders = vec![
            leader("a", 4.6),
            leader("b", 4.2),
            leader("c", 3.9),
            leader("d", 2.5),
        ];
        let classification = TierClassification::from_leaders(&leaders);
        let summary = classification.summary();

        assert_eq!(summary.len(), 4);
        for row in &summary {
            assert_eq!(row.count, 1);
            assert_eq!(row.percent, "25.0%");
        }
        assert_eq!(summary[0].tier, Tier::Top);
        assert_eq!(summary[3].tier, Tier::Low);
        assert_eq!(classification.members_of(Tier::Mid)[0].target_id, "c");
    }

    #[test]
    fn empty_input_reports_zero_everywhere() {
        let classification = TierClassification::from_leaders(&[]);
        assert_eq!(classification.total(), 0);
        for row in classification.summary() {
            assert_eq!(row.count, 0);
            assert_eq!(row.percent, "0%");
        }
    }

    #[test]
    fn tiers_partition_every_leader() {
        let leaders: Vec<LeaderAverage> = (0..=50)
            .map(|i| leader(&format!("l{i}"), i as f64 / 10.0))
            .collect();
        let classification = TierClassification::from_leaders(&leaders);
        let counted: usize = classification.summary().iter().map(|row| row.count).sum();
        assert_eq!(counted, leaders.len());
        assert_eq!(classification.members_of(Tier::Top).len(), 6);
        assert_eq!(classification.members_of(Tier::High).len(), 5);
        assert_eq!(classification.members_of(Tier::Mid).len(), 10);
        assert_eq!(classification.members_of(Tier::Low).len(), 30);
    }

    #[test]
    fn members_keep_input_order() {
        let leaders = vec![leader("x", 4.8), leader("y", 4.9), leader("z", 4.5)];
        let classification = TierClassification::from_leaders(&leaders);
        let ids: Vec<&str> = classification
            .members_of(Tier::Top)
            .iter()
            .map(|l| l.target_id.as_str())
            .collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[test]
    fn periods_are_classified_independently() {
        use crate::models::EvaluationType;

        let answer = |target: &str, quarter: i32, value: i32| ResponseRecord {
            target_id: target.to_string(),
            target_name: format!("Leader {target}"),
            respondent_id: "m".to_string(),
            respondent_name: "Manager".to_string(),
            evaluation_type: EvaluationType::Manager,
            survey_year: 2025,
            survey_quarter: quarter,
            question_no: 1,
            question_text: "Q1".to_string(),
            response_value: Some(value),
        };
        let rows = vec![answer("a", 1, 5), answer("b", 1, 2), answer("a", 2, 3)];

        let by_period = classify_by_period(&rows, &ResponseFilter::all(), RoleSet::OTHERS);
        assert_eq!(by_period.len(), 2);
        let (q1, first) = &by_period[0];
        assert_eq!(q1.to_string(), "2025-Q1");
        assert_eq!(first.members_of(Tier::Top)[0].target_id, "a");
        assert_eq!(first.members_of(Tier::Low)[0].target_id, "b");
        let (_, second) = &by_period[1];
        assert_eq!(second.total(), 1);
        assert_eq!(second.members_of(Tier::Mid)[0].target_id, "a");

        let only_q2 = ResponseFilter::new(Some("2025-Q2".to_string()), None);
        assert_eq!(classify_by_period(&rows, &only_q2, RoleSet::OTHERS).len(), 1);

        let nobody = ResponseFilter::new(Some("2025-Q2".to_string()), Some("X".to_string()));
        let empty = classify_by_period(&rows, &nobody, RoleSet::OTHERS);
        assert_eq!(empty.len(), 1);
        assert!(empty[0].1.summary().iter().all(|row| row.percent == "0%"));
    }

    #[test]
    fn tier_names_parse() {
        assert_eq!("top".parse::<Tier>(), Ok(Tier::Top));
        assert_eq!("LOW".parse::<Tier>(), Ok(Tier::Low));
        assert!("best".parse::<Tier>().is_err());
    }
}
