use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::aggregate;
use crate::filter::{ResponseFilter, RoleSet};
use crate::models::ResponseRecord;
use crate::tier::{classify_by_period, Tier};

pub fn build_report(
    rows: &[ResponseRecord],
    filter: &ResponseFilter,
    roles: RoleSet,
    generated_at: DateTime<Utc>,
) -> String {
    let summaries = aggregate::period_summaries(rows, filter, roles);
    let series = aggregate::time_series(rows, filter, roles);
    let questions = aggregate::question_scores(rows, filter, roles);
    let buckets = aggregate::distribution(rows, filter, roles);
    let comparison = aggregate::comparison(rows, filter);
    let tiers = classify_by_period(rows, filter, roles);

    let mut output = String::new();

    let _ = writeln!(output, "# Leadership Pulse Report");
    let _ = writeln!(
        output,
        "Generated for {} from {} ratings on {}",
        filter.describe(),
        roles,
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Period Summary");

    if summaries.is_empty() {
        let _ = writeln!(output, "No responses recorded for this selection.");
    } else {
        let _ = writeln!(output, "| Period | Average | Leaders | Respondents | Responses |");
        let _ = writeln!(output, "|---|---|---|---|---|");
        for summary in &summaries {
            let _ = writeln!(
                output,
                "| {} | {:.2} | {} | {} | {} |",
                summary.period,
                summary.average_score,
                summary.leader_count,
                summary.respondent_count,
                summary.response_count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Trend");

    if series.is_empty() {
        let _ = writeln!(output, "No responses recorded for this selection.");
    } else {
        for point in &series {
            let _ = writeln!(output, "- {}: {:.2}", point.period, point.average_score);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Question Scores");

    if questions.is_empty() {
        let _ = writeln!(output, "No responses recorded for this selection.");
    } else {
        for question in &questions {
            let _ = writeln!(
                output,
                "- Q{} {}: {:.2}",
                question.question_no, question.question_text, question.average_score
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Score Distribution");
    for bucket in &buckets {
        let _ = writeln!(output, "- {}: {}", bucket.label, bucket.count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Self vs Manager vs Peers");

    if comparison.is_empty() {
        let _ = writeln!(output, "No responses recorded for this selection.");
    } else {
        let _ = writeln!(output, "| Question | Self | Manager | Peers |");
        let _ = writeln!(output, "|---|---|---|---|");
        for row in &comparison {
            let _ = writeln!(
                output,
                "| Q{} {} | {:.2} | {:.2} | {:.2} |",
                row.question_no, row.question_text, row.self_avg, row.manager_avg, row.peer_avg
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Leader Tiers");

    if tiers.is_empty() {
        let _ = writeln!(output, "No leaders rated for this selection.");
    }
    for (period, classification) in &tiers {
        let _ = writeln!(output);
        let _ = writeln!(output, "### {period}");
        for row in classification.summary() {
            let _ = writeln!(output, "- {}: {} ({})", row.label, row.count, row.percent);
        }
        for tier in Tier::ALL {
            for member in classification.members_of(tier) {
                let _ = writeln!(
                    output,
                    "  - [{}] {} ({}) {:.2}",
                    tier, member.target_name, member.target_id, member.average_score
                );
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EvaluationType;
    use chrono::TimeZone;

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 9, 30, 0).unwrap()
    }

    fn row(
        target_id: &str,
        respondent_id: &str,
        role: EvaluationType,
        value: Option<i32>,
    ) -> ResponseRecord {
        ResponseRecord {
            target_id: target_id.to_string(),
            target_name: "김민준".to_string(),
            respondent_id: respondent_id.to_string(),
            respondent_name: "Rater".to_string(),
            evaluation_type: role,
            survey_year: 2025,
            survey_quarter: 2,
            question_no: 1,
            question_text: "형식보다 내용(본질)에 집중한다".to_string(),
            response_value: value,
        }
    }

    #[test]
    fn empty_report_renders_every_section() {
        let report = build_report(&[], &ResponseFilter::all(), RoleSet::OTHERS, generated_at());
        assert!(report.contains("# Leadership Pulse Report"));
        assert!(report.contains("all periods, all leaders"));
        assert!(report.contains("manager+peer"));
        assert!(report.contains("2025-07-01 09:30 UTC"));
        assert!(report.contains("## Score Distribution"));
        assert!(report.contains("- 탁월(5점): 0"));
        assert!(report.contains("No leaders rated for this selection."));
    }

    #[test]
    fn report_lists_scores_and_tier_members() {
        let rows = vec![
            row("L001", "L001", EvaluationType::SelfReview, Some(3)),
            row("L001", "M001", EvaluationType::Manager, Some(5)),
            row("L001", "P001", EvaluationType::Peer, Some(4)),
        ];
        let filter = ResponseFilter::new(Some("2025-Q2".to_string()), Some("L001".to_string()));
        let report = build_report(&rows, &filter, RoleSet::OTHERS, generated_at());

        assert!(report.contains("- 2025-Q2: 4.50"));
        assert!(report.contains("| 2025-Q2 | 4.50 | 1 | 2 | 2 |"));
        assert!(report.contains("| 3.00 | 5.00 | 4.00 |"));
        assert!(report.contains("- 평균 4.5 이상: 1 (100.0%)"));
        assert!(report.contains("  - [top] 김민준 (L001) 4.50"));
    }
}
