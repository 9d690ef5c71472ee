use anyhow::Context;
use sqlx::{PgExecutor, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{EvaluationType, ResponseRecord};

pub const QUESTIONS: [&str; 13] = [
    "업무지시할 때 목적, 기대하는 결과물, 방향성을 명확히 가이드한다",
    "형식보다 내용(본질)에 집중한다",
    "전사관점에서 의사결정한다",
    "공동목표를 위해 적극적으로 협업하고 실행한다",
    "조직의 비전과 목표를 수시로 커뮤니케이션하고 공유한다",
    "자유롭게 말할 수 있는 분위기를 조성하고 다양성을 존중한다",
    "객관적인 데이터에 기반해 최선의 선택을 한다",
    "구성원의 성장을 위해 구체적인 피드백을 제공한다",
    "어려운 문제를 회피하지 않고 책임감 있게 해결한다",
    "고객 관점에서 일의 우선순위를 정한다",
    "새로운 시도를 장려하고 실패에서 배우도록 돕는다",
    "약속한 일정과 결과를 끝까지 지킨다",
    "윤리와 원칙을 지키며 솔선수범한다",
];

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn insert_response<'e, E>(
    executor: E,
    row: &ResponseRecord,
    source_key: &str,
) -> anyhow::Result<u64>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO leadership_pulse.responses
        (id, target_id, target_name, respondent_id, respondent_name, evaluation_type,
         survey_year, survey_quarter, question_no, question_text, response_value, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&row.target_id)
    .bind(&row.target_name)
    .bind(&row.respondent_id)
    .bind(&row.respondent_name)
    .bind(row.evaluation_type.as_str())
    .bind(row.survey_year)
    .bind(row.survey_quarter)
    .bind(row.question_no)
    .bind(&row.question_text)
    .bind(row.response_value)
    .bind(source_key)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

fn seed_value(base: i32, question_no: i32, rater: i32, quarter: i32) -> Option<i32> {
    // one peer skips the last question so unanswered rows show up in every view
    if question_no == 13 && rater == 3 {
        return None;
    }
    let swing = 1 - (question_no + rater * 2 + quarter) % 3;
    Some((base + swing).clamp(1, 5))
}

fn seed_rows() -> Vec<ResponseRecord> {
    let leaders = [("L001", "김민준", 5), ("L002", "이서연", 4), ("L003", "박지훈", 3)];
    let periods = [(2025, 1), (2025, 2)];

    let mut rows = Vec::new();
    for (target_id, target_name, base) in leaders {
        let raters = [
            (target_id, target_name, EvaluationType::SelfReview),
            ("M001", "최현우", EvaluationType::Manager),
            ("P001", "정다은", EvaluationType::Peer),
            ("P002", "한승우", EvaluationType::Peer),
        ];

        for (year, quarter) in periods {
            for (rater, (respondent_id, respondent_name, evaluation_type)) in
                (0..).zip(raters.iter())
            {
                for (question_no, question_text) in (1..).zip(QUESTIONS.iter()) {
                    rows.push(ResponseRecord {
                        target_id: target_id.to_string(),
                        target_name: target_name.to_string(),
                        respondent_id: respondent_id.to_string(),
                        respondent_name: respondent_name.to_string(),
                        evaluation_type: *evaluation_type,
                        survey_year: year,
                        survey_quarter: quarter,
                        question_no,
                        question_text: question_text.to_string(),
                        response_value: seed_value(base, question_no, rater, quarter),
                    });
                }
            }
        }
    }
    rows
}

fn source_key_for(row: &ResponseRecord) -> String {
    format!(
        "seed-{}-{}-{}-q{}",
        row.target_id,
        row.respondent_id,
        row.period(),
        row.question_no
    )
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<u64> {
    let rows = seed_rows();
    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for row in &rows {
        inserted += insert_response(&mut *tx, row, &source_key_for(row)).await?;
    }

    tx.commit().await?;
    info!(candidates = rows.len(), inserted, "Seed responses written");
    Ok(inserted)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        target_id: String,
        target_name: String,
        respondent_id: String,
        respondent_name: String,
        evaluation_type: EvaluationType,
        survey_year: i32,
        survey_quarter: i32,
        question_no: i32,
        question_text: String,
        response_value: Option<i32>,
        source_key: Option<String>,
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;

    for (line, result) in (2..).zip(reader.deserialize::<CsvRow>()) {
        let row = result.with_context(|| format!("invalid response on line {line}"))?;
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));
        let record = ResponseRecord {
            target_id: row.target_id,
            target_name: row.target_name,
            respondent_id: row.respondent_id,
            respondent_name: row.respondent_name,
            evaluation_type: row.evaluation_type,
            survey_year: row.survey_year,
            survey_quarter: row.survey_quarter,
            question_no: row.question_no,
            question_text: row.question_text,
            response_value: row.response_value,
        };

        let affected = insert_response(&mut *tx, &record, &source_key)
            .await
            .with_context(|| format!("failed to store response on line {line}"))?;
        if affected > 0 {
            inserted += 1;
        } else {
            debug!(line, source_key = %source_key, "Skipping already imported response");
        }
    }

    tx.commit().await?;
    Ok(inserted)
}
