//! Sources of raw response rows.
//!
//! [`RowProvider`] is the seam between storage and aggregation: the views are
//! computed identically whether rows come from Postgres ([`PgRowProvider`]) or
//! from an in-memory collection such as a CSV export ([`MemoryRowProvider`]).

use std::io;
use std::path::Path;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{debug, info};

use crate::error::DataAccessError;
use crate::filter::ResponseFilter;
use crate::models::{EvaluationType, ResponseRecord};

/// Fetches the rows matching a filter. A failure yields no rows at all.
#[async_trait::async_trait]
pub trait RowProvider: Send + Sync {
    async fn fetch_rows(
        &self,
        filter: &ResponseFilter,
    ) -> Result<Vec<ResponseRecord>, DataAccessError>;
}

pub struct PgRowProvider {
    pool: PgPool,
}

impl PgRowProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn build_query(filter: &ResponseFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(
        "SELECT target_id, target_name, respondent_id, respondent_name, evaluation_type, \
         survey_year, survey_quarter, question_no, question_text, response_value \
         FROM leadership_pulse.responses WHERE TRUE",
    );

    if let Some(period) = &filter.period {
        query
            .push(" AND (survey_year::text || '-Q' || survey_quarter::text) = ")
            .push_bind(period.clone());
    }
    if let Some(target_id) = &filter.target_id {
        query.push(" AND target_id = ").push_bind(target_id.clone());
    }

    query.push(" ORDER BY survey_year, survey_quarter, target_id, question_no");
    query
}

fn decode_row(row: &PgRow) -> Result<ResponseRecord, DataAccessError> {
    let evaluation_type: String = row.try_get("evaluation_type")?;
    let evaluation_type = evaluation_type
        .parse::<EvaluationType>()
        .map_err(|message| DataAccessError::Schema { message })?;

    Ok(ResponseRecord {
        target_id: row.try_get("target_id")?,
        target_name: row.try_get("target_name")?,
        respondent_id: row.try_get("respondent_id")?,
        respondent_name: row.try_get("respondent_name")?,
        evaluation_type,
        survey_year: row.try_get("survey_year")?,
        survey_quarter: row.try_get("survey_quarter")?,
        question_no: row.try_get("question_no")?,
        question_text: row.try_get("question_text")?,
        response_value: row.try_get("response_value")?,
    })
}

#[async_trait::async_trait]
impl RowProvider for PgRowProvider {
    #[tracing::instrument(skip(self, filter), fields(period = ?filter.period, target = ?filter.target_id))]
    async fn fetch_rows(
        &self,
        filter: &ResponseFilter,
    ) -> Result<Vec<ResponseRecord>, DataAccessError> {
        let mut query = build_query(filter);
        let rows = query.build().fetch_all(&self.pool).await?;
        let records = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()?;

        info!(rows = records.len(), "Fetched responses from Postgres");
        Ok(records)
    }
}

/// Serves rows from a collection owned by the caller's process.
pub struct MemoryRowProvider {
    rows: Vec<ResponseRecord>,
}

impl MemoryRowProvider {
    pub fn new(rows: Vec<ResponseRecord>) -> Self {
        Self { rows }
    }

    /// Loads rows from a long-format CSV export. Extra columns are ignored and an
    /// empty `response_value` cell reads as unanswered.
    pub fn from_csv(path: &Path) -> Result<Self, DataAccessError> {
        let file = std::fs::File::open(path).map_err(|e| DataAccessError::Csv {
            path: path.to_path_buf(),
            source: csv::Error::from(e),
        })?;
        let rows = read_csv(file).map_err(|source| DataAccessError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), rows = rows.len(), "Loaded responses from CSV");
        Ok(Self::new(rows))
    }
}

fn read_csv<R: io::Read>(reader: R) -> Result<Vec<ResponseRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let rows = reader
        .deserialize::<ResponseRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[async_trait::async_trait]
impl RowProvider for MemoryRowProvider {
    #[tracing::instrument(skip(self, filter), fields(period = ?filter.period, target = ?filter.target_id))]
    async fn fetch_rows(
        &self,
        filter: &ResponseFilter,
    ) -> Result<Vec<ResponseRecord>, DataAccessError> {
        let records: Vec<ResponseRecord> = filter.apply(&self.rows).cloned().collect();
        debug!(rows = records.len(), "Selected responses from memory");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::question_scores;
    use crate::db::QUESTIONS;
    use crate::filter::RoleSet;

    const SAMPLE_CSV: &str = "\
target_id,target_name,respondent_id,respondent_name,evaluation_type,survey_year,survey_quarter,question_no,question_text,response_value,source_key
L1,Kim Minji,L1,Kim Minji,self,2025,1,1,Sets clear direction,5,k1
L1,Kim Minji,M1,Park Jun,manager,2025,1,1,Sets clear direction,4,k2
L1,Kim Minji,P1,Lee Sora,구성원,2025,2,1,Sets clear direction,,k3
L2,Choi Hana,P1,Lee Sora,peer,2025,2,2,Focuses on substance,3,k4
";

    #[test]
    fn csv_rows_decode_with_optional_answers() {
        let rows = read_csv(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].evaluation_type, EvaluationType::SelfReview);
        assert!(rows[0].is_self_assessment());
        assert_eq!(rows[2].evaluation_type, EvaluationType::Peer);
        assert_eq!(rows[2].response_value, None);
        assert_eq!(rows[3].response_value, Some(3));
    }

    #[test]
    fn csv_with_unknown_role_is_rejected() {
        let bad = SAMPLE_CSV.replace("manager", "director");
        assert!(read_csv(bad.as_bytes()).is_err());
    }

    #[test]
    fn csv_roles_parse_like_database_values() {
        let mixed = SAMPLE_CSV
            .replace(",self,", ",Self,")
            .replace(",manager,", ",상사,")
            .replace(",peer,", ",PEER,");
        let rows = read_csv(mixed.as_bytes()).unwrap();
        let roles: Vec<EvaluationType> = rows.iter().map(|r| r.evaluation_type).collect();
        assert_eq!(
            roles,
            vec![
                EvaluationType::SelfReview,
                EvaluationType::Manager,
                EvaluationType::Peer,
                EvaluationType::Peer,
            ]
        );
        for row in &rows {
            assert_eq!(
                row.evaluation_type,
                row.evaluation_type.as_str().parse().unwrap()
            );
        }
    }

    #[test]
    fn demo_export_uses_seed_question_wording() {
        let rows = read_csv(include_str!("../demos/sample_responses.csv").as_bytes()).unwrap();
        assert!(!rows.is_empty());
        for row in &rows {
            let index = usize::try_from(row.question_no - 1).unwrap();
            assert_eq!(row.question_text, QUESTIONS[index], "question {}", row.question_no);
        }

        let scores = question_scores(&rows, &ResponseFilter::all(), RoleSet::ALL);
        let mut numbers: Vec<i32> = scores.iter().map(|s| s.question_no).collect();
        numbers.dedup();
        assert_eq!(numbers.len(), scores.len());
    }

    #[test]
    fn missing_csv_file_is_a_data_access_error() {
        let result = MemoryRowProvider::from_csv(Path::new("/nonexistent/responses.csv"));
        assert!(matches!(result, Err(DataAccessError::Csv { .. })));
    }

    #[tokio::test]
    async fn memory_provider_applies_filter() {
        let provider = MemoryRowProvider::new(read_csv(SAMPLE_CSV.as_bytes()).unwrap());

        let all = provider.fetch_rows(&ResponseFilter::all()).await.unwrap();
        assert_eq!(all.len(), 4);

        let filter = ResponseFilter::new(Some("2025-Q2".to_string()), Some("L1".to_string()));
        let narrowed = provider.fetch_rows(&filter).await.unwrap();
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].respondent_id, "P1");

        let unmatched = ResponseFilter::new(Some("2025-Q2".to_string()), Some("X".to_string()));
        assert!(provider.fetch_rows(&unmatched).await.unwrap().is_empty());
    }

    #[test]
    fn query_binds_only_active_selectors() {
        let sql = build_query(&ResponseFilter::all()).into_sql();
        assert!(!sql.contains("$1"));

        let sql = build_query(&ResponseFilter::new(Some("2025-Q1".to_string()), None)).into_sql();
        assert!(sql.contains("'-Q'"));
        assert!(sql.contains("$1"));
        assert!(!sql.contains("$2"));

        let sql = build_query(&ResponseFilter::new(
            Some("2025-Q1".to_string()),
            Some("L1".to_string()),
        ))
        .into_sql();
        assert!(sql.contains("target_id = $2"));
    }
}
