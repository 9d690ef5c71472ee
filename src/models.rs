use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

/// Relationship of the respondent to the rated leader.
///
/// Deserialization goes through [`FromStr`], so CSV cells and database values
/// accept the same spellings (case-insensitive, Korean role names included).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum EvaluationType {
    #[serde(rename = "self")]
    SelfReview,
    Manager,
    Peer,
}

impl EvaluationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationType::SelfReview => "self",
            EvaluationType::Manager => "manager",
            EvaluationType::Peer => "peer",
        }
    }
}

impl fmt::Display for EvaluationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvaluationType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "self" | "본인" => Ok(EvaluationType::SelfReview),
            "manager" | "상사" => Ok(EvaluationType::Manager),
            "peer" | "구성원" => Ok(EvaluationType::Peer),
            other => Err(format!("unknown evaluation type `{other}`")),
        }
    }
}

impl TryFrom<String> for EvaluationType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One survey administration. Orders by year, then quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    pub year: i32,
    pub quarter: i32,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-Q{}", self.year, self.quarter)
    }
}

/// A single answer to one question, as supplied by the response store.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseRecord {
    pub target_id: String,
    pub target_name: String,
    pub respondent_id: String,
    pub respondent_name: String,
    pub evaluation_type: EvaluationType,
    pub survey_year: i32,
    pub survey_quarter: i32,
    pub question_no: i32,
    pub question_text: String,
    pub response_value: Option<i32>,
}

impl ResponseRecord {
    pub fn period(&self) -> Period {
        Period {
            year: self.survey_year,
            quarter: self.survey_quarter,
        }
    }

    /// True when the rated leader answered about themselves.
    pub fn is_self_assessment(&self) -> bool {
        self.evaluation_type == EvaluationType::SelfReview && self.respondent_id == self.target_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    #[serde(rename = "quarter", serialize_with = "serialize_period")]
    pub period: Period,
    #[serde(rename = "score")]
    pub average_score: f64,
}

fn serialize_period<S>(period: &Period, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(period)
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionScore {
    pub question_no: i32,
    pub question_text: String,
    pub average_score: f64,
}

// Chart consumers read the question text from both `principle` and `name`.
impl Serialize for QuestionScore {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("QuestionScore", 4)?;
        state.serialize_field("questionNo", &self.question_no)?;
        state.serialize_field("principle", &self.question_text)?;
        state.serialize_field("name", &self.question_text)?;
        state.serialize_field("score", &self.average_score)?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionBucket {
    #[serde(skip)]
    pub score: i32,
    #[serde(rename = "name")]
    pub label: String,
    #[serde(rename = "value")]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub question_no: i32,
    pub question_text: String,
    pub self_avg: f64,
    pub manager_avg: f64,
    pub peer_avg: f64,
}

impl Serialize for ComparisonRow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ComparisonRow", 6)?;
        state.serialize_field("questionNo", &self.question_no)?;
        state.serialize_field("principle", &self.question_text)?;
        state.serialize_field("name", &self.question_text)?;
        state.serialize_field("self", &self.self_avg)?;
        state.serialize_field("manager", &self.manager_avg)?;
        state.serialize_field("members", &self.peer_avg)?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderAverage {
    #[serde(rename = "targetId")]
    pub target_id: String,
    #[serde(rename = "name")]
    pub target_name: String,
    #[serde(rename = "avgScore")]
    pub average_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    #[serde(serialize_with = "serialize_period")]
    pub period: Period,
    #[serde(rename = "avgScore")]
    pub average_score: f64,
    #[serde(rename = "leaderCount")]
    pub leader_count: usize,
    #[serde(rename = "respondentCount")]
    pub respondent_count: usize,
    #[serde(rename = "responseCount")]
    pub response_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TargetEntry {
    #[serde(rename = "targetId")]
    pub target_id: String,
    #[serde(rename = "name")]
    pub target_name: String,
}
