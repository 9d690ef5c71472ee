use std::fmt;
use std::str::FromStr;

use crate::models::{EvaluationType, ResponseRecord};

/// Optional period and target selectors shared by every view.
///
/// `period` is compared against the `"{year}-Q{quarter}"` rendering of each row
/// as a plain string, so a malformed selector simply matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseFilter {
    pub period: Option<String>,
    pub target_id: Option<String>,
}

impl ResponseFilter {
    pub fn new(period: Option<String>, target_id: Option<String>) -> Self {
        Self { period, target_id }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn keep(&self, row: &ResponseRecord) -> bool {
        if let Some(target_id) = self.target_id.as_deref() {
            if row.target_id != target_id {
                return false;
            }
        }

        match self.period.as_deref() {
            Some(period) => row.period().to_string() == period,
            None => true,
        }
    }

    pub fn apply<'a>(
        &'a self,
        rows: &'a [ResponseRecord],
    ) -> impl Iterator<Item = &'a ResponseRecord> + 'a {
        rows.iter().filter(move |row| self.keep(row))
    }

    pub fn describe(&self) -> String {
        let period = self.period.as_deref().unwrap_or("all periods");
        let target = self.target_id.as_deref().unwrap_or("all leaders");
        format!("{period}, {target}")
    }
}

/// Set of rater roles included in an aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet {
    self_review: bool,
    manager: bool,
    peer: bool,
}

impl RoleSet {
    pub const SELF_ONLY: RoleSet = RoleSet {
        self_review: true,
        manager: false,
        peer: false,
    };

    pub const OTHERS: RoleSet = RoleSet {
        self_review: false,
        manager: true,
        peer: true,
    };

    pub const ALL: RoleSet = RoleSet {
        self_review: true,
        manager: true,
        peer: true,
    };

    pub fn contains(&self, role: EvaluationType) -> bool {
        match role {
            EvaluationType::SelfReview => self.self_review,
            EvaluationType::Manager => self.manager,
            EvaluationType::Peer => self.peer,
        }
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roles: Vec<&str> = [
            EvaluationType::SelfReview,
            EvaluationType::Manager,
            EvaluationType::Peer,
        ]
        .into_iter()
        .filter(|role| self.contains(*role))
        .map(|role| role.as_str())
        .collect();

        if roles.is_empty() {
            f.write_str("no roles")
        } else {
            f.write_str(&roles.join("+"))
        }
    }
}

impl FromIterator<EvaluationType> for RoleSet {
    fn from_iter<I: IntoIterator<Item = EvaluationType>>(iter: I) -> Self {
        let mut set = RoleSet {
            self_review: false,
            manager: false,
            peer: false,
        };
        for role in iter {
            match role {
                EvaluationType::SelfReview => set.self_review = true,
                EvaluationType::Manager => set.manager = true,
                EvaluationType::Peer => set.peer = true,
            }
        }
        set
    }
}

/// Parses a comma-separated role list such as `self,manager`.
///
/// `others` expands to manager and peer, `all` to every role. Individual
/// roles accept the same spellings as [`EvaluationType`].
impl FromStr for RoleSet {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut roles = Vec::new();
        for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_ascii_lowercase().as_str() {
                "others" => roles.extend([EvaluationType::Manager, EvaluationType::Peer]),
                "all" => roles.extend([
                    EvaluationType::SelfReview,
                    EvaluationType::Manager,
                    EvaluationType::Peer,
                ]),
                _ => roles.push(part.parse::<EvaluationType>()?),
            }
        }

        if roles.is_empty() {
            return Err("at least one role is required".to_string());
        }
        Ok(roles.into_iter().collect())
    }
}
