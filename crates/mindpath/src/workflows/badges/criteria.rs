use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Criterion names recognized in a badge's criteria mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionKind {
    CoursesCompleted,
    MentalHealthCourses,
    PerfectQuizzes,
    DailyStreak,
    EarlyUser,
}

impl CriterionKind {
    pub const fn key(self) -> &'static str {
        match self {
            CriterionKind::CoursesCompleted => "courses_completed",
            CriterionKind::MentalHealthCourses => "mental_health_courses",
            CriterionKind::PerfectQuizzes => "perfect_quizzes",
            CriterionKind::DailyStreak => "daily_streak",
            CriterionKind::EarlyUser => "early_user",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "courses_completed" => Some(CriterionKind::CoursesCompleted),
            "mental_health_courses" => Some(CriterionKind::MentalHealthCourses),
            "perfect_quizzes" => Some(CriterionKind::PerfectQuizzes),
            "daily_streak" => Some(CriterionKind::DailyStreak),
            "early_user" => Some(CriterionKind::EarlyUser),
            _ => None,
        }
    }
}

/// A single recognized condition from a criteria mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// Counter must reach `threshold`.
    AtLeast { kind: CriterionKind, threshold: u32 },
    /// Account must predate the early-user cutoff. Presence of the key is what matters.
    EarlyUser,
    /// Recognized key whose threshold could not be read; never met.
    Malformed { kind: CriterionKind, raw: Value },
}

impl Criterion {
    pub fn kind(&self) -> CriterionKind {
        match self {
            Criterion::AtLeast { kind, .. } | Criterion::Malformed { kind, .. } => *kind,
            Criterion::EarlyUser => CriterionKind::EarlyUser,
        }
    }

    fn parse(kind: CriterionKind, raw: &Value) -> Self {
        if kind == CriterionKind::EarlyUser {
            return Criterion::EarlyUser;
        }

        match raw.as_u64().and_then(|value| u32::try_from(value).ok()) {
            Some(threshold) => Criterion::AtLeast { kind, threshold },
            None => Criterion::Malformed {
                kind,
                raw: raw.clone(),
            },
        }
    }

    fn raw_value(&self) -> Value {
        match self {
            Criterion::AtLeast { threshold, .. } => Value::from(*threshold),
            Criterion::EarlyUser => Value::Bool(true),
            Criterion::Malformed { raw, .. } => raw.clone(),
        }
    }
}

/// Machine-checkable criteria attached to a badge.
///
/// Every listed criterion must hold for the badge to be earned. Keys outside
/// [`CriterionKind`] are dropped while parsing so newer catalogs stay readable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BadgeCriteria {
    criteria: Vec<Criterion>,
}

impl BadgeCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a criteria mapping. Anything other than a JSON object yields empty criteria.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self::from_map(map),
            _ => Self::default(),
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let criteria = map
            .iter()
            .filter_map(|(key, raw)| {
                CriterionKind::from_key(key).map(|kind| Criterion::parse(kind, raw))
            })
            .collect();
        Self { criteria }
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn courses_completed(self, threshold: u32) -> Self {
        self.with(Criterion::AtLeast {
            kind: CriterionKind::CoursesCompleted,
            threshold,
        })
    }

    pub fn mental_health_courses(self, threshold: u32) -> Self {
        self.with(Criterion::AtLeast {
            kind: CriterionKind::MentalHealthCourses,
            threshold,
        })
    }

    pub fn perfect_quizzes(self, threshold: u32) -> Self {
        self.with(Criterion::AtLeast {
            kind: CriterionKind::PerfectQuizzes,
            threshold,
        })
    }

    pub fn daily_streak(self, threshold: u32) -> Self {
        self.with(Criterion::AtLeast {
            kind: CriterionKind::DailyStreak,
            threshold,
        })
    }

    pub fn early_user(self) -> Self {
        self.with(Criterion::EarlyUser)
    }

    fn with(mut self, criterion: Criterion) -> Self {
        let kind = criterion.kind();
        self.criteria.retain(|existing| existing.kind() != kind);
        self.criteria.push(criterion);
        self
    }
}

impl Serialize for BadgeCriteria {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.criteria.len()))?;
        for criterion in &self.criteria {
            map.serialize_entry(criterion.kind().key(), &criterion.raw_value())?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for BadgeCriteria {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}
