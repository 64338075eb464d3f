//! Step catalog
//!
//! Static, ordered step definitions for each pipeline kind. The position of a
//! definition in its catalog is the pipeline order; nothing else orders steps.
//!
//! Most steps are identified by an exact `current_step` label. The enrichment
//! pipeline additionally runs an unbounded family of numbered batch steps
//! (`llm_batch_1`, `llm_batch_2`, ...) that collapse into one catalog entry,
//! matched by pattern.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::job::{JobResult, JobType};

/// Family of step labels matched by a regular expression
///
/// The expression must capture the batch number in group 1.
pub struct StepPattern {
    key: &'static str,
    regex: LazyLock<Regex>,
    label: &'static str,
}

impl StepPattern {
    /// Returns the captured batch number if `label` belongs to this family
    pub fn capture<'a>(&self, label: &'a str) -> Option<&'a str> {
        self.regex
            .captures(label)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

impl std::fmt::Debug for StepPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepPattern")
            .field("key", &self.key)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

static LLM_BATCH: StepPattern = StepPattern {
    key: "llm_batch",
    regex: LazyLock::new(|| Regex::new(r"^llm_batch_([0-9]+)$").expect("valid batch step pattern")),
    label: "Batch",
};

/// How a catalog step is identified in `current_step`
#[derive(Debug, Clone, Copy)]
pub enum StepKey {
    /// The label equals the key
    Exact(&'static str),
    /// The label belongs to a numbered family
    Pattern(&'static StepPattern),
}

/// Outcome of matching a `current_step` label against a step key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepMatch {
    Exact,
    /// Matched a pattern step; carries the batch number as written in the label
    Batch(String),
}

impl StepKey {
    /// Stable name of the step, used as the resolved step key
    pub fn name(&self) -> &'static str {
        match self {
            StepKey::Exact(key) => *key,
            StepKey::Pattern(pattern) => pattern.key,
        }
    }

    pub fn matches(&self, label: &str) -> Option<StepMatch> {
        match self {
            StepKey::Exact(key) => (*key == label).then_some(StepMatch::Exact),
            StepKey::Pattern(pattern) => pattern
                .capture(label)
                .map(|number| StepMatch::Batch(number.to_string())),
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, StepKey::Pattern(_))
    }
}

/// Subtitle template of a step
#[derive(Debug, Clone, Copy)]
pub enum Subtitle {
    Static(&'static str),
    /// Renders the listed result counters that are present, e.g. "10 tables".
    /// Falls back to the static text without a result or without any of them.
    Counters {
        counters: &'static [(&'static str, &'static str)],
        fallback: &'static str,
    },
}

impl Subtitle {
    fn fallback(&self) -> &'static str {
        match self {
            Subtitle::Static(text) => *text,
            Subtitle::Counters { fallback, .. } => *fallback,
        }
    }
}

/// Static definition of one pipeline step
#[derive(Debug, Clone, Copy)]
pub struct StepDefinition {
    pub key: StepKey,
    pub title: &'static str,
    pub subtitle: Subtitle,
}

impl StepDefinition {
    const fn exact(key: &'static str, title: &'static str, subtitle: &'static str) -> Self {
        Self {
            key: StepKey::Exact(key),
            title,
            subtitle: Subtitle::Static(subtitle),
        }
    }

    /// Subtitle shown while the step is not the matched one and no result applies
    pub fn default_subtitle(&self) -> String {
        self.subtitle.fallback().to_string()
    }

    /// Subtitle for the step the current label matched
    pub fn matched_subtitle(&self, matched: &StepMatch) -> String {
        match (self.key, matched) {
            (StepKey::Pattern(pattern), StepMatch::Batch(number)) => {
                format!("{} {}", pattern.label, number)
            }
            _ => self.default_subtitle(),
        }
    }

    /// Subtitle rendered from the counters of a completed job
    pub fn result_subtitle(&self, result: Option<&JobResult>) -> String {
        let (Subtitle::Counters { counters, .. }, Some(result)) = (self.subtitle, result) else {
            return self.default_subtitle();
        };

        let parts: Vec<String> = counters
            .iter()
            .filter_map(|(name, unit)| result.counter(name).map(|n| format!("{} {}", n, unit)))
            .collect();

        if parts.is_empty() {
            self.default_subtitle()
        } else {
            parts.join(", ")
        }
    }
}

static EXTRACTION_STEPS: [StepDefinition; 4] = [
    StepDefinition::exact("start", "Start", "Job queued"),
    StepDefinition::exact(
        "extract_metadata",
        "Extract metadata",
        "Reading tables and columns",
    ),
    StepDefinition::exact("save_to_catalog", "Save to catalog", "Writing schema to catalog"),
    StepDefinition {
        key: StepKey::Exact("done"),
        title: "Done",
        subtitle: Subtitle::Counters {
            counters: &[("tables", "tables")],
            fallback: "Extraction finished",
        },
    },
];

static ENRICHMENT_STEPS: [StepDefinition; 7] = [
    StepDefinition::exact("start", "Start", "Job queued"),
    StepDefinition::exact("fetch_tables", "Fetch tables", "Loading catalog tables"),
    StepDefinition {
        key: StepKey::Pattern(&LLM_BATCH),
        title: "LLM enrichment",
        subtitle: Subtitle::Static("Describing columns in batches"),
    },
    StepDefinition::exact(
        "save_descriptions",
        "Save descriptions",
        "Persisting descriptions and synonyms",
    ),
    StepDefinition::exact("generate_kpis", "Generate KPIs", "Deriving KPI definitions"),
    StepDefinition::exact(
        "generate_questions",
        "Generate questions",
        "Drafting sample questions",
    ),
    StepDefinition {
        key: StepKey::Exact("done"),
        title: "Done",
        subtitle: Subtitle::Counters {
            counters: &[
                ("columns", "columns"),
                ("synonyms", "synonyms"),
                ("kpis", "KPIs"),
                ("questions", "questions"),
            ],
            fallback: "Enrichment finished",
        },
    },
];

/// Ordered step definitions of a pipeline kind
pub fn steps_for(job_type: JobType) -> &'static [StepDefinition] {
    match job_type {
        JobType::Extraction => &EXTRACTION_STEPS,
        JobType::Enrichment => &ENRICHMENT_STEPS,
    }
}

/// Finds the first catalog entry the label identifies
pub fn locate(steps: &[StepDefinition], label: &str) -> Option<(usize, StepMatch)> {
    steps
        .iter()
        .enumerate()
        .find_map(|(idx, step)| step.key.matches(label).map(|m| (idx, m)))
}
