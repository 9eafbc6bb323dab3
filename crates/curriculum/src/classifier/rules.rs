use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Serialized form of a classification rule, as stored in rule table JSON files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Tested against the lowercased file stem.
    pub pattern: String,
    pub subject: String,
    /// Tested against the names of the level's grades.
    pub grade_pattern: String,
    pub education_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("rule {index} ({subject}) has an invalid {field} '{pattern}': {source}")]
    InvalidPattern {
        index: usize,
        subject: String,
        field: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("failed to read rule table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("rule table is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

/// A compiled rule. Both patterns are case-insensitive and unanchored.
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    spec: RuleSpec,
    pattern: Regex,
    grade_pattern: Regex,
}

fn build_pattern(
    index: usize,
    spec: &RuleSpec,
    field: &'static str,
    pattern: &str,
) -> Result<Regex, RuleError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| RuleError::InvalidPattern {
            index,
            subject: spec.subject.clone(),
            field,
            pattern: pattern.to_string(),
            source,
        })
}

impl ClassificationRule {
    fn compile(index: usize, spec: RuleSpec) -> Result<Self, RuleError> {
        let pattern = build_pattern(index, &spec, "pattern", &spec.pattern)?;
        let grade_pattern = build_pattern(index, &spec, "grade pattern", &spec.grade_pattern)?;
        Ok(Self {
            spec,
            pattern,
            grade_pattern,
        })
    }

    pub fn spec(&self) -> &RuleSpec {
        &self.spec
    }

    pub fn subject(&self) -> &str {
        &self.spec.subject
    }

    pub fn education_level(&self) -> &str {
        &self.spec.education_level
    }

    pub fn matches(&self, stem: &str) -> bool {
        self.pattern.is_match(&stem.to_lowercase())
    }

    pub fn matches_grade(&self, grade_name: &str) -> bool {
        self.grade_pattern.is_match(grade_name)
    }
}

/// Ordered rule sequence. Evaluation order is declaration order and the first match wins, so
/// repeated patterns further down the table are shadowed rather than merged.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<ClassificationRule>,
}

impl RuleTable {
    pub fn from_specs<I>(specs: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = RuleSpec>,
    {
        let rules = specs
            .into_iter()
            .enumerate()
            .map(|(index, spec)| ClassificationRule::compile(index, spec))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Load a JSON array of [`RuleSpec`] records.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RuleError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| RuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RuleError> {
        let specs: Vec<RuleSpec> = serde_json::from_reader(reader)?;
        Self::from_specs(specs)
    }

    /// The CBC rule table used by the bulk importer.
    pub fn standard() -> Self {
        standard_table().clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassificationRule> {
        self.rules.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ClassificationRule> {
        self.rules.get(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn specs(&self) -> Vec<RuleSpec> {
        self.rules.iter().map(|rule| rule.spec.clone()).collect()
    }
}

static STANDARD_TABLE: OnceLock<RuleTable> = OnceLock::new();

const PRE_PRIMARY: &str = "Pre-Primary";
const LOWER_PRIMARY: &str = "Lower Primary";
const UPPER_PRIMARY: &str = "Upper Primary";
const JUNIOR_SECONDARY: &str = "Junior Secondary";
const SENIOR_SECONDARY: &str = "Senior Secondary";

const PRE_PRIMARY_GRADES: &str = r".*pg.*|.*pp1.*|.*pp2.*";
const LOWER_PRIMARY_GRADES: &str = r".*g1.*|.*g2.*|.*g3.*";
const UPPER_PRIMARY_GRADES: &str = r".*g4.*|.*g5.*|.*g6.*";
const JUNIOR_SECONDARY_GRADES: &str = r".*g7.*|.*g8.*|.*g9.*";
const SENIOR_SECONDARY_GRADES: &str = r".*g10.*|.*g11.*|.*g12.*";

fn standard_table() -> &'static RuleTable {
    STANDARD_TABLE.get_or_init(|| {
        // (pattern, subject, grade pattern, education level)
        const STANDARD_RULES: &[(&str, &str, &str, &str)] = &[
            // Pre-Primary
            (r".*cre.*|.*religious.*|.*faith.*", "CRE", PRE_PRIMARY_GRADES, PRE_PRIMARY),
            (r".*ire.*|.*islamic.*|.*muslim.*", "IRE", PRE_PRIMARY_GRADES, PRE_PRIMARY),
            (r".*hre.*|.*hindu.*", "HRE", PRE_PRIMARY_GRADES, PRE_PRIMARY),
            (r".*math.*|.*mathematics.*|.*numbers.*", "Mathematics", PRE_PRIMARY_GRADES, PRE_PRIMARY),
            (r".*language.*|.*english.*|.*kiswahili.*", "Languages", PRE_PRIMARY_GRADES, PRE_PRIMARY),
            (r".*environment.*|.*science.*|.*nature.*", "Environment", PRE_PRIMARY_GRADES, PRE_PRIMARY),
            (r".*psychomotor.*|.*art.*|.*creative.*", "Psychomotor", PRE_PRIMARY_GRADES, PRE_PRIMARY),
            // Lower Primary
            (r".*creative.*|.*art.*|.*craft.*", "Creative Activities", LOWER_PRIMARY_GRADES, LOWER_PRIMARY),
            (r".*english.*|.*activities.*", "English Activities", LOWER_PRIMARY_GRADES, LOWER_PRIMARY),
            (r".*kiswahili.*", "Kiswahili", LOWER_PRIMARY_GRADES, LOWER_PRIMARY),
            (r".*math.*|.*mathematics.*", "Mathematics", LOWER_PRIMARY_GRADES, LOWER_PRIMARY),
            // Upper Primary
            (r".*math.*|.*mathematics.*", "Mathematics", UPPER_PRIMARY_GRADES, UPPER_PRIMARY),
            (r".*kiswahili.*", "Kiswahili", UPPER_PRIMARY_GRADES, UPPER_PRIMARY),
            (r".*home.*science.*", "Home Science", UPPER_PRIMARY_GRADES, UPPER_PRIMARY),
            (r".*social.*studies.*", "Social Studies", UPPER_PRIMARY_GRADES, UPPER_PRIMARY),
            (r".*music.*", "Music", UPPER_PRIMARY_GRADES, UPPER_PRIMARY),
            (r".*pe.*|.*physical.*education.*", "PE", UPPER_PRIMARY_GRADES, UPPER_PRIMARY),
            (r".*chinese.*", "Chinese", UPPER_PRIMARY_GRADES, UPPER_PRIMARY),
            (r".*german.*", "German", UPPER_PRIMARY_GRADES, UPPER_PRIMARY),
            (r".*indigenous.*language.*", "Indigenous Language", UPPER_PRIMARY_GRADES, UPPER_PRIMARY),
            (r".*phe.*|.*physical.*health.*", "PHE", UPPER_PRIMARY_GRADES, UPPER_PRIMARY),
            // Junior Secondary
            (r".*math.*|.*mathematics.*", "Mathematics", JUNIOR_SECONDARY_GRADES, JUNIOR_SECONDARY),
            (r".*kiswahili.*", "Kiswahili", JUNIOR_SECONDARY_GRADES, JUNIOR_SECONDARY),
            (r".*biology.*", "Biology", JUNIOR_SECONDARY_GRADES, JUNIOR_SECONDARY),
            (r".*arabic.*", "Arabic", JUNIOR_SECONDARY_GRADES, JUNIOR_SECONDARY),
            (r".*french.*", "French", JUNIOR_SECONDARY_GRADES, JUNIOR_SECONDARY),
            (r".*german.*", "German", JUNIOR_SECONDARY_GRADES, JUNIOR_SECONDARY),
            (r".*pre.*technical.*", "Pre-Technical", JUNIOR_SECONDARY_GRADES, JUNIOR_SECONDARY),
            (r".*life.*skills.*", "Life Skills", JUNIOR_SECONDARY_GRADES, JUNIOR_SECONDARY),
            (r".*computer.*science.*", "Computer Science", JUNIOR_SECONDARY_GRADES, JUNIOR_SECONDARY),
            (r".*integrated.*science.*", "Integrated Science", JUNIOR_SECONDARY_GRADES, JUNIOR_SECONDARY),
            (
                r".*physical.*health.*education.*",
                "Physical Health Education",
                JUNIOR_SECONDARY_GRADES,
                JUNIOR_SECONDARY,
            ),
            (r".*sports.*", "Sports", JUNIOR_SECONDARY_GRADES, JUNIOR_SECONDARY),
            // Senior Secondary: STEM
            (r".*math.*|.*mathematics.*", "Mathematics", SENIOR_SECONDARY_GRADES, SENIOR_SECONDARY),
            (r".*physics.*", "Physics", SENIOR_SECONDARY_GRADES, SENIOR_SECONDARY),
            (r".*chemistry.*", "Chemistry", SENIOR_SECONDARY_GRADES, SENIOR_SECONDARY),
            (r".*biology.*", "Biology", SENIOR_SECONDARY_GRADES, SENIOR_SECONDARY),
            (r".*computer.*science.*", "Computer Science", SENIOR_SECONDARY_GRADES, SENIOR_SECONDARY),
            (r".*technical.*subjects.*", "Technical Subjects", SENIOR_SECONDARY_GRADES, SENIOR_SECONDARY),
            // Senior Secondary: Social Sciences
            (r".*geography.*", "Geography", SENIOR_SECONDARY_GRADES, SENIOR_SECONDARY),
            (r".*history.*|.*government.*", "History and Government", SENIOR_SECONDARY_GRADES, SENIOR_SECONDARY),
            (r".*religious.*|.*education.*", "Religious Education", SENIOR_SECONDARY_GRADES, SENIOR_SECONDARY),
            (r".*business.*|.*education.*", "Business Education", SENIOR_SECONDARY_GRADES, SENIOR_SECONDARY),
            // Senior Secondary: Creative Arts
            (r".*music.*", "Music", SENIOR_SECONDARY_GRADES, SENIOR_SECONDARY),
            (r".*drama.*", "Drama", SENIOR_SECONDARY_GRADES, SENIOR_SECONDARY),
            (r".*dance.*", "Dance", SENIOR_SECONDARY_GRADES, SENIOR_SECONDARY),
            (r".*visual.*arts.*", "Visual Arts", SENIOR_SECONDARY_GRADES, SENIOR_SECONDARY),
            (r".*fashion.*|.*design.*", "Fashion Design", SENIOR_SECONDARY_GRADES, SENIOR_SECONDARY),
        ];

        let specs = STANDARD_RULES
            .iter()
            .map(|(pattern, subject, grade_pattern, level)| RuleSpec {
                pattern: (*pattern).to_string(),
                subject: (*subject).to_string(),
                grade_pattern: (*grade_pattern).to_string(),
                education_level: (*level).to_string(),
            });
        RuleTable::from_specs(specs).expect("standard rule table compiles")
    })
}
