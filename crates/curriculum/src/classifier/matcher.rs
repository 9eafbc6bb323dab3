use serde::Serialize;
use tracing::{debug, warn};

use super::category::classify_category;
use super::rules::{ClassificationRule, RuleTable};
use super::title::title_from_filename;
use crate::catalog::{Catalog, CatalogError, Grade, GradeId, SubjectId};

pub const DEFAULT_SUBJECT: &str = "General Resources";
pub const DEFAULT_SUBJECT_DESCRIPTION: &str = "General educational resources";
pub const DEFAULT_STORAGE_PREFIX: &str = "default";

/// A rule that could not be applied because the catalog does not support it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigurationIssue {
    #[error("rule {rule} ({subject}) targets missing education level '{education_level}'")]
    MissingLevel {
        rule: usize,
        subject: String,
        education_level: String,
    },
    #[error("rule {rule} ({subject}) targets education level '{education_level}' which has no grades")]
    EmptyLevel {
        rule: usize,
        subject: String,
        education_level: String,
    },
}

impl ConfigurationIssue {
    fn missing_level(index: usize, rule: &ClassificationRule) -> Self {
        Self::MissingLevel {
            rule: index,
            subject: rule.subject().to_string(),
            education_level: rule.education_level().to_string(),
        }
    }

    fn empty_level(index: usize, rule: &ClassificationRule) -> Self {
        Self::EmptyLevel {
            rule: index,
            subject: rule.subject().to_string(),
            education_level: rule.education_level().to_string(),
        }
    }
}

/// Where a file lands in the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// Index of the rule that placed the file; `None` for the default subject.
    pub rule: Option<usize>,
    pub subject: SubjectId,
    pub subject_name: String,
    pub category: String,
    pub grade: Option<GradeId>,
    pub grade_name: Option<String>,
    pub education_level: Option<String>,
    pub title: String,
    /// Lowercased storage path relative to the media root.
    pub storage_path: String,
    pub subject_created: bool,
    pub link_created: bool,
}

impl Placement {
    pub fn is_fallback(&self) -> bool {
        self.rule.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub placement: Placement,
    pub issues: Vec<ConfigurationIssue>,
}

/// Totals of the subject provisioning pre-pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisionSummary {
    pub subjects_created: usize,
    pub links_added: usize,
    pub issues: Vec<ConfigurationIssue>,
}

/// Places files onto the catalog using an ordered rule table.
///
/// Missing categories and subjects are created in the working copy handed in, and the chosen
/// grade is linked to the subject. Links are only ever added.
pub struct Classifier<'a> {
    rules: &'a RuleTable,
}

impl<'a> Classifier<'a> {
    pub fn new(rules: &'a RuleTable) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleTable {
        self.rules
    }

    pub fn classify(
        &self,
        catalog: &mut Catalog,
        file_name: &str,
    ) -> Result<Classification, CatalogError> {
        let stem = file_stem(file_name).to_lowercase();
        let mut issues = Vec::new();

        for (index, rule) in self.rules.iter().enumerate() {
            if !rule.matches(&stem) {
                continue;
            }

            let level = match catalog.find_level(rule.education_level()) {
                Ok(level) => level.id,
                Err(_) => {
                    let issue = ConfigurationIssue::missing_level(index, rule);
                    warn!(file = file_name, %issue, "classification rule skipped");
                    issues.push(issue);
                    continue;
                }
            };

            let Some(grade) = select_grade(catalog.grades_of_level(level), rule) else {
                let issue = ConfigurationIssue::empty_level(index, rule);
                warn!(file = file_name, %issue, "classification rule skipped");
                issues.push(issue);
                continue;
            };

            let category = classify_category(rule.subject());
            let category_id = catalog.find_or_create_category(category).get().id;
            let subject = catalog.find_or_create_subject(
                rule.subject(),
                category_id,
                &format!("{} resources", rule.subject()),
            )?;
            let link_created = catalog.link_subject_to_grade(subject.get().id, grade.id)?;

            debug!(
                file = file_name,
                rule = index,
                subject = rule.subject(),
                grade = %grade.name,
                "file matched classification rule"
            );

            let storage_path = format!("{}/{}/{}", category, grade.name, file_name).to_lowercase();
            let placement = Placement {
                rule: Some(index),
                subject: subject.get().id,
                subject_name: rule.subject().to_string(),
                category: category.to_string(),
                grade: Some(grade.id),
                grade_name: Some(grade.name),
                education_level: Some(rule.education_level().to_string()),
                title: title_from_filename(file_name),
                storage_path,
                subject_created: subject.was_created(),
                link_created,
            };
            return Ok(Classification { placement, issues });
        }

        let placement = self.fallback(catalog, file_name)?;
        Ok(Classification { placement, issues })
    }

    fn fallback(&self, catalog: &mut Catalog, file_name: &str) -> Result<Placement, CatalogError> {
        let category = classify_category(DEFAULT_SUBJECT);
        let category_id = catalog.find_or_create_category(category).get().id;
        let subject =
            catalog.find_or_create_subject(DEFAULT_SUBJECT, category_id, DEFAULT_SUBJECT_DESCRIPTION)?;

        debug!(file = file_name, "no classification rule matched; using default subject");

        Ok(Placement {
            rule: None,
            subject: subject.get().id,
            subject_name: DEFAULT_SUBJECT.to_string(),
            category: category.to_string(),
            grade: None,
            grade_name: None,
            education_level: None,
            title: title_from_filename(file_name),
            storage_path: format!("{DEFAULT_STORAGE_PREFIX}/{file_name}").to_lowercase(),
            subject_created: subject.was_created(),
            link_created: false,
        })
    }

    /// Create every rule's subject up front and link it to all grades of its level.
    pub fn provision_subjects(&self, catalog: &mut Catalog) -> Result<ProvisionSummary, CatalogError> {
        let mut summary = ProvisionSummary::default();

        for (index, rule) in self.rules.iter().enumerate() {
            let level = match catalog.find_level(rule.education_level()) {
                Ok(level) => level.id,
                Err(_) => {
                    let issue = ConfigurationIssue::missing_level(index, rule);
                    warn!(%issue, "subject provisioning skipped rule");
                    summary.issues.push(issue);
                    continue;
                }
            };

            let category_id = catalog
                .find_or_create_category(classify_category(rule.subject()))
                .get()
                .id;
            let subject = catalog.find_or_create_subject(
                rule.subject(),
                category_id,
                &format!("{} resources", rule.subject()),
            )?;
            if subject.was_created() {
                summary.subjects_created += 1;
            }

            let grades: Vec<GradeId> = catalog
                .grades_of_level(level)
                .into_iter()
                .map(|grade| grade.id)
                .collect();
            for grade in grades {
                if catalog.link_subject_to_grade(subject.get().id, grade)? {
                    summary.links_added += 1;
                }
            }
        }

        Ok(summary)
    }
}

/// First grade (by order) whose name matches the rule, else the lowest-order grade.
fn select_grade(grades: Vec<&Grade>, rule: &ClassificationRule) -> Option<Grade> {
    grades
        .iter()
        .find(|grade| rule.matches_grade(&grade.name))
        .or_else(|| grades.first())
        .map(|grade| (*grade).clone())
}

fn file_stem(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NewGrade, NewLevel};
    use crate::classifier::RuleSpec;

    fn level_with_grades(catalog: &mut Catalog, name: &str, grades: &[(&str, u32)]) {
        let level = catalog
            .find_or_create_level(NewLevel {
                name: name.to_string(),
                order: 1,
                description: String::new(),
                icon: None,
            })
            .into_inner();
        for (grade, order) in grades {
            catalog
                .create_grade(NewGrade {
                    name: (*grade).to_string(),
                    education_level: level.id,
                    order: *order,
                    description: String::new(),
                })
                .expect("grade");
        }
    }

    fn rule(pattern: &str, subject: &str, grades: &str, level: &str) -> RuleSpec {
        RuleSpec {
            pattern: pattern.to_string(),
            subject: subject.to_string(),
            grade_pattern: grades.to_string(),
            education_level: level.to_string(),
        }
    }

    #[test]
    fn grade_pattern_miss_falls_back_to_lowest_order_grade() {
        let mut catalog = Catalog::new();
        level_with_grades(&mut catalog, "Upper Primary", &[("G6", 3), ("G4", 1), ("G5", 2)]);
        let rules =
            RuleTable::from_specs([rule(".*music.*", "Music", "g99", "Upper Primary")]).unwrap();

        let result = Classifier::new(&rules)
            .classify(&mut catalog, "music_theory.pdf")
            .expect("classified");

        assert_eq!(result.placement.grade_name.as_deref(), Some("G4"));
        assert_eq!(result.placement.storage_path, "arts/g4/music_theory.pdf");
        assert!(result.issues.is_empty());
    }

    #[test]
    fn missing_level_is_reported_and_next_rule_is_tried() {
        let mut catalog = Catalog::new();
        level_with_grades(&mut catalog, "Junior Secondary", &[("G7", 1)]);
        let rules = RuleTable::from_specs([
            rule(".*bio.*", "Biology", "g10", "Senior Secondary"),
            rule(".*bio.*", "Biology", "g7", "Junior Secondary"),
        ])
        .unwrap();

        let result = Classifier::new(&rules)
            .classify(&mut catalog, "bio_cells.pdf")
            .expect("classified");

        assert_eq!(result.placement.rule, Some(1));
        assert_eq!(
            result.issues,
            vec![ConfigurationIssue::MissingLevel {
                rule: 0,
                subject: "Biology".to_string(),
                education_level: "Senior Secondary".to_string(),
            }]
        );
    }

    #[test]
    fn level_without_grades_cannot_place_a_file() {
        let mut catalog = Catalog::new();
        level_with_grades(&mut catalog, "Senior Secondary", &[]);
        let rules =
            RuleTable::from_specs([rule(".*drama.*", "Drama", "g10", "Senior Secondary")]).unwrap();

        let result = Classifier::new(&rules)
            .classify(&mut catalog, "Drama_Scripts.PDF")
            .expect("classified");

        assert!(result.placement.is_fallback());
        assert_eq!(result.placement.subject_name, DEFAULT_SUBJECT);
        assert_eq!(result.placement.category, "Other");
        assert_eq!(result.placement.storage_path, "default/drama_scripts.pdf");
        assert!(matches!(result.issues[0], ConfigurationIssue::EmptyLevel { .. }));

        let subject = catalog.subject(result.placement.subject).expect("subject");
        assert_eq!(subject.description, DEFAULT_SUBJECT_DESCRIPTION);
        assert!(subject.grades.is_empty());
    }

    #[test]
    fn provisioning_links_subjects_to_every_grade_of_the_level() {
        let mut catalog = Catalog::new();
        level_with_grades(&mut catalog, "Lower Primary", &[("G1", 1), ("G2", 2), ("G3", 3)]);
        let rules = RuleTable::from_specs([
            rule(".*kiswahili.*", "Kiswahili", "g1", "Lower Primary"),
            rule(".*chinese.*", "Chinese", "g4", "Upper Primary"),
        ])
        .unwrap();
        let classifier = Classifier::new(&rules);

        let first = classifier.provision_subjects(&mut catalog).expect("provisioned");
        assert_eq!(first.subjects_created, 1);
        assert_eq!(first.links_added, 3);
        assert_eq!(first.issues.len(), 1);

        let second = classifier.provision_subjects(&mut catalog).expect("provisioned");
        assert_eq!(second.subjects_created, 0);
        assert_eq!(second.links_added, 0);
    }
}
