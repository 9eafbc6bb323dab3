//! Standard CBC curriculum provisioning.
//!
//! Every step is a get-or-create, so seeding an already provisioned catalog is a no-op.

use serde::Serialize;
use tracing::info;

use super::domain::{Lookup, NewCategory, NewGrade, NewLevel, NewResourceType};
use super::model::{Catalog, CatalogError};

const RESOURCE_TYPES: &[(&str, &str, &str)] = &[
    ("PDF", "fas fa-file-pdf", "Portable Document Format files"),
    ("Video", "fas fa-video", "Video files"),
    ("Audio", "fas fa-file-audio", "Audio files"),
    ("Document", "fas fa-file-word", "Word documents"),
    ("Presentation", "fas fa-file-powerpoint", "PowerPoint presentations"),
    ("Spreadsheet", "fas fa-file-excel", "Excel spreadsheets"),
    ("Image", "fas fa-image", "Image files"),
];

const CATEGORIES: &[(&str, &str, &str)] = &[
    ("Languages", "fas fa-language", "Language and communication subjects"),
    ("Mathematics", "fas fa-calculator", "Mathematics and numerical subjects"),
    ("Science", "fas fa-flask", "Science and experimental subjects"),
    ("Humanities", "fas fa-book", "Social sciences and humanities"),
    ("Technical", "fas fa-cogs", "Technical and vocational subjects"),
    ("Arts", "fas fa-palette", "Creative and performing arts"),
    ("Religious Studies", "fas fa-pray", "Religious education subjects"),
    ("Physical Education", "fas fa-running", "Physical health and sports subjects"),
    ("Life Skills", "fas fa-hands-helping", "Life skills and personal development"),
    ("Home Science", "fas fa-home", "Home science and domestic education subjects"),
];

struct LevelSeed {
    name: &'static str,
    icon: &'static str,
    order: u32,
    description: &'static str,
    grades: &'static [&'static str],
    /// (category, subjects) pairs; a category may appear more than once.
    subjects: &'static [(&'static str, &'static [&'static str])],
}

const LEVELS: &[LevelSeed] = &[
    LevelSeed {
        name: "Pre-Primary",
        icon: "fas fa-child",
        order: 1,
        description: "Early childhood education for young learners",
        grades: &["PG", "PP1", "PP2"],
        subjects: &[
            ("Religious Studies", &["CRE", "IRE", "HRE"]),
            ("Mathematics", &["Mathematics"]),
            ("Languages", &["Languages"]),
            ("Humanities", &["Environment"]),
            ("Arts", &["Psychomotor"]),
        ],
    },
    LevelSeed {
        name: "Lower Primary",
        icon: "fas fa-school",
        order: 2,
        description: "Foundational education for early primary learners",
        grades: &["G1", "G2", "G3"],
        subjects: &[
            ("Arts", &["Creative Activities"]),
            ("Languages", &["English Activities", "Kiswahili"]),
            ("Religious Studies", &["HRE", "IRE"]),
            ("Mathematics", &["Mathematics"]),
        ],
    },
    LevelSeed {
        name: "Upper Primary",
        icon: "fas fa-graduation-cap",
        order: 3,
        description: "Intermediate education for upper primary learners",
        grades: &["G4", "G5", "G6"],
        subjects: &[
            ("Mathematics", &["Mathematics"]),
            ("Languages", &["Kiswahili"]),
            ("Home Science", &["Home Science"]),
            ("Humanities", &["Social Studies"]),
            ("Arts", &["Music"]),
            ("Physical Education", &["PE"]),
            ("Languages", &["Chinese", "German", "Indigenous Language"]),
            ("Physical Education", &["PHE"]),
        ],
    },
    LevelSeed {
        name: "Junior Secondary",
        icon: "fas fa-users",
        order: 4,
        description: "Middle school education for secondary learners",
        grades: &["G7", "G8", "G9"],
        subjects: &[
            ("Mathematics", &["Mathematics"]),
            ("Languages", &["Kiswahili", "English"]),
            ("Science", &["Biology"]),
            ("Languages", &["Arabic", "French", "German"]),
            ("Technical", &["Pre-Technical"]),
            ("Life Skills", &["Life Skills"]),
            ("Science", &["Computer Science", "Integrated Science"]),
            ("Physical Education", &["Physical Health Education", "Sports"]),
        ],
    },
    LevelSeed {
        name: "Senior Secondary",
        icon: "fas fa-user-graduate",
        order: 5,
        description: "Advanced education for senior secondary learners",
        grades: &["G10", "G11", "G12"],
        subjects: &[
            (
                "Science",
                &["Mathematics", "Physics", "Chemistry", "Biology", "Computer Science"],
            ),
            ("Technical", &["Technical Subjects"]),
            (
                "Humanities",
                &[
                    "Geography",
                    "History and Government",
                    "Religious Education",
                    "Business Education",
                ],
            ),
            ("Languages", &["Kiswahili", "English"]),
            (
                "Arts",
                &["Music", "Drama", "Dance", "Visual Arts", "Home Science", "Fashion Design"],
            ),
        ],
    },
];

const PATHWAY_LEVEL: &str = "Senior Secondary";

const PATHWAYS: &[(&str, &str, &[&str])] = &[
    (
        "STEM",
        "Science, Technology, Engineering, and Mathematics pathway",
        &[
            "Mathematics",
            "Physics",
            "Chemistry",
            "Biology",
            "Computer Science",
            "Technical Subjects",
        ],
    ),
    (
        "Social Sciences",
        "Social sciences and humanities pathway",
        &[
            "Geography",
            "History and Government",
            "Religious Education",
            "Business Education",
            "Kiswahili",
            "English",
        ],
    ),
    (
        "Creative Arts and Sports",
        "Creative arts and sports pathway",
        &["Music", "Drama", "Dance", "Visual Arts", "Home Science", "Fashion Design"],
    ),
];

/// Rows created by a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub resource_types: usize,
    pub categories: usize,
    pub levels: usize,
    pub grades: usize,
    pub subjects: usize,
    pub subject_links: usize,
    pub pathways: usize,
    pub pathway_links: usize,
}

impl SeedSummary {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn tally<T>(lookup: &Lookup<T>, counter: &mut usize) {
    if lookup.was_created() {
        *counter += 1;
    }
}

pub fn standard_curriculum(catalog: &mut Catalog) -> Result<SeedSummary, CatalogError> {
    let mut summary = SeedSummary::default();

    for (name, icon, description) in RESOURCE_TYPES {
        let lookup = catalog.find_or_create_resource_type(NewResourceType {
            name: (*name).to_string(),
            icon: Some((*icon).to_string()),
            description: (*description).to_string(),
        });
        tally(&lookup, &mut summary.resource_types);
    }

    for (name, icon, description) in CATEGORIES {
        if catalog.find_category(name).is_none() {
            catalog.create_category(NewCategory {
                name: (*name).to_string(),
                icon: Some((*icon).to_string()),
                description: (*description).to_string(),
            })?;
            summary.categories += 1;
        }
    }

    for seed in LEVELS {
        let level = catalog.find_or_create_level(NewLevel {
            name: seed.name.to_string(),
            order: seed.order,
            description: seed.description.to_string(),
            icon: Some(seed.icon.to_string()),
        });
        tally(&level, &mut summary.levels);
        let level = level.into_inner();

        let mut grade_ids = Vec::with_capacity(seed.grades.len());
        for (index, grade_name) in seed.grades.iter().enumerate() {
            let grade = catalog.find_or_create_grade(NewGrade {
                name: (*grade_name).to_string(),
                education_level: level.id,
                order: index as u32 + 1,
                description: format!("{grade_name} in {} education", seed.name),
            })?;
            tally(&grade, &mut summary.grades);
            grade_ids.push(grade.into_inner().id);
        }

        for (category_name, subject_names) in seed.subjects {
            let category = catalog
                .find_category(category_name)
                .map(|category| category.id)
                .ok_or_else(|| CatalogError::NotFound {
                    entity: "subject category",
                    key: (*category_name).to_string(),
                })?;

            for subject_name in *subject_names {
                let subject = catalog.find_or_create_subject(
                    subject_name,
                    category,
                    &format!("{subject_name} subject for {}", seed.name),
                )?;
                tally(&subject, &mut summary.subjects);
                let subject_id = subject.into_inner().id;

                for grade in &grade_ids {
                    if catalog.link_subject_to_grade(subject_id, *grade)? {
                        summary.subject_links += 1;
                    }
                }
            }
        }
    }

    let senior = catalog.find_level(PATHWAY_LEVEL)?.id;
    let senior_grades: Vec<_> = catalog
        .grades_of_level(senior)
        .into_iter()
        .map(|grade| grade.id)
        .collect();

    for (name, description, subject_names) in PATHWAYS {
        for grade in &senior_grades {
            let pathway = catalog.find_or_create_pathway(name, *grade, description)?;
            tally(&pathway, &mut summary.pathways);
            let pathway_id = pathway.into_inner().id;

            let subject_ids: Vec<_> = catalog
                .subjects_of_grade(*grade)
                .into_iter()
                .filter(|subject| subject_names.contains(&subject.name.as_str()))
                .map(|subject| subject.id)
                .collect();
            for subject in subject_ids {
                if catalog.link_pathway_subject(pathway_id, subject)? {
                    summary.pathway_links += 1;
                }
            }
        }
    }

    info!(?summary, "standard curriculum seeded");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_levels_grades_and_pathways() {
        let mut catalog = Catalog::new();
        let summary = standard_curriculum(&mut catalog).expect("seed");

        assert_eq!(summary.resource_types, 7);
        assert_eq!(summary.categories, 10);
        assert_eq!(summary.levels, 5);
        assert_eq!(summary.grades, 15);
        assert_eq!(summary.pathways, 9);

        let levels: Vec<_> = catalog.levels().iter().map(|l| l.name.clone()).collect();
        assert_eq!(
            levels,
            vec![
                "Pre-Primary",
                "Lower Primary",
                "Upper Primary",
                "Junior Secondary",
                "Senior Secondary"
            ]
        );

        let junior = catalog.find_level("Junior Secondary").unwrap().id;
        let g7 = catalog.grades_of_level(junior)[0].id;
        let names: Vec<_> = catalog
            .subjects_of_grade(g7)
            .iter()
            .map(|s| s.name.clone())
            .collect();
        assert!(names.contains(&"English".to_string()));
        assert!(names.contains(&"Integrated Science".to_string()));
    }

    #[test]
    fn repeated_category_entries_are_all_provisioned() {
        let mut catalog = Catalog::new();
        standard_curriculum(&mut catalog).expect("seed");

        let upper = catalog.find_level("Upper Primary").unwrap().id;
        let g4 = catalog.grades_of_level(upper)[0].id;
        let names: Vec<_> = catalog
            .subjects_of_grade(g4)
            .iter()
            .map(|s| s.name.clone())
            .collect();
        for expected in ["Kiswahili", "Chinese", "PE", "PHE"] {
            assert!(names.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn seeding_twice_creates_nothing_new() {
        let mut catalog = Catalog::new();
        standard_curriculum(&mut catalog).expect("first seed");
        let snapshot = catalog.clone();

        let second = standard_curriculum(&mut catalog).expect("second seed");
        assert!(second.is_empty());
        assert_eq!(catalog, snapshot);
    }

    #[test]
    fn stem_pathway_bundles_senior_science_subjects() {
        let mut catalog = Catalog::new();
        standard_curriculum(&mut catalog).expect("seed");

        let senior = catalog.find_level("Senior Secondary").unwrap().id;
        let g10 = catalog.grades_of_level(senior)[0].id;
        let stem = catalog.find_pathway("STEM", g10).expect("stem pathway");
        let subjects: Vec<_> = catalog
            .subjects_of_pathway(stem.id)
            .iter()
            .map(|s| s.name.clone())
            .collect();
        assert_eq!(
            subjects,
            vec![
                "Biology",
                "Chemistry",
                "Computer Science",
                "Mathematics",
                "Physics",
                "Technical Subjects"
            ]
        );
    }
}
