/// Category assigned when no keyword set matches.
pub const OTHER_CATEGORY: &str = "Other";

const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Languages",
        &[
            "english",
            "kiswahili",
            "chinese",
            "german",
            "french",
            "arabic",
            "indigenous",
            "language",
        ],
    ),
    ("Mathematics", &["math", "mathematics"]),
    (
        "Science",
        &[
            "physics",
            "chemistry",
            "biology",
            "integrated science",
            "computer science",
        ],
    ),
    (
        "Humanities",
        &[
            "geography",
            "history",
            "government",
            "social studies",
            "religion",
            "religious",
            "business",
            "life skills",
        ],
    ),
    (
        "Technical",
        &["pre-technical", "technical", "home science", "fashion design"],
    ),
    (
        "Arts",
        &[
            "music",
            "drama",
            "dance",
            "visual arts",
            "creative",
            "art",
            "craft",
            "psychomotor",
        ],
    ),
    (
        "Physical Education",
        &["pe", "physical", "education", "health", "sports", "phe"],
    ),
];

/// Derive a category name from a subject name alone.
///
/// Keyword sets are tested in declaration order against the lowercased name and the first
/// substring hit wins. The classifier knows nothing about which rule produced the subject.
pub fn classify_category(subject_name: &str) -> &'static str {
    let name = subject_name.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| name.contains(keyword)))
        .map(|(category, _)| *category)
        .unwrap_or(OTHER_CATEGORY)
}
