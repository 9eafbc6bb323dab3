use std::path::Path;
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

pub const UNTITLED_DOCUMENT: &str = "Untitled Document";

static NUMERIC_PREFIX: OnceLock<Regex> = OnceLock::new();
static GRADE_PREFIX: OnceLock<Regex> = OnceLock::new();

fn numeric_prefix() -> &'static Regex {
    NUMERIC_PREFIX.get_or_init(|| Regex::new(r"^\d+(?:\s+|$)").expect("valid regex"))
}

fn grade_prefix() -> &'static Regex {
    GRADE_PREFIX.get_or_init(|| {
        RegexBuilder::new(r"^(?:g\d+|pp\d+|pg)\s+")
            .case_insensitive(true)
            .build()
            .expect("valid regex")
    })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Human-readable title for an imported file.
///
/// `"07_algebra_basics.pdf"` becomes `"Algebra Basics"` and `"g7_mathematics_intro.pdf"` becomes
/// `"Mathematics Intro"`. A grade code is only dropped when something follows it.
pub fn title_from_filename(file_name: &str) -> String {
    let path = Path::new(file_name);
    let stem = match path.extension() {
        Some(_) => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
        None => file_name.to_string(),
    };

    let words = stem.replace(['_', '-'], " ");
    let title = words
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");

    let title = numeric_prefix().replace(&title, "");
    let title = grade_prefix().replace(&title, "");
    let title = title.trim();

    if title.is_empty() {
        UNTITLED_DOCUMENT.to_string()
    } else {
        title.to_string()
    }
}
