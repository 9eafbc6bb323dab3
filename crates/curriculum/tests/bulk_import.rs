use std::fs;
use std::path::Path;
use std::sync::Arc;

use curriculum::catalog::{
    standard_curriculum, Catalog, CatalogRepository, InMemoryCatalogRepository,
    JsonCatalogRepository, NewGrade, NewLevel, RepositoryError, UploaderId,
};
use curriculum::classifier::{RuleSpec, RuleTable};
use curriculum::import::{BulkImporter, ImportDecision, ImportError, ImportOptions};
use curriculum::resources::{InMemoryFileStorage, LocalFileStorage};

fn rule(pattern: &str, subject: &str, grade_pattern: &str, level: &str) -> RuleSpec {
    RuleSpec {
        pattern: pattern.to_string(),
        subject: subject.to_string(),
        grade_pattern: grade_pattern.to_string(),
        education_level: level.to_string(),
    }
}

fn junior_secondary() -> Catalog {
    let mut catalog = Catalog::new();
    let level = catalog
        .create_level(NewLevel {
            name: "Junior Secondary".to_string(),
            order: 4,
            description: String::new(),
            icon: None,
        })
        .expect("level");
    for (order, name) in ["G7", "G8", "G9"].into_iter().enumerate() {
        catalog
            .create_grade(NewGrade {
                name: name.to_string(),
                education_level: level.id,
                order: order as u32 + 1,
                description: String::new(),
            })
            .expect("grade");
    }
    catalog
}

fn fixture_dir(names: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for name in names {
        fs::write(dir.path().join(name), b"%PDF-1.4 fixture").expect("write fixture");
    }
    dir
}

fn options(dir: &Path, dry_run: bool) -> ImportOptions {
    ImportOptions {
        source_dir: dir.to_path_buf(),
        dry_run,
        uploaded_by: UploaderId("registrar".to_string()),
        provision_subjects: false,
    }
}

#[test]
fn mathematics_intro_lands_in_g7() {
    let dir = fixture_dir(&["g7_mathematics_intro.pdf"]);
    let repository = Arc::new(InMemoryCatalogRepository::new(junior_secondary()));
    let storage = Arc::new(InMemoryFileStorage::default());
    let rules = RuleTable::from_specs(vec![rule(
        ".*math.*",
        "Mathematics",
        "g7|g8|g9",
        "Junior Secondary",
    )])
    .expect("rules");

    let report = BulkImporter::new(repository.clone(), storage.clone(), &rules)
        .run(&options(dir.path(), false))
        .expect("import");

    assert!(report.committed);
    assert_eq!(report.imported(), 1);
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.decision, ImportDecision::Imported);
    assert_eq!(outcome.grade.as_deref(), Some("G7"));
    assert_eq!(
        outcome.storage_path.as_deref(),
        Some("mathematics/g7/g7_mathematics_intro.pdf")
    );

    let catalog = repository.snapshot().expect("snapshot");
    let category = catalog.find_category("Mathematics").expect("category created");
    let subject = catalog
        .find_subject("Mathematics", category.id)
        .expect("subject created");
    let level = catalog.find_level("Junior Secondary").expect("level").id;
    let g7 = catalog.find_grade("G7", level).expect("g7");
    assert!(subject.is_linked_to(g7.id));
    assert_eq!(subject.grades.len(), 1);

    let resources = catalog.resources_of_subject(subject.id);
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].title, "Mathematics Intro");
    assert_eq!(resources[0].description, "Imported from g7_mathematics_intro.pdf");
    assert_eq!(resources[0].uploaded_by, UploaderId("registrar".to_string()));
    assert!(resources[0].allow_download);
    assert_eq!(
        catalog
            .resource_type(resources[0].resource_type)
            .map(|kind| kind.icon.as_str()),
        Some("fas fa-file-pdf")
    );
    assert_eq!(storage.paths(), vec!["mathematics/g7/g7_mathematics_intro.pdf"]);
}

#[test]
fn second_run_over_same_directory_creates_nothing() {
    let dir = fixture_dir(&[
        "g7_mathematics_intro.pdf",
        "g8_kiswahili_insha.pdf",
        "unmatched_leaflet.pdf",
    ]);
    let mut catalog = Catalog::new();
    standard_curriculum(&mut catalog).expect("seed");
    let repository = Arc::new(InMemoryCatalogRepository::new(catalog));
    let storage = Arc::new(InMemoryFileStorage::default());
    let rules = RuleTable::standard();
    let importer = BulkImporter::new(repository.clone(), storage.clone(), &rules);

    let first = importer.run(&options(dir.path(), false)).expect("first run");
    assert_eq!(first.imported(), 3);
    let after_first = repository.snapshot().expect("snapshot");

    let second = importer.run(&options(dir.path(), false)).expect("second run");
    assert_eq!(second.imported(), 0);
    assert_eq!(second.count(ImportDecision::SkippedDuplicate), 3);

    let after_second = repository.snapshot().expect("snapshot");
    assert_eq!(after_second.resource_count(), after_first.resource_count());
    assert_eq!(storage.paths().len(), 3);
}

#[test]
fn earlier_rule_wins_when_two_match() {
    let dir = fixture_dir(&["g8_physics_and_maths.pdf"]);
    let repository = Arc::new(InMemoryCatalogRepository::new(junior_secondary()));
    let storage = Arc::new(InMemoryFileStorage::default());
    let rules = RuleTable::from_specs(vec![
        rule(".*physics.*", "Physics", "g8", "Junior Secondary"),
        rule(".*maths.*", "Mathematics", "g9", "Junior Secondary"),
    ])
    .expect("rules");

    let report = BulkImporter::new(repository.clone(), storage, &rules)
        .run(&options(dir.path(), false))
        .expect("import");

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.subject.as_deref(), Some("Physics"));
    assert_eq!(outcome.grade.as_deref(), Some("G8"));
    let catalog = repository.snapshot().expect("snapshot");
    assert!(catalog
        .find_category("Mathematics")
        .and_then(|category| catalog.find_subject("Mathematics", category.id))
        .is_none());
}

#[test]
fn unmatched_grade_pattern_takes_lowest_order_grade() {
    let dir = fixture_dir(&["algebra_drills.pdf"]);
    let repository = Arc::new(InMemoryCatalogRepository::new(junior_secondary()));
    let storage = Arc::new(InMemoryFileStorage::default());
    let rules = RuleTable::from_specs(vec![rule(
        ".*algebra.*",
        "Mathematics",
        "g12",
        "Junior Secondary",
    )])
    .expect("rules");

    let report = BulkImporter::new(repository, storage, &rules)
        .run(&options(dir.path(), false))
        .expect("import");

    assert_eq!(report.outcomes[0].grade.as_deref(), Some("G7"));
}

#[test]
fn rule_for_missing_level_is_reported_and_skipped() {
    let dir = fixture_dir(&["physics_notes.pdf"]);
    let repository = Arc::new(InMemoryCatalogRepository::new(junior_secondary()));
    let storage = Arc::new(InMemoryFileStorage::default());
    let rules = RuleTable::from_specs(vec![rule(
        ".*physics.*",
        "Physics",
        "g10",
        "Senior Secondary",
    )])
    .expect("rules");

    let report = BulkImporter::new(repository, storage, &rules)
        .run(&options(dir.path(), false))
        .expect("import");

    assert_eq!(report.issues.len(), 1);
    assert!(report.issues[0].to_string().contains("Senior Secondary"));
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.decision, ImportDecision::Imported);
    assert!(outcome.fallback);
    assert_eq!(outcome.subject.as_deref(), Some("General Resources"));
    assert_eq!(outcome.storage_path.as_deref(), Some("default/physics_notes.pdf"));
}

#[test]
fn dry_run_reports_without_writing() {
    let dir = fixture_dir(&["g7_mathematics_intro.pdf", "g9_mathematics_revision.pdf"]);
    let repository = Arc::new(InMemoryCatalogRepository::new(junior_secondary()));
    let storage = Arc::new(InMemoryFileStorage::default());
    let rules = RuleTable::from_specs(vec![rule(
        ".*math.*",
        "Mathematics",
        "g7|g8|g9",
        "Junior Secondary",
    )])
    .expect("rules");

    let report = BulkImporter::new(repository.clone(), storage.clone(), &rules)
        .run(&options(dir.path(), true))
        .expect("dry run");

    assert!(report.dry_run);
    assert!(!report.committed);
    assert_eq!(report.count(ImportDecision::WouldImport), 2);

    let catalog = repository.snapshot().expect("snapshot");
    assert_eq!(catalog.resource_count(), 0);
    assert!(catalog.categories().is_empty());
    assert!(catalog.resource_types().is_empty());
    assert!(storage.paths().is_empty());
}

#[test]
fn provisioning_links_rule_subjects_to_every_grade() {
    let dir = fixture_dir(&["g9_mathematics_revision.pdf"]);
    let repository = Arc::new(InMemoryCatalogRepository::new(junior_secondary()));
    let storage = Arc::new(InMemoryFileStorage::default());
    let rules = RuleTable::from_specs(vec![rule(
        ".*math.*",
        "Mathematics",
        "g7|g8|g9",
        "Junior Secondary",
    )])
    .expect("rules");

    let mut run = options(dir.path(), false);
    run.provision_subjects = true;
    let report = BulkImporter::new(repository.clone(), storage, &rules)
        .run(&run)
        .expect("import");

    let provisioned = report.provisioned.expect("provisioning ran");
    assert_eq!(provisioned.subjects_created, 1);
    assert_eq!(provisioned.links_added, 3);

    let catalog = repository.snapshot().expect("snapshot");
    let category = catalog.find_category("Mathematics").expect("category");
    let subject = catalog.find_subject("Mathematics", category.id).expect("subject");
    assert_eq!(subject.grades.len(), 3);
}

#[test]
fn imports_persist_through_json_repository() {
    let dir = fixture_dir(&["g7_mathematics_intro.pdf"]);
    let data = tempfile::tempdir().expect("data dir");
    let path = data.path().join("catalog.json");
    let seeded = JsonCatalogRepository::new(&path);
    seeded.commit(&junior_secondary()).expect("seed snapshot");

    let repository = Arc::new(JsonCatalogRepository::new(&path));
    let storage = Arc::new(LocalFileStorage::new(data.path().join("media"), "/media/"));
    let rules = RuleTable::standard();
    BulkImporter::new(repository.clone(), storage, &rules)
        .run(&options(dir.path(), false))
        .expect("import");

    let reloaded = JsonCatalogRepository::new(&path).load().expect("reload");
    assert_eq!(reloaded.resource_count(), 1);
    assert!(data
        .path()
        .join("media/mathematics/g7/g7_mathematics_intro.pdf")
        .is_file());
}

struct RejectingRepository {
    inner: InMemoryCatalogRepository,
}

impl CatalogRepository for RejectingRepository {
    fn load(&self) -> Result<Catalog, RepositoryError> {
        self.inner.load()
    }

    fn commit(&self, _catalog: &Catalog) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("disk full".to_string()))
    }
}

#[test]
fn failed_commit_removes_stored_files() {
    let dir = fixture_dir(&["g7_mathematics_intro.pdf", "g8_english_grammar.pdf"]);
    let media = tempfile::tempdir().expect("media dir");
    let repository = Arc::new(RejectingRepository {
        inner: InMemoryCatalogRepository::new(junior_secondary()),
    });
    let storage = Arc::new(LocalFileStorage::new(media.path(), "/media/"));
    let rules = RuleTable::from_specs(vec![
        rule(".*math.*", "Mathematics", "g7", "Junior Secondary"),
        rule(".*english.*", "English", "g8", "Junior Secondary"),
    ])
    .expect("rules");

    let error = BulkImporter::new(repository.clone(), storage, &rules)
        .run(&options(dir.path(), false))
        .expect_err("commit fails");

    match error {
        ImportError::Commit { removed, .. } => assert_eq!(removed, 2),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!media.path().join("mathematics/g7/g7_mathematics_intro.pdf").exists());
    assert!(!media.path().join("languages/g8/g8_english_grammar.pdf").exists());
    assert_eq!(
        repository.inner.snapshot().expect("snapshot").resource_count(),
        0
    );
}

#[test]
fn missing_directory_is_a_command_error() {
    let repository = Arc::new(InMemoryCatalogRepository::default());
    let storage = Arc::new(InMemoryFileStorage::default());
    let rules = RuleTable::standard();
    let dir = tempfile::tempdir().expect("tempdir");

    let error = BulkImporter::new(repository, storage, &rules)
        .run(&options(&dir.path().join("absent"), false))
        .expect_err("missing dir");

    assert!(matches!(error, ImportError::MissingDirectory(_)));
}
