use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::domain::{
    CategoryId, CategoryUpdate, EducationLevel, Grade, GradeId, GradeUpdate, LevelId, LevelUpdate,
    Lookup, NewCategory, NewGrade, NewLevel, NewPathway, NewResource, NewResourceType, NewSubject,
    Pathway, PathwayId, PathwayUpdate, Resource, ResourceId, ResourceType, ResourceTypeId,
    ResourceTypeUpdate, ResourceUpdate, Subject, SubjectCategory, SubjectId, SubjectUpdate,
    UploaderId, DEFAULT_CATEGORY_ICON, DEFAULT_LEVEL_ICON, DEFAULT_RESOURCE_TYPE_ICON,
};

/// Errors raised by catalog operations; uniqueness violations carry a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },
    #[error("{0}")]
    Conflict(String),
}

impl CatalogError {
    fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    fn in_use(name: &str, count: usize, dependent: &str) -> Self {
        let plural = if count == 1 { "" } else { "s" };
        Self::Conflict(format!(
            "'{name}' is still referenced by {count} {dependent}{plural}."
        ))
    }
}

/// In-memory image of the curriculum taxonomy and its resources.
///
/// A `Catalog` is the working copy of a unit of work: repositories load one, callers mutate it,
/// and the repository commits it back as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    last_id: u64,
    #[serde(default)]
    levels: BTreeMap<LevelId, EducationLevel>,
    #[serde(default)]
    grades: BTreeMap<GradeId, Grade>,
    #[serde(default)]
    categories: BTreeMap<CategoryId, SubjectCategory>,
    #[serde(default)]
    subjects: BTreeMap<SubjectId, Subject>,
    #[serde(default)]
    pathways: BTreeMap<PathwayId, Pathway>,
    #[serde(default)]
    resource_types: BTreeMap<ResourceTypeId, ResourceType>,
    #[serde(default)]
    resources: BTreeMap<ResourceId, Resource>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    // Education levels

    /// Levels ordered by their `order` field, ties broken by name.
    pub fn levels(&self) -> Vec<&EducationLevel> {
        let mut levels: Vec<_> = self.levels.values().collect();
        levels.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        levels
    }

    pub fn level(&self, id: LevelId) -> Option<&EducationLevel> {
        self.levels.get(&id)
    }

    /// Exact, case-sensitive lookup by name.
    pub fn find_level(&self, name: &str) -> Result<&EducationLevel, CatalogError> {
        self.levels
            .values()
            .find(|level| level.name == name)
            .ok_or_else(|| CatalogError::not_found("education level", name))
    }

    pub fn create_level(&mut self, input: NewLevel) -> Result<EducationLevel, CatalogError> {
        if self.find_level(&input.name).is_ok() {
            return Err(CatalogError::Conflict(format!(
                "An education level named '{}' already exists.",
                input.name
            )));
        }
        Ok(self.insert_level(input))
    }

    pub fn find_or_create_level(&mut self, input: NewLevel) -> Lookup<EducationLevel> {
        match self.find_level(&input.name) {
            Ok(level) => Lookup::Found(level.clone()),
            Err(_) => Lookup::Created(self.insert_level(input)),
        }
    }

    fn insert_level(&mut self, input: NewLevel) -> EducationLevel {
        let level = EducationLevel {
            id: LevelId(self.allocate()),
            name: input.name,
            order: input.order,
            description: input.description,
            icon: input
                .icon
                .unwrap_or_else(|| DEFAULT_LEVEL_ICON.to_string()),
        };
        self.levels.insert(level.id, level.clone());
        level
    }

    pub fn update_level(
        &mut self,
        id: LevelId,
        update: LevelUpdate,
    ) -> Result<EducationLevel, CatalogError> {
        if self.level(id).is_none() {
            return Err(CatalogError::not_found("education level", id));
        }
        if let Some(name) = &update.name {
            if self
                .levels
                .values()
                .any(|level| level.id != id && &level.name == name)
            {
                return Err(CatalogError::Conflict(format!(
                    "An education level named '{name}' already exists."
                )));
            }
        }

        let level = self
            .levels
            .get_mut(&id)
            .ok_or_else(|| CatalogError::not_found("education level", id))?;
        if let Some(name) = update.name {
            level.name = name;
        }
        if let Some(order) = update.order {
            level.order = order;
        }
        if let Some(description) = update.description {
            level.description = description;
        }
        if let Some(icon) = update.icon {
            level.icon = icon;
        }
        Ok(level.clone())
    }

    /// Refused while any grade still belongs to the level.
    pub fn remove_level(&mut self, id: LevelId) -> Result<EducationLevel, CatalogError> {
        let level = self
            .level(id)
            .ok_or_else(|| CatalogError::not_found("education level", id))?;
        let grades = self.grades_of_level(id).len();
        if grades > 0 {
            return Err(CatalogError::in_use(&level.name, grades, "grade"));
        }
        self.levels
            .remove(&id)
            .ok_or_else(|| CatalogError::not_found("education level", id))
    }

    // Grades

    pub fn grade(&self, id: GradeId) -> Option<&Grade> {
        self.grades.get(&id)
    }

    pub fn grades(&self) -> impl Iterator<Item = &Grade> {
        self.grades.values()
    }

    /// Grades of a level ordered by `order` ascending, ties broken by id.
    pub fn grades_of_level(&self, level: LevelId) -> Vec<&Grade> {
        let mut grades: Vec<_> = self
            .grades
            .values()
            .filter(|grade| grade.education_level == level)
            .collect();
        grades.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        grades
    }

    pub fn find_grade(&self, name: &str, level: LevelId) -> Option<&Grade> {
        self.grades
            .values()
            .find(|grade| grade.education_level == level && grade.name == name)
    }

    pub fn create_grade(&mut self, input: NewGrade) -> Result<Grade, CatalogError> {
        let level = self
            .level(input.education_level)
            .ok_or_else(|| CatalogError::not_found("education level", input.education_level))?;
        if self.find_grade(&input.name, input.education_level).is_some() {
            return Err(CatalogError::Conflict(format!(
                "Grade '{}' already exists in {}.",
                input.name, level.name
            )));
        }
        Ok(self.insert_grade(input))
    }

    pub fn find_or_create_grade(&mut self, input: NewGrade) -> Result<Lookup<Grade>, CatalogError> {
        if self.level(input.education_level).is_none() {
            return Err(CatalogError::not_found(
                "education level",
                input.education_level,
            ));
        }
        match self.find_grade(&input.name, input.education_level) {
            Some(grade) => Ok(Lookup::Found(grade.clone())),
            None => Ok(Lookup::Created(self.insert_grade(input))),
        }
    }

    fn insert_grade(&mut self, input: NewGrade) -> Grade {
        let grade = Grade {
            id: GradeId(self.allocate()),
            name: input.name,
            education_level: input.education_level,
            order: input.order,
            description: input.description,
        };
        self.grades.insert(grade.id, grade.clone());
        grade
    }

    /// Moving a grade to another level keeps its subject links and pathways.
    pub fn update_grade(
        &mut self,
        id: GradeId,
        update: GradeUpdate,
    ) -> Result<Grade, CatalogError> {
        let current = self
            .grade(id)
            .ok_or_else(|| CatalogError::not_found("grade", id))?;
        let level_id = update.education_level.unwrap_or(current.education_level);
        let name = update.name.as_deref().unwrap_or(&current.name);
        let level = self
            .level(level_id)
            .ok_or_else(|| CatalogError::not_found("education level", level_id))?;
        if self
            .find_grade(name, level_id)
            .is_some_and(|other| other.id != id)
        {
            return Err(CatalogError::Conflict(format!(
                "Grade '{name}' already exists in {}.",
                level.name
            )));
        }

        let grade = self
            .grades
            .get_mut(&id)
            .ok_or_else(|| CatalogError::not_found("grade", id))?;
        grade.education_level = level_id;
        if let Some(name) = update.name {
            grade.name = name;
        }
        if let Some(order) = update.order {
            grade.order = order;
        }
        if let Some(description) = update.description {
            grade.description = description;
        }
        Ok(grade.clone())
    }

    /// Refused while subjects are linked to the grade or pathways hang off it.
    pub fn remove_grade(&mut self, id: GradeId) -> Result<Grade, CatalogError> {
        let grade = self
            .grade(id)
            .ok_or_else(|| CatalogError::not_found("grade", id))?;
        let subjects = self.subjects_of_grade(id).len();
        if subjects > 0 {
            return Err(CatalogError::in_use(&grade.name, subjects, "subject"));
        }
        let pathways = self.pathways_of_grade(id).len();
        if pathways > 0 {
            return Err(CatalogError::in_use(&grade.name, pathways, "pathway"));
        }
        self.grades
            .remove(&id)
            .ok_or_else(|| CatalogError::not_found("grade", id))
    }

    // Subject categories

    pub fn category(&self, id: CategoryId) -> Option<&SubjectCategory> {
        self.categories.get(&id)
    }

    pub fn categories(&self) -> Vec<&SubjectCategory> {
        let mut categories: Vec<_> = self.categories.values().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }

    pub fn find_category(&self, name: &str) -> Option<&SubjectCategory> {
        self.categories.values().find(|category| category.name == name)
    }

    pub fn create_category(&mut self, input: NewCategory) -> Result<SubjectCategory, CatalogError> {
        if self.find_category(&input.name).is_some() {
            return Err(CatalogError::Conflict(format!(
                "A subject category named '{}' already exists.",
                input.name
            )));
        }
        Ok(self.insert_category(input))
    }

    /// Idempotent on the exact (case-sensitive) name; new categories get an empty description.
    pub fn find_or_create_category(&mut self, name: &str) -> Lookup<SubjectCategory> {
        match self.find_category(name) {
            Some(category) => Lookup::Found(category.clone()),
            None => Lookup::Created(self.insert_category(NewCategory {
                name: name.to_string(),
                icon: None,
                description: String::new(),
            })),
        }
    }

    fn insert_category(&mut self, input: NewCategory) -> SubjectCategory {
        let category = SubjectCategory {
            id: CategoryId(self.allocate()),
            name: input.name,
            icon: input
                .icon
                .unwrap_or_else(|| DEFAULT_CATEGORY_ICON.to_string()),
            description: input.description,
        };
        self.categories.insert(category.id, category.clone());
        category
    }

    pub fn update_category(
        &mut self,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> Result<SubjectCategory, CatalogError> {
        if self.category(id).is_none() {
            return Err(CatalogError::not_found("subject category", id));
        }
        if let Some(name) = &update.name {
            if self.find_category(name).is_some_and(|other| other.id != id) {
                return Err(CatalogError::Conflict(format!(
                    "A subject category named '{name}' already exists."
                )));
            }
        }

        let category = self
            .categories
            .get_mut(&id)
            .ok_or_else(|| CatalogError::not_found("subject category", id))?;
        if let Some(name) = update.name {
            category.name = name;
        }
        if let Some(icon) = update.icon {
            category.icon = icon;
        }
        if let Some(description) = update.description {
            category.description = description;
        }
        Ok(category.clone())
    }

    pub fn remove_category(&mut self, id: CategoryId) -> Result<SubjectCategory, CatalogError> {
        let category = self
            .category(id)
            .ok_or_else(|| CatalogError::not_found("subject category", id))?;
        let subjects = self.subjects_of_category(id).len();
        if subjects > 0 {
            return Err(CatalogError::in_use(&category.name, subjects, "subject"));
        }
        self.categories
            .remove(&id)
            .ok_or_else(|| CatalogError::not_found("subject category", id))
    }

    // Subjects

    pub fn subject(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.get(&id)
    }

    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.values()
    }

    pub fn find_subject(&self, name: &str, category: CategoryId) -> Option<&Subject> {
        self.subjects
            .values()
            .find(|subject| subject.category == category && subject.name == name)
    }

    /// Subjects linked to a grade, ordered by name.
    pub fn subjects_of_grade(&self, grade: GradeId) -> Vec<&Subject> {
        let mut subjects: Vec<_> = self
            .subjects
            .values()
            .filter(|subject| subject.is_linked_to(grade))
            .collect();
        subjects.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        subjects
    }

    pub fn subjects_of_category(&self, category: CategoryId) -> Vec<&Subject> {
        let mut subjects: Vec<_> = self
            .subjects
            .values()
            .filter(|subject| subject.category == category)
            .collect();
        subjects.sort_by(|a, b| a.name.cmp(&b.name));
        subjects
    }

    pub fn is_linked(&self, subject: SubjectId, grade: GradeId) -> bool {
        self.subject(subject)
            .is_some_and(|subject| subject.is_linked_to(grade))
    }

    pub fn create_subject(&mut self, input: NewSubject) -> Result<Subject, CatalogError> {
        let category = self
            .category(input.category)
            .ok_or_else(|| CatalogError::not_found("subject category", input.category))?;
        if self.find_subject(&input.name, input.category).is_some() {
            return Err(CatalogError::Conflict(format!(
                "Subject '{}' already exists in category {}.",
                input.name, category.name
            )));
        }
        if let Some(missing) = input.grades.iter().find(|grade| self.grade(**grade).is_none()) {
            return Err(CatalogError::not_found("grade", missing));
        }

        let mut subject = self.insert_subject(&input.name, input.category, input.description);
        subject.grades.extend(input.grades);
        self.subjects.insert(subject.id, subject.clone());
        Ok(subject)
    }

    /// Keyed on (name, category). A same-named subject under another category is a separate row.
    pub fn find_or_create_subject(
        &mut self,
        name: &str,
        category: CategoryId,
        description: &str,
    ) -> Result<Lookup<Subject>, CatalogError> {
        if self.category(category).is_none() {
            return Err(CatalogError::not_found("subject category", category));
        }
        match self.find_subject(name, category) {
            Some(subject) => Ok(Lookup::Found(subject.clone())),
            None => Ok(Lookup::Created(self.insert_subject(
                name,
                category,
                description.to_string(),
            ))),
        }
    }

    fn insert_subject(&mut self, name: &str, category: CategoryId, description: String) -> Subject {
        let subject = Subject {
            id: SubjectId(self.allocate()),
            name: name.to_string(),
            category,
            grades: BTreeSet::new(),
            description,
        };
        self.subjects.insert(subject.id, subject.clone());
        subject
    }

    pub fn update_subject(
        &mut self,
        id: SubjectId,
        update: SubjectUpdate,
    ) -> Result<Subject, CatalogError> {
        let current = self
            .subject(id)
            .ok_or_else(|| CatalogError::not_found("subject", id))?;
        let category_id = update.category.unwrap_or(current.category);
        let name = update.name.as_deref().unwrap_or(&current.name);
        let category = self
            .category(category_id)
            .ok_or_else(|| CatalogError::not_found("subject category", category_id))?;
        if self
            .find_subject(name, category_id)
            .is_some_and(|other| other.id != id)
        {
            return Err(CatalogError::Conflict(format!(
                "Subject '{name}' already exists in category {}.",
                category.name
            )));
        }
        if let Some(missing) = update
            .grades
            .iter()
            .flatten()
            .find(|grade| self.grade(**grade).is_none())
        {
            return Err(CatalogError::not_found("grade", missing));
        }

        let subject = self
            .subjects
            .get_mut(&id)
            .ok_or_else(|| CatalogError::not_found("subject", id))?;
        subject.category = category_id;
        if let Some(name) = update.name {
            subject.name = name;
        }
        if let Some(grades) = update.grades {
            subject.grades = grades.into_iter().collect();
        }
        if let Some(description) = update.description {
            subject.description = description;
        }
        Ok(subject.clone())
    }

    /// Refused while resources (active or hidden) or pathways still point at the subject.
    pub fn remove_subject(&mut self, id: SubjectId) -> Result<Subject, CatalogError> {
        let subject = self
            .subject(id)
            .ok_or_else(|| CatalogError::not_found("subject", id))?;
        let resources = self
            .resources
            .values()
            .filter(|resource| resource.subject == id)
            .count();
        if resources > 0 {
            return Err(CatalogError::in_use(&subject.name, resources, "resource"));
        }
        let pathways = self
            .pathways
            .values()
            .filter(|pathway| pathway.subjects.contains(&id))
            .count();
        if pathways > 0 {
            return Err(CatalogError::in_use(&subject.name, pathways, "pathway"));
        }
        self.subjects
            .remove(&id)
            .ok_or_else(|| CatalogError::not_found("subject", id))
    }

    /// Idempotent; returns `true` only when a new link was added. Links are never removed here.
    pub fn link_subject_to_grade(
        &mut self,
        subject: SubjectId,
        grade: GradeId,
    ) -> Result<bool, CatalogError> {
        if self.grade(grade).is_none() {
            return Err(CatalogError::not_found("grade", grade));
        }
        let subject = self
            .subjects
            .get_mut(&subject)
            .ok_or_else(|| CatalogError::not_found("subject", subject))?;
        Ok(subject.grades.insert(grade))
    }

    // Pathways

    pub fn pathway(&self, id: PathwayId) -> Option<&Pathway> {
        self.pathways.get(&id)
    }

    pub fn pathways(&self) -> impl Iterator<Item = &Pathway> {
        self.pathways.values()
    }

    pub fn pathways_of_grade(&self, grade: GradeId) -> Vec<&Pathway> {
        let mut pathways: Vec<_> = self
            .pathways
            .values()
            .filter(|pathway| pathway.grade == grade)
            .collect();
        pathways.sort_by(|a, b| a.name.cmp(&b.name));
        pathways
    }

    pub fn subjects_of_pathway(&self, pathway: PathwayId) -> Vec<&Subject> {
        let Some(pathway) = self.pathway(pathway) else {
            return Vec::new();
        };
        let mut subjects: Vec<_> = pathway
            .subjects
            .iter()
            .filter_map(|id| self.subject(*id))
            .collect();
        subjects.sort_by(|a, b| a.name.cmp(&b.name));
        subjects
    }

    pub fn find_pathway(&self, name: &str, grade: GradeId) -> Option<&Pathway> {
        self.pathways
            .values()
            .find(|pathway| pathway.grade == grade && pathway.name == name)
    }

    pub fn create_pathway(&mut self, input: NewPathway) -> Result<Pathway, CatalogError> {
        let grade = self
            .grade(input.grade)
            .ok_or_else(|| CatalogError::not_found("grade", input.grade))?;
        if self.find_pathway(&input.name, input.grade).is_some() {
            return Err(CatalogError::Conflict(format!(
                "Pathway '{}' already exists for {}.",
                input.name, grade.name
            )));
        }
        if let Some(missing) = input
            .subjects
            .iter()
            .find(|subject| self.subject(**subject).is_none())
        {
            return Err(CatalogError::not_found("subject", missing));
        }

        let mut pathway = self.insert_pathway(&input.name, input.grade, input.description);
        pathway.subjects.extend(input.subjects);
        self.pathways.insert(pathway.id, pathway.clone());
        Ok(pathway)
    }

    pub fn find_or_create_pathway(
        &mut self,
        name: &str,
        grade: GradeId,
        description: &str,
    ) -> Result<Lookup<Pathway>, CatalogError> {
        if self.grade(grade).is_none() {
            return Err(CatalogError::not_found("grade", grade));
        }
        match self.find_pathway(name, grade) {
            Some(pathway) => Ok(Lookup::Found(pathway.clone())),
            None => Ok(Lookup::Created(self.insert_pathway(
                name,
                grade,
                description.to_string(),
            ))),
        }
    }

    fn insert_pathway(&mut self, name: &str, grade: GradeId, description: String) -> Pathway {
        let pathway = Pathway {
            id: PathwayId(self.allocate()),
            name: name.to_string(),
            grade,
            subjects: BTreeSet::new(),
            description,
        };
        self.pathways.insert(pathway.id, pathway.clone());
        pathway
    }

    pub fn update_pathway(
        &mut self,
        id: PathwayId,
        update: PathwayUpdate,
    ) -> Result<Pathway, CatalogError> {
        let current = self
            .pathway(id)
            .ok_or_else(|| CatalogError::not_found("pathway", id))?;
        let grade_id = update.grade.unwrap_or(current.grade);
        let name = update.name.as_deref().unwrap_or(&current.name);
        let grade = self
            .grade(grade_id)
            .ok_or_else(|| CatalogError::not_found("grade", grade_id))?;
        if self
            .find_pathway(name, grade_id)
            .is_some_and(|other| other.id != id)
        {
            return Err(CatalogError::Conflict(format!(
                "Pathway '{name}' already exists for {}.",
                grade.name
            )));
        }
        if let Some(missing) = update
            .subjects
            .iter()
            .flatten()
            .find(|subject| self.subject(**subject).is_none())
        {
            return Err(CatalogError::not_found("subject", missing));
        }

        let pathway = self
            .pathways
            .get_mut(&id)
            .ok_or_else(|| CatalogError::not_found("pathway", id))?;
        pathway.grade = grade_id;
        if let Some(name) = update.name {
            pathway.name = name;
        }
        if let Some(subjects) = update.subjects {
            pathway.subjects = subjects.into_iter().collect();
        }
        if let Some(description) = update.description {
            pathway.description = description;
        }
        Ok(pathway.clone())
    }

    /// Pathways only bundle subjects, so removing one never orphans anything.
    pub fn remove_pathway(&mut self, id: PathwayId) -> Result<Pathway, CatalogError> {
        self.pathways
            .remove(&id)
            .ok_or_else(|| CatalogError::not_found("pathway", id))
    }

    pub fn link_pathway_subject(
        &mut self,
        pathway: PathwayId,
        subject: SubjectId,
    ) -> Result<bool, CatalogError> {
        if self.subject(subject).is_none() {
            return Err(CatalogError::not_found("subject", subject));
        }
        let pathway = self
            .pathways
            .get_mut(&pathway)
            .ok_or_else(|| CatalogError::not_found("pathway", pathway))?;
        Ok(pathway.subjects.insert(subject))
    }

    // Resource types

    pub fn resource_type(&self, id: ResourceTypeId) -> Option<&ResourceType> {
        self.resource_types.get(&id)
    }

    pub fn resource_types(&self) -> Vec<&ResourceType> {
        let mut types: Vec<_> = self.resource_types.values().collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        types
    }

    pub fn find_resource_type(&self, name: &str) -> Option<&ResourceType> {
        self.resource_types.values().find(|kind| kind.name == name)
    }

    pub fn create_resource_type(
        &mut self,
        input: NewResourceType,
    ) -> Result<ResourceType, CatalogError> {
        if self.find_resource_type(&input.name).is_some() {
            return Err(CatalogError::Conflict(format!(
                "A resource type named '{}' already exists.",
                input.name
            )));
        }
        Ok(self.insert_resource_type(input))
    }

    pub fn find_or_create_resource_type(&mut self, input: NewResourceType) -> Lookup<ResourceType> {
        match self.find_resource_type(&input.name) {
            Some(kind) => Lookup::Found(kind.clone()),
            None => Lookup::Created(self.insert_resource_type(input)),
        }
    }

    fn insert_resource_type(&mut self, input: NewResourceType) -> ResourceType {
        let kind = ResourceType {
            id: ResourceTypeId(self.allocate()),
            name: input.name,
            icon: input
                .icon
                .unwrap_or_else(|| DEFAULT_RESOURCE_TYPE_ICON.to_string()),
            description: input.description,
        };
        self.resource_types.insert(kind.id, kind.clone());
        kind
    }

    pub fn update_resource_type(
        &mut self,
        id: ResourceTypeId,
        update: ResourceTypeUpdate,
    ) -> Result<ResourceType, CatalogError> {
        if self.resource_type(id).is_none() {
            return Err(CatalogError::not_found("resource type", id));
        }
        if let Some(name) = &update.name {
            if self.find_resource_type(name).is_some_and(|other| other.id != id) {
                return Err(CatalogError::Conflict(format!(
                    "A resource type named '{name}' already exists."
                )));
            }
        }

        let kind = self
            .resource_types
            .get_mut(&id)
            .ok_or_else(|| CatalogError::not_found("resource type", id))?;
        if let Some(name) = update.name {
            kind.name = name;
        }
        if let Some(icon) = update.icon {
            kind.icon = icon;
        }
        if let Some(description) = update.description {
            kind.description = description;
        }
        Ok(kind.clone())
    }

    pub fn remove_resource_type(
        &mut self,
        id: ResourceTypeId,
    ) -> Result<ResourceType, CatalogError> {
        let kind = self
            .resource_type(id)
            .ok_or_else(|| CatalogError::not_found("resource type", id))?;
        let resources = self
            .resources
            .values()
            .filter(|resource| resource.resource_type == id)
            .count();
        if resources > 0 {
            return Err(CatalogError::in_use(&kind.name, resources, "resource"));
        }
        self.resource_types
            .remove(&id)
            .ok_or_else(|| CatalogError::not_found("resource type", id))
    }

    // Resources

    pub fn resource(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(&id)
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Duplicate check used by imports: identical title under the same subject.
    pub fn resource_exists(&self, title: &str, subject: SubjectId) -> bool {
        self.resources
            .values()
            .any(|resource| resource.subject == subject && resource.title == title)
    }

    /// Active resources of a subject, newest first.
    pub fn resources_of_subject(&self, subject: SubjectId) -> Vec<&Resource> {
        let mut resources: Vec<_> = self
            .resources
            .values()
            .filter(|resource| resource.subject == subject && resource.is_active)
            .collect();
        resources.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        resources
    }

    /// Everything one actor uploaded, hidden resources included, newest first.
    pub fn resources_uploaded_by(&self, uploader: &UploaderId) -> Vec<&Resource> {
        let mut resources: Vec<_> = self
            .resources
            .values()
            .filter(|resource| &resource.uploaded_by == uploader)
            .collect();
        resources.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        resources
    }

    pub fn insert_resource(&mut self, input: NewResource) -> Result<Resource, CatalogError> {
        if self.subject(input.subject).is_none() {
            return Err(CatalogError::not_found("subject", input.subject));
        }
        if self.resource_type(input.resource_type).is_none() {
            return Err(CatalogError::not_found("resource type", input.resource_type));
        }

        let resource = Resource {
            id: ResourceId(self.allocate()),
            title: input.title,
            subject: input.subject,
            resource_type: input.resource_type,
            uploaded_by: input.uploaded_by,
            uploaded_at: Utc::now(),
            file_path: input.file_path,
            file_url: input.file_url,
            file_size: input.file_size,
            description: input.description,
            allow_download: input.allow_download,
            is_premium: input.is_premium,
            is_active: true,
            download_count: 0,
            view_count: 0,
        };
        self.resources.insert(resource.id, resource.clone());
        Ok(resource)
    }

    fn active_resource_mut(&mut self, id: ResourceId) -> Result<&mut Resource, CatalogError> {
        self.resources
            .get_mut(&id)
            .filter(|resource| resource.is_active)
            .ok_or_else(|| CatalogError::not_found("resource", id))
    }

    pub fn record_view(&mut self, id: ResourceId) -> Result<Resource, CatalogError> {
        let resource = self.active_resource_mut(id)?;
        resource.view_count = resource.view_count.saturating_add(1);
        Ok(resource.clone())
    }

    pub fn record_download(&mut self, id: ResourceId) -> Result<Resource, CatalogError> {
        let resource = self.active_resource_mut(id)?;
        resource.download_count = resource.download_count.saturating_add(1);
        Ok(resource.clone())
    }

    pub fn set_allow_download(
        &mut self,
        id: ResourceId,
        allow: bool,
    ) -> Result<Resource, CatalogError> {
        let resource = self
            .resources
            .get_mut(&id)
            .ok_or_else(|| CatalogError::not_found("resource", id))?;
        resource.allow_download = allow;
        Ok(resource.clone())
    }

    /// Hidden resources drop out of listings, search, view and download but keep their counters.
    pub fn set_active(&mut self, id: ResourceId, active: bool) -> Result<Resource, CatalogError> {
        let resource = self
            .resources
            .get_mut(&id)
            .ok_or_else(|| CatalogError::not_found("resource", id))?;
        resource.is_active = active;
        Ok(resource.clone())
    }

    pub fn update_resource(
        &mut self,
        id: ResourceId,
        update: ResourceUpdate,
    ) -> Result<Resource, CatalogError> {
        if self.resource(id).is_none() {
            return Err(CatalogError::not_found("resource", id));
        }
        if let Some(subject) = update.subject.filter(|subject| self.subject(*subject).is_none()) {
            return Err(CatalogError::not_found("subject", subject));
        }
        if let Some(kind) = update
            .resource_type
            .filter(|kind| self.resource_type(*kind).is_none())
        {
            return Err(CatalogError::not_found("resource type", kind));
        }

        let resource = self
            .resources
            .get_mut(&id)
            .ok_or_else(|| CatalogError::not_found("resource", id))?;
        if let Some(title) = update.title {
            resource.title = title;
        }
        if let Some(description) = update.description {
            resource.description = description;
        }
        if let Some(subject) = update.subject {
            resource.subject = subject;
        }
        if let Some(kind) = update.resource_type {
            resource.resource_type = kind;
        }
        if let Some(allow) = update.allow_download {
            resource.allow_download = allow;
        }
        if let Some(premium) = update.is_premium {
            resource.is_premium = premium;
        }
        Ok(resource.clone())
    }

    pub fn remove_resource(&mut self, id: ResourceId) -> Result<Resource, CatalogError> {
        self.resources
            .remove(&id)
            .ok_or_else(|| CatalogError::not_found("resource", id))
    }
}
