use crate::db::{self, KvStore, APP_DEFINITIONS, PROJECT_DEFINITIONS};
use crate::errors::{ApiError, Result};
use crate::helpers::naming;
use crate::models::{AppDefinition, ProjectDefinition};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

lazy_static! {
    static ref UUID_V4: Regex = Regex::new(
        r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$"
    )
    .expect("valid regex");
}

pub fn is_valid_project_id(id: &str) -> bool {
    UUID_V4.is_match(id)
}

/// Forest of projects grouping apps, stored under `projectDefinitions.<id>`.
pub struct ProjectsStore {
    store: Arc<dyn KvStore>,
}

impl ProjectsStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    async fn read_all(&self) -> Result<HashMap<String, ProjectDefinition>> {
        Ok(db::fetch(self.store.as_ref(), PROJECT_DEFINITIONS)
            .await?
            .unwrap_or_default())
    }

    pub async fn get_all_projects(&self) -> Result<Vec<ProjectDefinition>> {
        let mut projects: Vec<ProjectDefinition> = self.read_all().await?.into_values().collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(projects)
    }

    pub async fn get_project(&self, id: &str) -> Result<ProjectDefinition> {
        db::fetch(self.store.as_ref(), &db::child_key(PROJECT_DEFINITIONS, id))
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Project not found: {}", id)))
    }

    #[tracing::instrument(name = "Add project", skip(self, description))]
    pub async fn add_project(
        &self,
        name: &str,
        parent_project_id: Option<&str>,
        description: &str,
    ) -> Result<ProjectDefinition> {
        let existing = self.read_all().await?;
        let mut id = Uuid::new_v4().to_string();
        while existing.contains_key(&id) {
            id = Uuid::new_v4().to_string();
        }

        let project = ProjectDefinition {
            id: id.clone(),
            name: name.trim().to_string(),
            parent_project_id: parent_project_id
                .map(str::to_string)
                .filter(|p| !p.is_empty()),
            description: description.to_string(),
        };
        self.save_project(&id, &project).await?;
        Ok(project)
    }

    /// Validates and persists exactly `{id, name, parentProjectId, description}`.
    #[tracing::instrument(name = "Save project", skip(self, project))]
    pub async fn save_project(&self, id: &str, project: &ProjectDefinition) -> Result<()> {
        if !naming::is_project_name_allowed(&project.name) {
            return Err(ApiError::bad_name(format!(
                "Project name is not allowed: {:?}",
                project.name
            )));
        }
        if !is_valid_project_id(id) {
            return Err(ApiError::illegal_parameter(format!("Invalid project id: {}", id)));
        }
        if project.id != id {
            return Err(ApiError::illegal_parameter(format!(
                "Project id mismatch: {} vs {}",
                id, project.id
            )));
        }

        let projects = self.read_all().await?;

        if let Some(parent) = project.parent() {
            if !is_valid_project_id(parent) {
                return Err(ApiError::illegal_parameter(format!(
                    "Invalid parent project id: {}",
                    parent
                )));
            }
            if parent == id {
                return Err(ApiError::illegal_parameter("A project cannot be its own parent"));
            }
            if !projects.contains_key(parent) {
                return Err(ApiError::not_found(format!("Parent project not found: {}", parent)));
            }

            // Walking up from the new parent must never reach this project.
            let mut cursor = projects.get(parent).and_then(|p| p.parent());
            let mut seen = HashSet::new();
            while let Some(ancestor) = cursor {
                if ancestor == id {
                    return Err(ApiError::illegal_parameter(
                        "A project cannot be moved under its own descendant",
                    ));
                }
                if !seen.insert(ancestor) {
                    break;
                }
                cursor = projects.get(ancestor).and_then(|p| p.parent());
            }
        }

        let stripped = ProjectDefinition {
            id: id.to_string(),
            name: project.name.clone(),
            parent_project_id: project.parent().map(str::to_string),
            description: project.description.clone(),
        };
        db::save(self.store.as_ref(), &db::child_key(PROJECT_DEFINITIONS, id), &stripped).await
    }

    /// Deterministic order in which every child comes before its parent.
    ///
    /// Roots (no parent, or a parent outside the given set) sorted by id
    /// descending, each subtree walked depth-first parent-first with children
    /// sorted by id descending, and the whole sequence reversed.
    pub fn organize_from_the_leafs_to_root(projects: &[ProjectDefinition]) -> Vec<ProjectDefinition> {
        let ids: HashSet<&str> = projects.iter().map(|p| p.id.as_str()).collect();
        let mut children: HashMap<&str, Vec<&ProjectDefinition>> = HashMap::new();
        let mut roots: Vec<&ProjectDefinition> = vec![];

        for project in projects {
            match project.parent().filter(|parent| ids.contains(parent) && *parent != project.id) {
                Some(parent) => children.entry(parent).or_default().push(project),
                None => roots.push(project),
            }
        }

        roots.sort_by(|a, b| b.id.cmp(&a.id));
        for siblings in children.values_mut() {
            siblings.sort_by(|a, b| b.id.cmp(&a.id));
        }

        let mut ordered: Vec<ProjectDefinition> = Vec::with_capacity(projects.len());
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&ProjectDefinition> = roots.into_iter().rev().collect();

        while let Some(node) = stack.pop() {
            if !visited.insert(node.id.as_str()) {
                continue;
            }
            ordered.push(node.clone());
            if let Some(kids) = children.get(node.id.as_str()) {
                stack.extend(kids.iter().rev());
            }
        }

        // Members of a parent cycle are unreachable from any root.
        let mut stranded: Vec<&ProjectDefinition> = projects
            .iter()
            .filter(|p| !visited.contains(p.id.as_str()))
            .collect();
        stranded.sort_by(|a, b| b.id.cmp(&a.id));
        ordered.extend(stranded.into_iter().cloned());

        ordered.reverse();
        ordered
    }

    /// Deletes children before parents, one at a time.
    #[tracing::instrument(name = "Delete projects", skip(self))]
    pub async fn delete_projects(&self, ids: &[String]) -> Result<()> {
        let all = self.read_all().await?;
        if let Some(missing) = ids.iter().find(|id| !all.contains_key(*id)) {
            return Err(ApiError::not_found(format!("Project not found: {}", missing)));
        }

        let selected: Vec<ProjectDefinition> = all
            .into_values()
            .filter(|p| ids.contains(&p.id))
            .collect();

        for project in Self::organize_from_the_leafs_to_root(&selected) {
            self.delete_project(&project.id).await?;
        }
        Ok(())
    }

    /// Resolves once the deletion is durably committed.
    #[tracing::instrument(name = "Delete project", skip(self))]
    pub async fn delete_project(&self, id: &str) -> Result<()> {
        self.get_project(id).await?;

        let apps: HashMap<String, AppDefinition> = db::fetch(self.store.as_ref(), APP_DEFINITIONS)
            .await?
            .unwrap_or_default();
        if let Some((name, _)) = apps
            .iter()
            .find(|(_, app)| app.project_id.as_deref() == Some(id))
        {
            return Err(ApiError::illegal_operation(format!(
                "Project still has apps, e.g. {}",
                name
            )));
        }

        if let Some(child) = self
            .read_all()
            .await?
            .values()
            .find(|p| p.parent() == Some(id))
        {
            return Err(ApiError::illegal_operation(format!(
                "Project still has sub-projects, e.g. {}",
                child.name
            )));
        }

        self.store
            .delete(&db::child_key(PROJECT_DEFINITIONS, id))
            .await?;
        tracing::info!("Project {} deleted", id);
        Ok(())
    }
}
