use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Project;
use crate::error::Error;
use crate::storage::XmlProjectRepository;

/// Generated ids look like `prj7`; the prefix match is case-insensitive and
/// ids of any other shape are ignored when computing the next id.
static PROJECT_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^prj(\d+)$").expect("Failed to compile project id pattern"));

/// Business outcome of a service call. Validation and not-found are expected
/// conditions carried as values; only `Storage` is a genuine failure.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Project as exposed over the API boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDto {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub abbreviation: String,
    #[serde(default)]
    pub customer: String,
}

/// Creation payload; the id is assigned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub abbreviation: String,
    #[serde(default)]
    pub customer: String,
}

impl From<Project> for ProjectDto {
    fn from(entity: Project) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            abbreviation: entity.abbreviation,
            customer: entity.customer,
        }
    }
}

impl From<&ProjectDto> for Project {
    fn from(dto: &ProjectDto) -> Self {
        Self {
            id: dto.id.clone(),
            name: dto.name.clone(),
            abbreviation: dto.abbreviation.clone(),
            customer: dto.customer.clone(),
        }
    }
}

/// Application service over the XML repository: request validation,
/// sequential id assignment, and DTO mapping.
#[derive(Debug, Clone)]
pub struct ProjectService {
    repository: XmlProjectRepository,
}

impl ProjectService {
    pub fn new(repository: XmlProjectRepository) -> Self {
        Self { repository }
    }

    pub fn get_all(&self) -> ServiceResult<Vec<ProjectDto>> {
        let items = self.repository.list_all()?;
        Ok(items.into_iter().map(ProjectDto::from).collect())
    }

    pub fn get_by_id(&self, id: &str) -> ServiceResult<Option<ProjectDto>> {
        Ok(self.repository.get_by_id(id)?.map(ProjectDto::from))
    }

    pub fn create(&self, request: &CreateProjectRequest) -> ServiceResult<ProjectDto> {
        validate_field(&request.name, "Name")?;
        validate_field(&request.abbreviation, "Abbreviation")?;
        validate_field(&request.customer, "Customer")?;

        let existing = self.repository.list_all()?;
        let entity = Project {
            id: next_project_id(&existing),
            name: request.name.clone(),
            abbreviation: request.abbreviation.clone(),
            customer: request.customer.clone(),
        };

        tracing::info!(id = %entity.id, "creating project");
        let saved = self.repository.upsert(&entity)?;
        Ok(ProjectDto::from(saved))
    }

    pub fn update(&self, dto: &ProjectDto) -> ServiceResult<ProjectDto> {
        if dto.id.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Project ID must not be empty.".to_string(),
            ));
        }
        validate_field(&dto.name, "Name")?;
        validate_field(&dto.abbreviation, "Abbreviation")?;
        validate_field(&dto.customer, "Customer")?;

        if self.repository.get_by_id(&dto.id)?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Project with id '{}' was not found.",
                dto.id
            )));
        }

        tracing::info!(id = %dto.id, "updating project");
        let saved = self.repository.upsert(&Project::from(dto))?;
        Ok(ProjectDto::from(saved))
    }

    pub fn delete(&self, id: &str) -> ServiceResult<()> {
        if id.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Project ID must not be empty.".to_string(),
            ));
        }

        if !self.repository.delete(id)? {
            return Err(ServiceError::NotFound(format!(
                "Project with id '{}' was not found.",
                id
            )));
        }

        tracing::info!(id = %id, "deleted project");
        Ok(())
    }
}

fn validate_field(value: &str, field: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!(
            "{} must not be empty.",
            field
        )));
    }
    Ok(())
}

fn next_project_id(existing: &[Project]) -> String {
    let max = existing
        .iter()
        .filter_map(|p| PROJECT_ID_PATTERN.captures(&p.id))
        .filter_map(|captures| captures[1].parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("prj{}", max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn service(temp_dir: &TempDir) -> ProjectService {
        let config = StorageConfig {
            projects_path: temp_dir.path().join("projects.xml"),
            encoding_name: "windows-1250".to_string(),
        };
        ProjectService::new(XmlProjectRepository::new(&config).unwrap())
    }

    fn create_request(name: &str, abbreviation: &str, customer: &str) -> CreateProjectRequest {
        CreateProjectRequest {
            name: name.to_string(),
            abbreviation: abbreviation.to_string(),
            customer: customer.to_string(),
        }
    }

    #[test]
    fn test_first_create_yields_prj1() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);

        let created = service
            .create(&create_request("Alpha", "A1", "Acme"))
            .unwrap();

        assert_eq!(
            created,
            ProjectDto {
                id: "prj1".to_string(),
                name: "Alpha".to_string(),
                abbreviation: "A1".to_string(),
                customer: "Acme".to_string(),
            }
        );
    }

    #[test]
    fn test_next_id_skips_non_conforming_ids() {
        let existing = [
            Project {
                id: "prj3".to_string(),
                ..Project::default()
            },
            Project {
                id: "prj7".to_string(),
                ..Project::default()
            },
            Project {
                id: "bad-id".to_string(),
                ..Project::default()
            },
        ];
        assert_eq!(next_project_id(&existing), "prj8");
    }

    #[test]
    fn test_next_id_prefix_is_case_insensitive() {
        let existing = [Project {
            id: "PRJ12".to_string(),
            ..Project::default()
        }];
        assert_eq!(next_project_id(&existing), "prj13");
    }

    #[test]
    fn test_create_validates_fields_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);

        let cases = [
            (create_request("", "", ""), "Name must not be empty."),
            (create_request("Alpha", "  ", ""), "Abbreviation must not be empty."),
            (create_request("Alpha", "A1", " "), "Customer must not be empty."),
        ];
        for (request, expected) in cases {
            match service.create(&request) {
                Err(ServiceError::Validation(message)) => assert_eq!(message, expected),
                other => panic!("expected validation failure, got {:?}", other.map(|d| d.id)),
            }
        }

        assert_eq!(service.get_all().unwrap(), vec![]);
    }

    #[test]
    fn test_update_missing_project_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);

        let dto = ProjectDto {
            id: "prj99".to_string(),
            name: "X".to_string(),
            abbreviation: "Y".to_string(),
            customer: "Z".to_string(),
        };
        match service.update(&dto) {
            Err(ServiceError::NotFound(message)) => {
                assert_eq!(message, "Project with id 'prj99' was not found.");
            }
            other => panic!("expected not-found, got {:?}", other.map(|d| d.id)),
        }
    }

    #[test]
    fn test_update_overwrites_all_fields() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);
        let created = service
            .create(&create_request("Alpha", "A1", "Acme"))
            .unwrap();

        let updated = service
            .update(&ProjectDto {
                id: created.id.clone(),
                name: "Beta".to_string(),
                abbreviation: "B2".to_string(),
                customer: "Globex".to_string(),
            })
            .unwrap();

        assert_eq!(service.get_by_id(&created.id).unwrap(), Some(updated));
    }

    #[test]
    fn test_delete_blank_id_is_validation_failure() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);

        match service.delete("") {
            Err(ServiceError::Validation(message)) => {
                assert_eq!(message, "Project ID must not be empty.");
            }
            other => panic!("expected validation failure, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_delete_twice_reports_not_found_second_time() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);
        let created = service
            .create(&create_request("Alpha", "A1", "Acme"))
            .unwrap();

        assert!(service.delete(&created.id).is_ok());
        match service.delete(&created.id) {
            Err(ServiceError::NotFound(message)) => {
                assert_eq!(
                    message,
                    format!("Project with id '{}' was not found.", created.id)
                );
            }
            other => panic!("expected not-found, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_ids_remain_sequential_after_deletes() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);

        let first = service.create(&create_request("A", "A", "A")).unwrap();
        let second = service.create(&create_request("B", "B", "B")).unwrap();
        assert_eq!(first.id, "prj1");
        assert_eq!(second.id, "prj2");

        service.delete(&second.id).unwrap();
        let third = service.create(&create_request("C", "C", "C")).unwrap();
        assert_eq!(third.id, "prj2");
    }
}
