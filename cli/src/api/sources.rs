//! Projects and Sources

use tracing::debug;

use super::client::ApiClient;
use super::error::{ApiError, ApiResult};
use super::types::{Project, ProjectsResponse, Source, SourceWithProject, SourcesResponse};

impl ApiClient {
    /// List every project visible to the credential.
    pub async fn list_projects(&self) -> ApiResult<Vec<Project>> {
        let resp: ProjectsResponse = self.get_json("/api/projects").await?;
        Ok(resp.projects)
    }

    /// List the sources of one project.
    pub async fn list_sources(&self, project_id: u64) -> ApiResult<Vec<Source>> {
        let resp: SourcesResponse = self
            .get_json(&format!("/api/projects/{project_id}/sources"))
            .await?;
        Ok(resp.sources)
    }

    /// Find a source by its public ingestion id, searching every project.
    ///
    /// Projects whose source listing fails are skipped.
    pub async fn find_source(&self, ingestion_id: &str) -> ApiResult<SourceWithProject> {
        let projects = self.list_projects().await?;

        for project in projects {
            let sources = match self.list_sources(project.id).await {
                Ok(sources) => sources,
                Err(e) => {
                    debug!(project_id = project.id, error = %e, "Skipping project, failed to list sources");
                    continue;
                }
            };

            if let Some(source) = sources.into_iter().find(|s| s.ingestion_id == ingestion_id) {
                return Ok(SourceWithProject {
                    source,
                    project_id: project.id,
                });
            }
        }

        Err(ApiError::NotFound(format!(
            "source with ingestion_id '{ingestion_id}'"
        )))
    }
}
