use async_trait::async_trait;
use pipewright_config::{Pipeline, PipelineId};
use pipewright_editor::{ApiError, CatalogPublisher, PipelineStore, RunSubmitter, Saved};
use pipewright_resolver::{LocalScript, RemoteScript, ScriptSource, SourceError};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::ClientError;

#[derive(Debug, Deserialize)]
struct ScriptContent {
  content: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
  #[serde(default)]
  message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Created {
  id: PipelineId,
  #[serde(default)]
  message: String,
}

#[derive(Debug, Deserialize)]
struct Updated {
  #[serde(default)]
  message: String,
}

#[derive(Debug, Serialize)]
struct RunRequest {
  dry_run: bool,
}

#[derive(Debug, Serialize)]
struct PushPipeline<'a> {
  name: &'a str,
  yaml: &'a str,
}

/// Client for the editor's HTTP API.
///
/// Implements every service seam of the editor core: script content,
/// pipeline persistence, run submission and catalog publishing.
#[derive(Debug, Clone)]
pub struct HttpBackend {
  client: Client,
  base: Url,
}

impl HttpBackend {
  /// Create a client for the server at `base_url`, e.g. `http://localhost:5000`.
  pub fn new(base_url: &str) -> Result<Self, ClientError> {
    Self::with_client(Client::new(), base_url)
  }

  pub fn with_client(client: Client, base_url: &str) -> Result<Self, ClientError> {
    let mut base = Url::parse(base_url)?;
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }
    Ok(Self { client, base })
  }

  pub fn base_url(&self) -> &Url {
    &self.base
  }

  fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
    Ok(self.base.join(path)?)
  }

  fn pipeline_url(&self, id: PipelineId) -> Result<Url, ClientError> {
    self.endpoint(&format!("api/pipelines/{}", id))
  }

  fn script_content_url(&self, path: &str) -> Result<Url, ClientError> {
    let mut url = self.endpoint("api/github/script-content")?;
    url.query_pairs_mut().append_pair("path", path);
    Ok(url)
  }

  fn request(&self, method: Method, url: Url) -> RequestBuilder {
    debug!(%method, %url, "api request");
    self.client.request(method, url)
  }

  async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
    let response = check(request.send().await?).await?;
    Ok(response.json().await?)
  }

  /// Push a compiled workflow document to the remote catalog.
  pub async fn push_pipeline(&self, name: &str, yaml: &str) -> Result<String, ClientError> {
    let url = self.endpoint("api/github/push-pipeline")?;
    let updated: Updated = self
      .send(self.request(Method::POST, url).json(&PushPipeline { name, yaml }))
      .await?;
    Ok(updated.message)
  }
}

/// Turn a non-success response into `ClientError::Status`, taking the
/// message from the `{message}` body when there is one.
async fn check(response: Response) -> Result<Response, ClientError> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  let body = response.text().await.unwrap_or_default();
  Err(ClientError::Status {
    status: status.as_u16(),
    message: error_message(status, &body),
  })
}

fn error_message(status: StatusCode, body: &str) -> String {
  serde_json::from_str::<ErrorBody>(body)
    .ok()
    .and_then(|b| b.message)
    .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

#[async_trait]
impl ScriptSource for HttpBackend {
  async fn list_local_scripts(&self) -> Result<Vec<LocalScript>, SourceError> {
    let url = self.endpoint("api/scripts")?;
    Ok(self.send(self.request(Method::GET, url)).await?)
  }

  async fn list_remote_scripts(&self) -> Result<Vec<RemoteScript>, SourceError> {
    let url = self.endpoint("api/github/scripts")?;
    Ok(self.send(self.request(Method::GET, url)).await?)
  }

  async fn fetch_remote_content(&self, path: &str) -> Result<String, SourceError> {
    let url = self.script_content_url(path)?;
    let content: ScriptContent = self.send(self.request(Method::GET, url)).await?;
    Ok(content.content)
  }
}

#[async_trait]
impl PipelineStore for HttpBackend {
  async fn save(&self, pipeline: &Pipeline, id: Option<PipelineId>) -> Result<Saved, ApiError> {
    match id {
      None => {
        let url = self.endpoint("api/pipelines")?;
        let created: Created = self
          .send(self.request(Method::POST, url).json(pipeline))
          .await?;
        Ok(Saved {
          id: created.id,
          message: created.message,
        })
      }
      Some(id) => {
        let url = self.pipeline_url(id)?;
        let updated: Updated = self
          .send(self.request(Method::PUT, url).json(pipeline))
          .await?;
        Ok(Saved {
          id,
          message: updated.message,
        })
      }
    }
  }

  async fn load(&self, id: PipelineId) -> Result<Pipeline, ApiError> {
    let url = self.pipeline_url(id)?;
    match self.send(self.request(Method::GET, url)).await {
      Err(ClientError::Status { status: 404, .. }) => Err(ApiError::NotFound(id)),
      other => Ok(other?),
    }
  }
}

#[async_trait]
impl RunSubmitter for HttpBackend {
  async fn start_run(&self, id: PipelineId, dry_run: bool) -> Result<(), ApiError> {
    let url = self.endpoint(&format!("api/pipelines/{}/run", id))?;
    let _: Updated = self
      .send(self.request(Method::POST, url).json(&RunRequest { dry_run }))
      .await?;
    Ok(())
  }
}

#[async_trait]
impl CatalogPublisher for HttpBackend {
  async fn publish(&self, name: &str, document: &str) -> Result<(), ApiError> {
    self.push_pipeline(name, document).await?;
    Ok(())
  }
}
