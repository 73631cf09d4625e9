//! REST backend over the hosted PostgREST API

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::models::{FuncaoPermissao, FuncaoPermissaoUpdate, Permissao, Profile, ProfileRolesUpdate};

use super::PermissionBackend;
use crate::config::AccessConfig;
use crate::error::{AccessError, AccessResult};
use crate::identity::{IdentityProvider, SessionUser};

const PROFILES: &str = "rest/v1/profiles";
const ROLES: &str = "rest/v1/bd_funcoes_permissao";
const PERMISSIONS: &str = "rest/v1/bd_permissoes";
const AUTH_USER: &str = "auth/v1/user";

/// HTTP backend
///
/// Every request carries the public `apikey` header and, when a session is
/// present, the user's bearer token so row-level security applies.
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
    api_key: String,
    token: Option<String>,
}

impl RestBackend {
    /// Create a backend from configuration
    pub fn new(config: &AccessConfig) -> AccessResult<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            token: config.access_token.clone(),
        })
    }

    /// Set the session access token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the current token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Attach `apikey` and authorization headers
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.token.as_deref().unwrap_or(&self.api_key);
        request
            .header("apikey", &self.api_key)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {}", bearer))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> AccessResult<T> {
        let request = self.authorize(self.client.get(self.url(path)).query(query));
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    async fn patch<B: Serialize>(&self, path: &str, query: &[(&str, String)], body: &B) -> AccessResult<()> {
        let request = self.authorize(
            self.client
                .patch(self.url(path))
                .query(query)
                .header("Prefer", "return=minimal")
                .json(body),
        );
        let response = request.send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Map non-success statuses onto [`AccessError`]
    async fn check_status(response: reqwest::Response) -> AccessResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await?;
        Err(match status {
            StatusCode::UNAUTHORIZED => AccessError::Unauthorized,
            StatusCode::FORBIDDEN => AccessError::Forbidden(text),
            StatusCode::NOT_FOUND => AccessError::NotFound(text),
            _ => AccessError::Status { status, body: text },
        })
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> AccessResult<T> {
        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| AccessError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl PermissionBackend for RestBackend {
    async fn fetch_profile(&self, user_id: &str) -> AccessResult<Option<Profile>> {
        let rows: Vec<Profile> = self
            .get(
                PROFILES,
                &[
                    ("select", "id,email,nome_completo,funcoes".to_string()),
                    ("id", format!("eq.{}", user_id)),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_role(&self, role_name: &str) -> AccessResult<Option<FuncaoPermissao>> {
        let rows: Vec<FuncaoPermissao> = self
            .get(
                ROLES,
                &[
                    ("select", "*".to_string()),
                    ("nome_funcao", format!("eq.{}", role_name)),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_permissions_by_ids(&self, ids: &[String]) -> AccessResult<Vec<Permissao>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.get(
            PERMISSIONS,
            &[
                ("select", "*".to_string()),
                ("id", format!("in.({})", ids.join(","))),
            ],
        )
        .await
    }

    async fn fetch_all_permissions(&self) -> AccessResult<Vec<Permissao>> {
        self.get(
            PERMISSIONS,
            &[
                ("select", "*".to_string()),
                ("order", "nome_permissao".to_string()),
            ],
        )
        .await
    }

    async fn fetch_all_roles(&self) -> AccessResult<Vec<FuncaoPermissao>> {
        self.get(
            ROLES,
            &[
                ("select", "*".to_string()),
                ("order", "nome_funcao".to_string()),
            ],
        )
        .await
    }

    async fn update_profile_roles(&self, user_id: &str, roles: &[String]) -> AccessResult<()> {
        let body = ProfileRolesUpdate {
            funcoes: roles.to_vec(),
        };
        self.patch(PROFILES, &[("id", format!("eq.{}", user_id))], &body)
            .await
    }

    async fn update_role_permissions(
        &self,
        role_id: &str,
        permission_ids: &[String],
    ) -> AccessResult<()> {
        let body = FuncaoPermissaoUpdate {
            permissoes: permission_ids.to_vec(),
        };
        self.patch(ROLES, &[("id", format!("eq.{}", role_id))], &body)
            .await
    }
}

#[async_trait]
impl IdentityProvider for RestBackend {
    async fn current_user(&self) -> AccessResult<Option<SessionUser>> {
        if self.token.is_none() {
            return Ok(None);
        }
        match self.get::<SessionUser>(AUTH_USER, &[]).await {
            Ok(user) => Ok(Some(user)),
            Err(AccessError::Unauthorized) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
