//! Role Model
//!
//! Roles ("funções") are named bundles of permission ids stored in
//! `bd_funcoes_permissao`. A user holds role names in `profiles.funcoes`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role that bypasses every specific permission check
pub const SUPER_ADMIN_ROLE: &str = "SuperAdm";

/// Placeholder role for users without a real role
pub const DEFAULT_ROLE: &str = "user";

/// Role name (e.g. `"SuperAdm"`, `"Encarregado"`, `"Apontador"`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(String);

impl RoleName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `SuperAdm` role
    pub fn is_super_admin(&self) -> bool {
        self.0 == SUPER_ADMIN_ROLE
    }

    /// Blank or the `user` placeholder; grants nothing on its own
    pub fn is_placeholder(&self) -> bool {
        let trimmed = self.0.trim();
        trimmed.is_empty() || trimmed == DEFAULT_ROLE
    }

    pub fn super_admin() -> Self {
        Self::new(SUPER_ADMIN_ROLE)
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoleName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RoleName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for RoleName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Role → permission mapping row (`bd_funcoes_permissao`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncaoPermissao {
    pub id: String,
    pub nome_funcao: String,
    #[serde(default)]
    pub descricao: Option<String>,
    /// Permission ids (`bd_permissoes.id`)
    #[serde(default)]
    pub permissoes: Vec<String>,
}

/// Update role permissions payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuncaoPermissaoUpdate {
    pub permissoes: Vec<String>,
}
