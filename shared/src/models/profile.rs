//! Profile Model

use serde::{Deserialize, Serialize};

use super::role::RoleName;

/// User profile row (`profiles`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Same id as the auth user
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub nome_completo: Option<String>,
    /// Role names; `null` in the database for users awaiting approval
    #[serde(default)]
    pub funcoes: Option<Vec<String>>,
}

impl Profile {
    /// Non-blank role names, in stored order
    pub fn roles(&self) -> Vec<RoleName> {
        self.funcoes
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(RoleName::from)
            .collect()
    }

    /// True when the user holds no role yet
    pub fn is_pending_approval(&self) -> bool {
        self.roles().is_empty()
    }
}

/// Update profile roles payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRolesUpdate {
    pub funcoes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_skip_blank_entries() {
        let profile: Profile = serde_json::from_str(
            r#"{"id":"u-1","email":"a@b.c","funcoes":["Apontador"," ",""]}"#,
        )
        .unwrap();
        assert_eq!(profile.roles(), vec![RoleName::from("Apontador")]);
        assert!(!profile.is_pending_approval());
    }

    #[test]
    fn test_null_funcoes_is_pending() {
        let profile: Profile =
            serde_json::from_str(r#"{"id":"u-2","funcoes":null}"#).unwrap();
        assert!(profile.roles().is_empty());
        assert!(profile.is_pending_approval());
    }
}
