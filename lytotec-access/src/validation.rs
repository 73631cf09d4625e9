//! Role assignment rules
//!
//! - A role is assigned at most once
//! - `SuperAdm` is exclusive (only the `user` placeholder may sit next to it)
//! - The last real role of a user cannot be removed

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{DEFAULT_ROLE, RoleName, SUPER_ADMIN_ROLE};

/// Check that `new_role` may be added to `current`
pub fn validate_role_assignment(current: &[String], new_role: &str) -> AppResult<()> {
    let new_role = new_role.trim();
    if new_role.is_empty() {
        return Err(AppError::validation("Role name is empty"));
    }

    if current.iter().any(|r| r == new_role) {
        return Err(AppError::with_message(
            ErrorCode::RoleAlreadyAssigned,
            format!("Role '{}' is already assigned to this user", new_role),
        ));
    }

    if new_role == SUPER_ADMIN_ROLE && current.iter().any(|r| r != DEFAULT_ROLE) {
        return Err(AppError::with_message(
            ErrorCode::RoleConflict,
            "SuperAdm users cannot hold other roles",
        ));
    }

    if current.iter().any(|r| r == SUPER_ADMIN_ROLE) {
        return Err(AppError::with_message(
            ErrorCode::RoleConflict,
            "SuperAdm users cannot receive additional roles",
        ));
    }

    Ok(())
}

/// Check that `role` may be removed from `current`
pub fn validate_role_removal(current: &[String], role: &str) -> AppResult<()> {
    let role = role.trim();
    if !current.iter().any(|r| r == role) {
        return Err(AppError::with_message(
            ErrorCode::RoleNotFound,
            format!("Role '{}' is not assigned to this user", role),
        ));
    }

    let real_roles: Vec<&String> = current
        .iter()
        .filter(|r| !RoleName::new(r.as_str()).is_placeholder())
        .collect();
    if real_roles.len() == 1 && real_roles[0] == role {
        return Err(AppError::with_message(
            ErrorCode::LastRoleRemoval,
            "Cannot remove the only role of this user",
        ));
    }

    Ok(())
}

/// Trim, drop blanks and de-duplicate (first occurrence wins)
///
/// An empty result becomes `["user"]`.
pub fn clean_role_list<I, S>(roles: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cleaned: Vec<String> = Vec::new();
    for role in roles {
        let role = role.as_ref().trim();
        if !role.is_empty() && !cleaned.iter().any(|r| r == role) {
            cleaned.push(role.to_string());
        }
    }

    if cleaned.is_empty() {
        cleaned.push(DEFAULT_ROLE.to_string());
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_assignment_rejects_duplicates() {
        let err = validate_role_assignment(&roles(&["Apontador"]), "Apontador").unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleAlreadyAssigned);
    }

    #[test]
    fn test_super_admin_is_exclusive() {
        assert!(validate_role_assignment(&roles(&["user"]), "SuperAdm").is_ok());
        assert!(validate_role_assignment(&roles(&[]), "SuperAdm").is_ok());

        let err = validate_role_assignment(&roles(&["Encarregado"]), "SuperAdm").unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleConflict);

        let err = validate_role_assignment(&roles(&["SuperAdm"]), "Apontador").unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleConflict);
    }

    #[test]
    fn test_regular_roles_combine() {
        assert!(validate_role_assignment(&roles(&["Apontador"]), "Encarregado").is_ok());
        assert!(validate_role_assignment(&roles(&["Apontador"]), "  ").is_err());
    }

    #[test]
    fn test_removal_rules() {
        let err = validate_role_removal(&roles(&["Apontador"]), "Encarregado").unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleNotFound);

        let err = validate_role_removal(&roles(&["user", "Apontador"]), "Apontador").unwrap_err();
        assert_eq!(err.code, ErrorCode::LastRoleRemoval);

        assert!(validate_role_removal(&roles(&["Apontador", "Encarregado"]), "Apontador").is_ok());
        assert!(validate_role_removal(&roles(&["user", "Apontador"]), "user").is_ok());
        assert!(validate_role_removal(&roles(&["Apontador", "Encarregado"]), " Apontador ").is_ok());
    }

    #[test]
    fn test_clean_role_list() {
        assert_eq!(
            clean_role_list([" Apontador", "", "Encarregado", "Apontador"]),
            roles(&["Apontador", "Encarregado"])
        );
        assert_eq!(clean_role_list(["", "  "]), roles(&["user"]));
        assert_eq!(clean_role_list(Vec::<String>::new()), roles(&["user"]));
    }
}
