//! Route permission table
//!
//! Maps application routes to the permission keys that open them. A route
//! opens when any of its keys is granted; unlisted routes only need a session.

use serde::Serialize;
use shared::models::PermissionKey;

use crate::guard::Requirement;
use crate::resolver::UserPermissions;

use PermissionKey::*;

/// Route → required permission keys (any-of)
pub const ROUTE_PERMISSIONS: &[(&str, &[PermissionKey])] = &[
    // Dashboards
    ("/dashboard", &[DashboardView]),
    ("/dashboard-rh", &[DashboardRhView]),
    ("/dashboard-maquinas", &[DashboardMaquinasView]),
    ("/dashboard-cbuq", &[DashboardCbuqView]),
    // Gestão de RH
    ("/gestao-rh/empresas", &[GestaoRhEmpresasView]),
    ("/gestao-rh/departamentos", &[GestaoRhDepartamentosView]),
    ("/gestao-rh/centros-custo", &[GestaoRhCentrosCustoView]),
    ("/gestao-rh/funcoes", &[GestaoRhFuncoesView]),
    ("/gestao-rh/funcionarios", &[GestaoRhFuncionariosView]),
    ("/gestao-rh/equipes", &[GestaoRhEquipesView]),
    // Gestão de Máquinas
    ("/gestao-maquinas/caminhoes", &[GestaoMaquinasCaminhoesView]),
    ("/gestao-maquinas/usinas", &[GestaoMaquinasUsinasView]),
    ("/gestao-maquinas/relatorio-medicao", &[GestaoMaquinasRelatorioMedicaoView]),
    // Direct routes
    ("/registro-aplicacao", &[RequisicoesRegistroAplicacaoView]),
    ("/programacao-entrega", &[RequisicoesProgramacaoEntregaView]),
    // Requisições e Logística
    ("/requisicoes/cadastro", &[RequisicoesCadastroView]),
    ("/requisicoes/registro-cargas", &[RequisicoesRegistroCargasView]),
    ("/requisicoes/apontamento-equipe", &[RequisicoesApontamentoEquipeView]),
    ("/requisicoes/apontamento-caminhoes", &[RequisicoesApontamentoCaminhoesView]),
    ("/requisicoes/chamados-os", &[RequisicoesChamadosOsView]),
    ("/requisicoes/gestao-os", &[RequisicoesGestaoOsView]),
    // Administração
    ("/admin/permissoes", &[AdminPermissoesView]),
];

/// Keys required by `route`, `None` for unrestricted routes
pub fn required_permissions(route: &str) -> Option<&'static [PermissionKey]> {
    let route = normalize(route);
    ROUTE_PERMISSIONS
        .iter()
        .find(|(path, _)| *path == route)
        .map(|(_, keys)| *keys)
}

/// Guard requirement for `route`
pub fn requirement_for(route: &str) -> Requirement {
    match required_permissions(route) {
        Some(keys) => Requirement::any(keys.iter().copied()),
        None => Requirement::Authenticated,
    }
}

pub fn can_access_route(permissions: &UserPermissions, route: &str) -> bool {
    if permissions.is_loading {
        return false;
    }
    match required_permissions(route) {
        Some(keys) => permissions.has_any_permission(keys),
        None => true,
    }
}

/// Listed routes open to `permissions`, in table order
pub fn accessible_routes(permissions: &UserPermissions) -> Vec<&'static str> {
    ROUTE_PERMISSIONS
        .iter()
        .filter(|(path, _)| can_access_route(permissions, path))
        .map(|(path, _)| *path)
        .collect()
}

/// Why a route is open or closed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDiagnosis {
    pub route: String,
    pub required: Vec<PermissionKey>,
    pub missing: Vec<PermissionKey>,
    pub can_access: bool,
}

pub fn diagnose_route(permissions: &UserPermissions, route: &str) -> RouteDiagnosis {
    let required = required_permissions(route).unwrap_or_default().to_vec();
    let missing = if permissions.is_super_admin {
        Vec::new()
    } else {
        permissions.permissions.missing(&required)
    };
    let diagnosis = RouteDiagnosis {
        route: normalize(route).to_string(),
        required,
        missing,
        can_access: can_access_route(permissions, route),
    };
    tracing::debug!(?diagnosis, "Route access diagnosis");
    diagnosis
}

/// Strip query, fragment and trailing slash
fn normalize(route: &str) -> &str {
    let end = route.find(['?', '#']).unwrap_or(route.len());
    let path = &route[..end];
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}
