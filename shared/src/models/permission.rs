//! Permission Model
//!
//! Closed catalog of the permission keys granted through roles
//! (`bd_permissoes.nome_permissao`). Keys are page-view rights grouped by
//! application module:
//! - `dashboard_*`: dashboards
//! - `gestao_rh_*`: HR management (companies, departments, cost centers, ...)
//! - `gestao_maquinas_*`: trucks/equipment and asphalt plants
//! - `requisicoes_*`: requisitions, delivery programming, load records
//! - `admin_*`: permission administration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

macro_rules! permission_keys {
    ($( $(#[$meta:meta])* $variant:ident => $key:literal ),+ $(,)?) => {
        /// Known permission key
        ///
        /// Serialized as the backend string (e.g. `"gestao_rh_empresas_view"`).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum PermissionKey {
            $( $(#[$meta])* #[serde(rename = $key)] $variant, )+
        }

        impl PermissionKey {
            /// Every key in the catalog, in declaration order
            pub const ALL: &'static [PermissionKey] = &[ $( PermissionKey::$variant ),+ ];

            /// Backend string for this key
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $( PermissionKey::$variant => $key ),+
                }
            }
        }
    };
}

permission_keys! {
    // === Dashboards ===
    /// Main dashboard (baseline for every approved user)
    DashboardView => "dashboard_view",
    DashboardRhView => "dashboard_rh_view",
    DashboardMaquinasView => "dashboard_maquinas_view",
    DashboardCbuqView => "dashboard_cbuq_view",
    /// Legacy alias of `dashboard_rh_view`
    AcessoDashboardRh => "acesso_dashboard_rh",

    // === Gestão de RH ===
    GestaoRhEmpresasView => "gestao_rh_empresas_view",
    GestaoRhDepartamentosView => "gestao_rh_departamentos_view",
    GestaoRhCentrosCustoView => "gestao_rh_centros_custo_view",
    GestaoRhFuncoesView => "gestao_rh_funcoes_view",
    GestaoRhFuncionariosView => "gestao_rh_funcionarios_view",
    GestaoRhEquipesView => "gestao_rh_equipes_view",

    // === Gestão de Máquinas ===
    GestaoMaquinasCaminhoesView => "gestao_maquinas_caminhoes_view",
    GestaoMaquinasUsinasView => "gestao_maquinas_usinas_view",
    GestaoMaquinasRelatorioMedicaoView => "gestao_maquinas_relatorio_medicao_view",

    // === Requisições e Logística ===
    RequisicoesCadastroView => "requisicoes_cadastro_view",
    RequisicoesProgramacaoEntregaView => "requisicoes_programacao_entrega_view",
    RequisicoesRegistroCargasView => "requisicoes_registro_cargas_view",
    RequisicoesRegistroAplicacaoView => "requisicoes_registro_aplicacao_view",
    RequisicoesApontamentoEquipeView => "requisicoes_apontamento_equipe_view",
    RequisicoesApontamentoCaminhoesView => "requisicoes_apontamento_caminhoes_view",
    RequisicoesChamadosOsView => "requisicoes_chamados_os_view",
    RequisicoesGestaoOsView => "requisicoes_gestao_os_view",
    /// Legacy alias of `requisicoes_registro_aplicacao_view`
    RegistroAplicacaoView => "registro_aplicacao_view",
    /// Legacy alias of `requisicoes_programacao_entrega_view`
    ProgramacaoEntregaView => "programacao_entrega_view",
    RelatorioAplicacaoView => "relatorio_aplicacao_view",

    // === Administração ===
    AdminPermissoesView => "admin_permissoes_view",
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a permission string that is not in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown permission key: {0}")]
pub struct UnknownPermissionKey(pub String);

impl FromStr for PermissionKey {
    type Err = UnknownPermissionKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        PermissionKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == trimmed)
            .ok_or_else(|| UnknownPermissionKey(s.to_string()))
    }
}

/// Permission row (`bd_permissoes`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissao {
    pub id: String,
    pub nome_permissao: String,
    #[serde(default)]
    pub descricao: Option<String>,
}

impl Permissao {
    /// Parse the stored name into a catalog key
    pub fn key(&self) -> Result<PermissionKey, UnknownPermissionKey> {
        self.nome_permissao.parse()
    }
}
