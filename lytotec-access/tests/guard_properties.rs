use std::sync::Arc;

use lytotec_access::{
    AccessContext, AccessDecision, GuardShell, GuardView, Identity, InMemoryBackend,
    NavigationHistory, PermissionCache, PermissionKey, Redirect, Requirement, SessionUser,
    StaticIdentity, UserPermissions, decide, routes,
};

fn backend() -> Arc<InMemoryBackend> {
    let backend = Arc::new(InMemoryBackend::with_catalog());
    backend.insert_role(
        "Apontador",
        &[
            PermissionKey::RequisicoesApontamentoEquipeView,
            PermissionKey::RequisicoesApontamentoCaminhoesView,
        ],
    );
    backend.insert_role("Encarregado", &[PermissionKey::GestaoRhEquipesView]);
    backend.insert_user("apontador", &["Apontador"]);
    backend.insert_user("root", &["SuperAdm"]);
    backend.insert_user("pending", &[]);
    backend
}

fn context(backend: &Arc<InMemoryBackend>, session: Option<&str>) -> AccessContext {
    AccessContext::new(
        Arc::new(StaticIdentity::new(session.map(SessionUser::new))),
        backend.clone(),
        PermissionCache::default(),
    )
}

fn requirements() -> Vec<Requirement> {
    vec![
        Requirement::Authenticated,
        Requirement::Dashboard,
        Requirement::permission(PermissionKey::AdminPermissoesView),
        Requirement::any([PermissionKey::DashboardView, PermissionKey::GestaoRhEquipesView]),
        Requirement::all(PermissionKey::ALL.iter().copied()),
    ]
}

#[tokio::test]
async fn unauthenticated_sessions_always_go_to_login() {
    let backend = backend();
    let ctx = context(&backend, None);

    for requirement in requirements() {
        let history = Arc::new(NavigationHistory::new());
        let shell = GuardShell::new(requirement.clone(), history.clone());

        let mut mount = ctx.mount(requirement);
        assert_eq!(mount.settled().await, AccessDecision::DenyUnauthenticated);
        assert_eq!(
            mount.render(&shell, || "page"),
            GuardView::Redirecting(Redirect::Login)
        );
        assert_eq!(history.redirects(), vec![Redirect::Login]);
    }
    assert_eq!(backend.profile_fetches(), 0);
}

#[tokio::test]
async fn unauthorized_users_go_to_waiting_approval_never_login() {
    let backend = backend();

    for user in ["apontador", "pending"] {
        let ctx = context(&backend, Some(user));
        let history = Arc::new(NavigationHistory::new());
        let requirement = Requirement::permission(PermissionKey::AdminPermissoesView);
        let shell = GuardShell::new(requirement.clone(), history.clone());

        let mut mount = ctx.mount(requirement);
        assert_eq!(mount.settled().await, AccessDecision::DenyUnauthorized);
        mount.render(&shell, || ());
        assert_eq!(history.redirects(), vec![Redirect::WaitingApproval]);
    }
}

#[tokio::test]
async fn apontador_cannot_open_permission_management() {
    let backend = backend();
    let ctx = context(&backend, Some("apontador"));
    let history = Arc::new(NavigationHistory::new());
    let requirement = routes::requirement_for("/admin/permissoes");
    let shell = GuardShell::new(requirement.clone(), history.clone());

    let identity = ctx.current_identity().await;
    let permissions = ctx.current_permissions().await;
    assert!(!permissions.has_permission(PermissionKey::AdminPermissoesView));
    assert_eq!(
        decide(&identity, Some(&permissions), &requirement),
        AccessDecision::DenyUnauthorized
    );

    let view = shell.render(&identity, Some(&permissions), || "permissoes");
    assert_eq!(view, GuardView::Redirecting(Redirect::WaitingApproval));
    assert_eq!(history.last(), Some(Redirect::WaitingApproval));

    assert!(routes::can_access_route(&permissions, "/requisicoes/apontamento-equipe"));
}

#[tokio::test]
async fn super_admin_renders_every_gated_page() {
    let backend = backend();
    let ctx = context(&backend, Some("root"));
    let history = Arc::new(NavigationHistory::new());

    for requirement in requirements() {
        let shell = GuardShell::new(requirement.clone(), history.clone());
        let mut mount = ctx.mount(requirement);
        assert_eq!(mount.settled().await, AccessDecision::Allow);
        assert_eq!(mount.render(&shell, || "page").content(), Some("page"));
    }
    assert!(history.redirects().is_empty());
}

#[test]
fn super_admin_with_empty_permission_list_is_allowed() {
    let identity = Identity::authenticated("root");
    let permissions = UserPermissions {
        is_super_admin: true,
        can_access_dashboard: true,
        ..UserPermissions::denied(Some("root".into()))
    };
    assert!(permissions.permissions.is_empty());

    for (route, _) in routes::ROUTE_PERMISSIONS {
        let decision = decide(&identity, Some(&permissions), &routes::requirement_for(route));
        assert!(decision.can_access(), "{} should be open", route);
    }
}

#[test]
fn loading_state_renders_only_placeholder() {
    let history = Arc::new(NavigationHistory::new());
    let cases = [
        (Identity::loading(), None),
        (Identity::loading(), Some(UserPermissions::loading())),
        (Identity::authenticated("u-1"), None),
        (Identity::authenticated("u-1"), Some(UserPermissions::loading())),
    ];

    for requirement in requirements().into_iter().skip(1) {
        let shell = GuardShell::new(requirement, history.clone());
        for (identity, permissions) in &cases {
            let mut rendered = false;
            let view = shell.render(identity, permissions.as_ref(), || rendered = true);
            assert_eq!(view, GuardView::Loading);
            assert!(!rendered);
        }
    }
    assert!(history.redirects().is_empty());
}

#[tokio::test]
async fn backend_failure_fails_closed_to_waiting_approval() {
    let backend = backend();
    backend.fail_with("connection refused");
    let ctx = context(&backend, Some("root"));

    let mut mount = ctx.mount(Requirement::Dashboard);
    assert_eq!(mount.settled().await, AccessDecision::DenyUnauthorized);
    assert_eq!(
        mount.decision().redirect(),
        Some(Redirect::WaitingApproval)
    );
}
