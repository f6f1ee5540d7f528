//! Service tests against a provisioned database.
//!
//! `#[sqlx::test]` gives each test its own freshly-migrated database, so
//! these cover the properties that only hold across real store round trips:
//! refresh-token rotation, item replacement and the delete guard.

use asignaciones_backend::config::Config;
use asignaciones_backend::error::AppError;
use asignaciones_backend::models::asignacion::Month;
use asignaciones_backend::models::user::Role;
use asignaciones_backend::services::asignacion_service::{
    AsignacionPayload, AsignacionService, ItemPayload,
};
use asignaciones_backend::services::auth_service::{AuthService, NewUser};
use asignaciones_backend::services::token_service::TokenService;
use asignaciones_backend::services::user_service::UserService;
use sqlx::PgPool;
use uuid::Uuid;

fn test_config() -> Config {
    Config {
        // The pool comes from the test harness; this URL is never dialed.
        database_url: "postgres://localhost/unused".to_string(),
        database_max_connections: 5,
        bind_address: "127.0.0.1:0".to_string(),
        jwt_access_secret: "store-test-access-secret".to_string(),
        jwt_refresh_secret: "store-test-refresh-secret".to_string(),
        jwt_access_token_expiry_minutes: 15,
        jwt_refresh_token_expiry_days: 7,
        cookie_secure: false,
    }
}

fn auth_service(pool: &PgPool) -> AuthService {
    AuthService::new(pool.clone(), TokenService::new(&test_config()))
}

fn new_viewer(email: &str) -> NewUser {
    NewUser {
        full_name: "Ana García".to_string(),
        email: email.to_string(),
        phone: "555-0101".to_string(),
        password: "correct-horse".to_string(),
        role: Role::Viewer,
    }
}

fn item(name: &str, minutos: i32) -> ItemPayload {
    ItemPayload {
        name: name.to_string(),
        minutos,
        encargado_id: None,
    }
}

fn payload(name: &str, semana: &str) -> AsignacionPayload {
    AsignacionPayload {
        name: name.to_string(),
        semana: semana.to_string(),
        month: Some(Month::Enero),
        parent_id: None,
        presidente_id: None,
        presidente_reunion_id: None,
        lector_reunion_id: None,
        oracion_final_vm_id: None,
        oracion_final_publica_id: None,
        tesoros_de_la_biblia: Some(vec![item("Lectura", 10)]),
        seamos_mejores_maestros: Some(vec![item("Primera conversación", 3)]),
        nuestra_vida_cristiana: Some(vec![item("Estudio bíblico", 30)]),
    }
}

#[sqlx::test]
async fn refresh_rotates_and_rejects_the_previous_token(pool: PgPool) {
    let auth = auth_service(&pool);
    auth.register(new_viewer("rotacion@example.com")).await.unwrap();

    let (_, first) = auth
        .login("rotacion@example.com", "correct-horse")
        .await
        .unwrap();
    let (_, second) = auth.refresh(&first.refresh_token).await.unwrap();
    assert_ne!(first.refresh_token, second.refresh_token);

    // The rotated-out token still verifies cryptographically but no longer
    // matches the stored one.
    let replay = auth.refresh(&first.refresh_token).await;
    assert!(matches!(replay, Err(AppError::Authentication(_))));

    // The current token keeps working.
    assert!(auth.refresh(&second.refresh_token).await.is_ok());
}

#[sqlx::test]
async fn login_invalidates_the_previous_session(pool: PgPool) {
    let auth = auth_service(&pool);
    auth.register(new_viewer("sesion@example.com")).await.unwrap();

    let (_, first) = auth
        .login("sesion@example.com", "correct-horse")
        .await
        .unwrap();
    let (_, second) = auth
        .login("sesion@example.com", "correct-horse")
        .await
        .unwrap();

    assert!(matches!(
        auth.refresh(&first.refresh_token).await,
        Err(AppError::Authentication(_))
    ));
    assert!(auth.refresh(&second.refresh_token).await.is_ok());
}

#[sqlx::test]
async fn logout_clears_the_stored_refresh_token(pool: PgPool) {
    let auth = auth_service(&pool);
    auth.register(new_viewer("salida@example.com")).await.unwrap();

    let (_, pair) = auth
        .login("salida@example.com", "correct-horse")
        .await
        .unwrap();
    auth.logout(&pair.refresh_token).await.unwrap();

    assert!(matches!(
        auth.refresh(&pair.refresh_token).await,
        Err(AppError::Authentication(_))
    ));

    // Logging out again is a no-op, not an error.
    auth.logout(&pair.refresh_token).await.unwrap();
}

#[sqlx::test]
async fn duplicate_email_registration_conflicts(pool: PgPool) {
    let auth = auth_service(&pool);
    auth.register(new_viewer("unica@example.com")).await.unwrap();

    let again = auth.register(new_viewer("unica@example.com")).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
}

#[sqlx::test]
async fn wrong_password_and_unknown_email_look_identical(pool: PgPool) {
    let auth = auth_service(&pool);
    auth.register(new_viewer("existe@example.com")).await.unwrap();

    let bad_password = auth
        .login("existe@example.com", "wrong-password")
        .await
        .unwrap_err();
    let bad_email = auth
        .login("nadie@example.com", "correct-horse")
        .await
        .unwrap_err();

    assert_eq!(bad_password.to_string(), bad_email.to_string());
}

#[sqlx::test]
async fn update_replaces_items_instead_of_merging(pool: PgPool) {
    let svc = AsignacionService::new(pool);
    let created = svc.create(payload("Semana 1", "1-7 Enero")).await.unwrap();
    assert_eq!(created.tesoros_de_la_biblia.len(), 1);
    assert_eq!(created.nuestra_vida_cristiana.len(), 1);

    let mut update = payload("Semana 1", "1-7 Enero");
    update.tesoros_de_la_biblia = Some(vec![item("Busquemos perlas", 8), item("Lectura", 4)]);
    update.seamos_mejores_maestros = Some(vec![item("Revisita", 4)]);
    // Absent category: everything previously stored there goes away.
    update.nuestra_vida_cristiana = None;

    let updated = svc.update(created.id, update).await.unwrap();

    let tesoros: Vec<&str> = updated
        .tesoros_de_la_biblia
        .iter()
        .map(|i| i.name.as_str())
        .collect();
    assert_eq!(tesoros, vec!["Busquemos perlas", "Lectura"]);
    assert_eq!(updated.seamos_mejores_maestros.len(), 1);
    assert!(updated.nuestra_vida_cristiana.is_empty());
    assert_eq!(updated.count.nuestra_vida_cristiana, 0);
}

#[sqlx::test]
async fn items_keep_payload_order(pool: PgPool) {
    let svc = AsignacionService::new(pool);

    let mut p = payload("Semana 2", "8-14 Enero");
    p.tesoros_de_la_biblia = Some(vec![
        item("Discurso", 10),
        item("Busquemos perlas", 8),
        item("Lectura de la Biblia", 4),
    ]);

    let created = svc.create(p).await.unwrap();
    let names: Vec<&str> = created
        .tesoros_de_la_biblia
        .iter()
        .map(|i| i.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["Discurso", "Busquemos perlas", "Lectura de la Biblia"]
    );
}

#[sqlx::test]
async fn delete_guard_reports_the_child_count(pool: PgPool) {
    let svc = AsignacionService::new(pool);
    let parent = svc.create(payload("Mes completo", "Enero")).await.unwrap();

    let mut child = payload("Semana 1", "1-7 Enero");
    child.parent_id = Some(parent.id);
    let first = svc.create(child).await.unwrap();
    let mut child = payload("Semana 2", "8-14 Enero");
    child.parent_id = Some(parent.id);
    let second = svc.create(child).await.unwrap();

    let blocked = svc.delete(parent.id).await;
    assert!(matches!(blocked, Err(AppError::DependentChildren(2))));

    // Once the children are gone the parent deletes normally.
    svc.delete(first.id).await.unwrap();
    svc.delete(second.id).await.unwrap();
    svc.delete(parent.id).await.unwrap();
    assert!(matches!(
        svc.get(parent.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[sqlx::test]
async fn unknown_parent_reference_is_a_validation_error(pool: PgPool) {
    let svc = AsignacionService::new(pool);
    let mut p = payload("Huérfana", "1-7 Enero");
    p.parent_id = Some(Uuid::new_v4());

    assert!(matches!(
        svc.create(p).await,
        Err(AppError::Validation(_))
    ));
}

#[sqlx::test]
async fn list_with_extreme_page_returns_an_empty_page(pool: PgPool) {
    // A page number at the top of the u32 range must produce an empty page,
    // not an offset overflow.
    let svc = AsignacionService::new(pool.clone());
    svc.create(payload("Semana 1", "1-7 Enero")).await.unwrap();

    let (rows, total) = svc.list(u32::MAX, 50, None).await.unwrap();
    assert!(rows.is_empty());
    assert_eq!(total, 1);

    let users = UserService::new(pool);
    let (page, _) = users.list(u32::MAX, 50).await.unwrap();
    assert!(page.is_empty());
    let (hits, _) = users.search("ana", u32::MAX, 20).await.unwrap();
    assert!(hits.is_empty());
}
