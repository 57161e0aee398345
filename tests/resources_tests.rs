mod support;

use pretty_assertions::assert_eq;
use serde_json::json;
use solinte::error::SolinteError;
use solinte::Params;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::authenticated_client;

async fn mock_get(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn mock_post(server: &MockServer, route: &str, expected: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(route))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(expected))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn email_and_perfil() {
    let server = MockServer::start().await;
    mock_get(&server, "/api.v1/usuario/email", json!({ "email": "ana@example.com" })).await;
    mock_get(&server, "/api.v1/usuario/perfil", json!({ "nombre": "Ana" })).await;

    let mut client = authenticated_client(&server, "tok");
    let email = client.usuario().email().get().await.expect("email");
    let perfil = client.usuario().perfil().get().await.expect("perfil");

    assert_eq!(email["email"], "ana@example.com");
    assert_eq!(perfil["nombre"], "Ana");
}

#[tokio::test]
async fn roles_listing() {
    let server = MockServer::start().await;
    mock_get(&server, "/api.v1/usuario/roles", json!([{ "rid": "1" }, { "rid": "2" }])).await;

    let mut client = authenticated_client(&server, "tok");
    let roles = client.usuario().roles().get().await.expect("roles");
    assert_eq!(roles.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn saldo_defaults_to_today() {
    let server = MockServer::start().await;
    mock_get(&server, "/api.v1/usuario/roles/saldo/42/hoy", json!({ "saldo": 10 })).await;
    mock_get(
        &server,
        "/api.v1/usuario/roles/saldo/42/2024-03-01",
        json!({ "saldo": 3 }),
    )
    .await;

    let mut client = authenticated_client(&server, "tok");
    let today = client.usuario().roles().saldo("42", None).await.expect("saldo");
    let dated = client
        .usuario()
        .roles()
        .saldo("42", Some("2024-03-01"))
        .await
        .expect("saldo");

    assert_eq!(today["saldo"], 10);
    assert_eq!(dated["saldo"], 3);
}

#[tokio::test]
async fn saldo_escapes_path_segments() {
    let server = MockServer::start().await;
    mock_get(
        &server,
        "/api.v1/usuario/roles/saldo/7%2F..%2Foculta/hoy%3Fx%3D1",
        json!({ "saldo": 0 }),
    )
    .await;

    let mut client = authenticated_client(&server, "tok");
    let body = client
        .usuario()
        .roles()
        .saldo("7/../oculta", Some("hoy?x=1"))
        .await
        .expect("saldo");
    assert_eq!(body["saldo"], 0);
}

#[tokio::test]
async fn incorpora_posts_all_params() {
    let server = MockServer::start().await;
    let body = json!({
        "descripcion": "Casa",
        "cuis": "20-12345678-9",
        "rol_codigo": "A1",
        "rol_verificador": "V",
        "alias": "principal"
    });
    mock_post(&server, "/api.v1/usuario/roles/incorpora", body.clone()).await;

    let mut client = authenticated_client(&server, "tok");
    let params: Params = body.as_object().cloned().expect("object");
    client
        .usuario()
        .roles()
        .incorpora(params)
        .await
        .expect("incorpora");
}

#[tokio::test]
async fn incorpora_without_required_param_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut client = authenticated_client(&server, "tok");
    let params: Params = json!({ "descripcion": "Casa", "cuis": "1", "rol_codigo": "A1" })
        .as_object()
        .cloned()
        .expect("object");
    let err = client
        .usuario()
        .roles()
        .incorpora(params)
        .await
        .unwrap_err();

    match err {
        SolinteError::InvalidArgument(message) => {
            assert_eq!(message, "Parameter 'rol_verificador' is required")
        }
        other => panic!("expected invalid argument, got {other:?}"),
    }
}

#[tokio::test]
async fn oculta_and_renombra() {
    let server = MockServer::start().await;
    mock_post(&server, "/api.v1/usuario/roles/oculta", json!({ "rid": "7" })).await;
    mock_post(
        &server,
        "/api.v1/usuario/roles/renombra",
        json!({ "rid": "7", "descripcion": "Oficina" }),
    )
    .await;

    let mut client = authenticated_client(&server, "tok");
    client.usuario().roles().oculta("7").await.expect("oculta");
    client
        .usuario()
        .roles()
        .renombra("7", "Oficina")
        .await
        .expect("renombra");
}

#[tokio::test]
async fn comparte_includes_emails_only_when_given() {
    let server = MockServer::start().await;
    mock_post(
        &server,
        "/api.v1/usuario/roles/comparte",
        json!({ "rid": "7", "metodo": "email", "emails": "a@b.c,d@e.f" }),
    )
    .await;
    mock_post(
        &server,
        "/api.v1/usuario/roles/comparte",
        json!({ "rid": "8", "metodo": "link" }),
    )
    .await;

    let mut client = authenticated_client(&server, "tok");
    client
        .usuario()
        .roles()
        .comparte("7", "email", Some("a@b.c,d@e.f"))
        .await
        .expect("comparte with emails");
    client
        .usuario()
        .roles()
        .comparte("8", "link", Some(""))
        .await
        .expect("comparte without emails");
}
