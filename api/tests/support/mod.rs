use actix_web::{dev::ServiceResponse, http::header, web};
use common::db;
use ecommerce_api::AppState;

pub async fn app_state() -> web::Data<AppState> {
    let pool = db::establish_in_memory()
        .await
        .expect("in-memory database");
    db::create_schema(&pool).await.expect("schema");
    web::Data::new(AppState { pool })
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("Location header")
        .to_owned()
}

/// Pulls the new id out of a `Location` header such as `/customers/3`.
pub fn created_id(location: &str) -> i64 {
    location
        .rsplit('/')
        .next()
        .and_then(|id| id.parse().ok())
        .expect("numeric id at the end of Location")
}

#[macro_export]
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .configure(ecommerce_api::configure),
        )
        .await
    };
}

#[macro_export]
macro_rules! post_json {
    ($app:expr, $uri:expr, $body:expr) => {
        actix_web::test::call_service(
            &$app,
            actix_web::test::TestRequest::post()
                .uri($uri)
                .set_json($body)
                .to_request(),
        )
        .await
    };
}

#[macro_export]
macro_rules! put_json {
    ($app:expr, $uri:expr, $body:expr) => {
        actix_web::test::call_service(
            &$app,
            actix_web::test::TestRequest::put()
                .uri($uri)
                .set_json($body)
                .to_request(),
        )
        .await
    };
}

#[macro_export]
macro_rules! get {
    ($app:expr, $uri:expr) => {
        actix_web::test::call_service(
            &$app,
            actix_web::test::TestRequest::get().uri($uri).to_request(),
        )
        .await
    };
}

#[macro_export]
macro_rules! delete {
    ($app:expr, $uri:expr) => {
        actix_web::test::call_service(
            &$app,
            actix_web::test::TestRequest::delete().uri($uri).to_request(),
        )
        .await
    };
}
