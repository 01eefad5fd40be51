use actix_cors::Cors;
use actix_web::http;

pub fn configure_cors(allowed_origins: &[String]) -> Cors {
    // No configured origins keeps the API open to any browser client
    if allowed_origins.is_empty() {
        return Cors::permissive();
    }

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![http::header::CONTENT_TYPE])
        .expose_headers(vec![http::header::LOCATION])
        .max_age(3600);

    for origin in allowed_origins {
        cors = cors.allowed_origin(origin);
    }

    cors
}
