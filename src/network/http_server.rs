#[cfg(feature = "http")]
mod http_impl {
    use crate::db::Engine;
    use crate::error::EmberError;
    use crate::network::http_models::{ErrorResponse, ReadKeyResponse};
    use actix_web::{App, HttpResponse, HttpServer, Responder, web};
    use std::sync::Arc;

    fn error_response(err: &EmberError) -> HttpResponse {
        // absence maps to 404, everything else is an internal error
        if err.is_not_found() {
            HttpResponse::NotFound().json(ErrorResponse::new(404, err.to_string()))
        } else {
            HttpResponse::InternalServerError().json(ErrorResponse::new(500, err.to_string()))
        }
    }

    async fn ready() -> impl Responder {
        HttpResponse::Ok().finish()
    }

    async fn list_collections(engine: web::Data<Arc<Engine>>) -> impl Responder {
        match engine.list_collections() {
            Ok(ids) => HttpResponse::Ok().json(ids),
            Err(e) => error_response(&e),
        }
    }

    async fn read_key(
        engine: web::Data<Arc<Engine>>,
        path: web::Path<(String, String)>,
    ) -> impl Responder {
        let (collection, key) = path.into_inner();
        match engine.read_key(&collection, &key) {
            Ok(value) => HttpResponse::Ok().json(ReadKeyResponse { data: value }),
            Err(e) => error_response(&e),
        }
    }

    async fn write_key(
        engine: web::Data<Arc<Engine>>,
        path: web::Path<(String, String, String)>,
    ) -> impl Responder {
        let (collection, key, value) = path.into_inner();
        match engine.write_key(&collection, &key, &value) {
            Ok(()) => HttpResponse::Ok().finish(),
            Err(e) => error_response(&e),
        }
    }

    pub fn routes(cfg: &mut web::ServiceConfig) {
        cfg.route("/ready", web::get().to(ready))
            .route("/collections", web::get().to(list_collections))
            .service(
                web::scope("/collections")
                    .route("/{collection}/{key}", web::get().to(read_key))
                    .route("/{collection}/{key}/{value}", web::get().to(write_key)),
            );
    }

    pub async fn run_http_server(engine: Arc<Engine>, addr: &str) -> std::io::Result<()> {
        let engine_data = web::Data::new(engine);
        tracing::info!(addr, "listening for traffic");

        HttpServer::new(move || {
            App::new()
                .app_data(engine_data.clone())
                .configure(routes)
        })
        .bind(addr)?
        .run()
        .await
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use actix_web::test;
        use serde_json::Value as JsonValue;

        macro_rules! test_app {
            ($engine:expr) => {
                test::init_service(
                    App::new()
                        .app_data(web::Data::new($engine))
                        .configure(routes),
                )
                .await
            };
        }

        #[actix_web::test]
        async fn ready_answers_ok() {
            let dir = tempfile::tempdir().unwrap();
            let engine = Arc::new(Engine::new(dir.path(), true).unwrap());
            let app = test_app!(engine);

            let resp = test::call_service(&app, test::TestRequest::get().uri("/ready").to_request())
                .await;
            assert!(resp.status().is_success());
        }

        #[actix_web::test]
        async fn write_then_read_over_http() {
            let dir = tempfile::tempdir().unwrap();
            let engine = Arc::new(Engine::new(dir.path(), true).unwrap());
            let app = test_app!(engine);

            let resp = test::call_service(
                &app,
                test::TestRequest::get()
                    .uri("/collections/metrics/cpu/93.5")
                    .to_request(),
            )
            .await;
            assert!(resp.status().is_success());

            let body: JsonValue = test::call_and_read_body_json(
                &app,
                test::TestRequest::get()
                    .uri("/collections/metrics/cpu")
                    .to_request(),
            )
            .await;
            assert_eq!(body["data"], "93.5");
        }

        #[actix_web::test]
        async fn listing_returns_known_collections() {
            let dir = tempfile::tempdir().unwrap();
            let engine = Arc::new(Engine::new(dir.path(), true).unwrap());
            engine.write_key("metrics", "cpu", "93.5").unwrap();
            let app = test_app!(engine);

            let body: JsonValue = test::call_and_read_body_json(
                &app,
                test::TestRequest::get().uri("/collections").to_request(),
            )
            .await;
            assert_eq!(body, serde_json::json!(["metrics"]));
        }

        #[actix_web::test]
        async fn absent_collection_maps_to_404() {
            let dir = tempfile::tempdir().unwrap();
            let engine = Arc::new(Engine::new(dir.path(), true).unwrap());
            let app = test_app!(engine);

            let resp = test::call_service(
                &app,
                test::TestRequest::get()
                    .uri("/collections/ghost/cpu")
                    .to_request(),
            )
            .await;
            assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);

            let body: JsonValue = test::read_body_json(resp).await;
            assert_eq!(body["code"], 404);
        }
    }
}

#[cfg(feature = "http")]
pub use http_impl::{routes, run_http_server};
