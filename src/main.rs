#[cfg(feature = "http")]
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    use ember_db::Engine;
    use ember_db::network::http_server::run_http_server;
    use std::sync::Arc;
    use tracing_subscriber::EnvFilter;

    const HTTP_PORT: u16 = 8080;
    const DATA_DIR: &str = "data";

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let engine = Arc::new(
        Engine::new(DATA_DIR, true)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?,
    );

    let result = run_http_server(Arc::clone(&engine), &format!("0.0.0.0:{HTTP_PORT}")).await;

    // persist any hot collections before exit; surfaced errors are data at risk
    let errors = engine.flush_all();
    if !errors.is_empty() {
        for e in &errors {
            tracing::error!(error = %e, "failed to flush collection to cold storage");
        }
        std::process::exit(1);
    }

    result
}

#[cfg(not(feature = "http"))]
fn main() {
    println!("No server features enabled.");
    println!("To run the server, build with the http feature, e.g.:");
    println!("  cargo run --features http");
}
