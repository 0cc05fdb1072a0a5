use actix_cors::Cors;
use actix_web::{middleware::Compress, web, App, HttpServer};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi; // bring trait into scope for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use phenomena::config::AppConfig;
use phenomena::openapi::ApiDoc;
use phenomena::repo::Repo;
use phenomena::{configure_routes, not_found, AppState};

#[cfg(not(any(feature = "postgres-store", feature = "inmem-store")))]
compile_error!("enable at least one of the `postgres-store` or `inmem-store` features");

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env automatically only in debug builds; deployments set the environment themselves.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cfg = AppConfig::from_env()?;
    info!("Bootstrapping phenomena server");

    #[cfg(feature = "postgres-store")]
    let gateway = {
        let gateway = phenomena::db::Gateway::connect(&cfg.db).await?;
        gateway.migrate().await?;
        gateway
    };
    #[cfg(feature = "postgres-store")]
    let repo: Arc<dyn Repo> = {
        info!("Using Postgres repository backend");
        Arc::new(phenomena::repo::pg::PgRepo::new(gateway.clone()))
    };

    #[cfg(all(feature = "inmem-store", not(feature = "postgres-store")))]
    let repo: Arc<dyn Repo> = {
        info!("Using in-memory repository backend");
        Arc::new(phenomena::repo::inmem::InMemRepo::new())
    };

    let openapi = ApiDoc::openapi();
    let state = AppState { repo };
    let frontend_url = cfg.frontend_url.clone();

    let server = HttpServer::new(move || {
        let cors = {
            let mut c = Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allow_any_header()
                .allowed_methods(["GET", "POST", "DELETE", "OPTIONS"])
                .max_age(3600);
            if let Some(front) = &frontend_url {
                c = c.allowed_origin(front);
            }
            c
        };

        App::new()
            .wrap(TracingLogger::default())
            .wrap(Compress::default())
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .configure(configure_routes)
            .service(SwaggerUi::new("/docs/{_:.*}").url("/docs/openapi.json", openapi.clone()))
            .default_service(web::to(not_found))
    })
    .bind((cfg.host.as_str(), cfg.port))?;

    info!("Listening on http://{}:{}", cfg.host, cfg.port);

    server.run().await?;

    #[cfg(feature = "postgres-store")]
    gateway.close().await;

    Ok(())
}
