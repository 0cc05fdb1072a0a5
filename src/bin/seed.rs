//! Rebuilds (with `--rebuild`) and fills the database with demo reports.
//! `--smoke` then closes one, expires another and lists what stays open.

use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use phenomena::config::AppConfig;
use phenomena::db::Gateway;
use phenomena::repo::pg::PgRepo;
use phenomena::seed::{seed_initial_data, smoke_check, Seeded};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let rebuild = args.iter().any(|a| a == "--rebuild");
    let smoke = args.iter().any(|a| a == "--smoke");
    let cfg = AppConfig::from_env()?;
    let gateway = Gateway::connect(&cfg.db).await?;
    if rebuild {
        gateway.rebuild().await?;
    } else {
        gateway.migrate().await?;
    }

    let repo = PgRepo::new(gateway.clone());
    let outcome = run(&gateway, &repo, smoke).await;
    gateway.close().await;
    outcome
}

async fn run(gateway: &Gateway, repo: &PgRepo, smoke: bool) -> anyhow::Result<()> {
    let seeded = seed_initial_data(repo).await?;
    for r in &seeded.reports {
        info!(id = r.id, title = %r.title, "seeded report");
    }
    if smoke {
        expire_last(gateway, &seeded).await?;
        let open = smoke_check(repo, &seeded).await?;
        info!(open = open.len(), "smoke check passed");
    }
    Ok(())
}

// Nothing in the API moves a deadline backwards, so go straight to the table.
async fn expire_last(gateway: &Gateway, seeded: &Seeded) -> anyhow::Result<()> {
    let Some(last) = seeded.reports.last() else { return Ok(()) };
    sqlx::query(r#"UPDATE reports SET "expirationDate" = CURRENT_TIMESTAMP - interval '2 days' WHERE id = $1"#)
        .bind(last.id)
        .execute(gateway.pool())
        .await?;
    info!(report_id = last.id, "expired");
    Ok(())
}
