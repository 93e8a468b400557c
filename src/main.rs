use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use smart_attendance::app::{build_app, serve};
use smart_attendance::auth::password::hash_password;
use smart_attendance::state::AppState;
use smart_attendance::users::repo::{Role, User};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("smart_attendance=debug,axum=info,tower_http=info"));
    let fmt = tracing_subscriber::fmt().with_env_filter(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json") {
        fmt.with_target(false).json().init();
    } else {
        fmt.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let state = AppState::init().await?;

    sqlx::migrate!("./migrations").run(&state.db).await?;
    seed_default_accounts(&state.db).await?;

    let config = state.config.clone();
    let app = build_app(state);
    serve(app, &config).await
}

/// Default accounts for first boot; insert-if-absent so concurrent instances
/// starting together cannot double-seed.
async fn seed_default_accounts(db: &PgPool) -> anyhow::Result<()> {
    for (user_id, name, password, role) in [
        ("admin", "Administrator", "admin123", Role::Admin),
        ("teacher", "Teacher One", "teacher123", Role::Teacher),
        ("student", "Student One", "student123", Role::Student),
    ] {
        let hash = hash_password(password)?;
        if User::insert_if_absent(db, user_id, name, role, &hash).await? {
            tracing::info!(user_id, role = ?role, "seeded default account");
        }
    }
    Ok(())
}
