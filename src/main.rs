use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use std::io;

use internlog::auth::AuthMiddleware;
use internlog::config::Config;
use internlog::routes::{self, health};
use internlog::{db, AppError};

fn startup_error(err: AppError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(startup_error)?;
    let pool = db::connect(&config).await.map_err(startup_error)?;
    db::migrate(&pool).await.map_err(startup_error)?;

    match &config.admin {
        Some(admin) => {
            db::ensure_superuser(&pool, admin)
                .await
                .map_err(startup_error)?;
        }
        None => log::info!("ADMIN_USERNAME/ADMIN_PASSWORD not set; skipping superuser bootstrap"),
    }

    let bind_addr = (config.server_host.clone(), config.server_port);
    log::info!("Starting internlog server at {}", config.server_url());

    let pool = web::Data::new(pool);
    let config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .app_data(config.clone())
            .configure(routes::extractor_config)
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(&config.jwt.secret))
                    .configure(routes::config),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
