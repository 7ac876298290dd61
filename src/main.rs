mod config;
mod context;
mod core;
mod database;
mod error;
mod flash;
mod forms;
mod handlers;
mod impls;
mod middlewares;
mod request;
mod response;
mod session;

use actix_web::middleware::Logger;
use actix_web::web::{get, post, resource, scope, Data};
use actix_web::{App, HttpServer};
use env_logger::Env;
use log::info;
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::database::sqlx::PgSqlxManager;
use crate::error::Error;
use crate::impls::notifier::logging::LogNotifier;
use crate::middlewares::jwt::JWTMiddleware;
use crate::session::Sessions;

#[actix_web::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("actix_web=info,labelcraft=info")).init();
    let config = Config::from_env()?;
    let pool = PgPoolOptions::new().max_connections(config.db_max_connections).connect(&config.database_url).await?;
    sqlx::migrate!().run(&pool).await?;
    let manager = PgSqlxManager::new(pool.clone());
    let sessions = Sessions::new(&config);
    info!("listening on {}", config.bind_addr);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(manager.clone()))
            .app_data(Data::new(sessions.clone()))
            .app_data(Data::new(LogNotifier))
            .service(
                scope("")
                    .service(resource("/login/").route(get().to(handlers::login_page)).route(post().to(handlers::login)))
                    .service(resource("/logout/").route(get().to(handlers::logout)).route(post().to(handlers::logout)))
                    .service(resource("/signup/").route(get().to(handlers::signup::step1_page)).route(post().to(handlers::signup::step1::<LogNotifier>)))
                    .service(resource("/signup/org/").route(get().to(handlers::signup::org_page)).route(post().to(handlers::signup::org)))
                    .service(
                        scope("")
                            .wrap(JWTMiddleware::new(sessions.clone()))
                            .route("/", get().to(handlers::dashboard))
                            .service(
                                scope("/org")
                                    .route("/requests/", get().to(handlers::org::requests))
                                    .route("/requests/{request_id}/approve/", post().to(handlers::org::approve::<LogNotifier>))
                                    .route("/members/{user_id}/role/", post().to(handlers::org::change_role)),
                            )
                            .service(
                                scope("/workspaces")
                                    .route("/", get().to(handlers::workspace::list))
                                    .service(resource("/new/").route(get().to(handlers::workspace::new_page)).route(post().to(handlers::workspace::create)))
                                    .service(
                                        scope("/{workspace_id}")
                                            .route("/", get().to(handlers::workspace::detail))
                                            .route("/fields/", post().to(handlers::workspace::add_fields))
                                            .route("/fields/{field_id}/layout/", post().to(handlers::workspace::update_layout))
                                            .route("/fields/{field_id}/delete/", post().to(handlers::workspace::delete_field))
                                            .route("/members/", post().to(handlers::workspace::add_member))
                                            .route("/members/{user_id}/remove/", post().to(handlers::workspace::remove_member))
                                            .route("/templates/", post().to(handlers::workspace::add_template))
                                            .route("/templates/from-global/{global_id}/", post().to(handlers::workspace::from_global)),
                                    ),
                            )
                            .service(
                                scope("/templates/{template_id}")
                                    .route("/", get().to(handlers::template::detail))
                                    .route("/edit/", post().to(handlers::template::edit))
                                    .route("/duplicate/", post().to(handlers::template::duplicate))
                                    .route("/delete/", post().to(handlers::template::delete))
                                    .route("/fields/", post().to(handlers::template::add_field))
                                    .route("/fields/{field_id}/delete/", post().to(handlers::template::delete_field))
                                    .route("/preview/", get().to(handlers::template::preview)),
                            )
                            .route("/global-templates/", get().to(handlers::template::globals))
                            .service(
                                scope("/codes")
                                    .route("/barcode/", get().to(handlers::codes::barcode))
                                    .route("/qr/", get().to(handlers::codes::qr)),
                            )
                            .service(
                                scope("/admin")
                                    .route("/orgs/", get().to(handlers::admin::orgs))
                                    .route("/users/", get().to(handlers::admin::users))
                                    .route("/join-requests/", get().to(handlers::admin::join_requests))
                                    .route("/workspaces/", get().to(handlers::admin::workspaces))
                                    .route("/workspace-fields/", get().to(handlers::admin::workspace_fields))
                                    .route("/memberships/", get().to(handlers::admin::memberships))
                                    .route("/role-changes/", get().to(handlers::admin::role_changes))
                                    .route("/templates/", get().to(handlers::admin::templates))
                                    .route("/template-fields/", get().to(handlers::admin::template_fields))
                                    .service(
                                        resource("/global-templates/")
                                            .route(get().to(handlers::admin::global_templates))
                                            .route(post().to(handlers::admin::create_global_template)),
                                    )
                                    .route("/global-templates/{global_id}/fields/", post().to(handlers::admin::add_global_template_field)),
                            ),
                    ),
            )
    })
    .bind(config.bind_addr.as_str())?
    .run()
    .await?;
    Ok(())
}
