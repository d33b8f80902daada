use actix_web::dev::Server;
use actix_web::{guard, web, App, HttpServer};
use sqlx::SqlitePool;
use std::net::TcpListener;

use crate::auth::{CredentialStore, CredentialVerifier, RequestGate, RevocationLedger, TokenIssuer, TokenPolicy};
use crate::configuration::{CredentialSettings, JwtSettings};
use crate::error::{AppError, ValidationErrors};
use crate::middleware::{JwtMiddleware, LoggerMiddleware};
use crate::routes::{
    create_item, create_store, create_store_tag, delete_item, delete_store, delete_tag,
    delete_user, get_item, get_store, get_tag, get_user, health_check, link_tag, list_items,
    list_store_tags, list_stores, login, logout, refresh, register, unlink_tag, update_item,
};

pub fn run(
    listener: TcpListener,
    connection: SqlitePool,
    jwt_config: JwtSettings,
    credential_config: CredentialSettings,
) -> Result<Server, std::io::Error> {
    let issuer = TokenIssuer::new(jwt_config);
    let ledger = RevocationLedger::new(connection.clone());
    let verifier = CredentialVerifier::new(
        CredentialStore::new(connection.clone()),
        credential_config.hash_cost,
    )
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    let gate = RequestGate::new(issuer.clone(), ledger.clone());

    let connection = web::Data::new(connection);
    let issuer = web::Data::new(issuer);
    let ledger = web::Data::new(ledger);
    let verifier = web::Data::new(verifier);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(LoggerMiddleware)
            // Shared state
            .app_data(connection.clone())
            .app_data(issuer.clone())
            .app_data(ledger.clone())
            .app_data(verifier.clone())
            // Extractor failures use the same error body as everything else
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::from(ValidationErrors::single("body", err.to_string())).into()
            }))
            .app_data(web::PathConfig::default().error_handler(|_err, _req| {
                AppError::NotFound("Resource not found.".to_string()).into()
            }))
            .configure(|cfg| routes(cfg, &gate))
            .default_service(web::to(|| async {
                Err::<actix_web::HttpResponse, _>(AppError::NotFound(
                    "Resource not found.".to_string(),
                ))
            }))
    })
    .listen(listener)?
    .run();

    Ok(server)
}

/// Route table. Paths with a different policy per method are registered as
/// one resource per method, each behind its own gate.
fn routes(cfg: &mut web::ServiceConfig, gate: &RequestGate) {
    let access = TokenPolicy::access();
    let guard_with = |policy: TokenPolicy| JwtMiddleware::new(gate.clone(), policy);

    cfg
        // Public
        .route("/health_check", web::get().to(health_check))
        .route("/register", web::post().to(register))
        .route("/login", web::post().to(login))
        // Session
        .service(
            web::resource("/refresh")
                .wrap(guard_with(TokenPolicy::refresh()))
                .route(web::post().to(refresh)),
        )
        .service(
            web::resource("/logout")
                .wrap(guard_with(access))
                .route(web::post().to(logout)),
        )
        // Users
        .service(
            web::resource("/user/{user_id}")
                .guard(guard::Get())
                .wrap(guard_with(access))
                .to(get_user),
        )
        .service(
            web::resource("/user/{user_id}")
                .guard(guard::Delete())
                .wrap(guard_with(access.fresh().admin()))
                .to(delete_user),
        )
        // Stores
        .service(
            web::resource("/store")
                .guard(guard::Get())
                .to(list_stores),
        )
        .service(
            web::resource("/store")
                .guard(guard::Post())
                .wrap(guard_with(access))
                .to(create_store),
        )
        .service(
            web::resource("/store/{store_id}")
                .guard(guard::Get())
                .to(get_store),
        )
        .service(
            web::resource("/store/{store_id}")
                .guard(guard::Delete())
                .wrap(guard_with(access.admin()))
                .to(delete_store),
        )
        .service(
            web::resource("/store/{store_id}/tag")
                .guard(guard::Get())
                .to(list_store_tags),
        )
        .service(
            web::resource("/store/{store_id}/tag")
                .guard(guard::Post())
                .wrap(guard_with(access))
                .to(create_store_tag),
        )
        // Items
        .service(
            web::resource("/item")
                .guard(guard::Get())
                .wrap(guard_with(access))
                .to(list_items),
        )
        .service(
            web::resource("/item")
                .guard(guard::Post())
                .wrap(guard_with(access.fresh()))
                .to(create_item),
        )
        .service(
            web::resource("/item/{item_id}")
                .guard(guard::Any(guard::Get()).or(guard::Put()))
                .wrap(guard_with(access))
                .route(web::get().to(get_item))
                .route(web::put().to(update_item)),
        )
        .service(
            web::resource("/item/{item_id}")
                .guard(guard::Delete())
                .wrap(guard_with(access.admin()))
                .to(delete_item),
        )
        .service(
            web::resource("/item/{item_id}/tag/{tag_id}")
                .wrap(guard_with(access))
                .route(web::post().to(link_tag))
                .route(web::delete().to(unlink_tag)),
        )
        // Tags
        .service(
            web::resource("/tag/{tag_id}")
                .guard(guard::Get())
                .to(get_tag),
        )
        .service(
            web::resource("/tag/{tag_id}")
                .guard(guard::Delete())
                .wrap(guard_with(access))
                .to(delete_tag),
        );
}
