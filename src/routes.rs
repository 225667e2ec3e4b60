use crate::{
    api::{document, holiday, notification, organization, performance, policy, settings},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/policies")
                    // /policies
                    .service(
                        web::resource("")
                            .route(web::post().to(policy::create_policy))
                            .route(web::get().to(policy::list_policies)),
                    )
                    // Fixed segments go before /{id}; scopes match in
                    // registration order.
                    .service(
                        web::scope("/holidays")
                            .service(
                                web::resource("")
                                    .route(web::get().to(holiday::list_holidays))
                                    .route(web::post().to(holiday::create_holiday)),
                            )
                            .service(
                                web::resource("/bulk")
                                    .route(web::post().to(holiday::bulk_create_holidays)),
                            )
                            .service(
                                web::resource("/defaults")
                                    .route(web::post().to(holiday::seed_default_holidays)),
                            )
                            .service(
                                web::resource("/working-days")
                                    .route(web::get().to(holiday::working_days_in_month)),
                            )
                            .service(
                                web::resource("/working-day")
                                    .route(web::get().to(holiday::is_working_day)),
                            )
                            .service(
                                web::resource("/{id}")
                                    .route(web::put().to(holiday::update_holiday))
                                    .route(web::delete().to(holiday::delete_holiday)),
                            ),
                    )
                    // /policies/validate
                    .service(
                        web::resource("/validate")
                            .route(web::post().to(policy::validate_request)),
                    )
                    // /policies/balances
                    .service(
                        web::resource("/balances").route(web::get().to(policy::get_balance)),
                    )
                    .service(
                        web::resource("/balances/adjust")
                            .route(web::post().to(policy::adjust_balance)),
                    )
                    .service(
                        web::resource("/balances/initialize")
                            .route(web::post().to(policy::initialize_year)),
                    )
                    // /policies/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(policy::get_policy))
                            .route(web::put().to(policy::update_policy))
                            .route(web::delete().to(policy::delete_policy)),
                    ),
            )
            .service(
                web::scope("/organization")
                    .service(
                        web::resource("/departments")
                            .route(web::post().to(organization::create_department))
                            .route(web::get().to(organization::list_departments)),
                    )
                    .service(
                        web::resource("/departments/{id}")
                            .route(web::put().to(organization::update_department))
                            .route(web::delete().to(organization::delete_department)),
                    )
                    .service(
                        web::resource("/managers")
                            .route(web::post().to(organization::assign_manager)),
                    )
                    .service(
                        web::resource("/managers/{id}")
                            .route(web::get().to(organization::current_manager)),
                    )
                    .service(
                        web::resource("/hierarchy/{id}")
                            .route(web::get().to(organization::manager_hierarchy)),
                    )
                    .service(
                        web::resource("/team/{id}")
                            .route(web::get().to(organization::team_hierarchy)),
                    ),
            )
            .service(
                web::scope("/performance")
                    .service(
                        web::resource("")
                            .route(web::post().to(performance::create_review))
                            .route(web::get().to(performance::list_reviews)),
                    )
                    .service(
                        web::resource("/cycle")
                            .route(web::post().to(performance::create_cycle)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(performance::get_review))
                            .route(web::put().to(performance::update_review))
                            .route(web::delete().to(performance::delete_review)),
                    )
                    .service(
                        web::resource("/{id}/submit")
                            .route(web::put().to(performance::submit_review)),
                    )
                    .service(
                        web::resource("/{id}/review")
                            .route(web::put().to(performance::mark_reviewed)),
                    )
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(performance::approve_review)),
                    ),
            )
            .service(
                web::scope("/settings")
                    .service(
                        web::resource("")
                            .route(web::get().to(settings::list_settings))
                            .route(web::put().to(settings::bulk_update_settings)),
                    )
                    .service(
                        web::resource("/import")
                            .route(web::post().to(settings::import_settings)),
                    )
                    .service(
                        web::resource("/export")
                            .route(web::get().to(settings::export_settings)),
                    )
                    .service(
                        web::resource("/refresh-cache")
                            .route(web::post().to(settings::refresh_cache)),
                    )
                    .service(
                        web::resource("/{key}")
                            .route(web::get().to(settings::get_setting))
                            .route(web::put().to(settings::set_setting)),
                    ),
            )
            .service(
                web::scope("/documents")
                    .service(
                        web::resource("")
                            .route(web::post().to(document::create_document))
                            .route(web::get().to(document::list_documents)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(document::get_document))
                            .route(web::delete().to(document::delete_document)),
                    ),
            )
            .service(
                web::scope("/notifications")
                    .service(
                        web::resource("")
                            .route(web::get().to(notification::list_notifications))
                            .route(web::post().to(notification::create_notification)),
                    )
                    .service(
                        web::resource("/unread-count")
                            .route(web::get().to(notification::unread_count)),
                    )
                    .service(
                        web::resource("/read-all")
                            .route(web::put().to(notification::mark_all_read)),
                    )
                    .service(
                        web::resource("/{id}/read")
                            .route(web::put().to(notification::mark_read)),
                    ),
            ),
    );
}
