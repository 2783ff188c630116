use crate::{api::attendance, config::Config};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
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

    // Check-in/out and approval mutate records; queries only read.
    let check_limiter = Arc::new(build_limiter(config.rate_check_per_min));
    let query_limiter = Arc::new(build_limiter(config.rate_query_per_min));

    cfg.service(
        web::scope(&config.api_prefix).service(
            web::scope("/attendance")
                // /attendance
                .service(
                    web::resource("")
                        .wrap(check_limiter.clone())
                        .route(web::post().to(attendance::check_in))
                        .route(web::put().to(attendance::check_out)),
                )
                // /attendance/today
                .service(
                    web::resource("/today")
                        .wrap(query_limiter.clone())
                        .route(web::get().to(attendance::today)),
                )
                // /attendance/history
                .service(
                    web::resource("/history")
                        .wrap(query_limiter.clone())
                        .route(web::get().to(attendance::history)),
                )
                // /attendance/stats
                .service(
                    web::resource("/stats")
                        .wrap(query_limiter.clone())
                        .route(web::get().to(attendance::stats)),
                )
                // /attendance/{id}/approve
                .service(
                    web::resource("/{id}/approve")
                        .wrap(check_limiter.clone())
                        .route(web::put().to(attendance::approve)),
                ),
        ),
    );
}
