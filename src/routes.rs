use crate::{
    api::{attendance, employee},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, error::InternalError, web};
use serde_json::json;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms.max(1))
            .burst_size(requests_per_min.max(1))
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("limiter period and burst are non-zero");
        Governor::new(&cfg)
    }

    let check_limiter = Arc::new(build_limiter(config.rate_check_per_min));
    let read_limiter = Arc::new(build_limiter(config.rate_read_per_min));

    // Malformed bodies get the same JSON shape as domain errors
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let resp = HttpResponse::BadRequest().json(json!({
            "message": err.to_string(),
            "code": "invalid_payload"
        }));
        InternalError::from_response(err, resp).into()
    }));

    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/attendance")
                    // /attendance/check
                    .service(
                        web::resource("/check")
                            .wrap(check_limiter)
                            .route(web::post().to(attendance::check_event)),
                    )
                    // /attendance/sessions
                    .service(
                        web::resource("/sessions")
                            .wrap(read_limiter.clone())
                            .route(web::get().to(attendance::list_sessions)),
                    )
                    // /attendance/sessions/{id}
                    .service(
                        web::resource("/sessions/{id}")
                            .wrap(read_limiter.clone())
                            .route(web::get().to(attendance::get_session)),
                    ),
            )
            .service(
                web::scope("/employee")
                    // /employee/lookup?national_id=
                    .service(
                        web::resource("/lookup")
                            .wrap(read_limiter)
                            .route(web::get().to(employee::lookup_employee)),
                    ),
            ),
    );
}
