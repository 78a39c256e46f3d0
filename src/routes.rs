use crate::{
    api::{dashboard, workbook},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

// Per-route limiter; a zero rate still admits one request per millisecond.
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
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let upload_limiter = Arc::new(build_limiter(config.rate_upload_per_min));
    let query_limiter = Arc::new(build_limiter(config.rate_query_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/workbooks")
                    // /workbooks
                    .service(
                        web::resource("")
                            .wrap(upload_limiter.clone())
                            .route(web::post().to(workbook::upload_workbook)),
                    )
                    // /workbooks/{id}
                    .service(
                        web::resource("/{id}")
                            .wrap(query_limiter.clone())
                            .route(web::get().to(workbook::get_workbook))
                            .route(web::delete().to(workbook::delete_workbook)),
                    )
                    // /workbooks/{id}/employees
                    .service(
                        web::resource("/{id}/employees")
                            .wrap(query_limiter.clone())
                            .route(web::get().to(workbook::list_employees)),
                    )
                    // /workbooks/{id}/dashboard
                    .service(
                        web::resource("/{id}/dashboard")
                            .wrap(query_limiter.clone())
                            .route(web::post().to(dashboard::workbook_dashboard)),
                    ),
            )
            .service(
                web::resource("/demo/dashboard")
                    .wrap(query_limiter)
                    .route(web::post().to(dashboard::demo_dashboard)),
            ),
    );
}
