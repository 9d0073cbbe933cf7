use crate::{
    api::{attendance, leave_request},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request((60_000 / requests_per_min as u64).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(build_limiter(config.rate_login_per_min))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/leave-login")
                    .wrap(build_limiter(config.rate_login_per_min))
                    .route(web::post().to(handlers::leave_login)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(build_limiter(config.rate_protected_per_min))
            .service(web::resource("/me").route(web::get().to(handlers::me)))
            .service(web::resource("/logout").route(web::post().to(handlers::logout)))
            .service(
                web::resource("/attendance/photo")
                    .route(web::post().to(attendance::attach_photo)),
            )
            .service(
                web::resource("/leave")
                    .route(web::get().to(leave_request::leave_list))
                    .route(web::post().to(leave_request::create_leave)),
            ),
    );
}

// LOGIN (attendance)
//  ├─ verify credentials against Employees
//  ├─ append Attendance Logs row (Pending Photo, session token)
//  └─ bearer token carrying the session token
//
// PHOTO → find row by session token → write URL
// LOGOUT → find row by session token → write logout time → revoke
