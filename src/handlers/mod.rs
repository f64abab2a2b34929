pub mod attempt_handler;
pub mod health_handler;

use actix_web::web;

use crate::auth::AuthMiddleware;

pub use attempt_handler::{
    create_practice_attempt, create_tryout_attempt, end_section, finalize_attempt, get_attempt,
    list_attempts, start_section, submit_practice_answer, submit_tryout_answer,
};
pub use health_handler::{health_check, health_check_live, health_check_ready};

/// Register every route. Health probes stay public; everything under `/api`
/// requires a bearer token.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(health_check_live)
        .service(health_check_ready)
        .service(
            web::scope("/api")
                .wrap(AuthMiddleware)
                .service(create_tryout_attempt)
                .service(create_practice_attempt)
                .service(start_section)
                .service(end_section)
                .service(submit_tryout_answer)
                .service(submit_practice_answer)
                .service(finalize_attempt)
                .service(list_attempts)
                .service(get_attempt),
        );
}
