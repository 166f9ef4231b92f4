// src/handlers.rs

use crate::config::AppConfig;
use crate::flash::{redirect_with, removal_cookie, Flash, FLASH_COOKIE};
use crate::models::{HealthStatus, OptimizeForm};
use crate::presenter::build_results;
use crate::templates::{render_index, render_results};
use crate::validation::{validate_request, ValidationError};
use crate::workflow::{fetch_price_table, optimize_portfolio, OptimizeError};
use actix_web::http::header::ContentType;
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use quote_service::PriceSource;
use tracing::{info, warn};

#[get("/")]
pub async fn index(req: HttpRequest, config: web::Data<AppConfig>) -> impl Responder {
    let flash = Flash::from_request(&req);
    let html = render_index(flash.as_ref(), &config.bounds);

    let mut response = HttpResponse::Ok();
    response.content_type(ContentType::html());
    if req.cookie(FLASH_COOKIE).is_some() {
        response.cookie(removal_cookie());
    }
    response.body(html)
}

#[get("/health")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthStatus {
        status: "healthy".to_string(),
        service: "importfolio".to_string(),
    })
}

#[get("/validation-constants")]
pub async fn validation_constants(config: web::Data<AppConfig>) -> impl Responder {
    HttpResponse::Ok().json(&config.bounds)
}

/// `POST /optimize`: validate, fetch, optimize and render, or redirect with a flash.
pub async fn optimize<P: PriceSource + 'static>(
    form: Result<web::Form<OptimizeForm>, actix_web::Error>,
    config: web::Data<AppConfig>,
    source: web::Data<P>,
) -> HttpResponse {
    // An unreadable body is reported like an empty form.
    let form = match form {
        Ok(form) => form.into_inner(),
        Err(e) => {
            warn!(error = %e, "unreadable optimize form");
            let missing = ValidationError::MissingFields;
            return redirect_with(Flash::new(missing.level(), missing.to_string()));
        }
    };
    let params = match validate_request(&form, &config.bounds) {
        Ok(params) => params,
        Err(e) => {
            warn!(error = %e, "rejected optimize request");
            return redirect_with(Flash::new(e.level(), e.to_string()));
        }
    };
    info!(
        tickers = ?params.tickers,
        start = %params.start_date,
        end = %params.end_date,
        risk_free_rate = params.risk_free_rate,
        simulations = params.num_simulations,
        "optimize request"
    );

    let table = match fetch_price_table(
        source.get_ref(),
        &params,
        config.bounds.min_historical_days,
    )
    .await
    {
        Ok(table) => table,
        Err(e) => return redirect_with(Flash::new(e.level(), e.to_string())),
    };

    let trading_days = config.trading_days_per_year;
    let job_params = params.clone();
    let report = web::block(move || optimize_portfolio(&table, &job_params, trading_days))
        .await
        .map_err(|e| OptimizeError::Unexpected(e.to_string()))
        .and_then(|outcome| outcome);

    match report {
        Ok(report) => {
            let view = build_results(&params, &report);
            HttpResponse::Ok()
                .content_type(ContentType::html())
                .body(render_results(&view))
        }
        Err(e) => redirect_with(Flash::new(e.level(), e.to_string())),
    }
}

/// Registers every route; `P` is the quote source shared through `web::Data`.
pub fn configure<P: PriceSource + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(health_check)
        .service(validation_constants)
        .route("/optimize", web::post().to(optimize::<P>));
}
