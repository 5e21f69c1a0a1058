//! Aggregate and date-window reads used by the dashboard.

use crate::error::{ApiError, AppResult};
use crate::state::AppState;
use crate::store::GroupField;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::application::ApplicationRecord;
use common::requests::MonthQuery;

/// `GET /api/applications/wards/count`
pub async fn ward_count(state: web::Data<AppState>) -> impl Responder {
    match state.db.count_grouped_by(GroupField::Ward) {
        Ok(counts) => HttpResponse::Ok().json(counts),
        Err(e) => e.error_response(),
    }
}

/// `GET /api/applications/wards/responses/count`
pub async fn response_ward_count(state: web::Data<AppState>) -> impl Responder {
    match state.db.count_grouped_by(GroupField::ResponseWard) {
        Ok(counts) => HttpResponse::Ok().json(counts),
        Err(e) => e.error_response(),
    }
}

/// `GET /api/applications/today`
pub async fn today(state: web::Data<AppState>) -> impl Responder {
    match state.db.find_by_date(&state.clock.today()) {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(e) => e.error_response(),
    }
}

/// `GET /api/applications/month?year=2024&month=3`
pub async fn month(state: web::Data<AppState>, query: web::Query<MonthQuery>) -> impl Responder {
    match records_for_month(&state, &query) {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(e) => e.error_response(),
    }
}

pub fn records_for_month(state: &AppState, query: &MonthQuery) -> AppResult<Vec<ApplicationRecord>> {
    let (year, month) = parse_year_month(query)?;
    state.db.find_by_year_month(year, month)
}

/// Both parts are required. `month` may be given with or without a leading
/// zero.
fn parse_year_month(query: &MonthQuery) -> AppResult<(u32, u32)> {
    let (Some(year), Some(month)) = (
        query.year.as_deref().map(str::trim).filter(|s| !s.is_empty()),
        query.month.as_deref().map(str::trim).filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::ValidationFailed("Month and year are required".to_string()));
    };

    let year = year
        .parse::<u32>()
        .ok()
        .filter(|y| (1..=9999).contains(y))
        .ok_or_else(|| ApiError::ValidationFailed(format!("'{}' is not a valid year", year)))?;
    let month = month
        .parse::<u32>()
        .ok()
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| ApiError::ValidationFailed(format!("'{}' is not a valid month", month)))?;
    Ok((year, month))
}
