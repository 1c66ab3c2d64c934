use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Duration, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Deserialize;

use crate::{
    auth::AuthenticatedDoctor,
    error::AppResult,
    models::{Patient, Transcription},
    schema::{patients, transcriptions},
    state::AppState,
    stats::{self, BucketCount},
};

use super::patients::PatientView;
use super::resolve_doctor;
use super::transcriptions::TranscriptionView;

#[derive(Deserialize)]
pub struct DaysQuery {
    pub days: Option<i64>,
}

#[derive(Deserialize)]
pub struct MonthsQuery {
    pub months: Option<i64>,
}

fn window_start_days(days: i64) -> NaiveDateTime {
    let start_date = Utc::now().date_naive() - Duration::days(days);
    start_date.and_hms_opt(0, 0, 0).expect("midnight is valid")
}

fn window_start_months(months: i64) -> NaiveDateTime {
    let start_date = Utc::now().date_naive() - chrono::Months::new(months as u32);
    start_date.and_hms_opt(0, 0, 0).expect("midnight is valid")
}

pub async fn daily_statistics(
    State(state): State<AppState>,
    doctor: AuthenticatedDoctor,
    Query(query): Query<DaysQuery>,
) -> AppResult<Json<Vec<BucketCount>>> {
    let days = stats::window_days(query.days);
    let mut conn = state.db()?;
    let doctor = resolve_doctor(&mut conn, &doctor.email)?;

    let stamps: Vec<NaiveDateTime> = transcriptions::table
        .filter(transcriptions::doctor_id.eq(doctor.id))
        .filter(transcriptions::created_at.ge(window_start_days(days)))
        .select(transcriptions::created_at)
        .load(&mut conn)?;

    Ok(Json(stats::daily_counts(&stamps)))
}

pub async fn monthly_statistics(
    State(state): State<AppState>,
    doctor: AuthenticatedDoctor,
    Query(query): Query<MonthsQuery>,
) -> AppResult<Json<Vec<BucketCount>>> {
    let months = stats::window_months(query.months);
    let mut conn = state.db()?;
    let doctor = resolve_doctor(&mut conn, &doctor.email)?;

    let stamps: Vec<NaiveDateTime> = transcriptions::table
        .filter(transcriptions::doctor_id.eq(doctor.id))
        .filter(transcriptions::created_at.ge(window_start_months(months)))
        .select(transcriptions::created_at)
        .load(&mut conn)?;

    Ok(Json(stats::monthly_counts(&stamps)))
}

pub async fn busiest_days(
    State(state): State<AppState>,
    doctor: AuthenticatedDoctor,
    Query(query): Query<DaysQuery>,
) -> AppResult<Json<Vec<BucketCount>>> {
    let days = stats::window_days(query.days);
    let mut conn = state.db()?;
    let doctor = resolve_doctor(&mut conn, &doctor.email)?;

    let stamps: Vec<NaiveDateTime> = transcriptions::table
        .filter(transcriptions::doctor_id.eq(doctor.id))
        .filter(transcriptions::created_at.ge(window_start_days(days)))
        .select(transcriptions::created_at)
        .load(&mut conn)?;

    Ok(Json(stats::busiest_days(&stamps, stats::BUSIEST_DAYS_LIMIT)))
}

pub async fn recent_patients(
    State(state): State<AppState>,
    doctor: AuthenticatedDoctor,
    Query(query): Query<DaysQuery>,
) -> AppResult<Json<Vec<PatientView>>> {
    let days = stats::window_days(query.days);
    let mut conn = state.db()?;
    let doctor = resolve_doctor(&mut conn, &doctor.email)?;

    let rows: Vec<Patient> = patients::table
        .filter(patients::doctor_id.eq(doctor.id))
        .filter(patients::created_at.ge(window_start_days(days)))
        .order(patients::created_at.desc())
        .limit(stats::DASHBOARD_ROW_LIMIT)
        .load(&mut conn)?;

    Ok(Json(rows.into_iter().map(PatientView::from).collect()))
}

pub async fn recent_transcripts(
    State(state): State<AppState>,
    doctor: AuthenticatedDoctor,
    Query(query): Query<DaysQuery>,
) -> AppResult<Json<Vec<TranscriptionView>>> {
    let days = stats::window_days(query.days);
    let mut conn = state.db()?;
    let doctor = resolve_doctor(&mut conn, &doctor.email)?;

    let rows: Vec<Transcription> = transcriptions::table
        .filter(transcriptions::doctor_id.eq(doctor.id))
        .filter(transcriptions::created_at.ge(window_start_days(days)))
        .order(transcriptions::created_at.desc())
        .limit(stats::DASHBOARD_ROW_LIMIT)
        .load(&mut conn)?;

    Ok(Json(rows.into_iter().map(TranscriptionView::from).collect()))
}
