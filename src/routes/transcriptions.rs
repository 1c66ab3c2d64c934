use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedDoctor,
    error::{AppError, AppResult},
    models::Transcription,
    schema::{patients, transcriptions},
    state::AppState,
};

use super::{normalize_page, resolve_doctor};

pub const UNKNOWN_PATIENT: &str = "Unknown Patient";

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct TranscriptionEntry {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub text: String,
    pub report: String,
    pub created_at: NaiveDateTime,
}

#[derive(Serialize)]
pub struct ListTranscriptionsResponse {
    pub transcriptions: Vec<TranscriptionEntry>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// Paginated transcriptions with each owning patient's display name joined
/// in. A transcription whose patient row is gone still renders, with an
/// "Unknown Patient" placeholder.
pub async fn list_transcriptions(
    State(state): State<AppState>,
    doctor: AuthenticatedDoctor,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ListTranscriptionsResponse>> {
    let (page, limit) = normalize_page(query.page, query.limit);
    let mut conn = state.db()?;
    let doctor = resolve_doctor(&mut conn, &doctor.email)?;

    let total: i64 = transcriptions::table
        .filter(transcriptions::doctor_id.eq(doctor.id))
        .count()
        .get_result(&mut conn)?;

    let rows: Vec<Transcription> = transcriptions::table
        .filter(transcriptions::doctor_id.eq(doctor.id))
        .order(transcriptions::created_at.desc())
        .limit(limit)
        .offset((page - 1) * limit)
        .load(&mut conn)?;

    let patient_ids: Vec<Uuid> = rows.iter().map(|row| row.patient_id).collect();
    let name_rows: Vec<(Uuid, String)> = patients::table
        .filter(patients::id.eq_any(&patient_ids))
        .select((patients::id, patients::name))
        .load(&mut conn)?;
    let names: HashMap<Uuid, String> = name_rows.into_iter().collect();

    let entries = rows
        .into_iter()
        .map(|row| TranscriptionEntry {
            id: row.id,
            patient_id: row.patient_id,
            patient_name: names
                .get(&row.patient_id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_PATIENT.to_string()),
            text: row.text,
            report: row.report,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(ListTranscriptionsResponse {
        transcriptions: entries,
        total,
        page,
        limit,
    }))
}

#[derive(Serialize)]
pub struct TranscriptionView {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub text: String,
    pub report: String,
    pub created_at: NaiveDateTime,
}

impl From<Transcription> for TranscriptionView {
    fn from(row: Transcription) -> Self {
        Self {
            id: row.id,
            patient_id: row.patient_id,
            text: row.text,
            report: row.report,
            created_at: row.created_at,
        }
    }
}

pub async fn get_transcription(
    State(state): State<AppState>,
    doctor: AuthenticatedDoctor,
    Path(transcription_id): Path<Uuid>,
) -> AppResult<Json<TranscriptionView>> {
    let mut conn = state.db()?;
    let doctor = resolve_doctor(&mut conn, &doctor.email)?;

    let row: Transcription = transcriptions::table
        .filter(transcriptions::id.eq(transcription_id))
        .filter(transcriptions::doctor_id.eq(doctor.id))
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    Ok(Json(row.into()))
}

#[derive(Deserialize)]
pub struct UpdateTranscriptionRequest {
    pub text: Option<String>,
    pub report: Option<String>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = transcriptions)]
struct UpdateTranscriptionChangeset<'a> {
    text: Option<&'a str>,
    report: Option<&'a str>,
}

/// Partial update limited to {text, report}. Identifier columns are not
/// writable through this path.
pub async fn update_transcription(
    State(state): State<AppState>,
    doctor: AuthenticatedDoctor,
    Path(transcription_id): Path<Uuid>,
    Json(payload): Json<UpdateTranscriptionRequest>,
) -> AppResult<Json<TranscriptionView>> {
    let mut conn = state.db()?;
    let doctor = resolve_doctor(&mut conn, &doctor.email)?;

    let existing: Transcription = transcriptions::table
        .filter(transcriptions::id.eq(transcription_id))
        .filter(transcriptions::doctor_id.eq(doctor.id))
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    if payload.text.is_none() && payload.report.is_none() {
        return Ok(Json(existing.into()));
    }

    let changeset = UpdateTranscriptionChangeset {
        text: payload.text.as_deref(),
        report: payload.report.as_deref(),
    };

    diesel::update(transcriptions::table.find(existing.id))
        .set(&changeset)
        .execute(&mut conn)?;

    let updated: Transcription = transcriptions::table.find(existing.id).first(&mut conn)?;
    Ok(Json(updated.into()))
}

pub async fn delete_transcription(
    State(state): State<AppState>,
    doctor: AuthenticatedDoctor,
    Path(transcription_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    let doctor = resolve_doctor(&mut conn, &doctor.email)?;

    let deleted = diesel::delete(
        transcriptions::table
            .filter(transcriptions::id.eq(transcription_id))
            .filter(transcriptions::doctor_id.eq(doctor.id)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(AppError::not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}
