use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedDoctor,
    error::{AppError, AppResult},
    models::{NewPatient, Patient, Transcription},
    pipeline::{self, PatientDraft},
    schema::{patients, transcriptions},
    state::AppState,
    validate,
};

use super::{normalize_page, resolve_doctor};

#[derive(Serialize)]
pub struct PatientView {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub doctor_id: Uuid,
    pub created_at: NaiveDateTime,
}

impl From<Patient> for PatientView {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            age: patient.age,
            gender: patient.gender,
            doctor_id: patient.doctor_id,
            created_at: patient.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct ListPatientsResponse {
    pub patients: Vec<PatientView>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

pub async fn list_patients(
    State(state): State<AppState>,
    doctor: AuthenticatedDoctor,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ListPatientsResponse>> {
    let (page, limit) = normalize_page(query.page, query.limit);
    let mut conn = state.db()?;
    let doctor = resolve_doctor(&mut conn, &doctor.email)?;

    let total: i64 = patients::table
        .filter(patients::doctor_id.eq(doctor.id))
        .count()
        .get_result(&mut conn)?;

    let rows: Vec<Patient> = patients::table
        .filter(patients::doctor_id.eq(doctor.id))
        .order(patients::created_at.desc())
        .limit(limit)
        .offset((page - 1) * limit)
        .load(&mut conn)?;

    Ok(Json(ListPatientsResponse {
        patients: rows.into_iter().map(PatientView::from).collect(),
        total,
        page,
        limit,
    }))
}

#[derive(Deserialize)]
pub struct CreatePatientRequest {
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub audio_url: Option<String>,
}

#[derive(Serialize)]
pub struct CreatedPatientResponse {
    pub patient: PatientView,
    pub transcription: Option<TranscriptionSummary>,
}

#[derive(Serialize)]
pub struct TranscriptionSummary {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub text: String,
    pub report: String,
    pub created_at: NaiveDateTime,
}

impl From<Transcription> for TranscriptionSummary {
    fn from(transcription: Transcription) -> Self {
        Self {
            id: transcription.id,
            patient_id: transcription.patient_id,
            text: transcription.text,
            report: transcription.report,
            created_at: transcription.created_at,
        }
    }
}

/// Creates a patient, either standalone or through the transcription
/// pipeline when an audio URL is supplied.
pub async fn create_patient(
    State(state): State<AppState>,
    doctor: AuthenticatedDoctor,
    Json(payload): Json<CreatePatientRequest>,
) -> AppResult<Response> {
    let draft = PatientDraft {
        name: payload.name,
        age: payload.age,
        gender: payload.gender,
    };

    if let Some(audio_url) = payload.audio_url.as_deref() {
        let (patient, transcription) =
            pipeline::create_patient_and_transcription(&state, &doctor.email, draft, audio_url)
                .await?;
        let body = CreatedPatientResponse {
            patient: patient.into(),
            transcription: Some(transcription.into()),
        };
        return Ok((StatusCode::CREATED, Json(body)).into_response());
    }

    validate::validate_patient_draft(&draft.name, draft.age)?;
    let mut conn = state.db()?;
    let doctor = resolve_doctor(&mut conn, &doctor.email)?;

    let new_patient = NewPatient {
        id: Uuid::new_v4(),
        name: draft.name.trim().to_string(),
        age: draft.age,
        gender: draft.gender,
        doctor_id: doctor.id,
    };
    diesel::insert_into(patients::table)
        .values(&new_patient)
        .execute(&mut conn)?;

    let patient: Patient = patients::table.find(new_patient.id).first(&mut conn)?;
    let body = CreatedPatientResponse {
        patient: patient.into(),
        transcription: None,
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

#[derive(Serialize)]
pub struct PatientDetailResponse {
    pub patient: PatientView,
    pub transcription: Option<TranscriptionSummary>,
}

/// A patient owned by another doctor is indistinguishable from a missing
/// one. A patient without a transcription is returned with `null`.
pub async fn get_patient(
    State(state): State<AppState>,
    doctor: AuthenticatedDoctor,
    Path(patient_id): Path<Uuid>,
) -> AppResult<Json<PatientDetailResponse>> {
    let mut conn = state.db()?;
    let doctor = resolve_doctor(&mut conn, &doctor.email)?;

    let patient: Patient = patients::table
        .filter(patients::id.eq(patient_id))
        .filter(patients::doctor_id.eq(doctor.id))
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    let transcription: Option<Transcription> = transcriptions::table
        .filter(transcriptions::patient_id.eq(patient.id))
        .order(transcriptions::created_at.desc())
        .first(&mut conn)
        .optional()?;

    Ok(Json(PatientDetailResponse {
        patient: patient.into(),
        transcription: transcription.map(TranscriptionSummary::from),
    }))
}

#[derive(Deserialize)]
pub struct UpdatePatientRequest {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = patients)]
struct UpdatePatientChangeset<'a> {
    name: Option<&'a str>,
    age: Option<i32>,
    gender: Option<&'a str>,
}

/// Only name/age/gender are applied; anything else in the payload (including
/// `doctor_id`) never reaches storage.
pub async fn update_patient(
    State(state): State<AppState>,
    doctor: AuthenticatedDoctor,
    Path(patient_id): Path<Uuid>,
    Json(payload): Json<UpdatePatientRequest>,
) -> AppResult<Json<PatientView>> {
    if let Some(age) = payload.age {
        if age <= 0 {
            return Err(AppError::validation(
                "patient age must be greater than zero",
            ));
        }
    }
    if let Some(name) = payload.name.as_deref() {
        if name.trim().is_empty() {
            return Err(AppError::validation("patient name is required"));
        }
    }

    let mut conn = state.db()?;
    let doctor = resolve_doctor(&mut conn, &doctor.email)?;

    let existing: Patient = patients::table
        .filter(patients::id.eq(patient_id))
        .filter(patients::doctor_id.eq(doctor.id))
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    if payload.name.is_none() && payload.age.is_none() && payload.gender.is_none() {
        return Ok(Json(existing.into()));
    }

    let changeset = UpdatePatientChangeset {
        name: payload.name.as_deref(),
        age: payload.age,
        gender: payload.gender.as_deref(),
    };

    diesel::update(patients::table.find(existing.id))
        .set(&changeset)
        .execute(&mut conn)?;

    let updated: Patient = patients::table.find(existing.id).first(&mut conn)?;
    Ok(Json(updated.into()))
}

/// Deletes the patient and every transcription linked to it as one
/// transaction. Ownership is required here just like every other patient
/// operation.
pub async fn delete_patient(
    State(state): State<AppState>,
    doctor: AuthenticatedDoctor,
    Path(patient_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    let doctor = resolve_doctor(&mut conn, &doctor.email)?;

    conn.transaction::<(), AppError, _>(|conn| {
        let existing: Option<Uuid> = patients::table
            .filter(patients::id.eq(patient_id))
            .filter(patients::doctor_id.eq(doctor.id))
            .select(patients::id)
            .first(conn)
            .optional()?;
        if existing.is_none() {
            return Err(AppError::not_found());
        }

        diesel::delete(transcriptions::table.filter(transcriptions::patient_id.eq(patient_id)))
            .execute(conn)?;
        diesel::delete(patients::table.find(patient_id)).execute(conn)?;
        Ok(())
    })?;

    Ok(StatusCode::NO_CONTENT)
}
