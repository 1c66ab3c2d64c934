//! Turns an audio URL into a persisted patient + structured report:
//! validate draft, resolve doctor, persist patient, transcribe, enhance,
//! persist transcription. Each external call is a single attempt. The
//! patient row committed in step three is deliberately not rolled back when
//! a later step fails; the failure is logged with the orphaned patient id so
//! an operator can reconcile it.

use diesel::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Doctor, NewPatient, NewTranscription, Patient, Transcription},
    schema::{doctors, patients, transcriptions},
    state::AppState,
    validate,
};

#[derive(Debug, Clone, Deserialize)]
pub struct PatientDraft {
    pub name: String,
    pub age: i32,
    pub gender: String,
}

pub async fn create_patient_and_transcription(
    state: &AppState,
    doctor_email: &str,
    draft: PatientDraft,
    audio_url: &str,
) -> AppResult<(Patient, Transcription)> {
    validate::validate_patient_draft(&draft.name, draft.age)?;

    let (doctor, patient) = {
        let mut conn = state.db()?;

        let doctor: Doctor = doctors::table
            .filter(doctors::email.eq(doctor_email))
            .first(&mut conn)
            .optional()?
            .ok_or_else(AppError::unauthorized)?;

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
        (doctor, patient)
        // Connection returns to the pool before the slow network calls below.
    };

    let raw_text = match state.transcriber.transcribe(audio_url).await {
        Ok(text) if text.trim().is_empty() => {
            tracing::warn!(
                patient_id = %patient.id,
                "transcription returned empty text; patient left without transcription"
            );
            return Err(AppError::transcription("transcription text is empty"));
        }
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(
                patient_id = %patient.id,
                error = %err,
                "transcription failed; patient left without transcription"
            );
            return Err(AppError::transcription("failed to transcribe audio"));
        }
    };

    let report = match state.enhancer.enhance(&raw_text).await {
        Ok(report) => report,
        Err(err) => {
            tracing::warn!(
                patient_id = %patient.id,
                error = %err,
                "enhancement failed; patient left without transcription"
            );
            return Err(AppError::enhancement("failed to enhance transcription"));
        }
    };

    let new_transcription = NewTranscription {
        id: Uuid::new_v4(),
        doctor_id: doctor.id,
        patient_id: patient.id,
        text: raw_text,
        report,
    };

    let mut conn = state.db()?;
    diesel::insert_into(transcriptions::table)
        .values(&new_transcription)
        .execute(&mut conn)?;
    let transcription: Transcription = transcriptions::table
        .find(new_transcription.id)
        .first(&mut conn)?;

    tracing::info!(
        doctor_id = %doctor.id,
        patient_id = %patient.id,
        transcription_id = %transcription.id,
        "transcription pipeline completed"
    );

    Ok((patient, transcription))
}
