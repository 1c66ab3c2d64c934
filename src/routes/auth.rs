use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{password, AuthenticatedDoctor},
    error::{AppError, AppResult},
    models::{Doctor, NewDoctor},
    schema::doctors,
    state::AppState,
    validate,
};

use super::resolve_doctor;

#[derive(Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub specialization: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub id: Uuid,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    validate::validate_signup(
        &payload.name,
        &payload.email,
        &payload.phone,
        &payload.password,
    )?;

    let mut conn = state.db()?;
    let doctor_id = conn.transaction::<Uuid, AppError, _>(|conn| {
        let existing: Option<Uuid> = doctors::table
            .filter(doctors::email.eq(&payload.email))
            .select(doctors::id)
            .first(conn)
            .optional()?;
        if existing.is_some() {
            return Err(AppError::duplicate_email());
        }

        let password_hash =
            password::hash_password(&payload.password).map_err(AppError::persistence)?;

        let new_doctor = NewDoctor {
            id: Uuid::new_v4(),
            name: payload.name.clone(),
            specialization: payload.specialization.clone(),
            email: payload.email.clone(),
            password_hash,
            phone: payload.phone.clone(),
        };

        match diesel::insert_into(doctors::table)
            .values(&new_doctor)
            .execute(conn)
        {
            Ok(_) => Ok(new_doctor.id),
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            )) => Err(AppError::validation("phone number already in use")),
            Err(err) => Err(err.into()),
        }
    })?;

    tracing::info!(doctor_id = %doctor_id, "doctor registered");
    Ok((StatusCode::CREATED, Json(SignupResponse { id: doctor_id })))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let mut conn = state.db()?;

    let doctor: Option<Doctor> = doctors::table
        .filter(doctors::email.eq(&payload.email))
        .first(&mut conn)
        .optional()?;
    let doctor = doctor.ok_or_else(AppError::invalid_credentials)?;

    let valid = password::verify_password(&payload.password, &doctor.password_hash)
        .map_err(|_| AppError::invalid_credentials())?;
    if !valid {
        return Err(AppError::invalid_credentials());
    }

    let token = state.jwt.generate_token(&doctor.email)?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.jwt_expiry_hours * 3600,
    }))
}

/// Doctor profile as exposed to callers. The password hash never leaves the
/// service layer.
#[derive(Serialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub name: String,
    pub specialization: String,
    pub email: String,
    pub phone: String,
    pub created_at: NaiveDateTime,
}

impl From<Doctor> for DoctorProfile {
    fn from(doctor: Doctor) -> Self {
        Self {
            id: doctor.id,
            name: doctor.name,
            specialization: doctor.specialization,
            email: doctor.email,
            phone: doctor.phone,
            created_at: doctor.created_at,
        }
    }
}

pub async fn profile(
    State(state): State<AppState>,
    doctor: AuthenticatedDoctor,
) -> AppResult<Json<DoctorProfile>> {
    let mut conn = state.db()?;
    let doctor = resolve_doctor(&mut conn, &doctor.email)?;
    Ok(Json(doctor.into()))
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub phone: Option<String>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = doctors)]
struct UpdateDoctorChangeset<'a> {
    name: Option<&'a str>,
    specialization: Option<&'a str>,
    phone: Option<&'a str>,
}

/// Updates are restricted to name/specialization/phone; email and password
/// cannot be changed through this path. Empty strings mean "leave as-is".
pub async fn update_profile(
    State(state): State<AppState>,
    doctor: AuthenticatedDoctor,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<DoctorProfile>> {
    let name = payload.name.as_deref().filter(|value| !value.is_empty());
    let specialization = payload
        .specialization
        .as_deref()
        .filter(|value| !value.is_empty());
    let phone = payload.phone.as_deref().filter(|value| !value.is_empty());

    let mut conn = state.db()?;
    let updated = conn.transaction::<Doctor, AppError, _>(|conn| {
        let existing = resolve_doctor(conn, &doctor.email)?;

        if name.is_none() && specialization.is_none() && phone.is_none() {
            return Ok(existing);
        }

        let changeset = UpdateDoctorChangeset {
            name,
            specialization,
            phone,
        };

        match diesel::update(doctors::table.find(existing.id))
            .set(&changeset)
            .execute(conn)
        {
            Ok(_) => {}
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            )) => {
                return Err(AppError::validation("phone number already in use"));
            }
            Err(err) => return Err(err.into()),
        }

        let refreshed: Doctor = doctors::table.find(existing.id).first(conn)?;
        Ok(refreshed)
    })?;

    Ok(Json(updated.into()))
}
