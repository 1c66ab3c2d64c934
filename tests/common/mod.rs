use std::env;
use std::sync::Arc;

use anyhow::{anyhow, ensure, Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::NaiveDateTime;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use http_body_util::BodyExt;
use mediscribe::auth::jwt::JwtService;
use mediscribe::config::AppConfig;
use mediscribe::db::{self, PgPool};
use mediscribe::external::{ExternalServiceError, SpeechToText, TextEnhancer};
use mediscribe::routes;
use mediscribe::state::AppState;
use once_cell::sync::Lazy;
use serde::Serialize;
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use uuid::Uuid;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub const DEFAULT_RAW_TEXT: &str =
    "patient reports persistent headaches and light sensitivity for two weeks";
pub const DEFAULT_REPORT: &str = "1. Patient Information\n2. Patient History\n3. Symptoms\n\
4. Diagnosis\n5. Treatment Plan\n6. Recommendations";

#[derive(Default)]
pub struct FakeTranscriber {
    failure: Mutex<Option<String>>,
    text: Mutex<Option<String>>,
}

impl FakeTranscriber {
    pub async fn fail_with(&self, message: &str) {
        *self.failure.lock().await = Some(message.to_string());
    }

    pub async fn return_text(&self, text: &str) {
        *self.text.lock().await = Some(text.to_string());
    }
}

#[async_trait]
impl SpeechToText for FakeTranscriber {
    async fn transcribe(&self, _audio_url: &str) -> Result<String, ExternalServiceError> {
        if let Some(message) = self.failure.lock().await.clone() {
            return Err(ExternalServiceError::Service(message));
        }
        Ok(self
            .text
            .lock()
            .await
            .clone()
            .unwrap_or_else(|| DEFAULT_RAW_TEXT.to_string()))
    }
}

#[derive(Default)]
pub struct FakeEnhancer {
    failure: Mutex<Option<String>>,
}

impl FakeEnhancer {
    pub async fn fail_with(&self, message: &str) {
        *self.failure.lock().await = Some(message.to_string());
    }
}

#[async_trait]
impl TextEnhancer for FakeEnhancer {
    async fn enhance(&self, raw_text: &str) -> Result<String, ExternalServiceError> {
        if let Some(message) = self.failure.lock().await.clone() {
            return Err(ExternalServiceError::Service(message));
        }
        Ok(format!("{DEFAULT_REPORT}\n\nTranscription:\n{raw_text}"))
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
    transcriber: Arc<FakeTranscriber>,
    enhancer: Arc<FakeEnhancer>,
}

impl TestApp {
    /// Returns `None` (and the test should pass vacuously) when no test
    /// database is configured.
    pub async fn new() -> Result<Option<Self>> {
        let Ok(database_url) = env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set; skipping integration test");
            return Ok(None);
        };

        let config = AppConfig {
            database_url: database_url.clone(),
            database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: "test-issuer".to_string(),
            jwt_audience: "test-audience".to_string(),
            jwt_expiry_hours: 24,
            cors_allowed_origin: None,
            assemblyai_api_key: "test-key".to_string(),
            assemblyai_endpoint: "http://127.0.0.1:1".to_string(),
            groq_api_key: "test-key".to_string(),
            groq_endpoint: "http://127.0.0.1:1".to_string(),
            groq_model: "test-model".to_string(),
        };

        let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
        prepare_database(&pool).await?;

        let jwt = JwtService::from_config(&config);
        let transcriber = Arc::new(FakeTranscriber::default());
        let enhancer = Arc::new(FakeEnhancer::default());
        let state = AppState::new(
            pool,
            config,
            jwt,
            transcriber.clone(),
            enhancer.clone(),
        );
        let router = routes::create_router(state.clone());

        Ok(Some(Self {
            state,
            router,
            transcriber,
            enhancer,
        }))
    }

    pub async fn cleanup(&self) -> Result<()> {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get cleanup connection: {err}"))?;
            truncate_all(&mut conn)?;
            Ok(())
        })
        .await
        .context("cleanup task panicked")?
    }

    pub fn transcriber(&self) -> Arc<FakeTranscriber> {
        self.transcriber.clone()
    }

    pub fn enhancer(&self) -> Arc<FakeEnhancer> {
        self.enhancer.clone()
    }

    pub async fn signup_doctor(&self, email: &str, phone: &str) -> Result<Uuid> {
        #[derive(Serialize)]
        struct SignupPayload<'a> {
            name: &'a str,
            specialization: &'a str,
            email: &'a str,
            phone: &'a str,
            password: &'a str,
        }

        let response = self
            .post_json(
                "/api/auth/signup",
                &SignupPayload {
                    name: "Dr. Test",
                    specialization: "General Medicine",
                    email,
                    phone,
                    password: "longenough1",
                },
                None,
            )
            .await?;

        ensure!(
            response.status() == StatusCode::CREATED,
            "signup failed with status {}",
            response.status()
        );

        let body = body_to_vec(response.into_body()).await?;
        #[derive(serde::Deserialize)]
        struct SignupResponse {
            id: Uuid,
        }
        let parsed: SignupResponse = serde_json::from_slice(&body)?;
        Ok(parsed.id)
    }

    pub async fn login_token(&self, email: &str, password: &str) -> Result<String> {
        #[derive(Serialize)]
        struct LoginPayload<'a> {
            email: &'a str,
            password: &'a str,
        }

        let response = self
            .post_json("/api/auth/login", &LoginPayload { email, password }, None)
            .await?;

        ensure!(
            response.status() == StatusCode::OK,
            "login failed with status {}",
            response.status()
        );

        let body = body_to_vec(response.into_body()).await?;
        #[derive(serde::Deserialize)]
        struct LoginResponse {
            token: String,
        }
        let parsed: LoginResponse = serde_json::from_slice(&body)?;
        Ok(parsed.token)
    }

    pub async fn register_and_login(&self, email: &str, phone: &str) -> Result<String> {
        self.signup_doctor(email, phone).await?;
        self.login_token(email, "longenough1").await
    }

    /// Insert a transcription row directly, bypassing the pipeline, so tests
    /// can control `created_at`.
    pub async fn seed_transcription(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        created_at: NaiveDateTime,
    ) -> Result<Uuid> {
        self.with_conn(move |conn| {
            use mediscribe::schema::transcriptions;
            let id = Uuid::new_v4();
            diesel::insert_into(transcriptions::table)
                .values((
                    transcriptions::id.eq(id),
                    transcriptions::doctor_id.eq(doctor_id),
                    transcriptions::patient_id.eq(patient_id),
                    transcriptions::text.eq("seeded text"),
                    transcriptions::report.eq("seeded report"),
                    transcriptions::created_at.eq(created_at),
                ))
                .execute(conn)
                .context("failed to seed transcription")?;
            Ok(id)
        })
        .await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::POST, path, payload, token).await
    }

    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::PATCH, path, payload, token).await
    }

    #[allow(dead_code)]
    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::PUT, path, payload, token).await
    }

    async fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let builder = Request::builder().method(Method::DELETE).uri(path);
        let builder = if let Some(token) = token {
            builder.header("authorization", format!("Bearer {token}"))
        } else {
            builder
        };
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PgConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get database connection: {err}"))?;
            f(&mut conn)
        })
        .await
        .context("connection task panicked")?
    }
}

pub async fn acquire_db_lock() -> tokio::sync::MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

pub async fn body_to_json(body: Body) -> Result<serde_json::Value> {
    let bytes = body_to_vec(body).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn prepare_database(pool: &PgPool) -> Result<()> {
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = pool
            .get()
            .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|err| anyhow!("failed to run migrations: {err}"))?;
        truncate_all(&mut conn)?;
        Ok(())
    })
    .await
    .context("migration task panicked")?
}

fn truncate_all(conn: &mut PgConnection) -> Result<()> {
    conn.batch_execute(
        "TRUNCATE TABLE doctor_stats, transcriptions, patients, doctors RESTART IDENTITY CASCADE;",
    )
    .context("failed to truncate tables")?;
    Ok(())
}
