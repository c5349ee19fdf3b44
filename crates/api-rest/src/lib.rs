//! # API REST
//!
//! REST API over the Kindred permission checks.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, the acting user header)
//!
//! The acting user is named by the `x-user` header. Requests without it act as a guest.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use kindred_core::{
    AccessError, AccessLevel, DocumentReference, FixedUserManager, PatientRepository, RecordId,
    RecordStore, StatusResponse, ValidationService,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Header naming the acting user.
pub const USER_HEADER: &str = "x-user";

type ApiError = (StatusCode, &'static str);

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    store: Arc<RecordStore>,
}

impl AppState {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Builds the validation facade acting as the user named in `headers`.
    fn validation_for(&self, headers: &HeaderMap) -> Result<ValidationService, ApiError> {
        let user = match headers.get(USER_HEADER) {
            None => None,
            Some(value) => {
                let name = value
                    .to_str()
                    .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid x-user header"))?;
                match self.store.user_by_name(name) {
                    Ok(user) => Some(user),
                    Err(e) => {
                        tracing::debug!("rejecting request: {e}");
                        return Err((StatusCode::UNAUTHORIZED, "Unknown user"));
                    }
                }
            }
        };

        Ok(ValidationService::from_store(
            self.store.clone(),
            Arc::new(FixedUserManager::new(user)),
        ))
    }

    fn family_document(&self, family_id: &str) -> Result<DocumentReference, ApiError> {
        let id = RecordId::parse(family_id)
            .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid family id"))?;
        Ok(self.store.config().family_reference(&id))
    }
}

fn internal(e: AccessError) -> ApiError {
    tracing::error!("permission check error: {:?}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
}

fn with_status(response: StatusResponse) -> (StatusCode, Json<StatusResponse>) {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Candidate patients for a family.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberCheckReq {
    #[serde(default)]
    pub members: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AccessRes {
    pub granted: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PatientAccessQuery {
    /// Required tier, `view` or `edit`. Defaults to `edit`.
    pub level: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DocumentAccessQuery {
    /// Document reference; `name` and `space.name` resolve against the patient space.
    pub document: String,
    /// Permission name, e.g. `view` or `edit`.
    pub right: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, check_members, family_access, patient_access, document_access),
    components(schemas(HealthRes, MemberCheckReq, AccessRes, StatusResponse))
)]
pub struct ApiDoc;

/// Builds the REST router with Swagger UI at `/swagger-ui`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/families/:family_id/members/check", post(check_members))
        .route("/families/:family_id/access", get(family_access))
        .route("/patients/:patient_id/access", get(patient_access))
        .route("/access", get(document_access))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Kindred is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/families/{family_id}/members/check",
    params(("family_id" = String, Path, description = "Family identifier")),
    request_body = MemberCheckReq,
    responses(
        (status = 200, description = "Every candidate can be added", body = StatusResponse),
        (status = 401, description = "Insufficient permissions on a candidate", body = StatusResponse),
        (status = 404, description = "Unknown family or patient", body = StatusResponse),
        (status = 501, description = "Candidate belongs to another family", body = StatusResponse),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Checks whether every listed patient may be added to the family.
///
/// The response status mirrors the first failing candidate's verdict.
#[axum::debug_handler]
async fn check_members(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(family_id): Path<String>,
    Json(req): Json<MemberCheckReq>,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    let validation = state.validation_for(&headers)?;
    let family = state.family_document(&family_id)?;

    let response = validation
        .can_add_every_member(&family, req.members.as_deref())
        .map_err(internal)?;
    Ok(with_status(response))
}

#[utoipa::path(
    get,
    path = "/families/{family_id}/access",
    params(("family_id" = String, Path, description = "Family identifier")),
    responses(
        (status = 200, description = "Actor may edit the family", body = StatusResponse),
        (status = 401, description = "Insufficient permissions", body = StatusResponse),
        (status = 400, description = "Bad request")
    )
)]
/// Checks whether the acting user may edit the family record.
#[axum::debug_handler]
async fn family_access(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(family_id): Path<String>,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    let validation = state.validation_for(&headers)?;
    let family = state.family_document(&family_id)?;
    Ok(with_status(validation.check_family_access(&family)))
}

#[utoipa::path(
    get,
    path = "/patients/{patient_id}/access",
    params(
        ("patient_id" = String, Path, description = "Patient identifier"),
        PatientAccessQuery
    ),
    responses(
        (status = 200, description = "Whether the tier is held", body = AccessRes),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Checks whether the acting user holds at least `level` over the patient.
#[axum::debug_handler]
async fn patient_access(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(patient_id): Path<String>,
    Query(query): Query<PatientAccessQuery>,
) -> Result<Json<AccessRes>, ApiError> {
    let validation = state.validation_for(&headers)?;

    let level = match query.level.as_deref() {
        None => AccessLevel::Edit,
        Some(level) => level
            .parse::<AccessLevel>()
            .map_err(|_| (StatusCode::BAD_REQUEST, "Unknown access level"))?,
    };

    if !matches!(level, AccessLevel::View | AccessLevel::Edit) {
        return Err((StatusCode::BAD_REQUEST, "Level must be view or edit"));
    }

    let patient = match RecordId::parse(&patient_id) {
        Ok(id) => state.store.patient_by_id(&id).map_err(internal)?,
        Err(_) => None,
    };
    let Some(patient) = patient else {
        return Ok(Json(AccessRes { granted: false }));
    };

    let granted = if level == AccessLevel::View {
        validation.has_patient_view_access(&patient)
    } else {
        validation.has_patient_edit_access(&patient)
    }
    .map_err(internal)?;

    Ok(Json(AccessRes { granted }))
}

#[utoipa::path(
    get,
    path = "/access",
    params(DocumentAccessQuery),
    responses(
        (status = 200, description = "Whether the right is held", body = AccessRes),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Checks whether the acting user holds a named right on a document.
#[axum::debug_handler]
async fn document_access(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DocumentAccessQuery>,
) -> Result<Json<AccessRes>, ApiError> {
    let validation = state.validation_for(&headers)?;
    let document = state
        .store
        .config()
        .resolver()
        .resolve(&query.document)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid document reference"))?;

    let granted = validation
        .has_access(&document, &query.right)
        .map_err(internal)?;
    Ok(Json(AccessRes { granted }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use kindred_core::CoreConfig;
    use std::path::PathBuf;
    use tower::ServiceExt;

    const FIXTURE: &str = r#"
users:
  - username: alice
  - username: bob
patients:
  - id: P0000001
    reporter: alice
  - id: P0000002
    reporter: bob
    visibility: public
  - id: P0000003
    reporter: bob
families:
  - id: FAM0000001
    members: [P0000001]
  - id: FAM0000002
    members: [P0000003]
"#;

    fn app() -> Router {
        let cfg = Arc::new(CoreConfig::with_data_file(PathBuf::from("kindred.yaml")).unwrap());
        let store = RecordStore::from_yaml(cfg, FIXTURE).expect("fixture should load");
        router(AppState::new(Arc::new(store)))
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app().oneshot(request).await.expect("request should complete");
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, body)
    }

    fn get_as(uri: &str, user: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_HEADER, user);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn check_members_as(family: &str, body: &str, user: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/families/{family}/members/check"))
            .header("content-type", "application/json")
            .header(USER_HEADER, user)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_alive() {
        let (status, body) = send(get_as("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn check_members_succeeds_for_addable_candidates() {
        let request = check_members_as("FAM0000001", r#"{"members":["P0000001"]}"#, "alice");
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["statusCode"], 200);
    }

    #[tokio::test]
    async fn check_members_treats_missing_list_as_success() {
        let (status, _) = send(check_members_as("FAM0000001", "{}", "alice")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn check_members_status_line_mirrors_first_failure() {
        let request =
            check_members_as("FAM0000001", r#"{"members":["P0000003","P0000002"]}"#, "alice");
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(body["statusCode"], 501);
        assert_eq!(body["errorType"], "familyConflict");

        let request = check_members_as("FAM0000001", r#"{"members":["P0000002"]}"#, "alice");
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errorType"], "permissions");
    }

    #[tokio::test]
    async fn family_access_denies_other_users() {
        let (status, body) = send(get_as("/families/FAM0000001/access", Some("alice"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["statusCode"], 200);

        let (status, body) = send(get_as("/families/FAM0000001/access", Some("bob"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body["message"],
            "Insufficient permissions to edit the family record."
        );
    }

    #[tokio::test]
    async fn unknown_user_is_rejected() {
        let (status, _) = send(get_as("/families/FAM0000001/access", Some("mallory"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn patient_access_checks_requested_level() {
        let (_, body) = send(get_as("/patients/P0000002/access?level=view", None)).await;
        assert_eq!(body["granted"], true);

        let (_, body) = send(get_as("/patients/P0000002/access", None)).await;
        assert_eq!(body["granted"], false);

        let (_, body) = send(get_as("/patients/P0000002/access?level=edit", Some("bob"))).await;
        assert_eq!(body["granted"], true);

        let (_, body) = send(get_as("/patients/P0000404/access?level=view", Some("bob"))).await;
        assert_eq!(body["granted"], false);

        let (status, _) = send(get_as("/patients/P0000002/access?level=owner", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn document_access_accepts_named_rights() {
        let (_, body) = send(get_as("/access?document=P0000001&right=EDIT", Some("alice"))).await;
        assert_eq!(body["granted"], true);

        let (_, body) = send(get_as("/access?document=P0000001&right=fly", Some("alice"))).await;
        assert_eq!(body["granted"], false);

        let (status, _) = send(get_as("/access?document=a.b.c&right=view", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
