//! HTTP routes
//!
//! Every analysis runs on the blocking pool: a cold network fetch or a large
//! matrix would otherwise stall the runtime.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    BoxError, Json, Router,
    error_handling::HandleErrorLayer,
    extract::State,
    routing::{get, post},
};
use facnet::{ClosestQuery, FacilityRoute, RankedFacility, Session};
use facnet_core::prelude::*;
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use tower::{ServiceBuilder, limit::GlobalConcurrencyLimitLayer};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::error::ApiError;

pub struct AppState {
    pub session: Session,
    pub default_place: String,
}

impl AppState {
    fn place(&self, requested: Option<String>) -> String {
        requested
            .filter(|place| !place.trim().is_empty())
            .unwrap_or_else(|| self.default_place.clone())
    }
}

type SharedState = Arc<AppState>;

pub fn router(state: SharedState, timeout: Duration, max_concurrent_requests: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let limits = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handle_overload))
        .timeout(timeout)
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent_requests.max(1)));

    Router::new()
        .route("/health", get(health))
        .route("/facilities", get(list_facilities).put(upload_facilities))
        .route("/route", post(route))
        .route("/closest", post(closest_facilities))
        .route("/od-matrix", post(od_matrix))
        .route("/service-area", post(service_area))
        .route("/vrp", post(vehicle_routing))
        .route("/location-allocation", post(location_allocation))
        .layer(limits)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn handle_overload(error: BoxError) -> ApiError {
    if error.is::<tower::timeout::error::Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::Internal(error.to_string())
    }
}

/// Runs `job` on the blocking pool against the shared state
async fn blocking<T, F>(state: &SharedState, job: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> Result<T, Error> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || job(&state))
        .await
        .map_err(|e| ApiError::Internal(format!("Analysis task failed: {e}")))?
        .map_err(ApiError::from)
}

// ---- health & facilities ----

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub facilities: usize,
    pub cached_places: Vec<String>,
    pub default_place: String,
}

async fn health(State(state): State<SharedState>) -> Result<Json<HealthResponse>, ApiError> {
    blocking(&state, |state| {
        Ok(HealthResponse {
            status: "ok".to_string(),
            facilities: state.session.facilities().len(),
            cached_places: state.session.provider().cached_places(),
            default_place: state.default_place.clone(),
        })
    })
    .await
    .map(Json)
}

async fn list_facilities(State(state): State<SharedState>) -> Result<Json<FeatureCollection>, ApiError> {
    let layer = state.session.facilities_geojson()?;
    Ok(Json(layer))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub count: usize,
    pub names: Vec<String>,
}

/// Replaces the facility table with the CSV in the body
async fn upload_facilities(
    State(state): State<SharedState>,
    body: String,
) -> Result<Json<UploadResponse>, ApiError> {
    blocking(&state, move |state| {
        let store = state.session.load_facilities(body.as_bytes())?;
        Ok(UploadResponse {
            count: store.len(),
            names: store.names().map(str::to_string).collect(),
        })
    })
    .await
    .map(Json)
}

// ---- analyses ----

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub place: Option<String>,
    pub origin: String,
    pub destination: String,
}

async fn route(
    State(state): State<SharedState>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<FacilityRoute>, ApiError> {
    blocking(&state, move |state| {
        let place = state.place(request.place);
        state.session.route(&place, &request.origin, &request.destination)
    })
    .await
    .map(Json)
}

fn policy(strict: bool) -> BatchPolicy {
    if strict {
        BatchPolicy::Strict
    } else {
        BatchPolicy::Exclude
    }
}

#[derive(Debug, Deserialize)]
pub struct ClosestRequest {
    pub place: Option<String>,
    pub source: String,
    pub candidates: Option<Vec<String>>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Serialize)]
pub struct ClosestResponse {
    pub source: String,
    pub ranking: Vec<RankedFacility>,
}

async fn closest_facilities(
    State(state): State<SharedState>,
    Json(request): Json<ClosestRequest>,
) -> Result<Json<ClosestResponse>, ApiError> {
    blocking(&state, move |state| {
        let place = state.place(request.place);
        let query = ClosestQuery {
            candidates: request.candidates,
            limit: request.limit,
            policy: policy(request.strict),
        };
        let ranking = state.session.closest(&place, &request.source, &query)?;
        Ok(ClosestResponse {
            source: request.source,
            ranking,
        })
    })
    .await
    .map(Json)
}

#[derive(Debug, Deserialize)]
pub struct OdMatrixRequest {
    pub place: Option<String>,
    pub origins: Vec<String>,
    pub destinations: Vec<String>,
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OdMatrixResponse {
    pub entries: Vec<CostMatrixEntry>,
    /// Pairs left out because no path connects them
    pub excluded: usize,
}

async fn od_matrix(
    State(state): State<SharedState>,
    Json(request): Json<OdMatrixRequest>,
) -> Result<Json<OdMatrixResponse>, ApiError> {
    blocking(&state, move |state| {
        let place = state.place(request.place);
        let entries = state.session.od_cost_matrix(
            &place,
            request.origins.as_slice(),
            request.destinations.as_slice(),
            policy(request.strict),
        )?;
        let requested = request.origins.len() * request.destinations.len();
        Ok(OdMatrixResponse {
            excluded: requested - entries.len(),
            entries,
        })
    })
    .await
    .map(Json)
}

// ---- analyses without a solver; always answer with an error ----

fn unreachable_result(never: Infallible) -> Json<()> {
    match never {}
}

#[derive(Debug, Deserialize)]
pub struct ServiceAreaRequest {
    pub place: Option<String>,
    pub facility: String,
    pub cutoff_m: Meters,
}

async fn service_area(
    State(state): State<SharedState>,
    Json(request): Json<ServiceAreaRequest>,
) -> Result<Json<()>, ApiError> {
    blocking(&state, move |state| {
        let place = state.place(request.place);
        state
            .session
            .service_area(&place, &request.facility, request.cutoff_m)
    })
    .await
    .map(unreachable_result)
}

#[derive(Debug, Deserialize)]
pub struct VrpRequest {
    pub place: Option<String>,
    pub depot: String,
    pub stops: Vec<String>,
    pub vehicles: usize,
}

async fn vehicle_routing(
    State(state): State<SharedState>,
    Json(request): Json<VrpRequest>,
) -> Result<Json<()>, ApiError> {
    blocking(&state, move |state| {
        let place = state.place(request.place);
        state
            .session
            .solve_vrp(&place, &request.depot, request.stops.as_slice(), request.vehicles)
    })
    .await
    .map(unreachable_result)
}

#[derive(Debug, Deserialize)]
pub struct LocationAllocationRequest {
    pub place: Option<String>,
    pub candidates: Vec<String>,
    pub demand: Vec<String>,
    pub facilities_to_site: usize,
}

async fn location_allocation(
    State(state): State<SharedState>,
    Json(request): Json<LocationAllocationRequest>,
) -> Result<Json<()>, ApiError> {
    blocking(&state, move |state| {
        let place = state.place(request.place);
        state.session.location_allocation(
            &place,
            request.candidates.as_slice(),
            request.demand.as_slice(),
            request.facilities_to_site,
        )
    })
    .await
    .map(unreachable_result)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    };
    use facnet_core::NetworkProvider;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    /// Three junctions on one east-west street plus a detached one
    fn street(place: &str) -> Result<StreetGraph, Error> {
        if place == "Atlantis" {
            return Err(Error::network_fetch(place, "no such place"));
        }
        let mut builder = StreetGraphBuilder::new();
        let west = builder.add_node(-1.2900, 36.8000);
        let mid = builder.add_node(-1.2900, 36.8010);
        let east = builder.add_node(-1.2900, 36.8020);
        builder.add_road(west, mid, 110.0)?;
        builder.add_road(mid, east, 110.0)?;
        builder.add_node(-1.2000, 36.8000);
        Ok(builder.build())
    }

    const FACILITIES: &str = "\
name,category,lat,lon
West Clinic,clinic,-1.2900,36.8000
Mid Pharmacy,pharmacy,-1.2900,36.8010
East Hospital,hospital,-1.2900,36.8020
Hill Dispensary,clinic,-1.2000,36.8000
";

    fn app() -> Router {
        let session = Session::new(Arc::new(NetworkProvider::new(street)));
        session.load_facilities(FACILITIES.as_bytes()).unwrap();
        let state = Arc::new(AppState {
            session,
            default_place: "Nairobi".to_string(),
        });
        router(state, Duration::from_secs(30), 4)
    }

    async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn health_reports_table_size() {
        let (status, body) = call(app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["facilities"], 4);
        assert_eq!(body["cached_places"], json!([]));
    }

    #[tokio::test]
    async fn route_uses_default_place() {
        let (status, body) = call(
            app(),
            Method::POST,
            "/route",
            Some(json!({"origin": "West Clinic", "destination": "East Hospital"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["length"], 220.0);
        assert_eq!(body["feature"]["geometry"]["type"], "LineString");
    }

    #[tokio::test]
    async fn closest_with_limit() {
        let (status, body) = call(
            app(),
            Method::POST,
            "/closest",
            Some(json!({"source": "West Clinic", "limit": 1})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let ranking = body["ranking"].as_array().unwrap();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0]["facility"]["name"], "Mid Pharmacy");
        assert_eq!(ranking[0]["rank"], 1);
    }

    #[tokio::test]
    async fn od_matrix_counts_excluded_pairs() {
        let (status, body) = call(
            app(),
            Method::POST,
            "/od-matrix",
            Some(json!({
                "origins": ["West Clinic"],
                "destinations": ["Hill Dispensary", "East Hospital"],
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let response: OdMatrixResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.excluded, 1);
        assert_eq!(response.entries.len(), 1);
        assert_eq!(response.entries[0].destination, "East Hospital");
        assert_eq!(response.entries[0].length, 220.0);
    }

    #[tokio::test]
    async fn strict_matrix_is_unprocessable() {
        let (status, body) = call(
            app(),
            Method::POST,
            "/od-matrix",
            Some(json!({
                "origins": ["West Clinic"],
                "destinations": ["Hill Dispensary"],
                "strict": true,
            })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "no_path_found");
    }

    #[tokio::test]
    async fn error_statuses() {
        let (status, body) = call(
            app(),
            Method::POST,
            "/route",
            Some(json!({"origin": "West Clinic", "destination": "Nowhere"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "facility_not_found");

        let (status, body) = call(
            app(),
            Method::POST,
            "/route",
            Some(json!({"place": "Atlantis", "origin": "West Clinic", "destination": "East Hospital"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "network_fetch");

        let (status, body) = call(
            app(),
            Method::POST,
            "/vrp",
            Some(json!({"depot": "West Clinic", "stops": ["East Hospital"], "vehicles": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(body["error"], "solver_unavailable");
    }

    #[tokio::test]
    async fn upload_replaces_facilities() {
        let app = app();
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/facilities")
            .header(header::CONTENT_TYPE, "text/csv")
            .body(Body::from("facility_name,latitude,longitude\nDepot,-1.29,36.80\n"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (status, body) = call(app, Method::GET, "/facilities", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "FeatureCollection");
        assert_eq!(body["features"].as_array().unwrap().len(), 1);
        assert_eq!(body["features"][0]["properties"]["name"], "Depot");
    }

    #[tokio::test]
    async fn malformed_upload_is_bad_request() {
        let (status, body) = call(app(), Method::PUT, "/facilities", Some(json!("not,a\ncsv,table"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_data");
    }
}
