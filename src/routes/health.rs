use axum::Json;
use chrono::Utc;

/// GET /health
/// Response: 200 OK with JSON; never touches the document store
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
      "status": "healthy",
      "timestamp": Utc::now().timestamp()
    }))
}
