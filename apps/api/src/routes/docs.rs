//! Machine-readable API description (Swagger 2.0), served at
//! `/documentation/json`.

use axum::{extract::State, Json};
use serde_json::{json, Map, Value};

use crate::state::AppState;

pub const DOCS_PATH: &str = "/documentation/json";

struct Endpoint {
    method: &'static str,
    /// Swagger path template (`{param}` placeholders).
    path: &'static str,
    tag: &'static str,
    summary: &'static str,
    secured: bool,
}

const TAGS: &[(&str, &str)] = &[
    ("auth", "Authentication endpoints"),
    ("games", "Games management endpoints"),
    ("collection", "User collection endpoints"),
    ("reviews", "Reviews endpoints"),
    ("stats", "Statistics endpoints"),
    ("health", "Health check endpoints"),
];

#[rustfmt::skip]
const ENDPOINTS: &[Endpoint] = &[
    Endpoint { method: "get", path: "/health", tag: "health", summary: "Liveness check", secured: false },
    Endpoint { method: "get", path: "/health/detailed", tag: "health", summary: "Dependency health", secured: false },
    Endpoint { method: "post", path: "/api/auth/register", tag: "auth", summary: "Create an account", secured: false },
    Endpoint { method: "post", path: "/api/auth/login", tag: "auth", summary: "Log in", secured: false },
    Endpoint { method: "get", path: "/api/auth/me", tag: "auth", summary: "Current account", secured: true },
    Endpoint { method: "get", path: "/api/games/search", tag: "games", summary: "Search the catalog", secured: false },
    Endpoint { method: "get", path: "/api/games/{id}", tag: "games", summary: "Catalog game detail", secured: false },
    Endpoint { method: "get", path: "/api/collection", tag: "collection", summary: "List the collection", secured: true },
    Endpoint { method: "post", path: "/api/collection", tag: "collection", summary: "Add a game", secured: true },
    Endpoint { method: "patch", path: "/api/collection/{gameId}", tag: "collection", summary: "Update status or playtime", secured: true },
    Endpoint { method: "delete", path: "/api/collection/{gameId}", tag: "collection", summary: "Remove a game", secured: true },
    Endpoint { method: "post", path: "/api/reviews", tag: "reviews", summary: "Create or replace a review", secured: true },
    Endpoint { method: "get", path: "/api/reviews/me", tag: "reviews", summary: "Caller's reviews", secured: true },
    Endpoint { method: "get", path: "/api/reviews/game/{gameId}", tag: "reviews", summary: "Reviews of a game", secured: false },
    Endpoint { method: "patch", path: "/api/reviews/{reviewId}", tag: "reviews", summary: "Edit a review", secured: true },
    Endpoint { method: "delete", path: "/api/reviews/{reviewId}", tag: "reviews", summary: "Delete a review", secured: true },
    Endpoint { method: "get", path: "/api/stats/me", tag: "stats", summary: "Caller's statistics", secured: true },
    Endpoint { method: "get", path: "/api/stats/global", tag: "stats", summary: "Global statistics", secured: false },
];

fn path_parameters(path: &str) -> Vec<Value> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
        .map(|name| {
            json!({
                "name": name,
                "in": "path",
                "required": true,
                "type": "string",
            })
        })
        .collect()
}

pub fn api_document(port: u16) -> Value {
    let mut paths = Map::new();
    for endpoint in ENDPOINTS {
        let mut operation = json!({
            "tags": [endpoint.tag],
            "summary": endpoint.summary,
            "responses": { "200": { "description": "Success" } },
        });
        let parameters = path_parameters(endpoint.path);
        if !parameters.is_empty() {
            operation["parameters"] = Value::Array(parameters);
        }
        if endpoint.secured {
            operation["security"] = json!([{ "Bearer": [] }]);
        }

        if let Value::Object(methods) = paths
            .entry(endpoint.path)
            .or_insert_with(|| Value::Object(Map::new()))
        {
            methods.insert(endpoint.method.to_string(), operation);
        }
    }

    json!({
        "swagger": "2.0",
        "info": {
            "title": "GameVault API",
            "description": "API for managing your game collection",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "host": format!("localhost:{port}"),
        "schemes": ["http"],
        "consumes": ["application/json"],
        "produces": ["application/json"],
        "tags": TAGS
            .iter()
            .map(|(name, description)| json!({ "name": name, "description": description }))
            .collect::<Vec<_>>(),
        "securityDefinitions": {
            "Bearer": { "type": "apiKey", "name": "Authorization", "in": "header" },
        },
        "paths": paths,
    })
}

/// GET /documentation/json
pub async fn docs_handler(State(state): State<AppState>) -> Json<Value> {
    Json(api_document(state.config.port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_parameters_extracted_from_template() {
        let params = path_parameters("/api/collection/{gameId}");
        assert_eq!(params.len(), 1);
        assert_eq!(params[0]["name"], "gameId");
        assert!(path_parameters("/api/stats/global").is_empty());
    }

    #[test]
    fn test_secured_operations_reference_bearer_scheme() {
        let doc = api_document(3001);
        assert_eq!(doc["paths"]["/api/stats/me"]["get"]["security"][0]["Bearer"], json!([]));
        assert!(doc["paths"]["/api/stats/global"]["get"].get("security").is_none());
        assert_eq!(doc["host"], "localhost:3001");
    }
}
