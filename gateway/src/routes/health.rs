use axum::{extract::State, http::StatusCode};

use crate::state::SharedState;

/// `GET /healthz`
///
/// 200 while the node connection is up, 500 otherwise.
pub async fn healthz(State(state): State<SharedState>) -> (StatusCode, &'static str) {
    if state.health.is_healthy() {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "API ERROR")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_state;

    #[tokio::test]
    async fn reports_connection_health() {
        let state = test_state();

        let (status, body) = healthz(State(state.clone())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "API ERROR");

        state.health.set_connected();
        let (status, body) = healthz(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }
}
