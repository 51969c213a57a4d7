use crate::interface_adapters::handlers;
use crate::interface_adapters::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

// Build the HTTP router for the match engine's command surface.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/game/join", post(handlers::join))
        .route("/game/join-random", post(handlers::join_random))
        .route("/game/leave", post(handlers::leave))
        .route("/game/position", post(handlers::position))
        .route("/game/interact", post(handlers::interact))
        .route("/game/drop", post(handlers::drop_flag))
        .route("/game/death", post(handlers::death))
        .route("/game/attack", post(handlers::attack))
        .route("/arenas", get(handlers::list_arenas))
        .route("/arenas/{arena}/force-start", post(handlers::force_start))
        .route("/arenas/{arena}/force-end", post(handlers::force_end))
        .route("/arenas/{arena}/enable", post(handlers::enable))
        .route("/arenas/{arena}/disable", post(handlers::disable))
        .route("/players/{player}/stats", get(handlers::player_stats))
        .route("/setup/start", post(handlers::setup_start))
        .route("/setup/position", post(handlers::setup_position))
        .route("/setup/advance", post(handlers::setup_advance))
        .route("/setup/cancel", post(handlers::setup_cancel))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{DataStore, RegionGuard};
    use crate::domain::{Arena, PlayerId, PlayerStats, Position};
    use crate::use_cases::{MatchRegistry, RegistrySettings};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;
    use uuid::Uuid;

    // In-memory double standing in for the JSON file store.
    #[derive(Default)]
    struct MemoryStore {
        arenas: Mutex<HashMap<String, Arena>>,
        stats: Mutex<HashMap<PlayerId, PlayerStats>>,
    }

    #[async_trait]
    impl DataStore for MemoryStore {
        async fn load_arena(&self, name: &str) -> Result<Option<Arena>, String> {
            Ok(self.arenas.lock().await.get(&name.to_lowercase()).cloned())
        }

        async fn save_arena(&self, arena: &Arena) -> Result<(), String> {
            self.arenas
                .lock()
                .await
                .insert(arena.name.to_lowercase(), arena.clone());
            Ok(())
        }

        async fn delete_arena(&self, name: &str) -> Result<(), String> {
            self.arenas.lock().await.remove(&name.to_lowercase());
            Ok(())
        }

        async fn list_arenas(&self) -> Result<Vec<Arena>, String> {
            Ok(self.arenas.lock().await.values().cloned().collect())
        }

        async fn load_player_stats(&self, player: PlayerId) -> Result<PlayerStats, String> {
            Ok(self
                .stats
                .lock()
                .await
                .get(&player)
                .copied()
                .unwrap_or_default())
        }

        async fn save_player_stats(
            &self,
            player: PlayerId,
            stats: &PlayerStats,
        ) -> Result<(), String> {
            self.stats.lock().await.insert(player, *stats);
            Ok(())
        }
    }

    struct AllowAllGuard;

    impl RegionGuard for AllowAllGuard {
        fn is_protected(&self, _position: &Position) -> bool {
            false
        }

        fn create_region(
            &self,
            _arena_name: &str,
            _corner1: Position,
            _corner2: Position,
        ) -> Result<(), String> {
            Ok(())
        }
    }

    fn playable_arena(name: &str) -> Arena {
        let mut arena = Arena::new(name);
        arena.world = Some("arena_world".to_string());
        arena.waiting_lobby = Some(Position::new(0.0, 64.0, 0.0));
        arena.spectator_point = Some(Position::new(0.0, 80.0, 0.0));
        arena.red_flag = Some(Position::new(-50.0, 64.0, 0.0));
        arena.blue_flag = Some(Position::new(50.0, 64.0, 0.0));
        arena.red_flag_return = Some(Position::new(-48.0, 64.0, 0.0));
        arena.blue_flag_return = Some(Position::new(48.0, 64.0, 0.0));
        arena.red_spawns = vec![
            Position::new(-45.0, 64.0, 5.0),
            Position::new(-45.0, 64.0, -5.0),
        ];
        arena.blue_spawns = vec![
            Position::new(45.0, 64.0, 5.0),
            Position::new(45.0, 64.0, -5.0),
        ];
        arena.corner1 = Some(Position::new(-60.0, 0.0, -60.0));
        arena.corner2 = Some(Position::new(60.0, 128.0, 60.0));
        arena.enabled = true;
        arena
    }

    async fn build_test_app(arenas: Vec<Arena>) -> Router {
        let store = Arc::new(MemoryStore::default());
        for arena in arenas {
            store.save_arena(&arena).await.expect("seed arena");
        }
        let registry = Arc::new(MatchRegistry::new(
            RegistrySettings::default(),
            store.clone(),
            Arc::new(AllowAllGuard),
        ));
        registry.load_arenas().await;
        app(Arc::new(crate::interface_adapters::state::AppState {
            registry,
            store,
        }))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("expected request to build")
    }

    #[tokio::test]
    async fn when_join_names_an_unknown_arena_then_returns_404() {
        let app = build_test_app(vec![]).await;

        let request = post_json(
            "/game/join",
            json!({
                "player_id": Uuid::new_v4(),
                "display_name": "Scout",
                "arena": "nowhere"
            }),
        );
        let response = app.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn when_join_is_valid_then_returns_the_assigned_team() {
        let app = build_test_app(vec![playable_arena("outpost")]).await;

        let request = post_json(
            "/game/join",
            json!({
                "player_id": Uuid::new_v4(),
                "display_name": "Scout",
                "arena": "outpost"
            }),
        );
        let response = app.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("expected response body");
        let payload: Value = serde_json::from_slice(&body).expect("expected json body");
        assert_eq!(payload["arena"], "outpost");
        assert_eq!(payload["team"], "red");
    }

    #[tokio::test]
    async fn when_the_same_player_joins_twice_then_returns_409() {
        let app = build_test_app(vec![playable_arena("outpost")]).await;
        let player = Uuid::new_v4();

        let first = post_json(
            "/game/join",
            json!({"player_id": player, "display_name": "Scout", "arena": "outpost"}),
        );
        let response = app.clone().oneshot(first).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let second = post_json(
            "/game/join",
            json!({"player_id": player, "display_name": "Scout", "arena": "outpost"}),
        );
        let response = app.oneshot(second).await.expect("response");
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn when_leave_names_an_idle_player_then_returns_404() {
        let app = build_test_app(vec![]).await;

        let request = post_json("/game/leave", json!({"player_id": Uuid::new_v4()}));
        let response = app.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn arena_listing_reports_live_match_state() {
        let app = build_test_app(vec![playable_arena("outpost")]).await;

        let join = post_json(
            "/game/join",
            json!({"player_id": Uuid::new_v4(), "display_name": "Scout", "arena": "outpost"}),
        );
        app.clone().oneshot(join).await.expect("join response");

        let request = Request::builder()
            .method("GET")
            .uri("/arenas")
            .body(Body::empty())
            .expect("expected request to build");
        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("expected response body");
        let payload: Value = serde_json::from_slice(&body).expect("expected json body");
        assert_eq!(payload[0]["name"], "outpost");
        assert_eq!(payload[0]["phase"], "waiting");
        assert_eq!(payload[0]["players"], 1);
    }

    #[tokio::test]
    async fn stats_for_an_unknown_player_are_zeroed_at_level_one() {
        let app = build_test_app(vec![]).await;

        let request = Request::builder()
            .method("GET")
            .uri(format!("/players/{}/stats", Uuid::new_v4()))
            .body(Body::empty())
            .expect("expected request to build");
        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("expected response body");
        let payload: Value = serde_json::from_slice(&body).expect("expected json body");
        assert_eq!(payload["kills"], 0);
        assert_eq!(payload["level"], 1);
    }

    #[tokio::test]
    async fn setup_flow_walks_steps_over_http() {
        let app = build_test_app(vec![]).await;
        let admin = Uuid::new_v4();

        let start = post_json(
            "/setup/start",
            json!({"admin_id": admin, "arena": "quarry", "world": "arena_world"}),
        );
        let response = app.clone().oneshot(start).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        // Advancing without recording a position is refused.
        let advance = post_json("/setup/advance", json!({"admin_id": admin}));
        let response = app.oneshot(advance).await.expect("response");
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
