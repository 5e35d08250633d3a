//! Mission Executor: parses `mission_start` commands,
//! streams progress frames, and honors `mission_cancel`.
//!
//! A per-execution `CancellationToken` registered in a map keyed by
//! execution id, raced against the operation via `tokio::select!`.

use std::sync::Arc;

use dashmap::DashMap;
use oneagent_mcp_protocol::{Engine, EngineRequest};
use oneagent_mcp_types::McpError;
use parking_lot::Mutex;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::frames::FrameBuilder;
use crate::subscription::{ConnectionId, OutboundSender};

/// Lifecycle state of a [`Mission`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionStatus {
    /// Accepted, not yet running.
    Pending,
    /// Actively executing against the engine.
    Running,
    /// Canceled via `mission_cancel` or connection close.
    Canceled,
    /// Finished successfully.
    Completed,
    /// Finished with an engine error.
    Failed,
}

impl MissionStatus {
    /// Canceled, Completed, and Failed are all terminal: at most one
    /// transition out of Running is allowed.
    pub fn is_terminal(self) -> bool {
        matches!(self, MissionStatus::Canceled | MissionStatus::Completed | MissionStatus::Failed)
    }
}

struct MissionState {
    status: Mutex<MissionStatus>,
    cancel: CancellationToken,
}

/// Parse a `mission_start` command: an optional leading `/mission` token is
/// stripped, the remainder is the objective.
pub fn parse_mission_command(command: &str) -> String {
    let trimmed = command.trim();
    match trimmed.strip_prefix("/mission") {
        Some(rest) => rest.trim().to_string(),
        None => trimmed.to_string(),
    }
}

/// Owns missions keyed by (connection, mission id) and drives their
/// execution against an [`Engine`].
pub struct MissionExecutor {
    engine: Arc<dyn Engine>,
    missions: DashMap<(ConnectionId, String), Arc<MissionState>>,
}

impl MissionExecutor {
    /// New executor dispatching mission work to `engine`.
    pub fn new(engine: Arc<dyn Engine>) -> Arc<Self> {
        Arc::new(Self { engine, missions: DashMap::new() })
    }

    /// Start a mission for `conn_id`. Returns the mission id immediately;
    /// execution proceeds on a spawned task, streaming frames to `sender`
    /// via `frames`.
    pub fn start(
        self: &Arc<Self>,
        conn_id: ConnectionId,
        command: String,
        sender: OutboundSender,
        frames: Arc<FrameBuilder>,
    ) -> String {
        let mission_id = format!("mission_{}", Uuid::new_v4().simple());
        let cancel = CancellationToken::new();
        let state = Arc::new(MissionState { status: Mutex::new(MissionStatus::Pending), cancel: cancel.clone() });
        self.missions.insert((conn_id.clone(), mission_id.clone()), state.clone());

        let objective = parse_mission_command(&command);
        let engine = self.engine.clone();
        let executor = Arc::clone(self);
        let task_mission_id = mission_id.clone();
        let task_conn_id = conn_id.clone();

        tokio::spawn(async move {
            *state.status.lock() = MissionStatus::Running;
            let _ = sender.send(frames.build(
                "mission_update",
                json!({ "missionId": task_mission_id, "status": "running", "objective": objective }),
            ));

            let result = tokio::select! {
                _ = cancel.cancelled() => None,
                response = engine.process_request(EngineRequest {
                    id: task_mission_id.clone(),
                    kind: "mission".into(),
                    method: "mission_start".into(),
                    params: json!({ "objective": objective }),
                    timestamp: chrono::Utc::now(),
                }) => Some(response),
            };

            let terminal = match result {
                None => {
                    *state.status.lock() = MissionStatus::Canceled;
                    let _ = sender.send(frames.build("mission_canceled", json!({ "missionId": task_mission_id })));
                    MissionStatus::Canceled
                }
                Some(response) if response.success => {
                    *state.status.lock() = MissionStatus::Completed;
                    let _ = sender.send(frames.build(
                        "mission_complete",
                        json!({ "missionId": task_mission_id, "result": response.data }),
                    ));
                    MissionStatus::Completed
                }
                Some(response) => {
                    *state.status.lock() = MissionStatus::Failed;
                    let message = response.error.map(|e| e.message).unwrap_or_else(|| "mission failed".into());
                    let _ = sender.send(frames.build(
                        "mission_error",
                        json!({ "missionId": task_mission_id, "error": { "message": message } }),
                    ));
                    MissionStatus::Failed
                }
            };
            debug_assert!(terminal.is_terminal());

            executor.missions.remove(&(task_conn_id, task_mission_id));
        });

        mission_id
    }

    /// Cancel a mission owned by `conn_id`. Fails `unknown_mission` if no
    /// such mission is tracked for that connection.
    pub fn cancel(&self, conn_id: &ConnectionId, mission_id: &str) -> Result<(), McpError> {
        let key = (conn_id.clone(), mission_id.to_string());
        match self.missions.get(&key) {
            Some(state) => {
                if !state.status.lock().is_terminal() {
                    state.cancel.cancel();
                }
                Ok(())
            }
            None => Err(McpError::unknown_mission(mission_id)),
        }
    }

    /// Cancel every mission owned by `conn_id`.
    pub fn cancel_all_for_connection(&self, conn_id: &ConnectionId) {
        for entry in self.missions.iter() {
            let (owner, _mission_id) = entry.key();
            if owner == conn_id {
                let state = entry.value();
                if !state.status.lock().is_terminal() {
                    state.cancel.cancel();
                }
            }
        }
    }

    /// Current status of a tracked mission, if any.
    pub fn status(&self, conn_id: &ConnectionId, mission_id: &str) -> Option<MissionStatus> {
        self.missions.get(&(conn_id.clone(), mission_id.to_string())).map(|s| *s.status.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use oneagent_mcp_protocol::{EngineResponse, Prompt, Resource, Tool};
    use tokio::sync::mpsc;

    struct SlowEngine;

    #[async_trait]
    impl Engine for SlowEngine {
        async fn get_available_tools(&self) -> Vec<Tool> {
            Vec::new()
        }
        async fn get_available_resources(&self) -> Vec<Resource> {
            Vec::new()
        }
        async fn get_available_prompts(&self) -> Vec<Prompt> {
            Vec::new()
        }
        async fn process_request(&self, request: EngineRequest) -> EngineResponse {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            EngineResponse::ok(request.params)
        }
    }

    struct InstantEngine {
        succeed: bool,
    }

    #[async_trait]
    impl Engine for InstantEngine {
        async fn get_available_tools(&self) -> Vec<Tool> {
            Vec::new()
        }
        async fn get_available_resources(&self) -> Vec<Resource> {
            Vec::new()
        }
        async fn get_available_prompts(&self) -> Vec<Prompt> {
            Vec::new()
        }
        async fn process_request(&self, _request: EngineRequest) -> EngineResponse {
            if self.succeed {
                EngineResponse::ok(json!({"done": true}))
            } else {
                EngineResponse::failed("no index found")
            }
        }
    }

    fn frame_builder() -> Arc<FrameBuilder> {
        Arc::new(FrameBuilder::new(
            crate::frames::FrameServerInfo { name: "oneagent-mcp".into(), version: "0.1.0".into() },
            Arc::new(oneagent_mcp_core::SystemClock),
        ))
    }

    #[test]
    fn strips_optional_mission_prefix() {
        assert_eq!(parse_mission_command("/mission build index"), "build index");
        assert_eq!(parse_mission_command("build index"), "build index");
    }

    #[tokio::test]
    async fn cancel_stops_in_flight_mission_with_no_further_frames() {
        let executor = MissionExecutor::new(Arc::new(SlowEngine));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mission_id = executor.start("c1".into(), "/mission build index".into(), tx, frame_builder());

        let first = rx.recv().await.unwrap();
        assert_eq!(first["type"], "mission_update");

        executor.cancel(&"c1".into(), &mission_id).unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(second["type"], "mission_canceled");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn cancel_of_unknown_mission_is_unknown_mission_error() {
        let executor = MissionExecutor::new(Arc::new(InstantEngine { succeed: true }));
        let err = executor.cancel(&"c1".into(), "nope").unwrap_err();
        assert_eq!(err.code, oneagent_mcp_types::ErrorCode::UnknownMission);
    }

    #[tokio::test]
    async fn successful_mission_emits_complete_frame() {
        let executor = MissionExecutor::new(Arc::new(InstantEngine { succeed: true }));
        let (tx, mut rx) = mpsc::unbounded_channel();
        executor.start("c1".into(), "/mission ok".into(), tx, frame_builder());

        let _update = rx.recv().await.unwrap();
        let terminal = rx.recv().await.unwrap();
        assert_eq!(terminal["type"], "mission_complete");
    }

    #[tokio::test]
    async fn failed_mission_emits_error_frame() {
        let executor = MissionExecutor::new(Arc::new(InstantEngine { succeed: false }));
        let (tx, mut rx) = mpsc::unbounded_channel();
        executor.start("c1".into(), "/mission fail".into(), tx, frame_builder());

        let _update = rx.recv().await.unwrap();
        let terminal = rx.recv().await.unwrap();
        assert_eq!(terminal["type"], "mission_error");
    }
}
