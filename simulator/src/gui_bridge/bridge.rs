use crate::workflow::config::PairedDevice;
use crate::workflow::runner::Runner;
use meshcore::device_interface::{DeviceDescriptor, LocationFix, PoiKind};
use meshcore::{CalibrationConfig, TrackingError, TrackingResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::task::JoinHandle;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

pub fn gui_bind_address(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

#[derive(Debug, Deserialize)]
struct Toggle {
    enabled: bool,
}

#[derive(Debug, Default, Deserialize)]
struct Settings {
    #[serde(default)]
    safe_distance: Option<u32>,
    #[serde(default)]
    calibration_offset: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct PinRequest {
    #[serde(rename = "type")]
    kind: PoiKind,
}

fn status_for(error: &TrackingError) -> StatusCode {
    match error {
        TrackingError::PreconditionNotMet(_) => StatusCode::CONFLICT,
        TrackingError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        TrackingError::TransientUpstreamFailure(_) => StatusCode::BAD_GATEWAY,
        TrackingError::InvalidInput(_) => StatusCode::BAD_REQUEST,
    }
}

fn respond<T: Serialize>(result: TrackingResult<T>) -> Response {
    match result {
        Ok(value) => warp::reply::with_status(
            warp::reply::json(&json!({ "status": "ok", "result": value })),
            StatusCode::OK,
        )
        .into_response(),
        Err(err) => warp::reply::with_status(
            warp::reply::json(&json!({ "status": "skipped", "error": err.to_string() })),
            status_for(&err),
        )
        .into_response(),
    }
}

async fn apply_settings(runner: &Runner, settings: Settings) -> TrackingResult<CalibrationConfig> {
    if let Some(meters) = settings.safe_distance {
        runner.set_safe_distance(meters).await?;
    }
    if let Some(offset) = settings.calibration_offset {
        runner.set_calibration_offset(offset).await;
    }
    Ok(runner.calibration().await)
}

async fn pair(runner: &Runner, device: PairedDevice) -> TrackingResult<bool> {
    let descriptor = DeviceDescriptor::new(device.id, device.name)?;
    Ok(runner.pair_device(&descriptor).await)
}

/// Control and snapshot endpoints for the presentation layer.
pub fn routes(runner: Runner) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let with_runner = warp::any().map(move || runner.clone());

    let snapshot = warp::path!("snapshot")
        .and(warp::get())
        .and(with_runner.clone())
        .and_then(|runner: Runner| async move {
            Ok::<_, Infallible>(warp::reply::json(&runner.snapshot().await))
        });

    let metrics = warp::path!("metrics")
        .and(warp::get())
        .and(with_runner.clone())
        .map(|runner: Runner| warp::reply::json(&runner.metrics()));

    let scan = warp::path!("scan")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_runner.clone())
        .and_then(|toggle: Toggle, runner: Runner| async move {
            Ok::<_, Infallible>(respond(runner.set_scanning(toggle.enabled).await))
        });

    let record = warp::path!("record")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_runner.clone())
        .and_then(|toggle: Toggle, runner: Runner| async move {
            let recording = runner.set_recording(toggle.enabled).await;
            Ok::<_, Infallible>(respond(Ok(recording)))
        });

    let test_mode = warp::path!("test-mode")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_runner.clone())
        .and_then(|toggle: Toggle, runner: Runner| async move {
            runner.set_test_mode(toggle.enabled).await;
            Ok::<_, Infallible>(respond(Ok(toggle.enabled)))
        });

    let settings = warp::path!("settings")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_runner.clone())
        .and_then(|settings: Settings, runner: Runner| async move {
            Ok::<_, Infallible>(respond(apply_settings(&runner, settings).await))
        });

    let add_member = warp::path!("members")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_runner.clone())
        .and_then(|device: PairedDevice, runner: Runner| async move {
            Ok::<_, Infallible>(respond(pair(&runner, device).await))
        });

    let ignore = warp::path!("members" / String / "ignore")
        .and(warp::post())
        .and(with_runner.clone())
        .and_then(|id: String, runner: Runner| async move {
            Ok::<_, Infallible>(respond(runner.toggle_ignore(&id).await))
        });

    let highlight = warp::path!("members" / String / "highlight")
        .and(warp::post())
        .and(with_runner.clone())
        .and_then(|id: String, runner: Runner| async move {
            Ok::<_, Infallible>(respond(runner.set_highlight(&id).await))
        });

    let remove = warp::path!("members" / String)
        .and(warp::delete())
        .and(with_runner.clone())
        .and_then(|id: String, runner: Runner| async move {
            Ok::<_, Infallible>(respond(runner.remove_member(&id).await))
        });

    let focus = warp::path!("focus")
        .and(warp::post())
        .and(with_runner.clone())
        .and_then(|runner: Runner| async move {
            Ok::<_, Infallible>(respond(runner.force_focus().await))
        });

    let ping = warp::path!("ping")
        .and(warp::post())
        .and(with_runner.clone())
        .and_then(|runner: Runner| async move {
            Ok::<_, Infallible>(respond(runner.ping().await))
        });

    let pins = warp::path!("pins")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_runner.clone())
        .and_then(|request: PinRequest, runner: Runner| async move {
            Ok::<_, Infallible>(respond(runner.drop_pin(request.kind).await))
        });

    let test_alert = warp::path!("alerts" / "test")
        .and(warp::post())
        .and(with_runner.clone())
        .and_then(|runner: Runner| async move {
            Ok::<_, Infallible>(respond(runner.test_alert().await))
        });

    let location = warp::path!("location")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_runner)
        .and_then(|fix: LocationFix, runner: Runner| async move {
            Ok::<_, Infallible>(respond(runner.ingest_fix(fix).await))
        });

    snapshot
        .or(metrics)
        .or(scan)
        .or(record)
        .or(test_mode)
        .or(settings)
        .or(add_member)
        .or(ignore)
        .or(highlight)
        .or(remove)
        .or(focus)
        .or(ping)
        .or(pins)
        .or(test_alert)
        .or(location)
}

/// Hosts the HTTP bridge on the caller's runtime.
pub struct GuiBridge {
    runner: Runner,
}

impl GuiBridge {
    pub fn new(runner: Runner) -> Self {
        Self { runner }
    }

    pub fn spawn(&self, addr: SocketAddr) -> JoinHandle<()> {
        let routes = routes(self.runner.clone());
        self.publish_status(&format!("HTTP bridge listening on {}", addr));
        tokio::spawn(async move {
            warp::serve(routes).run(addr).await;
        })
    }

    pub fn publish_status(&self, message: &str) {
        log::info!("[GUI] {}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gui_bridge::model::VisualizationModel;
    use crate::workflow::config::WorkflowConfig;
    use crate::workflow::haptics::LogSink;
    use serde_json::Value;

    async fn seeded_runner() -> Runner {
        let runner = Runner::new(
            WorkflowConfig {
                simulated_members: 2,
                ..Default::default()
            },
            Box::new(LogSink),
        );
        runner.seed_roster(&[]).await;
        runner
    }

    fn body(response: &warp::http::Response<warp::hyper::body::Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[tokio::test]
    async fn snapshot_lists_seeded_members() {
        let runner = seeded_runner().await;
        let api = routes(runner.clone());
        let response = warp::test::request()
            .method("GET")
            .path("/snapshot")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let model: VisualizationModel = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(model.roster.members.len(), 2);
        assert_eq!(model.radar.len(), 2);
    }

    #[tokio::test]
    async fn errors_map_to_status_codes() {
        let runner = seeded_runner().await;
        let api = routes(runner.clone());

        let response = warp::test::request()
            .method("POST")
            .path("/ping")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body(&response)["status"], "skipped");

        let response = warp::test::request()
            .method("POST")
            .path("/settings")
            .json(&json!({ "safe_distance": 0 }))
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = warp::test::request()
            .method("POST")
            .path("/members")
            .json(&json!({ "id": "   " }))
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_alert_is_refused_outside_test_mode() {
        let runner = seeded_runner().await;
        let api = routes(runner.clone());
        runner.set_test_mode(false).await;

        let response = warp::test::request()
            .method("POST")
            .path("/alerts/test")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        runner.set_test_mode(true).await;
        let response = warp::test::request()
            .method("POST")
            .path("/alerts/test")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn settings_clamp_offset() {
        let runner = seeded_runner().await;
        let api = routes(runner.clone());
        let response = warp::test::request()
            .method("POST")
            .path("/settings")
            .json(&json!({ "safe_distance": 40, "calibration_offset": 25 }))
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let value = body(&response);
        assert_eq!(value["result"]["safe_distance"], 40);
        assert_eq!(value["result"]["calibration_offset"], 10);
    }

    #[tokio::test]
    async fn member_actions_round_trip() {
        let runner = seeded_runner().await;
        let api = routes(runner.clone());

        let response = warp::test::request()
            .method("POST")
            .path("/members")
            .json(&json!({ "id": "AA:BB:0007", "name": "Lead" }))
            .reply(&api)
            .await;
        assert_eq!(body(&response)["result"], true);

        let response = warp::test::request()
            .method("POST")
            .path("/members/AA:BB:0007/highlight")
            .reply(&api)
            .await;
        assert_eq!(body(&response)["result"], "AA:BB:0007");

        let response = warp::test::request()
            .method("POST")
            .path("/ping")
            .reply(&api)
            .await;
        assert_eq!(body(&response)["result"], "Ping sent to Lead's device.");

        let response = warp::test::request()
            .method("DELETE")
            .path("/members/AA:BB:0007")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(runner.snapshot().await.roster.highlighted.is_none());
    }

    #[tokio::test]
    async fn pins_need_a_fix() {
        let runner = seeded_runner().await;
        let api = routes(runner.clone());

        let response = warp::test::request()
            .method("POST")
            .path("/pins")
            .json(&json!({ "type": "water" }))
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = warp::test::request()
            .method("POST")
            .path("/location")
            .json(&json!({ "latitude": 46.5, "longitude": 7.9, "accuracy": 5.0 }))
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = warp::test::request()
            .method("POST")
            .path("/pins")
            .json(&json!({ "type": "water" }))
            .reply(&api)
            .await;
        assert_eq!(body(&response)["result"]["label"], "Water");
    }
}
