use anyhow::Context;
use clap::Parser;
use generator::devices::{validated_descriptors, MAX_SIMULATED_MEMBERS};
use generator::location::LocationWalk;
use gui_bridge::bridge::{gui_bind_address, GuiBridge};
use meshcore::TrackingError;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::haptics::LogSink;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Nomad mesh group-safety session driver")]
struct Args {
    /// Run a fixed number of scan ticks on a virtual clock and print a summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value_t = 30)]
    ticks: usize,
    /// Keep the session and HTTP bridge alive until Ctrl+C
    #[arg(long, default_value_t = false)]
    serve: bool,
    /// Simulated roster size
    #[arg(long, value_parser = clap::value_parser!(u64).range(..=MAX_SIMULATED_MEMBERS as u64))]
    members: Option<u64>,
    #[arg(long)]
    safe_distance: Option<u32>,
    #[arg(long, allow_hyphen_values = true)]
    calibration_offset: Option<i32>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    test_mode: Option<bool>,
}

impl Args {
    fn apply(&self, config: &mut WorkflowConfig) {
        if let Some(members) = self.members {
            config.simulated_members = members as usize;
        }
        if let Some(meters) = self.safe_distance {
            config.safe_distance = meters;
        }
        if let Some(offset) = self.calibration_offset {
            config.calibration_offset = offset;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(enabled) = self.test_mode {
            config.test_mode = enabled;
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = match &args.workflow {
        Some(path) => WorkflowConfig::load(path)?,
        None => WorkflowConfig::default(),
    };
    args.apply(&mut workflow_config);

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating session runtime")?;

    runtime.block_on(async move {
        let runner = Runner::new(workflow_config.clone(), Box::new(LogSink));
        let paired = validated_descriptors(&workflow_config.paired_devices);
        let linked = runner.seed_roster(&paired).await;
        let gui_bridge = GuiBridge::new(runner.clone());
        gui_bridge.publish_status(&format!("{} members linked", linked));

        let mut walk = LocationWalk::new(
            workflow_config.origin_latitude,
            workflow_config.origin_longitude,
            workflow_config.seed,
        );

        if args.offline {
            let result = runner
                .run_offline(args.ticks, &mut walk)
                .await
                .context("offline run")?;
            println!(
                "Offline run -> ticks {}, members {}, lost {}, low battery {}, alerts {}, breadcrumbs {}",
                result.ticks,
                result.summary.total,
                result.summary.lost,
                result.summary.low_battery,
                result.alerts.len(),
                result.breadcrumbs
            );
            gui_bridge.publish_status("Offline session results ready.");

            let report = format!(
                "ticks={} members={} tracked={} lost={} low_battery={} alerts={} breadcrumbs={} bounds={:?}\n",
                result.ticks,
                result.summary.total,
                result.summary.tracked,
                result.summary.lost,
                result.summary.low_battery,
                result.alerts.len(),
                result.breadcrumbs,
                result.bounds
            );
            let report_path = PathBuf::from("tools/data/offline_session.log");
            if let Some(parent) = report_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(report_path)?;
            file.write_all(report.as_bytes())?;
        }

        if args.serve {
            if let Err(err) = runner.start_location_feed(walk).await {
                gui_bridge.publish_status(&err.to_string());
            }
            let server = gui_bridge.spawn(gui_bind_address(workflow_config.bridge_port));

            if workflow_config.start_scanning {
                match runner.set_scanning(true).await {
                    Ok(_) => {}
                    Err(err @ TrackingError::UpstreamUnavailable(_)) => {
                        gui_bridge.publish_status(&err.to_string())
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            if workflow_config.start_recording {
                runner.set_recording(true).await;
            }

            gui_bridge.publish_status("Session running (Ctrl+C to stop)...");
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            runner.shutdown().await;
            server.abort();
            gui_bridge.publish_status("Session stopped.");
        }

        Ok::<(), anyhow::Error>(())
    })
}
