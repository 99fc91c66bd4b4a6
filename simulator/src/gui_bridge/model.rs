use meshcore::device_interface::{ConnectivityStatus, Member};
use meshcore::math::{radar_position, ProjectedPoint};
use meshcore::processing::{AlertIntent, RosterSnapshot, TrailSnapshot};
use meshcore::telemetry::MetricsSnapshot;
use meshcore::MemberStatus;
use serde::{Deserialize, Serialize};

/// Member blip on the radar canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarBlip {
    pub member_id: String,
    pub status: MemberStatus,
    pub highlighted: bool,
    pub point: ProjectedPoint,
}

/// Everything the presentation layer renders, published after each change.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VisualizationModel {
    pub connectivity: ConnectivityStatus,
    pub connectivity_label: String,
    pub test_mode: bool,
    pub roster: RosterSnapshot,
    pub radar: Vec<RadarBlip>,
    pub trail: TrailSnapshot,
    pub recent_alerts: Vec<AlertIntent>,
    pub metrics: MetricsSnapshot,
}

/// Places tracked members around the radar, slotted in roster store order.
pub fn radar_blips(members: &[Member], highlighted: Option<&str>, safe_distance: u32) -> Vec<RadarBlip> {
    let tracked: Vec<&Member> = members.iter().filter(|m| m.is_tracked()).collect();
    let count = tracked.len();
    tracked
        .into_iter()
        .enumerate()
        .map(|(index, member)| RadarBlip {
            member_id: member.id.clone(),
            status: member.status,
            highlighted: Some(member.id.as_str()) == highlighted,
            point: radar_position(index, count, member.distance, safe_distance),
        })
        .collect()
}
