//! Data-driven game balance
//!
//! Every value defaults to the shipped game; a JSON document may override
//! any subset, e.g. `{"tackle": {"waves": 5}}`.

use serde::{Deserialize, Serialize};

/// One kind of shooting target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetKind {
    pub radius: f32,
    pub points: u32,
    pub color: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShootingTuning {
    pub shots: u32,
    pub min_targets: usize,
    pub max_targets: usize,
    /// Target `i` uses kind `min(i, len - 1)`
    pub target_kinds: Vec<TargetKind>,
    /// Free space between placed targets
    pub target_gap: f32,
    /// Targets keep this far inside the goal frame
    pub goal_padding: f32,
    pub ball_radius: f32,
    pub flight_steps: u32,
    pub spin: f32,
    /// Clicks this close to the bottom edge do not shoot
    pub dead_zone: f32,
    pub regenerate_delay_ms: f64,
    pub game_over_delay_ms: f64,
    pub halfway_cue_ms: f64,
    pub halfway_shots_left: u32,
}

impl Default for ShootingTuning {
    fn default() -> Self {
        Self {
            shots: 10,
            min_targets: 3,
            max_targets: 5,
            target_kinds: vec![
                TargetKind { radius: 28.0, points: 10, color: 0xf5c542 },
                TargetKind { radius: 22.0, points: 20, color: 0xe88a2a },
                TargetKind { radius: 16.0, points: 30, color: 0xe74c3c },
            ],
            target_gap: 4.0,
            goal_padding: 30.0,
            ball_radius: 12.0,
            flight_steps: 40,
            spin: 0.15,
            dead_zone: 80.0,
            regenerate_delay_ms: 500.0,
            game_over_delay_ms: 800.0,
            halfway_cue_ms: 12_000.0,
            halfway_shots_left: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DribbleTuning {
    /// Cone count for level 1, 2, 3, ...
    pub cones_per_level: Vec<usize>,
    pub cone_radius: f32,
    /// Minimum distance between cone centres
    pub cone_separation: f32,
    /// Cones stay further than this from the start and the goal centre
    pub clearance: f32,
    pub margin: f32,
    pub goal_size: f32,
    pub player_speed: f32,
    pub player_size: f32,
    /// Player centre stays this far from the edges
    pub edge_clamp: f32,
    pub penalty_secs: f64,
}

impl Default for DribbleTuning {
    fn default() -> Self {
        Self {
            cones_per_level: vec![8, 14, 22],
            cone_radius: 12.0,
            cone_separation: 36.0,
            clearance: 60.0,
            margin: 40.0,
            goal_size: 50.0,
            player_speed: 3.0,
            player_size: 18.0,
            edge_clamp: 25.0,
            penalty_secs: 2.0,
        }
    }
}

impl DribbleTuning {
    pub fn levels(&self) -> u32 {
        self.cones_per_level.len() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepieUpsTuning {
    pub gravity: f32,
    pub kick: f32,
    pub start_vy: f32,
    /// Taps count within this many ball radii
    pub reach_radii: f32,
    /// Sideways velocity per pixel of off-centre tap
    pub nudge: f32,
    pub ramp_every: u32,
    pub gravity_ramp: f32,
    pub kick_ramp: f32,
    /// Kick never gets weaker than this
    pub weakest_kick: f32,
    pub wall_restitution: f32,
    pub ceiling_restitution: f32,
    pub horizontal_drag: f32,
    /// Ball radius as a fraction of the shorter side
    pub ball_scale: f32,
    /// Ground line distance from the bottom edge
    pub ground_offset: f32,
}

impl Default for KeepieUpsTuning {
    fn default() -> Self {
        Self {
            gravity: 0.25,
            kick: -8.0,
            start_vy: -3.0,
            reach_radii: 3.0,
            nudge: 0.1,
            ramp_every: 5,
            gravity_ramp: 0.02,
            kick_ramp: 0.2,
            weakest_kick: -6.0,
            wall_restitution: 0.7,
            ceiling_restitution: 0.5,
            horizontal_drag: 0.99,
            ball_scale: 0.05,
            ground_offset: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalkeeperTuning {
    pub shots: u32,
    pub aim_rate: f32,
    /// Direction hint visible while aim progress is below this
    pub hint_until: f32,
    pub shot_rate: f32,
    /// Keeper dive progress relative to the ball
    pub dive_speed: f32,
    /// Dive distance as a fraction of the goal width
    pub dive_reach: f32,
    pub result_ticks: u32,
}

impl Default for GoalkeeperTuning {
    fn default() -> Self {
        Self {
            shots: 10,
            aim_rate: 0.008,
            hint_until: 0.5,
            shot_rate: 0.04,
            dive_speed: 1.2,
            dive_reach: 0.35,
            result_ticks: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TackleTuning {
    pub waves: u32,
    pub base_speed: f32,
    pub speed_per_wave: f32,
    /// Opponent stops at this fraction of the width
    pub stop_at: f32,
    pub base_zone: f32,
    pub zone_shrink: f32,
    pub min_zone: f32,
    pub base_marker_speed: f32,
    pub marker_speed_per_wave: f32,
    pub zone_min_start: f32,
    pub zone_span: f32,
    pub result_ticks: u32,
    pub lunge_rate: f32,
    pub runaway_speed: f32,
    /// Beaten defender watches the opponent run while the timer is above this
    pub runaway_until: u32,
}

impl Default for TackleTuning {
    fn default() -> Self {
        Self {
            waves: 10,
            base_speed: 2.0,
            speed_per_wave: 0.15,
            stop_at: 0.42,
            base_zone: 0.3,
            zone_shrink: 0.02,
            min_zone: 0.12,
            base_marker_speed: 0.015,
            marker_speed_per_wave: 0.002,
            zone_min_start: 0.15,
            zone_span: 0.7,
            result_ticks: 70,
            lunge_rate: 0.04,
            runaway_speed: 2.0,
            runaway_until: 20,
        }
    }
}

impl TackleTuning {
    /// Zone width and marker speed for `wave`
    pub fn difficulty(&self, wave: u32) -> (f32, f32) {
        let wave = wave as f32;
        let zone = (self.base_zone - wave * self.zone_shrink).max(self.min_zone);
        let speed = self.base_marker_speed + wave * self.marker_speed_per_wave;
        (zone, speed)
    }

    pub fn approach_speed(&self, wave: u32) -> f32 {
        self.base_speed + wave as f32 * self.speed_per_wave
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationTuning {
    /// Players to place in each round; the run length is its length
    pub round_sizes: Vec<usize>,
    pub per_correct: u32,
    pub bonus_per_slot: u32,
    pub base_time_ms: f64,
    pub per_player_ms: f64,
    pub per_round_ms: f64,
    pub min_time_ms: f64,
    pub feedback_ms: f64,
    pub snap_radius: f32,
    pub pick_radius: f32,
    /// Bench row distance from the bottom edge
    pub bench_offset: f32,
    pub bench_spacing: f32,
}

impl Default for FormationTuning {
    fn default() -> Self {
        Self {
            round_sizes: vec![3, 3, 4, 4, 5, 5, 6, 7],
            per_correct: 10,
            bonus_per_slot: 5,
            base_time_ms: 12_000.0,
            per_player_ms: 1_500.0,
            per_round_ms: 500.0,
            min_time_ms: 8_000.0,
            feedback_ms: 1_500.0,
            snap_radius: 45.0,
            pick_radius: 30.0,
            bench_offset: 35.0,
            bench_spacing: 65.0,
        }
    }
}

impl FormationTuning {
    /// Placing time for a round of `players` at `round` (0-based)
    pub fn placing_time_ms(&self, players: usize, round: u32) -> f64 {
        let t = self.base_time_ms + players as f64 * self.per_player_ms - round as f64 * self.per_round_ms;
        t.max(self.min_time_ms)
    }
}

/// Balance for all six games
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub shooting: ShootingTuning,
    pub dribble: DribbleTuning,
    pub keepie_ups: KeepieUpsTuning,
    pub goalkeeper: GoalkeeperTuning,
    pub tackle: TackleTuning,
    pub formation: FormationTuning,
}

impl Tuning {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
