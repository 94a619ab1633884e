/// The player controller: one hopper crossing the lanes.
///
/// ## Lifecycle
///
///   Idle ──begin──▶ Active ──die──▶ Respawning ──delay──▶ Active
///                     │                 (lives left)
///                     ├──die (no lives)──▶ GameOver
///                     └──top row─────────▶ Victory
///
/// `active` is the only cancellation signal. An in-flight hop checks it
/// before every sub-step and quietly stops when it is false.
///
/// ## Tick order
///
///   1. Time limit countdown
///   2. Movement command
///   3. Carrier drift + offscreen check
///   4. Tasks started on earlier ticks (hop sub-steps, respawn delay)

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info};

use crate::config::PlayerConfig;

use super::event::PlayerEvent;
use super::lane::{RowClassifier, RowKind};
use super::motion::{MoveTween, RespawnTimer};
use super::rules::{self, Cue, DeathType, MoveDir};
use super::vehicle::{VehicleId, VehicleKind};

/// Everything the controller needs to know about the board around it.
pub trait Field: RowClassifier {
    /// Index of the finish row.
    fn total_rows(&self) -> i32;
    fn world_width(&self) -> f32;
    /// Velocity of a carrier along x, or `None` once it is gone.
    fn carrier_velocity(&self, id: VehicleId) -> Option<f32>;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Victory,
    GameOver,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LifeState {
    Idle,
    Active,
    Respawning,
    GameOver,
    Victory,
}

pub struct Player {
    pub x: f32,
    pub y: f32,
    pub facing: MoveDir,
    pub lives_remaining: i32,
    pub score: u32,
    pub highest_row: f32,
    pub time_remaining: f32,
    pub active: bool,
    pub carrier: Option<VehicleId>,
    pub invincible: bool,
    pub outcome: Option<Outcome>,
    tween: Option<MoveTween>,
    respawn: Option<RespawnTimer>,
    cfg: PlayerConfig,
    rng: StdRng,
}

impl Player {
    /// A fresh, inactive player at the origin. Call `begin` to start play.
    pub fn new(cfg: PlayerConfig, rng: StdRng) -> Self {
        let mut player = Player {
            x: 0.0,
            y: 0.0,
            facing: MoveDir::Up,
            lives_remaining: cfg.total_lives,
            score: 0,
            highest_row: 0.0,
            time_remaining: cfg.time_limit,
            active: false,
            carrier: None,
            invincible: cfg.invincible,
            outcome: None,
            tween: None,
            respawn: None,
            cfg,
            rng,
        };
        player.reset(&mut Vec::new());
        player.active = false;
        player
    }

    pub fn total_lives(&self) -> i32 {
        self.cfg.total_lives
    }

    /// Reinitialize score, time, position and lives for a new run.
    /// Leaves `active` alone.
    pub fn reset(&mut self, events: &mut Vec<PlayerEvent>) {
        self.score = 0;
        self.time_remaining = self.cfg.time_limit;
        self.x = 0.0;
        self.y = 0.0;
        self.facing = MoveDir::Up;
        self.highest_row = 0.0;
        self.lives_remaining = self.cfg.total_lives;
        self.carrier = None;
        self.outcome = None;
        self.tween = None;
        self.respawn = None;

        events.push(PlayerEvent::ScoreChanged(0));
        for index in 0..self.cfg.total_lives.max(0) as usize {
            events.push(PlayerEvent::LifeIcon { index, on: true });
        }
        events.push(PlayerEvent::TimeBar(1.0));
    }

    /// Hand control to the player. No-op once the run has ended.
    pub fn begin(&mut self) {
        if self.outcome.is_none() && self.respawn.is_none() {
            self.active = true;
        }
    }

    pub fn state(&self) -> LifeState {
        match self.outcome {
            Some(Outcome::Victory) => LifeState::Victory,
            Some(Outcome::GameOver) => LifeState::GameOver,
            None if self.respawn.is_some() => LifeState::Respawning,
            None if self.active => LifeState::Active,
            None => LifeState::Idle,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.tween.is_some()
    }

    /// Remaining time as a fraction of the limit, clamped to 0..=1.
    pub fn time_ratio(&self) -> f32 {
        if self.cfg.time_limit <= 0.0 { return 0.0; }
        (self.time_remaining / self.cfg.time_limit).clamp(0.0, 1.0)
    }

    // ══════════════════════════════════════════════════════════
    // Per-tick update
    // ══════════════════════════════════════════════════════════

    pub fn tick(
        &mut self,
        dt: f32,
        input: Option<MoveDir>,
        field: &impl Field,
        events: &mut Vec<PlayerEvent>,
    ) {
        // Tasks created during this tick wait for the next one.
        let hop_pending = self.tween.is_some();
        let respawn_pending = self.respawn.is_some();

        if self.active {
            self.update_time(dt, events);

            // a timeout above already cleared `active`
            if let Some(dir) = input {
                if self.active {
                    self.start_move(dir, field, events);
                }
            }

            if self.active {
                self.follow_carrier(dt, field, events);
            }
        }

        if hop_pending {
            self.advance_move(dt, field, events);
        }
        if respawn_pending {
            self.advance_respawn(dt, events);
        }
    }

    fn update_time(&mut self, dt: f32, events: &mut Vec<PlayerEvent>) {
        self.time_remaining -= dt;
        events.push(PlayerEvent::TimeBar(self.time_ratio()));

        if self.time_remaining <= 0.0 {
            self.die(DeathType::Time, events);
        }
    }

    // ══════════════════════════════════════════════════════════
    // Movement
    // ══════════════════════════════════════════════════════════

    fn start_move(&mut self, dir: MoveDir, field: &impl Field, events: &mut Vec<PlayerEvent>) {
        // One hop at a time; extra presses mid-hop are dropped.
        if self.tween.is_some() { return; }
        if !rules::move_allowed(self.y, dir) { return; }

        let (_, dy) = dir.delta();
        if dir.is_vertical() {
            events.push(PlayerEvent::RowAdvance {
                row: rules::landing_row(self.y + dy as f32),
                dir: dy,
            });
        } else {
            self.check_offscreen(field, events);
            if !self.active { return; }
        }

        self.facing = dir;
        events.push(PlayerEvent::Cue(Cue::Hop));
        self.tween = Some(MoveTween::new(
            dir,
            self.y,
            self.cfg.move_duration,
            self.cfg.move_substeps,
        ));
    }

    fn advance_move(&mut self, dt: f32, field: &impl Field, events: &mut Vec<PlayerEvent>) {
        let mut tween = match self.tween.take() {
            Some(t) => t,
            None => return,
        };

        for _ in 0..tween.advance(dt) {
            if !self.active {
                debug!(x = self.x, y = self.y, "hop cut short");
                return;
            }
            let (ox, oy) = tween.step_offset();
            self.x += ox;
            self.y += oy;
            if tween.consume_step() {
                self.y = tween.target_y;
            }
        }

        if !tween.is_done() {
            self.tween = Some(tween);
            return;
        }
        if self.active {
            self.land(field, events);
        }
    }

    /// Checks that run once a hop completes.
    fn land(&mut self, field: &impl Field, events: &mut Vec<PlayerEvent>) {
        let kind = row_kind(field, rules::landing_row(self.y));
        if let Some(death) = rules::drowning(kind, self.carrier.is_some()) {
            self.die(death, events);
        }
        if self.active {
            self.check_offscreen(field, events);
        }
        if self.active {
            self.check_for_end(field, events);
        }

        // A fatal hop has already sent the player back to the origin.
        if self.y > self.highest_row {
            let bonus = self.rng.gen_range(0..rules::ROW_BONUS_MAX);
            let points = rules::climb_points(self.highest_row, self.y, self.cfg.points_per_step);
            self.score = self.score.saturating_add(points).saturating_add(bonus);
            self.highest_row = self.y;
            events.push(PlayerEvent::ScoreChanged(self.score));
        }
    }

    fn check_offscreen(&mut self, field: &impl Field, events: &mut Vec<PlayerEvent>) {
        if rules::is_offscreen(self.x, field.world_width()) {
            let kind = row_kind(field, rules::occupied_row(self.y));
            self.die(rules::offscreen_death(kind), events);
        }
    }

    fn check_for_end(&mut self, field: &impl Field, events: &mut Vec<PlayerEvent>) {
        let total_rows = field.total_rows();
        if self.y < total_rows as f32 { return; }

        let bonus = rules::victory_bonus(self.lives_remaining, self.cfg.points_per_step, total_rows);
        self.score = self.score.saturating_add(bonus);
        self.active = false;
        self.outcome = Some(Outcome::Victory);
        info!(score = self.score, bonus, "reached the far side");
        events.push(PlayerEvent::ScoreChanged(self.score));
        events.push(PlayerEvent::Victory { bonus });
    }

    // ══════════════════════════════════════════════════════════
    // Carriers
    // ══════════════════════════════════════════════════════════

    /// The player's footprint started touching a vehicle.
    pub fn on_carrier_enter(&mut self, id: VehicleId, kind: VehicleKind, events: &mut Vec<PlayerEvent>) {
        match kind {
            VehicleKind::Log => self.carrier = Some(id),
            VehicleKind::PredatorHead => self.die(DeathType::Chomp, events),
            VehicleKind::Car => {} // cars are the host's business
        }
    }

    /// The player's footprint stopped touching a vehicle.
    pub fn on_carrier_exit(&mut self, id: VehicleId) {
        if self.carrier == Some(id) {
            self.carrier = None;
        }
    }

    fn follow_carrier(&mut self, dt: f32, field: &impl Field, events: &mut Vec<PlayerEvent>) {
        let id = match self.carrier {
            Some(id) => id,
            None => return,
        };
        match field.carrier_velocity(id) {
            Some(velocity) => {
                self.x += velocity * dt;
                self.check_offscreen(field, events);
            }
            None => self.carrier = None,
        }
    }

    // ══════════════════════════════════════════════════════════
    // Death / respawn
    // ══════════════════════════════════════════════════════════

    /// Lose a life. No-op when invincible or once the run is won.
    pub fn die(&mut self, death: DeathType, events: &mut Vec<PlayerEvent>) {
        if self.invincible { return; }
        if self.outcome == Some(Outcome::Victory) { return; }

        self.active = false;
        if self.lives_remaining >= 0 {
            self.lives_remaining -= 1;
        }
        debug!(?death, lives = self.lives_remaining, "player died");
        events.push(PlayerEvent::Died(death));
        events.push(PlayerEvent::Cue(rules::death_cue(death)));

        if self.lives_remaining >= 0 {
            self.start_respawn(events);
            events.push(PlayerEvent::LifeIcon {
                index: self.lives_remaining as usize,
                on: false,
            });
        } else {
            self.outcome = Some(Outcome::GameOver);
            self.respawn = None;
            info!(score = self.score, "out of lives");
            events.push(PlayerEvent::GameOver);
        }
    }

    fn start_respawn(&mut self, events: &mut Vec<PlayerEvent>) {
        self.time_remaining = self.cfg.time_limit;
        self.x = 0.0;
        self.y = 0.0;
        self.carrier = None;
        self.respawn = Some(RespawnTimer::new(self.cfg.respawn_delay));
        events.push(PlayerEvent::TimeBar(1.0));
    }

    fn advance_respawn(&mut self, dt: f32, events: &mut Vec<PlayerEvent>) {
        let done = match self.respawn.as_mut() {
            Some(timer) => timer.tick(dt),
            None => return,
        };
        if !done { return; }

        self.respawn = None;
        self.time_remaining = self.cfg.time_limit;
        self.x = 0.0;
        self.y = 0.0;
        self.highest_row = 0.0;
        self.active = true;
        debug!(lives = self.lives_remaining, "respawned");
        events.push(PlayerEvent::Respawned);
    }
}

/// Terrain of `row`. Every row the player can reach must be classified.
fn row_kind(field: &impl Field, row: i32) -> RowKind {
    match field.kind_of(row) {
        Some(kind) => kind,
        None => panic!("row {row} has no classification"),
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::SeedableRng;

    use super::*;
    use crate::domain::lane::LaneMap;

    const DT: f32 = 1.0 / 64.0;

    struct TestField {
        lanes: LaneMap,
        width: f32,
        carriers: HashMap<VehicleId, f32>,
    }

    impl RowClassifier for TestField {
        fn kind_of(&self, row: i32) -> Option<RowKind> {
            self.lanes.kind_of(row)
        }
    }

    impl Field for TestField {
        fn total_rows(&self) -> i32 { self.lanes.total_rows() }
        fn world_width(&self) -> f32 { self.width }
        fn carrier_velocity(&self, id: VehicleId) -> Option<f32> {
            self.carriers.get(&id).copied()
        }
    }

    /// Build a field from a lane string ('S','R','W','F', bottom row first).
    fn field(lanes: &str) -> TestField {
        TestField {
            lanes: LaneMap::parse(lanes).unwrap(),
            width: 15.0,
            carriers: HashMap::new(),
        }
    }

    fn cfg() -> PlayerConfig {
        PlayerConfig::default()
    }

    fn active_player(cfg: PlayerConfig) -> Player {
        let mut p = Player::new(cfg, StdRng::seed_from_u64(7));
        p.begin();
        p
    }

    /// Tick with no input for roughly `secs` seconds.
    fn run(p: &mut Player, f: &TestField, secs: f32, events: &mut Vec<PlayerEvent>) {
        let ticks = (secs / DT).ceil() as usize;
        for _ in 0..ticks {
            p.tick(DT, None, f, events);
        }
    }

    fn hop(p: &mut Player, f: &TestField, dir: MoveDir, events: &mut Vec<PlayerEvent>) {
        p.tick(DT, Some(dir), f, events);
        run(p, f, 0.15, events);
    }

    fn deaths(events: &[PlayerEvent]) -> Vec<DeathType> {
        events.iter().filter_map(|e| match e {
            PlayerEvent::Died(d) => Some(*d),
            _ => None,
        }).collect()
    }

    fn count(events: &[PlayerEvent], want: &PlayerEvent) -> usize {
        events.iter().filter(|e| *e == want).count()
    }

    // ── Lifecycle ──

    #[test]
    fn new_player_waits_for_begin() {
        let mut p = Player::new(cfg(), StdRng::seed_from_u64(1));
        assert_eq!(p.state(), LifeState::Idle);
        let f = field("SSSF");
        let mut ev = vec![];
        hop(&mut p, &f, MoveDir::Up, &mut ev);
        assert_eq!(p.y, 0.0);
        assert_eq!(p.time_remaining, 20.0);
        p.begin();
        assert_eq!(p.state(), LifeState::Active);
    }

    #[test]
    fn reset_restores_a_fresh_run() {
        let f = field("SSSF");
        let mut p = active_player(cfg());
        let mut ev = vec![];
        hop(&mut p, &f, MoveDir::Up, &mut ev);
        p.die(DeathType::Collision, &mut ev);
        assert!(p.score > 0);

        ev.clear();
        p.reset(&mut ev);
        assert_eq!(p.score, 0);
        assert_eq!(p.lives_remaining, 5);
        assert_eq!(p.time_remaining, 20.0);
        assert_eq!((p.x, p.y), (0.0, 0.0));
        assert_eq!(p.highest_row, 0.0);
        assert!(p.outcome.is_none());
        assert_eq!(ev[0], PlayerEvent::ScoreChanged(0));
        assert_eq!(count(&ev, &PlayerEvent::LifeIcon { index: 4, on: true }), 1);
        assert_eq!(ev.len(), 1 + 5 + 1);
    }

    // ── Movement ──

    #[test]
    fn hop_takes_a_tenth_of_a_second() {
        let f = field("SSSF");
        let mut p = active_player(cfg());
        let mut ev = vec![];
        p.tick(DT, Some(MoveDir::Up), &f, &mut ev);
        assert!(p.is_moving());
        assert_eq!(p.y, 0.0);

        run(&mut p, &f, 0.05, &mut ev);
        assert!(p.y > 0.0 && p.y < 1.0);

        run(&mut p, &f, 0.1, &mut ev);
        assert!(!p.is_moving());
        assert_eq!(p.y, 1.0);
        assert_eq!(p.facing, MoveDir::Up);
    }

    #[test]
    fn vertical_hop_reports_row_advance_first() {
        let f = field("SSSF");
        let mut p = active_player(cfg());
        let mut ev = vec![];
        p.tick(DT, Some(MoveDir::Up), &f, &mut ev);
        assert!(ev.contains(&PlayerEvent::RowAdvance { row: 1, dir: 1 }));
        assert!(ev.contains(&PlayerEvent::Cue(Cue::Hop)));
    }

    #[test]
    fn horizontal_hop_has_no_row_advance() {
        let f = field("SSSF");
        let mut p = active_player(cfg());
        let mut ev = vec![];
        hop(&mut p, &f, MoveDir::Left, &mut ev);
        assert!(!ev.iter().any(|e| matches!(e, PlayerEvent::RowAdvance { .. })));
        assert!((p.x + 1.0).abs() < 1e-4);
        assert_eq!(p.facing, MoveDir::Left);
    }

    #[test]
    fn down_from_start_row_is_refused() {
        let f = field("SSSF");
        let mut p = active_player(cfg());
        let mut ev = vec![];
        p.tick(DT, Some(MoveDir::Down), &f, &mut ev);
        assert!(!p.is_moving());
        assert!(!ev.iter().any(|e| matches!(e, PlayerEvent::RowAdvance { .. } | PlayerEvent::Cue(Cue::Hop))));
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn down_allowed_above_start_row() {
        let f = field("SSSF");
        let mut p = active_player(cfg());
        let mut ev = vec![];
        hop(&mut p, &f, MoveDir::Up, &mut ev);
        hop(&mut p, &f, MoveDir::Down, &mut ev);
        assert_eq!(p.y, 0.0);
        assert!(ev.contains(&PlayerEvent::RowAdvance { row: 0, dir: -1 }));
    }

    #[test]
    fn second_command_mid_hop_is_ignored() {
        let f = field("SSSSF");
        let mut p = active_player(cfg());
        let mut ev = vec![];
        p.tick(DT, Some(MoveDir::Up), &f, &mut ev);
        p.tick(DT, Some(MoveDir::Up), &f, &mut ev);
        p.tick(DT, Some(MoveDir::Up), &f, &mut ev);
        run(&mut p, &f, 0.2, &mut ev);
        assert_eq!(p.y, 1.0);
        assert_eq!(count(&ev, &PlayerEvent::Cue(Cue::Hop)), 1);
    }

    #[test]
    fn death_mid_hop_leaves_position_partial() {
        let f = field("SSSF");
        let mut c = cfg();
        c.total_lives = 0;
        let mut p = active_player(c);
        let mut ev = vec![];
        p.tick(DT, Some(MoveDir::Up), &f, &mut ev);
        run(&mut p, &f, 0.05, &mut ev);
        let partial = p.y;
        assert!(partial > 0.0 && partial < 1.0);

        p.die(DeathType::Collision, &mut ev);
        assert_eq!(p.state(), LifeState::GameOver);
        run(&mut p, &f, 0.5, &mut ev);
        assert_eq!(p.y, partial);
        assert!(!p.is_moving());
    }

    // ── Scoring ──

    #[test]
    fn first_hop_onto_safe_row_scores() {
        // Scenario 1
        let f = field("SSSF");
        let mut p = active_player(cfg());
        let mut ev = vec![];
        hop(&mut p, &f, MoveDir::Up, &mut ev);
        assert_eq!(p.highest_row, 1.0);
        assert!(p.score >= 100 && p.score < 125, "score {}", p.score);
        assert!(ev.contains(&PlayerEvent::ScoreChanged(p.score)));
    }

    #[test]
    fn revisiting_rows_scores_nothing() {
        let f = field("SSSSF");
        let mut p = active_player(cfg());
        let mut ev = vec![];
        hop(&mut p, &f, MoveDir::Up, &mut ev);
        let after_first = p.score;
        hop(&mut p, &f, MoveDir::Down, &mut ev);
        hop(&mut p, &f, MoveDir::Up, &mut ev);
        assert_eq!(p.score, after_first);
        hop(&mut p, &f, MoveDir::Up, &mut ev);
        assert!(p.score >= after_first + 100);
    }

    #[test]
    fn score_never_drops_without_reset() {
        let f = field("SSWSSF");
        let mut p = active_player(cfg());
        let mut ev = vec![];
        let mut last = 0;
        let moves = [
            MoveDir::Up, MoveDir::Left, MoveDir::Up, MoveDir::Down,
            MoveDir::Up, MoveDir::Right, MoveDir::Up, MoveDir::Up,
        ];
        for dir in moves {
            hop(&mut p, &f, dir, &mut ev);
            run(&mut p, &f, 0.6, &mut ev);
            assert!(p.score >= last);
            last = p.score;
        }
    }

    // ── Collisions ──

    #[test]
    fn water_without_carrier_drowns_once() {
        // Scenario 2
        let f = field("SWSF");
        let mut p = active_player(cfg());
        let mut ev = vec![];
        hop(&mut p, &f, MoveDir::Up, &mut ev);
        assert_eq!(deaths(&ev), vec![DeathType::Drowning]);
        assert!(ev.contains(&PlayerEvent::Cue(Cue::DeathDrowning)));
        assert_eq!(p.lives_remaining, 4);
        assert!(!p.active);
        assert_eq!(p.state(), LifeState::Respawning);
        assert!(ev.contains(&PlayerEvent::LifeIcon { index: 4, on: false }));

        run(&mut p, &f, 0.3, &mut ev);
        assert!(!p.active);
        assert_eq!(deaths(&ev).len(), 1);
    }

    #[test]
    fn water_with_carrier_is_safe() {
        let mut f = field("SWSF");
        f.carriers.insert(VehicleId(3), 0.0);
        let mut p = active_player(cfg());
        let mut ev = vec![];
        p.on_carrier_enter(VehicleId(3), VehicleKind::Log, &mut ev);
        hop(&mut p, &f, MoveDir::Up, &mut ev);
        assert!(deaths(&ev).is_empty());
        assert_eq!(p.y, 1.0);
    }

    #[test]
    fn carrier_pushes_player_off_water_edge() {
        // Scenario 5, water
        let mut f = field("SWSF");
        f.carriers.insert(VehicleId(1), 10.0);
        let mut p = active_player(cfg());
        p.y = 1.0;
        let mut ev = vec![];
        p.on_carrier_enter(VehicleId(1), VehicleKind::Log, &mut ev);
        run(&mut p, &f, 0.7, &mut ev);
        assert_eq!(deaths(&ev), vec![DeathType::Drowning]);
    }

    #[test]
    fn carrier_pushes_player_off_road_edge() {
        // Scenario 5, road
        let mut f = field("SRSF");
        f.carriers.insert(VehicleId(1), -10.0);
        let mut p = active_player(cfg());
        p.y = 1.0;
        let mut ev = vec![];
        p.on_carrier_enter(VehicleId(1), VehicleKind::Log, &mut ev);
        run(&mut p, &f, 0.7, &mut ev);
        assert_eq!(deaths(&ev), vec![DeathType::Collision]);
        assert!(ev.contains(&PlayerEvent::Cue(Cue::DeathCollision)));
    }

    #[test]
    fn carrier_drift_moves_player() {
        let mut f = field("SWSF");
        f.carriers.insert(VehicleId(1), 2.0);
        let mut p = active_player(cfg());
        p.y = 1.0;
        let mut ev = vec![];
        p.on_carrier_enter(VehicleId(1), VehicleKind::Log, &mut ev);
        run(&mut p, &f, 1.0, &mut ev);
        assert!((p.x - 2.0).abs() < 0.05, "x = {}", p.x);
        assert!(deaths(&ev).is_empty());
    }

    #[test]
    fn walking_off_a_safe_row_is_a_collision() {
        let mut f = field("SSSF");
        f.width = 5.0; // limit 1.5
        let mut p = active_player(cfg());
        let mut ev = vec![];
        hop(&mut p, &f, MoveDir::Right, &mut ev);
        assert!(deaths(&ev).is_empty());
        hop(&mut p, &f, MoveDir::Right, &mut ev);
        assert_eq!(deaths(&ev), vec![DeathType::Collision]);
    }

    #[test]
    fn sideways_command_checks_the_edge_before_hopping() {
        let mut f = field("SSSF");
        f.width = 5.0; // limit 1.5
        for dir in [MoveDir::Left, MoveDir::Right] {
            let mut p = active_player(cfg());
            p.x = 2.0;
            let mut ev = vec![];
            p.tick(DT, Some(dir), &f, &mut ev);
            assert_eq!(deaths(&ev), vec![DeathType::Collision]);
            assert!(!ev.contains(&PlayerEvent::Cue(Cue::Hop)));
            assert!(!p.is_moving());
            assert_eq!(p.x, 0.0);
        }
    }

    #[test]
    fn predator_head_always_bites() {
        let mut p = active_player(cfg());
        let mut ev = vec![];
        p.on_carrier_enter(VehicleId(9), VehicleKind::PredatorHead, &mut ev);
        assert_eq!(deaths(&ev), vec![DeathType::Chomp]);
        assert!(ev.contains(&PlayerEvent::Cue(Cue::Chomp)));
        assert!(p.carrier.is_none());
    }

    #[test]
    fn exit_only_detaches_current_carrier() {
        let mut p = active_player(cfg());
        let mut ev = vec![];
        p.on_carrier_enter(VehicleId(1), VehicleKind::Log, &mut ev);
        p.on_carrier_exit(VehicleId(2));
        assert_eq!(p.carrier, Some(VehicleId(1)));
        p.on_carrier_exit(VehicleId(1));
        assert_eq!(p.carrier, None);
    }

    #[test]
    fn vanished_carrier_is_dropped() {
        let f = field("SWSF");
        let mut p = active_player(cfg());
        let mut ev = vec![];
        p.on_carrier_enter(VehicleId(5), VehicleKind::Log, &mut ev);
        p.tick(DT, None, &f, &mut ev);
        assert_eq!(p.carrier, None);
    }

    #[test]
    fn cars_are_ignored_by_the_controller() {
        let mut p = active_player(cfg());
        let mut ev = vec![];
        p.on_carrier_enter(VehicleId(1), VehicleKind::Car, &mut ev);
        assert!(ev.is_empty());
        assert!(p.carrier.is_none());
        assert!(p.active);
    }

    #[test]
    #[should_panic(expected = "no classification")]
    fn unclassified_row_is_fatal() {
        let mut f = field("SS");
        f.width = 5.0;
        let mut p = active_player(cfg());
        p.y = 7.0;
        p.x = 3.0;
        let mut ev = vec![];
        p.tick(DT, Some(MoveDir::Left), &f, &mut ev);
    }

    // ── Timer ──

    #[test]
    fn timer_counts_down_only_while_active() {
        let f = field("SSSF");
        let mut p = Player::new(cfg(), StdRng::seed_from_u64(1));
        let mut ev = vec![];
        run(&mut p, &f, 1.0, &mut ev);
        assert_eq!(p.time_remaining, 20.0);
        p.begin();
        p.tick(0.5, None, &f, &mut ev);
        assert!((p.time_remaining - 19.5).abs() < 1e-5);
        assert!(ev.contains(&PlayerEvent::TimeBar(19.5 / 20.0)));
    }

    #[test]
    fn timeout_at_exactly_zero_kills() {
        // Scenario 3
        let f = field("SSSF");
        let mut p = active_player(cfg());
        p.time_remaining = 0.25;
        let mut ev = vec![];
        p.tick(0.25, None, &f, &mut ev);
        assert_eq!(deaths(&ev), vec![DeathType::Time]);
        assert!(ev.contains(&PlayerEvent::Cue(Cue::DeathCollision)));
    }

    #[test]
    fn timeout_overshoot_fires_once() {
        let f = field("SSSF");
        let mut c = cfg();
        c.time_limit = 1.0;
        let mut p = active_player(c);
        let mut ev = vec![];
        p.tick(0.6, None, &f, &mut ev);
        p.tick(0.6, None, &f, &mut ev);
        p.tick(0.1, None, &f, &mut ev);
        assert_eq!(deaths(&ev), vec![DeathType::Time]);
        assert_eq!(p.lives_remaining, 4);
    }

    #[test]
    fn timeout_preempts_same_tick_move() {
        let f = field("SSSF");
        let mut p = active_player(cfg());
        p.time_remaining = 0.01;
        let mut ev = vec![];
        p.tick(DT, Some(MoveDir::Up), &f, &mut ev);
        assert!(!p.is_moving());
        assert!(!ev.iter().any(|e| matches!(e, PlayerEvent::RowAdvance { .. })));
    }

    // ── Death / respawn ──

    #[test]
    fn invincible_player_ignores_death() {
        let f = field("SSSF");
        let mut c = cfg();
        c.invincible = true;
        let mut p = active_player(c);
        let mut ev = vec![];
        hop(&mut p, &f, MoveDir::Up, &mut ev);
        let before = (p.x, p.y);
        for death in [
            DeathType::Collision, DeathType::Drowning, DeathType::Offscreen,
            DeathType::Chomp, DeathType::Time,
        ] {
            p.die(death, &mut ev);
            assert!(p.active);
            assert_eq!(p.lives_remaining, 5);
            assert_eq!((p.x, p.y), before);
        }
        assert!(deaths(&ev).is_empty());
    }

    #[test]
    fn lives_floor_at_minus_one() {
        let mut c = cfg();
        c.total_lives = 2;
        let mut p = active_player(c);
        let mut ev = vec![];
        p.die(DeathType::Collision, &mut ev);
        assert_eq!(p.lives_remaining, 1);
        p.die(DeathType::Collision, &mut ev);
        assert_eq!(p.lives_remaining, 0);
        assert_eq!(count(&ev, &PlayerEvent::GameOver), 0);

        p.die(DeathType::Collision, &mut ev);
        assert_eq!(p.lives_remaining, -1);
        assert_eq!(p.state(), LifeState::GameOver);
        assert_eq!(count(&ev, &PlayerEvent::GameOver), 1);

        p.die(DeathType::Drowning, &mut ev);
        assert_eq!(p.lives_remaining, -1);
        assert_eq!(count(&ev, &PlayerEvent::GameOver), 2);
        assert_eq!(p.state(), LifeState::GameOver);
    }

    #[test]
    fn game_over_never_respawns() {
        let f = field("SSSF");
        let mut c = cfg();
        c.total_lives = 0;
        let mut p = active_player(c);
        let mut ev = vec![];
        p.die(DeathType::Collision, &mut ev);
        run(&mut p, &f, 2.0, &mut ev);
        assert!(!p.active);
        assert_eq!(count(&ev, &PlayerEvent::Respawned), 0);
        p.begin();
        assert!(!p.active);
    }

    #[test]
    fn respawn_restores_player_after_delay() {
        let f = field("SSWSF");
        let mut p = active_player(cfg());
        let mut ev = vec![];
        hop(&mut p, &f, MoveDir::Up, &mut ev);
        hop(&mut p, &f, MoveDir::Up, &mut ev); // drowns on row 2
        assert_eq!(p.state(), LifeState::Respawning);

        run(&mut p, &f, 0.4, &mut ev);
        assert!(!p.active);
        for _ in 0..16 {
            if p.active { break; }
            p.tick(DT, None, &f, &mut ev);
        }
        assert!(p.active);
        assert_eq!(p.time_remaining, 20.0);
        assert_eq!((p.x, p.y), (0.0, 0.0));
        assert_eq!(p.highest_row, 0.0);
        assert_eq!(count(&ev, &PlayerEvent::Respawned), 1);
    }

    #[test]
    fn death_while_respawning_restarts_the_wait() {
        let f = field("SSSF");
        let mut p = active_player(cfg());
        let mut ev = vec![];
        p.die(DeathType::Collision, &mut ev);
        run(&mut p, &f, 0.4, &mut ev);
        p.die(DeathType::Chomp, &mut ev);

        run(&mut p, &f, 0.4, &mut ev);
        assert_eq!(count(&ev, &PlayerEvent::Respawned), 0);
        assert_eq!(p.state(), LifeState::Respawning);

        run(&mut p, &f, 0.2, &mut ev);
        assert_eq!(count(&ev, &PlayerEvent::Respawned), 1);
        assert!(p.active);
        assert_eq!(p.lives_remaining, 3);
    }

    #[test]
    fn each_death_turns_off_one_icon() {
        let mut p = active_player(cfg());
        let mut ev = vec![];
        for expected in (0..5).rev() {
            p.die(DeathType::Collision, &mut ev);
            assert!(ev.contains(&PlayerEvent::LifeIcon { index: expected, on: false }));
        }
    }

    // ── Victory ──

    #[test]
    fn reaching_top_row_wins_once() {
        // Scenario 4
        let f = field("SSF");
        let mut p = active_player(cfg());
        let mut ev = vec![];
        hop(&mut p, &f, MoveDir::Up, &mut ev);
        hop(&mut p, &f, MoveDir::Up, &mut ev);
        let wins: Vec<u32> = ev.iter().filter_map(|e| match e {
            PlayerEvent::Victory { bonus } => Some(*bonus),
            _ => None,
        }).collect();
        assert_eq!(wins, vec![5 * 100 * 2]);
        assert_eq!(p.state(), LifeState::Victory);

        hop(&mut p, &f, MoveDir::Up, &mut ev);
        run(&mut p, &f, 1.0, &mut ev);
        assert_eq!(ev.iter().filter(|e| matches!(e, PlayerEvent::Victory { .. })).count(), 1);
    }

    #[test]
    fn victory_bonus_counts_remaining_lives() {
        let f = field("SF");
        let mut p = active_player(cfg());
        let mut ev = vec![];
        p.die(DeathType::Collision, &mut ev);
        run(&mut p, &f, 0.6, &mut ev);
        assert!(p.active);
        ev.clear();
        hop(&mut p, &f, MoveDir::Up, &mut ev);
        assert!(ev.contains(&PlayerEvent::Victory { bonus: 400 }));
        assert!(p.score >= 400 + 100);
    }

    #[test]
    fn won_run_cannot_be_lost() {
        let f = field("SF");
        let mut p = active_player(cfg());
        let mut ev = vec![];
        hop(&mut p, &f, MoveDir::Up, &mut ev);
        assert_eq!(p.state(), LifeState::Victory);

        ev.clear();
        p.on_carrier_enter(VehicleId(3), VehicleKind::PredatorHead, &mut ev);
        p.die(DeathType::Time, &mut ev);
        run(&mut p, &f, 1.0, &mut ev);
        assert!(deaths(&ev).is_empty());
        assert_eq!(count(&ev, &PlayerEvent::Respawned), 0);
        assert!(!p.active);
        assert_eq!(p.lives_remaining, 5);
        assert_eq!(p.state(), LifeState::Victory);
    }

    #[test]
    fn huge_scores_saturate() {
        let lanes = format!("{}F", "S".repeat(100));
        let f = field(&lanes);
        let mut p = active_player(PlayerConfig {
            total_lives: 50_000,
            points_per_step: 1_000,
            time_limit: 1_000.0,
            ..cfg()
        });
        let mut ev = vec![];
        for _ in 0..100 {
            hop(&mut p, &f, MoveDir::Up, &mut ev);
        }
        assert!(ev.contains(&PlayerEvent::Victory { bonus: u32::MAX }));
        assert_eq!(p.score, u32::MAX);
    }
}
