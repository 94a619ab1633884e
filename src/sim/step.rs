/// The step function: advances the world by one fixed tick.
///
/// Processing order:
///   1. Banner countdown
///   2. Traffic (every vehicle moves and wraps)
///   3. Player controller tick (timer → input → carrier → pending tasks)
///   4. Trigger resolution (exits first, then enters, in id order)
///
/// Triggers are measured on the player's landing row, so a hop touches
/// the next lane's vehicles once it is past the halfway point.
/// Cars kill here; logs and predator heads go through the controller.

use crate::domain::rules::{self, DeathType, MoveDir};
use crate::domain::vehicle::{VehicleId, VehicleKind};
use super::event::PlayerEvent;
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: Option<MoveDir>, dt: f32) -> Vec<PlayerEvent> {
    if world.phase != Phase::Playing || world.paused { return vec![]; }

    let mut events: Vec<PlayerEvent> = Vec::new();
    world.tick += 1;
    world.tick_message();

    world.board.advance(dt);
    world.player.tick(dt, input, &world.board, &mut events);
    resolve_triggers(world, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Triggers
// ══════════════════════════════════════════════════════════════

fn resolve_triggers(world: &mut WorldState, events: &mut Vec<PlayerEvent>) {
    let WorldState { board, player, touching, .. } = world;

    // The run is over; nothing left to hit.
    if player.outcome.is_some() {
        touching.clear();
        return;
    }

    // A respawning player touches nothing, so contacts re-fire once it is back.
    let now: Vec<(VehicleId, VehicleKind)> = if player.active {
        board.touching(player.x, rules::landing_row(player.y))
    } else {
        vec![]
    };

    let before = std::mem::take(touching);
    for id in &before {
        if !now.iter().any(|(n, _)| n == id) {
            player.on_carrier_exit(*id);
        }
    }

    for &(id, kind) in &now {
        if before.contains(&id) { continue; }
        if !player.active { break; } // an earlier contact this tick was fatal
        match kind {
            VehicleKind::Car => player.die(DeathType::Collision, events),
            _ => player.on_carrier_enter(id, kind, events),
        }
    }

    *touching = now.into_iter().map(|(id, _)| id).collect();
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
