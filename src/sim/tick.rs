//! Fixed timestep simulation tick
//!
//! Core game loop that advances a shot deterministically. Order within a tick
//! is fixed: bird, then blocks and pigs, then collisions, then the win check
//! and shot state machine.

use glam::Vec2;

use super::collision::{Rect, bird_hits_block, bird_hits_pig, first_support, ground_contact};
use super::kinematics::{GroundResponse, integrate, integrate_debris, is_moving, land_on_ground};
use super::state::{Bird, Block, GameEvent, Pig, SessionSnapshot, ShotSession, ShotState};
use crate::is_finite_vec;
use crate::settings::{Playfield, Settings};

/// Fire the bird from its current position. Only valid in `Ready`.
///
/// Zero or non-finite vectors count as "no shot" and leave the session untouched.
pub fn launch(session: &mut ShotSession, velocity: Vec2) -> bool {
    if session.state != ShotState::Ready || session.birds_remaining == 0 {
        log::debug!("Ignoring launch in {:?}", session.state);
        return false;
    }
    if !is_finite_vec(velocity) || velocity == Vec2::ZERO {
        log::debug!("Ignoring degenerate launch {:?}", velocity);
        return false;
    }

    session.bird.vel = velocity;
    session.bird.path.clear();
    session.bird.record_path();
    session.rest_ticks = 0;
    session.state = ShotState::Flying;
    session.emit(GameEvent::ShotLaunched { velocity });
    log::info!(
        "Level {}: launched bird at ({:.1}, {:.1}), {} left",
        session.level_id,
        velocity.x,
        velocity.y,
        session.birds_remaining
    );
    true
}

/// Advance the session by one fixed step.
///
/// Returns `None` (and does nothing) outside `Flying`/`Settling`, which makes
/// late frames after a state change harmless.
pub fn tick(session: &mut ShotSession) -> Option<SessionSnapshot> {
    if !session.state.is_active() {
        log::debug!("Ignoring tick in {:?}", session.state);
        return None;
    }

    session.time_ticks += 1;
    let flying = session.state == ShotState::Flying;

    // 1. Bird
    if flying {
        step_bird(&mut session.bird, session.settings.gravity);
    }

    // 2. Blocks, then pigs (pigs rest on this tick's block positions)
    step_blocks(&mut session.blocks, &session.settings);
    step_pigs(&mut session.pigs, &session.blocks, &session.settings);

    // 3. Bird impacts
    if flying {
        resolve_bird_impacts(session);
    }

    // 4. Win check, every tick, terminal
    if session.all_pigs_destroyed() {
        session.state = ShotState::Success;
        session.emit(GameEvent::LevelCleared { score: session.score });
        log::info!("Level {} cleared with score {}", session.level_id, session.score);
        return Some(session.snapshot());
    }

    // 5. Shot state machine
    match session.state {
        ShotState::Flying => {
            if bird_out_of_play(&session.bird, &session.settings.playfield) {
                session.state = ShotState::Settling;
                session.rest_ticks = 0;
                session.emit(GameEvent::ShotEnded);
                log::debug!("Shot over at tick {}, settling", session.time_ticks);
            }
        }
        ShotState::Settling => {
            if world_moving(session) {
                session.rest_ticks = 0;
            } else {
                session.rest_ticks += 1;
            }
            if session.rest_ticks >= session.settings.settle_ticks {
                conclude_shot(session);
            }
        }
        _ => {}
    }

    Some(session.snapshot())
}

fn step_bird(bird: &mut Bird, gravity: f32) {
    let (pos, vel) = integrate(bird.pos, bird.vel, gravity);
    bird.pos = pos;
    bird.vel = vel;
    bird.record_path();
}

fn step_blocks(blocks: &mut [Block], settings: &Settings) {
    let ground_y = settings.playfield.ground_y();
    let intact_fall = settings.support.intact_bodies_fall();

    // Supports use start-of-tick positions
    let supports: Vec<(u32, Rect)> = blocks
        .iter()
        .filter(|b| !b.destroyed)
        .map(|b| (b.id, b.rect()))
        .collect();

    for block in blocks.iter_mut() {
        if block.destroyed {
            let (mut next, mut vel) = integrate_debris(
                block.pos,
                block.vel,
                settings.gravity * settings.debris_gravity_scale,
                settings.air_friction,
            );
            if ground_contact(next.y + block.height, ground_y) {
                (next.y, vel) = land_on_ground(
                    block.height,
                    ground_y,
                    vel,
                    GroundResponse::Bounce {
                        restitution: settings.ground_bounce,
                        drag: settings.ground_drag,
                    },
                );
            }
            block.pos = next;
            block.vel = vel;
            continue;
        }

        if !intact_fall {
            continue;
        }

        let (mut next, mut vel) = integrate(block.pos, block.vel, settings.gravity);
        if ground_contact(next.y + block.height, ground_y) {
            (next.y, vel) = land_on_ground(
                block.height,
                ground_y,
                vel,
                GroundResponse::Rest { friction: settings.resting_friction },
            );
        }

        let current = block.rect();
        let predicted = block.rect_at(next);
        let others = supports.iter().filter(|(id, _)| *id != block.id).map(|(_, r)| r);
        if let Some(support) = first_support(&current, &predicted, others) {
            next.y = support.top() - block.height;
            // Riding a falling support still counts as motion for settling
            vel.y = (next.y - block.pos.y).max(0.0);
            vel.x *= settings.resting_friction;
        }

        block.pos = next;
        block.vel = vel;
    }
}

fn step_pigs(pigs: &mut [Pig], blocks: &[Block], settings: &Settings) {
    let ground_y = settings.playfield.ground_y();
    let intact_fall = settings.support.intact_bodies_fall();
    let supports: Vec<Rect> = blocks.iter().filter(|b| !b.destroyed).map(Block::rect).collect();

    for pig in pigs.iter_mut() {
        let diameter = pig.diameter();

        if pig.destroyed {
            let (mut next, mut vel) =
                integrate_debris(pig.pos, pig.vel, settings.gravity, settings.air_friction);
            if ground_contact(next.y + diameter, ground_y) {
                (next.y, vel) = land_on_ground(
                    diameter,
                    ground_y,
                    vel,
                    GroundResponse::Bounce {
                        restitution: settings.ground_bounce,
                        drag: settings.ground_drag,
                    },
                );
            }
            pig.pos = next;
            pig.vel = vel;
            continue;
        }

        if !intact_fall {
            continue;
        }

        let (mut next, mut vel) = integrate(pig.pos, pig.vel, settings.gravity);
        if ground_contact(next.y + diameter, ground_y) {
            (next.y, vel) = land_on_ground(
                diameter,
                ground_y,
                vel,
                GroundResponse::Rest { friction: settings.resting_friction },
            );
        }

        let current = pig.rect_at(pig.pos);
        let predicted = pig.rect_at(next);
        if let Some(support) = first_support(&current, &predicted, &supports) {
            next.y = support.top() - diameter;
            vel.y = (next.y - pig.pos.y).max(0.0);
        }

        pig.pos = next;
        pig.vel = vel;
    }
}

/// Destroy whatever the bird touches and apply the impact impulses.
///
/// Destruction and scoring only happen on the intact -> destroyed transition.
fn resolve_bird_impacts(session: &mut ShotSession) {
    let settings = &session.settings;
    let bird = &mut session.bird;
    let mut events = Vec::new();

    for block in session.blocks.iter_mut() {
        if !bird_hits_block(bird, block) {
            continue;
        }
        block.destroyed = true;
        block.vel += bird.vel * settings.block_transfer;
        bird.vel.x *= settings.block_rebound;
        bird.vel.y *= -settings.block_rebound;
        session.score += settings.block_score;
        events.push(GameEvent::BlockDestroyed {
            id: block.id,
            points: settings.block_score,
        });
        log::debug!("Block {} destroyed at tick {}", block.id, session.time_ticks);
    }

    for pig in session.pigs.iter_mut() {
        if !bird_hits_pig(bird, pig) {
            continue;
        }
        bird.vel.x *= settings.pig_rebound;
        bird.vel.y *= -settings.pig_rebound;
        pig.destroyed = true;
        pig.vel = bird.vel;
        session.score += settings.pig_score;
        events.push(GameEvent::PigDestroyed {
            id: pig.id,
            points: settings.pig_score,
        });
        log::debug!("Pig {} destroyed at tick {}", pig.id, session.time_ticks);
    }

    session.events.extend(events);
}

/// Left/right edge, or low enough to touch the ground
fn bird_out_of_play(bird: &Bird, playfield: &Playfield) -> bool {
    bird.pos.y > playfield.ground_y() - bird.radius || !playfield.contains_x(bird.pos.x)
}

/// Any body still in the playfield moving above the settle threshold
fn world_moving(session: &ShotSession) -> bool {
    let field = &session.settings.playfield;
    let threshold = session.settings.settle_speed;
    let in_play = |left: f32, right: f32| right >= 0.0 && left <= field.width;

    let blocks_moving = session
        .blocks
        .iter()
        .filter(|b| in_play(b.pos.x, b.pos.x + b.width))
        .any(|b| is_moving(b.vel, threshold));
    let pigs_moving = session
        .pigs
        .iter()
        .filter(|p| in_play(p.pos.x, p.pos.x + p.diameter()))
        .any(|p| is_moving(p.vel, threshold));

    blocks_moving || pigs_moving
}

/// The world has been at rest long enough: spend the bird and move on
fn conclude_shot(session: &mut ShotSession) {
    session.birds_remaining = session.birds_remaining.saturating_sub(1);
    session.rest_ticks = 0;

    if session.birds_remaining > 0 {
        session.bird.reset(session.anchor);
        session.state = ShotState::Ready;
        session.emit(GameEvent::BirdReloaded {
            birds_remaining: session.birds_remaining,
        });
        log::info!(
            "Level {}: world settled, {} birds left",
            session.level_id,
            session.birds_remaining
        );
    } else if session.all_pigs_destroyed() {
        session.state = ShotState::Success;
        session.emit(GameEvent::LevelCleared { score: session.score });
    } else {
        session.state = ShotState::Fail;
        session.emit(GameEvent::LevelFailed { score: session.score });
        log::info!("Level {} failed with score {}", session.level_id, session.score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::level::{Anchor, BlockSpec, Level, PigSpec, builtin_level};
    use crate::settings::SupportMode;
    use proptest::prelude::*;

    fn custom_level(blocks: Vec<BlockSpec>, pigs: Vec<PigSpec>, bird_count: u32) -> Level {
        Level {
            id: 99,
            structure: "test level".to_string(),
            blocks,
            pigs,
            bird_count,
            bird: Anchor { x: 100.0, y: 350.0 },
        }
    }

    fn block_spec(id: u32, x: f32, y: f32, width: f32, height: f32) -> BlockSpec {
        BlockSpec { id, x, y, width, height }
    }

    fn pig_spec(id: u32, x: f32, y: f32) -> PigSpec {
        PigSpec { id, x, y, radius: PIG_RADIUS }
    }

    /// Tick until the session stops being active (or the tick budget runs out)
    fn run_shot(session: &mut ShotSession, max_ticks: usize) {
        for _ in 0..max_ticks {
            if tick(session).is_none() {
                break;
            }
        }
    }

    #[test]
    fn test_tick_ready_to_flying() {
        let level = builtin_level(1).unwrap();
        let mut session = ShotSession::start(&level, Settings::default());

        // Ticking in Ready is a no-op
        assert!(tick(&mut session).is_none());
        assert_eq!(session.time_ticks, 0);

        assert!(launch(&mut session, Vec2::new(8.0, -6.0)));
        assert_eq!(session.state, ShotState::Flying);
        let snap = tick(&mut session).unwrap();
        assert_eq!(snap.tick, 1);
        assert_eq!(snap.bird_path.len(), 2);
    }

    #[test]
    fn test_launch_only_in_ready() {
        let level = builtin_level(1).unwrap();
        let mut session = ShotSession::start(&level, Settings::default());
        assert!(launch(&mut session, Vec2::new(8.0, -6.0)));
        let vel = session.bird.vel;
        assert!(!launch(&mut session, Vec2::new(-3.0, -3.0)));
        assert_eq!(session.bird.vel, vel);
    }

    #[test]
    fn test_degenerate_launch_is_no_shot() {
        let level = builtin_level(1).unwrap();
        let mut session = ShotSession::start(&level, Settings::default());
        assert!(!launch(&mut session, Vec2::ZERO));
        assert!(!launch(&mut session, Vec2::new(f32::NAN, 1.0)));
        assert_eq!(session.state, ShotState::Ready);
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn test_block_hit_scores_once() {
        let level = custom_level(
            vec![block_spec(1, 600.0, 400.0, 50.0, 50.0)],
            vec![pig_spec(1, 900.0, 410.0)],
            3,
        );
        let mut session = ShotSession::start(&level, Settings::default());
        assert!(session.launch(Vec2::new(8.0, -6.0)));

        let mut hit_tick = None;
        for _ in 0..200 {
            let snap = tick(&mut session).unwrap();
            if snap.blocks[0].destroyed {
                hit_tick = Some(snap.tick);
                break;
            }
        }
        assert_eq!(hit_tick, Some(65));
        assert_eq!(session.score, BLOCK_SCORE);

        // Keep ticking: the bird is still overlapping debris but no more points
        for _ in 0..30 {
            tick(&mut session);
        }
        assert_eq!(session.score, BLOCK_SCORE);
        let destroyed_events = session
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::BlockDestroyed { id: 1, .. }))
            .count();
        assert_eq!(destroyed_events, 1);
    }

    #[test]
    fn test_block_hit_transfers_velocity() {
        let level = custom_level(
            vec![block_spec(1, 600.0, 400.0, 50.0, 50.0)],
            vec![pig_spec(1, 900.0, 410.0)],
            3,
        );
        let mut session = ShotSession::start(&level, Settings::default());
        session.bird.pos = Vec2::new(580.0, 420.0);
        session.launch(Vec2::new(10.0, 0.0));
        tick(&mut session);

        // Bird velocity after gravity: (10, 0.2)
        assert!(session.blocks[0].destroyed);
        assert!((session.bird.vel.x - 4.0).abs() < 1e-4);
        assert!((session.bird.vel.y - (-0.08)).abs() < 1e-4);
        assert!(session.blocks[0].vel.x > 4.9);
    }

    #[test]
    fn test_pig_hit_wins_immediately() {
        let level = custom_level(vec![], vec![pig_spec(1, 300.0, 410.0)], 3);
        let mut session = ShotSession::start(&level, Settings::default());
        // Put the bird right next to the pig
        session.bird.pos = Vec2::new(280.0, 430.0);
        session.launch(Vec2::new(5.0, -0.2));
        let snap = tick(&mut session).unwrap();

        assert_eq!(snap.state, ShotState::Success);
        assert!(snap.pigs[0].destroyed);
        assert_eq!(snap.score, PIG_SCORE);
        assert_eq!(snap.birds_remaining, 3);
        assert!(tick(&mut session).is_none());

        let events = session.drain_events();
        assert!(events.contains(&GameEvent::PigDestroyed { id: 1, points: PIG_SCORE }));
        assert!(events.contains(&GameEvent::LevelCleared { score: PIG_SCORE }));
    }

    #[test]
    fn test_shot_accounting_three_misses() {
        let level = custom_level(
            vec![block_spec(1, 640.0, 400.0, 20.0, 50.0)],
            vec![pig_spec(1, 700.0, 410.0)],
            3,
        );
        let mut session = ShotSession::start(&level, Settings::default());

        for expected_left in [2, 1, 0] {
            assert!(session.launch(Vec2::new(-10.0, 0.0)));
            run_shot(&mut session, 1000);
            assert_eq!(session.birds_remaining, expected_left);
        }
        assert_eq!(session.state, ShotState::Fail);
        assert!(!session.launch(Vec2::new(5.0, -5.0)));
    }

    #[test]
    fn test_settle_advances_once() {
        let level = custom_level(vec![], vec![pig_spec(1, 700.0, 410.0)], 3);
        let mut session = ShotSession::start(&level, Settings::default());
        session.launch(Vec2::new(-10.0, 0.0));

        // Fly off the left edge
        while session.state == ShotState::Flying {
            tick(&mut session);
        }
        assert_eq!(session.state, ShotState::Settling);

        let settle_ticks = session.settings.settle_ticks;
        for _ in 0..settle_ticks - 1 {
            tick(&mut session);
            assert_eq!(session.state, ShotState::Settling);
        }
        tick(&mut session);
        assert_eq!(session.state, ShotState::Ready);
        assert_eq!(session.birds_remaining, 2);
        assert_eq!(session.bird.pos, session.anchor);
        assert_eq!(session.bird.vel, Vec2::ZERO);

        // Late frames do nothing
        assert!(tick(&mut session).is_none());
        assert_eq!(session.birds_remaining, 2);

        let reloads = session
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::BirdReloaded { .. }))
            .count();
        assert_eq!(reloads, 1);
    }

    #[test]
    fn test_moving_debris_delays_settle() {
        let level = custom_level(
            vec![block_spec(1, 500.0, 400.0, 20.0, 50.0)],
            vec![pig_spec(1, 900.0, 410.0)],
            2,
        );
        let mut session = ShotSession::start(&level, Settings::default());
        session.launch(Vec2::new(-10.0, 0.0));
        while session.state == ShotState::Flying {
            tick(&mut session);
        }

        // Knock the block loose mid-settle
        session.blocks[0].destroyed = true;
        session.blocks[0].vel = Vec2::new(6.0, -4.0);
        let mut ticks = 0;
        while session.state == ShotState::Settling {
            tick(&mut session);
            ticks += 1;
        }
        assert!(ticks > session.settings.settle_ticks as usize);
        assert_eq!(session.state, ShotState::Ready);
    }

    #[test]
    fn test_stacked_tower_holds() {
        let level = builtin_level(1).unwrap();
        let mut session = ShotSession::start(&level, Settings::default());
        let before: Vec<Vec2> = session.blocks.iter().map(|b| b.pos).collect();
        let pig_before = session.pigs[0].pos;

        session.launch(Vec2::new(-10.0, 0.0));
        for _ in 0..60 {
            tick(&mut session);
        }

        for (block, start) in session.blocks.iter().zip(before) {
            assert!((block.pos - start).length() < 1e-3, "block {} drifted", block.id);
            assert_eq!(block.vel, Vec2::ZERO);
        }
        assert!((session.pigs[0].pos - pig_before).length() < 1e-3);
    }

    #[test]
    fn test_roof_rests_on_tower() {
        let level = builtin_level(2).unwrap();
        let mut session = ShotSession::start(&level, Settings::default());
        session.launch(Vec2::new(-10.0, 0.0));
        for _ in 0..60 {
            tick(&mut session);
        }
        let roof = session.blocks.iter().find(|b| b.id == 5).unwrap();
        assert!((roof.pos.y - 330.0).abs() < 1e-3);
    }

    #[test]
    fn test_pig_rests_on_roof() {
        let level = builtin_level(3).unwrap();
        let mut session = ShotSession::start(&level, Settings::default());
        session.launch(Vec2::new(-10.0, 0.0));
        for _ in 0..60 {
            tick(&mut session);
        }
        let top_pig = session.pigs.iter().find(|p| p.id == 3).unwrap();
        assert!((top_pig.pos.y - 240.0).abs() < 1e-3);
        assert_eq!(top_pig.vel.y, 0.0);
    }

    #[test]
    fn test_pig_drops_without_roof() {
        // Roof gone: the pig lands on the middle tower
        let mut level = builtin_level(3).unwrap();
        level.blocks.retain(|b| b.id != 9);
        let mut session = ShotSession::start(&level, Settings::default());
        session.launch(Vec2::new(-10.0, 0.0));
        for _ in 0..120 {
            tick(&mut session);
        }
        let top_pig = session.pigs.iter().find(|p| p.id == 3).unwrap();
        assert!((top_pig.pos.y - 310.0).abs() < 1e-3);
        assert_eq!(top_pig.vel.y, 0.0);

        // Middle tower gone too: all the way to the ground
        let mut level = builtin_level(3).unwrap();
        level.blocks.retain(|b| ![7, 8, 9].contains(&b.id));
        let mut session = ShotSession::start(&level, Settings::default());
        session.launch(Vec2::new(-10.0, 0.0));
        for _ in 0..120 {
            tick(&mut session);
        }
        let top_pig = session.pigs.iter().find(|p| p.id == 3).unwrap();
        assert!((top_pig.pos.y - 410.0).abs() < 1e-3);
        assert!(!top_pig.destroyed);
    }

    #[test]
    fn test_block_riding_falling_support_counts_as_moving() {
        let level = custom_level(
            vec![
                block_spec(1, 600.0, 200.0, 20.0, 50.0),
                block_spec(2, 600.0, 150.0, 20.0, 50.0),
            ],
            vec![pig_spec(1, 900.0, 410.0)],
            1,
        );
        let mut session = ShotSession::start(&level, Settings::default());
        session.launch(Vec2::new(-10.0, 0.0));
        for _ in 0..10 {
            tick(&mut session);
        }
        let rider = &session.blocks[1];
        assert!(rider.pos.y > 150.0);
        assert!(is_moving(rider.vel, session.settings.settle_speed));
    }

    #[test]
    fn test_unsupported_block_falls_when_stacking() {
        let level = custom_level(
            vec![block_spec(1, 600.0, 200.0, 20.0, 50.0)],
            vec![pig_spec(1, 900.0, 410.0)],
            1,
        );
        let mut stacking = ShotSession::start(&level, Settings::default());
        let mut fixed = ShotSession::start(&level, Settings::with_support(SupportMode::Static));
        for session in [&mut stacking, &mut fixed] {
            session.launch(Vec2::new(-10.0, 0.0));
            for _ in 0..200 {
                tick(session);
            }
        }
        assert!((stacking.blocks[0].pos.y - 400.0).abs() < 1e-3);
        assert!((fixed.blocks[0].pos.y - 200.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_determinism() {
        let level = builtin_level(3).unwrap();
        let mut a = ShotSession::start(&level, Settings::default());
        let mut b = ShotSession::start(&level, Settings::default());
        a.launch(Vec2::new(15.0, -9.0));
        b.launch(Vec2::new(15.0, -9.0));
        for _ in 0..400 {
            tick(&mut a);
            tick(&mut b);
        }
        assert_eq!(a.score, b.score);
        assert_eq!(a.state, b.state);
        for (x, y) in a.blocks.iter().zip(&b.blocks) {
            assert_eq!(x.pos, y.pos);
            assert_eq!(x.destroyed, y.destroyed);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_destruction_monotonic_and_scored_once(
            level_id in 1u32..=3,
            vx in 2.0f32..18.0,
            vy in -14.0f32..0.0,
        ) {
            let level = builtin_level(level_id).unwrap();
            let mut session = ShotSession::start(&level, Settings::default());
            prop_assert!(session.launch(Vec2::new(vx, vy)));

            let mut blocks_seen = vec![false; session.blocks.len()];
            let mut pigs_seen = vec![false; session.pigs.len()];
            for _ in 0..1500 {
                let Some(snap) = tick(&mut session) else { break };
                for (seen, block) in blocks_seen.iter_mut().zip(&snap.blocks) {
                    prop_assert!(!(*seen && !block.destroyed));
                    *seen = block.destroyed;
                }
                for (seen, pig) in pigs_seen.iter_mut().zip(&snap.pigs) {
                    prop_assert!(!(*seen && !pig.destroyed));
                    *seen = pig.destroyed;
                }
            }

            let settings = &session.settings;
            let expected = blocks_seen.iter().filter(|d| **d).count() as u64 * settings.block_score
                + pigs_seen.iter().filter(|d| **d).count() as u64 * settings.pig_score;
            prop_assert_eq!(session.score, expected);

            let mut ids = Vec::new();
            for event in session.drain_events() {
                match event {
                    GameEvent::BlockDestroyed { id, .. } => ids.push(('b', id)),
                    GameEvent::PigDestroyed { id, .. } => ids.push(('p', id)),
                    _ => {}
                }
            }
            let total = ids.len();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), total);

            if session.state == ShotState::Success {
                prop_assert!(session.pigs.iter().all(|p| p.destroyed));
            }
        }
    }
}
