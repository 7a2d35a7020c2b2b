//! Same map, same seed, same commands: same match.

use skirmish_core::prelude::*;
use skirmish_test_utils::determinism::{replay, replay_parallel};
use skirmish_test_utils::fixtures::{self, tile};

fn scripted_match() -> Simulation {
    let mut sim = fixtures::simulation_on(&fixtures::walled_map(20, 20, 10, 12));
    sim.spawn(UnitKind::Radar, Team::Red, tile(2, 2), 0.0);
    sim.spawn(UnitKind::Tank(TankVariant::Medium), Team::Red, tile(3, 4), 0.0);
    sim.spawn(UnitKind::Tank(TankVariant::Heavy), Team::Red, tile(1, 6), 0.0);
    sim.spawn(UnitKind::Radar, Team::Blue, tile(17, 17), 0.0);
    sim.spawn(UnitKind::Turret, Team::Blue, tile(15, 16), 180.0);
    sim
}

#[test]
fn test_scripted_match_replays_identically() {
    replay(scripted_match, 3, 400).assert_deterministic();
}

#[test]
fn test_ai_match_replays_identically_across_threads() {
    replay_parallel(|| fixtures::skirmish(1234), 3, 300).assert_deterministic();
}

#[test]
fn test_build_commands_replay_identically() {
    let setup = || {
        let mut sim = fixtures::skirmish(9);
        sim.run(10);
        sim.economy_mut().team_mut(Team::Red).unwrap().energy = 100;
        sim.issue_build(BuildCommand {
            team: Team::Red,
            kind: UnitKind::Tank(TankVariant::Light),
            x: 5.0 * 32.0,
            y: 5.0 * 32.0,
        })
        .unwrap();
        sim
    };
    replay(setup, 2, 200).assert_deterministic();
}
