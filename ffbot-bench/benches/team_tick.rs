//! ffbot Benchmark Suite
//!
//! Per-frame costs:
//!   objective_choice_single ......... one scenario decision
//!   bot_tick_in_combat .............. one bot, one engaged enemy
//!   team_tick_12_bots ............... full team frame with chatter

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use ffbot_core::blackboard::Blackboard;
use ffbot_core::chatter::phrase::{PhraseBank, PhraseRegistry};
use ffbot_core::config::BotConfig;
use ffbot_core::sandbox::{RecordingVoice, SandboxWorld};
use ffbot_core::types::{
    ActorSnapshot, EntityId, GameMode, GameTime, Location, PlaceId, PlayerClass, TeamId,
};
use ffbot_core::world::ControlPoint;
use ffbot_fortress::{Bot, Team, desired_scenario_and_class_action};

const BANK: &str = r#"
[[phrase]]
name = "plan_capture"
[[phrase.variant]]
sound = "capture.wav"
duration = 1.0

[[phrase]]
name = "acknowledge"
radio = "affirmative"

[[phrase]]
name = "enemy_count"
radio = "enemy_spotted"
"#;

const CLASSES: [PlayerClass; 4] = [
    PlayerClass::Soldier,
    PlayerClass::Scout,
    PlayerClass::Medic,
    PlayerClass::Sniper,
];

fn arena(bots: u32) -> (SandboxWorld, Vec<EntityId>) {
    let mut world = SandboxWorld {
        mode: GameMode::ControlPoint,
        ..SandboxWorld::default()
    };
    for i in 0..3u32 {
        world.control_points.push(ControlPoint {
            id: EntityId::new(),
            position: Location::new(1000.0 * i as f32, 500.0, 0.0),
            place: Some(PlaceId(i)),
            owner: None,
            locked: false,
        });
    }
    let mut ids = Vec::new();
    for i in 0..bots {
        let id = EntityId::new();
        let mut actor = ActorSnapshot::new(id, TeamId(0), CLASSES[i as usize % CLASSES.len()]);
        actor.position = Location::new(40.0 * i as f32, 0.0, 0.0);
        world.add_actor(actor);
        ids.push(id);
    }
    (world, ids)
}

fn bench_objective_choice(c: &mut Criterion) {
    let (world, _) = arena(1);
    let me = world.actors[0].clone();
    let blackboard = Blackboard::default();

    c.bench_function("objective_choice_single", |b| {
        b.iter(|| {
            let objective = desired_scenario_and_class_action(black_box(&me), &world, &blackboard);
            black_box(objective);
        });
    });
}

fn bench_bot_in_combat(c: &mut Criterion) {
    let (mut world, ids) = arena(1);
    let _enemy = world.set_visible_enemy(ids[0], Location::new(300.0, 0.0, 0.0));
    let config = BotConfig::default();
    let mut bot = Bot::new(ids[0], "Bench", 7);
    let mut now = 0.0_f32;

    c.bench_function("bot_tick_in_combat", |b| {
        b.iter(|| {
            now += 0.1;
            for enemy in world.enemies.values_mut().flatten() {
                enemy.last_seen = GameTime(now);
            }
            let report = bot.update(&world, &config, GameTime(now));
            black_box(report);
        });
    });
}

fn bench_team_tick(c: &mut Criterion) {
    let (world, ids) = arena(12);
    let config = BotConfig::default();
    let registry = PhraseRegistry::new();
    if let Ok(bank) = PhraseBank::from_toml(BANK) {
        registry.load_for_map(bank);
    }
    let mut team = Team::new(TeamId(0));
    for (seed, id) in (0u64..).zip(&ids) {
        team.add_bot(Bot::new(*id, format!("Bot{seed}"), seed));
    }
    let mut voice = RecordingVoice::default();
    let mut now = 0.0_f32;

    c.bench_function("team_tick_12_bots", |b| {
        b.iter(|| {
            now += 0.1;
            voice.log.clear();
            let report = team.tick(&world, &config, &mut voice, &registry, GameTime(now));
            black_box(report);
        });
    });
}

criterion_group!(
    benches,
    bench_objective_choice,
    bench_bot_in_combat,
    bench_team_tick,
);
criterion_main!(benches);
