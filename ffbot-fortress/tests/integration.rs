//! Integration Tests — End-to-End Bot Scenarios
//!
//! Drives whole bots and teams through the sandbox world: objective choice,
//! combat interruptions, plan chatter and host events.

use ffbot_core::blackboard::Blackboard;
use ffbot_core::chatter::phrase::{PhraseBank, PhraseRegistry};
use ffbot_core::chatter::statement::Plan;
use ffbot_core::config::BotConfig;
use ffbot_core::sandbox::{RecordingVoice, SandboxWorld, Utterance};
use ffbot_core::types::{
    ActorSnapshot, EntityId, GameMode, GameTime, Location, PlaceId, PlayerClass, TeamId,
};
use ffbot_core::world::{ControlPoint, FlagInfo, FlagState};
use ffbot_fortress::{Bot, Objective, Team, desired_scenario_and_class_action};
use serde_json::json;

const BANK: &str = r#"
[[phrase]]
name = "plan_capture"
[[phrase.variant]]
sound = "capture.wav"
duration = 1.0

[[phrase]]
name = "acknowledge"
radio = "affirmative"
"#;

fn t(seconds: f32) -> GameTime {
    GameTime(seconds)
}

fn point(place: Option<PlaceId>, owner: Option<TeamId>) -> ControlPoint {
    ControlPoint {
        id: EntityId::new(),
        position: Location::new(800.0, 0.0, 0.0),
        place,
        owner,
        locked: false,
    }
}

fn control_point_world() -> SandboxWorld {
    SandboxWorld {
        mode: GameMode::ControlPoint,
        ..SandboxWorld::default()
    }
}

fn soldier(world: &mut SandboxWorld, team: TeamId) -> EntityId {
    let id = EntityId::new();
    world.add_actor(ActorSnapshot::new(id, team, PlayerClass::Soldier));
    id
}

// ---------------------------------------------------------------------------
// Combat interruptions
// ---------------------------------------------------------------------------

#[test]
fn retreat_without_cover_resumes_the_same_attack() {
    let mut world = control_point_world();
    let me = soldier(&mut world, TeamId(0));
    let enemy = world.set_visible_enemy(me, Location::new(300.0, 0.0, 0.0));
    let mut config = BotConfig::default();
    config.behavior.health_critical_ratio = 0.3;
    let mut bot = Bot::new(me, "Holdout", 3);

    // Nothing to capture, so the bot hunts and engages.
    bot.update(&world, &config, t(0.0));
    assert_eq!(bot.top_behavior_name(), "Attack");
    bot.update(&world, &config, t(0.1));
    assert_eq!(bot.body().fire_at, Some(enemy));
    assert_eq!(bot.current_task(), Some(format!("attacking {enemy} (1 shots)")));

    if let Some(actor) = world.actor_mut(me) {
        actor.health = actor.max_health * 0.1;
    }
    assert!(bot.should_retreat(&world, &config, t(0.2)));

    let report = bot.update(&world, &config, t(0.2));
    assert_eq!(report.updated, Some("RetreatToCover"));
    assert_eq!(bot.top_behavior_name(), "Attack");
    assert_eq!(bot.current_task(), Some(format!("attacking {enemy} (1 shots)")));

    // The cooldown keeps the bot on the attack.
    bot.update(&world, &config, t(0.3));
    assert_eq!(bot.top_behavior_name(), "Attack");
    assert_eq!(bot.current_task(), Some(format!("attacking {enemy} (2 shots)")));
}

#[test]
fn query_answers_are_stable_between_ticks() {
    let mut world = control_point_world();
    let me = soldier(&mut world, TeamId(0));
    let _enemy = world.set_visible_enemy(me, Location::new(300.0, 0.0, 0.0));
    let config = BotConfig::default();
    let mut bot = Bot::new(me, "Steady", 4);
    bot.update(&world, &config, t(0.0));

    let other = EntityId::new();
    let first = (
        bot.should_retreat(&world, &config, t(0.0)),
        bot.is_hindrance(&world, &config, t(0.0), other),
    );
    for _ in 0..3 {
        let again = (
            bot.should_retreat(&world, &config, t(0.0)),
            bot.is_hindrance(&world, &config, t(0.0), other),
        );
        assert_eq!(again, first);
    }
    assert_eq!(first, (false, true));
}

// ---------------------------------------------------------------------------
// Objective choice
// ---------------------------------------------------------------------------

#[test]
fn lone_soldier_captures_the_only_open_point() {
    let mut world = control_point_world();
    let me = soldier(&mut world, TeamId(0));
    let target = point(Some(PlaceId(2)), None);
    world.control_points.push(target);
    let blackboard = Blackboard::default();
    let actor = world.actors[0].clone();

    let first = desired_scenario_and_class_action(&actor, &world, &blackboard);
    assert_eq!(first, Objective::CapturePoint(target));
    for _ in 0..5 {
        assert_eq!(desired_scenario_and_class_action(&actor, &world, &blackboard), first);
    }

    let mut bot = Bot::new(me, "Runner", 5);
    bot.update(&world, &BotConfig::default(), t(0.0));
    assert_eq!(
        bot.behavior_path(),
        vec!["TacticalMonitor", "ScenarioMonitor", "CapturePoint"]
    );
}

// ---------------------------------------------------------------------------
// Team chatter
// ---------------------------------------------------------------------------

#[test]
fn teammates_converge_on_one_spoken_plan() {
    let mut world = control_point_world();
    let place = Some(PlaceId(4));
    world.control_points.push(point(place, None));
    let first = soldier(&mut world, TeamId(0));
    let second = soldier(&mut world, TeamId(0));

    let mut team = Team::new(TeamId(0));
    team.add_bot(Bot::new(first, "Alpha", 1));
    team.add_bot(Bot::new(second, "Bravo", 2));
    let registry = PhraseRegistry::new();
    registry.load_for_map(PhraseBank::from_toml(BANK).expect("bank"));
    let mut voice = RecordingVoice::default();
    let config = BotConfig::default();

    let report = team.tick(&world, &config, &mut voice, &registry, t(0.0));
    assert_eq!(report.bots.len(), 2);
    assert_eq!(report.chatter.active.map(|(owner, _)| owner), Some(first));
    assert_eq!(report.chatter.acknowledged, 1);

    let mut now = 0.0;
    while now < 5.0 {
        now += 0.1;
        team.tick(&world, &config, &mut voice, &registry, t(now));
    }

    let spoken = voice
        .log
        .iter()
        .filter(|(_, u)| matches!(u, Utterance::Sound(s) if s == "capture.wav"))
        .count();
    assert_eq!(spoken, 1);
    assert!(
        voice
            .log
            .iter()
            .any(|(who, u)| *who == second && matches!(u, Utterance::Signal(_)))
    );
    let bravo = team.bot(second).expect("on roster");
    assert!(bravo.blackboard().teammate_has_plan(Plan::CapturePoint, place));
}

#[test]
fn dropped_flag_is_called_out_to_the_team() {
    let mut world = SandboxWorld {
        mode: GameMode::CaptureTheFlag,
        ..SandboxWorld::default()
    };
    let first = EntityId::new();
    let second = EntityId::new();
    for id in [first, second] {
        world.add_actor(ActorSnapshot::new(id, TeamId(0), PlayerClass::Sniper));
    }
    world.flags.insert(
        TeamId(0),
        FlagInfo {
            id: EntityId::new(),
            position: Location::new(600.0, 0.0, 0.0),
            state: FlagState::Dropped { since: t(0.0) },
            capture_zone: Location::default(),
        },
    );
    let mut team = Team::new(TeamId(0));
    team.add_bot(Bot::new(first, "Alpha", 1));
    team.add_bot(Bot::new(second, "Bravo", 2));
    let registry = PhraseRegistry::new();
    let mut voice = RecordingVoice::default();
    let config = BotConfig::default();

    let mut now = 0.0;
    while now < 5.0 {
        team.tick(&world, &config, &mut voice, &registry, t(now));
        now += 0.1;
    }

    let informed = [first, second]
        .iter()
        .filter_map(|id| team.bot(*id))
        .filter(|bot| bot.blackboard().loose_flag.is_some())
        .count();
    assert!(informed >= 1);
}

// ---------------------------------------------------------------------------
// Host events
// ---------------------------------------------------------------------------

#[test]
fn named_commands_flow_through_the_team() {
    let mut world = control_point_world();
    world.control_points.push(point(None, None));
    let me = soldier(&mut world, TeamId(0));
    let mut team = Team::new(TeamId(0));
    team.add_bot(Bot::new(me, "Ghost", 6));
    let registry = PhraseRegistry::new();
    let mut voice = RecordingVoice::default();
    let config = BotConfig::default();

    team.tick(&world, &config, &mut voice, &registry, t(0.0));
    team.bot_mut(me)
        .expect("on roster")
        .on_named_event("command", &json!({ "command": " Despawn " }))
        .expect("known event");
    team.tick(&world, &config, &mut voice, &registry, t(0.1));

    let bot = team.bot(me).expect("on roster");
    assert_eq!(bot.top_behavior_name(), "Despawn");
    assert!(bot.body().despawn);
}
