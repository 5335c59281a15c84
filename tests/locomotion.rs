use std::time::Duration;

use bevy::{prelude::*, time::TimeUpdateStrategy};
use npc_kit::{
    FollowPathData, InterpolationPolicy, Npc, NpcAction, NpcCommand, NpcCorePlugin,
    NpcHookTriggered, NpcState, PathFollow, WalkingNpcs,
};

#[derive(Resource, Default)]
struct Fired(Vec<String>);

fn record(mut hooks: MessageReader<NpcHookTriggered>, mut fired: ResMut<Fired>) {
    fired.0.extend(hooks.read().map(|hook| hook.hook.clone()));
}

fn app(step: Duration) -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, NpcCorePlugin))
        .insert_resource(TimeUpdateStrategy::ManualDuration(step))
        .init_resource::<Fired>()
        .add_systems(Last, record);
    app.world_mut()
        .resource_mut::<Time<Virtual>>()
        .set_max_delta(Duration::from_secs(10));
    app.update();
    app
}

fn position(app: &App, npc: Entity) -> Vec3 {
    app.world().get::<Transform>(npc).unwrap().translation
}

fn state(app: &App, npc: Entity) -> NpcState {
    *app.world().get::<NpcState>(npc).unwrap()
}

fn count(app: &App, hook: &str) -> usize {
    app.world()
        .resource::<Fired>()
        .0
        .iter()
        .filter(|fired| fired.as_str() == hook)
        .count()
}

#[test]
fn discrete_stop_lands_on_every_vertex_and_finishes_once() {
    let mut app = app(Duration::from_millis(1250));
    let npc = app.world_mut().spawn(Npc::new()).id();
    app.world_mut().write_message(NpcCommand::new(
        npc,
        NpcAction::FollowPath(Some(
            FollowPathData::new(vec![Vec3::ZERO, Vec3::X * 2.0, Vec3::X * 4.0])
                .total_duration(4.0)
                .on_reached_point("point")
                .on_finish("done"),
        )),
    ));

    app.update();
    assert_eq!(state(&app, npc), NpcState::Following);
    assert!(position(&app, npc).abs_diff_eq(Vec3::X * 1.25, 1e-5));
    let forward = app.world().get::<Transform>(npc).unwrap().forward();
    assert!(forward.abs_diff_eq(Vec3::X, 1e-5));

    app.update();
    assert_eq!(position(&app, npc), Vec3::X * 2.0);
    assert_eq!(count(&app, "point"), 1);

    app.update();
    assert!(position(&app, npc).abs_diff_eq(Vec3::X * 3.25, 1e-5));

    app.update();
    assert_eq!(position(&app, npc), Vec3::X * 4.0);
    assert_eq!(state(&app, npc), NpcState::Standing);

    app.update();
    app.update();
    assert_eq!(position(&app, npc), Vec3::X * 4.0);
    assert_eq!(count(&app, "done"), 1);
    assert_eq!(count(&app, "point"), 1);
}

#[test]
fn continuous_carry_crosses_several_segments_in_one_step() {
    let mut app = app(Duration::from_millis(2500));
    let npc = app.world_mut().spawn(Npc::new()).id();
    app.world_mut().write_message(NpcCommand::new(
        npc,
        NpcAction::FollowPath(Some(
            FollowPathData::new(vec![
                Vec3::ZERO,
                Vec3::X,
                Vec3::X * 2.0,
                Vec3::X * 3.0,
                Vec3::X * 4.0,
            ])
            .speed(1.0)
            .policy(InterpolationPolicy::ContinuousCarry)
            .on_reached_point("point"),
        )),
    ));

    app.update();
    let path = app.world().get::<PathFollow>(npc).unwrap();
    assert_eq!(path.origin(), 2);
    assert!((path.fraction() - 0.5).abs() < 1e-5);
    assert!(position(&app, npc).abs_diff_eq(Vec3::X * 2.5, 1e-5));
    assert_eq!(count(&app, "point"), 2);
}

#[test]
fn looping_path_never_finishes() {
    let mut app = app(Duration::from_millis(250));
    let square = vec![Vec3::ZERO, Vec3::X, Vec3::X + Vec3::Z, Vec3::Z];
    let npc = app
        .world_mut()
        .spawn(Npc::new().path(square).walking_anim("Walk"))
        .id();

    for _ in 0..40 {
        app.update();
    }
    assert_eq!(state(&app, npc), NpcState::Following);
    assert_eq!(app.world().resource::<WalkingNpcs>().len(), 1);
    assert!(app.world().get::<PathFollow>(npc).unwrap().is_looping());
}

#[test]
fn stop_walking_resumes_after_the_given_time() {
    let mut app = app(Duration::from_millis(250));
    let npc = app
        .world_mut()
        .spawn(Npc::new().path(vec![Vec3::ZERO, Vec3::X * 10.0]))
        .id();
    app.update();
    app.update();

    app.world_mut()
        .write_message(NpcCommand::new(npc, NpcAction::StopWalking(Some(1.0))));
    app.update();
    assert_eq!(state(&app, npc), NpcState::Standing);
    let stopped_at = position(&app, npc);

    app.update();
    assert_eq!(position(&app, npc), stopped_at);

    for _ in 0..4 {
        app.update();
    }
    assert_eq!(state(&app, npc), NpcState::Following);
    app.update();
    assert!(position(&app, npc).x > stopped_at.x);
}

#[test]
fn a_path_too_short_to_walk_keeps_the_current_walk() {
    let mut app = app(Duration::from_millis(250));
    let npc = app.world_mut().spawn(Npc::new()).id();
    app.world_mut().write_message(NpcCommand::new(
        npc,
        NpcAction::FollowPath(Some(
            FollowPathData::new(vec![Vec3::ZERO, Vec3::X * 10.0]).total_duration(5.0),
        )),
    ));
    app.update();
    app.update();

    app.world_mut().write_message(NpcCommand::new(
        npc,
        NpcAction::FollowPath(Some(FollowPathData::new(vec![Vec3::Z]))),
    ));
    for _ in 0..4 {
        app.update();
    }
    assert_eq!(state(&app, npc), NpcState::Following);
    let path = app.world().get::<PathFollow>(npc).unwrap();
    assert_eq!(path.points().last(), Some(&(Vec3::X * 10.0)));
    assert!(position(&app, npc).x > 1.0);
    assert_eq!(position(&app, npc).z, 0.0);
}
