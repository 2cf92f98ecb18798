use flappy_trail::config::GameConfig;
use flappy_trail::game::{CollisionKind, GameEvent, GameState, Press, TickInput, tick};
use flappy_trail::geometry::Rect;
use flappy_trail::physics::{Pipe, PipeSide};
use pretty_assertions::assert_eq;
use speculoos::prelude::*;

fn space() -> Press {
    Press::Flap("SPACE".into())
}

fn press(p: Press) -> TickInput {
    TickInput {
        presses: vec![p],
        spawn_anchor: None,
    }
}

fn collisions(events: &[GameEvent]) -> Vec<CollisionKind> {
    events
        .iter()
        .filter_map(|e| match e {
            GameEvent::Collision(kind) => Some(*kind),
            _ => None,
        })
        .collect()
}

/// Flaps whenever the bird sinks below the middle of a gap anchored at 600.
fn keep_aloft(state: &GameState) -> TickInput {
    if state.bird.y > 480.0 {
        press(space())
    } else {
        TickInput::default()
    }
}

#[test]
fn test_free_fall_follows_closed_form_then_hits_floor() {
    let mut state = GameState::new(GameConfig::default());

    let first = tick(&mut state, &press(space()));
    assert_eq!(first, vec![GameEvent::AttemptStarted(1), GameEvent::Flapped]);
    for _ in 1..50 {
        let events = tick(&mut state, &TickInput::default());
        assert_that(&events).is_empty();
    }
    // 512 - 8 * 50 + 0.25 * (50 * 51 / 2)
    assert_that(&state.bird.y).is_close_to(430.75, 1e-9);
    assert_that(&state.bird.vy).is_close_to(4.5, 1e-9);
    assert_that(&state.session.active).is_true();

    let mut seen = Vec::new();
    let mut ticks = 50;
    while state.session.active && ticks < 1_000 {
        seen.extend(collisions(&tick(&mut state, &TickInput::default())));
        ticks += 1;
    }
    assert_eq!(seen, vec![CollisionKind::Floor]);
    assert_that(&ticks).is_equal_to(94);
    assert_that(&state.bird.rect().bottom()).is_greater_than_or_equal_to(900.0);
}

#[test]
fn test_collision_is_reported_once() {
    let mut state = GameState::new(GameConfig::default());
    tick(&mut state, &press(space()));

    let mut seen = Vec::new();
    for _ in 0..500 {
        seen.extend(collisions(&tick(&mut state, &TickInput::default())));
    }
    assert_that(&seen).has_length(1);

    // Presses that are not flaps do not restart, and nothing is logged.
    let events = tick(&mut state, &press(Press::Other("A".into())));
    assert_that(&events).is_empty();
    assert_that(&state.session.active).is_false();
}

#[test]
fn test_falling_bird_strictly_descends() {
    let mut state = GameState::new(GameConfig::default());
    tick(&mut state, &press(space()));
    while state.bird.vy < 0.0 {
        tick(&mut state, &TickInput::default());
    }
    let mut last = state.bird.y;
    while state.session.active {
        tick(&mut state, &TickInput::default());
        assert_that(&state.bird.y).is_greater_than(last);
        last = state.bird.y;
    }
}

#[test]
fn test_each_pipe_scores_half_and_a_pair_scores_one() {
    let mut state = GameState::new(GameConfig::default());
    let mut first = press(space());
    first.spawn_anchor = Some(600.0);
    tick(&mut state, &first);
    assert_that(&state.pipes).has_length(2);

    let mut passed = Vec::new();
    for _ in 1..150 {
        let input = keep_aloft(&state);
        let events = tick(&mut state, &input);
        assert_that(&collisions(&events)).is_empty();
        passed.extend(events.into_iter().filter(|e| matches!(e, GameEvent::PipePassed(_))));
    }
    assert_that(&state.session.score).is_equal_to(1.0);
    assert_that(&state.score()).is_equal_to(1);
    assert_eq!(passed, vec![GameEvent::PipePassed(1)]);

    // Once past, the pair never scores again.
    for _ in 0..60 {
        let input = keep_aloft(&state);
        tick(&mut state, &input);
    }
    assert_that(&state.session.score).is_equal_to(1.0);
}

#[test]
fn test_pipes_are_culled_off_screen() {
    let mut state = GameState::new(GameConfig::default());
    let mut first = press(space());
    first.spawn_anchor = Some(600.0);
    tick(&mut state, &first);

    // Center starts at 700, right edge at 752; 4 units per tick.
    for _ in 1..189 {
        let input = keep_aloft(&state);
        tick(&mut state, &input);
    }
    assert_that(&state.pipes).is_empty();
}

#[test]
fn test_restart_resets_attempt_and_keeps_high_score() {
    let mut state = GameState::new(GameConfig::default());
    let mut first = press(space());
    first.spawn_anchor = Some(600.0);
    tick(&mut state, &first);
    for _ in 1..160 {
        let input = keep_aloft(&state);
        tick(&mut state, &input);
    }
    while state.session.active {
        tick(&mut state, &TickInput::default());
    }
    assert_that(&state.high_score()).is_equal_to(1);

    let events = tick(&mut state, &press(space()));
    assert_eq!(events, vec![GameEvent::AttemptStarted(2), GameEvent::Flapped]);
    assert_that(&state.session.attempt_id).is_equal_to(2);
    assert_that(&state.session.score).is_equal_to(0.0);
    assert_that(&state.pipes).is_empty();
    assert_that(&state.bird.x).is_equal_to(100.0);
    assert_that(&state.bird.y).is_close_to(504.25, 1e-9);

    while state.session.active {
        tick(&mut state, &TickInput::default());
    }
    assert_that(&state.score()).is_equal_to(0);
    assert_that(&state.high_score()).is_equal_to(1);
}

#[test]
fn test_presses_while_active_are_logged() {
    let mut state = GameState::new(GameConfig::default());
    tick(&mut state, &press(space()));
    let events = tick(
        &mut state,
        &TickInput {
            presses: vec![Press::Flap("MOUSE_CLICK".into()), Press::Other("UP".into())],
            spawn_anchor: None,
        },
    );
    assert_eq!(
        events,
        vec![
            GameEvent::KeyPress("MOUSE_CLICK".into()),
            GameEvent::Flapped,
            GameEvent::KeyPress("UP".into()),
        ]
    );
}

#[test]
fn test_flying_into_a_pipe_ends_the_attempt_once() {
    let mut state = GameState::new(GameConfig::default());
    // Bottom pipe starts at y=400, below the band the bird flaps in.
    let mut first = press(space());
    first.spawn_anchor = Some(400.0);
    tick(&mut state, &first);

    let mut seen = Vec::new();
    let mut ticks = 1;
    while state.session.active && ticks < 400 {
        let input = keep_aloft(&state);
        seen.extend(collisions(&tick(&mut state, &input)));
        ticks += 1;
    }
    assert_eq!(seen, vec![CollisionKind::Pipe]);
    assert_that(&state.session.active).is_false();
    assert_that(&state.pipes).has_length(2);

    for _ in 0..50 {
        assert_that(&collisions(&tick(&mut state, &TickInput::default()))).is_empty();
    }
}

#[test]
fn test_pipe_wins_over_floor_on_the_same_tick() {
    let mut state = GameState::new(GameConfig::default());
    tick(&mut state, &press(space()));
    state.bird.y = 890.0;
    state.bird.vy = 0.0;
    state.pipes.push(Pipe {
        rect: Rect::new(90.0, 850.0, 104.0, 640.0),
        side: PipeSide::Bottom,
    });

    let events = tick(&mut state, &TickInput::default());
    assert_that(&state.bird.rect().bottom()).is_greater_than_or_equal_to(900.0);
    assert_eq!(events, vec![GameEvent::Collision(CollisionKind::Pipe)]);
}
