//! Per-tick game rules: the attempt state machine, collisions and scoring.
//!
//! Nothing here touches the terminal, the clock or the disk. The loop feeds a
//! [`TickInput`] into [`tick`] and acts on the [`GameEvent`]s it returns.

use std::fmt;

use crate::config::GameConfig;
use crate::physics::{Bird, Pipe, advance_pipes, pipe_pair};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionKind {
    Pipe,
    Ceiling,
    Floor,
}

impl CollisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionKind::Pipe => "pipe",
            CollisionKind::Ceiling => "ceiling",
            CollisionKind::Floor => "floor",
        }
    }
}

impl fmt::Display for CollisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key or pointer press, named the way it is written to the trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Press {
    /// Space or pointer press: flaps while active, restarts while inactive.
    Flap(String),
    /// Any other key. Only logged.
    Other(String),
}

impl Press {
    pub fn name(&self) -> &str {
        match self {
            Press::Flap(name) | Press::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// A press while an attempt was running.
    KeyPress(String),
    Flapped,
    AttemptStarted(u32),
    Collision(CollisionKind),
    /// A full pipe pair was passed; carries the new integer score.
    PipePassed(u32),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    pub presses: Vec<Press>,
    /// Set when the spawn timer fired this tick.
    pub spawn_anchor: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Session {
    pub active: bool,
    /// Grows by 0.5 per pipe crossed, so a pair is worth 1.
    pub score: f64,
    pub high_score: f64,
    pub attempt_id: u32,
}

#[derive(Debug, Clone)]
pub struct GameState {
    pub config: GameConfig,
    pub bird: Bird,
    pub pipes: Vec<Pipe>,
    pub session: Session,
}

impl GameState {
    pub fn new(config: GameConfig) -> Self {
        Self {
            bird: Bird::new(&config),
            pipes: Vec::new(),
            session: Session::default(),
            config,
        }
    }

    fn press(&mut self, press: &Press, events: &mut Vec<GameEvent>) {
        if self.session.active {
            events.push(GameEvent::KeyPress(press.name().to_owned()));
            if let Press::Flap(_) = press {
                self.bird.flap(&self.config);
                events.push(GameEvent::Flapped);
            }
            return;
        }

        if let Press::Flap(_) = press {
            self.restart();
            events.push(GameEvent::AttemptStarted(self.session.attempt_id));
            events.push(GameEvent::Flapped);
        }
    }

    /// Starts a new attempt. The restart press doubles as the first flap.
    fn restart(&mut self) {
        self.pipes.clear();
        self.bird.reset(&self.config);
        self.bird.flap(&self.config);
        self.session.score = 0.0;
        self.session.active = true;
        self.session.attempt_id += 1;
    }

    fn collision(&self) -> Option<CollisionKind> {
        let bird = self.bird.rect();
        if self.pipes.iter().any(|p| bird.intersects(&p.rect)) {
            return Some(CollisionKind::Pipe);
        }
        if bird.top() <= self.config.ceiling_y {
            return Some(CollisionKind::Ceiling);
        }
        if bird.bottom() >= self.config.floor_y {
            return Some(CollisionKind::Floor);
        }
        None
    }

    fn end_attempt(&mut self, kind: CollisionKind, events: &mut Vec<GameEvent>) {
        self.session.active = false;
        self.session.high_score = self.session.high_score.max(self.session.score);
        events.push(GameEvent::Collision(kind));
    }

    fn score_crossings(&mut self, events: &mut Vec<GameEvent>) {
        let bird_x = self.config.bird_x;
        let speed = self.config.pipe_speed;
        for pipe in &self.pipes {
            let cx = pipe.rect.center_x();
            // Half-open window: the center moved past the bird during this tick.
            if cx <= bird_x && bird_x < cx + speed {
                self.session.score += 0.5;
                if self.session.score.fract() == 0.0 {
                    events.push(GameEvent::PipePassed(self.session.score as u32));
                }
            }
        }
    }

    pub fn score(&self) -> u32 {
        self.session.score as u32
    }

    pub fn high_score(&self) -> u32 {
        self.session.high_score as u32
    }
}

/// Advances the game by one tick.
pub fn tick(state: &mut GameState, input: &TickInput) -> Vec<GameEvent> {
    let mut events = Vec::new();

    for press in &input.presses {
        state.press(press, &mut events);
    }

    if !state.session.active {
        return events;
    }

    if let Some(anchor) = input.spawn_anchor {
        state.pipes.extend(pipe_pair(&state.config, anchor));
    }

    state.bird.fall(&state.config);

    if let Some(kind) = state.collision() {
        state.end_attempt(kind, &mut events);
        return events;
    }

    advance_pipes(&mut state.pipes, state.config.pipe_speed);
    state.score_crossings(&mut events);

    events
}
