//! The fixed-tick loop: input, timers, rules, sound, trail, render.

use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use tracing::{debug, info};

use crate::audio::{Sfx, SoundOutput};
use crate::config::{DEBUG_OVERLAY_MS, PIPE_SPAWN_PERIOD, WING_PERIOD};
use crate::error::GameResult;
use crate::game::{GameEvent, GameState, Press, TickInput, tick};
use crate::logger::{EventKind, EventLogger};
use crate::physics::PipeSpawner;
use crate::platform;
use crate::render::Renderer;
use crate::timer::IntervalTimer;

// ── Input ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Press(Press),
    /// Leave the game. Carries the key name when the key should be logged.
    Quit(Option<String>),
    Resize(u16, u16),
}

/// Trail name of a key: upper case, `SPACE` for the space bar.
pub fn key_name(code: KeyCode) -> String {
    match code {
        KeyCode::Char(' ') => "SPACE".to_owned(),
        KeyCode::Char(c) => c.to_uppercase().to_string(),
        KeyCode::Esc => "ESCAPE".to_owned(),
        KeyCode::Enter => "RETURN".to_owned(),
        KeyCode::F(n) => format!("F{n}"),
        other => format!("{other:?}").to_uppercase(),
    }
}

pub fn map_event(ev: &Event) -> Option<Input> {
    match ev {
        Event::Key(KeyEvent { kind: KeyEventKind::Release, .. }) => None,
        Event::Key(KeyEvent { code, modifiers, .. }) => Some(match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Input::Quit(None),
            KeyCode::Esc => Input::Quit(Some(key_name(*code))),
            KeyCode::Char(' ') => Input::Press(Press::Flap(key_name(*code))),
            _ => Input::Press(Press::Other(key_name(*code))),
        }),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::Down(_) => Some(Input::Press(Press::Flap("MOUSE_CLICK".to_owned()))),
            _ => None,
        },
        Event::Resize(cols, rows) => Some(Input::Resize(*cols, *rows)),
        _ => None,
    }
}

// ── Event routing ───────────────────────────────────────────────────────────

/// Turns the rules' events into sounds and trail rows.
pub fn dispatch(events: &[GameEvent], logger: &mut EventLogger, sound: &impl SoundOutput) {
    for event in events {
        match event {
            GameEvent::KeyPress(name) => logger.record(EventKind::KeyPress, Some(name.as_str())),
            GameEvent::Flapped => sound.play(Sfx::Flap),
            GameEvent::AttemptStarted(attempt) => {
                logger.set_attempt(*attempt);
                info!(attempt, "Attempt started");
            }
            GameEvent::Collision(kind) => {
                sound.play(Sfx::Hit);
                logger.record(EventKind::Collision, Some(kind.as_str()));
                info!(attempt = logger.attempt_id(), %kind, "Collision");
            }
            GameEvent::PipePassed(score) => {
                sound.play(Sfx::Point);
                logger.record(EventKind::PipePassed, Some(score.to_string().as_str()));
                debug!(score, "Pipe passed");
            }
        }
    }
}

// ── Loop ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    pub fps: u32,
    pub debug_overlay: bool,
}

pub struct App<S: SoundOutput> {
    state: GameState,
    logger: EventLogger,
    sound: S,
    renderer: Renderer,
    spawner: PipeSpawner,
    spawn_timer: IntervalTimer,
    wing_timer: IntervalTimer,
    wing_frame: u8,
    frame_dur: Duration,
    debug_overlay: bool,
}

impl<S: SoundOutput> App<S> {
    pub fn new(
        state: GameState,
        logger: EventLogger,
        sound: S,
        spawner: PipeSpawner,
        settings: LoopSettings,
        (cols, rows): (u16, u16),
    ) -> Self {
        let now = Instant::now();
        Self {
            state,
            logger,
            sound,
            renderer: Renderer::new(cols, rows),
            spawner,
            spawn_timer: IntervalTimer::new(PIPE_SPAWN_PERIOD, now),
            wing_timer: IntervalTimer::new(WING_PERIOD, now),
            wing_frame: 0,
            frame_dur: Duration::from_secs_f64(1.0 / settings.fps.max(1) as f64),
            debug_overlay: settings.debug_overlay,
        }
    }

    /// Runs until the player quits or the process is asked to terminate.
    ///
    /// The trail ends with `QUIT` even when the terminal fails mid-game.
    pub fn run(&mut self, out: &mut impl Write) -> GameResult<()> {
        let outcome = self.frames(out);
        let key = match &outcome {
            Ok(key) => key.as_deref(),
            Err(_) => None,
        };
        self.quit(key);
        outcome.map(|_| ())
    }

    /// Returns the key to log when the loop ended on a quit key.
    fn frames(&mut self, out: &mut impl Write) -> GameResult<Option<String>> {
        loop {
            let frame_start = Instant::now();

            // Input
            let mut input = TickInput::default();
            let mut quit = None;
            while event::poll(Duration::ZERO)? {
                match map_event(&event::read()?) {
                    Some(Input::Press(press)) => input.presses.push(press),
                    Some(Input::Quit(key)) => {
                        quit = Some(key);
                        break;
                    }
                    Some(Input::Resize(cols, rows)) => self.renderer.resize(cols, rows),
                    None => {}
                }
            }
            if quit.is_none() && platform::termination_requested() {
                info!("Termination requested");
                quit = Some(None);
            }

            // Timers
            let now = Instant::now();
            if self.spawn_timer.poll(now) {
                input.spawn_anchor = Some(self.spawner.next_anchor(&self.state.config));
            }
            if self.wing_timer.poll(now) {
                self.wing_frame = (self.wing_frame + 1) % 3;
            }

            // Update
            let events = tick(&mut self.state, &input);
            dispatch(&events, &mut self.logger, &self.sound);

            if let Some(key) = quit {
                return Ok(key);
            }

            // Render
            self.renderer.draw(&self.state, self.wing_frame);
            let overlay = self.overlay();
            self.renderer.present(out, overlay.as_deref())?;

            // Frame pacing
            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_dur {
                thread::sleep(self.frame_dur - elapsed);
            }
        }
    }

    fn quit(&mut self, key: Option<&str>) {
        if self.state.session.active
            && let Some(key) = key
        {
            self.logger.record(EventKind::KeyPress, Some(key));
        }
        self.logger.record(EventKind::Quit, None);
        self.logger.close();
        info!(
            attempts = self.state.session.attempt_id,
            high_score = self.state.high_score(),
            "Session ended"
        );
    }

    fn overlay(&self) -> Option<String> {
        if !self.debug_overlay {
            return None;
        }
        let (message, at) = self.logger.last_event()?;
        (self.logger.elapsed_ms().saturating_sub(at) <= DEBUG_OVERLAY_MS).then(|| message.to_owned())
    }
}
