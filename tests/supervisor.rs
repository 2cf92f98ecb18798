use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use flappy_trail::error::StoreError;
use flappy_trail::metadata::SessionMetadata;
use flappy_trail::supervisor::{
    COMMENTS_KEY, DirStore, FlagStore, GAME_ON_KEY, GameProcess, HEARTBEAT_KEY, Launcher, PollAction,
    SIMULATOR_RUN_KEY, SUBJECT_ID_KEY, StopKind, Supervisor,
};
use pretty_assertions::assert_eq;
use speculoos::prelude::*;

#[derive(Default)]
struct MemStore(HashMap<String, String>);

impl FlagStore for MemStore {
    fn get(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.0.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.0.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ProcState {
    running: bool,
    ignores_stop: bool,
    stop_requests: u32,
    kills: u32,
    waits: u32,
}

struct FakeProcess(Rc<RefCell<ProcState>>);

impl GameProcess for FakeProcess {
    fn is_running(&mut self) -> bool {
        self.0.borrow().running
    }

    fn request_stop(&mut self) -> io::Result<()> {
        let mut state = self.0.borrow_mut();
        state.stop_requests += 1;
        if !state.ignores_stop {
            state.running = false;
        }
        Ok(())
    }

    fn kill(&mut self) -> io::Result<()> {
        let mut state = self.0.borrow_mut();
        state.kills += 1;
        state.running = false;
        Ok(())
    }

    fn wait(&mut self) -> io::Result<()> {
        self.0.borrow_mut().waits += 1;
        Ok(())
    }
}

type Launched = Rc<RefCell<Vec<(SessionMetadata, Rc<RefCell<ProcState>>)>>>;

#[derive(Default)]
struct FakeLauncher {
    ignores_stop: bool,
    launched: Launched,
}

impl Launcher for FakeLauncher {
    type Process = FakeProcess;

    fn launch(&mut self, meta: &SessionMetadata) -> io::Result<FakeProcess> {
        let state = Rc::new(RefCell::new(ProcState {
            running: true,
            ignores_stop: self.ignores_stop,
            ..ProcState::default()
        }));
        self.launched.borrow_mut().push((meta.clone(), state.clone()));
        Ok(FakeProcess(state))
    }
}

fn supervisor(ignores_stop: bool) -> (Supervisor<MemStore, FakeLauncher>, Launched) {
    let launcher = FakeLauncher {
        ignores_stop,
        ..FakeLauncher::default()
    };
    let launched = launcher.launched.clone();
    let mut sup = Supervisor::new(MemStore::default(), launcher, Duration::from_millis(50));
    let store = sup.store();
    store.set(SUBJECT_ID_KEY, "S07").unwrap();
    store.set(SIMULATOR_RUN_KEY, "R3").unwrap();
    store.set(COMMENTS_KEY, "remote").unwrap();
    (sup, launched)
}

#[test]
fn test_flag_cycle_starts_and_stops_one_game() {
    let (mut sup, launched) = supervisor(false);

    assert_that(&sup.poll_once().unwrap()).is_equal_to(PollAction::Idle);
    assert_that(&*launched.borrow()).is_empty();

    sup.store().set(GAME_ON_KEY, "true").unwrap();
    assert_that(&sup.poll_once().unwrap()).is_equal_to(PollAction::Started);
    assert_that(&sup.poll_once().unwrap()).is_equal_to(PollAction::Idle);
    assert_that(&sup.store().get(HEARTBEAT_KEY).unwrap()).is_some();

    sup.store().set(GAME_ON_KEY, "0").unwrap();
    assert_that(&sup.poll_once().unwrap()).is_equal_to(PollAction::Stopped(StopKind::Graceful));
    assert_that(&sup.poll_once().unwrap()).is_equal_to(PollAction::Idle);

    let launched = launched.borrow();
    assert_that(&*launched).has_length(1);
    let (meta, state) = &launched[0];
    assert_eq!(*meta, SessionMetadata::new("S07", "R3", "remote"));
    let state = state.borrow();
    assert_that(&state.running).is_false();
    assert_that(&state.stop_requests).is_equal_to(1);
    assert_that(&state.kills).is_equal_to(0);
    assert_that(&state.waits).is_equal_to(1);
}

#[test]
fn test_unresponsive_game_is_killed_after_grace() {
    let (mut sup, launched) = supervisor(true);

    sup.store().set(GAME_ON_KEY, "YES").unwrap();
    assert_that(&sup.poll_once().unwrap()).is_equal_to(PollAction::Started);
    sup.store().set(GAME_ON_KEY, "no").unwrap();
    assert_that(&sup.poll_once().unwrap()).is_equal_to(PollAction::Stopped(StopKind::Killed));
    assert_that(&sup.is_running()).is_false();

    let launched = launched.borrow();
    let state = launched[0].1.borrow();
    assert_that(&state.stop_requests).is_equal_to(1);
    assert_that(&state.kills).is_equal_to(1);
    assert_that(&state.waits).is_equal_to(1);
}

#[test]
fn test_game_that_exits_is_reaped_and_relaunched() {
    let (mut sup, launched) = supervisor(false);

    sup.store().set(GAME_ON_KEY, "1").unwrap();
    assert_that(&sup.poll_once().unwrap()).is_equal_to(PollAction::Started);
    launched.borrow()[0].1.borrow_mut().running = false;

    assert_that(&sup.poll_once().unwrap()).is_equal_to(PollAction::Started);
    let launched = launched.borrow();
    assert_that(&*launched).has_length(2);
    assert_that(&launched[0].1.borrow().waits).is_equal_to(1);
}

#[test]
fn test_no_heartbeat_without_a_game() {
    let (mut sup, _) = supervisor(false);
    sup.poll_once().unwrap();
    assert_that(&sup.store().get(HEARTBEAT_KEY).unwrap()).is_none();
}

/// Accepts every key except the heartbeat, like a flag mount that went read-only.
#[derive(Default)]
struct ReadOnlyHeartbeat(MemStore);

impl FlagStore for ReadOnlyHeartbeat {
    fn get(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        self.0.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if key == HEARTBEAT_KEY {
            return Err(StoreError::Write {
                key: key.to_owned(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            });
        }
        self.0.set(key, value)
    }
}

#[test]
fn test_failed_heartbeat_does_not_block_stop() {
    let launcher = FakeLauncher::default();
    let launched = launcher.launched.clone();
    let mut sup = Supervisor::new(ReadOnlyHeartbeat::default(), launcher, Duration::from_millis(50));

    sup.store().set(GAME_ON_KEY, "1").unwrap();
    assert_that(&sup.poll_once().unwrap()).is_equal_to(PollAction::Started);
    assert_that(&sup.poll_once().unwrap()).is_equal_to(PollAction::Idle);

    sup.store().set(GAME_ON_KEY, "0").unwrap();
    assert_that(&sup.poll_once().unwrap()).is_equal_to(PollAction::Stopped(StopKind::Graceful));
    assert_that(&launched.borrow()[0].1.borrow().running).is_false();
}

#[test]
fn test_dir_store_reads_trimmed_values() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = DirStore::new(dir.path());

    assert_that(&store.get(GAME_ON_KEY).unwrap()).is_none();

    store.set(GAME_ON_KEY, "true").unwrap();
    assert_that(&store.get(GAME_ON_KEY).unwrap()).is_equal_to(Some("true".to_owned()));

    fs::write(store.path_for(SUBJECT_ID_KEY), "  S09\n").unwrap();
    assert_that(&store.get(SUBJECT_ID_KEY).unwrap()).is_equal_to(Some("S09".to_owned()));
}

#[test]
fn test_dir_store_drives_supervisor() {
    let dir = tempfile::tempdir().unwrap();
    let launcher = FakeLauncher::default();
    let launched = launcher.launched.clone();
    let mut sup = Supervisor::new(DirStore::new(dir.path()), launcher, Duration::from_millis(50));

    fs::write(dir.path().join("flappy_bird_game_on"), "1\n").unwrap();
    assert_that(&sup.poll_once().unwrap()).is_equal_to(PollAction::Started);
    sup.poll_once().unwrap();
    let beat: f64 = fs::read_to_string(dir.path().join("flappy_bird_heartbeat_time"))
        .unwrap()
        .parse()
        .unwrap();
    assert_that(&beat).is_greater_than(0.0);

    // Missing metadata keys launch with empty values.
    assert_eq!(launched.borrow()[0].0, SessionMetadata::default());
}

#[cfg(unix)]
#[test]
fn test_child_process_stops_on_request() {
    let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
    assert_that(&GameProcess::is_running(&mut child)).is_true();
    GameProcess::request_stop(&mut child).unwrap();
    GameProcess::wait(&mut child).unwrap();
    assert_that(&GameProcess::is_running(&mut child)).is_false();
}
