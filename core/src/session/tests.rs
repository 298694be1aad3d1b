//! Tests for the session controller

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Duration, TimeZone, Utc};
use retrogbm_shared::{
    CheatCode, CheatError, FormatError, ProfileCheatCode, ProfileData, ProfileGameData,
    SaveStateHeader, read_header, rom_checksum,
};

use super::*;
use crate::clock::ManualClock;
use crate::config::EmulationConfig;
use crate::engine::JoypadButton;
use crate::layout::DataLayout;
use crate::profile_store::ProfileStore;
use crate::slots::AUTOSAVE_SLOT;
use crate::test_utils::MockEngine;

const ROM: &[u8] = b"\x00\xc3\x50\x01fake cartridge";
const FILE_NAME: &str = "Tetris.gb";

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 8, 20, 10, 0, 0).unwrap()
}

fn controller(root: &Path) -> (SessionController<MockEngine>, Arc<ManualClock>) {
    controller_with(root, MockEngine::with_memory(b"memory-a"))
}

fn controller_with(
    root: &Path,
    engine: MockEngine,
) -> (SessionController<MockEngine>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(t0()));
    let session = SessionController::new(engine, DataLayout::new(root)).with_clock(clock.clone());
    (session, clock)
}

fn loaded(root: &Path) -> (SessionController<MockEngine>, Arc<ManualClock>) {
    let (mut session, clock) = controller(root);
    session.load_rom(FILE_NAME, ROM, true).unwrap();
    (session, clock)
}

fn stored_profile(root: &Path) -> ProfileData {
    ProfileStore::new(DataLayout::new(root).profile_path()).load()
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + StdDuration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(StdDuration::from_millis(5));
    }
    false
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn empty_rom_is_rejected_before_any_change() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _clock) = controller(dir.path());

    let err = session.load_rom(FILE_NAME, &[], true).unwrap_err();
    assert!(matches!(err, SessionError::EmptyRom));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.session().is_none());
    assert!(!dir.path().join("RomData").exists());
    assert!(!dir.path().join("profile.json").exists());
}

#[test]
fn load_rom_prepares_session() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _clock) = controller(dir.path());
    session.set_sound_enabled(false);
    session.load_rom(FILE_NAME, ROM, true).unwrap();

    assert_eq!(session.state(), SessionState::Loaded);
    let info = session.session().unwrap();
    assert_eq!(info.file_name, FILE_NAME);
    assert_eq!(info.checksum, rom_checksum(ROM));
    assert_eq!(info.time_started, t0());
    assert!(!info.running);

    assert!(dir.path().join("RomData").is_dir());
    assert!(dir.path().join("profile.json").exists());

    session.with_engine(|engine| {
        assert_eq!(engine.rom, ROM);
        assert!(engine.skip_boot_rom);
        assert!(!engine.audio_enabled);
        assert_eq!(
            engine.battery_path.as_deref(),
            Some(dir.path().join("RomData").join("Tetris.gb.save").as_path())
        );
    });
}

#[test]
fn config_options_apply_to_opened_rom() {
    let dir = tempfile::tempdir().unwrap();
    let rom_path = dir.path().join("Zelda.gbc");
    fs::write(&rom_path, ROM).unwrap();

    let (mut session, _clock) = controller(dir.path());
    session.apply_config(&EmulationConfig {
        skip_boot_rom: false,
        enable_sound: false,
    });
    session.open_rom(&rom_path).unwrap();

    assert_eq!(session.session().unwrap().file_name, "Zelda.gbc");
    session.with_engine(|engine| {
        assert!(!engine.skip_boot_rom);
        assert!(!engine.audio_enabled);
    });
}

#[test]
fn load_rom_file_uses_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let rom_path = dir.path().join("Pokemon Red.gb");
    fs::write(&rom_path, ROM).unwrap();

    let (mut session, _clock) = controller(dir.path());
    session.load_rom_file(&rom_path, false).unwrap();
    assert_eq!(session.session().unwrap().file_name, "Pokemon Red.gb");

    let (mut other, _clock) = controller(dir.path());
    let err = other
        .load_rom_file(&dir.path().join("missing.gb"), false)
        .unwrap_err();
    assert!(matches!(err, SessionError::RomRead(_)));
    assert_eq!(other.state(), SessionState::Idle);
}

#[test]
fn engine_load_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine {
        fail_load: true,
        ..MockEngine::default()
    };
    let (mut session, _clock) = controller_with(dir.path(), engine);

    let err = session.load_rom(FILE_NAME, ROM, true).unwrap_err();
    assert!(matches!(err, SessionError::Engine(_)));
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn cheats_restored_by_checksum_start_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut profile = ProfileData::default();
    let mut game = ProfileGameData::new("renamed.gb", &rom_checksum(ROM));
    game.cheats.push(ProfileCheatCode {
        name: "Infinite lives".to_string(),
        code: "010A3FC6\r\n01FF40C6".to_string(),
    });
    profile.game_data.push(game);
    ProfileStore::new(dir.path().join("profile.json"))
        .save(&profile)
        .unwrap();

    let (session, _clock) = loaded(dir.path());
    let cheats = session.cheats();
    assert_eq!(cheats.len(), 1);
    assert_eq!(cheats[0].name, "Infinite lives");
    assert_eq!(cheats[0].lines, vec!["010A3FC6", "01FF40C6"]);
    assert!(!cheats[0].enabled);
}

#[test]
fn operations_without_rom() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _clock) = controller(dir.path());

    assert!(matches!(session.start(), Err(SessionError::NoRomLoaded)));
    assert!(matches!(session.quick_save(), Err(SessionError::NoRomLoaded)));
    assert!(matches!(session.quick_load(), Err(SessionError::NoRomLoaded)));
    assert!(matches!(
        session.take_screenshot(),
        Err(SessionError::NoRomLoaded)
    ));

    let report = session.on_suspend();
    assert!(matches!(report.save_state, Err(SessionError::NoRomLoaded)));
    assert!(matches!(report.profile, Err(SessionError::NoRomLoaded)));

    // Stopping an idle session is harmless.
    session.stop();
    assert_eq!(session.state(), SessionState::Idle);
}

// ============================================================================
// Execution
// ============================================================================

#[test]
fn lifecycle_transitions() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _clock) = loaded(dir.path());

    session.start().unwrap();
    assert_eq!(session.state(), SessionState::Running);
    assert!(session.session().unwrap().running);
    assert!(wait_for(|| session.with_engine(|e| e.ticks > 0)));

    // Starting again does not spawn a second thread.
    session.start().unwrap();
    assert_eq!(session.state(), SessionState::Running);

    session.pause().unwrap();
    assert_eq!(session.state(), SessionState::Paused);
    assert!(session.with_engine(|e| e.paused));

    session.resume().unwrap();
    assert_eq!(session.state(), SessionState::Running);
    assert!(!session.with_engine(|e| e.paused));

    session.pause().unwrap();
    session.start().unwrap();
    assert_eq!(session.state(), SessionState::Running);

    session.stop();
    assert_eq!(session.state(), SessionState::Stopped);
    assert!(!session.session().unwrap().running);
}

#[test]
fn paused_loop_does_not_tick() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _clock) = loaded(dir.path());

    session.start().unwrap();
    assert!(wait_for(|| session.with_engine(|e| e.ticks > 0)));
    session.pause().unwrap();

    thread::sleep(StdDuration::from_millis(20));
    let before = session.with_engine(|e| e.ticks);
    thread::sleep(StdDuration::from_millis(50));
    assert_eq!(session.with_engine(|e| e.ticks), before);

    session.resume().unwrap();
    assert!(wait_for(|| session.with_engine(|e| e.ticks > before)));
}

#[test]
fn stop_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _clock) = loaded(dir.path());
    session.start().unwrap();

    session.stop();
    session.stop();
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(session.with_engine(|e| e.stop_calls), 1);

    assert!(matches!(
        session.start(),
        Err(SessionError::InvalidState {
            state: SessionState::Stopped,
            ..
        })
    ));
    assert!(matches!(
        session.pause(),
        Err(SessionError::InvalidState { .. })
    ));
}

#[test]
fn stop_while_paused_joins_loop() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _clock) = loaded(dir.path());
    session.start().unwrap();
    session.pause().unwrap();

    session.stop();
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(session.with_engine(|e| e.stop_calls), 1);
}

#[test]
fn stop_without_start() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _clock) = loaded(dir.path());
    session.stop();
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(session.with_engine(|e| e.stop_calls), 1);
}

#[test]
fn load_rom_while_running_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _clock) = loaded(dir.path());
    session.start().unwrap();

    let err = session.load_rom("Other.gb", ROM, true).unwrap_err();
    assert!(matches!(err, SessionError::InvalidState { .. }));
    assert_eq!(session.session().unwrap().file_name, FILE_NAME);
}

// ============================================================================
// Save states
// ============================================================================

#[test]
fn save_state_writes_header_and_payload() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, clock) = loaded(dir.path());
    session.start().unwrap();
    clock.advance(Duration::seconds(90));

    let path = session.save_state("Slot 1").unwrap();
    assert_eq!(
        path,
        dir.path()
            .join("SaveStates")
            .join(FILE_NAME)
            .join("Slot 1.state")
    );

    let bytes = fs::read(&path).unwrap();
    let header = SaveStateHeader::decode(&bytes).unwrap();
    assert_eq!(header.date_created, (t0() + Duration::seconds(90)).timestamp());
    assert_eq!(header.date_modified, header.date_created);
    assert_eq!(header.time_played, 90.0);
    assert_eq!(&bytes[64..], b"memory-a");
    assert!(!path.with_file_name("Slot 1.state.tmp").exists());
}

#[test]
fn overwriting_slot_keeps_creation_date() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, clock) = loaded(dir.path());
    session.start().unwrap();

    let path = session.save_state("Slot 1").unwrap();
    let first = read_header(&path).unwrap().unwrap();

    clock.advance(Duration::seconds(60));
    session.save_state("Slot 1").unwrap();
    let second = read_header(&path).unwrap().unwrap();

    assert_eq!(second.date_created, first.date_created);
    assert_eq!(second.date_modified, first.date_modified + 60);
    assert_eq!(second.time_played, 60.0);
}

#[test]
fn paused_time_is_not_played_time() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, clock) = loaded(dir.path());

    session.start().unwrap();
    clock.advance(Duration::seconds(30));
    session.pause().unwrap();
    clock.advance(Duration::seconds(600));

    let path = session.save_state("Slot 2").unwrap();
    assert_eq!(read_header(&path).unwrap().unwrap().time_played, 30.0);
}

#[test]
fn load_state_restores_payload_and_rebases_clock() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, clock) = loaded(dir.path());
    session.start().unwrap();
    clock.advance(Duration::seconds(120));
    session.save_state("Slot 1").unwrap();

    session.with_engine(|e| e.memory = b"changed".to_vec());
    clock.advance(Duration::seconds(500));
    session.load_state("Slot 1").unwrap();

    assert_eq!(session.with_engine(|e| e.memory.clone()), b"memory-a");
    let now = t0() + Duration::seconds(620);
    assert_eq!(session.session().unwrap().play_seconds(now), 120.0);
}

#[test]
fn load_missing_or_corrupt_state() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _clock) = loaded(dir.path());

    assert!(matches!(
        session.load_state("Slot 4"),
        Err(SessionError::NoSaveState { slot }) if slot == "Slot 4"
    ));

    let state_dir = session.save_state_dir().unwrap();
    fs::create_dir_all(&state_dir).unwrap();
    fs::write(state_dir.join("Slot 5.state"), [0u8; 10]).unwrap();
    assert!(matches!(
        session.load_state("Slot 5"),
        Err(SessionError::SaveStateFormat(FormatError::Truncated { len: 10 }))
    ));

    fs::write(state_dir.join("Slot 6.state"), [0u8; 80]).unwrap();
    assert!(matches!(
        session.load_state("Slot 6"),
        Err(SessionError::SaveStateFormat(FormatError::Malformed))
    ));
}

#[test]
fn quick_save_rotates_and_quick_load_uses_latest() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, clock) = loaded(dir.path());

    assert!(matches!(
        session.quick_load(),
        Err(SessionError::NoSaveState { .. })
    ));

    let mut written = Vec::new();
    for i in 0..4u8 {
        session.with_engine(|e| e.memory = vec![i]);
        written.push(session.quick_save().unwrap());
        clock.advance(Duration::seconds(10));
    }

    let names: Vec<_> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        [
            "Quick Save 1.state",
            "Quick Save 2.state",
            "Quick Save 3.state",
            "Quick Save 1.state"
        ]
    );

    session.with_engine(|e| e.memory = b"scratch".to_vec());
    session.quick_load().unwrap();
    assert_eq!(session.with_engine(|e| e.memory.clone()), vec![3]);
}

#[test]
fn quick_save_cursor_resumes_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    {
        let (mut session, clock) = loaded(dir.path());
        session.quick_save().unwrap();
        clock.advance(Duration::seconds(10));
        session.quick_save().unwrap();
    }

    let (mut session, _clock) = controller(dir.path());
    session.load_rom(FILE_NAME, ROM, true).unwrap();
    let path = session.quick_save().unwrap();
    assert!(path.ends_with("Quick Save 3.state"));
}

#[test]
fn save_failure_keeps_session_running() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _clock) = loaded(dir.path());
    session.start().unwrap();
    session.with_engine(|e| e.fail_save = true);

    assert!(matches!(session.quick_save(), Err(SessionError::Engine(_))));
    assert!(matches!(session.save_state("Slot 1"), Err(SessionError::Engine(_))));
    assert_eq!(session.state(), SessionState::Running);

    // No partial files are left behind.
    let state_dir = session.save_state_dir().unwrap();
    let leftovers: Vec<_> = fs::read_dir(&state_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");

    // The failed write did not advance the rotation.
    session.with_engine(|e| e.fail_save = false);
    let path = session.quick_save().unwrap();
    assert!(path.ends_with("Quick Save 1.state"));
}

#[test]
fn slot_names_must_stay_in_state_dir() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _clock) = loaded(dir.path());

    for slot in ["../../profile", "nested/slot", "..", "", "a\\b"] {
        assert!(
            matches!(session.save_state(slot), Err(SessionError::InvalidSlot { .. })),
            "{slot:?} was accepted for saving"
        );
        assert!(
            matches!(session.load_state(slot), Err(SessionError::InvalidSlot { .. })),
            "{slot:?} was accepted for loading"
        );
    }
    assert!(!dir.path().join("profile.state").exists());
    assert!(session.save_state("Slot 1").is_ok());
}

// ============================================================================
// Checkpoints
// ============================================================================

#[test]
fn suspend_autosaves_and_credits_minutes() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, clock) = loaded(dir.path());
    session.start().unwrap();
    clock.advance(Duration::seconds(5 * 60 + 30));

    let report = session.on_suspend();
    assert!(report.is_ok());
    assert_eq!(session.state(), SessionState::Paused);

    let autosave = report.save_state.unwrap();
    assert!(autosave.ends_with(format!("{AUTOSAVE_SLOT}.state")));
    assert_eq!(read_header(&autosave).unwrap().unwrap().time_played, 330.0);

    let profile = stored_profile(dir.path());
    let game = profile.find_by_file_name(FILE_NAME).unwrap();
    assert_eq!(game.total_play_time_minutes, 5);
    assert_eq!(game.last_played, Some(t0()));
    assert_eq!(game.checksum, rom_checksum(ROM));
}

#[test]
fn resume_after_suspend_restarts_session_clock() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, clock) = loaded(dir.path());
    session.start().unwrap();
    clock.advance(Duration::minutes(5));
    assert!(session.on_suspend().is_ok());

    // An hour in the background is not play time.
    clock.advance(Duration::hours(1));
    session.on_resume().unwrap();
    assert_eq!(session.state(), SessionState::Running);
    let resumed_at = t0() + Duration::minutes(65);
    assert_eq!(session.session().unwrap().time_started, resumed_at);

    clock.advance(Duration::minutes(2));
    let report = session.on_terminate();
    assert!(report.is_ok());
    assert_eq!(session.state(), SessionState::Stopped);

    let profile = stored_profile(dir.path());
    let game = profile.find_by_file_name(FILE_NAME).unwrap();
    assert_eq!(game.total_play_time_minutes, 7);
    assert_eq!(game.last_played, Some(resumed_at));
    assert_eq!(profile.game_data.len(), 1);
}

#[test]
fn terminate_while_suspended_ignores_background_time() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, clock) = loaded(dir.path());
    session.start().unwrap();
    clock.advance(Duration::minutes(5));
    assert!(session.on_suspend().is_ok());

    // Destroyed from the background without coming back first.
    clock.advance(Duration::hours(1));
    let report = session.on_terminate();
    assert!(report.is_ok());
    assert_eq!(session.state(), SessionState::Stopped);

    let autosave = report.save_state.unwrap();
    assert_eq!(read_header(&autosave).unwrap().unwrap().time_played, 300.0);

    let profile = stored_profile(dir.path());
    let game = profile.find_by_file_name(FILE_NAME).unwrap();
    assert_eq!(game.total_play_time_minutes, 5);
    assert_eq!(game.last_played, Some(t0()));
}

#[test]
fn repeated_suspend_credits_nothing_extra() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, clock) = loaded(dir.path());
    session.start().unwrap();
    clock.advance(Duration::seconds(90));
    assert!(session.on_suspend().is_ok());

    clock.advance(Duration::minutes(30));
    assert!(session.on_suspend().is_ok());
    assert!(session.on_terminate().is_ok());

    let profile = stored_profile(dir.path());
    let game = profile.find_by_file_name(FILE_NAME).unwrap();
    assert_eq!(game.total_play_time_minutes, 1);
}

#[test]
fn resume_without_suspend_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _clock) = loaded(dir.path());
    session.on_resume().unwrap();
    assert_eq!(session.state(), SessionState::Loaded);
}

#[test]
fn repeated_checkpoints_do_not_double_count() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, clock) = loaded(dir.path());
    session.start().unwrap();

    clock.advance(Duration::seconds(150));
    assert!(session.on_suspend().is_ok());
    assert!(session.on_suspend().is_ok());

    let profile = stored_profile(dir.path());
    assert_eq!(
        profile
            .find_by_file_name(FILE_NAME)
            .unwrap()
            .total_play_time_minutes,
        2
    );
}

#[test]
fn play_time_aggregates_by_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut profile = ProfileData::default();
    let mut game = ProfileGameData::new(FILE_NAME, "stale-checksum");
    game.total_play_time_minutes = 100;
    profile.game_data.push(game);
    ProfileStore::new(dir.path().join("profile.json"))
        .save(&profile)
        .unwrap();

    let (mut session, clock) = loaded(dir.path());
    session.start().unwrap();
    clock.advance(Duration::minutes(3));
    assert!(session.on_terminate().is_ok());

    let profile = stored_profile(dir.path());
    assert_eq!(profile.game_data.len(), 1);
    assert_eq!(profile.game_data[0].total_play_time_minutes, 103);
    assert_eq!(profile.game_data[0].checksum, "stale-checksum");
}

#[test]
fn checkpoint_outcomes_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, clock) = loaded(dir.path());
    session.start().unwrap();
    session.with_engine(|e| e.fail_save = true);
    clock.advance(Duration::minutes(4));

    let report = session.on_suspend();
    assert!(matches!(report.save_state, Err(SessionError::Engine(_))));
    assert!(report.profile.is_ok());
    assert_eq!(
        stored_profile(dir.path())
            .find_by_file_name(FILE_NAME)
            .unwrap()
            .total_play_time_minutes,
        4
    );
}

#[test]
fn checkpoint_writes_engine_cheats() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _clock) = loaded(dir.path());
    session.with_engine(|e| {
        e.cheats = vec![CheatCode {
            name: "Max money".to_string(),
            lines: vec!["019999D5".to_string(), "019999D6".to_string()],
            enabled: true,
        }]
    });

    assert!(session.on_suspend().is_ok());
    let profile = stored_profile(dir.path());
    let cheats = &profile.find_by_file_name(FILE_NAME).unwrap().cheats;
    assert_eq!(cheats.len(), 1);
    assert_eq!(cheats[0].code, "019999D5\r\n019999D6");
}

// ============================================================================
// Cheats, input, video, link
// ============================================================================

#[test]
fn set_cheats_validates_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _clock) = loaded(dir.path());

    let bad = vec![CheatCode {
        name: "Broken".to_string(),
        lines: vec!["XYZ".to_string()],
        enabled: true,
    }];
    assert!(matches!(
        session.set_cheats(bad),
        Err(SessionError::Cheat(CheatError::InvalidCode { .. }))
    ));
    assert!(session.cheats().is_empty());

    let good = vec![CheatCode {
        name: "Infinite lives".to_string(),
        lines: vec!["010A3FC6".to_string()],
        enabled: true,
    }];
    session.set_cheats(good.clone()).unwrap();
    assert_eq!(session.cheats(), good);

    let profile = stored_profile(dir.path());
    let stored = &profile.find_by_file_name(FILE_NAME).unwrap().cheats;
    assert_eq!(stored[0].name, "Infinite lives");
    assert_eq!(stored[0].code, "010A3FC6");
}

#[test]
fn buttons_and_frames_reach_engine() {
    let dir = tempfile::tempdir().unwrap();
    let (session, _clock) = loaded(dir.path());

    session.press_button(JoypadButton::Start, true);
    session.press_button(JoypadButton::Start, false);
    assert_eq!(
        session.with_engine(|e| e.buttons.clone()),
        vec![(JoypadButton::Start, true), (JoypadButton::Start, false)]
    );
    assert_eq!(session.video_frame().pixels.len(), 160 * 144);
}

#[test]
fn screenshot_lands_in_screenshots_dir() {
    let dir = tempfile::tempdir().unwrap();
    let (session, _clock) = loaded(dir.path());

    let path = session.take_screenshot().unwrap();
    assert!(path.starts_with(dir.path().join("Screenshots")));
    assert!(path.exists());
}

#[test]
fn link_port_feeds_engine() {
    let dir = tempfile::tempdir().unwrap();
    let (session, _clock) = loaded(dir.path());

    let port = session.link_port();
    port.feed_link_cable_byte(0x42);
    port.feed_link_cable_byte(0x43);
    assert_eq!(session.with_engine(|e| e.link_in.clone()), vec![0x42, 0x43]);
}

#[test]
fn engine_link_output_is_published() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _clock) = loaded(dir.path());
    let rx = session.subscribe_link_output(8);
    session.with_engine(|e| e.link_out.extend([1, 2, 3]));

    session.start().unwrap();
    let timeout = StdDuration::from_secs(5);
    assert_eq!(rx.recv_timeout(timeout).unwrap(), 1);
    assert_eq!(rx.recv_timeout(timeout).unwrap(), 2);
    assert_eq!(rx.recv_timeout(timeout).unwrap(), 3);
}

#[test]
fn full_link_output_drops_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _clock) = loaded(dir.path());
    let rx = session.subscribe_link_output(1);
    session.with_engine(|e| e.link_out.extend([1, 2, 3]));

    session.start().unwrap();
    assert!(wait_for(|| session.with_engine(|e| e.link_out.is_empty())));
    session.stop();

    assert_eq!(rx.try_recv().unwrap(), 1);
    assert!(rx.try_recv().is_err());
}
