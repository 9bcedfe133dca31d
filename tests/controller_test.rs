//! Tests for the turn controllers.

use gridmatch::{
    Board, Difficulty, GameUi, LocalGame, Mark, MemoryStore, Outcome, Phase, RemoteGame,
    RemoteStore, SoundKind, arbiter,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Adapter that records every call so tests can assert on the driven
/// presentation without any real UI.
#[derive(Clone, Default)]
struct RecordingUi {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingUi {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl GameUi for RecordingUi {
    fn render_board(&mut self, _board: &Board) {
        self.push("render_board".to_string());
    }

    fn render_status(&mut self, text: &str) {
        self.push(format!("status:{text}"));
    }

    fn lock_input(&mut self, locked: bool) {
        self.push(format!("lock:{locked}"));
    }

    fn play_sound(&mut self, kind: SoundKind) {
        self.push(format!("sound:{kind:?}"));
    }
}

#[tokio::test]
async fn test_local_game_x_wins_top_row() {
    let ui = RecordingUi::default();
    let mut game = LocalGame::new(ui.clone());
    game.start();

    for index in [0, 3, 1, 4, 2] {
        game.handle_cell(index).await.unwrap();
    }

    assert_eq!(game.phase(), Phase::Terminal(Outcome::Won(Mark::X)));
    let events = ui.events();
    assert!(events.contains(&"status:Player X wins!".to_string()));
    assert!(events.contains(&"sound:Win".to_string()));
    assert_eq!(events.last(), Some(&"lock:true".to_string()));
}

#[tokio::test]
async fn test_local_game_rejects_occupied_cell() {
    let ui = RecordingUi::default();
    let mut game = LocalGame::new(ui);
    game.start();

    game.handle_cell(4).await.unwrap();
    assert!(game.handle_cell(4).await.is_err());
    // The failed activation changed nothing.
    assert_eq!(game.current_player(), Mark::O);
}

#[tokio::test]
async fn test_local_game_ignores_input_when_terminal() {
    let ui = RecordingUi::default();
    let mut game = LocalGame::new(ui);
    game.start();
    for index in [0, 3, 1, 4, 2] {
        game.handle_cell(index).await.unwrap();
    }

    let board_before = *game.board();
    game.handle_cell(8).await.unwrap();
    assert_eq!(*game.board(), board_before);
}

#[tokio::test]
async fn test_computer_answers_after_human_move() {
    let ui = RecordingUi::default();
    let mut game = LocalGame::with_computer(ui, Difficulty::Hard, Duration::ZERO);
    game.start();

    game.handle_cell(4).await.unwrap();

    // The computer moved inside the same event; it is X's turn again.
    assert_eq!(game.current_player(), Mark::X);
    assert_eq!(game.board().empty_cells().len(), 7);
}

#[tokio::test]
async fn test_computer_delay_does_not_change_outcome() {
    for delay in [Duration::ZERO, Duration::from_millis(5)] {
        let ui = RecordingUi::default();
        let mut game = LocalGame::with_computer(ui, Difficulty::Hard, delay);
        game.start();
        game.handle_cell(4).await.unwrap();
        // Hard answers a center opening with the first corner.
        assert!(!game.board().is_empty(0));
    }
}

#[tokio::test]
async fn test_remote_move_writes_whole_record() {
    let store = Arc::new(MemoryStore::new());
    let host = arbiter::create_session(store.as_ref(), &"host".to_string())
        .await
        .unwrap();
    let id = host.id.clone();
    let record = host.record.clone();

    let ui = RecordingUi::default();
    let mut game = RemoteGame::new(
        id.clone(),
        host.mark,
        host.subscription,
        store.clone() as Arc<dyn RemoteStore>,
        ui,
    );
    game.apply_snapshot(record);
    game.handle_cell(4).await.unwrap();

    let written = store.read(&id).await.unwrap().unwrap();
    assert!(!written.board.is_empty(4));
    assert_eq!(written.turn_owner, Some(Mark::O));
    assert_eq!(written.winner, None);
    assert!(!written.is_draw);
}

#[tokio::test]
async fn test_remote_rejects_out_of_turn_input() {
    let store = Arc::new(MemoryStore::new());
    let host = arbiter::create_session(store.as_ref(), &"host".to_string())
        .await
        .unwrap();
    let guest = arbiter::join_session(store.as_ref(), &host.id, &"guest".to_string())
        .await
        .unwrap();

    let ui = RecordingUi::default();
    let mut game = RemoteGame::new(
        guest.id.clone(),
        guest.mark,
        guest.subscription,
        store.clone() as Arc<dyn RemoteStore>,
        ui.clone(),
    );
    let before = store.read(&host.id).await.unwrap().unwrap();
    game.apply_snapshot(before.clone());

    // Turn owner is X; the O client's activation must not write.
    game.handle_cell(0).await.unwrap();
    let after = store.read(&host.id).await.unwrap().unwrap();
    assert_eq!(before, after);

    // And input is locked for the O side.
    assert!(ui.events().contains(&"lock:true".to_string()));
}

#[tokio::test]
async fn test_snapshot_application_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let host = arbiter::create_session(store.as_ref(), &"host".to_string())
        .await
        .unwrap();
    let record = host.record.clone();

    let ui = RecordingUi::default();
    let mut game = RemoteGame::new(
        host.id.clone(),
        host.mark,
        host.subscription,
        store.clone() as Arc<dyn RemoteStore>,
        ui.clone(),
    );

    game.apply_snapshot(record.clone());
    let after_first = ui.events().len();
    game.apply_snapshot(record);
    assert_eq!(
        ui.events().len(),
        after_first,
        "duplicate snapshot must not re-render or replay sounds"
    );
}

#[tokio::test]
async fn test_terminal_snapshot_plays_sound_once() {
    let store = Arc::new(MemoryStore::new());
    let host = arbiter::create_session(store.as_ref(), &"host".to_string())
        .await
        .unwrap();

    let ui = RecordingUi::default();
    let mut game = RemoteGame::new(
        host.id.clone(),
        host.mark,
        host.subscription,
        store.clone() as Arc<dyn RemoteStore>,
        ui.clone(),
    );

    let mut record = host.record.clone();
    record.board = record.board.apply_move(0, Mark::O).unwrap();
    record.board = record.board.apply_move(4, Mark::O).unwrap();
    record.board = record.board.apply_move(8, Mark::O).unwrap();
    record.winner = Some(Mark::O);
    record.turn_owner = None;
    game.apply_snapshot(record.clone());

    let sounds = |events: &[String]| {
        events
            .iter()
            .filter(|e| e.starts_with("sound:"))
            .count()
    };
    let first = sounds(&ui.events());
    assert_eq!(first, 1);
    assert!(ui.events().contains(&"sound:Lose".to_string()));

    game.apply_snapshot(record);
    assert_eq!(sounds(&ui.events()), first);
}

#[tokio::test]
async fn test_no_write_after_leaving_session() {
    let store = Arc::new(MemoryStore::new());
    let host = arbiter::create_session(store.as_ref(), &"host".to_string())
        .await
        .unwrap();
    let id = host.id.clone();
    let record = host.record.clone();

    let ui = RecordingUi::default();
    let mut game = RemoteGame::new(
        id.clone(),
        host.mark,
        host.subscription,
        store.clone() as Arc<dyn RemoteStore>,
        ui,
    );
    game.apply_snapshot(record);
    game.leave();

    game.handle_cell(4).await.unwrap();
    let after = store.read(&id).await.unwrap().unwrap();
    assert!(after.board.is_empty(4));
    assert!(!game.pump().await, "subscription is gone after leaving");
}

#[tokio::test]
async fn test_pump_delivers_opponent_moves() {
    let store = Arc::new(MemoryStore::new());
    let host = arbiter::create_session(store.as_ref(), &"host".to_string())
        .await
        .unwrap();
    let guest = arbiter::join_session(store.as_ref(), &host.id, &"guest".to_string())
        .await
        .unwrap();

    let host_ui = RecordingUi::default();
    let mut host_game = RemoteGame::new(
        host.id.clone(),
        host.mark,
        host.subscription,
        store.clone() as Arc<dyn RemoteStore>,
        host_ui,
    );
    let guest_ui = RecordingUi::default();
    let mut guest_game = RemoteGame::new(
        guest.id.clone(),
        guest.mark,
        guest.subscription,
        store.clone() as Arc<dyn RemoteStore>,
        guest_ui.clone(),
    );

    // The host drains its queue: the pre-join snapshot, then the claim
    // commit. The guest subscribed after the claim, so one pump suffices.
    assert!(host_game.pump().await);
    assert!(host_game.pump().await);
    assert!(guest_game.pump().await);

    host_game.handle_cell(4).await.unwrap();
    assert!(guest_game.pump().await);

    // The guest observed X's move and now holds the turn.
    let events = guest_ui.events();
    assert!(events.contains(&"status:Player O's turn".to_string()));
    assert_eq!(events.last(), Some(&"lock:false".to_string()));
}
