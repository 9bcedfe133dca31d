//! Turn controllers: the local/computer state machine and the remote
//! snapshot-driven one.

use crate::ai::{Difficulty, choose_move};
use crate::board::{Board, InvalidMove, Mark, Outcome};
use crate::record::{SessionId, SessionRecord};
use crate::store::{RemoteStore, StoreError, Subscription};
use crate::ui::{GameUi, SoundKind};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Lifecycle of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No game running.
    Idle,
    /// Moves are being accepted.
    InProgress,
    /// The game ended with the given outcome; an external reset returns
    /// the controller to `Idle`.
    Terminal(Outcome),
}

/// The computer seat in a local game.
#[derive(Debug, Clone, Copy)]
pub struct Computer {
    /// Mark the computer plays.
    pub mark: Mark,
    /// Search strategy.
    pub difficulty: Difficulty,
    /// Simulated thinking delay before the computer's move lands.
    ///
    /// Purely presentational; zero changes nothing about the outcome.
    pub delay: Duration,
}

/// Controller for same-device play, human-vs-human or human-vs-computer.
///
/// Single-threaded cooperative: everything happens inside `handle_cell`,
/// and input stays locked while the computer's delay is pending, so no two
/// moves are ever in flight at once.
pub struct LocalGame<U: GameUi> {
    board: Board,
    current: Mark,
    phase: Phase,
    computer: Option<Computer>,
    ui: U,
}

impl<U: GameUi> LocalGame<U> {
    /// Creates a human-vs-human controller.
    pub fn new(ui: U) -> Self {
        Self {
            board: Board::new(),
            current: Mark::X,
            phase: Phase::Idle,
            computer: None,
            ui,
        }
    }

    /// Creates a human-vs-computer controller; the computer plays O.
    pub fn with_computer(ui: U, difficulty: Difficulty, delay: Duration) -> Self {
        let mut game = Self::new(ui);
        game.computer = Some(Computer {
            mark: Mark::O,
            difficulty,
            delay,
        });
        game
    }

    /// Starts (or restarts) a game: empty board, X to move.
    #[instrument(skip(self))]
    pub fn start(&mut self) {
        self.board = Board::new();
        self.current = Mark::X;
        self.phase = Phase::InProgress;
        self.ui.render_board(&self.board);
        self.ui.render_status("Player X's turn");
        self.ui.lock_input(false);
        info!("Local game started");
    }

    /// Handles a cell-activated event from the adapter.
    ///
    /// Ignored outside `InProgress`. After a human move that leaves the
    /// game running with the computer to move, the computer thinks for its
    /// delay and then plays.
    #[instrument(skip(self))]
    pub async fn handle_cell(&mut self, index: usize) -> Result<(), InvalidMove> {
        if self.phase != Phase::InProgress {
            debug!(phase = ?self.phase, "Ignoring cell activation outside a running game");
            return Ok(());
        }
        self.place(index)?;

        if self.phase == Phase::InProgress {
            if let Some(computer) = self.computer.filter(|c| c.mark == self.current) {
                self.ui.lock_input(true);
                tokio::time::sleep(computer.delay).await;
                let index = choose_move(&self.board, computer.mark, computer.difficulty);
                self.place(index).expect("computer picks an empty cell");
                if self.phase == Phase::InProgress {
                    self.ui.lock_input(false);
                }
            }
        }
        Ok(())
    }

    /// Places the current mover's mark and advances the state machine.
    fn place(&mut self, index: usize) -> Result<(), InvalidMove> {
        let mover = self.current;
        self.board = self.board.apply_move(index, mover)?;
        self.ui.play_sound(SoundKind::Move);
        self.ui.render_board(&self.board);

        match self.board.evaluate() {
            Outcome::Won(mark) => {
                // In both local modes the human plays X, so the X side's
                // result picks the win/lose sound.
                self.ui.render_status(&format!("Player {mark} wins!"));
                self.ui.play_sound(if mark == Mark::X {
                    SoundKind::Win
                } else {
                    SoundKind::Lose
                });
                self.finish(Outcome::Won(mark));
            }
            Outcome::Draw => {
                self.ui.render_status("It's a draw!");
                self.ui.play_sound(SoundKind::Draw);
                self.finish(Outcome::Draw);
            }
            Outcome::InProgress => {
                self.current = mover.opponent();
                self.ui
                    .render_status(&format!("Player {}'s turn", self.current));
            }
        }
        Ok(())
    }

    fn finish(&mut self, outcome: Outcome) {
        info!(?outcome, "Local game finished");
        self.phase = Phase::Terminal(outcome);
        self.ui.lock_input(true);
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current board snapshot.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mark whose turn it is.
    pub fn current_player(&self) -> Mark {
        self.current
    }
}

/// Controller for remote play against a shared session record.
///
/// Every received snapshot replaces local state wholesale; the controller
/// never merges fields. It writes only while holding the turn, and never
/// after leaving the session.
pub struct RemoteGame<U: GameUi> {
    id: SessionId,
    mark: Mark,
    store: Arc<dyn RemoteStore>,
    subscription: Option<Subscription>,
    last: Option<SessionRecord>,
    phase: Phase,
    ui: U,
}

impl<U: GameUi> RemoteGame<U> {
    /// Wraps an entered session (see [`crate::arbiter`]) in a controller.
    pub fn new(
        id: SessionId,
        mark: Mark,
        subscription: Subscription,
        store: Arc<dyn RemoteStore>,
        ui: U,
    ) -> Self {
        Self {
            id,
            mark,
            store,
            subscription: Some(subscription),
            last: None,
            phase: Phase::Idle,
            ui,
        }
    }

    /// The mark this client plays.
    pub fn mark(&self) -> Mark {
        self.mark
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Handles a cell-activated event.
    ///
    /// Accepted only while the game is running, this client holds the turn,
    /// and the cell is empty in the last-observed snapshot. Acceptance
    /// computes the complete next record and writes it whole; turn ownership
    /// makes per-turn writes race-free, so no conditional update is needed
    /// here.
    #[instrument(skip(self), fields(session_id = %self.id, mark = %self.mark))]
    pub async fn handle_cell(&mut self, index: usize) -> Result<(), StoreError> {
        if self.phase != Phase::InProgress {
            debug!(phase = ?self.phase, "Ignoring cell activation outside a running game");
            return Ok(());
        }
        let Some(record) = &self.last else {
            return Ok(());
        };
        if record.turn_owner != Some(self.mark) {
            debug!("Not this client's turn");
            return Ok(());
        }
        if !record.board.is_empty(index) {
            debug!(index, "Cell already occupied in last snapshot");
            return Ok(());
        }

        let board = record
            .board
            .apply_move(index, self.mark)
            .expect("checked empty above");
        let mut next = record.clone();
        next.board = board;
        match board.evaluate() {
            Outcome::Won(mark) => {
                next.winner = Some(mark);
                next.turn_owner = None;
            }
            Outcome::Draw => {
                next.is_draw = true;
                next.turn_owner = None;
            }
            Outcome::InProgress => {
                next.turn_owner = Some(self.mark.opponent());
            }
        }

        self.ui.play_sound(SoundKind::Move);
        self.store.write(&self.id, &next).await?;
        info!(index, "Wrote move to session record");
        Ok(())
    }

    /// Waits for and applies the next snapshot.
    ///
    /// Returns `false` once the subscription has ended (the client left or
    /// the store side went away).
    pub async fn pump(&mut self) -> bool {
        let Some(mut subscription) = self.subscription.take() else {
            return false;
        };
        match subscription.next().await {
            Some(record) => {
                self.subscription = Some(subscription);
                self.apply_snapshot(record);
                true
            }
            None => {
                warn!(session_id = %self.id, "Subscription closed");
                false
            }
        }
    }

    /// Replaces local state with a received snapshot.
    ///
    /// Idempotent: a snapshot identical to the last applied one produces no
    /// renders and no sounds. Out-of-order or duplicate delivery is safe
    /// because the snapshot is authoritative, never a delta.
    #[instrument(skip(self, record), fields(session_id = %self.id))]
    pub fn apply_snapshot(&mut self, record: SessionRecord) {
        if self.last.as_ref() == Some(&record) {
            debug!("Duplicate snapshot; no change");
            return;
        }

        self.ui.render_board(&record.board);
        let already_terminal = matches!(self.phase, Phase::Terminal(_));
        match record.outcome() {
            Outcome::Won(mark) => {
                self.ui.render_status(&format!("Player {mark} wins!"));
                if !already_terminal {
                    self.ui.play_sound(if mark == self.mark {
                        SoundKind::Win
                    } else {
                        SoundKind::Lose
                    });
                }
                self.phase = Phase::Terminal(Outcome::Won(mark));
                self.ui.lock_input(true);
            }
            Outcome::Draw => {
                self.ui.render_status("It's a draw!");
                if !already_terminal {
                    self.ui.play_sound(SoundKind::Draw);
                }
                self.phase = Phase::Terminal(Outcome::Draw);
                self.ui.lock_input(true);
            }
            Outcome::InProgress => {
                self.phase = Phase::InProgress;
                if record.both_slots_taken() {
                    match record.turn_owner {
                        Some(owner) => self
                            .ui
                            .render_status(&format!("Player {owner}'s turn")),
                        None => self.ui.render_status("Waiting for opponent..."),
                    }
                } else {
                    self.ui.render_status("Waiting for opponent to join...");
                }
                let my_turn = record.turn_owner == Some(self.mark);
                self.ui.lock_input(!my_turn);
            }
        }
        self.last = Some(record);
    }

    /// Leaves the session: cancels the subscription and goes idle.
    ///
    /// No snapshots are processed and no writes occur afterwards.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn leave(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
        self.phase = Phase::Idle;
        self.last = None;
        info!("Left session");
    }
}
