//! The shared session record and the opaque identifiers around it.

use crate::board::{Board, Mark, Outcome};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Unique identifier for a shared session, safe to embed in a link.
pub type SessionId = String;

/// Opaque token identifying a device across reconnects.
pub type ClientId = String;

/// Character set for minted tokens; also the only characters accepted in
/// externally supplied session identifiers.
const TOKEN_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// One match as seen through the remote store.
///
/// The creator writes the initial record; the one-time slot claim sets the
/// joiner fields; after that only board, turn owner, and outcome fields
/// change, always written whole by whichever client holds the turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Current board, cells as "", "X", "O" on the wire.
    pub board: Board,
    /// Mark permitted to write the next move; `None` once terminal.
    pub turn_owner: Option<Mark>,
    /// Winning mark, if the game has been won.
    pub winner: Option<Mark>,
    /// True once the game ended with a full board and no winner.
    pub is_draw: bool,
    /// Occupant tag of the first slot, always X once created.
    pub slot_x: Mark,
    /// Occupant tag of the second slot; absent until claimed.
    pub slot_o: Option<Mark>,
    /// Identity of the device that created the session.
    pub creator_client_id: ClientId,
    /// Identity of the device that claimed the O slot, once claimed.
    pub joiner_client_id: Option<ClientId>,
    /// False once the O slot has been claimed.
    pub open_for_join: bool,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl SessionRecord {
    /// The record a session initiator writes: empty board, X to move,
    /// O slot open.
    pub fn created(creator: ClientId) -> Self {
        Self {
            board: Board::new(),
            turn_owner: Some(Mark::X),
            winner: None,
            is_draw: false,
            slot_x: Mark::X,
            slot_o: None,
            creator_client_id: creator,
            joiner_client_id: None,
            open_for_join: true,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Derives the outcome from the terminal fields.
    pub fn outcome(&self) -> Outcome {
        if let Some(mark) = self.winner {
            Outcome::Won(mark)
        } else if self.is_draw {
            Outcome::Draw
        } else {
            Outcome::InProgress
        }
    }

    /// Whether both player slots are occupied.
    pub fn both_slots_taken(&self) -> bool {
        self.slot_o.is_some()
    }
}

/// Mints a random token from the lowercase base-36 alphabet.
pub(crate) fn token(len: usize) -> String {
    (0..len)
        .map(|_| TOKEN_ALPHABET[fastrand::usize(..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// Mints a fresh session identifier.
///
/// The alphabet is large enough that collision with an existing session is
/// treated as impossible; creation does not defend against it.
pub fn new_session_id() -> SessionId {
    token(7)
}

/// Normalizes an externally supplied session identifier.
///
/// Accepts either a bare identifier or a pasted share link containing
/// `?game=<id>`. Returns the first run of at least four characters from
/// `[A-Za-z0-9_-]`; failing that, the input stripped to that character set.
/// Returns `None` when nothing usable remains.
#[instrument]
pub fn sanitize_session_id(raw: &str) -> Option<SessionId> {
    let tail = match raw.split_once("?game=") {
        Some((_, tail)) => tail,
        None => raw,
    };

    let allowed = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-';

    if let Some(run) = tail.split(|c| !allowed(c)).find(|s| s.len() >= 4) {
        return Some(run.to_string());
    }

    let stripped: String = tail.chars().filter(|c| allowed(*c)).collect();
    if stripped.is_empty() {
        None
    } else {
        Some(stripped)
    }
}
