//! Session creation and the slot-claim arbitration protocol.
//!
//! Two honest clients may race to fill the single open slot of a shared
//! record. The claim runs as an atomic conditional update so at most one
//! of them commits; the loser re-reads and re-evaluates instead of
//! clobbering the winner with a direct write.

use crate::board::Mark;
use crate::record::{ClientId, SessionId, SessionRecord, new_session_id, sanitize_session_id};
use crate::store::{Commit, RemoteStore, StoreError, Subscription};
use derive_more::{Display, Error, From};
use tracing::{debug, info, instrument, warn};

/// Ways a create or join attempt can fail, each with a user-facing message.
#[derive(Debug, Display, Error, From)]
pub enum JoinError {
    /// No record exists under the (normalized) identifier.
    #[display("game not found")]
    SessionNotFound,
    /// Both slots are held by other identities.
    #[display("unable to join, game is full")]
    SessionFull,
    /// The retried conditional claim failed a second time.
    #[display("unable to join, try again")]
    JoinRaceLost,
    /// The remote store could not be reached.
    #[display("{_0}")]
    #[from]
    Store(StoreError),
}

/// A successfully entered session: assigned mark, the record as last seen,
/// and a live subscription for subsequent snapshots.
pub struct SessionHandle {
    /// The normalized session identifier.
    pub id: SessionId,
    /// The mark this client plays.
    pub mark: Mark,
    /// The record at entry time.
    pub record: SessionRecord,
    /// Push subscription established after the claim.
    pub subscription: Subscription,
}

impl SessionHandle {
    /// The shareable link suffix for this session.
    pub fn share_suffix(&self) -> String {
        format!("?game={}", self.id)
    }
}

/// How a record snapshot relates to a claiming client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Claim {
    /// The client created the session; it re-enters as X without a write.
    Creator,
    /// The client already holds the O slot; it re-enters without a write.
    Joiner,
    /// Both slots belong to other identities.
    Full,
    /// The O slot is open to this client.
    Open,
}

fn classify(record: &SessionRecord, client: &ClientId) -> Claim {
    if record.creator_client_id == *client {
        Claim::Creator
    } else if record.joiner_client_id.as_ref() == Some(client) {
        Claim::Joiner
    } else if record.both_slots_taken() {
        Claim::Full
    } else {
        Claim::Open
    }
}

/// Creates a fresh session with this client in the X slot.
///
/// The identifier is freshly minted, so this is a single unconditional
/// write with no contention to resolve.
#[instrument(skip(store))]
pub async fn create_session(
    store: &dyn RemoteStore,
    client: &ClientId,
) -> Result<SessionHandle, JoinError> {
    let id = new_session_id();
    let record = SessionRecord::created(client.clone());
    store.create(&id, record.clone()).await?;
    let subscription = store.subscribe(&id).await?;
    info!(session_id = %id, "Created session as X");
    Ok(SessionHandle {
        id,
        mark: Mark::X,
        record,
        subscription,
    })
}

/// Joins an existing session, resolving the slot claim without a central
/// arbiter.
///
/// Precedence against the current snapshot: the creator re-enters as X and
/// a previous joiner re-enters as O, both without writing; a record whose
/// slots are both held by others fails with [`JoinError::SessionFull`];
/// otherwise the client attempts the atomic conditional claim. An aborted
/// claim triggers one re-read and re-evaluation from the top, allowing at
/// most one automatic retry of the conditional update; a second abort
/// surfaces [`JoinError::JoinRaceLost`] rather than masking a full session
/// behind indefinite retries.
#[instrument(skip(store))]
pub async fn join_session(
    store: &dyn RemoteStore,
    raw_id: &str,
    client: &ClientId,
) -> Result<SessionHandle, JoinError> {
    let id = sanitize_session_id(raw_id).ok_or(JoinError::SessionNotFound)?;
    let mut record = store
        .read(&id)
        .await?
        .ok_or(JoinError::SessionNotFound)?;

    let mut attempts = 0;
    loop {
        match classify(&record, client) {
            Claim::Creator => {
                info!(session_id = %id, "Re-entering session as creator (X)");
                return enter(store, id, Mark::X).await;
            }
            Claim::Joiner => {
                info!(session_id = %id, "Re-entering session as joiner (O)");
                return enter(store, id, Mark::O).await;
            }
            Claim::Full => {
                warn!(session_id = %id, "Both slots held by other clients");
                return Err(JoinError::SessionFull);
            }
            Claim::Open => {}
        }

        if attempts == 2 {
            warn!(session_id = %id, "Retried claim aborted again; giving up");
            return Err(JoinError::JoinRaceLost);
        }
        attempts += 1;

        let me = client.clone();
        let outcome = store
            .conditional_update(&id, &move |current| {
                // Commit only while the O slot is still absent and the X
                // slot is not our own identity.
                if current.both_slots_taken() || current.creator_client_id == me {
                    return None;
                }
                let mut next = current.clone();
                next.slot_o = Some(Mark::O);
                next.joiner_client_id = Some(me.clone());
                next.open_for_join = false;
                Some(next)
            })
            .await?;

        match outcome {
            Commit::Committed(_) => {
                info!(session_id = %id, "Claimed O slot");
                return enter(store, id, Mark::O).await;
            }
            Commit::Aborted(Some(current)) => {
                debug!(session_id = %id, attempts, "Claim aborted; re-evaluating");
                record = current;
            }
            Commit::Aborted(None) => {
                warn!(session_id = %id, "Record vanished during claim");
                return Err(JoinError::SessionNotFound);
            }
        }
    }
}

/// Finalizes entry: re-reads the record and opens the subscription.
async fn enter(
    store: &dyn RemoteStore,
    id: SessionId,
    mark: Mark,
) -> Result<SessionHandle, JoinError> {
    let record = store
        .read(&id)
        .await?
        .ok_or(JoinError::SessionNotFound)?;
    let subscription = store.subscribe(&id).await?;
    Ok(SessionHandle {
        id,
        mark,
        record,
        subscription,
    })
}
