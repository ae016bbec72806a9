use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{ClientError, MembershipStore};
use crate::data_formats::ToggleResponse;
use crate::interaction::{clamp_counter, ArticleId, Direction, InteractionKind, MembershipSet};

/// Sends a new membership set for one article.
#[async_trait]
pub trait InteractionApi: Send + Sync {
    async fn send_membership(
        &self,
        article_id: ArticleId,
        kind: InteractionKind,
        direction: Direction,
        membership: &MembershipSet,
    ) -> Result<ToggleResponse, ClientError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkState {
    NotMarked,
    Marked,
    PendingMark,
    PendingUnmark,
}

impl MarkState {
    fn settled(marked: bool) -> MarkState {
        if marked {
            MarkState::Marked
        } else {
            MarkState::NotMarked
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, MarkState::PendingMark | MarkState::PendingUnmark)
    }

    /// What the user sees, including an unconfirmed toggle.
    pub fn shows_marked(self) -> bool {
        matches!(self, MarkState::Marked | MarkState::PendingMark)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Committed { marked: bool, count: i64 },
    RolledBack { marked: bool, count: i64 },
    /// A request for this item was already in flight.
    Ignored,
}

#[derive(Debug, Clone, Copy)]
struct ItemState {
    state: MarkState,
    count: i64,
}

/// Restores the pre-toggle state unless the request committed, so the
/// in-flight state is released on every exit path including cancellation.
struct InFlight<'a> {
    item: &'a Mutex<ItemState>,
    previous: ItemState,
    store: &'a MembershipStore,
    article_id: ArticleId,
    kind: InteractionKind,
    committed: bool,
}

impl InFlight<'_> {
    fn commit(mut self, direction: Direction, count: i64) {
        self.store.confirm(self.kind, self.article_id, direction);
        let mut item = lock(self.item);
        item.state = MarkState::settled(direction == Direction::Add);
        item.count = count;
        self.committed = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.store.revert(self.kind, self.article_id);
            *lock(self.item) = self.previous;
        }
    }
}

fn lock(item: &Mutex<ItemState>) -> MutexGuard<'_, ItemState> {
    item.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Optimistic like or save button state for one article.
pub struct InteractionController<A: ?Sized> {
    article_id: ArticleId,
    kind: InteractionKind,
    api: Arc<A>,
    store: Arc<MembershipStore>,
    item: Mutex<ItemState>,
}

impl<A: InteractionApi + ?Sized> InteractionController<A> {
    pub fn new(
        article_id: ArticleId,
        kind: InteractionKind,
        count: i64,
        api: Arc<A>,
        store: Arc<MembershipStore>,
    ) -> Self {
        let marked = store.contains(kind, article_id);
        Self {
            article_id,
            kind,
            api,
            store,
            item: Mutex::new(ItemState {
                state: MarkState::settled(marked),
                count: count.max(0),
            }),
        }
    }

    pub fn state(&self) -> MarkState {
        lock(&self.item).state
    }

    pub fn is_marked(&self) -> bool {
        self.state().shows_marked()
    }

    pub fn count(&self) -> i64 {
        lock(&self.item).count
    }

    pub async fn toggle(&self) -> ToggleOutcome {
        let (direction, guard) = {
            let mut item = lock(&self.item);
            let direction = match item.state {
                MarkState::NotMarked => Direction::Add,
                MarkState::Marked => Direction::Remove,
                MarkState::PendingMark | MarkState::PendingUnmark => {
                    debug!(article_id = self.article_id, "Toggle ignored while in flight");
                    return ToggleOutcome::Ignored;
                }
            };
            let previous = *item;
            item.state = match direction {
                Direction::Add => MarkState::PendingMark,
                Direction::Remove => MarkState::PendingUnmark,
            };
            item.count = clamp_counter(item.count, direction.signal());
            self.store.apply(self.kind, self.article_id, direction);
            let guard = InFlight {
                item: &self.item,
                previous,
                store: &self.store,
                article_id: self.article_id,
                kind: self.kind,
                committed: false,
            };
            (direction, guard)
        };

        let _sending = self.store.lock_sends(self.kind).await;
        let membership = self.store.outgoing(self.kind, self.article_id, direction);
        let result = self
            .api
            .send_membership(self.article_id, self.kind, direction, &membership)
            .await;

        let failure = match result {
            Ok(ToggleResponse {
                success: true,
                count,
                ..
            }) => {
                let marked = direction == Direction::Add;
                let count = count.unwrap_or_else(|| self.count());
                guard.commit(direction, count);
                return ToggleOutcome::Committed { marked, count };
            }
            Ok(ToggleResponse { message, .. }) => ClientError::Rejected(message.unwrap_or_default()),
            Err(e) => e,
        };

        let previous = guard.previous;
        drop(guard);
        warn!(
            article_id = self.article_id,
            kind = self.kind.as_str(),
            "Toggle failed, rolled back: {}",
            failure
        );
        ToggleOutcome::RolledBack {
            marked: previous.state.shows_marked(),
            count: previous.count,
        }
    }
}
