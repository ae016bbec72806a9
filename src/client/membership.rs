use std::sync::{PoisonError, RwLock};

use tokio::sync::{Mutex, MutexGuard};

use crate::data_formats::UserResponse;
use crate::interaction::{apply_toggle, ArticleId, Direction, InteractionKind, MembershipSet};

#[derive(Debug, Clone, Default)]
struct Memberships {
    liked: MembershipSet,
    saved: MembershipSet,
}

impl Memberships {
    fn set_mut(&mut self, kind: InteractionKind) -> &mut MembershipSet {
        match kind {
            InteractionKind::Like => &mut self.liked,
            InteractionKind::Save => &mut self.saved,
        }
    }

    fn set(&self, kind: InteractionKind) -> &MembershipSet {
        match kind {
            InteractionKind::Like => &self.liked,
            InteractionKind::Save => &self.saved,
        }
    }

    fn set_member(&mut self, kind: InteractionKind, article: ArticleId, member: bool) {
        let set = self.set_mut(kind);
        if member {
            set.insert(article);
        } else {
            set.remove(&article);
        }
    }
}

#[derive(Debug, Default)]
struct Sets {
    /// What the screen shows, including unconfirmed toggles.
    shown: Memberships,
    /// What the server acknowledged.
    confirmed: Memberships,
}

/// The signed-in user's liked and saved article ids, shared by every
/// interaction controller on screen.
///
/// Toggles mark the shown set immediately and touch only their own article.
/// Sends for one kind go out one at a time, each carrying the confirmed set
/// plus its own change, so a later request never drops an article an
/// earlier one committed.
#[derive(Debug, Default)]
pub struct MembershipStore {
    inner: RwLock<Sets>,
    like_sends: Mutex<()>,
    save_sends: Mutex<()>,
}

impl MembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_user(user: &UserResponse) -> Self {
        let store = Self::new();
        store.load_user(user);
        store
    }

    pub fn load_user(&self, user: &UserResponse) {
        let loaded = Memberships {
            liked: user.liked_articles.iter().copied().collect(),
            saved: user.saved_articles.iter().copied().collect(),
        };
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.shown = loaded.clone();
        inner.confirmed = loaded;
    }

    pub fn get(&self, kind: InteractionKind) -> MembershipSet {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .shown
            .set(kind)
            .clone()
    }

    pub fn contains(&self, kind: InteractionKind, article: ArticleId) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .shown
            .set(kind)
            .contains(&article)
    }

    /// Optimistically adds or removes one article from the shown set and
    /// returns the result.
    pub fn apply(
        &self,
        kind: InteractionKind,
        article: ArticleId,
        direction: Direction,
    ) -> MembershipSet {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner
            .shown
            .set_member(kind, article, direction == Direction::Add);
        inner.shown.set(kind).clone()
    }

    /// The set to send for one toggle: the confirmed set with only this
    /// article changed.
    pub fn outgoing(
        &self,
        kind: InteractionKind,
        article: ArticleId,
        direction: Direction,
    ) -> MembershipSet {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        apply_toggle(inner.confirmed.set(kind), article, direction)
    }

    /// Records a toggle the server accepted.
    pub fn confirm(&self, kind: InteractionKind, article: ArticleId, direction: Direction) {
        let member = direction == Direction::Add;
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.confirmed.set_member(kind, article, member);
        inner.shown.set_member(kind, article, member);
    }

    /// Puts one article's shown membership back to its confirmed value.
    pub fn revert(&self, kind: InteractionKind, article: ArticleId) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let member = inner.confirmed.set(kind).contains(&article);
        inner.shown.set_member(kind, article, member);
    }

    /// Held for the duration of one membership request of `kind`.
    pub async fn lock_sends(&self, kind: InteractionKind) -> MutexGuard<'_, ()> {
        match kind {
            InteractionKind::Like => self.like_sends.lock().await,
            InteractionKind::Save => self.save_sends.lock().await,
        }
    }

    /// Overwrites both the shown and the confirmed set.
    pub fn replace(&self, kind: InteractionKind, set: MembershipSet) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *inner.shown.set_mut(kind) = set.clone();
        *inner.confirmed.set_mut(kind) = set;
    }

    /// Drops a deleted article from both sets.
    pub fn remove_article(&self, article: ArticleId) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let inner = &mut *guard;
        for sets in [&mut inner.shown, &mut inner.confirmed] {
            sets.liked.remove(&article);
            sets.saved.remove(&article);
        }
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Sets::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[ArticleId]) -> MembershipSet {
        ids.iter().copied().collect()
    }

    #[test]
    fn kinds_are_independent() {
        let store = MembershipStore::new();
        store.replace(InteractionKind::Like, set(&[1, 2]));
        store.replace(InteractionKind::Save, set(&[2]));
        assert!(store.contains(InteractionKind::Like, 1));
        assert!(!store.contains(InteractionKind::Save, 1));

        store.remove_article(2);
        assert_eq!(store.get(InteractionKind::Like).len(), 1);
        assert!(store.get(InteractionKind::Save).is_empty());

        store.clear();
        assert!(store.get(InteractionKind::Like).is_empty());
    }

    #[test]
    fn outgoing_set_ignores_other_unconfirmed_toggles() {
        let store = MembershipStore::new();
        store.replace(InteractionKind::Like, set(&[5]));
        store.apply(InteractionKind::Like, 1, Direction::Add);
        store.apply(InteractionKind::Like, 2, Direction::Add);
        assert_eq!(store.get(InteractionKind::Like), set(&[1, 2, 5]));

        assert_eq!(
            store.outgoing(InteractionKind::Like, 2, Direction::Add),
            set(&[2, 5])
        );
        store.confirm(InteractionKind::Like, 2, Direction::Add);
        assert_eq!(
            store.outgoing(InteractionKind::Like, 1, Direction::Add),
            set(&[1, 2, 5])
        );
    }

    #[test]
    fn revert_touches_only_one_article() {
        let store = MembershipStore::new();
        store.replace(InteractionKind::Save, set(&[3]));
        store.apply(InteractionKind::Save, 1, Direction::Add);
        store.apply(InteractionKind::Save, 3, Direction::Remove);
        store.confirm(InteractionKind::Save, 1, Direction::Add);

        store.revert(InteractionKind::Save, 3);
        assert_eq!(store.get(InteractionKind::Save), set(&[1, 3]));
    }
}
