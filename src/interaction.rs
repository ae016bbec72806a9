//! Like/save bookkeeping shared by the server and the client.
//!
//! A user's membership set for one [`InteractionKind`] is the list of article
//! ids they have marked. Toggling sends the whole new set plus a
//! [`Direction`]; the server moves the counter of every article whose
//! membership changed between the stored set and the new one.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub type ArticleId = i64;
pub type MembershipSet = BTreeSet<ArticleId>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Like,
    Save,
}

impl InteractionKind {
    /// Value stored in `interactions.kind` and used as the query key.
    pub fn as_str(self) -> &'static str {
        match self {
            InteractionKind::Like => "like",
            InteractionKind::Save => "save",
        }
    }

    /// Name of the membership array in request bodies and user responses.
    pub fn set_field(self) -> &'static str {
        match self {
            InteractionKind::Like => "liked_articles",
            InteractionKind::Save => "saved_articles",
        }
    }

    pub fn counter_column(self) -> &'static str {
        match self {
            InteractionKind::Like => "like_count",
            InteractionKind::Save => "save_count",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Add,
    Remove,
}

impl Direction {
    pub fn from_signal(signal: i64) -> Option<Direction> {
        match signal {
            1 => Some(Direction::Add),
            -1 => Some(Direction::Remove),
            _ => None,
        }
    }

    pub fn signal(self) -> i64 {
        match self {
            Direction::Add => 1,
            Direction::Remove => -1,
        }
    }

    /// Direction a toggle takes from the current marked state.
    pub fn toggling(marked: bool) -> Direction {
        if marked {
            Direction::Remove
        } else {
            Direction::Add
        }
    }
}

/// `set` with `article` added or removed.
pub fn apply_toggle(set: &MembershipSet, article: ArticleId, direction: Direction) -> MembershipSet {
    let mut next = set.clone();
    match direction {
        Direction::Add => next.insert(article),
        Direction::Remove => next.remove(&article),
    };
    next
}

/// True when the submitted set agrees with the directional signal.
pub fn signal_matches_set(set: &MembershipSet, article: ArticleId, direction: Direction) -> bool {
    match direction {
        Direction::Add => set.contains(&article),
        Direction::Remove => !set.contains(&article),
    }
}

pub fn counter_delta(was_member: bool, is_member: bool) -> i64 {
    match (was_member, is_member) {
        (false, true) => 1,
        (true, false) => -1,
        _ => 0,
    }
}

/// Counter change for every article that entered or left the set.
pub fn membership_changes(old: &MembershipSet, new: &MembershipSet) -> Vec<(ArticleId, i64)> {
    old.symmetric_difference(new)
        .map(|&article| {
            (
                article,
                counter_delta(old.contains(&article), new.contains(&article)),
            )
        })
        .collect()
}

pub fn clamp_counter(count: i64, delta: i64) -> i64 {
    (count + delta).max(0)
}
