// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Endpoint list change detection.

use crate::endpoint::Endpoint;

/// How a missing endpoint is interpreted when comparing equal-length lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChangePolicy {
    /// A previous endpoint absent from the new list is a change.
    #[default]
    Membership,

    /// Legacy controller behaviour: an absent previous endpoint reports "unchanged",
    /// so a same-size replacement of members is never published.
    Legacy,
}

impl ChangePolicy {
    /// Decide whether `current` differs from `previous`.
    ///
    /// Order is irrelevant: equal-length lists holding the same endpoints are unchanged.
    pub fn is_changed(self, previous: &[Endpoint], current: &[Endpoint]) -> bool {
        if previous.len() != current.len() {
            return true;
        }

        match self {
            Self::Membership => find_missing(previous, current).is_some(),
            // Plain lookup: duplicates in `previous` may all match one current endpoint.
            Self::Legacy => previous.iter().all(|p| current.iter().any(|c| c == p)),
        }
    }
}

/// Return the first endpoint of `previous` that `current` cannot account for.
///
/// Each current endpoint is matched at most once, so duplicates are compared as a
/// multiset rather than a set.
fn find_missing<'a>(previous: &'a [Endpoint], current: &[Endpoint]) -> Option<&'a Endpoint> {
    let mut used = vec![false; current.len()];

    previous.iter().find(|p| {
        let hit = current
            .iter()
            .enumerate()
            .position(|(i, c)| !used[i] && c == *p);
        match hit {
            Some(i) => {
                used[i] = true;
                false
            }
            None => true,
        }
    })
}

/// Membership-policy change detection.
pub fn is_changed(previous: &[Endpoint], current: &[Endpoint]) -> bool {
    ChangePolicy::Membership.is_changed(previous, current)
}
