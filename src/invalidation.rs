// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

use std::sync::Arc;

use tokio::sync::watch;

/// Generation counter raised when cached reads become outdated.
///
/// Write hooks call [`Invalidation::invalidate`] after a confirmed
/// transaction; read hooks subscribed to the same signal re-fetch
/// immediately instead of waiting for their next poll.
#[derive(Debug, Clone)]
pub struct Invalidation {
    generation: Arc<watch::Sender<u64>>,
}

impl Invalidation {
    /// Creates a fresh signal at generation zero.
    #[must_use]
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            generation: Arc::new(generation),
        }
    }

    /// Marks every subscriber's cache as outdated.
    pub fn invalidate(&self) {
        self.generation.send_modify(|generation| {
            *generation = generation.wrapping_add(1);
        });
    }

    /// Current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Receiver that wakes on every invalidation after this call.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }
}

impl Default for Invalidation {
    fn default() -> Self {
        Self::new()
    }
}
