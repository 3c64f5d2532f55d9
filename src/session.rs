// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

use std::sync::Arc;

use primitive_types::H160;
use tokio::sync::watch;

/// The wallet account currently connected to the front-end.
///
/// Clones share the same connection, so the shell can connect or disconnect
/// while hooks hold their own handle.
#[derive(Debug, Clone)]
pub struct Session {
    account: Arc<watch::Sender<Option<H160>>>,
}

impl Session {
    /// A session with no connected account.
    #[must_use]
    pub fn new() -> Self {
        let (account, _) = watch::channel(None);
        Self {
            account: Arc::new(account),
        }
    }

    /// A session already connected to `account`.
    #[must_use]
    pub fn connected(account: H160) -> Self {
        let session = Self::new();
        session.connect(account);
        session
    }

    /// Connects `account`, replacing any previous one.
    pub fn connect(&self, account: H160) {
        self.account.send_replace(Some(account));
    }

    /// Drops the connected account.
    pub fn disconnect(&self) {
        self.account.send_replace(None);
    }

    /// The connected account, if any.
    #[must_use]
    pub fn account(&self) -> Option<H160> {
        *self.account.borrow()
    }

    /// Whether an account is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.account().is_some()
    }

    /// Receiver that wakes on connect and disconnect.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<H160>> {
        self.account.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
