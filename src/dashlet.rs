// SPDX-License-Identifier: GPL-3.0-only

//! Toolkit-independent dashlet state and its event dispatcher.
//!
//! The window shell turns timer, network and window-manager callbacks into
//! [`Event`]s, hands them to [`DashletState::dispatch`] one at a time, and
//! carries out the returned [`Effect`].

use crate::backend::analytics::{AnalyticsClient, ProfileId};
use crate::backend::Connection;
use crate::fl;
use crate::render::{self, Frame};
use crate::settings::{Position, SettingsStore};
use crate::snapshot::Snapshot;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub enum Event {
    /// Refresh timer fired (also sent once at startup).
    Tick,
    /// Outcome of authenticating and resolving the profile.
    Connected(Result<Connection, String>),
    /// Outcome of one refresh.
    Refreshed(Result<Snapshot, String>),
    /// The window manager reports the window at a new position.
    Moved(Position),
}

/// Work the shell must perform after a dispatch.
#[derive(Debug, Clone)]
pub enum Effect {
    None,
    /// Authenticate and resolve the profile, then report back with [`Event::Connected`].
    Connect,
    /// Run one refresh, then report back with [`Event::Refreshed`].
    Fetch { client: AnalyticsClient, profile: ProfileId },
    Repaint,
}

#[derive(Debug)]
pub struct DashletState {
    connection: Option<Connection>,
    snapshot: Option<Snapshot>,
    position: Position,
    store: Option<SettingsStore>,
    last_error: Option<String>,
    busy: bool,
    /// Connection settings changed while a request was running.
    reconnect_pending: bool,
    currency: String,
}

impl DashletState {
    /// Restores the saved window position from `store`.
    pub fn new(store: Option<SettingsStore>, currency: impl Into<String>) -> Self {
        let position = store.as_ref().map(SettingsStore::load).unwrap_or_default();
        debug!(x = position.x, y = position.y, "Restored window position");

        Self {
            connection: None,
            snapshot: None,
            position,
            store,
            last_error: None,
            busy: false,
            reconnect_pending: false,
            currency: currency.into(),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_currency(&mut self, currency: impl Into<String>) {
        self.currency = currency.into();
    }

    /// Drop the current session so the next connection uses new key file or API settings.
    pub fn reconnect(&mut self) -> Effect {
        info!("Connection settings changed, reconnecting");
        self.connection = None;

        if self.busy {
            self.reconnect_pending = true;
            return Effect::None;
        }
        self.busy = true;
        Effect::Connect
    }

    /// A request finished after a reconnect was asked for: start over with the new settings.
    fn take_pending_reconnect(&mut self) -> Option<Effect> {
        if !std::mem::take(&mut self.reconnect_pending) {
            return None;
        }
        self.connection = None;
        self.busy = true;
        Some(Effect::Connect)
    }

    pub fn dispatch(&mut self, event: Event) -> Effect {
        match event {
            Event::Tick => self.on_tick(),
            Event::Connected(result) => {
                self.busy = false;
                if let Some(effect) = self.take_pending_reconnect() {
                    debug!("Discarding connection made with outdated settings");
                    return effect;
                }
                match result {
                    Ok(connection) => {
                        self.connection = Some(connection);
                        self.last_error = None;
                        // Eager first fetch instead of waiting a full interval.
                        self.on_tick()
                    }
                    Err(err) => {
                        error!("Failed to connect: {}", err);
                        self.last_error = Some(err);
                        Effect::Repaint
                    }
                }
            }
            Event::Refreshed(result) => {
                self.busy = false;
                match result {
                    Ok(snapshot) => {
                        self.snapshot = Some(snapshot);
                        self.last_error = None;
                    }
                    Err(err) => {
                        error!("Failed to refresh analytics: {}", err);
                        self.last_error = Some(err);
                    }
                }
                self.take_pending_reconnect().unwrap_or(Effect::Repaint)
            }
            Event::Moved(position) => {
                self.on_moved(position);
                Effect::None
            }
        }
    }

    fn on_tick(&mut self) -> Effect {
        if self.busy {
            debug!("Previous request still running, skipping tick");
            return Effect::None;
        }

        let Some(connection) = &self.connection else {
            self.busy = true;
            return Effect::Connect;
        };

        let Some(profile) = &connection.profile else {
            self.last_error = Some(fl!("no-profile"));
            return Effect::Repaint;
        };

        self.busy = true;
        Effect::Fetch {
            client: connection.client.clone(),
            profile: profile.clone(),
        }
    }

    fn on_moved(&mut self, position: Position) {
        if position == self.position {
            return;
        }
        self.position = position;

        let Some(store) = &self.store else {
            return;
        };
        match store.save(position) {
            Ok(()) => info!(x = position.x, y = position.y, "Window moved"),
            Err(err) => error!(%err, "Failed to persist window position"),
        }
    }

    /// What to paint right now.
    pub fn frame(&self) -> Frame {
        if let Some(snapshot) = &self.snapshot {
            return Frame::Data(render::lines(snapshot, &self.currency));
        }

        let status = match &self.last_error {
            Some(err) => fl!("fetch-error", error = err.as_str()),
            None if self.connection.is_none() => fl!("connecting"),
            None => fl!("awaiting-data"),
        };
        Frame::Placeholder {
            title: fl!("app-title"),
            status,
        }
    }
}
