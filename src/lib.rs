// SPDX-License-Identifier: GPL-3.0-only

pub mod backend;
pub mod config;
pub mod dashlet;
mod localize;
pub mod render;
pub mod settings;
pub mod snapshot;

use backend::refresh;
use config::DashletConfig;
use cosmic::{
    app,
    app::Core,
    iced::{event, window, Color, Point, Size, Subscription},
    Element, Task,
};
use dashlet::{DashletState, Effect, Event};
use settings::{Position, SettingsStore};
use std::path::PathBuf;
use tracing::warn;

pub fn run() -> cosmic::iced::Result {
    localize::localize();
    warn_if_not_composited();

    let config = DashletConfig::load();
    let settings = cosmic::app::Settings::default()
        .size(Size::new(render::WINDOW_WIDTH, render::WINDOW_HEIGHT))
        .resizable(None)
        .transparent(true)
        .exit_on_close(true);

    cosmic::app::run::<GaDashlet>(settings, Flags { config })
}

/// Wayland compositors always composite; under X11 it depends on a running compositing manager.
fn is_known_composited(wayland_display: Option<std::ffi::OsString>) -> bool {
    wayland_display.is_some_and(|display| !display.is_empty())
}

fn warn_if_not_composited() {
    if !is_known_composited(std::env::var_os("WAYLAND_DISPLAY")) {
        warn!("Display may not be composited; transparency will not work without a compositing manager");
    }
}

/// Key file and API root are baked into the session; changing either needs a new one.
fn needs_reconnect(old: &DashletConfig, new: &DashletConfig) -> bool {
    old.key_file != new.key_file || old.api_base_url != new.api_base_url
}

#[derive(Debug, Clone)]
pub struct Flags {
    pub config: DashletConfig,
}

pub struct GaDashlet {
    core: Core,
    config: DashletConfig,
    state: DashletState,
}

#[derive(Clone, Debug)]
pub enum Message {
    Dashlet(Event),
    ConfigChanged(DashletConfig),
}

impl cosmic::Application for GaDashlet {
    type Executor = cosmic::SingleThreadExecutor;
    type Flags = Flags;
    type Message = Message;
    const APP_ID: &'static str = config::APP_ID;

    fn core(&self) -> &Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut Core {
        &mut self.core
    }

    fn init(mut core: Core, flags: Self::Flags) -> (Self, app::Task<Self::Message>) {
        // Borderless: no header bar and no themed window background behind the surface.
        core.window.show_headerbar = false;
        core.window.content_container = false;

        let store = match SettingsStore::new() {
            Ok(store) => Some(store),
            Err(err) => {
                warn!(%err, "Window position will not be persisted");
                None
            }
        };

        let config = flags.config;
        let mut state = DashletState::new(store, config.currency.clone());
        let startup = state.dispatch(Event::Tick);

        let mut tasks = Vec::new();
        if let Some(id) = core.main_window_id() {
            let Position { x, y } = state.position();
            tasks.push(window::move_to(id, Point::new(x as f32, y as f32)));
            tasks.push(window::change_level(id, window::Level::AlwaysOnTop));
        }

        let dashlet = Self { core, config, state };
        tasks.push(dashlet.perform(startup));

        (dashlet, Task::batch(tasks))
    }

    fn subscription(&self) -> Subscription<Self::Message> {
        let config_watcher = self.core.watch_config(Self::APP_ID).map(|u| {
            for err in u.errors {
                tracing::error!(?err, "Error watching config");
            }
            Message::ConfigChanged(u.config)
        });

        let moves = event::listen_with(|event, _status, _id| match event {
            cosmic::iced::Event::Window(window::Event::Moved(point)) => Some(Message::Dashlet(Event::Moved(
                Position::new(point.x as i32, point.y as i32),
            ))),
            _ => None,
        });

        Subscription::batch([
            config_watcher,
            moves,
            refresh::tick_subscription(self.config.poll_interval_secs).map(|_| Message::Dashlet(Event::Tick)),
        ])
    }

    fn update(&mut self, message: Self::Message) -> app::Task<Self::Message> {
        match message {
            Message::Dashlet(event) => {
                let effect = self.state.dispatch(event);
                return self.perform(effect);
            }
            Message::ConfigChanged(mut config) => {
                config.validate();
                let reconnect = needs_reconnect(&self.config, &config);
                self.state.set_currency(config.currency.clone());
                self.config = config;
                if reconnect {
                    let effect = self.state.reconnect();
                    return self.perform(effect);
                }
            }
        }
        Task::none()
    }

    fn view(&self) -> Element<'_, Self::Message> {
        render::surface(self.state.frame())
    }

    fn style(&self) -> Option<cosmic::iced_runtime::Appearance> {
        Some(cosmic::iced_runtime::Appearance {
            background_color: Color::TRANSPARENT,
            text_color: Color::WHITE,
            icon_color: Color::WHITE,
        })
    }
}

impl GaDashlet {
    /// Turn a dispatcher effect into toolkit work.
    fn perform(&self, effect: Effect) -> app::Task<Message> {
        match effect {
            // Every update is followed by a redraw, so repaints need no task.
            Effect::None | Effect::Repaint => Task::none(),
            Effect::Connect => {
                let key_file = PathBuf::from(&self.config.key_file);
                let api_base_url = self.config.api_base_url.clone();
                cosmic::task::future(async move {
                    let result = backend::connect(&key_file, &api_base_url)
                        .await
                        .map_err(|err| format!("{err:#}"));
                    Message::Dashlet(Event::Connected(result))
                })
            }
            Effect::Fetch { client, profile } => cosmic::task::future(async move {
                let result = refresh::refresh(&client, &profile).await.map_err(|err| err.to_string());
                Message::Dashlet(Event::Refreshed(result))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_a_wayland_session_counts_as_composited() {
        assert!(is_known_composited(Some("wayland-0".into())));
        assert!(!is_known_composited(Some("".into())));
        assert!(!is_known_composited(None));
    }

    #[test]
    fn only_session_settings_trigger_reconnect() {
        let old = DashletConfig::default();

        let currency = DashletConfig {
            currency: "USD".into(),
            poll_interval_secs: 60,
            ..old.clone()
        };
        assert!(!needs_reconnect(&old, &currency));

        let key_file = DashletConfig {
            key_file: "/etc/ga-dashlet/key.json".into(),
            ..old.clone()
        };
        assert!(needs_reconnect(&old, &key_file));

        let api = DashletConfig {
            api_base_url: "http://localhost:8080".into(),
            ..old.clone()
        };
        assert!(needs_reconnect(&old, &api));
    }
}
