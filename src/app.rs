use iced::widget::{button, column, container, horizontal_space, row, scrollable, text};
use iced::Length::Fill;
use iced::{window, Alignment, Element, Size, Subscription, Task, Theme};
use uuid::Uuid;

use crate::admin::{self, Admin};
use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::engine::{self, MediaEngine};
use crate::now_playing::{self, NowPlaying};
use crate::stats::StatsClient;
use crate::toast::Toasts;

const APP_NAME: &str = "Dark Sprinter";

/// Remote endpoints and settings shared by both screens.
#[derive(Debug, Clone)]
pub struct Services {
    pub catalog: CatalogClient,
    pub stats: StatsClient,
    /// Plain client for cover art.
    pub http: reqwest::Client,
    pub config: Config,
}

impl Services {
    pub fn new(config: Config) -> Self {
        let http = reqwest::Client::new();
        Self {
            catalog: CatalogClient::with_client(http.clone(), config.tracks_api_url.clone()),
            stats: StatsClient::with_client(http.clone(), config.stats_api_url.clone()),
            http,
            config,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    NowPlaying,
    Admin,
}

struct App {
    screen: Screen,
    now_playing: NowPlaying,
    admin: Admin,
    media: MediaEngine,
    services: Services,
    toasts: Toasts,
}

#[derive(Debug, Clone)]
enum Message {
    Navigate(Screen),
    NowPlaying(now_playing::Message),
    Admin(admin::Message),
    Engine(engine::Event),
    DismissToast(Uuid),
}

pub fn run(config: Config) -> iced::Result {
    iced::application(App::title, App::update, App::view)
        .subscription(App::subscription)
        .theme(App::theme)
        .window(window::Settings {
            size: Size::new(1100.0, 820.0),
            min_size: Some(Size::new(760.0, 560.0)),
            ..Default::default()
        })
        .run_with(move || App::new(config))
}

impl App {
    fn new(config: Config) -> (Self, Task<Message>) {
        let services = Services::new(config);
        let (now_playing, load) = NowPlaying::new(&services);

        let app = App {
            screen: Screen::NowPlaying,
            now_playing,
            admin: Admin::default(),
            media: MediaEngine::default(),
            services,
            toasts: Toasts::default(),
        };

        (app, load.map(Message::NowPlaying))
    }

    fn title(&self) -> String {
        match self.now_playing.session().current() {
            Some(track) if self.now_playing.session().is_playing() => {
                format!("{} - {} | {APP_NAME}", track.title, track.artist)
            }
            _ => APP_NAME.to_string(),
        }
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::run(engine::events).map(Message::Engine)
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        let task = match message {
            Message::Navigate(screen) => {
                self.screen = screen;
                match screen {
                    Screen::Admin => self.admin.refresh(&self.services).map(Message::Admin),
                    Screen::NowPlaying => Task::none(),
                }
            }
            Message::NowPlaying(message) => self
                .now_playing
                .update(message, &mut self.media, &self.services, &mut self.toasts)
                .map(Message::NowPlaying),
            Message::Admin(message) => self
                .admin
                .update(message, &self.services, &mut self.toasts)
                .map(Message::Admin),
            Message::Engine(engine::Event::Ready(media)) => {
                tracing::info!("Audio output ready");
                self.media = media;
                self.now_playing.media_ready(&mut self.media);
                Task::none()
            }
            Message::Engine(engine::Event::Finished(url)) => self
                .now_playing
                .media_finished(&url, &mut self.media, &self.services)
                .map(Message::NowPlaying),
            Message::Engine(engine::Event::Failed(e)) => {
                self.toasts.error("Playback error", e);
                Task::none()
            }
            Message::Engine(engine::Event::Stopped(e)) => {
                tracing::warn!(error = %e, "Audio output lost");
                self.media = MediaEngine::default();
                self.toasts.error("Audio output unavailable", e);
                Task::none()
            }
            Message::DismissToast(id) => {
                self.toasts.dismiss(id);
                Task::none()
            }
        };

        Task::batch([task, self.toasts.expirations().map(Message::DismissToast)])
    }

    fn view(&self) -> Element<'_, Message> {
        let (heading, link, target) = match self.screen {
            Screen::NowPlaying => ("Live electronic music stream", "Admin", Screen::Admin),
            Screen::Admin => ("Admin panel", "Back to player", Screen::NowPlaying),
        };

        let mut header = row![
            column![text(APP_NAME).size(40), text(heading).color([0.6, 0.6, 0.6])].spacing(4),
            horizontal_space(),
        ]
        .align_y(Alignment::Center)
        .spacing(12);
        if !self.media.is_connected() {
            header = header.push(text("No audio output").size(13).color([1.0, 0.6, 0.3]));
        }
        header = header.push(button(link).on_press(Message::Navigate(target)));

        let body = match self.screen {
            Screen::NowPlaying => self
                .now_playing
                .view(self.services.config.upcoming_count)
                .map(Message::NowPlaying),
            Screen::Admin => self.admin.view().map(Message::Admin),
        };

        let content = column![
            header,
            self.toasts.view().map(Message::DismissToast),
            scrollable(body).height(Fill),
        ]
        .spacing(20)
        .padding([20, 30]);

        container(content).width(Fill).height(Fill).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let (app, _) = App::new(Config {
            tracks_api_url: "http://127.0.0.1:1/tracks".to_string(),
            stats_api_url: "http://127.0.0.1:1/stats".to_string(),
            ..Config::default()
        });
        app
    }

    #[test]
    fn lost_engine_disconnects_the_handle() {
        let mut app = app();
        let (media, _commands) = MediaEngine::attached();
        let _ = app.update(Message::Engine(engine::Event::Ready(media)));
        assert!(app.media.is_connected());

        let lost = engine::Event::Stopped("No audio output: no device".to_string());
        let _ = app.update(Message::Engine(lost));

        assert!(!app.media.is_connected());
        let toasts = app.toasts.items();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].title, "Audio output unavailable");
    }

    #[test]
    fn failed_track_keeps_the_engine() {
        let mut app = app();
        let (media, _commands) = MediaEngine::attached();
        let _ = app.update(Message::Engine(engine::Event::Ready(media)));

        let failed = engine::Event::Failed("Unable to decode media".to_string());
        let _ = app.update(Message::Engine(failed));

        assert!(app.media.is_connected());
        assert_eq!(app.toasts.items()[0].title, "Playback error");
    }
}
