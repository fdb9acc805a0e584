use std::time::Instant;

use iced::widget::{button, center, column, container, image, keyed_column, row, text};
use iced::Length::Fill;
use iced::{Alignment, Element, Length, Task};

use crate::app::Services;
use crate::catalog::TrackCatalog;
use crate::download;
use crate::engine::MediaEngine;
use crate::player::{self, MediaPlayer, Motion, PlayerSession, PlayerState};
use crate::toast::Toasts;
use crate::track::{ListenReport, Track};

const COVER_SIZE: f32 = 256.0;

/// The "now playing" screen.
#[derive(Debug, Default)]
pub struct NowPlaying {
    session: PlayerSession,
    cover: Option<(String, image::Handle)>,
}

#[derive(Debug, Clone)]
pub enum Message {
    Loaded(Result<Vec<Track>, String>),
    TogglePlay,
    Next,
    Previous,
    Jump(usize),
    /// Carries the index that was current when the resume was scheduled.
    ResumeAfterGap(usize),
    CoverLoaded(String, Result<Vec<u8>, String>),
}

impl NowPlaying {
    pub fn new(services: &Services) -> (Self, Task<Message>) {
        let catalog = services.catalog.clone();
        let limit = services.config.playlist_limit;

        (
            Self::default(),
            Task::perform(
                async move { catalog.list(Some(limit)).await.map_err(|e| e.to_string()) },
                Message::Loaded,
            ),
        )
    }

    pub fn session(&self) -> &PlayerSession {
        &self.session
    }

    pub fn update(
        &mut self,
        message: Message,
        media: &mut MediaEngine,
        services: &Services,
        toasts: &mut Toasts,
    ) -> Task<Message> {
        match message {
            Message::Loaded(Ok(tracks)) => {
                player::load_playlist(&mut self.session, tracks, media);
                self.fetch_cover(services)
            }
            Message::Loaded(Err(e)) => {
                tracing::error!(error = %e, "Failed to load playlist");
                player::playlist_failed(&mut self.session);
                toasts.error("Error", "Unable to load tracks");
                Task::none()
            }
            Message::TogglePlay => {
                if let Err(e) = player::toggle(&mut self.session, media, Instant::now()) {
                    tracing::debug!(error = %e, "Toggle ignored");
                }
                Task::none()
            }
            Message::Next => self.advance(Motion::Forward, media, services),
            Message::Previous => self.advance(Motion::Backward, media, services),
            Message::Jump(index) => self.advance(Motion::Jump(index), media, services),
            Message::ResumeAfterGap(index) => {
                player::resume_after_gap(&self.session, index, media);
                Task::none()
            }
            Message::CoverLoaded(url, Ok(bytes)) => {
                let still_current = self
                    .session
                    .current()
                    .is_some_and(|track| track.cover_url == url);
                if still_current {
                    self.cover = Some((url, image::Handle::from_bytes(bytes)));
                }
                Task::none()
            }
            Message::CoverLoaded(url, Err(e)) => {
                tracing::warn!(error = %e, %url, "Failed to load cover");
                Task::none()
            }
        }
    }

    /// The engine came up; cue whatever is current.
    pub fn media_ready(&self, media: &mut MediaEngine) {
        if let Some(track) = self.session.current() {
            media.load(&track.youtube_url);
            if self.session.is_playing() {
                media.play();
            }
        }
    }

    /// The source cued from `url` played out. Ignored if the user has
    /// already moved on to another track.
    pub fn media_finished(
        &mut self,
        url: &str,
        media: &mut MediaEngine,
        services: &Services,
    ) -> Task<Message> {
        let current = self.session.current().map(|track| track.youtube_url.as_str());
        if current != Some(url) {
            tracing::debug!(%url, "Stale track end ignored");
            return Task::none();
        }

        let grace = services.config.resume_grace;
        let ended = match player::track_ended(&mut self.session, media, Instant::now(), grace) {
            Ok(ended) => ended,
            Err(e) => {
                tracing::debug!(error = %e, "Track end ignored");
                return Task::none();
            }
        };

        let resume = match ended.resume_after {
            Some(delay) => {
                let index = self.session.index();
                Task::perform(async move { tokio::time::sleep(delay).await }, move |_| {
                    Message::ResumeAfterGap(index)
                })
            }
            None => Task::none(),
        };

        Task::batch([
            report_listen(ended.report, services),
            resume,
            self.fetch_cover(services),
        ])
    }

    fn advance(
        &mut self,
        motion: Motion,
        media: &mut MediaEngine,
        services: &Services,
    ) -> Task<Message> {
        match player::advance(&mut self.session, motion, media, Instant::now()) {
            Ok(report) => {
                Task::batch([report_listen(report, services), self.fetch_cover(services)])
            }
            Err(e) => {
                tracing::warn!(error = %e, ?motion, "Advance rejected");
                Task::none()
            }
        }
    }

    fn fetch_cover(&mut self, services: &Services) -> Task<Message> {
        let Some(track) = self.session.current() else {
            self.cover = None;
            return Task::none();
        };

        let url = track.cover_url.clone();
        if self.cover.as_ref().is_some_and(|(cached, _)| *cached == url) {
            return Task::none();
        }
        self.cover = None;
        if url.is_empty() {
            return Task::none();
        }

        let http = services.http.clone();
        Task::perform(
            async move {
                let bytes = download::fetch_bytes(&http, &url).await.map_err(|e| e.to_string());
                (url, bytes)
            },
            |(url, bytes)| Message::CoverLoaded(url, bytes),
        )
    }

    pub fn view(&self, upcoming_count: usize) -> Element<'_, Message> {
        let track = match (self.session.state(), self.session.current()) {
            (PlayerState::Loading, _) => {
                return center(text("Loading tracks...").size(20)).height(200).into()
            }
            (_, Some(track)) => track,
            (_, None) => {
                return center(text("No tracks yet").size(20).color([0.7, 0.7, 0.7]))
                    .height(200)
                    .into()
            }
        };

        let playing = self.session.is_playing();

        let cover: Element<_> = match &self.cover {
            Some((_, handle)) => image(handle.clone())
                .width(COVER_SIZE)
                .height(COVER_SIZE)
                .into(),
            None => container(text(&track.album).size(18).color([0.6, 0.6, 0.6]))
                .center(COVER_SIZE)
                .style(container::rounded_box)
                .into(),
        };

        let mut details = column![
            text(&track.title).size(32),
            text(&track.artist).size(20),
            text(format!("{} • {}", track.album, track.year))
                .size(14)
                .color([0.6, 0.6, 0.6]),
        ]
        .spacing(6);
        if let Some(plays) = track.play_count {
            details = details.push(text(format!("{plays} plays")).size(12).color([0.5, 0.5, 0.5]));
        }

        let status = format!(
            "{} · track {} of {}",
            if playing { "On air" } else { "Paused" },
            self.session.index() + 1,
            self.session.playlist().len()
        );
        let controls = row![
            button("<<").on_press(Message::Previous),
            button(if playing { "Pause" } else { "Play" })
                .on_press(Message::TogglePlay)
                .padding([10, 24]),
            button(">>").on_press(Message::Next),
        ]
        .spacing(20)
        .align_y(Alignment::Center);

        let now = row![
            cover,
            column![details, text(status).size(14), controls].spacing(16)
        ]
        .spacing(32)
        .align_y(Alignment::Center);

        let upcoming = keyed_column(self.session.upcoming(upcoming_count).into_iter().map(
            |(index, next)| {
                let item: Element<'_, Message> = button(row![
                    text(&next.title).width(Length::FillPortion(3)),
                    text(&next.artist)
                        .width(Length::FillPortion(2))
                        .color([0.6, 0.6, 0.6]),
                ])
                .on_press(Message::Jump(index))
                .width(Fill)
                .into();

                (next.id, item)
            },
        ))
        .spacing(6);

        column![now, text("Up next").size(20), upcoming]
            .spacing(20)
            .into()
    }
}

fn report_listen(report: Option<ListenReport>, services: &Services) -> Task<Message> {
    match report {
        Some(report) => {
            Task::perform(services.stats.clone().record_logged(report), |_| ()).discard()
        }
        None => Task::none(),
    }
}
