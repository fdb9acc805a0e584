use iced::widget::{button, column, container, row, scrollable, text, text_editor};
use iced::Length::Fill;
use iced::{Alignment, Element, Length, Task};

use crate::app::Services;
use crate::catalog::TrackCatalog;
use crate::importer::{self, ImportReport};
use crate::toast::Toasts;
use crate::track::{Stat, Track};
use crate::utils::format_duration;

/// Rows shown in the recent-tracks list and the leaderboard.
const LIST_LEN: usize = 10;
const FORMAT_HINT: &str = "Media URL | Title | Artist | Year | Album | Cover";
const PLACEHOLDER: &str = "https://youtube.com/watch?v=xxx | Midnight Dreams | Electronic Pulse \
                           | 2024 | Night Waves | https://example.com/cover.jpg";

/// Catalog management screen: bulk import plus play statistics.
#[derive(Debug, Default)]
pub struct Admin {
    tracks: Vec<Track>,
    stats: Vec<Stat>,
    bulk: text_editor::Content,
    importing: bool,
}

#[derive(Debug, Clone)]
pub enum Message {
    TracksLoaded(Result<Vec<Track>, String>),
    StatsLoaded(Result<Vec<Stat>, String>),
    Edit(text_editor::Action),
    Import,
    Imported(ImportReport),
}

impl Admin {
    /// Fetch the catalog and the statistics. Called whenever the screen is
    /// opened and after every import.
    pub fn refresh(&self, services: &Services) -> Task<Message> {
        let catalog = services.catalog.clone();
        let stats = services.stats.clone();

        Task::batch([
            Task::perform(
                async move { catalog.list(None).await.map_err(|e| e.to_string()) },
                Message::TracksLoaded,
            ),
            Task::perform(
                async move { stats.list().await.map_err(|e| e.to_string()) },
                Message::StatsLoaded,
            ),
        ])
    }

    pub fn update(
        &mut self,
        message: Message,
        services: &Services,
        toasts: &mut Toasts,
    ) -> Task<Message> {
        match message {
            Message::TracksLoaded(Ok(tracks)) => {
                self.tracks = tracks;
                Task::none()
            }
            Message::TracksLoaded(Err(e)) => {
                tracing::error!(error = %e, "Failed to load tracks");
                toasts.error("Error", "Unable to load tracks");
                Task::none()
            }
            Message::StatsLoaded(Ok(stats)) => {
                self.stats = stats;
                Task::none()
            }
            Message::StatsLoaded(Err(e)) => {
                tracing::warn!(error = %e, "Failed to load stats");
                Task::none()
            }
            Message::Edit(action) => {
                if !self.importing {
                    self.bulk.perform(action);
                }
                Task::none()
            }
            Message::Import => {
                let input = self.bulk.text();
                if self.importing || importer::count_lines(&input) == 0 {
                    return Task::none();
                }
                self.importing = true;

                let catalog = services.catalog.clone();
                let defaults = services.config.import_defaults.clone();
                Task::perform(
                    async move { importer::import(&catalog, &input, &defaults).await },
                    Message::Imported,
                )
            }
            Message::Imported(report) => {
                self.importing = false;
                self.bulk = text_editor::Content::new();
                toasts.info(
                    "Tracks added",
                    format!("Added: {}, errors: {}", report.succeeded, report.failed),
                );
                self.refresh(services)
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let top = top_track(&self.stats).unwrap_or("No data");
        let summary = row![
            card("Total tracks", self.tracks.len().to_string()),
            card("Total plays", total_plays(&self.stats).to_string()),
            card("Top track", top.to_string()),
        ]
        .spacing(16);

        let pending = importer::count_lines(&self.bulk.text());
        let label = if self.importing {
            "Adding tracks...".to_string()
        } else {
            format!("Add tracks ({pending})")
        };
        let submit = button(text(label).width(Fill).center())
            .on_press_maybe((!self.importing && pending > 0).then_some(Message::Import))
            .width(Fill);

        let bulk = container(
            column![
                text("Bulk add tracks").size(24),
                text(format!("Format: {FORMAT_HINT}")).color([0.6, 0.6, 0.6]),
                text("At least 3 fields (URL, title, artist). One track per line.")
                    .size(13)
                    .color([0.5, 0.5, 0.5]),
                text_editor(&self.bulk)
                    .placeholder(PLACEHOLDER)
                    .on_action(Message::Edit)
                    .height(200),
                submit,
            ]
            .spacing(10),
        )
        .padding(16)
        .style(container::rounded_box);

        let recent = column(self.tracks.iter().take(LIST_LEN).map(|track| {
            column![
                text(&track.title).size(16),
                text(format!("{} • {}", track.artist, track.year))
                    .size(13)
                    .color([0.6, 0.6, 0.6]),
                text(&track.youtube_url).size(11).color([0.45, 0.45, 0.45]),
            ]
            .spacing(2)
            .into()
        }))
        .spacing(12);

        let leaderboard = column(self.stats.iter().take(LIST_LEN).enumerate().map(|(rank, stat)| {
            let mut facts = row![text(format!("{} plays", stat.plays()))].spacing(12);
            if let Some(seconds) = stat.total_duration {
                facts = facts.push(text(format!("listened {}", format_duration(seconds))));
            }
            if let Some(date) = stat.last_played_date() {
                facts = facts.push(text(format!("last: {}", date.format("%Y-%m-%d"))));
            }

            row![
                text(format!("{}", rank + 1)).size(18).width(32),
                column![
                    text(&stat.title).size(16),
                    text(&stat.artist).size(13).color([0.6, 0.6, 0.6]),
                    facts,
                ]
                .spacing(2),
            ]
            .align_y(Alignment::Center)
            .into()
        }))
        .spacing(12);

        let lists = row![
            panel("Latest tracks", recent.into()),
            panel("Top tracks", leaderboard.into()),
        ]
        .spacing(16);

        column![summary, bulk, lists].spacing(24).into()
    }
}

pub fn total_plays(stats: &[Stat]) -> u64 {
    stats.iter().map(Stat::plays).sum()
}

/// Title of the most played track. The backend sorts by plays, so this is
/// simply the first entry.
pub fn top_track(stats: &[Stat]) -> Option<&str> {
    stats.first().map(|stat| stat.title.as_str())
}

fn card<'a>(label: &'a str, value: String) -> Element<'a, Message> {
    container(column![text(label).size(13).color([0.6, 0.6, 0.6]), text(value).size(24)].spacing(4))
        .padding(16)
        .width(Length::FillPortion(1))
        .style(container::rounded_box)
        .into()
}

fn panel<'a>(title: &'a str, body: Element<'a, Message>) -> Element<'a, Message> {
    container(column![text(title).size(22), scrollable(body).height(400)].spacing(12))
        .padding(16)
        .width(Length::FillPortion(1))
        .style(container::rounded_box)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::toast::Level;

    fn services() -> Services {
        Services::new(Config {
            tracks_api_url: "http://127.0.0.1:1/tracks".to_string(),
            stats_api_url: "http://127.0.0.1:1/stats".to_string(),
            ..Config::default()
        })
    }

    fn with_input(text: &str) -> Admin {
        Admin {
            bulk: text_editor::Content::with_text(text),
            ..Admin::default()
        }
    }

    fn stat(id: i64, title: &str, plays: Option<u64>) -> Stat {
        Stat {
            id,
            title: title.to_string(),
            artist: "Artist".to_string(),
            total_plays: plays,
            total_duration: None,
            last_played: None,
        }
    }

    #[test]
    fn totals_sum_plays_and_treat_missing_as_zero() {
        let stats = [stat(1, "A", Some(7)), stat(2, "B", None), stat(3, "C", Some(2))];

        assert_eq!(total_plays(&stats), 9);
    }

    #[test]
    fn top_track_is_first_as_received() {
        let stats = [stat(1, "Low", Some(1)), stat(2, "High", Some(50))];

        assert_eq!(top_track(&stats), Some("Low"));
        assert_eq!(top_track(&[]), None);
    }

    #[test]
    fn blank_input_is_not_imported() {
        let mut admin = with_input("  \n\n ");
        let mut toasts = Toasts::default();

        let _ = admin.update(Message::Import, &services(), &mut toasts);

        assert!(!admin.importing);
    }

    #[test]
    fn import_is_not_started_twice() {
        let services = services();
        let mut toasts = Toasts::default();
        let mut admin = with_input("u1|T1|Ar1");

        let _ = admin.update(Message::Import, &services, &mut toasts);
        assert!(admin.importing);

        let typing = text_editor::Action::Edit(text_editor::Edit::Insert('x'));
        let _ = admin.update(Message::Edit(typing), &services, &mut toasts);
        let _ = admin.update(Message::Import, &services, &mut toasts);
        assert!(admin.importing);
        assert_eq!(admin.bulk.text().trim_end(), "u1|T1|Ar1");
    }

    #[test]
    fn finished_import_clears_input_and_reports_counts() {
        let mut admin = with_input("u1|T1|Ar1\nbad\nu2|T2|Ar2");
        admin.importing = true;
        let mut toasts = Toasts::default();

        let report = ImportReport {
            succeeded: 2,
            failed: 1,
        };
        let _ = admin.update(Message::Imported(report), &services(), &mut toasts);

        assert!(!admin.importing);
        assert_eq!(importer::count_lines(&admin.bulk.text()), 0);
        let toast = &toasts.items()[0];
        assert_eq!(toast.level, Level::Info);
        assert_eq!(toast.title, "Tracks added");
        assert_eq!(toast.body, "Added: 2, errors: 1");
    }

    #[test]
    fn only_a_failed_track_list_is_toasted() {
        let services = services();
        let mut admin = Admin::default();
        let mut toasts = Toasts::default();

        let _ = admin.update(Message::StatsLoaded(Err("timeout".into())), &services, &mut toasts);
        assert!(toasts.items().is_empty());

        let _ = admin.update(Message::TracksLoaded(Err("timeout".into())), &services, &mut toasts);
        assert_eq!(toasts.items().len(), 1);
        assert_eq!(toasts.items()[0].level, Level::Error);
        assert_eq!(toasts.items()[0].body, "Unable to load tracks");
    }
}
