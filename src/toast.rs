use std::time::Duration;

use iced::widget::{button, column, container, horizontal_space, row, text};
use iced::{Element, Length, Task};
use uuid::Uuid;

/// How long a notification stays on screen unless dismissed.
pub const TOAST_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: Uuid,
    pub level: Level,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Default)]
pub struct Toasts {
    items: Vec<Toast>,
    unscheduled: Vec<Uuid>,
}

impl Toasts {
    pub fn info(&mut self, title: impl Into<String>, body: impl Into<String>) -> Uuid {
        self.push(Level::Info, title.into(), body.into())
    }

    pub fn error(&mut self, title: impl Into<String>, body: impl Into<String>) -> Uuid {
        self.push(Level::Error, title.into(), body.into())
    }

    fn push(&mut self, level: Level, title: String, body: String) -> Uuid {
        let id = Uuid::new_v4();
        self.items.push(Toast {
            id,
            level,
            title,
            body,
        });
        self.unscheduled.push(id);
        id
    }

    pub fn dismiss(&mut self, id: Uuid) {
        self.items.retain(|toast| toast.id != id);
    }

    pub fn items(&self) -> &[Toast] {
        &self.items
    }

    /// Expiry timers for every toast pushed since the last call. Each task
    /// resolves to the id to dismiss.
    pub fn expirations(&mut self) -> Task<Uuid> {
        Task::batch(self.unscheduled.drain(..).map(|id| {
            Task::perform(async { tokio::time::sleep(TOAST_TTL).await }, move |_| id)
        }))
    }

    pub fn view(&self) -> Element<'_, Uuid> {
        let toasts = self.items.iter().map(|toast| {
            let color = match toast.level {
                Level::Info => [0.6, 0.9, 0.6],
                Level::Error => [1.0, 0.45, 0.45],
            };
            let content = row![
                column![text(&toast.title).size(16).color(color), text(&toast.body).size(14)]
                    .spacing(2),
                horizontal_space(),
                button("x").on_press(toast.id),
            ]
            .spacing(10);

            container(content)
                .padding(10)
                .width(Length::Fill)
                .style(container::rounded_box)
                .into()
        });

        column(toasts).spacing(6).into()
    }
}
