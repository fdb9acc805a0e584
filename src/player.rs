//! Playlist cursor and play/pause state for one listening session.
//!
//! The session is a plain value owned by the UI. The controller functions
//! below take it by reference together with the [`MediaPlayer`] they drive,
//! and hand back the [`ListenReport`] a transition produced so the caller
//! can submit it without waiting on the result.

use std::time::{Duration, Instant};

use crate::error::PlayerError;
use crate::track::{ListenReport, Track};

/// The playback primitive the controller drives.
pub trait MediaPlayer {
    /// Replace the current source. The player stays paused until [`play`](Self::play).
    fn load(&mut self, url: &str);
    fn play(&mut self);
    fn pause(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Loading,
    /// The playlist came back empty or could not be fetched.
    Empty,
    Paused,
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Forward,
    Backward,
    /// Absolute playlist index.
    Jump(usize),
}

#[derive(Debug, Clone)]
pub struct PlayerSession {
    playlist: Vec<Track>,
    index: usize,
    state: PlayerState,
    started_at: Option<Instant>,
}

impl Default for PlayerSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerSession {
    pub fn new() -> Self {
        Self {
            playlist: Vec::new(),
            index: 0,
            state: PlayerState::Loading,
            started_at: None,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Playing
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn playlist(&self) -> &[Track] {
        &self.playlist
    }

    pub fn current(&self) -> Option<&Track> {
        match self.state {
            PlayerState::Paused | PlayerState::Playing => self.playlist.get(self.index),
            PlayerState::Loading | PlayerState::Empty => None,
        }
    }

    /// Up to `count` tracks following the current one, wrapping around the
    /// end of the playlist, each paired with its absolute index.
    pub fn upcoming(&self, count: usize) -> Vec<(usize, &Track)> {
        if self.current().is_none() {
            return Vec::new();
        }

        let len = self.playlist.len();
        (1..len)
            .take(count)
            .map(|offset| {
                let index = (self.index + offset) % len;
                (index, &self.playlist[index])
            })
            .collect()
    }

    fn target(&self, motion: Motion) -> Result<usize, PlayerError> {
        if self.current().is_none() {
            return Err(PlayerError::NotReady);
        }

        let len = self.playlist.len();
        match motion {
            Motion::Forward => Ok((self.index + 1) % len),
            Motion::Backward => Ok((self.index + len - 1) % len),
            Motion::Jump(index) if index < len => Ok(index),
            Motion::Jump(index) => Err(PlayerError::IndexOutOfRange { index, len }),
        }
    }
}

/// Install a freshly fetched playlist and cue its first track.
pub fn load_playlist(
    session: &mut PlayerSession,
    tracks: Vec<Track>,
    media: &mut impl MediaPlayer,
) {
    session.playlist = tracks;
    session.index = 0;
    session.started_at = None;

    match session.playlist.first() {
        Some(first) => {
            session.state = PlayerState::Paused;
            media.load(&first.youtube_url);
            tracing::info!(tracks = session.playlist.len(), "Playlist loaded");
        }
        None => {
            session.state = PlayerState::Empty;
            tracing::info!("Playlist is empty");
        }
    }
}

pub fn playlist_failed(session: &mut PlayerSession) {
    session.playlist.clear();
    session.index = 0;
    session.started_at = None;
    session.state = PlayerState::Empty;
}

/// Flip between paused and playing. Starting playback stamps the start
/// time the next listen report is measured from.
pub fn toggle(
    session: &mut PlayerSession,
    media: &mut impl MediaPlayer,
    now: Instant,
) -> Result<PlayerState, PlayerError> {
    session.state = match session.state {
        PlayerState::Paused => {
            session.started_at = Some(now);
            media.play();
            PlayerState::Playing
        }
        PlayerState::Playing => {
            media.pause();
            PlayerState::Paused
        }
        PlayerState::Loading | PlayerState::Empty => return Err(PlayerError::NotReady),
    };
    Ok(session.state)
}

/// Move the cursor. If a start time was recorded, the time since then is
/// reported against the track being left. The new track is cued and, when
/// the session is playing, started.
pub fn advance(
    session: &mut PlayerSession,
    motion: Motion,
    media: &mut impl MediaPlayer,
    now: Instant,
) -> Result<Option<ListenReport>, PlayerError> {
    let target = session.target(motion)?;

    let report = session.started_at.map(|started_at| ListenReport {
        track_id: session.playlist[session.index].id,
        duration_seconds: now.saturating_duration_since(started_at).as_secs(),
    });

    session.index = target;
    session.started_at = Some(now);

    let track = &session.playlist[target];
    media.load(&track.youtube_url);
    if session.is_playing() {
        media.play();
    }

    tracing::debug!(index = target, title = %track.title, ?motion, "Advanced");
    Ok(report)
}

/// Outcome of a natural end of the current track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackEnded {
    pub report: Option<ListenReport>,
    /// When set, play should be invoked again after this delay via
    /// [`resume_after_gap`] to cover the sink's buffering gap.
    pub resume_after: Option<Duration>,
}

pub fn track_ended(
    session: &mut PlayerSession,
    media: &mut impl MediaPlayer,
    now: Instant,
    grace: Duration,
) -> Result<TrackEnded, PlayerError> {
    let report = advance(session, Motion::Forward, media, now)?;
    Ok(TrackEnded {
        report,
        resume_after: session.is_playing().then_some(grace),
    })
}

/// Second play after a natural track end. Ignored if the user paused or
/// moved on to another track in the meantime.
pub fn resume_after_gap(
    session: &PlayerSession,
    expected_index: usize,
    media: &mut impl MediaPlayer,
) {
    if session.is_playing() && session.index == expected_index {
        media.play();
    }
}
