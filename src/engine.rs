//! Audio output.
//!
//! A rodio sink lives on a blocking thread and is driven through a command
//! channel. Loading runs on the async runtime so that a slow or endless
//! download never holds up play and pause; the decoded source is handed
//! back to the thread once it is ready. The thread reports to the UI
//! through an event stream: first [`Event::Ready`] carrying the
//! [`MediaEngine`] handle, then [`Event::Finished`] whenever a cued track
//! plays out, and [`Event::Stopped`] if the engine goes away.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use iced::futures::{SinkExt, Stream};
use rodio::{Decoder, OutputStream, Sink};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::download::{Download, StreamReader};
use crate::error::MediaError;
use crate::player::MediaPlayer;

const EVENT_BUFFER: usize = 100;
/// How often the engine thread checks for cued sources and a dry sink.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

type Events = tokio::sync::mpsc::Sender<Event>;

#[derive(Debug, Clone)]
pub enum Event {
    Ready(MediaEngine),
    /// The source cued from this URL played out.
    Finished(String),
    /// A single track could not be loaded. The engine keeps running.
    Failed(String),
    /// The engine is gone; commands are no longer heard.
    Stopped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Load(String),
    Play,
    Pause,
}

/// Handle to the engine thread. The default value is disconnected and
/// drops every command until the engine reports ready.
#[derive(Debug, Clone, Default)]
pub struct MediaEngine {
    commands: Option<mpsc::Sender<Command>>,
}

impl MediaEngine {
    pub fn is_connected(&self) -> bool {
        self.commands.is_some()
    }

    /// A handle whose commands land in the returned receiver.
    #[cfg(test)]
    pub(crate) fn attached() -> (Self, Receiver<Command>) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                commands: Some(sender),
            },
            receiver,
        )
    }

    fn send(&self, command: Command) {
        match &self.commands {
            Some(sender) => {
                if sender.send(command).is_err() {
                    tracing::warn!("Media engine has stopped");
                }
            }
            None => tracing::debug!(?command, "Media engine not ready, dropping command"),
        }
    }
}

impl MediaPlayer for MediaEngine {
    fn load(&mut self, url: &str) {
        self.send(Command::Load(url.to_string()));
    }

    fn play(&mut self) {
        self.send(Command::Play);
    }

    fn pause(&mut self) {
        self.send(Command::Pause);
    }
}

/// Start the engine thread and stream its events.
pub fn events() -> impl Stream<Item = Event> {
    iced::stream::channel(EVENT_BUFFER, |mut output| async move {
        let (event_tx, mut event_rx) = tokio::sync::mpsc::channel(EVENT_BUFFER);
        let runtime = Handle::current();

        tokio::task::spawn_blocking(move || {
            if let Err(e) = serve(&event_tx, runtime) {
                tracing::error!(error = %e, "Media engine failed");
                let _ = event_tx.blocking_send(Event::Stopped(e.to_string()));
            }
            tracing::info!("Media engine stopped");
        });

        while let Some(event) = event_rx.recv().await {
            if output.send(event).await.is_err() {
                break;
            }
        }
    })
}

/// Open the audio device, announce the engine and run it until every
/// handle is dropped.
fn serve(events: &Events, runtime: Handle) -> Result<(), MediaError> {
    let (_stream, stream_handle) = OutputStream::try_default()?;
    let sink = Sink::try_new(&stream_handle)?;

    let (command_tx, command_rx) = mpsc::channel();
    let ready = Event::Ready(MediaEngine {
        commands: Some(command_tx),
    });
    if events.blocking_send(ready).is_err() {
        return Ok(());
    }

    tracing::info!("Media engine started");
    Engine::new(sink, runtime).run(&command_rx, events);
    Ok(())
}

/// What the engine loop plays into.
trait Output {
    type Source: Send + 'static;

    /// Runs on a blocking worker and may read as much of the stream as it
    /// needs.
    fn decode(reader: StreamReader) -> Result<Self::Source, MediaError>;
    fn cue(&self, source: Self::Source);
    fn clear(&self);
    fn play(&self);
    fn pause(&self);
    /// Playing and nothing left to play.
    fn drained(&self) -> bool;
}

impl Output for Sink {
    type Source = Decoder<StreamReader>;

    fn decode(reader: StreamReader) -> Result<Self::Source, MediaError> {
        Ok(Decoder::new(reader)?)
    }

    fn cue(&self, source: Self::Source) {
        self.append(source);
    }

    fn clear(&self) {
        Sink::clear(self);
    }

    fn play(&self) {
        Sink::play(self);
    }

    fn pause(&self) {
        Sink::pause(self);
    }

    fn drained(&self) -> bool {
        !self.is_paused() && self.empty()
    }
}

/// A finished load, tagged with the load it answers.
struct Cue<S> {
    generation: u64,
    url: String,
    result: Result<S, MediaError>,
}

struct Loading {
    download: Download,
    task: JoinHandle<()>,
}

struct Engine<O: Output> {
    output: O,
    runtime: Handle,
    client: reqwest::Client,
    cue_tx: mpsc::Sender<Cue<O::Source>>,
    cue_rx: Receiver<Cue<O::Source>>,
    /// Bumped on every load; cues from older loads are dropped.
    generation: u64,
    loading: Option<Loading>,
    /// URL of the source sitting in the output.
    cued: Option<String>,
}

impl<O: Output> Engine<O> {
    fn new(output: O, runtime: Handle) -> Self {
        let (cue_tx, cue_rx) = mpsc::channel();
        Self {
            output,
            runtime,
            client: reqwest::Client::new(),
            cue_tx,
            cue_rx,
            generation: 0,
            loading: None,
            cued: None,
        }
    }

    /// Serve commands until every [`MediaEngine`] handle is dropped or the
    /// UI stops listening.
    fn run(mut self, commands: &Receiver<Command>, events: &Events) {
        loop {
            match commands.recv_timeout(POLL_INTERVAL) {
                Ok(Command::Load(url)) => self.load(url),
                Ok(Command::Play) => self.output.play(),
                Ok(Command::Pause) => self.output.pause(),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if !self.poll(events) {
                break;
            }
        }

        self.cancel_loading();
    }

    fn load(&mut self, url: String) {
        self.output.clear();
        self.cued = None;
        self.cancel_loading();
        self.generation += 1;

        let download = Download::new();
        let task = self.runtime.spawn(fetch(
            self.client.clone(),
            download.clone(),
            url,
            self.generation,
            O::decode,
            self.cue_tx.clone(),
        ));
        self.loading = Some(Loading { download, task });
    }

    fn cancel_loading(&mut self) {
        if let Some(loading) = self.loading.take() {
            loading.task.abort();
            loading.download.cancel();
        }
    }

    /// Take in finished loads and report a played-out source. Returns
    /// false once the UI has stopped listening.
    fn poll(&mut self, events: &Events) -> bool {
        while let Ok(cue) = self.cue_rx.try_recv() {
            if cue.generation != self.generation {
                continue;
            }
            match cue.result {
                Ok(source) => {
                    self.output.cue(source);
                    tracing::debug!(url = %cue.url, "Track cued");
                    self.cued = Some(cue.url);
                }
                Err(e) => {
                    tracing::warn!(error = %e, url = %cue.url, "Unable to cue track");
                    self.cancel_loading();
                    if events.blocking_send(Event::Failed(e.to_string())).is_err() {
                        return false;
                    }
                }
            }
        }

        if self.cued.is_some() && self.output.drained() {
            if let Some(url) = self.cued.take() {
                return events.blocking_send(Event::Finished(url)).is_ok();
            }
        }

        true
    }
}

/// Start the download and decode it off the engine thread.
async fn fetch<S: Send + 'static>(
    client: reqwest::Client,
    download: Download,
    url: String,
    generation: u64,
    decode: fn(StreamReader) -> Result<S, MediaError>,
    cues: mpsc::Sender<Cue<S>>,
) {
    let result = match download.start(&client, &url).await {
        Ok(reader) => tokio::task::spawn_blocking(move || decode(reader))
            .await
            .unwrap_or_else(|e| Err(e.into())),
        Err(e) => Err(e.into()),
    };
    let _ = cues.send(Cue {
        generation,
        url,
        result,
    });
}
