//! App: the terminal event loop.
//!
//! - A `tokio::mpsc` channel carries `AppMessage`s in from the poller, the
//!   keyboard reader and mpv.
//! - The loop draws a frame, then awaits the next message or tick.
//! - Keys become `Action`s; the App dispatches each one to the controls,
//!   the poller handle or the view state.

use std::io;
use std::time::{Duration, Instant};

use ratatui::crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use vgm_core::config::FallbackConfig;
use vgm_core::{AudioElement, Controls, CycleReport, NowPlaying, PlaybackSnapshot, PollerHandle};

use crate::{
    action::{action_for_key, Action},
    app_state::AppState,
    component::Component,
    components::{debug_overlay::DebugOverlay, now_playing::NowPlayingPanel},
    mpv::MpvEvent,
    widgets::status_bar::draw_status_bar,
};

pub enum AppMessage {
    Event(Event),
    Snapshot(PlaybackSnapshot),
    ServerDown,
    Report(CycleReport),
    Mpv(MpvEvent),
}

pub struct App<A: AudioElement> {
    state: AppState,
    controls: Controls<A>,
    poller: PollerHandle,
    fallback: FallbackConfig,
    now_playing: NowPlayingPanel,
    debug: DebugOverlay,
    should_quit: bool,
}

impl<A: AudioElement> App<A> {
    pub fn new(controls: Controls<A>, poller: PollerHandle, fallback: FallbackConfig) -> Self {
        Self {
            state: AppState::new(controls.state()),
            controls,
            poller,
            fallback,
            now_playing: NowPlayingPanel,
            debug: DebugOverlay,
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<AppMessage>,
        tx: mpsc::Sender<AppMessage>,
    ) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        debug!("run(): terminal ready, size={:?}", terminal.size());

        // ── Background task: keyboard events ──────────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: poller reports ───────────────────────────────────
        let mut reports = self.poller.reports();
        let report_tx = tx.clone();
        tokio::spawn(async move {
            while reports.changed().await.is_ok() {
                let report = reports.borrow_and_update().clone();
                if let Some(report) = report {
                    if report_tx.send(AppMessage::Report(report)).await.is_err() {
                        break;
                    }
                }
            }
        });
        drop(tx);

        // redraws the position bar
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut title = String::new();
        loop {
            terminal.draw(|f| self.draw(f))?;
            if self.state.now_playing.page_title != title {
                title = self.state.now_playing.page_title.clone();
                execute!(terminal.backend_mut(), SetTitle(&title))?;
            }

            if self.should_quit {
                break;
            }

            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(msg) => self.handle_message(msg).await,
                    None => break,
                },
                _ = tick.tick() => {}
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        info!("shutting down");
        self.poller.shutdown().await;
        if let Err(e) = self.controls.stop().await {
            debug!("stop on exit: {:#}", e);
        }
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if self.state.fullscreen {
            self.now_playing.draw(frame, area, &self.state);
        } else {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(1)])
                .split(area);
            self.now_playing.draw(frame, rows[0], &self.state);
            draw_status_bar(
                frame,
                rows[1],
                &self.state.playback,
                self.state.player_error.as_deref(),
            );
        }
        self.debug.draw(frame, area, &self.state);
    }

    // ── Message handler ───────────────────────────────────────────────────────

    async fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                if let Some(action) = action_for_key(key) {
                    self.dispatch(action).await;
                }
            }
            AppMessage::Event(_) => {}
            AppMessage::Snapshot(snapshot) => {
                self.state.apply_snapshot(&snapshot, Instant::now());
            }
            AppMessage::ServerDown => self.enter_degraded().await,
            AppMessage::Report(report) => self.state.apply_report(report),
            AppMessage::Mpv(ev) => {
                if ev.is_stream_end() && self.controls.state().is_playing {
                    warn!("stream ended: {}", ev.raw);
                    self.enter_degraded().await;
                    self.poller.poll_now();
                }
            }
        }
    }

    /// Fallback view, and playback stops: there's nothing to listen to.
    async fn enter_degraded(&mut self) {
        self.state
            .apply_server_down(NowPlaying::server_down(&self.fallback));
        let result = self.controls.stop().await;
        self.after_control(result);
    }

    pub async fn dispatch(&mut self, action: Action) {
        debug!("dispatch {:?}", action);
        match action {
            Action::TogglePlayback => {
                let result = self.controls.toggle_playback().await;
                self.after_control(result);
            }
            Action::ToggleMute => {
                let result = self.controls.toggle_mute().await;
                self.after_control(result);
            }
            Action::VolumeKey(c) => {
                let result = self.controls.set_volume_key(c).await.map(|_| ());
                self.after_control(result);
            }
            Action::ToggleFullscreen => self.state.fullscreen = !self.state.fullscreen,
            Action::RefreshNow => self.poller.poll_now(),
            Action::ToggleDebug => self.state.show_debug = !self.state.show_debug,
            Action::Quit => self.should_quit = true,
        }
    }

    fn after_control(&mut self, result: anyhow::Result<()>) {
        self.state.playback = self.controls.state();
        match result {
            Ok(()) => self.state.player_error = None,
            Err(e) => {
                warn!("player: {:#}", e);
                self.state.player_error = Some(format!("player: {:#}", e));
            }
        }
    }
}
