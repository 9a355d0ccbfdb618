//! App: component-based event loop.
//!
//! Architecture:
//! - `App` owns every component, the `PlaybackController` (sole owner of the
//!   audio sink) and `AppState` (read-only data for components).
//! - Terminal events and the health probe arrive as `AppMessage`s; generation,
//!   mpv and download events each have their own channel.
//! - The loop draws only when something changed, then awaits the next event.
//! - Components return `Vec<Action>`; App applies each Action.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use moodmix_proto::config::Config;
use moodmix_proto::mood::MoodSliders;
use moodmix_proto::playlist::{Normalizer, PlaylistDocument};

use crate::{
    action::Action,
    api::{ApiClient, Upload},
    app_state::{ApiHealth, AppState, GenerationProgress, Screen},
    component::Component,
    components::{
        generating::GeneratingScreen, player::Player, remix_panel::RemixPanel,
        upload::UploadScreen,
    },
    download::{DownloadOutcome, Downloader},
    generation::{fetch_playlist, Generation, GenerationEvent, GenerationHandle, Timeline},
    mpv::{MpvDriver, MpvEvent, MpvSignal, MpvSink},
    playback::{AudioSink, NullSink, PlaybackController},
    widgets::{
        pane_chrome::hit,
        status_bar,
        toast::ToastManager,
    },
};

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Event(Event),
    Health(ApiHealth),
}

/// Last-drawn layout rects, used by `handle_mouse` for hit-testing.
#[derive(Default, Clone)]
struct PaneAreas {
    main: Rect,
    remix: Rect,
}

type Sink = Box<dyn AudioSink + Send>;

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    config: Config,

    // ── Shared state (passed read-only to components) ─────────────────────────
    pub state: AppState,

    // ── Components ────────────────────────────────────────────────────────────
    upload: UploadScreen,
    generating: GeneratingScreen,
    player: Player,
    remix_panel: RemixPanel,

    // ── Services ──────────────────────────────────────────────────────────────
    client: ApiClient,
    normalizer: Normalizer,
    downloader: Downloader,
    controller: PlaybackController<Sink>,
    mpv: MpvDriver,

    // ── Generation cycle ──────────────────────────────────────────────────────
    generation: Option<GenerationHandle>,
    next_generation_id: u64,
    gen_tx: mpsc::Sender<GenerationEvent>,
    gen_rx: Option<mpsc::Receiver<GenerationEvent>>,
    dl_rx: Option<mpsc::Receiver<DownloadOutcome>>,

    /// Image passed on the command line; submitted once the loop starts.
    initial_image: Option<PathBuf>,

    should_quit: bool,
    pane_areas: PaneAreas,
    toast: ToastManager,
}

impl App {
    pub fn new(config: Config, initial_image: Option<PathBuf>) -> anyhow::Result<Self> {
        let client = ApiClient::new(&config.api)?;
        let normalizer = Normalizer::new(
            config.api.base_url.clone(),
            config.playlist.default_track_secs,
        );
        let (gen_tx, gen_rx) = mpsc::channel(64);
        let (dl_tx, dl_rx) = mpsc::channel(16);
        let downloader = Downloader::new(client.clone(), config.paths.downloads_dir.clone(), dl_tx);

        let state = AppState {
            api_base: config.api.base_url.clone(),
            ..AppState::default()
        };

        Ok(Self {
            mpv: MpvDriver::new(config.player.volume),
            config,
            state,
            upload: UploadScreen::new(),
            generating: GeneratingScreen::new(),
            player: Player::new(),
            remix_panel: RemixPanel::new(),
            client,
            normalizer,
            downloader,
            controller: PlaybackController::new(Box::new(NullSink) as Sink),
            generation: None,
            next_generation_id: 0,
            gen_tx,
            gen_rx: Some(gen_rx),
            dl_rx: Some(dl_rx),
            initial_image,
            should_quit: false,
            pane_areas: PaneAreas::default(),
            toast: ToastManager::new(),
        })
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut gen_rx = self
            .gen_rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("app already ran"))?;
        let mut dl_rx = self
            .dl_rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("app already ran"))?;

        // ── Audio backend ─────────────────────────────────────────────────────
        let (mpv_tx, mut mpv_rx) = mpsc::channel::<MpvEvent>(256);
        match self.mpv.spawn_and_connect(mpv_tx).await {
            Ok(handle) => {
                handle.observe_all_properties().await;
                self.controller
                    .replace_sink(Box::new(MpvSink::spawn(handle)));
                self.state.audio_available = true;
            }
            Err(e) => {
                warn!("mpv unavailable, playing silently: {:#}", e);
                self.toast
                    .warning("mpv not found: playlists will play without sound");
            }
        }

        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);

        // ── Background task: keyboard/mouse events ────────────────────────────
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

        // ── Background task: health probe (diagnostics only) ──────────────────
        let health_tx = tx.clone();
        let health_client = self.client.clone();
        tokio::spawn(async move {
            let health = match health_client.health().await {
                Ok(status) => {
                    info!("api health: {}", status.status);
                    ApiHealth::Up(status.status)
                }
                Err(e) => {
                    warn!("api health check failed [{}]: {}", e.kind(), e);
                    ApiHealth::Down(e.kind().to_string())
                }
            };
            let _ = health_tx.send(AppMessage::Health(health)).await;
        });

        if let Some(path) = self.initial_image.take() {
            self.dispatch(Action::SubmitImage(path)).await;
        }

        // Toast expiry + spinner animation
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // Component maintenance tick (spinners, eased progress).
        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    needs_redraw = self.handle_message(msg).await;
                    // Drain a burst (mouse drags) before the next draw.
                    let mut drained = 0usize;
                    while drained < 256 {
                        let Ok(next) = rx.try_recv() else { break };
                        drained += 1;
                        needs_redraw |= self.handle_message(next).await;
                    }
                }

                Some(ev) = gen_rx.recv() => {
                    needs_redraw = self.on_generation_event(ev).await;
                }

                Some(ev) = mpv_rx.recv() => {
                    needs_redraw = self.on_mpv_event(ev);
                }

                Some(outcome) = dl_rx.recv() => {
                    self.on_download_outcome(outcome);
                    needs_redraw = true;
                }

                _ = ui_tick.tick() => {
                    let tick_actions: Vec<Action> = {
                        let s = &self.state;
                        match s.screen {
                            Screen::Upload => self.upload.tick(s),
                            Screen::Generating => self.generating.tick(s),
                            Screen::Playlist => self.player.tick(s),
                        }
                    };
                    for action in tick_actions {
                        self.dispatch(action).await;
                    }
                    needs_redraw = self.state.screen == Screen::Generating;
                }

                _ = toast_tick.tick() => {
                    if !self.toast.is_empty() {
                        self.toast.tick();
                        needs_redraw = true;
                    }
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        if let Some(generation) = self.generation.take() {
            generation.cancel();
        }
        self.controller.reset_to_start();
        self.mpv.kill().await;
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        Ok(())
    }

    // ── Message handling ──────────────────────────────────────────────────────

    /// Returns true when the screen needs a redraw.
    async fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                if key.kind == KeyEventKind::Release {
                    return false;
                }
                for action in self.handle_key(key) {
                    self.dispatch(action).await;
                }
                true
            }
            AppMessage::Event(Event::Mouse(mouse)) => {
                let actions = self.handle_mouse(mouse);
                for action in actions {
                    self.dispatch(action).await;
                }
                true
            }
            AppMessage::Event(Event::Resize(_, _)) => true,
            AppMessage::Event(_) => false,
            AppMessage::Health(health) => {
                self.state.api_health = health;
                true
            }
        }
    }

    async fn on_generation_event(&mut self, ev: GenerationEvent) -> bool {
        let current = self.generation.as_ref().map(|g| g.id());
        if current != Some(ev.id()) {
            debug!("dropping event from stale generation {}", ev.id());
            return false;
        }
        match ev {
            GenerationEvent::Step { index, percent, .. } => {
                self.state
                    .generation
                    .advance(index, percent, std::time::Instant::now());
            }
            GenerationEvent::Complete { document, .. } => {
                self.generation = None;
                self.install_document(*document).await;
            }
        }
        true
    }

    async fn install_document(&mut self, document: PlaylistDocument) {
        info!(
            "playlist ready: '{}' ({} tracks, {:.0}s)",
            document.title,
            document.tracks.len(),
            document.total_duration
        );
        self.controller.load(&document);
        self.state.document = Some(document);
        self.state.playback = self.controller.snapshot();
        self.state.screen = Screen::Playlist;
        self.dispatch(Action::DocumentReady).await;
    }

    fn on_mpv_event(&mut self, ev: MpvEvent) -> bool {
        let changed = match ev.signal() {
            Some(MpvSignal::TimePos(t)) => {
                self.controller.on_time_update(t);
                true
            }
            Some(MpvSignal::Ended) => {
                self.controller.on_ended();
                true
            }
            Some(MpvSignal::Paused(paused)) => {
                debug!("mpv: pause={}", paused);
                false
            }
            Some(MpvSignal::Duration(d)) => {
                debug!("mpv: media duration {:.1}s", d);
                false
            }
            None => false,
        };
        if changed {
            let snap = self.controller.snapshot();
            let redraw = snap != self.state.playback && self.state.screen == Screen::Playlist;
            self.state.playback = snap;
            return redraw;
        }
        false
    }

    fn on_download_outcome(&mut self, outcome: DownloadOutcome) {
        debug!("download finished: {}", outcome.label());
        self.state.pending_downloads = self.state.pending_downloads.saturating_sub(1);
        self.update_download_spinner();
        match outcome {
            DownloadOutcome::Saved { label, path } => {
                self.toast
                    .success(format!("saved {} to {}", label, path.display()));
            }
            DownloadOutcome::Failed { label, error } => {
                self.toast
                    .error(format!("{} download failed: {}", label, error));
            }
        }
    }

    fn update_download_spinner(&mut self) {
        match self.state.pending_downloads {
            0 => self.toast.dismiss_spinner(),
            1 => self.toast.spinner("downloading…"),
            n => self.toast.spinner(format!("downloading {} files…", n)),
        }
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL {
            return vec![Action::Quit];
        }
        let typing = self.state.screen == Screen::Upload || self.remix_panel.is_open();
        if key.code == KeyCode::Char('q') && key.modifiers == KeyModifiers::NONE && !typing {
            return vec![Action::Quit];
        }

        let s = &self.state;
        match s.screen {
            Screen::Upload => self.upload.handle_key(key, s),
            Screen::Generating => self.generating.handle_key(key, s),
            Screen::Playlist if self.remix_panel.is_open() => self.remix_panel.handle_key(key, s),
            Screen::Playlist => self.player.handle_key(key, s),
        }
    }

    // ── Mouse handling ────────────────────────────────────────────────────────

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        let areas = self.pane_areas.clone();
        let s = &self.state;
        match s.screen {
            Screen::Playlist if self.remix_panel.is_open() => {
                // Modal: clicks outside the panel are swallowed.
                if hit(areas.remix, event.column, event.row)
                    || !matches!(event.kind, ratatui::crossterm::event::MouseEventKind::Down(_))
                {
                    self.remix_panel.handle_mouse(event, areas.remix, s)
                } else {
                    vec![]
                }
            }
            Screen::Playlist => self.player.handle_mouse(event, areas.main, s),
            Screen::Upload => self.upload.handle_mouse(event, areas.main, s),
            Screen::Generating => self.generating.handle_mouse(event, areas.main, s),
        }
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    async fn dispatch(&mut self, action: Action) {
        // Components react first (carousel reset, draft open/close, input prefill)
        let secondary: Vec<Action> = {
            let s = &self.state;
            let mut out = Vec::new();
            out.extend(self.upload.on_action(&action, s));
            out.extend(self.generating.on_action(&action, s));
            out.extend(self.player.on_action(&action, s));
            out.extend(self.remix_panel.on_action(&action, s));
            out
        };

        self.apply_action(action).await;

        // Secondary actions (depth-limited to 1 level)
        for a in secondary {
            self.apply_action(a).await;
        }
    }

    async fn apply_action(&mut self, action: Action) {
        match action {
            // ── Upload / generation ───────────────────────────────────────────
            Action::SubmitImage(path) => {
                self.state.image_path = Some(path.clone());
                self.start_generation(path, None).await;
            }
            Action::CancelGeneration => {
                if let Some(generation) = self.generation.take() {
                    info!("generation {}: cancelled", generation.id());
                    generation.cancel();
                }
                self.state.screen = Screen::Upload;
                self.toast.info("generation cancelled");
            }
            Action::DocumentReady => {}

            // ── Playback ──────────────────────────────────────────────────────
            Action::TogglePlay => {
                if !self.controller.toggle_play() && !self.controller.snapshot().loaded {
                    self.toast.info("nothing to play");
                }
            }
            Action::SeekClick { x, bar } => {
                self.controller.seek_by_click(x, bar);
            }
            Action::SeekDrag {
                x,
                bar,
                primary_held,
            } => {
                self.controller.seek_by_drag(x, bar, primary_held);
            }
            Action::SeekRelative(delta) => {
                self.controller.seek_relative(delta);
            }
            Action::PlayTrack(index) => {
                let len = self.state.document.as_ref().map_or(0, |d| d.tracks.len());
                if index < len {
                    self.controller.click_track(index);
                }
            }
            Action::NextTrack => self.controller.next_track(),
            Action::PrevTrack => self.controller.prev_track(),

            // ── Remix ─────────────────────────────────────────────────────────
            Action::OpenRemix | Action::CloseRemix => {}
            Action::Regenerate { hint } => self.regenerate(hint).await,

            // ── Player buttons ────────────────────────────────────────────────
            Action::ResetToStart => {
                if let Some(generation) = self.generation.take() {
                    generation.cancel();
                }
                self.controller.reset_to_start();
                self.state.document = None;
                self.state.screen = Screen::Upload;
            }
            Action::DownloadImage(index) => {
                let Some(doc) = self.state.document.as_ref() else {
                    return;
                };
                match doc.images.get(index) {
                    Some(image) => {
                        self.downloader.save_image(image, doc.session_id.as_deref());
                        self.state.pending_downloads += 1;
                        self.update_download_spinner();
                    }
                    None => warn!("download: no image at index {}", index),
                }
            }
            Action::SaveMix => {
                let Some(doc) = self.state.document.as_ref() else {
                    return;
                };
                if doc.audio_url.is_empty() {
                    self.toast.warning("this playlist has no audio to save");
                    return;
                }
                self.downloader
                    .save_mix(&doc.audio_url, doc.session_id.as_deref());
                self.state.pending_downloads += 1;
                self.update_download_spinner();
                debug!("save mix into {:?}", self.downloader.dir());
            }

            // ── System ────────────────────────────────────────────────────────
            Action::Quit => self.should_quit = true,
        }
        self.state.playback = self.controller.snapshot();
    }

    async fn regenerate(&mut self, hint: Option<MoodSliders>) {
        let Some(path) = self.state.image_path.clone() else {
            self.toast.warning("no image to regenerate from");
            return;
        };
        self.controller.reset_to_start();
        self.state.document = None;
        self.start_generation(path, hint).await;
    }

    /// Enter the generating screen and start a new cycle.  Replacing the
    /// handle aborts any cycle still running.
    async fn start_generation(&mut self, path: PathBuf, hint: Option<MoodSliders>) {
        let upload = match Upload::from_path(&path).await {
            Ok(upload) => upload,
            Err(e) => {
                warn!("cannot read {:?}: {:#}", path, e);
                self.upload.set_error(format!("{:#}", e));
                self.state.screen = Screen::Upload;
                return;
            }
        };
        let upload = match hint {
            Some(sliders) => upload.with_mood_hint(sliders.to_mood()),
            None => upload,
        };

        self.next_generation_id += 1;
        let id = self.next_generation_id;
        let timeline = Timeline::for_mode(self.config.generation.timeline);
        self.state.generation = GenerationProgress::new(&timeline);
        self.state.screen = Screen::Generating;

        let fetch = fetch_playlist(
            self.client.clone(),
            self.normalizer.clone(),
            upload,
            self.config.fallback.audio_url.clone(),
        );
        self.generation = Some(Generation::start(id, timeline, fetch, self.gen_tx.clone()));
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();
        let rows = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);
        let main = rows[0];
        self.pane_areas.main = main;
        self.pane_areas.remix = Rect::default();

        match self.state.screen {
            Screen::Upload => self.upload.draw(frame, main, true, &self.state),
            Screen::Generating => self.generating.draw(frame, main, true, &self.state),
            Screen::Playlist => {
                let remix_open = self.remix_panel.is_open();
                self.player.draw(frame, main, !remix_open, &self.state);
                if remix_open {
                    self.pane_areas.remix = RemixPanel::panel_rect(main);
                    self.remix_panel.draw(frame, main, true, &self.state);
                }
            }
        }

        status_bar::draw_status_bar(
            frame,
            rows[1],
            self.state.screen,
            self.remix_panel.is_open(),
            &self.state.api_health,
            self.state.audio_available,
        );
        self.toast.draw(frame, area);
    }
}
