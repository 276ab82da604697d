//! Controller: the root of the runtime. Receives one Message at a time,
//! applies global state (theme, libraries, player status) and routes the rest
//! to the overlays and the active tab.

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use mediactl_proto::config::Config;
use mediactl_proto::protocol::{HomeUser, Library};
use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::command::{Command, Dispatcher};
use crate::context::AppContext;
use crate::message::{Alert, HelpKey, Message};
use crate::navigator::Navigator;
use crate::overlays::{
    alert::AlertOverlay, help::HelpOverlay, libraries::LibrariesOverlay, resume::ResumeOverlay,
    search::SearchOverlay, settings::SettingsOverlay, user_picker::UserPicker,
};
use crate::player::{PlayRequest, PlayerManager, PlayerStatus};
use crate::tab_manager::{TabKind, TabManager};
use crate::theme::Theme;
use crate::widgets::{navbar, player_bar, status_bar, toast::Severity, toast::ToastManager};

pub const GLOBAL_KEYS: &[HelpKey] = &[
    HelpKey::new("tab", "next tab"),
    HelpKey::new("S-tab", "previous tab"),
    HelpKey::new("h", "home"),
    HelpKey::new("/", "search"),
    HelpKey::new("p", "play"),
    HelpKey::new("C-p", "play in terminal"),
    HelpKey::new("space", "pause"),
    HelpKey::new("x", "stop"),
    HelpKey::new("r", "refresh"),
    HelpKey::new("s", "settings"),
    HelpKey::new("l", "libraries"),
    HelpKey::new("u", "switch user"),
    HelpKey::new("?", "help"),
    HelpKey::new("q", "quit"),
];

/// Player bar refresh while something is playing.
const PLAYBACK_TICK: Duration = Duration::from_secs(1);

pub struct Controller {
    config: Config,
    config_path: PathBuf,
    ctx: AppContext,
    player: PlayerManager,
    tabs: TabManager,
    navigator: Navigator,
    toasts: ToastManager,
    theme: Theme,
    libraries: Vec<Library>,
    status: PlayerStatus,
    /// A playback tick is in flight.
    ticking: bool,
    /// The search index is being rebuilt; its spinner toast is up.
    indexing: bool,
    /// Tab to go back to once a jumped-to detail is closed.
    return_tab: Option<usize>,
    navbar_area: Rect,
    should_quit: bool,
}

impl Controller {
    pub fn new(config: Config, config_path: PathBuf, ctx: AppContext, player: PlayerManager) -> Self {
        let theme = Theme::named(&config.theme);
        Self {
            config,
            config_path,
            ctx,
            player,
            tabs: TabManager::new(),
            navigator: Navigator::new(),
            toasts: ToastManager::new(),
            theme,
            libraries: Vec::new(),
            status: PlayerStatus::default(),
            ticking: false,
            indexing: false,
            return_tab: None,
            navbar_area: Rect::default(),
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Work queued before the first frame: fixed tabs, player reattach,
    /// library load and the optional home-user prompt.
    pub fn startup(&mut self) -> Command {
        let mut cmd = self
            .tabs
            .rebuild(&[], &self.config, &self.ctx)
            .and(self.player.reconnect());
        if self.ctx.client.base_url().is_empty() {
            return cmd;
        }
        cmd = cmd.and(self.ctx.load_libraries(false));
        if self.config.auto_home_login && self.config.home_user.access_token.is_empty() {
            let client = self.ctx.client.clone();
            cmd = cmd.and(Command::optional(async move {
                match client.home_users().await {
                    Ok(users) if users.len() > 1 => Some(Message::UserSelection(users)),
                    Ok(_) => None,
                    Err(e) => {
                        debug!("Controller: no home users: {:#}", e);
                        None
                    }
                }
            }));
        }
        cmd
    }

    fn save_config(&mut self) {
        if let Err(e) = self.config.save_to(&self.config_path) {
            warn!("Controller: saving config failed: {:#}", e);
            self.toasts.error(format!("Could not save settings: {e:#}"));
        }
    }

    fn server_label(&self) -> String {
        match self.config.active_server() {
            Some((_, server)) if !server.name.is_empty() => server.name.clone(),
            Some((id, _)) => id.to_string(),
            None => String::new(),
        }
    }

    // ── Message handler ───────────────────────────────────────────────────────

    pub fn update(&mut self, msg: Message) -> Command {
        match msg {
            Message::Key(key) if key.kind == KeyEventKind::Release => Command::none(),
            Message::Quit => {
                info!("Controller: quitting");
                self.should_quit = true;
                Command::none()
            }
            Message::Tick => self.on_tick(),
            Message::PlayerStatusChanged => {
                self.status = self.player.status();
                self.schedule_tick()
            }
            Message::Error(alert) => {
                if self.indexing {
                    // Index refreshes report failure through here too.
                    self.indexing = false;
                    self.toasts.dismiss_spinner();
                }
                let (cmd, _) = self.navigator.update(&Message::Error(alert.clone()));
                cmd.and(self.show_alert(alert))
            }
            Message::MediaPageFailed { ref alert, .. } => {
                let alert = alert.clone();
                let cmd = self.tabs.broadcast(&msg);
                cmd.and(self.show_alert(alert))
            }
            Message::TaskStarted(title) => {
                self.toasts.success(format!("Started {title}"));
                Command::none()
            }
            Message::ThemeChanged(name) => {
                self.theme = Theme::named(&name);
                Command::none()
            }
            Message::SettingsSaved(config) => self.on_settings_saved(*config),
            Message::ViewModeChanged { section_id, mode } => {
                self.config.set_library_view_mode(&section_id, mode);
                self.save_config();
                Command::none()
            }
            Message::DataReloaded(libraries) => self.on_libraries(libraries),
            Message::RefreshIndex => {
                self.indexing = true;
                self.toasts.spinner("Indexing libraries…");
                let cmd = self.tabs.broadcast(&Message::RefreshIndex);
                cmd.and(self.ctx.refresh_index(self.libraries.clone()))
            }
            Message::IndexUpdated => {
                self.indexing = false;
                self.toasts
                    .resolve_spinner(Severity::Success, "Search index updated");
                self.tabs.broadcast(&Message::IndexUpdated)
            }
            Message::UserSelection(users) => self.navigator.push(Box::new(UserPicker::new(users))),
            Message::SwitchUser { user, pin } => self.switch_user(user, pin),
            Message::UserSwitched {
                auth_token,
                access_token,
            } => {
                let (cmd, _) = self.navigator.update(&Message::UserSwitched {
                    auth_token: auth_token.clone(),
                    access_token: access_token.clone(),
                });
                cmd.and(self.on_user_switched(auth_token, access_token))
            }
            Message::RequestPlay { rating_key, compact } => self.request_play(rating_key, compact),
            Message::ResumeChoice { item, compact } => {
                self.navigator.push(Box::new(ResumeOverlay::new(*item, compact)))
            }
            Message::PlayMedia {
                item,
                compact,
                offset_ms,
                no_report,
            } => {
                match PlayRequest::for_item(
                    &item,
                    self.ctx.client.base_url(),
                    &self.ctx.client.token(),
                    compact,
                    offset_ms,
                    no_report,
                ) {
                    Ok(request) => {
                        self.toasts.info(format!("Loading {}", request.title));
                        self.player.play(request)
                    }
                    Err(e) => self.show_alert(Alert::transient(format!("{e:#}"))),
                }
            }
            Message::SelectMedia {
                rating_key,
                kind,
                section_id,
            } => self.select_media(rating_key, kind, section_id),
            Message::JumpToDetail {
                section_id,
                rating_key,
                kind,
                return_tab,
            } => self.jump_to_detail(&section_id, &rating_key, &kind, return_tab),
            Message::Back | Message::BackToLibrary => {
                let cmd = self.tabs.update_active(&msg);
                cmd.and(self.maybe_return())
            }
            Message::Key(key) => {
                let (cmd, captured) = self.navigator.update(&msg);
                if captured {
                    return cmd;
                }
                match self.global_key(key) {
                    Some(global) => cmd.and(global),
                    None => cmd.and(self.tabs.update_active(&msg)),
                }
            }
            Message::Mouse(event) => {
                let (cmd, captured) = self.navigator.update(&msg);
                if captured {
                    return cmd;
                }
                cmd.and(self.on_mouse(event, &msg))
            }
            Message::Resize { .. } => {
                let (cmd, _) = self.navigator.update(&msg);
                cmd.and(self.tabs.broadcast(&msg))
            }
            other => {
                // Data for overlays and tabs; each drops what is not its own.
                let (cmd, captured) = self.navigator.update(&other);
                if captured {
                    return cmd;
                }
                cmd.and(self.tabs.broadcast(&other))
            }
        }
    }

    fn show_alert(&mut self, alert: Alert) -> Command {
        if alert.blocking {
            warn!("Controller: {}", alert.message);
            self.navigator.push(Box::new(AlertOverlay::new(alert.message)))
        } else {
            debug!("Controller: {}", alert.message);
            self.toasts.error(alert.message);
            Command::none()
        }
    }

    // ── Playback ──────────────────────────────────────────────────────────────

    fn schedule_tick(&mut self) -> Command {
        if !self.status.is_active() || self.ticking {
            return Command::none();
        }
        self.ticking = true;
        Command::perform(async {
            tokio::time::sleep(PLAYBACK_TICK).await;
            Message::Tick
        })
    }

    fn on_tick(&mut self) -> Command {
        self.ticking = false;
        self.status = self.player.status();
        self.schedule_tick()
    }

    fn request_play(&mut self, rating_key: String, compact: bool) -> Command {
        let client = self.ctx.client.clone();
        Command::attempt(async move {
            let item = client
                .metadata(&rating_key)
                .await
                .with_context(|| format!("loading item {rating_key}"))?;
            if item.has_resume_point() {
                return Ok(Message::ResumeChoice {
                    item: Box::new(item),
                    compact,
                });
            }
            let no_report = item.is_trailer();
            Ok(Message::PlayMedia {
                item: Box::new(item),
                compact,
                offset_ms: 0,
                no_report,
            })
        })
    }

    fn play_selection(&mut self, compact: bool) -> Command {
        let selected = self
            .tabs
            .active()
            .and_then(|t| t.component.as_playable())
            .and_then(|p| p.selected_metadata());
        match selected {
            Some(item) if item.is_playable() => Command::message(Message::RequestPlay {
                rating_key: item.rating_key,
                compact,
            }),
            Some(_) => {
                self.toasts.warning("Select a movie or an episode to play");
                Command::none()
            }
            None => Command::none(),
        }
    }

    // ── Navigation ────────────────────────────────────────────────────────────

    fn select_media(&mut self, rating_key: String, kind: String, section_id: Option<String>) -> Command {
        let return_tab = self.tabs.active_index();
        if let Some(section_id) = section_id {
            return Command::message(Message::JumpToDetail {
                section_id,
                rating_key,
                kind,
                return_tab,
            });
        }
        let client = self.ctx.client.clone();
        Command::attempt(async move {
            let item = client.metadata(&rating_key).await?;
            let section_id = item
                .section_id()
                .ok_or_else(|| anyhow::anyhow!("{} is not in a library", item.title))?;
            Ok(Message::JumpToDetail {
                section_id,
                rating_key,
                kind,
                return_tab,
            })
        })
    }

    fn jump_to_detail(&mut self, section_id: &str, rating_key: &str, kind: &str, return_tab: usize) -> Command {
        let Some(index) = self.tabs.position(&format!("library:{section_id}")) else {
            self.toasts.warning("That library is hidden");
            return Command::none();
        };
        let mut cmd = self.tabs.set_active(index);
        if let Some(host) = self
            .tabs
            .active_mut()
            .and_then(|t| t.component.as_detail_host())
        {
            cmd = cmd.and(host.show_detail(rating_key, kind));
        }
        self.return_tab = (return_tab != index).then_some(return_tab);
        cmd
    }

    /// After a Back, go to the tab the detail was opened from once its
    /// frames are all closed.
    fn maybe_return(&mut self) -> Command {
        let Some(target) = self.return_tab else {
            return Command::none();
        };
        let depth = self
            .tabs
            .active_mut()
            .and_then(|t| t.component.as_detail_host())
            .map_or(0, |h| h.detail_depth());
        if depth > 0 {
            return Command::none();
        }
        self.return_tab = None;
        self.tabs.set_active(target)
    }

    fn switch_tab(&mut self, cmd: Command) -> Command {
        self.return_tab = None;
        cmd
    }

    fn global_key(&mut self, key: KeyEvent) -> Option<Command> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let cmd = match key.code {
            KeyCode::Char('c') if ctrl => self.quit(),
            KeyCode::Char('p') if ctrl => self.play_selection(true),
            KeyCode::Char('q') => self.quit(),
            KeyCode::Char('p') => self.play_selection(false),
            KeyCode::Char('?') => {
                let local = self
                    .tabs
                    .active()
                    .and_then(|t| t.component.as_help_provider())
                    .map(|h| h.help_keys())
                    .unwrap_or_default();
                self.navigator
                    .push(Box::new(HelpOverlay::new(GLOBAL_KEYS, local)))
            }
            KeyCode::Char('s') => self
                .navigator
                .push(Box::new(SettingsOverlay::new(self.config.clone()))),
            KeyCode::Char('l') => self.navigator.push(Box::new(LibrariesOverlay::new(
                self.config.clone(),
                &self.libraries,
            ))),
            KeyCode::Char('/') => self
                .navigator
                .push(Box::new(SearchOverlay::new(self.ctx.index.clone()))),
            KeyCode::Char('u') => {
                let client = self.ctx.client.clone();
                Command::attempt(async move {
                    Ok(Message::UserSelection(client.home_users().await?))
                })
            }
            KeyCode::Char('h') => {
                let home = self.tabs.first_of(TabKind::Home).unwrap_or(0);
                let cmd = self.tabs.set_active(home);
                self.switch_tab(cmd)
            }
            KeyCode::Tab => {
                let cmd = self.tabs.next();
                self.switch_tab(cmd)
            }
            KeyCode::BackTab => {
                let cmd = self.tabs.prev();
                self.switch_tab(cmd)
            }
            KeyCode::Char(' ') if self.status.is_active() => self.player.toggle_pause(),
            KeyCode::Char('x') if self.status.is_active() => self.player.stop_playback(),
            KeyCode::Char('r') => match self
                .tabs
                .active_mut()
                .and_then(|t| t.component.as_refreshable())
            {
                Some(r) => r.refresh(),
                None => Command::none(),
            },
            _ => return None,
        };
        Some(cmd)
    }

    fn quit(&mut self) -> Command {
        // An idle mpv keeps its window open after end of file, so the flag
        // alone decides; stopping without a connection is a no-op.
        if self.config.close_video_on_quit {
            info!("Controller: stopping player before exit");
            return self.player.stop();
        }
        self.should_quit = true;
        Command::none()
    }

    fn on_mouse(&mut self, event: MouseEvent, msg: &Message) -> Command {
        let on_navbar = event.column >= self.navbar_area.x
            && event.column < self.navbar_area.x + self.navbar_area.width;
        if on_navbar {
            if let MouseEventKind::Down(MouseButton::Left) = event.kind {
                if let Some(i) = navbar::hit_test(self.navbar_area, event.row, self.tabs.len()) {
                    let cmd = self.tabs.set_active(i);
                    return self.switch_tab(cmd);
                }
            }
            return Command::none();
        }
        self.tabs.update_active(msg)
    }

    // ── Data, settings, users ─────────────────────────────────────────────────

    fn on_libraries(&mut self, libraries: Vec<Library>) -> Command {
        info!("Controller: {} libraries loaded", libraries.len());
        self.libraries = libraries;
        self.indexing = true;
        self.toasts.spinner("Indexing libraries…");
        let cmd = self.tabs.rebuild(&self.libraries, &self.config, &self.ctx);
        cmd.and(self.ctx.refresh_index(self.libraries.clone()))
    }

    fn on_settings_saved(&mut self, config: Config) -> Command {
        self.config = config;
        self.save_config();
        self.theme = Theme::named(&self.config.theme);
        self.toasts.success("Settings saved");
        self.tabs.rebuild(&self.libraries, &self.config, &self.ctx)
    }

    fn switch_user(&mut self, user: HomeUser, pin: Option<String>) -> Command {
        let client = self.ctx.client.clone();
        Command::attempt(async move {
            match client.switch_user(&user, pin.as_deref()).await? {
                Some((auth_token, access_token)) => Ok(Message::UserSwitched {
                    auth_token,
                    access_token,
                }),
                None => Ok(Message::InvalidPin),
            }
        })
    }

    fn on_user_switched(&mut self, auth_token: String, access_token: String) -> Command {
        self.ctx.client.set_tokens(&access_token, &auth_token);
        self.config.home_user.auth_token = auth_token;
        self.config.home_user.access_token = access_token;
        self.save_config();
        self.toasts.success("Switched user");
        self.ctx.load_libraries(true)
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let bar = if self.status.is_active() {
            player_bar::HEIGHT
        } else {
            0
        };
        let [main, player, footer] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(bar),
            Constraint::Length(1),
        ])
        .areas(area);
        let [nav, content] =
            Layout::horizontal([Constraint::Length(navbar::WIDTH), Constraint::Min(1)]).areas(main);
        self.navbar_area = nav;

        navbar::draw_navbar(frame, nav, &self.tabs.labels(), self.tabs.active_index(), &self.theme);

        let mut hints = Vec::new();
        if let Some(tab) = self.tabs.active_mut() {
            let block = crate::widgets::pane::pane(&tab.title, true, &self.theme);
            let inner = block.inner(content);
            frame.render_widget(block, content);
            tab.component.draw(frame, inner, &self.theme);
            if let Some(h) = tab.component.as_help_provider() {
                hints = h.help_keys();
            }
        }
        if bar > 0 {
            player_bar::draw_player_bar(frame, player, &self.status, &self.theme);
        }
        hints.push(HelpKey::new("?", "help"));
        status_bar::draw_footer(frame, footer, &hints, &self.server_label(), &self.theme);

        self.navigator.draw(frame, area, &self.theme);
        self.toasts.draw(frame, area, &self.theme);
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self, mut rx: mpsc::Receiver<Message>, dispatcher: Dispatcher) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = dispatcher.sender();
        let input_stop = Arc::new(AtomicBool::new(false));
        let input = {
            let stop = input_stop.clone();
            tokio::task::spawn_blocking(move || {
                read_input(&event_tx, &stop, |timeout| {
                    if event::poll(timeout)? {
                        event::read().map(Some)
                    } else {
                        Ok(None)
                    }
                })
            })
        };

        if let Ok(size) = terminal.size() {
            let cmd = self.update(Message::Resize {
                width: size.width,
                height: size.height,
            });
            dispatcher.dispatch(cmd);
        }
        let cmd = self.startup();
        dispatcher.dispatch(cmd);

        // Toast expiry and spinner animation.
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

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
                    const MAX_DRAIN: usize = 256;
                    dispatcher.dispatch(self.update(msg));
                    let mut drained = 0usize;
                    while drained < MAX_DRAIN && !self.should_quit {
                        let Ok(next) = rx.try_recv() else { break };
                        drained += 1;
                        dispatcher.dispatch(self.update(next));
                    }
                    needs_redraw = true;
                }

                _ = toast_tick.tick() => {
                    if !self.toasts.is_empty() {
                        self.toasts.tick();
                        needs_redraw = true;
                    }
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        input_stop.store(true, Ordering::Relaxed);
        if let Err(e) = input.await {
            warn!("run(): input reader panicked: {}", e);
        }
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        Ok(())
    }
}

/// How long the input reader waits before rechecking `stop`.
const INPUT_POLL: Duration = Duration::from_millis(100);

/// Forward terminal events until `stop` is set or the queue closes. `next`
/// waits up to the given timeout and yields `None` when nothing arrived.
fn read_input<F>(tx: &mpsc::Sender<Message>, stop: &AtomicBool, mut next: F)
where
    F: FnMut(Duration) -> io::Result<Option<Event>>,
{
    while !stop.load(Ordering::Relaxed) {
        let msg = match next(INPUT_POLL) {
            Ok(Some(Event::Key(key))) => Message::Key(key),
            Ok(Some(Event::Mouse(mouse))) => Message::Mouse(mouse),
            Ok(Some(Event::Resize(width, height))) => Message::Resize { width, height },
            Ok(_) => continue,
            Err(e) => {
                warn!("run(): terminal input failed: {}", e);
                break;
            }
        };
        if tx.blocking_send(msg).is_err() {
            break;
        }
    }
    debug!("run(): input reader stopped");
}
