use std::io;
use std::time::Duration;
use std::time::Instant;

use crossterm::event::DisableBracketedPaste;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::EnableMouseCapture;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use markview_core::crossterm_input::input_event_from_crossterm;
use markview_core::editor::EditorAction;
use markview_core::editor::EditorArea;
use markview_core::help::HelpBar;
use markview_core::help::HelpBarOptions;
use markview_core::input::InputEvent;
use markview_core::input::KeyCode;
use markview_core::input::KeyEvent;
use markview_core::input::MouseButton;
use markview_core::input::MouseEvent;
use markview_core::input::MouseEventKind;
use markview_core::keymap;
use markview_core::keymap::Binding;
use markview_core::text::CodeHighlighter;
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::Backend;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Constraint;
use ratatui::layout::Direction;
use ratatui::layout::Layout;
use ratatui::layout::Position;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::widgets::Block;
use ratatui::widgets::Paragraph;
use tracing::debug;
use tracing::info;
use tracing::warn;
use unicode_width::UnicodeWidthStr;

use crate::channel::ControllerLink;
use crate::channel::SurfaceInbox;
use crate::pane::HtmlPane;
use crate::pane::PaneOptions;
use crate::protocol::ControllerMessage;
use crate::surface::SurfaceEffect;
use crate::surface::SurfaceLayout;
use crate::surface::SurfaceOptions;
use crate::surface::SurfaceState;

pub const TOGGLE_LABEL: &str = "[ Toggle Edit Mode ]";
pub const EDITOR_TITLE: &str = "Markdown Editor";
pub const PREVIEW_TITLE: &str = "Live Preview";

const IDLE_POLL: Duration = Duration::from_millis(250);
const WHEEL_STEP: i32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Quit,
    Toggle,
    ScrollDown,
    ScrollUp,
    PageDown,
    PageUp,
    Top,
    Bottom,
}

#[derive(Clone, Debug, Default)]
pub struct AppOptions {
    /// Shown in the toolbar, usually the file name.
    pub title: String,
    pub surface: SurfaceOptions,
    pub pane: PaneOptions,
}

/// Screen regions from the last draw, used for mouse hit testing.
#[derive(Clone, Copy, Debug, Default)]
struct Regions {
    toggle: Rect,
    body: Rect,
    editor: Rect,
    divider: Option<u16>,
    preview: Rect,
}

/// The terminal display surface.
pub struct App {
    state: SurfaceState,
    inbox: SurfaceInbox,
    link: ControllerLink,
    editor: EditorArea,
    preview: HtmlPane,
    highlighter: Box<dyn CodeHighlighter>,
    global_keys: Vec<(Binding, Action)>,
    preview_keys: Vec<(Binding, Action)>,
    help: HelpBar,
    title: String,
    regions: Regions,
    quit: bool,
}

impl App {
    pub fn new(
        link: ControllerLink,
        inbox: SurfaceInbox,
        highlighter: Box<dyn CodeHighlighter>,
        options: AppOptions,
    ) -> Self {
        let global_keys = vec![
            (
                Binding::new("ctrl-e", "toggle edit", vec![keymap::key_ctrl('e')]),
                Action::Toggle,
            ),
            (
                Binding::new("ctrl-q", "quit", vec![keymap::key_ctrl('q')]),
                Action::Quit,
            ),
        ];
        let preview_keys = vec![
            (
                Binding::new("esc/q", "quit", vec![keymap::key(KeyCode::Esc), keymap::key_char('q')]),
                Action::Quit,
            ),
            (
                Binding::new(
                    "j/↓",
                    "down",
                    vec![keymap::key_char('j'), keymap::key(KeyCode::Down)],
                ),
                Action::ScrollDown,
            ),
            (
                Binding::new("k/↑", "up", vec![keymap::key_char('k'), keymap::key(KeyCode::Up)]),
                Action::ScrollUp,
            ),
            (
                Binding::new(
                    "pgdn/space",
                    "page",
                    vec![keymap::key(KeyCode::PageDown), keymap::key_char(' ')],
                ),
                Action::PageDown,
            ),
            (
                Binding::new("pgup", "page up", vec![keymap::key(KeyCode::PageUp)]),
                Action::PageUp,
            ),
            (
                Binding::new("g", "top", vec![keymap::key_char('g'), keymap::key(KeyCode::Home)]),
                Action::Top,
            ),
            (
                Binding::new("G", "bottom", vec![keymap::key_char('G'), keymap::key(KeyCode::End)]),
                Action::Bottom,
            ),
        ];
        let help = HelpBar::with_options(
            global_keys
                .iter()
                .chain(preview_keys.iter().take(3))
                .map(|(b, _)| b.clone())
                .collect(),
            HelpBarOptions {
                style: Style::default().fg(Color::Gray),
                key_style: Style::default().fg(Color::Cyan),
                ..HelpBarOptions::default()
            },
        );

        Self {
            state: SurfaceState::new(options.surface),
            inbox,
            link,
            editor: EditorArea::new(),
            preview: HtmlPane::with_options(options.pane),
            highlighter,
            global_keys,
            preview_keys,
            help,
            title: options.title,
            regions: Regions::default(),
            quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn layout(&self) -> SurfaceLayout {
        self.state.layout()
    }

    pub fn editor_text(&self) -> String {
        self.editor.text()
    }

    pub fn preview(&self) -> &HtmlPane {
        &self.preview
    }

    /// Asks the controller for the other layout, as the toolbar button does.
    pub fn request_toggle(&mut self) {
        self.state.toggle_request();
    }

    /// Applies every update the controller queued.
    pub fn pump(&mut self, now: Instant) {
        for message in self.inbox.drain() {
            match message {
                ControllerMessage::Update(snapshot) => {
                    let repaint = self.state.apply_update(snapshot, now);
                    self.preview.set_html(&repaint.html);
                    if let Some(text) = repaint.editor_value {
                        self.editor.set_text(&text);
                    }
                }
                ControllerMessage::Unknown => debug!("ignoring unknown controller message"),
            }
        }
        if self.inbox.is_closed() && !self.quit {
            info!("controller closed the channel");
            self.quit = true;
        }
    }

    /// Sends due messages and runs due highlighting passes.
    pub fn run_effects(&mut self, now: Instant) {
        for effect in self.state.poll(now) {
            match effect {
                SurfaceEffect::Post(message) => {
                    if let Err(err) = self.link.post(&message) {
                        warn!(%err, "controller unreachable");
                        self.quit = true;
                    }
                }
                SurfaceEffect::Highlight(panes) => {
                    let n = self.preview.highlight_code_blocks(self.highlighter.as_ref());
                    debug!(?panes, blocks = n, "highlighted");
                }
            }
        }
    }

    /// Call after a frame has been flushed to the terminal.
    pub fn on_painted(&mut self) {
        self.state.on_painted();
    }

    pub fn poll_timeout(&self, now: Instant) -> Duration {
        self.state
            .next_deadline()
            .map_or(IDLE_POLL, |at| at.saturating_duration_since(now).min(IDLE_POLL))
    }

    pub fn handle_input(&mut self, event: InputEvent, now: Instant) {
        match event {
            InputEvent::Key(key) => self.handle_key(key, now),
            InputEvent::Mouse(mouse) => self.handle_mouse(mouse),
            InputEvent::Paste(_) => {
                if self.state.layout().is_edit() {
                    self.edit(event, now);
                }
            }
            InputEvent::Resize(..) => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if let Some(action) = keymap::lookup(&self.global_keys, &key) {
            self.apply(action);
            return;
        }
        if self.state.layout().is_edit() {
            self.edit(InputEvent::Key(key), now);
        } else if let Some(action) = keymap::lookup(&self.preview_keys, &key) {
            self.apply(action);
        }
    }

    fn edit(&mut self, event: InputEvent, now: Instant) {
        if self.editor.input(event) == EditorAction::Changed {
            self.state.on_editor_input(self.editor.text(), now);
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => self.quit = true,
            Action::Toggle => self.state.toggle_request(),
            Action::ScrollDown => self.preview.scroll_by(1),
            Action::ScrollUp => self.preview.scroll_by(-1),
            Action::PageDown => self.preview.page_down(),
            Action::PageUp => self.preview.page_up(),
            Action::Top => self.preview.state.to_top(),
            Action::Bottom => self.preview.state.to_bottom(),
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let pos = Position::new(mouse.x, mouse.y);
        let regions = self.regions;
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if regions.toggle.contains(pos) {
                    self.state.toggle_request();
                } else if regions.divider == Some(mouse.x) && regions.body.contains(pos) {
                    self.state.pointer_down();
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if self.state.split().is_dragging() {
                    let offset = mouse.x.saturating_sub(regions.body.x) as f32;
                    self.state.pointer_move(offset, regions.body.width as f32);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => self.state.pointer_up(),
            MouseEventKind::ScrollDown | MouseEventKind::ScrollUp => {
                let delta = if mouse.kind == MouseEventKind::ScrollDown {
                    WHEEL_STEP
                } else {
                    -WHEEL_STEP
                };
                if regions.editor.contains(pos) {
                    self.editor.state.scroll_y_by(delta);
                } else if regions.preview.contains(pos) {
                    self.preview.scroll_by(delta);
                }
            }
            _ => {}
        }
    }

    pub fn draw(&mut self, frame: &mut Frame<'_>) {
        let [toolbar, body, help] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .areas(frame.area());

        self.draw_toolbar(frame, toolbar);
        self.regions.body = body;
        if self.state.mirror().is_none() {
            frame.render_widget(Paragraph::new("Rendering…").dark_gray(), body);
            self.regions.editor = Rect::default();
            self.regions.preview = Rect::default();
            self.regions.divider = None;
        } else {
            match self.state.layout() {
                SurfaceLayout::Preview => self.draw_preview(frame, body),
                SurfaceLayout::Edit { .. } => self.draw_edit(frame, body),
            }
        }

        let status = match self.state.layout() {
            SurfaceLayout::Preview => "PREVIEW".to_string(),
            SurfaceLayout::Edit { left_percent } => format!("EDIT {left_percent:.0}%"),
        };
        let status = match self.preview.state.percent_y() {
            Some(pct) => format!("{status} {pct}% "),
            None => format!("{status} "),
        };
        self.help.render_ref(help, frame.buffer_mut(), &status);
    }

    fn draw_toolbar(&mut self, frame: &mut Frame<'_>, area: Rect) {
        frame.render_widget(
            Paragraph::new(format!(" markview · {}", self.title)).bold(),
            area,
        );
        let label_w = (TOGGLE_LABEL.width() as u16).min(area.width);
        let button = Rect::new(area.right() - label_w, area.y, label_w, area.height.min(1));
        let style = if self.state.layout().is_edit() {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        };
        frame.render_widget(Paragraph::new(TOGGLE_LABEL).style(style), button);
        self.regions.toggle = button;
    }

    fn draw_preview(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let block = Block::bordered().title(self.title.clone());
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.preview.render_ref(inner, frame.buffer_mut());
        self.regions.preview = inner;
        self.regions.editor = Rect::default();
        self.regions.divider = None;
    }

    fn draw_edit(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let (left_w, right_w) = self.state.split().columns(area.width);
        let left = Rect::new(area.x, area.y, left_w, area.height);
        let divider_x = area.x + left_w;
        let right = Rect::new(divider_x + 1, area.y, right_w, area.height);

        let editor_block = Block::bordered().title(EDITOR_TITLE);
        let editor_inner = editor_block.inner(left);
        frame.render_widget(editor_block, left);
        self.editor.render_ref(editor_inner, frame.buffer_mut());
        if let Some((x, y)) = self.editor.cursor_pos(editor_inner) {
            frame.set_cursor_position((x, y));
        }

        let divider_style = if self.state.split().is_dragging() {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        if right_w > 0 {
            let buf = frame.buffer_mut();
            for y in area.top()..area.bottom() {
                buf.set_string(divider_x, y, "┃", divider_style);
            }
        }

        let preview_block = Block::bordered().title(PREVIEW_TITLE);
        let preview_inner = preview_block.inner(right);
        frame.render_widget(preview_block, right);
        self.preview.render_ref(preview_inner, frame.buffer_mut());

        self.regions.editor = editor_inner;
        self.regions.preview = preview_inner;
        self.regions.divider = (right_w > 0).then_some(divider_x);
    }

    /// Draws, pumps and polls until the user quits or the controller goes away. The controller
    /// is told about the disposal on the way out.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            let now = Instant::now();
            self.pump(now);
            terminal.draw(|f| self.draw(f))?;
            self.on_painted();
            self.run_effects(Instant::now());
            if self.quit {
                break;
            }

            if crossterm::event::poll(self.poll_timeout(Instant::now()))?
                && let Some(event) = input_event_from_crossterm(crossterm::event::read()?)
            {
                self.handle_input(event, Instant::now());
            }
            self.run_effects(Instant::now());
        }
        if let Err(err) = self.link.dispose() {
            debug!(%err, "controller already gone");
        }
        Ok(())
    }
}

/// Runs `app` on the real terminal and restores it afterwards, also on error.
pub fn run_terminal(app: &mut App) -> io::Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    crossterm::execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let res = app.run(&mut terminal);

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::SurfaceId;
    use crate::channel::SurfaceSink;
    use crate::channel::surface_channel;
    use crate::protocol::RenderSnapshot;
    use crate::protocol::SurfaceMessage;
    use crate::protocol::ViewMode;
    use crate::protocol;
    use crate::registry::ControllerEvent;
    use markview_core::input::KeyModifiers;
    use markview_core::text::NoHighlight;
    use ratatui::backend::TestBackend;
    use std::sync::mpsc;

    struct Harness {
        app: App,
        controller: crate::channel::SurfaceLink,
        events: mpsc::Receiver<ControllerEvent>,
        terminal: Terminal<TestBackend>,
    }

    fn harness() -> Harness {
        let (link, inbox) = surface_channel();
        let (tx, rx) = mpsc::channel();
        let app = App::new(
            ControllerLink::new(SurfaceId::next(), tx),
            inbox,
            Box::new(NoHighlight),
            AppOptions {
                title: "notes.md".to_string(),
                ..AppOptions::default()
            },
        );
        Harness {
            app,
            controller: link,
            events: rx,
            terminal: Terminal::new(TestBackend::new(80, 12)).unwrap(),
        }
    }

    impl Harness {
        fn push(&mut self, text: &str, mode: ViewMode) {
            self.controller
                .post(&ControllerMessage::Update(RenderSnapshot {
                    html: format!("<p>{text}</p>\n"),
                    text: text.to_string(),
                    mode,
                }))
                .unwrap();
            self.app.pump(Instant::now());
            self.draw();
        }

        fn draw(&mut self) {
            let app = &mut self.app;
            self.terminal.draw(|f| app.draw(f)).unwrap();
        }

        fn sent(&self) -> Vec<SurfaceMessage> {
            self.events
                .try_iter()
                .filter_map(|e| match e {
                    ControllerEvent::Surface { payload, .. } => protocol::decode(&payload).ok(),
                    _ => None,
                })
                .collect()
        }

        fn screen(&self) -> String {
            let buf = self.terminal.backend().buffer();
            let mut out = String::new();
            for y in 0..buf.area.height {
                for x in 0..buf.area.width {
                    out.push_str(buf[(x, y)].symbol());
                }
                out.push('\n');
            }
            out
        }
    }

    fn click(x: u16, y: u16) -> InputEvent {
        InputEvent::Mouse(MouseEvent {
            x,
            y,
            kind: MouseEventKind::Down(MouseButton::Left),
            modifiers: KeyModifiers::none(),
        })
    }

    #[test]
    fn toolbar_button_requests_toggle() {
        let mut h = harness();
        h.push("hello", ViewMode::Preview);
        assert!(h.screen().contains(TOGGLE_LABEL));

        let x = 80 - TOGGLE_LABEL.width() as u16 + 1;
        h.app.handle_input(click(x, 0), Instant::now());
        h.app.run_effects(Instant::now());

        assert_eq!(h.sent(), vec![SurfaceMessage::ToggleMode]);
        assert_eq!(h.app.layout(), SurfaceLayout::Preview);
    }

    #[test]
    fn edit_layout_shows_titles_and_editor_text() {
        let mut h = harness();
        h.push("hello", ViewMode::Edit);
        let screen = h.screen();
        assert!(screen.contains(EDITOR_TITLE));
        assert!(screen.contains(PREVIEW_TITLE));
        assert_eq!(h.app.editor_text(), "hello");
    }

    #[test]
    fn typing_posts_debounced_edit() {
        let mut h = harness();
        h.push("", ViewMode::Edit);
        let t0 = Instant::now();
        for c in ['a', 'b', 'c'] {
            h.app
                .handle_input(InputEvent::Key(keymap::key_char(c)), t0);
        }
        h.app.run_effects(t0);
        assert!(h.sent().is_empty());

        h.app.run_effects(t0 + Duration::from_secs(1));
        assert_eq!(
            h.sent(),
            vec![SurfaceMessage::Edit {
                text: "abc".to_string()
            }]
        );
    }

    #[test]
    fn divider_drag_resizes() {
        let mut h = harness();
        h.push("x", ViewMode::Edit);
        let divider = h.app.regions.divider.unwrap();
        h.app.handle_input(click(divider, 5), Instant::now());
        h.app.handle_input(
            InputEvent::Mouse(MouseEvent {
                x: 2,
                y: 5,
                kind: MouseEventKind::Drag(MouseButton::Left),
                modifiers: KeyModifiers::none(),
            }),
            Instant::now(),
        );
        assert_eq!(h.app.layout(), SurfaceLayout::Edit { left_percent: 20.0 });
    }

    #[test]
    fn ctrl_q_quits_and_closed_inbox_quits() {
        let mut h = harness();
        h.app
            .handle_input(InputEvent::Key(keymap::key_ctrl('q')), Instant::now());
        assert!(h.app.should_quit());

        let mut h = harness();
        drop(h.controller);
        h.app.pump(Instant::now());
        assert!(h.app.should_quit());
    }
}
