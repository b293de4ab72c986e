use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{info, warn};

use crate::engine::input::{GameKey, InputBus};
use crate::engine::surface::RenderTarget;
use crate::engine::{GameConfig, Minigame};
use crate::registry::{self, GameInfo};
use crate::tokens::TokenLedger;

const MAX_NAME_LEN: usize = 12;

#[derive(Clone, Copy, PartialEq)]
pub enum Screen {
    Login,
    Hub,
    Player,
}

pub enum PlayState {
    Running,
    /// Game construction failed; the player may retry without paying again.
    Failed,
    Complete {
        final_score: u32,
        tokens_earned: u32,
    },
}

/// The hub's side of one play: the game instance plus the channels its
/// callbacks write into.
pub struct PlaySession {
    pub info: &'static GameInfo,
    pub state: PlayState,
    pub target: RenderTarget,
    pub live_score: Rc<RefCell<u32>>,
    outcome: Rc<RefCell<Option<(u32, u32)>>>,
    game: Option<Box<dyn Minigame>>,
}

pub struct App {
    pub should_quit: bool,
    pub screen: Screen,
    pub name_buffer: String,
    pub player_name: String,
    pub ledger: TokenLedger,
    pub selected_game: usize,
    pub dev_mode: bool,
    /// Transient hub message, cleared on the next hub keypress.
    pub notice: Option<String>,
    pub session: Option<PlaySession>,
    input_bus: InputBus,
    key_release_supported: bool,
    tapped_keys: Vec<GameKey>,
}

enum SessionView {
    Running,
    Failed(&'static GameInfo),
    Complete,
}

impl App {
    pub fn new(key_release_supported: bool) -> Self {
        let mut ledger = TokenLedger::load();
        // A returning player skips the login form (and collects the daily
        // token if this is the first launch of the day).
        let (screen, player_name) = match ledger.player().map(str::to_string) {
            Some(name) => {
                let bonus = ledger.record_login(&name);
                info!(player = %name, bonus, "returning player");
                (Screen::Hub, name)
            }
            None => (Screen::Login, String::new()),
        };
        Self {
            should_quit: false,
            screen,
            name_buffer: String::new(),
            player_name,
            ledger,
            selected_game: 0,
            dev_mode: false,
            notice: None,
            session: None,
            input_bus: InputBus::new(),
            key_release_supported,
            tapped_keys: Vec::new(),
        }
    }

    pub fn on_tick(&mut self) {
        // Terminals without key-up reporting get a synthesized release one
        // tick after each press, so held keys degrade to taps.
        for key in self.tapped_keys.drain(..) {
            self.input_bus.key_up(key);
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !matches!(session.state, PlayState::Running) {
            return;
        }
        if let Some(game) = session.game.as_mut() {
            game.advance(Instant::now());
        }
        if let Some((final_score, tokens_earned)) = session.outcome.borrow_mut().take() {
            info!(game = session.info.id, final_score, tokens_earned, "game ended");
            self.ledger.add(tokens_earned);
            session.state = PlayState::Complete {
                final_score,
                tokens_earned,
            };
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        // Ctrl+C always quits
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.close_session();
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Login => {
                if key.kind == KeyEventKind::Press {
                    self.login_key(key);
                }
            }
            Screen::Hub => {
                if key.kind == KeyEventKind::Press {
                    self.hub_key(key);
                }
            }
            Screen::Player => self.player_key(key),
        }
    }

    fn login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let name = self.name_buffer.trim().to_string();
                if !name.is_empty() {
                    let bonus = self.ledger.record_login(&name);
                    info!(player = %name, bonus, "player logged in");
                    self.player_name = name;
                    self.screen = Screen::Hub;
                }
            }
            KeyCode::Backspace => {
                self.name_buffer.pop();
            }
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(c) => {
                if self.name_buffer.chars().count() < MAX_NAME_LEN
                    && (c.is_ascii_graphic() || c == ' ')
                {
                    self.name_buffer.push(c);
                }
            }
            _ => {}
        }
    }

    fn hub_key(&mut self, key: KeyEvent) {
        self.notice = None;
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Left | KeyCode::Up => {
                let n = registry::GAMES.len();
                self.selected_game = (self.selected_game + n - 1) % n;
            }
            KeyCode::Right | KeyCode::Down | KeyCode::Tab => {
                self.selected_game = (self.selected_game + 1) % registry::GAMES.len();
            }
            KeyCode::Enter => self.insert_token_and_launch(),
            KeyCode::Char('d') | KeyCode::Char('D') => self.dev_mode = !self.dev_mode,
            KeyCode::Char('+') if self.dev_mode => {
                self.ledger.add(5);
            }
            KeyCode::Char('-') if self.dev_mode => {
                let tokens = self.ledger.tokens();
                self.ledger.set(tokens as i64 - 1);
            }
            KeyCode::Char('0') if self.dev_mode => {
                self.ledger.reset();
            }
            _ => {}
        }
    }

    fn insert_token_and_launch(&mut self) {
        if !self.ledger.spend() {
            self.notice = Some("OUT OF TOKENS — WIN GAMES TO EARN MORE".into());
            return;
        }
        self.launch(&registry::GAMES[self.selected_game]);
    }

    /// Build a session and hand the game its config: a fresh render target,
    /// the shared input bus, and callbacks that land in the session's cells.
    fn launch(&mut self, info: &'static GameInfo) {
        let target = RenderTarget::new();
        let live_score = Rc::new(RefCell::new(0u32));
        let outcome = Rc::new(RefCell::new(None));
        let cfg = GameConfig {
            target: target.clone(),
            input: self.input_bus.clone(),
            player_name: self.player_name.clone(),
            on_score_change: {
                let live_score = live_score.clone();
                Box::new(move |score| *live_score.borrow_mut() = score)
            },
            on_game_end: {
                let outcome = outcome.clone();
                Box::new(move |score, tokens| *outcome.borrow_mut() = Some((score, tokens)))
            },
        };
        let (state, game) = match registry::construct(info.id, cfg) {
            Ok(mut game) => {
                info!(game = info.id, player = %self.player_name, "session launched");
                game.start(Instant::now());
                (PlayState::Running, Some(game))
            }
            Err(err) => {
                warn!(game = info.id, %err, "failed to load game");
                (PlayState::Failed, None)
            }
        };
        self.session = Some(PlaySession {
            info,
            state,
            target,
            live_score,
            outcome,
            game,
        });
        self.screen = Screen::Player;
    }

    fn player_key(&mut self, key: KeyEvent) {
        let view = match self.session.as_ref() {
            None => {
                self.screen = Screen::Hub;
                return;
            }
            Some(session) => match session.state {
                PlayState::Running => SessionView::Running,
                PlayState::Failed => SessionView::Failed(session.info),
                PlayState::Complete { .. } => SessionView::Complete,
            },
        };

        match view {
            SessionView::Running => {
                if key.kind == KeyEventKind::Press && key.code == KeyCode::Esc {
                    // Forced back-navigation is an exit path too: tear the
                    // session down before leaving.
                    self.leave_player_screen();
                    return;
                }
                let Some(game_key) = GameKey::from_key_code(key.code) else {
                    return;
                };
                match key.kind {
                    KeyEventKind::Press => {
                        self.input_bus.key_down(game_key);
                        if !self.key_release_supported {
                            self.tapped_keys.push(game_key);
                        }
                    }
                    KeyEventKind::Release => self.input_bus.key_up(game_key),
                    KeyEventKind::Repeat => {}
                }
            }
            SessionView::Failed(info) => {
                if key.kind != KeyEventKind::Press {
                    return;
                }
                match key.code {
                    // Retry re-resolves the constructor without charging
                    // another token.
                    KeyCode::Char('r') | KeyCode::Char('R') | KeyCode::Enter => {
                        self.close_session();
                        self.launch(info);
                    }
                    KeyCode::Esc => self.leave_player_screen(),
                    _ => {}
                }
            }
            SessionView::Complete => {
                if key.kind != KeyEventKind::Press {
                    return;
                }
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                    self.leave_player_screen();
                }
            }
        }
    }

    fn leave_player_screen(&mut self) {
        self.close_session();
        self.screen = Screen::Hub;
    }

    fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Some(game) = session.game.as_mut() {
                game.cleanup();
            }
        }
    }
}
