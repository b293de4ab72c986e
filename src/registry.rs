use crate::engine::{GameConfig, GameError, Minigame};
use crate::games::pong::PongGame;
use crate::games::rhythm::RhythmRunner;
use crate::games::snake::SnakeGame;

pub type Constructor = fn(GameConfig) -> Result<Box<dyn Minigame>, GameError>;

/// One menu entry. `construct` is resolved at compile time; every entry
/// satisfies the lifecycle contract by construction.
pub struct GameInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub developer: &'static str,
    /// 1..=5 stars on the menu tile.
    pub difficulty: u8,
    pub preview: &'static str,
    pub tokens_on_win: u32,
    pub construct: Constructor,
}

fn build_snake(cfg: GameConfig) -> Result<Box<dyn Minigame>, GameError> {
    Ok(Box::new(SnakeGame::new(cfg)))
}

fn build_pong(cfg: GameConfig) -> Result<Box<dyn Minigame>, GameError> {
    Ok(Box::new(PongGame::new(cfg)))
}

fn build_rhythm(cfg: GameConfig) -> Result<Box<dyn Minigame>, GameError> {
    Ok(Box::new(RhythmRunner::new(cfg)?))
}

pub const GAMES: &[GameInfo] = &[
    GameInfo {
        id: "snake",
        name: "RETRO SNAKE",
        description: "Classic snake game with a retro twist",
        developer: "Demo Team",
        difficulty: 3,
        preview: "🐍",
        tokens_on_win: 2,
        construct: build_snake,
    },
    GameInfo {
        id: "pong",
        name: "ARCADE PONG",
        description: "The classic paddle ball game",
        developer: "Demo Team",
        difficulty: 2,
        preview: "🏓",
        tokens_on_win: 1,
        construct: build_pong,
    },
    GameInfo {
        id: "rockandroll",
        name: "ROCK AND ROLL",
        description: "Steer the car and hit the rhythm notes",
        developer: "Demo Team",
        difficulty: 4,
        preview: "🎸",
        tokens_on_win: 3,
        construct: build_rhythm,
    },
];

pub fn find(id: &str) -> Option<&'static GameInfo> {
    GAMES.iter().find(|game| game.id == id)
}

pub fn construct(id: &str, cfg: GameConfig) -> Result<Box<dyn Minigame>, GameError> {
    match find(id) {
        Some(info) => (info.construct)(cfg),
        None => Err(GameError::UnknownGame(id.to_string())),
    }
}
