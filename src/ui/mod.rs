pub mod hub;
pub mod login;
pub mod player;

use ratatui::prelude::*;

use crate::app::{App, Screen};

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    match app.screen {
        Screen::Login => login::render_login(frame, area, app),
        Screen::Hub => hub::render_hub(frame, area, app),
        Screen::Player => player::render_player(frame, area, app),
    }
}
