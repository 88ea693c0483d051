//! Component trait: the interface every panel implements.
//!
//! Components read `AppState` and draw themselves. They never mutate it;
//! the App applies messages and actions to the state between frames.

use ratatui::{layout::Rect, Frame};

use crate::app_state::AppState;

pub trait Component {
    fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState);
}
