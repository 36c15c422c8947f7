use ratatui::Frame;

use crate::app::{App, View};
use crate::clock::Clock;
use crate::ui::{render_history, render_play, render_replay};

/// A UI Screen boundary: responsible for rendering one view of the app
pub trait Screen<C: Clock> {
    fn render(&self, app: &mut App<C>, f: &mut Frame);
}

/// Live target plus round status
pub struct PlayScreen;

impl<C: Clock> Screen<C> for PlayScreen {
    fn render(&self, app: &mut App<C>, f: &mut Frame) {
        render_play(app, f);
    }
}

/// Browsable list of finished rounds
pub struct HistoryScreen;

impl<C: Clock> Screen<C> for HistoryScreen {
    fn render(&self, app: &mut App<C>, f: &mut Frame) {
        render_history(app, f);
    }
}

/// Animated playback of a stored round
pub struct ReplayScreen;

impl<C: Clock> Screen<C> for ReplayScreen {
    fn render(&self, app: &mut App<C>, f: &mut Frame) {
        render_replay(app, f);
    }
}

/// Helper to construct the appropriate screen for the current view
pub fn current_screen<C: Clock + 'static>(view: View) -> Box<dyn Screen<C>> {
    match view {
        View::Play => Box::new(PlayScreen),
        View::History => Box::new(HistoryScreen),
        View::Replay => Box::new(ReplayScreen),
    }
}
