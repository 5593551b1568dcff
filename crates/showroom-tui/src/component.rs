//! Component trait — the building block for every screen.

use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};
use tokio::sync::mpsc::UnboundedSender;

use showroom_core::Showroom;

use crate::action::Action;

/// Everything a screen needs while mounted.
#[derive(Clone)]
pub struct ScreenContext {
    pub showroom: Showroom,
    pub action_tx: UnboundedSender<Action>,
}

/// Every screen implements Component.
///
/// Lifecycle: `init` → (`mount` → (`handle_key_event` | `update` |
/// `render`)* → `unmount`)*. Construction and `init` are synchronous and
/// perform no I/O; `mount` is where subscriptions are acquired, and
/// `unmount` MUST release every one of them exactly once — nothing a
/// screen started may fire after `unmount` returns.
pub trait Component: Send {
    /// Called once when the component is created.
    /// Receives the action sender for dispatching actions to the app loop.
    fn init(&mut self, _action_tx: UnboundedSender<Action>) -> Result<()> {
        Ok(())
    }

    /// Called when the screen becomes active. Acquire subscriptions and
    /// spawn screen-owned tasks here, tied to a cancellation token that
    /// `unmount` cancels.
    fn mount(&mut self, _ctx: &ScreenContext) -> Result<()> {
        Ok(())
    }

    /// Called when the screen stops being active (navigation away or app
    /// shutdown). Releases everything `mount` acquired.
    fn unmount(&mut self) {}

    /// Handle a keyboard event. Return an Action to dispatch, or None.
    fn handle_key_event(&mut self, _key: KeyEvent) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Process a dispatched action. May return a follow-up action.
    fn update(&mut self, _action: &Action) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Render into the provided frame area.
    fn render(&self, frame: &mut Frame, area: Rect);

    /// Whether the screen is currently capturing text input (disables
    /// global number-key navigation while a form field is focused).
    fn wants_text_input(&self) -> bool {
        false
    }

    /// Set focus state.
    fn set_focused(&mut self, _focused: bool) {}

    /// Unique identifier for this component.
    fn id(&self) -> &str;
}
