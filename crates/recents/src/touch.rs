//! Host-side routing of pointer streams between the stack and its cards.
//!
//! Cards take taps. The stack observes every stream through the interception
//! path and owns it from the moment a gesture is recognised, or from the start
//! when the pointer lands outside any card.

use anyhow::Result;
use recents_core::TaskId;
use recents_stack::{
    CardView, GestureController, GestureState, HandleId, PointerAction, PointerEvent, RecentsHost,
    StackSynchronizer, TaskDataSource, TouchConfig,
};

/// Card views that can be tapped by the host.
pub trait Tappable {
    /// Thumbnail tap.
    fn tap(&self);
    /// Application icon tap.
    fn tap_icon(&self);
}

/// Routes one pointer stream at a time to the stack or to the pressed card.
#[derive(Debug)]
pub struct TouchDispatcher {
    gestures: GestureController,
    claimed: bool,
    pressed_card: Option<(HandleId, TaskId)>,
}

impl TouchDispatcher {
    /// Dispatcher with no stream in flight.
    pub const fn new(config: TouchConfig) -> Self {
        Self {
            gestures: GestureController::new(config),
            claimed: false,
            pressed_card: None,
        }
    }

    /// Classification of the current stream.
    pub const fn state(&self) -> GestureState {
        self.gestures.state()
    }

    /// Deliver one pointer event, turning an unclaimed press and release on a
    /// card into a tap.
    pub fn dispatch<V, D, H>(&mut self, sync: &mut StackSynchronizer<V, D, H>, event: &PointerEvent) -> Result<()>
    where
        V: CardView + Tappable,
        D: TaskDataSource,
        H: RecentsHost,
    {
        if self.claimed {
            self.gestures.on_touch_event(sync, event)?;
        } else if self.gestures.on_intercept_touch_event(sync, event)? {
            self.claimed = true;
            self.pressed_card = None;
        } else {
            match event.action {
                PointerAction::Down => {
                    #[allow(clippy::cast_possible_truncation)]
                    let card = sync.find_card_at(event.x as i32, event.y as i32);
                    self.pressed_card = card.and_then(|id| sync.card(id)?.task_id().map(|task| (id, task)));
                    if card.is_none() {
                        self.claimed = self.gestures.on_touch_event(sync, event)?;
                    }
                }
                PointerAction::Up => {
                    if let Some(card) = self
                        .pressed_card
                        .and_then(|(id, task)| sync.card(id).filter(|card| card.is_bound_to(task)))
                    {
                        card.view().tap();
                    }
                }
                PointerAction::Move | PointerAction::Cancel => {}
            }
        }

        if matches!(event.action, PointerAction::Up | PointerAction::Cancel) {
            self.claimed = false;
            self.pressed_card = None;
        }
        Ok(())
    }
}
