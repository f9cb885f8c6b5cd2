use serde::{Deserialize, Serialize};

/// Pointer state of the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Pointer over the plot, nothing pressed. Holds the nearest sample index.
    Hovering(usize),
    /// A drag in progress from `start` to `current`.
    Dragging { start: usize, current: usize },
}

impl InteractionState {
    pub fn is_dragging(&self) -> bool {
        matches!(self, InteractionState::Dragging { .. })
    }

    pub fn hover_index(&self) -> Option<usize> {
        match self {
            InteractionState::Hovering(index) => Some(*index),
            _ => None,
        }
    }
}

/// Pointer input in chart pixel coordinates, as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    Leave,
    Click { x: f64, y: f64 },
}
