/// Pointer and wheel gestures for the photo viewer
///
/// Tracks active pointers and turns them into transform updates: one pointer
/// drags (only while zoomed in), two pointers pinch, the wheel steps the
/// scale. The controller never mutates the transform itself; the reducer
/// applies the returned update.
use std::collections::BTreeMap;
use tracing::trace;

use super::state::Transform;

/// Scale change per wheel notch
pub const WHEEL_ZOOM_STEP: f32 = 0.1;

/// Pinch distances below this are treated as a single point
const MIN_PINCH_DISTANCE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub id: i32,
    pub phase: PointerPhase,
    pub x: f32,
    pub y: f32,
}

impl PointerEvent {
    pub fn new(id: i32, phase: PointerPhase, x: f32, y: f32) -> Self {
        Self { id, phase, x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformUpdate {
    Pan(f32, f32),
    Scale(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureOutcome {
    pub update: Option<TransformUpdate>,
    /// Host default handling (scrolling, text selection) must be suppressed
    pub suppress_default: bool,
}

impl GestureOutcome {
    fn handled(update: Option<TransformUpdate>) -> Self {
        Self {
            update,
            suppress_default: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragStart {
    pointer: i32,
    x: f32,
    y: f32,
    pan: (f32, f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PinchStart {
    distance: f32,
    scale: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureController {
    pointers: BTreeMap<i32, (f32, f32)>,
    drag: Option<DragStart>,
    pinch: Option<PinchStart>,
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

impl GestureController {
    pub fn active_pointers(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    /// Forget all pointers, e.g. when the viewer closes
    pub fn reset(&mut self) {
        self.pointers.clear();
        self.drag = None;
        self.pinch = None;
    }

    fn pinch_distance(&self) -> Option<f32> {
        let mut points = self.pointers.values();
        let a = *points.next()?;
        let b = *points.next()?;
        Some(distance(a, b))
    }

    fn start_drag(&mut self, pointer: i32, x: f32, y: f32, transform: &Transform) {
        self.drag = if transform.scale > 1.0 {
            Some(DragStart {
                pointer,
                x,
                y,
                pan: transform.pan,
            })
        } else {
            None
        };
    }

    pub fn pointer(&mut self, event: PointerEvent, transform: &Transform) -> GestureOutcome {
        trace!("GESTURE: {:?}", event);
        match event.phase {
            PointerPhase::Down => {
                self.pointers.insert(event.id, (event.x, event.y));
                match self.pointers.len() {
                    1 => self.start_drag(event.id, event.x, event.y, transform),
                    _ => {
                        self.drag = None;
                        self.pinch = self
                            .pinch_distance()
                            .filter(|d| *d >= MIN_PINCH_DISTANCE)
                            .map(|distance| PinchStart {
                                distance,
                                scale: transform.scale,
                            });
                    }
                }
                GestureOutcome::handled(None)
            }
            PointerPhase::Move => {
                let Some(position) = self.pointers.get_mut(&event.id) else {
                    return GestureOutcome::default();
                };
                *position = (event.x, event.y);

                if let Some(pinch) = self.pinch {
                    let update = self
                        .pinch_distance()
                        .map(|d| TransformUpdate::Scale(pinch.scale * d / pinch.distance));
                    return GestureOutcome::handled(update);
                }

                let update = self
                    .drag
                    .filter(|drag| drag.pointer == event.id)
                    .map(|drag| {
                        TransformUpdate::Pan(
                            drag.pan.0 + event.x - drag.x,
                            drag.pan.1 + event.y - drag.y,
                        )
                    });
                GestureOutcome::handled(update)
            }
            PointerPhase::Up | PointerPhase::Cancel => {
                if self.pointers.remove(&event.id).is_none() {
                    return GestureOutcome::default();
                }
                if self.pointers.len() < 2 {
                    self.pinch = None;
                }
                // A remaining finger continues as a fresh drag from where it is
                let remaining = match self.pointers.len() {
                    1 => self.pointers.iter().next().map(|(&id, &pos)| (id, pos)),
                    _ => None,
                };
                match remaining {
                    Some((id, (x, y))) => self.start_drag(id, x, y, transform),
                    None => self.drag = None,
                }
                GestureOutcome::handled(None)
            }
        }
    }

    /// Scale update for one wheel event; negative delta zooms in
    pub fn wheel(&self, delta_y: f32, transform: &Transform) -> GestureOutcome {
        if delta_y == 0.0 {
            return GestureOutcome::default();
        }
        let step = if delta_y < 0.0 {
            WHEEL_ZOOM_STEP
        } else {
            -WHEEL_ZOOM_STEP
        };
        GestureOutcome::handled(Some(TransformUpdate::Scale(transform.scale + step)))
    }
}
