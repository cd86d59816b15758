//! Deterministic engine pieces shared by every mini-game
//!
//! Nothing in here touches the DOM, the clock or a global RNG:
//! - Fixed 60 Hz frames, wall-clock time passed in explicitly
//! - Seeded RNG only
//! - Logical playfield coordinates only

pub mod collision;
pub mod effects;
pub mod input;
pub mod phase;
pub mod physics;
pub mod placement;
pub mod scheduler;
pub mod state;
pub mod timing;

pub use collision::{
    Circle, Clearance, Rect, circle_overlap, circle_rect_overlap, place_with_rejection,
    point_in_rect, scatter,
};
pub use effects::Effects;
pub use input::{Action, InputEvent, InputRouter, Key, Lane, Viewport};
pub use phase::{Lifecycle, PhaseMachine, SubPhase};
pub use physics::{Easing, Flight, Floor, Freefall, Integration, MovingBody, StepReport, integrate};
pub use placement::{BenchLayout, DropOutcome, Hand, PlacementBoard, Source};
pub use scheduler::{Countdown, FrameAnimation, FrameClock, Scheduler, SchedulerStats, TickHandle, TimerHandle};
pub use state::{ResultTrack, Round, RoundResult, Target};
pub use timing::TimingMarker;
