//! Round lifecycle shared by every mini-game
//!
//! `Idle → Setup → Active(A) → Resolving → Feedback → Setup | GameOver`
//!
//! `A` is the game's own active sub-phase (e.g. aiming/shooting). Every
//! transition goes through [`PhaseMachine::enter`], which cancels the previous
//! driver and countdown before the next phase schedules its own.

use serde::{Deserialize, Serialize};

use super::scheduler::{Scheduler, SchedulerStats, TickHandle, TimerHandle};

/// Name of a game's active sub-phase (e.g. `"aiming"`)
pub trait SubPhase {
    fn name(&self) -> &'static str;
}

/// Current lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle<A> {
    /// Nothing running; waiting for an explicit start
    Idle,
    /// Generating the round's entities
    Setup,
    /// Round in play
    Active(A),
    /// Working out the round's outcome
    Resolving,
    /// Outcome on screen for a while
    Feedback,
    /// Run ended; summary produced
    GameOver,
}

impl<A> Lifecycle<A> {
    pub fn active(&self) -> Option<&A> {
        match self {
            Lifecycle::Active(a) => Some(a),
            _ => None,
        }
    }

    /// True in the phases a new run may be started from
    pub fn can_start(&self) -> bool {
        matches!(self, Lifecycle::Idle | Lifecycle::GameOver)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Lifecycle::Idle => "idle",
            Lifecycle::Setup => "setup",
            Lifecycle::Active(_) => "active",
            Lifecycle::Resolving => "resolving",
            Lifecycle::Feedback => "feedback",
            Lifecycle::GameOver => "game_over",
        }
    }
}

impl<A: SubPhase> Lifecycle<A> {
    /// Sub-phase name while active, lifecycle name otherwise
    pub fn label(&self) -> &'static str {
        match self {
            Lifecycle::Active(a) => a.name(),
            other => other.name(),
        }
    }
}

/// Lifecycle plus the scheduler whose drivers belong to it
#[derive(Debug, Clone)]
pub struct PhaseMachine<A, D> {
    phase: Lifecycle<A>,
    scheduler: Scheduler<D>,
    transitions: u32,
}

impl<A, D> Default for PhaseMachine<A, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, D> PhaseMachine<A, D> {
    pub fn new() -> Self {
        Self {
            phase: Lifecycle::Idle,
            scheduler: Scheduler::new(),
            transitions: 0,
        }
    }

    pub fn phase(&self) -> &Lifecycle<A> {
        &self.phase
    }

    /// Mutable access to the active sub-phase, if any
    pub fn active_mut(&mut self) -> Option<&mut A> {
        match &mut self.phase {
            Lifecycle::Active(a) => Some(a),
            _ => None,
        }
    }

    /// Switch phase, cancelling everything the previous phase scheduled
    pub fn enter(&mut self, next: Lifecycle<A>) {
        self.scheduler.cancel_all();
        self.phase = next;
        self.transitions += 1;
    }

    /// Switch phase and make `driver` its per-frame driver
    pub fn enter_with(&mut self, next: Lifecycle<A>, driver: D) -> TickHandle {
        self.enter(next);
        self.scheduler.schedule_tick(driver)
    }

    /// Start a wall-clock countdown owned by the current phase
    pub fn start_countdown(&mut self, now_ms: f64, duration_ms: f64) -> TimerHandle {
        self.scheduler.start_countdown(now_ms, duration_ms)
    }

    pub fn poll_countdown(&mut self, now_ms: f64) -> Option<TimerHandle> {
        self.scheduler.poll_countdown(now_ms)
    }

    pub fn driver(&self) -> Option<&D> {
        self.scheduler.active()
    }

    pub fn driver_mut(&mut self) -> Option<&mut D> {
        self.scheduler.active_mut()
    }

    pub fn scheduler(&self) -> &Scheduler<D> {
        &self.scheduler
    }

    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    pub fn transitions(&self) -> u32 {
        self.transitions
    }
}

impl<A: PartialEq, D> PhaseMachine<A, D> {
    /// True iff the machine is in `Active(sub)`
    pub fn is_active(&self, sub: &A) -> bool {
        self.phase.active() == Some(sub)
    }
}
