//! Platform layer
//!
//! The browser build (wasm32) wires a canvas to a [`Session`]: DOM input in,
//! requestAnimationFrame ticks, and one JSON [`FrameReport`] per refresh out.
//! The report assembly lives here so it runs on every target.

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::Camp;

use std::collections::HashSet;

use serde::Serialize;

use crate::coach::{AckTicket, CoachMessage, CoachQueue, Prompt};
use crate::games::{MiniGame, Session, Snapshot};

/// Hands each open prompt to the page exactly once
#[derive(Debug, Default)]
pub struct PromptCursor {
    shown: HashSet<AckTicket>,
}

impl PromptCursor {
    /// Prompts in `open` not yet handed out
    pub fn fresh(&mut self, open: &[(AckTicket, Prompt)]) -> Vec<(AckTicket, Prompt)> {
        let fresh: Vec<_> = open
            .iter()
            .filter(|(ticket, _)| !self.shown.contains(ticket))
            .cloned()
            .collect();
        // Answered tickets drop out so a reused number shows again
        self.shown = open.iter().map(|(ticket, _)| *ticket).collect();
        fresh
    }
}

/// Everything the page needs after one display refresh
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub snapshot: Snapshot,
    pub messages: Vec<CoachMessage>,
    /// Prompts opened since the previous report
    pub prompts: Vec<(AckTicket, Prompt)>,
}

impl FrameReport {
    /// Snapshot the game and drain the coach output accumulated since last time
    pub fn collect<G: MiniGame>(session: &mut Session<G, CoachQueue>, cursor: &mut PromptCursor) -> Self {
        let prompts = cursor.fresh(session.coach().open_prompts());
        Self {
            snapshot: session.snapshot(),
            messages: session.coach_mut().drain_messages(),
            prompts,
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::games::testing::*;
    use crate::games::{Formation, KeepieUps};
    use crate::tuning::{FormationTuning, KeepieUpsTuning};

    #[test]
    fn test_prompt_reported_once() {
        let mut s = session(Formation::new(Vec2::new(400.0, 700.0), FormationTuning::default()), 3);
        let mut cursor = PromptCursor::default();
        s.start(0.0);

        let first = FrameReport::collect(&mut s, &mut cursor);
        assert_eq!(first.prompts.len(), 1);
        assert_eq!(first.snapshot.phase, "briefing");
        assert!(FrameReport::collect(&mut s, &mut cursor).prompts.is_empty());

        answer_latest_prompt(&mut s, 10.0);
        let next = FrameReport::collect(&mut s, &mut cursor);
        assert_eq!(next.prompts.len(), 1);
        assert_eq!(next.prompts[0].1.button, "Ready!");
        assert_ne!(next.prompts[0].0, first.prompts[0].0);
    }

    #[test]
    fn test_messages_drained_into_report() {
        let mut s = session(KeepieUps::new(Vec2::new(500.0, 600.0), KeepieUpsTuning::default()), 1);
        let mut cursor = PromptCursor::default();
        s.start(0.0);

        let report = FrameReport::collect(&mut s, &mut cursor);
        assert_eq!(report.messages.len(), 1);
        assert!(report.prompts.is_empty());
        assert_eq!(s.coach().messages().count(), 0);
        assert!(FrameReport::collect(&mut s, &mut cursor).messages.is_empty());

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"kind\":\"keepie_ups\""));
    }
}
