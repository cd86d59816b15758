//! Coach notifications and acknowledgement prompts
//!
//! Games never block on the presentation layer. A plain message is fire and
//! forget; a prompt carries an [`AckTicket`] and the game stays where it is
//! until the presentation hands that ticket back through
//! `Session::acknowledge`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Coaches taking turns on plain messages
pub const COACHES: [&str; 3] = ["Siobhan", "Jeff", "Andy"];

/// How long a message stays up unless told otherwise
pub fn display_ms(message: &str) -> f64 {
    (message.chars().count() as f64 * 60.0).max(3000.0)
}

/// Identifies one outstanding prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AckTicket(pub u64);

/// Hands out unique tickets
#[derive(Debug, Clone, Default)]
pub struct TicketBook {
    next: u64,
}

impl TicketBook {
    pub fn issue(&mut self) -> AckTicket {
        self.next += 1;
        AckTicket(self.next)
    }
}

/// Second beat of a two-part prompt (the team cutting the coach off)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interruption {
    pub speaker: String,
    pub message: String,
    pub button: String,
}

/// A message the player has to acknowledge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub speaker: String,
    pub message: String,
    pub button: String,
    /// Shown after the first button press, before the ticket is returned
    pub interrupt: Option<Interruption>,
}

impl Prompt {
    pub fn new(speaker: impl Into<String>, message: impl Into<String>, button: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            message: message.into(),
            button: button.into(),
            interrupt: None,
        }
    }

    pub fn interrupted_by(mut self, speaker: &str, message: &str, button: &str) -> Self {
        self.interrupt = Some(Interruption {
            speaker: speaker.to_string(),
            message: message.to_string(),
            button: button.to_string(),
        });
        self
    }
}

/// Presentation-side sink for coach output
pub trait Notifier {
    /// Show a transient message for `duration_ms`
    fn notify(&mut self, message: &str, duration_ms: f64);

    /// Show a prompt; the game waits for `ticket` to come back
    fn prompt(&mut self, ticket: AckTicket, prompt: &Prompt);

    /// The prompt for `ticket` was answered
    fn dismiss(&mut self, _ticket: AckTicket) {}

    /// Hide whatever is showing (new run)
    fn clear(&mut self) {}
}

/// A delivered coach message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachMessage {
    pub coach: String,
    pub text: String,
    pub duration_ms: f64,
}

/// Buffering notifier; the platform layer drains it every frame
#[derive(Debug, Clone, Default)]
pub struct CoachQueue {
    messages: VecDeque<CoachMessage>,
    prompts: Vec<(AckTicket, Prompt)>,
    turn: usize,
}

impl CoachQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages not yet taken by the presentation
    pub fn messages(&self) -> impl Iterator<Item = &CoachMessage> {
        self.messages.iter()
    }

    pub fn drain_messages(&mut self) -> Vec<CoachMessage> {
        self.messages.drain(..).collect()
    }

    pub fn last_message(&self) -> Option<&CoachMessage> {
        self.messages.back()
    }

    /// Prompts still waiting for acknowledgement, oldest first
    pub fn open_prompts(&self) -> &[(AckTicket, Prompt)] {
        &self.prompts
    }

    pub fn latest_prompt(&self) -> Option<&(AckTicket, Prompt)> {
        self.prompts.last()
    }
}

impl Notifier for CoachQueue {
    fn notify(&mut self, message: &str, duration_ms: f64) {
        let coach = COACHES[self.turn % COACHES.len()];
        self.turn += 1;
        log::debug!("Coach {}: {}", coach, message);
        self.messages.push_back(CoachMessage {
            coach: coach.to_string(),
            text: message.to_string(),
            duration_ms,
        });
    }

    fn prompt(&mut self, ticket: AckTicket, prompt: &Prompt) {
        log::debug!("Prompt {:?} from {}", ticket, prompt.speaker);
        self.prompts.push((ticket, prompt.clone()));
    }

    fn dismiss(&mut self, ticket: AckTicket) {
        self.prompts.retain(|(t, _)| *t != ticket);
    }

    fn clear(&mut self) {
        self.messages.clear();
        self.prompts.clear();
    }
}

/// One band of a game-over verdict
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    /// Lowest score in this band
    pub min: f64,
    pub title: &'static str,
    pub line: &'static str,
}

/// Band for `score`; `tiers` runs from the highest band down and ends with a
/// catch-all
pub fn tier_for(tiers: &'static [Tier], score: f64) -> Option<&'static Tier> {
    tiers.iter().find(|t| score >= t.min)
}

/// A line said once at a fixed time into a run, if the run qualifies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedCue {
    pub at_ms: f64,
    /// Game-specific gate value (score needed, shots remaining, ...)
    pub threshold: u32,
    pub line: &'static str,
}

/// Timed cues for one run; each fires at most once
#[derive(Debug, Clone, Default)]
pub struct CueSheet {
    cues: Vec<TimedCue>,
    next: usize,
}

impl CueSheet {
    pub fn new(cues: &[TimedCue]) -> Self {
        let mut cues = cues.to_vec();
        cues.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));
        Self { cues, next: 0 }
    }

    /// Line of the cue that came due by `elapsed_ms` and passes `gate`
    ///
    /// A cue that comes due while `gate` fails is dropped, not retried.
    pub fn poll(&mut self, elapsed_ms: f64, mut gate: impl FnMut(&TimedCue) -> bool) -> Option<&'static str> {
        let mut said = None;
        while let Some(cue) = self.cues.get(self.next) {
            if cue.at_ms > elapsed_ms {
                break;
            }
            self.next += 1;
            if gate(cue) {
                said = Some(cue.line);
            }
        }
        said
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIERS: &[Tier] = &[
        Tier { min: 20.0, title: "Top", line: "top" },
        Tier { min: 10.0, title: "Mid", line: "mid" },
        Tier { min: f64::NEG_INFINITY, title: "Low", line: "low" },
    ];

    #[test]
    fn test_display_time() {
        assert_eq!(display_ms("short"), 3000.0);
        let long = "x".repeat(100);
        assert_eq!(display_ms(&long), 6000.0);
    }

    #[test]
    fn test_tier_bands() {
        assert_eq!(tier_for(TIERS, 25.0).map(|t| t.title), Some("Top"));
        assert_eq!(tier_for(TIERS, 20.0).map(|t| t.title), Some("Top"));
        assert_eq!(tier_for(TIERS, 19.0).map(|t| t.title), Some("Mid"));
        assert_eq!(tier_for(TIERS, 0.0).map(|t| t.title), Some("Low"));
    }

    #[test]
    fn test_queue_rotates_coaches_and_dismisses() {
        let mut queue = CoachQueue::new();
        queue.notify("one", 3000.0);
        queue.notify("two", 3000.0);
        let coaches: Vec<_> = queue.messages().map(|m| m.coach.clone()).collect();
        assert_eq!(coaches, vec!["Siobhan", "Jeff"]);

        let mut book = TicketBook::default();
        let ticket = book.issue();
        queue.prompt(ticket, &Prompt::new("Andy", "Right then", "OK"));
        assert_eq!(queue.open_prompts().len(), 1);
        queue.dismiss(ticket);
        assert!(queue.open_prompts().is_empty());
        assert_eq!(queue.drain_messages().len(), 2);
        assert!(queue.last_message().is_none());
    }

    #[test]
    fn test_cues_fire_once_and_respect_gate() {
        let mut sheet = CueSheet::new(&[
            TimedCue { at_ms: 18_000.0, threshold: 8, line: "second" },
            TimedCue { at_ms: 8_000.0, threshold: 3, line: "first" },
        ]);
        let score = 5;
        assert_eq!(sheet.poll(7_000.0, |c| score >= c.threshold), None);
        assert_eq!(sheet.poll(8_000.0, |c| score >= c.threshold), Some("first"));
        assert_eq!(sheet.poll(9_000.0, |c| score >= c.threshold), None);
        // Due but gated out: dropped
        assert_eq!(sheet.poll(18_500.0, |c| score >= c.threshold), None);
        assert_eq!(sheet.poll(40_000.0, |_| true), None);
    }
}
