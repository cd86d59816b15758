//! Drag-and-drop placement of tokens into slots
//!
//! Token `i` belongs in slot `i`. Every token is always in exactly one place:
//! a bench position, a slot, or the hand.

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Where a token was picked up from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    Bench(usize),
    Slot(usize),
}

/// Token currently being dragged
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hand {
    pub token: usize,
    pub origin: Source,
    pub pos: Vec2,
}

/// Result of releasing the hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropOutcome {
    /// Dropped into an empty slot
    Placed { slot: usize },
    /// Dropped onto an occupied slot; the occupant moved to `displaced_to`
    Swapped {
        slot: usize,
        displaced: usize,
        displaced_to: Source,
    },
    /// No slot in reach; the token went back where it came from
    Returned { to: Source },
}

/// Horizontal row of bench positions along the bottom of the field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchLayout {
    pub y: f32,
    pub width: f32,
    pub max_spacing: f32,
}

impl BenchLayout {
    /// Centre of bench position `index` when the bench has `count` positions
    pub fn position(&self, index: usize, count: usize) -> Vec2 {
        let spacing = self.max_spacing.min(self.width / (count as f32 + 1.0));
        let start_x = (self.width - (count.saturating_sub(1)) as f32 * spacing) / 2.0;
        Vec2::new(start_x + index as f32 * spacing, self.y)
    }
}

/// Slots, bench and hand for one round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementBoard {
    slots: Vec<Vec2>,
    assignment: Vec<Option<usize>>,
    bench: Vec<Option<usize>>,
    hand: Option<Hand>,
    pub snap_radius: f32,
    pub pick_radius: f32,
}

impl PlacementBoard {
    /// Board with every token on the bench in `bench_order`
    pub fn new(slots: Vec<Vec2>, bench_order: Vec<usize>, snap_radius: f32, pick_radius: f32) -> Self {
        let assignment = vec![None; slots.len()];
        Self {
            slots,
            assignment,
            bench: bench_order.into_iter().map(Some).collect(),
            hand: None,
            snap_radius,
            pick_radius,
        }
    }

    /// Board with the tokens on the bench in a random order
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R, slots: Vec<Vec2>, snap_radius: f32, pick_radius: f32) -> Self {
        let mut order: Vec<usize> = (0..slots.len()).collect();
        order.shuffle(rng);
        Self::new(slots, order, snap_radius, pick_radius)
    }

    pub fn slots(&self) -> &[Vec2] {
        &self.slots
    }

    pub fn assignment(&self) -> &[Option<usize>] {
        &self.assignment
    }

    pub fn bench(&self) -> &[Option<usize>] {
        &self.bench
    }

    pub fn hand(&self) -> Option<&Hand> {
        self.hand.as_ref()
    }

    /// Lift a token from `source` into the hand
    pub fn pick_up(&mut self, source: Source, pos: Vec2) -> bool {
        if self.hand.is_some() {
            return false;
        }
        let cell = match source {
            Source::Bench(i) => self.bench.get_mut(i),
            Source::Slot(i) => self.assignment.get_mut(i),
        };
        let Some(token) = cell.and_then(Option::take) else {
            return false;
        };
        self.hand = Some(Hand {
            token,
            origin: source,
            pos,
        });
        true
    }

    /// Pick up whatever is under `pos`: bench first, then placed tokens
    pub fn pick_at(&mut self, pos: Vec2, layout: &BenchLayout) -> bool {
        match self.source_at(pos, layout) {
            Some(source) => self.pick_up(source, pos),
            None => false,
        }
    }

    fn source_at(&self, pos: Vec2, layout: &BenchLayout) -> Option<Source> {
        let count = self.bench.len();
        let on_bench = self.bench.iter().enumerate().find_map(|(i, token)| {
            let hit = token.is_some() && layout.position(i, count).distance(pos) < self.pick_radius;
            hit.then_some(Source::Bench(i))
        });
        on_bench.or_else(|| {
            self.assignment.iter().enumerate().find_map(|(i, token)| {
                let hit = token.is_some() && self.slots[i].distance(pos) < self.pick_radius;
                hit.then_some(Source::Slot(i))
            })
        })
    }

    pub fn move_hand(&mut self, pos: Vec2) {
        if let Some(hand) = self.hand.as_mut() {
            hand.pos = pos;
        }
    }

    /// Closest slot strictly within the snap radius
    pub fn nearest_slot(&self, pos: Vec2) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, slot) in self.slots.iter().enumerate() {
            let dist = slot.distance(pos);
            let limit = best.map_or(self.snap_radius, |(_, d)| d);
            if dist < limit {
                best = Some((i, dist));
            }
        }
        best.map(|(i, _)| i)
    }

    /// Release the hand at `pos`; `None` when nothing was held
    pub fn drop(&mut self, pos: Vec2) -> Option<DropOutcome> {
        let hand = self.hand.take()?;

        let Some(slot) = self.nearest_slot(pos) else {
            let to = self.put_back(hand.token, hand.origin);
            return Some(DropOutcome::Returned { to });
        };

        match self.assignment[slot].replace(hand.token) {
            None => Some(DropOutcome::Placed { slot }),
            Some(displaced) => {
                let displaced_to = match hand.origin {
                    // The vacated slot takes the occupant
                    Source::Slot(from) => {
                        self.assignment[from] = Some(displaced);
                        Source::Slot(from)
                    }
                    Source::Bench(_) => Source::Bench(self.bench_insert(displaced)),
                };
                Some(DropOutcome::Swapped {
                    slot,
                    displaced,
                    displaced_to,
                })
            }
        }
    }

    /// Put the held token back where it was picked up
    pub fn return_hand(&mut self) -> Option<Source> {
        let hand = self.hand.take()?;
        Some(self.put_back(hand.token, hand.origin))
    }

    fn put_back(&mut self, token: usize, origin: Source) -> Source {
        match origin {
            Source::Slot(i) if self.assignment[i].is_none() => {
                self.assignment[i] = Some(token);
                origin
            }
            Source::Bench(i) if self.bench[i].is_none() => {
                self.bench[i] = Some(token);
                origin
            }
            _ => Source::Bench(self.bench_insert(token)),
        }
    }

    /// First empty bench position, else a new one at the end
    fn bench_insert(&mut self, token: usize) -> usize {
        match self.bench.iter().position(Option::is_none) {
            Some(i) => {
                self.bench[i] = Some(token);
                i
            }
            None => {
                self.bench.push(Some(token));
                self.bench.len() - 1
            }
        }
    }

    /// Fill empty slots with the remaining bench tokens in random order
    ///
    /// Any token still in the hand is returned first so it takes part.
    pub fn auto_fill<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        self.return_hand();

        let mut waiting: Vec<usize> = self
            .bench
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.map(|_| i))
            .collect();
        waiting.shuffle(rng);

        let empty: Vec<usize> = self
            .assignment
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.is_none().then_some(i))
            .collect();

        let mut filled = 0;
        for (slot, bench_index) in empty.into_iter().zip(waiting) {
            self.assignment[slot] = self.bench[bench_index].take();
            filled += 1;
        }
        filled
    }

    pub fn is_complete(&self) -> bool {
        self.assignment.iter().all(Option::is_some)
    }

    /// Slots holding their own token
    pub fn correct_count(&self) -> usize {
        self.assignment
            .iter()
            .enumerate()
            .filter(|(i, t)| **t == Some(*i))
            .count()
    }

    /// `correct * per_correct`, plus `slots * bonus_per_slot` when all are right
    pub fn score(&self, per_correct: u32, bonus_per_slot: u32) -> u32 {
        let correct = self.correct_count();
        let slots = self.slots.len();
        let bonus = if correct == slots { slots as u32 * bonus_per_slot } else { 0 };
        correct as u32 * per_correct + bonus
    }

    /// Tokens present anywhere on the board (bench, slots, hand)
    pub fn token_count(&self) -> usize {
        self.bench.iter().flatten().count()
            + self.assignment.iter().flatten().count()
            + usize::from(self.hand.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn board(n: usize) -> PlacementBoard {
        let slots = (0..n).map(|i| Vec2::new(100.0 * i as f32 + 50.0, 100.0)).collect();
        PlacementBoard::new(slots, (0..n).collect(), 45.0, 30.0)
    }

    fn layout() -> BenchLayout {
        BenchLayout {
            y: 500.0,
            width: 500.0,
            max_spacing: 65.0,
        }
    }

    #[test]
    fn test_place_into_empty_slot() {
        let mut b = board(3);
        assert!(b.pick_up(Source::Bench(1), Vec2::ZERO));
        let outcome = b.drop(Vec2::new(160.0, 110.0));
        assert_eq!(outcome, Some(DropOutcome::Placed { slot: 1 }));
        assert_eq!(b.assignment()[1], Some(1));
        assert_eq!(b.bench()[1], None);
        assert_eq!(b.correct_count(), 1);
    }

    #[test]
    fn test_swap_between_slots() {
        let mut b = board(3);
        b.pick_up(Source::Bench(0), Vec2::ZERO);
        b.drop(Vec2::new(50.0, 100.0));
        b.pick_up(Source::Bench(1), Vec2::ZERO);
        b.drop(Vec2::new(150.0, 100.0));

        // Drag slot 0's token onto slot 1
        assert!(b.pick_up(Source::Slot(0), Vec2::ZERO));
        let outcome = b.drop(Vec2::new(150.0, 100.0));
        assert_eq!(
            outcome,
            Some(DropOutcome::Swapped {
                slot: 1,
                displaced: 1,
                displaced_to: Source::Slot(0),
            })
        );
        assert_eq!(b.assignment(), &[Some(1), Some(0), None]);
    }

    #[test]
    fn test_swap_from_bench_sends_occupant_to_first_free_bench() {
        let mut b = board(3);
        b.pick_up(Source::Bench(2), Vec2::ZERO);
        b.drop(Vec2::new(50.0, 100.0));
        // Bench now [0, 1, _]; drop token 0 onto slot 0
        b.pick_up(Source::Bench(0), Vec2::ZERO);
        let outcome = b.drop(Vec2::new(50.0, 100.0));
        assert_eq!(
            outcome,
            Some(DropOutcome::Swapped {
                slot: 0,
                displaced: 2,
                displaced_to: Source::Bench(0),
            })
        );
        assert_eq!(b.bench(), &[Some(2), Some(1), None]);
    }

    #[test]
    fn test_drop_out_of_reach_returns_to_origin() {
        let mut b = board(2);
        b.pick_up(Source::Bench(1), Vec2::ZERO);
        let outcome = b.drop(Vec2::new(400.0, 400.0));
        assert_eq!(outcome, Some(DropOutcome::Returned { to: Source::Bench(1) }));
        assert_eq!(b.bench()[1], Some(1));
        assert_eq!(b.drop(Vec2::ZERO), None);
    }

    #[test]
    fn test_pick_at_prefers_bench() {
        let mut b = board(3);
        let spot = layout().position(2, 3);
        assert!(b.pick_at(spot + Vec2::new(5.0, 0.0), &layout()));
        assert_eq!(b.hand().map(|h| h.token), Some(2));
        // Only one token in hand at a time
        assert!(!b.pick_at(layout().position(0, 3), &layout()));
    }

    #[test]
    fn test_bench_layout_centres_row() {
        let l = layout();
        // 500 / 4 = 125 > 65, so spacing is 65
        assert_eq!(l.position(1, 3), Vec2::new(250.0, 500.0));
        assert_eq!(l.position(0, 3), Vec2::new(185.0, 500.0));
    }

    #[test]
    fn test_formation_scoring() {
        let mut b = board(5);
        for i in 0..5 {
            b.pick_up(Source::Bench(i), Vec2::ZERO);
            b.drop(b.slots()[i]);
        }
        assert!(b.is_complete());
        assert_eq!(b.score(10, 5), 5 * 10 + 5 * 5);

        // Swap the last two: 3 correct, no bonus
        b.pick_up(Source::Slot(3), Vec2::ZERO);
        b.drop(b.slots()[4]);
        assert_eq!(b.correct_count(), 3);
        assert_eq!(b.score(10, 5), 30);
    }

    #[test]
    fn test_auto_fill_returns_hand_first() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut b = board(4);
        b.pick_up(Source::Bench(3), Vec2::new(10.0, 10.0));
        let filled = b.auto_fill(&mut rng);
        assert_eq!(filled, 4);
        assert!(b.is_complete());
        assert!(b.hand().is_none());
        assert_eq!(b.token_count(), 4);
    }

    #[derive(Debug, Clone)]
    enum Op {
        PickBench(usize),
        PickSlot(usize),
        Drop(usize, bool),
        Return,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..8).prop_map(Op::PickBench),
            (0usize..6).prop_map(Op::PickSlot),
            (0usize..6, any::<bool>()).prop_map(|(s, near)| Op::Drop(s, near)),
            Just(Op::Return),
        ]
    }

    proptest! {
        #[test]
        fn prop_tokens_are_conserved(ops in prop::collection::vec(op(), 1..60), seed in any::<u64>()) {
            let n = 6;
            let mut b = board(n);
            for op in ops {
                let before = b.clone();
                match op {
                    Op::PickBench(i) => { b.pick_up(Source::Bench(i), Vec2::ZERO); }
                    Op::PickSlot(i) => { b.pick_up(Source::Slot(i), Vec2::ZERO); }
                    Op::Drop(slot, near) => {
                        let pos = if near { b.slots()[slot] } else { Vec2::new(-500.0, -500.0) };
                        let held = before.hand().copied();
                        let outcome = b.drop(pos);
                        // Swap law
                        if let (Some(hand), Some(DropOutcome::Swapped { slot, displaced, displaced_to })) = (held, outcome) {
                            prop_assert_eq!(b.assignment()[slot], Some(hand.token));
                            prop_assert_eq!(before.assignment()[slot], Some(displaced));
                            match (hand.origin, displaced_to) {
                                (Source::Slot(from), Source::Slot(to)) => {
                                    prop_assert_eq!(from, to);
                                    prop_assert_eq!(b.assignment()[from], Some(displaced));
                                }
                                (Source::Bench(_), Source::Bench(to)) => {
                                    prop_assert_eq!(b.bench()[to], Some(displaced));
                                }
                                other => prop_assert!(false, "unexpected swap {:?}", other),
                            }
                        }
                    }
                    Op::Return => { b.return_hand(); }
                }
                prop_assert_eq!(b.token_count(), n);

                // Each token appears exactly once
                let mut seen = vec![0u8; n];
                for t in b.bench().iter().chain(b.assignment().iter()).flatten() {
                    seen[*t] += 1;
                }
                if let Some(h) = b.hand() {
                    seen[h.token] += 1;
                }
                prop_assert!(seen.iter().all(|&c| c == 1));
            }

            let mut rng = Pcg32::seed_from_u64(seed);
            b.auto_fill(&mut rng);
            prop_assert!(b.is_complete());
            prop_assert_eq!(b.token_count(), n);
        }
    }
}
