//! Gesture decoding engine
//!
//! The sensor streams U/D/L/R photodiode datasets into a 32-entry FIFO while a
//! hand moves over it. A [`GestureSession`] turns those bursts into a single
//! [`Motion`]:
//!
//! 1. [`GestureSession::process`] takes the first and last datasets of a burst
//!    that rise above the noise floor, compares the normalized up/down and
//!    left/right ratios of the two, and accumulates the difference.
//! 2. Accumulated differences past a fixed threshold become a directional vote
//!    per axis. Bursts with no motion on either axis feed the near/far
//!    detector instead.
//! 3. [`GestureSession::decode`] resolves the votes, breaking diagonal ties by
//!    the larger accumulated magnitude.
//!
//! The engine does no I/O; the driver feeds it from the device FIFO.

use heapless::Vec;

/// Depth of the device gesture FIFO, in datasets
pub const FIFO_CAPACITY: usize = 32;

/// Bursts with this many datasets or fewer carry no usable edges
const MIN_BATCH_LEN: usize = 4;
/// Every channel must exceed this for a dataset to count
const OUT_THRESHOLD: u8 = 10;
/// Accumulated ratio change that turns into a directional vote
const DIRECTION_THRESHOLD: i32 = 50;
/// Per-burst ratio change below which a burst is a near/far candidate
const NEAR_FAR_WINDOW: i32 = 20;
const NEAR_COUNT: u32 = 10;
const FAR_COUNT: u32 = 2;

/// Resolved gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Motion {
    /// No gesture recognised
    #[default]
    None,
    /// Swipe towards the left photodiode
    Left,
    /// Swipe towards the right photodiode
    Right,
    /// Swipe towards the up photodiode
    Up,
    /// Swipe towards the down photodiode
    Down,
    /// Object approached and held still
    Near,
    /// Object approached and moved away
    Far,
}

/// Latched depth-only outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum GestureState {
    /// No depth gesture latched
    #[default]
    None,
    /// Near latched
    Near,
    /// Far latched
    Far,
}

/// One FIFO dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Sample {
    /// Up photodiode
    pub up: u8,
    /// Down photodiode
    pub down: u8,
    /// Left photodiode
    pub left: u8,
    /// Right photodiode
    pub right: u8,
}

impl Sample {
    /// Create a dataset from its four channels
    pub const fn new(up: u8, down: u8, left: u8, right: u8) -> Self {
        Self {
            up,
            down,
            left,
            right,
        }
    }

    fn is_above(&self, threshold: u8) -> bool {
        self.up > threshold && self.down > threshold && self.left > threshold && self.right > threshold
    }

    /// Up/down difference as a percentage of their sum, truncated toward zero
    pub fn ud_ratio(&self) -> i32 {
        ratio(self.up, self.down)
    }

    /// Left/right difference as a percentage of their sum, truncated toward zero
    pub fn lr_ratio(&self) -> i32 {
        ratio(self.left, self.right)
    }
}

fn ratio(a: u8, b: u8) -> i32 {
    let (a, b) = (i32::from(a), i32::from(b));
    if a + b == 0 {
        return 0;
    }
    (a - b) * 100 / (a + b)
}

/// Datasets drained from the FIFO in one cycle
#[derive(Debug, Clone, Default)]
pub struct SampleBatch {
    samples: Vec<Sample, FIFO_CAPACITY>,
}

impl SampleBatch {
    /// Create an empty batch
    pub const fn new() -> Self {
        Self {
            samples: Vec::new(),
        }
    }

    /// Number of datasets held
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when no dataset is held
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Free slots before the batch is full
    pub fn remaining(&self) -> usize {
        FIFO_CAPACITY - self.samples.len()
    }

    /// Append a dataset. Returns false and drops it when the batch is full.
    pub fn push(&mut self, sample: Sample) -> bool {
        self.samples.push(sample).is_ok()
    }

    /// Append datasets from raw FIFO bytes laid out as U,D,L,R groups.
    ///
    /// A trailing partial group is ignored. Returns the number of datasets
    /// stored.
    pub fn extend_from_fifo(&mut self, bytes: &[u8]) -> usize {
        let mut stored = 0;
        for chunk in bytes.chunks_exact(4) {
            if !self.push(Sample::new(chunk[0], chunk[1], chunk[2], chunk[3])) {
                break;
            }
            stored += 1;
        }
        stored
    }

    /// Stored datasets, oldest first
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Drop all datasets
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Accumulated ratio changes across bursts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct GestureDelta {
    /// Vertical accumulator
    pub ud: i32,
    /// Horizontal accumulator
    pub lr: i32,
}

/// Classification counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct GestureCounters {
    /// Vertical vote: -1 up, 0 none, 1 down
    pub ud: i8,
    /// Horizontal vote: -1 left, 0 none, 1 right
    pub lr: i8,
    /// Bursts with no motion on either axis
    pub near: u32,
    /// Bursts with small but non-zero motion
    pub far: u32,
}

fn vote(accumulated: i32) -> i8 {
    if accumulated >= DIRECTION_THRESHOLD {
        1
    } else if accumulated <= -DIRECTION_THRESHOLD {
        -1
    } else {
        0
    }
}

/// State of one gesture interaction, from enable until the FIFO runs dry
#[derive(Debug, Clone, Default)]
pub struct GestureSession {
    batch: SampleBatch,
    delta: GestureDelta,
    counters: GestureCounters,
    state: GestureState,
    motion: Motion,
}

impl GestureSession {
    /// Create a session with every accumulator at rest
    pub const fn new() -> Self {
        Self {
            batch: SampleBatch::new(),
            delta: GestureDelta { ud: 0, lr: 0 },
            counters: GestureCounters {
                ud: 0,
                lr: 0,
                near: 0,
                far: 0,
            },
            state: GestureState::None,
            motion: Motion::None,
        }
    }

    /// Return every accumulator to rest
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Current burst
    pub fn batch(&self) -> &SampleBatch {
        &self.batch
    }

    /// Current burst, for filling
    pub fn batch_mut(&mut self) -> &mut SampleBatch {
        &mut self.batch
    }

    /// Accumulated ratio changes
    pub fn delta(&self) -> GestureDelta {
        self.delta
    }

    /// Classification counters
    pub fn counters(&self) -> GestureCounters {
        self.counters
    }

    /// Latched depth state
    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Last resolved motion
    pub fn motion(&self) -> Motion {
        self.motion
    }

    /// Fold the current burst into the accumulators.
    ///
    /// Returns false, leaving every accumulator untouched, when the burst is
    /// too short or never rises above the noise floor.
    pub fn process(&mut self) -> bool {
        let samples = self.batch.samples();
        if samples.len() <= MIN_BATCH_LEN || samples.len() > FIFO_CAPACITY {
            return false;
        }

        let Some(first) = samples.iter().find(|s| s.is_above(OUT_THRESHOLD)) else {
            return false;
        };
        let Some(last) = samples.iter().rev().find(|s| s.is_above(OUT_THRESHOLD)) else {
            return false;
        };

        let ud_delta = last.ud_ratio() - first.ud_ratio();
        let lr_delta = last.lr_ratio() - first.lr_ratio();

        self.delta.ud += ud_delta;
        self.delta.lr += lr_delta;

        self.counters.ud = vote(self.delta.ud);
        self.counters.lr = vote(self.delta.lr);

        if ud_delta.abs() < NEAR_FAR_WINDOW && lr_delta.abs() < NEAR_FAR_WINDOW {
            let still = ud_delta == 0 && lr_delta == 0;

            if self.counters.ud == 0 && self.counters.lr == 0 {
                if still {
                    self.counters.near = self.counters.near.saturating_add(1);
                } else {
                    self.counters.far = self.counters.far.saturating_add(1);
                }

                // latched until the session resets
                if self.state == GestureState::None
                    && self.counters.near >= NEAR_COUNT
                    && self.counters.far >= FAR_COUNT
                {
                    self.state = if still {
                        GestureState::Near
                    } else {
                        GestureState::Far
                    };
                }
            } else {
                if still {
                    self.counters.near = self.counters.near.saturating_add(1);
                }

                // a vote that stopped progressing is stale
                if self.counters.near >= NEAR_COUNT {
                    self.counters.ud = 0;
                    self.counters.lr = 0;
                    self.delta = GestureDelta::default();
                }
            }
        }

        true
    }

    /// Resolve the accumulated votes into a motion.
    ///
    /// A resolved motion is remembered as the session's last motion;
    /// [`Motion::None`] leaves it untouched.
    pub fn decode(&mut self) -> Motion {
        let motion = match self.state {
            GestureState::Near => Motion::Near,
            GestureState::Far => Motion::Far,
            GestureState::None => self.resolve_direction(),
        };

        if motion != Motion::None {
            self.motion = motion;
        }
        motion
    }

    fn resolve_direction(&self) -> Motion {
        let vertical = self.delta.ud.abs() > self.delta.lr.abs();

        match (self.counters.ud, self.counters.lr) {
            (-1, 0) => Motion::Up,
            (1, 0) => Motion::Down,
            (0, 1) => Motion::Right,
            (0, -1) => Motion::Left,
            (-1, 1) => {
                if vertical {
                    Motion::Up
                } else {
                    Motion::Right
                }
            }
            (1, -1) => {
                if vertical {
                    Motion::Down
                } else {
                    Motion::Left
                }
            }
            (-1, -1) => {
                if vertical {
                    Motion::Up
                } else {
                    Motion::Left
                }
            }
            (1, 1) => {
                if vertical {
                    Motion::Down
                } else {
                    Motion::Right
                }
            }
            _ => Motion::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLAT: Sample = Sample::new(50, 50, 50, 50);

    fn session_with(samples: &[Sample]) -> GestureSession {
        let mut session = GestureSession::new();
        for sample in samples {
            assert!(session.batch.push(*sample));
        }
        session
    }

    fn load(session: &mut GestureSession, samples: &[Sample]) {
        session.batch.clear();
        for sample in samples {
            assert!(session.batch.push(*sample));
        }
    }

    /// Five flat datasets: zero delta on both axes
    fn still_burst() -> [Sample; 5] {
        [FLAT; 5]
    }

    /// Small vertical drift: ud_delta = 9, lr_delta = 0
    fn drift_burst() -> [Sample; 5] {
        [FLAT, FLAT, FLAT, FLAT, Sample::new(60, 50, 50, 50)]
    }

    /// U falls while D rises
    fn upward_swipe() -> [Sample; 6] {
        [
            Sample::new(100, 50, 50, 50),
            Sample::new(90, 60, 50, 50),
            Sample::new(80, 70, 50, 50),
            Sample::new(70, 80, 50, 50),
            Sample::new(60, 90, 50, 50),
            Sample::new(50, 100, 50, 50),
        ]
    }

    #[test]
    fn short_batches_are_ignored() {
        for len in 0..=MIN_BATCH_LEN {
            let mut session = GestureSession::new();
            for _ in 0..len {
                session.batch.push(Sample::new(200, 20, 200, 20));
            }
            assert!(!session.process());
            assert_eq!(session.delta(), GestureDelta::default());
            assert_eq!(session.counters(), GestureCounters::default());
        }
    }

    #[test]
    fn noise_floor_batches_are_ignored() {
        let mut session = session_with(&[
            Sample::new(200, 200, 200, 10),
            Sample::new(11, 11, 11, 10),
            Sample::new(0, 0, 0, 0),
            Sample::new(255, 255, 9, 255),
            Sample::new(10, 10, 10, 10),
        ]);
        assert!(!session.process());
        assert_eq!(session.delta(), GestureDelta::default());
    }

    #[test]
    fn ratio_truncates_toward_zero() {
        assert_eq!(Sample::new(100, 50, 0, 0).ud_ratio(), 33);
        assert_eq!(Sample::new(50, 100, 0, 0).ud_ratio(), -33);
        assert_eq!(Sample::new(0, 0, 60, 50).lr_ratio(), 9);
    }

    #[test]
    fn first_and_last_skip_quiet_edges() {
        let mut session = session_with(&[
            Sample::new(5, 5, 5, 5),
            Sample::new(100, 50, 50, 50),
            FLAT,
            Sample::new(50, 100, 50, 50),
            Sample::new(3, 200, 200, 200),
        ]);
        assert!(session.process());
        assert_eq!(session.delta().ud, -66);
        assert_eq!(session.delta().lr, 0);
    }

    #[test]
    fn vote_threshold() {
        assert_eq!(vote(50), 1);
        assert_eq!(vote(49), 0);
        assert_eq!(vote(0), 0);
        assert_eq!(vote(-49), 0);
        assert_eq!(vote(-50), -1);
    }

    #[test]
    fn accumulated_delta_crosses_threshold() {
        let mut session = GestureSession::new();
        session.delta.ud = 17;
        // 33 - 0 on the vertical axis
        load(&mut session, &[FLAT, FLAT, FLAT, FLAT, Sample::new(100, 50, 50, 50)]);
        assert!(session.process());
        assert_eq!(session.delta().ud, 50);
        assert_eq!(session.counters().ud, 1);

        let mut session = GestureSession::new();
        session.delta.ud = 16;
        load(&mut session, &[FLAT, FLAT, FLAT, FLAT, Sample::new(100, 50, 50, 50)]);
        assert!(session.process());
        assert_eq!(session.delta().ud, 49);
        assert_eq!(session.counters().ud, 0);

        let mut session = GestureSession::new();
        session.delta.ud = -17;
        load(&mut session, &[FLAT, FLAT, FLAT, FLAT, Sample::new(50, 100, 50, 50)]);
        assert!(session.process());
        assert_eq!(session.delta().ud, -50);
        assert_eq!(session.counters().ud, -1);
    }

    #[test]
    fn upward_swipe_votes_up() {
        let mut session = session_with(&upward_swipe());
        assert!(session.process());
        assert_eq!(session.counters().ud, -1);
        assert_eq!(session.counters().lr, 0);
        assert_eq!(session.decode(), Motion::Up);
        assert_eq!(session.motion(), Motion::Up);
    }

    #[test]
    fn decode_table() {
        let cases = [
            ((-1, 0), Motion::Up),
            ((1, 0), Motion::Down),
            ((0, 1), Motion::Right),
            ((0, -1), Motion::Left),
            ((0, 0), Motion::None),
        ];
        for ((ud, lr), expected) in cases {
            let mut session = GestureSession::new();
            session.counters.ud = ud;
            session.counters.lr = lr;
            assert_eq!(session.decode(), expected, "counters ({ud}, {lr})");
        }
    }

    #[test]
    fn decode_is_total_over_votes() {
        for ud in -1..=1 {
            for lr in -1..=1 {
                let mut session = GestureSession::new();
                session.counters.ud = ud;
                session.counters.lr = lr;
                session.delta = GestureDelta { ud: 70, lr: 60 };
                let motion = session.decode();
                assert_eq!(motion == Motion::None, ud == 0 && lr == 0);
                assert_eq!(session.decode(), motion);
            }
        }
    }

    #[test]
    fn diagonal_tie_breaks() {
        let diagonal = |ud: i8, lr: i8, delta_ud: i32, delta_lr: i32| {
            let mut session = GestureSession::new();
            session.counters.ud = ud;
            session.counters.lr = lr;
            session.delta = GestureDelta {
                ud: delta_ud,
                lr: delta_lr,
            };
            session.decode()
        };

        assert_eq!(diagonal(-1, 1, -60, 30), Motion::Up);
        assert_eq!(diagonal(-1, 1, -10, 30), Motion::Right);
        assert_eq!(diagonal(1, -1, 80, -60), Motion::Down);
        assert_eq!(diagonal(1, -1, 60, -60), Motion::Left);
        assert_eq!(diagonal(-1, -1, -90, -60), Motion::Up);
        assert_eq!(diagonal(-1, -1, -60, -90), Motion::Left);
        assert_eq!(diagonal(1, 1, 90, 60), Motion::Down);
        assert_eq!(diagonal(1, 1, 60, 90), Motion::Right);
    }

    #[test]
    fn unresolved_decode_keeps_last_motion() {
        let mut session = GestureSession::new();
        session.counters.lr = 1;
        assert_eq!(session.decode(), Motion::Right);

        session.counters.lr = 0;
        assert_eq!(session.decode(), Motion::None);
        assert_eq!(session.motion(), Motion::Right);
    }

    #[test]
    fn still_after_drift_latches_near() {
        let mut session = GestureSession::new();
        for _ in 0..2 {
            load(&mut session, &drift_burst());
            assert!(session.process());
        }
        assert_eq!(session.counters().far, 2);
        assert_eq!(session.counters().ud, 0);

        for cycle in 1..=NEAR_COUNT {
            assert_eq!(session.state(), GestureState::None, "cycle {cycle}");
            load(&mut session, &still_burst());
            assert!(session.process());
        }
        assert_eq!(session.counters().near, NEAR_COUNT);
        assert_eq!(session.state(), GestureState::Near);
        assert_eq!(session.decode(), Motion::Near);
    }

    #[test]
    fn drift_after_still_latches_far() {
        let mut session = GestureSession::new();
        for _ in 0..NEAR_COUNT {
            load(&mut session, &still_burst());
            assert!(session.process());
        }
        assert_eq!(session.state(), GestureState::None);

        load(&mut session, &drift_burst());
        assert!(session.process());
        assert_eq!(session.state(), GestureState::None);

        load(&mut session, &drift_burst());
        assert!(session.process());
        assert_eq!(session.state(), GestureState::Far);

        // latched state dominates any later vote
        session.counters.ud = -1;
        assert_eq!(session.decode(), Motion::Far);
    }

    #[test]
    fn latched_far_survives_later_still_burst() {
        let mut session = GestureSession::new();
        for _ in 0..NEAR_COUNT {
            load(&mut session, &still_burst());
            assert!(session.process());
        }
        for _ in 0..FAR_COUNT {
            load(&mut session, &drift_burst());
            assert!(session.process());
        }
        assert_eq!(session.state(), GestureState::Far);

        load(&mut session, &still_burst());
        assert!(session.process());
        assert_eq!(session.counters().near, NEAR_COUNT + 1);
        assert_eq!(session.state(), GestureState::Far);
        assert_eq!(session.decode(), Motion::Far);
        assert_eq!(session.motion(), Motion::Far);
    }

    #[test]
    fn latched_near_survives_later_drift_burst() {
        let mut session = GestureSession::new();
        for _ in 0..FAR_COUNT {
            load(&mut session, &drift_burst());
            assert!(session.process());
        }
        for _ in 0..NEAR_COUNT {
            load(&mut session, &still_burst());
            assert!(session.process());
        }
        assert_eq!(session.state(), GestureState::Near);

        load(&mut session, &drift_burst());
        assert!(session.process());
        assert_eq!(session.state(), GestureState::Near);
        assert_eq!(session.decode(), Motion::Near);
    }

    #[test]
    fn stale_vote_is_cancelled() {
        let mut session = session_with(&upward_swipe());
        assert!(session.process());
        assert_eq!(session.counters().ud, -1);

        for _ in 1..NEAR_COUNT {
            load(&mut session, &still_burst());
            assert!(session.process());
            assert_eq!(session.counters().ud, -1);
        }

        load(&mut session, &still_burst());
        assert!(session.process());
        assert_eq!(session.counters().ud, 0);
        assert_eq!(session.counters().lr, 0);
        assert_eq!(session.delta(), GestureDelta::default());
        assert_eq!(session.state(), GestureState::None);
        assert_eq!(session.decode(), Motion::None);
    }

    #[test]
    fn reset_returns_to_rest() {
        let mut session = session_with(&upward_swipe());
        assert!(session.process());
        session.decode();
        session.reset();

        assert!(session.batch().is_empty());
        assert_eq!(session.delta(), GestureDelta::default());
        assert_eq!(session.counters(), GestureCounters::default());
        assert_eq!(session.state(), GestureState::None);
        assert_eq!(session.motion(), Motion::None);
    }

    #[test]
    fn fifo_bytes_fill_up_to_capacity() {
        let mut batch = SampleBatch::new();
        assert_eq!(batch.extend_from_fifo(&[1, 2, 3, 4, 5, 6, 7, 8, 9]), 2);
        assert_eq!(batch.samples()[1], Sample::new(5, 6, 7, 8));

        let bytes = [7u8; 4 * FIFO_CAPACITY];
        assert_eq!(batch.extend_from_fifo(&bytes), FIFO_CAPACITY - 2);
        assert_eq!(batch.len(), FIFO_CAPACITY);
        assert_eq!(batch.remaining(), 0);
        assert!(!batch.push(Sample::default()));
    }
}
