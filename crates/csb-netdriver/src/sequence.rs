//! The operation-sequence grammar shared by the server and client event
//! loops — the only thing this crate shares with `csb-core`, and even that
//! sharing is textual, not a compiled dependency between the two crates.
//!
//! ```text
//! sequence := step ("-" step)*
//! step     := INTEGER ("r" | "w") INTEGER
//! ```
//!
//! Each step repeats an operation `n` times: a receive (`r`) or a send (`w`)
//! of `sz` bytes. A connection's cursor advances through the steps modulo
//! the sequence length, switching its readiness subscription between
//! readable and writable depending on the current step's direction.

use thiserror::Error;

/// Largest single transfer a step may name, matching the original's
/// `BUF_SIZE`/`MAX_SEND`/`MAX_RECV` fixed scratch buffer.
pub const MAX_STEP_SIZE: usize = 1024;

/// Largest number of steps a single sequence may hold, matching the
/// original's fixed `eops[128]` array.
pub const MAX_STEPS: usize = 128;

/// Which way the bytes in a step move, from the side that owns the
/// sequence string (see [`Role`] for how the far side inverts this).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `r` — receive `size` bytes.
    Read,
    /// `w` — send `size` bytes.
    Write,
}

impl Direction {
    pub const fn opposite(self) -> Self {
        match self {
            Direction::Read => Direction::Write,
            Direction::Write => Direction::Read,
        }
    }
}

/// One step of a sequence: repeat `count` times an operation of `direction`
/// moving `size` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub count: u64,
    pub direction: Direction,
    pub size: usize,
}

/// A parsed, validated operation sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    steps: Vec<Step>,
}

/// Failure parsing a sequence string. Each variant names the same failure
/// mode as a distinct `parse_ops` negative return code in the original.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// Missing or unrecognized direction character after the repeat count.
    #[error("step {step_index}: expected 'r' or 'w' after the repeat count")]
    BadDirection { step_index: usize },
    /// Missing size, or a trailing character after size that is neither
    /// end-of-string nor `-`.
    #[error("step {step_index}: expected a byte size followed by end-of-string or '-'")]
    BadSize { step_index: usize },
    /// A step's size exceeds [`MAX_STEP_SIZE`].
    #[error("step {step_index}: size {size} exceeds the {MAX_STEP_SIZE}-byte buffer")]
    SizeTooLarge { step_index: usize, size: usize },
    /// The sequence has no steps at all.
    #[error("operation sequence has no steps")]
    Empty,
    /// More steps than [`MAX_STEPS`] were supplied.
    #[error("operation sequence exceeds {MAX_STEPS} steps")]
    TooManySteps,
}

impl Sequence {
    /// Parse `"2r1024-1w32"` into two steps: 2x receive 1024 bytes, then
    /// 1x send 32 bytes.
    pub fn parse(input: &str) -> Result<Self, SequenceError> {
        let mut steps = Vec::new();
        for (step_index, raw_step) in input.split('-').enumerate() {
            if steps.len() >= MAX_STEPS {
                return Err(SequenceError::TooManySteps);
            }
            let digits_end = raw_step
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(raw_step.len());
            let count: u64 = raw_step[..digits_end]
                .parse()
                .map_err(|_| SequenceError::BadDirection { step_index })?;

            let mut rest = raw_step[digits_end..].chars();
            let direction = match rest.next() {
                Some('r') => Direction::Read,
                Some('w') => Direction::Write,
                _ => return Err(SequenceError::BadDirection { step_index }),
            };
            let size_str = rest.as_str();
            let size: usize = size_str.parse().map_err(|_| SequenceError::BadSize { step_index })?;
            if size > MAX_STEP_SIZE {
                return Err(SequenceError::SizeTooLarge { step_index, size });
            }

            steps.push(Step { count, direction, size });
        }

        if steps.is_empty() {
            return Err(SequenceError::Empty);
        }
        Ok(Sequence { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Step {
        self.steps[index % self.steps.len()]
    }
}

/// Which side of the connection a cursor belongs to, since the server's
/// direction at each step is the *inverse* of what the grammar names (the
/// sequence always describes the client's actions: the server sends when
/// the client reads, and receives when the client writes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

/// The direction *this* role actually performs for `step`, per [`Role`]'s
/// doc comment.
pub fn effective_direction(step: Step, role: Role) -> Direction {
    match role {
        Role::Client => step.direction,
        Role::Server => step.direction.opposite(),
    }
}

/// A cursor tracking progress through a [`Sequence`]: how many repeats of
/// the current step have completed, and which step index is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    step_index: usize,
    repeats_done: u64,
}

impl Cursor {
    pub fn new() -> Self {
        Cursor { step_index: 0, repeats_done: 0 }
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// Record that one repeat of the current step completed; advances to
    /// the next step (wrapping modulo the sequence length) once the current
    /// step's repeat count is exhausted.
    pub fn advance(&mut self, sequence: &Sequence) {
        self.repeats_done += 1;
        let current = sequence.step(self.step_index);
        if self.repeats_done >= current.count {
            self.repeats_done = 0;
            self.step_index = (self.step_index + 1) % sequence.len();
        }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_step() {
        let seq = Sequence::parse("2r1024").unwrap();
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.step(0), Step { count: 2, direction: Direction::Read, size: 1024 });
    }

    #[test]
    fn parses_multiple_steps() {
        let seq = Sequence::parse("2r1024-1w32").unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.step(0), Step { count: 2, direction: Direction::Read, size: 1024 });
        assert_eq!(seq.step(1), Step { count: 1, direction: Direction::Write, size: 32 });
    }

    #[test]
    fn step_indexing_wraps_modulo_length() {
        let seq = Sequence::parse("1r8-1w8").unwrap();
        assert_eq!(seq.step(2), seq.step(0));
        assert_eq!(seq.step(3), seq.step(1));
    }

    #[test]
    fn rejects_missing_direction() {
        assert_eq!(
            Sequence::parse("1024").unwrap_err(),
            SequenceError::BadDirection { step_index: 0 }
        );
    }

    #[test]
    fn rejects_missing_size() {
        assert_eq!(
            Sequence::parse("2r").unwrap_err(),
            SequenceError::BadSize { step_index: 0 }
        );
    }

    #[test]
    fn rejects_size_over_buffer() {
        assert_eq!(
            Sequence::parse("1r99999").unwrap_err(),
            SequenceError::SizeTooLarge { step_index: 0, size: 99999 }
        );
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(Sequence::parse(""), Err(SequenceError::BadDirection { .. })));
    }

    #[test]
    fn server_direction_is_inverse_of_client() {
        let step = Step { count: 1, direction: Direction::Read, size: 8 };
        assert_eq!(effective_direction(step, Role::Client), Direction::Read);
        assert_eq!(effective_direction(step, Role::Server), Direction::Write);
    }

    #[test]
    fn cursor_advances_within_step_then_wraps() {
        let seq = Sequence::parse("2r8-1w8").unwrap();
        let mut cursor = Cursor::new();
        assert_eq!(cursor.step_index(), 0);
        cursor.advance(&seq); // 1/2 repeats of step 0 done
        assert_eq!(cursor.step_index(), 0);
        cursor.advance(&seq); // 2/2 repeats of step 0 done -> step 1
        assert_eq!(cursor.step_index(), 1);
        cursor.advance(&seq); // step 1 has count 1 -> wraps to step 0
        assert_eq!(cursor.step_index(), 0);
    }
}
