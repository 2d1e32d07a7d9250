//! Canonical player type for the project.

/// One of the two Tak players. Player 1 plays white and moves on even plies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// Player moving at the given 0-indexed ply.
    pub fn for_ply(ply: usize) -> Self {
        if ply % 2 == 0 {
            Self::One
        } else {
            Self::Two
        }
    }
}
