//! Core chess types
//!
//! Most of them are re-exported from the base crate. The outcome types live here, as only the
//! main crate is able to detect them.

pub use ferrochess_base::types::*;

/// Reason for a win
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum WinReason {
    /// The opponent is checkmated
    Checkmate,
}

/// Reason for a draw
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DrawReason {
    /// The side to move has no legal moves and is not in check
    Stalemate,
    /// Neither side can checkmate regardless of the moves made
    InsufficientMaterial,
    /// Fifty moves by each side passed without captures and pawn moves
    Moves50,
    /// The same position occurred three times
    Repeat3,
}

/// Outcome of the game
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Outcome {
    Win { side: Color, reason: WinReason },
    Draw(DrawReason),
}

impl Outcome {
    /// Returns the winning side, or `None` in case of a draw
    #[inline]
    pub fn winner(&self) -> Option<Color> {
        match *self {
            Outcome::Win { side, .. } => Some(side),
            Outcome::Draw(_) => None,
        }
    }

    /// Returns `true` if the game ended because the side to move has no legal moves
    #[inline]
    pub fn is_force(&self) -> bool {
        matches!(
            *self,
            Outcome::Win {
                reason: WinReason::Checkmate,
                ..
            } | Outcome::Draw(DrawReason::Stalemate)
        )
    }
}
