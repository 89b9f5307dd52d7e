//! Applying moves given in various forms to a board

use super::base::{self, Move, ValidateError};
use super::uci;
use crate::board::Board;

use core::convert::Infallible;

/// Something that can be applied to a board as a move
pub trait Make {
    type Err;

    /// Applies the move to `board` in place and returns the move actually made
    ///
    /// If an error is returned, `board` is left unchanged.
    fn make_raw(&self, board: &mut Board) -> Result<Move, Self::Err>;

    /// Returns a copy of `board` with the move applied
    fn make(&self, board: &Board) -> Result<Board, Self::Err> {
        let mut copied = *board;
        self.make_raw(&mut copied)?;
        Ok(copied)
    }
}

/// Move that is known to be legal, so it's applied without any checks
///
/// Applying an illegal move this way leaves the board in an unspecified state.
pub struct Unchecked(pub Move);

impl Make for Unchecked {
    type Err = Infallible;

    #[inline]
    fn make_raw(&self, board: &mut Board) -> Result<Move, Self::Err> {
        base::make_move_unchecked(board, self.0);
        Ok(self.0)
    }
}

impl Make for Move {
    type Err = ValidateError;

    #[inline]
    fn make_raw(&self, board: &mut Board) -> Result<Move, Self::Err> {
        self.validate(board)?;
        base::make_move_unchecked(board, *self);
        Ok(*self)
    }
}

/// Move in UCI notation, checked for legality before applying
pub struct Uci<S: AsRef<str>>(pub S);

impl<S: AsRef<str>> Make for Uci<S> {
    type Err = uci::ParseError;

    #[inline]
    fn make_raw(&self, board: &mut Board) -> Result<Move, Self::Err> {
        let mv = Move::from_uci_legal(self.0.as_ref(), board)?;
        base::make_move_unchecked(board, mv);
        Ok(mv)
    }
}
