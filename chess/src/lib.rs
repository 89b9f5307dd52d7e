//! Bitboard chess position with legal move generation
//!
//! The main types are [`Board`], which holds a single validated position, and [`Position`],
//! which also remembers the previous boards to undo moves and detect repetitions.
//!
//! ```
//! use ferrochess::{GenType, Position};
//!
//! let mut pos = Position::initial();
//! pos.push_uci_list("e2e4 e7e5 g1f3").unwrap();
//! assert_eq!(pos.legals(GenType::All).len(), 29);
//! pos.undo_move();
//! assert_eq!(pos.fen(), "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2");
//! ```

pub mod attack;
pub mod between;
pub mod board;
pub mod encoding;
pub mod movegen;
pub mod moves;
pub mod position;
pub mod types;

mod castling;
mod generic;
mod pawns;
mod zobrist;

pub use ferrochess_base::{bitboard, bitboard_consts, geometry};

pub use bitboard::Bitboard;
pub use board::{Board, RawBoard};
pub use movegen::{GenType, MoveList, MovePush};
pub use moves::{Make, Move, MoveKind, PromotePiece};
pub use position::Position;
pub use types::{
    CastlingRights, CastlingSide, Cell, Color, Coord, DrawReason, File, Outcome, Piece, Rank,
    WinReason,
};
