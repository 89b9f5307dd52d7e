//! Utilities to work with moves in UCI format

use super::base::{self, PromotePiece, ValidateError};
use crate::board::Board;
use crate::castling;
use crate::types::{CastlingSide, Cell, Color, Coord, CoordParseError, File, Piece, Rank};

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error creating a parsed UCI representation from string
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum RawParseError {
    /// Bad string length
    #[error("bad string length")]
    BadLength,
    /// Bad source square
    #[error("bad source: {0}")]
    BadSrc(CoordParseError),
    /// Bad destination square
    #[error("bad destination: {0}")]
    BadDst(CoordParseError),
    /// Bad promote character
    #[error("bad promote char {0:?}")]
    BadPromote(char),
}

/// Error parsing UCI into a legal [`moves::Move`](super::Move)
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ParseError {
    /// Error parsing move
    #[error("cannot parse move: {0}")]
    Parse(#[from] RawParseError),
    /// Move is not legal
    #[error("invalid move: {0}")]
    Validate(#[from] ValidateError),
}

/// Parsed move in UCI format
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Move {
    /// Null UCI move
    Null,
    /// Non-null UCI move
    Move {
        /// Source square
        src: Coord,
        /// Destination square
        ///
        /// For castling, this is the final square of the king.
        dst: Coord,
        /// Piece to promote, if any
        promote: Option<PromotePiece>,
    },
}

fn castling_side(b: &Board, src: Coord, dst: Coord) -> Option<CastlingSide> {
    let c = b.side();
    if src != castling::king_src(c) || dst.rank() != src.rank() {
        return None;
    }
    match dst.file() {
        File::G => Some(CastlingSide::King),
        File::C => Some(CastlingSide::Queen),
        // Some GUIs send castling as the king capturing its own rook
        File::H if b.get(dst) == Cell::from_parts(c, Piece::Rook) => Some(CastlingSide::King),
        File::A if b.get(dst) == Cell::from_parts(c, Piece::Rook) => Some(CastlingSide::Queen),
        _ => None,
    }
}

impl Move {
    /// Converts the UCI move into [`moves::Move`](super::Move) in position `b`
    ///
    /// The resulting move is well-formed, but not necessarily legal.
    pub fn into_move(self, b: &Board) -> base::Move {
        let (src, dst, promote) = match self {
            Move::Null => return base::Move::NULL,
            Move::Move { src, dst, promote } => (src, dst, promote),
        };
        if let Some(p) = promote {
            return base::Move::promotion(src, dst, p);
        }

        let c = b.side();
        let cell = b.get(src);
        if cell == Cell::from_parts(c, Piece::Pawn)
            && src.file() != dst.file()
            && b.get(dst).is_empty()
        {
            return base::Move::enpassant(src, dst);
        }
        if cell == Cell::from_parts(c, Piece::King) {
            if let Some(side) = castling_side(b, src, dst) {
                return base::Move::from_castling(c, side);
            }
        }

        base::Move::normal(src, dst)
    }
}

impl From<base::Move> for Move {
    #[inline]
    fn from(mv: base::Move) -> Move {
        if mv.is_null() || mv.is_none() {
            return Move::Null;
        }
        let dst = match mv.castling_side() {
            Some(side) => {
                let color = match mv.src().rank() {
                    Rank::R1 => Color::White,
                    _ => Color::Black,
                };
                castling::king_dst(color, side)
            }
            None => mv.dst(),
        };
        Move::Move {
            src: mv.src(),
            dst,
            promote: mv.promote(),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match *self {
            Move::Null => write!(f, "0000"),
            Move::Move { src, dst, promote } => {
                write!(f, "{}{}", src, dst)?;
                match promote {
                    Some(PromotePiece::Knight) => write!(f, "n")?,
                    Some(PromotePiece::Bishop) => write!(f, "b")?,
                    Some(PromotePiece::Rook) => write!(f, "r")?,
                    Some(PromotePiece::Queen) => write!(f, "q")?,
                    None => {}
                };
                Ok(())
            }
        }
    }
}

impl FromStr for Move {
    type Err = RawParseError;

    fn from_str(s: &str) -> Result<Move, Self::Err> {
        if s == "0000" {
            return Ok(Move::Null);
        }
        if !matches!(s.len(), 4 | 5) || !s.is_ascii() {
            return Err(RawParseError::BadLength);
        }
        let src = Coord::from_str(&s[0..2]).map_err(RawParseError::BadSrc)?;
        let dst = Coord::from_str(&s[2..4]).map_err(RawParseError::BadDst)?;
        let promote = if s.len() == 5 {
            Some(match s.as_bytes()[4] {
                b'n' => PromotePiece::Knight,
                b'b' => PromotePiece::Bishop,
                b'r' => PromotePiece::Rook,
                b'q' => PromotePiece::Queen,
                b => return Err(RawParseError::BadPromote(b as char)),
            })
        } else {
            None
        };
        Ok(Move::Move { src, dst, promote })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::moves::MoveKind;
    use crate::types::{Coord, File, Rank};

    #[test]
    fn test_simple() {
        assert_eq!(Move::from_str("0000").unwrap(), Move::Null);
        assert_eq!(
            Move::from_str("0000")
                .unwrap()
                .into_move(&Board::initial()),
            base::Move::NULL
        );
        assert_eq!(base::Move::NULL.uci().to_string(), "0000");
        assert_eq!(base::Move::NONE.uci().to_string(), "0000");

        let e2 = Coord::from_parts(File::E, Rank::R2);
        let e4 = Coord::from_parts(File::E, Rank::R4);
        assert_eq!(
            Move::from_str("e2e4").unwrap(),
            Move::Move {
                src: e2,
                dst: e4,
                promote: None
            }
        );
        assert_eq!(
            Move::from_str("e2e4")
                .unwrap()
                .into_move(&Board::initial()),
            base::Move::normal(e2, e4),
        );
        assert_eq!(base::Move::normal(e2, e4).to_string(), "e2e4");
    }

    #[test]
    fn test_errors() {
        assert_eq!(Move::from_str("e2e"), Err(RawParseError::BadLength));
        assert_eq!(Move::from_str("e2e4qq"), Err(RawParseError::BadLength));
        assert!(matches!(Move::from_str("z2e4"), Err(RawParseError::BadSrc(_))));
        assert!(matches!(Move::from_str("e2e9"), Err(RawParseError::BadDst(_))));
        assert_eq!(Move::from_str("e7e8k"), Err(RawParseError::BadPromote('k')));
    }

    #[test]
    fn test_castling() {
        let b = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1").unwrap();
        for (s, side) in [
            ("e8g8", CastlingSide::King),
            ("e8h8", CastlingSide::King),
            ("e8c8", CastlingSide::Queen),
            ("e8a8", CastlingSide::Queen),
        ] {
            let mv = base::Move::from_uci(s, &b).unwrap();
            assert_eq!(mv.kind(), MoveKind::Castling);
            assert_eq!(mv, base::Move::from_castling(Color::Black, side));
            assert!(mv.is_legal(&b));
        }
        assert_eq!(
            base::Move::from_castling(Color::Black, CastlingSide::King).to_string(),
            "e8g8"
        );
        assert_eq!(
            base::Move::from_castling(Color::White, CastlingSide::Queen).to_string(),
            "e1c1"
        );
        assert_eq!(
            base::Move::from_uci("e8f8", &b).unwrap().kind(),
            MoveKind::Normal
        );
    }

    #[test]
    fn test_special() {
        let b = Board::from_fen("4k3/1P6/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let mv = base::Move::from_uci("e5d6", &b).unwrap();
        assert_eq!(mv.kind(), MoveKind::Enpassant);
        assert_eq!(mv.to_string(), "e5d6");
        assert!(mv.is_legal(&b));

        let mv = base::Move::from_uci("b7b8n", &b).unwrap();
        assert_eq!(mv.kind(), MoveKind::Promotion);
        assert_eq!(mv.promote(), Some(PromotePiece::Knight));
        assert_eq!(mv.to_string(), "b7b8n");
        assert!(mv.is_legal(&b));

        assert_eq!(
            base::Move::from_uci_legal("b7b8", &b),
            Err(ParseError::Validate(ValidateError::NotLegal))
        );
    }
}
