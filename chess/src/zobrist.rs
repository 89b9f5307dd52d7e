use crate::types::{CastlingRights, Cell, Coord, File};

// Keys follow the Polyglot book format, so `MOVE_SIDE` is mixed in when white is to move.
include!(concat!(env!("OUT_DIR"), "/zobrist.rs"));

#[inline]
pub fn pieces(cell: Cell, coord: Coord) -> u64 {
    unsafe {
        *PIECES
            .get_unchecked(cell.index())
            .get_unchecked(coord.index())
    }
}

#[inline]
pub fn enpassant(file: File) -> u64 {
    unsafe { *ENPASSANT.get_unchecked(file.index()) }
}

/// Key for the whole set of castling rights
///
/// The table is built as a XOR of per-flag keys, so `castling(a) ^ castling(b)` is the same as
/// toggling every flag that differs between `a` and `b`.
#[inline]
pub fn castling(rights: CastlingRights) -> u64 {
    unsafe { *CASTLING.get_unchecked(rights.index()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CastlingSide, Color};

    #[test]
    fn test_castling_keys() {
        assert_eq!(castling(CastlingRights::EMPTY), 0);
        let wk = CastlingRights::EMPTY.with(Color::White, CastlingSide::King);
        let bq = CastlingRights::EMPTY.with(Color::Black, CastlingSide::Queen);
        let both = wk.with(Color::Black, CastlingSide::Queen);
        assert_eq!(castling(both), castling(wk) ^ castling(bq));
        assert_ne!(castling(wk), castling(bq));
    }

    #[test]
    fn test_empty_cell() {
        for c in Coord::iter() {
            assert_eq!(pieces(Cell::EMPTY, c), 0);
        }
    }
}
