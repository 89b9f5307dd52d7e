use crate::types::{Color, Rank};

/// Compass direction, with the discriminant equal to the square index delta
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Direction {
    North = 8,
    South = -8,
    East = 1,
    West = -1,
    NorthEast = 9,
    NorthWest = 7,
    SouthEast = -7,
    SouthWest = -9,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    pub const fn delta(&self) -> isize {
        *self as i8 as isize
    }

    pub const fn inv(&self) -> Direction {
        match *self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::NorthEast => Direction::SouthWest,
            Direction::NorthWest => Direction::SouthEast,
            Direction::SouthEast => Direction::NorthWest,
            Direction::SouthWest => Direction::NorthEast,
        }
    }

    /// File component of the direction: `-1`, `0` or `1`
    pub const fn file_step(&self) -> isize {
        match *self {
            Direction::North | Direction::South => 0,
            Direction::East | Direction::NorthEast | Direction::SouthEast => 1,
            Direction::West | Direction::NorthWest | Direction::SouthWest => -1,
        }
    }

    /// Rank component of the direction: `-1`, `0` or `1`
    pub const fn rank_step(&self) -> isize {
        match *self {
            Direction::East | Direction::West => 0,
            Direction::North | Direction::NorthEast | Direction::NorthWest => 1,
            Direction::South | Direction::SouthEast | Direction::SouthWest => -1,
        }
    }
}

pub const fn castling_rank(c: Color) -> Rank {
    match c {
        Color::White => Rank::R1,
        Color::Black => Rank::R8,
    }
}

pub const fn double_move_src_rank(c: Color) -> Rank {
    match c {
        Color::White => Rank::R2,
        Color::Black => Rank::R7,
    }
}

pub const fn double_move_mid_rank(c: Color) -> Rank {
    match c {
        Color::White => Rank::R3,
        Color::Black => Rank::R6,
    }
}

pub const fn promote_dst_rank(c: Color) -> Rank {
    match c {
        Color::White => Rank::R8,
        Color::Black => Rank::R1,
    }
}

pub const fn enpassant_src_rank(c: Color) -> Rank {
    match c {
        Color::White => Rank::R5,
        Color::Black => Rank::R4,
    }
}

pub const fn enpassant_dst_rank(c: Color) -> Rank {
    match c {
        Color::White => Rank::R6,
        Color::Black => Rank::R3,
    }
}

pub const fn pawn_forward(c: Color) -> Direction {
    match c {
        Color::White => Direction::North,
        Color::Black => Direction::South,
    }
}

/// Direction of a pawn capture towards the a-file
pub const fn pawn_left(c: Color) -> Direction {
    match c {
        Color::White => Direction::NorthWest,
        Color::Black => Direction::SouthWest,
    }
}

/// Direction of a pawn capture towards the h-file
pub const fn pawn_right(c: Color) -> Direction {
    match c {
        Color::White => Direction::NorthEast,
        Color::Black => Direction::SouthEast,
    }
}

pub const fn pawn_forward_delta(c: Color) -> isize {
    pawn_forward(c).delta()
}

pub const fn pawn_left_delta(c: Color) -> isize {
    pawn_left(c).delta()
}

pub const fn pawn_right_delta(c: Color) -> isize {
    pawn_right(c).delta()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction() {
        for dir in Direction::ALL {
            assert_eq!(dir.inv().inv(), dir);
            assert_eq!(dir.inv().delta(), -dir.delta());
            assert_eq!(dir.rank_step() * 8 + dir.file_step(), dir.delta());
        }
        assert_eq!(pawn_forward_delta(Color::White), 8);
        assert_eq!(pawn_left_delta(Color::Black), -9);
        assert_eq!(pawn_right_delta(Color::Black), -7);
    }
}
