//! Coordinate-pair move helpers (`e2e4`, `e7e8q`).

use cozy_chess::{File, Move, Piece, Rank, Square};

use crate::RulesError;

/// Tokens engines print in place of a move when there is no legal move.
const NULL_MOVE_TOKENS: [&str; 4] = ["(none)", "0000", "none", "NULL"];

/// Returns true if `token` is a null-move sentinel such as `(none)` or `0000`.
pub fn is_null_move(token: &str) -> bool {
    NULL_MOVE_TOKENS.contains(&token)
}

/// Returns true if `token` is a well-formed coordinate-pair move.
pub fn is_coordinate_move(token: &str) -> bool {
    parse_uci_move(token).is_ok()
}

/// Parse UCI move format (e2e4, e7e8q)
pub fn parse_uci_move(s: &str) -> Result<Move, RulesError> {
    if !s.is_ascii() || !(s.len() == 4 || s.len() == 5) {
        return Err(RulesError::InvalidMove(s.to_string()));
    }

    let from = parse_square(&s[0..2]).map_err(|_| RulesError::InvalidMove(s.to_string()))?;
    let to = parse_square(&s[2..4]).map_err(|_| RulesError::InvalidMove(s.to_string()))?;

    let promotion = if s.len() == 5 {
        Some(match &s[4..5] {
            "q" => Piece::Queen,
            "r" => Piece::Rook,
            "b" => Piece::Bishop,
            "n" => Piece::Knight,
            _ => return Err(RulesError::InvalidMove(s.to_string())),
        })
    } else {
        None
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}

/// Parse a square name such as `e4`.
pub fn parse_square(s: &str) -> Result<Square, RulesError> {
    let &[file, rank] = s.as_bytes() else {
        return Err(RulesError::InvalidMove(s.to_string()));
    };

    let file = match file {
        b'a' => File::A,
        b'b' => File::B,
        b'c' => File::C,
        b'd' => File::D,
        b'e' => File::E,
        b'f' => File::F,
        b'g' => File::G,
        b'h' => File::H,
        _ => return Err(RulesError::InvalidMove(s.to_string())),
    };

    let rank = match rank {
        b'1' => Rank::First,
        b'2' => Rank::Second,
        b'3' => Rank::Third,
        b'4' => Rank::Fourth,
        b'5' => Rank::Fifth,
        b'6' => Rank::Sixth,
        b'7' => Rank::Seventh,
        b'8' => Rank::Eighth,
        _ => return Err(RulesError::InvalidMove(s.to_string())),
    };

    Ok(Square::new(file, rank))
}

/// Format a move in UCI notation (e.g., "e2e4", "e7e8q")
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push(piece_char(promo).to_ascii_lowercase());
    }
    s
}

pub fn format_square(sq: Square) -> String {
    format!("{}{}", file_char(sq.file()), rank_char(sq.rank()))
}

pub fn file_char(file: File) -> char {
    match file {
        File::A => 'a',
        File::B => 'b',
        File::C => 'c',
        File::D => 'd',
        File::E => 'e',
        File::F => 'f',
        File::G => 'g',
        File::H => 'h',
    }
}

pub fn rank_char(rank: Rank) -> char {
    match rank {
        Rank::First => '1',
        Rank::Second => '2',
        Rank::Third => '3',
        Rank::Fourth => '4',
        Rank::Fifth => '5',
        Rank::Sixth => '6',
        Rank::Seventh => '7',
        Rank::Eighth => '8',
    }
}

/// Uppercase SAN letter for a piece.
pub fn piece_char(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

/// Convert UCI castling notation to cozy_chess notation
///
/// UCI uses standard notation (king moves 2 squares): e1g1, e1c1, e8g8, e8c8
/// cozy_chess uses king-to-rook notation: e1h1, e1a1, e8h8, e8a8
///
/// Returns the converted move only when it is among `legal_moves`; any other
/// move is returned unchanged.
pub fn convert_uci_castling_to_cozy(mv: Move, legal_moves: &[Move]) -> Move {
    let is_e_file = matches!(mv.from.file(), File::E);
    if !is_e_file || mv.promotion.is_some() {
        return mv;
    }

    let target_square = match (mv.from.rank(), mv.to.rank(), mv.to.file()) {
        (Rank::First, Rank::First, File::G) => Square::new(File::H, Rank::First),
        (Rank::First, Rank::First, File::C) => Square::new(File::A, Rank::First),
        (Rank::Eighth, Rank::Eighth, File::G) => Square::new(File::H, Rank::Eighth),
        (Rank::Eighth, Rank::Eighth, File::C) => Square::new(File::A, Rank::Eighth),
        _ => return mv,
    };

    let converted = Move {
        from: mv.from,
        to: target_square,
        promotion: None,
    };

    if legal_moves.contains(&converted) {
        converted
    } else {
        mv
    }
}
