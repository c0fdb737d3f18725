//! The rules-engine capability.
//!
//! The orchestrator never implements chess rules itself. It asks a
//! [`RulesEngine`] to validate position strings and to turn coordinate-pair
//! moves into algebraic notation. [`CozyRules`] is the production
//! implementation backed by `cozy-chess`.

use cozy_chess::{Board, Color, GameStatus, Move, Piece};
use serde::{Deserialize, Serialize};

use crate::uci::{
    convert_uci_castling_to_cozy, file_char, format_square, parse_uci_move, piece_char, rank_char,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    #[error("Invalid position: {0}")]
    InvalidPosition(String),
    #[error("Invalid move: {0}")]
    InvalidMove(String),
    #[error("Illegal move {mv} in position {position}")]
    IllegalMove { mv: String, position: String },
}

/// The side to move in a position. Evaluations are always reported from
/// [`Side::White`]'s point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

/// A move that was successfully replayed on a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub san: String,
    pub fen_after: String,
}

pub trait RulesEngine: Send + Sync {
    /// Validate a position string and return the side to move.
    fn validate(&self, fen: &str) -> Result<Side, RulesError>;

    /// Play a coordinate-pair move on `fen`, returning its SAN and the
    /// resulting position.
    fn play(&self, fen: &str, mv: &str) -> Result<PlayedMove, RulesError>;

    /// Render a single coordinate-pair move as SAN.
    fn to_algebraic(&self, fen: &str, mv: &str) -> Result<String, RulesError> {
        self.play(fen, mv).map(|played| played.san)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CozyRules;

impl RulesEngine for CozyRules {
    fn validate(&self, fen: &str) -> Result<Side, RulesError> {
        parse_board(fen).map(|board| Side::from(board.side_to_move()))
    }

    fn play(&self, fen: &str, mv: &str) -> Result<PlayedMove, RulesError> {
        let board = parse_board(fen)?;
        let parsed = parse_uci_move(mv)?;
        let mv_cozy = convert_uci_castling_to_cozy(parsed, &legal_moves(&board));

        if !board.is_legal(mv_cozy) {
            return Err(RulesError::IllegalMove {
                mv: mv.to_string(),
                position: fen.to_string(),
            });
        }

        let san = format_san(&board, mv_cozy);
        let mut after = board;
        after.play(mv_cozy);
        Ok(PlayedMove {
            san,
            fen_after: after.to_string(),
        })
    }
}

fn parse_board(fen: &str) -> Result<Board, RulesError> {
    fen.trim()
        .parse::<Board>()
        .map_err(|_| RulesError::InvalidPosition(fen.to_string()))
}

fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|piece_moves| {
        moves.extend(piece_moves);
        false
    });
    moves
}

/// Format a legal move as SAN. Castling must be in king-takes-rook form.
fn format_san(board: &Board, mv: Move) -> String {
    let us = board.side_to_move();
    let piece = board.piece_on(mv.from).unwrap_or(Piece::Pawn);

    let mut san = if piece == Piece::King && board.color_on(mv.to) == Some(us) {
        if (mv.to.file() as u8) > (mv.from.file() as u8) {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        }
    } else if piece == Piece::Pawn {
        let mut san = String::new();
        if mv.from.file() != mv.to.file() {
            san.push(file_char(mv.from.file()));
            san.push('x');
        }
        san.push_str(&format_square(mv.to));
        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(piece_char(promo));
        }
        san
    } else {
        let mut san = String::new();
        san.push(piece_char(piece));
        san.push_str(&disambiguation(board, piece, mv));
        if board.color_on(mv.to) == Some(!us) {
            san.push('x');
        }
        san.push_str(&format_square(mv.to));
        san
    };

    let mut after = board.clone();
    after.play(mv);
    if !after.checkers().is_empty() {
        san.push(if after.status() == GameStatus::Won { '#' } else { '+' });
    }
    san
}

fn disambiguation(board: &Board, piece: Piece, mv: Move) -> String {
    let mut rivals = Vec::new();
    board.generate_moves(|piece_moves| {
        if piece_moves.piece == piece && piece_moves.from != mv.from {
            rivals.extend(piece_moves.into_iter().filter(|m| m.to == mv.to).map(|m| m.from));
        }
        false
    });

    if rivals.is_empty() {
        return String::new();
    }
    if rivals.iter().all(|sq| sq.file() != mv.from.file()) {
        return file_char(mv.from.file()).to_string();
    }
    if rivals.iter().all(|sq| sq.rank() != mv.from.rank()) {
        return rank_char(mv.from.rank()).to_string();
    }
    format_square(mv.from)
}
