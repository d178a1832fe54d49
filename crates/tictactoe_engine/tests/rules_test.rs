//! Tests for the tic-tac-toe rules engine.

use tictactoe_engine::{
    Board, BoardPosition, LINES, Outcome, Piece, PlayStatus, RulesError, Square, apply_move,
    evaluate, is_legal_move, winning_moves,
};

/// Decodes a base-3 index into a board (0 = empty, 1 = X, 2 = O).
fn board_from_index(mut index: u32) -> Board {
    let mut rows = [String::new(), String::new(), String::new()];
    for cell in 0..9 {
        let ch = match index % 3 {
            1 => 'X',
            2 => 'O',
            _ => '.',
        };
        rows[cell / 3].push(ch);
        index /= 3;
    }
    Board::from_rows([rows[0].as_str(), rows[1].as_str(), rows[2].as_str()])
}

fn line_owner(board: &Board, line: &[BoardPosition; 3]) -> Option<Piece> {
    let pieces: Vec<_> = line.iter().map(|pos| board.get(*pos).and_then(Square::piece)).collect();
    match pieces.as_slice() {
        [Some(a), Some(b), Some(c)] if a == b && b == c => Some(*a),
        _ => None,
    }
}

fn play(moves: &[(usize, usize)]) -> Board {
    moves.iter().fold(Board::new(), |board, (row, column)| {
        let piece = board.next_piece();
        apply_move(&board, BoardPosition::new(*row, *column), piece).expect("Valid move")
    })
}

#[test]
fn test_evaluate_matches_line_definition_for_every_board() {
    for index in 0..3u32.pow(9) {
        let board = board_from_index(index);
        let complete_line = LINES.iter().any(|line| line_owner(&board, line).is_some());

        match evaluate(&board) {
            Outcome::Win(win) => {
                assert!(complete_line, "Reported win without a line:\n{}", board.display());
                assert!(LINES.contains(&win.locations));
                assert_eq!(line_owner(&board, &win.locations), Some(win.piece));
            }
            Outcome::Stalemate => {
                assert!(!complete_line);
                assert!(board.is_full());
            }
            Outcome::InProgress => {
                assert!(!complete_line);
                assert!(!board.is_full());
            }
        }
    }
}

#[test]
fn test_evaluate_is_deterministic() {
    let board = Board::from_rows(["XO.", ".X.", "O.X"]);
    assert_eq!(evaluate(&board), evaluate(&board));
}

#[test]
fn test_first_line_in_scan_order_wins() {
    // X holds both the top row and the left column.
    let board = Board::from_rows(["XXX", "XOO", "XOO"]);
    match evaluate(&board) {
        Outcome::Win(win) => {
            assert_eq!(win.piece, Piece::X);
            assert_eq!(
                win.locations,
                [BoardPosition::new(0, 0), BoardPosition::new(0, 1), BoardPosition::new(0, 2)]
            );
        }
        other => panic!("Expected a win, got {:?}", other),
    }
}

#[test]
fn test_apply_move_places_piece_without_touching_input() {
    let board = Board::new();
    let next = apply_move(&board, BoardPosition::new(1, 1), Piece::X).expect("Valid move");

    assert_eq!(board, Board::new());
    assert_eq!(next.get(BoardPosition::new(1, 1)), Some(Square::Occupied(Piece::X)));
    assert_eq!(next.next_piece(), Piece::O);
}

#[test]
fn test_apply_move_rejects_occupied_square() {
    let board = play(&[(0, 0)]);
    let result = apply_move(&board, BoardPosition::new(0, 0), Piece::O);
    assert_eq!(result, Err(RulesError::Occupied(BoardPosition::new(0, 0))));
}

#[test]
fn test_apply_move_rejects_out_of_range() {
    let result = apply_move(&Board::new(), BoardPosition::new(3, 0), Piece::X);
    assert_eq!(result, Err(RulesError::OutOfRange(BoardPosition::new(3, 0))));
}

#[test]
fn test_apply_move_rejects_wrong_piece() {
    let result = apply_move(&Board::new(), BoardPosition::new(0, 0), Piece::O);
    assert_eq!(result, Err(RulesError::OutOfTurn(Piece::O)));
}

#[test]
fn test_apply_move_rejects_after_win() {
    let board = play(&[(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)]);
    let result = apply_move(&board, BoardPosition::new(2, 2), Piece::O);
    assert_eq!(result, Err(RulesError::GameOver));
}

#[test]
fn test_piece_counts_stay_balanced() {
    let moves = [(1, 1), (0, 0), (2, 2), (0, 2), (0, 1), (2, 1)];
    let mut board = Board::new();
    for (row, column) in moves {
        board = apply_move(&board, BoardPosition::new(row, column), board.next_piece())
            .expect("Valid move");
        let (x, o) = (board.count(Piece::X), board.count(Piece::O));
        assert!(x == o || x == o + 1, "Counts out of balance: X={} O={}", x, o);
    }
}

#[test]
fn test_is_legal_move() {
    let board = play(&[(1, 1)]);
    assert!(is_legal_move(&board, BoardPosition::new(0, 0)));
    assert!(!is_legal_move(&board, BoardPosition::new(1, 1)));
    assert!(!is_legal_move(&board, BoardPosition::new(0, 3)));

    let won = play(&[(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)]);
    assert!(!is_legal_move(&won, BoardPosition::new(2, 2)));
}

#[test]
fn test_stalemate_sequence() {
    // X O X / X O O / O X X
    let board = play(&[
        (0, 0),
        (0, 1),
        (0, 2),
        (1, 1),
        (1, 0),
        (1, 2),
        (2, 1),
        (2, 0),
        (2, 2),
    ]);
    assert_eq!(evaluate(&board), Outcome::Stalemate);
    assert_eq!(PlayStatus::from(&evaluate(&board)), PlayStatus::EndedInStalemate);
}

#[test]
fn test_winning_moves_finds_open_lines() {
    let board = Board::from_rows(["XX.", "OO.", "..."]);
    assert_eq!(winning_moves(&board, Piece::X), vec![BoardPosition::new(0, 2)]);
    assert_eq!(winning_moves(&board, Piece::O), vec![BoardPosition::new(1, 2)]);
}

#[test]
fn test_board_serializes_as_nested_rows() {
    let board = Board::from_rows(["X..", ".O.", "..."]);
    let json = serde_json::to_value(board).expect("Serializable");
    assert_eq!(
        json,
        serde_json::json!([["X", null, null], [null, "O", null], [null, null, null]])
    );

    let back: Board = serde_json::from_value(json).expect("Deserializable");
    assert_eq!(back, board);
}

#[test]
fn test_rules_error_is_a_leaf_error() {
    use std::error::Error;

    let errors = [
        RulesError::OutOfRange(BoardPosition::new(3, 0)),
        RulesError::Occupied(BoardPosition::new(1, 1)),
        RulesError::OutOfTurn(Piece::O),
        RulesError::GameOver,
    ];
    for error in errors {
        let boxed: Box<dyn Error> = Box::new(error);
        assert!(boxed.source().is_none());
        assert!(!boxed.to_string().is_empty());
    }
    assert_eq!(
        RulesError::Occupied(BoardPosition::new(1, 1)).to_string(),
        "Square (1, 1) is already occupied"
    );
}
