//! UCI command parsing.

use std::time::Duration;

use sable_core::{Board, Move};

use crate::error::UciError;

/// Parameters of the `go` command. All optional; a bare `go` searches
/// without limits.
#[derive(Debug, Clone, Default)]
pub struct GoParams {
    /// White's remaining time.
    pub wtime: Option<Duration>,
    /// Black's remaining time.
    pub btime: Option<Duration>,
    /// White's increment per move.
    pub winc: Option<Duration>,
    /// Black's increment per move.
    pub binc: Option<Duration>,
    /// Moves to the next time control.
    pub movestogo: Option<u32>,
    /// Fixed search depth.
    pub depth: Option<i32>,
    /// Fixed search time.
    pub movetime: Option<Duration>,
    /// Search until `stop`.
    pub infinite: bool,
}

/// One parsed line of UCI input.
#[derive(Debug)]
pub enum Command {
    /// `uci` — identify the engine.
    Uci,
    /// `isready` — synchronization ping.
    IsReady,
    /// `ucinewgame` — reset game state.
    UciNewGame,
    /// `position` — set up a position, with optional moves applied.
    Position(Board),
    /// `go` — start a search.
    Go(GoParams),
    /// `setoption name <name> [value <value>]`.
    SetOption {
        /// Option name.
        name: String,
        /// Option value, if given.
        value: Option<String>,
    },
    /// `stop` — halt the running search.
    Stop,
    /// `quit` — exit.
    Quit,
    /// Anything unrecognized; ignored per the UCI convention.
    Unknown(String),
}

/// Parse one line of input.
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(&first) = tokens.first() else {
        return Ok(Command::Unknown(String::new()));
    };

    match first {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "position" => parse_position(&tokens[1..]),
        "go" => parse_go(&tokens[1..]),
        "setoption" => Ok(parse_setoption(&tokens[1..])),
        _ => Ok(Command::Unknown(first.to_string())),
    }
}

/// `position startpos [moves ...]` or `position fen <6 fields> [moves ...]`.
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    let (mut board, rest) = match tokens.first() {
        Some(&"startpos") => (Board::starting_position(), &tokens[1..]),
        Some(&"fen") => {
            if tokens.len() < 7 {
                return Err(UciError::InvalidFen {
                    fen: tokens[1..].join(" "),
                });
            }
            let fen = tokens[1..7].join(" ");
            let board: Board = fen
                .parse()
                .map_err(|_| UciError::InvalidFen { fen: fen.clone() })?;
            (board, &tokens[7..])
        }
        _ => return Err(UciError::MalformedPosition),
    };

    if let Some(&"moves") = rest.first() {
        for uci_str in &rest[1..] {
            let mv = Move::from_uci(uci_str, &board).ok_or_else(|| UciError::InvalidMove {
                uci_move: uci_str.to_string(),
            })?;
            board.make_move(mv);
        }
    }

    Ok(Command::Position(board))
}

fn parse_go(tokens: &[&str]) -> Result<Command, UciError> {
    let mut params = GoParams::default();

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            "wtime" => {
                params.wtime = Some(parse_millis(tokens.get(i + 1), "wtime")?);
                i += 2;
            }
            "btime" => {
                params.btime = Some(parse_millis(tokens.get(i + 1), "btime")?);
                i += 2;
            }
            "winc" => {
                params.winc = Some(parse_millis(tokens.get(i + 1), "winc")?);
                i += 2;
            }
            "binc" => {
                params.binc = Some(parse_millis(tokens.get(i + 1), "binc")?);
                i += 2;
            }
            "movestogo" => {
                params.movestogo = Some(parse_int(tokens.get(i + 1), "movestogo")?);
                i += 2;
            }
            "depth" => {
                params.depth = Some(parse_int(tokens.get(i + 1), "depth")? as i32);
                i += 2;
            }
            "movetime" => {
                params.movetime = Some(parse_millis(tokens.get(i + 1), "movetime")?);
                i += 2;
            }
            "infinite" => {
                params.infinite = true;
                i += 1;
            }
            // Unknown go parameters are skipped.
            _ => i += 1,
        }
    }

    Ok(Command::Go(params))
}

fn parse_setoption(tokens: &[&str]) -> Command {
    let name_pos = tokens.iter().position(|&t| t == "name");
    let value_pos = tokens.iter().position(|&t| t == "value");

    let name = match (name_pos, value_pos) {
        (Some(n), Some(v)) if v > n => tokens[n + 1..v].join(" "),
        (Some(n), _) => tokens[n + 1..].join(" "),
        _ => String::new(),
    };
    let value = value_pos
        .map(|v| tokens[v + 1..].join(" "))
        .filter(|s| !s.is_empty());

    Command::SetOption { name, value }
}

fn parse_millis(token: Option<&&str>, param: &str) -> Result<Duration, UciError> {
    let raw = token.ok_or_else(|| UciError::MissingGoValue {
        param: param.to_string(),
    })?;
    // Some GUIs send negative clocks when a side has flagged.
    let ms: i64 = raw.parse().map_err(|_| UciError::InvalidGoValue {
        param: param.to_string(),
        value: raw.to_string(),
    })?;
    Ok(Duration::from_millis(ms.max(0) as u64))
}

fn parse_int(token: Option<&&str>, param: &str) -> Result<u32, UciError> {
    let raw = token.ok_or_else(|| UciError::MissingGoValue {
        param: param.to_string(),
    })?;
    raw.parse().map_err(|_| UciError::InvalidGoValue {
        param: param.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_core::{Color, Square};

    #[test]
    fn parses_simple_commands() {
        assert!(matches!(parse_command("uci").unwrap(), Command::Uci));
        assert!(matches!(parse_command("isready").unwrap(), Command::IsReady));
        assert!(matches!(parse_command("stop").unwrap(), Command::Stop));
        assert!(matches!(parse_command("quit").unwrap(), Command::Quit));
        assert!(matches!(
            parse_command("ucinewgame").unwrap(),
            Command::UciNewGame
        ));
        assert!(matches!(
            parse_command("xyzzy").unwrap(),
            Command::Unknown(_)
        ));
    }

    #[test]
    fn position_startpos_with_moves() {
        let cmd = parse_command("position startpos moves e2e4 e7e5").unwrap();
        let Command::Position(board) = cmd else {
            panic!("expected position command");
        };
        assert_eq!(board.side_to_move(), Color::White);
        assert!(board.occupied().contains(Square::E4));
        assert!(board.occupied().contains(Square::E5));
        assert!(!board.occupied().contains(Square::E2));
    }

    #[test]
    fn position_fen() {
        let cmd =
            parse_command("position fen 7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let Command::Position(board) = cmd else {
            panic!("expected position command");
        };
        assert_eq!(board.side_to_move(), Color::Black);
    }

    #[test]
    fn position_rejects_bad_moves() {
        assert!(parse_command("position startpos moves zzzz").is_err());
        assert!(parse_command("position nonsense").is_err());
        assert!(parse_command("position fen garbage").is_err());
    }

    #[test]
    fn go_with_clock() {
        let cmd = parse_command("go wtime 300000 btime 290000 winc 2000 binc 2000 movestogo 38")
            .unwrap();
        let Command::Go(params) = cmd else {
            panic!("expected go command");
        };
        assert_eq!(params.wtime, Some(Duration::from_millis(300_000)));
        assert_eq!(params.btime, Some(Duration::from_millis(290_000)));
        assert_eq!(params.winc, Some(Duration::from_millis(2_000)));
        assert_eq!(params.movestogo, Some(38));
        assert!(!params.infinite);
    }

    #[test]
    fn go_depth_and_infinite() {
        let Command::Go(params) = parse_command("go depth 6").unwrap() else {
            panic!();
        };
        assert_eq!(params.depth, Some(6));

        let Command::Go(params) = parse_command("go infinite").unwrap() else {
            panic!();
        };
        assert!(params.infinite);
    }

    #[test]
    fn go_negative_clock_clamps_to_zero() {
        let Command::Go(params) = parse_command("go wtime -42").unwrap() else {
            panic!();
        };
        assert_eq!(params.wtime, Some(Duration::ZERO));
    }

    #[test]
    fn go_missing_value_is_an_error() {
        assert!(parse_command("go wtime").is_err());
        assert!(parse_command("go depth x").is_err());
    }

    #[test]
    fn setoption_hash() {
        let cmd = parse_command("setoption name Hash value 64").unwrap();
        let Command::SetOption { name, value } = cmd else {
            panic!("expected setoption");
        };
        assert_eq!(name, "Hash");
        assert_eq!(value.as_deref(), Some("64"));
    }
}
