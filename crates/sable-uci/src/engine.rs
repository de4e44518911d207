//! Event-driven UCI engine loop.
//!
//! The main thread owns the engine state and processes commands; each
//! search runs on a worker thread that takes the searcher with it and
//! hands it back when done, so `stop` stays responsive mid-search.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};

use tracing::{debug, info, warn};

use sable_core::Board;
use sable_engine::{MAX_DEPTH, SearchControl, SearchResult, Searcher, control_from_go};

use crate::command::{Command, GoParams, parse_command};
use crate::error::UciError;

/// Events handled by the main loop.
enum EngineEvent {
    UciCommand(Result<Command, UciError>),
    SearchDone(SearchDone),
    InputClosed,
}

/// Handed back by the search thread when it finishes.
struct SearchDone {
    result: SearchResult,
    searcher: Searcher,
}

/// The UCI engine: current position, searcher, and search state.
pub struct UciEngine {
    board: Board,
    /// `None` while a search thread owns the searcher.
    searcher: Option<Searcher>,
    searching: bool,
    stop_flag: Arc<AtomicBool>,
    /// `ucinewgame` received mid-search; clear the table when it returns.
    pending_clear_tt: bool,
}

impl UciEngine {
    /// Create an engine at the starting position.
    pub fn new() -> UciEngine {
        UciEngine {
            board: Board::starting_position(),
            searcher: Some(Searcher::new()),
            searching: false,
            stop_flag: Arc::new(AtomicBool::new(false)),
            pending_clear_tt: false,
        }
    }

    /// Run the event loop until `quit` or stdin closes.
    pub fn run(mut self) -> Result<(), UciError> {
        let (tx, rx) = mpsc::channel::<EngineEvent>();

        let stdin_tx = tx.clone();
        std::thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        debug!(cmd = %trimmed, "received UCI command");
                        if stdin_tx
                            .send(EngineEvent::UciCommand(parse_command(trimmed)))
                            .is_err()
                        {
                            return;
                        }
                    }
                    Err(_) => break,
                }
            }
            let _ = stdin_tx.send(EngineEvent::InputClosed);
        });

        for event in &rx {
            match event {
                EngineEvent::UciCommand(Ok(cmd)) => match cmd {
                    Command::Uci => self.handle_uci(),
                    Command::IsReady => println!("readyok"),
                    Command::UciNewGame => self.handle_ucinewgame(),
                    Command::Position(board) => self.board = board,
                    Command::Go(params) => self.handle_go(params, &tx),
                    Command::SetOption { name, value } => self.handle_setoption(&name, value),
                    Command::Stop => self.handle_stop(),
                    Command::Quit => {
                        if self.searching {
                            self.handle_stop();
                            for ev in &rx {
                                if let EngineEvent::SearchDone(done) = ev {
                                    self.finish_search(done);
                                    break;
                                }
                            }
                        }
                        break;
                    }
                    Command::Unknown(_) => {}
                },
                EngineEvent::UciCommand(Err(e)) => {
                    warn!(error = %e, "UCI parse error");
                }
                EngineEvent::SearchDone(done) => self.finish_search(done),
                EngineEvent::InputClosed => break,
            }
        }

        info!("sable shutting down");
        Ok(())
    }

    fn handle_uci(&self) {
        println!("id name sable");
        println!("id author sable developers");
        println!("option name Hash type spin default 32 min 1 max 1024");
        println!("uciok");
    }

    fn handle_ucinewgame(&mut self) {
        self.board = Board::starting_position();
        if let Some(ref mut searcher) = self.searcher {
            searcher.clear_tt();
        } else {
            self.pending_clear_tt = true;
        }
    }

    fn handle_setoption(&mut self, name: &str, value: Option<String>) {
        if !name.eq_ignore_ascii_case("Hash") {
            warn!(name, "ignoring unknown option");
            return;
        }
        let Some(mb) = value.and_then(|v| v.parse::<usize>().ok()) else {
            warn!("Hash option requires a numeric value");
            return;
        };
        match self.searcher {
            Some(ref mut searcher) => searcher.resize_tt(mb.clamp(1, 1024)),
            None => warn!("cannot resize Hash during a search"),
        }
    }

    fn handle_go(&mut self, params: GoParams, tx: &mpsc::Sender<EngineEvent>) {
        if self.searching {
            warn!("go received while already searching, ignoring");
            return;
        }
        let Some(mut searcher) = self.searcher.take() else {
            warn!("searcher unavailable, ignoring go");
            return;
        };

        self.stop_flag = Arc::new(AtomicBool::new(false));
        let control = Arc::new(control_from_go(
            params.wtime,
            params.btime,
            params.winc,
            params.binc,
            params.movestogo,
            params.movetime,
            params.infinite,
            self.board.side_to_move(),
            Arc::clone(&self.stop_flag),
        ));
        let max_depth = params.depth.unwrap_or(MAX_DEPTH);

        let mut board = self.board.clone();
        let search_control: Arc<SearchControl> = Arc::clone(&control);
        let tx = tx.clone();

        std::thread::spawn(move || {
            let result = searcher.search(&mut board, max_depth, &search_control, |depth, score, nodes, mv| {
                let elapsed_ms = search_control.elapsed().as_millis().max(1);
                let nps = nodes as u128 * 1000 / elapsed_ms;
                println!(
                    "info depth {depth} score cp {score} nodes {nodes} nps {nps} time {elapsed_ms} pv {mv}"
                );
            });
            let _ = tx.send(EngineEvent::SearchDone(SearchDone { result, searcher }));
        });

        self.searching = true;
    }

    fn handle_stop(&mut self) {
        self.stop_flag.store(true, Ordering::Release);
    }

    fn finish_search(&mut self, done: SearchDone) {
        let mut searcher = done.searcher;
        if self.pending_clear_tt {
            searcher.clear_tt();
            self.pending_clear_tt = false;
        }
        self.searcher = Some(searcher);
        self.searching = false;

        match done.result.best_move {
            Some(mv) => println!("bestmove {}", mv.to_uci()),
            // No legal move: checkmate or stalemate on the board.
            None => println!("bestmove 0000"),
        }
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}
