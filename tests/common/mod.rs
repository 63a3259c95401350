// Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;

use black_hole_bot::board::GameState;
use black_hole_bot::error::EngineError;
use black_hole_bot::transport::{LineSink, LineSource};
use black_hole_bot::types::{Move, Side};

pub const NEUTRAL: [&str; 5] = ["H1", "F2", "A3", "C4", "D5"];

/// A referee that answers every move of the bot with its own move: the
/// first empty cell and the lowest value it still holds. After `replies`
/// answers it sends the quit signal instead.
pub struct ScriptedReferee {
    pub board: GameState,
    pub bot_side: Side,
    pub received: Vec<String>,
    replies: usize,
    inbox: VecDeque<String>,
}

impl ScriptedReferee {
    pub fn new(bot_side: Side, replies: usize) -> Self {
        let mut board = GameState::standard();
        let mut inbox: VecDeque<String> = VecDeque::new();
        for (index, name) in NEUTRAL.iter().enumerate() {
            board.place_neutral(name, index).unwrap();
            inbox.push_back(name.to_string());
        }

        let mut referee = ScriptedReferee {
            board,
            bot_side,
            received: Vec::new(),
            replies,
            inbox,
        };
        if bot_side == Side::First {
            referee.inbox.push_back("Start".to_string());
        } else {
            let opening = referee.reply();
            referee.inbox.push_back(opening);
        }
        referee
    }

    fn reply(&mut self) -> String {
        let side = self.bot_side.opponent();
        let cell = self.board.empty_cells().next().unwrap();
        let value = self.board.remaining(side).next().unwrap();
        self.board.place(side, value, cell).unwrap();
        Move::new(cell, value).to_text(self.board.topology())
    }
}

impl LineSource for ScriptedReferee {
    fn read_line(&mut self) -> Result<String, EngineError> {
        self.inbox.pop_front().ok_or_else(|| {
            EngineError::UnexpectedEndOfExchange("scripted referee has nothing to say".to_string())
        })
    }
}

impl LineSink for ScriptedReferee {
    fn write_line(&mut self, line: &str) -> Result<(), EngineError> {
        assert!(self.inbox.is_empty(), "bot wrote before reading everything");
        let mv = Move::parse(line, self.board.topology())?;
        self.board.apply(self.bot_side, mv)?;
        self.received.push(line.to_string());

        let answer = if self.replies > 0 {
            self.replies -= 1;
            self.reply()
        } else {
            "Quit".to_string()
        };
        self.inbox.push_back(answer);
        Ok(())
    }
}

/// Fresh path under the system temp directory
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("black_hole_{}_{}", std::process::id(), name))
}
