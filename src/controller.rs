// Turn controller
//
// Per-participant protocol state machine:
//
//   AwaitingPreamble -> AwaitingFirstLine -> AwaitingOutput <-> AwaitingInput
//                                                  \-> Terminated (on quit)
//
// The controller applies its own moves to its board before emitting them, so
// it never waits for an echo. Any call made in the wrong state is a protocol
// violation.

use log::{debug, error, info};
use std::sync::Arc;

use crate::board::GameState;
use crate::config::ProtocolConfig;
use crate::error::EngineError;
use crate::match_log::{timestamp, LoggedMove, MatchLogEntry, MatchLogger};
use crate::strategy::Strategy;
use crate::topology::Topology;
use crate::transport::{LineSink, LineSource};
use crate::types::{Move, Side, NEUTRAL_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    AwaitingPreamble,
    AwaitingFirstLine,
    AwaitingOutput,
    AwaitingInput,
    Terminated,
}

/// What an input line turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// We move first
    Start,
    /// The opponent's move, already applied
    Move(Move),
    Quit,
}

#[derive(Debug)]
pub struct TurnController {
    game: GameState,
    strategy: Strategy,
    protocol: ProtocolConfig,
    state: ControllerState,
    side: Option<Side>,
    moves_made: usize,
    neutral: Vec<String>,
    history: Vec<LoggedMove>,
    match_log: MatchLogger,
}

impl TurnController {
    pub fn new(topology: Arc<Topology>, strategy: Strategy, protocol: ProtocolConfig) -> Self {
        TurnController {
            game: GameState::new(topology),
            strategy,
            protocol,
            state: ControllerState::AwaitingPreamble,
            side: None,
            moves_made: 0,
            neutral: Vec::with_capacity(NEUTRAL_COUNT),
            history: Vec::new(),
            match_log: MatchLogger::disabled(),
        }
    }

    /// Records every emitted move to `logger`
    pub fn with_match_log(mut self, logger: MatchLogger) -> Self {
        self.match_log = logger;
        self
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Our side, known once the first line has been read
    pub fn side(&self) -> Option<Side> {
        self.side
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Number of moves this controller has emitted
    pub fn moves_made(&self) -> usize {
        self.moves_made
    }

    pub fn history(&self) -> &[LoggedMove] {
        &self.history
    }

    /// Plays a whole game: preamble, first line, then output/input rounds
    /// until the quit signal. Running out of rounds without it is an error.
    pub fn run<T>(&mut self, io: &mut T) -> Result<(), EngineError>
    where
        T: LineSource + LineSink + ?Sized,
    {
        self.preamble(io)?;
        if self.read_first_line(io)? == InputEvent::Quit {
            return Ok(());
        }

        for _ in 0..self.protocol.rounds {
            self.output_line(io)?;
            if self.input_line(io)? == InputEvent::Quit {
                return Ok(());
            }
        }

        error!(
            "Still running after {} rounds without '{}'",
            self.protocol.rounds, self.protocol.quit_signal
        );
        Err(EngineError::UnexpectedEndOfExchange(format!(
            "{} rounds played without '{}'",
            self.protocol.rounds, self.protocol.quit_signal
        )))
    }

    /// Reads the neutral cells
    pub fn preamble<S>(&mut self, source: &mut S) -> Result<(), EngineError>
    where
        S: LineSource + ?Sized,
    {
        self.require(ControllerState::AwaitingPreamble, "read the preamble")?;
        debug!("Reading preamble");

        for index in 0..NEUTRAL_COUNT {
            let name = source.read_line()?;
            self.game.place_neutral(&name, index)?;
            self.neutral.push(name);
        }

        self.state = ControllerState::AwaitingFirstLine;
        Ok(())
    }

    /// Reads the start signal, or the opponent's opening move when we are
    /// the second side
    pub fn read_first_line<S>(&mut self, source: &mut S) -> Result<InputEvent, EngineError>
    where
        S: LineSource + ?Sized,
    {
        self.require(ControllerState::AwaitingFirstLine, "read the first line")?;

        let line = source.read_line()?;
        if line == self.protocol.quit_signal {
            return Ok(self.terminate());
        }

        if line == self.protocol.start_signal {
            info!("Playing as first");
            self.side = Some(Side::First);
            self.state = ControllerState::AwaitingOutput;
            return Ok(InputEvent::Start);
        }

        info!("Playing as second");
        self.side = Some(Side::Second);
        let mv = self.receive(&line)?;
        self.state = ControllerState::AwaitingOutput;
        Ok(InputEvent::Move(mv))
    }

    /// Reads and applies the opponent's move, or the quit signal
    pub fn input_line<S>(&mut self, source: &mut S) -> Result<InputEvent, EngineError>
    where
        S: LineSource + ?Sized,
    {
        match self.state {
            ControllerState::AwaitingFirstLine => self.read_first_line(source),
            ControllerState::AwaitingInput => {
                let line = source.read_line()?;
                if line == self.protocol.quit_signal {
                    return Ok(self.terminate());
                }

                let mv = self.receive(&line)?;
                self.state = ControllerState::AwaitingOutput;
                Ok(InputEvent::Move(mv))
            }
            other => Err(EngineError::ProtocolViolation(format!(
                "input requested while {:?}",
                other
            ))),
        }
    }

    /// Computes our move, applies it locally and writes it out
    pub fn output_line<W>(&mut self, sink: &mut W) -> Result<Move, EngineError>
    where
        W: LineSink + ?Sized,
    {
        self.require(ControllerState::AwaitingOutput, "write a move")?;
        let side = self.side.ok_or_else(|| {
            EngineError::ProtocolViolation("output requested before sides are known".to_string())
        })?;

        let mv = self.strategy.decide(&mut self.game, side, self.moves_made)?;
        self.game.apply(side, mv)?;
        let text = mv.to_text(self.game.topology());

        debug!(
            "Move {} ({}): {}",
            self.moves_made,
            self.strategy.resolve(self.moves_made).label(),
            text
        );
        if self.match_log.is_enabled() {
            self.match_log.log_move(&MatchLogEntry {
                move_index: self.moves_made,
                side,
                chosen_move: text.clone(),
                strategy: self.strategy.label().to_string(),
                neutral: self.neutral.clone(),
                history: self.history.clone(),
                timestamp: timestamp(),
            });
        }

        sink.write_line(&text)?;
        self.history.push(LoggedMove { side, text });
        self.moves_made += 1;
        self.state = ControllerState::AwaitingInput;
        Ok(mv)
    }

    fn receive(&mut self, line: &str) -> Result<Move, EngineError> {
        let side = self
            .side
            .ok_or_else(|| EngineError::ProtocolViolation("move before sides are known".to_string()))?;
        let opponent = side.opponent();

        let mv = Move::parse(line, self.game.topology())?;
        self.game.apply(opponent, mv)?;
        debug!("Opponent played {}", line);

        self.history.push(LoggedMove {
            side: opponent,
            text: mv.to_text(self.game.topology()),
        });
        Ok(mv)
    }

    fn terminate(&mut self) -> InputEvent {
        info!("Quit received after {} moves", self.moves_made);
        self.state = ControllerState::Terminated;
        InputEvent::Quit
    }

    fn require(&self, expected: ControllerState, action: &str) -> Result<(), EngineError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(EngineError::ProtocolViolation(format!(
                "cannot {} while {:?}",
                action, self.state
            )))
        }
    }
}
