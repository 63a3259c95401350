// Local referee
//
// Plays two turn controllers against each other over in-memory queues.
// Each controller owns its own board; the referee keeps a third one that is
// authoritative for scoring, so a controller that drifts from the real game
// cannot misreport its result.

use log::{debug, info};
use rand::seq::index::sample;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::board::GameState;
use crate::config::ProtocolConfig;
use crate::controller::{ControllerState, InputEvent, TurnController};
use crate::error::EngineError;
use crate::scoring::final_score;
use crate::strategy::Strategy;
use crate::topology::Topology;
use crate::transport::QueueTransport;
use crate::types::{Move, Side, NEUTRAL_COUNT};

/// Outcome of one refereed match
#[derive(Debug, Clone)]
pub struct MatchReport {
    pub neutral: Vec<String>,
    /// Every move in play order
    pub moves: Vec<String>,
    pub first_score: i32,
    pub second_score: i32,
    /// Time spent inside each controller
    pub first_time: Duration,
    pub second_time: Duration,
}

impl MatchReport {
    /// Higher score wins; `None` on a draw
    pub fn winner(&self) -> Option<Side> {
        match self.first_score.cmp(&self.second_score) {
            std::cmp::Ordering::Greater => Some(Side::First),
            std::cmp::Ordering::Less => Some(Side::Second),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// One participant as seen by the referee
#[derive(Debug)]
struct Seat {
    controller: TurnController,
    io: QueueTransport,
    elapsed: Duration,
}

impl Seat {
    fn timed<T>(
        &mut self,
        step: impl FnOnce(&mut TurnController, &mut QueueTransport) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let start = Instant::now();
        let result = step(&mut self.controller, &mut self.io);
        self.elapsed += start.elapsed();
        result
    }
}

#[derive(Debug)]
pub struct Referee {
    board: GameState,
    first: Seat,
    second: Seat,
    neutral: Vec<String>,
    protocol: ProtocolConfig,
    moves: Vec<String>,
}

impl Referee {
    pub fn new(
        first_strategy: Strategy,
        second_strategy: Strategy,
        neutral: Vec<String>,
        protocol: ProtocolConfig,
        topology: Arc<Topology>,
    ) -> Self {
        let seat = |strategy| Seat {
            controller: TurnController::new(Arc::clone(&topology), strategy, protocol.clone()),
            io: QueueTransport::new(),
            elapsed: Duration::ZERO,
        };

        Referee {
            board: GameState::new(Arc::clone(&topology)),
            first: seat(first_strategy),
            second: seat(second_strategy),
            neutral,
            protocol,
            moves: Vec::new(),
        }
    }

    /// Plays the full match and scores the final position
    pub fn run(mut self) -> Result<MatchReport, EngineError> {
        info!(
            "Match {} vs {} with neutral cells {:?}",
            self.first.controller.strategy().label(),
            self.second.controller.strategy().label(),
            self.neutral
        );

        for (index, name) in self.neutral.iter().enumerate() {
            self.board.place_neutral(name, index)?;
            self.first.io.push_line(name.as_str());
            self.second.io.push_line(name.as_str());
        }
        self.first.timed(|c, io| c.preamble(io))?;
        self.second.timed(|c, io| c.preamble(io))?;

        self.first.io.push_line(self.protocol.start_signal.as_str());
        if self.first.timed(|c, io| c.read_first_line(io))? != InputEvent::Start {
            return Err(EngineError::ProtocolViolation(
                "first side did not accept the start signal".to_string(),
            ));
        }

        for round in 0..self.protocol.rounds {
            debug!("Round {}", round + 1);
            self.turn(Side::First)?;
            self.turn(Side::Second)?;
        }

        for side in [Side::First, Side::Second] {
            let quit = self.protocol.quit_signal.clone();
            let seat = self.seat_mut(side);
            // The opponent's last move is never delivered; quit takes its place
            seat.io.discard_line();
            relay(seat, quit)?;
            if seat.timed(|c, io| c.input_line(io))? != InputEvent::Quit
                || seat.controller.state() != ControllerState::Terminated
            {
                return Err(EngineError::ProtocolViolation(format!(
                    "{} did not terminate on quit",
                    side
                )));
            }
        }

        let first_score = final_score(&self.board, Side::First).ok_or_else(|| {
            EngineError::UnexpectedEndOfExchange("no empty cell left to score".to_string())
        })?;
        let second_score = final_score(&self.board, Side::Second).ok_or_else(|| {
            EngineError::UnexpectedEndOfExchange("no empty cell left to score".to_string())
        })?;

        info!(
            "Final score first {} ({:?}) second {} ({:?})",
            first_score, self.first.elapsed, second_score, self.second.elapsed
        );

        Ok(MatchReport {
            neutral: self.neutral,
            moves: self.moves,
            first_score,
            second_score,
            first_time: self.first.elapsed,
            second_time: self.second.elapsed,
        })
    }

    /// `side` consumes the pending move (if any), answers, and the answer is
    /// checked against the authoritative board and relayed
    fn turn(&mut self, side: Side) -> Result<(), EngineError> {
        let seat = self.seat_mut(side);
        if seat.controller.state() != ControllerState::AwaitingOutput {
            seat.timed(|c, io| c.input_line(io))?;
        }
        seat.timed(|c, io| c.output_line(io))?;
        let text = seat.io.take_output().ok_or_else(|| {
            EngineError::UnexpectedEndOfExchange(format!("{} wrote no move", side))
        })?;

        let mv = Move::parse(&text, self.board.topology())?;
        self.board.apply(side, mv)?;
        debug!("{} plays {}", side, text);

        relay(self.seat_mut(side.opponent()), text.clone())?;
        self.moves.push(text);
        Ok(())
    }

    fn seat_mut(&mut self, side: Side) -> &mut Seat {
        match side {
            Side::Second => &mut self.second,
            _ => &mut self.first,
        }
    }
}

/// Queues a line for `seat`, which must have consumed everything before it
fn relay(seat: &mut Seat, line: String) -> Result<(), EngineError> {
    if seat.io.pending_input() > 0 {
        return Err(EngineError::ProtocolViolation(format!(
            "relaying '{}' while {} line(s) are unread",
            line,
            seat.io.pending_input()
        )));
    }
    seat.io.push_line(line);
    Ok(())
}

/// Draws `NEUTRAL_COUNT` distinct cells uniformly
pub fn random_neutral_cells<R: Rng + ?Sized>(topology: &Topology, rng: &mut R) -> Vec<String> {
    sample(rng, topology.len(), NEUTRAL_COUNT)
        .into_iter()
        .map(|id| topology.name(id))
        .collect()
}
