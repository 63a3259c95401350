// Library exports for the Black Hole bot
// The contest binary, the replay tool and the experiment runner all build on these

pub mod board;
pub mod config;
pub mod controller;
pub mod error;
pub mod evaluator;
pub mod match_log;
pub mod referee;
pub mod replay;
pub mod scoring;
pub mod search;
pub mod strategy;
pub mod topology;
pub mod transport;
pub mod types;
