mod heuristic;

pub use heuristic::HeuristicParticipant;
