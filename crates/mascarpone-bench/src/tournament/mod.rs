mod permutations;

use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::analytics::{AnalyticsCollector, AnalyticsError, reason_label};
use mascarpone_bot::{BotDifficulty, HeuristicParticipant};
use mascarpone_core::game::events::PlayerOutcome;
use mascarpone_core::game::participant::ScriptedParticipant;
use mascarpone_core::model::player::{PlayerId, Seat};
use mascarpone_core::{
    DeclarationContext, EngineError, GameConfig, GameController, GameOutcome, GameState,
    Participant, PlayChoice, PlayContext, RoundResult,
};
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{AgentConfig, AgentKind, BenchmarkConfig, ResolvedOutputs};

use permutations::SeatPermutations;

const MAX_SEAT_PERMUTATIONS: usize = 24;

/// Primary entry point for orchestrating tournaments.
pub struct TournamentRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    agents: Vec<AgentBlueprint>,
    seat_permutations: SeatPermutations,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub games_played: usize,
    pub permutations: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
}

impl TournamentRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let agents = AgentBlueprint::from_configs(&config.agents)?;

        if config.games.permutations > MAX_SEAT_PERMUTATIONS {
            return Err(RunnerError::PermutationLimit {
                requested: config.games.permutations,
                max: MAX_SEAT_PERMUTATIONS,
            });
        }

        let seat_permutations = SeatPermutations::new(agents.len(), config.games.permutations);

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            agents,
            seat_permutations,
        })
    }

    /// Execute the tournament, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let permutations = self.seat_permutations.as_slice();
        let mut rng = StdRng::seed_from_u64(self.config.games.seed.unwrap_or(0));
        let mut rows_written = 0usize;
        let mut analytics = AnalyticsCollector::new(&self.config);

        for game_index in 0..self.config.games.count {
            let game_seed = rng.next_u64();

            for (perm_index, perm) in permutations.iter().enumerate() {
                let game = self.play_game(game_index, perm_index, game_seed, perm)?;
                analytics.record_game(&game)?;
                rows_written += write_game_rows(
                    &mut writer,
                    &self.config,
                    game_index,
                    perm_index,
                    game_seed,
                    &game,
                )?;
            }
        }

        writer.flush()?;

        let summary = analytics.finalize();
        summary.write_markdown(&self.outputs.summary_md)?;

        Ok(RunSummary {
            games_played: self.config.games.count,
            permutations: permutations.len(),
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
        })
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn game_id(game_index: usize, permutation_index: usize) -> String {
    format!("G{game_index:05}_P{permutation_index:02}")
}

fn write_game_rows(
    writer: &mut BufWriter<File>,
    config: &BenchmarkConfig,
    game_index: usize,
    permutation_index: usize,
    game_seed: u64,
    game: &PlayedGame,
) -> Result<usize, RunnerError> {
    let game_id = game_id(game_index, permutation_index);
    let mut rows_written = 0usize;

    for round in &game.outcome.rounds {
        let row = RoundLogRow {
            row: "round",
            run_id: &config.run_id,
            game_id: &game_id,
            game_index,
            permutation_index,
            game_seed,
            round_index: round.round_index,
            phase: round.phase.to_string(),
            cards_per_hand: round.cards_per_hand,
            dealer: round.dealer.as_str(),
            declared_total: round.declared_total(),
            players: &round.players,
        };
        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        rows_written += 1;
    }

    let result = &game.outcome.result;
    for seat_result in &game.seat_results {
        let row = SeatLogRow {
            row: "seat",
            run_id: &config.run_id,
            game_id: &game_id,
            game_index,
            permutation_index,
            game_seed,
            seat: seat_result.seat.index(),
            bot: &seat_result.agent_name,
            seating: &game.seating,
            won_game: seat_result.won_game,
            reason: reason_label(result.reason),
            rounds_played: result.rounds_played,
            rounds_survived: seat_result.rounds_survived,
            eliminated_in: seat_result.eliminated_in,
            decisions: seat_result.metrics.decisions,
            speed_ms_decision: seat_result.metrics.avg_ms_per_decision,
        };
        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        rows_written += 1;
    }

    Ok(rows_written)
}

impl TournamentRunner {
    fn play_game(
        &self,
        game_index: usize,
        permutation_index: usize,
        game_seed: u64,
        permutation: &[usize],
    ) -> Result<PlayedGame, RunnerError> {
        let seats = build_seat_states(permutation, &self.agents)?;
        let roster = seats
            .iter()
            .map(|seat| PlayerId::new(seat.agent_name.clone()))
            .collect();
        let config = GameConfig {
            seed: game_seed,
            first_dealer: self.config.table.first_dealer.map(Seat::new),
        };
        let state = GameState::new(roster, config)?;
        let participants = seats
            .iter()
            .map(|seat| {
                Box::new(MeteredParticipant {
                    inner: self.agents[seat.agent_index].spawn_participant(),
                    metrics: Rc::clone(&seat.metrics),
                }) as Box<dyn Participant>
            })
            .collect();

        let mut controller = GameController::new(state, participants)?;
        let outcome = controller.run()?;
        let state = controller.into_state();

        if self.logging_enabled && tracing::enabled!(Level::INFO) {
            let winner = outcome
                .result
                .winner
                .as_ref()
                .map(PlayerId::as_str)
                .unwrap_or("none");
            event!(
                target: "mascarpone_bench::game",
                Level::INFO,
                run_id = %self.config.run_id,
                game_index = game_index as u32,
                permutation_index = permutation_index as u32,
                game_seed,
                rounds = outcome.rounds.len(),
                reason = reason_label(outcome.result.reason),
                winner,
            );
        }

        let seating = seats
            .iter()
            .map(|seat| SeatSnapshot {
                seat: seat.seat.index(),
                bot: seat.agent_name.clone(),
            })
            .collect();
        let seat_results = seats
            .into_iter()
            .map(|seat| {
                let player = PlayerId::new(seat.agent_name.clone());
                let metrics = seat.metrics.borrow().finalize();
                SeatResult {
                    won_game: outcome.result.winner.as_ref() == Some(&player),
                    rounds_survived: rounds_survived(&outcome.rounds, &player),
                    eliminated_in: state
                        .seating()
                        .player(seat.seat)
                        .and_then(|p| p.eliminated_in),
                    agent_name: seat.agent_name,
                    seat: seat.seat,
                    metrics,
                }
            })
            .collect();

        Ok(PlayedGame {
            seating,
            seat_results,
            outcome,
        })
    }
}

fn rounds_survived(rounds: &[RoundResult], player: &PlayerId) -> u32 {
    rounds
        .iter()
        .flat_map(|round| round.players.iter())
        .filter(|outcome| &outcome.player == player && !outcome.eliminated)
        .count() as u32
}

fn build_seat_states(
    permutation: &[usize],
    agents: &[AgentBlueprint],
) -> Result<Vec<SeatState>, RunnerError> {
    let mut seats = Vec::with_capacity(permutation.len());
    for (seat_idx, agent_idx) in permutation.iter().enumerate() {
        let seat = Seat::from_index(seat_idx).ok_or(RunnerError::InvalidPermutation {
            index: seat_idx,
            agent_index: *agent_idx,
        })?;
        let agent = agents
            .get(*agent_idx)
            .ok_or(RunnerError::InvalidPermutation {
                index: seat_idx,
                agent_index: *agent_idx,
            })?;
        seats.push(SeatState::new(seat, *agent_idx, agent));
    }
    Ok(seats)
}

struct SeatState {
    seat: Seat,
    agent_index: usize,
    agent_name: String,
    metrics: Rc<RefCell<DecisionMetrics>>,
}

impl SeatState {
    fn new(seat: Seat, agent_index: usize, agent: &AgentBlueprint) -> Self {
        Self {
            seat,
            agent_index,
            agent_name: agent.name.clone(),
            metrics: Rc::new(RefCell::new(DecisionMetrics::default())),
        }
    }
}

/// Times every decision of the wrapped participant.
struct MeteredParticipant {
    inner: Box<dyn Participant>,
    metrics: Rc<RefCell<DecisionMetrics>>,
}

impl Participant for MeteredParticipant {
    fn request_declaration(&mut self, ctx: &DeclarationContext<'_>) -> u8 {
        let start = Instant::now();
        let value = self.inner.request_declaration(ctx);
        self.metrics.borrow_mut().record(start.elapsed());
        value
    }

    fn request_play(&mut self, ctx: &PlayContext<'_>) -> PlayChoice {
        let start = Instant::now();
        let choice = self.inner.request_play(ctx);
        self.metrics.borrow_mut().record(start.elapsed());
        choice
    }

    fn on_rejected(&mut self, error: &EngineError) {
        self.inner.on_rejected(error);
    }

    fn on_round_result(&mut self, result: &RoundResult) {
        self.inner.on_round_result(result);
    }
}

pub struct PlayedGame {
    pub seating: Vec<SeatSnapshot>,
    pub seat_results: Vec<SeatResult>,
    pub outcome: GameOutcome,
}

#[derive(Clone, Serialize)]
pub struct SeatSnapshot {
    pub seat: usize,
    pub bot: String,
}

pub struct SeatResult {
    pub agent_name: String,
    pub seat: Seat,
    pub won_game: bool,
    pub rounds_survived: u32,
    pub eliminated_in: Option<u32>,
    pub metrics: DecisionSummary,
}

#[derive(Default)]
struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) {
        self.total += duration;
        self.decisions += 1;
    }

    fn finalize(&self) -> DecisionSummary {
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        };
        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision: avg_ms,
            total_ms: self.total.as_secs_f64() * 1000.0,
        }
    }
}

#[derive(Clone)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
    pub total_ms: f64,
}

#[derive(Serialize)]
struct RoundLogRow<'a> {
    row: &'static str,
    run_id: &'a str,
    game_id: &'a str,
    game_index: usize,
    permutation_index: usize,
    game_seed: u64,
    round_index: u32,
    phase: String,
    cards_per_hand: u8,
    dealer: &'a str,
    declared_total: u32,
    players: &'a [PlayerOutcome],
}

#[derive(Serialize)]
struct SeatLogRow<'a> {
    row: &'static str,
    run_id: &'a str,
    game_id: &'a str,
    game_index: usize,
    permutation_index: usize,
    game_seed: u64,
    seat: usize,
    bot: &'a str,
    seating: &'a [SeatSnapshot],
    won_game: bool,
    reason: &'static str,
    rounds_played: u32,
    rounds_survived: u32,
    eliminated_in: Option<u32>,
    decisions: u32,
    speed_ms_decision: f64,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    Agent(#[from] AgentError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("game execution failed: {0}")]
    Engine(#[from] EngineError),
    #[error("requested {requested} seat permutations exceeds maximum of {max}")]
    PermutationLimit { requested: usize, max: usize },
    #[error("permutation index {index} references invalid agent index {agent_index}")]
    InvalidPermutation { index: usize, agent_index: usize },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid heuristic parameter for agent '{name}': {message}")]
    InvalidHeuristicParam { name: String, message: String },
}

struct AgentBlueprint {
    name: String,
    implementation: AgentImplementation,
}

enum AgentImplementation {
    Heuristic(HeuristicOptions),
    Scripted,
}

impl AgentBlueprint {
    fn from_configs(configs: &[AgentConfig]) -> Result<Vec<Self>, AgentError> {
        configs.iter().map(Self::from_config).collect()
    }

    fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        let implementation = match config.kind {
            AgentKind::Heuristic => {
                let options = HeuristicOptions::from_params(&config.name, &config.params)?;
                AgentImplementation::Heuristic(options)
            }
            AgentKind::Scripted => AgentImplementation::Scripted,
        };
        Ok(Self {
            name: config.name.clone(),
            implementation,
        })
    }

    fn spawn_participant(&self) -> Box<dyn Participant> {
        match &self.implementation {
            AgentImplementation::Heuristic(opts) => {
                Box::new(HeuristicParticipant::new(opts.difficulty))
            }
            AgentImplementation::Scripted => Box::new(ScriptedParticipant::default()),
        }
    }
}

struct HeuristicOptions {
    difficulty: BotDifficulty,
}

impl HeuristicOptions {
    fn from_params(name: &str, params: &serde_yaml::Value) -> Result<Self, AgentError> {
        if params.is_null() {
            return Ok(Self {
                difficulty: BotDifficulty::default(),
            });
        }
        let mapping = params
            .as_mapping()
            .ok_or_else(|| AgentError::InvalidHeuristicParam {
                name: name.to_string(),
                message: "expected mapping for heuristic params".to_string(),
            })?;
        let difficulty_value = mapping
            .iter()
            .find_map(|(key, value)| (key.as_str() == Some("difficulty")).then_some(value));
        let difficulty = match difficulty_value {
            Some(value) => {
                let text = value
                    .as_str()
                    .ok_or_else(|| AgentError::InvalidHeuristicParam {
                        name: name.to_string(),
                        message: "difficulty must be a string".to_string(),
                    })?;
                BotDifficulty::parse(text).ok_or_else(|| AgentError::InvalidHeuristicParam {
                    name: name.to_string(),
                    message: format!("unknown difficulty '{text}'"),
                })?
            }
            None => BotDifficulty::default(),
        };
        Ok(Self { difficulty })
    }
}
