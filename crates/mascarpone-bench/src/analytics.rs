use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use mascarpone_core::TerminationReason;
use serde::Serialize;
use thiserror::Error;

use crate::config::{AgentKind, BenchmarkConfig};
use crate::tournament::{DecisionSummary, PlayedGame};

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("agent '{0}' defined in results but missing from configuration")]
    UnknownAgent(String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

pub struct AnalyticsCollector {
    agents: HashMap<String, AgentAccumulator>,
    agent_order: Vec<String>,
    reasons: BTreeMap<String, usize>,
    games: usize,
    rounds: usize,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Self {
        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(
                agent.name.clone(),
                AgentAccumulator::new(agent.name.clone(), agent.kind.clone()),
            );
            order.push(agent.name.clone());
        }

        Self {
            agents,
            agent_order: order,
            reasons: BTreeMap::new(),
            games: 0,
            rounds: 0,
        }
    }

    pub fn record_game(&mut self, game: &PlayedGame) -> Result<(), AnalyticsError> {
        self.games += 1;
        self.rounds += game.outcome.rounds.len();
        *self
            .reasons
            .entry(reason_label(game.outcome.result.reason).to_string())
            .or_insert(0) += 1;

        for seat in &game.seat_results {
            let acc = self
                .agents
                .get_mut(&seat.agent_name)
                .ok_or_else(|| AnalyticsError::UnknownAgent(seat.agent_name.clone()))?;
            acc.record_game(seat.won_game, seat.rounds_survived, &seat.metrics);
        }
        Ok(())
    }

    pub fn finalize(mut self) -> AnalyticsSummary {
        let agents = self
            .agent_order
            .iter()
            .filter_map(|name| self.agents.remove(name))
            .map(AgentAccumulator::into_report)
            .collect();
        AnalyticsSummary {
            games: self.games,
            avg_rounds_per_game: if self.games == 0 {
                0.0
            } else {
                self.rounds as f64 / self.games as f64
            },
            reasons: self.reasons,
            agents,
        }
    }
}

struct AgentAccumulator {
    name: String,
    kind: AgentKind,
    survived: Vec<f64>,
    wins: usize,
    decisions: u64,
    total_ms: f64,
}

impl AgentAccumulator {
    fn new(name: String, kind: AgentKind) -> Self {
        Self {
            name,
            kind,
            survived: Vec::new(),
            wins: 0,
            decisions: 0,
            total_ms: 0.0,
        }
    }

    fn record_game(&mut self, won: bool, rounds_survived: u32, metrics: &DecisionSummary) {
        self.survived.push(f64::from(rounds_survived));
        if won {
            self.wins += 1;
        }
        self.decisions += u64::from(metrics.decisions);
        self.total_ms += metrics.total_ms;
    }

    fn into_report(self) -> AgentReport {
        let games = self.survived.len();
        let avg_rounds_survived = if games == 0 {
            0.0
        } else {
            self.survived.iter().sum::<f64>() / games as f64
        };
        AgentReport {
            ci95: confidence_interval(&self.survived),
            name: self.name,
            kind: self.kind,
            games,
            wins: self.wins,
            avg_rounds_survived,
            average_ms_per_decision: if self.decisions == 0 {
                0.0
            } else {
                self.total_ms / self.decisions as f64
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub games: usize,
    pub avg_rounds_per_game: f64,
    pub reasons: BTreeMap<String, usize>,
    pub agents: Vec<AgentReport>,
}

impl AnalyticsSummary {
    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Tournament Summary\n\n");
        rows.push_str(&format!(
            "Games: {} (avg {:.2} rounds per game)\n\n",
            self.games, self.avg_rounds_per_game
        ));
        for (reason, count) in &self.reasons {
            rows.push_str(&format!("- {reason}: {count}\n"));
        }
        rows.push('\n');
        rows.push_str("| Agent | Kind | Games | Win % | Avg rounds survived | 95% CI | Avg ms/decision |\n");
        rows.push_str("|-------|------|-------|-------|---------------------|--------|-----------------|\n");

        for agent in &self.agents {
            let win_rate = if agent.games == 0 {
                0.0
            } else {
                agent.wins as f64 / agent.games as f64
            };
            rows.push_str(&format!(
                "| {name} | {kind:?} | {games} | {win:.1}% | {avg:.3} | [{ci_low:.3}, {ci_high:.3}] | {latency:.3} |\n",
                name = agent.name,
                kind = agent.kind,
                games = agent.games,
                win = win_rate * 100.0,
                avg = agent.avg_rounds_survived,
                ci_low = agent.ci95.0,
                ci_high = agent.ci95.1,
                latency = agent.average_ms_per_decision,
            ));
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: AgentKind,
    pub games: usize,
    pub wins: usize,
    pub avg_rounds_survived: f64,
    pub ci95: (f64, f64),
    pub average_ms_per_decision: f64,
}

pub fn reason_label(reason: TerminationReason) -> &'static str {
    match reason {
        TerminationReason::LastSurvivor => "last_survivor",
        TerminationReason::AllEliminated => "all_eliminated",
        TerminationReason::PlanExhausted => "plan_exhausted",
    }
}

fn confidence_interval(points: &[f64]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean = points.iter().sum::<f64>() / points.len() as f64;
    if points.len() == 1 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let std_error = (variance / points.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}
