//! Exact packer: ILP formulation solved through an external MILP engine.
//!
//! The room-merging instance is encoded as a binary program and handed to
//! HiGHS through `good_lp` under a wall-clock budget. The formulation uses
//! one openness variable per room and one assignment variable per edge of a
//! pruned feasibility graph:
//!
//! - `y_j = 1` iff room `j` stays open,
//! - `x_ij = 1` iff room `i` is hosted by room `j`, created only when the
//!   pairing is a-priori permissible (self-assignment, or the cohort fits
//!   and the subjects differ).
//!
//! Constraints: each source assigned exactly once; assignments only into
//! open rooms; a room is open iff it hosts itself; destination capacity;
//! at most one cohort per subject in a destination. Two valid cuts tighten
//! the relaxation: open capacity must cover all students, and at least as
//! many rooms must stay open as the largest same-subject group.
//!
//! Branch-and-bound is entirely the engine's business; this module only
//! builds the model, decodes the incumbent, and wraps engine failures so
//! the dispatcher can fall back to the greedy packer.

use crate::assignment::Assignment;
use crate::error::{Error, Result};
use crate::instance::Instance;
use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable, WithTimeLimit,
};
use std::collections::{BTreeMap, HashMap};

/// Engine outcome as seen by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolveStatus {
    /// Proven optimal solution.
    Optimal,
    /// Feasible incumbent, optimality not proven.
    Feasible,
    /// Engine reported infeasibility. Must not occur: identity is feasible.
    Infeasible,
    /// Time limit reached without a usable incumbent.
    Timeout,
    /// Any other engine failure.
    Error,
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Optimal => write!(f, "Optimal"),
            Self::Feasible => write!(f, "Feasible"),
            Self::Infeasible => write!(f, "Infeasible"),
            Self::Timeout => write!(f, "Timeout"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// Solves the instance exactly, subject to the wall-clock budget.
///
/// Overfull rooms cannot appear in the model at all: they must stay
/// self-hosted and can host nobody, so they are pinned up front and the
/// program is built over the remaining rooms. This is also what keeps the
/// identity assignment feasible for every input, which is why an
/// `Infeasible` outcome is treated as an engine fault.
///
/// On success the decoded assignment is validated against the instance
/// invariants before being returned; any failure comes back as
/// [`Error::Solver`] so the caller can re-solve heuristically.
pub fn solve(instance: &Instance, time_limit_secs: u32, partition: &str) -> Result<Assignment> {
    let n = instance.len();
    if n <= 1 {
        return Ok(Assignment::identity(n));
    }
    if time_limit_secs == 0 {
        // No budget to hand the engine; report it the way a budget
        // exhausted mid-search would come back.
        return Err(Error::Solver {
            partition: partition.to_string(),
            status: SolveStatus::Timeout,
            message: "time limit of 0 seconds leaves no solver budget".to_string(),
        });
    }

    // Pin overfull rooms, model the rest.
    let modeled: Vec<usize> = (0..n).filter(|&i| !instance.is_overfull(i)).collect();
    let m = modeled.len();

    let mut targets: Vec<usize> = (0..n).collect();
    if m > 1 {
        let solved = solve_model(instance, &modeled, time_limit_secs).map_err(
            |(status, message)| Error::Solver {
                partition: partition.to_string(),
                status,
                message,
            },
        )?;
        for (local, &orig) in modeled.iter().enumerate() {
            targets[orig] = modeled[solved[local]];
        }
    }

    let assignment = Assignment::from_vec(targets);
    if let Err(violation) = assignment.validate(instance) {
        return Err(Error::Solver {
            partition: partition.to_string(),
            status: SolveStatus::Error,
            message: format!("decoded solution failed validation: {violation}"),
        });
    }
    Ok(assignment)
}

/// Builds and solves the binary program over the modeled (non-overfull)
/// rooms. Returns per-local-index targets, or the mapped engine failure.
fn solve_model(
    instance: &Instance,
    modeled: &[usize],
    time_limit_secs: u32,
) -> std::result::Result<Vec<usize>, (SolveStatus, String)> {
    let m = modeled.len();
    let students = |i: usize| f64::from(instance.students[modeled[i]]);
    let capacity = |j: usize| f64::from(instance.capacity[modeled[j]]);
    let subject = |i: usize| instance.subject_keys[modeled[i]].as_str();

    let mut vars = ProblemVariables::new();
    let y: Vec<Variable> = (0..m)
        .map(|j| vars.add(variable().binary().name(format!("y_{j}"))))
        .collect();

    // Pruned feasibility graph. Identity edges are always kept, so every
    // source has at least one destination.
    let mut x: HashMap<(usize, usize), Variable> = HashMap::new();
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); m];
    let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); m];
    for i in 0..m {
        for j in 0..m {
            let permissible = i == j
                || (instance.students[modeled[i]] <= instance.capacity[modeled[j]]
                    && subject(i) != subject(j));
            if permissible {
                x.insert(
                    (i, j),
                    vars.add(variable().binary().name(format!("x_{i}_{j}"))),
                );
                outgoing[i].push(j);
                incoming[j].push(i);
            }
        }
    }
    log::debug!("exact model: {} rooms, {} assignment edges", m, x.len());

    let open_rooms: Expression = y.iter().map(|&v| Expression::from(v)).sum();
    let mut model = vars
        .minimise(open_rooms.clone())
        .using(default_solver)
        .with_time_limit(f64::from(time_limit_secs));

    // Each source is assigned exactly once.
    for i in 0..m {
        let assigned: Expression = outgoing[i]
            .iter()
            .map(|&j| Expression::from(x[&(i, j)]))
            .sum();
        model = model.with(constraint!(assigned == 1.0));
    }

    // Assignments only into open rooms.
    for i in 0..m {
        for &j in &outgoing[i] {
            model = model.with(constraint!(x[&(i, j)] <= y[j]));
        }
    }

    // A room is open iff it hosts itself.
    for j in 0..m {
        model = model.with(constraint!(y[j] == x[&(j, j)]));
    }

    // Destination capacity.
    for j in 0..m {
        let seated: Expression = incoming[j]
            .iter()
            .map(|&i| students(i) * x[&(i, j)])
            .fold(Expression::from(0.0), |acc, term| acc + term);
        model = model.with(constraint!(seated <= capacity(j) * y[j]));
    }

    // At most one cohort per subject in a destination, the host included.
    // BTreeMap keeps the constraint order stable across runs.
    let mut by_subject: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for i in 0..m {
        by_subject.entry(subject(i)).or_default().push(i);
    }
    for j in 0..m {
        for sources in by_subject.values() {
            let vars_for_subject: Vec<Variable> = sources
                .iter()
                .filter_map(|&i| x.get(&(i, j)).copied())
                .collect();
            if vars_for_subject.len() > 1 {
                let sum: Expression = vars_for_subject
                    .iter()
                    .map(|&v| Expression::from(v))
                    .sum();
                model = model.with(constraint!(sum <= 1.0));
            }
        }
    }

    // Valid cuts: open capacity covers everyone, and subject multiplicity
    // bounds the objective from below.
    let total_students: f64 = (0..m).map(students).sum();
    let open_capacity: Expression = (0..m)
        .map(|j| capacity(j) * y[j])
        .fold(Expression::from(0.0), |acc, term| acc + term);
    model = model.with(constraint!(open_capacity >= total_students));

    let min_open = by_subject.values().map(Vec::len).max().unwrap_or(0) as f64;
    model = model.with(constraint!(open_rooms >= min_open));

    match model.solve() {
        Ok(solution) => {
            let mut targets = Vec::with_capacity(m);
            for i in 0..m {
                let chosen = outgoing[i]
                    .iter()
                    .copied()
                    .find(|&j| solution.value(x[&(i, j)]) > 0.5);
                match chosen {
                    Some(j) => targets.push(j),
                    None => {
                        return Err((
                            SolveStatus::Error,
                            format!("engine returned no destination for room {i}"),
                        ));
                    }
                }
            }
            Ok(targets)
        }
        Err(e) => Err(map_engine_error(e)),
    }
}

/// Wraps the engine's error type so it never leaks out of this module.
fn map_engine_error(e: ResolutionError) -> (SolveStatus, String) {
    let message = e.to_string();
    let status = match e {
        ResolutionError::Infeasible => SolveStatus::Infeasible,
        _ if message.to_lowercase().contains("time") => SolveStatus::Timeout,
        _ => SolveStatus::Error,
    };
    (status, message)
}
