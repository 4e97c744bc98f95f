// Minimum-weight vertex cover with conflicts.
//
// Every wire must touch at least one selected gate, no conflicting pair may be
// selected together, and the summed cost of the selection is minimal.

use std::collections::{BTreeMap, BTreeSet};

use super::{check_non_negative, duplicates, unordered, BuiltModel, ProblemError};
use crate::domain::{Constraint, ObjectiveFunction, OptimizationProblem, Solution, Variable};

/// Decision-variable key: the gate id
pub type GateId = String;

#[derive(Debug, Clone, PartialEq)]
pub struct Gate {
    pub id: GateId,
    pub cost: f64,
}

impl Gate {
    pub fn new(id: impl Into<String>, cost: f64) -> Self {
        Self { id: id.into(), cost }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexCoverProblem {
    pub gates: Vec<Gate>,
    /// Undirected coverage relations
    pub wires: Vec<(GateId, GateId)>,
    /// Pairs that must not be selected together
    pub conflicts: Vec<(GateId, GateId)>,
}

impl VertexCoverProblem {
    pub fn new(gates: Vec<Gate>) -> Self {
        Self {
            gates,
            ..Self::default()
        }
    }

    pub fn with_wire(mut self, u: impl Into<String>, v: impl Into<String>) -> Self {
        self.wires.push((u.into(), v.into()));
        self
    }

    pub fn with_conflict(mut self, u: impl Into<String>, v: impl Into<String>) -> Self {
        self.conflicts.push((u.into(), v.into()));
        self
    }

    /// Wires with endpoints normalized and repeats removed, in sorted order
    pub fn distinct_wires(&self) -> BTreeSet<(&str, &str)> {
        normalized(&self.wires)
    }

    pub fn distinct_conflicts(&self) -> BTreeSet<(&str, &str)> {
        normalized(&self.conflicts)
    }
}

fn normalized(pairs: &[(GateId, GateId)]) -> BTreeSet<(&str, &str)> {
    pairs
        .iter()
        .map(|(u, v)| unordered(u.as_str(), v.as_str()))
        .collect()
}

pub fn validate(problem: &VertexCoverProblem) -> Vec<String> {
    let mut violations = Vec::new();

    for id in duplicates(problem.gates.iter().map(|g| &g.id)) {
        violations.push(format!("Duplicate gate '{}'", id));
    }
    for gate in &problem.gates {
        check_non_negative(&mut violations, format_args!("Cost of gate '{}'", gate.id), gate.cost);
    }

    let gates: BTreeSet<&str> = problem.gates.iter().map(|g| g.id.as_str()).collect();
    for (relation, pairs) in [("Wire", &problem.wires), ("Conflict", &problem.conflicts)] {
        for (u, v) in pairs {
            if u == v {
                violations.push(format!("{} {} - {} joins a gate to itself", relation, u, v));
            }
            for endpoint in [u, v] {
                if !gates.contains(endpoint.as_str()) {
                    violations.push(format!(
                        "{} {} - {} references unknown gate '{}'",
                        relation, u, v, endpoint
                    ));
                }
            }
        }
    }

    violations
}

pub fn build(problem: &VertexCoverProblem) -> Result<BuiltModel<GateId>, ProblemError> {
    ProblemError::check(validate(problem))?;

    let mut built = BuiltModel::new(
        OptimizationProblem::new(ObjectiveFunction::minimize())
            .with_name("vertex_cover")
            .with_description(format!(
                "{} gates, {} wires, {} conflicts",
                problem.gates.len(),
                problem.wires.len(),
                problem.conflicts.len()
            )),
    );

    let mut index = BTreeMap::new();
    for gate in &problem.gates {
        let var = built.add_variable(
            gate.id.clone(),
            Variable::binary(format!("x_{}", gate.id)),
            gate.cost,
        );
        index.insert(gate.id.as_str(), var);
    }

    for (u, v) in problem.distinct_wires() {
        built.add_constraint(
            Constraint::ge(1.0)
                .with_name(format!("cover_{}_{}", u, v))
                .with_term(index[u], 1.0)
                .with_term(index[v], 1.0),
        );
    }
    for (u, v) in problem.distinct_conflicts() {
        built.add_constraint(
            Constraint::le(1.0)
                .with_name(format!("conflict_{}_{}", u, v))
                .with_term(index[u], 1.0)
                .with_term(index[v], 1.0),
        );
    }

    Ok(built)
}

#[derive(Debug, Clone, PartialEq)]
pub struct VertexCoverMetrics {
    /// Selected gate ids, sorted
    pub selected: Vec<GateId>,
    pub total_cost: f64,
    pub constraints_satisfied: BTreeMap<String, bool>,
}

impl VertexCoverMetrics {
    pub fn all_satisfied(&self) -> bool {
        self.constraints_satisfied.values().all(|&ok| ok)
    }
}

pub fn derive_metrics(
    problem: &VertexCoverProblem,
    solution: &Solution<GateId>,
) -> Option<VertexCoverMetrics> {
    if !solution.has_solution() {
        return None;
    }

    let selected: BTreeSet<&str> = problem
        .gates
        .iter()
        .filter(|g| solution.value(&g.id) > 0.5)
        .map(|g| g.id.as_str())
        .collect();
    let total_cost = problem
        .gates
        .iter()
        .filter(|g| selected.contains(g.id.as_str()))
        .map(|g| g.cost)
        .sum();

    let mut constraints_satisfied = BTreeMap::new();
    for (u, v) in problem.distinct_wires() {
        constraints_satisfied.insert(
            format!("cover_{}_{}", u, v),
            selected.contains(u) || selected.contains(v),
        );
    }
    for (u, v) in problem.distinct_conflicts() {
        constraints_satisfied.insert(
            format!("conflict_{}_{}", u, v),
            !(selected.contains(u) && selected.contains(v)),
        );
    }

    Some(VertexCoverMetrics {
        selected: selected.into_iter().map(str::to_string).collect(),
        total_cost,
        constraints_satisfied,
    })
}
