// Maximum flow between a source and a sink over capacitated directed arcs.

use std::collections::{BTreeMap, BTreeSet};

use super::{check_non_negative, duplicates, BuiltModel, ProblemError, TOLERANCE};
use crate::domain::{Constraint, ObjectiveFunction, OptimizationProblem, Solution, Variable};

/// Decision-variable key: (from, to)
pub type ArcKey = (String, String);

#[derive(Debug, Clone, PartialEq)]
pub struct FlowArc {
    pub from: String,
    pub to: String,
    pub capacity: f64,
}

impl FlowArc {
    pub fn new(from: impl Into<String>, to: impl Into<String>, capacity: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            capacity,
        }
    }

    pub fn key(&self) -> ArcKey {
        (self.from.clone(), self.to.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaxFlowProblem {
    pub nodes: Vec<String>,
    pub arcs: Vec<FlowArc>,
    pub source: Option<String>,
    pub sink: Option<String>,
}

impl MaxFlowProblem {
    pub fn new(nodes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            nodes: nodes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_arc(mut self, from: impl Into<String>, to: impl Into<String>, capacity: f64) -> Self {
        self.arcs.push(FlowArc::new(from, to, capacity));
        self
    }

    pub fn with_terminals(mut self, source: impl Into<String>, sink: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self.sink = Some(sink.into());
        self
    }

    fn is_terminal(&self, node: &str) -> bool {
        self.source.as_deref() == Some(node) || self.sink.as_deref() == Some(node)
    }
}

pub fn validate(problem: &MaxFlowProblem) -> Vec<String> {
    let mut violations = Vec::new();

    for node in duplicates(problem.nodes.iter()) {
        violations.push(format!("Duplicate node '{}'", node));
    }
    let nodes: BTreeSet<&str> = problem.nodes.iter().map(String::as_str).collect();

    match (&problem.source, &problem.sink) {
        (None, _) | (_, None) => {
            violations.push("Both a source and a sink node must be selected".to_string());
        }
        (Some(source), Some(sink)) => {
            if source == sink {
                violations.push(format!("Source and sink must differ (both are '{}')", source));
            }
            for (role, node) in [("Source", source), ("Sink", sink)] {
                if !nodes.contains(node.as_str()) {
                    violations.push(format!("{} node '{}' does not exist", role, node));
                }
            }
        }
    }

    for arc in &problem.arcs {
        for endpoint in [&arc.from, &arc.to] {
            if !nodes.contains(endpoint.as_str()) {
                violations.push(format!(
                    "Arc {} -> {} references unknown node '{}'",
                    arc.from, arc.to, endpoint
                ));
            }
        }
        if arc.from == arc.to {
            violations.push(format!("Arc {} -> {} is a self-loop", arc.from, arc.to));
        }
        check_non_negative(
            &mut violations,
            format_args!("Capacity of arc {} -> {}", arc.from, arc.to),
            arc.capacity,
        );
    }

    for (from, to) in duplicates(problem.arcs.iter().map(FlowArc::key)) {
        violations.push(format!("Duplicate arc {} -> {}", from, to));
    }

    violations
}

pub fn build(problem: &MaxFlowProblem) -> Result<BuiltModel<ArcKey>, ProblemError> {
    ProblemError::check(validate(problem))?;
    let (Some(source), Some(sink)) = (&problem.source, &problem.sink) else {
        return Err(ProblemError::Invalid(vec![
            "Both a source and a sink node must be selected".to_string(),
        ]));
    };

    let mut built = BuiltModel::new(
        OptimizationProblem::new(ObjectiveFunction::maximize())
            .with_name("max_flow")
            .with_description(format!("{} -> {}", source, sink)),
    );

    // Net flow out of the source: arcs back into it count negatively
    let mut vars = Vec::with_capacity(problem.arcs.len());
    for arc in &problem.arcs {
        let objective = if &arc.from == source {
            1.0
        } else if &arc.to == source {
            -1.0
        } else {
            0.0
        };
        let var = built.add_variable(
            arc.key(),
            Variable::continuous(format!("f_{}_{}", arc.from, arc.to))
                .with_bounds(0.0, Some(arc.capacity)),
            objective,
        );
        vars.push(var);
    }

    for node in problem.nodes.iter().filter(|n| !problem.is_terminal(n)) {
        let mut row = Constraint::eq(0.0).with_name(format!("conservation_{}", node));
        for (arc, &var) in problem.arcs.iter().zip(&vars) {
            if &arc.to == node {
                row.add_term(var, 1.0);
            }
            if &arc.from == node {
                row.add_term(var, -1.0);
            }
        }
        built.add_constraint(row);
    }

    Ok(built)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaxFlowMetrics {
    /// Net flow leaving the source
    pub total_flow: f64,
    /// Flow per arc, every arc present
    pub arc_flows: BTreeMap<ArcKey, f64>,
    pub constraints_satisfied: BTreeMap<String, bool>,
}

pub fn derive_metrics(
    problem: &MaxFlowProblem,
    solution: &Solution<ArcKey>,
) -> Option<MaxFlowMetrics> {
    if !solution.has_solution() {
        return None;
    }

    let arc_flows: BTreeMap<ArcKey, f64> = problem
        .arcs
        .iter()
        .map(|arc| (arc.key(), solution.value(&arc.key())))
        .collect();

    let mut inflow: BTreeMap<&str, f64> = BTreeMap::new();
    let mut outflow: BTreeMap<&str, f64> = BTreeMap::new();
    let mut constraints_satisfied = BTreeMap::new();
    for arc in &problem.arcs {
        let flow = arc_flows[&arc.key()];
        *outflow.entry(arc.from.as_str()).or_default() += flow;
        *inflow.entry(arc.to.as_str()).or_default() += flow;
        constraints_satisfied.insert(
            format!("capacity_{}_{}", arc.from, arc.to),
            flow >= -TOLERANCE && flow <= arc.capacity + TOLERANCE,
        );
    }

    for node in problem.nodes.iter().filter(|n| !problem.is_terminal(n)) {
        let balance = inflow.get(node.as_str()).copied().unwrap_or(0.0)
            - outflow.get(node.as_str()).copied().unwrap_or(0.0);
        constraints_satisfied.insert(format!("conservation_{}", node), balance.abs() <= TOLERANCE);
    }

    let total_flow = problem.source.as_deref().map_or(0.0, |source| {
        outflow.get(source).copied().unwrap_or(0.0) - inflow.get(source).copied().unwrap_or(0.0)
    });

    Some(MaxFlowMetrics {
        total_flow,
        arc_flows,
        constraints_satisfied,
    })
}
