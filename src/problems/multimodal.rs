// Minimum-cost multi-modal transport flow.
//
// Hubs carry a signed net demand (positive = supply, negative = demand, zero = transit)
// and an optional throughput capacity. Each transport link is a directed
// (origin, destination, mode) triple with a capacity and a unit cost, and gets one
// non-negative integer flow variable.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::{check_non_negative, duplicates, BuiltModel, ProblemError, TOLERANCE};
use crate::domain::{
    Constraint, ObjectiveFunction, OptimizationProblem, Solution, ThroughputPolicy, Variable,
};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkKey {
    pub origin: String,
    pub destination: String,
    pub mode: String,
}

impl LinkKey {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            mode: mode.into(),
        }
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.origin, self.destination, self.mode)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hub {
    pub name: String,
    pub net_demand: f64,
    pub throughput_capacity: Option<f64>,
}

impl Hub {
    pub fn new(name: impl Into<String>, net_demand: f64) -> Self {
        Self {
            name: name.into(),
            net_demand,
            throughput_capacity: None,
        }
    }

    pub fn with_throughput(mut self, capacity: f64) -> Self {
        self.throughput_capacity = Some(capacity);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportLink {
    pub origin: String,
    pub destination: String,
    pub mode: String,
    pub capacity: f64,
    pub unit_cost: f64,
}

impl TransportLink {
    pub fn key(&self) -> LinkKey {
        LinkKey::new(&self.origin, &self.destination, &self.mode)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiModalProblem {
    pub hubs: Vec<Hub>,
    pub links: Vec<TransportLink>,
}

impl MultiModalProblem {
    pub fn new(hubs: Vec<Hub>) -> Self {
        Self {
            hubs,
            links: Vec::new(),
        }
    }

    pub fn with_link(
        mut self,
        origin: impl Into<String>,
        destination: impl Into<String>,
        mode: impl Into<String>,
        capacity: f64,
        unit_cost: f64,
    ) -> Self {
        self.links.push(TransportLink {
            origin: origin.into(),
            destination: destination.into(),
            mode: mode.into(),
            capacity,
            unit_cost,
        });
        self
    }

    /// Transport modes in first-seen order
    pub fn modes(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.links
            .iter()
            .map(|l| l.mode.as_str())
            .filter(|m| seen.insert(*m))
            .collect()
    }
}

pub fn validate(problem: &MultiModalProblem) -> Vec<String> {
    let mut violations = Vec::new();

    for hub in duplicates(problem.hubs.iter().map(|h| &h.name)) {
        violations.push(format!("Duplicate hub '{}'", hub));
    }
    for hub in &problem.hubs {
        if hub.name.trim().is_empty() {
            violations.push("Hub name must not be empty".to_string());
        }
        if !hub.net_demand.is_finite() {
            violations.push(format!("Net demand of hub '{}' must be finite", hub.name));
        }
        if let Some(capacity) = hub.throughput_capacity {
            check_non_negative(
                &mut violations,
                format_args!("Throughput capacity of hub '{}'", hub.name),
                capacity,
            );
        }
    }

    let hubs: BTreeSet<&str> = problem.hubs.iter().map(|h| h.name.as_str()).collect();
    for link in &problem.links {
        let key = link.key();
        for endpoint in [&link.origin, &link.destination] {
            if !hubs.contains(endpoint.as_str()) {
                violations.push(format!("Link {} references unknown hub '{}'", key, endpoint));
            }
        }
        if link.origin == link.destination {
            violations.push(format!("Link {} is a self-loop", key));
        }
        if link.mode.trim().is_empty() {
            violations.push(format!("Link {} has no transport mode", key));
        }
        check_non_negative(&mut violations, format_args!("Capacity of link {}", key), link.capacity);
        check_non_negative(&mut violations, format_args!("Unit cost of link {}", key), link.unit_cost);
    }

    for key in duplicates(problem.links.iter().map(TransportLink::key)) {
        violations.push(format!("Duplicate link {}", key));
    }

    violations
}

pub fn build(
    problem: &MultiModalProblem,
    policy: ThroughputPolicy,
) -> Result<BuiltModel<LinkKey>, ProblemError> {
    ProblemError::check(validate(problem))?;

    let supply: f64 = problem.hubs.iter().map(|h| h.net_demand).sum();
    if supply.abs() > TOLERANCE {
        tracing::warn!(
            event = "unbalanced_network",
            net_supply = supply,
            "net demands do not sum to zero, the model will be infeasible"
        );
    }

    let mut built = BuiltModel::new(
        OptimizationProblem::new(ObjectiveFunction::minimize())
            .with_name("multimodal_transport")
            .with_description(format!(
                "{} hubs, {} links, modes: {}",
                problem.hubs.len(),
                problem.links.len(),
                problem.modes().join(", ")
            )),
    );

    let mut vars = Vec::with_capacity(problem.links.len());
    for link in &problem.links {
        let var = built.add_variable(
            link.key(),
            Variable::integer(format!("flow_{}_{}_{}", link.origin, link.destination, link.mode))
                .with_bounds(0.0, Some(link.capacity)),
            link.unit_cost,
        );
        vars.push(var);
    }

    for hub in &problem.hubs {
        let mut balance = Constraint::eq(hub.net_demand).with_name(format!("balance_{}", hub.name));
        let mut inflow = Vec::new();
        let mut outflow = Vec::new();
        for (link, &var) in problem.links.iter().zip(&vars) {
            if link.origin == hub.name {
                balance.add_term(var, 1.0);
                outflow.push((var, 1.0));
            }
            if link.destination == hub.name {
                balance.add_term(var, -1.0);
                inflow.push((var, 1.0));
            }
        }
        built.add_constraint(balance);

        if let Some(capacity) = hub.throughput_capacity {
            built.add_constraint(
                Constraint::le(capacity)
                    .with_name(format!("hub_in_{}", hub.name))
                    .with_terms(inflow),
            );
            if policy == ThroughputPolicy::InflowAndOutflow {
                built.add_constraint(
                    Constraint::le(capacity)
                        .with_name(format!("hub_out_{}", hub.name))
                        .with_terms(outflow),
                );
            }
        }
    }

    for (link, &var) in problem.links.iter().zip(&vars) {
        built.add_constraint(
            Constraint::le(link.capacity)
                .with_name(format!("cap_{}_{}_{}", link.origin, link.destination, link.mode))
                .with_term(var, 1.0),
        );
    }

    Ok(built)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiModalMetrics {
    pub total_cost: f64,
    /// Flow per link, only links carrying flow
    pub link_flows: BTreeMap<LinkKey, f64>,
    /// Flow per transport mode
    pub mode_totals: BTreeMap<String, f64>,
    pub constraints_satisfied: BTreeMap<String, bool>,
}

pub fn derive_metrics(
    problem: &MultiModalProblem,
    solution: &Solution<LinkKey>,
    policy: ThroughputPolicy,
) -> Option<MultiModalMetrics> {
    if !solution.has_solution() {
        return None;
    }

    let mut total_cost = 0.0;
    let mut link_flows = BTreeMap::new();
    let mut mode_totals: BTreeMap<String, f64> = BTreeMap::new();
    let mut inflow: BTreeMap<&str, f64> = BTreeMap::new();
    let mut outflow: BTreeMap<&str, f64> = BTreeMap::new();
    let mut constraints_satisfied = BTreeMap::new();

    for link in &problem.links {
        let key = link.key();
        let flow = solution.value(&key);
        total_cost += link.unit_cost * flow;
        *outflow.entry(link.origin.as_str()).or_default() += flow;
        *inflow.entry(link.destination.as_str()).or_default() += flow;
        *mode_totals.entry(link.mode.clone()).or_default() += flow;
        constraints_satisfied.insert(
            format!("capacity_{}_{}_{}", link.origin, link.destination, link.mode),
            flow >= -TOLERANCE && flow <= link.capacity + TOLERANCE,
        );
        if flow.abs() > TOLERANCE {
            link_flows.insert(key, flow);
        }
    }

    for hub in &problem.hubs {
        let hub_in = inflow.get(hub.name.as_str()).copied().unwrap_or(0.0);
        let hub_out = outflow.get(hub.name.as_str()).copied().unwrap_or(0.0);
        constraints_satisfied.insert(
            format!("balance_{}", hub.name),
            (hub_out - hub_in - hub.net_demand).abs() <= TOLERANCE,
        );
        if let Some(capacity) = hub.throughput_capacity {
            constraints_satisfied.insert(
                format!("throughput_in_{}", hub.name),
                hub_in <= capacity + TOLERANCE,
            );
            if policy == ThroughputPolicy::InflowAndOutflow {
                constraints_satisfied.insert(
                    format!("throughput_out_{}", hub.name),
                    hub_out <= capacity + TOLERANCE,
                );
            }
        }
    }

    Some(MultiModalMetrics {
        total_cost,
        link_flows,
        mode_totals,
        constraints_satisfied,
    })
}
