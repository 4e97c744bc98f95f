// Metallurgical alloy blending.
//
// Chooses how many kilograms of each raw material to melt so that the blend weighs
// exactly the target weight, every specified element lands inside its percentage
// window (or on its exact target), unspecified elements stay under the impurity cap,
// and the total material cost is minimal.
//
// Problems persist as JSON with the layout
// `{ name, raw_materials: [..], alloy_spec: { .., elements: [..] }, additional_constraints }`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{check_positive, duplicates, BuiltModel, ProblemError, TOLERANCE};
use crate::domain::{Constraint, ObjectiveFunction, OptimizationProblem, Solution, Variable};

/// Composition sums may exceed 100% by this much before being rejected
const COMPOSITION_SLACK: f64 = 0.1;

/// Pure-element densities in g/cm³
const ELEMENT_DENSITIES: &[(&str, f64)] = &[
    ("Fe", 7.87), ("Ni", 8.91), ("Cr", 7.19), ("Mo", 10.28),
    ("C", 2.27), ("Mn", 7.44), ("Si", 2.33), ("Al", 2.70),
    ("Cu", 8.96), ("Ti", 4.51), ("V", 6.11), ("W", 19.25),
];

/// Pure-element melting points in °C
const ELEMENT_MELTING_POINTS: &[(&str, f64)] = &[
    ("Fe", 1538.0), ("Ni", 1455.0), ("Cr", 1907.0), ("Mo", 2623.0),
    ("C", 3550.0), ("Mn", 1246.0), ("Si", 1414.0), ("Al", 660.0),
    ("Cu", 1085.0), ("Ti", 1668.0), ("V", 1910.0), ("W", 3414.0),
];

/// Hardness estimates saturate here (HRC)
const MAX_HARDNESS_HRC: f64 = 65.0;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn default_density() -> f64 {
    7.8
}

fn default_purity() -> f64 {
    100.0
}

fn default_max_percent() -> f64 {
    100.0
}

fn default_max_impurities() -> f64 {
    2.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub min_percent: f64,
    #[serde(default = "default_max_percent")]
    pub max_percent: f64,
    #[serde(default)]
    pub target_percent: Option<f64>,
}

impl Element {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, min_percent: f64, max_percent: f64) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            min_percent,
            max_percent,
            target_percent: None,
        }
    }

    pub fn with_target(mut self, target_percent: f64) -> Self {
        self.target_percent = Some(target_percent);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMaterial {
    pub name: String,
    pub cost_per_kg: f64,
    /// Available stock in kg
    pub availability: f64,
    /// Element symbol -> percentage by weight
    pub composition: BTreeMap<String, f64>,
    /// g/cm³
    #[serde(default = "default_density")]
    pub density: f64,
    #[serde(default = "default_purity")]
    pub purity: f64,
}

impl RawMaterial {
    pub fn new(name: impl Into<String>, cost_per_kg: f64, availability: f64) -> Self {
        Self {
            name: name.into(),
            cost_per_kg,
            availability,
            composition: BTreeMap::new(),
            density: default_density(),
            purity: default_purity(),
        }
    }

    pub fn with_content(mut self, symbol: impl Into<String>, percent: f64) -> Self {
        self.composition.insert(symbol.into(), percent);
        self
    }

    /// Percentage of `symbol` in this material, zero when absent
    pub fn element_content(&self, symbol: &str) -> f64 {
        self.composition.get(symbol).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlloySpecification {
    pub name: String,
    /// kg
    pub target_weight: f64,
    pub elements: Vec<Element>,
    /// Percentage cap on elements the alloy does not name
    #[serde(default = "default_max_impurities")]
    pub max_impurities: f64,
    #[serde(default)]
    pub min_hardness: Option<f64>,
    #[serde(default)]
    pub max_hardness: Option<f64>,
    #[serde(default)]
    pub melting_point_min: Option<f64>,
    #[serde(default)]
    pub melting_point_max: Option<f64>,
}

impl AlloySpecification {
    pub fn new(name: impl Into<String>, target_weight: f64, elements: Vec<Element>) -> Self {
        Self {
            name: name.into(),
            target_weight,
            elements,
            max_impurities: default_max_impurities(),
            min_hardness: None,
            max_hardness: None,
            melting_point_min: None,
            melting_point_max: None,
        }
    }

    pub fn with_max_impurities(mut self, percent: f64) -> Self {
        self.max_impurities = percent;
        self
    }

    fn specified_symbols(&self) -> BTreeSet<&str> {
        self.elements.iter().map(|e| e.symbol.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendingProblem {
    pub name: String,
    pub raw_materials: Vec<RawMaterial>,
    pub alloy_spec: AlloySpecification,
    /// Free-form settings carried through save/load untouched
    #[serde(default)]
    pub additional_constraints: serde_json::Map<String, serde_json::Value>,
}

impl BlendingProblem {
    pub fn new(name: impl Into<String>, raw_materials: Vec<RawMaterial>, alloy_spec: AlloySpecification) -> Self {
        Self {
            name: name.into(),
            raw_materials,
            alloy_spec,
            additional_constraints: serde_json::Map::new(),
        }
    }

    /// Every element symbol named by the alloy or any composition, sorted
    pub fn all_elements(&self) -> Vec<String> {
        let mut symbols: BTreeSet<&str> = self.alloy_spec.specified_symbols();
        for material in &self.raw_materials {
            symbols.extend(material.composition.keys().map(String::as_str));
        }
        symbols.into_iter().map(str::to_string).collect()
    }

    /// Percentage of a material made of elements the alloy does not name
    fn impurity_content(&self, material: &RawMaterial) -> f64 {
        let specified = self.alloy_spec.specified_symbols();
        material
            .composition
            .iter()
            .filter(|(symbol, _)| !specified.contains(symbol.as_str()))
            .map(|(_, percent)| percent)
            .sum()
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save_to_json(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load_from_json(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

fn check_percent(violations: &mut Vec<String>, what: std::fmt::Arguments<'_>, value: f64) {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        violations.push(format!("{} must lie within [0, 100] (got {})", what, value));
    }
}

pub fn validate(problem: &BlendingProblem) -> Vec<String> {
    let mut violations = Vec::new();
    let spec = &problem.alloy_spec;

    check_positive(&mut violations, "Target weight", spec.target_weight);
    if problem.raw_materials.is_empty() {
        violations.push("At least one raw material is required".to_string());
    }
    if spec.elements.is_empty() {
        violations.push("At least one element must be specified".to_string());
    }
    check_percent(&mut violations, format_args!("Maximum impurities"), spec.max_impurities);

    for name in duplicates(problem.raw_materials.iter().map(|m| &m.name)) {
        violations.push(format!("Duplicate raw material '{}'", name));
    }
    for material in &problem.raw_materials {
        if material.name.trim().is_empty() {
            violations.push("Raw material name must not be empty".to_string());
        }
        check_positive(
            &mut violations,
            format_args!("Cost per kg of '{}'", material.name),
            material.cost_per_kg,
        );
        check_positive(
            &mut violations,
            format_args!("Availability of '{}'", material.name),
            material.availability,
        );
        for (symbol, &percent) in &material.composition {
            check_percent(
                &mut violations,
                format_args!("Content of {} in '{}'", symbol, material.name),
                percent,
            );
        }
        let total: f64 = material.composition.values().sum();
        if total > 100.0 + COMPOSITION_SLACK {
            violations.push(format!(
                "Composition of '{}' sums to {:.2}%, more than 100%",
                material.name, total
            ));
        }
    }

    for symbol in duplicates(spec.elements.iter().map(|e| &e.symbol)) {
        violations.push(format!("Element {} is specified more than once", symbol));
    }
    for element in &spec.elements {
        if element.symbol.trim().is_empty() {
            violations.push("Element symbol must not be empty".to_string());
        }
        check_percent(
            &mut violations,
            format_args!("Minimum percentage of {}", element.symbol),
            element.min_percent,
        );
        check_percent(
            &mut violations,
            format_args!("Maximum percentage of {}", element.symbol),
            element.max_percent,
        );
        if element.min_percent > element.max_percent {
            violations.push(format!(
                "Minimum percentage of {} ({}) exceeds its maximum ({})",
                element.symbol, element.min_percent, element.max_percent
            ));
        }
        if let Some(target) = element.target_percent {
            if !target.is_finite() || target < element.min_percent || target > element.max_percent {
                violations.push(format!(
                    "Target percentage of {} ({}) lies outside [{}, {}]",
                    element.symbol, target, element.min_percent, element.max_percent
                ));
            }
        }
    }

    violations
}

pub fn build(problem: &BlendingProblem) -> Result<BuiltModel<String>, ProblemError> {
    ProblemError::check(validate(problem))?;
    let spec = &problem.alloy_spec;

    let mut built = BuiltModel::new(
        OptimizationProblem::new(ObjectiveFunction::minimize())
            .with_name(format!("blending_{}", problem.name))
            .with_description(format!("{} kg of {}", spec.target_weight, spec.name)),
    );

    let vars: Vec<usize> = problem
        .raw_materials
        .iter()
        .map(|material| {
            built.add_variable(
                material.name.clone(),
                Variable::continuous(format!("x_{}", material.name))
                    .with_bounds(0.0, Some(material.availability)),
                material.cost_per_kg,
            )
        })
        .collect();

    built.add_constraint(
        Constraint::eq(spec.target_weight)
            .with_name("total_weight")
            .with_terms(vars.iter().map(|&v| (v, 1.0))),
    );

    // content_j - p/100 * total = Σ (a_ij - p) / 100 * x_i
    let share_row = |row: Constraint, contents: &dyn Fn(&RawMaterial) -> f64, percent: f64| {
        row.with_terms(
            problem
                .raw_materials
                .iter()
                .zip(&vars)
                .map(|(material, &v)| (v, (contents(material) - percent) / 100.0)),
        )
    };

    for element in &spec.elements {
        let content = |m: &RawMaterial| m.element_content(&element.symbol);
        if element.min_percent > 0.0 {
            built.add_constraint(share_row(
                Constraint::ge(0.0).with_name(format!("min_{}", element.symbol)),
                &content,
                element.min_percent,
            ));
        }
        if element.max_percent < 100.0 {
            built.add_constraint(share_row(
                Constraint::le(0.0).with_name(format!("max_{}", element.symbol)),
                &content,
                element.max_percent,
            ));
        }
        if let Some(target) = element.target_percent {
            built.add_constraint(share_row(
                Constraint::eq(0.0).with_name(format!("target_{}", element.symbol)),
                &content,
                target,
            ));
        }
    }

    if spec.max_impurities < 100.0 {
        built.add_constraint(share_row(
            Constraint::le(0.0).with_name("max_impurities"),
            &|m: &RawMaterial| problem.impurity_content(m),
            spec.max_impurities,
        ));
    }

    Ok(built)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlendingMetrics {
    /// kg per raw material, every material present
    pub quantities: BTreeMap<String, f64>,
    pub total_weight: f64,
    pub total_cost: f64,
    /// Resulting percentage of every element appearing in the problem
    pub element_percentages: BTreeMap<String, f64>,
    pub impurity_percent: f64,
    /// g/cm³, mass-weighted harmonic mean over tabulated elements
    pub estimated_density: Option<f64>,
    /// HRC, only for iron-chromium blends
    pub estimated_hardness: Option<f64>,
    /// °C, mass-weighted mean over tabulated elements
    pub estimated_melting_point: Option<f64>,
    pub constraints_satisfied: BTreeMap<String, bool>,
}

impl BlendingMetrics {
    pub fn all_satisfied(&self) -> bool {
        self.constraints_satisfied.values().all(|&ok| ok)
    }
}

pub fn derive_metrics(problem: &BlendingProblem, solution: &Solution<String>) -> Option<BlendingMetrics> {
    if !solution.has_solution() {
        return None;
    }
    let spec = &problem.alloy_spec;

    let quantities: BTreeMap<String, f64> = problem
        .raw_materials
        .iter()
        .map(|m| (m.name.clone(), solution.value(&m.name)))
        .collect();
    let total_weight: f64 = quantities.values().sum();
    let total_cost: f64 = problem
        .raw_materials
        .iter()
        .map(|m| m.cost_per_kg * quantities[&m.name])
        .sum();

    let percent_of = |weight: f64| {
        if total_weight > 0.0 {
            weight / total_weight * 100.0
        } else {
            0.0
        }
    };

    let element_percentages: BTreeMap<String, f64> = problem
        .all_elements()
        .into_iter()
        .map(|symbol| {
            let weight: f64 = problem
                .raw_materials
                .iter()
                .map(|m| m.element_content(&symbol) / 100.0 * quantities[&m.name])
                .sum();
            (symbol, percent_of(weight))
        })
        .collect();

    let impurity_percent = percent_of(
        problem
            .raw_materials
            .iter()
            .map(|m| problem.impurity_content(m) / 100.0 * quantities[&m.name])
            .sum(),
    );

    let mut constraints_satisfied = BTreeMap::new();
    constraints_satisfied.insert(
        "total_weight".to_string(),
        (total_weight - spec.target_weight).abs() <= TOLERANCE,
    );
    for element in &spec.elements {
        let actual = element_percentages.get(&element.symbol).copied().unwrap_or(0.0);
        constraints_satisfied.insert(
            format!("{}_min", element.symbol),
            actual >= element.min_percent - TOLERANCE,
        );
        constraints_satisfied.insert(
            format!("{}_max", element.symbol),
            actual <= element.max_percent + TOLERANCE,
        );
        if let Some(target) = element.target_percent {
            constraints_satisfied.insert(
                format!("{}_target", element.symbol),
                (actual - target).abs() <= TOLERANCE,
            );
        }
    }
    constraints_satisfied.insert(
        "impurities".to_string(),
        impurity_percent <= spec.max_impurities + TOLERANCE,
    );

    let estimated_density = estimate_density(&element_percentages);
    let estimated_hardness = estimate_hardness(&element_percentages);
    let estimated_melting_point = estimate_melting_point(&element_percentages);

    // A declared bound on a property that cannot be estimated counts as unmet
    let mut check_bound = |name: &str, estimate: Option<f64>, bound: Option<f64>, is_min: bool| {
        if let Some(bound) = bound {
            let ok = estimate.is_some_and(|value| {
                if is_min {
                    value >= bound - TOLERANCE
                } else {
                    value <= bound + TOLERANCE
                }
            });
            constraints_satisfied.insert(name.to_string(), ok);
        }
    };
    check_bound("hardness_min", estimated_hardness, spec.min_hardness, true);
    check_bound("hardness_max", estimated_hardness, spec.max_hardness, false);
    check_bound("melting_point_min", estimated_melting_point, spec.melting_point_min, true);
    check_bound("melting_point_max", estimated_melting_point, spec.melting_point_max, false);

    Some(BlendingMetrics {
        quantities,
        total_weight,
        total_cost,
        element_percentages,
        impurity_percent,
        estimated_density,
        estimated_hardness,
        estimated_melting_point,
        constraints_satisfied,
    })
}

fn tabulated(table: &[(&str, f64)], symbol: &str) -> Option<f64> {
    table.iter().find(|(s, _)| *s == symbol).map(|&(_, value)| value)
}

/// Mass fractions of tabulated elements present in the blend, paired with their table value
fn tabulated_fractions<'a>(
    table: &'static [(&'static str, f64)],
    percentages: &'a BTreeMap<String, f64>,
) -> impl Iterator<Item = (f64, f64)> + 'a {
    percentages
        .iter()
        .filter(|&(_, &percent)| percent > 0.0)
        .filter_map(move |(symbol, &percent)| tabulated(table, symbol).map(|value| (percent / 100.0, value)))
}

fn estimate_density(percentages: &BTreeMap<String, f64>) -> Option<f64> {
    let (mass, volume) = tabulated_fractions(ELEMENT_DENSITIES, percentages)
        .fold((0.0, 0.0), |(mass, volume), (fraction, density)| {
            (mass + fraction, volume + fraction / density)
        });
    (mass > 0.0 && volume > 0.0).then(|| mass / volume)
}

fn estimate_hardness(percentages: &BTreeMap<String, f64>) -> Option<f64> {
    let (fe, cr) = (percentages.get("Fe")?, percentages.get("Cr")?);
    let content = |symbol: &str| percentages.get(symbol).copied().unwrap_or(0.0);
    let hardness = fe * 0.3 + cr * 1.2 + content("Ni") * 0.8 + content("C") * 50.0;
    Some(hardness.min(MAX_HARDNESS_HRC))
}

fn estimate_melting_point(percentages: &BTreeMap<String, f64>) -> Option<f64> {
    let (weighted, total) = tabulated_fractions(ELEMENT_MELTING_POINTS, percentages)
        .fold((0.0, 0.0), |(weighted, total), (fraction, point)| {
            (weighted + fraction * point, total + fraction)
        });
    (total > 0.0).then(|| weighted / total)
}
