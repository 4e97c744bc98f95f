// End-to-end solves against HiGHS.
#![cfg(feature = "highs")]

use ro_models::problems::assignment::{AssignmentProblem, Project, Student};
use ro_models::problems::blending::{AlloySpecification, BlendingProblem, Element, RawMaterial};
use ro_models::problems::max_flow::MaxFlowProblem;
use ro_models::problems::multimodal::{Hub, LinkKey, MultiModalProblem};
use ro_models::problems::vertex_cover::{Gate, VertexCoverProblem};
use ro_models::{
    OptimizationService, SolutionStatus, SolverBackend, SolverConfig, ThroughputPolicy,
};

const EPS: f64 = 1e-6;

fn service() -> OptimizationService {
    OptimizationService::from_config(&SolverConfig::default().with_backend(SolverBackend::Highs))
}

fn triangle() -> VertexCoverProblem {
    VertexCoverProblem::new(vec![Gate::new("A", 10.0), Gate::new("B", 10.0), Gate::new("C", 5.0)])
        .with_wire("A", "B")
        .with_wire("B", "C")
        .with_wire("C", "A")
}

#[test]
fn vertex_cover_triangle_costs_fifteen() {
    let outcome = service().solve_vertex_cover(&triangle()).unwrap();
    assert_eq!(outcome.solution.status(), SolutionStatus::Optimal);
    assert!((outcome.solution.objective_value().unwrap() - 15.0).abs() < EPS);

    let metrics = outcome.metrics.unwrap();
    assert!(metrics.selected.contains(&"C".to_string()));
    assert_eq!(metrics.selected.len(), 2);
    assert!(metrics.all_satisfied());
}

#[test]
fn vertex_cover_conflicts_can_make_it_infeasible() {
    let problem = triangle()
        .with_conflict("A", "B")
        .with_conflict("B", "C")
        .with_conflict("C", "A");
    let outcome = service().solve_vertex_cover(&problem).unwrap();
    assert_eq!(outcome.solution.status(), SolutionStatus::Infeasible);
    assert!(outcome.solution.values().is_empty());
    assert!(outcome.metrics.is_none());
}

#[test]
fn max_flow_respects_conservation_and_capacity() {
    let problem = MaxFlowProblem::new(["s", "a", "b", "t"])
        .with_arc("s", "a", 10.0)
        .with_arc("s", "b", 5.0)
        .with_arc("a", "b", 15.0)
        .with_arc("a", "t", 4.0)
        .with_arc("b", "t", 10.0)
        .with_terminals("s", "t");
    let outcome = service().solve_max_flow(&problem).unwrap();
    let metrics = outcome.metrics.unwrap();

    assert_eq!(outcome.solution.status(), SolutionStatus::Optimal);
    assert!((metrics.total_flow - 14.0).abs() < EPS);
    assert!(metrics.constraints_satisfied.values().all(|&ok| ok));
}

#[test]
fn blending_meets_weight_and_composition() {
    let problem = BlendingProblem::new(
        "stainless",
        vec![
            RawMaterial::new("Scrap", 0.5, 800.0)
                .with_content("Fe", 90.0)
                .with_content("Cr", 8.0)
                .with_content("Cu", 2.0),
            RawMaterial::new("FeCr", 2.0, 300.0)
                .with_content("Fe", 40.0)
                .with_content("Cr", 60.0),
            RawMaterial::new("Iron", 0.8, 1000.0).with_content("Fe", 100.0),
        ],
        AlloySpecification::new(
            "AISI 430",
            1000.0,
            vec![
                Element::new("Fe", "Iron", 70.0, 90.0),
                Element::new("Cr", "Chromium", 16.0, 18.0),
            ],
        ),
    );
    let outcome = service().solve_blending(&problem).unwrap();
    assert_eq!(outcome.solution.status(), SolutionStatus::Optimal);

    let metrics = outcome.metrics.unwrap();
    assert!((metrics.total_weight - 1000.0).abs() < EPS);
    for element in &problem.alloy_spec.elements {
        let percent = metrics.element_percentages[&element.symbol];
        assert!(percent >= element.min_percent - EPS && percent <= element.max_percent + EPS);
    }
    assert!(metrics.all_satisfied(), "{:?}", metrics.constraints_satisfied);
    assert!(outcome.solution.sensitivity().is_some());
}

fn france(lyon_throughput: f64) -> MultiModalProblem {
    MultiModalProblem::new(vec![
        Hub::new("Paris", 100.0).with_throughput(500.0),
        Hub::new("Marseille", -100.0).with_throughput(500.0),
        Hub::new("Lyon", 0.0).with_throughput(lyon_throughput),
    ])
    .with_link("Paris", "Lyon", "Train", 80.0, 50.0)
    .with_link("Paris", "Lyon", "Bus", 50.0, 20.0)
    .with_link("Lyon", "Marseille", "Train", 80.0, 50.0)
    .with_link("Lyon", "Marseille", "Bus", 50.0, 20.0)
    .with_link("Paris", "Marseille", "Flight", 100.0, 150.0)
}

#[test]
fn multimodal_routes_through_cheapest_modes() {
    let outcome = service().solve_multimodal(&france(200.0)).unwrap();
    assert_eq!(outcome.solution.status(), SolutionStatus::Optimal);
    assert!((outcome.solution.objective_value().unwrap() - 7000.0).abs() < EPS);

    let metrics = outcome.metrics.unwrap();
    assert!((metrics.link_flows[&LinkKey::new("Paris", "Lyon", "Bus")] - 50.0).abs() < EPS);
    assert!(!metrics.link_flows.contains_key(&LinkKey::new("Paris", "Marseille", "Flight")));
    assert!(metrics.constraints_satisfied.values().all(|&ok| ok));
}

#[test]
fn multimodal_hub_throughput_diverts_to_flight() {
    let config = SolverConfig::default()
        .with_backend(SolverBackend::Highs)
        .with_throughput_policy(ThroughputPolicy::InflowAndOutflow);
    let outcome = OptimizationService::from_config(&config)
        .solve_multimodal(&france(60.0))
        .unwrap();

    // 60 units via Lyon (50 by bus, 10 by train), 40 by air
    assert!((outcome.solution.objective_value().unwrap() - 9000.0).abs() < EPS);
    assert!((outcome.metrics.unwrap().mode_totals["Flight"] - 40.0).abs() < EPS);
}

#[test]
fn engine_assignment_is_optimal() {
    let problem = AssignmentProblem::new(
        vec![
            Student::new(1, "Alice").with_preference(101, 10.0).with_preference(102, 3.0),
            Student::new(2, "Bob").with_preference(101, 5.0).with_preference(102, 8.0),
            Student::new(3, "Charlie").with_preference(101, 7.0).with_preference(102, 9.0),
        ],
        vec![Project::new(101, "Web", 1, 2), Project::new(102, "Mobile", 1, 2)],
    );
    let service = service();
    assert_eq!(service.assignment_solver_name(), "HiGHS");

    let outcome = service.solve_assignment(&problem).unwrap();
    assert_eq!(outcome.solution.status(), SolutionStatus::Optimal);
    assert!((outcome.solution.objective_value().unwrap() - 27.0).abs() < EPS);
    assert!(outcome.metrics.unwrap().all_satisfied());
}

#[test]
fn engine_assigns_everyone_without_minimums() {
    let problem = AssignmentProblem::new(
        vec![
            Student::new(1, "A").with_preference(10, 5.0),
            Student::new(2, "B").with_preference(10, 4.0).with_preference(20, 0.5),
            Student::new(3, "C").with_preference(10, 3.0),
            Student::new(4, "D"),
        ],
        vec![Project::new(10, "Popular", 0, 2), Project::new(20, "Quiet", 0, 2)],
    );

    let outcome = service().solve_assignment(&problem).unwrap();
    assert_eq!(outcome.solution.status(), SolutionStatus::Optimal);
    assert!(outcome.solution.statistics().is_some());

    let metrics = outcome.metrics.unwrap();
    assert!(metrics.unassigned.is_empty());
    assert_eq!(metrics.student_assignments.len(), 4);
    assert!(metrics.all_satisfied());
    assert!((metrics.total_score - 9.0).abs() < EPS);
}
