// Behaviour that needs no MILP engine: greedy fallback, degradation,
// persistence and configuration.

use ro_models::problems::assignment::{AssignmentProblem, Project, Student};
use ro_models::problems::blending::{AlloySpecification, BlendingProblem, Element, RawMaterial};
use ro_models::problems::max_flow::MaxFlowProblem;
use ro_models::problems::multimodal::{Hub, MultiModalProblem};
use ro_models::problems::vertex_cover::{Gate, VertexCoverProblem};
use ro_models::{
    OptimizationService, SolutionStatus, SolveWorker, SolverBackend, SolverConfig, SolvingFacade,
};

fn greedy_service() -> OptimizationService {
    OptimizationService::from_config(&SolverConfig::default().with_backend(SolverBackend::Greedy))
}

fn scenario() -> AssignmentProblem {
    AssignmentProblem::new(
        vec![
            Student::new(1, "Alice").with_preference(101, 10.0).with_preference(102, 3.0),
            Student::new(2, "Bob").with_preference(101, 5.0).with_preference(102, 8.0),
            Student::new(3, "Charlie").with_preference(101, 7.0).with_preference(102, 9.0),
        ],
        vec![Project::new(101, "Web", 1, 2), Project::new(102, "Mobile", 1, 2)],
    )
}

#[test]
fn greedy_scenario_places_top_choices() {
    let outcome = greedy_service().solve_assignment(&scenario()).unwrap();
    let metrics = outcome.metrics.unwrap();

    assert_eq!(outcome.solution.status(), SolutionStatus::HeuristicOk);
    assert_eq!(metrics.student_assignments[&1], 101);
    assert_eq!(metrics.student_assignments[&3], 102);
    assert!(outcome.solution.objective_value().unwrap() >= 19.0);
    assert_eq!(metrics.total_score, outcome.solution.objective_value().unwrap());
    assert!(metrics.all_satisfied());
}

#[test]
fn greedy_assigns_everyone_without_minimums() {
    let students = (1..=7)
        .map(|id| Student::new(id, format!("S{}", id)).with_preference(100 + id % 3, id as f64))
        .collect();
    let projects = vec![
        Project::new(100, "A", 0, 3),
        Project::new(101, "B", 0, 2),
        Project::new(102, "C", 0, 2),
    ];
    let outcome = greedy_service()
        .solve_assignment(&AssignmentProblem::new(students, projects))
        .unwrap();

    assert_eq!(outcome.solution.status(), SolutionStatus::HeuristicOk);
    let metrics = outcome.metrics.unwrap();
    assert!(metrics.unassigned.is_empty());
    assert!(metrics.all_satisfied());
}

#[test]
fn engine_families_degrade_to_error() {
    let service = OptimizationService::new(SolvingFacade::unavailable());

    let flow = MaxFlowProblem::new(["s", "t"]).with_arc("s", "t", 3.0).with_terminals("s", "t");
    let outcome = service.solve_max_flow(&flow).unwrap();
    assert_eq!(outcome.solution.status(), SolutionStatus::Error);
    assert!(!outcome.solution.message().is_empty());

    let network = MultiModalProblem::new(vec![Hub::new("A", 1.0), Hub::new("B", -1.0)])
        .with_link("A", "B", "Truck", 5.0, 1.0);
    assert_eq!(
        service.solve_multimodal(&network).unwrap().solution.status(),
        SolutionStatus::Error
    );

    let cover = VertexCoverProblem::new(vec![Gate::new("A", 1.0), Gate::new("B", 1.0)]).with_wire("A", "B");
    let outcome = service.solve_vertex_cover(&cover).unwrap();
    assert_eq!(outcome.solution.status(), SolutionStatus::Error);
    assert!(outcome.metrics.is_none());
}

#[test]
fn blending_problem_survives_save_and_load() {
    let mut problem = BlendingProblem::new(
        "bronze",
        vec![
            RawMaterial::new("Copper cathode", 9.2, 500.0).with_content("Cu", 99.9),
            RawMaterial::new("Tin ingot", 31.0, 80.0).with_content("Sn", 99.8),
            RawMaterial::new("Bronze scrap", 6.1, 300.0)
                .with_content("Cu", 88.0)
                .with_content("Sn", 10.5)
                .with_content("Pb", 1.5),
        ],
        AlloySpecification::new(
            "CuSn10",
            250.0,
            vec![
                Element::new("Cu", "Copper", 88.0, 91.0),
                Element::new("Sn", "Tin", 9.0, 11.0).with_target(10.0),
            ],
        )
        .with_max_impurities(1.0),
    );
    problem.raw_materials[2].density = 8.8;
    problem
        .additional_constraints
        .insert("furnace".into(), serde_json::json!({ "max_charge_kg": 400 }));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bronze.json");
    problem.save_to_json(&path).unwrap();

    assert_eq!(BlendingProblem::load_from_json(&path).unwrap(), problem);
}

#[test]
fn config_file_selects_backend() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("solver.toml");
    std::fs::write(&path, "backend = \"greedy\"\ntime_limit = 5\n").unwrap();

    let config = SolverConfig::load(&path).unwrap();
    assert_eq!(config.backend, SolverBackend::Greedy);
    assert_eq!(config.time_limit(), Some(std::time::Duration::from_secs(5)));

    let service = OptimizationService::from_config(&config);
    assert_eq!(service.assignment_solver_name(), "Greedy");
}

#[tokio::test]
async fn worker_runs_greedy_in_background() {
    let worker = SolveWorker::new(greedy_service());
    let problem = scenario();
    let outcome = worker
        .spawn(move |service| service.solve_assignment(&problem))
        .join()
        .await
        .unwrap();
    assert!(outcome.solution.has_solution());
}
