// Núcleo del motor: resolución de prerequisitos, extracción del grafo por
// instancia, simulación de Failed/Dropped y tabla de plan abierto.
pub mod resolver;
pub mod extract;
pub mod simulation;
pub mod open_plan;

pub use resolver::{dedup_relations, resolve_edges, InstanceIndex, InstanceSlot};
pub use extract::{extract_graph, CurriculumGraph};
pub use simulation::{
    ensure_still_scheduled, SemesterToggle, SimulationState, SubmissionPayload, SubmittedCourse, ToggleOutcome,
};
pub use open_plan::{OpenPlanEntry, OpenPlanRow, OpenPlanSnapshot, OpenPlanTable, OpenPlanToggle};
