// Leadflow Dispatch - CRM event intake
//
// The boundary between the CRM's event producers and the workflow
// engine:
// - CRM event model with per-class constructors
// - Trigger dispatcher: match, admission-check, launch
// - Schedule ticker for time_based workflows

pub mod dispatcher;
pub mod event;
pub mod schedule;

pub use dispatcher::{DispatchOutcome, MatchOutcome, TriggerDispatcher};
pub use event::CrmEvent;
pub use schedule::{is_due, ScheduleTicker, TickTargets};
