//! Planner module - the transport-planning workflow
//!
//! Agent instructions, the agent tree, and the trip form the front end offers.

pub mod agents;
pub mod form;

pub use agents::{
    build_root_agent, build_workflow, gemini_planner, LOCATION_AGENT, REPORT_SECTIONS,
    RESEARCH_AGENT, ROOT_AGENT, WORKFLOW_AGENT,
};
pub use form::{TravelMode, TripForm};
