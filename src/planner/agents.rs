//! The transport-planning agent tree
//!
//! ```text
//! root_agent (greets, transfers)
//! └── transport_workflow_agent (sequential)
//!     ├── location_input_agent
//!     └── route_research_agent (google_search)
//! ```

use std::sync::Arc;

use crate::agent::{Agent, LlmAgent, SequentialAgent};
use crate::core::{Config, Result};
use crate::llm::{GeminiClient, LLMProvider};
use crate::tools::{GoogleSearchTool, Tool};

pub const ROOT_AGENT: &str = "root_agent";
pub const WORKFLOW_AGENT: &str = "transport_workflow_agent";
pub const LOCATION_AGENT: &str = "location_input_agent";
pub const RESEARCH_AGENT: &str = "route_research_agent";

/// Section headings every route report carries, in order
pub const REPORT_SECTIONS: [&str; 6] = [
    "By Bus",
    "By MRT/Train",
    "By Taxi",
    "By Cycling",
    "By Walking",
    "Fastest Route",
];

const ROOT_INSTRUCTION: &str = "\
You are a friendly route planning assistant.

On the user's first message:
1. Greet them.
2. Say that you help plan journeys in Singapore.
3. Explain that a dedicated route planner will collect their starting point and \
destination and then research the options.

Then call transfer_to_agent with agent_name \"transport_workflow_agent\" so the \
planning can begin. Do not research routes yourself.";

const LOCATION_INSTRUCTION: &str = "\
You are the location input agent, introducing yourself as the Route Planner Agent.

Greet the user and explain that you find the fastest route for different ways of \
travelling (MRT, bus, taxi, cycling, walking).
If the user has not given both a current location and a destination, ask for the \
missing one.
Once both are known, extract them and confirm them back to the user in the form:
Start: <location>
Destination: <location>
Keep that confirmation in your reply; the next agent reads it.";

/// Description shown to a parent choosing where to transfer
const WORKFLOW_DESCRIPTION: &str =
    "Asks for the start and destination, then researches and recommends transport options.";

fn research_instruction() -> String {
    let sections: String = REPORT_SECTIONS
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. **{}**\n", i + 1, s))
        .collect();

    format!(
        "\
You are the route research agent, specialised in transport planning.

Work out all timings against the current local time of the country the trip is in.

Take the start and destination confirmed by the previous agent. Unless the trip \
crosses a border, use the google_search tool to look up:
- current routes and travel times for train/MRT, bus, taxi and walking
- traffic conditions and delays
- alternative routes
- public transport schedules and availability

If a search fails, carry on with what you know and say which details could not be \
checked.

Then write one concise report for someone in a hurry, with exactly these sections:
{sections}
Each mode section gives a route from the start to the destination using only that \
mode. Fastest Route may combine any transport available in Singapore and should \
give the best ratio of cost to time."
    )
}

/// Build the greeting root agent and everything below it.
///
/// With `agent.delegate_via_root` off the workflow itself is the entry agent.
pub fn build_root_agent(
    config: &Config,
    llm: Arc<dyn LLMProvider>,
    search: Arc<dyn Tool>,
) -> Result<Arc<dyn Agent>> {
    let workflow = build_workflow(config, llm.clone(), search)?;

    if !config.agent.delegate_via_root {
        return Ok(workflow);
    }

    let root = LlmAgent::builder(ROOT_AGENT)
        .description("Introduces route planning and hands over to the planning workflow.")
        .instruction(ROOT_INSTRUCTION)
        .model(&config.gemini.model)
        .llm(llm)
        .with_agent_config(&config.agent)
        .sub_agent(workflow)
        .build()?;

    Ok(Arc::new(root))
}

/// The two-step sequential workflow
pub fn build_workflow(
    config: &Config,
    llm: Arc<dyn LLMProvider>,
    search: Arc<dyn Tool>,
) -> Result<Arc<dyn Agent>> {
    let location = LlmAgent::builder(LOCATION_AGENT)
        .description("Collects and confirms the current location and destination.")
        .instruction(LOCATION_INSTRUCTION)
        .model(&config.gemini.model)
        .llm(llm.clone())
        .with_agent_config(&config.agent)
        .build()?;

    let research = LlmAgent::builder(RESEARCH_AGENT)
        .description("Researches transport options in Singapore and recommends the best way to travel.")
        .instruction(research_instruction())
        .model(&config.gemini.model)
        .llm(llm)
        .with_agent_config(&config.agent)
        .tool(search)
        .build()?;

    let workflow = SequentialAgent::new(
        WORKFLOW_AGENT,
        WORKFLOW_DESCRIPTION,
        vec![Arc::new(location), Arc::new(research)],
    )?;

    Ok(Arc::new(workflow))
}

/// Wire the planner to Gemini for both the model and search
pub fn gemini_planner(config: &Config) -> Result<Arc<dyn Agent>> {
    let client = GeminiClient::from_config(config)?;
    let search = GoogleSearchTool::new(client.clone(), &config.gemini.model);
    build_root_agent(config, Arc::new(client), Arc::new(search))
}
