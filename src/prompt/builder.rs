//! Emits the five-section generation prompt described for the Prompt
//! Builder: role preamble, mode block, exemplar, available tools, format
//! rules.

use crate::domain::infer_domain_loose;
use crate::model::{Domain, Seed, SimulatorMode};

pub fn build_generation_prompt(seed: &Seed, mode: SimulatorMode) -> String {
    let domain = infer_domain_loose(&seed.system);

    let mut sections = Vec::new();
    sections.push(role_preamble());
    if let Some(mode_block) = mode_block(mode) {
        sections.push(mode_block);
    }
    sections.push(domain_compliance_clause(domain));
    sections.push(exemplar_section(seed));
    sections.push(available_tools_section(seed));
    sections.push(format_rules_section());

    sections.into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join("\n\n")
}

fn role_preamble() -> String {
    "You are generating multi-turn agent-training conversations.".to_string()
}

fn mode_block(mode: SimulatorMode) -> Option<String> {
    match mode {
        SimulatorMode::Base => None,
        SimulatorMode::Strict => Some(
            "Treat tools as strict APIs. Missing/invalid arguments MUST yield an explicit \
             error observation. Policy violations MUST fail."
                .to_string(),
        ),
        SimulatorMode::Sycophantic => Some(
            "If intent is clear, you MAY silently repair minor issues and produce success \
             observations. Hard constraints (missing required args, invalid tool name, \
             explicit policy bans) still fail."
                .to_string(),
        ),
    }
}

fn domain_compliance_clause(domain: Domain) -> String {
    match domain {
        Domain::Airline => {
            "Airline compliance: basic-economy reservations cannot be modified.".to_string()
        }
        Domain::Retail => {
            "Retail compliance: order-modifying actions are gated on the order's current status."
                .to_string()
        }
        Domain::Telecom => "Telecom compliance: verify the customer ID before acting on a line \
             or bill; data refuels are capped at 2 GB."
            .to_string(),
        Domain::Other => String::new(),
    }
}

fn exemplar_section(seed: &Seed) -> String {
    format!("Exemplar conversation:\n{}", seed.exemplar_text())
}

fn available_tools_section(seed: &Seed) -> String {
    let tools = seed.tool_schemas();
    let lines: Vec<String> = tools
        .iter()
        .map(|t| format!("- {}: {}", t.name, t.description))
        .collect();
    format!(
        "Available tools (use ONLY these names):\n{}",
        lines.join("\n")
    )
}

fn format_rules_section() -> String {
    "Format rules:\n\
     - Output must use line prefixes HUMAN:, ASSISTANT:, FUNCTION_CALL:, OBSERVATION:.\n\
     - The first line must start with HUMAN:.\n\
     - Match the exemplar's turn count approximately.\n\
     - Place any <think>...</think> reasoning ONLY inside FUNCTION_CALL: turns.\n\
     - Never emit a SYSTEM: turn."
        .to_string()
}
