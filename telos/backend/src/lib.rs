//! Backends for the telos compiler: plan-rule construction from state
//! graphs and serialisation into the agent language.
mod agentspeak;
mod rules;
mod traits;

pub use agentspeak::{AgentSpeakBackend, render};
pub use rules::{BodyItem, PlanLibrary, PlanRule, SolvedTransition};
pub use traits::Backend;
