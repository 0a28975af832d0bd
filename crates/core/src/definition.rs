// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The workflow definition model: states, gates, roles. Definitions are
//! immutable once loaded by a registry; this module only carries the
//! shape and the structural invariants that hold regardless of where a
//! definition came from (HCL file, JSON fixture, embedded default).

use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{EngineError, EngineResult};

/// One entry in a workflow's declared parameter list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub command: String,
    #[serde(rename = "expectExitCode", default = "default_exit_code")]
    pub expect_exit_code: i32,
}

fn default_exit_code() -> i32 {
    0
}

/// The predicate that decides whether a state's submitted result is
/// acceptable. Disjoint required fields per kind; discriminated by an
/// explicit `kind` tag rather than field presence, since all three kinds
/// can legitimately carry a `verify` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Gate {
    Evidence {
        schema: IndexMap<String, String>,
        #[serde(default)]
        verify: Option<CommandSpec>,
    },
    Verdict {
        options: Vec<String>,
    },
    Command {
        verify: CommandSpec,
    },
}

/// One state in a workflow's state graph. A closed, four-variant sum.
/// Structural discrimination: the presence of `assign` marks Agent;
/// everything else requires a recognized `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StateDefinition {
    Agent {
        assign: String,
        #[serde(default)]
        gate: Option<Gate>,
        transitions: IndexMap<String, String>,
        #[serde(rename = "maxRetries", default)]
        max_retries: Option<u32>,
        #[serde(rename = "inputFrom", default)]
        input_from: Option<String>,
    },
    Action {
        commands: Vec<String>,
        transitions: IndexMap<String, String>,
        #[serde(default)]
        gate: Option<Gate>,
    },
    Terminal {
        result: String,
        #[serde(default)]
        action: Option<String>,
    },
    Subworkflow {
        workflow: String,
        #[serde(rename = "inputMap", default)]
        input_map: Option<IndexMap<String, String>>,
        transitions: IndexMap<String, String>,
        #[serde(rename = "maxRetries", default)]
        max_retries: Option<u32>,
    },
}

impl StateDefinition {
    pub fn max_retries(&self) -> u32 {
        let declared = match self {
            StateDefinition::Agent { max_retries, .. } => *max_retries,
            StateDefinition::Subworkflow { max_retries, .. } => *max_retries,
            StateDefinition::Action { .. } | StateDefinition::Terminal { .. } => None,
        };
        // An explicit 0 is treated as "retry once, then escalate" rather
        // than "never retry" — see open question in the design notes.
        match declared {
            None | Some(0) => 1,
            Some(n) => n,
        }
    }

    pub fn gate(&self) -> Option<&Gate> {
        match self {
            StateDefinition::Agent { gate, .. } => gate.as_ref(),
            StateDefinition::Action { gate, .. } => gate.as_ref(),
            StateDefinition::Terminal { .. } | StateDefinition::Subworkflow { .. } => None,
        }
    }

    pub fn transitions(&self) -> Option<&IndexMap<String, String>> {
        match self {
            StateDefinition::Agent { transitions, .. }
            | StateDefinition::Action { transitions, .. }
            | StateDefinition::Subworkflow { transitions, .. } => Some(transitions),
            StateDefinition::Terminal { .. } => None,
        }
    }

    pub fn result(&self) -> Option<&str> {
        match self {
            StateDefinition::Terminal { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// A raw, field-permissive view used only to discriminate and decode a
/// state's shape; never constructed directly by callers.
#[derive(Debug, Deserialize)]
struct RawState {
    assign: Option<String>,
    #[serde(default)]
    gate: Option<Gate>,
    #[serde(default)]
    transitions: Option<IndexMap<String, String>>,
    #[serde(rename = "maxRetries", default)]
    max_retries: Option<u32>,
    #[serde(rename = "inputFrom", default)]
    input_from: Option<String>,
    #[serde(default)]
    commands: Option<Vec<String>>,
    #[serde(rename = "type", default)]
    type_tag: Option<String>,
    result: Option<String>,
    action: Option<String>,
    workflow: Option<String>,
    #[serde(rename = "inputMap", default)]
    input_map: Option<IndexMap<String, String>>,
}

/// Newtype so `StateDefinition` keeps a hand-rolled `Deserialize` that can
/// refuse an unrecognized shape, separate from the `#[serde(untagged)]`
/// derive used only for `Serialize` above.
struct StateDefinitionWire(StateDefinition);

impl<'de> Deserialize<'de> for StateDefinitionWire {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawState::deserialize(deserializer)?;
        if let Some(assign) = raw.assign {
            return Ok(StateDefinitionWire(StateDefinition::Agent {
                assign,
                gate: raw.gate,
                transitions: raw.transitions.unwrap_or_default(),
                max_retries: raw.max_retries,
                input_from: raw.input_from,
            }));
        }
        match raw.type_tag.as_deref() {
            Some("action") => Ok(StateDefinitionWire(StateDefinition::Action {
                commands: raw.commands.unwrap_or_default(),
                transitions: raw.transitions.unwrap_or_default(),
                gate: raw.gate,
            })),
            Some("terminal") => Ok(StateDefinitionWire(StateDefinition::Terminal {
                result: raw
                    .result
                    .ok_or_else(|| de::Error::custom("terminal state missing `result`"))?,
                action: raw.action,
            })),
            Some("subworkflow") => Ok(StateDefinitionWire(StateDefinition::Subworkflow {
                workflow: raw
                    .workflow
                    .ok_or_else(|| de::Error::custom("subworkflow state missing `workflow`"))?,
                input_map: raw.input_map,
                transitions: raw.transitions.unwrap_or_default(),
                max_retries: raw.max_retries,
            })),
            other => Err(de::Error::custom(format!(
                "state has neither `assign` nor a recognized `type` (got {other:?})"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileScope {
    #[serde(default)]
    pub writable: Vec<String>,
    #[serde(default)]
    pub readable: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub agent: String,
    #[serde(default)]
    pub persona: Option<String>,
    #[serde(rename = "personaPool", default)]
    pub persona_pool: Option<Vec<String>>,
    #[serde(rename = "personaFrom", default)]
    pub persona_from: Option<String>,
    #[serde(rename = "personaTags", default)]
    pub persona_tags: Option<Vec<String>>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(rename = "fileScope", default)]
    pub file_scope: FileScope,
    #[serde(rename = "freshPerState", default)]
    pub fresh_per_state: bool,
}

impl RoleDefinition {
    /// Merge an override's explicit fields over these defaults. Fields
    /// left `None`/empty on `other` do not clobber `self`.
    pub fn merged_with_override(&self, other: &RoleOverride) -> RoleDefinition {
        let mut merged = self.clone();
        if let Some(agent) = &other.agent {
            merged.agent = agent.clone();
        }
        if let Some(persona) = &other.persona {
            merged.persona = Some(persona.clone());
        }
        if let Some(pool) = &other.persona_pool {
            merged.persona_pool = Some(pool.clone());
        }
        if let Some(from) = &other.persona_from {
            merged.persona_from = Some(from.clone());
        }
        if let Some(tags) = &other.persona_tags {
            merged.persona_tags = Some(tags.clone());
        }
        if let Some(tools) = &other.tools {
            merged.tools = tools.clone();
        }
        if let Some(scope) = &other.file_scope {
            merged.file_scope = scope.clone();
        }
        merged
    }
}

/// Project-level override for a role, loaded from `loom.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleOverride {
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub persona: Option<String>,
    #[serde(rename = "personaPool", default)]
    pub persona_pool: Option<Vec<String>>,
    #[serde(rename = "personaFrom", default)]
    pub persona_from: Option<String>,
    #[serde(rename = "personaTags", default)]
    pub persona_tags: Option<Vec<String>>,
    #[serde(default)]
    pub tools: Option<Vec<String>>,
    #[serde(rename = "fileScope", default)]
    pub file_scope: Option<FileScope>,
}

/// A member of the project's team roster, used when `personaTags`
/// selects a pool dynamically instead of a fixed list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub persona: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "initialState", default)]
    pub initial_state: Option<String>,
    #[serde(default)]
    pub params: IndexMap<String, ParamDef>,
    #[serde(default)]
    pub roles: IndexMap<String, RoleDefinition>,
    #[serde(with = "states_map")]
    pub states: IndexMap<String, StateDefinition>,
}

impl WorkflowDefinition {
    /// The state a fresh run enters: the declared `initialState`, or the
    /// first state in declaration order.
    pub fn initial_state(&self) -> EngineResult<&str> {
        if let Some(name) = &self.initial_state {
            return Ok(name.as_str());
        }
        self.states
            .keys()
            .next()
            .map(String::as_str)
            .ok_or_else(|| EngineError::NoStates(self.name.clone()))
    }

    /// Every `transitions` target must resolve to a state that exists.
    pub fn validate(&self) -> EngineResult<()> {
        if self.states.is_empty() {
            return Err(EngineError::NoStates(self.name.clone()));
        }
        for (state_name, state) in &self.states {
            if let StateDefinition::Agent { assign, .. } = state {
                if !self.roles.contains_key(assign) {
                    return Err(EngineError::RoleUndefined(assign.clone()));
                }
            }
            if let Some(transitions) = state.transitions() {
                for target in transitions.values() {
                    if target == "ESCALATE" {
                        continue;
                    }
                    if !self.states.contains_key(target) {
                        return Err(EngineError::NoTransition {
                            workflow: self.name.clone(),
                            state: state_name.clone(),
                            result: target.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Accepts either a sequence of `{name, ...}` blocks or a map of
/// `name -> block` (the two shapes a declarative config format tends to
/// produce), preserving declaration order either way via `IndexMap`.
mod states_map {
    use super::*;
    use serde::de::{self, MapAccess, SeqAccess, Visitor};
    use serde::ser::SerializeMap;
    use std::fmt;
    use std::marker::PhantomData;

    pub fn serialize<S>(
        states: &IndexMap<String, StateDefinition>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(states.len()))?;
        for (k, v) in states {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }

    struct StatesVisitor(PhantomData<()>);

    impl<'de> Visitor<'de> for StatesVisitor {
        type Value = IndexMap<String, StateDefinition>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of state name to state definition")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut out = IndexMap::new();
            while let Some((key, value)) = map.next_entry::<String, super::StateDefinitionWire>()?
            {
                out.insert(key, value.0);
            }
            Ok(out)
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut out = IndexMap::new();
            while let Some((name, value)) =
                seq.next_element::<(String, super::StateDefinitionWire)>()?
            {
                out.insert(name, value.0);
            }
            Ok(out)
        }
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<IndexMap<String, StateDefinition>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(StatesVisitor(PhantomData))
    }
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;
