//! Tool-call dispatch.
//!
//! The model issues an ordered batch of function calls; the dispatcher
//! services each one against the device collaborators and produces exactly
//! one result per call, in the original order. A failing call yields an
//! `{error}` payload in its own slot and never aborts the rest of the batch
//! or the session.

use std::sync::Arc;

use chrono::Local;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use super::declarations::{function_declarations, ToolName};
use super::device::{ActionHandler, ContactsProvider, ScheduleEntry, ScheduleStore, ToolError};

/// A function call issued by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call identifier; the result must echo it.
    pub id: String,
    /// Wire name of the function.
    pub name: String,
    /// Named arguments, all primitive strings.
    #[serde(default)]
    pub args: Value,
}

impl ToolCall {
    fn str_arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(Value::as_str)
    }
}

/// The response for one call, addressed by the call's identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub id: String,
    pub name: String,
    pub response: Value,
}

/// Dispatch table over the declared tool set.
#[derive(Clone)]
pub struct ToolDispatcher {
    actions: Arc<dyn ActionHandler>,
    contacts: Arc<dyn ContactsProvider>,
    schedule: Arc<ScheduleStore>,
}

impl ToolDispatcher {
    /// Build the dispatcher and verify that every declared function has a
    /// dispatch arm. Both sides are static, so a mismatch is a programming
    /// error caught at startup rather than a silent fallback at call time.
    pub fn new(
        actions: Arc<dyn ActionHandler>,
        contacts: Arc<dyn ContactsProvider>,
        schedule: Arc<ScheduleStore>,
    ) -> Self {
        for decl in function_declarations() {
            assert!(
                ToolName::parse(&decl.name).is_some(),
                "declared tool {} has no dispatch arm",
                decl.name
            );
        }
        Self {
            actions,
            contacts,
            schedule,
        }
    }

    /// Shared schedule store, also read by the UI.
    pub fn schedule(&self) -> Arc<ScheduleStore> {
        self.schedule.clone()
    }

    /// Service an ordered batch. The result batch has one entry per call,
    /// in the same order.
    pub fn dispatch(&self, calls: Vec<ToolCall>) -> Vec<ToolResult> {
        calls
            .into_iter()
            .map(|call| {
                let response = match self.execute(&call) {
                    Ok(response) => response,
                    Err(err) => {
                        tracing::warn!("tool {} failed: {err}", call.name);
                        json!({ "error": err.to_string() })
                    }
                };
                ToolResult {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    response,
                }
            })
            .collect()
    }

    fn execute(&self, call: &ToolCall) -> Result<Value, ToolError> {
        let Some(name) = ToolName::parse(&call.name) else {
            // Unknown names are acknowledged, not rejected: the model keeps
            // the turn alive as long as every call gets some response.
            tracing::warn!("unknown tool name {:?}, acknowledging", call.name);
            return Ok(json!({ "status": "ok" }));
        };

        match name {
            ToolName::OpenUrl => {
                let raw = call
                    .str_arg("url")
                    .ok_or(ToolError::MissingArgument("url"))?;
                let url =
                    Url::parse(raw).map_err(|e| ToolError::InvalidUrl(format!("{raw}: {e}")))?;
                self.actions.open_url(&url)?;
                Ok(json!({ "result": format!("Opened {raw}") }))
            }

            ToolName::MakeCall => {
                let number = call
                    .str_arg("number")
                    .ok_or(ToolError::MissingArgument("number"))?;
                self.actions.dial(number)?;
                Ok(json!({ "result": format!("Calling {number}") }))
            }

            ToolName::SendMessage => {
                let number = call
                    .str_arg("number")
                    .ok_or(ToolError::MissingArgument("number"))?;
                let message = call
                    .str_arg("message")
                    .ok_or(ToolError::MissingArgument("message"))?;
                let body = utf8_percent_encode(message, NON_ALPHANUMERIC).to_string();
                self.actions.compose_sms(number, &body)?;
                Ok(json!({ "result": format!("Message draft opened for {number}") }))
            }

            ToolName::GetDeviceTime => Ok(json!({
                "dateTime": Local::now().to_rfc2822()
            })),

            ToolName::GetContacts => Ok(json!({
                "contacts": self.contacts.contacts()
            })),

            ToolName::ManageSchedule => {
                let action = call
                    .str_arg("action")
                    .ok_or(ToolError::MissingArgument("action"))?;
                if action == "add" {
                    let entry = ScheduleEntry {
                        time: call.str_arg("time").unwrap_or("TBD").to_string(),
                        event: call.str_arg("event").unwrap_or("Unknown Event").to_string(),
                    };
                    let confirmation =
                        format!("Added {} at {} to schedule.", entry.event, entry.time);
                    self.schedule.add(entry);
                    Ok(json!({ "result": confirmation }))
                } else {
                    Ok(json!({ "schedule": self.schedule.list() }))
                }
            }
        }
    }
}
