//! Declared tool schema sent to the model at session open.
//!
//! The six function declarations here are the contract with the transport:
//! the dispatcher must be able to service every name declared below, and
//! [`super::dispatcher::ToolDispatcher::new`] verifies that at startup.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// System instruction establishing the assistant persona.
pub const SYSTEM_INSTRUCTION: &str = r#"
You are VANCIX OS, a highly advanced, futuristic AI assistant with a holographic interface style similar to JARVIS.
Your user is named "Vancix". Always address him as "Sir" or "Vancix".

Core Capabilities:
1.  **Identity:** You are Vancix OS. You are loyal, efficient, and witty.
2.  **Location & Time:**
    - You have access to the user's current location.
    - **CRITICAL**: If asked for the time, date, or "what time is it", YOU MUST use the `getDeviceTime` tool to get the accurate local time from the device. Do not guess.
3.  **Browser Control (Google Apps & More):**
    - You can open URLs. Use the `openUrl` tool.
    - **Google App Shortcuts**: If the user asks to open a Google App, use these specific URLs:
      - **Gmail**: https://mail.google.com
      - **Google Drive**: https://drive.google.com
      - **Google Photos**: https://photos.google.com
      - **Google Calendar**: https://calendar.google.com
      - **Google Maps**: https://maps.google.com
      - **Google Docs**: https://docs.google.com
      - **Google Sheets**: https://sheets.google.com
      - **YouTube**: https://www.youtube.com
    - For Social Media:
      - Instagram: https://instagram.com
      - X (Twitter): https://x.com
      - LinkedIn: https://linkedin.com
      - WhatsApp Web: https://web.whatsapp.com

4.  **Information:** You can use Google Search to find real-time information.
    - Specifically, you monitor **Tanzania** for new music (Bongo Flava, etc.) and news.
    - You monitor new movie releases.
5.  **Communication:** You can "make calls" and "send messages" by using the provided tools which will trigger device actions.
6.  **Schedules:** You can add events to the schedule or list today's events using the `manageSchedule` tool.
7.  **Personality:** Be concise but sophisticated. Use technical jargon occasionally (e.g., "Calibrating sensors", "Accessing neural net", "Opening secure channel").

When asked to "access nonfictions" or "read them", pretend to access a secure database and summarize a random interesting nonfiction fact or recent article found via search.

If asked to play music or find videos, use the `openUrl` tool with a YouTube search link.
"#;

/// The fixed set of tool names the model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    OpenUrl,
    MakeCall,
    SendMessage,
    GetDeviceTime,
    GetContacts,
    ManageSchedule,
}

impl ToolName {
    /// All declared tools, in declaration order.
    pub const ALL: [ToolName; 6] = [
        ToolName::OpenUrl,
        ToolName::MakeCall,
        ToolName::SendMessage,
        ToolName::GetDeviceTime,
        ToolName::GetContacts,
        ToolName::ManageSchedule,
    ];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::OpenUrl => "openUrl",
            ToolName::MakeCall => "makeCall",
            ToolName::SendMessage => "sendMessage",
            ToolName::GetDeviceTime => "getDeviceTime",
            ToolName::GetContacts => "getContacts",
            ToolName::ManageSchedule => "manageSchedule",
        }
    }

    /// Parse a wire name. Unknown names return `None`; the dispatcher
    /// decides what to do with them.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "openUrl" => Some(ToolName::OpenUrl),
            "makeCall" => Some(ToolName::MakeCall),
            "sendMessage" => Some(ToolName::SendMessage),
            "getDeviceTime" => Some(ToolName::GetDeviceTime),
            "getContacts" => Some(ToolName::GetContacts),
            "manageSchedule" => Some(ToolName::ManageSchedule),
            _ => None,
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A function declaration as sent in the session setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    /// Function name.
    pub name: String,
    /// Function description shown to the model.
    pub description: String,
    /// JSON schema for the arguments.
    pub parameters: serde_json::Value,
}

/// The six declared functions, matching the dispatcher's table.
pub fn function_declarations() -> Vec<FunctionDeclaration> {
    vec![
        FunctionDeclaration {
            name: ToolName::OpenUrl.as_str().to_string(),
            description: "Opens a specific website, Google App, or search query in a new tab."
                .to_string(),
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "url": {
                        "type": "STRING",
                        "description": "The full URL to open (e.g., https://mail.google.com, https://youtube.com/results?search_query=...)"
                    }
                },
                "required": ["url"]
            }),
        },
        FunctionDeclaration {
            name: ToolName::MakeCall.as_str().to_string(),
            description: "Initiates a phone call to a specific name or number.".to_string(),
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "number": { "type": "STRING", "description": "The phone number to call." },
                    "name": { "type": "STRING", "description": "The name of the contact." }
                },
                "required": ["number"]
            }),
        },
        FunctionDeclaration {
            name: ToolName::SendMessage.as_str().to_string(),
            description: "Prepares an SMS message.".to_string(),
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "number": { "type": "STRING", "description": "The phone number." },
                    "message": { "type": "STRING", "description": "The message body." }
                },
                "required": ["number", "message"]
            }),
        },
        FunctionDeclaration {
            name: ToolName::GetDeviceTime.as_str().to_string(),
            description: "Gets the current accurate date and time from the user's device."
                .to_string(),
            parameters: json!({ "type": "OBJECT", "properties": {} }),
        },
        FunctionDeclaration {
            name: ToolName::GetContacts.as_str().to_string(),
            description: "Retrieves the list of saved contacts.".to_string(),
            parameters: json!({ "type": "OBJECT", "properties": {} }),
        },
        FunctionDeclaration {
            name: ToolName::ManageSchedule.as_str().to_string(),
            description: "Manages the user's schedule. Can add events or list events.".to_string(),
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "action": {
                        "type": "STRING",
                        "enum": ["add", "list"],
                        "description": "The action to perform."
                    },
                    "event": {
                        "type": "STRING",
                        "description": "Description of the event (required for 'add')."
                    },
                    "time": {
                        "type": "STRING",
                        "description": "Time of the event (required for 'add')."
                    }
                },
                "required": ["action"]
            }),
        },
    ]
}
