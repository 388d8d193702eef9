//! Device tool surface exposed to the model: declarations, the dispatch
//! table, and the device-side collaborators the tools act on.

pub mod declarations;
pub mod device;
pub mod dispatcher;

pub use declarations::{function_declarations, FunctionDeclaration, ToolName, SYSTEM_INSTRUCTION};
pub use device::{
    ActionHandler, Contact, ContactsProvider, LoggingActions, MockContacts, ScheduleEntry,
    ScheduleStore, ToolError,
};
pub use dispatcher::{ToolCall, ToolDispatcher, ToolResult};
