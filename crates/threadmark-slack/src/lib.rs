pub mod client;
pub mod error;
pub mod traits;
pub mod types;

pub use client::SlackClient;
pub use error::{PlatformError, Result};
pub use traits::ChatPlatform;
pub use types::{
    slack_ts_to_datetime, Channel, CommandResponse, EventEnvelope, Message, MessageEvent,
    ResponseType, SlackEvent, SlashCommand,
};
