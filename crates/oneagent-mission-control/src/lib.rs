//! The Mission-Control WebSocket: channel registry, subscription
//! bookkeeping, mission execution, and the WS transport itself.

#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]
#![deny(unsafe_code)]

mod channel;
mod frames;
mod mission;
mod subscription;
mod ws;

pub use channel::{register_builtin_channels, Channel, ChannelContext, ChannelRegistry, PassiveChannel, BUILTIN_CHANNEL_NAMES};
pub use frames::{FrameBuilder, FrameServerInfo, IdGenerator, MISSION_CONTROL_PROTOCOL_VERSION};
pub use mission::{parse_mission_command, MissionExecutor, MissionStatus};
pub use subscription::{ConnectionId, OutboundSender, Subscription, SubscriptionManager};
pub use ws::{router, MissionControlState, HEARTBEAT_INTERVAL, MISSED_HEARTBEAT_CLOSE_FACTOR};
