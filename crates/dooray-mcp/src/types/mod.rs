// Typed Dooray payloads
//
// Most capability results are passed through as raw JSON. Only the shapes that
// are filtered or projected client side are modelled here.

mod messenger;
mod project;

pub use messenger::{Channel, ChannelParticipant, ChannelUsers, SimpleChannel};
pub use project::{Member, Post, PostSummary, PostUser, PostUsers, Workflow};
