pub mod audit;
pub mod conversation;
pub mod job;
pub mod profile;
pub mod resource;
pub mod settings;

pub use audit::{AuditLog, AuditLogQuery, NewAuditLog};
pub use conversation::{
    AppendedMessage, Conversation, ConversationMessage, ConversationUpdate, MessageFeedback, NewMessage,
};
pub use job::{JobListing, JobQuery, NewJobListing};
pub use profile::{AdminProfile, PartnerProfile, Profile};
pub use resource::{KnowledgeResource, ResourceQuery};
pub use settings::PlatformSettings;
