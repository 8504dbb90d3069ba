//! Remote service access
//!
//! `transport` moves bytes, `wire` reads the loosely-typed replies and
//! `gateway` exposes one typed method per resource.

pub mod download;
pub mod endpoints;
pub mod gateway;
pub mod transport;
pub mod wire;

#[cfg(test)]
pub(crate) mod scripted;

pub use download::{absolute_url, download_url, DownloadKind};
pub use gateway::{
    AttachmentOwner, ClassDraft, ContentDraft, QuestionDraft, RemoteGateway, Removable, TaskDraft,
};
pub use transport::{HttpTransport, Payload, RawResponse, Transport};
