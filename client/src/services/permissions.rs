//! Permission resolution
//!
//! Pure: the viewer, the entity and the viewer's role in the class go in,
//! the four action flags come out. Nothing here reads session state or
//! touches the network.

use crate::models::{ClassRole, EntityKind};
use serde::Serialize;

/// Actions the viewer may take on one entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Permissions {
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_attach_file: bool,
    pub can_attach_link: bool,
}

impl Permissions {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Everything that can lock one attachment family of an entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockSignals {
    /// Lock flag reported by the service
    pub server: bool,
    /// Lock recorded locally after a successful attach
    pub local: bool,
    /// Attachments of this family already present
    pub existing: usize,
}

impl LockSignals {
    pub fn is_locked(&self) -> bool {
        self.server || self.local || self.existing > 0
    }
}

/// The entity being checked
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    pub kind: EntityKind,
    /// Blank or missing means nobody is the author
    pub author_id: Option<&'a str>,
    pub files: LockSignals,
    pub links: LockSignals,
}

impl<'a> Subject<'a> {
    pub fn new(kind: EntityKind, author_id: Option<&'a str>) -> Self {
        Self {
            kind,
            author_id,
            files: LockSignals::default(),
            links: LockSignals::default(),
        }
    }

    pub fn with_locks(mut self, files: LockSignals, links: LockSignals) -> Self {
        self.files = files;
        self.links = links;
        self
    }
}

/// Author of class-wide content: the class owner.
///
/// A teacher viewing their own class is the owner; otherwise the owner
/// is whoever the class header names.
pub fn class_content_author<'a>(
    viewer_id: &'a str,
    role: ClassRole,
    class_owner: Option<&'a str>,
) -> Option<&'a str> {
    if role.is_teacher() {
        Some(viewer_id)
    } else {
        class_owner
    }
}

pub fn is_author(viewer_id: &str, author_id: Option<&str>) -> bool {
    let viewer = viewer_id.trim();
    match author_id.map(str::trim) {
        Some(author) => !author.is_empty() && !viewer.is_empty() && author == viewer,
        None => false,
    }
}

pub fn resolve(viewer_id: &str, subject: &Subject, role: ClassRole) -> Permissions {
    let teacher = role.is_teacher();
    let author = is_author(viewer_id, subject.author_id);

    let manage = match subject.kind {
        kind if kind.is_administrative() => teacher,
        EntityKind::Announcement | EntityKind::AttachmentFile | EntityKind::AttachmentLink => {
            teacher || author
        }
        // Comments and submissions belong to whoever wrote them
        _ => author,
    };

    let attachable = subject.kind.accepts_attachments() && author;

    Permissions {
        can_edit: manage,
        can_delete: manage,
        can_attach_file: attachable && !subject.files.is_locked(),
        can_attach_link: attachable && !subject.links.is_locked(),
    }
}
