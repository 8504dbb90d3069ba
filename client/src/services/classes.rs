//! Classes service
//!
//! Class lists, creation, enrolment and rosters. Whether the viewer
//! teaches a class is answered from the cached list of taught classes,
//! refreshed when the viewer creates a class.

use super::cache::{CollectionCache, EntityCache};
use super::sync::required;
use crate::error::{AppError, Result};
use crate::models::*;
use crate::remote::{ClassDraft, RemoteGateway, Removable};
use std::sync::Arc;

pub struct ClassesService {
    gateway: RemoteGateway,
    taught: CollectionCache<String, ClassInfo>,
    enrolled: CollectionCache<String, ClassInfo>,
}

impl ClassesService {
    pub fn new(gateway: RemoteGateway) -> Self {
        Self {
            gateway,
            taught: EntityCache::new(),
            enrolled: EntityCache::new(),
        }
    }

    pub async fn taught_classes(&self, user_id: &str) -> Result<Arc<Vec<ClassInfo>>> {
        let gateway = &self.gateway;
        self.taught
            .ensure_loaded(user_id.to_string(), move || async move {
                Ok(Arc::new(gateway.taught_classes(user_id).await?))
            })
            .await
    }

    pub async fn enrolled_classes(&self, user_id: &str) -> Result<Arc<Vec<ClassInfo>>> {
        let gateway = &self.gateway;
        self.enrolled
            .ensure_loaded(user_id.to_string(), move || async move {
                Ok(Arc::new(gateway.enrolled_classes(user_id).await?))
            })
            .await
    }

    /// Membership of `class_id` in the user's taught classes
    pub async fn is_teacher_of(&self, user_id: &str, class_id: &str) -> Result<bool> {
        let taught = self.taught_classes(user_id).await?;
        Ok(taught.iter().any(|c| c.id == class_id))
    }

    /// Role of the user in a class
    pub async fn role_in(&self, user_id: &str, class_id: &str) -> Result<ClassRole> {
        if self.is_teacher_of(user_id, class_id).await? {
            Ok(ClassRole::Teacher)
        } else {
            Ok(ClassRole::Student)
        }
    }

    pub async fn create_class(&self, user_id: &str, draft: &ClassDraft) -> Result<()> {
        let draft = ClassDraft {
            name: required(&draft.name, "Completa todos los campos")?,
            subject: required(&draft.subject, "Completa todos los campos")?,
            description: required(&draft.description, "Completa todos los campos")?,
            code: required(&draft.code, "Completa todos los campos")?,
        };
        if !is_known_user(user_id) {
            return Err(AppError::Validation("Sesión inválida".to_string()));
        }

        tracing::info!("Creating class: {}", draft.name);
        self.gateway.create_class(user_id, &draft).await?;
        self.taught.invalidate(&user_id.to_string());
        Ok(())
    }

    pub async fn join_class(&self, user_id: &str, code: &str) -> Result<()> {
        let code = required(code, "Ingresa el código")?;
        if !is_known_user(user_id) {
            return Err(AppError::Validation("Sesión inválida".to_string()));
        }

        tracing::info!("User {} joining class with code {}", user_id, code);
        self.gateway.join_class(user_id, &code).await?;
        self.enrolled.invalidate(&user_id.to_string());
        Ok(())
    }

    pub async fn roster(&self, class_id: &str) -> Result<Vec<Enrollment>> {
        self.gateway.roster(class_id).await
    }

    /// Remove a student from the class (teacher only)
    pub async fn expel(&self, role: ClassRole, relation_id: &str) -> Result<()> {
        if !role.is_teacher() {
            return Err(AppError::NotAuthorized("expel students".to_string()));
        }
        tracing::info!("Expelling enrolment {}", relation_id);
        self.gateway.delete(Removable::Enrollment, relation_id).await
    }

    pub async fn class_header(&self, class_id: &str) -> Result<Option<ClassInfo>> {
        self.gateway.class_by_id(class_id).await
    }

    /// Name of the teacher named by the class header
    pub async fn teacher_name(&self, class_id: &str) -> Result<Option<String>> {
        let owner = match self.class_header(class_id).await?.and_then(|c| c.owner_id) {
            Some(owner) => owner,
            None => return Ok(None),
        };
        let user = self.gateway.user_by_id(&owner).await?;
        Ok(user.map(|u| u.name).filter(|n| !n.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::endpoints as ep;
    use crate::remote::scripted::ScriptedTransport;

    fn draft() -> ClassDraft {
        ClassDraft {
            name: "Historia".to_string(),
            subject: "Sociales".to_string(),
            description: "Primer curso".to_string(),
            code: "HIS-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_teacher_check_is_memoized() {
        let transport = ScriptedTransport::new();
        transport.reply(ep::TAUGHT_CLASSES, r#"[{"id_clase":"3","nombre":"Historia"},{"idClase":4}]"#);
        let service = ClassesService::new(RemoteGateway::new(transport.clone()));

        assert!(service.is_teacher_of("5", "3").await.unwrap());
        assert!(service.is_teacher_of("5", "4").await.unwrap());
        assert!(!service.is_teacher_of("5", "7").await.unwrap());
        assert_eq!(service.role_in("5", "7").await.unwrap(), ClassRole::Student);
        assert_eq!(transport.count(ep::TAUGHT_CLASSES), 1);
    }

    #[tokio::test]
    async fn test_teacher_role_recovers_after_failed_lookup() {
        let transport = ScriptedTransport::new();
        transport.fail(ep::TAUGHT_CLASSES, "timeout");
        let service = ClassesService::new(RemoteGateway::new(transport.clone()));

        assert!(service.is_teacher_of("5", "3").await.is_err());
        assert!(service.role_in("5", "3").await.is_err());

        transport.reply(ep::TAUGHT_CLASSES, r#"[{"id_clase":3,"nombre":"Historia"}]"#);
        assert_eq!(service.role_in("5", "3").await.unwrap(), ClassRole::Teacher);
        assert_eq!(transport.count(ep::TAUGHT_CLASSES), 3);

        assert!(service.is_teacher_of("5", "3").await.unwrap());
        assert_eq!(transport.count(ep::TAUGHT_CLASSES), 3);
    }

    #[tokio::test]
    async fn test_create_class_refreshes_taught_list() {
        let transport = ScriptedTransport::new();
        transport.reply(ep::TAUGHT_CLASSES, "[]");
        transport.reply(ep::CREATE_CLASS, "Clase creada");
        let service = ClassesService::new(RemoteGateway::new(transport.clone()));

        assert!(!service.is_teacher_of("5", "3").await.unwrap());
        service.create_class("5", &draft()).await.unwrap();

        transport.reply(ep::TAUGHT_CLASSES, r#"[{"id":3}]"#);
        assert!(service.is_teacher_of("5", "3").await.unwrap());
        assert_eq!(transport.count(ep::TAUGHT_CLASSES), 2);
    }

    #[tokio::test]
    async fn test_create_class_requires_every_field() {
        let transport = ScriptedTransport::new();
        let service = ClassesService::new(RemoteGateway::new(transport.clone()));

        let blank_code = ClassDraft {
            code: " ".to_string(),
            ..draft()
        };
        let err = service.create_class("5", &blank_code).await.unwrap_err();
        assert_eq!(err.to_string(), "Completa todos los campos");
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_join_requires_code() {
        let transport = ScriptedTransport::new();
        let service = ClassesService::new(RemoteGateway::new(transport.clone()));
        let err = service.join_class("9", "").await.unwrap_err();
        assert_eq!(err.to_string(), "Ingresa el código");
    }

    #[tokio::test]
    async fn test_only_teacher_expels() {
        let transport = ScriptedTransport::new();
        transport.reply(ep::EXPEL_STUDENT, "ok");
        let service = ClassesService::new(RemoteGateway::new(transport.clone()));

        assert!(service.expel(ClassRole::Student, "11").await.is_err());
        service.expel(ClassRole::Teacher, "11").await.unwrap();
        assert_eq!(transport.count(ep::EXPEL_STUDENT), 1);
    }

    #[tokio::test]
    async fn test_teacher_name_from_header() {
        let transport = ScriptedTransport::new();
        transport.reply(ep::CLASS_BY_ID, r#"[{"id":3,"nombre":"Historia","id_usuario":5}]"#);
        transport.reply(ep::USER_BY_ID, r#"[{"id":5,"nombre":"Profe Ruiz"}]"#);
        let service = ClassesService::new(RemoteGateway::new(transport.clone()));

        assert_eq!(
            service.teacher_name("3").await.unwrap().as_deref(),
            Some("Profe Ruiz")
        );
    }
}
