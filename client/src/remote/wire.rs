//! Wire-format readers
//!
//! The service names the same field differently depending on the
//! endpoint (`id_clase`, `idClase`, `id`) and sends ids as numbers or
//! strings at will. Everything is read through `WireObject`, which tries
//! an ordered list of keys and normalizes scalars to text.

use crate::error::{AppError, Result};
use crate::models::*;
use crate::text::plain_text;
use serde_json::{Map, Value};

pub const CLASS_ID_KEYS: &[&str] = &["id_clase", "idClase", "id"];
pub const AUTHOR_ID_KEYS: &[&str] = &["id_usuario", "idUsuario", "autor_id"];
const ID_KEYS: &[&str] = &["id"];

/// Borrowed view over one JSON object of a reply
#[derive(Debug, Clone, Copy)]
pub struct WireObject<'a>(&'a Map<String, Value>);

impl<'a> WireObject<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self(map)
    }

    /// First key holding a non-blank string or a number, as text
    pub fn id(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| scalar_text(self.0.get(*key)?))
    }

    /// First key holding any scalar, as trimmed text (may be empty)
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| match self.0.get(*key)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn text_or_empty(&self, keys: &[&str]) -> String {
        self.text(keys).unwrap_or_default()
    }

    pub fn number(&self, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|key| match self.0.get(*key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
    }

    /// Truthy values: `true`, non-zero numbers, "1", "true", "si"
    pub fn flag(&self, keys: &[&str]) -> bool {
        keys.iter().any(|key| match self.0.get(*key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(Value::String(s)) => {
                matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "si" | "sí")
            }
            _ => false,
        })
    }

    pub fn objects(&self, key: &str) -> Vec<WireObject<'a>> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_object)
                .map(WireObject::new)
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a reply expected to hold an array of objects.
///
/// Empty bodies and `null` count as an empty list; non-object entries
/// are skipped.
pub fn object_rows(body: &str) -> Result<Vec<Map<String, Value>>> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| AppError::Decode(format!("expected a JSON array: {}", e)))?;

    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect()),
        Value::Object(map) if map.is_empty() => Ok(Vec::new()),
        other => Err(AppError::Decode(format!(
            "expected a JSON array, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Ids that look numeric travel as JSON numbers, anything else as text
pub fn id_value(id: &str) -> Value {
    match id.trim().parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::from(id.trim()),
    }
}

/// New ids come back as plain text ("42") or as JSON (`{"id": 42}`).
pub fn parse_created_id(body: &str) -> Option<String> {
    let trimmed = body.trim().trim_matches('"').trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(body.trim()) {
        match &value {
            Value::Number(n) => return Some(n.to_string()),
            Value::String(s) => return non_blank_id(s),
            Value::Object(map) => {
                return WireObject::new(map).id(&["id", "insert_id", "id_insertado", "last_id"]);
            }
            _ => return None,
        }
    }

    non_blank_id(trimmed)
}

fn non_blank_id(text: &str) -> Option<String> {
    let t = text.trim();
    let looks_like_id = !t.is_empty() && t.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    looks_like_id.then(|| t.to_string())
}

/// A 2xx body that still reports failure (`{"status":"error"}`, `{"success":false}`)
pub fn reported_failure(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body.trim()).ok()?;
    let map = value.as_object()?;
    let obj = WireObject::new(map);

    let status_error = obj
        .text(&["status"])
        .is_some_and(|s| s.eq_ignore_ascii_case("error"));
    let explicit_false = ["success", "ok"]
        .iter()
        .any(|key| matches!(map.get(*key), Some(Value::Bool(false))));

    if status_error || explicit_false {
        Some(
            obj.text(&["message", "mensaje", "error"])
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "La operación fue rechazada".to_string()),
        )
    } else {
        None
    }
}

// ===== Domain conversions =====

pub fn class_info(obj: WireObject) -> Option<ClassInfo> {
    Some(ClassInfo {
        id: obj.id(CLASS_ID_KEYS)?,
        name: plain_text(&obj.text_or_empty(&["nombre", "nombre_clase"])),
        code: obj.text_or_empty(&["codigo"]),
        subject: obj.text(&["materia"]).filter(|s| !s.is_empty()),
        description: obj.text(&["descripcion"]).filter(|s| !s.is_empty()),
        owner_id: obj.id(&["id_usuario", "idUsuario", "id_profesor"]),
    })
}

pub fn enrollment(obj: WireObject) -> Option<Enrollment> {
    Some(Enrollment {
        relation_id: obj.id(ID_KEYS)?,
        user_id: obj.id(&["id_usuario", "id_estudiante", "idUsuario"]),
        name: obj
            .text(&["nombre"])
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Sin nombre".to_string()),
    })
}

pub fn user_summary(obj: WireObject) -> Option<UserSummary> {
    Some(UserSummary {
        id: obj.id(&["id", "id_usuario"])?,
        name: obj.text_or_empty(&["nombre"]),
        email: obj.text(&["email"]).filter(|s| !s.is_empty()),
        role: obj.text(&["rol"]).filter(|s| !s.is_empty()),
    })
}

pub fn topic(obj: WireObject, class_id: &str) -> Option<Topic> {
    Some(Topic {
        id: obj.id(ID_KEYS)?,
        class_id: obj
            .id(&["id_clase", "idClase"])
            .unwrap_or_else(|| class_id.to_string()),
        title: plain_text(&obj.text_or_empty(&["titulo", "title"])),
    })
}

pub fn task(obj: WireObject, class_id: &str) -> Option<Task> {
    Some(Task {
        id: obj.id(ID_KEYS)?,
        topic_id: obj.id(&["id_tema", "idTema"]).unwrap_or_default(),
        class_id: obj
            .id(&["id_clase", "idClase"])
            .unwrap_or_else(|| class_id.to_string()),
        title: plain_text(&obj.text_or_empty(&["titulo"])),
        description: obj.text_or_empty(&["descripcion"]),
        points: obj.number(&["valor"]).unwrap_or(0.0),
        due_at: obj.text_or_empty(&["fecha_entrega"]),
    })
}

pub fn submission(obj: WireObject, task_id: &str) -> Option<Submission> {
    Some(Submission {
        id: obj.id(ID_KEYS)?,
        task_id: obj
            .id(&["id_tareas", "id_tarea"])
            .unwrap_or_else(|| task_id.to_string()),
        user_id: obj.id(&["id_usuario", "idUsuario"]).unwrap_or_default(),
        file_name: obj.text(&["nombre"]).filter(|s| !s.is_empty()),
        url: obj.text_or_empty(&["url", "ruta"]),
        submitted_at: obj.text(&["fecha"]).filter(|s| !s.is_empty()),
        grade: obj.text(&["calificacion"]).filter(|s| !s.is_empty()),
    })
}

pub fn material(obj: WireObject, topic_id: &str) -> Option<Material> {
    Some(Material {
        id: obj.id(ID_KEYS)?,
        topic_id: obj
            .id(&["id_tema", "idTema"])
            .unwrap_or_else(|| topic_id.to_string()),
        title: plain_text(&obj.text_or_empty(&["titulo"])),
        description: obj.text_or_empty(&["descripcion"]),
    })
}

pub fn quiz(obj: WireObject, topic_id: &str) -> Option<Quiz> {
    Some(Quiz {
        id: obj.id(ID_KEYS)?,
        topic_id: obj
            .id(&["id_tema", "idTema"])
            .unwrap_or_else(|| topic_id.to_string()),
        class_id: obj.id(&["id_clase", "idClase"]).unwrap_or_default(),
        title: plain_text(&obj.text_or_empty(&["titulo"])),
        description: obj.text_or_empty(&["descripcion"]),
    })
}

pub fn question(obj: WireObject) -> Option<Question> {
    let options = ["opcion1", "opcion2", "opcion3", "opcion4"]
        .iter()
        .filter_map(|key| obj.text(&[*key]))
        .filter(|o| !o.is_empty())
        .collect();

    Some(Question {
        id: obj.id(ID_KEYS)?,
        quiz_id: obj.id(&["id_cuestionario"]).unwrap_or_default(),
        prompt: obj.text_or_empty(&["pregunta"]),
        options,
        answer: obj.text_or_empty(&["respuesta"]),
    })
}

pub fn quiz_attempt(obj: WireObject, quiz_id: &str) -> Option<QuizAttempt> {
    Some(QuizAttempt {
        id: obj.id(ID_KEYS)?,
        quiz_id: obj
            .id(&["id_cuestionario"])
            .unwrap_or_else(|| quiz_id.to_string()),
        user_id: obj.id(&["id_usuario", "idUsuario"]).unwrap_or_default(),
        score: obj.text_or_empty(&["calificacion"]),
        taken_at: obj.text(&["fecha"]).filter(|s| !s.is_empty()),
    })
}

pub fn file_attachment(obj: WireObject, parent_keys: &[&str], parent_id: &str) -> Option<FileAttachment> {
    Some(FileAttachment {
        id: obj.id(ID_KEYS)?,
        parent_id: obj.id(parent_keys).unwrap_or_else(|| parent_id.to_string()),
        name: obj
            .text(&["nombre", "archivo_nombre"])
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "archivo".to_string()),
        url: obj.text_or_empty(&["url", "ruta"]),
        uploaded_at: obj.text(&["fecha"]).filter(|s| !s.is_empty()),
    })
}

pub fn link(obj: WireObject, parent_keys: &[&str], parent_id: &str) -> Option<Link> {
    Some(Link {
        id: obj.id(ID_KEYS)?,
        parent_id: obj.id(parent_keys).unwrap_or_else(|| parent_id.to_string()),
        url: obj.text_or_empty(&["enlace", "url"]),
    })
}

pub fn comment(obj: WireObject) -> Option<Comment> {
    Some(Comment {
        id: obj.id(ID_KEYS)?,
        task_id: obj.id(&["id_tarea", "id_tareas"]).unwrap_or_default(),
        author_id: obj.id(&["id_usuario", "idUsuario"]).unwrap_or_default(),
        text: obj.text_or_empty(&["comentario", "texto", "contenido"]),
        posted_at: obj
            .text(&["fecha_comentario", "fecha"])
            .filter(|s| !s.is_empty()),
    })
}

pub fn announcement(obj: WireObject, class_id: &str) -> Option<Announcement> {
    let id = obj.id(ID_KEYS)?;
    let links = obj
        .objects("enlaces")
        .into_iter()
        .filter_map(|l| link(l, &["id_anuncios", "id_anuncio"], &id))
        .collect();

    Some(Announcement {
        class_id: obj
            .id(&["id_clase", "idClase"])
            .unwrap_or_else(|| class_id.to_string()),
        author_id: obj.id(AUTHOR_ID_KEYS),
        author_name: obj.text(&["nombre", "autor"]).filter(|s| !s.is_empty()),
        message: plain_text(&obj.text_or_empty(&["mensaje", "contenido"])),
        posted_at: obj.text(&["fecha"]).filter(|s| !s.is_empty()),
        links,
        server_locked: obj.flag(&["bloqueado"]),
        id,
    })
}
