//! Endpoint table of the PHP service

// Session
pub const LOGIN: &str = "loginApp.php";
pub const REGISTER: &str = "guardarUsuario.php";
pub const USER_BY_ID: &str = "consultarUsuario.php";

// Classes
pub const CREATE_CLASS: &str = "guardarClases.php";
pub const JOIN_CLASS: &str = "guardarClasesEstudiantes.php";
pub const TAUGHT_CLASSES: &str = "consultarClaseIdUsuario.php";
pub const ENROLLED_CLASSES: &str = "consultarClasesEstudianteIdEstudiante.php";
pub const CLASS_BY_ID: &str = "consultarClase.php";
pub const CLASS_ROSTER: &str = "consultarAlumnosPorClase.php";
pub const EXPEL_STUDENT: &str = "eliminarClasesEstudiantes.php";

// Topics
pub const LIST_TOPICS: &str = "consultarTemasClase.php";
pub const CREATE_TOPIC: &str = "guardarTema.php";
pub const UPDATE_TOPIC: &str = "modificarTema.php";
pub const DELETE_TOPIC: &str = "eliminarTema.php";

// Tasks
pub const LIST_TASKS: &str = "consultarTareasClases.php";
pub const CREATE_TASK: &str = "guardarTarea.php";
pub const UPDATE_TASK: &str = "modificarTarea.php";
pub const DELETE_TASK: &str = "eliminarTarea.php";
pub const LIST_TASK_FILES: &str = "consultarArchivoTareasporTarea.php";
pub const UPLOAD_TASK_FILE: &str = "guardarArchivoTarea.php";
pub const DELETE_TASK_FILE: &str = "eliminarArchivoTareas.php";
pub const LIST_TASK_LINKS: &str = "consultarEnlaceTareaPorTarea.php";
pub const CREATE_TASK_LINK: &str = "guardarEnlaceTarea.php";
pub const DELETE_TASK_LINK: &str = "eliminarEnlaceTarea.php";

// Submissions
pub const LIST_SUBMISSIONS: &str = "consultarHistorialTareasPorTarea.php";
pub const UPLOAD_SUBMISSION: &str = "guardarHistorialArchivoTarea.php";
pub const DELETE_SUBMISSION: &str = "eliminarHistorialTareas.php";

// Materials
pub const LIST_MATERIALS: &str = "consultarMaterialIdTema.php";
pub const CREATE_MATERIAL: &str = "guardarMaterial.php";
pub const UPDATE_MATERIAL: &str = "modificarMaterial.php";
pub const DELETE_MATERIAL: &str = "eliminarMaterial.php";
pub const LIST_MATERIAL_FILES: &str = "consultarArchivosMaterialIdMaterial.php";
pub const UPLOAD_MATERIAL_FILE: &str = "guardarArchivosMaterial.php";
pub const DELETE_MATERIAL_FILE: &str = "eliminarArchivosMaterial.php";
pub const LIST_MATERIAL_LINKS: &str = "consultarEnlaceMaterialPorMaterial.php";
pub const CREATE_MATERIAL_LINK: &str = "guardarEnlaceMaterial.php";
pub const DELETE_MATERIAL_LINK: &str = "eliminarEnlaceMaterial.php";

// Quizzes
pub const LIST_QUIZZES: &str = "consultarCuestionarioPorTema.php";
pub const CREATE_QUIZ: &str = "guardarCuestionario.php";
pub const UPDATE_QUIZ: &str = "modificarCuestionario.php";
pub const DELETE_QUIZ: &str = "eliminarCuestionario.php";
pub const LIST_QUESTIONS: &str = "consultarCuestionariosContenido.php";
pub const CREATE_QUESTION: &str = "guardarCuestionariosContenido.php";
pub const UPDATE_QUESTION: &str = "modificarCuestionariosContenido.php";
pub const DELETE_QUESTION: &str = "eliminarCuestionariosContenido.php";
pub const LIST_QUIZ_ATTEMPTS: &str = "consultarHistorialCuestionarioPorCuestionario.php";
pub const RECORD_QUIZ_ATTEMPT: &str = "guardarHistorialCuestionario.php";

// Comments
pub const LIST_COMMENTS: &str = "consultarComentarios.php";
pub const CREATE_COMMENT: &str = "guardarComentario.php";
pub const DELETE_COMMENT: &str = "eliminarComentario.php";

// Announcements
pub const LIST_ANNOUNCEMENTS: &str = "consultarAnunciosArchivosEnlaces.php";
pub const CREATE_ANNOUNCEMENT: &str = "guardarAnuncio.php";
pub const DELETE_ANNOUNCEMENT: &str = "eliminarAnuncio.php";
pub const LIST_ANNOUNCEMENT_FILES: &str = "consultarArchivoAnunciosPorAnuncio.php";
pub const UPLOAD_ANNOUNCEMENT_FILE: &str = "guardarArchivoAnuncio.php";
pub const DELETE_ANNOUNCEMENT_FILE: &str = "eliminarArchivoAnuncio.php";
pub const LIST_ANNOUNCEMENT_LINKS: &str = "consultarEnlacesAnuncioIdAnuncios.php";
pub const CREATE_ANNOUNCEMENT_LINK: &str = "guardarEnlacesAnuncios.php";
pub const DELETE_ANNOUNCEMENT_LINK: &str = "eliminarEnlacesAnuncios.php";

// Downloads
pub const DOWNLOAD_MATERIAL_FILE: &str = "descargarArchivoMaterial.php";
pub const DOWNLOAD_TASK_FILE: &str = "descargarArchivoTarea.php";
pub const DOWNLOAD_SUBMISSION_FILE: &str = "descargarArchivoHistorial.php";
