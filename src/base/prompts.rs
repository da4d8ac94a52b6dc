//! Prompt templates for the downstream completion model.
//!
//! User-facing text is Spanish throughout, matching the deployment this
//! assistant serves. Logs and errors stay in English.

/// Wrap tracker facts and the original question into the instructional
/// prompt used for context-grounded answers.
pub fn tracker_context(user_message: &str, tracker_info: &str) -> String {
    format!(
        "Como asistente experto en Jira, analiza la siguiente información y responde de manera útil y clara:\n\n\
         Consulta del usuario: {user_message}\n\n\
         Información de Jira obtenida:\n{tracker_info}\n\n\
         Por favor, proporciona una respuesta útil basada en esta información. \
         Si hay errores o falta información, explícalo claramente."
    )
}

/// Wrap concatenated ticket snapshots into the summary instruction.
pub fn summarize(ticket_info: &str) -> String {
    format!("Por favor, haz un resumen general de la siguiente información de tickets de Jira.\n\n{ticket_info}")
}
