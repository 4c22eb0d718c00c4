//! Query parameters shared by listing endpoints

use crate::entities::Role;
use serde::{Deserialize, Serialize};

/// Filters for `GET /users`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UserQuery {
    pub role: Option<Role>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

/// Filters for `GET /doctors`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct DoctorQuery {
    pub specialization: Option<String>,
    pub search: Option<String>,
}

/// Builds a `LIKE` pattern matching `term` anywhere, escaping wildcards
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" neem "), "%neem%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }
}
