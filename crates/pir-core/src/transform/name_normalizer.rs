use heck::ToSnakeCase;

/// Convert an OpenAPI property or parameter name into an attribute
/// identifier: snake_case, ASCII alphanumerics and `_`, never starting
/// with a digit.
///
/// Examples:
/// - `petId` → `pet_id`
/// - `pet-store` → `pet_store`
/// - `3dModel` → `_3d_model`
pub fn to_identifier(name: &str) -> String {
    let sanitized = sanitize_identifier(name);
    let snake = sanitized.to_snake_case();
    if snake.is_empty() {
        return "unnamed".to_string();
    }
    if snake.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{snake}")
    } else {
        snake
    }
}

/// Whether `name` is already a valid attribute identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Replace runs of non-alphanumeric characters with a single separator.
fn sanitize_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut prev_was_separator = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if prev_was_separator && !result.is_empty() {
                result.push('_');
            }
            result.push(ch);
            prev_was_separator = false;
        } else {
            prev_was_separator = true;
        }
    }

    result
}
