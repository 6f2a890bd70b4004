const MAX_NAME_LENGTH: usize = 50;

pub const RESERVED_APP_NAMES: &[&str] = &["captain", "registry"];
pub const RESERVED_PROJECT_NAMES: &[&str] = &["root"];

/// Format check shared by apps, projects, volumes and tags:
/// lowercase letters, digits and single hyphens, starting with a letter
/// and ending with a letter or digit.
pub fn is_name_format_ok(name: &str) -> bool {
    if name.is_empty() || name.len() >= MAX_NAME_LENGTH {
        return false;
    }

    let starts_ok = name.chars().next().map_or(false, |c| c.is_ascii_lowercase());
    let ends_ok = name
        .chars()
        .last()
        .map_or(false, |c| c.is_ascii_lowercase() || c.is_ascii_digit());
    let chars_ok = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    starts_ok && ends_ok && chars_ok && !name.contains("--")
}

pub fn is_name_allowed_with(name: &str, reserved: &[&str]) -> bool {
    is_name_format_ok(name) && !reserved.contains(&name)
}

pub fn is_name_allowed(name: &str) -> bool {
    is_name_allowed_with(name, RESERVED_APP_NAMES)
}

pub fn is_project_name_allowed(name: &str) -> bool {
    is_name_allowed_with(name, RESERVED_PROJECT_NAMES)
}
