const RESERVED_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

const RESERVED_SUFFIX: &str = "_file";

/// Makes a user-supplied target name safe to create inside a single folder.
pub fn sanitize_filename(value: &str) -> String {
    let replaced: String = value
        .chars()
        .map(|ch| if is_unsafe_char(ch) { '_' } else { ch })
        .collect();

    let trimmed = replaced.trim_end_matches([' ', '.']).trim();
    if trimmed.is_empty() {
        return "untitled".to_string();
    }

    let (device, rest) = match trimmed.find('.') {
        Some(pos) => trimmed.split_at(pos),
        None => (trimmed, ""),
    };
    if is_reserved_device(device) {
        return format!("{device}{RESERVED_SUFFIX}{rest}");
    }

    trimmed.to_string()
}

fn is_unsafe_char(ch: char) -> bool {
    matches!(ch, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || ch.is_control()
}

fn is_reserved_device(stem: &str) -> bool {
    RESERVED_DEVICE_NAMES
        .iter()
        .any(|reserved| stem.eq_ignore_ascii_case(reserved))
}
