//! Giving a copied template descriptor its own identity.
//!
//! A verbatim copy of the template carries the template's display name, BIOS and location
//! UUIDs and generated MAC addresses. Two VMs created from the same template then collide
//! on those identifiers. [`rewrite_identity`] sets the display name and drops the generated
//! identifiers so the virtualization tool assigns fresh ones on first power-on.

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Keys that the virtualization tool regenerates when they are missing.
const GENERATED_KEYS: &[&str] = &["uuid.bios", "uuid.location", "vc.uuid"];

/// Per-NIC keys, matched as `ethernet<N>.<suffix>`.
const GENERATED_NIC_SUFFIXES: &[&str] = &["generatedaddress", "generatedaddressoffset"];

const DISPLAY_NAME_KEY: &str = "displayName";

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Returns a copy of `template` personalized for a VM called `name`.
///
/// Lines are rewritten in place and keep their original line endings. If the template has
/// no `displayName` entry, one is appended.
pub fn rewrite_identity(template: &[u8], name: &str) -> Vec<u8> {
    let mut output = Vec::with_capacity(template.len() + name.len());
    let mut wrote_display_name = false;
    let mut newline: &[u8] = b"\n";

    for line in template.split_inclusive(|b| *b == b'\n') {
        let (content, ending) = split_line_ending(line);
        if ending == b"\r\n" {
            newline = b"\r\n";
        }

        let Some(key) = line_key(content) else {
            output.extend_from_slice(line);
            continue;
        };

        if key.eq_ignore_ascii_case(DISPLAY_NAME_KEY) {
            if !wrote_display_name {
                output.extend_from_slice(display_name_line(name).as_bytes());
                output.extend_from_slice(ending);
                wrote_display_name = true;
            }
            continue;
        }

        if is_generated_key(&key) {
            continue;
        }

        output.extend_from_slice(line);
    }

    if !wrote_display_name {
        if !output.is_empty() && !output.ends_with(b"\n") {
            output.extend_from_slice(newline);
        }
        output.extend_from_slice(display_name_line(name).as_bytes());
        output.extend_from_slice(newline);
    }

    output
}

/// Escapes a value the way `.vmx` files encode special characters (`|` followed by hex).
fn encode_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => encoded.push_str("|22"),
            '|' => encoded.push_str("|7C"),
            '#' => encoded.push_str("|23"),
            c => encoded.push(c),
        }
    }
    encoded
}

fn display_name_line(name: &str) -> String {
    format!("{DISPLAY_NAME_KEY} = \"{}\"", encode_value(name))
}

fn split_line_ending(line: &[u8]) -> (&[u8], &[u8]) {
    if let Some(content) = line.strip_suffix(b"\r\n") {
        (content, &line[content.len()..])
    } else if let Some(content) = line.strip_suffix(b"\n") {
        (content, &line[content.len()..])
    } else {
        (line, &line[line.len()..])
    }
}

/// The key of a `key = value` line, or `None` for comments and other lines.
fn line_key(content: &[u8]) -> Option<String> {
    let eq = content.iter().position(|b| *b == b'=')?;
    let key = content[..eq].trim_ascii();
    if key.is_empty() || key.starts_with(b"#") {
        return None;
    }
    Some(String::from_utf8_lossy(key).into_owned())
}

fn is_generated_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    if GENERATED_KEYS.contains(&key.as_str()) {
        return true;
    }

    let Some(rest) = key.strip_prefix("ethernet") else {
        return false;
    };

    match rest.split_once('.') {
        Some((index, suffix)) => {
            !index.is_empty()
                && index.bytes().all(|b| b.is_ascii_digit())
                && GENERATED_NIC_SUFFIXES.contains(&suffix)
        }
        None => false,
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
