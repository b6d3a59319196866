//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// Unknown braces (e.g. JSON examples inside a prompt) are left untouched.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Keep only printable ASCII, then trim.
/// Lossy on purpose: accented or non-Latin input is dropped, not rejected.
pub fn sanitize_free_text(s: &str) -> String {
  s.chars()
    .filter(|c| (' '..='~').contains(c))
    .collect::<String>()
    .trim()
    .to_string()
}

/// Remove Markdown code fence markers anywhere in the text and trim.
pub fn strip_code_fences(s: &str) -> String {
  s.replace("```json", "").replace("```", "").trim().to_string()
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let head: String = s.chars().take(max).collect();
    format!("{}… ({} bytes total)", head, s.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fill_template_replaces_known_keys_only() {
    let out = fill_template("{a} and {b} but not {\"id\": 1}", &[("a", "x"), ("b", "y")]);
    assert_eq!(out, "x and y but not {\"id\": 1}");
  }

  #[test]
  fn sanitize_drops_non_ascii_and_control_chars() {
    assert_eq!(sanitize_free_text("  Phýsics\t 101 "), "Phsics 101");
    assert_eq!(sanitize_free_text("化学"), "");
  }

  #[test]
  fn fences_are_removed() {
    assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
    assert_eq!(strip_code_fences("  [2] "), "[2]");
  }

  #[test]
  fn truncation_is_char_safe() {
    assert_eq!(trunc_for_log("short", 10), "short");
    assert!(trunc_for_log("ééééé", 2).starts_with("éé…"));
  }
}
