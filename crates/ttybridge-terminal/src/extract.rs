// Response extraction: raw terminal output in, the program's own reply out.

use super::filter::strip_ansi;

/// Box-drawing range used by the CLI's framed UI.
fn is_box_drawing(c: char) -> bool {
    matches!(c, '\u{2500}'..='\u{257F}')
}

/// A line that is nothing but a bare prompt token.
fn is_prompt_token(line: &str) -> bool {
    matches!(line, ">" | "$" | "Human:")
}

/// Extract the reply from one exchange's raw terminal output.
///
/// The tty echoes typed input, so everything up to and including the first
/// verbatim occurrence of the outbound message is discarded. Lines that are
/// a bare prompt token or pure box-drawing are artifacts of the input frame
/// and dropped as well. An empty result is a valid (if unhelpful) reply,
/// not an error.
pub fn extract_response(raw: &str, sent: &str) -> String {
    let clean = strip_ansi(raw);

    let body = match clean.find(sent) {
        Some(idx) => &clean[idx + sent.len()..],
        None => clean.as_str(),
    };

    let mut kept: Vec<&str> = Vec::new();
    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        let t = line.trim();
        if is_prompt_token(t) {
            continue;
        }
        if !t.is_empty() && t.chars().all(|c| is_box_drawing(c) || c.is_whitespace()) {
            continue;
        }
        kept.push(line);
    }

    kept.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_echo_and_trailing_prompt() {
        let raw = "hello\r\nhi there\r\n> ";
        assert_eq!(extract_response(raw, "hello"), "hi there");
    }

    #[test]
    fn keeps_output_when_no_echo_present() {
        let raw = "spontaneous output\nmore text\n";
        assert_eq!(extract_response(raw, "unseen"), "spontaneous output\nmore text");
    }

    #[test]
    fn drops_prompt_tokens_and_box_lines() {
        let raw = concat!(
            "what is 2+2?\r\n",
            "╭────────────╮\r\n",
            "The answer is 4.\r\n",
            "╰────────────╯\r\n",
            ">\r\n",
            "$\r\n",
            "Human:\r\n",
        );
        assert_eq!(extract_response(raw, "what is 2+2?"), "The answer is 4.");
    }

    #[test]
    fn strips_ansi_before_matching_echo() {
        let raw = "\x1b[1mping\x1b[0m\r\n\x1b[32mpong\x1b[0m\r\n> ";
        assert_eq!(extract_response(raw, "ping"), "pong");
    }

    #[test]
    fn cuts_at_first_occurrence_only() {
        let raw = "tok\r\na reply that repeats tok verbatim\r\n> ";
        assert_eq!(extract_response(raw, "tok"), "a reply that repeats tok verbatim");
    }

    #[test]
    fn empty_remainder_is_a_valid_reply() {
        assert_eq!(extract_response("hello\r\n> ", "hello"), "");
        assert_eq!(extract_response("", "anything"), "");
    }
}
