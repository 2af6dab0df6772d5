use unicode_segmentation::UnicodeSegmentation;

/// Splits off the longest head of at most `limit` bytes, preferring line
/// break opportunities. The head is only empty when `s` is.
pub fn split_once(s: &str, limit: usize) -> (&str, &str) {
    if s.len() <= limit {
        return (s, "");
    }

    let breakpoints = unicode_linebreak::linebreaks(s).collect::<Vec<_>>();

    // Try to break on a mandatory line break location first.
    for &(i, opportunity) in breakpoints.iter().rev() {
        if opportunity != unicode_linebreak::BreakOpportunity::Mandatory {
            continue;
        }
        if i > 0 && i <= limit {
            return s.split_at(i);
        }
    }

    // Then, try to break on an allowed line break location.
    for &(i, opportunity) in breakpoints.iter().rev() {
        if opportunity != unicode_linebreak::BreakOpportunity::Allowed {
            continue;
        }
        if i > 0 && i <= limit {
            return s.split_at(i);
        }
    }

    // Failing that, break on a grapheme index instead.
    for (i, _) in s.grapheme_indices(true).rev() {
        if i > 0 && i <= limit {
            return s.split_at(i);
        }
    }

    // The first grapheme alone is wider than the limit.
    match s.grapheme_indices(true).nth(1) {
        Some((i, _)) => s.split_at(i),
        None => (s, ""),
    }
}

/// Wraps `text` into display lines of at most `width` bytes.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = vec![];

    for paragraph in text.lines() {
        let mut rest = paragraph;
        if rest.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        while !rest.is_empty() {
            let (head, tail) = split_once(rest, width);
            let head = head.trim_end();
            if !head.is_empty() {
                lines.push(head.to_string());
            }
            rest = tail.trim_start();
        }
    }
    lines
}
