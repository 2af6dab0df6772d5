//! Best-effort structured reading of a free-text classification.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Severity::Minor => "Minor",
            Severity::Moderate => "Moderate",
            Severity::Severe => "Severe",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Verdict {
    pub damaged: Option<bool>,
    pub severity: Option<Severity>,
}

static NOT_DAMAGED_REGEX: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(r"(?i)\b(not|no|un)[\s-]*damaged?\b").unwrap());

static DAMAGED_REGEX: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(r"(?i)\bdamaged?\b").unwrap());

static SEVERITY_REGEX: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(r"(?i)\b(minor|moderate|severe)\b").unwrap());

impl Verdict {
    /// Whichever verdict keyword appears first decides: a negation such as
    /// "not damaged" only counts when it precedes any "damaged" or severity.
    pub fn parse(text: &str) -> Self {
        let negation = NOT_DAMAGED_REGEX.find(text);
        let positive = DAMAGED_REGEX
            .find_iter(text)
            .find(|m| negation.map_or(true, |n| m.start() < n.start() || m.start() >= n.end()));
        let severity = SEVERITY_REGEX.find(text).map(|m| {
            let severity = match m.as_str().to_ascii_lowercase().as_str() {
                "minor" => Severity::Minor,
                "moderate" => Severity::Moderate,
                _ => Severity::Severe,
            };
            (m.start(), severity)
        });

        let first_affirmative = [positive.map(|m| m.start()), severity.map(|(start, _)| start)]
            .into_iter()
            .flatten()
            .min();

        let negated = match (negation, first_affirmative) {
            (Some(n), Some(a)) => n.start() < a,
            (Some(_), None) => true,
            (None, _) => false,
        };

        if negated {
            Verdict {
                damaged: Some(false),
                severity: None,
            }
        } else {
            Verdict {
                damaged: first_affirmative.map(|_| true),
                severity: severity.map(|(_, severity)| severity),
            }
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.damaged, self.severity) {
            (Some(false), _) => f.write_str("Not Damaged"),
            (Some(true), Some(severity)) => write!(f, "Damaged ({})", severity),
            (Some(true), None) => f.write_str("Damaged (severity unknown)"),
            (None, _) => f.write_str("Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_moderate() {
        assert_eq!(
            Verdict::parse("Damaged - Moderate: dented rear bumper"),
            Verdict {
                damaged: Some(true),
                severity: Some(Severity::Moderate),
            }
        );
    }

    #[test]
    fn test_parse_not_damaged() {
        assert_eq!(
            Verdict::parse("**Not Damaged**. The car shows no visible scratches or dents."),
            Verdict {
                damaged: Some(false),
                severity: None,
            }
        );
    }

    #[test]
    fn test_parse_damaged_with_undamaged_part() {
        assert_eq!(
            Verdict::parse("Damaged - Severe: the front end is crushed, although the rear bumper is undamaged."),
            Verdict {
                damaged: Some(true),
                severity: Some(Severity::Severe),
            }
        );
    }

    #[test]
    fn test_parse_not_damaged_then_severity_words() {
        assert_eq!(
            Verdict::parse("Not Damaged. There are no minor scratches or dents visible."),
            Verdict {
                damaged: Some(false),
                severity: None,
            }
        );
    }

    #[test]
    fn test_parse_severity_only() {
        let verdict = Verdict::parse("Severity: SEVERE. The hood is crumpled.");
        assert_eq!(verdict.severity, Some(Severity::Severe));
        assert_eq!(verdict.damaged, Some(true));
    }

    #[test]
    fn test_parse_first_severity_wins() {
        assert_eq!(
            Verdict::parse("Minor, not Moderate or Severe: a light scratch on the door").severity,
            Some(Severity::Minor)
        );
    }

    #[test]
    fn test_parse_no_information() {
        assert_eq!(Verdict::parse("I cannot see a car in this picture."), Verdict::default());
    }

    #[test]
    fn test_no_substring_matches() {
        assert_eq!(Verdict::parse("severely minority").severity, None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Verdict::parse("Damaged, Minor").to_string(), "Damaged (Minor)");
        assert_eq!(Verdict::parse("Not damaged").to_string(), "Not Damaged");
        assert_eq!(Verdict::parse("Damage is visible").to_string(), "Damaged (severity unknown)");
        assert_eq!(Verdict::default().to_string(), "Unknown");
    }
}
