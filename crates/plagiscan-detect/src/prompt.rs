use plagiscan_core::Verdict;

/// Evidence handed to the judge when retrieval found nothing.
pub const NO_EVIDENCE: &str = "No similar code found.";

const SYSTEM_PROMPT: &str = "\
You are an expert in detecting source code plagiarism. \
Your response must be exactly one word: Plagiarized or NotPlagiarized.";

/// Build the system prompt for the judgment collaborator.
///
/// # Examples
///
/// ```
/// use plagiscan_detect::prompt::build_system_prompt;
///
/// let prompt = build_system_prompt();
/// assert!(prompt.contains("NotPlagiarized"));
/// ```
pub fn build_system_prompt() -> String {
    SYSTEM_PROMPT.to_string()
}

/// Build the user prompt comparing `snippet` against retrieved `evidence`.
///
/// # Examples
///
/// ```
/// use plagiscan_detect::prompt::{build_judge_prompt, NO_EVIDENCE};
///
/// let prompt = build_judge_prompt("def f(): pass", NO_EVIDENCE);
/// assert!(prompt.contains("def f(): pass"));
/// assert!(prompt.contains(NO_EVIDENCE));
/// ```
pub fn build_judge_prompt(snippet: &str, evidence: &str) -> String {
    format!(
        "Your task is to check whether the given code snippet is plagiarized.\n\
         \n\
         Submitted code:\n\
         \"\"\"\n{snippet}\n\"\"\"\n\
         \n\
         Similar code from the indexed corpus:\n\
         \"\"\"\n{evidence}\n\"\"\"\n\
         \n\
         Analyze both in detail and compare them. Then answer with one word:\n\
         Plagiarized - if the code is plagiarized (similarity is more than 70%)\n\
         NotPlagiarized - if the code is not plagiarized (similarity is 70% or less)\n\
         \n\
         The response must be only one word, Plagiarized or NotPlagiarized!\n"
    )
}

const POSITIVE: &str = "Plagiarized";
const NEGATIVE: &str = "NotPlagiarized";

/// Words that negate a following `Plagiarized`.
const NEGATIONS: [&str; 5] = ["not", "non", "un", "no", "never"];

/// Turn a raw judgment into a verdict.
///
/// The reply is split into words and matched case-sensitively against the
/// two tokens. The answer is `Plagiarized` only when `Plagiarized` occurs
/// as a word of its own, no occurrence is negated by the word before it
/// (`not`, `non`, `un`, `isn't`, ...) and `NotPlagiarized` does not occur.
/// Anything else, including `Non-plagiarized` or `PLAGIARIZED`, is
/// `NotPlagiarized`.
///
/// # Examples
///
/// ```
/// use plagiscan_core::Verdict;
/// use plagiscan_detect::prompt::parse_verdict;
///
/// assert_eq!(parse_verdict("Plagiarized."), Verdict::Plagiarized);
/// assert_eq!(parse_verdict("Not Plagiarized"), Verdict::NotPlagiarized);
/// assert_eq!(parse_verdict("Non-plagiarized"), Verdict::NotPlagiarized);
/// assert_eq!(parse_verdict(""), Verdict::NotPlagiarized);
/// assert_eq!(parse_verdict("Plagiarized or NotPlagiarized"), Verdict::NotPlagiarized);
/// ```
pub fn parse_verdict(raw: &str) -> Verdict {
    let words: Vec<&str> = raw
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .filter(|w| !w.is_empty())
        .collect();

    let mut positive = false;
    let mut negative = words.contains(&NEGATIVE);
    for (i, word) in words.iter().enumerate() {
        if *word != POSITIVE {
            continue;
        }
        if i > 0 && is_negation(words[i - 1]) {
            negative = true;
        } else {
            positive = true;
        }
    }

    if positive && !negative {
        Verdict::Plagiarized
    } else {
        if !negative {
            tracing::warn!(response = %raw, "unexpected judgment, defaulting to NotPlagiarized");
        }
        Verdict::NotPlagiarized
    }
}

fn is_negation(word: &str) -> bool {
    let lower = word.to_lowercase();
    NEGATIONS.contains(&lower.as_str()) || lower.ends_with("n't") || lower.ends_with("n\u{2019}t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn positive_token_variants() {
        for raw in ["Plagiarized", " Plagiarized\n", "Verdict: Plagiarized.", "Plagiarized!"] {
            assert_eq!(parse_verdict(raw), Verdict::Plagiarized, "{raw:?}");
        }
    }

    #[test]
    fn negative_token_variants() {
        for raw in [
            "NotPlagiarized",
            "NotPlagiarized.",
            "Not Plagiarized",
            "Not_Plagiarized",
            "not-Plagiarized",
            "The code is not Plagiarized",
            "This code isn't Plagiarized",
        ] {
            assert_eq!(parse_verdict(raw), Verdict::NotPlagiarized, "{raw:?}");
        }
    }

    #[test]
    fn ambiguous_output_defaults_to_negative() {
        for raw in [
            "",
            "   ",
            "I cannot tell.",
            "Plagiarized / NotPlagiarized",
            "NotPlagiarized, although parts look Plagiarized",
            "Non-plagiarized",
            "Non-Plagiarized",
            "Unplagiarized.",
            "UnPlagiarized",
            "The code is non plagiarized",
            "plagiarized",
            "PLAGIARIZED",
        ] {
            assert_eq!(parse_verdict(raw), Verdict::NotPlagiarized, "{raw:?}");
        }
    }

    #[test]
    fn judge_prompt_has_both_tokens_and_threshold() {
        let prompt = build_judge_prompt("x = 1", "y = 2");
        assert!(prompt.contains("x = 1"));
        assert!(prompt.contains("y = 2"));
        assert!(prompt.contains("70%"));
        assert!(prompt.contains("Plagiarized"));
        assert!(prompt.contains("NotPlagiarized"));
    }

    proptest! {
        #[test]
        fn never_positive_when_negative_present(prefix in ".{0,40}", suffix in ".{0,40}") {
            let raw = format!("{prefix} NotPlagiarized {suffix}");
            prop_assert_eq!(parse_verdict(&raw), Verdict::NotPlagiarized);
        }

        #[test]
        fn never_positive_without_the_token(raw in "[a-oq-z0-9 .,!?]{0,60}") {
            prop_assert_eq!(parse_verdict(&raw), Verdict::NotPlagiarized);
        }

        #[test]
        fn negating_prefix_is_never_positive(
            lead in "[a-z ]{0,20}",
            negation in prop_oneof!["non", "Non", "NON", "un", "Un", "not", "Not", "isn't"],
            sep in prop_oneof!["", " ", "-", "_"],
            token in prop_oneof!["plagiarized", "Plagiarized"],
            trail in "[.!]{0,2}",
        ) {
            let raw = format!("{lead} {negation}{sep}{token}{trail}");
            prop_assert_eq!(parse_verdict(&raw), Verdict::NotPlagiarized, "{:?}", raw);
        }
    }
}
