use regex::Regex;
use std::sync::OnceLock;

/// A list operation recognized in a finalized transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceCommand {
    Add { name: String, quantity: u32 },
    Remove { name: String },
    Complete { name: String },
    Clear,
    ClearCompleted,
}

const ADD_VERBS: &[&str] = &[
    "add ", "put ", "buy ", "get ", "pick up ", "i need ", "we need ", "i want ",
];
const REMOVE_VERBS: &[&str] = &["remove ", "delete ", "take off ", "drop "];
const COMPLETE_VERBS: &[&str] = &[
    "check off ", "mark off ", "mark ", "check ", "complete ", "i got ", "got ",
];

/// Parse a spoken sentence into a list command.
///
/// Unrecognized text is not an error; the caller logs and drops it.
pub fn parse(text: &str) -> Option<VoiceCommand> {
    let text = normalize(text);
    let text = strip_politeness(&text);

    match text {
        "clear completed" | "clear completed items" | "clear checked items"
        | "remove checked items" | "remove completed items" => {
            return Some(VoiceCommand::ClearCompleted)
        }
        "clear the list" | "clear list" | "clear my list" | "clear everything" | "start over"
        | "new list" => return Some(VoiceCommand::Clear),
        _ => {}
    }

    for verb in COMPLETE_VERBS {
        if let Some(rest) = text.strip_prefix(verb) {
            let name = clean_name(strip_completion_markers(rest));
            if !name.is_empty() {
                return Some(VoiceCommand::Complete { name });
            }
        }
    }

    for verb in REMOVE_VERBS {
        if let Some(rest) = text.strip_prefix(verb) {
            let name = clean_name(rest);
            if !name.is_empty() {
                return Some(VoiceCommand::Remove { name });
            }
        }
    }

    for verb in ADD_VERBS {
        if let Some(rest) = text.strip_prefix(verb) {
            let rest = strip_list_refs(rest);
            let (quantity, rest) = parse_quantity(rest);
            let name = clean_name(rest);
            if !name.is_empty() {
                return Some(VoiceCommand::Add { name, quantity });
            }
        }
    }

    None
}

/// Lowercase, drop punctuation, collapse whitespace.
fn normalize(text: &str) -> String {
    static PUNCT_RE: OnceLock<Regex> = OnceLock::new();
    let re = PUNCT_RE.get_or_init(|| Regex::new(r"[^a-z0-9\s]").expect("punctuation regex"));
    let lowered = text.to_lowercase();
    let stripped = re.replace_all(&lowered, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_politeness(mut text: &str) -> &str {
    loop {
        let mut stripped = false;
        for prefix in ["please ", "hey ", "ok ", "okay ", "can you ", "could you ", "would you "] {
            if let Some(rest) = text.strip_prefix(prefix) {
                text = rest;
                stripped = true;
            }
        }
        if !stripped {
            return text;
        }
    }
}

fn strip_completion_markers(text: &str) -> &str {
    for suffix in [" as done", " as complete", " as completed", " as bought", " off"] {
        if let Some(rest) = text.strip_suffix(suffix) {
            return rest;
        }
    }
    text
}

fn strip_list_refs(text: &str) -> &str {
    for suffix in [
        " to the list",
        " to my list",
        " to the shopping list",
        " on the list",
        " from the list",
        " from my list",
        " off the list",
    ] {
        if let Some(rest) = text.strip_suffix(suffix) {
            return rest;
        }
    }
    text
}

fn clean_name(text: &str) -> String {
    let text = strip_list_refs(text);
    let mut text = text.trim();
    for article in ["the ", "some ", "a ", "an "] {
        if let Some(rest) = text.strip_prefix(article) {
            text = rest;
            break;
        }
    }
    text.trim().to_string()
}

/// Pull a leading quantity off the phrase: digits, number words, or the
/// spoken idioms people actually use.
fn parse_quantity(text: &str) -> (u32, &str) {
    for (phrase, quantity) in [
        ("a dozen ", 12),
        ("a couple of ", 2),
        ("a couple ", 2),
        ("a few ", 3),
    ] {
        if let Some(rest) = text.strip_prefix(phrase) {
            return (quantity, rest);
        }
    }

    let Some((head, rest)) = text.split_once(' ') else {
        return (1, text);
    };
    if let Ok(n) = head.parse::<u32>() {
        return (n.max(1), rest);
    }
    let words = [
        ("one", 1),
        ("two", 2),
        ("three", 3),
        ("four", 4),
        ("five", 5),
        ("six", 6),
        ("seven", 7),
        ("eight", 8),
        ("nine", 9),
        ("ten", 10),
        ("eleven", 11),
        ("twelve", 12),
    ];
    for (word, n) in words {
        if head == word {
            return (n, rest);
        }
    }
    (1, text)
}
