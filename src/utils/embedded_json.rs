use crate::utils::dates::parse_date_loose;
use chrono::NaiveDate;
use serde_json::Value;

/// Recursion guard for the event walk; real payloads nest far shallower.
const MAX_WALK_DEPTH: usize = 32;

/// An event-shaped object pulled out of an embedded page payload. Neutral with
/// respect to source; the calling extractor attaches its own tags.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedEvent {
    pub player1: String,
    pub player2: String,
    pub tournament: Option<String>,
    pub date: Option<NaiveDate>,
    pub surface: Option<String>,
}

/// Extract balanced `{...}`/`[...]` blocks from arbitrary JS text. Naive regex
/// cannot match nested JSON, so this scans characters and balances brackets
/// while skipping over quoted strings (honoring backslash escapes).
pub fn extract_json_blocks(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let open = bytes[i];
        if open != b'{' && open != b'[' {
            i += 1;
            continue;
        }

        let start = i;
        let mut stack = vec![open];
        let mut in_string = false;
        let mut escape = false;
        i += 1;

        while i < bytes.len() && !stack.is_empty() {
            let c = bytes[i];
            if in_string {
                if escape {
                    escape = false;
                } else if c == b'\\' {
                    escape = true;
                } else if c == b'"' {
                    in_string = false;
                }
            } else {
                match c {
                    b'"' => in_string = true,
                    b'{' | b'[' => stack.push(c),
                    b'}' => {
                        if stack.last() == Some(&b'{') {
                            stack.pop();
                        }
                    }
                    b']' => {
                        if stack.last() == Some(&b'[') {
                            stack.pop();
                        }
                    }
                    _ => {}
                }
            }
            i += 1;
        }

        if stack.is_empty() {
            blocks.push(&text[start..i]);
        }
    }

    blocks
}

/// Walk a parsed JSON tree collecting objects that look like event records
/// (ESPN-style payloads key them as competitions/competitors/startDate).
/// Stops once `limit` events have been collected.
pub fn extract_events(root: &Value, limit: usize) -> Vec<EmbeddedEvent> {
    let mut events = Vec::new();
    walk(root, limit, 0, &mut events);
    events
}

fn walk(node: &Value, limit: usize, depth: usize, events: &mut Vec<EmbeddedEvent>) {
    if events.len() >= limit || depth > MAX_WALK_DEPTH {
        return;
    }

    match node {
        Value::Array(items) => {
            for item in items {
                if events.len() >= limit {
                    break;
                }
                walk(item, limit, depth + 1, events);
            }
        }
        Value::Object(map) => {
            let event_shaped = map.contains_key("competitions")
                || map.contains_key("competitors")
                || map.contains_key("startDate")
                || map.contains_key("scheduled")
                || map.contains_key("name");
            if event_shaped {
                if let Some(event) = event_from_object(node) {
                    // The competitor list nested under this node would match
                    // the event shape again; stop here to avoid re-extracting.
                    events.push(event);
                    return;
                }
            }
            for value in map.values() {
                if events.len() >= limit {
                    break;
                }
                walk(value, limit, depth + 1, events);
            }
        }
        _ => {}
    }
}

fn event_from_object(node: &Value) -> Option<EmbeddedEvent> {
    // Common ESPN shape: competitions[0].competitors; some payloads inline the
    // competitor list on the event itself.
    let competitors = node
        .get("competitions")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("competitors"))
        .and_then(Value::as_array)
        .or_else(|| node.get("competitors").and_then(Value::as_array))?;
    if competitors.len() < 2 {
        return None;
    }

    let player1 = competitor_name(&competitors[0])?;
    let player2 = competitor_name(&competitors[1])?;

    let tournament = ["tournament", "shortName", "name", "competition", "league"]
        .iter()
        .find_map(|key| non_empty_str(node.get(*key)));

    let date = ["date", "startDate", "scheduled"]
        .iter()
        .find_map(|key| non_empty_str(node.get(*key)))
        .and_then(|raw| parse_date_loose(&raw));

    let surface = non_empty_str(node.get("surface")).or_else(|| {
        non_empty_str(
            node.get("status")
                .and_then(|s| s.get("type"))
                .and_then(|t| t.get("detail")),
        )
    });

    Some(EmbeddedEvent {
        player1,
        player2,
        tournament,
        date,
        surface,
    })
}

/// Competitor names appear as athlete.displayName, team.displayName, or a bare
/// displayName depending on payload vintage.
pub fn competitor_name(competitor: &Value) -> Option<String> {
    non_empty_str(competitor.get("athlete").and_then(|a| a.get("displayName")))
        .or_else(|| non_empty_str(competitor.get("team").and_then(|t| t.get("displayName"))))
        .or_else(|| non_empty_str(competitor.get("displayName")))
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
