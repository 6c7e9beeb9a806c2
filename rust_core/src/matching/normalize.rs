//! Name normalization shared by every matcher.
//!
//! Abbreviations are expanded before mascots are stripped, so "Miss St
//! Bulldogs" becomes "mississippi state" and not "miss st".

/// Whole-word abbreviation expansions. Periods are already stripped, so
/// "st." arrives here as "st".
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("miss", "mississippi"),
    ("mt", "mount"),
    ("ft", "fort"),
    ("app", "appalachian"),
    ("st", "state"),
];

/// Team nicknames removed as whole words/phrases. Unlisted nicknames
/// ("heat") stay in the name.
const MASCOTS: &[&str] = &[
    "aggies",
    "aztecs",
    "badgers",
    "bearcats",
    "bears",
    "beavers",
    "blue devils",
    "boilermakers",
    "broncos",
    "bruins",
    "buckeyes",
    "buffaloes",
    "bulldogs",
    "cardinals",
    "cavaliers",
    "commodores",
    "cornhuskers",
    "cougars",
    "crimson tide",
    "cyclones",
    "demon deacons",
    "ducks",
    "eagles",
    "falcons",
    "fighting irish",
    "gamecocks",
    "gators",
    "golden eagles",
    "golden gophers",
    "gophers",
    "hawkeyes",
    "hokies",
    "hoosiers",
    "horned frogs",
    "huskies",
    "hurricanes",
    "jayhawks",
    "knights",
    "longhorns",
    "lobos",
    "mean green",
    "miners",
    "mountaineers",
    "mustangs",
    "nittany lions",
    "owls",
    "panthers",
    "rams",
    "razorbacks",
    "rebels",
    "red raiders",
    "red storm",
    "roadrunners",
    "scarlet knights",
    "seminoles",
    "sooners",
    "spartans",
    "sun devils",
    "tar heels",
    "terrapins",
    "tigers",
    "trojans",
    "utes",
    "volunteers",
    "warriors",
    "wildcats",
    "wolfpack",
    "wolverines",
    "yellow jackets",
];

/// Canonicalize a raw team/entity name.
///
/// Lowercases, turns hyphens into spaces, drops `.,'()`, expands
/// abbreviations, removes mascot words and collapses whitespace. Always
/// returns a string; it is empty when the input was only mascots and
/// punctuation.
pub fn normalize(raw: &str) -> String {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            '-' => Some(' '),
            '.' | ',' | '\'' | '\u{2019}' | '(' | ')' => None,
            _ => Some(c),
        })
        .collect();

    let tokens: Vec<&str> = cleaned.split_whitespace().map(expand_abbreviation).collect();

    strip_mascots(tokens).join(" ")
}

fn expand_abbreviation(token: &str) -> &str {
    ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| *abbr == token)
        .map(|(_, full)| *full)
        .unwrap_or(token)
}

/// Remove mascot phrases until none remain. Removing one phrase can make
/// its neighbours form another ("red wolfpack storm"), so this runs to a
/// fixpoint, which keeps `normalize` idempotent.
fn strip_mascots(mut tokens: Vec<&str>) -> Vec<&str> {
    while let Some((start, len)) = find_mascot(&tokens) {
        tokens.drain(start..start + len);
    }
    tokens
}

/// Leftmost mascot occurrence, preferring the longest phrase at a position
/// so "golden gophers" wins over "gophers".
fn find_mascot(tokens: &[&str]) -> Option<(usize, usize)> {
    for start in 0..tokens.len() {
        let best = MASCOTS
            .iter()
            .map(|mascot| mascot.split(' ').collect::<Vec<_>>())
            .filter(|words| {
                start + words.len() <= tokens.len() && tokens[start..start + words.len()] == words[..]
            })
            .map(|words| words.len())
            .max();
        if let Some(len) = best {
            return Some((start, len));
        }
    }
    None
}
