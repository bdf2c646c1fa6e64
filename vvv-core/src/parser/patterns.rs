//! Ordered pattern tables for quiz text recognition
//!
//! Each table is evaluated top to bottom and the first rule that matches a
//! line wins. The tables are plain data so every rule can be exercised on its
//! own.

use once_cell::sync::Lazy;
use regex::Regex;

/// Alternation matching the moderator keyword, including stylized letterforms
const MODO_KEYWORD: &str =
    r"(?:MODO|MODÉRATEUR|MODERATEUR|𝗠𝗢𝗗𝗢|𝐌𝐎𝐃𝐎|𝑴𝑶𝑫𝑶|𝙼𝙾𝙳𝙾|𝙈𝙊𝘿𝙊|𝑀𝑂𝐷𝑂|𝕄𝕆𝔻𝕆|ᴍᴏᴅᴏ)";

/// Decorative bullets that may precede a participant name
const BULLETS: &str = r"[🛡⚔\x{FE0F}•▪▫▬●○◦‣⁃-]";

/// Characters allowed in a participant name
const NAME: &str = r"[\w\sÀ-ÿ'.-]+?";

/// Glyphs stripped from the end of a free-form moderator name
const MODO_TRAILING_GLYPHS: &[char] = &['⚔', '\u{FE0F}', '🛡', '🔥', '💰', '🎯'];

/// Glyphs stripped from both ends of a participant name
const NAME_DECORATIONS: &[char] = &['-', '•', '▪', '▫', '▬', '●', '○', '◦', '‣', '⁃', '_', '*', '~', '`'];

/// How a moderator rule turns its captures into a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeratorRuleKind {
    /// `MODO <name> <points>`: explicit bonus
    ExplicitBonus,
    /// `⚔️ MODO : <name> ⚔️`
    EmojiDelimited,
    /// `MODO <name>` up to the end of the line
    Standard,
}

/// Moderator found on one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeratorMatch {
    pub name: String,
    pub explicit_points: Option<i64>,
}

pub struct ModeratorRule {
    pub label: &'static str,
    pub kind: ModeratorRuleKind,
    pub regex: Regex,
}

impl ModeratorRule {
    pub fn apply(&self, line: &str) -> Option<ModeratorMatch> {
        let caps = self.regex.captures(line)?;
        let raw = caps.get(1)?.as_str().trim();
        let (name, explicit_points) = match self.kind {
            ModeratorRuleKind::ExplicitBonus => {
                let points = caps.get(2)?.as_str().parse::<i64>().ok()?;
                (raw.to_string(), Some(points))
            }
            ModeratorRuleKind::EmojiDelimited => (raw.to_string(), None),
            ModeratorRuleKind::Standard => (
                raw.trim_end_matches(|c: char| MODO_TRAILING_GLYPHS.contains(&c) || c.is_whitespace())
                    .to_string(),
                None,
            ),
        };
        if name.is_empty() {
            return None;
        }
        Some(ModeratorMatch {
            name,
            explicit_points,
        })
    }
}

pub static MODERATOR_RULES: Lazy<Vec<ModeratorRule>> = Lazy::new(|| {
    vec![
        ModeratorRule {
            label: "explicit-bonus",
            kind: ModeratorRuleKind::ExplicitBonus,
            regex: compile(r"(?i)(?:MODO|MODÉRATEUR|MODERATEUR)\s*[:=]?\s*(.+?)\s+([0-9]+)"),
        },
        ModeratorRule {
            label: "emoji-delimited",
            kind: ModeratorRuleKind::EmojiDelimited,
            regex: compile(&format!(
                r"(?i)⚔\x{{FE0F}}?\s*{}\s*[:=]?\s*(.+?)\s*⚔",
                MODO_KEYWORD
            )),
        },
        ModeratorRule {
            label: "standard",
            kind: ModeratorRuleKind::Standard,
            regex: compile(&format!(r"(?i){}\s*[:=]?\s*(.+)", MODO_KEYWORD)),
        },
    ]
});

/// Named-category line; group 1 is the name, optional group 2 the question count
pub struct RubriquePattern {
    pub label: &'static str,
    pub regex: Regex,
}

impl RubriquePattern {
    /// `(name, question_count)`; a missing count means one question
    pub fn apply(&self, line: &str) -> Option<(String, u32)> {
        let caps = self.regex.captures(line)?;
        let name = caps.get(1)?.as_str().trim().to_string();
        if name.is_empty() {
            return None;
        }
        let count = caps
            .get(2)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(1);
        Some((name, count))
    }
}

const NAMED_RUBRIQUES: &[(&str, &str)] = &[
    ("anagrammes", r"ANAGRAMMES?"),
    ("capital-pays", r"CAPITAL\s*PAYS?"),
    ("vaurien", r"VAURIEN"),
    ("lp", r"LP"),
    ("culture-g", r"CULTURE\s*G"),
    ("histoire", r"HISTOIRE"),
    ("geographie", r"GEOGRAPHIE"),
    ("sport", r"SPORT"),
    ("science", r"SCIENCE"),
    ("cinema", r"CINEMA"),
    ("musique", r"MUSIQUE"),
];

pub static RUBRIQUE_PATTERNS: Lazy<Vec<RubriquePattern>> = Lazy::new(|| {
    let mut patterns = Vec::new();
    // With a question count
    for (label, name) in NAMED_RUBRIQUES {
        patterns.push(RubriquePattern {
            label,
            regex: compile(&format!(r"(?i)^({})\s*([0-9]+)\s*Q?", name)),
        });
    }
    patterns.push(RubriquePattern {
        label: "generic-count",
        regex: compile(r"(?i)^([A-Z\s]+)\s*([0-9]+)\s*Q"),
    });
    // Bare names
    patterns.push(RubriquePattern {
        label: "id",
        regex: compile(r"(?i)^(ID)\s*([0-9]+)?$"),
    });
    for (label, name) in NAMED_RUBRIQUES {
        patterns.push(RubriquePattern {
            label,
            regex: compile(&format!(r"(?i)^({})$", name)),
        });
    }
    patterns
});

/// Regex recognizing a line that is just the rubrique heading `name [count] [Q]`
pub fn rubrique_heading(name: &str) -> Regex {
    compile(&format!(r"(?i)^{}\s*[0-9]*\s*Q?\s*$", regex::escape(name)))
}

/// Participant line; group 1 is the raw name, group 2 the signed delta
pub struct ParticipantRule {
    pub label: &'static str,
    pub regex: Regex,
}

impl ParticipantRule {
    /// `(cleaned_name, delta)` when the line matches and the integer parses
    pub fn apply(&self, line: &str) -> Option<(String, i64)> {
        let caps = self.regex.captures(line)?;
        let name = clean_name(caps.get(1)?.as_str());
        let points = caps.get(2)?.as_str().replace('+', "").parse::<i64>().ok()?;
        Some((name, points))
    }
}

pub static PARTICIPANT_RULES: Lazy<Vec<ParticipantRule>> = Lazy::new(|| {
    vec![
        // `NOM 190 P - 100 P : 90 P`: the integer after the last `:`/`=` wins
        ParticipantRule {
            label: "compound-calculation",
            regex: compile(&format!(
                r"(?i)(?:{b}\s*)*-?\s*@?\s*({n})\s+[-+]?\s*[0-9].*[:=]\s*([-+]?[0-9]+)\s*(?:POINTS|PTS|P)?\s*$",
                b = BULLETS,
                n = NAME
            )),
        },
        // `NOM -40`, `• NOM 50`
        ParticipantRule {
            label: "simple",
            regex: compile(&format!(
                r"(?i)(?:{b}\s*)*-?\s*@?\s*({n})\s+([-+]?[0-9]+)(?:\s|$)",
                b = BULLETS,
                n = NAME
            )),
        },
    ]
});

/// Strip decorative bullets and whitespace from both ends of a name
pub fn clean_name(raw: &str) -> String {
    raw.trim_matches(|c: char| NAME_DECORATIONS.contains(&c) || c.is_whitespace())
        .to_string()
}

fn compile(pattern: &str) -> Regex {
    // Patterns are compile-time constants covered by the tests below.
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {:?}: {}", pattern, e))
}
