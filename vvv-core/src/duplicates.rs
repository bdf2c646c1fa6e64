//! Fuzzy duplicate-name detection
//!
//! Read-only diagnostic over the player list. Grouping is greedy and
//! single-link: each ungrouped player anchors a group and pulls in every later
//! ungrouped player matching it; group members are not compared with each
//! other.

use crate::format::group_thousands;
use crate::leaderboard::Player;

/// Similarity percentage at or above which two names are flagged
pub const SIMILARITY_THRESHOLD: f64 = 70.0;

/// Minimum shared prefix or suffix length, in characters
pub const MIN_AFFIX_LEN: usize = 3;

#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    /// Anchor first, then matches in leaderboard order
    pub players: Vec<Player>,
    pub total_points: i64,
}

impl DuplicateGroup {
    /// Members sorted by points, highest first
    pub fn by_points(&self) -> Vec<&Player> {
        let mut sorted: Vec<&Player> = self.players.iter().collect();
        sorted.sort_by(|a, b| b.points.cmp(&a.points));
        sorted
    }

    /// Suggested merge target: the member with the most points
    pub fn principal(&self) -> Option<&Player> {
        self.by_points().into_iter().next()
    }
}

/// Lowercased, keeping only ASCII alphanumerics and Latin-1 accented letters
pub fn normalize_for_compare(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || ('\u{00C0}'..='\u{00FF}').contains(c))
        .collect::<String>()
        .to_lowercase()
}

/// `(maxLen - levenshtein) / maxLen * 100`; two empty strings are identical
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 100.0;
    }
    let distance = strsim::levenshtein(a, b);
    (max_len - distance) as f64 / max_len as f64 * 100.0
}

fn is_substring(a: &str, b: &str) -> bool {
    let (a, b) = (a.to_lowercase(), b.to_lowercase());
    a.contains(&b) || b.contains(&a)
}

fn shares_affix(a: &str, b: &str, min_len: usize) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len() < min_len || b.len() < min_len {
        return false;
    }
    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let suffix = a.iter().rev().zip(b.iter().rev()).take_while(|(x, y)| x == y).count();
    prefix >= min_len || suffix >= min_len
}

/// Any of the four heuristics, OR-combined
pub fn looks_like_duplicate(a: &str, b: &str) -> bool {
    let (norm_a, norm_b) = (normalize_for_compare(a), normalize_for_compare(b));
    similarity(&norm_a, &norm_b) >= SIMILARITY_THRESHOLD
        || is_substring(a, b)
        || shares_affix(&norm_a, &norm_b, MIN_AFFIX_LEN)
        || norm_a == norm_b
}

pub fn detect_duplicates(players: &[Player]) -> Vec<DuplicateGroup> {
    let mut grouped = vec![false; players.len()];
    let mut groups = Vec::new();

    for i in 0..players.len() {
        if grouped[i] {
            continue;
        }
        grouped[i] = true;
        let mut members = vec![players[i].clone()];
        for j in i + 1..players.len() {
            if !grouped[j] && looks_like_duplicate(&players[i].name, &players[j].name) {
                grouped[j] = true;
                members.push(players[j].clone());
            }
        }
        if members.len() > 1 {
            let total_points = members.iter().map(|p| p.points).sum();
            groups.push(DuplicateGroup {
                players: members,
                total_points,
            });
        }
    }

    groups
}

/// Diagnostic report with a suggested merge command per group
pub fn format_duplicate_report(groups: &[DuplicateGroup], prefix: &str) -> String {
    if groups.is_empty() {
        return "✅ AUCUN DOUBLON DÉTECTÉ\n\nTous les noms semblent uniques dans le classement.".to_string();
    }

    let rule = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
    let mut report = format!(
        "🔍 DOUBLONS POTENTIELS DÉTECTÉS\n{}\n📊 {} groupe(s) de noms similaires trouvé(s)\n\n",
        rule,
        groups.len()
    );

    for (index, group) in groups.iter().enumerate() {
        let sorted = group.by_points();
        let Some(principal) = sorted.first() else {
            continue;
        };
        report.push_str(&format!("🔸 GROUPE {}:\n", index + 1));
        report.push_str(&format!(
            "🎯 Joueur principal suggéré: {} ({} pts)\n",
            principal.name,
            group_thousands(principal.points)
        ));
        report.push_str(&format!(
            "💰 Points totaux du groupe: {}\n👥 Comptes similaires:\n",
            group_thousands(group.total_points)
        ));
        for (rank, player) in sorted.iter().enumerate() {
            let status = if rank == 0 { " 👑 PRINCIPAL" } else { " 📥 À fusionner" };
            report.push_str(&format!(
                "   • {} - {} pts - Rang #{}{}\n",
                player.name,
                group_thousands(player.points),
                player.rank,
                status
            ));
        }
        let names: Vec<&str> = sorted.iter().map(|p| p.name.as_str()).collect();
        report.push_str(&format!("⚡ Commande suggérée: {}merge {}\n\n", prefix, names.join(", ")));
    }

    report.push_str(&format!(
        "{}\n💡 Utilisez {}merge [noms] pour fusionner les comptes\n⚠️ Vérifiez manuellement avant de fusionner!",
        rule, prefix
    ));
    report
}
