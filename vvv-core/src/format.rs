//! Human-readable reports
//!
//! Everything here is pure string building over store data; callers deliver
//! the text. Long replies go through [`split_message`] before delivery.

use crate::backups::BackupInfo;
use crate::categories::{category_for, category_label, CATEGORIES};
use crate::identity::AliasMap;
use crate::leaderboard::{CommitReport, LeaderboardStore, MergeManyOutcome, ModerationRecord, Player, ScoreChange};
use crate::parser::QuizReport;

/// Maximum characters per outbound message
pub const MAX_MESSAGE_LEN: usize = 2000;

const CARETS: &str = "^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^";
const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// `57781` → `57,781`
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// `+20` / `-5` / `+0`
fn signed(value: i64) -> String {
    if value >= 0 {
        format!("+{}", value)
    } else {
        value.to_string()
    }
}

fn standings_line(player: &Player) -> String {
    format!("-{}- {:>6} - {}\n", player.rank, group_thousands(player.points), player.name)
}

/// Full standings grouped by tier, uncategorized players last
pub fn format_leaderboard(players: &[Player]) -> String {
    if players.is_empty() {
        return "📊 Le classement est vide.".to_string();
    }

    let mut out = format!(
        "---🏆 VEƝI🌿VIƊI🌿VIĆI 🏆---\n\n🪽CLASSEMENT DU GROUPE 🪽\n   ⭐️⭐️⭐️JACKPOT ⭐️⭐️⭐️\n{}\n",
        CARETS
    );

    for category in CATEGORIES.iter() {
        let mut members: Vec<&Player> = players
            .iter()
            .filter(|p| p.category.map(|c| c.name) == Some(category.name))
            .collect();
        members.sort_by_key(|p| p.rank);

        if !members.is_empty() {
            out.push_str(&format!(
                "{}{} [{}-{} P]\n-\n{}\n",
                category.emoji,
                category.name,
                group_thousands(category.min),
                group_thousands(category.max),
                CARETS
            ));
            for player in members {
                out.push_str(&standings_line(player));
            }
            out.push_str(CARETS);
            out.push('\n');
        }
        if let Some(reward) = category.reward {
            out.push_str(&format!("{}\n{}\n", reward, CARETS));
        }
    }

    let uncategorized: Vec<&Player> = players.iter().filter(|p| p.category.is_none()).collect();
    if !uncategorized.is_empty() {
        out.push_str(&format!("❓ HORS CATÉGORIE\n-\n{}\n", CARETS));
        for player in uncategorized {
            out.push_str(&standings_line(player));
        }
        out.push_str(CARETS);
        out.push('\n');
    }

    out.push_str("\n⭐️⭐️⭐️⭐️⭐️⭐️⭐️⭐️⭐️⭐️\nŠI VIS PACÈM, PARÁ BELLƯM\n⭐️⭐️⭐️⭐️⭐️⭐️⭐️⭐️⭐️⭐️");
    out
}

pub fn format_top(players: &[Player], n: usize) -> String {
    if players.is_empty() {
        return "📊 Le classement est vide.".to_string();
    }
    let mut out = format!("🏆 TOP {} 🏆\n\n", n);
    for player in players.iter().take(n) {
        out.push_str(&format!(
            "{}. {} - {} pts\n",
            player.rank,
            player.name,
            group_thousands(player.points)
        ));
    }
    out
}

pub fn format_player_info(store: &LeaderboardStore, name: &str) -> String {
    match store.find_player(name) {
        Some(player) => format!(
            "👤 {}\n🏆 Rang: {}\n⭐ Points: {}\n📌 Catégorie: {}",
            player.name,
            player.rank,
            group_thousands(player.points),
            category_label(player.points)
        ),
        None => format!("❌ Joueur \"{}\" introuvable", name.trim()),
    }
}

/// Promotion line when a change crosses a tier boundary
fn category_change(change: &ScoreChange) -> Option<String> {
    let before = category_for(change.before)?;
    let after = category_for(change.after)?;
    (before.name != after.name).then(|| format!("🚀 {} est passé de {} à {}", change.name, before.name, after.name))
}

pub fn format_update_report(report: &CommitReport) -> String {
    let mut out = format!("📊 MISE À JOUR DU QUIZ: {}\n\n", report.quiz_id);
    let mut promotions = Vec::new();

    for change in &report.changes {
        out.push_str(&format!(
            "➤ {}: {} → {} ({})\n",
            change.name,
            change.before,
            change.after,
            signed(change.delta)
        ));
        promotions.extend(category_change(change));
    }

    if let Some(bonus) = &report.bonus {
        out.push_str(&format!("\n👑 BONUS MODÉRATEUR: {} +{} points\n", bonus.name, bonus.delta));
        promotions.extend(category_change(bonus));
    }

    if !promotions.is_empty() {
        out.push_str(&format!("\n🎯 CHANGEMENTS DE CATÉGORIE:\n{}", promotions.join("\n")));
    }
    out
}

/// Preview shown before a quiz is committed
pub fn format_quiz_preview(report: &QuizReport) -> String {
    let mut out = format!(
        "📊 PRÉVISUALISATION DE LA MISE À JOUR\n{}\n\n👤 Modérateur détecté: {}\n🎯 Participants: {}\n",
        RULE,
        report.moderator_name.as_deref().unwrap_or("?"),
        report.participants.len()
    );

    if !report.rubriques.is_empty() {
        out.push_str(&format!("📚 Rubriques détectées ({}):\n", report.rubriques.len()));
        for rubrique in &report.rubriques {
            out.push_str(&format!("   • {} ({} question(s))\n", rubrique.name, rubrique.question_count));
        }
    }

    out.push_str("\n📝 MODIFICATIONS À APPLIQUER:");
    for participant in &report.participants {
        out.push_str(&format!(
            "\n   • {}: {} points",
            participant.resolved_name,
            signed(participant.points_delta)
        ));
        if participant.was_aliased() {
            out.push_str(&format!(" (fusionné: {})", participant.raw_name));
        }
    }

    out.push_str(
        "\n\n⚠️ CONFIRMEZ-VOUS CETTE MISE À JOUR ?\n\n✅ Répondez \"OUI\" pour confirmer\n❌ Répondez \"NON\" pour annuler\n⏰ Vous avez 5 minutes pour répondre",
    );
    out
}

pub fn format_merge_many(outcome: &MergeManyOutcome) -> String {
    let mut out = format!(
        "🔄 FUSION DE COMPTES RÉUSSIE!\n\n🎯 Compte principal: {}\n📊 Points avant fusion: {}\n📊 Points après fusion: {}\n🏆 Nouveau rang: #{}\n\n📥 COMPTES FUSIONNÉS:\n",
        outcome.main,
        group_thousands(outcome.before),
        group_thousands(outcome.after),
        outcome.rank
    );
    for (name, points) in &outcome.merged {
        out.push_str(&format!("📥 {}: {} pts\n", name, group_thousands(*points)));
    }
    out.push_str(&format!("\n➕ Total des points ajoutés: {}", group_thousands(outcome.total_merged())));

    let before = category_for(outcome.before).map(|c| c.name);
    let after = category_for(outcome.after).map(|c| c.name);
    if before != after {
        out.push_str(&format!(
            "\n🚀 {} est passé de {} à {}!",
            outcome.main,
            before.unwrap_or("?"),
            after.unwrap_or("?")
        ));
    }
    out
}

/// `recent` records out of a history holding `total` entries
pub fn format_moderation_history(recent: &[ModerationRecord], total: usize) -> String {
    if recent.is_empty() {
        return "📜 Aucun historique de modération trouvé.".to_string();
    }
    let mut out = "📜 HISTORIQUE DES MODÉRATIONS\n\n".to_string();
    for (index, record) in recent.iter().enumerate() {
        out.push_str(&format!("{}. {} - {} ({})\n", index + 1, record.modo, record.quiz_id, record.date));
    }
    if total > recent.len() {
        out.push_str(&format!("\n... et {} autres entrées plus anciennes", total - recent.len()));
    }
    out
}

pub fn format_backups(backups: &[BackupInfo], prefix: &str) -> String {
    if backups.is_empty() {
        return "❌ Aucune sauvegarde disponible.".to_string();
    }
    let mut out = "📂 SAUVEGARDES DISPONIBLES:\n\n".to_string();
    for (index, backup) in backups.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}\n   📅 {}\n\n",
            index + 1,
            backup.filename,
            backup.taken_at.format("%d/%m/%Y %H:%M:%S")
        ));
    }
    out.push_str(&format!(
        "💡 Utilisez {}restaurer [nom_fichier] pour restaurer une sauvegarde",
        prefix
    ));
    out
}

pub fn format_alias_history(aliases: &AliasMap) -> String {
    if aliases.is_empty() {
        return "📝 Aucun historique de merge trouvé.".to_string();
    }
    let mut out = "📋 HISTORIQUE DES MERGES\n\n".to_string();
    for (index, (original, merged)) in aliases.iter().enumerate() {
        out.push_str(&format!("{}. {} → {}\n", index + 1, original, merged));
    }
    out
}

/// Split on line boundaries into chunks of at most `max_len` characters.
///
/// A single line longer than `max_len` is cut into `max_len`-sized pieces.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let mut line: Vec<char> = line.chars().collect();
        while line.len() > max_len {
            if current_len > 0 {
                chunks.push(std::mem::take(&mut current).trim().to_string());
                current_len = 0;
            }
            let rest = line.split_off(max_len);
            chunks.push(line.into_iter().collect());
            line = rest;
        }

        let needed = if current_len == 0 { line.len() } else { current_len + 1 + line.len() };
        if needed > max_len {
            chunks.push(std::mem::take(&mut current).trim().to_string());
            current_len = 0;
        }
        if current_len > 0 {
            current.push('\n');
            current_len += 1;
        }
        current.extend(line.iter());
        current_len += line.len();
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }
    chunks.retain(|chunk| !chunk.is_empty());
    chunks
}
