//! Prefixed chat commands
//!
//! `Command::parse` turns `!top 5` into a [`Command`]; `Command::execute`
//! runs it against the locked state and returns the reply texts. Replies are
//! not length-limited here, the dispatcher splits them.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{info, warn};
use vvv_core::config::AdminRegistry;
use vvv_core::confirmation::{self, ConfirmationSessions};
use vvv_core::duplicates::{detect_duplicates, format_duplicate_report};
use vvv_core::format;
use vvv_core::{Error, LeaderboardStore};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Entries shown by `historiquemodo`
const MODERATION_HISTORY_LIMIT: usize = 20;

const DEFAULT_TOP: usize = 10;
const MAX_TOP: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Leaderboard,
    /// Raw count argument, validated on execution
    Top(Option<String>),
    Position(String),
    Merge(String),
    Duplicates,
    MergeHistory,
    ClearMerge,
    ModerationHistory,
    Backups,
    Restore(String),
    SetLeaderboard,
    AddAdmin(String),
    RemoveAdmin(String),
    ListAdmins,
    SetPrefix(String),
    Ping,
    Status,
    Unknown(String),
}

impl Command {
    /// `None` unless `text` starts with `prefix`
    pub fn parse(text: &str, prefix: &str) -> Option<Command> {
        let body = text.trim().strip_prefix(prefix)?.trim();
        let (word, rest) = match body.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (body, ""),
        };
        let rest = rest.to_string();
        let first_arg = rest.split_whitespace().next().unwrap_or_default().to_string();

        let command = match word.to_lowercase().as_str() {
            "menu" | "aide" | "help" => Command::Help,
            "classement" | "leaderboard" => Command::Leaderboard,
            "top" => Command::Top((!first_arg.is_empty()).then_some(first_arg)),
            "position" | "pos" => Command::Position(rest),
            "merge" | "fusionner" => Command::Merge(rest),
            "doublons" | "duplicates" | "detecterdoublons" => Command::Duplicates,
            "mergehistory" | "historique" => Command::MergeHistory,
            "clearmerge" | "clearmemory" => Command::ClearMerge,
            "historiquemodo" | "historiquemoderation" => Command::ModerationHistory,
            "sauvegardes" | "backups" => Command::Backups,
            "restaurer" | "restore" => Command::Restore(first_arg),
            "setclassement" | "setleaderboard" => Command::SetLeaderboard,
            "ajouteradmin" | "addadmin" => Command::AddAdmin(first_arg),
            "supprimeradmin" | "removeadmin" => Command::RemoveAdmin(first_arg),
            "listadmins" | "listeadmins" | "admins" => Command::ListAdmins,
            "setprefix" | "prefix" => Command::SetPrefix(first_arg),
            "ping" => Command::Ping,
            "status" => Command::Status,
            other => Command::Unknown(other.to_string()),
        };
        Some(command)
    }

    /// Allowed for every sender
    fn is_public(&self) -> bool {
        matches!(
            self,
            Command::Help
                | Command::Leaderboard
                | Command::Top(_)
                | Command::Position(_)
                | Command::Ping
                | Command::Status
                | Command::Unknown(_)
        )
    }

    /// Restricted to the super admin
    fn is_super_admin_only(&self) -> bool {
        matches!(
            self,
            Command::SetLeaderboard | Command::AddAdmin(_) | Command::RemoveAdmin(_)
        )
    }

    fn denial(&self) -> &'static str {
        match self {
            Command::Merge(_) => "❌ Seuls les administrateurs peuvent fusionner des comptes.",
            Command::Duplicates => "❌ Seuls les administrateurs peuvent détecter les doublons.",
            Command::MergeHistory => "❌ Seuls les administrateurs peuvent voir l'historique des merges.",
            Command::ClearMerge => "❌ Seuls les administrateurs peuvent vider l'historique des merges.",
            Command::ModerationHistory => {
                "❌ Seuls les administrateurs peuvent voir l'historique des modérations."
            }
            Command::Backups => "❌ Seuls les administrateurs peuvent voir les sauvegardes.",
            Command::Restore(_) => "❌ Seuls les administrateurs peuvent restaurer des sauvegardes.",
            Command::ListAdmins => "❌ Seuls les administrateurs peuvent voir la liste des administrateurs.",
            Command::SetPrefix(_) => "❌ Seuls les administrateurs peuvent changer le préfixe des commandes.",
            Command::SetLeaderboard => "❌ Commande réservée au super-admin.",
            Command::AddAdmin(_) => "❌ Seul le super administrateur peut ajouter des administrateurs.",
            Command::RemoveAdmin(_) => "❌ Seul le super administrateur peut supprimer des administrateurs.",
            _ => "❌ Seuls les administrateurs peuvent utiliser cette commande.",
        }
    }

    /// Run the command for `ctx.sender_id`; returns the replies in order
    pub fn execute(self, ctx: &mut CommandContext<'_>) -> Vec<String> {
        let allowed = if self.is_super_admin_only() {
            ctx.admins.is_super_admin(ctx.sender_id)
        } else {
            self.is_public() || ctx.admins.is_admin(ctx.sender_id)
        };
        if !allowed {
            info!("Command {:?} refused for {}", self, ctx.sender_id);
            return vec![self.denial().to_string()];
        }

        let prefix = ctx.admins.prefix().to_string();
        match self {
            Command::Help => vec![help_menu(&prefix)],
            Command::Leaderboard => vec![format::format_leaderboard(ctx.store.players())],
            Command::Top(arg) => vec![top(ctx.store, arg.as_deref())],
            Command::Position(name) if name.is_empty() => {
                vec![format!("❌ Usage: {}position [nom du joueur]", prefix)]
            }
            Command::Position(name) => vec![format::format_player_info(ctx.store, &name)],
            Command::Merge(input) => vec![merge(ctx, &input, &prefix)],
            Command::Duplicates => {
                let groups = detect_duplicates(ctx.store.players());
                vec![
                    "🔍 Analyse en cours des doublons...".to_string(),
                    format_duplicate_report(&groups, &prefix),
                ]
            }
            Command::MergeHistory => vec![format::format_alias_history(ctx.store.identity().aliases())],
            Command::ClearMerge => {
                ctx.store.identity_mut().clear_aliases();
                vec!["✅ Mémoire de merge vidée avec succès.".to_string()]
            }
            Command::ModerationHistory => vec![format::format_moderation_history(
                ctx.store.moderation_history(MODERATION_HISTORY_LIMIT),
                ctx.store.history().len(),
            )],
            Command::Backups => match ctx.store.list_backups() {
                Ok(backups) => vec![format::format_backups(&backups, &prefix)],
                Err(e) => {
                    warn!("Failed to list backups: {}", e);
                    vec!["❌ Aucune sauvegarde disponible.".to_string()]
                }
            },
            Command::Restore(filename) if filename.is_empty() => {
                vec![format!("❌ Usage: {}restaurer [nom_fichier]", prefix)]
            }
            Command::Restore(filename) => match ctx.store.restore_backup(&filename) {
                Ok(_) => vec![
                    format!("✅ Classement restauré à partir de {}", filename),
                    format::format_leaderboard(ctx.store.players()),
                ],
                Err(e) => {
                    warn!("Restore of {} failed: {}", filename, e);
                    vec!["❌ Échec de la restauration. Fichier introuvable ou invalide.".to_string()]
                }
            },
            Command::SetLeaderboard => {
                confirmation::await_standings(ctx.sessions, ctx.sender_id, ctx.thread_id, ctx.now);
                vec!["📋 Veuillez envoyer le classement actuel au format texte dans le prochain message".to_string()]
            }
            Command::AddAdmin(user_id) if user_id.is_empty() => {
                vec![format!("❌ Veuillez fournir un ID.\nUsage: {}ajouteradmin [userID]", prefix)]
            }
            Command::AddAdmin(user_id) => match ctx.admins.add_admin(&user_id) {
                Ok(()) => vec![format!(
                    "✅ Administrateur {} ajouté avec succès\n🎉 Nouvel administrateur ajouté avec succès!",
                    user_id
                )],
                Err(_) => vec!["❌ Cet utilisateur est déjà administrateur.".to_string()],
            },
            Command::RemoveAdmin(user_id) if user_id.is_empty() => {
                vec![format!("❌ Usage: {}supprimeradmin [userID]", prefix)]
            }
            Command::RemoveAdmin(user_id) => match ctx.admins.remove_admin(&user_id) {
                Ok(()) => vec![format!("✅ Administrateur {} supprimé avec succès", user_id)],
                Err(Error::NotFound(_)) => vec![format!("❌ L'utilisateur {} n'est pas administrateur", user_id)],
                Err(_) => vec!["❌ Impossible de supprimer le super administrateur".to_string()],
            },
            Command::ListAdmins => vec![list_admins(ctx.admins)],
            Command::SetPrefix(new_prefix) if new_prefix.is_empty() => {
                vec![format!("❌ Usage: {}setprefix [nouveau_préfixe]", prefix)]
            }
            Command::SetPrefix(new_prefix) => match ctx.admins.set_prefix(&new_prefix) {
                Ok(()) => {
                    info!("Command prefix changed to {:?} by {}", new_prefix, ctx.sender_id);
                    vec![format!("✅ Préfixe des commandes changé pour: {}", new_prefix)]
                }
                Err(_) => vec!["❌ Le préfixe doit faire entre 1 et 3 caractères.".to_string()],
            },
            Command::Ping => vec![format!(
                "🏓 Pong!\n\n⏰ Uptime: {}\n✅ Statut: En ligne et opérationnel",
                uptime_text(ctx.uptime)
            )],
            Command::Status => vec![status(ctx)],
            Command::Unknown(word) if word.is_empty() => Vec::new(),
            Command::Unknown(word) => vec![format!(
                "❓ Commande inconnue: {}\nTapez {}menu pour voir toutes les commandes.",
                word, prefix
            )],
        }
    }
}

/// Locked state a command runs against
pub struct CommandContext<'a> {
    pub sessions: &'a mut ConfirmationSessions,
    pub store: &'a mut LeaderboardStore,
    pub admins: &'a mut AdminRegistry,
    pub sender_id: &'a str,
    pub thread_id: &'a str,
    pub now: DateTime<Utc>,
    pub uptime: Duration,
}

fn top(store: &LeaderboardStore, arg: Option<&str>) -> String {
    let n = match arg {
        None => DEFAULT_TOP,
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if (1..=MAX_TOP).contains(&n) => n,
            _ => return format!("❌ Veuillez spécifier un nombre entre 1 et {}", MAX_TOP),
        },
    };
    format::format_top(store.players(), n)
}

fn merge(ctx: &mut CommandContext<'_>, input: &str, prefix: &str) -> String {
    let names = ctx.store.parse_merge_names(input);
    if names.len() < 2 {
        return format!(
            "❌ Usage: {p}merge [nom1] [nom2] [nom3] ...\n\nExemples:\n• {p}merge RYOMEN, RYOMEN SK\n• {p}merge PLAYER1 PLAYER2 PLAYER3\n\nLe premier nom sera le compte principal qui recevra tous les points.",
            p = prefix
        );
    }

    match ctx.store.merge_many(&names[0], &names[1..], ctx.now) {
        Ok(outcome) => {
            info!(
                "{} merged {} account(s) into {}",
                ctx.sender_id,
                outcome.merged.len(),
                outcome.main
            );
            format::format_merge_many(&outcome)
        }
        Err(Error::NotFound(missing)) => format!(
            "❌ Joueurs introuvables: {}\n\n💡 Noms détectés: {}\n📋 Utilisez les noms exactement comme ils apparaissent dans le classement.",
            missing,
            names.join(", ")
        ),
        Err(Error::InvalidInput(_)) => "❌ Aucun point à fusionner.".to_string(),
        Err(e) => {
            warn!("Merge failed: {}", e);
            "❌ Une erreur s'est produite lors de la fusion.".to_string()
        }
    }
}

fn list_admins(admins: &AdminRegistry) -> String {
    let ids = admins.admins();
    let mut out = format!("👑 LISTE DES ADMINISTRATEURS\n\n📊 Total: {} administrateur(s)\n\n", ids.len());
    for id in &ids {
        if admins.is_super_admin(id) {
            out.push_str(&format!("👑 {} (Super Admin)\n", id));
        } else {
            out.push_str(&format!("⚡ {}\n", id));
        }
    }
    out
}

fn uptime_text(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn status(ctx: &CommandContext<'_>) -> String {
    let backups = ctx.store.list_backups().map(|b| b.len()).unwrap_or_default();
    let config = ctx.admins.config();
    let flag = |on: bool| if on { "✅" } else { "❌" };
    format!(
        "🤖 STATUT DÉTAILLÉ DU BOT V.V.V\n{rule}\n\n⏱️ Temps d'activité: {uptime}\n📊 Préfixe des commandes: {prefix}\n🆔 Super Admin: {super_admin}\n\n👥 Base de données:\n   • Joueurs enregistrés: {players}\n   • Administrateurs: {admins}\n   • Merges en mémoire: {merges}\n   • Historique modérations: {history}\n   • Sauvegardes disponibles: {backups}\n\n⚙️ Configuration:\n   • Auto-accept friends: {friends}\n   • Logging activé: {logging}\n\n🏆 Version: {version}",
        rule = RULE,
        uptime = uptime_text(ctx.uptime),
        prefix = ctx.admins.prefix(),
        super_admin = ctx.admins.super_admin_id(),
        players = ctx.store.players().len(),
        admins = ctx.admins.admins().len(),
        merges = ctx.store.identity().len(),
        history = ctx.store.history().len(),
        backups = backups,
        friends = flag(config.auto_accept_friends),
        logging = flag(config.enable_logging),
        version = env!("CARGO_PKG_VERSION"),
    )
}

fn help_menu(p: &str) -> String {
    format!(
        "🏆 BOT DE CLASSEMENT V.V.V 🏆\n{rule}\n🎯 Conçu exclusivement pour le groupe V.V.V\n{rule}\n\n\
📋 COMMANDES GÉNÉRALES:\n\
🔹 {p}menu - Affiche ce menu d'aide\n\
🔹 {p}classement - Affiche le classement complet\n\
🔹 {p}top [n] - Affiche le top N (défaut: top 10)\n\
🔹 {p}position [nom] - Position d'un joueur\n\
🔹 {p}ping - Test de connectivité\n\
🔹 {p}status - Statut détaillé du bot\n\n\
📊 HISTORIQUE & SAUVEGARDES:\n\
🔹 {p}historiquemodo - Historique des modérations\n\
🔹 {p}historique - Historique des merges\n\
🔹 {p}sauvegardes - Liste des sauvegardes\n\
🔹 {p}restaurer [fichier] - Restaurer une sauvegarde\n\n\
⚙️ COMMANDES ADMINISTRATEUR:\n\
🔸 {p}ajouteradmin [id] - Ajouter un admin\n\
🔸 {p}supprimeradmin [id] - Retirer un admin\n\
🔸 {p}listadmins - Liste des administrateurs\n\
🔸 {p}setprefix [p] - Changer le préfixe\n\
🔸 {p}setclassement - Définir classement initial\n\
🔸 {p}merge [nom1] [nom2] ... - Fusionner les comptes\n\
🔸 {p}detecterdoublons - Détecter les noms similaires\n\
🔸 {p}clearmerge - Vider la mémoire de merge\n\
🔸 Envoyez un quiz pour mise à jour automatique\n\n\
{rule}\n🌟 VEƝI🌿VIƊI🌿VIĆI - V.V.V 🌟",
        rule = RULE,
        p = p
    )
}
