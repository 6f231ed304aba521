//! The `/connect` and `/disconnect` chat sub-protocol (spec §4.6), shared
//! between an attached session's own chat handler and the listener's idle
//! "no session attached" loop so both sides parse and list the same way.

use mc_protocol::chat::ChatComponent;

use crate::observer::SessionStatus;
use crate::profile::Profile;

#[derive(Clone, Debug, PartialEq)]
pub enum ManagementCommand {
    Connect(String),
    Disconnect(String),
}

/// Recognizes `/connect <id-or-name>` and `/disconnect <id-or-name>`; any
/// other text is ordinary chat and should reach upstream untouched.
pub fn parse(text: &str) -> Option<ManagementCommand> {
    let text = text.trim();
    if let Some(arg) = text.strip_prefix("/connect ") {
        return Some(ManagementCommand::Connect(arg.trim().to_owned()));
    }
    if let Some(arg) = text.strip_prefix("/disconnect ") {
        return Some(ManagementCommand::Disconnect(arg.trim().to_owned()));
    }
    None
}

/// Resolves a command's argument against one owner's profiles: by uuid
/// first (hyphenated or bare), then by name, case-insensitively.
pub fn resolve<'a>(profiles: &'a [Profile], id_or_name: &str) -> Option<&'a Profile> {
    if let Ok(target) = mc_protocol::normalize_uuid(id_or_name) {
        if let Some(found) = profiles.iter().find(|p| mc_protocol::normalize_uuid(&p.id).map(|id| id == target).unwrap_or(false)) {
            return Some(found);
        }
    }
    profiles.iter().find(|p| p.name.eq_ignore_ascii_case(id_or_name))
}

/// Builds the periodic (10s) synthetic chat message listing an owner's
/// profiles and their connection/queue state, each row a click-to-run
/// `/connect <id>` (spec §4.6).
pub fn profile_listing(profiles: &[Profile], status_of: impl Fn(&str) -> Option<SessionStatus>) -> ChatComponent {
    let mut lines = vec![ChatComponent::text("Your profiles:\n")];
    for profile in profiles {
        let state = match status_of(&profile.id) {
            None => "offline".to_owned(),
            Some(status) => match &status.queue {
                Some(queue) => format!("queued (#{}, {})", queue.position, queue.time),
                None if status.playing => "playing".to_owned(),
                None => "connected".to_owned(),
            },
        };
        lines.push(ChatComponent::run_command(format!("  {} [{state}]\n", profile.name), format!("/connect {}", profile.id)));
    }
    ChatComponent { extra: lines, ..Default::default() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileSettings;

    fn profile(id: &str, name: &str) -> Profile {
        Profile { id: id.to_owned(), name: name.to_owned(), access_token: String::new(), owner: "alice".to_owned(), settings: ProfileSettings::default() }
    }

    #[test]
    fn parses_connect_and_disconnect() {
        assert_eq!(parse("/connect alt1"), Some(ManagementCommand::Connect("alt1".to_owned())));
        assert_eq!(parse("/disconnect alt1"), Some(ManagementCommand::Disconnect("alt1".to_owned())));
        assert_eq!(parse("hello there"), None);
    }

    #[test]
    fn resolves_by_name_case_insensitively_and_by_uuid() {
        let profiles = vec![profile("11111111-1111-1111-1111-111111111111", "alice_alt")];
        assert_eq!(resolve(&profiles, "ALICE_ALT").unwrap().name, "alice_alt");
        assert_eq!(resolve(&profiles, "11111111111111111111111111111111").unwrap().name, "alice_alt");
        assert!(resolve(&profiles, "nobody").is_none());
    }

    #[test]
    fn profile_listing_marks_offline_profiles() {
        let profiles = vec![profile("11111111-1111-1111-1111-111111111111", "alice_alt")];
        let listing = profile_listing(&profiles, |_| None);
        assert!(listing.extra[1].plain_text().contains("offline"));
    }
}
