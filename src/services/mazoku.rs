//! Recognises the embeds Mazoku posts and edits.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serenity::all::{Embed, UserId};

static MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<@!?(\d+)>").unwrap_or_else(|e| panic!("invalid mention regex: {}", e))
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rarity {
    SuperRare,
    SuperSuperRare,
    UltraRare,
}

impl Rarity {
    /// Custom emoji ids Mazoku uses for each rarity in auto summon embeds.
    const EMOJI_IDS: [(&'static str, Rarity); 3] = [
        ("1342202597389373530", Rarity::SuperRare),
        ("1342202212948115510", Rarity::SuperSuperRare),
        ("1342202203515125801", Rarity::UltraRare),
    ];

    pub fn label(self) -> &'static str {
        match self {
            Rarity::SuperRare => "SR",
            Rarity::SuperSuperRare => "SSR",
            Rarity::UltraRare => "UR",
        }
    }

    pub fn announcement(self) -> String {
        let emoji = match self {
            Rarity::SuperRare => "<a:SuperRare:1342208034482425936>",
            Rarity::SuperSuperRare => "<a:SuperSuperRare:1342208039918370857>",
            Rarity::UltraRare => "<a:UltraRare:1342208044351623199>",
        };
        let bang = if self == Rarity::UltraRare { "!!" } else { "!" };
        format!("{} has summoned, claim it{}", emoji, bang)
    }
}

/// The parts of an embed the triggers look at.
#[derive(Debug, Clone, Default)]
pub struct EmbedText {
    pub title: String,
    pub description: String,
    pub footer: String,
}

impl From<&Embed> for EmbedText {
    fn from(embed: &Embed) -> Self {
        Self {
            title: embed.title.clone().unwrap_or_default(),
            description: embed.description.clone().unwrap_or_default(),
            footer: embed
                .footer
                .as_ref()
                .map(|f| f.text.clone())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A manual summon was claimed by this user.
    SummonClaimed(UserId),
    /// A clan summon was cast; carries the caster's name from the footer.
    ClanCast(String),
    /// An auto summon with a rarity worth pinging for.
    HighTierSpawn(Rarity),
}

impl EmbedText {
    pub fn trigger(&self) -> Option<Trigger> {
        let title = self.title.to_lowercase();

        if title.contains("summon claimed") && !title.contains("auto summon claimed") {
            return self.claimed_by().map(Trigger::SummonClaimed);
        }

        if title.contains("casting for round") {
            let caster = self.footer.trim();
            return (!caster.is_empty()).then(|| Trigger::ClanCast(caster.to_string()));
        }

        if title.contains("auto summon") {
            return self.highest_rarity().map(Trigger::HighTierSpawn);
        }

        None
    }

    fn claimed_by(&self) -> Option<UserId> {
        first_mention(&self.description).or_else(|| {
            if self.footer.to_lowercase().contains("claimed by") {
                first_mention(&self.footer)
            } else {
                None
            }
        })
    }

    fn highest_rarity(&self) -> Option<Rarity> {
        Rarity::EMOJI_IDS
            .iter()
            .filter(|(id, _)| self.description.contains(id))
            .map(|(_, rarity)| *rarity)
            .max()
    }
}

fn first_mention(text: &str) -> Option<UserId> {
    MENTION
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .filter(|id| *id != 0)
        .map(UserId::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embed(title: &str, description: &str, footer: &str) -> EmbedText {
        EmbedText {
            title: title.to_string(),
            description: description.to_string(),
            footer: footer.to_string(),
        }
    }

    #[test]
    fn test_summon_claimed_from_description() {
        let e = embed("Summon Claimed!", "Card claimed by <@!1234>", "");
        assert_eq!(e.trigger(), Some(Trigger::SummonClaimed(UserId::new(1234))));
    }

    #[test]
    fn test_summon_claimed_footer_fallback() {
        let e = embed("Summon Claimed", "A card was taken", "Claimed by <@99>");
        assert_eq!(e.trigger(), Some(Trigger::SummonClaimed(UserId::new(99))));

        let e = embed("Summon Claimed", "A card was taken", "Owner <@99>");
        assert_eq!(e.trigger(), None);
    }

    #[test]
    fn test_auto_summon_claimed_is_ignored() {
        let e = embed("Auto Summon Claimed", "<@1234>", "");
        assert_eq!(e.trigger(), None);
    }

    #[test]
    fn test_clan_cast() {
        let e = embed("Casting for Round 3", "", "  lilac_fan ");
        assert_eq!(e.trigger(), Some(Trigger::ClanCast("lilac_fan".to_string())));

        let e = embed("Casting for Round 3", "", "");
        assert_eq!(e.trigger(), None);
    }

    #[test]
    fn test_highest_rarity_wins() {
        let e = embed(
            "Auto Summon",
            "<:a:1342202597389373530> <:b:1342202203515125801> <:c:1342202212948115510>",
            "",
        );
        assert_eq!(e.trigger(), Some(Trigger::HighTierSpawn(Rarity::UltraRare)));

        let e = embed("Auto Summon", "<:a:1342202212948115510>", "");
        assert_eq!(e.trigger(), Some(Trigger::HighTierSpawn(Rarity::SuperSuperRare)));

        let e = embed("Auto Summon", "nothing special", "");
        assert_eq!(e.trigger(), None);
    }

    #[test]
    fn test_announcement() {
        assert!(Rarity::UltraRare.announcement().ends_with("claim it!!"));
        assert!(Rarity::SuperRare.announcement().ends_with("claim it!"));
        assert_eq!(Rarity::SuperSuperRare.label(), "SSR");
    }
}
