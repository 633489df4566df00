//! services/api/src/adapters/fallback.rs
//!
//! Template-based prompt generation, used when no generation backend is
//! configured and as the degradation path when the backend call fails.
//! Also home to the per-genre writing tips and the fixed word-count /
//! difficulty tiers shared with the backend path.

use muse_core::domain::GeneratedPrompt;
use rand::seq::SliceRandom;

/// The fixed word-count targets and the difficulty label each maps to.
pub const WORD_COUNT_TIERS: [(u32, &str); 4] = [
    (250, "Very Easy"),
    (500, "Easy"),
    (750, "Medium"),
    (1000, "Hard"),
];

/// Picks a random word-count/difficulty tier.
pub fn pick_tier() -> (u32, &'static str) {
    let mut rng = rand::thread_rng();
    *WORD_COUNT_TIERS.choose(&mut rng).expect("tiers are non-empty")
}

/// A prompt template: a scenario with `{slot}` placeholders and the choices
/// each slot draws from.
struct Template {
    title: &'static str,
    pattern: &'static str,
    slots: &'static [(&'static str, &'static [&'static str])],
}

const FANTASY: Template = Template {
    title: "The Last Dragon's Secret",
    pattern: "In a world where dragons were thought extinct, {character} discovers {discovery} hidden in {location}. As {conflict} threatens the realm, they must {challenge} before {deadline}.",
    slots: &[
        ("character", &["a young apprentice mage", "an exiled knight", "a street thief with unusual talents"]),
        ("discovery", &["a dragon egg", "an ancient prophecy", "a map to the dragon sanctuary"]),
        ("location", &["the royal library's forbidden section", "an abandoned tower", "beneath the city sewers"]),
        ("conflict", &["a dark sorcerer's army", "a plague of shadows", "civil war"]),
        ("challenge", &["master forbidden magic", "unite warring kingdoms", "awaken the sleeping dragon"]),
        ("deadline", &["the blood moon rises", "winter's first snow", "the king's coronation"]),
    ],
};

const SCIENCE_FICTION: Template = Template {
    title: "Colony Ship Paradox",
    pattern: "The generation ship {ship_name} has been traveling for {duration}, but {character} discovers {revelation}. With {resource} running low and {threat} approaching, they must decide whether to {choice}.",
    slots: &[
        ("ship_name", &["Horizon's Hope", "New Eden", "Stellar Ark"]),
        ("duration", &["300 years", "50 generations", "longer than recorded history"]),
        ("character", &["the ship's AI maintenance tech", "a historian studying old Earth", "the youngest council member"]),
        ("revelation", &["they've been traveling in circles", "Earth still exists", "the ship is actually a prison"]),
        ("resource", &["oxygen", "genetic diversity", "hope"]),
        ("threat", &["an alien armada", "system-wide cascade failure", "a mutiny"]),
        ("choice", &["wake the frozen founders", "change course to an unknown planet", "reveal the truth to everyone"]),
    ],
};

const MYSTERY: Template = Template {
    title: "The Vanishing Gallery",
    pattern: "{character} arrives at {location} to investigate {mystery}. The only clue is {clue}, but {complication} makes everyone a suspect. The truth involves {twist}.",
    slots: &[
        ("character", &["a retired detective", "an insurance investigator", "an art student"]),
        ("location", &["a private island museum", "an underground auction house", "a restored Victorian mansion"]),
        ("mystery", &["the disappearance of priceless paintings", "a murder during a locked-room auction", "forged masterpieces appearing worldwide"]),
        ("clue", &["a half-burned photograph", "a coded message in the victim's notebook", "paint that shouldn't exist yet"]),
        ("complication", &["everyone has an alibi", "the security footage has been edited", "the victim is still alive"]),
        ("twist", &["time travel", "identical twins nobody knew about", "the detective is the criminal"]),
    ],
};

const HORROR: Template = Template {
    title: "The Inheritance",
    pattern: "{character} inherits {inheritance} from {relative}, but discovers {horror} lurking within. As {event} approaches, they realize {revelation} and must {action} to survive.",
    slots: &[
        ("character", &["a struggling artist", "a medical student", "a single parent"]),
        ("inheritance", &["a Victorian mansion", "an antique shop", "a storage unit full of artifacts"]),
        ("relative", &["an uncle they never knew existed", "their recently deceased grandmother", "a distant cousin"]),
        ("horror", &["the previous owners never left", "a portal to somewhere else", "a curse that transfers to the new owner"]),
        ("event", &["the anniversary of a tragedy", "a lunar eclipse", "their first night alone"]),
        ("revelation", &["they were chosen for a reason", "their family has kept this secret for generations", "escaping makes it worse"]),
        ("action", &["perform an ancient ritual", "burn everything", "make a terrible sacrifice"]),
    ],
};

const ROMANCE: Template = Template {
    title: "Second Chances",
    pattern: "{character1} and {character2} meet again after {time_period} at {location}. Despite {obstacle}, they discover {connection}, but {conflict} threatens to {consequence}.",
    slots: &[
        ("character1", &["a successful CEO", "a small-town teacher", "a traveling musician"]),
        ("character2", &["their college sweetheart", "their former rival", "their best friend's sibling"]),
        ("time_period", &["ten years", "a lifetime", "one unforgettable summer"]),
        ("location", &["a destination wedding", "their hometown reunion", "an unexpected flight delay"]),
        ("obstacle", &["they're both engaged to others", "a bitter misunderstanding", "completely different lives now"]),
        ("connection", &["they still finish each other's sentences", "a shared dream they never forgot", "letters never sent"]),
        ("conflict", &["a job opportunity abroad", "family disapproval", "a secret from the past"]),
        ("consequence", &["separate them forever", "change everything", "break other hearts"]),
    ],
};

/// Used when none of the requested genres has a dedicated template.
const DEFAULT: Template = Template {
    title: "The Unexpected Journey",
    pattern: "Your protagonist discovers {discovery} that changes everything they believed about {belief}. They must {action} before {deadline}.",
    slots: &[
        ("discovery", &["a hidden letter", "a secret door", "an old photograph"]),
        ("belief", &["their family history", "their own identity", "the nature of reality"]),
        ("action", &["uncover the truth", "make an impossible choice", "confront their fears"]),
        ("deadline", &["it's too late", "someone else finds out", "the opportunity disappears"]),
    ],
};

fn template_for(genre: &str) -> Option<&'static Template> {
    match genre {
        "Fantasy" => Some(&FANTASY),
        "Science Fiction" => Some(&SCIENCE_FICTION),
        "Mystery" => Some(&MYSTERY),
        "Horror" => Some(&HORROR),
        "Romance" => Some(&ROMANCE),
        _ => None,
    }
}

/// Generates a complete prompt from the template tables.
pub fn generate_from_template(genres: &[String]) -> GeneratedPrompt {
    let mut rng = rand::thread_rng();

    let candidates: Vec<&Template> = genres
        .iter()
        .filter_map(|g| template_for(g))
        .collect();
    let template = candidates
        .choose(&mut rng)
        .copied()
        .unwrap_or(&DEFAULT);

    let mut content = template.pattern.to_string();
    for (slot, options) in template.slots {
        if let Some(choice) = options.choose(&mut rng) {
            content = content.replace(&format!("{{{slot}}}"), choice);
        }
    }

    let (word_count, difficulty) = pick_tier();
    GeneratedPrompt {
        title: template.title.to_string(),
        content,
        genres: genres.to_vec(),
        difficulty: difficulty.to_string(),
        word_count,
        tips: writing_tips(genres),
    }
}

fn genre_tip(genre: &str) -> Option<&'static str> {
    let tip = match genre {
        "Fantasy" => "Build a consistent magic system with clear rules and limitations.",
        "Science Fiction" => {
            "Ground your technology in real scientific concepts, even if extrapolated."
        }
        "Mystery" => "Plant clues fairly throughout the story - readers should be able to solve it.",
        "Horror" => "Build tension through atmosphere and pacing, not just jump scares.",
        "Romance" => {
            "Develop both characters fully - they should be interesting apart and together."
        }
        "Thriller" => "Keep the pacing tight and end chapters with hooks.",
        "Historical Fiction" => {
            "Research the period thoroughly but don't let facts overwhelm the story."
        }
        "Literary Fiction" => "Focus on character development and thematic depth.",
        "Young Adult" => "Address serious themes while maintaining an authentic teen voice.",
        "Crime" => "Make your detective's process logical and methodical.",
        "Adventure" => "Balance action sequences with character moments.",
        "Dystopian" => "Create a believable path from our world to yours.",
        "Magical Realism" => "Treat magical elements as mundane parts of the world.",
        "Western" => "Focus on themes of justice, freedom, and survival.",
        _ => return None,
    };
    Some(tip)
}

/// Up to three tips: genre-specific ones first, general craft tips after.
pub fn writing_tips(genres: &[String]) -> Vec<String> {
    let mut tips: Vec<String> = genres
        .iter()
        .filter_map(|g| genre_tip(g))
        .map(str::to_string)
        .collect();
    tips.push("Start with a strong opening line that immediately engages the reader.".to_string());
    tips.push(
        "Show character growth through actions and decisions, not just description.".to_string(),
    );
    tips.truncate(3);
    tips
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genres(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn template_output_is_complete() {
        let prompt = generate_from_template(&genres(&["Fantasy"]));
        assert_eq!(prompt.title, "The Last Dragon's Secret");
        assert!(!prompt.content.contains('{'), "unfilled slot in {}", prompt.content);
        assert!(WORD_COUNT_TIERS
            .iter()
            .any(|(wc, d)| *wc == prompt.word_count && *d == prompt.difficulty));
        assert_eq!(prompt.tips.len(), 3);
    }

    #[test]
    fn unknown_genre_uses_default_template() {
        let prompt = generate_from_template(&genres(&["Cyberpunk Cookbook"]));
        assert_eq!(prompt.title, "The Unexpected Journey");
        assert!(!prompt.content.contains('{'));
    }

    #[test]
    fn tips_cap_at_three_and_lead_with_genre() {
        let tips = writing_tips(&genres(&["Mystery", "Horror"]));
        assert_eq!(tips.len(), 3);
        assert!(tips[0].contains("clues"));
        assert!(tips[1].contains("tension"));
    }

    #[test]
    fn tier_table_is_the_fixed_set() {
        for _ in 0..16 {
            let (wc, difficulty) = pick_tier();
            assert!(matches!(wc, 250 | 500 | 750 | 1000));
            assert!(matches!(difficulty, "Very Easy" | "Easy" | "Medium" | "Hard"));
        }
    }
}
