//! Built-in default characters.
//!
//! Every user sees these five characters alongside their own. They are not
//! persisted; lookups resolve them from this table per locale.

use crate::character::Character;
use crate::locale::Locale;

struct Translation {
    name: &'static str,
    description: &'static str,
    greeting: &'static str,
}

struct DefaultCharacter {
    id: &'static str,
    avatar_url: &'static str,
    en: Translation,
    tr: Translation,
}

static DEFAULT_CHARACTERS: [DefaultCharacter; 5] = [
    DefaultCharacter {
        id: "default-1",
        avatar_url: "https://api.dicebear.com/7.x/bottts/svg?seed=assistant",
        en: Translation {
            name: "AI Assistant",
            description: "Your helpful AI companion for daily tasks",
            greeting: "Hello! I'm your AI Assistant. How can I help you today?",
        },
        tr: Translation {
            name: "Yapay Zeka Asistanı",
            description: "Günlük görevleriniz için yardımcı AI arkadaşınız",
            greeting: "Merhaba! Ben senin Yapay Zeka Asistanınım. Bugün sana nasıl yardımcı olabilirim?",
        },
    },
    DefaultCharacter {
        id: "default-2",
        avatar_url: "https://api.dicebear.com/7.x/bottts/svg?seed=writer",
        en: Translation {
            name: "Creative Writer",
            description: "Expert in creative writing and storytelling",
            greeting: "Greetings! I'm here to help you craft amazing stories and creative content. What shall we write today?",
        },
        tr: Translation {
            name: "Yaratıcı Yazar",
            description: "Yaratıcı yazarlık ve hikaye anlatımı uzmanı",
            greeting: "Selam! Harika hikayeler ve yaratıcı içerikler oluşturmana yardımcı olmak için buradayım. Bugün ne yazalım?",
        },
    },
    DefaultCharacter {
        id: "default-3",
        avatar_url: "https://api.dicebear.com/7.x/bottts/svg?seed=coder",
        en: Translation {
            name: "Code Expert",
            description: "Programming mentor and debugging specialist",
            greeting: "Hey there! I'm your Code Expert. Ready to solve some coding challenges together?",
        },
        tr: Translation {
            name: "Kod Uzmanı",
            description: "Programlama mentoru ve hata ayıklama uzmanı",
            greeting: "Selam! Ben senin Kod Uzmanınım. Birlikte kodlama zorluklarını çözmeye hazır mısın?",
        },
    },
    DefaultCharacter {
        id: "default-4",
        avatar_url: "https://api.dicebear.com/7.x/bottts/svg?seed=tutor",
        en: Translation {
            name: "Language Tutor",
            description: "Multilingual teacher for language learning",
            greeting: "Welcome! I'm your Language Tutor. Which language would you like to practice today?",
        },
        tr: Translation {
            name: "Dil Öğretmeni",
            description: "Dil öğrenimi için çok dilli öğretmen",
            greeting: "Hoş geldin! Ben senin Dil Öğretmeninım. Bugün hangi dili pratik yapmak istersin?",
        },
    },
    DefaultCharacter {
        id: "default-5",
        avatar_url: "https://api.dicebear.com/7.x/bottts/svg?seed=advisor",
        en: Translation {
            name: "Business Advisor",
            description: "Strategic consultant for business decisions",
            greeting: "Hello! I'm your Business Advisor. Let's discuss your business strategies and goals.",
        },
        tr: Translation {
            name: "İş Danışmanı",
            description: "İş kararları için stratejik danışman",
            greeting: "Merhaba! Ben senin İş Danışmanınım. İş stratejilerini ve hedeflerini konuşalım.",
        },
    },
];

fn to_character(def: &DefaultCharacter, locale: Locale) -> Character {
    let translation = match locale {
        Locale::En => &def.en,
        Locale::Tr => &def.tr,
    };
    Character {
        id: def.id.to_string(),
        user_id: None,
        name: translation.name.to_string(),
        avatar_url: def.avatar_url.to_string(),
        description: translation.description.to_string(),
        greeting: translation.greeting.to_string(),
        created_at: 0,
    }
}

/// The built-in character set, localized.
pub fn default_characters(locale: Locale) -> Vec<Character> {
    DEFAULT_CHARACTERS
        .iter()
        .map(|def| to_character(def, locale))
        .collect()
}

/// Resolve a built-in character by id.
pub fn default_character(id: &str, locale: Locale) -> Option<Character> {
    DEFAULT_CHARACTERS
        .iter()
        .find(|def| def.id == id)
        .map(|def| to_character(def, locale))
}

/// Greeting shown for conversations with no character attached.
pub fn default_greeting(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Hello! How can I help you?",
        Locale::Tr => "Merhaba! Size nasıl yardımcı olabilirim?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_characters_count() {
        assert_eq!(default_characters(Locale::En).len(), 5);
        assert_eq!(default_characters(Locale::Tr).len(), 5);
    }

    #[test]
    fn test_default_characters_are_unowned() {
        assert!(
            default_characters(Locale::En)
                .iter()
                .all(|c| c.user_id.is_none())
        );
    }

    #[test]
    fn test_default_character_lookup_localized() {
        let en = default_character("default-1", Locale::En).unwrap();
        assert_eq!(en.name, "AI Assistant");

        let tr = default_character("default-1", Locale::Tr).unwrap();
        assert_eq!(tr.name, "Yapay Zeka Asistanı");
        assert_eq!(tr.avatar_url, en.avatar_url);
    }

    #[test]
    fn test_default_character_unknown_id() {
        assert!(default_character("default-99", Locale::En).is_none());
    }
}
