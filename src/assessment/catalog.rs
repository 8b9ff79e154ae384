// Constant tables behind the assessment wizard

/// (id, label)
pub const GOALS: &[(&str, &str)] = &[
    ("stress-relief", "release stress and tension"),
    ("better-sleep", "wind down and prepare for restful sleep"),
    ("focus", "sharpen focus and clarity"),
    ("self-compassion", "cultivate kindness toward oneself"),
    ("energy", "restore energy and vitality"),
    ("gratitude", "cultivate gratitude"),
];

/// (id, label)
pub const FEELINGS: &[(&str, &str)] = &[
    ("calm", "calm"),
    ("anxious", "anxious"),
    ("tired", "tired"),
    ("restless", "restless"),
    ("grateful", "grateful"),
    ("overwhelmed", "overwhelmed"),
    ("hopeful", "hopeful"),
    ("sad", "sad"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WisdomSource {
    pub id: &'static str,
    pub name: &'static str,
    pub guidance: &'static str,
}

pub const WISDOM_SOURCES: &[WisdomSource] = &[
    WisdomSource {
        id: "mindfulness",
        name: "Mindfulness",
        guidance: "Anchor attention in the breath and the present moment without judgment.",
    },
    WisdomSource {
        id: "stoic",
        name: "Stoic philosophy",
        guidance: "Distinguish what is within our control from what is not, and rest in acceptance.",
    },
    WisdomSource {
        id: "buddhist",
        name: "Buddhist teaching",
        guidance: "Observe the impermanence of thoughts and sensations with loving-kindness.",
    },
    WisdomSource {
        id: "taoist",
        name: "Taoist wisdom",
        guidance: "Move with ease and non-striving, like water finding its way.",
    },
    WisdomSource {
        id: "secular",
        name: "Secular relaxation",
        guidance: "Use plain, practical language focused on the body and the breath.",
    },
];

fn lookup<'a>(table: &'a [(&'a str, &'a str)], id: &str) -> Option<&'a str> {
    table
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(id.trim()))
        .map(|(_, label)| *label)
}

/// Goal label, or the raw answer when it is not a known id
pub fn goal_label(id: &str) -> String {
    lookup(GOALS, id).map_or_else(|| id.trim().to_string(), str::to_string)
}

pub fn feeling_label(id: &str) -> String {
    lookup(FEELINGS, id).map_or_else(|| id.trim().to_string(), str::to_string)
}

pub fn wisdom_source(id: &str) -> Option<&'static WisdomSource> {
    WISDOM_SOURCES
        .iter()
        .find(|source| source.id.eq_ignore_ascii_case(id.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_ids_resolve_case_insensitively() {
        assert_eq!(goal_label("Better-Sleep"), "wind down and prepare for restful sleep");
        assert_eq!(feeling_label(" ANXIOUS "), "anxious");
        assert_eq!(wisdom_source("Stoic").map(|s| s.name), Some("Stoic philosophy"));
    }

    #[test]
    fn test_unknown_ids_pass_through() {
        assert_eq!(goal_label("learn to juggle"), "learn to juggle");
        assert_eq!(feeling_label("curious"), "curious");
        assert!(wisdom_source("unknown").is_none());
    }
}
